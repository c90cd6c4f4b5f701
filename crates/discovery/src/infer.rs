//! Cascading value-type inference
//!
//! The string and numeric cascades are ordered heuristics: the first
//! matching check wins, and the numeric ranges overlap on purpose (a price
//! of 1999 classifies as a year).

use chrono::{DateTime, NaiveDate};
use regex::Regex;
use serde_json::{Number, Value};
use std::sync::OnceLock;

use crate::semantic::SemanticType;

const TIMESTAMP_RANGE: (f64, f64) = (1_000_000_000.0, 2_000_000_000.0);
const YEAR_RANGE: (f64, f64) = (1900.0, 2100.0);
const CURRENCY_MAX: f64 = 1_000_000.0;
const PERCENTAGE_MAX: f64 = 100.0;

/// Classify a JSON value
pub fn infer_type(value: &Value) -> SemanticType {
    match value {
        Value::Null => SemanticType::Null,
        Value::Bool(_) => SemanticType::Boolean,
        Value::Number(n) => infer_number(n),
        Value::String(s) => infer_string(s),
        Value::Array(items) => match items.first() {
            Some(first) => SemanticType::array_of(infer_type(first)),
            None => SemanticType::Array(None),
        },
        Value::Object(_) => SemanticType::Object,
    }
}

/// String cascade: email, date, uuid, url, phone, color, ip, string
pub fn infer_string(s: &str) -> SemanticType {
    if is_email(s) {
        SemanticType::Email
    } else if is_date(s) {
        SemanticType::Date
    } else if is_uuid(s) {
        SemanticType::Uuid
    } else if is_url(s) {
        SemanticType::Url
    } else if is_phone(s) {
        SemanticType::Phone
    } else if is_color(s) {
        SemanticType::Color
    } else if is_ip(s) {
        SemanticType::Ip
    } else {
        SemanticType::String
    }
}

fn infer_number(n: &Number) -> SemanticType {
    let Some(v) = n.as_f64() else {
        return SemanticType::Integer;
    };
    infer_f64(v)
}

/// Numeric cascade on a plain `f64`
pub fn infer_f64(v: f64) -> SemanticType {
    if v.is_finite() && v.fract() == 0.0 {
        if v > TIMESTAMP_RANGE.0 && v < TIMESTAMP_RANGE.1 {
            SemanticType::Timestamp
        } else if (YEAR_RANGE.0..=YEAR_RANGE.1).contains(&v) {
            SemanticType::Year
        } else {
            SemanticType::Integer
        }
    } else if v > 0.0 && v <= CURRENCY_MAX {
        SemanticType::Currency
    } else if (0.0..=PERCENTAGE_MAX).contains(&v) {
        SemanticType::Percentage
    } else {
        SemanticType::Float
    }
}

fn is_email(s: &str) -> bool {
    s.contains('@') && s.contains('.')
}

fn is_date(s: &str) -> bool {
    DateTime::parse_from_rfc3339(s).is_ok() || NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

fn is_uuid(s: &str) -> bool {
    s.len() == 36 && s.matches('-').count() == 4
}

fn is_url(s: &str) -> bool {
    s.to_lowercase().starts_with("http")
}

fn is_phone(s: &str) -> bool {
    static PHONE: OnceLock<Regex> = OnceLock::new();
    PHONE
        .get_or_init(|| Regex::new(r"^\+?[\d\s\-()]{10,}$").expect("phone pattern"))
        .is_match(s)
}

fn is_color(s: &str) -> bool {
    let s = s.to_lowercase();
    s.starts_with('#') || s.starts_with("rgb") || s.starts_with("hsl")
}

fn is_ip(s: &str) -> bool {
    static IPV4: OnceLock<Regex> = OnceLock::new();
    IPV4.get_or_init(|| Regex::new(r"^(\d{1,3}\.){3}\d{1,3}$").expect("ipv4 pattern"))
        .is_match(s)
}
