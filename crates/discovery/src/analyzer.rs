//! Error-payload mining
//!
//! Target validation errors are the main source of evidence about which
//! fields exist and which are required. Bodies are read as the common
//! `{error, errors, validation_errors}` shape when possible, otherwise every
//! string inside the payload (or the raw text) is run through the free-text
//! patterns.

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;
use tracing::debug;

use crate::ledger::FieldLedger;
use crate::semantic::SemanticType;

/// Substring → type table for `validation_errors` messages; first hit wins
const TYPE_HINTS: [(&str, &str); 7] = [
    ("must be a number", "integer"),
    ("must be a string", "string"),
    ("must be a boolean", "boolean"),
    ("must be an array", "array"),
    ("must be an object", "object"),
    ("invalid email", "email"),
    ("invalid date", "date"),
];

/// Words the bare `<name> is required` form must not treat as a field name
const BARE_STOPLIST: [&str; 5] = ["field", "parameter", "value", "this", "it"];

/// One piece of evidence extracted from an error payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    Required(String),
    InvalidType(String),
    TypeHint(String, SemanticType),
}

impl Finding {
    pub fn field(&self) -> &str {
        match self {
            Finding::Required(name) | Finding::InvalidType(name) | Finding::TypeHint(name, _) => {
                name
            }
        }
    }

    pub fn apply(&self, ledger: &mut FieldLedger) {
        match self {
            Finding::Required(name) => ledger.mark_required(name),
            Finding::InvalidType(name) => ledger.mark_type_invalid(name),
            Finding::TypeHint(name, ty) => ledger.hint_type(name, ty.clone()),
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::Required(name) => write!(f, "{} is required", name),
            Finding::InvalidType(name) => write!(f, "{} has an invalid value or type", name),
            Finding::TypeHint(name, ty) => write!(f, "{} should be {}", name, ty),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StructuredError {
    error: Option<String>,
    errors: Vec<String>,
    validation_errors: BTreeMap<String, String>,
}

impl StructuredError {
    fn is_populated(&self) -> bool {
        self.error.as_deref().is_some_and(|e| !e.is_empty())
            || !self.errors.is_empty()
            || !self.validation_errors.is_empty()
    }
}

/// Extract findings from a raw error body
pub fn analyze(body: &str) -> Vec<Finding> {
    let mut findings = Vec::new();

    match serde_json::from_str::<StructuredError>(body) {
        Ok(structured) if structured.is_populated() => {
            if let Some(error) = structured.error.as_deref() {
                findings.extend(analyze_text(error));
            }
            for error in &structured.errors {
                findings.extend(analyze_text(error));
            }
            for (field, message) in &structured.validation_errors {
                findings.extend(classify_validation(field, message));
            }
        }
        _ => match serde_json::from_str::<Value>(body) {
            Ok(value) => {
                let mut texts = Vec::new();
                collect_strings(&value, &mut texts);
                for text in texts {
                    findings.extend(analyze_text(text));
                }
            }
            Err(_) => findings.extend(analyze_text(body)),
        },
    }

    dedup(findings)
}

/// Extract findings from a body and record them in `ledger`
pub fn analyze_into(ledger: &mut FieldLedger, body: &str) -> Vec<Finding> {
    let findings = analyze(body);
    for finding in &findings {
        finding.apply(ledger);
    }
    debug!("error analysis produced {} findings", findings.len());
    findings
}

/// Run the free-text patterns over one message.
///
/// Each pattern contributes at most its first match; patterns are
/// independent, so one message can yield several findings.
pub fn analyze_text(message: &str) -> Vec<Finding> {
    let mut findings = Vec::new();

    if let Some(name) = first_capture(field_is_required(), message) {
        findings.push(Finding::Required(name));
    }
    if let Some(name) = first_capture(missing_field(), message) {
        findings.push(Finding::Required(name));
    }
    if let Some(name) = first_capture(invalid_value(), message) {
        findings.push(Finding::InvalidType(name));
    }
    let bare = bare_required()
        .captures_iter(message)
        .filter_map(|caps| caps.get(1).and_then(|m| field_name(m.as_str())))
        .find(|name| !BARE_STOPLIST.contains(&name.to_lowercase().as_str()));
    if let Some(name) = bare {
        findings.push(Finding::Required(name));
    }

    dedup(findings)
}

/// Classify one `validation_errors` entry
pub fn classify_validation(field: &str, message: &str) -> Vec<Finding> {
    let lower = message.to_lowercase();
    let mut findings = Vec::new();

    if lower.contains("required") {
        findings.push(Finding::Required(field.to_string()));
    }

    if let Some((_, ty)) = TYPE_HINTS.iter().find(|(pattern, _)| lower.contains(pattern)) {
        findings.push(Finding::TypeHint(
            field.to_string(),
            ty.parse().unwrap_or_default(),
        ));
    }

    findings
}

fn first_capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| field_name(m.as_str()))
}

/// Captured name without trailing sentence punctuation
fn field_name(raw: &str) -> Option<String> {
    let name = raw.trim_end_matches('.');
    (!name.is_empty()).then(|| name.to_string())
}

fn collect_strings<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
    match value {
        Value::String(s) => out.push(s),
        Value::Array(items) => items.iter().for_each(|v| collect_strings(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_strings(v, out)),
        _ => {}
    }
}

fn dedup(findings: Vec<Finding>) -> Vec<Finding> {
    let mut unique: Vec<Finding> = Vec::with_capacity(findings.len());
    for finding in findings {
        if !unique.contains(&finding) {
            unique.push(finding);
        }
    }
    unique
}

fn field_is_required() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)(?:field|parameter) ['"]?([\w.]+)['"]? is required"#)
            .expect("required pattern")
    })
}

fn missing_field() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)missing (?:required )?(?:field|parameter) ['"]?([\w.]+)['"]?"#)
            .expect("missing pattern")
    })
}

fn invalid_value() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)invalid (?:value|type) for ['"]?([\w.]+)['"]?"#)
            .expect("invalid pattern")
    })
}

fn bare_required() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?im)(?:^|[\s:;,\-])['"]?([\w.]+)['"]? is required"#)
            .expect("bare pattern")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn required(name: &str) -> Finding {
        Finding::Required(name.to_string())
    }

    #[test]
    fn test_quoted_field_is_required() {
        assert_eq!(analyze_text("field 'email' is required"), vec![required("email")]);
        assert_eq!(
            analyze_text("Parameter \"user.name\" is required"),
            vec![required("user.name")]
        );
    }

    #[test]
    fn test_missing_required_parameter() {
        assert_eq!(
            analyze_text("Missing required parameter 'email'"),
            vec![required("email")]
        );
        assert_eq!(analyze_text("missing field token"), vec![required("token")]);
    }

    #[test]
    fn test_invalid_value_clears_type() {
        assert_eq!(
            analyze_text("Invalid type for 'age'"),
            vec![Finding::InvalidType("age".to_string())]
        );
        assert_eq!(
            analyze_text("invalid value for quantity: expected integer"),
            vec![Finding::InvalidType("quantity".to_string())]
        );
    }

    #[test]
    fn test_bare_required_form() {
        assert_eq!(analyze_text("email is required"), vec![required("email")]);
        assert_eq!(
            analyze_text("'profile.firstName' is required"),
            vec![required("profile.firstName")]
        );
    }

    #[test]
    fn test_bare_form_after_a_prefix() {
        assert_eq!(
            analyze_text("Validation failed: email is required"),
            vec![required("email")]
        );
        assert_eq!(analyze_text("Error - email is required"), vec![required("email")]);
        assert_eq!(
            analyze(r#"{"error":"Validation failed: email is required"}"#),
            vec![required("email")]
        );
    }

    #[test]
    fn test_bare_form_skips_generic_subject_for_real_name() {
        assert_eq!(
            analyze_text("This field is required; password is required"),
            vec![required("password")]
        );
    }

    #[test]
    fn test_trailing_period_not_part_of_name() {
        assert_eq!(analyze_text("missing field token."), vec![required("token")]);
        assert_eq!(
            analyze_text("Invalid value for quantity."),
            vec![Finding::InvalidType("quantity".to_string())]
        );
        assert_eq!(
            analyze_text("missing field profile.name."),
            vec![required("profile.name")]
        );
    }

    #[test]
    fn test_bare_form_ignores_generic_subjects() {
        assert!(analyze_text("This field is required").is_empty());
        assert!(analyze_text("value is required").is_empty());
    }

    #[test]
    fn test_several_patterns_in_one_message() {
        let findings = analyze_text("field 'email' is required; invalid value for 'age'");
        assert_eq!(
            findings,
            vec![required("email"), Finding::InvalidType("age".to_string())]
        );
    }

    #[test]
    fn test_only_first_match_per_pattern() {
        let findings = analyze_text("field 'a' is required, field 'b' is required");
        assert_eq!(findings, vec![required("a")]);
    }

    #[test]
    fn test_unrelated_text_yields_nothing() {
        assert!(analyze_text("Internal Server Error").is_empty());
        assert!(analyze("").is_empty());
    }

    #[test]
    fn test_structured_error_member() {
        assert_eq!(analyze(r#"{"error":"email is required"}"#), vec![required("email")]);
    }

    #[test]
    fn test_structured_errors_list() {
        let findings = analyze(
            r#"{"errors":["field 'email' is required","Missing required parameter 'password'"]}"#,
        );
        assert_eq!(findings, vec![required("email"), required("password")]);
    }

    #[test]
    fn test_structured_validation_errors() {
        let findings = analyze(
            r#"{"validation_errors":{"age":"must be a number","email":"Required: invalid email"}}"#,
        );
        assert_eq!(
            findings,
            vec![
                Finding::TypeHint("age".to_string(), SemanticType::Integer),
                required("email"),
                Finding::TypeHint("email".to_string(), SemanticType::Email),
            ]
        );
    }

    #[test]
    fn test_validation_table_order_breaks_ties() {
        let findings = classify_validation("x", "must be a string or must be a number");
        assert_eq!(
            findings,
            vec![Finding::TypeHint("x".to_string(), SemanticType::Integer)]
        );
    }

    #[test]
    fn test_validation_array_hint() {
        assert_eq!(
            classify_validation("tags", "Must be an array"),
            vec![Finding::TypeHint("tags".to_string(), SemanticType::Array(None))]
        );
    }

    #[test]
    fn test_unknown_json_shape_scans_strings() {
        let findings = analyze(r#"{"message":"Validation failed","details":[{"msg":"email is required"}]}"#);
        assert_eq!(findings, vec![required("email")]);
    }

    #[test]
    fn test_nested_error_object_scans_strings() {
        let findings = analyze(r#"{"error":{"message":"missing parameter 'sku'"}}"#);
        assert_eq!(findings, vec![required("sku")]);
    }

    #[test]
    fn test_plain_text_body() {
        assert_eq!(
            analyze("Bad Request: field \"name\" is required"),
            vec![required("name")]
        );
    }

    #[test]
    fn test_multiline_plain_text() {
        let findings = analyze("email is required\npassword is required");
        assert_eq!(findings, vec![required("email")]);
    }

    #[test]
    fn test_analyze_into_updates_ledger() {
        let mut ledger = FieldLedger::new();
        let findings = analyze_into(
            &mut ledger,
            r#"{"validation_errors":{"age":"must be a number"},"error":"field 'email' is required"}"#,
        );

        assert_eq!(findings.len(), 2);
        assert!(ledger.get("email").unwrap().required);
        assert_eq!(ledger.get("age").unwrap().field_type, SemanticType::Integer);
        assert!(!ledger.get("age").unwrap().required);
    }

    #[test]
    fn test_finding_display() {
        assert_eq!(required("email").to_string(), "email is required");
        assert_eq!(
            Finding::TypeHint("age".to_string(), SemanticType::Integer).to_string(),
            "age should be integer"
        );
        assert_eq!(Finding::InvalidType("a".to_string()).field(), "a");
    }
}
