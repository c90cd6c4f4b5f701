//! Semantic type tags attached to discovered fields

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Most specific classification known for a field.
///
/// Serialized as its display string (`"email"`, `"array<integer>"`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SemanticType {
    /// No evidence yet (field known only from an error message)
    #[default]
    Unknown,
    String,
    Integer,
    Float,
    Boolean,
    Object,
    /// Element type taken from the first element; `None` for an empty array
    Array(Option<Box<SemanticType>>),
    Null,
    Email,
    Date,
    Uuid,
    Url,
    Phone,
    Color,
    Ip,
    Timestamp,
    Year,
    Currency,
    Percentage,
}

impl SemanticType {
    pub fn array_of(element: SemanticType) -> Self {
        SemanticType::Array(Some(Box::new(element)))
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, SemanticType::Unknown)
    }

    /// Refined string formats
    pub fn is_string_format(&self) -> bool {
        matches!(
            self,
            SemanticType::Email
                | SemanticType::Date
                | SemanticType::Uuid
                | SemanticType::Url
                | SemanticType::Phone
                | SemanticType::Color
                | SemanticType::Ip
        )
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            SemanticType::Integer
                | SemanticType::Float
                | SemanticType::Timestamp
                | SemanticType::Year
                | SemanticType::Currency
                | SemanticType::Percentage
        )
    }

    /// Combine the current classification with a new observation.
    ///
    /// An observation only replaces the current type when it is a
    /// refinement of it; a contradicting observation leaves it unchanged.
    pub fn refine(&self, observed: &SemanticType) -> SemanticType {
        use SemanticType::*;

        match (self, observed) {
            (_, Unknown) => self.clone(),
            (Unknown, _) | (Null, _) => observed.clone(),
            (current, seen) if current == seen => current.clone(),
            (String, seen) if seen.is_string_format() => seen.clone(),
            (Integer, seen) if seen.is_numeric() => seen.clone(),
            (Float, Currency) | (Float, Percentage) => observed.clone(),
            (Array(None), Array(Some(_))) => observed.clone(),
            (Array(Some(current)), Array(Some(seen))) => {
                SemanticType::array_of(current.refine(seen))
            }
            _ => self.clone(),
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SemanticType::Unknown => "unknown",
            SemanticType::String => "string",
            SemanticType::Integer => "integer",
            SemanticType::Float => "float",
            SemanticType::Boolean => "boolean",
            SemanticType::Object => "object",
            SemanticType::Array(None) => "array",
            SemanticType::Array(Some(element)) => return write!(f, "array<{}>", element),
            SemanticType::Null => "null",
            SemanticType::Email => "email",
            SemanticType::Date => "date",
            SemanticType::Uuid => "uuid",
            SemanticType::Url => "url",
            SemanticType::Phone => "phone",
            SemanticType::Color => "color",
            SemanticType::Ip => "ip",
            SemanticType::Timestamp => "timestamp",
            SemanticType::Year => "year",
            SemanticType::Currency => "currency",
            SemanticType::Percentage => "percentage",
        };
        f.write_str(name)
    }
}

/// Unrecognized type tag
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown semantic type: {0}")]
pub struct ParseSemanticTypeError(pub String);

impl FromStr for SemanticType {
    type Err = ParseSemanticTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(inner) = s
            .strip_prefix("array<")
            .and_then(|rest| rest.strip_suffix('>'))
        {
            return Ok(SemanticType::array_of(inner.parse()?));
        }

        let parsed = match s {
            "" | "unknown" => SemanticType::Unknown,
            "string" => SemanticType::String,
            "integer" | "number" => SemanticType::Integer,
            "float" => SemanticType::Float,
            "boolean" => SemanticType::Boolean,
            "object" => SemanticType::Object,
            "array" => SemanticType::Array(None),
            "null" => SemanticType::Null,
            "email" => SemanticType::Email,
            "date" => SemanticType::Date,
            "uuid" => SemanticType::Uuid,
            "url" => SemanticType::Url,
            "phone" => SemanticType::Phone,
            "color" => SemanticType::Color,
            "ip" => SemanticType::Ip,
            "timestamp" => SemanticType::Timestamp,
            "year" => SemanticType::Year,
            "currency" => SemanticType::Currency,
            "percentage" => SemanticType::Percentage,
            other => return Err(ParseSemanticTypeError(other.to_string())),
        };
        Ok(parsed)
    }
}

impl Serialize for SemanticType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SemanticType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
