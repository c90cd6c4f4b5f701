//! Next-action records proposed by the reasoning service

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Malformed action reply
#[derive(Error, Debug)]
pub enum ActionParseError {
    #[error("no JSON object found in reply")]
    NoJson,

    #[error("failed to parse action: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing 'action' field in response")]
    MissingAction,

    #[error("unknown action '{0}'")]
    UnknownAction(String),

    #[error("missing 'body' field in response")]
    MissingBody,

    #[error("'body' must be a JSON object")]
    BodyNotObject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    ModifyFields,
    Complete,
}

/// `{action, body, explanation}` as proposed for one iteration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "action")]
    pub kind: ActionKind,
    pub body: Map<String, Value>,
    #[serde(default)]
    pub explanation: String,
}

impl Action {
    pub fn modify(body: Map<String, Value>) -> Self {
        Self {
            kind: ActionKind::ModifyFields,
            body,
            explanation: String::new(),
        }
    }

    pub fn complete() -> Self {
        Self {
            kind: ActionKind::Complete,
            body: Map::new(),
            explanation: String::new(),
        }
    }

    /// Extract the action from free-form reply text.
    ///
    /// The JSON object is taken from the first `{` to the last `}`, so prose
    /// or code fences around it are tolerated.
    pub fn parse(text: &str) -> Result<Self, ActionParseError> {
        let start = text.find('{').ok_or(ActionParseError::NoJson)?;
        let end = text.rfind('}').ok_or(ActionParseError::NoJson)?;
        if end <= start {
            return Err(ActionParseError::NoJson);
        }

        let mut object: Map<String, Value> = serde_json::from_str(&text[start..=end])?;

        let kind = match object.remove("action") {
            None | Some(Value::Null) => return Err(ActionParseError::MissingAction),
            Some(Value::String(s)) if s == "modify_fields" => ActionKind::ModifyFields,
            Some(Value::String(s)) if s == "complete" => ActionKind::Complete,
            Some(Value::String(s)) => return Err(ActionParseError::UnknownAction(s)),
            Some(other) => return Err(ActionParseError::UnknownAction(other.to_string())),
        };

        let body = match object.remove("body") {
            None | Some(Value::Null) => return Err(ActionParseError::MissingBody),
            Some(Value::Object(map)) => map,
            Some(_) => return Err(ActionParseError::BodyNotObject),
        };

        let explanation = match object.remove("explanation") {
            Some(Value::String(s)) => s,
            _ => String::new(),
        };

        Ok(Self {
            kind,
            body,
            explanation,
        })
    }
}
