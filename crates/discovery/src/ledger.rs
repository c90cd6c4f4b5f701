//! Field knowledge accumulated during one discovery run

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

use crate::infer::infer_type;
use crate::semantic::SemanticType;

/// Response fields that are always treated as optional in the request
pub const NEUTRALIZED_FIELDS: [&str; 4] = ["id", "isActive", "createdAt", "updatedAt"];

/// Accumulated belief about one request field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldKnowledge {
    pub name: String,
    #[serde(rename = "type", default)]
    pub field_type: SemanticType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub sample_value: Value,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub server_generated: bool,
}

impl FieldKnowledge {
    /// Bare entry for a field known only by name
    pub fn stub(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: SemanticType::Unknown,
            required: false,
            sample_value: Value::Null,
            server_generated: false,
        }
    }
}

/// Testing progress for one field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldTestStatus {
    pub discovered: bool,
    pub type_verified: bool,
    pub required: bool,
    pub optionality_tested: bool,
}

/// Keyed field knowledge plus per-field test status.
///
/// Every status entry has a knowledge entry under the same name.
#[derive(Debug, Clone, Default)]
pub struct FieldLedger {
    fields: HashMap<String, FieldKnowledge>,
    status: HashMap<String, FieldTestStatus>,
}

impl FieldLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&mut self, name: &str) -> (&mut FieldKnowledge, &mut FieldTestStatus) {
        let field = self
            .fields
            .entry(name.to_string())
            .or_insert_with(|| FieldKnowledge::stub(name));
        let status = self.status.entry(name.to_string()).or_default();
        (field, status)
    }

    /// Record that the target requires `name`. Idempotent.
    pub fn mark_required(&mut self, name: &str) {
        let (field, status) = self.entry(name);
        if !status.required {
            debug!("field {} marked required", name);
        }
        field.required = true;
        status.required = true;
        status.discovered = true;
    }

    /// Record that the last value sent for `name` had the wrong type.
    /// Unknown names are ignored.
    pub fn mark_type_invalid(&mut self, name: &str) {
        if let Some(status) = self.status.get_mut(name) {
            debug!("field {} type rejected by target", name);
            status.type_verified = false;
        }
    }

    /// Apply a type named by a validation message
    pub fn hint_type(&mut self, name: &str, hinted: SemanticType) {
        let (field, status) = self.entry(name);
        debug!("field {} hinted as {}", name, hinted);
        field.field_type = hinted;
        status.discovered = true;
        status.type_verified = false;
    }

    /// Merge an observed value for `name`.
    ///
    /// A verified type is only ever refined; an unverified one is replaced by
    /// the inferred type.
    pub fn observe(&mut self, name: &str, value: &Value) {
        let inferred = infer_type(value);
        let (field, status) = self.entry(name);
        field.field_type = if status.type_verified {
            field.field_type.refine(&inferred)
        } else {
            inferred
        };
        field.sample_value = value.clone();
        status.discovered = true;
        status.type_verified = true;
    }

    /// Force `name` optional if it is known
    pub fn neutralize(&mut self, name: &str) {
        if let Some(field) = self.fields.get_mut(name) {
            field.required = false;
        }
        if let Some(status) = self.status.get_mut(name) {
            status.required = false;
        }
    }

    pub fn set_server_generated(&mut self, name: &str) {
        if let Some(field) = self.fields.get_mut(name) {
            field.server_generated = true;
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldKnowledge> {
        self.fields.get(name)
    }

    pub fn status(&self, name: &str) -> Option<&FieldTestStatus> {
        self.status.get(name)
    }

    pub fn len(&self) -> usize {
        self.status.len()
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_empty()
    }

    /// Knowledge snapshots ordered by field name
    pub fn fields_sorted(&self) -> Vec<FieldKnowledge> {
        let mut fields: Vec<FieldKnowledge> = self.fields.values().cloned().collect();
        fields.sort_by(|a, b| a.name.cmp(&b.name));
        fields
    }

    /// Names with a status entry but no evidence yet, sorted
    pub fn undiscovered(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .status
            .iter()
            .filter(|(_, s)| !s.discovered)
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }
}

/// Name-based guess that the target assigns this field itself
pub fn looks_server_generated(name: &str) -> bool {
    let lower = name.to_lowercase();

    let identifier = lower == "id" || lower.ends_with("_id") || name.ends_with("Id");
    let temporal = ["timestamp", "date", "created", "updated", "modified", "deleted"]
        .iter()
        .any(|p| lower.contains(p));
    let state = ["status", "state", "active", "enabled", "archived"]
        .iter()
        .any(|p| lower.contains(p));
    let system = lower.starts_with("sys_")
        || lower.starts_with('_')
        || lower.contains("hash")
        || lower.contains("checksum");

    identifier || temporal || state || system
}
