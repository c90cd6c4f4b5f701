//! Completion policy and schema rendering

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ledger::{FieldKnowledge, FieldLedger};

/// Final artifact of a discovery run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredSchema {
    /// Sorted by field name
    pub fields: Vec<FieldKnowledge>,
    /// Payload of the successful probe, `null` when the run ended on a
    /// `complete` action instead
    #[serde(default)]
    pub minimal_request_body: Value,
}

impl DiscoveredSchema {
    pub fn field(&self, name: &str) -> Option<&FieldKnowledge> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn required_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
            .collect()
    }
}

/// Whether a `complete` action may end the run: any discovered field is
/// enough
pub fn is_complete(ledger: &FieldLedger) -> bool {
    !ledger.is_empty()
}

pub fn build_schema(ledger: &FieldLedger, minimal_request_body: Value) -> DiscoveredSchema {
    DiscoveredSchema {
        fields: ledger.fields_sorted(),
        minimal_request_body,
    }
}
