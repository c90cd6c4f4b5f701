//! Conversation text sent to the reasoning service

use crate::analyzer::Finding;
use crate::ledger::FieldLedger;
use crate::request::DiscoveryTarget;
use crate::transport::{HttpResponse, TransportError};

/// Opening system message for every run
pub const STRATEGY_PROMPT: &str = r#"# schemaprobe

You map the request schema of an HTTP endpoint you cannot see into. Each turn
you propose one request body; it is sent to the endpoint and you are told what
came back.

Reply with exactly one JSON object:
{
    "action": "modify_fields",
    "body": { "field": "value" },
    "explanation": "why this body"
}

Use "action": "complete" with an empty body once the request shape is known.

## Approach
- Start small. Add fields only when the endpoint asks for them or the path
  strongly implies them (a /users endpoint probably wants an email).
- Pick realistic values that match the field name: a real-looking email for
  "email", an ISO date for "birthDate", a number for "quantity".
- Batch or bulk endpoints take arrays. Try one item and several items, and
  try common wrapper keys such as "items", "data" or "records".
- Read every error. Field names, type hints and "required" wording in the
  error are your main evidence, whether the error is JSON or plain text.
- Only treat a field as required when an error says so. Fields such as ids,
  timestamps and status flags are usually assigned by the server.

## Done when
- At least one request has succeeded
- Every required field is known
- Any array or batch shape is understood"#;

/// Initial user turn describing the target
pub fn task_statement(target: &DiscoveryTarget) -> String {
    let start = if target.initial_body.is_empty() {
        "an empty"
    } else {
        "the provided"
    };
    format!(
        "We are calling {} {}. We start with {} body. Please propose next steps.",
        target.method, target.url, start
    )
}

/// Per-field summary appended after every executed probe
pub fn field_status(ledger: &FieldLedger) -> String {
    let mut lines = vec!["Current field status:".to_string()];
    let fields = ledger.fields_sorted();
    if fields.is_empty() {
        lines.push("(no fields known yet)".to_string());
    }
    for field in fields {
        let required = ledger
            .status(&field.name)
            .map(|s| s.required)
            .unwrap_or(field.required);
        lines.push(format!(
            "- {} (type: {}, required: {})",
            field.name, field.field_type, required
        ));
    }
    lines.join("\n")
}

pub fn error_summary(response: &HttpResponse, findings: &[Finding]) -> String {
    let mut message = format!(
        "Got error response (status {}): {}",
        response.status,
        response.body_text()
    );
    if findings.is_empty() {
        message.push_str("\nNo field hints found in the error.");
    } else {
        message.push_str("\nField hints from the error:");
        for finding in findings {
            message.push_str(&format!("\n- {}", finding));
        }
    }
    message
}

pub fn transport_failure(error: &TransportError) -> String {
    format!("HTTP call failed: {}", error)
}

pub fn completion_rejected(ledger: &FieldLedger) -> String {
    format!(
        "Cannot complete yet. Some fields still need testing. Fields still being discovered: {:?}",
        ledger.undiscovered()
    )
}
