//! Black-box request schema discovery
//!
//! A reasoning service proposes request bodies, probes are sent to the
//! target, and success and error responses are mined until a schema of
//! required and optional fields with inferred types emerges.

use thiserror::Error;

pub mod action;
pub mod analyzer;
pub mod infer;
pub mod ledger;
pub mod orchestrator;
pub mod policy;
pub mod probe;
pub mod prompt;
pub mod request;
pub mod semantic;
pub mod state;
pub mod transport;

pub use action::{Action, ActionKind, ActionParseError};
pub use analyzer::{analyze, Finding};
pub use infer::infer_type;
pub use ledger::{FieldKnowledge, FieldLedger, FieldTestStatus};
pub use orchestrator::Discoverer;
pub use policy::{build_schema, is_complete, DiscoveredSchema};
pub use probe::{ProbeOutcome, ProbePlan};
pub use request::{DiscoverRequest, DiscoveryTarget};
pub use semantic::SemanticType;
pub use state::{DiscoveryState, Step};
pub use transport::{HttpResponse, HttpTransport, Transport, TransportError};

use schemaprobe_provider::ProviderError;

/// Failures that end a discovery run
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("setup failed: {0}")]
    Setup(String),

    #[error("invalid discovery target: {0}")]
    InvalidTarget(String),

    #[error("failed to get next action: {0}")]
    Reasoning(#[from] ProviderError),

    #[error("failed to parse next action: {0}")]
    Parse(#[from] ActionParseError),

    #[error("max iterations ({max_iterations}) reached without finalizing schema")]
    IterationLimitExceeded { max_iterations: u32 },
}

pub type Result<T> = std::result::Result<T, DiscoveryError>;
