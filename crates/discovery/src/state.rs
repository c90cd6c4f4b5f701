//! Discovery state machine
//!
//! `DiscoveryState` owns everything one run mutates. Each event (a parsed
//! action, a probe outcome) is applied through a `&mut self` transition that
//! returns the next [`Step`]; the orchestrator performs the step's effect and
//! feeds the result back in. Nothing here touches the network.

use schemaprobe_provider::Message;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::action::{Action, ActionKind};
use crate::analyzer;
use crate::ledger::{looks_server_generated, FieldLedger, NEUTRALIZED_FIELDS};
use crate::policy::{self, DiscoveredSchema};
use crate::probe::{ProbeOutcome, ProbePlan};
use crate::prompt;
use crate::request::DiscoveryTarget;

/// What the driver should do next
#[derive(Debug)]
pub enum Step {
    /// Ask the reasoning service for the next action
    Propose,
    /// Send the planned probe
    Probe(ProbePlan),
    /// Run finished with a schema
    Finish(DiscoveredSchema),
}

/// Per-run aggregate: conversation, field ledger and current body
#[derive(Debug, Clone)]
pub struct DiscoveryState {
    target: DiscoveryTarget,
    conversation: Vec<Message>,
    ledger: FieldLedger,
    current_body: Map<String, Value>,
}

impl DiscoveryState {
    /// Seed the conversation with the strategy prompt and the task
    pub fn new(target: DiscoveryTarget) -> Self {
        let conversation = vec![
            Message::system(prompt::STRATEGY_PROMPT),
            Message::user(prompt::task_statement(&target)),
        ];
        let current_body = target.initial_body.clone();
        Self {
            target,
            conversation,
            ledger: FieldLedger::new(),
            current_body,
        }
    }

    pub fn target(&self) -> &DiscoveryTarget {
        &self.target
    }

    pub fn conversation(&self) -> &[Message] {
        &self.conversation
    }

    pub fn ledger(&self) -> &FieldLedger {
        &self.ledger
    }

    pub fn current_body(&self) -> &Map<String, Value> {
        &self.current_body
    }

    /// Append the raw reply as the assistant turn, before it is parsed
    pub fn record_reply(&mut self, content: &str) {
        self.conversation.push(Message::assistant(content));
    }

    fn note(&mut self, content: String) {
        self.conversation.push(Message::system(content));
    }

    pub fn on_action(&mut self, action: Action) -> Step {
        if !action.explanation.is_empty() {
            debug!("proposal: {}", action.explanation);
        }

        match action.kind {
            ActionKind::Complete if policy::is_complete(&self.ledger) => {
                info!("completion accepted with {} fields", self.ledger.len());
                Step::Finish(policy::build_schema(&self.ledger, Value::Null))
            }
            ActionKind::Complete => {
                let message = prompt::completion_rejected(&self.ledger);
                info!("completion rejected");
                self.note(message);
                Step::Propose
            }
            ActionKind::ModifyFields => {
                Step::Probe(ProbePlan::build(&action.body, &self.target.url))
            }
        }
    }

    pub fn on_probe(&mut self, outcome: ProbeOutcome) -> Step {
        let ProbeOutcome { payload, result } = outcome;

        if let Value::Object(sent) = &payload {
            for (key, value) in sent {
                self.current_body.insert(key.clone(), value.clone());
            }
        }

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                warn!("probe failed: {}", e);
                self.note(prompt::transport_failure(&e));
                return Step::Propose;
            }
        };

        if response.is_success() {
            info!("probe succeeded with status {}", response.status);
            self.absorb_success(&payload, response.json());
            return Step::Finish(policy::build_schema(&self.ledger, payload));
        }

        info!("probe rejected with status {}", response.status);
        let findings = analyzer::analyze_into(&mut self.ledger, &response.body_text());
        self.note(prompt::error_summary(&response, &findings));
        let status = prompt::field_status(&self.ledger);
        self.note(status);
        Step::Propose
    }

    fn absorb_success(&mut self, payload: &Value, response_body: Option<Value>) {
        let sent = match payload {
            Value::Object(map) => Some(map),
            Value::Array(items) => items.first().and_then(Value::as_object),
            _ => None,
        };

        if let Some(Value::Object(returned)) = &response_body {
            for (key, value) in returned {
                self.ledger.observe(key, value);
            }
            for key in returned.keys() {
                let echoed = sent.is_some_and(|s| s.contains_key(key));
                if !echoed && looks_server_generated(key) {
                    debug!("{} looks server generated", key);
                    self.ledger.set_server_generated(key);
                }
            }
        }

        // Everything in the accepted request is part of the minimal body
        if let Some(sent) = sent {
            for (key, value) in sent {
                self.ledger.observe(key, value);
                self.ledger.mark_required(key);
            }
        }

        for name in NEUTRALIZED_FIELDS {
            self.ledger.neutralize(name);
        }
    }
}
