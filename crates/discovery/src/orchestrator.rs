//! Discovery loop driver

use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use schemaprobe_provider::{ChatParams, Provider};

use crate::action::Action;
use crate::policy::DiscoveredSchema;
use crate::probe;
use crate::request::DiscoveryTarget;
use crate::state::{DiscoveryState, Step};
use crate::transport::Transport;
use crate::{DiscoveryError, Result};

/// Runs discovery against one target at a time.
///
/// Holds no per-run state, so one `Discoverer` can serve concurrent runs.
pub struct Discoverer<P: Provider + ?Sized, T: Transport + ?Sized> {
    provider: Arc<P>,
    transport: Arc<T>,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl<P: Provider + ?Sized, T: Transport + ?Sized> Discoverer<P, T> {
    pub fn new(provider: Arc<P>, transport: Arc<T>) -> Self {
        let defaults = ChatParams::default();
        Self {
            provider,
            transport,
            model: String::new(),
            max_tokens: defaults.max_tokens,
            temperature: defaults.temperature,
        }
    }

    /// Model name sent with every request; empty means the provider default
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Run one discovery to completion.
    ///
    /// Probe transport failures and target validation errors are absorbed
    /// into the conversation; only setup, reasoning, parse and budget
    /// failures end the run.
    pub async fn run(&self, target: DiscoveryTarget) -> Result<DiscoveredSchema> {
        if !self.provider.is_configured() {
            return Err(DiscoveryError::Setup(
                "reasoning provider has no API key configured".to_string(),
            ));
        }

        let run_id = Uuid::new_v4();
        let span = info_span!(
            "discovery",
            %run_id,
            method = %target.method,
            url = %target.url
        );
        self.drive(target).instrument(span).await
    }

    async fn drive(&self, target: DiscoveryTarget) -> Result<DiscoveredSchema> {
        let max_iterations = target.max_iterations;
        info!("starting discovery (max {} iterations)", max_iterations);

        let mut state = DiscoveryState::new(target);
        let mut iteration = 0;
        let mut step = Step::Propose;

        loop {
            step = match step {
                Step::Propose => {
                    if iteration >= max_iterations {
                        warn!("max iterations ({}) reached", max_iterations);
                        return Err(DiscoveryError::IterationLimitExceeded { max_iterations });
                    }
                    iteration += 1;
                    info!("iteration {}/{}", iteration, max_iterations);

                    let action = self.propose(&mut state).await?;
                    state.on_action(action)
                }
                Step::Probe(plan) => {
                    let outcome = probe::execute(self.transport.as_ref(), state.target(), plan).await;
                    state.on_probe(outcome)
                }
                Step::Finish(schema) => {
                    info!(
                        "discovery finished after {} iterations with {} fields",
                        iteration,
                        schema.fields.len()
                    );
                    return Ok(schema);
                }
            };
        }
    }

    async fn propose(&self, state: &mut DiscoveryState) -> Result<Action> {
        let params = ChatParams {
            model: self.model.clone(),
            messages: state.conversation().to_vec(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self.provider.chat(params).await?;
        state.record_reply(&response.content);

        let action = Action::parse(&response.content)?;
        debug!("next action: {:?} with {} body keys", action.kind, action.body.len());
        Ok(action)
    }
}
