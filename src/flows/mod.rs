pub mod local_assistant;
pub mod room_matcher;
pub mod vibe_checker;

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};
use validator::{Validate, ValidationError};

use crate::llm::{GenerativeModel, ModelError, ModelRequest, extract_json_object};

pub use local_assistant::{AssistantAnswer, AssistantQuery, LocalAssistantFlow};
pub use room_matcher::{RoomMatch, RoomMatchList, RoomMatcherFlow, RoomSearchCriteria};
pub use vibe_checker::{CrowdLevel, TrendingPlace, VibeCheckerFlow, VibeQuery, VibeReport};

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("model invocation failed: {0}")]
    ModelInvocation(#[from] ModelError),
}

/// A named prompt-in, structured-data-out operation against the model.
/// Both sides are checked with `validator` every time they cross the flow boundary.
pub trait Flow {
    const NAME: &'static str;
    type Input: Validate + Sync;
    type Output: Validate + DeserializeOwned;

    fn render_prompt(input: &Self::Input) -> String;
    fn output_schema() -> Value;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Idle,
    Requesting,
    Succeeded,
    Failed,
}

/// Tracks one flow invocation through `Idle -> Requesting -> {Succeeded, Failed}`.
#[derive(Debug)]
pub struct FlowRun {
    flow: &'static str,
    state: FlowState,
}

impl FlowRun {
    pub fn new(flow: &'static str) -> Self {
        Self {
            flow,
            state: FlowState::Idle,
        }
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn begin(&mut self) {
        debug_assert_eq!(self.state, FlowState::Idle);
        self.state = FlowState::Requesting;
        debug!("{}: {:?}", self.flow, self.state);
    }

    pub fn finish<T>(&mut self, outcome: &Result<T, FlowError>) {
        debug_assert_eq!(self.state, FlowState::Requesting);
        self.state = match outcome {
            Ok(_) => FlowState::Succeeded,
            Err(e) => {
                warn!("{} failed: {}", self.flow, e);
                FlowState::Failed
            }
        };
        info!("{}: {:?}", self.flow, self.state);
    }
}

/// Validate the input, call the model once and validate what comes back.
/// No retries: the first failure is returned to the caller.
pub async fn run_flow<F: Flow>(
    model: &dyn GenerativeModel,
    input: &F::Input,
) -> Result<F::Output, FlowError> {
    input
        .validate()
        .map_err(|e| FlowError::InvalidRequest(e.to_string()))?;

    let mut run = FlowRun::new(F::NAME);
    run.begin();
    let outcome = invoke::<F>(model, input).await.map_err(FlowError::from);
    run.finish(&outcome);
    outcome
}

async fn invoke<F: Flow>(
    model: &dyn GenerativeModel,
    input: &F::Input,
) -> Result<F::Output, ModelError> {
    let request = ModelRequest {
        flow: F::NAME,
        prompt: F::render_prompt(input),
        output_schema: F::output_schema(),
    };
    debug!("Rendered prompt for {}: {}", F::NAME, request.prompt);

    let raw = model.generate(&request).await?;
    parse_output::<F::Output>(&raw)
}

/// Turn raw model text into a schema-conforming value, or say why it isn't one.
pub fn parse_output<T: Validate + DeserializeOwned>(raw: &str) -> Result<T, ModelError> {
    let json = extract_json_object(raw)?;
    let output: T =
        serde_json::from_str(json).map_err(|e| ModelError::Malformed(e.to_string()))?;
    output
        .validate()
        .map_err(|e| ModelError::SchemaViolation(e.to_string()))?;
    Ok(output)
}

/// Text fields that have to carry something other than whitespace.
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("not_blank");
        err.message = Some("cannot be empty or only whitespace".into());
        return Err(err);
    }
    Ok(())
}
