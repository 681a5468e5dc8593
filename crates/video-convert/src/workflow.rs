use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::{
    engine::{Engine, EngineHandle},
    error::ConversionError,
    format::{OutputFormat, PreviewKind, QualityTier},
    input::InputFile,
    policy::DirectivePlan,
};

#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub input_bytes: Option<Bytes>,
    pub input_name: String,
    pub output_format: OutputFormat,
    pub quality: QualityTier,
}

impl ConversionRequest {
    pub fn new(input: InputFile, output_format: OutputFormat, quality: QualityTier) -> Self {
        Self {
            input_bytes: Some(input.bytes),
            input_name: input.name,
            output_format,
            quality,
        }
    }

    pub fn plan(&self) -> DirectivePlan {
        DirectivePlan::new(&self.input_name, self.output_format, self.quality)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResult {
    pub output_bytes: Bytes,
    pub output_name: String,
    pub mime_type: &'static str,
    pub preview: PreviewKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    #[default]
    Idle,
    EngineLoading,
    Staging,
    Running,
    Succeeded,
    Failed,
}

/// Why `start` refused to begin a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("a conversion is already in progress")]
    Busy,
    #[error("no input file selected")]
    NoInput,
}

#[derive(Debug)]
pub enum StartOutcome {
    Rejected(Rejection),
    Finished(Result<ConversionResult, ConversionError>),
}

/// UI bindings notified synchronously as a conversion moves through its states.
pub trait WorkflowObserver: Send + Sync {
    fn on_state(&self, _state: WorkflowState) {}

    fn on_progress(&self, _ratio: f64) {}

    fn on_trigger_enabled(&self, _enabled: bool) {}

    fn on_outcome(&self, _outcome: &Result<ConversionResult, ConversionError>) {}
}

pub struct NoopObserver;

impl WorkflowObserver for NoopObserver {}

/// Runs one conversion at a time against a shared engine.
pub struct ConversionController<E: Engine> {
    engine: EngineHandle<E>,
    observer: Arc<dyn WorkflowObserver>,
    state: Mutex<WorkflowState>,
}

impl<E: Engine> ConversionController<E> {
    pub fn new(engine: EngineHandle<E>, observer: Arc<dyn WorkflowObserver>) -> Self {
        Self {
            engine,
            observer,
            state: Mutex::new(WorkflowState::Idle),
        }
    }

    pub fn state(&self) -> WorkflowState {
        *self.state.lock()
    }

    pub fn engine(&self) -> &EngineHandle<E> {
        &self.engine
    }

    /// Runs `request` to completion, or rejects it without side effects when
    /// another conversion is in flight or no input was provided.
    pub async fn start(&self, request: ConversionRequest) -> StartOutcome {
        let Some(input_bytes) = request.input_bytes.clone() else {
            return StartOutcome::Rejected(Rejection::NoInput);
        };

        let Some(first) = self.admit() else {
            info!("Conversion of {} rejected: already running", request.input_name);
            return StartOutcome::Rejected(Rejection::Busy);
        };

        let mut in_flight = InFlight {
            state: &self.state,
            observer: self.observer.as_ref(),
            armed: true,
        };
        self.observer.on_trigger_enabled(false);
        self.observer.on_state(first);

        let outcome = self.convert(&request, input_bytes, first).await;
        in_flight.armed = false;
        self.finish(&outcome);
        StartOutcome::Finished(outcome)
    }

    fn admit(&self) -> Option<WorkflowState> {
        let mut state = self.state.lock();
        if *state != WorkflowState::Idle {
            return None;
        }
        *state = if self.engine.is_loaded() {
            WorkflowState::Staging
        } else {
            WorkflowState::EngineLoading
        };
        Some(*state)
    }

    fn transition(&self, next: WorkflowState) {
        *self.state.lock() = next;
        self.observer.on_state(next);
    }

    async fn convert(
        &self,
        request: &ConversionRequest,
        input_bytes: Bytes,
        first: WorkflowState,
    ) -> Result<ConversionResult, ConversionError> {
        let plan = request.plan();

        if first == WorkflowState::EngineLoading {
            info!("Loading engine...");
            self.engine
                .load()
                .await
                .map_err(|e| ConversionError::EngineUnavailable(e.to_string()))?;
            self.transition(WorkflowState::Staging);
        }

        self.engine
            .write_file(&plan.input_name, input_bytes)
            .await
            .map_err(|e| ConversionError::StagingFailed {
                name: plan.input_name.clone(),
                message: e.to_string(),
            })?;

        self.transition(WorkflowState::Running);
        self.observer.on_progress(0.0);
        info!("Running engine: {}", plan.args.join(" "));

        let observer = Arc::clone(&self.observer);
        let progress = move |ratio: f64| observer.on_progress(ratio);
        self.engine
            .run(&plan.args, &progress)
            .await
            .map_err(|e| ConversionError::EncodeFailed(e.to_string()))?;

        let output_bytes = self
            .engine
            .read_file(&plan.output_name)
            .await
            .ok_or_else(|| ConversionError::OutputMissing(plan.output_name.clone()))?;

        Ok(ConversionResult {
            output_bytes,
            output_name: plan.output_name,
            mime_type: plan.mime_type,
            preview: request.output_format.preview_kind(),
        })
    }

    fn finish(&self, outcome: &Result<ConversionResult, ConversionError>) {
        match outcome {
            Ok(result) => {
                info!(
                    "Conversion complete: {} ({} bytes)",
                    result.output_name,
                    result.output_bytes.len()
                );
                self.transition(WorkflowState::Succeeded);
            }
            Err(err) => {
                error!("Error during conversion: {err}");
                self.transition(WorkflowState::Failed);
            }
        }

        self.observer.on_outcome(outcome);
        self.transition(WorkflowState::Idle);
        self.observer.on_trigger_enabled(true);
    }
}

/// Releases the controller when a `start` future is dropped before the
/// conversion reaches a terminal state.
struct InFlight<'a> {
    state: &'a Mutex<WorkflowState>,
    observer: &'a dyn WorkflowObserver,
    armed: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        warn!("Conversion abandoned before completion");
        *self.state.lock() = WorkflowState::Idle;
        self.observer.on_state(WorkflowState::Idle);
        self.observer.on_trigger_enabled(true);
    }
}
