//! Scripted engine and recording observer for exercising the workflow.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::{
    engine::{Engine, ProgressFn},
    error::{ConversionError, EngineError},
    workflow::{ConversionResult, WorkflowObserver, WorkflowState},
};

#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Load,
    Write(String),
    Run(Vec<String>),
    Read(String),
}

#[derive(Default)]
pub struct FakeEngine {
    loaded: AtomicBool,
    load_error: Option<String>,
    write_error: Option<String>,
    run_error: Option<String>,
    skip_output: bool,
    progress: Vec<f64>,
    load_gate: Option<Arc<Notify>>,
    files: Mutex<HashMap<String, Bytes>>,
    calls: Mutex<Vec<EngineCall>>,
}

impl FakeEngine {
    pub const OUTPUT: &'static [u8] = b"converted";

    pub fn fail_load(mut self, message: &str) -> Self {
        self.load_error = Some(message.to_string());
        self
    }

    pub fn fail_write(mut self, message: &str) -> Self {
        self.write_error = Some(message.to_string());
        self
    }

    pub fn fail_run(mut self, message: &str) -> Self {
        self.run_error = Some(message.to_string());
        self
    }

    pub fn without_output(mut self) -> Self {
        self.skip_output = true;
        self
    }

    pub fn with_progress(mut self, ratios: Vec<f64>) -> Self {
        self.progress = ratios;
        self
    }

    /// `load` waits until the gate is notified.
    pub fn gate_load(mut self, gate: Arc<Notify>) -> Self {
        self.load_gate = Some(gate);
        self
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().clone()
    }

    fn record(&self, call: EngineCall) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl Engine for FakeEngine {
    fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    async fn load(&self) -> Result<(), EngineError> {
        self.record(EngineCall::Load);
        if let Some(gate) = &self.load_gate {
            gate.notified().await;
        }
        if let Some(message) = &self.load_error {
            return Err(EngineError::Load(message.clone()));
        }
        self.loaded.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn write_file(&self, name: &str, bytes: Bytes) -> Result<(), EngineError> {
        self.record(EngineCall::Write(name.to_string()));
        if let Some(message) = &self.write_error {
            return Err(EngineError::Storage {
                name: name.to_string(),
                message: message.clone(),
            });
        }
        self.files.lock().insert(name.to_string(), bytes);
        Ok(())
    }

    async fn run(&self, args: &[String], progress: &ProgressFn) -> Result<(), EngineError> {
        self.record(EngineCall::Run(args.to_vec()));
        for ratio in &self.progress {
            progress(*ratio);
        }
        if let Some(message) = &self.run_error {
            return Err(EngineError::Run {
                code: Some(1),
                message: message.clone(),
            });
        }
        if !self.skip_output
            && let Some(output) = args.last()
        {
            self.files
                .lock()
                .insert(output.clone(), Bytes::from_static(Self::OUTPUT));
        }
        Ok(())
    }

    async fn read_file(&self, name: &str) -> Option<Bytes> {
        self.record(EngineCall::Read(name.to_string()));
        self.files.lock().get(name).cloned()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObserverEvent {
    State(WorkflowState),
    Progress(f64),
    TriggerEnabled(bool),
    Outcome(Result<ConversionResult, ConversionError>),
}

#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ObserverEvent>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<ObserverEvent> {
        self.events.lock().clone()
    }

    pub fn states(&self) -> Vec<WorkflowState> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ObserverEvent::State(state) => Some(state),
                _ => None,
            })
            .collect()
    }

    pub fn progress(&self) -> Vec<f64> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ObserverEvent::Progress(ratio) => Some(ratio),
                _ => None,
            })
            .collect()
    }
}

impl WorkflowObserver for RecordingObserver {
    fn on_state(&self, state: WorkflowState) {
        self.events.lock().push(ObserverEvent::State(state));
    }

    fn on_progress(&self, ratio: f64) {
        self.events.lock().push(ObserverEvent::Progress(ratio));
    }

    fn on_trigger_enabled(&self, enabled: bool) {
        self.events.lock().push(ObserverEvent::TriggerEnabled(enabled));
    }

    fn on_outcome(&self, outcome: &Result<ConversionResult, ConversionError>) {
        self.events.lock().push(ObserverEvent::Outcome(outcome.clone()));
    }
}
