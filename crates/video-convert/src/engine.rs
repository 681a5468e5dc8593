use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::EngineError;

/// Receives fractional progress while the engine runs.
pub type ProgressFn = dyn Fn(f64) + Send + Sync;

/// Capability set of a transcoding engine.
///
/// The engine owns an addressable working storage: inputs are written into
/// it by name before [`Engine::run`], outputs are read back out by name after.
#[async_trait]
pub trait Engine: Send + Sync {
    fn is_loaded(&self) -> bool;

    async fn load(&self) -> Result<(), EngineError>;

    async fn write_file(&self, name: &str, bytes: Bytes) -> Result<(), EngineError>;

    /// Runs one invocation. `progress` may be called any number of times.
    async fn run(&self, args: &[String], progress: &ProgressFn) -> Result<(), EngineError>;

    /// Returns `None` when nothing is stored under `name`.
    async fn read_file(&self, name: &str) -> Option<Bytes>;
}

/// Shared handle to the one engine instance of the process.
pub struct EngineHandle<E> {
    inner: Arc<E>,
}

impl<E: Engine> EngineHandle<E> {
    pub fn new(engine: E) -> Self {
        Self {
            inner: Arc::new(engine),
        }
    }
}

impl<E> Clone for EngineHandle<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E> Deref for EngineHandle<E> {
    type Target = E;

    fn deref(&self) -> &E {
        &self.inner
    }
}
