use std::sync::atomic::{AtomicI64, Ordering};

use tracing::{error, info};
use vidshift_convert::{
    ConversionError, ConversionResult, WorkflowObserver, WorkflowState, format_bytes,
};

/// Renders workflow progress to the log, one line per whole percent.
pub struct ConsoleObserver {
    last_percent: AtomicI64,
}

impl ConsoleObserver {
    pub fn new() -> Self {
        Self {
            last_percent: AtomicI64::new(-1),
        }
    }
}

impl Default for ConsoleObserver {
    fn default() -> Self {
        Self::new()
    }
}

pub fn percent(ratio: f64) -> i64 {
    (ratio * 100.0).round() as i64
}

impl WorkflowObserver for ConsoleObserver {
    fn on_state(&self, state: WorkflowState) {
        match state {
            WorkflowState::EngineLoading => info!("Loading FFmpeg..."),
            WorkflowState::Staging => info!("Starting conversion..."),
            WorkflowState::Idle => self.last_percent.store(-1, Ordering::Relaxed),
            _ => {}
        }
    }

    fn on_progress(&self, ratio: f64) {
        let percent = percent(ratio);
        if self.last_percent.swap(percent, Ordering::Relaxed) != percent {
            info!("{percent}%");
        }
    }

    fn on_outcome(&self, outcome: &Result<ConversionResult, ConversionError>) {
        match outcome {
            Ok(result) => info!(
                "✅ Conversion complete! Output file: {} ({})",
                result.output_name,
                format_bytes(result.output_bytes.len() as u64, 2)
            ),
            Err(err) => error!("❌ Error during conversion: {err}"),
        }
    }
}
