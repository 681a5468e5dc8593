use thiserror::Error;

/// Terminal failure of a conversion, surfaced to observers and callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    /// No file was selected, or the file is not recognizable as video.
    #[error("{0}")]
    InvalidInput(String),

    #[error("engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("failed to stage {name}: {message}")]
    StagingFailed { name: String, message: String },

    #[error("encode error: {0}")]
    EncodeFailed(String),

    #[error("output not produced: {0}")]
    OutputMissing(String),
}

/// Errors reported by an [`Engine`](crate::engine::Engine) implementation.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0}")]
    Load(String),

    #[error("engine is not loaded")]
    NotLoaded,

    #[error("invalid storage name: {0}")]
    InvalidName(String),

    #[error("storage error for {name}: {message}")]
    Storage { name: String, message: String },

    #[error("engine exited with {}: {message}", exit_label(.code))]
    Run { code: Option<i32>, message: String },

    /// The engine process was spawned without a readable stderr pipe.
    #[error("engine stderr was not captured")]
    StderrUnavailable,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {code}"),
        None => "signal".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_error_mentions_exit_code() {
        let err = EngineError::Run {
            code: Some(1),
            message: "Unknown encoder 'libxvid'".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "engine exited with code 1: Unknown encoder 'libxvid'"
        );
    }

    #[test]
    fn run_error_without_code_reports_signal() {
        let err = EngineError::Run {
            code: None,
            message: "killed".to_string(),
        };
        assert_eq!(err.to_string(), "engine exited with signal: killed");
    }

    #[test]
    fn missing_stderr_is_not_a_load_error() {
        let err = EngineError::StderrUnavailable;
        assert_eq!(err.to_string(), "engine stderr was not captured");
        assert!(!matches!(err, EngineError::Load(_)));
    }
}
