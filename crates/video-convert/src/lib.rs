pub mod engine;
pub mod error;
pub mod ffmpeg;
pub mod format;
pub mod input;
pub mod policy;
pub mod progress;
pub mod workflow;

#[cfg(test)]
mod test_support;

pub use engine::{Engine, EngineHandle, ProgressFn};
pub use error::{ConversionError, EngineError};
pub use ffmpeg::FfmpegEngine;
pub use format::{OutputFormat, PreviewKind, QualityTier};
pub use input::{InputFile, accept_input, format_bytes};
pub use policy::{
    DirectivePlan, build_directive_sequence, derive_output_name, mime_type_for, mime_type_for_name,
};
pub use workflow::{
    ConversionController, ConversionRequest, ConversionResult, NoopObserver, Rejection,
    StartOutcome, WorkflowObserver, WorkflowState,
};
