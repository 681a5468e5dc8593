mod console;

use std::{env, path::PathBuf, sync::Arc};

use anyhow::{Context, anyhow, bail};
use bytes::Bytes;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vidshift_convert::{
    ConversionController, ConversionRequest, EngineHandle, FfmpegEngine, OutputFormat,
    QualityTier, StartOutcome, accept_input, format_bytes,
};

use crate::console::ConsoleObserver;

#[derive(Parser, Debug)]
#[command(author, version, about = "Converts a video file to another container", long_about = None)]
struct Cli {
    /// Video file to convert
    input: PathBuf,

    /// Output container: mp4, webm, mov, avi, mkv, flv, wmv or gif
    #[arg(long, short, default_value_t = OutputFormat::default(), env = "VIDSHIFT_FORMAT")]
    format: OutputFormat,

    /// Quality tier: high, medium or low (ignored for gif)
    #[arg(long, short, default_value_t = QualityTier::default(), env = "VIDSHIFT_QUALITY")]
    quality: QualityTier,

    /// Directory the converted file is written to
    #[arg(long, short, default_value = ".")]
    out_dir: PathBuf,

    /// ffmpeg executable to use instead of the one on PATH
    #[arg(long, env = "FFMPEG_PATH")]
    ffmpeg: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let rust_log = env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();
    let env_filter = match rust_log.is_empty() {
        true => EnvFilter::builder().parse_lossy("info"),
        false => EnvFilter::builder().parse_lossy(rust_log),
    };
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    let name = cli
        .input
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("{} is not a file name", cli.input.display()))?
        .to_string();
    let mime = mime_guess::from_path(&cli.input)
        .first_raw()
        .unwrap_or_default();
    let bytes = tokio::fs::read(&cli.input)
        .await
        .with_context(|| format!("failed to read {}", cli.input.display()))?;

    let input = accept_input(name, mime, Bytes::from(bytes))?;
    info!(
        "Selected file: {} | Size: {} | Type: {}",
        input.name,
        format_bytes(input.size(), 2),
        if input.mime.is_empty() { "unknown" } else { input.mime.as_str() }
    );

    let engine = EngineHandle::new(FfmpegEngine::new(cli.ffmpeg)?);
    let controller = ConversionController::new(engine, Arc::new(ConsoleObserver::new()));
    let request = ConversionRequest::new(input, cli.format, cli.quality);

    let result = match controller.start(request).await {
        StartOutcome::Finished(Ok(result)) => result,
        StartOutcome::Finished(Err(err)) => bail!("Error during conversion: {err}"),
        StartOutcome::Rejected(reason) => bail!("Conversion not started: {reason}"),
    };

    tokio::fs::create_dir_all(&cli.out_dir)
        .await
        .with_context(|| format!("failed to create {}", cli.out_dir.display()))?;
    let output_path = cli.out_dir.join(&result.output_name);
    tokio::fs::write(&output_path, &result.output_bytes)
        .await
        .with_context(|| format!("failed to write {}", output_path.display()))?;

    info!(
        "Saved {} ({}, {:?} preview)",
        output_path.display(),
        result.mime_type,
        result.preview
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["vidshift", "clip.mov"]).expect("parse");
        assert_eq!(cli.format, OutputFormat::Mp4);
        assert_eq!(cli.quality, QualityTier::Medium);
        assert_eq!(cli.out_dir, PathBuf::from("."));
    }

    #[test]
    fn test_cli_selection() {
        let cli = Cli::try_parse_from(["vidshift", "clip.mov", "-f", "gif", "-q", "low"])
            .expect("parse");
        assert_eq!(cli.format, OutputFormat::Gif);
        assert_eq!(cli.quality, QualityTier::Low);
    }

    #[test]
    fn test_cli_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["vidshift", "clip.mov", "--format", "ogv"]).is_err());
    }
}
