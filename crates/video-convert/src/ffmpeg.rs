use std::{
    path::{Path, PathBuf},
    process::Stdio,
};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use tempfile::TempDir;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    process::Command,
};
use tracing::{debug, info, warn};

use crate::{
    engine::{Engine, ProgressFn},
    error::EngineError,
    progress::ProgressParser,
};

pub const FFMPEG_PATH_ENV: &str = "FFMPEG_PATH";

/// Flags the engine adds in front of every invocation so that progress
/// arrives as newline-terminated `key=value` lines on stderr.
const BASE_ARGS: [&str; 4] = ["-hide_banner", "-nostats", "-progress", "pipe:2"];

/// [`Engine`] backed by a local `ffmpeg` executable.
///
/// The working storage is a private temporary directory that lives as long
/// as the engine; names written into it must be plain file names.
#[derive(Debug)]
pub struct FfmpegEngine {
    configured: Option<PathBuf>,
    binary: RwLock<Option<PathBuf>>,
    workdir: TempDir,
}

impl FfmpegEngine {
    pub fn new(configured: Option<PathBuf>) -> std::io::Result<Self> {
        let workdir = tempfile::Builder::new().prefix("vidshift-").tempdir()?;
        debug!("Engine working storage at {}", workdir.path().display());
        Ok(Self {
            configured,
            binary: RwLock::new(None),
            workdir,
        })
    }

    pub fn workdir(&self) -> &Path {
        self.workdir.path()
    }

    fn resolve_binary(&self) -> Result<PathBuf, EngineError> {
        if let Some(path) = &self.configured {
            return Ok(path.clone());
        }
        if let Ok(path) = std::env::var(FFMPEG_PATH_ENV)
            && !path.is_empty()
        {
            return Ok(PathBuf::from(path));
        }
        which::which("ffmpeg")
            .map_err(|e| EngineError::Load(format!("ffmpeg was not found on PATH: {e}")))
    }

    fn storage_path(&self, name: &str) -> Result<PathBuf, EngineError> {
        if !is_plain_file_name(name) {
            return Err(EngineError::InvalidName(name.to_string()));
        }
        Ok(self.workdir.path().join(name))
    }
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.contains('\0')
}

#[async_trait]
impl Engine for FfmpegEngine {
    fn is_loaded(&self) -> bool {
        self.binary.read().is_some()
    }

    async fn load(&self) -> Result<(), EngineError> {
        let path = self.resolve_binary()?;
        info!("Loading ffmpeg from {}", path.display());

        let output = Command::new(&path)
            .arg("-version")
            .output()
            .await
            .map_err(|e| EngineError::Load(format!("failed to start {}: {e}", path.display())))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::Load(format!(
                "{} -version failed: {}",
                path.display(),
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        info!("FFmpeg version: {}", stdout.lines().next().unwrap_or("unknown"));

        *self.binary.write() = Some(path);
        Ok(())
    }

    async fn write_file(&self, name: &str, bytes: Bytes) -> Result<(), EngineError> {
        let path = self.storage_path(name)?;
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| EngineError::Storage {
                name: name.to_string(),
                message: e.to_string(),
            })?;
        debug!("Staged {} ({} bytes)", name, bytes.len());
        Ok(())
    }

    async fn run(&self, args: &[String], progress: &ProgressFn) -> Result<(), EngineError> {
        let binary = self.binary.read().clone().ok_or(EngineError::NotLoaded)?;

        let mut child = Command::new(&binary)
            .args(BASE_ARGS)
            .args(protect_file_operands(args))
            .current_dir(self.workdir.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stderr = child.stderr.take().ok_or(EngineError::StderrUnavailable)?;

        // Metadata tags are echoed as raw bytes, so lines are not always UTF-8.
        let mut segments = BufReader::new(stderr).split(b'\n');
        let mut parser = ProgressParser::default();
        let mut last_message = String::new();

        while let Some(segment) = segments.next_segment().await? {
            let line = String::from_utf8_lossy(&segment);
            let line = line.trim_end_matches('\r');
            if let Some(ratio) = parser.feed(line) {
                progress(ratio);
                continue;
            }
            // -progress emits key=value pairs; everything else is log output.
            if is_progress_field(line) {
                continue;
            }
            debug!(target: "ffmpeg", "{line}");
            if !line.trim().is_empty() {
                last_message = line.trim().to_string();
            }
        }

        let status = child.wait().await?;
        if !status.success() {
            warn!("ffmpeg exited with {status}");
            return Err(EngineError::Run {
                code: status.code(),
                message: last_message,
            });
        }
        Ok(())
    }

    async fn read_file(&self, name: &str) -> Option<Bytes> {
        let path = self.storage_path(name).ok()?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Some(Bytes::from(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!("Failed to read {} from engine storage: {e}", name);
                None
            }
        }
    }
}

/// Prefixes the `-i` operand and the trailing output name with `./` when they
/// start with `-`, so ffmpeg does not read a file name as an option.
fn protect_file_operands(args: &[String]) -> Vec<String> {
    let last = args.len().saturating_sub(1);
    args.iter()
        .enumerate()
        .map(|(i, arg)| {
            let is_operand = (i > 0 && (i == last || args[i - 1] == "-i"))
                && arg.starts_with('-')
                && is_plain_file_name(arg);
            match is_operand {
                true => format!("./{arg}"),
                false => arg.clone(),
            }
        })
        .collect()
}

fn is_progress_field(line: &str) -> bool {
    line.split_once('=').is_some_and(|(key, _)| {
        !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    })
}
