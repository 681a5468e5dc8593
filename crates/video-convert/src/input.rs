use bytes::Bytes;

use crate::{error::ConversionError, format::OutputFormat};

const SIZE_UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

/// A file the user picked, already read into memory.
#[derive(Debug, Clone)]
pub struct InputFile {
    pub name: String,
    pub mime: String,
    pub bytes: Bytes,
}

impl InputFile {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Accepts a file when its MIME type is `video/*` or its extension names a
/// supported container.
pub fn accept_input(
    name: impl Into<String>,
    mime: impl Into<String>,
    bytes: Bytes,
) -> Result<InputFile, ConversionError> {
    let name = name.into();
    let mime = mime.into();

    if !mime.starts_with("video/") && OutputFormat::from_extension(&name).is_none() {
        return Err(ConversionError::InvalidInput(
            "Please select a video file".to_string(),
        ));
    }

    Ok(InputFile { name, mime, bytes })
}

/// Human readable size using 1024-based units, e.g. `10 MB` or `1.5 KB`.
pub fn format_bytes(bytes: u64, decimals: usize) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let mut text = format!("{value:.decimals$}");
    if text.contains('.') {
        text = text.trim_end_matches('0').trim_end_matches('.').to_string();
    }
    format!("{text} {}", SIZE_UNITS[unit])
}
