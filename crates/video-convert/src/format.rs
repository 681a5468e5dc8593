use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ConversionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Mp4,
    Webm,
    Mov,
    Avi,
    Mkv,
    Flv,
    Wmv,
    Gif,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 8] = [
        OutputFormat::Mp4,
        OutputFormat::Webm,
        OutputFormat::Mov,
        OutputFormat::Avi,
        OutputFormat::Mkv,
        OutputFormat::Flv,
        OutputFormat::Wmv,
        OutputFormat::Gif,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Mp4 => "mp4",
            OutputFormat::Webm => "webm",
            OutputFormat::Mov => "mov",
            OutputFormat::Avi => "avi",
            OutputFormat::Mkv => "mkv",
            OutputFormat::Flv => "flv",
            OutputFormat::Wmv => "wmv",
            OutputFormat::Gif => "gif",
        }
    }

    /// Recognizes a file name whose extension is one of the supported containers.
    pub fn from_extension(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        ext.parse().ok()
    }

    /// Gif output is shown as an image; everything else gets a player.
    pub fn preview_kind(&self) -> PreviewKind {
        match self {
            OutputFormat::Gif => PreviewKind::Image,
            _ => PreviewKind::Video,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        OutputFormat::ALL
            .into_iter()
            .find(|format| format.as_str() == lower)
            .ok_or_else(|| ConversionError::InvalidInput(format!("unsupported output format: {s}")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    High,
    #[default]
    Medium,
    Low,
}

impl QualityTier {
    pub const ALL: [QualityTier; 3] = [QualityTier::High, QualityTier::Medium, QualityTier::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityTier::High => "high",
            QualityTier::Medium => "medium",
            QualityTier::Low => "low",
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QualityTier {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        QualityTier::ALL
            .into_iter()
            .find(|tier| tier.as_str() == lower)
            .ok_or_else(|| ConversionError::InvalidInput(format!("unsupported quality tier: {s}")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewKind {
    Video,
    Image,
}
