//! Pure translation from the user's selections to engine arguments.
//!
//! Nothing in here reads a clock, an environment variable or any shared
//! state: the same selection always produces the same directives.

use crate::format::{OutputFormat, QualityTier};

pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Codec and container arguments, one entry per output format.
const FORMAT_DIRECTIVES: [(OutputFormat, &[&str]); 8] = [
    (
        OutputFormat::Mp4,
        &["-c:v", "libx264", "-c:a", "aac", "-strict", "experimental", "-movflags", "+faststart"],
    ),
    (
        OutputFormat::Webm,
        &["-c:v", "libvpx-vp9", "-c:a", "libopus", "-b:v", "1M", "-row-mt", "1"],
    ),
    (
        OutputFormat::Mov,
        &["-c:v", "mpeg4", "-c:a", "aac", "-strict", "experimental", "-q:v", "3"],
    ),
    (
        OutputFormat::Avi,
        &["-c:v", "libxvid", "-c:a", "libmp3lame", "-qscale:v", "3"],
    ),
    (
        OutputFormat::Mkv,
        &["-c:v", "libx264", "-c:a", "aac", "-strict", "experimental"],
    ),
    (
        OutputFormat::Flv,
        &["-c:v", "flv", "-c:a", "mp3", "-ar", "44100"],
    ),
    (OutputFormat::Wmv, &["-c:v", "wmv2", "-c:a", "wmav2"]),
    (
        OutputFormat::Gif,
        &["-vf", "fps=15,scale=640:-1:flags=lanczos", "-f", "gif"],
    ),
];

/// (rate factor, preset) per tier.
const QUALITY_SETTINGS: [(QualityTier, &str, &str); 3] = [
    (QualityTier::High, "18", "slow"),
    (QualityTier::Medium, "23", "medium"),
    (QualityTier::Low, "28", "fast"),
];

const MIME_TYPES: [(OutputFormat, &str); 8] = [
    (OutputFormat::Mp4, "video/mp4"),
    (OutputFormat::Webm, "video/webm"),
    (OutputFormat::Mov, "video/quicktime"),
    (OutputFormat::Avi, "video/x-msvideo"),
    (OutputFormat::Mkv, "video/x-matroska"),
    (OutputFormat::Flv, "video/x-flv"),
    (OutputFormat::Wmv, "video/x-ms-wmv"),
    (OutputFormat::Gif, "image/gif"),
];

fn format_directives(format: OutputFormat) -> &'static [&'static str] {
    FORMAT_DIRECTIVES
        .iter()
        .find(|(f, _)| *f == format)
        .map(|(_, directives)| *directives)
        .unwrap_or(&[])
}

fn quality_settings(tier: QualityTier) -> Option<(&'static str, &'static str)> {
    QUALITY_SETTINGS
        .iter()
        .find(|(t, _, _)| *t == tier)
        .map(|(_, crf, preset)| (*crf, *preset))
}

/// Replaces the last extension of `input_name` with the format's name.
///
/// An extension is a trailing `.` followed by at least one character that is
/// neither `.` nor `/`; names without one are used whole as the stem.
pub fn derive_output_name(input_name: &str, format: OutputFormat) -> String {
    let stem = match input_name.rfind('.') {
        Some(idx) if idx + 1 < input_name.len() && !input_name[idx + 1..].contains('/') => {
            &input_name[..idx]
        }
        _ => input_name,
    };
    format!("{stem}.{}", format.as_str())
}

pub fn build_directive_sequence(
    input_name: &str,
    output_name: &str,
    format: OutputFormat,
    quality: QualityTier,
) -> Vec<String> {
    let mut args: Vec<String> = vec!["-i".into(), input_name.into(), "-y".into()];

    args.extend(format_directives(format).iter().map(|s| s.to_string()));

    // Gif has no rate control; the quality tier is ignored there.
    if format != OutputFormat::Gif
        && let Some((crf, preset)) = quality_settings(quality)
    {
        args.extend(["-crf", crf, "-preset", preset].map(String::from));
    }

    args.push(output_name.to_string());
    args
}

pub fn mime_type_for(format: OutputFormat) -> &'static str {
    MIME_TYPES
        .iter()
        .find(|(f, _)| *f == format)
        .map_or(FALLBACK_MIME_TYPE, |(_, mime)| *mime)
}

/// Like [`mime_type_for`], for a free-form format name.
pub fn mime_type_for_name(format: &str) -> &'static str {
    format
        .parse::<OutputFormat>()
        .map_or(FALLBACK_MIME_TYPE, mime_type_for)
}

/// Everything the workflow needs to know about one conversion, computed up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectivePlan {
    pub input_name: String,
    pub output_name: String,
    pub args: Vec<String>,
    pub mime_type: &'static str,
}

impl DirectivePlan {
    pub fn new(input_name: &str, format: OutputFormat, quality: QualityTier) -> Self {
        let output_name = derive_output_name(input_name, format);
        let args = build_directive_sequence(input_name, &output_name, format, quality);
        Self {
            input_name: input_name.to_string(),
            output_name,
            args,
            mime_type: mime_type_for(format),
        }
    }
}
