use std::sync::LazyLock;

use regex::Regex;

static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Duration: (\d+):(\d+):(\d+(?:\.\d+)?)").expect("invalid duration regex")
});
static OUT_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^out_time_(?:ms|us)=(\d+)$").expect("invalid out_time regex"));

/// Turns ffmpeg log and `-progress` lines into completion ratios.
///
/// The input duration is taken from the first `Duration:` line; each
/// `out_time_us=` line after it yields `time / duration`. Ratios are not
/// clamped.
#[derive(Debug, Default)]
pub struct ProgressParser {
    duration: Option<f64>,
}

impl ProgressParser {
    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    pub fn feed(&mut self, line: &str) -> Option<f64> {
        let line = line.trim();

        if self.duration.is_none()
            && let Some(caps) = DURATION_RE.captures(line)
        {
            let hours: f64 = caps[1].parse().unwrap_or(0.0);
            let minutes: f64 = caps[2].parse().unwrap_or(0.0);
            let seconds: f64 = caps[3].parse().unwrap_or(0.0);
            self.duration = Some(hours * 3600.0 + minutes * 60.0 + seconds);
            return None;
        }

        if line == "progress=end" {
            return Some(1.0);
        }

        let caps = OUT_TIME_RE.captures(line)?;
        let duration = self.duration.filter(|d| *d > 0.0)?;
        // ffmpeg reports both keys in microseconds.
        let micros: f64 = caps[1].parse().ok()?;
        Some(micros / 1_000_000.0 / duration)
    }
}
