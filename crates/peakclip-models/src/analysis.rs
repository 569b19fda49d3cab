//! Loudness analysis parameters.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default window length in seconds.
pub const DEFAULT_WINDOW_SECS: f64 = 2.0;
/// Default stride between window starts in seconds.
pub const DEFAULT_HOP_SECS: f64 = 0.5;
/// Default per-bin selection cap.
pub const DEFAULT_PEAKS_PER_BIN: usize = 5;
/// Default loudness floor for candidates.
pub const DEFAULT_MIN_RMS: f64 = 0.005;
/// Fairness bin size (15 minutes).
pub const BIN_SIZE_SECS: f64 = 900.0;
/// Default maximum chunk length when splitting long recordings.
pub const DEFAULT_CHUNK_SECONDS: u32 = 900;
/// Seconds of audio per granted peak when computing per-chunk quotas.
pub const SECONDS_PER_PEAK: f64 = 60.0;

/// Window length and stride for one selection run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WindowParams {
    /// Window length in seconds
    #[serde(default = "default_window")]
    pub window: f64,

    /// Stride between window starts in seconds
    #[serde(default = "default_hop")]
    pub hop: f64,
}

fn default_window() -> f64 {
    DEFAULT_WINDOW_SECS
}

fn default_hop() -> f64 {
    DEFAULT_HOP_SECS
}

impl Default for WindowParams {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW_SECS,
            hop: DEFAULT_HOP_SECS,
        }
    }
}

impl WindowParams {
    pub fn new(window: f64, hop: f64) -> Self {
        Self { window, hop }
    }
}

/// Selection quotas and thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SelectionConfig {
    /// Maximum segments accepted per bin
    #[serde(default = "default_peaks_per_bin")]
    pub peaks_per_bin: usize,

    /// Windows quieter than this are never candidates
    #[serde(default = "default_min_rms")]
    pub min_rms: f64,

    /// Bin length in seconds
    #[serde(default = "default_bin_size")]
    pub bin_size_sec: f64,
}

fn default_peaks_per_bin() -> usize {
    DEFAULT_PEAKS_PER_BIN
}

fn default_min_rms() -> f64 {
    DEFAULT_MIN_RMS
}

fn default_bin_size() -> f64 {
    BIN_SIZE_SECS
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            peaks_per_bin: DEFAULT_PEAKS_PER_BIN,
            min_rms: DEFAULT_MIN_RMS,
            bin_size_sec: BIN_SIZE_SECS,
        }
    }
}

impl SelectionConfig {
    /// Builder-style setter for the per-bin cap.
    pub fn with_peaks_per_bin(mut self, peaks_per_bin: usize) -> Self {
        self.peaks_per_bin = peaks_per_bin;
        self
    }

    /// Builder-style setter for the loudness floor.
    pub fn with_min_rms(mut self, min_rms: f64) -> Self {
        self.min_rms = min_rms;
        self
    }

    /// Builder-style setter for the bin size.
    pub fn with_bin_size(mut self, bin_size_sec: f64) -> Self {
        self.bin_size_sec = bin_size_sec;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let window = WindowParams::default();
        assert_eq!(window.window, 2.0);
        assert_eq!(window.hop, 0.5);

        let config = SelectionConfig::default();
        assert_eq!(config.peaks_per_bin, 5);
        assert!((config.min_rms - 0.005).abs() < f64::EPSILON);
        assert_eq!(config.bin_size_sec, 900.0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: SelectionConfig = serde_json::from_str(r#"{"peaks_per_bin": 3}"#).unwrap();
        assert_eq!(config.peaks_per_bin, 3);
        assert_eq!(config.bin_size_sec, BIN_SIZE_SECS);
    }
}
