//! Pipeline configuration.

use peakclip_media::FfmpegRunner;
use peakclip_models::analysis::{DEFAULT_CHUNK_SECONDS, DEFAULT_MIN_RMS};

/// Upper bound for the default number of chunks analysed at once.
const DEFAULT_MAX_PARALLEL_CAP: usize = 4;

pub const ENV_MAX_PARALLEL: &str = "PEAKCLIP_MAX_PARALLEL";
pub const ENV_FFMPEG_TIMEOUT: &str = "PEAKCLIP_FFMPEG_TIMEOUT_SECS";
pub const ENV_CHUNK_SECONDS: &str = "PEAKCLIP_CHUNK_SECONDS";
pub const ENV_MIN_RMS: &str = "PEAKCLIP_MIN_RMS";

/// Pipeline configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Chunks decoded and scored concurrently
    pub max_parallel: usize,
    /// Kill ffmpeg after this many seconds
    pub ffmpeg_timeout_secs: Option<u64>,
    /// Length of the WAV chunks a recording is split into
    pub chunk_seconds: u32,
    /// Quietest window still considered a candidate
    pub min_rms: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_parallel: default_max_parallel(),
            ffmpeg_timeout_secs: None,
            chunk_seconds: DEFAULT_CHUNK_SECONDS,
            min_rms: DEFAULT_MIN_RMS,
        }
    }
}

fn default_max_parallel() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(DEFAULT_MAX_PARALLEL_CAP)
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary variable lookup. Unparseable values fall back to defaults.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            max_parallel: lookup(ENV_MAX_PARALLEL)
                .and_then(|s| s.parse().ok())
                .filter(|&n: &usize| n > 0)
                .unwrap_or(defaults.max_parallel),
            ffmpeg_timeout_secs: lookup(ENV_FFMPEG_TIMEOUT)
                .and_then(|s| s.parse().ok())
                .filter(|&secs: &u64| secs > 0),
            chunk_seconds: lookup(ENV_CHUNK_SECONDS)
                .and_then(|s| s.parse().ok())
                .filter(|&secs: &u32| secs > 0)
                .unwrap_or(defaults.chunk_seconds),
            min_rms: lookup(ENV_MIN_RMS)
                .and_then(|s| s.parse().ok())
                .filter(|v: &f64| v.is_finite() && *v >= 0.0)
                .unwrap_or(defaults.min_rms),
        }
    }

    /// FFmpeg runner honouring the configured timeout.
    pub fn runner(&self) -> FfmpegRunner {
        FfmpegRunner::new().with_optional_timeout(self.ffmpeg_timeout_secs)
    }
}
