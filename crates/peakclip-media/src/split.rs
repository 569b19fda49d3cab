//! Audio extraction and fixed-length WAV splitting.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use peakclip_models::analysis::DEFAULT_CHUNK_SECONDS;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe::probe_media;

/// Options for [`split_audio`].
#[derive(Debug, Clone)]
pub struct SplitOptions {
    /// Maximum chunk length in seconds
    pub segment_seconds: u32,
    /// Directory the chunks are written to
    pub output_dir: PathBuf,
    /// File name prefix; chunks are named `<prefix>_000.wav`, `<prefix>_001.wav`, ...
    pub prefix: String,
    /// Resample to this rate; `None` keeps the source rate
    pub sample_rate: Option<u32>,
    /// Channel count of the written chunks
    pub channels: u16,
}

impl SplitOptions {
    pub fn new(output_dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            segment_seconds: DEFAULT_CHUNK_SECONDS,
            output_dir: output_dir.into(),
            prefix: prefix.into(),
            sample_rate: None,
            channels: 2,
        }
    }

    pub fn with_segment_seconds(mut self, secs: u32) -> Self {
        self.segment_seconds = secs;
        self
    }

    pub fn with_sample_rate(mut self, rate: Option<u32>) -> Self {
        self.sample_rate = rate;
        self
    }

    pub fn with_channels(mut self, channels: u16) -> Self {
        self.channels = channels;
        self
    }

    /// ffmpeg segment-muxer output pattern.
    pub fn output_pattern(&self) -> PathBuf {
        self.output_dir.join(format!("{}_%03d.wav", self.prefix))
    }

    fn validate(&self) -> MediaResult<()> {
        if self.segment_seconds == 0 {
            return Err(MediaError::InvalidParameter(
                "segment length must be positive".to_string(),
            ));
        }
        if self.channels == 0 {
            return Err(MediaError::InvalidParameter(
                "channel count must be positive".to_string(),
            ));
        }
        if self.prefix.is_empty() {
            return Err(MediaError::InvalidParameter("prefix must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Build the segment-muxer command for `input`.
pub fn build_split_command(input: &Path, options: &SplitOptions) -> FfmpegCommand {
    let mut cmd = FfmpegCommand::new(input, options.output_pattern())
        .no_video()
        .audio_codec("pcm_s16le")
        .audio_channels(options.channels);
    if let Some(rate) = options.sample_rate {
        cmd = cmd.sample_rate(rate);
    }
    cmd.output_args([
        "-f".to_string(),
        "segment".to_string(),
        "-segment_time".to_string(),
        options.segment_seconds.to_string(),
        "-reset_timestamps".to_string(),
        "1".to_string(),
    ])
}

/// Split the audio track of `input` into fixed-length 16-bit WAV chunks.
///
/// Returns the written chunks in timeline order.
pub async fn split_audio(
    input: impl AsRef<Path>,
    options: &SplitOptions,
    runner: &FfmpegRunner,
) -> MediaResult<Vec<PathBuf>> {
    let input = input.as_ref();
    options.validate()?;

    if !input.exists() {
        return Err(MediaError::FileNotFound(input.to_path_buf()));
    }

    tokio::fs::create_dir_all(&options.output_dir).await?;

    // Chunks left by an earlier run would otherwise be listed with ours.
    let stale = remove_chunks(&options.output_dir, &options.prefix)?;
    if stale > 0 {
        debug!(removed = stale, "Removed chunks from a previous split");
    }

    // Only used for progress reporting.
    let total_secs = probe_media(input).await.map(|i| i.duration).unwrap_or(0.0);

    info!(
        input = %input.display(),
        output_dir = %options.output_dir.display(),
        segment_seconds = options.segment_seconds,
        "Splitting audio"
    );

    let cmd = build_split_command(input, options);
    runner
        .run_with_progress(&cmd, move |progress| {
            debug!(
                percent = progress.percentage(total_secs),
                speed = progress.speed,
                "Split progress"
            );
        })
        .await?;

    let chunks = list_chunks(&options.output_dir, &options.prefix)?;
    info!(chunks = chunks.len(), "Audio split complete");
    Ok(chunks)
}

/// Extract the whole audio track of `input` into a single 16-bit WAV.
pub async fn extract_audio_to_wav(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    sample_rate: Option<u32>,
    channels: u16,
    runner: &FfmpegRunner,
) -> MediaResult<PathBuf> {
    let input = input.as_ref();
    let output = output.as_ref();

    if !input.exists() {
        return Err(MediaError::FileNotFound(input.to_path_buf()));
    }
    if channels == 0 {
        return Err(MediaError::InvalidParameter(
            "channel count must be positive".to_string(),
        ));
    }
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let mut cmd = FfmpegCommand::new(input, output)
        .no_video()
        .audio_codec("pcm_s16le")
        .audio_channels(channels);
    if let Some(rate) = sample_rate {
        cmd = cmd.sample_rate(rate);
    }

    info!(
        input = %input.display(),
        output = %output.display(),
        "Extracting audio"
    );
    runner.run(&cmd).await?;

    Ok(output.to_path_buf())
}

/// List `<prefix>_<digits>.wav` files in `dir`, ordered by their index.
pub fn list_chunks(dir: impl AsRef<Path>, prefix: &str) -> MediaResult<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let mut indexed: Vec<(u64, PathBuf)> = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if let Some(index) = chunk_index(name, prefix) {
            indexed.push((index, entry.path()));
        }
    }

    indexed.sort_by_key(|(index, _)| *index);
    Ok(indexed.into_iter().map(|(_, path)| path).collect())
}

/// Delete every `<prefix>_<digits>.wav` file in `dir`, returning how many
/// were removed.
pub fn remove_chunks(dir: impl AsRef<Path>, prefix: &str) -> MediaResult<usize> {
    let chunks = list_chunks(dir, prefix)?;
    for chunk in &chunks {
        std::fs::remove_file(chunk)?;
    }
    Ok(chunks.len())
}

/// Parse the numeric suffix of a chunk file name.
fn chunk_index(name: &str, prefix: &str) -> Option<u64> {
    let digits = name
        .strip_prefix(prefix)?
        .strip_prefix('_')?
        .strip_suffix(".wav")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_chunk_index() {
        assert_eq!(chunk_index("show_000.wav", "show"), Some(0));
        assert_eq!(chunk_index("show_012.wav", "show"), Some(12));
        assert_eq!(chunk_index("show_1000.wav", "show"), Some(1000));
        assert_eq!(chunk_index("show.wav", "show"), None);
        assert_eq!(chunk_index("show_peaks.json", "show"), None);
        assert_eq!(chunk_index("show_final_000.wav", "show"), None);
        assert_eq!(chunk_index("show_.wav", "show"), None);
        assert_eq!(chunk_index("other_000.wav", "show"), None);
    }

    #[test]
    fn test_list_chunks_orders_numerically() {
        let dir = TempDir::new().unwrap();
        for name in ["ep_002.wav", "ep_000.wav", "ep_1000.wav", "ep_001.wav", "ep.wav", "ep_x.wav"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let names: Vec<String> = list_chunks(dir.path(), "ep")
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["ep_000.wav", "ep_001.wav", "ep_002.wav", "ep_1000.wav"]);
    }

    #[test]
    fn test_remove_chunks_clears_previous_split() {
        let dir = TempDir::new().unwrap();
        for name in ["show_000.wav", "show_001.wav", "show_002.wav", "show_peaks.json", "other_000.wav"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        assert_eq!(remove_chunks(dir.path(), "show").unwrap(), 3);
        assert!(list_chunks(dir.path(), "show").unwrap().is_empty());
        assert!(dir.path().join("show_peaks.json").exists());
        assert!(dir.path().join("other_000.wav").exists());

        // a fresh split that writes a single chunk lists only that chunk
        std::fs::write(dir.path().join("show_000.wav"), b"").unwrap();
        assert_eq!(list_chunks(dir.path(), "show").unwrap().len(), 1);
        assert_eq!(remove_chunks(dir.path(), "show").unwrap(), 1);
    }

    #[test]
    fn test_split_command_args() {
        let options = SplitOptions::new("/tmp/out", "talk")
            .with_segment_seconds(600)
            .with_sample_rate(Some(16000))
            .with_channels(1);
        let args = build_split_command(Path::new("talk.mp4"), &options)
            .build_args()
            .join(" ");

        assert!(args.contains("-vn -c:a pcm_s16le -ac 1 -ar 16000"));
        assert!(args.contains("-f segment -segment_time 600 -reset_timestamps 1"));
        assert!(args.ends_with("/tmp/out/talk_%03d.wav"));
    }

    #[test]
    fn test_split_command_keeps_native_rate() {
        let options = SplitOptions::new("out", "talk");
        let args = build_split_command(Path::new("talk.mp4"), &options).build_args();
        assert!(!args.contains(&"-ar".to_string()));
        assert!(args.join(" ").contains("-ac 2"));
    }

    #[tokio::test]
    async fn test_split_rejects_bad_options() {
        let options = SplitOptions::new("out", "talk").with_segment_seconds(0);
        let err = split_audio("talk.mp4", &options, &FfmpegRunner::new())
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::InvalidParameter(_)));
    }
}
