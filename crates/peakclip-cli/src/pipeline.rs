//! Operations behind each subcommand.
//!
//! `run` is the full flow:
//!
//! ```text
//! input ──► split (≤ chunk_seconds WAVs) ──► decode + select per chunk ──► merge
//!                                                                           │
//!                       clips/renditions ◄── <stem>_peaks.json ◄────────────┘
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{debug, info, Instrument};

use peakclip_media::decode::wav_duration;
use peakclip_media::{
    check_ffmpeg, chunk_offsets, decode_audio, extract_audio_to_wav, extract_clips_from_peaks,
    merge_chunk_peaks, peaks_per_bin_for_chunk, split_audio, ChunkPeaks, FfmpegRunner,
    PeakSelector, SplitOptions,
};
use peakclip_models::{
    EncodingConfig, PeakRecord, RenditionConfig, Segment, SelectionConfig, WindowParams,
};

use crate::config::PipelineConfig;
use crate::error::{CliError, CliResult};
use crate::logging::StageLogger;

/// Extension of the output directory created next to the input.
pub const OUTPUT_DIR_EXTENSION: &str = "peakclip";
/// Suffix of the peaks file name.
pub const PEAKS_FILE_SUFFIX: &str = "_peaks.json";

/// Audio extraction and scoring knobs shared by the subcommands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisOptions {
    pub window: WindowParams,
    /// Resample rate; `None` keeps the native rate
    pub sample_rate: Option<u32>,
    /// Channels in extracted WAVs
    pub channels: u16,
    pub min_rms: f64,
}

impl AnalysisOptions {
    /// Selection config with the given per-bin quota.
    pub fn selection(&self, peaks_per_bin: usize) -> SelectionConfig {
        SelectionConfig::default()
            .with_peaks_per_bin(peaks_per_bin)
            .with_min_rms(self.min_rms)
    }
}

/// Options for [`run`].
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub analysis: AnalysisOptions,
    /// Render clips after writing the peaks file
    pub clips: bool,
    pub renditions: RenditionConfig,
    pub encoding: EncodingConfig,
}

/// What [`run`] produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub output_dir: PathBuf,
    pub chunks: Vec<PathBuf>,
    pub peaks_file: PathBuf,
    pub peaks: Vec<PeakRecord>,
    pub clips: usize,
}

/// What [`analyze`] produced.
#[derive(Debug, Clone)]
pub struct AnalyzeSummary {
    pub wav_file: PathBuf,
    pub peaks_file: PathBuf,
    pub segments: Vec<Segment>,
}

/// File stem of the input, used for every derived name.
pub fn input_stem(input: &Path) -> String {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "input".to_string())
}

/// `<parent>/<stem>.peakclip`
pub fn output_dir_for(input: &Path) -> PathBuf {
    let dir_name = format!("{}.{}", input_stem(input), OUTPUT_DIR_EXTENSION);
    match input.parent() {
        Some(parent) => parent.join(dir_name),
        None => PathBuf::from(dir_name),
    }
}

/// `<dir>/<stem>_peaks.json`
pub fn peaks_path(dir: &Path, stem: &str) -> PathBuf {
    dir.join(format!("{}{}", stem, PEAKS_FILE_SUFFIX))
}

fn ensure_input(input: &Path) -> CliResult<()> {
    if input.is_file() {
        Ok(())
    } else {
        Err(CliError::InputNotFound(input.to_path_buf()))
    }
}

/// Pretty-print `value` as JSON into `path`.
pub async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> CliResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    tokio::fs::write(path, json).await?;
    Ok(())
}

/// Split, score every chunk, merge and optionally render clips.
pub async fn run(
    input: &Path,
    options: &RunOptions,
    config: &PipelineConfig,
) -> CliResult<RunSummary> {
    ensure_input(input)?;
    let logger = StageLogger::new(input, "run");
    let stem = input_stem(input);
    let output_dir = output_dir_for(input);
    tokio::fs::create_dir_all(&output_dir).await?;

    logger.log_start(&format!("writing to {}", output_dir.display()));

    check_ffmpeg()?;
    let runner = config.runner();
    let analysis = &options.analysis;

    let split = SplitOptions::new(&output_dir, &stem)
        .with_segment_seconds(config.chunk_seconds)
        .with_sample_rate(analysis.sample_rate)
        .with_channels(analysis.channels);
    let mut chunks = split_audio(input, &split, &runner).await?;

    if chunks.is_empty() {
        logger.log_warning("segmenter wrote no chunks, extracting a single WAV");
        let wav = output_dir.join(format!("{}.wav", stem));
        extract_audio_to_wav(input, &wav, analysis.sample_rate, analysis.channels, &runner)
            .await?;
        chunks.push(wav);
    }

    logger.log_progress(&format!("analysing {} chunk(s)", chunks.len()));
    let chunk_peaks = analyze_chunks(&chunks, analysis, config.max_parallel, &runner)
        .instrument(logger.create_span())
        .await?;

    let peaks = merge_chunk_peaks(&input.to_string_lossy(), &chunk_peaks);
    let peaks_file = peaks_path(&output_dir, &stem);
    write_json(&peaks_file, &peaks).await?;
    logger.log_progress(&format!(
        "{} peak(s) written to {}",
        peaks.len(),
        peaks_file.display()
    ));

    let clips = if options.clips {
        match extract_clips_from_peaks(
            &peaks_file,
            Some(&output_dir),
            &options.encoding,
            &options.renditions,
            &runner,
        )
        .await
        {
            Ok(clips) => clips.len(),
            Err(e) => {
                logger.log_error(&format!("clip extraction failed: {}", e));
                return Err(e.into());
            }
        }
    } else {
        0
    };

    logger.log_completion(&format!("{} clip(s)", clips));

    Ok(RunSummary {
        output_dir,
        chunks,
        peaks_file,
        peaks,
        clips,
    })
}

/// Decode and score every chunk, at most `max_parallel` at a time.
///
/// Each chunk gets its own quota from its duration. Results keep chunk order
/// and carry the chunk's offset on the original timeline.
pub async fn analyze_chunks(
    chunks: &[PathBuf],
    analysis: &AnalysisOptions,
    max_parallel: usize,
    runner: &FfmpegRunner,
) -> CliResult<Vec<ChunkPeaks>> {
    let semaphore = Arc::new(Semaphore::new(max_parallel.max(1)));

    let futures: Vec<_> = chunks
        .iter()
        .map(|chunk| {
            let semaphore = semaphore.clone();
            let runner = runner.clone();
            let analysis = *analysis;
            let chunk = chunk.clone();
            async move {
                let _permit = semaphore
                    .acquire()
                    .await
                    .map_err(|e| CliError::internal(format!("chunk limiter closed: {}", e)))?;
                analyze_chunk(&chunk, &analysis, &runner).await
            }
        })
        .collect();

    let analysed = join_all(futures)
        .await
        .into_iter()
        .collect::<CliResult<Vec<_>>>()?;

    let durations: Vec<f64> = analysed.iter().map(|(_, duration, _)| *duration).collect();
    Ok(analysed
        .into_iter()
        .zip(chunk_offsets(&durations))
        .map(|((wav_file, _, segments), offset_sec)| ChunkPeaks {
            wav_file,
            offset_sec,
            segments,
        })
        .collect())
}

async fn analyze_chunk(
    chunk: &Path,
    analysis: &AnalysisOptions,
    runner: &FfmpegRunner,
) -> CliResult<(String, f64, Vec<Segment>)> {
    let duration = wav_duration(chunk)?;
    let quota = peaks_per_bin_for_chunk(duration);
    let segments = find(chunk, analysis.window, analysis.sample_rate, analysis.selection(quota), runner)
        .await?;

    debug!(
        chunk = %chunk.display(),
        duration_sec = duration,
        peaks_per_bin = quota,
        segments = segments.len(),
        "Chunk analysed"
    );

    Ok((chunk.to_string_lossy().to_string(), duration, segments))
}

/// Decode `input` and select its loudest segments.
pub async fn find(
    input: &Path,
    window: WindowParams,
    sample_rate: Option<u32>,
    selection: SelectionConfig,
    runner: &FfmpegRunner,
) -> CliResult<Vec<Segment>> {
    ensure_input(input)?;
    let audio = decode_audio(input, sample_rate, runner).await?;
    let selector = PeakSelector::new(window, selection);

    let segments = tokio::task::spawn_blocking(move || {
        selector.select(&audio.samples, audio.sample_rate)
    })
    .await??;

    Ok(segments)
}

/// Extract one WAV from `input` into its output directory and write its peaks.
pub async fn analyze(
    input: &Path,
    analysis: &AnalysisOptions,
    peaks_per_bin: usize,
    config: &PipelineConfig,
) -> CliResult<AnalyzeSummary> {
    ensure_input(input)?;
    let logger = StageLogger::new(input, "analyze");
    let stem = input_stem(input);
    let output_dir = output_dir_for(input);
    tokio::fs::create_dir_all(&output_dir).await?;

    logger.log_start(&format!("writing to {}", output_dir.display()));

    let runner = config.runner();
    let wav_file = output_dir.join(format!("{}.wav", stem));
    extract_audio_to_wav(input, &wav_file, analysis.sample_rate, analysis.channels, &runner)
        .await?;

    let segments = find(
        &wav_file,
        analysis.window,
        analysis.sample_rate,
        analysis.selection(peaks_per_bin),
        &runner,
    )
    .await?;

    let peaks_file = peaks_path(&output_dir, &stem);
    write_json(&peaks_file, &segments).await?;
    logger.log_completion(&format!("{} segment(s)", segments.len()));

    Ok(AnalyzeSummary {
        wav_file,
        peaks_file,
        segments,
    })
}

/// Split the audio of `input` into WAV segments.
pub async fn split(
    input: &Path,
    options: &SplitOptions,
    config: &PipelineConfig,
) -> CliResult<Vec<PathBuf>> {
    ensure_input(input)?;
    check_ffmpeg()?;
    let chunks = split_audio(input, options, &config.runner()).await?;
    info!(
        input = %input.display(),
        segments = chunks.len(),
        output_dir = %options.output_dir.display(),
        "Split complete"
    );
    Ok(chunks)
}

/// Render clips for every record of an existing peaks file.
pub async fn extract(
    peaks_file: &Path,
    output_dir: Option<&Path>,
    renditions: &RenditionConfig,
    encoding: &EncodingConfig,
    config: &PipelineConfig,
) -> CliResult<usize> {
    ensure_input(peaks_file)?;
    let clips = extract_clips_from_peaks(
        peaks_file,
        output_dir,
        encoding,
        renditions,
        &config.runner(),
    )
    .await?;
    Ok(clips.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_layout() {
        let input = Path::new("/media/shows/ep01.mov");
        assert_eq!(output_dir_for(input), PathBuf::from("/media/shows/ep01.peakclip"));
        assert_eq!(
            peaks_path(&output_dir_for(input), &input_stem(input)),
            PathBuf::from("/media/shows/ep01.peakclip/ep01_peaks.json")
        );
        assert_eq!(output_dir_for(Path::new("ep01.mov")), PathBuf::from("ep01.peakclip"));
    }

    #[test]
    fn test_selection_from_options() {
        let options = AnalysisOptions {
            window: WindowParams::default(),
            sample_rate: None,
            channels: 1,
            min_rms: 0.02,
        };
        let selection = options.selection(7);
        assert_eq!(selection.peaks_per_bin, 7);
        assert_eq!(selection.min_rms, 0.02);
        assert_eq!(selection.bin_size_sec, 900.0);
    }

    #[tokio::test]
    async fn test_missing_input() {
        let err = find(
            Path::new("/no/such/input.wav"),
            WindowParams::default(),
            None,
            SelectionConfig::default(),
            &FfmpegRunner::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CliError::InputNotFound(_)));
    }
}
