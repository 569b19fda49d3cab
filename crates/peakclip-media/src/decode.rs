//! Audio decoding into mono sample buffers.
//!
//! WAV files at the wanted rate are read directly with `hound`. Anything
//! else goes through ffmpeg into a temporary mono WAV first.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Decoded mono audio.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Mono samples in [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Samples per second
    pub sample_rate: u32,
    /// Channel count of the source before downmixing
    pub source_channels: u16,
}

impl AudioBuffer {
    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / f64::from(self.sample_rate)
    }
}

/// Whether the path looks like a WAV file.
pub fn is_wav(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("wav"))
        .unwrap_or(false)
}

/// Duration of a WAV file from its header, without decoding samples.
pub fn wav_duration(path: impl AsRef<Path>) -> MediaResult<f64> {
    let path = path.as_ref();
    let reader = open_wav(path)?;
    let spec = reader.spec();
    if spec.sample_rate == 0 {
        return Err(MediaError::decode(path, "sample rate is zero"));
    }
    Ok(f64::from(reader.duration()) / f64::from(spec.sample_rate))
}

/// Read a WAV file and average its channels down to mono.
///
/// Integer PCM is scaled by `2^(bits-1)`; float PCM is passed through.
pub fn read_wav(path: impl AsRef<Path>) -> MediaResult<AudioBuffer> {
    let path = path.as_ref();
    let mut reader = open_wav(path)?;
    let spec = reader.spec();

    if spec.channels == 0 {
        return Err(MediaError::decode(path, "file declares zero channels"));
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<Vec<f32>, _>>()
            .map_err(|e| MediaError::decode(path, e.to_string()))?,
        hound::SampleFormat::Int => {
            if !(1..=32).contains(&spec.bits_per_sample) {
                return Err(MediaError::decode(
                    path,
                    format!("unsupported bits per sample {}", spec.bits_per_sample),
                ));
            }
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<Vec<f32>, _>>()
                .map_err(|e| MediaError::decode(path, e.to_string()))?
        }
    };

    let samples = downmix(&interleaved, spec.channels);

    debug!(
        path = %path.display(),
        sample_rate = spec.sample_rate,
        channels = spec.channels,
        samples = samples.len(),
        "Decoded WAV"
    );

    Ok(AudioBuffer {
        samples,
        sample_rate: spec.sample_rate,
        source_channels: spec.channels,
    })
}

/// Decode any ffmpeg-readable file into mono samples.
///
/// `target_rate = None` keeps the native rate. WAV input that already has the
/// wanted rate skips ffmpeg entirely.
pub async fn decode_audio(
    path: impl AsRef<Path>,
    target_rate: Option<u32>,
    runner: &FfmpegRunner,
) -> MediaResult<AudioBuffer> {
    let path = path.as_ref().to_path_buf();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path));
    }

    if is_wav(&path) {
        let native = {
            let reader = open_wav(&path)?;
            reader.spec().sample_rate
        };
        if target_rate.map_or(true, |rate| rate == native) {
            return read_wav_blocking(path).await;
        }
    }

    let temp_dir = tempfile::tempdir()?;
    let mono = temp_dir.path().join("decoded.wav");

    debug!(
        input = %path.display(),
        target_rate = ?target_rate,
        "Transcoding audio for decoding"
    );

    let mut cmd = FfmpegCommand::new(&path, &mono)
        .no_video()
        .audio_codec("pcm_s16le")
        .audio_channels(1);
    if let Some(rate) = target_rate {
        cmd = cmd.sample_rate(rate);
    }

    runner.run(&cmd).await.map_err(|e| match e {
        MediaError::FfmpegFailed { stderr, .. } => MediaError::decode(
            &path,
            stderr.unwrap_or_else(|| "ffmpeg could not decode the input".to_string()),
        ),
        other => other,
    })?;

    // Keep the temp dir alive until the read finishes.
    let buffer = read_wav_blocking(mono).await?;
    drop(temp_dir);
    Ok(buffer)
}

async fn read_wav_blocking(path: PathBuf) -> MediaResult<AudioBuffer> {
    tokio::task::spawn_blocking(move || read_wav(&path))
        .await
        .map_err(|e| MediaError::internal(format!("decode task failed: {}", e)))?
}

fn open_wav(path: &Path) -> MediaResult<hound::WavReader<std::io::BufReader<std::fs::File>>> {
    hound::WavReader::open(path).map_err(|e| match e {
        hound::Error::IoError(io) if io.kind() == std::io::ErrorKind::NotFound => {
            MediaError::FileNotFound(path.to_path_buf())
        }
        other => MediaError::decode(path, other.to_string()),
    })
}

/// Average interleaved frames into one channel. A trailing partial frame is dropped.
fn downmix(interleaved: &[f32], channels: u16) -> Vec<f32> {
    let channels = usize::from(channels);
    if channels == 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}
