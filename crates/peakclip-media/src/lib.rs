#![deny(unreachable_patterns)]
//! FFmpeg CLI wrapper and loudness analysis.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building with progress parsing from `-progress pipe:2`
//! - Media probing, audio extraction and fixed-length WAV splitting
//! - WAV decoding into mono sample buffers
//! - Loudness peak selection with per-bin quotas and chunk merging
//! - Clip cutting and rendition rendering (540p MP4, GIFs, scrolling MP4)

pub mod clip;
pub mod command;
pub mod decode;
pub mod error;
pub mod loudness;
pub mod probe;
pub mod progress;
pub mod split;

pub use clip::{extract_clips_from_peaks, render_clip, ClipLayout, RenderedClip};
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use decode::{decode_audio, read_wav, AudioBuffer};
pub use error::{MediaError, MediaResult};
pub use loudness::{
    chunk_offsets, merge_chunk_peaks, peaks_per_bin_for_chunk, select_loud_segments,
    ChunkPeaks, PeakSelector, SelectionError,
};
pub use probe::{probe_media, MediaInfo};
pub use progress::FfmpegProgress;
pub use split::{extract_audio_to_wav, list_chunks, remove_chunks, split_audio, SplitOptions};
