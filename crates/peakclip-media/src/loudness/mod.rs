//! Loudness peak detection.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │ WAV chunks   │───►│ PeakSelector │───►│ Chunk merger │───► peaks JSON
//! │ (decoded)    │    │ (per chunk)  │    │ (abs offsets)│
//! └──────────────┘    └──────────────┘    └──────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use peakclip_media::loudness::{PeakSelector, peaks_per_bin_for_chunk};
//!
//! let audio = decode_audio(&wav, None)?;
//! let config = SelectionConfig::default()
//!     .with_peaks_per_bin(peaks_per_bin_for_chunk(audio.duration_secs()));
//! let segments = PeakSelector::new(WindowParams::default(), config)
//!     .select(&audio.samples, audio.sample_rate)?;
//! ```

mod chunks;
mod selector;

pub use chunks::{chunk_offsets, merge_chunk_peaks, peaks_per_bin_for_chunk, ChunkPeaks};
pub use selector::{select_loud_segments, PeakSelector, SelectionError, SelectionResult};
