//! Per-chunk quotas and timeline re-basing.
//!
//! Long recordings are split into contiguous chunks and each chunk is scored
//! on its own. This module turns those independent results back into one
//! list on the original recording's timeline.

use peakclip_models::analysis::SECONDS_PER_PEAK;
use peakclip_models::{PeakRecord, Segment};

/// Peaks granted per bin for a chunk: one per started minute, at least one.
pub fn peaks_per_bin_for_chunk(duration_sec: f64) -> usize {
    ((duration_sec / SECONDS_PER_PEAK).ceil() as usize).max(1)
}

/// Start offset of every chunk, given the chunk durations in order.
pub fn chunk_offsets(durations: &[f64]) -> Vec<f64> {
    durations
        .iter()
        .scan(0.0, |offset, &duration| {
            let start = *offset;
            *offset += duration;
            Some(start)
        })
        .collect()
}

/// Selection output for one chunk.
#[derive(Debug, Clone)]
pub struct ChunkPeaks {
    /// Path of the chunk WAV, as written into the merged records
    pub wav_file: String,
    /// Start of the chunk within the original recording
    pub offset_sec: f64,
    /// Chunk-relative segments
    pub segments: Vec<Segment>,
}

/// Merge per-chunk results into records ordered by absolute start time.
pub fn merge_chunk_peaks(source_file: &str, chunks: &[ChunkPeaks]) -> Vec<PeakRecord> {
    let mut records: Vec<PeakRecord> = chunks
        .iter()
        .flat_map(|chunk| {
            chunk.segments.iter().map(move |seg| {
                PeakRecord::from_segment(seg, chunk.offset_sec, chunk.wav_file.clone(), source_file)
            })
        })
        .collect();

    records.sort_by(|a, b| a.abs_start_sec.total_cmp(&b.abs_start_sec));
    records
}
