//! Bin-fair loudness peak selection.
//!
//! The timeline is cut into fixed bins (15 minutes by default). Inside each
//! bin, fixed-length windows are scored by RMS and picked greedily from the
//! loudest down, rejecting any window that overlaps an earlier pick. Every
//! bin gets its own quota, so a single loud stretch cannot starve the rest
//! of the recording.
//!
//! ```text
//! samples ──► windows (stride = hop) ──► RMS ──► bucket by bin
//!                                                   │
//!                     per bin: sort desc (stable) ──┤
//!                     greedy non-overlap pick ──────┤
//!                     re-sort by start ─────────────┴──► Segments
//! ```

use thiserror::Error;
use tracing::debug;

use peakclip_models::{Segment, SelectionConfig, WindowParams};

/// Errors from peak selection.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SelectionError {
    #[error("{0}")]
    InvalidParameter(String),
}

/// Result type for peak selection.
pub type SelectionResult<T> = Result<T, SelectionError>;

/// One scored window. Only lives for the duration of a selection run.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    start_sec: f64,
    rms: f64,
}

/// Selects loud, non-overlapping windows from a mono waveform.
#[derive(Debug, Clone, Copy, Default)]
pub struct PeakSelector {
    window: WindowParams,
    config: SelectionConfig,
}

impl PeakSelector {
    pub fn new(window: WindowParams, config: SelectionConfig) -> Self {
        Self { window, config }
    }

    pub fn window(&self) -> WindowParams {
        self.window
    }

    pub fn config(&self) -> SelectionConfig {
        self.config
    }

    /// Run the selection over `samples` recorded at `sample_rate`.
    ///
    /// Output is ordered by start time: bins in index order, and segments
    /// ascending inside each bin. Ties in RMS are broken by scan order, so the
    /// earlier window wins.
    pub fn select(&self, samples: &[f32], sample_rate: u32) -> SelectionResult<Vec<Segment>> {
        let WindowParams { window, hop } = self.window;
        let SelectionConfig {
            peaks_per_bin,
            min_rms,
            bin_size_sec,
        } = self.config;

        validate(samples, sample_rate, window, hop, min_rms, bin_size_sec)?;

        let rate = f64::from(sample_rate);
        let win_len = (window * rate) as usize;
        let hop_len = (hop * rate) as usize;
        if win_len == 0 {
            return Err(invalid(format!(
                "window {window}s is shorter than one sample at {sample_rate} Hz"
            )));
        }
        if hop_len == 0 {
            return Err(invalid(format!(
                "hop {hop}s is shorter than one sample at {sample_rate} Hz"
            )));
        }

        let duration = samples.len() as f64 / rate;
        let num_bins = ((duration / bin_size_sec).ceil() as usize).max(1);
        let scanned = scan_windows(samples, rate, win_len, hop_len);

        let mut segments = Vec::new();
        let mut cursor = 0;

        for bin in 0..num_bins {
            let bin_start = bin as f64 * bin_size_sec;
            let bin_end = ((bin + 1) as f64 * bin_size_sec).min(duration);

            // Scan order is ascending, so each bin is a contiguous run.
            let mut candidates = Vec::new();
            while cursor < scanned.len() && scanned[cursor].start_sec < bin_end {
                let cand = scanned[cursor];
                if cand.start_sec >= bin_start && cand.rms >= min_rms {
                    candidates.push(cand);
                }
                cursor += 1;
            }

            let picked = pick_in_bin(candidates, window, peaks_per_bin);
            segments.extend(
                picked
                    .iter()
                    .map(|c| Segment::new(c.start_sec, window, c.rms)),
            );
        }

        debug!(
            windows = scanned.len(),
            bins = num_bins,
            selected = segments.len(),
            "Peak selection complete"
        );

        Ok(segments)
    }
}

/// Convenience wrapper around [`PeakSelector::select`].
pub fn select_loud_segments(
    samples: &[f32],
    sample_rate: u32,
    window: f64,
    hop: f64,
    config: SelectionConfig,
) -> SelectionResult<Vec<Segment>> {
    PeakSelector::new(WindowParams::new(window, hop), config).select(samples, sample_rate)
}

fn invalid(message: impl Into<String>) -> SelectionError {
    SelectionError::InvalidParameter(message.into())
}

fn validate(
    samples: &[f32],
    sample_rate: u32,
    window: f64,
    hop: f64,
    min_rms: f64,
    bin_size_sec: f64,
) -> SelectionResult<()> {
    if samples.is_empty() {
        return Err(invalid("waveform is empty"));
    }
    if sample_rate == 0 {
        return Err(invalid("sample rate must be positive"));
    }
    if !window.is_finite() || window <= 0.0 {
        return Err(invalid(format!("window must be positive, got {window}")));
    }
    if !hop.is_finite() || hop <= 0.0 {
        return Err(invalid(format!("hop must be positive, got {hop}")));
    }
    if !min_rms.is_finite() || min_rms < 0.0 {
        return Err(invalid(format!("min_rms must be non-negative, got {min_rms}")));
    }
    if !bin_size_sec.is_finite() || bin_size_sec <= 0.0 {
        return Err(invalid(format!("bin size must be positive, got {bin_size_sec}")));
    }
    Ok(())
}

/// Score every full window, in ascending start order.
fn scan_windows(samples: &[f32], rate: f64, win_len: usize, hop_len: usize) -> Vec<Candidate> {
    let mut out = Vec::new();
    let mut start = 0usize;
    // Lengths saturate for huge window or hop values, so stop on overflow.
    while let Some(end) = start.checked_add(win_len).filter(|&end| end <= samples.len()) {
        out.push(Candidate {
            start_sec: start as f64 / rate,
            rms: window_rms(&samples[start..end]),
        });
        match start.checked_add(hop_len) {
            Some(next) => start = next,
            None => break,
        }
    }
    out
}

fn window_rms(window: &[f32]) -> f64 {
    let sum_sq: f64 = window
        .iter()
        .map(|&s| {
            let s = f64::from(s);
            s * s
        })
        .sum();
    (sum_sq / window.len() as f64).sqrt()
}

/// Greedy non-overlapping pick, loudest first, returned in start order.
fn pick_in_bin(mut candidates: Vec<Candidate>, window: f64, peaks_per_bin: usize) -> Vec<Candidate> {
    // Stable: equal RMS keeps ascending start order.
    candidates.sort_by(|a, b| b.rms.total_cmp(&a.rms));

    let mut accepted: Vec<Candidate> = Vec::new();
    for cand in &candidates {
        if accepted.len() >= peaks_per_bin {
            break;
        }
        let end = cand.start_sec + window;
        let clear = accepted
            .iter()
            .all(|a| end <= a.start_sec || cand.start_sec >= a.start_sec + window);
        if clear {
            accepted.push(*cand);
        }
    }

    // A bin with sound always contributes, even with a zero quota.
    if accepted.is_empty() {
        if let Some(loudest) = candidates.first() {
            accepted.push(*loudest);
        }
    }

    accepted.sort_by(|a, b| a.start_sec.total_cmp(&b.start_sec));
    accepted
}
