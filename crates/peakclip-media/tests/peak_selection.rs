//! End-to-end checks of loudness peak selection on synthetic recordings.

use std::path::Path;

use peakclip_media::{
    chunk_offsets, decode_audio, merge_chunk_peaks, peaks_per_bin_for_chunk, ChunkPeaks,
    FfmpegRunner, PeakSelector,
};
use peakclip_models::{SelectionConfig, WindowParams};

const RATE: u32 = 100;

fn seconds(s: f64) -> usize {
    (s * f64::from(RATE)) as usize
}

/// Constant floor with rectangular bursts of `(start_sec, len_sec, level)`.
fn waveform(duration_sec: f64, floor: f32, bursts: &[(f64, f64, f32)]) -> Vec<f32> {
    let mut samples = vec![floor; seconds(duration_sec)];
    for &(start, len, level) in bursts {
        for s in &mut samples[seconds(start)..seconds(start + len)] {
            *s = level;
        }
    }
    samples
}

/// Deterministic pseudo-noise in [-1, 1).
fn noise(len: usize, seed: u64) -> Vec<f32> {
    let mut state = seed;
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((state >> 40) as f32 / (1u64 << 24) as f32) * 2.0 - 1.0
        })
        .collect()
}

fn selector(peaks_per_bin: usize) -> PeakSelector {
    PeakSelector::new(
        WindowParams::default(),
        SelectionConfig::default().with_peaks_per_bin(peaks_per_bin),
    )
}

#[test]
fn silent_recording_yields_nothing() {
    let samples = vec![0.0f32; seconds(120.0)];
    assert!(selector(5).select(&samples, RATE).unwrap().is_empty());
}

#[test]
fn single_burst_yields_one_segment() {
    let samples = waveform(20.0, 0.0, &[(10.0, 2.0, 1.0)]);
    let segments = selector(5).select(&samples, RATE).unwrap();

    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].start_sec, 10.0);
    assert_eq!(segments[0].duration_sec, 2.0);
    assert_eq!(segments[0].rms, 1.0);
}

#[test]
fn constant_level_picks_earliest_window() {
    let samples = vec![0.3f32; seconds(50.0)];
    let segments = selector(1).select(&samples, RATE).unwrap();

    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].start_sec, 0.0);
    assert!((segments[0].rms - 0.3).abs() < 1e-3);
}

#[test]
fn two_bins_are_filled_independently() {
    let samples = waveform(
        920.0,
        0.01,
        &[(100.0, 2.0, 0.8), (500.0, 2.0, 0.6), (910.0, 2.0, 0.9)],
    );
    let segments = selector(2).select(&samples, RATE).unwrap();

    let first_bin: Vec<f64> = segments
        .iter()
        .filter(|s| s.start_sec < 900.0)
        .map(|s| s.start_sec)
        .collect();
    assert_eq!(first_bin, vec![100.0, 500.0]);

    let second_bin: Vec<_> = segments.iter().filter(|s| s.start_sec >= 900.0).collect();
    assert_eq!(second_bin.len(), 2);
    let burst = second_bin
        .iter()
        .find(|s| s.start_sec == 910.0)
        .expect("burst in second bin");
    assert!((burst.rms - 0.9).abs() < 1e-3);
}

#[test]
fn each_bin_reaches_the_default_cap_on_its_own() {
    // seven bursts compete for five slots in the first bin, while the
    // second bin is a 20 s stretch of floor noise
    let bursts: Vec<(f64, f64, f32)> = (1..=7)
        .map(|i| (i as f64 * 100.0, 2.0, 0.2 + i as f32 * 0.1))
        .collect();
    let samples = waveform(920.0, 0.01, &bursts);
    let segments = selector(5).select(&samples, RATE).unwrap();

    let first_bin: Vec<f64> = segments
        .iter()
        .filter(|s| s.start_sec < 900.0)
        .map(|s| s.start_sec)
        .collect();
    assert_eq!(first_bin, vec![300.0, 400.0, 500.0, 600.0, 700.0]);

    let second_bin: Vec<f64> = segments
        .iter()
        .filter(|s| s.start_sec >= 900.0)
        .map(|s| s.start_sec)
        .collect();
    assert_eq!(second_bin, vec![900.0, 902.0, 904.0, 906.0, 908.0]);
}

#[test]
fn noisy_recording_respects_every_invariant() {
    let duration = 2000.0;
    let window = WindowParams::default().window;
    let ppb = 4;
    let samples = noise(seconds(duration), 7);

    let segments = selector(ppb).select(&samples, RATE).unwrap();
    assert!(!segments.is_empty());

    // ordered and disjoint
    for pair in segments.windows(2) {
        assert!(pair[0].start_sec < pair[1].start_sec);
        assert!(!pair[0].overlaps(&pair[1]));
    }

    // per-bin cap, full windows only
    let mut per_bin = [0usize; 3];
    for seg in &segments {
        per_bin[(seg.start_sec / 900.0) as usize] += 1;
        assert!(seg.start_sec + window <= duration + 1e-9);
        assert!(seg.rms >= SelectionConfig::default().min_rms);
    }
    assert!(per_bin.iter().all(|&n| n <= ppb));

    // deterministic
    assert_eq!(segments, selector(ppb).select(&samples, RATE).unwrap());
}

fn write_wav(path: &Path, samples: &[f32]) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for &s in samples {
        writer.write_sample((s * 32767.0) as i16).unwrap();
    }
    writer.finalize().unwrap();
}

#[test]
fn chunked_recording_merges_onto_one_timeline() {
    let dir = tempfile::tempdir().unwrap();
    let chunk_a = dir.path().join("show_000.wav");
    let chunk_b = dir.path().join("show_001.wav");
    write_wav(&chunk_a, &waveform(90.0, 0.0, &[(30.0, 2.0, 0.5)]));
    write_wav(&chunk_b, &waveform(45.0, 0.0, &[(12.5, 2.0, 0.7)]));

    let runner = FfmpegRunner::new();
    let mut durations = Vec::new();
    let mut results = Vec::new();
    for chunk in [&chunk_a, &chunk_b] {
        let audio = tokio_test::block_on(decode_audio(chunk, None, &runner)).unwrap();
        let quota = peaks_per_bin_for_chunk(audio.duration_secs());
        let segments = selector(quota).select(&audio.samples, audio.sample_rate).unwrap();
        durations.push(audio.duration_secs());
        results.push((chunk.to_string_lossy().to_string(), segments));
    }

    let chunks: Vec<ChunkPeaks> = results
        .into_iter()
        .zip(chunk_offsets(&durations))
        .map(|((wav_file, segments), offset_sec)| ChunkPeaks {
            wav_file,
            offset_sec,
            segments,
        })
        .collect();

    let merged = merge_chunk_peaks("show.mp4", &chunks);
    let abs: Vec<f64> = merged.iter().map(|r| r.abs_start_sec).collect();
    assert_eq!(abs, vec![30.0, 102.5]);
    assert_eq!(merged[1].start_sec, 12.5);
    assert!(merged[1].wav_file.ends_with("show_001.wav"));
    assert!(merged.iter().all(|r| r.source_file == "show.mp4"));
}
