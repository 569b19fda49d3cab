//! Loud segment models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Round a value to millisecond (3 decimal) precision.
pub fn round_millis(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// A selected loud window inside one decoded audio file.
///
/// Times are relative to the start of the file the samples came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Segment {
    /// Window start in seconds (3 decimals)
    pub start_sec: f64,

    /// Window length in seconds (3 decimals)
    pub duration_sec: f64,

    /// Linear RMS magnitude of the window (3 decimals).
    ///
    /// Serialized as `rms_db` for compatibility with existing peak files,
    /// although no decibel conversion is applied.
    #[serde(rename = "rms_db")]
    pub rms: f64,
}

impl Segment {
    /// Create a segment, rounding every field to 3 decimals.
    pub fn new(start_sec: f64, duration_sec: f64, rms: f64) -> Self {
        Self {
            start_sec: round_millis(start_sec),
            duration_sec: round_millis(duration_sec),
            rms: round_millis(rms),
        }
    }

    /// End of the window in seconds.
    pub fn end_sec(&self) -> f64 {
        self.start_sec + self.duration_sec
    }

    /// Whether two half-open windows `[start, end)` share any time.
    pub fn overlaps(&self, other: &Segment) -> bool {
        !(self.end_sec() <= other.start_sec || self.start_sec >= other.end_sec())
    }
}

/// A segment placed on the timeline of the original recording.
///
/// Field order matches the JSON layout of the merged peaks file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PeakRecord {
    /// WAV chunk the segment was found in
    pub wav_file: String,

    /// Start within the chunk in seconds
    pub start_sec: f64,

    /// Segment length in seconds
    pub duration_sec: f64,

    /// Start within the original recording in seconds
    pub abs_start_sec: f64,

    /// Original recording the chunk was cut from
    pub source_file: String,

    /// Linear RMS magnitude (see [`Segment::rms`])
    pub rms_db: f64,
}

impl PeakRecord {
    /// Re-base a chunk-relative segment by the chunk's offset.
    ///
    /// The absolute start is rounded to 3 decimals like every other time field.
    pub fn from_segment(
        segment: &Segment,
        offset_sec: f64,
        wav_file: impl Into<String>,
        source_file: impl Into<String>,
    ) -> Self {
        Self {
            wav_file: wav_file.into(),
            start_sec: segment.start_sec,
            duration_sec: segment.duration_sec,
            abs_start_sec: round_millis(offset_sec + segment.start_sec),
            source_file: source_file.into(),
            rms_db: segment.rms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_rounding() {
        let seg = Segment::new(10.12345, 2.0, 0.70710678);
        assert_eq!(seg.start_sec, 10.123);
        assert_eq!(seg.duration_sec, 2.0);
        assert_eq!(seg.rms, 0.707);
    }

    #[test]
    fn test_segment_serializes_rms_as_rms_db() {
        let seg = Segment::new(1.5, 2.0, 0.25);
        let json = serde_json::to_value(seg).unwrap();
        assert_eq!(json["rms_db"], 0.25);
        assert!(json.get("rms").is_none());
    }

    #[test]
    fn test_overlap_is_half_open() {
        let a = Segment::new(0.0, 2.0, 0.1);
        let b = Segment::new(2.0, 2.0, 0.1);
        let c = Segment::new(1.5, 2.0, 0.1);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&b));
    }

    #[test]
    fn test_peak_record_field_order() {
        let seg = Segment::new(12.5, 2.0, 0.3);
        let record = PeakRecord::from_segment(&seg, 900.0, "a_001.wav", "a.mp4");
        assert_eq!(record.abs_start_sec, 912.5);

        let json = serde_json::to_string(&record).unwrap();
        let keys = [
            "wav_file",
            "start_sec",
            "duration_sec",
            "abs_start_sec",
            "source_file",
            "rms_db",
        ];
        let positions: Vec<usize> = keys
            .iter()
            .map(|k| json.find(&format!("\"{}\"", k)).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_peak_record_schema() {
        let schema = serde_json::to_value(schemars::schema_for!(PeakRecord)).unwrap();
        let properties = schema["properties"].as_object().unwrap();
        assert!(properties.contains_key("rms_db"));
        assert!(properties.contains_key("abs_start_sec"));
    }
}
