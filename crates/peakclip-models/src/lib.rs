//! Shared data models for peakclip.
//!
//! This crate provides Serde-serializable types for:
//! - Selected loud segments and their merged, timeline-absolute records
//! - Window and selection parameters
//! - Clip encoding and rendition configuration

pub mod analysis;
pub mod encoding;
pub mod rendition;
pub mod segment;

// Re-export common types
pub use analysis::{SelectionConfig, WindowParams};
pub use encoding::EncodingConfig;
pub use rendition::{Rendition, RenditionConfig};
pub use segment::{round_millis, PeakRecord, Segment};
