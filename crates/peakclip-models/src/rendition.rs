//! Clip rendition selection.
//!
//! Every clip is first cut at source resolution into `original/`. The
//! renditions below are derived from that cut and can be toggled per run.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Height of the downscaled MP4 rendition.
pub const MP4_540_HEIGHT: u32 = 540;
/// GIF frame rate.
pub const GIF_FPS: u32 = 15;
/// CRF used for the all-I-frame rendition.
pub const SCROLLING_CRF: u8 = 18;
/// Preset used for the all-I-frame rendition.
pub const SCROLLING_PRESET: &str = "veryfast";

/// Subdirectory for source-resolution clips.
pub const ORIGINAL_DIR: &str = "original";

/// One derived output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Rendition {
    /// MP4 scaled to 540 lines
    Mp4At540,
    /// GIF scaled to 540 lines
    Gif540,
    /// GIF scaled to 270 lines
    Gif270,
    /// Silent MP4 with every frame a keyframe, for smooth scrubbing
    Scrolling,
}

impl Rendition {
    /// Output subdirectory name.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Rendition::Mp4At540 => "540",
            Rendition::Gif540 => "540_gif",
            Rendition::Gif270 => "270_gif",
            Rendition::Scrolling => "scrolling",
        }
    }

    /// Suffix appended to the clip stem, including the extension.
    pub fn file_suffix(&self) -> &'static str {
        match self {
            Rendition::Mp4At540 => "_540p.mp4",
            Rendition::Gif540 => "_540.gif",
            Rendition::Gif270 => "_270.gif",
            Rendition::Scrolling => "_scrolling.mp4",
        }
    }

    /// Target height for GIF renditions.
    pub fn gif_height(&self) -> Option<u32> {
        match self {
            Rendition::Gif540 => Some(540),
            Rendition::Gif270 => Some(270),
            _ => None,
        }
    }
}

/// Which renditions to produce for every clip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RenditionConfig {
    #[serde(default = "enabled")]
    pub mp4_540: bool,
    #[serde(default = "enabled")]
    pub gif_540: bool,
    #[serde(default = "enabled")]
    pub gif_270: bool,
    #[serde(default = "enabled")]
    pub scrolling: bool,
}

fn enabled() -> bool {
    true
}

impl Default for RenditionConfig {
    fn default() -> Self {
        Self::all()
    }
}

impl RenditionConfig {
    /// Every rendition enabled.
    pub fn all() -> Self {
        Self {
            mp4_540: true,
            gif_540: true,
            gif_270: true,
            scrolling: true,
        }
    }

    /// Only the source-resolution cut.
    pub fn none() -> Self {
        Self {
            mp4_540: false,
            gif_540: false,
            gif_270: false,
            scrolling: false,
        }
    }

    /// Enabled renditions in render order.
    pub fn enabled(&self) -> Vec<Rendition> {
        let mut out = Vec::new();
        if self.mp4_540 {
            out.push(Rendition::Mp4At540);
        }
        if self.scrolling {
            out.push(Rendition::Scrolling);
        }
        if self.gif_540 {
            out.push(Rendition::Gif540);
        }
        if self.gif_270 {
            out.push(Rendition::Gif270);
        }
        out
    }

    /// Subdirectories to create under the clip output directory.
    pub fn dir_names(&self) -> Vec<&'static str> {
        let mut dirs = vec![ORIGINAL_DIR];
        dirs.extend(self.enabled().iter().map(Rendition::dir_name));
        dirs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_order() {
        assert_eq!(
            RenditionConfig::all().enabled(),
            vec![
                Rendition::Mp4At540,
                Rendition::Scrolling,
                Rendition::Gif540,
                Rendition::Gif270
            ]
        );
        assert!(RenditionConfig::none().enabled().is_empty());
    }

    #[test]
    fn test_dir_names_always_include_original() {
        let config = RenditionConfig {
            gif_540: false,
            gif_270: false,
            ..RenditionConfig::all()
        };
        assert_eq!(config.dir_names(), vec!["original", "540", "scrolling"]);
        assert_eq!(RenditionConfig::none().dir_names(), vec!["original"]);
    }

    #[test]
    fn test_gif_heights() {
        assert_eq!(Rendition::Gif540.gif_height(), Some(540));
        assert_eq!(Rendition::Gif270.gif_height(), Some(270));
        assert_eq!(Rendition::Scrolling.gif_height(), None);
    }
}
