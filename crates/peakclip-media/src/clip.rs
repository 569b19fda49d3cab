//! Clip cutting and rendition rendering.
//!
//! Every peak becomes one clip cut from the source recording into
//! `original/`, and each enabled [`Rendition`] is derived from that cut:
//!
//! ```text
//! <root>/original/<base>_<abs_start>.mp4
//! <root>/540/<stem>_540p.mp4
//! <root>/scrolling/<stem>_scrolling.mp4
//! <root>/540_gif/<stem>_540.gif
//! <root>/270_gif/<stem>_270.gif
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use peakclip_models::rendition::{
    GIF_FPS, MP4_540_HEIGHT, ORIGINAL_DIR, SCROLLING_CRF, SCROLLING_PRESET,
};
use peakclip_models::{EncodingConfig, PeakRecord, Rendition, RenditionConfig};

use crate::command::{check_ffmpeg, FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe::probe_media;

/// Output directory layout for rendered clips.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipLayout {
    root: PathBuf,
}

impl ClipLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the base cut for a clip starting at `abs_start_sec`.
    pub fn original_path(&self, base: &str, abs_start_sec: f64) -> PathBuf {
        self.root
            .join(ORIGINAL_DIR)
            .join(format!("{}_{:.3}.mp4", base, abs_start_sec))
    }

    /// Path of a rendition derived from the cut named `stem`.
    pub fn rendition_path(&self, stem: &str, rendition: Rendition) -> PathBuf {
        self.root
            .join(rendition.dir_name())
            .join(format!("{}{}", stem, rendition.file_suffix()))
    }

    /// Create `original/` plus one directory per enabled rendition.
    pub async fn create_dirs(&self, renditions: &RenditionConfig) -> MediaResult<()> {
        for dir in renditions.dir_names() {
            tokio::fs::create_dir_all(self.root.join(dir)).await?;
        }
        Ok(())
    }
}

/// Paths written for one clip.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedClip {
    pub original: PathBuf,
    pub renditions: Vec<(Rendition, PathBuf)>,
}

/// File stem of `path`, used as the clip base name.
pub fn clip_base_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "clip".to_string())
}

/// Command that cuts `[start, start + duration)` out of `source`.
pub fn build_cut_command(
    source: &Path,
    output: &Path,
    start_sec: f64,
    duration_sec: f64,
    encoding: &EncodingConfig,
) -> FfmpegCommand {
    FfmpegCommand::new(source, output)
        .seek(start_sec)
        .duration(duration_sec)
        .map("0:v:0")
        .map("0:a:0")
        .output_args(encoding.to_ffmpeg_args())
}

/// Commands producing `rendition` from an already cut clip, in run order.
///
/// GIFs take two passes: a palette is generated next to the output first and
/// then applied. The caller removes the palette.
pub fn build_rendition_commands(
    clip: &Path,
    output: &Path,
    rendition: Rendition,
    encoding: &EncodingConfig,
) -> Vec<FfmpegCommand> {
    match rendition {
        Rendition::Mp4At540 => vec![FfmpegCommand::new(clip, output)
            .video_filter(format!("scale=-2:{}", MP4_540_HEIGHT))
            .output_args(encoding.to_ffmpeg_args())],
        Rendition::Scrolling => vec![FfmpegCommand::new(clip, output)
            .video_codec(&encoding.codec)
            .preset(SCROLLING_PRESET)
            .crf(SCROLLING_CRF)
            .output_args(["-g", "1", "-keyint_min", "1", "-sc_threshold", "0"])
            .output_args(["-pix_fmt".to_string(), encoding.pixel_format.clone()])
            .no_audio()
            .output_args(encoding.container_args())],
        Rendition::Gif540 | Rendition::Gif270 => {
            let height = rendition.gif_height().unwrap_or(MP4_540_HEIGHT);
            let scale = format!("fps={},scale=-2:{}:flags=lanczos", GIF_FPS, height);
            let palette = palette_path(output);
            vec![
                FfmpegCommand::new(clip, &palette).video_filter(format!("{},palettegen", scale)),
                FfmpegCommand::new(clip, output)
                    .extra_input(&palette)
                    .filter_complex(format!("{}[x];[x][1:v]paletteuse", scale)),
            ]
        }
    }
}

/// Palette image used while rendering the GIF at `gif`.
fn palette_path(gif: &Path) -> PathBuf {
    let stem = clip_base_name(gif);
    gif.with_file_name(format!("{}_palette.png", stem))
}

/// Cut one clip from `source` and render every enabled rendition from it.
///
/// Output directories must already exist (see [`ClipLayout::create_dirs`]).
pub async fn render_clip(
    source: &Path,
    abs_start_sec: f64,
    duration_sec: f64,
    layout: &ClipLayout,
    encoding: &EncodingConfig,
    renditions: &RenditionConfig,
    runner: &FfmpegRunner,
) -> MediaResult<RenderedClip> {
    if duration_sec <= 0.0 {
        return Err(MediaError::InvalidParameter(format!(
            "clip duration must be positive, got {}",
            duration_sec
        )));
    }

    let original = layout.original_path(&clip_base_name(source), abs_start_sec);
    let stem = clip_base_name(&original);

    info!(
        source = %source.display(),
        start_sec = abs_start_sec,
        duration_sec,
        output = %original.display(),
        "Cutting clip"
    );

    let cut = build_cut_command(source, &original, abs_start_sec, duration_sec, encoding);
    runner
        .run_with_progress(&cut, move |progress| {
            debug!(
                percent = progress.percentage(duration_sec),
                "Cut progress"
            );
        })
        .await?;

    let mut rendered = Vec::new();
    for rendition in renditions.enabled() {
        let output = layout.rendition_path(&stem, rendition);
        debug!(rendition = ?rendition, output = %output.display(), "Rendering rendition");

        let commands = build_rendition_commands(&original, &output, rendition, encoding);
        let result = run_all(runner, &commands).await;

        if rendition.gif_height().is_some() {
            let palette = palette_path(&output);
            if let Err(e) = tokio::fs::remove_file(&palette).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(palette = %palette.display(), error = %e, "Failed to remove palette");
                }
            }
        }

        result?;
        rendered.push((rendition, output));
    }

    Ok(RenderedClip {
        original,
        renditions: rendered,
    })
}

async fn run_all(runner: &FfmpegRunner, commands: &[FfmpegCommand]) -> MediaResult<()> {
    for cmd in commands {
        runner.run(cmd).await?;
    }
    Ok(())
}

/// Read a merged peaks file.
pub async fn read_peaks_file(path: &Path) -> MediaResult<Vec<PeakRecord>> {
    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }
    let raw = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&raw)?)
}

/// Render a clip for every record of a merged peaks file.
///
/// `output_dir = None` writes next to the peaks file. Records whose source
/// has no video stream are skipped.
pub async fn extract_clips_from_peaks(
    peaks_json: &Path,
    output_dir: Option<&Path>,
    encoding: &EncodingConfig,
    renditions: &RenditionConfig,
    runner: &FfmpegRunner,
) -> MediaResult<Vec<RenderedClip>> {
    let peaks = read_peaks_file(peaks_json).await?;
    if peaks.is_empty() {
        info!(peaks_file = %peaks_json.display(), "No peaks to extract");
        return Ok(Vec::new());
    }

    check_ffmpeg()?;

    let root = match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => peaks_json
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
    };
    let layout = ClipLayout::new(root);
    layout.create_dirs(renditions).await?;

    let mut has_video: HashMap<String, bool> = HashMap::new();
    let mut clips = Vec::with_capacity(peaks.len());

    for peak in &peaks {
        let video = match has_video.get(&peak.source_file) {
            Some(&known) => known,
            None => {
                let info = probe_media(&peak.source_file).await?;
                if !info.has_video {
                    warn!(source = %peak.source_file, "Source has no video stream, skipping its clips");
                }
                has_video.insert(peak.source_file.clone(), info.has_video);
                info.has_video
            }
        };
        if !video {
            continue;
        }

        let clip = render_clip(
            Path::new(&peak.source_file),
            peak.abs_start_sec,
            peak.duration_sec,
            &layout,
            encoding,
            renditions,
            runner,
        )
        .await?;
        clips.push(clip);
    }

    info!(
        clips = clips.len(),
        output_dir = %layout.root().display(),
        "Clips extracted"
    );
    Ok(clips)
}
