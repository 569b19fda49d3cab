//! Command-line interface definition.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use peakclip_models::analysis::{
    DEFAULT_CHUNK_SECONDS, DEFAULT_HOP_SECS, DEFAULT_MIN_RMS, DEFAULT_PEAKS_PER_BIN,
    DEFAULT_WINDOW_SECS,
};
use peakclip_models::{RenditionConfig, WindowParams};

/// Subcommand names. Anything else in first position is treated as an input for `run`.
pub const SUBCOMMANDS: &[&str] = &["run", "split", "find", "analyze", "extract", "help"];

/// Channels written by `run` and `analyze` when `--channels` is not given.
pub const DEFAULT_ANALYSIS_CHANNELS: u16 = 1;
/// Channels written by `split` when `--channels` is not given.
pub const DEFAULT_SPLIT_CHANNELS: u16 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "peakclip",
    version,
    about = "Find the loudest moments of long recordings and cut them into clips"
)]
pub struct Cli {
    /// Resample audio to this rate in Hz (native rate when omitted)
    #[arg(long, global = true)]
    pub sr: Option<u32>,

    /// Channels in extracted audio
    #[arg(long, global = true)]
    pub channels: Option<u16>,

    /// Analysis window in seconds
    #[arg(long, global = true, default_value_t = DEFAULT_WINDOW_SECS)]
    pub window: f64,

    /// Hop between windows in seconds
    #[arg(long, global = true, default_value_t = DEFAULT_HOP_SECS)]
    pub hop: f64,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn window_params(&self) -> WindowParams {
        WindowParams::new(self.window, self.hop)
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Split, analyse and clip a recording (default)
    Run(RunArgs),
    /// Split the audio of a file into fixed-length WAV segments
    Split(SplitArgs),
    /// Print the loudest segments of an audio file as JSON
    Find(FindArgs),
    /// Extract audio and write its loudest segments next to the input
    Analyze(AnalyzeArgs),
    /// Render clips for an existing peaks file
    Extract(ExtractArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Recording to process
    pub input: PathBuf,

    /// Quietest window RMS still considered (defaults to PEAKCLIP_MIN_RMS)
    #[arg(long)]
    pub min_rms: Option<f64>,

    /// Stop after writing the peaks file
    #[arg(long)]
    pub no_clips: bool,

    #[command(flatten)]
    pub renditions: RenditionArgs,
}

#[derive(Args, Debug)]
pub struct SplitArgs {
    /// Audio or video file
    pub input: PathBuf,

    /// Segment length in seconds
    #[arg(short = 't', long, default_value_t = DEFAULT_CHUNK_SECONDS)]
    pub segment_length: u32,

    /// Directory to write segments to
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Prefix for segment file names
    #[arg(short, long, default_value = "segment")]
    pub prefix: String,
}

#[derive(Args, Debug)]
pub struct FindArgs {
    /// Audio file
    pub input: PathBuf,

    /// Segments kept per 15-minute bin
    #[arg(long, default_value_t = DEFAULT_PEAKS_PER_BIN)]
    pub top: usize,

    /// Quietest window RMS still considered
    #[arg(long, default_value_t = DEFAULT_MIN_RMS)]
    pub min_rms: f64,
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Audio or video file
    pub input: PathBuf,

    /// Segments kept per 15-minute bin
    #[arg(long, default_value_t = DEFAULT_PEAKS_PER_BIN)]
    pub top: usize,

    /// Quietest window RMS still considered (defaults to PEAKCLIP_MIN_RMS)
    #[arg(long)]
    pub min_rms: Option<f64>,
}

#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Merged peaks JSON written by `run`
    pub peaks: PathBuf,

    /// Where to write clips (defaults to the peaks file's directory)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    #[command(flatten)]
    pub renditions: RenditionArgs,
}

/// Rendition toggles shared by `run` and `extract`.
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct RenditionArgs {
    /// Skip the 540p MP4
    #[arg(long = "no-540p")]
    pub no_540p: bool,

    /// Skip both GIFs
    #[arg(long)]
    pub no_gifs: bool,

    /// Skip the all-keyframe scrolling MP4
    #[arg(long)]
    pub no_scrolling: bool,
}

impl RenditionArgs {
    pub fn to_config(self) -> RenditionConfig {
        RenditionConfig {
            mp4_540: !self.no_540p,
            gif_540: !self.no_gifs,
            gif_270: !self.no_gifs,
            scrolling: !self.no_scrolling,
        }
    }
}

/// Insert `run` when the first argument is neither a subcommand nor a flag.
///
/// `args` includes the program name, as returned by [`std::env::args_os`].
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut args: Vec<OsString> = args.into_iter().map(Into::into).collect();

    let needs_run = args.get(1).is_some_and(|first| {
        let first = first.to_string_lossy();
        !first.starts_with('-') && !SUBCOMMANDS.contains(&first.as_ref())
    });
    if needs_run {
        args.insert(1, OsString::from("run"));
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(normalize_args(args.iter().copied())).unwrap()
    }

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter()
            .map(|a| a.to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_normalize_inserts_run() {
        let args = normalize_args(["peakclip", "show.mp4", "--no-gifs"]);
        assert_eq!(strings(args), vec!["peakclip", "run", "show.mp4", "--no-gifs"]);
    }

    #[test]
    fn test_normalize_leaves_subcommands_and_flags() {
        for argv in [
            vec!["peakclip", "find", "a.wav"],
            vec!["peakclip", "extract", "a_peaks.json"],
            vec!["peakclip", "--help"],
            vec!["peakclip", "--sr", "16000", "run", "a.mp4"],
            vec!["peakclip"],
        ] {
            assert_eq!(strings(normalize_args(argv.clone())), argv);
        }
    }

    #[test]
    fn test_default_run() {
        let cli = parse(&["peakclip", "show.mp4"]);
        assert_eq!(cli.window, 2.0);
        assert_eq!(cli.hop, 0.5);
        assert!(cli.sr.is_none());
        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.input, PathBuf::from("show.mp4"));
                assert!(!args.no_clips);
                assert_eq!(args.renditions.to_config(), RenditionConfig::all());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = parse(&["peakclip", "find", "a.wav", "--sr", "22050", "--window", "1.5", "--top", "3"]);
        assert_eq!(cli.sr, Some(22050));
        assert_eq!(cli.window_params(), WindowParams::new(1.5, 0.5));
        match cli.command {
            Command::Find(args) => {
                assert_eq!(args.top, 3);
                assert_eq!(args.min_rms, 0.005);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_split_defaults() {
        let cli = parse(&["peakclip", "split", "talk.mp4", "-t", "600"]);
        match cli.command {
            Command::Split(args) => {
                assert_eq!(args.segment_length, 600);
                assert_eq!(args.output_dir, PathBuf::from("."));
                assert_eq!(args.prefix, "segment");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_rendition_toggles() {
        let cli = parse(&["peakclip", "extract", "p.json", "--no-540p", "--no-gifs", "-o", "clips"]);
        match cli.command {
            Command::Extract(args) => {
                let config = args.renditions.to_config();
                assert!(!config.mp4_540 && !config.gif_540 && !config.gif_270);
                assert!(config.scrolling);
                assert_eq!(args.output_dir, Some(PathBuf::from("clips")));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
