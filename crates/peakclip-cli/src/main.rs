//! peakclip binary.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use peakclip_cli::cli::{DEFAULT_ANALYSIS_CHANNELS, DEFAULT_SPLIT_CHANNELS};
use peakclip_cli::pipeline::{self, AnalysisOptions, RunOptions};
use peakclip_cli::{error_report, init_tracing, normalize_args, Cli, Command, PipelineConfig};
use peakclip_media::SplitOptions;
use peakclip_models::{EncodingConfig, SelectionConfig};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse_from(normalize_args(std::env::args_os()));
    let config = PipelineConfig::from_env();
    info!(config = ?config, "Starting peakclip");

    match dispatch(cli, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "peakclip failed");
            eprintln!("Error: {}", error_report(&err));
            ExitCode::from(1)
        }
    }
}

async fn dispatch(cli: Cli, config: &PipelineConfig) -> Result<()> {
    let window = cli.window_params();

    match cli.command {
        Command::Run(args) => {
            let options = RunOptions {
                analysis: AnalysisOptions {
                    window,
                    sample_rate: cli.sr,
                    channels: cli.channels.unwrap_or(DEFAULT_ANALYSIS_CHANNELS),
                    min_rms: args.min_rms.unwrap_or(config.min_rms),
                },
                clips: !args.no_clips,
                renditions: args.renditions.to_config(),
                encoding: EncodingConfig::default(),
            };
            let summary = pipeline::run(&args.input, &options, config)
                .await
                .with_context(|| format!("processing {}", args.input.display()))?;

            println!("WAV segments written to: {}", summary.output_dir.display());
            println!("Peak info written to: {}", summary.peaks_file.display());
            if options.clips {
                println!("{} clip(s) extracted to: {}", summary.clips, summary.output_dir.display());
            }
        }
        Command::Split(args) => {
            let options = SplitOptions::new(&args.output_dir, &args.prefix)
                .with_segment_seconds(args.segment_length)
                .with_sample_rate(cli.sr)
                .with_channels(cli.channels.unwrap_or(DEFAULT_SPLIT_CHANNELS));
            let chunks = pipeline::split(&args.input, &options, config)
                .await
                .with_context(|| format!("splitting {}", args.input.display()))?;

            for chunk in chunks {
                println!("{}", chunk.display());
            }
        }
        Command::Find(args) => {
            let selection = SelectionConfig::default()
                .with_peaks_per_bin(args.top)
                .with_min_rms(args.min_rms);
            let segments = pipeline::find(&args.input, window, cli.sr, selection, &config.runner())
                .await
                .with_context(|| format!("finding peaks in {}", args.input.display()))?;

            println!("{}", serde_json::to_string_pretty(&segments)?);
        }
        Command::Analyze(args) => {
            let analysis = AnalysisOptions {
                window,
                sample_rate: cli.sr,
                channels: cli.channels.unwrap_or(DEFAULT_ANALYSIS_CHANNELS),
                min_rms: args.min_rms.unwrap_or(config.min_rms),
            };
            let summary = pipeline::analyze(&args.input, &analysis, args.top, config)
                .await
                .with_context(|| format!("analysing {}", args.input.display()))?;

            println!("WAV written to: {}", summary.wav_file.display());
            println!("Peak info written to: {}", summary.peaks_file.display());
        }
        Command::Extract(args) => {
            let clips = pipeline::extract(
                &args.peaks,
                args.output_dir.as_deref(),
                &args.renditions.to_config(),
                &EncodingConfig::default(),
                config,
            )
            .await
            .with_context(|| format!("extracting clips for {}", args.peaks.display()))?;

            println!("{} clip(s) extracted", clips);
        }
    }

    Ok(())
}
