//! peakclip command-line pipeline.
//!
//! This crate provides:
//! - The `peakclip` argument parser, with `run` as the implicit default
//! - Environment-driven pipeline configuration
//! - The split / analyse / merge / clip pipeline behind each subcommand
//! - Tracing setup and structured stage logging

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;

pub use cli::{normalize_args, Cli, Command};
pub use config::PipelineConfig;
pub use error::{error_report, CliError, CliResult};
pub use logging::{init_tracing, StageLogger};
pub use pipeline::{AnalysisOptions, RunOptions, RunSummary};
