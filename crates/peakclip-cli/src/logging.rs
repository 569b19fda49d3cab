//! Tracing setup and structured stage logging.

use std::path::Path;

use tracing::{error, info, warn, Span};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Directive applied on top of `RUST_LOG`.
pub const DEFAULT_DIRECTIVE: &str = "peakclip=info";

/// Initialise the global subscriber.
///
/// Human-readable output by default, JSON when `LOG_FORMAT=json`. Logs go to
/// stderr so stdout stays clean for results.
pub fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let mut env_filter = EnvFilter::from_default_env();
    if let Ok(directive) = DEFAULT_DIRECTIVE.parse() {
        env_filter = env_filter.add_directive(directive);
    }

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

/// Logger that tags every event with the input file and pipeline stage.
#[derive(Debug, Clone)]
pub struct StageLogger {
    input: String,
    stage: String,
}

impl StageLogger {
    pub fn new(input: &Path, stage: &str) -> Self {
        Self {
            input: input.display().to_string(),
            stage: stage.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(input = %self.input, stage = %self.stage, "Stage started: {}", message);
    }

    pub fn log_progress(&self, message: &str) {
        info!(input = %self.input, stage = %self.stage, "Stage progress: {}", message);
    }

    pub fn log_warning(&self, message: &str) {
        warn!(input = %self.input, stage = %self.stage, "Stage warning: {}", message);
    }

    pub fn log_error(&self, message: &str) {
        error!(input = %self.input, stage = %self.stage, "Stage error: {}", message);
    }

    pub fn log_completion(&self, message: &str) {
        info!(input = %self.input, stage = %self.stage, "Stage completed: {}", message);
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn stage(&self) -> &str {
        &self.stage
    }

    /// Span carrying the input and stage, for attaching to nested work.
    pub fn create_span(&self) -> Span {
        tracing::info_span!("stage", input = %self.input, stage = %self.stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_logger() {
        let logger = StageLogger::new(Path::new("media/show.mp4"), "run");
        assert_eq!(logger.input(), "media/show.mp4");
        assert_eq!(logger.stage(), "run");
    }

    #[test]
    fn test_default_directive_parses() {
        assert!(DEFAULT_DIRECTIVE.parse::<tracing_subscriber::filter::Directive>().is_ok());
    }
}
