//! CLI error types.

use std::error::Error as StdError;
use std::path::PathBuf;

use thiserror::Error;

use peakclip_media::{MediaError, SelectionError};

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Input not found: {0}")]
    InputNotFound(PathBuf),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl CliError {
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Diagnostic output of the external tool behind this error, if any.
    pub fn tool_stderr(&self) -> Option<&str> {
        match self {
            Self::Media(err) => err.tool_stderr(),
            _ => None,
        }
    }
}

impl From<SelectionError> for CliError {
    fn from(err: SelectionError) -> Self {
        Self::Media(err.into())
    }
}

/// Render `err` for the terminal: the cause chain, then the stderr tail of
/// the first failed tool found in it.
pub fn error_report(err: &anyhow::Error) -> String {
    let mut report = format!("{err:?}");
    if let Some(stderr) = err.chain().find_map(cause_stderr) {
        report.push_str("\n\nffmpeg output:\n");
        report.push_str(stderr);
    }
    report
}

fn cause_stderr<'a>(cause: &'a (dyn StdError + 'static)) -> Option<&'a str> {
    if let Some(err) = cause.downcast_ref::<CliError>() {
        return err.tool_stderr();
    }
    cause.downcast_ref::<MediaError>().and_then(MediaError::tool_stderr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    fn failed_run() -> anyhow::Result<()> {
        let err = MediaError::ffmpeg_failed(
            "ffmpeg exited with status 1",
            Some("show.mp4: Invalid data found when processing input".to_string()),
            Some(1),
        );
        Err(CliError::from(err)).context("processing show.mp4")
    }

    #[test]
    fn test_report_includes_ffmpeg_stderr() {
        let err = failed_run().unwrap_err();
        let report = error_report(&err);

        assert!(report.starts_with("processing show.mp4"));
        assert!(report.contains("Invalid data found when processing input"));
    }

    #[test]
    fn test_report_does_not_repeat_media_cause() {
        let err = failed_run().unwrap_err();
        let report = error_report(&err);
        assert_eq!(report.matches("ffmpeg exited with status 1").count(), 1);
    }

    #[test]
    fn test_report_without_tool_output() {
        let err = anyhow::Error::from(CliError::InputNotFound(PathBuf::from("missing.mp4")));
        let report = error_report(&err);
        assert!(report.contains("missing.mp4"));
        assert!(!report.contains("ffmpeg output"));

        let blank = CliError::from(MediaError::ffmpeg_failed("boom", Some("  \n".to_string()), None));
        assert!(blank.tool_stderr().is_none());
    }

    #[test]
    fn test_report_finds_bare_media_error() {
        let err = anyhow::Error::from(MediaError::FfprobeFailed {
            message: "ffprobe exited with status 1".to_string(),
            stderr: Some("moov atom not found".to_string()),
        });
        assert!(error_report(&err).contains("moov atom not found"));
    }
}
