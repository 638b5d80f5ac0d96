use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExporterError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP server error: {0}")]
    Server(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure modes of a single probe attempt.
///
/// Only `Timeout` is a spin-up risk and feeds the cooldown schedule;
/// the other variants classify as error state without a cooldown.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("probe timed out after {elapsed:?}")]
    Timeout { elapsed: Duration },

    #[error("failed to run probe command: {0}")]
    Execution(#[source] std::io::Error),

    #[error("probe command exited with failure status")]
    ExitFailure,

    #[error("probe output did not contain a recognizable power mode")]
    UnparseableOutput,
}

impl ProbeError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

pub type Result<T> = std::result::Result<T, ExporterError>;
