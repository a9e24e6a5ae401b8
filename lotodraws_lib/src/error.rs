//! Error types for the extraction pipeline.

use std::time::Duration;

use thiserror::Error;

/// Invocation-fatal failures of the fetch stage.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Session creation or navigation failed.
    #[error("network error: {0}")]
    Network(String),
    /// The ready signal was never observed, or the invocation ceiling was hit.
    #[error("timed out after {waited:?} waiting for {what}")]
    Timeout { what: String, waited: Duration },
    /// A DOM handle could not be resolved to a live element within the retry bound.
    #[error("element {locator} still stale after {attempts} attempts")]
    StaleHandle { locator: String, attempts: usize },
    /// A selection control never reflected the requested value.
    #[error("control {control} shows {observed:?} instead of {requested:?} after {attempts} attempts")]
    SelectionMismatch {
        control: String,
        requested: String,
        observed: Option<String>,
        attempts: usize,
    },
    /// The rendering backend misbehaved in a way none of the above covers.
    #[error("rendering backend error: {0}")]
    Backend(String),
}

impl FetchError {
    /// Short tag for logs and CLI summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Network(_) => "network",
            FetchError::Timeout { .. } => "timeout",
            FetchError::StaleHandle { .. } => "stale_handle",
            FetchError::SelectionMismatch { .. } => "selection_mismatch",
            FetchError::Backend(_) => "backend",
        }
    }
}

/// A parser strategy found no recognizable top-level structure in the document.
#[derive(Error, Debug)]
#[error("{strategy}: {reason}")]
pub struct StructuralError {
    pub strategy: &'static str,
    pub reason: String,
}

impl StructuralError {
    pub fn new(strategy: &'static str, reason: impl Into<String>) -> Self {
        Self {
            strategy,
            reason: reason.into(),
        }
    }
}

/// Per-unit date failures. Always local: the caller drops the candidate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateError {
    #[error("unknown month {0:?}")]
    UnknownMonth(String),
    #[error("invalid calendar date {year}-{month:02}-{day:02}")]
    InvalidDate { year: i32, month: u32, day: u32 },
    #[error("invalid hour {0}")]
    InvalidHour(u32),
    #[error("unparseable period {0:?}")]
    InvalidPeriod(String),
}

/// Failures loading the pipeline configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("unknown source {0:?}")]
    UnknownSource(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors surfaced to the caller of an extraction run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("structural error: {0}")]
    Structural(#[from] StructuralError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
