use thiserror::Error;

use crate::models::score_card::Metric;

/// Everything that can go wrong while rating a repository.
///
/// Only `Resolution` aborts a rating; every other variant is caught by the
/// orchestrator and turned into a zero score for the metric that raised it.
#[derive(Debug, Error)]
pub enum RatingError {
    #[error("RESOLUTION_FAILED: {0}")]
    Resolution(String),

    #[error("{metric} failed: {reason}")]
    Metric { metric: Metric, reason: String },

    #[error("{metric} timed out after {seconds}s")]
    Timeout { metric: Metric, seconds: u64 },

    #[error("Invalid settings: {0}")]
    Settings(String),

    #[error("Malformed manifest {path}: {reason}")]
    Manifest { path: String, reason: String },

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RatingError {
    pub fn metric<S: Into<String>>(metric: Metric, reason: S) -> Self {
        RatingError::Metric {
            metric,
            reason: reason.into(),
        }
    }

    pub fn resolution<S: Into<String>>(reason: S) -> Self {
        RatingError::Resolution(reason.into())
    }
}

pub type Result<T> = std::result::Result<T, RatingError>;
