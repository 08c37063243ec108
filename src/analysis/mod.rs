pub mod bus_factor;
pub mod correctness;
pub mod dependency_pinning;
pub mod license;
pub mod pull_requests;
pub mod ramp_up;
pub mod readability;
pub mod responsiveness;
pub mod syllables;

use crate::error::{RatingError, Result};
use crate::models::score_card::Metric;
use crate::models::snapshot::RepositorySnapshot;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Shared, read-only input handed to every calculator of one request.
#[derive(Debug, Clone)]
pub struct MetricInput {
    pub snapshot: RepositorySnapshot,
    pub clone_path: Option<PathBuf>,
}

impl MetricInput {
    pub fn new(snapshot: RepositorySnapshot, clone_path: Option<PathBuf>) -> Self {
        Self {
            snapshot,
            clone_path,
        }
    }

    /// Root of the local clone, or an error attributed to `metric`.
    pub fn clone_root(&self, metric: Metric) -> Result<&Path> {
        self.clone_path
            .as_deref()
            .ok_or_else(|| RatingError::metric(metric, "no local clone available"))
    }
}

/// One quality dimension. Implementations must not mutate shared state.
pub trait MetricCalculator: Send + Sync {
    fn metric(&self) -> Metric;

    /// Normalized score in [0, 1].
    fn calculate(&self, input: &MetricInput) -> Result<f64>;
}

/// The full metric set, one calculator per dimension.
pub fn default_calculators() -> Vec<Arc<dyn MetricCalculator>> {
    vec![
        Arc::new(ramp_up::RampUp),
        Arc::new(correctness::Correctness),
        Arc::new(bus_factor::BusFactor),
        Arc::new(responsiveness::ResponsiveMaintainer::default()),
        Arc::new(license::License),
        Arc::new(pull_requests::PullRequestsCodeMetric),
        Arc::new(dependency_pinning::DependencyPinning),
    ]
}
