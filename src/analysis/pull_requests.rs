use super::{MetricCalculator, MetricInput};
use crate::error::Result;
use crate::models::score_card::Metric;
use crate::models::snapshot::RepositorySnapshot;

/// Share of code that reached the default branch through a reviewed PR.
#[derive(Debug, Default, Clone, Copy)]
pub struct PullRequestsCodeMetric;

impl MetricCalculator for PullRequestsCodeMetric {
    fn metric(&self) -> Metric {
        Metric::PullRequestsCodeMetric
    }

    fn calculate(&self, input: &MetricInput) -> Result<f64> {
        Ok(compute_reviewed_fraction(&input.snapshot))
    }
}

/// Reviewed merged-PR additions over all additions, clamped to [0, 1].
///
/// The denominator is the commit history's additions when the resolver
/// supplied them, otherwise all merged-PR additions. Nothing to measure
/// scores 0.
pub fn compute_reviewed_fraction(snapshot: &RepositorySnapshot) -> f64 {
    let merged = snapshot.pull_requests.iter().filter(|pr| pr.merged);
    let (reviewed, merged_total) = merged.fold((0u64, 0u64), |(reviewed, total), pr| {
        let reviewed = if pr.review_count > 0 {
            reviewed + pr.additions
        } else {
            reviewed
        };
        (reviewed, total + pr.additions)
    });

    let commit_total: u64 = snapshot.commits.iter().filter_map(|c| c.additions).sum();
    let total = if commit_total > 0 { commit_total } else { merged_total };
    if total == 0 {
        return 0.0;
    }

    (reviewed as f64 / total as f64).clamp(0.0, 1.0)
}
