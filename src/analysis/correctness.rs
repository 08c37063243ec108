use super::{MetricCalculator, MetricInput};
use crate::error::Result;
use crate::models::score_card::Metric;

#[derive(Debug, Default, Clone, Copy)]
pub struct Correctness;

impl MetricCalculator for Correctness {
    fn metric(&self) -> Metric {
        Metric::Correctness
    }

    fn calculate(&self, input: &MetricInput) -> Result<f64> {
        let snapshot = &input.snapshot;
        Ok(compute_correctness(
            snapshot.issues.len(),
            snapshot.closed_issue_count(),
        ))
    }
}

/// Bucketed closed/total issue ratio. No issues at all scores 1.
pub fn compute_correctness(total_issues: usize, closed_issues: usize) -> f64 {
    if total_issues == 0 {
        return 1.0;
    }

    let ratio = closed_issues as f64 / total_issues as f64;
    if ratio < 0.1 {
        0.0
    } else if ratio < 0.4 {
        0.4
    } else if ratio < 0.7 {
        0.7
    } else {
        1.0
    }
}
