use super::{MetricCalculator, MetricInput};
use crate::error::Result;
use crate::models::score_card::Metric;

/// More than this many distinct authors counts as a healthy bus factor.
const MIN_MAINTAINERS: usize = 3;

/// Active-maintainer signal from the contributor list.
///
/// Counts distinct author names over the whole list. The resolver's 30-day
/// window is not applied here, so this is a head count rather than a
/// time-windowed bus factor.
#[derive(Debug, Default, Clone, Copy)]
pub struct BusFactor;

impl MetricCalculator for BusFactor {
    fn metric(&self) -> Metric {
        Metric::BusFactor
    }

    fn calculate(&self, input: &MetricInput) -> Result<f64> {
        Ok(compute_bus_factor(input.snapshot.distinct_authors()))
    }
}

/// 1 when more than three distinct authors contribute, else 0.
pub fn compute_bus_factor(distinct_authors: usize) -> f64 {
    if distinct_authors > MIN_MAINTAINERS {
        1.0
    } else {
        0.0
    }
}
