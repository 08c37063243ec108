use super::bus_factor::BusFactor;
use super::{MetricCalculator, MetricInput};
use crate::error::Result;
use crate::models::score_card::Metric;
use crate::models::snapshot::{Issue, IssueState, Lifespan};

const RESPONSE_TIME_WEIGHT: f64 = 0.4;
const CLOSURE_TIME_WEIGHT: f64 = 0.3;
const OPEN_CLOSED_WEIGHT: f64 = 0.2;
const ACTIVE_MAINTAINERS_WEIGHT: f64 = 0.1;

/// (upper bound in hours, score) pairs; anything slower scores 0.
const RESPONSE_BUCKETS: [(f64, f64); 4] = [(96.0, 1.0), (168.0, 0.7), (336.0, 0.4), (744.0, 0.1)];
const CLOSURE_BUCKETS: [(f64, f64); 4] = [(336.0, 1.0), (504.0, 0.7), (672.0, 0.4), (840.0, 0.1)];

/// Composite of four bucketed sub-scores, weighted 0.4/0.3/0.2/0.1.
///
/// The active-maintainer term runs its own [`BusFactor`] instance rather
/// than reusing the top-level result.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResponsiveMaintainer {
    active_maintainers: BusFactor,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResponsivenessBreakdown {
    pub response_time: f64,
    pub closure_time: f64,
    pub open_closed_ratio: f64,
    pub active_maintainers: f64,
}

impl ResponsivenessBreakdown {
    pub fn composite(&self) -> f64 {
        RESPONSE_TIME_WEIGHT * self.response_time
            + CLOSURE_TIME_WEIGHT * self.closure_time
            + OPEN_CLOSED_WEIGHT * self.open_closed_ratio
            + ACTIVE_MAINTAINERS_WEIGHT * self.active_maintainers
    }
}

impl ResponsiveMaintainer {
    pub fn breakdown(&self, input: &MetricInput) -> Result<ResponsivenessBreakdown> {
        let snapshot = &input.snapshot;
        let pooled = snapshot
            .issues
            .iter()
            .filter_map(Lifespan::hours_open)
            .chain(snapshot.pull_requests.iter().filter_map(Lifespan::hours_open));

        Ok(ResponsivenessBreakdown {
            response_time: bucket(mean_hours(pooled), &RESPONSE_BUCKETS),
            closure_time: bucket(
                mean_hours(snapshot.issues.iter().filter_map(Lifespan::hours_open)),
                &CLOSURE_BUCKETS,
            ),
            open_closed_ratio: open_closed_score(&snapshot.issues),
            active_maintainers: self.active_maintainers.calculate(input)?,
        })
    }
}

impl MetricCalculator for ResponsiveMaintainer {
    fn metric(&self) -> Metric {
        Metric::ResponsiveMaintainer
    }

    fn calculate(&self, input: &MetricInput) -> Result<f64> {
        let breakdown = self.breakdown(input)?;
        log::debug!("responsiveness breakdown: {breakdown:?}");
        Ok(breakdown.composite())
    }
}

/// Mean of the durations, or `None` when nothing had both timestamps.
fn mean_hours(hours: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = hours.fold((0.0, 0usize), |(sum, count), h| (sum + h, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// No measurable durations scores 0, same as the slowest bucket.
fn bucket(mean: Option<f64>, buckets: &[(f64, f64)]) -> f64 {
    let Some(mean) = mean else {
        return 0.0;
    };
    buckets
        .iter()
        .find(|(limit, _)| mean < *limit)
        .map(|(_, score)| *score)
        .unwrap_or(0.0)
}

/// Hard cliff: fewer open than closed issues scores 1, otherwise 0.
pub fn open_closed_score(issues: &[Issue]) -> f64 {
    let open = issues.iter().filter(|i| i.state == IssueState::Open).count();
    let closed = issues.iter().filter(|i| i.state == IssueState::Closed).count();

    if open + closed == 0 || open == 0 {
        return 1.0;
    }
    if closed == 0 {
        return 0.0;
    }
    if (open as f64 / closed as f64) < 1.0 {
        1.0
    } else {
        0.0
    }
}
