use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Inclusive net-score floor for ingestion into the registry.
pub const ACCEPT_THRESHOLD: f64 = 0.5;

/// Sentinel used for fields that could not be analysed at all.
pub const UNRATABLE: f64 = -1.0;

/// Quality dimensions, declared in record order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Metric {
    RampUp,
    Correctness,
    BusFactor,
    ResponsiveMaintainer,
    License,
    PullRequestsCodeMetric,
    DependencyPinning,
}

impl Metric {
    pub const ALL: [Metric; 7] = [
        Metric::RampUp,
        Metric::Correctness,
        Metric::BusFactor,
        Metric::ResponsiveMaintainer,
        Metric::License,
        Metric::PullRequestsCodeMetric,
        Metric::DependencyPinning,
    ];

    /// Key used in the serialized record and in settings files.
    pub fn key(self) -> &'static str {
        match self {
            Metric::RampUp => "RampUp",
            Metric::Correctness => "Correctness",
            Metric::BusFactor => "BusFactor",
            Metric::ResponsiveMaintainer => "ResponsiveMaintainer",
            Metric::License => "License",
            Metric::PullRequestsCodeMetric => "PullRequestsCodeMetric",
            Metric::DependencyPinning => "DependencyPinning",
        }
    }

    pub fn from_key(key: &str) -> Option<Metric> {
        Metric::ALL.into_iter().find(|m| m.key() == key)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricResult {
    pub value: f64,
    pub latency_seconds: f64,
}

impl MetricResult {
    pub fn unratable() -> Self {
        Self {
            value: UNRATABLE,
            latency_seconds: UNRATABLE,
        }
    }
}

/// Every metric result for one rating request plus the aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreCard {
    pub metrics: BTreeMap<Metric, MetricResult>,
    pub net_score: f64,
    pub net_score_latency_seconds: f64,
}

impl ScoreCard {
    /// The degraded card for sources that cannot be analysed.
    pub fn unratable() -> Self {
        Self {
            metrics: Metric::ALL
                .into_iter()
                .map(|m| (m, MetricResult::unratable()))
                .collect(),
            net_score: UNRATABLE,
            net_score_latency_seconds: UNRATABLE,
        }
    }

    pub fn value(&self, metric: Metric) -> Option<f64> {
        self.metrics.get(&metric).map(|r| r.value)
    }

    pub fn accepted(&self) -> bool {
        accepts(self.net_score)
    }
}

/// What a rating request hands back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingOutcome {
    pub record: String,
    pub net_score: f64,
}

pub fn accepts(net_score: f64) -> bool {
    net_score >= ACCEPT_THRESHOLD
}
