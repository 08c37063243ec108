use crate::analysis::{default_calculators, MetricCalculator, MetricInput};
use crate::commands::output::{format_record, format_unratable};
use crate::commands::settings::ScoringSettings;
use crate::commands::workdir::WorkingDirectory;
use crate::error::RatingError;
use crate::models::score_card::{Metric, MetricResult, RatingOutcome, ScoreCard};
use crate::models::snapshot::RepositorySnapshot;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;

pub struct ScoreOrchestrator {
    calculators: Vec<Arc<dyn MetricCalculator>>,
    settings: ScoringSettings,
}

impl ScoreOrchestrator {
    pub fn new(settings: ScoringSettings) -> Self {
        Self::with_calculators(default_calculators(), settings)
    }

    pub fn with_calculators(
        calculators: Vec<Arc<dyn MetricCalculator>>,
        settings: ScoringSettings,
    ) -> Self {
        Self {
            calculators,
            settings,
        }
    }

    pub fn settings(&self) -> &ScoringSettings {
        &self.settings
    }

    pub async fn score(&self, snapshot: RepositorySnapshot, clone_path: Option<PathBuf>) -> ScoreCard {
        let input = Arc::new(MetricInput::new(snapshot, clone_path));
        let limit = self.settings.metric_timeout;

        let handles: Vec<_> = self
            .calculators
            .iter()
            .map(|calculator| {
                let metric = calculator.metric();
                let task = run_calculator(Arc::clone(calculator), Arc::clone(&input), limit);
                (metric, tokio::spawn(task))
            })
            .collect();

        let mut metrics = BTreeMap::new();
        for (metric, handle) in handles {
            let result = handle.await.unwrap_or_else(|e| {
                log::warn!("{metric} task aborted: {e}; defaulting to 0");
                MetricResult {
                    value: 0.0,
                    latency_seconds: 0.0,
                }
            });
            metrics.insert(metric, result);
        }

        let start = Instant::now();
        let net_score = net_score(&metrics, &self.settings.weights);
        let net_score_latency_seconds = start.elapsed().as_secs_f64();

        ScoreCard {
            metrics,
            net_score,
            net_score_latency_seconds,
        }
    }

    pub async fn rate(&self, snapshot: RepositorySnapshot, clone_path: Option<PathBuf>) -> RatingOutcome {
        let url = snapshot.canonical_url.clone();
        let card = self.score(snapshot, clone_path).await;
        log::info!("rated {} net={:.3}", url.trim(), card.net_score);

        RatingOutcome {
            record: format_record(&url, &card),
            net_score: card.net_score,
        }
    }

    // Never fails: clone errors and scoring crashes yield the unratable record.
    pub async fn rate_repository(self: Arc<Self>, snapshot: RepositorySnapshot) -> RatingOutcome {
        let url = snapshot.canonical_url.clone();

        let workdir = match WorkingDirectory::allocate(&self.settings.workdir_root) {
            Ok(dir) => dir,
            Err(e) => return resolution_failure(&url, &e),
        };

        let clone_url = url.trim().to_string();
        let branch = snapshot.default_branch.clone();
        let depth = self.settings.clone_depth;
        let cloned = tokio::task::spawn_blocking(move || {
            let result = workdir.clone_repository(&clone_url, branch.as_deref(), depth);
            (workdir, result)
        })
        .await;

        let (workdir, clone_path) = match cloned {
            Ok((workdir, Ok(path))) => (workdir, path),
            Ok((_workdir, Err(e))) => return resolution_failure(&url, &e),
            Err(e) => {
                return resolution_failure(&url, &RatingError::resolution(format!("clone task aborted: {e}")))
            }
        };

        let orchestrator = Arc::clone(&self);
        let scoring = tokio::spawn(async move { orchestrator.rate(snapshot, Some(clone_path)).await });
        let outcome = match scoring.await {
            Ok(outcome) => outcome,
            Err(e) => {
                log::error!("scoring {} crashed: {e}", url.trim());
                unratable_outcome(&url)
            }
        };

        drop(workdir);
        outcome
    }
}

pub async fn rate_repository(snapshot: RepositorySnapshot, settings: ScoringSettings) -> RatingOutcome {
    Arc::new(ScoreOrchestrator::new(settings))
        .rate_repository(snapshot)
        .await
}

async fn run_calculator(
    calculator: Arc<dyn MetricCalculator>,
    input: Arc<MetricInput>,
    limit: Duration,
) -> MetricResult {
    let metric = calculator.metric();
    let start = Instant::now();
    let task = tokio::task::spawn_blocking(move || calculator.calculate(&input));

    let outcome = match timeout(limit, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join)) => Err(RatingError::metric(metric, format!("calculator panicked: {join}"))),
        Err(_) => Err(RatingError::Timeout {
            metric,
            seconds: limit.as_secs(),
        }),
    };
    let latency_seconds = start.elapsed().as_secs_f64();

    let value = match outcome {
        Ok(value) if value.is_finite() => value.clamp(0.0, 1.0),
        Ok(value) => {
            log::warn!("{metric} returned {value}; defaulting to 0");
            0.0
        }
        Err(e) => {
            log::warn!("{e}; defaulting {metric} to 0");
            0.0
        }
    };

    MetricResult {
        value,
        latency_seconds,
    }
}

pub fn net_score(metrics: &BTreeMap<Metric, MetricResult>, weights: &HashMap<Metric, f64>) -> f64 {
    let (weighted, total_weight) = metrics.iter().fold((0.0, 0.0), |(sum, total), (metric, result)| {
        let w = weights.get(metric).copied().unwrap_or(0.0);
        (sum + w * result.value, total + w)
    });

    if total_weight <= f64::EPSILON {
        return 0.0;
    }
    (weighted / total_weight).clamp(0.0, 1.0)
}

fn unratable_outcome(url: &str) -> RatingOutcome {
    RatingOutcome {
        record: format_unratable(url),
        net_score: 0.0,
    }
}

fn resolution_failure(url: &str, error: &RatingError) -> RatingOutcome {
    log::warn!("cannot rate {}: {error}", url.trim());
    unratable_outcome(url)
}
