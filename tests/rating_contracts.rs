use chrono::{Duration, TimeZone, Utc};
use git2::{Repository, Signature};
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use trustgate_lib::analysis::{default_calculators, MetricCalculator, MetricInput};
use trustgate_lib::models::snapshot::{Contributor, Issue, IssueState};
use trustgate_lib::{
    accepts, rate_repository, Metric, RatingError, RepositorySnapshot, ScoreOrchestrator,
    ScoringSettings,
};

const README: &str = "# Widget\n\nThe cat sat on the mat.\n";

fn create_source_repo() -> (TempDir, String) {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let files = [
        ("README.md", README),
        ("LICENSE", "MIT License\n\nPermission is hereby granted, free of charge, to any person"),
        ("package.json", r#"{"name":"widget","dependencies":{"left-pad":"1.3.0"}}"#),
    ];

    let repo = Repository::init(temp_dir.path()).expect("init git repo");
    let mut index = repo.index().expect("open git index");
    for (name, contents) in files {
        fs::write(temp_dir.path().join(name), contents).expect("write file");
        index.add_path(Path::new(name)).expect("add file");
    }
    index.write().expect("write git index");
    let tree_id = index.write_tree().expect("write tree");
    let tree = repo.find_tree(tree_id).expect("find tree");
    let signature = Signature::now("Test User", "test@example.com").expect("signature");
    repo.commit(Some("HEAD"), &signature, &signature, "init", &tree, &[])
        .expect("commit");

    let url = temp_dir.path().to_string_lossy().to_string();
    (temp_dir, url)
}

fn healthy_snapshot(url: &str) -> RepositorySnapshot {
    let created = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
    let mut snapshot = RepositorySnapshot::new(url);
    snapshot.contributors = ["alice", "bob", "carol", "dave", "alice"]
        .iter()
        .map(|n| Contributor { author_name: n.to_string() })
        .collect();
    snapshot.issues = (0..3)
        .map(|_| Issue {
            created_at: Some(created),
            closed_at: Some(created + Duration::minutes(45)),
            state: IssueState::Closed,
        })
        .collect();
    snapshot
}

/// Local clones cannot be shallow, so tests fetch full history.
fn test_settings(workdir_root: &Path) -> ScoringSettings {
    ScoringSettings {
        clone_depth: 0,
        workdir_root: workdir_root.to_path_buf(),
        ..ScoringSettings::default()
    }
}

fn leftover_dirs(root: &Path) -> usize {
    fs::read_dir(root).map(|entries| entries.count()).unwrap_or(0)
}

#[tokio::test]
async fn rates_cloned_repository_end_to_end() {
    let (_source, url) = create_source_repo();
    let workdirs = tempfile::tempdir().expect("workdir root");

    let outcome = rate_repository(healthy_snapshot(&url), test_settings(workdirs.path())).await;
    let record: Value = serde_json::from_str(&outcome.record).expect("record is JSON");

    assert_eq!(record["URL"], Value::String(url.clone()));
    assert_eq!(record["BusFactor"].as_f64(), Some(1.0));
    assert_eq!(record["Correctness"].as_f64(), Some(1.0));
    assert_eq!(record["ResponsiveMaintainer"].as_f64(), Some(1.0));
    assert_eq!(record["License"].as_f64(), Some(1.0));
    assert_eq!(record["DependencyPinning"].as_f64(), Some(1.0));
    assert_eq!(record["PullRequestsCodeMetric"].as_f64(), Some(0.0));
    assert!(record["RampUp"].as_f64().unwrap() > 0.0);

    // RampUp plus five perfect scores plus one zero, averaged.
    let ramp_up = outcome.net_score * 7.0 - 5.0;
    assert!((0.0..=1.0).contains(&ramp_up), "net score {}", outcome.net_score);
    assert!(accepts(outcome.net_score));
    assert_eq!(leftover_dirs(workdirs.path()), 0);
}

#[tokio::test]
async fn unreachable_source_yields_unratable_record() {
    let workdirs = tempfile::tempdir().expect("workdir root");
    let missing = workdirs.path().join("does-not-exist");
    let snapshot = RepositorySnapshot::new(missing.to_string_lossy());

    let outcome = rate_repository(snapshot, test_settings(&workdirs.path().join("work"))).await;
    let record: Value = serde_json::from_str(&outcome.record).expect("record is JSON");

    assert_eq!(outcome.net_score, 0.0);
    assert!(!accepts(outcome.net_score));
    assert_eq!(record["NetScore"].as_f64(), Some(-1.0));
    assert_eq!(record["RampUp_Latency"].as_f64(), Some(-1.0));
    assert_eq!(leftover_dirs(&workdirs.path().join("work")), 0);
}

struct Exploding;

impl MetricCalculator for Exploding {
    fn metric(&self) -> Metric {
        Metric::RampUp
    }

    fn calculate(&self, _input: &MetricInput) -> trustgate_lib::error::Result<f64> {
        panic!("readme parser bug");
    }
}

struct Refusing;

impl MetricCalculator for Refusing {
    fn metric(&self) -> Metric {
        Metric::DependencyPinning
    }

    fn calculate(&self, _input: &MetricInput) -> trustgate_lib::error::Result<f64> {
        Err(RatingError::metric(Metric::DependencyPinning, "manifest unreadable"))
    }
}

#[tokio::test]
async fn metric_failures_still_clean_up_and_score_the_rest() {
    let (_source, url) = create_source_repo();
    let workdirs = tempfile::tempdir().expect("workdir root");

    let calculators: Vec<Arc<dyn MetricCalculator>> = default_calculators()
        .into_iter()
        .map(|c| match c.metric() {
            Metric::RampUp => Arc::new(Exploding) as Arc<dyn MetricCalculator>,
            Metric::DependencyPinning => Arc::new(Refusing),
            _ => c,
        })
        .collect();
    let orchestrator = Arc::new(ScoreOrchestrator::with_calculators(
        calculators,
        test_settings(workdirs.path()),
    ));

    let outcome = orchestrator.rate_repository(healthy_snapshot(&url)).await;
    let record: Value = serde_json::from_str(&outcome.record).expect("record is JSON");

    assert_eq!(record["RampUp"].as_f64(), Some(0.0));
    assert_eq!(record["DependencyPinning"].as_f64(), Some(0.0));
    assert_eq!(record["BusFactor"].as_f64(), Some(1.0));
    assert_eq!(record["License"].as_f64(), Some(1.0));
    assert!((outcome.net_score - 4.0 / 7.0).abs() < 1e-9);
    assert_eq!(leftover_dirs(workdirs.path()), 0);
}

#[tokio::test]
async fn rate_uses_existing_checkout_without_cloning() {
    let (source, url) = create_source_repo();
    let orchestrator = ScoreOrchestrator::new(ScoringSettings::default());

    let outcome = orchestrator
        .rate(healthy_snapshot(&url), Some(source.path().to_path_buf()))
        .await;

    assert!(outcome.record.ends_with("}\n"));
    assert!(accepts(outcome.net_score));
    assert!(source.path().join("README.md").exists());
}
