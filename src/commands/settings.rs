use crate::error::{RatingError, Result};
use crate::models::score_card::Metric;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const SETTINGS_SCHEMA_VERSION: i64 = 1;
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CLONE_DEPTH: u64 = 1;
const DEFAULT_RELATIVE_WEIGHT: f64 = 1.0;

pub const SETTINGS_ENV: &str = "TRUSTGATE_SETTINGS";

#[derive(Debug, Clone)]
pub struct ScoringSettings {
    pub metric_timeout: Duration,
    // 0 fetches full history
    pub clone_depth: u32,
    pub workdir_root: PathBuf,
    pub weights: HashMap<Metric, f64>,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        effective_settings(&migrate_settings(json!({})))
    }
}

pub fn default_weights() -> HashMap<Metric, f64> {
    let share = 1.0 / Metric::ALL.len() as f64;
    Metric::ALL.into_iter().map(|m| (m, share)).collect()
}

pub fn load_scoring_settings(path: Option<&Path>) -> Result<ScoringSettings> {
    let raw = match path {
        Some(path) => load_settings_from_disk(path)?,
        None => migrate_settings(json!({})),
    };
    Ok(effective_settings(&raw))
}

pub fn load_settings_from_disk(path: &Path) -> Result<Value> {
    if !path.exists() {
        log::debug!("settings file {} not found, using defaults", path.display());
        return Ok(migrate_settings(json!({})));
    }

    let raw = fs::read_to_string(path)
        .map_err(|e| RatingError::Settings(format!("Failed to read {}: {e}", path.display())))?;
    let original = serde_json::from_str::<Value>(&raw).unwrap_or_else(|e| {
        log::warn!("ignoring malformed settings {}: {e}", path.display());
        json!({})
    });

    Ok(migrate_settings(original))
}

fn effective_settings(settings: &Value) -> ScoringSettings {
    let metric_timeout = settings
        .get("metricTimeoutSecs")
        .and_then(Value::as_u64)
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
    let clone_depth = settings
        .get("cloneDepth")
        .and_then(Value::as_u64)
        .unwrap_or(DEFAULT_CLONE_DEPTH) as u32;
    let workdir_root = settings
        .get("workdirRoot")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir);

    let mut weights = default_weights();
    if let Some(obj) = settings.get("weights").and_then(Value::as_object) {
        for (key, value) in obj {
            if let (Some(metric), Some(v)) = (Metric::from_key(key), value.as_f64()) {
                weights.insert(metric, v);
            }
        }
    }

    ScoringSettings {
        metric_timeout: Duration::from_secs(metric_timeout),
        clone_depth,
        workdir_root,
        weights,
    }
}

fn migrate_settings(input: Value) -> Value {
    let mut out = match input {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    if let Value::Object(defaults) = default_settings() {
        for (key, value) in defaults {
            out.entry(key).or_insert(value);
        }
    }
    sanitize_settings(&mut out);
    out.insert("schema_version".to_string(), json!(SETTINGS_SCHEMA_VERSION));

    Value::Object(out)
}

fn default_settings() -> Value {
    let weights: Map<String, Value> = Metric::ALL
        .iter()
        .map(|metric| (metric.key().to_string(), json!(DEFAULT_RELATIVE_WEIGHT)))
        .collect();

    json!({
        "schema_version": SETTINGS_SCHEMA_VERSION,
        "metricTimeoutSecs": DEFAULT_TIMEOUT_SECS,
        "cloneDepth": DEFAULT_CLONE_DEPTH,
        "workdirRoot": "",
        "weights": weights
    })
}

fn sanitize_settings(obj: &mut Map<String, Value>) {
    let bounds = [
        ("metricTimeoutSecs", 1, 600, DEFAULT_TIMEOUT_SECS),
        ("cloneDepth", 0, 1000, DEFAULT_CLONE_DEPTH),
    ];
    for (key, min, max, default) in bounds {
        let value = obj.get(key).and_then(Value::as_u64).unwrap_or(default);
        obj.insert(key.to_string(), json!(value.clamp(min, max)));
    }
    if !obj.get("workdirRoot").is_some_and(Value::is_string) {
        obj.insert("workdirRoot".to_string(), json!(""));
    }

    // Weights are relative shares. Metrics left out of the file weigh 1,
    // unknown keys are dropped, and the result sums to 1.
    let declared = obj.get("weights").and_then(Value::as_object).cloned().unwrap_or_default();
    let shares: Vec<(Metric, f64)> = Metric::ALL
        .iter()
        .map(|metric| {
            let share = declared
                .get(metric.key())
                .and_then(Value::as_f64)
                .filter(|w| w.is_finite())
                .unwrap_or(DEFAULT_RELATIVE_WEIGHT);
            (*metric, share.max(0.0))
        })
        .collect();

    let total: f64 = shares.iter().map(|(_, share)| share).sum();
    let weights: Map<String, Value> = if total > f64::EPSILON {
        shares
            .into_iter()
            .map(|(metric, share)| (metric.key().to_string(), json!(share / total)))
            .collect()
    } else {
        log::warn!("all metric weights are zero, weighting metrics equally");
        default_weights()
            .into_iter()
            .map(|(metric, w)| (metric.key().to_string(), json!(w)))
            .collect()
    };
    obj.insert("weights".to_string(), Value::Object(weights));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_weight_every_metric_equally() {
        let settings = ScoringSettings::default();
        assert_eq!(settings.metric_timeout, Duration::from_secs(30));
        assert_eq!(settings.clone_depth, 1);
        assert_eq!(settings.weights.len(), Metric::ALL.len());
        for w in settings.weights.values() {
            assert!((w - 1.0 / 7.0).abs() < 1e-12);
        }
    }

    #[test]
    fn weights_are_relative_shares() {
        let settings = effective_settings(&migrate_settings(json!({
            "weights": { "BusFactor": 2, "Correctness": 2, "Bogus": 99 }
        })));

        assert!((settings.weights[&Metric::BusFactor] - 2.0 / 9.0).abs() < 1e-12);
        assert!((settings.weights[&Metric::Correctness] - 2.0 / 9.0).abs() < 1e-12);
        assert!((settings.weights[&Metric::RampUp] - 1.0 / 9.0).abs() < 1e-12);
        let sum: f64 = settings.weights.values().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn stamps_schema_version_and_drops_unknown_weights() {
        let migrated = migrate_settings(json!({ "weights": { "Bogus": 3 } }));
        let weights = migrated["weights"].as_object().unwrap();
        assert!(weights.get("Bogus").is_none());
        assert_eq!(weights.len(), Metric::ALL.len());
        assert_eq!(migrated["schema_version"], json!(SETTINGS_SCHEMA_VERSION));
    }

    #[test]
    fn negative_or_all_zero_weights_fall_back() {
        let zeroed: Map<String, Value> = Metric::ALL
            .iter()
            .map(|m| (m.key().to_string(), json!(0)))
            .collect();
        let settings = effective_settings(&migrate_settings(json!({ "weights": zeroed })));
        for w in settings.weights.values() {
            assert!((w - 1.0 / 7.0).abs() < 1e-12);
        }

        let settings = effective_settings(&migrate_settings(json!({
            "weights": { "License": -5 }
        })));
        assert_eq!(settings.weights[&Metric::License], 0.0);
        assert!((settings.weights[&Metric::BusFactor] - 1.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn clamps_numeric_settings() {
        let settings = effective_settings(&migrate_settings(json!({
            "metricTimeoutSecs": 0,
            "cloneDepth": 5000,
            "workdirRoot": "/var/tmp/ratings"
        })));

        assert_eq!(settings.metric_timeout, Duration::from_secs(1));
        assert_eq!(settings.clone_depth, 1000);
        assert_eq!(settings.workdir_root, PathBuf::from("/var/tmp/ratings"));
    }

    #[test]
    fn missing_or_malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let missing = load_scoring_settings(Some(dir.path().join("nope.json").as_path())).unwrap();
        assert_eq!(missing.clone_depth, 1);

        let path = dir.path().join("settings.json");
        fs::write(&path, "not json").unwrap();
        let malformed = load_scoring_settings(Some(path.as_path())).unwrap();
        assert_eq!(malformed.metric_timeout, Duration::from_secs(30));

        fs::write(&path, r#"{"cloneDepth": 0}"#).unwrap();
        assert_eq!(load_scoring_settings(Some(path.as_path())).unwrap().clone_depth, 0);
    }
}
