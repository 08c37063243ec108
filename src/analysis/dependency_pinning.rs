use super::{MetricCalculator, MetricInput};
use crate::error::{RatingError, Result};
use crate::models::score_card::Metric;
use std::fs;
use std::path::Path;

/// How a requirement string without an operator should be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ecosystem {
    /// Bare `1.2.3` is an exact version.
    Npm,
    /// Bare `1.2.3` is a caret requirement.
    Cargo,
}

/// Fraction of runtime dependencies pinned to at least major.minor.
#[derive(Debug, Default, Clone, Copy)]
pub struct DependencyPinning;

impl MetricCalculator for DependencyPinning {
    fn metric(&self) -> Metric {
        Metric::DependencyPinning
    }

    fn calculate(&self, input: &MetricInput) -> Result<f64> {
        let root = input.clone_root(Metric::DependencyPinning)?;
        let mut requirements = npm_requirements(root)?;
        requirements.extend(cargo_requirements(root)?);

        if requirements.is_empty() {
            return Ok(1.0);
        }

        let pinned = requirements
            .iter()
            .filter(|(req, eco)| is_pinned(req, *eco))
            .count();
        log::debug!("{pinned}/{} dependencies pinned", requirements.len());
        Ok(pinned as f64 / requirements.len() as f64)
    }
}

fn npm_requirements(root: &Path) -> Result<Vec<(String, Ecosystem)>> {
    let path = root.join("package.json");
    if !path.is_file() {
        return Ok(Vec::new());
    }

    let raw = fs::read_to_string(&path)?;
    let manifest: serde_json::Value = serde_json::from_str(&raw).map_err(|e| RatingError::Manifest {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    Ok(manifest
        .get("dependencies")
        .and_then(|d| d.as_object())
        .map(|deps| {
            deps.values()
                .map(|v| (v.as_str().unwrap_or_default().to_string(), Ecosystem::Npm))
                .collect()
        })
        .unwrap_or_default())
}

fn cargo_requirements(root: &Path) -> Result<Vec<(String, Ecosystem)>> {
    let path = root.join("Cargo.toml");
    if !path.is_file() {
        return Ok(Vec::new());
    }

    let raw = fs::read_to_string(&path)?;
    let manifest: toml::Table = raw.parse().map_err(|e: toml::de::Error| RatingError::Manifest {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let Some(deps) = manifest.get("dependencies").and_then(|d| d.as_table()) else {
        return Ok(Vec::new());
    };

    // Path, git and workspace-inherited dependencies carry no registry version.
    Ok(deps
        .values()
        .filter_map(|dep| match dep {
            toml::Value::String(req) => Some(req.clone()),
            toml::Value::Table(table) => table
                .get("version")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            _ => None,
        })
        .map(|req| (req, Ecosystem::Cargo))
        .collect())
}

fn is_pinned(requirement: &str, ecosystem: Ecosystem) -> bool {
    let req = requirement.trim();
    if req.is_empty() || req.contains(['>', '<', '|', ',', ' ']) {
        return false;
    }

    if let Some(rest) = req.strip_prefix('^') {
        return caret_pins_minor(rest);
    }
    if let Some(rest) = req.strip_prefix('~').or_else(|| req.strip_prefix('=')) {
        return pins_minor(rest);
    }

    match ecosystem {
        Ecosystem::Npm => pins_minor(req.trim_start_matches('v')),
        Ecosystem::Cargo => caret_pins_minor(req),
    }
}

/// `^0.y` locks the minor version; `^x.y` with x > 0 only locks the major.
fn caret_pins_minor(version: &str) -> bool {
    version.split('.').next() == Some("0") && pins_minor(version)
}

/// True when both major and minor are concrete numbers.
fn pins_minor(version: &str) -> bool {
    let mut parts = version.split('.');
    let numeric = |p: Option<&str>| p.is_some_and(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()));
    numeric(parts.next()) && numeric(parts.next())
}
