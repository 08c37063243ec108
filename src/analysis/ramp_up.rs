use super::readability::readability_score;
use super::{MetricCalculator, MetricInput};
use crate::error::Result;
use crate::models::score_card::Metric;
use std::fs;
use std::path::{Path, PathBuf};

const README: &str = "README.md";

/// Onboarding proxy: readability of the root `README.md`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RampUp;

impl MetricCalculator for RampUp {
    fn metric(&self) -> Metric {
        Metric::RampUp
    }

    fn calculate(&self, input: &MetricInput) -> Result<f64> {
        let root = input.clone_root(Metric::RampUp)?;
        Ok(compute_ramp_up(root))
    }
}

/// 0 when the README is missing or unreadable.
pub fn compute_ramp_up(clone_root: &Path) -> f64 {
    let Some(readme) = find_readme(clone_root) else {
        log::debug!("no {README} in {}", clone_root.display());
        return 0.0;
    };

    match fs::read_to_string(&readme) {
        Ok(markdown) => readability_score(&markdown),
        Err(e) => {
            log::warn!("could not read {}: {e}", readme.display());
            0.0
        }
    }
}

/// Exact-case match, even on case-insensitive filesystems.
fn find_readme(clone_root: &Path) -> Option<PathBuf> {
    fs::read_dir(clone_root)
        .ok()?
        .flatten()
        .find(|entry| entry.file_name() == README && entry.path().is_file())
        .map(|entry| entry.path())
}
