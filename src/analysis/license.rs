use super::{MetricCalculator, MetricInput};
use crate::error::Result;
use crate::models::score_card::Metric;
use glob::MatchOptions;
use std::fs;
use std::path::{Path, PathBuf};

const LICENSE_FILE_PATTERNS: [&str; 3] = ["LICEN[CS]E*", "COPYING*", "UNLICENSE*"];

// Licence files open with the name and version, e.g. "GNU GENERAL PUBLIC LICENSE" / "Version 2, June 1991".
const TITLE_LINES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseKind {
    Mit,
    Isc,
    Bsd2,
    Bsd3,
    Zlib,
    Unlicense,
    Cc0,
    Boost,
    Lgpl21,
    Lgpl3,
    Gpl2,
    Gpl3,
    Agpl3,
    Apache2,
    Mpl2,
}

impl LicenseKind {
    /// Whether code under this licence may be redistributed in an LGPL-2.1 registry.
    pub fn is_lgpl21_compatible(self) -> bool {
        matches!(
            self,
            LicenseKind::Mit
                | LicenseKind::Isc
                | LicenseKind::Bsd2
                | LicenseKind::Bsd3
                | LicenseKind::Zlib
                | LicenseKind::Unlicense
                | LicenseKind::Cc0
                | LicenseKind::Boost
                | LicenseKind::Lgpl21
        )
    }

    pub fn from_spdx(id: &str) -> Option<LicenseKind> {
        let id = id.trim().trim_matches(|c: char| c == '(' || c == ')');
        let kind = match id.to_ascii_uppercase().as_str() {
            "MIT" => LicenseKind::Mit,
            "ISC" => LicenseKind::Isc,
            "BSD-2-CLAUSE" => LicenseKind::Bsd2,
            "BSD-3-CLAUSE" => LicenseKind::Bsd3,
            "ZLIB" => LicenseKind::Zlib,
            "UNLICENSE" => LicenseKind::Unlicense,
            "CC0-1.0" => LicenseKind::Cc0,
            "BSL-1.0" => LicenseKind::Boost,
            "LGPL-2.1" | "LGPL-2.1-ONLY" | "LGPL-2.1-OR-LATER" | "LGPL-2.1+" => LicenseKind::Lgpl21,
            "LGPL-3.0" | "LGPL-3.0-ONLY" | "LGPL-3.0-OR-LATER" => LicenseKind::Lgpl3,
            "GPL-2.0" | "GPL-2.0-ONLY" | "GPL-2.0-OR-LATER" => LicenseKind::Gpl2,
            "GPL-3.0" | "GPL-3.0-ONLY" | "GPL-3.0-OR-LATER" => LicenseKind::Gpl3,
            "AGPL-3.0" | "AGPL-3.0-ONLY" | "AGPL-3.0-OR-LATER" => LicenseKind::Agpl3,
            "APACHE-2.0" => LicenseKind::Apache2,
            "MPL-2.0" => LicenseKind::Mpl2,
            _ => return None,
        };
        Some(kind)
    }
}

/// Licence compatibility from files in the clone: 1 if compatible, else 0.
#[derive(Debug, Default, Clone, Copy)]
pub struct License;

impl MetricCalculator for License {
    fn metric(&self) -> Metric {
        Metric::License
    }

    fn calculate(&self, input: &MetricInput) -> Result<f64> {
        let root = input.clone_root(Metric::License)?;
        let found = detect_licenses(root);
        log::debug!("licences detected in {}: {found:?}", root.display());
        Ok(if found.iter().any(|k| k.is_lgpl21_compatible()) {
            1.0
        } else {
            0.0
        })
    }
}

/// Every licence declared at the clone root, from files, manifests and README.
pub fn detect_licenses(root: &Path) -> Vec<LicenseKind> {
    let mut found = Vec::new();

    for path in license_files(root) {
        if let Ok(text) = fs::read_to_string(&path) {
            found.extend(identify_license_text(&text));
        }
    }

    if let Ok(raw) = fs::read_to_string(root.join("package.json")) {
        if let Ok(manifest) = serde_json::from_str::<serde_json::Value>(&raw) {
            let declared = match &manifest["license"] {
                serde_json::Value::String(s) => Some(s.clone()),
                serde_json::Value::Object(obj) => {
                    obj.get("type").and_then(|t| t.as_str()).map(str::to_string)
                }
                _ => None,
            };
            if let Some(expr) = declared {
                found.extend(parse_spdx_expression(&expr));
            }
        }
    }

    if let Ok(raw) = fs::read_to_string(root.join("Cargo.toml")) {
        if let Ok(manifest) = raw.parse::<toml::Table>() {
            if let Some(expr) = manifest
                .get("package")
                .and_then(|p| p.get("license"))
                .and_then(|l| l.as_str())
            {
                found.extend(parse_spdx_expression(expr));
            }
        }
    }

    if let Ok(readme) = fs::read_to_string(root.join("README.md")) {
        if let Some(section) = readme_license_section(&readme) {
            found.extend(identify_license_text(&section));
        }
    }

    found
}

fn license_files(root: &Path) -> Vec<PathBuf> {
    let options = MatchOptions {
        case_sensitive: false,
        ..MatchOptions::new()
    };
    let escaped_root = glob::Pattern::escape(&root.to_string_lossy());

    LICENSE_FILE_PATTERNS
        .iter()
        .filter_map(|pattern| glob::glob_with(&format!("{escaped_root}/{pattern}"), options).ok())
        .flat_map(|paths| paths.flatten())
        .filter(|path| path.is_file())
        .collect()
}

/// Split `MIT OR (Apache-2.0 AND BSD-3-Clause)` into known identifiers.
pub fn parse_spdx_expression(expr: &str) -> Vec<LicenseKind> {
    expr.split_whitespace()
        .filter(|token| !matches!(token.to_ascii_uppercase().as_str(), "OR" | "AND" | "WITH"))
        .filter_map(LicenseKind::from_spdx)
        .collect()
}

/// Identify a licence from its full text or a short mention of its name.
///
/// The title lines decide when they name a licence; the body is only searched
/// otherwise, since GPL preambles mention the Lesser and Library variants.
pub fn identify_license_text(text: &str) -> Option<LicenseKind> {
    let lower = text.to_lowercase();

    if let Some(line) = lower
        .lines()
        .find_map(|l| l.split("spdx-license-identifier:").nth(1))
    {
        if let Some(kind) = parse_spdx_expression(line).into_iter().next() {
            return Some(kind);
        }
    }

    let title: Vec<&str> = lower
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(TITLE_LINES)
        .collect();
    classify_license_name(&title.join("\n")).or_else(|| classify_license_name(&lower))
}

fn classify_license_name(lower: &str) -> Option<LicenseKind> {
    let kind = if lower.contains("gnu affero general public license") || lower.contains("agpl") {
        LicenseKind::Agpl3
    } else if lower.contains("gnu general public license") {
        gpl_version(lower)
    } else if lower.contains("gnu lesser general public license")
        || lower.contains("gnu library general public license")
        || lower.contains("lgpl")
    {
        if lower.contains("version 3") || lower.contains("lgpl-3") || lower.contains("lgplv3") {
            LicenseKind::Lgpl3
        } else {
            LicenseKind::Lgpl21
        }
    } else if lower.contains("gpl") {
        gpl_version(lower)
    } else if lower.contains("apache license") || lower.contains("apache-2.0") {
        LicenseKind::Apache2
    } else if lower.contains("mozilla public license") || lower.contains("mpl-2.0") {
        LicenseKind::Mpl2
    } else if lower.contains("free and unencumbered software") || lower.contains("unlicense") {
        LicenseKind::Unlicense
    } else if lower.contains("boost software license") {
        LicenseKind::Boost
    } else if lower.contains("cc0") {
        LicenseKind::Cc0
    } else if lower.contains("neither the name") && lower.contains("redistribution and use") {
        LicenseKind::Bsd3
    } else if lower.contains("redistribution and use in source and binary forms")
        || lower.contains("bsd-2")
    {
        LicenseKind::Bsd2
    } else if lower.contains("bsd-3") || lower.contains("bsd 3") {
        LicenseKind::Bsd3
    } else if lower.contains("zlib") {
        LicenseKind::Zlib
    } else if lower.contains("isc license") || lower.contains("permission to use, copy, modify, and/or distribute") {
        LicenseKind::Isc
    } else if lower.contains("permission is hereby granted, free of charge")
        || lower.split(|c: char| !c.is_alphanumeric()).any(|w| w == "mit")
    {
        LicenseKind::Mit
    } else {
        return None;
    };
    Some(kind)
}

fn gpl_version(lower: &str) -> LicenseKind {
    if lower.contains("version 2") || lower.contains("gpl-2") || lower.contains("gplv2") {
        LicenseKind::Gpl2
    } else {
        LicenseKind::Gpl3
    }
}

/// Body of the first markdown heading mentioning a licence, up to the next heading.
fn readme_license_section(readme: &str) -> Option<String> {
    let mut lines = readme.lines().skip_while(|line| {
        let trimmed = line.trim_start();
        !(trimmed.starts_with('#') && trimmed.to_lowercase().contains("licen"))
    });
    lines.next()?;

    let body: Vec<&str> = lines
        .take_while(|line| !line.trim_start().starts_with('#'))
        .collect();
    Some(body.join("\n"))
}
