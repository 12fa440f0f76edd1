// Copyright 2026 Linkscout Contributors
// SPDX-License-Identifier: Apache-2.0

//! Record validation and quality scoring.
//!
//! Works on the JSON form of a record so that stored or hand-edited data
//! with the wrong shape can be checked too.

use crate::model::ProfileRecord;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

const REQUIRED_FIELDS: &[&str] = &["profile_url", "name"];
const MIN_ABOUT_CHARS: usize = 20;

/// Fields counted by [`ValidationReport::completeness`].
const QUALITY_FIELDS: &[&str] = &[
    "name",
    "headline",
    "about",
    "location",
    "experience",
    "education",
    "skills",
    "certifications",
    "projects",
];

/// Outcome of validating one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub name: Option<String>,
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// 100 minus penalties, floored at 0.
    pub score: u8,
    /// Share of quality fields present, as a percentage with two decimals.
    pub completeness: f64,
}

/// Aggregate over a batch of reports.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchValidation {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    pub mean_completeness: f64,
    pub mean_score: f64,
    pub reports: Vec<ValidationReport>,
}

/// Checks records against one site.
#[derive(Debug, Clone)]
pub struct Validator {
    site: String,
}

impl Default for Validator {
    fn default() -> Self {
        Self {
            site: "linkedin.com".to_string(),
        }
    }
}

fn present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
        Some(_) => true,
    }
}

/// 2-200 chars, at least one letter, at most 30% digits.
pub fn valid_name(name: &str) -> bool {
    let name = name.trim();
    let len = name.chars().count();
    if !(2..=200).contains(&len) || !name.chars().any(char::is_alphabetic) {
        return false;
    }
    let digits = name.chars().filter(char::is_ascii_digit).count();
    digits as f64 <= len as f64 * 0.3
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

impl Validator {
    /// Validator accepting profile URLs on `base`'s site and its subdomains.
    pub fn for_site(base: &Url) -> Self {
        let site = base
            .host_str()
            .unwrap_or("linkedin.com")
            .trim_start_matches("www.")
            .to_ascii_lowercase();
        Self { site }
    }

    fn valid_profile_url(&self, raw: &str) -> bool {
        let Ok(url) = Url::parse(raw) else {
            return false;
        };
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        url.scheme() == "https" && (host == self.site || host.ends_with(&format!(".{}", self.site)))
    }

    /// Validate the JSON form of one record.
    pub fn validate(&self, record: &Value) -> ValidationReport {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let mut score: i32 = 100;

        for field in REQUIRED_FIELDS {
            if !present(record.get(field)) {
                errors.push(format!("missing required field: {field}"));
                score -= 20;
            }
        }

        let name = record.get("name").and_then(Value::as_str).map(str::to_string);
        if let Some(name) = name.as_deref().filter(|n| !n.trim().is_empty()) {
            if !valid_name(name) {
                warnings.push("invalid name format".to_string());
                score -= 5;
            }
        }

        if let Some(url) = record.get("profile_url").and_then(Value::as_str).filter(|u| !u.is_empty()) {
            if !self.valid_profile_url(url) {
                errors.push("invalid profile url".to_string());
                score -= 20;
            }
        }

        if let Some(about) = record.get("about").and_then(Value::as_str).filter(|a| !a.is_empty()) {
            if about.chars().count() < MIN_ABOUT_CHARS {
                warnings.push("very short about section".to_string());
                score -= 10;
            }
        }

        for field in ["experience", "skills"] {
            match record.get(field) {
                None | Some(Value::Null) | Some(Value::Array(_)) => {}
                Some(_) => {
                    errors.push(format!("invalid {field} format"));
                    score -= 10;
                }
            }
        }

        let filled = QUALITY_FIELDS.iter().filter(|f| present(record.get(**f))).count();
        let completeness = round2(filled as f64 / QUALITY_FIELDS.len() as f64 * 100.0);

        // Nested-list shape errors lower the score without invalidating.
        let is_valid = !errors
            .iter()
            .any(|e| e.starts_with("missing required field") || e == "invalid profile url");

        let report = ValidationReport {
            name,
            is_valid,
            errors,
            warnings,
            score: score.clamp(0, 100) as u8,
            completeness,
        };
        debug!(
            name = report.name.as_deref().unwrap_or("unknown"),
            valid = report.is_valid,
            score = report.score,
            "record validated"
        );
        report
    }

    pub fn validate_record(&self, record: &ProfileRecord) -> ValidationReport {
        match serde_json::to_value(record) {
            Ok(value) => self.validate(&value),
            Err(e) => ValidationReport {
                name: record.name.clone(),
                is_valid: false,
                errors: vec![format!("record not serializable: {e}")],
                warnings: Vec::new(),
                score: 0,
                completeness: 0.0,
            },
        }
    }

    /// Validate every record and average completeness and score.
    pub fn validate_batch(&self, records: &[ProfileRecord]) -> BatchValidation {
        let reports: Vec<ValidationReport> = records.iter().map(|r| self.validate_record(r)).collect();
        let total = reports.len();
        let valid = reports.iter().filter(|r| r.is_valid).count();
        let mut batch = BatchValidation {
            total,
            valid,
            invalid: total - valid,
            ..Default::default()
        };
        if total > 0 {
            let n = total as f64;
            batch.mean_completeness = round2(reports.iter().map(|r| r.completeness).sum::<f64>() / n);
            batch.mean_score = round2(reports.iter().map(|r| f64::from(r.score)).sum::<f64>() / n);
        }
        batch.reports = reports;
        info!(
            total,
            valid,
            mean_completeness = batch.mean_completeness,
            mean_score = batch.mean_score,
            "batch validated"
        );
        batch
    }
}
