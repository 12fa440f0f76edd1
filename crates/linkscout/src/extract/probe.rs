// Copyright 2026 Linkscout Contributors
// SPDX-License-Identifier: Apache-2.0

//! Structural DOM probe.
//!
//! One script collects candidate texts for the fields that have a
//! structural hint. The probe is fast and brittle: when the markup changes
//! it silently returns nothing and the text heuristics take over.

use super::text::{has_job_keyword, is_nav_phrase, plausible_location};
use serde::{Deserialize, Serialize};

/// Candidate texts gathered from the live document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructuralProbe {
    /// Top-level headings.
    pub names: Vec<String>,
    /// Medium-emphasis text blocks near the top.
    pub headlines: Vec<String>,
    /// Small text blocks near the top.
    pub locations: Vec<String>,
    /// Recommendation blocks.
    pub recommendations: Vec<String>,
}

pub const PROBE_SCRIPT: &str = r#"(() => {
    const texts = (selector, max) => Array.from(document.querySelectorAll(selector))
        .slice(0, max)
        .map(el => (el.innerText || '').trim())
        .filter(t => t.length > 0);
    return {
        names: texts('h1', 5),
        headlines: texts('.text-body-medium, [class*="headline"]', 10),
        locations: texts('.text-body-small, [class*="location"]', 20),
        recommendations: texts('[class*="recommendation"]', 20),
    };
})()"#;

impl StructuralProbe {
    /// Parse the probe script's result; anything malformed yields an empty probe.
    pub fn from_value(value: serde_json::Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }

    /// First heading of 1-5 words with a letter, outside the navigation denylist.
    pub fn name(&self) -> Option<String> {
        self.names
            .iter()
            .map(|n| n.trim())
            .find(|n| {
                let words = n.split_whitespace().count();
                (1..=5).contains(&words)
                    && n.chars().count() < 100
                    && n.chars().any(char::is_alphabetic)
                    && !is_nav_phrase(n)
            })
            .map(str::to_string)
    }

    /// First medium-emphasis block with a pipe or a role keyword.
    pub fn headline(&self) -> Option<String> {
        self.headlines
            .iter()
            .map(|h| h.trim())
            .find(|h| {
                let len = h.chars().count();
                (6..=300).contains(&len) && (h.contains('|') || has_job_keyword(h))
            })
            .map(str::to_string)
    }

    /// First short block that validates as a location.
    pub fn location(&self) -> Option<String> {
        self.locations
            .iter()
            .map(|l| l.trim())
            .find(|l| plausible_location(l))
            .map(str::to_string)
    }

    /// Recommendation blocks longer than 20 chars, truncated.
    pub fn recommendations(&self, max: usize, max_chars: usize) -> Vec<String> {
        self.recommendations
            .iter()
            .filter(|r| r.chars().count() > 20)
            .take(max)
            .map(|r| r.chars().take(max_chars).collect())
            .collect()
    }
}
