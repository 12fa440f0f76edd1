// Copyright 2026 Linkscout Contributors
// SPDX-License-Identifier: Apache-2.0

//! Extraction engine: turns one page snapshot into a [`ProfileRecord`].
//!
//! Every field has two tiers. The structural probe runs first where one
//! exists; the text heuristics never depend on element classes and take
//! over whenever the probe finds nothing. A field that cannot be extracted
//! is recorded as absent and never stops the remaining fields.

pub mod contact;
pub mod probe;
pub mod sections;
pub mod text;

use crate::browser::BrowserPage;
use crate::model::ProfileRecord;
use probe::{StructuralProbe, PROBE_SCRIPT};
use tracing::{debug, info, warn};

const MAX_RECOMMENDATIONS: usize = 5;
const RECOMMENDATION_CHARS: usize = 500;

/// Rendered text plus the structural probe of one navigation result.
///
/// Scoped to a single extraction; never persisted.
#[derive(Debug, Clone, Default)]
pub struct PageSnapshot {
    pub text: String,
    pub probe: StructuralProbe,
}

impl PageSnapshot {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            probe: StructuralProbe::default(),
        }
    }

    /// Capture the page. `None` only when the full-text capture fails.
    pub async fn capture(page: &dyn BrowserPage) -> Option<Self> {
        let text = match page.inner_text("body").await {
            Ok(Some(text)) if !text.trim().is_empty() => text,
            Ok(_) => {
                warn!("page has no text to extract");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "full-text capture failed");
                return None;
            }
        };
        let probe = match page.evaluate(PROBE_SCRIPT).await {
            Ok(value) => StructuralProbe::from_value(value),
            Err(e) => {
                debug!(error = %e, "structural probe failed, using text only");
                StructuralProbe::default()
            }
        };
        Some(Self { text, probe })
    }
}

/// Build a record for `profile_url` from `snapshot`.
pub fn extract_profile(profile_url: &str, snapshot: &PageSnapshot) -> ProfileRecord {
    let text = snapshot.text.as_str();
    let probe = &snapshot.probe;
    let mut record = ProfileRecord::new(profile_url);

    record.name = text::name_from_lines(text)
        .or_else(|| probe.name())
        .or_else(|| text::name_from_activity(text));
    record.headline = probe
        .headline()
        .filter(|h| Some(h) != record.name.as_ref())
        .or_else(|| text::headline_from_lines(text, record.name.as_deref()));
    record.location = probe.location().or_else(|| text::location_from_lines(text));
    record.about = sections::parse_about(text);
    record.experience = sections::parse_experience(text);
    record.education = sections::parse_education(text);
    record.skills = sections::parse_skills(text);
    record.certifications = sections::parse_certifications(text);
    record.projects = sections::parse_projects(text);
    record.languages = sections::parse_languages(text);

    record.recommendations = probe.recommendations(MAX_RECOMMENDATIONS, RECOMMENDATION_CHARS);
    if record.recommendations.is_empty() {
        record.recommendations =
            sections::parse_recommendations(text, MAX_RECOMMENDATIONS, RECOMMENDATION_CHARS);
    }

    record.refresh_completeness();
    info!(
        url = profile_url,
        name = record.name.as_deref().unwrap_or("unknown"),
        completeness = record.completeness,
        experience = record.experience.len(),
        education = record.education.len(),
        skills = record.skills.len(),
        "profile extracted"
    );
    record
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILE: &str = "\
Skip to main content
Home
My Network
Jane Doe
Staff Engineer | Data Platforms
Berlin, Berlin, Germany
500+ connections
About
I design data platforms and mentor engineers.
Experience
Staff Engineer
Globex Corporation Ltd
2021 - Present
Runs the ingestion platform
Education
Technical University of Munich
MSc Informatics
2012 - 2014
Skills
Rust
Kafka
Languages
English
German
";

    #[test]
    fn test_extract_text_only_profile() {
        let record = extract_profile("https://www.linkedin.com/in/jane", &PageSnapshot::from_text(PROFILE));
        assert_eq!(record.name.as_deref(), Some("Jane Doe"));
        assert_eq!(record.headline.as_deref(), Some("Staff Engineer | Data Platforms"));
        assert_eq!(record.location.as_deref(), Some("Berlin, Berlin, Germany"));
        assert_eq!(
            record.about.as_deref(),
            Some("I design data platforms and mentor engineers.")
        );
        assert_eq!(record.experience.len(), 1);
        assert_eq!(record.education.len(), 1);
        assert_eq!(record.skills, vec!["Rust", "Kafka"]);
        assert_eq!(record.languages, vec!["English", "German"]);
        assert_eq!(record.completeness, 100);
        assert!(record.contact_info.is_none());
    }

    #[test]
    fn test_probe_fills_fields_text_cannot() {
        let snapshot = PageSnapshot {
            text: "Home\nsome lowercase text\nExperience\n".into(),
            probe: StructuralProbe {
                names: vec!["Ada".into()],
                headlines: vec!["Principal Architect".into()],
                locations: vec!["Greater London Area".into()],
                recommendations: vec!["Ada is the best architect I have worked with.".into()],
            },
        };
        let record = extract_profile("https://www.linkedin.com/in/ada", &snapshot);
        assert_eq!(record.name.as_deref(), Some("Ada"));
        assert_eq!(record.headline.as_deref(), Some("Principal Architect"));
        assert_eq!(record.location.as_deref(), Some("Greater London Area"));
        assert_eq!(record.recommendations.len(), 1);
        assert_eq!(record.completeness, 42);
    }

    #[test]
    fn test_empty_sections_are_absent_not_invented() {
        let record = extract_profile("https://www.linkedin.com/in/x", &PageSnapshot::from_text("Home\nJobs"));
        assert!(record.name.is_none());
        assert!(record.experience.is_empty());
        assert!(record.skills.is_empty());
        assert_eq!(record.completeness, 0);
    }
}
