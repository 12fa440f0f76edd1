// Copyright 2026 Linkscout Contributors
// SPDX-License-Identifier: Apache-2.0

//! Profile record types.
//!
//! A [`ProfileRecord`] is the structured output of one scrape. Only
//! `profile_url` and `name` are treated as required downstream; every other
//! field may be absent and is then omitted or empty, never invented.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder used for contact categories with no matches.
pub const NOT_AVAILABLE: &str = "N/A";

/// Extraction method tag recorded on every record.
pub const EXTRACTION_METHOD: &str = "text_segmentation";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EducationEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degree: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificationEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Contact details parsed from the contact overlay.
///
/// Every category holds at least one element: real values or the single
/// placeholder [`NOT_AVAILABLE`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactInfo {
    pub emails: Vec<String>,
    pub phones: Vec<String>,
    pub linkedin_urls: Vec<String>,
    pub github_urls: Vec<String>,
    pub websites: Vec<String>,
    pub twitter: Vec<String>,
    pub instagram: Vec<String>,
    pub facebook: Vec<String>,
    pub whatsapp: Vec<String>,
    pub telegram: Vec<String>,
    pub birthday: Vec<String>,
    pub skype: Vec<String>,
    pub youtube: Vec<String>,
    /// First LinkedIn URL, or the placeholder.
    pub linkedin_url: String,
    pub raw_text: String,
}

fn placeholder() -> Vec<String> {
    vec![NOT_AVAILABLE.to_string()]
}

impl Default for ContactInfo {
    fn default() -> Self {
        Self {
            emails: placeholder(),
            phones: placeholder(),
            linkedin_urls: placeholder(),
            github_urls: placeholder(),
            websites: placeholder(),
            twitter: placeholder(),
            instagram: placeholder(),
            facebook: placeholder(),
            whatsapp: placeholder(),
            telegram: placeholder(),
            birthday: placeholder(),
            skype: placeholder(),
            youtube: placeholder(),
            linkedin_url: NOT_AVAILABLE.to_string(),
            raw_text: String::new(),
        }
    }
}

/// Category names in flattening order.
pub const CONTACT_CATEGORIES: [&str; 13] = [
    "emails",
    "phones",
    "linkedin_urls",
    "github_urls",
    "websites",
    "twitter",
    "instagram",
    "facebook",
    "whatsapp",
    "telegram",
    "birthday",
    "skype",
    "youtube",
];

impl ContactInfo {
    /// `(category, values)` pairs in [`CONTACT_CATEGORIES`] order.
    pub fn categories(&self) -> [(&'static str, &[String]); 13] {
        [
            ("emails", &self.emails),
            ("phones", &self.phones),
            ("linkedin_urls", &self.linkedin_urls),
            ("github_urls", &self.github_urls),
            ("websites", &self.websites),
            ("twitter", &self.twitter),
            ("instagram", &self.instagram),
            ("facebook", &self.facebook),
            ("whatsapp", &self.whatsapp),
            ("telegram", &self.telegram),
            ("birthday", &self.birthday),
            ("skype", &self.skype),
            ("youtube", &self.youtube),
        ]
    }

    fn slot(&mut self, category: &str) -> Option<&mut Vec<String>> {
        Some(match category {
            "emails" => &mut self.emails,
            "phones" => &mut self.phones,
            "linkedin_urls" => &mut self.linkedin_urls,
            "github_urls" => &mut self.github_urls,
            "websites" => &mut self.websites,
            "twitter" => &mut self.twitter,
            "instagram" => &mut self.instagram,
            "facebook" => &mut self.facebook,
            "whatsapp" => &mut self.whatsapp,
            "telegram" => &mut self.telegram,
            "birthday" => &mut self.birthday,
            "skype" => &mut self.skype,
            "youtube" => &mut self.youtube,
            _ => return None,
        })
    }

    /// Replace a category; an empty list becomes the placeholder.
    ///
    /// Unknown categories are ignored.
    pub fn set(&mut self, category: &str, values: Vec<String>) {
        let values = if values.is_empty() { placeholder() } else { values };
        if category == "linkedin_urls" {
            self.linkedin_url = values[0].clone();
        }
        if let Some(slot) = self.slot(category) {
            *slot = values;
        }
    }

    /// Real values of a category, without the placeholder.
    pub fn values<'a>(list: &'a [String]) -> impl Iterator<Item = &'a String> + 'a {
        list.iter().filter(|v| v.as_str() != NOT_AVAILABLE)
    }

    /// True when no category has a real value.
    pub fn is_empty(&self) -> bool {
        self.categories()
            .iter()
            .all(|(_, list)| Self::values(list).next().is_none())
    }
}

/// Structured output of one profile scrape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    /// Canonical profile URL; the deduplication key.
    pub profile_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
    #[serde(default)]
    pub experience: Vec<ExperienceEntry>,
    #[serde(default)]
    pub education: Vec<EducationEntry>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub certifications: Vec<CertificationEntry>,
    #[serde(default)]
    pub projects: Vec<ProjectEntry>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_info: Option<ContactInfo>,
    /// Integer percentage of the seven tracked fields that are present.
    #[serde(default)]
    pub completeness: u8,
    pub scraped_at: DateTime<Utc>,
    #[serde(default)]
    pub extraction_method: String,
}

impl ProfileRecord {
    pub fn new(profile_url: impl Into<String>) -> Self {
        Self {
            profile_url: profile_url.into(),
            name: None,
            headline: None,
            location: None,
            about: None,
            experience: Vec::new(),
            education: Vec::new(),
            skills: Vec::new(),
            certifications: Vec::new(),
            projects: Vec::new(),
            languages: Vec::new(),
            recommendations: Vec::new(),
            contact_info: None,
            completeness: 0,
            scraped_at: Utc::now(),
            extraction_method: EXTRACTION_METHOD.to_string(),
        }
    }

    /// Present fields among name, headline, location, about, experience,
    /// education, and skills, as a truncated percentage.
    pub fn compute_completeness(&self) -> u8 {
        let present = [
            non_blank(&self.name),
            non_blank(&self.headline),
            non_blank(&self.location),
            non_blank(&self.about),
            !self.experience.is_empty(),
            !self.education.is_empty(),
            !self.skills.is_empty(),
        ]
        .iter()
        .filter(|p| **p)
        .count();
        (present * 100 / 7) as u8
    }

    /// Recompute and store [`Self::compute_completeness`].
    pub fn refresh_completeness(&mut self) -> u8 {
        self.completeness = self.compute_completeness();
        self.completeness
    }
}

fn non_blank(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|s| !s.trim().is_empty())
}
