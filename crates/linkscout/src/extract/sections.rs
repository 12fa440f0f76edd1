// Copyright 2026 Linkscout Contributors
// SPDX-License-Identifier: Apache-2.0

//! Header-anchored section scanning and entry segmentation.
//!
//! A section starts at the first line equal (case-insensitively, after
//! trimming) to one of its header variants and runs until a line equal to
//! the header of any other section, or the end of the text.
//!
//! Multi-entry sections are segmented positionally: a title-like line opens
//! an entry, and each following line fills the first still-empty secondary
//! slot whose predicate accepts it. A line no slot accepts opens the next
//! entry if it is title-like and is dropped otherwise. The attribution is
//! imprecise on irregular input and is kept exactly as described, since
//! exported output shape depends on it.

use crate::model::{CertificationEntry, EducationEntry, ExperienceEntry, ProjectEntry};
use regex::Regex;
use std::sync::OnceLock;

pub const ABOUT_HEADERS: &[&str] = &["about", "summary"];
pub const EXPERIENCE_HEADERS: &[&str] = &["experience", "work experience", "professional experience"];
pub const EDUCATION_HEADERS: &[&str] = &["education", "academic background", "studies"];
pub const SKILLS_HEADERS: &[&str] = &["skills", "core skills", "competencies"];
pub const CERTIFICATION_HEADERS: &[&str] = &["licenses & certifications", "licenses", "certifications"];
pub const PROJECT_HEADERS: &[&str] = &["projects"];
pub const LANGUAGE_HEADERS: &[&str] = &["languages"];
pub const RECOMMENDATION_HEADERS: &[&str] = &["recommendations"];

/// Every header that can end a section.
const ALL_SECTIONS: &[&[&str]] = &[
    ABOUT_HEADERS,
    EXPERIENCE_HEADERS,
    EDUCATION_HEADERS,
    SKILLS_HEADERS,
    CERTIFICATION_HEADERS,
    PROJECT_HEADERS,
    LANGUAGE_HEADERS,
    RECOMMENDATION_HEADERS,
    &[
        "activity",
        "interests",
        "volunteering",
        "honors & awards",
        "publications",
        "courses",
        "organizations",
        "causes",
        "people also viewed",
        "people you may know",
    ],
];

/// Tokens that mark a line as page chrome rather than content.
const NOISE: &[&str] = &["http", "follow", "endorse", "button"];

/// Expansion controls and counters rendered inline with section content.
const UI_PREFIXES: &[&str] = &["show all", "show more", "see more", "…see more", "see all", "show less"];

fn matches_any(line: &str, variants: &[&str]) -> bool {
    let lower = line.trim().to_lowercase();
    variants.iter().any(|v| lower == *v)
}

pub(crate) fn has_noise(line: &str) -> bool {
    let lower = line.to_lowercase();
    NOISE.iter().any(|n| lower.contains(n))
}

fn is_ui_chrome(line: &str) -> bool {
    let lower = line.to_lowercase();
    UI_PREFIXES.iter().any(|p| lower.starts_with(p))
}

/// Trimmed, non-empty content lines of the section introduced by `headers`.
pub fn section_lines<'a>(text: &'a str, headers: &[&str]) -> Vec<&'a str> {
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
    if !lines.by_ref().any(|l| matches_any(l, headers)) {
        return Vec::new();
    }

    let mut out = Vec::new();
    for line in lines {
        if matches_any(line, headers) {
            continue;
        }
        if ALL_SECTIONS.iter().any(|s| matches_any(line, s)) {
            break;
        }
        if is_ui_chrome(line) {
            continue;
        }
        out.push(line);
    }
    out
}

type Accept = fn(&str) -> bool;

/// Segment `lines` into entries of `1 + slots.len()` fields.
fn segment(lines: &[&str], title_like: Accept, slots: &[Accept]) -> Vec<Vec<Option<String>>> {
    let mut entries = Vec::new();
    let mut current: Option<Vec<Option<String>>> = None;

    let open = |line: &str| {
        let mut entry = vec![None; slots.len() + 1];
        entry[0] = Some(line.to_string());
        entry
    };

    for &line in lines {
        match current.as_mut() {
            None => {
                if title_like(line) {
                    current = Some(open(line));
                }
            }
            Some(entry) => {
                let free = slots
                    .iter()
                    .enumerate()
                    .find(|(i, accept)| entry[i + 1].is_none() && accept(line))
                    .map(|(i, _)| i + 1);
                match free {
                    Some(slot) => entry[slot] = Some(line.to_string()),
                    None if title_like(line) => {
                        entries.extend(current.take());
                        current = Some(open(line));
                    }
                    None => {}
                }
            }
        }
    }
    entries.extend(current);
    entries
}

fn has_digit(line: &str) -> bool {
    line.chars().any(|c| c.is_ascii_digit())
}

fn any_line(_: &str) -> bool {
    true
}

fn take(fields: &mut [Option<String>], i: usize) -> Option<String> {
    fields.get_mut(i).and_then(Option::take)
}

pub fn parse_experience(text: &str) -> Vec<ExperienceEntry> {
    fn title(l: &str) -> bool {
        l.chars().count() > 5 && !has_noise(l)
    }
    fn company(l: &str) -> bool {
        l.contains("Inc") || l.contains("Ltd") || l.contains(',') || l.chars().count() > 20
    }
    fn description(l: &str) -> bool {
        l.chars().count() > 10
    }

    let lines = section_lines(text, EXPERIENCE_HEADERS);
    segment(&lines, title, &[company, has_digit, description])
        .into_iter()
        .map(|mut f| ExperienceEntry {
            title: take(&mut f, 0),
            company: take(&mut f, 1),
            duration: take(&mut f, 2),
            description: take(&mut f, 3),
        })
        .collect()
}

pub fn parse_education(text: &str) -> Vec<EducationEntry> {
    fn school(l: &str) -> bool {
        l.chars().count() > 3 && !has_noise(l)
    }

    let lines = section_lines(text, EDUCATION_HEADERS);
    segment(&lines, school, &[any_line, has_digit])
        .into_iter()
        .map(|mut f| EducationEntry {
            school: take(&mut f, 0),
            degree: take(&mut f, 1),
            duration: take(&mut f, 2),
        })
        .collect()
}

pub fn parse_certifications(text: &str) -> Vec<CertificationEntry> {
    fn name(l: &str) -> bool {
        l.chars().count() > 1 && !has_noise(l)
    }

    let lines = section_lines(text, CERTIFICATION_HEADERS);
    segment(&lines, name, &[any_line, has_digit])
        .into_iter()
        .map(|mut f| CertificationEntry {
            name: take(&mut f, 0),
            issuer: take(&mut f, 1),
            date: take(&mut f, 2),
        })
        .collect()
}

pub fn parse_projects(text: &str) -> Vec<ProjectEntry> {
    fn name(l: &str) -> bool {
        l.chars().count() > 3 && !has_noise(l)
    }
    fn description(l: &str) -> bool {
        l.chars().count() > 3
    }

    let lines = section_lines(text, PROJECT_HEADERS);
    segment(&lines, name, &[description])
        .into_iter()
        .map(|mut f| ProjectEntry {
            name: take(&mut f, 0),
            description: take(&mut f, 1),
        })
        .collect()
}

fn endorsement_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\d+\s*(endorsements?)?").expect("endorsement regex is valid"))
}

/// Skill names with endorsement counts removed, deduplicated in order.
pub fn parse_skills(text: &str) -> Vec<String> {
    let mut skills: Vec<String> = Vec::new();
    for line in section_lines(text, SKILLS_HEADERS) {
        if has_noise(line) {
            continue;
        }
        let clean = endorsement_regex().replace_all(line, "").trim().to_string();
        let len = clean.chars().count();
        if (2..100).contains(&len) && !skills.contains(&clean) {
            skills.push(clean);
        }
    }
    skills
}

pub fn parse_languages(text: &str) -> Vec<String> {
    let mut languages: Vec<String> = Vec::new();
    for line in section_lines(text, LANGUAGE_HEADERS) {
        let len = line.chars().count();
        if has_noise(line) || !(2..50).contains(&len) {
            continue;
        }
        if !languages.iter().any(|l| l == line) {
            languages.push(line.to_string());
        }
    }
    languages
}

/// The About section joined into one paragraph.
pub fn parse_about(text: &str) -> Option<String> {
    let about = section_lines(text, ABOUT_HEADERS)
        .into_iter()
        .filter(|l| !has_noise(l))
        .collect::<Vec<_>>()
        .join(" ");
    let about = about.trim();
    (!about.is_empty()).then(|| about.to_string())
}

/// Recommendation paragraphs from the text, used when the page probe finds none.
pub fn parse_recommendations(text: &str, max: usize, max_chars: usize) -> Vec<String> {
    section_lines(text, RECOMMENDATION_HEADERS)
        .into_iter()
        .filter(|l| l.chars().count() > 20 && !has_noise(l))
        .take(max)
        .map(|l| l.chars().take(max_chars).collect())
        .collect()
}
