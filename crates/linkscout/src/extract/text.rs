// Copyright 2026 Linkscout Contributors
// SPDX-License-Identifier: Apache-2.0

//! Line-scan heuristics for the top-of-profile scalar fields.
//!
//! These work on rendered text only and never depend on element classes.

use super::sections::has_noise;
use regex::Regex;
use std::sync::OnceLock;

const NAME_SCAN_LINES: usize = 30;
const TOP_SCAN_LINES: usize = 50;

/// Navigation and boilerplate lines that precede the profile content.
pub(crate) const NAV_PHRASES: &[&str] = &[
    "home",
    "my network",
    "jobs",
    "messaging",
    "notifications",
    "me",
    "for business",
    "learning",
    "linkedin",
    "sign in",
    "join now",
    "skip to main content",
    "try premium for free",
    "try premium",
    "search",
    "more",
    "message",
    "connect",
    "follow",
    "open to",
    "add profile section",
    "view profile",
];

/// Fragments that disqualify a line from being a name.
const NAME_REJECT: &[&str] = &[
    "http",
    "connections",
    "followers",
    "contact info",
    "premium",
    "notifications",
    "skip to",
    "|",
    "@",
    ",",
    "·",
];

/// Role words that mark a headline.
pub(crate) const JOB_KEYWORDS: &[&str] = &[
    "engineer",
    "developer",
    "manager",
    "analyst",
    "consultant",
    "specialist",
    "director",
    "lead",
    "senior",
    "junior",
    "founder",
    "designer",
    "architect",
    "scientist",
    "researcher",
    "officer",
    "intern",
    "student",
    "recruiter",
    "head of",
    "ceo",
    "cto",
];

/// Activity-feed phrases; the words before them are the actor's name.
const ACTIVITY_PHRASES: &[&str] = &[
    "commented on a post",
    "commented on this",
    "reposted this",
    "reposted",
    "likes this",
    "liked this",
    "shared a post",
    "shared this",
];

const LOCATION_NOISE: &[&str] = &["http", "button", "follow", "message"];
const LOCATION_WORDS: &[&str] = &["Area", "Remote", "Based"];

pub(crate) fn is_nav_phrase(line: &str) -> bool {
    let lower = line.trim().to_lowercase();
    NAV_PHRASES.iter().any(|p| lower == *p)
}

pub(crate) fn has_job_keyword(line: &str) -> bool {
    let lower = line.to_lowercase();
    JOB_KEYWORDS.iter().any(|k| {
        if k.contains(' ') {
            lower.contains(k)
        } else {
            lower
                .split(|c: char| !c.is_alphanumeric())
                .any(|w| w.starts_with(k))
        }
    })
}

fn word_count(line: &str) -> usize {
    line.split_whitespace().count()
}

fn top_lines(text: &str, n: usize) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim).filter(|l| !l.is_empty()).take(n)
}

/// First 2-5 word line in the top of the page that reads like a name.
pub fn name_from_lines(text: &str) -> Option<String> {
    top_lines(text, NAME_SCAN_LINES)
        .filter(|l| !is_nav_phrase(l))
        .find(|l| looks_like_name(l))
        .map(str::to_string)
}

fn looks_like_name(line: &str) -> bool {
    let words = word_count(line);
    if !(2..=5).contains(&words) || line.chars().count() > 70 {
        return false;
    }
    if !line.chars().next().is_some_and(char::is_uppercase) {
        return false;
    }
    if line.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }
    let lower = line.to_lowercase();
    !NAME_REJECT.iter().any(|r| lower.contains(r)) && !has_job_keyword(line)
}

/// Name taken from activity-feed phrasing such as "Jane Doe reposted this".
pub fn name_from_activity(text: &str) -> Option<String> {
    for line in text.lines().map(str::trim) {
        let lower = line.to_lowercase();
        let Some(pos) = ACTIVITY_PHRASES.iter().find_map(|p| lower.find(p)) else {
            continue;
        };
        // Lowercasing may shift byte offsets for non-ASCII text.
        let Some(before) = line.get(..pos) else {
            continue;
        };
        let words: Vec<&str> = before.split_whitespace().collect();
        let run: Vec<&str> = words
            .iter()
            .rev()
            .take_while(|w| w.chars().next().is_some_and(char::is_uppercase))
            .take(4)
            .copied()
            .collect();
        if run.len() >= 2 {
            return Some(run.into_iter().rev().collect::<Vec<_>>().join(" "));
        }
    }
    None
}

/// Pipe-delimited or role-keyword line near the top, excluding prose.
pub fn headline_from_lines(text: &str, name: Option<&str>) -> Option<String> {
    top_lines(text, TOP_SCAN_LINES)
        .filter(|l| Some(*l) != name && !is_nav_phrase(l))
        .find(|l| {
            let len = l.chars().count();
            (l.contains('|') || has_job_keyword(l))
                && (6..=220).contains(&len)
                && word_count(l) <= 25
                && !l.to_lowercase().contains("http")
        })
        .map(str::to_string)
}

/// Line of two or more comma-separated parts near the top of the page.
pub fn location_from_lines(text: &str) -> Option<String> {
    top_lines(text, TOP_SCAN_LINES)
        .find(|l| {
            let lower = l.to_lowercase();
            if LOCATION_NOISE.iter().any(|n| lower.contains(n)) || l.contains('|') || l.contains('@') {
                return false;
            }
            let len = l.chars().count();
            let parts = l.split(',').filter(|p| !p.trim().is_empty()).count();
            (3..100).contains(&len) && parts >= 2 && !l.chars().any(|c| c.is_ascii_digit())
        })
        .map(str::to_string)
}

fn city_comma_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\p{Lu}[\p{L} .'\-]+,\s*\p{Lu}[\p{L} .'\-]*").expect("city regex is valid")
    })
}

/// Whether a short probe candidate reads like a location.
pub fn plausible_location(candidate: &str) -> bool {
    let c = candidate.trim();
    if c.is_empty() || c.chars().count() > 100 || has_noise(c) {
        return false;
    }
    (c.contains(',') && city_comma_regex().is_match(c)) || LOCATION_WORDS.iter().any(|w| c.contains(w))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOP: &str = "Skip to main content\nHome\nMy Network\nJobs\nJane Doe\nSenior Software Engineer | Distributed Systems\nBerlin, Berlin, Germany\n500+ connections\nContact info\n";

    #[test]
    fn test_name_skips_navigation() {
        assert_eq!(name_from_lines(TOP).as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn test_name_rejects_single_words_and_headlines() {
        let text = "LinkedIn\nMessaging\nStaff Engineer at Acme\nalice smith\n";
        assert_eq!(name_from_lines(text), None);
    }

    #[test]
    fn test_name_from_activity_phrase() {
        let text = "Feed post\nJohn Michael Smith reposted this\nGreat article";
        assert_eq!(name_from_activity(text).as_deref(), Some("John Michael Smith"));
        assert_eq!(name_from_activity("someone commented on a post"), None);
    }

    #[test]
    fn test_headline_fallback() {
        assert_eq!(
            headline_from_lines(TOP, Some("Jane Doe")).as_deref(),
            Some("Senior Software Engineer | Distributed Systems")
        );
        let prose = "Jane Doe\nI have been working as an engineer for many years and I love building things that people use every day across many teams and companies worldwide today";
        assert_eq!(headline_from_lines(prose, Some("Jane Doe")), None);
    }

    #[test]
    fn test_location_fallback() {
        assert_eq!(location_from_lines(TOP).as_deref(), Some("Berlin, Berlin, Germany"));
        assert_eq!(location_from_lines("Acme Inc, 2020-2023\nFollow, Message"), None);
    }

    #[test]
    fn test_plausible_location() {
        assert!(plausible_location("San Francisco, California"));
        assert!(plausible_location("Greater Boston Area"));
        assert!(plausible_location("Remote"));
        assert!(!plausible_location("hello, world"));
        assert!(!plausible_location("Follow"));
    }
}
