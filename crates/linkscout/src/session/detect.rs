// Copyright 2026 Linkscout Contributors
// SPDX-License-Identifier: Apache-2.0

//! Page-condition detectors: block phrases, challenge widgets, access
//! restrictions, and interfering modals.
//!
//! Text checks are case-insensitive substring scans. They never fail.

/// Phrases in page text that indicate rate limiting or blocking.
pub const BLOCK_SIGNALS: &[&str] = &[
    "access denied",
    "unusual traffic",
    "verify you are human",
    "we suspect unusual activity",
];

/// Markers in page HTML that indicate a challenge widget.
pub const CHALLENGE_INDICATORS: &[&str] = &[
    "recaptcha",
    "hcaptcha",
    "captcha",
    "challenge-form",
    "verify-you-are-human",
];

/// Interactive challenge elements. One must be present alongside an indicator.
pub const CHALLENGE_SELECTORS: &[&str] = &[
    "iframe[src*=\"recaptcha\"]",
    "iframe[src*=\"hcaptcha\"]",
    "div.g-recaptcha",
    "[data-captcha]",
];

/// Phrases that mark a profile as private or unavailable.
pub const ACCESS_ISSUE_PHRASES: &[&str] = &[
    "profile is not available",
    "you cannot view this profile",
    "not public",
    "profile private",
    "404 error",
    "not found",
];

/// Close buttons of sign-up prompts and other overlays, tried in order.
pub const MODAL_CLOSE_SELECTORS: &[&str] = &[
    "button[aria-label=\"Close\"]",
    "button[aria-label=\"Dismiss\"]",
    "[role=\"dialog\"] button:first-child",
    ".cta-modal button",
];

/// First block phrase found in `text`.
pub fn block_signal(text: &str) -> Option<&'static str> {
    find_phrase(text, BLOCK_SIGNALS)
}

/// Whether `html` carries any challenge indicator.
///
/// Only half of the challenge test; the session also requires a matching
/// element from [`CHALLENGE_SELECTORS`].
pub fn has_challenge_indicator(html: &str) -> bool {
    find_phrase(html, CHALLENGE_INDICATORS).is_some()
}

/// First access-restriction phrase found in `text`.
pub fn access_issue(text: &str) -> Option<&'static str> {
    find_phrase(text, ACCESS_ISSUE_PHRASES)
}

fn find_phrase(haystack: &str, phrases: &[&'static str]) -> Option<&'static str> {
    let lower = haystack.to_lowercase();
    phrases.iter().copied().find(|p| lower.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_signal_case_insensitive() {
        assert_eq!(
            block_signal("Sorry! We detected UNUSUAL TRAFFIC from your network."),
            Some("unusual traffic")
        );
        assert_eq!(block_signal("Jane Doe\nSoftware Engineer"), None);
    }

    #[test]
    fn test_challenge_indicator() {
        assert!(has_challenge_indicator("<div class=\"g-recaptcha\"></div>"));
        assert!(has_challenge_indicator("<form id=\"challenge-form\">"));
        assert!(!has_challenge_indicator("<main>profile</main>"));
    }

    #[test]
    fn test_access_issue_phrases() {
        assert_eq!(
            access_issue("This profile is not available right now"),
            Some("profile is not available")
        );
        assert_eq!(access_issue("Profile is not public"), Some("not public"));
        assert_eq!(access_issue("Page Not Found"), Some("not found"));
        assert_eq!(access_issue("Experience\nAcme"), None);
    }
}
