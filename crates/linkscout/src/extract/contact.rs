// Copyright 2026 Linkscout Contributors
// SPDX-License-Identifier: Apache-2.0

//! Contact overlay parser.
//!
//! Every category is classified independently over the overlay's rendered
//! text. Categories with no match hold the single `N/A` placeholder.

use crate::model::ContactInfo;
use regex::Regex;
use std::sync::OnceLock;

const RAW_TEXT_LIMIT: usize = 2_000;

/// Top-level domains accepted for bare website domains.
const WEBSITE_TLDS: &str = "com|org|net|io|dev|co|ai|app|me|info|biz|tech|xyz|site|blog|page|us|uk|de|fr|nl|es|it|ca|au|in|eu";

/// Domains that belong to a dedicated category, never to `websites`.
const SOCIAL_DOMAINS: &[&str] = &[
    "linkedin.com",
    "github.com",
    "twitter.com",
    "x.com",
    "instagram.com",
    "facebook.com",
    "fb.com",
    "youtube.com",
    "youtu.be",
    "wa.me",
    "whatsapp.com",
    "t.me",
    "telegram.me",
    "skype.com",
];

const MONTHS: &[&str] = &[
    "january", "february", "march", "april", "may", "june", "july", "august", "september",
    "october", "november", "december", "jan", "feb", "mar", "apr", "jun", "jul", "aug", "sep",
    "sept", "oct", "nov", "dec",
];

macro_rules! regex {
    ($name:ident, $pattern:expr) => {
        fn $name() -> &'static Regex {
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| Regex::new($pattern).expect("contact regex is valid"))
        }
    };
}

regex!(email_re, r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}");
regex!(url_re, r"(?i)\b(?:https?://)?(?:www\.)?[a-z0-9\-]+(?:\.[a-z0-9\-]+)*\.[a-z]{2,}/\S*");
regex!(phone_intl_re, r"\+\d{1,3}[\s.\-]?\(?\d{1,4}\)?(?:[ .\-]?\d{2,4}){2,4}");
regex!(phone_labeled_re, r"(?i)\b(?:phone|mobile|tel|telephone|cell)\b\s*[:\-]?\s*(\+?[\d \t().\-]{7,})");
regex!(phone_local_re, r"\(?\b\d{3}\)?[ .\-]\d{3}[ .\-]\d{4}\b");
regex!(linkedin_re, r"(?i)\b(?:https?://)?(?:[a-z]{2,3}\.)?linkedin\.com/in/[A-Za-z0-9\-_%]+/?");
regex!(github_re, r"(?i)\b(?:https?://)?(?:www\.)?github\.com/[A-Za-z0-9\-_.]+");
regex!(youtube_re, r"(?i)\b(?:https?://)?(?:www\.)?(?:youtube\.com/(?:c/|channel/|user/|@)?[A-Za-z0-9\-_.]+|youtu\.be/[A-Za-z0-9\-_]+)");
regex!(twitter_url_re, r"(?i)\b(?:https?://)?(?:www\.)?(?:twitter|x)\.com/[A-Za-z0-9_]+");
regex!(twitter_label_re, r"(?i)\btwitter\b\s*[:\-]?\s*@([A-Za-z0-9_]{1,15})");
regex!(instagram_url_re, r"(?i)\b(?:https?://)?(?:www\.)?instagram\.com/[A-Za-z0-9_.]+");
regex!(instagram_label_re, r"(?i)\binstagram\b\s*[:\-]?\s*@([A-Za-z0-9_.]{1,30})");
regex!(facebook_url_re, r"(?i)\b(?:https?://)?(?:www\.)?(?:facebook|fb)\.com/[A-Za-z0-9_.\-]+");
regex!(facebook_label_re, r"(?i)\bfacebook\b\s*[:\-]?\s*@([A-Za-z0-9_.]{3,50})");
regex!(whatsapp_link_re, r"(?i)\bwa\.me/\+?\d{7,15}");
regex!(whatsapp_label_re, r"(?i)\bwhatsapp\b\s*[:\-]?\s*(\+?[\d \t\-]{7,})");
regex!(telegram_link_re, r"(?i)\bt(?:elegram)?\.me/[A-Za-z0-9_]{5,32}");
regex!(telegram_label_re, r"(?i)\btelegram\b\s*[:\-]?\s*@([A-Za-z0-9_]{5,32})");
regex!(skype_label_re, r"(?i)\bskype\b\s*[:\-]?\s*((?:live:)?[A-Za-z0-9_.\-]{3,})");
regex!(birthday_re, r"\b([A-Za-z]{3,9})\.?\s+(\d{1,2})(?:st|nd|rd|th)?\b");
regex!(
    domain_re,
    &format!(r"(?i)\b(?:https?://)?(?:www\.)?(?:[a-z0-9](?:[a-z0-9\-]*[a-z0-9])?\.)+(?:{WEBSITE_TLDS})\b(?:/[^\s]*)?")
);

/// Parse contact overlay text into a [`ContactInfo`].
pub fn parse_contact_info(text: &str) -> ContactInfo {
    let mut info = ContactInfo::default();

    let emails = dedupe(email_re().find_iter(text).map(|m| m.as_str().to_string()));
    let without_emails = email_re().replace_all(text, " ");
    let without_urls = url_re().replace_all(&without_emails, " ");

    info.set("emails", emails);
    info.set("phones", phones(&without_urls));
    info.set("linkedin_urls", urls(linkedin_re(), text));
    info.set("github_urls", urls(github_re(), text));
    info.set("youtube", urls(youtube_re(), text));
    info.set("twitter", handles(twitter_url_re(), twitter_label_re(), text));
    info.set("instagram", handles(instagram_url_re(), instagram_label_re(), text));
    info.set("facebook", handles(facebook_url_re(), facebook_label_re(), text));
    info.set("whatsapp", whatsapp(text));
    info.set("telegram", handles(telegram_link_re(), telegram_label_re(), text));
    info.set("skype", captures(skype_label_re(), text));
    info.set("websites", websites(&without_emails));
    info.set("birthday", birthdays(text));

    info.raw_text = text.trim().chars().take(RAW_TEXT_LIMIT).collect();
    info
}

/// Lowercased `/in/<slug>` segment of a profile URL.
pub fn profile_slug(url: &str) -> Option<String> {
    let rest = &url[url.find("/in/")? + "/in/".len()..];
    let slug: String = rest.chars().take_while(|c| !matches!(c, '/' | '?' | '#')).collect();
    (!slug.is_empty()).then(|| slug.to_lowercase())
}

/// Bare URLs in `text` of the same profile as `profile_url`, schemed and
/// deduplicated. Links to other people are ignored.
pub fn own_profile_urls(text: &str, profile_url: &str) -> Vec<String> {
    let Some(own) = profile_slug(profile_url) else {
        return Vec::new();
    };
    urls(linkedin_re(), text)
        .into_iter()
        .filter(|u| profile_slug(u).as_deref() == Some(own.as_str()))
        .collect()
}

fn dedupe(values: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for v in values {
        let v = v.trim().trim_end_matches(['.', ',', ';', ')']).to_string();
        if !v.is_empty() && !out.iter().any(|o| o.eq_ignore_ascii_case(&v)) {
            out.push(v);
        }
    }
    out
}

fn with_scheme(url: &str) -> String {
    let url = url.trim_end_matches('/');
    if url.to_ascii_lowercase().starts_with("http") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}

fn urls(re: &Regex, text: &str) -> Vec<String> {
    dedupe(re.find_iter(text).map(|m| with_scheme(m.as_str())))
}

fn captures(re: &Regex, text: &str) -> Vec<String> {
    dedupe(re.captures_iter(text).filter_map(|c| c.get(1)).map(|m| m.as_str().to_string()))
}

fn handles(url_re: &Regex, label_re: &Regex, text: &str) -> Vec<String> {
    let mut found = urls(url_re, text);
    found.extend(captures(label_re, text).into_iter().map(|h| format!("@{h}")));
    dedupe(found)
}

fn digits(s: &str) -> String {
    s.chars().filter(char::is_ascii_digit).collect()
}

/// Phone numbers in international, labeled, and local formats.
///
/// A candidate whose digits are contained in an already accepted number is
/// the same number matched by a narrower pattern and is dropped.
fn phones(text: &str) -> Vec<String> {
    let candidates = phone_intl_re()
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .chain(
            phone_labeled_re()
                .captures_iter(text)
                .filter_map(|c| c.get(1))
                .map(|m| m.as_str().to_string()),
        )
        .chain(phone_local_re().find_iter(text).map(|m| m.as_str().to_string()));

    let mut out: Vec<(String, String)> = Vec::new();
    for candidate in candidates {
        let candidate = candidate.trim().trim_end_matches(['-', '.', '(']).trim().to_string();
        let d = digits(&candidate);
        if !(7..=15).contains(&d.len()) {
            continue;
        }
        if out.iter().any(|(_, kept)| kept.contains(&d)) {
            continue;
        }
        out.retain(|(_, kept)| !d.contains(kept.as_str()));
        out.push((candidate, d));
    }
    out.into_iter().map(|(p, _)| p).collect()
}

fn whatsapp(text: &str) -> Vec<String> {
    let mut found: Vec<String> = whatsapp_link_re()
        .find_iter(text)
        .map(|m| with_scheme(m.as_str()))
        .collect();
    found.extend(
        captures(whatsapp_label_re(), text)
            .into_iter()
            .filter(|n| (7..=15).contains(&digits(n).len())),
    );
    dedupe(found)
}

fn is_social(domain: &str) -> bool {
    let host = domain
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_start_matches("www.")
        .split('/')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    SOCIAL_DOMAINS
        .iter()
        .any(|s| host == *s || host.ends_with(&format!(".{s}")))
}

/// Bare and schemed domains on the allow-listed TLDs, excluding social sites.
fn websites(text_without_emails: &str) -> Vec<String> {
    dedupe(
        domain_re()
            .find_iter(text_without_emails)
            .map(|m| m.as_str())
            .filter(|d| !is_social(d))
            .map(|d| d.trim_end_matches('/').to_string()),
    )
}

/// Month-name dates, preferring the text after a "Birthday" label.
fn birthdays(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let scope = match lower.find("birthday") {
        Some(pos) => text.get(pos..).unwrap_or(text),
        None => text,
    };
    dedupe(
        birthday_re()
            .captures_iter(scope)
            .filter(|c| {
                let month_ok = c
                    .get(1)
                    .is_some_and(|m| MONTHS.contains(&m.as_str().to_lowercase().as_str()));
                let day_ok = c
                    .get(2)
                    .and_then(|d| d.as_str().parse::<u8>().ok())
                    .is_some_and(|d| (1..=31).contains(&d));
                month_ok && day_ok
            })
            .filter_map(|c| c.get(0).map(|m| m.as_str().to_string()))
            .take(1),
    )
}
