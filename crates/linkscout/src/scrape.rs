// Copyright 2026 Linkscout Contributors
// SPDX-License-Identifier: Apache-2.0

//! Scrape orchestrator.
//!
//! Sequences one profile through navigate, dismiss modal, access check,
//! reading simulation, section expansion, extraction and contact info, and
//! many profiles through that pipeline with adaptive pacing between them.
//!
//! The orchestrator owns the extraction step and borrows the session for the
//! duration of a call; persistence is reached only through [`ProfileSink`].

use crate::extract::contact::{own_profile_urls, parse_contact_info};
use crate::extract::{extract_profile, PageSnapshot};
use crate::journal::{Journal, JournalEntry};
use crate::model::{ContactInfo, ProfileRecord};
use crate::pacing::ScrollPattern;
use crate::progress::{ProfileOutcomeKind, ProgressEventKind};
use crate::session::{detect, NavFailure, NavOutcome, NavigationRequest, Session};
use crate::store::StoreError;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Where batch outcomes are recorded.
pub trait ProfileSink {
    fn is_completed(&self, url: &str) -> Result<bool, StoreError>;
    fn record_success(&self, record: &ProfileRecord) -> Result<(), StoreError>;
    /// Counts one attempt against the retry cap.
    fn record_failure(&self, url: &str, error: &str) -> Result<(), StoreError>;
    /// Final, does not count an attempt.
    fn record_skip(&self, url: &str, reason: &str) -> Result<(), StoreError>;
}

/// Collapsed sections and "show more" controls.
const EXPAND_SCRIPT: &str = r#"((limit) => {
    document.querySelectorAll('[data-scout-expand]').forEach(el => el.removeAttribute('data-scout-expand'));
    const found = new Set();
    const css = 'button[aria-expanded="false"], .inline-show-more-text__button, [class*="show-more"] button';
    document.querySelectorAll(css).forEach(el => found.add(el));
    document.querySelectorAll('button').forEach(el => {
        const label = (el.innerText || '').trim().toLowerCase();
        if (label.startsWith('show more') || label.startsWith('see more') || label.startsWith('see all')) {
            found.add(el);
        }
    });
    let n = 0;
    for (const el of found) {
        if (n >= limit) break;
        if (el.disabled || el.offsetParent === null) continue;
        el.setAttribute('data-scout-expand', String(n));
        n += 1;
    }
    return n;
})"#;

/// Controls that open the contact overlay from the profile page.
const CONTACT_LINK_SELECTORS: &[&str] = &[
    "a[href*=\"/overlay/contact-info\"]",
    "#top-card-text-details-contact-info",
    "a[data-control-name=\"contact_see_more\"]",
];

/// Containers holding the contact overlay's text.
const CONTACT_DIALOG_SELECTORS: &[&str] = &[
    "[role=\"dialog\"]",
    ".artdeco-modal__content",
    ".pv-contact-info",
];

/// Tunables of one scrape run.
#[derive(Debug, Clone)]
pub struct ScrapePolicy {
    /// Navigation to each profile.
    pub nav: NavigationRequest,
    /// Navigation to the contact overlay.
    pub contact_nav: NavigationRequest,
    pub scroll: ScrollPattern,
    /// Expansion passes; controls can appear after earlier clicks.
    pub expand_passes: usize,
    /// Clicks per expansion pass.
    pub expand_clicks: usize,
    /// Overlay text shorter than this is treated as missing.
    pub contact_min_chars: usize,
    /// Base delay between profiles, in seconds.
    pub delay_range: (f64, f64),
    /// Scroll and pointer simulation before extraction.
    pub human_behavior: bool,
}

impl Default for ScrapePolicy {
    fn default() -> Self {
        Self {
            nav: NavigationRequest::new(Duration::from_secs(60), 3),
            contact_nav: NavigationRequest::new(Duration::from_secs(20), 1),
            scroll: ScrollPattern::Natural,
            expand_passes: 3,
            expand_clicks: 20,
            contact_min_chars: 40,
            delay_range: (15.0, 30.0),
            human_behavior: true,
        }
    }
}

/// Result of one profile.
#[derive(Debug, Clone)]
pub enum ScrapeOutcome {
    Scraped(Box<ProfileRecord>),
    /// Private or unavailable. Not retried.
    Restricted(String),
    /// Retryable later.
    Failed(String),
    /// The browser went away; nothing else in the batch can run.
    SessionLost(String),
}

impl ScrapeOutcome {
    pub fn kind(&self) -> ProfileOutcomeKind {
        match self {
            Self::Scraped(_) => ProfileOutcomeKind::Scraped,
            Self::Restricted(_) => ProfileOutcomeKind::Restricted,
            Self::Failed(_) | Self::SessionLost(_) => ProfileOutcomeKind::Failed,
        }
    }
}

/// Tally of one batch.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Restricted profiles.
    pub skipped: usize,
    pub already_completed: usize,
    /// Set when the batch stopped early because the session was lost.
    pub aborted: Option<String>,
    pub elapsed: Duration,
    pub records: Vec<ProfileRecord>,
}

/// Drives profiles through a session.
#[derive(Debug, Clone, Default)]
pub struct Orchestrator {
    policy: ScrapePolicy,
}

impl Orchestrator {
    pub fn new(policy: ScrapePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ScrapePolicy {
        &self.policy
    }

    /// Scrape one profile.
    pub async fn scrape_profile(&self, session: &mut Session, url: &str) -> ScrapeOutcome {
        info!(url, "scraping profile");

        match session.navigate(url, self.policy.nav).await {
            NavOutcome::Success => {}
            NavOutcome::FatalFailure(NavFailure::PageClosed(m)) => {
                return ScrapeOutcome::SessionLost(m);
            }
            NavOutcome::RetryableFailure(f) | NavOutcome::FatalFailure(f) => {
                warn!(url, reason = %f, "navigation failed");
                return ScrapeOutcome::Failed(f.to_string());
            }
        }
        session.pacer().pause(1.0, 2.0).await;

        dismiss_modal(session).await;

        match session.body_text().await {
            Ok(text) => {
                if let Some(phrase) = detect::access_issue(&text) {
                    warn!(url, phrase, "profile access restricted");
                    return ScrapeOutcome::Restricted(phrase.to_string());
                }
            }
            Err(e) => debug!(url, error = %e, "access check skipped"),
        }

        if self.policy.human_behavior {
            session.simulate_reading(self.policy.scroll).await;
        }

        self.expand_sections(session).await;

        let Some(snapshot) = PageSnapshot::capture(session.page()).await else {
            return ScrapeOutcome::Failed("page text unavailable".to_string());
        };
        let mut record = extract_profile(url, &snapshot);

        record.contact_info = Some(self.contact_info(session, url).await);

        info!(
            url,
            name = record.name.as_deref().unwrap_or("unknown"),
            completeness = record.completeness,
            "profile scraped"
        );
        ScrapeOutcome::Scraped(Box::new(record))
    }

    /// Click collapsed controls over several passes.
    async fn expand_sections(&self, session: &mut Session) {
        let script = format!("{EXPAND_SCRIPT}({})", self.policy.expand_clicks);
        for pass in 1..=self.policy.expand_passes {
            let found = match session.page().evaluate(&script).await {
                Ok(value) => value.as_u64().unwrap_or(0) as usize,
                Err(e) => {
                    debug!(error = %e, "expansion scan failed");
                    return;
                }
            };
            debug!(pass, found, "expandable controls");
            if found == 0 {
                break;
            }

            for i in 0..found.min(self.policy.expand_clicks) {
                let selector = format!("[data-scout-expand=\"{i}\"]");
                session.pacer().pause(0.2, 0.6).await;
                match session.page().click(&selector, 0).await {
                    Ok(true) => session.pacer().pause(0.4, 1.2).await,
                    Ok(false) => continue,
                    Err(e) => {
                        debug!(index = i, error = %e, "could not expand section");
                        continue;
                    }
                }
                if i % 5 == 0 {
                    session.pacer().pause(1.0, 2.0).await;
                }
            }

            session.pacer().pause(1.0, 2.0).await;
        }
    }

    /// Overlay URL, then the contact control, then a scan of the page for
    /// the profile's own URL.
    ///
    /// Leaves the session on the profile page.
    async fn contact_info(&self, session: &mut Session, url: &str) -> ContactInfo {
        let overlay = format!("{}/overlay/contact-info/", url.trim_end_matches('/'));
        let mut info = None;

        if session.navigate(&overlay, self.policy.contact_nav).await.is_success() {
            session.pacer().pause(1.0, 2.0).await;
            info = self.read_contact_dialog(session).await;
        }
        if info.is_some() || !on_profile(session, url).await {
            self.return_to_profile(session, url).await;
        }
        if let Some(info) = info {
            debug!(url, "contact info from overlay");
            return info;
        }

        for selector in CONTACT_LINK_SELECTORS {
            if !session.human_click(selector, 0).await {
                continue;
            }
            let info = self.read_contact_dialog(session).await;
            dismiss_modal(session).await;
            if !on_profile(session, url).await {
                self.return_to_profile(session, url).await;
            }
            if let Some(info) = info {
                debug!(url, selector, "contact info from modal");
                return info;
            }
            break;
        }

        let html = session.page().html().await.unwrap_or_default();
        let mut found = own_profile_urls(&html, url);
        if found.is_empty() {
            found.push(url.trim_end_matches('/').to_string());
        }
        let mut info = ContactInfo::default();
        info.set("linkedin_urls", found);
        debug!(url, "contact info from page scan");
        info
    }

    async fn read_contact_dialog(&self, session: &Session) -> Option<ContactInfo> {
        for selector in CONTACT_DIALOG_SELECTORS {
            match session.page().inner_text(selector).await {
                Ok(Some(text)) if text.trim().chars().count() >= self.policy.contact_min_chars => {
                    return Some(parse_contact_info(&text));
                }
                Ok(_) => {}
                Err(e) => debug!(selector, error = %e, "contact text unavailable"),
            }
        }
        None
    }

    async fn return_to_profile(&self, session: &mut Session, url: &str) {
        if let Some(failure) = session.navigate(url, self.policy.nav).await.failure() {
            warn!(url, reason = %failure, "could not return to profile");
            session.progress().emit(ProgressEventKind::Warning {
                message: format!("could not return to {url}: {failure}"),
            });
        }
    }

    /// Scrape `urls` one at a time, recording every outcome in `sink`.
    ///
    /// Only a lost session stops the batch early.
    pub async fn scrape_batch(
        &self,
        session: &mut Session,
        urls: &[String],
        sink: &dyn ProfileSink,
        mut journal: Option<&mut Journal>,
    ) -> BatchSummary {
        let started = Instant::now();
        let total = urls.len();
        let mut summary = BatchSummary {
            total,
            ..Default::default()
        };
        session.progress().emit(ProgressEventKind::BatchStarted { total: total as u32 });

        let mut attempted = 0usize;
        for (i, url) in urls.iter().enumerate() {
            let index = i + 1;
            info!(index, total, url = %url, "batch progress");

            match sink.is_completed(url) {
                Ok(true) => {
                    debug!(url = %url, "already completed");
                    summary.already_completed += 1;
                    session.progress().emit(ProgressEventKind::ProfileFinished {
                        index: index as u32,
                        url: url.clone(),
                        outcome: ProfileOutcomeKind::AlreadyCompleted,
                        completeness: None,
                    });
                    continue;
                }
                Ok(false) => {}
                Err(e) => warn!(url = %url, error = %e, "completion check failed"),
            }

            if attempted > 0 {
                let delay = session.pacer().adaptive_delay(index, total, self.policy.delay_range);
                info!(delay_secs = delay.as_secs_f64(), "waiting before next profile");
                tokio::time::sleep(delay).await;
            }
            attempted += 1;

            session.progress().emit(ProgressEventKind::ProfileStarted {
                index: index as u32,
                url: url.clone(),
            });
            let profile_started = Instant::now();
            let outcome = self.scrape_profile(session, url).await;
            let kind = outcome.kind();
            let mut entry = JournalEntry::now(url, kind, profile_started.elapsed().as_millis() as u64);

            let stored = match outcome {
                ScrapeOutcome::Scraped(record) => {
                    summary.succeeded += 1;
                    entry.completeness = Some(record.completeness);
                    let stored = sink.record_success(&record);
                    summary.records.push(*record);
                    stored
                }
                ScrapeOutcome::Restricted(reason) => {
                    summary.skipped += 1;
                    let stored = sink.record_skip(url, &reason);
                    entry.detail = Some(reason);
                    stored
                }
                ScrapeOutcome::Failed(reason) => {
                    summary.failed += 1;
                    let stored = sink.record_failure(url, &reason);
                    entry.detail = Some(reason);
                    stored
                }
                ScrapeOutcome::SessionLost(reason) => {
                    error!(url = %url, reason = %reason, "browser session lost, stopping batch");
                    summary.failed += 1;
                    let stored = sink.record_failure(url, &reason);
                    entry.detail = Some(reason.clone());
                    summary.aborted = Some(reason);
                    stored
                }
            };
            if let Err(e) = stored {
                warn!(url = %url, error = %e, "failed to record outcome");
            }
            if let Some(journal) = journal.as_deref_mut() {
                if let Err(e) = journal.log(&entry) {
                    warn!(error = %e, "failed to write journal");
                }
            }

            session.progress().emit(ProgressEventKind::ProfileFinished {
                index: index as u32,
                url: url.clone(),
                outcome: kind,
                completeness: entry.completeness,
            });

            if summary.aborted.is_some() {
                break;
            }
        }

        summary.elapsed = started.elapsed();
        session.progress().emit(ProgressEventKind::BatchComplete {
            succeeded: summary.succeeded as u32,
            failed: summary.failed as u32,
            skipped: summary.skipped as u32,
            elapsed_ms: summary.elapsed.as_millis() as u64,
        });
        info!(
            total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            skipped = summary.skipped,
            already_completed = summary.already_completed,
            elapsed_secs = summary.elapsed.as_secs(),
            "batch complete"
        );
        summary
    }
}

/// Click the first modal close control that exists. Missing modals are fine.
async fn dismiss_modal(session: &mut Session) {
    for selector in detect::MODAL_CLOSE_SELECTORS {
        match session.page().click(selector, 0).await {
            Ok(true) => {
                debug!(selector, "modal dismissed");
                session.pacer().pause(0.5, 1.0).await;
                return;
            }
            Ok(false) => {}
            Err(e) => debug!(selector, error = %e, "modal close failed"),
        }
    }
}

async fn on_profile(session: &Session, url: &str) -> bool {
    match session.page().current_url().await {
        Ok(current) => {
            let current = current.trim_end_matches('/');
            current == url.trim_end_matches('/')
        }
        Err(_) => false,
    }
}
