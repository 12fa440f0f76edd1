// Copyright 2026 Linkscout Contributors
// SPDX-License-Identifier: Apache-2.0

//! Session controller: owns the browser page, drives navigation with
//! retry and backoff, and detects block and challenge conditions.
//!
//! A [`Session`] is the sole owner of its page. All interactions are
//! sequential; nothing else holds a reference to the browser.

pub mod detect;
pub mod fingerprint;

use crate::browser::chromium::{ChromiumPage, LaunchOptions};
use crate::browser::{BrowserPage, PageError, WaitCondition};
use crate::pacing::{Pacer, ScrollAction, ScrollPattern, SCROLL_PASSES};
use crate::progress::{Progress, ProgressEventKind};
use fingerprint::Fingerprint;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Session-fatal failures. These abort the run.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to launch browser session: {0}")]
    Launch(String),
    #[error("login failed: {0}")]
    Login(String),
}

/// Why a navigation did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavFailure {
    /// Every attempt timed out.
    Timeout { attempts: u32 },
    /// A block phrase survived one remediation reload.
    Blocked { signal: String },
    /// A challenge was not resolved within the ceiling.
    ChallengeUnresolved,
    /// The page or browser went away.
    PageClosed(String),
    /// Any other browser error.
    Browser(String),
}

impl std::fmt::Display for NavFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout { attempts } => write!(f, "timed out after {attempts} attempts"),
            Self::Blocked { signal } => write!(f, "blocked ({signal})"),
            Self::ChallengeUnresolved => write!(f, "challenge not resolved in time"),
            Self::PageClosed(m) => write!(f, "page closed: {m}"),
            Self::Browser(m) => write!(f, "browser error: {m}"),
        }
    }
}

/// Typed result of [`Session::navigate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavOutcome {
    Success,
    /// The caller may skip or retry the target later.
    RetryableFailure(NavFailure),
    /// The current target cannot be reached in this session.
    FatalFailure(NavFailure),
}

impl NavOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn failure(&self) -> Option<&NavFailure> {
        match self {
            Self::Success => None,
            Self::RetryableFailure(f) | Self::FatalFailure(f) => Some(f),
        }
    }
}

/// Parameters of one navigation.
#[derive(Debug, Clone, Copy)]
pub struct NavigationRequest {
    pub wait: WaitCondition,
    /// Timeout of the first attempt; later attempts grow it.
    pub timeout: Duration,
    pub max_retries: u32,
}

impl Default for NavigationRequest {
    fn default() -> Self {
        Self {
            wait: WaitCondition::DomContentLoaded,
            timeout: Duration::from_secs(30),
            max_retries: 3,
        }
    }
}

impl NavigationRequest {
    pub fn new(timeout: Duration, max_retries: u32) -> Self {
        Self {
            timeout,
            max_retries,
            ..Default::default()
        }
    }
}

/// Session-wide timing limits.
#[derive(Debug, Clone)]
pub struct SessionPolicy {
    /// How long to wait for someone to resolve a challenge.
    pub challenge_ceiling: Duration,
    /// Timeout of the remediation reload after a block signal.
    pub remediation_timeout: Duration,
    /// How long login waits for the feed before giving up.
    pub login_timeout: Duration,
    /// How long a login checkpoint may take to clear.
    pub checkpoint_ceiling: Duration,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            challenge_ceiling: Duration::from_secs(600),
            remediation_timeout: Duration::from_secs(12),
            login_timeout: Duration::from_secs(20),
            checkpoint_ceiling: Duration::from_secs(180),
        }
    }
}

/// Credential pair for [`Session::login`].
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// Timeout of the next attempt: 1.8x the current one plus `jitter_ms`.
pub fn next_timeout(current: Duration, jitter_ms: u64) -> Duration {
    let grown = (current.as_millis() as f64 * 1.8) as u64;
    Duration::from_millis(grown.saturating_add(jitter_ms))
}

const CHALLENGE_POLL: Duration = Duration::from_secs(5);
const URL_POLL: Duration = Duration::from_millis(500);

/// One live browser session.
pub struct Session {
    page: Box<dyn BrowserPage>,
    fingerprint: Arc<Fingerprint>,
    pacer: Pacer,
    history: Vec<String>,
    policy: SessionPolicy,
    progress: Progress,
    released: bool,
}

impl Session {
    pub fn new(page: Box<dyn BrowserPage>, fingerprint: Arc<Fingerprint>, policy: SessionPolicy) -> Self {
        Self {
            page,
            fingerprint,
            pacer: Pacer::new(),
            history: Vec::new(),
            policy,
            progress: Progress::silent(),
            released: false,
        }
    }

    /// Launch Chromium with a freshly drawn fingerprint.
    pub async fn launch(options: &LaunchOptions, policy: SessionPolicy) -> Result<Self, SessionError> {
        let mut fingerprint = Fingerprint::random(&mut rand::thread_rng());
        if let Some((width, height)) = options.viewport {
            fingerprint.viewport_width = width;
            fingerprint.viewport_height = height;
        }
        let fingerprint = Arc::new(fingerprint);
        let page = ChromiumPage::launch(options, &fingerprint)
            .await
            .map_err(|e| SessionError::Launch(format!("{e:#}")))?;
        info!(
            user_agent = %fingerprint.user_agent,
            locale = %fingerprint.locale,
            timezone = %fingerprint.timezone,
            viewport = %format!("{}x{}", fingerprint.viewport_width, fingerprint.viewport_height),
            "browser session started"
        );
        Ok(Self::new(Box::new(page), fingerprint, policy))
    }

    pub fn with_pacer(mut self, pacer: Pacer) -> Self {
        self.pacer = pacer;
        self
    }

    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = progress;
        self
    }

    pub fn fingerprint(&self) -> &Arc<Fingerprint> {
        &self.fingerprint
    }

    /// URLs successfully loaded, oldest first.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn page(&self) -> &dyn BrowserPage {
        self.page.as_ref()
    }

    pub fn pacer(&mut self) -> &mut Pacer {
        &mut self.pacer
    }

    pub fn progress(&mut self) -> &mut Progress {
        &mut self.progress
    }

    /// Navigate to `url`, retrying timeouts with a growing budget.
    pub async fn navigate(&mut self, url: &str, request: NavigationRequest) -> NavOutcome {
        self.pacer.pause_uniform(0.5, 2.0).await;

        let attempts = request.max_retries.max(1);
        let mut timeout = request.timeout;

        for attempt in 1..=attempts {
            debug!(url, attempt, timeout_ms = timeout.as_millis() as u64, "navigating");
            match self.page.goto(url, request.wait, timeout).await {
                Ok(()) => {}
                Err(e) if e.is_timeout() => {
                    warn!(url, attempt, timeout_ms = timeout.as_millis() as u64, "navigation timed out");
                    let jitter = self.pacer.int_between(2_000, 5_000) as u64;
                    timeout = next_timeout(timeout, jitter);
                    self.pacer.pause_uniform(1.0, 3.0).await;
                    continue;
                }
                Err(PageError::Closed(m)) => {
                    error!(url, error = %m, "page closed during navigation");
                    return NavOutcome::FatalFailure(NavFailure::PageClosed(m));
                }
                Err(e) => {
                    warn!(url, error = %e, "navigation failed");
                    return NavOutcome::RetryableFailure(NavFailure::Browser(e.to_string()));
                }
            }

            self.history.push(url.to_string());
            self.pacer.pause_uniform(0.2, 0.8).await;

            if self.detect_challenge().await {
                warn!(url, "challenge detected");
                if !self.await_challenge(url).await {
                    return NavOutcome::FatalFailure(NavFailure::ChallengeUnresolved);
                }
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let text = self.body_text().await.unwrap_or_default();
            if let Some(signal) = detect::block_signal(&text) {
                warn!(url, signal, "block signal detected");
                if self.remediate().await {
                    info!(url, "block signal cleared after reload");
                    return NavOutcome::Success;
                }
                return NavOutcome::RetryableFailure(NavFailure::Blocked {
                    signal: signal.to_string(),
                });
            }

            info!(url, "navigated");
            return NavOutcome::Success;
        }

        error!(url, attempts, "navigation failed after all attempts");
        NavOutcome::RetryableFailure(NavFailure::Timeout { attempts })
    }

    /// Extended delay and reload; true when the block signal is gone.
    async fn remediate(&mut self) -> bool {
        self.pacer.pause_uniform(3.0, 6.0).await;
        if let Err(e) = self.page.reload(self.policy.remediation_timeout).await {
            debug!(error = %e, "remediation reload failed");
            return false;
        }
        self.pacer.pause_uniform(2.0, 4.0).await;
        match self.body_text().await {
            Ok(text) => detect::block_signal(&text).is_none(),
            Err(_) => false,
        }
    }

    /// A challenge indicator in the HTML and a matching interactive element.
    pub async fn detect_challenge(&self) -> bool {
        let Ok(html) = self.page.html().await else {
            return false;
        };
        if !detect::has_challenge_indicator(&html) {
            return false;
        }
        for selector in detect::CHALLENGE_SELECTORS {
            if matches!(self.page.count(selector).await, Ok(n) if n > 0) {
                return true;
            }
        }
        false
    }

    /// Block until the challenge clears or the ceiling passes.
    async fn await_challenge(&mut self, url: &str) -> bool {
        let ceiling = self.policy.challenge_ceiling;
        warn!(url, ceiling_secs = ceiling.as_secs(), "manual intervention required: solve the challenge in the browser window");
        self.progress.emit(ProgressEventKind::InterventionRequired {
            reason: "challenge".to_string(),
            url: url.to_string(),
            ceiling_secs: ceiling.as_secs(),
        });

        let deadline = Instant::now() + ceiling;
        tokio::time::sleep(Duration::from_secs(2).min(ceiling)).await;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match self.page.wait_for_navigation(remaining.min(CHALLENGE_POLL)).await {
                Ok(()) => {
                    info!(url, "challenge resolved (page navigated)");
                    return true;
                }
                Err(PageError::Closed(_)) => return false,
                Err(_) => {}
            }
            if let Ok(html) = self.page.html().await {
                if !detect::has_challenge_indicator(&html) {
                    info!(url, "challenge resolved (content changed)");
                    return true;
                }
            }
        }

        error!(url, "challenge not resolved before the ceiling");
        false
    }

    /// Rendered text of the whole document.
    pub async fn body_text(&self) -> Result<String, PageError> {
        Ok(self.page.inner_text("body").await?.unwrap_or_default())
    }

    /// Click with a pause before and after. False when nothing was clicked.
    pub async fn human_click(&mut self, selector: &str, index: usize) -> bool {
        self.pacer.pause_uniform(0.5, 1.5).await;
        match self.page.click(selector, index).await {
            Ok(true) => {
                self.pacer.pause_uniform(0.5, 2.0).await;
                true
            }
            Ok(false) => false,
            Err(e) => {
                debug!(selector, error = %e, "click failed");
                false
            }
        }
    }

    /// Type one character at a time with per-keystroke delays.
    pub async fn human_type(&mut self, selector: &str, text: &str) -> bool {
        let mut buf = [0u8; 4];
        for ch in text.chars() {
            match self.page.type_text(selector, ch.encode_utf8(&mut buf)).await {
                Ok(true) => {}
                Ok(false) => return false,
                Err(e) => {
                    debug!(selector, error = %e, "typing failed");
                    return false;
                }
            }
            let delay = self.pacer.keystroke();
            tokio::time::sleep(delay).await;
        }
        true
    }

    /// Two scroll passes, a few pointer moves, then a reading pause.
    pub async fn simulate_reading(&mut self, pattern: ScrollPattern) {
        for pass in 0..SCROLL_PASSES {
            let height = match self.page.metrics().await {
                Ok(m) => m.scroll_height,
                Err(e) => {
                    debug!(error = %e, "metrics unavailable, skipping scroll");
                    break;
                }
            };
            for action in self.pacer.scroll_pass(pattern, height) {
                match action {
                    ScrollAction::ScrollTo(y) => {
                        if let Err(e) = self.page.scroll_to(y).await {
                            debug!(error = %e, "scroll failed");
                        }
                    }
                    ScrollAction::Wait(d) => tokio::time::sleep(d).await,
                }
            }
            if pass + 1 < SCROLL_PASSES {
                let _ = self.page.scroll_to(0).await;
                self.pacer.pause_uniform(0.4, 1.2).await;
            }
        }

        self.move_pointer_randomly().await;
        self.pacer.pause(1.0, 3.0).await;
    }

    /// A handful of pointer moves across the viewport.
    pub async fn move_pointer_randomly(&mut self) {
        let metrics = self.page.metrics().await.unwrap_or_default();
        let path = self
            .pacer
            .pointer_path(metrics.viewport_width, metrics.viewport_height, None);
        for (x, y) in path {
            if let Err(e) = self.page.move_pointer(x, y).await {
                debug!(error = %e, "pointer move failed");
                return;
            }
            self.pacer.pause_uniform(0.1, 0.3).await;
        }
    }

    /// Poll the current URL until it contains `fragment` or `timeout` passes.
    pub async fn wait_for_url(&self, fragment: &str, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if let Ok(url) = self.page.current_url().await {
                if url.contains(fragment) {
                    return true;
                }
            }
            if Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(URL_POLL).await;
        }
    }

    /// Sign in through the login form.
    ///
    /// A verification checkpoint blocks until someone clears it in the
    /// browser window or the checkpoint ceiling passes.
    pub async fn login(&mut self, base_url: &str, credentials: &Credentials, request: NavigationRequest) -> Result<(), SessionError> {
        let login_url = format!("{}/login", base_url.trim_end_matches('/'));
        info!(url = %login_url, "logging in");

        if let Some(failure) = self.navigate(&login_url, request).await.failure() {
            return Err(SessionError::Login(failure.to_string()));
        }
        self.pacer.pause(1.0, 2.0).await;

        if !self.human_type("#username", &credentials.email).await {
            return Err(SessionError::Login("username field not found".into()));
        }
        self.pacer.pause_uniform(0.3, 0.8).await;
        if !self.human_type("#password", &credentials.password).await {
            return Err(SessionError::Login("password field not found".into()));
        }
        if !self.human_click("button[type=\"submit\"]", 0).await {
            return Err(SessionError::Login("submit button not found".into()));
        }

        if self.wait_for_url("/feed", self.policy.login_timeout).await {
            info!("login successful");
            return Ok(());
        }

        let current = self.page.current_url().await.unwrap_or_default();
        if current.contains("checkpoint") {
            let ceiling = self.policy.checkpoint_ceiling;
            warn!(ceiling_secs = ceiling.as_secs(), "login checkpoint: complete verification in the browser window");
            self.progress.emit(ProgressEventKind::InterventionRequired {
                reason: "login checkpoint".to_string(),
                url: current.clone(),
                ceiling_secs: ceiling.as_secs(),
            });
            if self.wait_for_url("/feed", ceiling).await {
                info!("login successful after checkpoint");
                return Ok(());
            }
            return Err(SessionError::Login("checkpoint not cleared in time".into()));
        }

        Err(SessionError::Login(format!("feed not reached, landed on {current}")))
    }

    /// Release page, context, browser, and engine, logging any failures.
    ///
    /// Safe to call more than once.
    pub async fn cleanup(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        for step in self.page.release().await {
            match step.error {
                None => debug!(resource = step.resource, "released"),
                Some(e) => warn!(resource = step.resource, error = %e, "release failed"),
            }
        }
        info!("browser session closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_timeout_grows() {
        assert_eq!(next_timeout(Duration::from_millis(10_000), 2_000), Duration::from_millis(20_000));
        assert_eq!(next_timeout(Duration::from_millis(1_000), 5_000), Duration::from_millis(6_800));
    }

    #[test]
    fn test_nav_outcome_failure_accessor() {
        assert!(NavOutcome::Success.failure().is_none());
        let blocked = NavOutcome::RetryableFailure(NavFailure::Blocked {
            signal: "access denied".into(),
        });
        assert_eq!(blocked.failure().unwrap().to_string(), "blocked (access denied)");
        assert!(!blocked.is_success());
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = Credentials {
            email: "a@b.c".into(),
            password: "hunter2".into(),
        };
        assert!(!format!("{creds:?}").contains("hunter2"));
    }
}
