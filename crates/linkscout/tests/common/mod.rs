// Copyright 2026 Linkscout Contributors
// SPDX-License-Identifier: Apache-2.0

//! Scripted in-memory browser page shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use linkscout::browser::{BrowserPage, PageError, PageMetrics, ReleaseStep, WaitCondition};
use linkscout::pacing::Pacer;
use linkscout::session::fingerprint::Fingerprint;
use linkscout::session::{Session, SessionPolicy};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// One scripted document.
#[derive(Debug, Clone, Default)]
pub struct PageState {
    pub url: String,
    pub html: String,
    /// `innerText` of `body`.
    pub text: String,
    pub anchors: Vec<String>,
    /// `innerText` of other selectors.
    pub texts: HashMap<String, String>,
    /// Selectors that match one element.
    pub present: HashSet<String>,
    /// Clicking the selector loads another document.
    pub on_click: HashMap<String, PageState>,
    /// What a reload turns this document into.
    pub reload_to: Option<Box<PageState>>,
}

impl PageState {
    pub fn new(url: &str, text: &str) -> Self {
        Self {
            url: url.to_string(),
            text: text.to_string(),
            ..Default::default()
        }
    }

    pub fn with_html(mut self, html: &str) -> Self {
        self.html = html.to_string();
        self
    }

    pub fn with_anchors(mut self, anchors: Vec<String>) -> Self {
        self.anchors = anchors;
        self
    }

    pub fn with_text(mut self, selector: &str, text: &str) -> Self {
        self.texts.insert(selector.to_string(), text.to_string());
        self.present.insert(selector.to_string());
        self
    }

    pub fn with_present(mut self, selector: &str) -> Self {
        self.present.insert(selector.to_string());
        self
    }

    pub fn with_click(mut self, selector: &str, next: PageState) -> Self {
        self.on_click.insert(selector.to_string(), next);
        self
    }

    pub fn with_reload(mut self, next: PageState) -> Self {
        self.reload_to = Some(Box::new(next));
        self
    }
}

/// Recorded page calls.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Goto { url: String, timeout: Duration },
    Reload,
    Click(String),
    Type(String, String),
    Release,
}

#[derive(Debug, Default)]
struct Inner {
    pages: HashMap<String, PageState>,
    current: PageState,
    /// Remaining timeouts to produce per URL before loading it.
    timeouts: HashMap<String, u32>,
    /// Visits to let through per URL, then timeouts to produce.
    later_timeouts: HashMap<String, (u32, u32)>,
    closed: bool,
    /// Navigation waits before the current challenge clears.
    challenge_clears_after: Option<u32>,
    nav_waits: u32,
    calls: Vec<Call>,
}

/// A `BrowserPage` over scripted documents. Clones share state so tests can
/// inspect the page after the session takes ownership of it.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPage {
    inner: Arc<Mutex<Inner>>,
}

impl ScriptedPage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    pub fn add(&self, page: PageState) -> &Self {
        self.lock().pages.insert(page.url.clone(), page);
        self
    }

    pub fn time_out(&self, url: &str, times: u32) -> &Self {
        self.lock().timeouts.insert(url.to_string(), times);
        self
    }

    /// Load `url` normally `visits` times, then time out `times` times.
    pub fn time_out_later(&self, url: &str, visits: u32, times: u32) -> &Self {
        self.lock().later_timeouts.insert(url.to_string(), (visits, times));
        self
    }

    pub fn close(&self) {
        self.lock().closed = true;
    }

    pub fn clear_challenge_after(&self, waits: u32) {
        self.lock().challenge_clears_after = Some(waits);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn goto_timeouts(&self, url: &str) -> Vec<Duration> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Goto { url: u, timeout } if u == url => Some(timeout),
                _ => None,
            })
            .collect()
    }

    pub fn visits(&self, url: &str) -> usize {
        self.goto_timeouts(url).len()
    }

    pub fn releases(&self) -> usize {
        self.calls().iter().filter(|c| **c == Call::Release).count()
    }

    pub fn current_url_now(&self) -> String {
        self.lock().current.url.clone()
    }

    /// A session over this page with a seeded pacer and fingerprint.
    pub fn session(&self, policy: SessionPolicy) -> Session {
        let fingerprint = Fingerprint::random(&mut StdRng::seed_from_u64(7));
        Session::new(Box::new(self.clone()), Arc::new(fingerprint), policy).with_pacer(Pacer::seeded(11))
    }
}

fn closed() -> PageError {
    PageError::Closed("scripted page closed".into())
}

#[async_trait]
impl BrowserPage for ScriptedPage {
    async fn goto(&mut self, url: &str, _wait: WaitCondition, timeout: Duration) -> Result<(), PageError> {
        let timed_out = {
            let mut inner = self.lock();
            inner.calls.push(Call::Goto {
                url: url.to_string(),
                timeout,
            });
            if inner.closed {
                return Err(closed());
            }
            match inner.timeouts.get_mut(url) {
                Some(n) if *n > 0 => {
                    *n -= 1;
                    true
                }
                _ => match inner.later_timeouts.get_mut(url) {
                    Some((visits, _)) if *visits > 0 => {
                        *visits -= 1;
                        false
                    }
                    Some((_, n)) if *n > 0 => {
                        *n -= 1;
                        true
                    }
                    _ => false,
                },
            }
        };
        if timed_out {
            tokio::time::sleep(timeout).await;
            return Err(PageError::Timeout(timeout));
        }
        let mut inner = self.lock();
        inner.current = inner
            .pages
            .get(url)
            .cloned()
            .unwrap_or_else(|| PageState::new(url, ""));
        inner.current.url = url.to_string();
        Ok(())
    }

    async fn reload(&mut self, _timeout: Duration) -> Result<(), PageError> {
        let mut inner = self.lock();
        inner.calls.push(Call::Reload);
        if inner.closed {
            return Err(closed());
        }
        if let Some(next) = inner.current.reload_to.take() {
            let url = inner.current.url.clone();
            inner.current = *next;
            inner.current.url = url;
        }
        Ok(())
    }

    async fn wait_for_navigation(&mut self, timeout: Duration) -> Result<(), PageError> {
        tokio::time::sleep(timeout).await;
        let mut inner = self.lock();
        if inner.closed {
            return Err(closed());
        }
        inner.nav_waits += 1;
        match inner.challenge_clears_after {
            Some(n) if inner.nav_waits >= n => {
                inner.current.html.clear();
                inner.challenge_clears_after = None;
                Ok(())
            }
            _ => Err(PageError::Timeout(timeout)),
        }
    }

    async fn current_url(&self) -> Result<String, PageError> {
        Ok(self.lock().current.url.clone())
    }

    async fn html(&self) -> Result<String, PageError> {
        Ok(self.lock().current.html.clone())
    }

    async fn inner_text(&self, selector: &str) -> Result<Option<String>, PageError> {
        let inner = self.lock();
        if inner.closed {
            return Err(closed());
        }
        if selector == "body" {
            return Ok(Some(inner.current.text.clone()));
        }
        Ok(inner.current.texts.get(selector).cloned())
    }

    async fn evaluate(&self, _script: &str) -> Result<Value, PageError> {
        Ok(Value::Null)
    }

    async fn count(&self, selector: &str) -> Result<usize, PageError> {
        let inner = self.lock();
        let current = &inner.current;
        Ok(usize::from(current.present.contains(selector) || current.on_click.contains_key(selector)))
    }

    async fn click(&self, selector: &str, _index: usize) -> Result<bool, PageError> {
        let mut inner = self.lock();
        inner.calls.push(Call::Click(selector.to_string()));
        if let Some(next) = inner.current.on_click.get(selector).cloned() {
            inner.current = next;
            return Ok(true);
        }
        Ok(inner.current.present.contains(selector))
    }

    async fn type_text(&self, selector: &str, text: &str) -> Result<bool, PageError> {
        let mut inner = self.lock();
        if !inner.current.present.contains(selector) {
            return Ok(false);
        }
        inner.calls.push(Call::Type(selector.to_string(), text.to_string()));
        Ok(true)
    }

    async fn anchor_hrefs(&self) -> Result<Vec<String>, PageError> {
        Ok(self.lock().current.anchors.clone())
    }

    async fn metrics(&self) -> Result<PageMetrics, PageError> {
        Ok(PageMetrics {
            scroll_height: 2400,
            ..PageMetrics::default()
        })
    }

    async fn scroll_to(&self, _y: i64) -> Result<(), PageError> {
        Ok(())
    }

    async fn move_pointer(&self, _x: f64, _y: f64) -> Result<(), PageError> {
        Ok(())
    }

    async fn release(&mut self) -> Vec<ReleaseStep> {
        let mut inner = self.lock();
        inner.calls.push(Call::Release);
        inner.closed = true;
        ["page", "context", "browser", "engine"]
            .into_iter()
            .map(ReleaseStep::ok)
            .collect()
    }
}

/// A profile page in the site's usual text layout.
pub const PROFILE_TEXT: &str = "\
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
";
