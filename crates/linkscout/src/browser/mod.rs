// Copyright 2026 Linkscout Contributors
// SPDX-License-Identifier: Apache-2.0

//! Browser abstraction for page automation.
//!
//! Defines the `BrowserPage` trait that the session controller drives. The
//! production backend is Chromium via chromiumoxide; tests substitute a
//! scripted in-memory page.

pub mod chromium;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by a browser page.
#[derive(Debug, Error)]
pub enum PageError {
    /// The operation did not complete within its timeout.
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    /// The page, context, or browser is gone.
    #[error("page closed: {0}")]
    Closed(String),
    /// A script evaluated in the page threw or returned an unusable value.
    #[error("script failed: {0}")]
    Script(String),
    /// Any other DevTools protocol failure.
    #[error("browser protocol error: {0}")]
    Protocol(String),
}

impl PageError {
    /// True for timeouts, which the session retries with a longer budget.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

/// When a navigation counts as finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitCondition {
    /// The DOM has been parsed.
    #[default]
    DomContentLoaded,
    /// The `load` event fired.
    Load,
    /// The document is complete and has stopped requesting resources.
    NetworkIdle,
}

/// Scroll and viewport geometry of the current document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageMetrics {
    /// `document.body.scrollHeight`.
    pub scroll_height: i64,
    /// `window.innerWidth`.
    pub viewport_width: f64,
    /// `window.innerHeight`.
    pub viewport_height: f64,
}

impl Default for PageMetrics {
    fn default() -> Self {
        Self {
            scroll_height: 0,
            viewport_width: 1366.0,
            viewport_height: 768.0,
        }
    }
}

/// Outcome of one step in the ordered resource release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseStep {
    /// Which resource: `page`, `context`, `browser`, or `engine`.
    pub resource: &'static str,
    /// `None` when the release succeeded.
    pub error: Option<String>,
}

impl ReleaseStep {
    pub fn ok(resource: &'static str) -> Self {
        Self {
            resource,
            error: None,
        }
    }

    pub fn failed(resource: &'static str, error: impl ToString) -> Self {
        Self {
            resource,
            error: Some(error.to_string()),
        }
    }
}

/// A single live page the session drives.
///
/// Every method is one suspension point; the session never issues two
/// operations against the same page concurrently.
#[async_trait]
pub trait BrowserPage: Send + Sync {
    /// Navigate to `url`, finishing on `wait` or failing after `timeout`.
    async fn goto(&mut self, url: &str, wait: WaitCondition, timeout: Duration) -> Result<(), PageError>;
    /// Reload the current document.
    async fn reload(&mut self, timeout: Duration) -> Result<(), PageError>;
    /// Wait for the next navigation to complete.
    async fn wait_for_navigation(&mut self, timeout: Duration) -> Result<(), PageError>;
    /// The current URL.
    async fn current_url(&self) -> Result<String, PageError>;
    /// Full serialized HTML of the document.
    async fn html(&self) -> Result<String, PageError>;
    /// Rendered text (`innerText`) of the first element matching `selector`.
    async fn inner_text(&self, selector: &str) -> Result<Option<String>, PageError>;
    /// Evaluate a script and return its JSON result.
    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, PageError>;
    /// Number of elements matching `selector`.
    async fn count(&self, selector: &str) -> Result<usize, PageError>;
    /// Scroll the `index`-th match of `selector` into view and click it.
    ///
    /// Returns `false` when no such element exists or it is disabled.
    async fn click(&self, selector: &str, index: usize) -> Result<bool, PageError>;
    /// Type `text` into the first element matching `selector`.
    async fn type_text(&self, selector: &str, text: &str) -> Result<bool, PageError>;
    /// The raw `href` attribute of every anchor in the document.
    async fn anchor_hrefs(&self) -> Result<Vec<String>, PageError>;
    /// Current scroll geometry.
    async fn metrics(&self) -> Result<PageMetrics, PageError>;
    /// Scroll the window to an absolute vertical offset.
    async fn scroll_to(&self, y: i64) -> Result<(), PageError>;
    /// Move the pointer to viewport coordinates.
    async fn move_pointer(&self, x: f64, y: f64) -> Result<(), PageError>;
    /// Release page, context, browser, and engine in that order.
    ///
    /// Every step is attempted even when an earlier one fails.
    async fn release(&mut self) -> Vec<ReleaseStep>;
}
