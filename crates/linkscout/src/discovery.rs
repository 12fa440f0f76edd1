// Copyright 2026 Linkscout Contributors
// SPDX-License-Identifier: Apache-2.0

//! Discovery agents: collect profile URLs from search results or the
//! connections list.
//!
//! Both walk a paginated listing: scroll, harvest anchors, click "Next",
//! until enough profiles are collected, the listing ends, or the page cap
//! is passed.

use crate::pacing::ScrollPattern;
use crate::progress::ProgressEventKind;
use crate::session::{NavigationRequest, Session};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

const NEXT_BUTTON: &str = "button[aria-label*=\"Next\"]";

/// Path fragments of links that are never profiles.
const EXCLUDED_PATHS: &[&str] = &["/search/results/", "/notifications/", "/messaging/", "/overlay/"];

/// Listing pages to visit for `requested` profiles at about ten per page.
pub fn page_cap(requested: usize) -> usize {
    requested.div_ceil(10) + 2
}

/// Absolute, query-free profile URL for an anchor `href`, or `None` when the
/// link is not a profile.
///
/// Sub-pages such as `/in/jane/details/skills` collapse to `/in/jane`.
/// Regional hosts map to the base host and the slug is lowercased.
pub fn canonicalize_profile_link(base: &Url, href: &str) -> Option<String> {
    let url = base.join(href.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    let host = url.host_str()?.to_ascii_lowercase();
    let site = base.host_str()?.trim_start_matches("www.").to_ascii_lowercase();
    if host != site && !host.ends_with(&format!(".{site}")) {
        return None;
    }

    let path = url.path().to_string();
    if EXCLUDED_PATHS.iter().any(|p| path.contains(p)) {
        return None;
    }
    let mut segments = path.split('/').filter(|s| !s.is_empty());
    if segments.next() != Some("in") {
        return None;
    }
    let slug = segments.next()?.to_lowercase();

    let mut canonical = base.clone();
    canonical.set_path(&format!("/in/{slug}"));
    canonical.set_query(None);
    canonical.set_fragment(None);
    Some(canonical.to_string())
}

/// Listing walk settings.
#[derive(Debug, Clone)]
pub struct DiscoveryPolicy {
    /// Navigation to the search results page.
    pub search_nav: NavigationRequest,
    /// Navigation to the network and connections pages.
    pub connections_nav: NavigationRequest,
    pub scroll: ScrollPattern,
    pub human_behavior: bool,
}

impl Default for DiscoveryPolicy {
    fn default() -> Self {
        Self {
            search_nav: NavigationRequest::new(Duration::from_secs(60), 5),
            connections_nav: NavigationRequest::new(Duration::from_secs(60), 2),
            scroll: ScrollPattern::Natural,
            human_behavior: true,
        }
    }
}

/// Collects profile URLs on one site.
#[derive(Debug, Clone)]
pub struct Discovery {
    base: Url,
    policy: DiscoveryPolicy,
}

impl Discovery {
    pub fn new(base: Url, policy: DiscoveryPolicy) -> Self {
        Self { base, policy }
    }

    /// People search for `query`, optionally narrowed to a location.
    pub async fn search(&self, session: &mut Session, query: &str, location: Option<&str>, max: usize) -> Vec<String> {
        let mut url = match self.base.join("/search/results/people/") {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "invalid search url");
                return Vec::new();
            }
        };
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("keywords", query);
            if let Some(location) = location.filter(|l| !l.trim().is_empty()) {
                pairs.append_pair("location", location);
            }
        }

        info!(query, max, "searching for profiles");
        if let Some(failure) = session.navigate(url.as_str(), self.policy.search_nav).await.failure() {
            warn!(query, reason = %failure, "search page unreachable");
            return Vec::new();
        }
        session.pacer().pause(2.0, 4.0).await;

        let found = self.collect(session, max).await;
        info!(query, found = found.len(), "search complete");
        found
    }

    /// The signed-in account's connections.
    pub async fn connections(&self, session: &mut Session, max: usize) -> Vec<String> {
        for path in ["/mynetwork/", "/mynetwork/invite-connect/connections/"] {
            let url = match self.base.join(path) {
                Ok(url) => url,
                Err(e) => {
                    warn!(error = %e, "invalid network url");
                    return Vec::new();
                }
            };
            if let Some(failure) = session.navigate(url.as_str(), self.policy.connections_nav).await.failure() {
                warn!(url = %url, reason = %failure, "network page unreachable");
                return Vec::new();
            }
            session.pacer().pause(2.0, 4.0).await;
        }

        info!(max, "collecting connections");
        let found = self.collect(session, max).await;
        info!(found = found.len(), "connections collected");
        found
    }

    /// Walk the listing the session is on.
    async fn collect(&self, session: &mut Session, max: usize) -> Vec<String> {
        let mut found: Vec<String> = Vec::new();
        let max_pages = page_cap(max);
        let mut page = 1;

        while found.len() < max && page <= max_pages {
            if self.policy.human_behavior {
                session.simulate_reading(self.policy.scroll).await;
            }
            session.pacer().pause(2.0, 4.0).await;

            let hrefs = match session.page().anchor_hrefs().await {
                Ok(hrefs) => hrefs,
                Err(e) => {
                    warn!(page, error = %e, "could not read links");
                    Vec::new()
                }
            };
            for link in hrefs.iter().filter_map(|h| canonicalize_profile_link(&self.base, h)) {
                if found.len() >= max {
                    break;
                }
                if !found.contains(&link) {
                    found.push(link);
                }
            }
            debug!(page, collected = found.len(), "listing page harvested");
            session.progress().emit(ProgressEventKind::DiscoveryPage {
                page: page as u32,
                collected: found.len() as u32,
            });

            if found.len() >= max {
                break;
            }
            if !self.next_page(session).await {
                info!(page, "end of listing");
                break;
            }
            page += 1;
            session.pacer().pause(3.0, 6.0).await;
        }

        found
    }

    async fn next_page(&self, session: &mut Session) -> bool {
        match session.page().count(NEXT_BUTTON).await {
            Ok(0) => return false,
            Ok(_) => {}
            Err(e) => {
                debug!(error = %e, "next button lookup failed");
                return false;
            }
        }
        if !session.human_click(NEXT_BUTTON, 0).await {
            return false;
        }
        session.pacer().pause_uniform(2.0, 4.0).await;
        true
    }
}
