// Copyright 2026 Linkscout Contributors
// SPDX-License-Identifier: Apache-2.0

//! Workflows behind the command surface.
//!
//! Each browser workflow launches one session, signs in when credentials
//! are configured, does its work, and always releases the browser, also
//! when interrupted with Ctrl-C.

use crate::config::AppConfig;
use crate::discovery::Discovery;
use crate::export::Exporter;
use crate::journal::Journal;
use crate::progress::{Progress, ProgressEventKind, ProgressSender};
use crate::scrape::{BatchSummary, Orchestrator};
use crate::session::Session;
use crate::store::{ProfileStore, StoreStats};
use crate::validate::{BatchValidation, Validator};
use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Where a browser workflow gets its profile URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Search { query: String, location: Option<String> },
    Connections,
    Pending,
}

impl Target {
    fn label(&self) -> String {
        match self {
            Self::Search { query, .. } => format!("search:{query}"),
            Self::Connections => "connections".to_string(),
            Self::Pending => "resume".to_string(),
        }
    }

    fn file_stem(&self) -> String {
        let kind = match self {
            Self::Search { query, .. } => slug(query),
            Self::Connections => "connections".to_string(),
            Self::Pending => "resumed".to_string(),
        };
        format!("profiles_{kind}_{}", Utc::now().format("%Y%m%d_%H%M%S"))
    }
}

/// Lowercase alphanumerics, everything else collapsed to `_`.
pub fn slug(text: &str) -> String {
    let mut out = String::new();
    for ch in text.trim().chars() {
        if ch.is_alphanumeric() {
            out.extend(ch.to_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    let out = out.trim_matches('_');
    if out.is_empty() {
        "query".to_string()
    } else {
        out.chars().take(40).collect()
    }
}

/// What one browser workflow did.
#[derive(Debug, Default)]
pub struct RunReport {
    pub found: usize,
    pub summary: BatchSummary,
    pub validation: Option<BatchValidation>,
    pub exported: Vec<PathBuf>,
}

/// Configuration, store, and progress channel for one process.
pub struct App {
    config: Arc<AppConfig>,
    store: ProfileStore,
    progress: Option<ProgressSender>,
}

impl App {
    pub fn open(config: Arc<AppConfig>) -> Result<Self> {
        let path = &config.settings.database.path;
        let store = ProfileStore::open(path)
            .with_context(|| format!("failed to open database {}", path.display()))?
            .with_retry_cap(config.settings.scraping.retry_cap);
        Ok(Self {
            config,
            store,
            progress: None,
        })
    }

    /// Send progress events of later workflows to `tx`.
    pub fn with_progress(mut self, tx: ProgressSender) -> Self {
        self.progress = Some(tx);
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> &ProfileStore {
        &self.store
    }

    /// Search, then scrape everything found.
    pub async fn search_and_scrape(&self, query: &str, location: Option<&str>, max: usize) -> Result<RunReport> {
        let target = Target::Search {
            query: query.to_string(),
            location: location.map(str::to_string),
        };
        self.run(target, max).await
    }

    pub async fn scrape_connections(&self, max: usize) -> Result<RunReport> {
        self.run(Target::Connections, max).await
    }

    /// Retry pending and retryable failed profiles from the store.
    pub async fn resume_pending(&self, limit: usize) -> Result<RunReport> {
        if self.store.pending(limit)?.is_empty() {
            info!("no pending profiles");
            return Ok(RunReport::default());
        }
        self.run(Target::Pending, limit).await
    }

    /// Export stored completed profiles. `None` uses the configured floor.
    pub fn export_existing(&self, min_completeness: Option<u8>) -> Result<Vec<PathBuf>> {
        let floor = min_completeness.unwrap_or(self.config.settings.export.min_completeness);
        let records = self.store.completed_records(floor)?;
        info!(profiles = records.len(), min_completeness = floor, "exporting stored profiles");
        let stem = format!("profiles_export_{}", Utc::now().format("%Y%m%d_%H%M%S"));
        self.exporter()
            .export(&records, floor, &self.config.settings.export.formats, &stem)
    }

    pub fn stats(&self) -> Result<(StoreStats, u64)> {
        Ok((self.store.stats()?, self.store.db_size()?))
    }

    /// Delete failed profiles older than `days`.
    pub fn cleanup(&self, days: u32) -> Result<usize> {
        let deleted = self.store.cleanup(days)?;
        info!(deleted, days, "old failures removed");
        Ok(deleted)
    }

    fn exporter(&self) -> Exporter {
        Exporter::new(&self.config.settings.export.export_path)
    }

    /// Launch, work, and release the browser whatever happens in between.
    async fn run(&self, target: Target, max: usize) -> Result<RunReport> {
        let label = target.label();
        let options = self.config.launch_options();
        let mut session = Session::launch(&options, self.config.session_policy())
            .await
            .context("could not start the browser")?
            .with_progress(Progress::new(self.progress.clone(), Uuid::new_v4().to_string()));
        info!(workflow = %label, "workflow started");

        let result = interruptible(self.drive(&mut session, &target, max)).await;
        session.cleanup().await;
        result
    }

    async fn drive(&self, session: &mut Session, target: &Target, max: usize) -> Result<RunReport> {
        let config = &self.config;
        if let Some(credentials) = &config.credentials {
            session
                .login(config.base_url.as_str(), credentials, config.scrape_policy().nav)
                .await?;
        } else {
            warn!("no credentials configured, continuing without login");
        }

        let discovery = Discovery::new(config.base_url.clone(), config.discovery_policy());
        let urls = match target {
            Target::Search { query, location } => discovery.search(session, query, location.as_deref(), max).await,
            Target::Connections => discovery.connections(session, max).await,
            Target::Pending => self.store.pending(max)?,
        };
        if urls.is_empty() {
            warn!(workflow = %target.label(), "no profiles found");
            return Ok(RunReport::default());
        }

        let added = self.store.enqueue(&urls)?;
        info!(found = urls.len(), new = added, "profiles queued");
        let run_id = self.store.start_run(&target.label())?;

        let mut journal = match Journal::open(&config.settings.logging.journal_path) {
            Ok(journal) => Some(journal),
            Err(e) => {
                warn!(error = %e, "journal unavailable");
                session.progress().emit(ProgressEventKind::Warning {
                    message: format!("journal unavailable: {e:#}"),
                });
                None
            }
        };

        let orchestrator = Orchestrator::new(config.scrape_policy());
        let summary = orchestrator
            .scrape_batch(session, &urls, &self.store, journal.as_mut())
            .await;
        self.store
            .finish_run(run_id, urls.len(), summary.succeeded, summary.failed)?;

        let validation = Validator::for_site(&config.base_url).validate_batch(&summary.records);
        let exported = if summary.records.is_empty() {
            Vec::new()
        } else {
            self.exporter().export(
                &summary.records,
                config.settings.export.min_completeness,
                &config.settings.export.formats,
                &target.file_stem(),
            )?
        };

        Ok(RunReport {
            found: urls.len(),
            summary,
            validation: Some(validation),
            exported,
        })
    }
}

/// Run `work` until it finishes or Ctrl-C arrives.
///
/// On interrupt the in-flight step is dropped.
pub async fn interruptible<T>(work: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::select! {
        result = work => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupted, releasing the browser");
            Err(anyhow!("interrupted by user"))
        }
    }
}
