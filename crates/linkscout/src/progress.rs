// Copyright 2026 Linkscout Contributors
// SPDX-License-Identifier: Apache-2.0

//! Progress events and broadcast channel for long-running workflows.
//!
//! Discovery, batch scraping, and the session emit `ProgressEvent`s through a
//! `tokio::sync::broadcast` channel to any subscriber (the CLI progress bar,
//! tests). When no subscriber exists, events are silently dropped.

use serde::{Deserialize, Serialize};

/// A progress event emitted during a workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// The run this event belongs to.
    pub run_id: String,
    /// Monotonically increasing sequence number.
    pub seq: u64,
    /// The kind of progress event.
    pub event: ProgressEventKind,
}

/// The specific kind of progress event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProgressEventKind {
    /// A listing page was harvested during discovery.
    DiscoveryPage { page: u32, collected: u32 },
    /// A batch of profiles is about to be scraped.
    BatchStarted { total: u32 },
    /// Work on one profile began.
    ProfileStarted { index: u32, url: String },
    /// One profile finished.
    ProfileFinished {
        index: u32,
        url: String,
        outcome: ProfileOutcomeKind,
        completeness: Option<u8>,
    },
    /// The batch finished.
    BatchComplete {
        succeeded: u32,
        failed: u32,
        skipped: u32,
        elapsed_ms: u64,
    },
    /// A person has to act in the browser window.
    InterventionRequired {
        reason: String,
        url: String,
        ceiling_secs: u64,
    },
    /// A non-fatal warning occurred.
    Warning { message: String },
}

/// Coarse per-profile result carried by [`ProgressEventKind::ProfileFinished`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileOutcomeKind {
    Scraped,
    AlreadyCompleted,
    Restricted,
    Failed,
}

impl std::fmt::Display for ProfileOutcomeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scraped => write!(f, "scraped"),
            Self::AlreadyCompleted => write!(f, "already completed"),
            Self::Restricted => write!(f, "restricted"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Sender handle for emitting progress events.
pub type ProgressSender = tokio::sync::broadcast::Sender<ProgressEvent>;

/// Receiver handle for consuming progress events.
pub type ProgressReceiver = tokio::sync::broadcast::Receiver<ProgressEvent>;

/// Create a new progress broadcast channel with a bounded buffer.
pub fn channel() -> (ProgressSender, ProgressReceiver) {
    tokio::sync::broadcast::channel(256)
}

/// Emitter bound to one run: owns the sequence counter.
#[derive(Debug, Clone, Default)]
pub struct Progress {
    tx: Option<ProgressSender>,
    run_id: String,
    seq: u64,
}

impl Progress {
    pub fn new(tx: Option<ProgressSender>, run_id: impl Into<String>) -> Self {
        Self {
            tx,
            run_id: run_id.into(),
            seq: 0,
        }
    }

    /// Emitter that drops everything.
    pub fn silent() -> Self {
        Self::default()
    }

    /// Emit an event, ignoring send errors (no receivers listening).
    pub fn emit(&mut self, event: ProgressEventKind) {
        if let Some(ref sender) = self.tx {
            self.seq += 1;
            let _ = sender.send(ProgressEvent {
                run_id: self.run_id.clone(),
                seq: self.seq,
                event,
            });
        }
    }
}
