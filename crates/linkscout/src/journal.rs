// Copyright 2026 Linkscout Contributors
// SPDX-License-Identifier: Apache-2.0

//! JSONL scrape journal: one line per profile outcome.
//!
//! - Append-only, one JSON object per line
//! - Rotates when the file exceeds `MAX_JOURNAL_SIZE` (10 MB)
//! - Rotated files are named `.1` (newest) through `.5` (oldest)

use crate::progress::ProfileOutcomeKind;
use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Journal size that triggers rotation.
const MAX_JOURNAL_SIZE: u64 = 10 * 1024 * 1024;

/// Number of rotated files kept.
const MAX_ROTATIONS: u32 = 5;

/// One journal line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub timestamp: String,
    pub url: String,
    pub outcome: ProfileOutcomeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completeness: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub duration_ms: u64,
}

impl JournalEntry {
    pub fn now(url: &str, outcome: ProfileOutcomeKind, duration_ms: u64) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            url: url.to_string(),
            outcome,
            completeness: None,
            detail: None,
            duration_ms,
        }
    }
}

/// Append-only JSONL journal with rotation.
pub struct Journal {
    file: File,
    path: PathBuf,
    current_size: u64,
    max_size: u64,
}

impl Journal {
    /// Open or create the journal file.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open journal: {}", path.display()))?;

        let current_size = file.metadata().map(|m| m.len()).unwrap_or(0);

        Ok(Self {
            file,
            path: path.to_path_buf(),
            current_size,
            max_size: MAX_JOURNAL_SIZE,
        })
    }

    /// Override the rotation threshold.
    pub fn with_max_size(mut self, bytes: u64) -> Self {
        self.max_size = bytes;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append an entry, rotating first if the file is full.
    pub fn log(&mut self, entry: &JournalEntry) -> Result<()> {
        if self.current_size >= self.max_size {
            self.rotate()?;
        }

        let json = serde_json::to_string(entry)?;
        writeln!(self.file, "{json}").context("failed to write journal entry")?;
        self.current_size += json.len() as u64 + 1;
        Ok(())
    }

    /// `journal.jsonl` → `.1`, `.1` → `.2`, ..., dropping the oldest.
    fn rotate(&mut self) -> Result<()> {
        self.file.flush()?;

        let oldest = rotation_path(&self.path, MAX_ROTATIONS);
        if oldest.exists() {
            let _ = std::fs::remove_file(&oldest);
        }
        for i in (1..MAX_ROTATIONS).rev() {
            let from = rotation_path(&self.path, i);
            if from.exists() {
                let _ = std::fs::rename(&from, rotation_path(&self.path, i + 1));
            }
        }
        let _ = std::fs::rename(&self.path, rotation_path(&self.path, 1));

        self.file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .context("failed to reopen journal after rotation")?;
        self.current_size = 0;

        Ok(())
    }
}

/// `journal.jsonl.1`, `journal.jsonl.2`, ...
fn rotation_path(base: &Path, index: u32) -> PathBuf {
    let name = format!(
        "{}.{index}",
        base.file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("journal.jsonl")
    );
    base.with_file_name(name)
}
