// Copyright 2026 Linkscout Contributors
// SPDX-License-Identifier: Apache-2.0

//! SQLite profile store.
//!
//! Profiles are keyed by the SHA-256 of their canonical URL, so each URL
//! has at most one stored copy. Status moves `pending` → `completed`,
//! `failed` (retried until the cap), or `skipped`.

use crate::model::ProfileRecord;
use crate::scrape::ProfileSink;
use chrono::{Duration as ChronoDuration, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Failed profiles with this many attempts are abandoned.
pub const DEFAULT_RETRY_CAP: u32 = 3;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open store at {path}: {source}")]
    Open {
        path: PathBuf,
        source: rusqlite::Error,
    },
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("profile data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Aggregate counts over the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoreStats {
    pub total: u64,
    pub completed: u64,
    pub failed: u64,
    pub pending: u64,
    pub skipped: u64,
    /// Completed as a percentage of all profiles.
    pub success_rate: f64,
    /// Mean completeness of completed profiles.
    pub mean_completeness: f64,
}

/// One failed profile and how often it was tried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedProfile {
    pub profile_url: String,
    pub error: Option<String>,
    pub retry_count: u32,
}

/// Hex SHA-256 of a profile URL, the deduplication key.
pub fn url_hash(url: &str) -> String {
    let digest = Sha256::digest(url.trim().as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Profile store backed by SQLite.
pub struct ProfileStore {
    db: Connection,
    path: PathBuf,
    retry_cap: u32,
}

impl ProfileStore {
    /// Open or create the store, creating parent directories as needed.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let db = Connection::open(path).map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        db.execute_batch(
            "CREATE TABLE IF NOT EXISTS profiles (
                url_hash TEXT PRIMARY KEY,
                profile_url TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                retry_count INTEGER NOT NULL DEFAULT 0,
                data TEXT,
                completeness INTEGER NOT NULL DEFAULT 0,
                error TEXT,
                scraped_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_profiles_status ON profiles(status);
            CREATE INDEX IF NOT EXISTS idx_profiles_created ON profiles(created_at);
            CREATE TABLE IF NOT EXISTS runs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                label TEXT NOT NULL,
                profiles_found INTEGER NOT NULL DEFAULT 0,
                succeeded INTEGER NOT NULL DEFAULT 0,
                failed INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL DEFAULT 'active',
                started_at TEXT NOT NULL,
                completed_at TEXT
            );",
        )?;

        Ok(Self {
            db,
            path: path.to_path_buf(),
            retry_cap: DEFAULT_RETRY_CAP,
        })
    }

    pub fn with_retry_cap(mut self, cap: u32) -> Self {
        self.retry_cap = cap;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Add URLs as pending. Returns how many were new.
    pub fn enqueue(&self, urls: &[String]) -> Result<usize, StoreError> {
        let ts = now();
        let mut stmt = self.db.prepare(
            "INSERT OR IGNORE INTO profiles (url_hash, profile_url, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)",
        )?;
        let mut added = 0;
        for url in urls {
            added += stmt.execute(rusqlite::params![url_hash(url), url.trim(), ts])?;
        }
        debug!(requested = urls.len(), added, "profiles enqueued");
        Ok(added)
    }

    /// Store a scraped record and mark it completed.
    pub fn record_success(&self, record: &ProfileRecord) -> Result<(), StoreError> {
        let data = serde_json::to_string(record)?;
        let ts = now();
        self.db.execute(
            "INSERT INTO profiles (url_hash, profile_url, status, data, completeness, scraped_at, created_at, updated_at)
             VALUES (?1, ?2, 'completed', ?3, ?4, ?5, ?5, ?5)
             ON CONFLICT(url_hash) DO UPDATE SET
                status = 'completed', data = ?3, completeness = ?4, error = NULL,
                scraped_at = ?5, updated_at = ?5",
            rusqlite::params![url_hash(&record.profile_url), record.profile_url, data, record.completeness, ts],
        )?;
        Ok(())
    }

    /// Mark a profile failed and count the attempt.
    pub fn record_failure(&self, url: &str, error: &str) -> Result<(), StoreError> {
        let ts = now();
        self.db.execute(
            "INSERT INTO profiles (url_hash, profile_url, status, retry_count, error, created_at, updated_at)
             VALUES (?1, ?2, 'failed', 1, ?3, ?4, ?4)
             ON CONFLICT(url_hash) DO UPDATE SET
                status = 'failed', retry_count = retry_count + 1, error = ?3, updated_at = ?4",
            rusqlite::params![url_hash(url), url.trim(), error, ts],
        )?;
        Ok(())
    }

    /// Mark a profile skipped without counting an attempt.
    pub fn record_skip(&self, url: &str, reason: &str) -> Result<(), StoreError> {
        let ts = now();
        self.db.execute(
            "INSERT INTO profiles (url_hash, profile_url, status, error, created_at, updated_at)
             VALUES (?1, ?2, 'skipped', ?3, ?4, ?4)
             ON CONFLICT(url_hash) DO UPDATE SET status = 'skipped', error = ?3, updated_at = ?4",
            rusqlite::params![url_hash(url), url.trim(), reason, ts],
        )?;
        Ok(())
    }

    pub fn is_completed(&self, url: &str) -> Result<bool, StoreError> {
        let found = self
            .db
            .query_row(
                "SELECT 1 FROM profiles WHERE url_hash = ?1 AND status = 'completed'",
                rusqlite::params![url_hash(url)],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Retry count of a profile, `None` when unknown.
    pub fn retry_count(&self, url: &str) -> Result<Option<u32>, StoreError> {
        let result = self.db.query_row(
            "SELECT retry_count FROM profiles WHERE url_hash = ?1",
            rusqlite::params![url_hash(url)],
            |row| row.get::<_, u32>(0),
        );
        match result {
            Ok(n) => Ok(Some(n)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Pending profiles plus failed ones still under the retry cap, oldest first.
    pub fn pending(&self, limit: usize) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.db.prepare(
            "SELECT profile_url FROM profiles
             WHERE status = 'pending' OR (status = 'failed' AND retry_count < ?1)
             ORDER BY created_at, rowid
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(rusqlite::params![self.retry_cap, limit as i64], |row| {
            row.get::<_, String>(0)
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn stats(&self) -> Result<StoreStats, StoreError> {
        let mut stats = StoreStats::default();
        let mut stmt = self
            .db
            .prepare("SELECT status, COUNT(*) FROM profiles GROUP BY status")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;
        for row in rows {
            let (status, count) = row?;
            let count = count.max(0) as u64;
            stats.total += count;
            match status.as_str() {
                "completed" => stats.completed = count,
                "failed" => stats.failed = count,
                "pending" => stats.pending = count,
                "skipped" => stats.skipped = count,
                other => warn!(status = other, "unknown profile status"),
            }
        }
        if stats.total > 0 {
            stats.success_rate = stats.completed as f64 / stats.total as f64 * 100.0;
        }
        stats.mean_completeness = self
            .db
            .query_row(
                "SELECT AVG(completeness) FROM profiles WHERE status = 'completed'",
                [],
                |row| row.get::<_, Option<f64>>(0),
            )?
            .unwrap_or(0.0);
        Ok(stats)
    }

    /// Completed records at or above `min_completeness`.
    ///
    /// Rows whose stored JSON no longer parses are logged and skipped.
    pub fn completed_records(&self, min_completeness: u8) -> Result<Vec<ProfileRecord>, StoreError> {
        let mut stmt = self.db.prepare(
            "SELECT profile_url, data FROM profiles
             WHERE status = 'completed' AND completeness >= ?1 AND data IS NOT NULL
             ORDER BY scraped_at",
        )?;
        let rows = stmt.query_map(rusqlite::params![min_completeness], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut records = Vec::new();
        for row in rows {
            let (url, data) = row?;
            match serde_json::from_str::<ProfileRecord>(&data) {
                Ok(record) => records.push(record),
                Err(e) => warn!(url = %url, error = %e, "stored profile data unreadable"),
            }
        }
        Ok(records)
    }

    /// Most recently failed profiles.
    pub fn failed(&self, limit: usize) -> Result<Vec<FailedProfile>, StoreError> {
        let mut stmt = self.db.prepare(
            "SELECT profile_url, error, retry_count FROM profiles
             WHERE status = 'failed'
             ORDER BY updated_at DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(rusqlite::params![limit as i64], |row| {
            Ok(FailedProfile {
                profile_url: row.get(0)?,
                error: row.get(1)?,
                retry_count: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Delete failed profiles created more than `days` days ago.
    pub fn cleanup(&self, days: u32) -> Result<usize, StoreError> {
        let cutoff = (Utc::now() - ChronoDuration::days(i64::from(days)))
            .to_rfc3339_opts(SecondsFormat::Millis, true);
        let deleted = self.db.execute(
            "DELETE FROM profiles WHERE status = 'failed' AND created_at < ?1",
            rusqlite::params![cutoff],
        )?;
        Ok(deleted)
    }

    /// Size of the database file in bytes.
    pub fn db_size(&self) -> Result<u64, StoreError> {
        Ok(std::fs::metadata(&self.path)?.len())
    }

    /// Open a run record and return its id.
    pub fn start_run(&self, label: &str) -> Result<i64, StoreError> {
        self.db.execute(
            "INSERT INTO runs (label, started_at) VALUES (?1, ?2)",
            rusqlite::params![label, now()],
        )?;
        Ok(self.db.last_insert_rowid())
    }

    /// Close a run record with its totals.
    pub fn finish_run(&self, run_id: i64, found: usize, succeeded: usize, failed: usize) -> Result<(), StoreError> {
        self.db.execute(
            "UPDATE runs SET profiles_found = ?2, succeeded = ?3, failed = ?4,
                status = 'completed', completed_at = ?5
             WHERE id = ?1",
            rusqlite::params![run_id, found as i64, succeeded as i64, failed as i64, now()],
        )?;
        Ok(())
    }
}

impl ProfileSink for ProfileStore {
    fn is_completed(&self, url: &str) -> Result<bool, StoreError> {
        ProfileStore::is_completed(self, url)
    }

    fn record_success(&self, record: &ProfileRecord) -> Result<(), StoreError> {
        ProfileStore::record_success(self, record)
    }

    fn record_failure(&self, url: &str, error: &str) -> Result<(), StoreError> {
        ProfileStore::record_failure(self, url, error)
    }

    fn record_skip(&self, url: &str, reason: &str) -> Result<(), StoreError> {
        ProfileStore::record_skip(self, url, reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_temp() -> (tempfile::TempDir, ProfileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::open(&dir.path().join("data").join("test.db")).unwrap();
        (dir, store)
    }

    fn urls(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_url_hash_is_stable_hex() {
        let h = url_hash("https://www.linkedin.com/in/jane");
        assert_eq!(h.len(), 64);
        assert_eq!(h, url_hash(" https://www.linkedin.com/in/jane "));
        assert_ne!(h, url_hash("https://www.linkedin.com/in/joe"));
    }

    #[test]
    fn test_enqueue_ignores_duplicates() {
        let (_dir, store) = open_temp();
        assert_eq!(store.enqueue(&urls(&["a", "b", "c"])).unwrap(), 3);
        assert_eq!(store.enqueue(&urls(&["b", "c", "d", "d"])).unwrap(), 1);
        assert_eq!(store.stats().unwrap().total, 4);
    }

    #[test]
    fn test_success_round_trip() {
        let (_dir, store) = open_temp();
        store.enqueue(&urls(&["https://www.linkedin.com/in/jane"])).unwrap();

        let mut record = ProfileRecord::new("https://www.linkedin.com/in/jane");
        record.name = Some("Jane Doe".into());
        record.skills = vec!["Rust".into()];
        record.refresh_completeness();
        store.record_success(&record).unwrap();

        assert!(store.is_completed("https://www.linkedin.com/in/jane").unwrap());
        assert!(store.pending(10).unwrap().is_empty());
        let stored = store.completed_records(0).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].name.as_deref(), Some("Jane Doe"));
        assert!(store.completed_records(90).unwrap().is_empty());
    }

    #[test]
    fn test_failures_retry_until_cap() {
        let (_dir, store) = open_temp();
        let store = store.with_retry_cap(2);
        store.enqueue(&urls(&["x"])).unwrap();

        store.record_failure("x", "timed out").unwrap();
        assert_eq!(store.pending(10).unwrap(), vec!["x".to_string()]);
        store.record_failure("x", "timed out again").unwrap();
        assert!(store.pending(10).unwrap().is_empty());

        let failed = store.failed(10).unwrap();
        assert_eq!(failed[0].retry_count, 2);
        assert_eq!(failed[0].error.as_deref(), Some("timed out again"));
    }

    #[test]
    fn test_skip_does_not_count_attempt() {
        let (_dir, store) = open_temp();
        store.enqueue(&urls(&["private"])).unwrap();
        store.record_skip("private", "profile is not available").unwrap();
        assert_eq!(store.retry_count("private").unwrap(), Some(0));
        assert!(store.pending(10).unwrap().is_empty());
        assert_eq!(store.stats().unwrap().skipped, 1);
        assert_eq!(store.retry_count("unknown").unwrap(), None);
    }

    #[test]
    fn test_stats() {
        let (_dir, store) = open_temp();
        store.enqueue(&urls(&["a", "b", "c", "d"])).unwrap();
        let mut record = ProfileRecord::new("a");
        record.completeness = 80;
        store.record_success(&record).unwrap();
        record.profile_url = "b".into();
        record.completeness = 40;
        store.record_success(&record).unwrap();
        store.record_failure("c", "boom").unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.pending, 1);
        assert!((stats.success_rate - 50.0).abs() < 1e-9);
        assert!((stats.mean_completeness - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_cleanup_removes_old_failures_only() {
        let (_dir, store) = open_temp();
        store.record_failure("old", "boom").unwrap();
        store.record_failure("new", "boom").unwrap();
        store.record_skip("old-skip", "private").unwrap();
        store
            .db
            .execute(
                "UPDATE profiles SET created_at = '2000-01-01T00:00:00.000Z' WHERE profile_url IN ('old', 'old-skip')",
                [],
            )
            .unwrap();

        assert_eq!(store.cleanup(30).unwrap(), 1);
        assert_eq!(store.stats().unwrap().total, 2);
    }

    #[test]
    fn test_runs_and_size() {
        let (_dir, store) = open_temp();
        let run = store.start_run("search: rust engineer").unwrap();
        store.finish_run(run, 10, 8, 2).unwrap();
        let status: String = store
            .db
            .query_row("SELECT status FROM runs WHERE id = ?1", [run], |r| r.get(0))
            .unwrap();
        assert_eq!(status, "completed");
        assert!(store.db_size().unwrap() > 0);
    }
}
