// Copyright 2026 Linkscout Contributors
// SPDX-License-Identifier: Apache-2.0

//! Terminal rendering: banners, summaries, and the live progress bar.
//!
//! Everything here writes to stderr so that stdout stays free for
//! machine-readable output such as shell completions.

use crate::app::RunReport;
use crate::progress::{ProfileOutcomeKind, ProgressEventKind, ProgressReceiver};
use crate::store::StoreStats;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

const TICKS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

pub fn banner() {
    eprintln!();
    eprintln!(
        "  \x1b[32m\u{25c9}\x1b[0m \x1b[1mlinkscout v{}\x1b[0m \x1b[90mpaced profile collection\x1b[0m",
        env!("CARGO_PKG_VERSION")
    );
    eprintln!();
}

pub fn section(title: &str) {
    eprintln!();
    eprintln!("  \x1b[1m{title}\x1b[0m");
    eprintln!();
}

pub fn info(message: &str) {
    eprintln!("  {message}");
}

pub fn warn(message: &str) {
    eprintln!("  \x1b[33m!\x1b[0m {message}");
}

pub fn print_stats(stats: &StoreStats, db_size: u64) {
    section("Database statistics");
    eprintln!("    Total profiles:   {}", stats.total);
    eprintln!("    Completed:        {}", stats.completed);
    eprintln!("    Failed:           {}", stats.failed);
    eprintln!("    Pending:          {}", stats.pending);
    eprintln!("    Skipped:          {}", stats.skipped);
    eprintln!("    Success rate:     {:.1}%", stats.success_rate);
    eprintln!("    Avg completeness: {:.1}%", stats.mean_completeness);
    eprintln!("    Database size:    {}", human_bytes(db_size));
    eprintln!();
}

pub fn print_report(report: &RunReport) {
    let s = &report.summary;
    section("Run summary");
    eprintln!("    Discovered:        {}", report.found);
    eprintln!("    Scraped:           {}", s.succeeded);
    eprintln!("    Failed:            {}", s.failed);
    eprintln!("    Skipped:           {}", s.skipped);
    eprintln!("    Already completed: {}", s.already_completed);
    eprintln!("    Elapsed:           {}", human_duration(s.elapsed));
    if let Some(v) = &report.validation {
        eprintln!(
            "    Valid records:     {}/{} (avg score {:.1}, avg completeness {:.1}%)",
            v.valid, v.total, v.mean_score, v.mean_completeness
        );
    }
    if let Some(reason) = &s.aborted {
        eprintln!("    \x1b[31mStopped early:\x1b[0m {reason}");
    }
    print_exports(&report.exported);
}

pub fn print_exports(paths: &[PathBuf]) {
    if paths.is_empty() {
        eprintln!("    No files exported.");
    }
    for path in paths {
        eprintln!("    Exported \x1b[36m{}\x1b[0m", path.display());
    }
    eprintln!();
}

/// `1.5 KB`, `3.2 MB`.
pub fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

/// `42s`, `3m 05s`, `1h 02m`.
pub fn human_duration(d: Duration) -> String {
    let secs = d.as_secs();
    match secs {
        0..=59 => format!("{secs}s"),
        60..=3599 => format!("{}m {:02}s", secs / 60, secs % 60),
        _ => format!("{}h {:02}m", secs / 3600, (secs % 3600) / 60),
    }
}

/// The line printed above the bar for an event, if any.
pub fn event_line(event: &ProgressEventKind) -> Option<String> {
    match event {
        ProgressEventKind::ProfileFinished {
            outcome: ProfileOutcomeKind::Scraped,
            url,
            completeness,
            ..
        } => Some(format!("\x1b[32m✓\x1b[0m {url} ({}%)", completeness.unwrap_or(0))),
        ProgressEventKind::ProfileFinished {
            outcome: ProfileOutcomeKind::Restricted,
            url,
            ..
        } => Some(format!("\x1b[33m-\x1b[0m {url} (restricted)")),
        ProgressEventKind::ProfileFinished {
            outcome: ProfileOutcomeKind::Failed,
            url,
            ..
        } => Some(format!("\x1b[31m✗\x1b[0m {url}")),
        ProgressEventKind::InterventionRequired {
            reason,
            url,
            ceiling_secs,
        } => Some(format!(
            "\x1b[33m!\x1b[0m {reason} at {url}: resolve it in the browser window within {}",
            human_duration(Duration::from_secs(*ceiling_secs))
        )),
        ProgressEventKind::Warning { message } => Some(format!("\x1b[33m!\x1b[0m {message}")),
        _ => None,
    }
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_chars(TICKS)
        .template("  {spinner:.cyan} {msg}")
    {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn batch_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar()
        .tick_chars(TICKS)
        .template("  {spinner:.green} [{bar:40.green/dim}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("█▓░"));
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Render events until every sender is dropped.
pub fn spawn_progress(mut rx: ProgressReceiver) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut bar: Option<ProgressBar> = None;
        loop {
            let event = match rx.recv().await {
                Ok(event) => event.event,
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            };

            match &event {
                ProgressEventKind::DiscoveryPage { page, collected } => {
                    let pb = bar.get_or_insert_with(spinner);
                    pb.set_message(format!("listing page {page}: {collected} profiles found"));
                }
                ProgressEventKind::BatchStarted { total } => {
                    if let Some(pb) = bar.take() {
                        pb.finish_and_clear();
                    }
                    bar = Some(batch_bar(u64::from(*total)));
                }
                ProgressEventKind::ProfileStarted { url, .. } => {
                    if let Some(pb) = &bar {
                        pb.set_message(url.clone());
                    }
                }
                ProgressEventKind::ProfileFinished { .. } => {
                    if let Some(pb) = &bar {
                        pb.inc(1);
                    }
                }
                ProgressEventKind::BatchComplete { .. } => {
                    if let Some(pb) = bar.take() {
                        pb.finish_and_clear();
                    }
                }
                _ => {}
            }

            if let Some(line) = event_line(&event) {
                match &bar {
                    Some(pb) => pb.println(format!("  {line}")),
                    None => eprintln!("  {line}"),
                }
            }
        }
        if let Some(pb) = bar {
            pb.finish_and_clear();
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_bytes() {
        assert_eq!(human_bytes(512), "512 B");
        assert_eq!(human_bytes(1536), "1.5 KB");
        assert_eq!(human_bytes(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn test_human_duration() {
        assert_eq!(human_duration(Duration::from_secs(42)), "42s");
        assert_eq!(human_duration(Duration::from_secs(185)), "3m 05s");
        assert_eq!(human_duration(Duration::from_secs(3720)), "1h 02m");
    }

    #[test]
    fn test_event_lines() {
        let scraped = ProgressEventKind::ProfileFinished {
            index: 1,
            url: "https://www.linkedin.com/in/jane".into(),
            outcome: ProfileOutcomeKind::Scraped,
            completeness: Some(71),
        };
        assert!(event_line(&scraped).unwrap().contains("(71%)"));
        assert!(event_line(&ProgressEventKind::BatchStarted { total: 3 }).is_none());
        let already = ProgressEventKind::ProfileFinished {
            index: 2,
            url: "u".into(),
            outcome: ProfileOutcomeKind::AlreadyCompleted,
            completeness: None,
        };
        assert!(event_line(&already).is_none());
    }

    #[tokio::test]
    async fn test_progress_task_ends_with_senders() {
        let (tx, rx) = crate::progress::channel();
        let handle = spawn_progress(rx);
        let mut progress = crate::progress::Progress::new(Some(tx), "run");
        progress.emit(ProgressEventKind::BatchStarted { total: 1 });
        progress.emit(ProgressEventKind::BatchComplete {
            succeeded: 1,
            failed: 0,
            skipped: 0,
            elapsed_ms: 10,
        });
        drop(progress);
        handle.await.unwrap();
    }
}
