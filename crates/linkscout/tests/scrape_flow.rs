// Copyright 2026 Linkscout Contributors
// SPDX-License-Identifier: Apache-2.0

//! Orchestrator against a scripted page and a real store.

mod common;

use common::{PageState, ScriptedPage, PROFILE_TEXT};
use linkscout::export::{read_csv, split_contact_cell, ExportFormat, Exporter};
use linkscout::journal::{Journal, JournalEntry};
use linkscout::model::ProfileRecord;
use linkscout::progress::{self, Progress, ProfileOutcomeKind, ProgressEventKind};
use linkscout::scrape::{Orchestrator, ScrapeOutcome, ScrapePolicy};
use linkscout::session::SessionPolicy;
use linkscout::store::ProfileStore;

const JANE: &str = "https://www.linkedin.com/in/jane";
const HIDDEN: &str = "https://www.linkedin.com/in/hidden";
const SLOW: &str = "https://www.linkedin.com/in/slow";
const DONE: &str = "https://www.linkedin.com/in/done";

const CONTACT_TEXT: &str = "Contact info\nEmail\njane@acme.com\nPhone\n+1 415 555 0100 (Mobile)";

fn overlay(url: &str) -> String {
    format!("{url}/overlay/contact-info/")
}

fn jane_with_overlay(page: &ScriptedPage) {
    page.add(PageState::new(JANE, PROFILE_TEXT));
    page.add(PageState::new(&overlay(JANE), "Contact info").with_text("[role=\"dialog\"]", CONTACT_TEXT));
}

fn store(dir: &tempfile::TempDir) -> ProfileStore {
    ProfileStore::open(&dir.path().join("linkscout.db")).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_profile_with_contact_overlay() {
    let page = ScriptedPage::new();
    jane_with_overlay(&page);
    let mut session = page.session(SessionPolicy::default());

    let outcome = Orchestrator::new(ScrapePolicy::default()).scrape_profile(&mut session, JANE).await;
    let record = match outcome {
        ScrapeOutcome::Scraped(record) => record,
        other => panic!("expected a record, got {other:?}"),
    };
    assert_eq!(record.name.as_deref(), Some("Jane Doe"));
    assert_eq!(record.experience.len(), 1);
    assert!(record.completeness > 50);

    let contact = record.contact_info.unwrap();
    assert_eq!(contact.emails, vec!["jane@acme.com".to_string()]);
    assert_eq!(contact.phones, vec!["+1 415 555 0100".to_string()]);
    assert_eq!(contact.github_urls, vec!["N/A".to_string()]);

    assert_eq!(page.visits(JANE), 2, "returns to the profile after the overlay");
    assert_eq!(page.current_url_now(), JANE);
}

#[tokio::test(start_paused = true)]
async fn test_contact_falls_back_to_modal() {
    let page = ScriptedPage::new();
    let modal = PageState::new(JANE, PROFILE_TEXT).with_text(".pv-contact-info", CONTACT_TEXT);
    page.add(PageState::new(JANE, PROFILE_TEXT).with_click("a[href*=\"/overlay/contact-info\"]", modal));
    let mut session = page.session(SessionPolicy::default());

    let outcome = Orchestrator::new(ScrapePolicy::default()).scrape_profile(&mut session, JANE).await;
    let record = match outcome {
        ScrapeOutcome::Scraped(record) => record,
        other => panic!("expected a record, got {other:?}"),
    };
    assert_eq!(record.contact_info.unwrap().emails, vec!["jane@acme.com".to_string()]);
    assert_eq!(page.current_url_now(), JANE);
}

#[tokio::test(start_paused = true)]
async fn test_restricted_profile_is_skipped_without_retry() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);
    let mut journal = Journal::open(&dir.path().join("journal.jsonl")).unwrap();
    let page = ScriptedPage::new();
    page.add(PageState::new(HIDDEN, "Jane Doe\nThis profile is not available\nGo to your feed"));
    let mut session = page.session(SessionPolicy::default());
    store.enqueue(&[HIDDEN.to_string()]).unwrap();

    let summary = Orchestrator::new(ScrapePolicy::default())
        .scrape_batch(&mut session, &[HIDDEN.to_string()], &store, Some(&mut journal))
        .await;

    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.succeeded, 0);
    assert!(summary.records.is_empty());
    assert_eq!(store.retry_count(HIDDEN).unwrap(), Some(0));
    assert!(store.pending(10).unwrap().is_empty());
    assert_eq!(page.visits(&overlay(HIDDEN)), 0);

    let lines = std::fs::read_to_string(journal.path()).unwrap();
    let entry: JournalEntry = serde_json::from_str(lines.lines().next().unwrap()).unwrap();
    assert_eq!(entry.outcome, ProfileOutcomeKind::Restricted);
    assert_eq!(entry.detail.as_deref(), Some("profile is not available"));
}

#[tokio::test(start_paused = true)]
async fn test_batch_continues_past_failures() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);
    let mut done = ProfileRecord::new(DONE);
    done.name = Some("Done Already".into());
    store.record_success(&done).unwrap();

    let page = ScriptedPage::new();
    jane_with_overlay(&page);
    page.add(PageState::new(SLOW, PROFILE_TEXT)).time_out(SLOW, 10);
    let (tx, mut rx) = progress::channel();
    let mut session = page
        .session(SessionPolicy::default())
        .with_progress(Progress::new(Some(tx), "batch"));

    let urls = vec![DONE.to_string(), SLOW.to_string(), JANE.to_string()];
    let summary = Orchestrator::new(ScrapePolicy::default())
        .scrape_batch(&mut session, &urls, &store, None)
        .await;

    assert_eq!(summary.total, 3);
    assert_eq!(summary.already_completed, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.succeeded, 1);
    assert!(summary.aborted.is_none());
    assert_eq!(page.visits(DONE), 0);
    assert_eq!(store.retry_count(SLOW).unwrap(), Some(1));
    assert!(store.is_completed(JANE).unwrap());
    assert_eq!(store.pending(10).unwrap(), vec![SLOW.to_string()]);

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event.event);
    }
    assert!(matches!(events.first(), Some(ProgressEventKind::BatchStarted { total: 3 })));
    assert!(matches!(
        events.last(),
        Some(ProgressEventKind::BatchComplete {
            succeeded: 1,
            failed: 1,
            skipped: 0,
            ..
        })
    ));
}

#[tokio::test(start_paused = true)]
async fn test_lost_session_stops_batch() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);
    let page = ScriptedPage::new();
    jane_with_overlay(&page);
    page.close();
    let mut session = page.session(SessionPolicy::default());

    let urls = vec![SLOW.to_string(), JANE.to_string()];
    let summary = Orchestrator::new(ScrapePolicy::default())
        .scrape_batch(&mut session, &urls, &store, None)
        .await;

    assert!(summary.aborted.is_some());
    assert_eq!(summary.failed, 1);
    assert_eq!(page.visits(JANE), 0);
    assert_eq!(store.retry_count(SLOW).unwrap(), Some(1));
}

#[tokio::test(start_paused = true)]
async fn test_scraped_contacts_survive_csv_export() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);
    let page = ScriptedPage::new();
    jane_with_overlay(&page);
    let mut session = page.session(SessionPolicy::default());

    let summary = Orchestrator::new(ScrapePolicy::default())
        .scrape_batch(&mut session, &[JANE.to_string()], &store, None)
        .await;
    assert_eq!(summary.succeeded, 1);

    let exporter = Exporter::new(dir.path().join("exports"));
    let records = store.completed_records(0).unwrap();
    let paths = exporter.export(&records, 0, &[ExportFormat::Csv], "profiles").unwrap();
    let rows = read_csv(&paths[0]).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(split_contact_cell(&rows[0]["contact_emails"]), vec!["jane@acme.com".to_string()]);
    assert_eq!(split_contact_cell(&rows[0]["contact_phones"]), vec!["+1 415 555 0100".to_string()]);
    assert_eq!(rows[0]["contact_skype"], "N/A");
}

#[tokio::test(start_paused = true)]
async fn test_page_scan_keeps_only_own_profile_url() {
    let page = ScriptedPage::new();
    let html = format!(
        r#"<main><a href="{JANE}/">Jane Doe</a></main>
        <aside>People also viewed
        <a href="https://www.linkedin.com/in/bob-smith/">Bob</a>
        <a href="https://www.linkedin.com/in/carol-x">Carol</a></aside>"#
    );
    page.add(PageState::new(JANE, PROFILE_TEXT).with_html(&html));
    let mut session = page.session(SessionPolicy::default());

    let outcome = Orchestrator::new(ScrapePolicy::default()).scrape_profile(&mut session, JANE).await;
    let record = match outcome {
        ScrapeOutcome::Scraped(record) => record,
        other => panic!("expected a record, got {other:?}"),
    };
    let contact = record.contact_info.unwrap();
    assert_eq!(contact.linkedin_urls, vec![JANE.to_string()]);
    assert_eq!(contact.linkedin_url, JANE);
    assert_eq!(contact.emails, vec!["N/A".to_string()]);
    assert_eq!(page.current_url_now(), JANE);
}

#[tokio::test(start_paused = true)]
async fn test_page_scan_without_own_link_uses_profile_url() {
    let page = ScriptedPage::new();
    let html = r#"<aside><a href="https://www.linkedin.com/in/bob-smith/">Bob</a></aside>"#;
    page.add(PageState::new(JANE, PROFILE_TEXT).with_html(html));
    let mut session = page.session(SessionPolicy::default());

    let outcome = Orchestrator::new(ScrapePolicy::default()).scrape_profile(&mut session, JANE).await;
    let record = match outcome {
        ScrapeOutcome::Scraped(record) => record,
        other => panic!("expected a record, got {other:?}"),
    };
    assert_eq!(record.contact_info.unwrap().linkedin_urls, vec![JANE.to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_long_contact_lists_survive_csv_export() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);
    let emails: Vec<String> = (0..12).map(|i| format!("person{i}@example-company.com")).collect();
    let dialog = format!("Contact info\nEmail\n{}", emails.join("\n"));
    let page = ScriptedPage::new();
    page.add(PageState::new(JANE, PROFILE_TEXT));
    page.add(PageState::new(&overlay(JANE), "Contact info").with_text("[role=\"dialog\"]", &dialog));
    let mut session = page.session(SessionPolicy::default());

    let summary = Orchestrator::new(ScrapePolicy::default())
        .scrape_batch(&mut session, &[JANE.to_string()], &store, None)
        .await;
    assert_eq!(summary.succeeded, 1);

    let exporter = Exporter::new(dir.path().join("exports"));
    let paths = exporter
        .export(&store.completed_records(0).unwrap(), 0, &[ExportFormat::Csv], "profiles")
        .unwrap();
    let rows = read_csv(&paths[0]).unwrap();
    let mut actual = split_contact_cell(&rows[0]["contact_emails"]);
    actual.sort();
    let mut expected = emails;
    expected.sort();
    assert_eq!(actual, expected);
}

#[tokio::test(start_paused = true)]
async fn test_failed_return_to_profile_emits_warning() {
    let page = ScriptedPage::new();
    jane_with_overlay(&page);
    page.time_out_later(JANE, 1, 10);
    let (tx, mut rx) = progress::channel();
    let mut session = page
        .session(SessionPolicy::default())
        .with_progress(Progress::new(Some(tx), "warn"));

    let outcome = Orchestrator::new(ScrapePolicy::default()).scrape_profile(&mut session, JANE).await;
    let record = match outcome {
        ScrapeOutcome::Scraped(record) => record,
        other => panic!("expected a record, got {other:?}"),
    };
    assert_eq!(record.contact_info.unwrap().emails, vec!["jane@acme.com".to_string()]);

    let mut warnings = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let ProgressEventKind::Warning { message } = event.event {
            warnings.push(message);
        }
    }
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains(JANE), "{warnings:?}");
}
