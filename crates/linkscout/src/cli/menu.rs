// Copyright 2026 Linkscout Contributors
// SPDX-License-Identifier: Apache-2.0

//! Interactive menu.
//!
//! Numbered choices, each asking for a few scalar inputs. Blank input takes
//! the default shown in brackets.

use super::output;
use crate::app::App;
use anyhow::Result;
use rustyline::config::Config;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::str::FromStr;

/// Top-level menu entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    SearchAndScrape,
    ScrapeConnections,
    ResumePending,
    Export,
    Stats,
    Cleanup,
    Exit,
}

const ENTRIES: &[(&str, &str)] = &[
    ("1", "Search and scrape profiles"),
    ("2", "Scrape my connections"),
    ("3", "Resume pending profiles"),
    ("4", "Export existing data"),
    ("5", "Show statistics"),
    ("6", "Clean up old data"),
    ("0", "Exit"),
];

impl MenuChoice {
    pub fn from_input(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "1" => Some(Self::SearchAndScrape),
            "2" => Some(Self::ScrapeConnections),
            "3" => Some(Self::ResumePending),
            "4" => Some(Self::Export),
            "5" => Some(Self::Stats),
            "6" => Some(Self::Cleanup),
            "0" | "q" | "quit" | "exit" => Some(Self::Exit),
            _ => None,
        }
    }
}

/// `input` parsed as `T`, or `default` when blank or unparsable.
pub fn parse_or<T: FromStr>(input: &str, default: T) -> T {
    let input = input.trim();
    if input.is_empty() {
        return default;
    }
    input.parse().unwrap_or(default)
}

/// `input` trimmed, or `None` when blank.
pub fn non_blank(input: &str) -> Option<String> {
    let input = input.trim();
    (!input.is_empty()).then(|| input.to_string())
}

enum Line {
    Text(String),
    Cancel,
    Quit,
}

fn read(rl: &mut DefaultEditor, prompt: &str) -> Result<Line> {
    match rl.readline(prompt) {
        Ok(line) => Ok(Line::Text(line)),
        Err(ReadlineError::Interrupted) => Ok(Line::Cancel),
        Err(ReadlineError::Eof) => Ok(Line::Quit),
        Err(e) => Err(e.into()),
    }
}

/// Ask one question. `None` when the user cancels.
fn ask(rl: &mut DefaultEditor, label: &str, default: &str) -> Result<Option<String>> {
    let prompt = if default.is_empty() {
        format!("  {label}: ")
    } else {
        format!("  {label} [{default}]: ")
    };
    Ok(match read(rl, &prompt)? {
        Line::Text(text) => Some(text),
        Line::Cancel | Line::Quit => None,
    })
}

fn print_menu() {
    eprintln!();
    for (key, label) in ENTRIES {
        eprintln!("    \x1b[36m{key}\x1b[0m  {label}");
    }
    eprintln!();
}

/// Run the menu until the user exits.
pub async fn run(app: &App) -> Result<()> {
    output::banner();
    let config = Config::builder().auto_add_history(true).build();
    let mut rl = DefaultEditor::with_config(config)?;
    let defaults = &app.config().settings;

    loop {
        print_menu();
        let choice = match read(&mut rl, " \x1b[36mlinkscout>\x1b[0m ")? {
            Line::Text(text) if text.trim().is_empty() => continue,
            Line::Text(text) => text,
            Line::Cancel => {
                eprintln!("  \x1b[90m(Ctrl+C)\x1b[0m Choose \x1b[1m0\x1b[0m to exit.");
                continue;
            }
            Line::Quit => break,
        };
        let Some(choice) = MenuChoice::from_input(&choice) else {
            output::warn(&format!("Unknown choice '{}'.", choice.trim()));
            continue;
        };

        let result = match choice {
            MenuChoice::Exit => break,
            MenuChoice::SearchAndScrape => {
                let Some(query) = ask(&mut rl, "Search query", "")?.and_then(|q| non_blank(&q)) else {
                    output::warn("A search query is required.");
                    continue;
                };
                let Some(location) = ask(&mut rl, "Location (optional)", "")? else {
                    continue;
                };
                let default_max = defaults.scraping.max_profiles_per_search;
                let Some(max) = ask(&mut rl, "Maximum profiles", &default_max.to_string())? else {
                    continue;
                };
                let max = parse_or(&max, default_max).max(1);
                output::section(&format!("Searching for \"{query}\""));
                app.search_and_scrape(&query, non_blank(&location).as_deref(), max)
                    .await
                    .map(|report| output::print_report(&report))
            }
            MenuChoice::ScrapeConnections => {
                let Some(max) = ask(&mut rl, "Maximum connections", "50")? else {
                    continue;
                };
                output::section("Scraping connections");
                app.scrape_connections(parse_or(&max, 50usize).max(1))
                    .await
                    .map(|report| output::print_report(&report))
            }
            MenuChoice::ResumePending => {
                let Some(limit) = ask(&mut rl, "Maximum profiles", "50")? else {
                    continue;
                };
                output::section("Resuming pending profiles");
                app.resume_pending(parse_or(&limit, 50usize).max(1)).await.map(|report| {
                    if report.found == 0 {
                        output::info("Nothing pending.");
                    } else {
                        output::print_report(&report);
                    }
                })
            }
            MenuChoice::Export => {
                let default_floor = defaults.export.min_completeness;
                let Some(floor) = ask(&mut rl, "Minimum completeness", &default_floor.to_string())? else {
                    continue;
                };
                let floor = parse_or(&floor, default_floor).min(100);
                app.export_existing(Some(floor)).map(|paths| {
                    output::section("Export");
                    output::print_exports(&paths);
                })
            }
            MenuChoice::Stats => app.stats().map(|(stats, size)| {
                output::print_stats(&stats, size);
                if let Ok(failed) = app.store().failed(5) {
                    for f in failed {
                        eprintln!(
                            "    \x1b[31m✗\x1b[0m {} (retries {}) {}",
                            f.profile_url,
                            f.retry_count,
                            f.error.unwrap_or_default()
                        );
                    }
                }
            }),
            MenuChoice::Cleanup => {
                let Some(days) = ask(&mut rl, "Delete failed profiles older than (days)", "30")? else {
                    continue;
                };
                app.cleanup(parse_or(&days, 30u32))
                    .map(|n| output::info(&format!("Removed {n} failed profiles.")))
            }
        };

        if let Err(e) = result {
            eprintln!("  Error: {e:#}");
        }
    }

    eprintln!("  \x1b[90mGoodbye.\x1b[0m");
    Ok(())
}
