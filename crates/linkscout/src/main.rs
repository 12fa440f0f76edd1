// Copyright 2026 Linkscout Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use linkscout::app::App;
use linkscout::cli::{menu, output};
use linkscout::config::AppConfig;
use linkscout::{progress, telemetry};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "linkscout",
    about = "linkscout: paced, resumable profile collection",
    version,
    after_help = "Run 'linkscout <command> --help' for details on each command.\nRun 'linkscout' with no command to open the interactive menu."
)]
struct Cli {
    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Settings file (default: $LINKSCOUT_CONFIG or config/settings.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive menu
    Menu,
    /// Search for people and scrape every profile found
    Search {
        /// Search keywords
        query: String,
        /// Narrow results to a location
        #[arg(long)]
        location: Option<String>,
        /// Maximum number of profiles (default: scraping.max_profiles_per_search)
        #[arg(long)]
        max: Option<usize>,
    },
    /// Scrape the signed-in account's connections
    Connections {
        #[arg(long, default_value = "50")]
        max: usize,
    },
    /// Retry pending and failed profiles below the retry cap
    Resume {
        #[arg(long, default_value = "50")]
        limit: usize,
    },
    /// Export stored profiles as JSON and CSV
    Export {
        /// Minimum completeness (default: export.min_completeness)
        #[arg(long)]
        min_completeness: Option<u8>,
    },
    /// Show database statistics
    Stats,
    /// Delete failed profiles older than a number of days
    Cleanup {
        #[arg(long, default_value = "30")]
        days: u32,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: Shell,
    },
}

async fn run(cli: Cli) -> Result<()> {
    if let Some(Commands::Completions { shell }) = &cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(*shell, &mut cmd, "linkscout", &mut std::io::stdout());
        return Ok(());
    }

    let config = AppConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    let (tx, rx) = progress::channel();
    let renderer = output::spawn_progress(rx);
    let app = App::open(Arc::new(config))?.with_progress(tx);

    let result = match cli.command {
        None | Some(Commands::Menu) => menu::run(&app).await,
        Some(Commands::Search { query, location, max }) => {
            let max = max.unwrap_or(app.config().settings.scraping.max_profiles_per_search);
            app.search_and_scrape(&query, location.as_deref(), max)
                .await
                .map(|report| output::print_report(&report))
        }
        Some(Commands::Connections { max }) => app
            .scrape_connections(max)
            .await
            .map(|report| output::print_report(&report)),
        Some(Commands::Resume { limit }) => app.resume_pending(limit).await.map(|report| {
            if report.found == 0 {
                output::info("Nothing pending.");
            } else {
                output::print_report(&report);
            }
        }),
        Some(Commands::Export { min_completeness }) => app
            .export_existing(min_completeness)
            .map(|paths| output::print_exports(&paths)),
        Some(Commands::Stats) => app.stats().map(|(stats, size)| output::print_stats(&stats, size)),
        Some(Commands::Cleanup { days }) => app
            .cleanup(days)
            .map(|n| output::info(&format!("Removed {n} failed profiles."))),
        Some(Commands::Completions { .. }) => Ok(()),
    };

    drop(app);
    let _ = renderer.await;
    result
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    telemetry::init(cli.verbose, cli.log_json);

    if let Err(e) = run(cli).await {
        eprintln!("  Error: {e:#}");
        std::process::exit(1);
    }
}
