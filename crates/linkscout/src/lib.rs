// Copyright 2026 Linkscout Contributors
// SPDX-License-Identifier: Apache-2.0

//! Paced, resumable collection of public profile data through a single
//! controlled browser session.
//!
//! The [`session::Session`] owns the browser page and drives navigation;
//! [`discovery::Discovery`] finds profile URLs; [`scrape::Orchestrator`]
//! turns each URL into a [`model::ProfileRecord`] with the
//! [`extract`] heuristics; [`store::ProfileStore`] and [`export`] persist
//! the results.

pub mod app;
pub mod browser;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod export;
pub mod extract;
pub mod journal;
pub mod model;
pub mod pacing;
pub mod progress;
pub mod scrape;
pub mod session;
pub mod store;
pub mod telemetry;
pub mod validate;
