// Copyright 2026 Linkscout Contributors
// SPDX-License-Identifier: Apache-2.0

//! Configuration: a TOML settings document plus environment overrides.
//!
//! Credentials and browser toggles come from the environment (a `.env`
//! file is honored); everything else from `config/settings.toml`. A
//! missing settings file is created with the defaults. The composed
//! [`AppConfig`] is built once at startup and never mutated.

use crate::browser::chromium::LaunchOptions;
use crate::discovery::DiscoveryPolicy;
use crate::export::ExportFormat;
use crate::pacing::ScrollPattern;
use crate::scrape::ScrapePolicy;
use crate::session::{Credentials, NavigationRequest, SessionPolicy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

pub const DEFAULT_CONFIG_PATH: &str = "config/settings.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapingSettings {
    pub max_profiles_per_search: usize,
    /// Base delay between profiles, in seconds.
    pub delay_between_profiles: (f64, f64),
    pub max_retries: u32,
    pub timeout_ms: u64,
    pub use_stealth: bool,
    /// Failed profiles are retried until they reach this many attempts.
    pub retry_cap: u32,
    pub scroll_pattern: ScrollPattern,
}

impl Default for ScrapingSettings {
    fn default() -> Self {
        Self {
            max_profiles_per_search: 100,
            delay_between_profiles: (15.0, 30.0),
            max_retries: 3,
            timeout_ms: 60_000,
            use_stealth: true,
            retry_cap: 3,
            scroll_pattern: ScrollPattern::Natural,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub headless: bool,
    /// Fixed window size; drawn per session when unset.
    pub viewport: Option<(u32, u32)>,
    pub use_proxy: bool,
    pub proxy_server: String,
    /// Chromium binary; discovered when unset.
    pub chromium_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub path: PathBuf,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/linkscout.db"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub formats: Vec<ExportFormat>,
    pub export_path: PathBuf,
    pub min_completeness: u8,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            formats: vec![ExportFormat::Json, ExportFormat::Csv, ExportFormat::Xlsx],
            export_path: PathBuf::from("data/exports"),
            min_completeness: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AntiDetectionSettings {
    /// Jitter the delay between profiles; when off the lower bound is used.
    pub random_delays: bool,
    /// Scroll and pointer simulation on every page.
    pub human_behavior: bool,
}

impl Default for AntiDetectionSettings {
    fn default() -> Self {
        Self {
            random_delays: true,
            human_behavior: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// JSONL journal of per-profile outcomes.
    pub journal_path: PathBuf,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            journal_path: PathBuf::from("logs/journal.jsonl"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSettings {
    pub base_url: String,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            base_url: "https://www.linkedin.com".to_string(),
        }
    }
}

/// The settings document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub scraping: ScrapingSettings,
    pub browser: BrowserSettings,
    pub database: DatabaseSettings,
    pub export: ExportSettings,
    pub anti_detection: AntiDetectionSettings,
    pub logging: LoggingSettings,
    pub site: SiteSettings,
}

impl Settings {
    pub fn from_toml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `path`, writing the defaults there first when it does not exist.
    pub fn load_or_init(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let settings = Self::default();
            if let Err(e) = settings.write(path) {
                warn!(path = %path.display(), error = %e, "could not write default settings");
            } else {
                info!(path = %path.display(), "wrote default settings");
            }
            return Ok(settings);
        }
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text, path)
    }

    fn write(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Reject values the rest of the program cannot work with.
    pub fn validate(&self) -> Result<Url, ConfigError> {
        let (min, max) = self.scraping.delay_between_profiles;
        if !(min >= 0.0 && min <= max) {
            return Err(ConfigError::Invalid {
                key: "scraping.delay_between_profiles",
                reason: format!("expected 0 <= min <= max, got [{min}, {max}]"),
            });
        }
        if self.scraping.timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "scraping.timeout_ms",
                reason: "must be positive".into(),
            });
        }
        if self.export.min_completeness > 100 {
            return Err(ConfigError::Invalid {
                key: "export.min_completeness",
                reason: format!("{} is above 100", self.export.min_completeness),
            });
        }
        let url = Url::parse(&self.site.base_url).map_err(|e| ConfigError::Invalid {
            key: "site.base_url",
            reason: e.to_string(),
        })?;
        if url.host_str().is_none() {
            return Err(ConfigError::Invalid {
                key: "site.base_url",
                reason: "has no host".into(),
            });
        }
        Ok(url)
    }
}

fn truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Settings plus environment, fixed for the process lifetime.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub settings: Settings,
    pub base_url: Url,
    pub credentials: Option<Credentials>,
    pub headless: bool,
    pub proxy: Option<String>,
    pub config_path: PathBuf,
}

impl AppConfig {
    /// Load `.env`, the settings file, and the environment overrides.
    ///
    /// The settings path is `path`, else `LINKSCOUT_CONFIG`, else
    /// [`DEFAULT_CONFIG_PATH`].
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        let config_path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os("LINKSCOUT_CONFIG").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
        let settings = Settings::load_or_init(&config_path)?;
        Self::compose(settings, config_path, |key| std::env::var(key).ok())
    }

    /// Apply environment overrides from `env` to `settings`.
    pub fn compose(
        settings: Settings,
        config_path: PathBuf,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let base_url = settings.validate()?;

        let email = env("LINKSCOUT_EMAIL").filter(|v| !v.trim().is_empty());
        let password = env("LINKSCOUT_PASSWORD").filter(|v| !v.is_empty());
        let credentials = match (email, password) {
            (Some(email), Some(password)) => Some(Credentials { email, password }),
            _ => None,
        };

        let headless = env("HEADLESS").map_or(settings.browser.headless, |v| truthy(&v));
        let use_proxy = env("USE_PROXY").map_or(settings.browser.use_proxy, |v| truthy(&v));
        let proxy_server = env("PROXY_SERVER").unwrap_or_else(|| settings.browser.proxy_server.clone());
        let proxy = (use_proxy && !proxy_server.trim().is_empty()).then(|| proxy_server.trim().to_string());
        if use_proxy && proxy.is_none() {
            warn!("proxy enabled but no proxy server configured");
        }

        Ok(Self {
            settings,
            base_url,
            credentials,
            headless,
            proxy,
            config_path,
        })
    }

    pub fn launch_options(&self) -> LaunchOptions {
        LaunchOptions {
            headless: self.headless,
            proxy: self.proxy.clone(),
            executable: self.settings.browser.chromium_path.clone(),
            stealth: self.settings.scraping.use_stealth,
            viewport: self.settings.browser.viewport,
        }
    }

    pub fn session_policy(&self) -> SessionPolicy {
        SessionPolicy::default()
    }

    fn nav(&self) -> NavigationRequest {
        NavigationRequest::new(
            Duration::from_millis(self.settings.scraping.timeout_ms),
            self.settings.scraping.max_retries,
        )
    }

    pub fn scrape_policy(&self) -> ScrapePolicy {
        let s = &self.settings;
        let (min, max) = s.scraping.delay_between_profiles;
        ScrapePolicy {
            nav: self.nav(),
            scroll: s.scraping.scroll_pattern,
            delay_range: if s.anti_detection.random_delays { (min, max) } else { (min, min) },
            human_behavior: s.anti_detection.human_behavior,
            ..ScrapePolicy::default()
        }
    }

    pub fn discovery_policy(&self) -> DiscoveryPolicy {
        let s = &self.settings;
        DiscoveryPolicy {
            search_nav: NavigationRequest::new(self.nav().timeout, s.scraping.max_retries.max(5)),
            scroll: s.scraping.scroll_pattern,
            human_behavior: s.anti_detection.human_behavior,
            ..DiscoveryPolicy::default()
        }
    }
}
