// Copyright 2026 Linkscout Contributors
// SPDX-License-Identifier: Apache-2.0

//! Per-session browser fingerprint.
//!
//! A fingerprint is drawn once when the session starts and never changes
//! afterwards. Every component that needs it receives a shared reference.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

const TIMEZONES: &[&str] = &[
    "America/New_York",
    "America/Chicago",
    "America/Los_Angeles",
    "Europe/London",
    "Europe/Paris",
    "Asia/Tokyo",
    "Australia/Sydney",
];

const LOCALES: &[&str] = &["en-US", "en-GB", "en-CA", "en-AU", "en-NZ"];

const RESOLUTIONS: &[(u32, u32)] = &[(1920, 1080), (1366, 768), (1440, 900), (2560, 1440)];

const DEVICE_SCALES: &[f64] = &[1.0, 1.25, 1.5, 2.0];

/// Preferred color scheme reported to pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    Light,
    Dark,
}

impl ColorScheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

/// Immutable browser identity for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fingerprint {
    pub user_agent: String,
    pub locale: String,
    pub timezone: String,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub device_scale_factor: f64,
    pub color_scheme: ColorScheme,
    pub latitude: f64,
    pub longitude: f64,
    pub reduced_motion: bool,
}

impl Fingerprint {
    /// Draw every attribute uniformly from its pool.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let (viewport_width, viewport_height) = *RESOLUTIONS.choose(rng).unwrap_or(&(1366, 768));
        Self {
            user_agent: pick(rng, USER_AGENTS),
            locale: pick(rng, LOCALES),
            timezone: pick(rng, TIMEZONES),
            viewport_width,
            viewport_height,
            device_scale_factor: *DEVICE_SCALES.choose(rng).unwrap_or(&1.0),
            color_scheme: if rng.gen_bool(0.5) {
                ColorScheme::Light
            } else {
                ColorScheme::Dark
            },
            latitude: rng.gen_range(-90.0..=90.0),
            longitude: rng.gen_range(-180.0..=180.0),
            reduced_motion: rng.gen_bool(0.5),
        }
    }

    /// `navigator.languages` consistent with the locale, e.g. `["en-GB", "en"]`.
    pub fn languages(&self) -> Vec<String> {
        let mut langs = vec![self.locale.clone()];
        if let Some((base, _)) = self.locale.split_once('-') {
            langs.push(base.to_string());
        }
        langs
    }

    /// `Accept-Language` header value matching [`Self::languages`].
    pub fn accept_language(&self) -> String {
        self.languages()
            .iter()
            .enumerate()
            .map(|(i, l)| if i == 0 { l.clone() } else { format!("{l};q=0.9") })
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Init script installed once per session, before any navigation.
    ///
    /// Masks the automation flag and fills in the navigator fields a
    /// scripted browser leaves empty.
    pub fn init_script(&self) -> String {
        let languages = serde_json::to_string(&self.languages()).unwrap_or_else(|_| "[]".into());
        format!(
            r#"(() => {{
    Object.defineProperty(navigator, 'webdriver', {{ get: () => undefined }});
    Object.defineProperty(navigator, 'plugins', {{ get: () => [1, 2, 3, 4, 5] }});
    Object.defineProperty(navigator, 'languages', {{ get: () => {languages} }});
    Object.defineProperty(navigator, 'vendor', {{ get: () => 'Google Inc.' }});
    window.chrome = window.chrome || {{ runtime: {{}}, loadTimes: function() {{}}, csi: function() {{}} }};
    if (window.navigator.permissions && window.navigator.permissions.query) {{
        const originalQuery = window.navigator.permissions.query.bind(window.navigator.permissions);
        window.navigator.permissions.query = (parameters) => (
            parameters && parameters.name === 'notifications'
                ? Promise.resolve({{ state: Notification.permission }})
                : originalQuery(parameters)
        );
    }}
}})();"#
        )
    }
}

fn pick<R: Rng + ?Sized>(rng: &mut R, pool: &[&str]) -> String {
    pool.choose(rng).copied().unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_random_fingerprint_draws_from_pools() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..50 {
            let fp = Fingerprint::random(&mut rng);
            assert!(USER_AGENTS.contains(&fp.user_agent.as_str()));
            assert!(LOCALES.contains(&fp.locale.as_str()));
            assert!(TIMEZONES.contains(&fp.timezone.as_str()));
            assert!(RESOLUTIONS.contains(&(fp.viewport_width, fp.viewport_height)));
            assert!(DEVICE_SCALES.contains(&fp.device_scale_factor));
            assert!((-90.0..=90.0).contains(&fp.latitude));
            assert!((-180.0..=180.0).contains(&fp.longitude));
        }
    }

    #[test]
    fn test_languages_follow_locale() {
        let mut fp = Fingerprint::random(&mut StdRng::seed_from_u64(1));
        fp.locale = "en-GB".into();
        assert_eq!(fp.languages(), vec!["en-GB".to_string(), "en".to_string()]);
        assert_eq!(fp.accept_language(), "en-GB,en;q=0.9");
        assert!(fp.init_script().contains(r#"["en-GB","en"]"#));
    }

    #[test]
    fn test_init_script_masks_automation_markers() {
        let fp = Fingerprint::random(&mut StdRng::seed_from_u64(2));
        let script = fp.init_script();
        for marker in ["webdriver", "plugins", "languages", "permissions.query", "vendor"] {
            assert!(script.contains(marker), "missing {marker}");
        }
    }
}
