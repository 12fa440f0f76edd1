// Copyright 2026 Linkscout Contributors
// SPDX-License-Identifier: Apache-2.0

//! Chromium-backed [`BrowserPage`] using chromiumoxide.

use super::{BrowserPage, PageError, PageMetrics, ReleaseStep, WaitCondition};
use crate::session::fingerprint::Fingerprint;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::{
    MediaFeature, SetDeviceMetricsOverrideParams, SetEmulatedMediaParams,
    SetGeolocationOverrideParams, SetTimezoneOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams,
};
use chromiumoxide::error::CdpError;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::layout::Point;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Find the Chromium binary path.
pub fn find_chromium() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("LINKSCOUT_CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    if let Some(home) = dirs::home_dir() {
        let candidates = if cfg!(target_os = "macos") {
            vec![
                home.join(".linkscout/chromium/chrome-mac-arm64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".linkscout/chromium/chrome-mac-x64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
            ]
        } else {
            vec![home.join(".linkscout/chromium/chrome-linux64/chrome")]
        };
        if let Some(c) = candidates.into_iter().find(|c| c.exists()) {
            return Some(c);
        }
    }

    for name in ["google-chrome", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    if cfg!(target_os = "macos") {
        let common = PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// How to launch the engine.
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    pub headless: bool,
    /// Proxy server, e.g. `http://host:8080`.
    pub proxy: Option<String>,
    /// Explicit binary; falls back to [`find_chromium`].
    pub executable: Option<PathBuf>,
    /// Install the automation-masking init script.
    pub stealth: bool,
    /// Fixed window size instead of the fingerprint's.
    pub viewport: Option<(u32, u32)>,
}

/// One Chromium engine, one isolated context, one page.
pub struct ChromiumPage {
    page: Option<Page>,
    context_id: Option<BrowserContextId>,
    browser: Option<Browser>,
    handler: Option<JoinHandle<()>>,
}

impl ChromiumPage {
    /// Launch Chromium and open a page configured with `fingerprint`.
    ///
    /// The init script is installed before the first navigation.
    pub async fn launch(options: &LaunchOptions, fingerprint: &Fingerprint) -> Result<Self> {
        let chrome_path = match &options.executable {
            Some(p) => p.clone(),
            None => find_chromium()
                .context("Chromium not found. Install Chrome or set LINKSCOUT_CHROMIUM_PATH.")?,
        };

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .viewport(Viewport {
                width: fingerprint.viewport_width,
                height: fingerprint.viewport_height,
                device_scale_factor: Some(fingerprint.device_scale_factor),
                ..Default::default()
            })
            .window_size(fingerprint.viewport_width, fingerprint.viewport_height)
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg(format!("--lang={}", fingerprint.locale));
        if let Some(proxy) = &options.proxy {
            builder = builder.arg(format!("--proxy-server={proxy}"));
        }
        if !options.headless {
            builder = builder.with_head();
        }
        let config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch Chromium")?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("chromium handler event error: {e}");
                }
            }
        });

        let context_id = browser
            .create_browser_context(CreateBrowserContextParams::default())
            .await
            .context("failed to create browser context")?;

        let target = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(context_id.clone())
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build target params: {e}"))?;
        let page = browser
            .new_page(target)
            .await
            .context("failed to create new page")?;

        apply_fingerprint(&page, fingerprint, options.stealth).await?;

        Ok(Self {
            page: Some(page),
            context_id: Some(context_id),
            browser: Some(browser),
            handler: Some(handler_task),
        })
    }

    fn page(&self) -> Result<&Page, PageError> {
        self.page
            .as_ref()
            .ok_or_else(|| PageError::Closed("page already released".into()))
    }

    async fn eval<T: serde::de::DeserializeOwned>(&self, script: &str) -> Result<T, PageError> {
        let result = self.page()?.evaluate(script).await.map_err(classify)?;
        result
            .into_value()
            .map_err(|e| PageError::Script(format!("failed to convert JS result: {e:?}")))
    }

    async fn settle(&self, wait: WaitCondition, timeout: Duration) -> Result<(), PageError> {
        let script = match wait {
            WaitCondition::DomContentLoaded => return Ok(()),
            WaitCondition::Load => "document.readyState === 'complete'".to_string(),
            WaitCondition::NetworkIdle => network_idle_script(timeout),
        };
        let _: bool = self.eval(&script).await?;
        Ok(())
    }
}

async fn apply_fingerprint(page: &Page, fp: &Fingerprint, stealth: bool) -> Result<()> {
    if stealth {
        page.execute(AddScriptToEvaluateOnNewDocumentParams::new(fp.init_script()))
            .await
            .context("failed to install init script")?;
    }

    let ua = SetUserAgentOverrideParams::builder()
        .user_agent(fp.user_agent.clone())
        .accept_language(fp.accept_language())
        .build()
        .map_err(|e| anyhow::anyhow!("failed to build user agent override: {e}"))?;
    page.execute(ua).await.context("failed to override user agent")?;

    page.execute(SetDeviceMetricsOverrideParams::new(
        i64::from(fp.viewport_width),
        i64::from(fp.viewport_height),
        fp.device_scale_factor,
        false,
    ))
    .await
    .context("failed to set device metrics")?;

    page.execute(SetTimezoneOverrideParams::new(fp.timezone.clone()))
        .await
        .context("failed to set timezone")?;

    let mut geo = SetGeolocationOverrideParams::default();
    geo.latitude = Some(fp.latitude);
    geo.longitude = Some(fp.longitude);
    geo.accuracy = Some(100.0);
    page.execute(geo).await.context("failed to set geolocation")?;

    let mut features = vec![MediaFeature::new("prefers-color-scheme", fp.color_scheme.as_str())];
    if fp.reduced_motion {
        features.push(MediaFeature::new("prefers-reduced-motion", "reduce"));
    }
    let mut media = SetEmulatedMediaParams::default();
    media.features = Some(features);
    page.execute(media).await.context("failed to emulate media")?;

    Ok(())
}

fn classify(e: CdpError) -> PageError {
    let msg = e.to_string();
    match e {
        CdpError::Timeout => PageError::Timeout(Duration::ZERO),
        CdpError::JavascriptException(_) => PageError::Script(msg),
        CdpError::NoResponse | CdpError::ChannelSendError(_) | CdpError::Ws(_) => PageError::Closed(msg),
        CdpError::Chrome(_) | CdpError::ChromeMessage(_) if target_gone(&msg) => PageError::Closed(msg),
        _ => PageError::Protocol(msg),
    }
}

/// Replies Chrome sends once the target or its session no longer exists.
fn target_gone(msg: &str) -> bool {
    let lower = msg.to_lowercase();
    ["target closed", "session with given id not found", "no target with given id"]
        .iter()
        .any(|m| lower.contains(m))
}

/// Resolves once no new resource entries have appeared for one second.
fn network_idle_script(timeout: Duration) -> String {
    let timeout_ms = timeout.as_millis().min(u128::from(u64::MAX)) as u64;
    format!(
        r#"(async () => {{
    const start = Date.now();
    let last = performance.getEntriesByType('resource').length;
    let stable = 0;
    while (Date.now() - start < {timeout_ms}) {{
        await new Promise(r => setTimeout(r, 250));
        const now = performance.getEntriesByType('resource').length;
        if (now === last && document.readyState === 'complete') {{
            stable += 250;
            if (stable >= 1000) return true;
        }} else {{
            stable = 0;
            last = now;
        }}
    }}
    return false;
}})()"#
    )
}

fn js_str(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".into())
}

#[async_trait]
impl BrowserPage for ChromiumPage {
    async fn goto(&mut self, url: &str, wait: WaitCondition, timeout: Duration) -> Result<(), PageError> {
        let started = tokio::time::Instant::now();
        match tokio::time::timeout(timeout, self.page()?.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(classify(e)),
            Err(_) => return Err(PageError::Timeout(timeout)),
        }
        let remaining = timeout.saturating_sub(started.elapsed());
        match tokio::time::timeout(remaining, self.settle(wait, remaining)).await {
            Ok(result) => result,
            Err(_) => Err(PageError::Timeout(timeout)),
        }
    }

    async fn reload(&mut self, timeout: Duration) -> Result<(), PageError> {
        match tokio::time::timeout(timeout, self.page()?.reload()).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(classify(e)),
            Err(_) => Err(PageError::Timeout(timeout)),
        }
    }

    async fn wait_for_navigation(&mut self, timeout: Duration) -> Result<(), PageError> {
        match tokio::time::timeout(timeout, self.page()?.wait_for_navigation()).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(classify(e)),
            Err(_) => Err(PageError::Timeout(timeout)),
        }
    }

    async fn current_url(&self) -> Result<String, PageError> {
        Ok(self
            .page()?
            .url()
            .await
            .map_err(classify)?
            .map(|u| u.to_string())
            .unwrap_or_default())
    }

    async fn html(&self) -> Result<String, PageError> {
        self.page()?.content().await.map_err(classify)
    }

    async fn inner_text(&self, selector: &str) -> Result<Option<String>, PageError> {
        let script = format!(
            "(() => {{ const el = document.querySelector({}); return el ? el.innerText : null; }})()",
            js_str(selector)
        );
        self.eval(&script).await
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, PageError> {
        self.eval(script).await
    }

    async fn count(&self, selector: &str) -> Result<usize, PageError> {
        let script = format!(
            "(() => {{ try {{ return document.querySelectorAll({}).length; }} catch (_) {{ return 0; }} }})()",
            js_str(selector)
        );
        self.eval(&script).await
    }

    async fn click(&self, selector: &str, index: usize) -> Result<bool, PageError> {
        let elements = match self.page()?.find_elements(selector).await {
            Ok(elements) => elements,
            Err(_) => return Ok(false),
        };
        let Some(element) = elements.get(index) else {
            return Ok(false);
        };
        let disabled = element.attribute("disabled").await.map_err(classify)?.is_some()
            || element.attribute("aria-disabled").await.map_err(classify)?.as_deref() == Some("true");
        if disabled {
            return Ok(false);
        }
        element.scroll_into_view().await.map_err(classify)?;
        element.click().await.map_err(classify)?;
        Ok(true)
    }

    async fn type_text(&self, selector: &str, text: &str) -> Result<bool, PageError> {
        let element = match self.page()?.find_element(selector).await {
            Ok(element) => element,
            Err(_) => return Ok(false),
        };
        element.click().await.map_err(classify)?;
        element.type_str(text).await.map_err(classify)?;
        Ok(true)
    }

    async fn anchor_hrefs(&self) -> Result<Vec<String>, PageError> {
        self.eval("Array.from(document.querySelectorAll('a[href]')).map(a => a.getAttribute('href'))")
            .await
    }

    async fn metrics(&self) -> Result<PageMetrics, PageError> {
        let raw: serde_json::Value = self
            .eval("({ h: document.body ? document.body.scrollHeight : 0, w: window.innerWidth, vh: window.innerHeight })")
            .await?;
        let defaults = PageMetrics::default();
        Ok(PageMetrics {
            scroll_height: raw["h"].as_i64().unwrap_or(defaults.scroll_height),
            viewport_width: raw["w"].as_f64().unwrap_or(defaults.viewport_width),
            viewport_height: raw["vh"].as_f64().unwrap_or(defaults.viewport_height),
        })
    }

    async fn scroll_to(&self, y: i64) -> Result<(), PageError> {
        let _: serde_json::Value = self
            .eval(&format!("window.scrollTo({{ top: {y}, behavior: 'smooth' }})"))
            .await?;
        Ok(())
    }

    async fn move_pointer(&self, x: f64, y: f64) -> Result<(), PageError> {
        self.page()?.move_mouse(Point { x, y }).await.map_err(classify)?;
        Ok(())
    }

    async fn release(&mut self) -> Vec<ReleaseStep> {
        let mut steps = Vec::with_capacity(4);

        steps.push(match self.page.take() {
            Some(page) => match page.close().await {
                Ok(()) => ReleaseStep::ok("page"),
                Err(e) => ReleaseStep::failed("page", e),
            },
            None => ReleaseStep::ok("page"),
        });

        steps.push(match (self.context_id.take(), self.browser.as_ref()) {
            (Some(id), Some(browser)) => match browser.dispose_browser_context(id).await {
                Ok(()) => ReleaseStep::ok("context"),
                Err(e) => ReleaseStep::failed("context", e),
            },
            _ => ReleaseStep::ok("context"),
        });

        steps.push(match self.browser.take() {
            Some(mut browser) => match browser.close().await {
                Ok(_) => {
                    let _ = browser.wait().await;
                    ReleaseStep::ok("browser")
                }
                Err(e) => ReleaseStep::failed("browser", e),
            },
            None => ReleaseStep::ok("browser"),
        });

        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
        steps.push(ReleaseStep::ok("engine"));

        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_js_str_escapes_selector() {
        assert_eq!(js_str(r#"a[href*="x"]"#), r#""a[href*=\"x\"]""#);
    }

    #[test]
    fn test_classify_keeps_script_errors_off_the_closed_path() {
        assert!(matches!(
            classify(CdpError::ChromeMessage("element not found".into())),
            PageError::Protocol(_)
        ));
        assert!(matches!(
            classify(CdpError::ChromeMessage("invalid channel id".into())),
            PageError::Protocol(_)
        ));
        assert!(matches!(classify(CdpError::NotFound), PageError::Protocol(_)));
        assert!(matches!(
            classify(CdpError::ChromeMessage("Target closed.".into())),
            PageError::Closed(_)
        ));
        assert!(matches!(classify(CdpError::NoResponse), PageError::Closed(_)));
        assert!(classify(CdpError::Timeout).is_timeout());
    }

    #[test]
    fn test_network_idle_script_embeds_timeout() {
        assert!(network_idle_script(Duration::from_secs(3)).contains("3000"));
    }

    #[tokio::test]
    #[ignore] // Requires Chromium to be installed
    async fn test_chromium_navigate_and_release() {
        let fp = Fingerprint::random(&mut StdRng::seed_from_u64(1));
        let options = LaunchOptions {
            headless: true,
            stealth: true,
            ..Default::default()
        };
        let mut page = ChromiumPage::launch(&options, &fp)
            .await
            .expect("failed to launch");

        page.goto(
            "data:text/html,<h1>Hello</h1><a href='/in/jane'>x</a>",
            WaitCondition::Load,
            Duration::from_secs(10),
        )
        .await
        .expect("navigation failed");

        assert_eq!(page.inner_text("h1").await.unwrap().as_deref(), Some("Hello"));
        assert_eq!(page.count("a").await.unwrap(), 1);
        assert_eq!(page.anchor_hrefs().await.unwrap(), vec!["/in/jane".to_string()]);
        let webdriver = page.evaluate("navigator.webdriver === undefined").await.unwrap();
        assert_eq!(webdriver, serde_json::Value::Bool(true));

        let steps = page.release().await;
        let names: Vec<_> = steps.iter().map(|s| s.resource).collect();
        assert_eq!(names, vec!["page", "context", "browser", "engine"]);
        assert!(page.html().await.is_err());
    }
}
