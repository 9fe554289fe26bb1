use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfig as CdpConfig};
use futures::StreamExt;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::types::BrowserConfig;
use crate::error::{Result, ScrapeError};
use crate::ports::browser::BrowserLauncher;
use crate::ports::page::{ElementState, PortalPage, WaitCondition};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Launches a Chrome/Chromium instance over the DevTools protocol.
pub struct ChromiumLauncher {
    config: BrowserConfig,
}

impl ChromiumLauncher {
    pub fn new(config: &BrowserConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Arc<dyn PortalPage>> {
        let executable = self
            .config
            .chrome_executable
            .clone()
            .or_else(find_chrome)
            .ok_or_else(|| {
                ScrapeError::Config(
                    "Chrome/Chromium not found; install it or set browser.chrome_executable".into(),
                )
            })?;

        let mut builder = CdpConfig::builder()
            .chrome_executable(&executable)
            .viewport(None)
            .request_timeout(Duration::from_secs(self.config.navigation_timeout_secs));
        for arg in &self.config.args {
            builder = builder.arg(arg.as_str());
        }
        if !self.config.headless {
            builder = builder.with_head();
        }
        let cdp_config = builder
            .build()
            .map_err(|e| ScrapeError::Config(format!("failed to configure browser: {e}")))?;

        let (browser, mut handler) = Browser::launch(cdp_config).await?;
        let handler_task = tokio::spawn(async move { while handler.next().await.is_some() {} });
        let page = browser.new_page("about:blank").await?;
        info!(executable = %executable, headless = self.config.headless, "Browser launched");

        Ok(Arc::new(ChromiumPage {
            page,
            browser: Mutex::new(Some(browser)),
            handler_task,
        }))
    }
}

/// One browser tab. Closing it shuts the whole browser down; dropping it
/// stops the protocol handler.
pub struct ChromiumPage {
    page: Page,
    browser: Mutex<Option<Browser>>,
    handler_task: JoinHandle<()>,
}

impl Drop for ChromiumPage {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}

#[derive(Debug, Deserialize)]
struct StateSnapshot {
    disabled: bool,
    checked: bool,
    text: String,
}

impl ChromiumPage {
    async fn eval<T: DeserializeOwned>(&self, script: String) -> Result<T> {
        Ok(self.page.evaluate(script).await?.into_value()?)
    }

    /// Run an action script that returns `false` when its element is missing.
    async fn act(&self, selector: &str, script: String) -> Result<()> {
        if self.eval::<bool>(script).await? {
            Ok(())
        } else {
            Err(ScrapeError::ElementNotFound {
                selector: selector.to_string(),
            })
        }
    }
}

#[async_trait]
impl PortalPage for ChromiumPage {
    async fn goto(&self, url: &str) -> Result<()> {
        debug!(url, "Navigating");
        self.page.goto(url).await?;
        Ok(())
    }

    async fn reload(&self) -> Result<()> {
        self.page.reload().await?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.page.url().await?.unwrap_or_default())
    }

    async fn read_text(&self, selector: &str) -> Result<Option<String>> {
        self.eval(read_script(selector, "el.textContent.trim()")).await
    }

    async fn read_value(&self, selector: &str) -> Result<Option<String>> {
        self.eval(read_script(selector, "String(el.value ?? '')")).await
    }

    async fn inner_html(&self, selector: &str) -> Result<Option<String>> {
        self.eval(read_script(selector, "el.innerHTML")).await
    }

    async fn count(&self, selector: &str) -> Result<usize> {
        self.eval(format!(
            "document.querySelectorAll({}).length",
            js_string(selector)
        ))
        .await
    }

    async fn element_state(&self, selector: &str, index: usize) -> Result<Option<ElementState>> {
        let snapshot: Option<StateSnapshot> = self.eval(state_script(selector, index)).await?;
        Ok(snapshot.map(|s| ElementState {
            disabled: s.disabled,
            checked: s.checked,
            text: s.text,
        }))
    }

    async fn click_nth(&self, selector: &str, index: usize) -> Result<()> {
        self.act(selector, click_script(selector, index)).await
    }

    async fn select_option(&self, selector: &str, value: &str) -> Result<()> {
        let script = format!(
            r"(() => {{
  const el = document.querySelector({sel});
  if (!el) return false;
  el.value = {value};
  el.dispatchEvent(new Event('change', {{ bubbles: true }}));
  return true;
}})()",
            sel = js_string(selector),
            value = js_string(value),
        );
        self.act(selector, script).await
    }

    async fn type_slowly(&self, selector: &str, text: &str, per_char: Duration) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| ScrapeError::ElementNotFound {
                selector: selector.to_string(),
            })?;
        element.click().await?;
        for ch in text.chars() {
            element.type_str(ch.to_string()).await?;
            tokio::time::sleep(per_char).await;
        }
        Ok(())
    }

    async fn wait_for(
        &self,
        selector: &str,
        condition: WaitCondition,
        timeout: Duration,
    ) -> Result<()> {
        let script = visibility_script(selector);
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let seen: String = self.eval(script.clone()).await?;
            let satisfied = match condition {
                WaitCondition::Present => seen != "absent",
                WaitCondition::Visible => seen == "visible",
                WaitCondition::Hidden => seen != "visible",
            };
            if satisfied {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(ScrapeError::WaitTimeout {
                    selector: selector.to_string(),
                    timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn scroll_to_bottom(&self, selector: &str) -> Result<()> {
        let script = format!(
            r"(() => {{
  const el = document.querySelector({});
  if (!el) return false;
  el.scrollTop = el.scrollHeight;
  return true;
}})()",
            js_string(selector)
        );
        self.act(selector, script).await
    }

    async fn close(&self) -> Result<()> {
        let Some(mut browser) = self.browser.lock().await.take() else {
            return Ok(());
        };
        if let Err(e) = self.page.clone().close().await {
            debug!(error = %e, "Page already gone");
        }
        browser.close().await?;
        if let Err(e) = browser.wait().await {
            warn!(error = %e, "Browser process did not exit cleanly");
        }
        self.handler_task.abort();
        info!("Browser closed");
        Ok(())
    }
}

/// JSON string literal, safe to splice into a script.
fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

fn read_script(selector: &str, expr: &str) -> String {
    format!(
        "(() => {{ const el = document.querySelector({}); return el ? {expr} : null; }})()",
        js_string(selector)
    )
}

fn state_script(selector: &str, index: usize) -> String {
    format!(
        r"(() => {{
  const el = document.querySelectorAll({})[{index}];
  if (!el) return null;
  return {{
    disabled: !!el.disabled || el.getAttribute('aria-disabled') === 'true',
    checked: !!el.checked,
    text: (el.textContent || '').trim(),
  }};
}})()",
        js_string(selector)
    )
}

fn click_script(selector: &str, index: usize) -> String {
    format!(
        r"(() => {{
  const el = document.querySelectorAll({})[{index}];
  if (!el) return false;
  el.scrollIntoView({{ block: 'center' }});
  el.click();
  return true;
}})()",
        js_string(selector)
    )
}

/// Evaluates to "absent", "present" or "visible".
fn visibility_script(selector: &str) -> String {
    format!(
        r"(() => {{
  const el = document.querySelector({});
  if (!el) return 'absent';
  const r = el.getBoundingClientRect();
  const style = window.getComputedStyle(el);
  const shown = r.width > 0 && r.height > 0 && style.visibility !== 'hidden' && style.display !== 'none';
  return shown ? 'visible' : 'present';
}})()",
        js_string(selector)
    )
}

/// Find a Chrome/Chromium executable on PATH or in the usual install paths.
fn find_chrome() -> Option<String> {
    for name in ["google-chrome", "google-chrome-stable", "chromium", "chromium-browser"] {
        if let Ok(output) = std::process::Command::new("which").arg(name).output()
            && output.status.success()
        {
            let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if !path.is_empty() {
                return Some(path);
            }
        }
    }

    [
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
    ]
    .into_iter()
    .find(|p| std::path::Path::new(p).exists())
    .map(String::from)
}
