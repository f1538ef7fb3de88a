//! Live browser session driven through Playwright.

use anyhow::{Context, Result};
use async_trait::async_trait;
use colored::Colorize;
use log::{debug, warn};
use playwright::api::{Browser, BrowserContext, DocumentLoadState, Page, Viewport};
use playwright::Playwright;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use super::driver::PageDriver;
use super::stealth::StealthProfile;
use crate::utils::browser_finder;
use crate::utils::poll::{wait_until, PollConfig};

/// Session launch options.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Headed by default: visible browsers fare better against bot checks.
    pub headless: bool,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self { headless: false }
    }
}

/// One exclusively-owned browser session, from launch to close.
pub struct BrowserSession {
    #[allow(dead_code)]
    playwright: Arc<Playwright>,
    browser: Arc<Browser>,
    #[allow(dead_code)]
    context: Arc<BrowserContext>,
    page: Arc<Mutex<Page>>,
}

impl BrowserSession {
    /// Launch Chromium with the stealth profile applied.
    pub async fn launch(options: &LaunchOptions, stealth: &StealthProfile) -> Result<Self> {
        let playwright = Playwright::initialize()
            .await
            .context("failed to initialize Playwright")?;

        let chromium = playwright.chromium();
        let mut launcher = chromium.launcher().headless(options.headless);

        let executable = browser_finder::find_browser_executable();
        if let Some(ref path) = executable {
            println!("{} Using browser executable: {}", "🌐".blue(), path.display());
            launcher = launcher.executable(path);
        } else {
            println!(
                "{} No system browser found, falling back to the bundled one",
                "ℹ".blue()
            );
        }

        let args = stealth.launch_args();
        launcher = launcher.args(&args);

        let browser = launcher.launch().await.context("failed to launch Chromium")?;

        let context = browser
            .context_builder()
            .user_agent(&stealth.user_agent)
            .locale(&stealth.locale)
            .build()
            .await
            .context("failed to create browser context")?;

        let page = context.new_page().await.context("failed to open page")?;

        let (width, height) = stealth.jittered_viewport();
        debug!("viewport {}x{}", width, height);
        page.set_viewport_size(Viewport {
            width: width as i32,
            height: height as i32,
        })
        .await?;

        Ok(Self {
            playwright: Arc::new(playwright),
            browser: Arc::new(browser),
            context: Arc::new(context),
            page: Arc::new(Mutex::new(page)),
        })
    }

    /// Current document readiness, used as the navigation-settle signal.
    async fn ready_state(&self) -> Result<String> {
        let page = self.page.lock().await;
        let state: String = page.evaluate("() => document.readyState", ()).await?;
        Ok(state)
    }

    /// Wait for a click-triggered navigation to settle.
    ///
    /// The click returns before the browser commits the navigation, so give
    /// it a moment to leave the old document, then poll readiness until the
    /// new one reports complete. Evaluation errors while the execution
    /// context is being swapped out count as "still navigating".
    async fn await_navigation(&self, timeout: Duration) -> Result<()> {
        tokio::time::sleep(Duration::from_millis(500)).await;

        let settled = wait_until(
            move || async move {
                match self.ready_state().await {
                    Ok(state) => state == "complete",
                    Err(_) => false,
                }
            },
            &PollConfig {
                timeout_ms: timeout.as_millis() as u64,
                initial_interval_ms: 250,
                max_interval_ms: 1000,
                use_exponential_backoff: true,
            },
        )
        .await;

        if !settled {
            anyhow::bail!(
                "navigation did not complete within {}s",
                timeout.as_secs()
            );
        }
        Ok(())
    }
}

#[async_trait]
impl PageDriver for BrowserSession {
    async fn goto(&self, url: &str, timeout: Duration) -> Result<()> {
        let page = self.page.lock().await;
        page.goto_builder(url)
            .wait_until(DocumentLoadState::NetworkIdle)
            .timeout(timeout.as_millis() as f64)
            .goto()
            .await
            .with_context(|| format!("failed to load {}", url))?;
        Ok(())
    }

    async fn content(&self) -> Result<String> {
        let page = self.page.lock().await;
        Ok(page.content().await?)
    }

    async fn is_present(&self, selector: &str) -> Result<bool> {
        let page = self.page.lock().await;
        Ok(page.query_selector(selector).await?.is_some())
    }

    async fn type_into(&self, selector: &str, text: &str, key_delay: Duration) -> Result<()> {
        let page = self.page.lock().await;
        page.click_builder(selector)
            .click()
            .await
            .with_context(|| format!("failed to focus {}", selector))?;

        for ch in text.chars() {
            page.keyboard.input_text(&ch.to_string()).await?;
            if !key_delay.is_zero() {
                tokio::time::sleep(key_delay).await;
            }
        }
        Ok(())
    }

    async fn click_and_wait(&self, selector: &str, timeout: Duration) -> Result<()> {
        {
            let page = self.page.lock().await;
            page.click_builder(selector)
                .click()
                .await
                .with_context(|| format!("failed to click {}", selector))?;
        }
        self.await_navigation(timeout).await
    }

    async fn click_by_text(&self, needle: &str, timeout: Duration) -> Result<bool> {
        let matched = {
            let page = self.page.lock().await;
            let candidates = page.query_selector_all("a, button, div").await?;
            debug!("scanning {} clickable candidates", candidates.len());

            let mut matched = None;
            for handle in candidates {
                let text = handle.text_content().await?.unwrap_or_default();
                if text.contains(needle) {
                    matched = Some(handle);
                    break;
                }
            }

            match matched {
                Some(handle) => {
                    // Act on the located handle directly; deriving a selector
                    // from its id or class and re-querying is lossy.
                    handle
                        .click_builder()
                        .click()
                        .await
                        .context("failed to click the matched element")?;
                    true
                }
                None => false,
            }
        };

        if !matched {
            return Ok(false);
        }
        self.await_navigation(timeout).await?;
        Ok(true)
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        let page = self.page.lock().await;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        page.screenshot_builder()
            .path(path.to_path_buf())
            .screenshot()
            .await
            .with_context(|| format!("failed to capture screenshot to {}", path.display()))?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        if let Err(e) = self.browser.close().await {
            warn!("browser did not close cleanly: {}", e);
        }
        Ok(())
    }
}
