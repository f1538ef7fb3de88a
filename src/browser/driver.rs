//! The seam between the booking sequence and a live browser page.
//!
//! The booking runner only ever talks to this trait, so the whole
//! login-then-book sequence can be exercised against a scripted page
//! in tests without launching a browser.

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

/// Operations the booking sequence needs from a browser page.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate to `url` and wait for the page to finish loading.
    /// Expiry of `timeout` is an error.
    async fn goto(&self, url: &str, timeout: Duration) -> Result<()>;

    /// Full HTML of the current page.
    async fn content(&self) -> Result<String>;

    /// Whether a CSS selector currently matches anything on the page.
    async fn is_present(&self, selector: &str) -> Result<bool>;

    /// Focus the element at `selector` and type `text` one keystroke at a
    /// time, pacing each key by roughly `key_delay` to look human.
    async fn type_into(&self, selector: &str, text: &str, key_delay: Duration) -> Result<()>;

    /// Click `selector` and wait for the resulting navigation to settle.
    async fn click_and_wait(&self, selector: &str, timeout: Duration) -> Result<()>;

    /// Find the first clickable element (link, button or div) whose visible
    /// text contains `needle` and click it directly, holding on to the
    /// located handle rather than round-tripping through a derived selector.
    /// Returns `Ok(false)` when nothing matches; the click itself and the
    /// navigation wait report real errors.
    async fn click_by_text(&self, needle: &str, timeout: Duration) -> Result<bool>;

    /// Capture a full screenshot of the current page to `path`.
    async fn screenshot(&self, path: &Path) -> Result<()>;

    /// Tear down the browser session. Callers invoke this exactly once.
    async fn close(&self) -> Result<()>;
}
