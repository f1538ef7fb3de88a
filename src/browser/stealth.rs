//! Fingerprint-reduction profile for the automated session.
//!
//! Bot-detection heuristics key on headless defaults: a stock user agent,
//! a pixel-perfect common viewport, machine-speed keystrokes. The profile
//! below shapes all three. It is configuration only; applying it is the
//! session's job.

use rand::Rng;
use std::time::Duration;

/// Desktop Chrome user agent presented by the automated browser.
const DESKTOP_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Stealth knobs for one browser session.
#[derive(Debug, Clone)]
pub struct StealthProfile {
    pub user_agent: String,
    /// Browser locale, which also shapes the Accept-Language header.
    pub locale: String,
    /// Base viewport before jitter.
    pub viewport_base: (u32, u32),
    /// Maximum random enlargement applied to each viewport axis, in px.
    pub viewport_jitter: u32,
    /// Per-keystroke delay range while typing the username, in ms.
    pub username_key_delay_ms: (u64, u64),
    /// Per-keystroke delay range while typing the password, in ms.
    pub password_key_delay_ms: (u64, u64),
    /// Pause range between finishing typing and clicking login, in ms.
    pub pre_click_pause_ms: (u64, u64),
}

impl Default for StealthProfile {
    fn default() -> Self {
        Self {
            user_agent: DESKTOP_UA.to_string(),
            locale: "en-US".to_string(),
            viewport_base: (1920, 1080),
            viewport_jitter: 100,
            username_key_delay_ms: (100, 150),
            password_key_delay_ms: (150, 200),
            pre_click_pause_ms: (1000, 2000),
        }
    }
}

impl StealthProfile {
    /// Profile with no humanization pauses. For tests.
    pub fn calm() -> Self {
        Self {
            viewport_jitter: 0,
            username_key_delay_ms: (0, 0),
            password_key_delay_ms: (0, 0),
            pre_click_pause_ms: (0, 0),
            ..Self::default()
        }
    }

    /// Viewport dimensions with random jitter applied to each axis.
    pub fn jittered_viewport(&self) -> (u32, u32) {
        let (w, h) = self.viewport_base;
        if self.viewport_jitter == 0 {
            return (w, h);
        }
        let mut rng = rand::thread_rng();
        (
            w + rng.gen_range(0..self.viewport_jitter),
            h + rng.gen_range(0..self.viewport_jitter),
        )
    }

    pub fn username_key_delay(&self) -> Duration {
        sample_ms(self.username_key_delay_ms)
    }

    pub fn password_key_delay(&self) -> Duration {
        sample_ms(self.password_key_delay_ms)
    }

    pub fn pre_click_pause(&self) -> Duration {
        sample_ms(self.pre_click_pause_ms)
    }

    /// Chromium command-line arguments for a less conspicuous launch.
    pub fn launch_args(&self) -> Vec<String> {
        vec![
            "--no-sandbox".to_string(),
            "--disable-setuid-sandbox".to_string(),
            "--disable-infobars".to_string(),
            "--window-position=0,0".to_string(),
            "--ignore-certificate-errors".to_string(),
            "--ignore-certificate-errors-spki-list".to_string(),
            format!("--lang={}", self.locale),
        ]
    }
}

fn sample_ms((min, max): (u64, u64)) -> Duration {
    let ms = if min >= max {
        min
    } else {
        rand::thread_rng().gen_range(min..max)
    };
    Duration::from_millis(ms)
}
