//! Everything specific to the target booking site in one place.
//!
//! The selectors and phrases below are tied to the vendor's current page
//! markup and will need updating whenever that markup changes.

use std::time::Duration;

use crate::utils::poll::PollConfig;

/// Site constants and wait budgets for one booking run.
#[derive(Debug, Clone)]
pub struct SitePlan {
    pub login_url: String,
    pub booking_url: String,

    pub username_input: String,
    pub password_input: String,
    pub login_button: String,
    /// Phrase the site renders when credentials are rejected.
    pub login_failure_phrase: String,

    /// Content markers of an interstitial anti-bot challenge page.
    pub challenge_markers: Vec<String>,
    /// Content markers accepted as booking confirmation.
    pub confirmation_markers: Vec<String>,
    /// Generic confirm button shown on some booking flows.
    pub confirm_button: String,

    /// Visible text of the class slot to book.
    pub target_class: String,

    /// Budget for full page loads (login and booking pages).
    pub page_load_timeout: Duration,
    /// Budget for navigations triggered by booking clicks.
    pub booking_click_timeout: Duration,
    /// Poll budget for an anti-bot challenge to clear.
    pub challenge_poll: PollConfig,
}

impl Default for SitePlan {
    fn default() -> Self {
        Self {
            login_url: "https://sportspark.leisurecloud.net/Connect/mrmlogin.aspx".to_string(),
            booking_url: "https://sportspark.leisurecloud.net/Connect/mrmbooking.aspx".to_string(),
            username_input: "#ctl00_MainContent_InputLogin".to_string(),
            password_input: "#ctl00_MainContent_InputPassword".to_string(),
            login_button: "#ctl00_MainContent_btnLogin".to_string(),
            login_failure_phrase: "Invalid login details".to_string(),
            challenge_markers: vec!["Cloudflare".to_string(), "security check".to_string()],
            confirmation_markers: vec![
                "successfully booked".to_string(),
                "confirmation".to_string(),
            ],
            confirm_button: "button[type=\"submit\"]".to_string(),
            target_class: "Your Session Name".to_string(),
            page_load_timeout: Duration::from_secs(60),
            booking_click_timeout: Duration::from_secs(30),
            challenge_poll: PollConfig::every(1000, 15_000),
        }
    }
}

impl SitePlan {
    /// Whether the page content looks like an anti-bot challenge.
    pub fn has_challenge(&self, content: &str) -> bool {
        self.challenge_markers.iter().any(|m| content.contains(m.as_str()))
    }

    /// Whether the page content reports rejected credentials.
    pub fn login_rejected(&self, content: &str) -> bool {
        content.contains(self.login_failure_phrase.as_str())
    }

    /// Whether the page content confirms the booking.
    pub fn booking_confirmed(&self, content: &str) -> bool {
        self.confirmation_markers
            .iter()
            .any(|m| content.contains(m.as_str()))
    }
}
