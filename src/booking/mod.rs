//! The login-then-book sequence.
//!
//! One linear pass per invocation: no retries, no branching back, every
//! failed check is fatal. The runner drives a [`PageDriver`] so the whole
//! sequence runs against a scripted page in tests.

pub mod credentials;
pub mod outcome;
pub mod site;

pub use credentials::Credentials;
pub use outcome::{BookingError, BookingOutcome};
pub use site::SitePlan;

use colored::Colorize;
use log::warn;
use std::path::{Path, PathBuf};

use crate::browser::driver::PageDriver;
use crate::browser::stealth::StealthProfile;
use crate::utils::poll::wait_until;

pub const SUCCESS_SCREENSHOT: &str = "booking-result.png";
pub const ERROR_SCREENSHOT: &str = "error-screenshot.png";

/// Screenshot artifacts, overwritten on every run.
#[derive(Debug, Clone)]
pub struct Artifacts {
    pub success_screenshot: PathBuf,
    pub error_screenshot: PathBuf,
}

impl Artifacts {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            success_screenshot: dir.join(SUCCESS_SCREENSHOT),
            error_screenshot: dir.join(ERROR_SCREENSHOT),
        }
    }
}

impl Default for Artifacts {
    fn default() -> Self {
        Self::in_dir(Path::new("."))
    }
}

/// Drives one browser session through the fixed booking sequence.
pub struct BookingRunner {
    page: Box<dyn PageDriver>,
    site: SitePlan,
    stealth: StealthProfile,
    credentials: Credentials,
    artifacts: Artifacts,
}

impl BookingRunner {
    pub fn new(
        page: Box<dyn PageDriver>,
        site: SitePlan,
        stealth: StealthProfile,
        credentials: Credentials,
        artifacts: Artifacts,
    ) -> Self {
        Self {
            page,
            site,
            stealth,
            credentials,
            artifacts,
        }
    }

    /// Execute the full run: the booking stages, one screenshot on every
    /// path, and exactly one session close regardless of where a failure
    /// happened.
    pub async fn run(self) -> Result<BookingOutcome, BookingError> {
        let result = match self.run_stages().await {
            Ok(outcome) => {
                // The verification screenshot is part of the run proper;
                // losing it fails the run.
                match self.page.screenshot(&self.artifacts.success_screenshot).await {
                    Ok(()) => {
                        println!(
                            "{} Screenshot saved to {}",
                            "📸".blue(),
                            self.artifacts.success_screenshot.display()
                        );
                        Ok(outcome)
                    }
                    Err(e) => Err(BookingError::Driver(e)),
                }
            }
            Err(e) => Err(e),
        };

        if let Err(ref err) = result {
            eprintln!("{} Booking run failed: {}", "❌".red(), err);
            // Best-effort diagnostic capture; a second failure here must
            // not mask the original error.
            match self.page.screenshot(&self.artifacts.error_screenshot).await {
                Ok(()) => println!(
                    "{} Error screenshot saved to {}",
                    "📸".yellow(),
                    self.artifacts.error_screenshot.display()
                ),
                Err(shot) => warn!("could not capture error screenshot: {}", shot),
            }
        }

        if let Err(e) = self.page.close().await {
            warn!("session close reported an error: {}", e);
        }
        println!("{} Browser session closed", "🧹".blue());

        result
    }

    async fn run_stages(&self) -> Result<BookingOutcome, BookingError> {
        if !self.credentials.is_complete() {
            return Err(BookingError::MissingCredentials);
        }

        println!("{} Navigating to login page...", "🌐".blue());
        self.page
            .goto(&self.site.login_url, self.site.page_load_timeout)
            .await?;

        self.wait_out_challenge().await?;

        println!("{} Checking if login form is available...", "🔍".blue());
        if !self.page.is_present(&self.site.username_input).await? {
            return Err(BookingError::ChallengeBlocked);
        }

        println!("{} Entering login credentials...", "🔑".blue());
        self.page
            .type_into(
                &self.site.username_input,
                &self.credentials.username,
                self.stealth.username_key_delay(),
            )
            .await?;
        self.page
            .type_into(
                &self.site.password_input,
                &self.credentials.password,
                self.stealth.password_key_delay(),
            )
            .await?;

        tokio::time::sleep(self.stealth.pre_click_pause()).await;

        println!("{} Submitting login...", "▶".blue());
        self.page
            .click_and_wait(&self.site.login_button, self.site.page_load_timeout)
            .await?;

        let after_login = self.page.content().await?;
        if self.site.login_rejected(&after_login) {
            return Err(BookingError::LoginFailed);
        }

        println!(
            "{} Login successful, navigating to booking page...",
            "✓".green()
        );
        self.page
            .goto(&self.site.booking_url, self.site.page_load_timeout)
            .await?;

        println!(
            "{} Looking for session '{}'...",
            "🔍".blue(),
            self.site.target_class.cyan()
        );
        let clicked = self
            .page
            .click_by_text(&self.site.target_class, self.site.booking_click_timeout)
            .await?;
        if !clicked {
            return Err(BookingError::SessionNotFound(self.site.target_class.clone()));
        }

        // Some flows interpose a generic confirm step; absent button means
        // the click above already completed the booking.
        if self.page.is_present(&self.site.confirm_button).await? {
            println!("{} Confirming booking...", "▶".blue());
            self.page
                .click_and_wait(&self.site.confirm_button, self.site.booking_click_timeout)
                .await?;
        }

        let final_page = self.page.content().await?;
        if self.site.booking_confirmed(&final_page) {
            println!("{} Session booked successfully!", "✅".green().bold());
            Ok(BookingOutcome::Confirmed)
        } else {
            // Advisory only: the absence of a confirmation marker does not
            // fail the run, it downgrades it to "check manually".
            warn!("no booking confirmation marker found on the final page");
            println!(
                "{} Booking may have failed. Please check your account manually.",
                "⚠".yellow().bold()
            );
            Ok(BookingOutcome::Unverified)
        }
    }

    /// Give an interstitial anti-bot challenge a bounded chance to clear.
    ///
    /// Best effort: if the markers are still present when the budget runs
    /// out, the run proceeds and the login-form check decides whether
    /// access is actually blocked.
    async fn wait_out_challenge(&self) -> Result<(), BookingError> {
        let body = self.page.content().await?;
        if !self.site.has_challenge(&body) {
            return Ok(());
        }

        println!(
            "{} Anti-bot challenge detected, waiting up to {}s for it to clear...",
            "🛡".yellow(),
            self.site.challenge_poll.timeout().as_secs()
        );
        let cleared = wait_until(
            move || async move {
                match self.page.content().await {
                    Ok(body) => !self.site.has_challenge(&body),
                    Err(_) => false,
                }
            },
            &self.site.challenge_poll,
        )
        .await;

        if !cleared {
            warn!(
                "challenge markers still present after {}ms, continuing to the form check",
                self.site.challenge_poll.timeout_ms
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::driver::PageDriver;
    use crate::utils::poll::PollConfig;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Goto(String),
        Presence(String),
        Type(String),
        ClickNav(String),
        LocateText(String),
        ClickText(String),
        Screenshot(PathBuf),
        Close,
    }

    /// Where to inject a driver failure.
    #[derive(Debug, Clone, Copy, PartialEq)]
    enum FailAt {
        GotoLogin,
        LoginClick,
        GotoBooking,
        SessionClick,
        ConfirmClick,
        SuccessScreenshot,
    }

    /// Scripted page states for one simulated run.
    #[derive(Clone)]
    struct Script {
        login_page: String,
        after_login: String,
        booking_page: String,
        after_session_click: String,
        after_confirm: String,
        login_form_present: bool,
        session_clickable: bool,
        confirm_button_present: bool,
        fail_at: Option<FailAt>,
    }

    impl Script {
        fn happy() -> Self {
            Self {
                login_page: "<h1>Member login</h1><form></form>".into(),
                after_login: "<p>Welcome back, member</p>".into(),
                booking_page: "<a id='s1'>Spin Class 09:00</a>".into(),
                after_session_click: "<button type=\"submit\">Confirm</button>".into(),
                after_confirm: "Your class was successfully booked.".into(),
                login_form_present: true,
                session_clickable: true,
                confirm_button_present: true,
                fail_at: None,
            }
        }
    }

    /// Shared observation channel for a [`MockPage`] moved into the runner.
    #[derive(Clone, Default)]
    struct MockLog {
        ops: Arc<Mutex<Vec<Op>>>,
        closes: Arc<AtomicUsize>,
    }

    impl MockLog {
        fn ops(&self) -> Vec<Op> {
            self.ops.lock().unwrap().clone()
        }

        fn record(&self, op: Op) {
            self.ops.lock().unwrap().push(op);
        }

        fn screenshots(&self) -> Vec<PathBuf> {
            self.ops()
                .into_iter()
                .filter_map(|op| match op {
                    Op::Screenshot(p) => Some(p),
                    _ => None,
                })
                .collect()
        }

        fn typed_anything(&self) -> bool {
            self.ops().iter().any(|op| matches!(op, Op::Type(_)))
        }

        fn navigated_anywhere(&self) -> bool {
            self.ops().iter().any(|op| matches!(op, Op::Goto(_)))
        }

        fn clicked_session(&self) -> bool {
            self.ops().iter().any(|op| matches!(op, Op::ClickText(_)))
        }
    }

    struct MockPage {
        script: Script,
        site: SitePlan,
        content: Mutex<String>,
        gotos: AtomicUsize,
        screenshot_attempts: AtomicUsize,
        log: MockLog,
    }

    impl MockPage {
        fn new(script: Script, site: SitePlan, log: MockLog) -> Self {
            Self {
                script,
                site,
                content: Mutex::new(String::new()),
                gotos: AtomicUsize::new(0),
                screenshot_attempts: AtomicUsize::new(0),
                log,
            }
        }

        fn fails_here(&self, point: FailAt) -> bool {
            self.script.fail_at == Some(point)
        }

        fn set_content(&self, body: &str) {
            *self.content.lock().unwrap() = body.to_string();
        }
    }

    #[async_trait]
    impl PageDriver for MockPage {
        async fn goto(&self, url: &str, _timeout: Duration) -> Result<()> {
            self.log.record(Op::Goto(url.to_string()));
            let visit = self.gotos.fetch_add(1, Ordering::SeqCst);
            if visit == 0 {
                if self.fails_here(FailAt::GotoLogin) {
                    anyhow::bail!("navigation did not complete within 60s");
                }
                self.set_content(&self.script.login_page);
            } else {
                if self.fails_here(FailAt::GotoBooking) {
                    anyhow::bail!("navigation did not complete within 60s");
                }
                self.set_content(&self.script.booking_page);
            }
            Ok(())
        }

        async fn content(&self) -> Result<String> {
            Ok(self.content.lock().unwrap().clone())
        }

        async fn is_present(&self, selector: &str) -> Result<bool> {
            self.log.record(Op::Presence(selector.to_string()));
            if selector == self.site.username_input {
                Ok(self.script.login_form_present)
            } else if selector == self.site.confirm_button {
                Ok(self.script.confirm_button_present)
            } else {
                Ok(true)
            }
        }

        async fn type_into(&self, selector: &str, _text: &str, _key_delay: Duration) -> Result<()> {
            self.log.record(Op::Type(selector.to_string()));
            Ok(())
        }

        async fn click_and_wait(&self, selector: &str, _timeout: Duration) -> Result<()> {
            self.log.record(Op::ClickNav(selector.to_string()));
            if selector == self.site.login_button {
                if self.fails_here(FailAt::LoginClick) {
                    anyhow::bail!("navigation did not complete within 60s");
                }
                self.set_content(&self.script.after_login);
            } else if selector == self.site.confirm_button {
                if self.fails_here(FailAt::ConfirmClick) {
                    anyhow::bail!("navigation did not complete within 30s");
                }
                self.set_content(&self.script.after_confirm);
            }
            Ok(())
        }

        async fn click_by_text(&self, needle: &str, _timeout: Duration) -> Result<bool> {
            self.log.record(Op::LocateText(needle.to_string()));
            if !self.script.session_clickable {
                return Ok(false);
            }
            if self.fails_here(FailAt::SessionClick) {
                anyhow::bail!("failed to click the matched element");
            }
            self.log.record(Op::ClickText(needle.to_string()));
            self.set_content(&self.script.after_session_click);
            Ok(true)
        }

        async fn screenshot(&self, path: &Path) -> Result<()> {
            let attempt = self.screenshot_attempts.fetch_add(1, Ordering::SeqCst);
            if attempt == 0 && self.fails_here(FailAt::SuccessScreenshot) {
                anyhow::bail!("failed to capture screenshot");
            }
            self.log.record(Op::Screenshot(path.to_path_buf()));
            Ok(())
        }

        async fn close(&self) -> Result<()> {
            self.log.record(Op::Close);
            self.log.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn test_site() -> SitePlan {
        let mut site = SitePlan::default();
        site.target_class = "Spin Class".into();
        // keep the challenge wait short in tests
        site.challenge_poll = PollConfig::every(10, 40);
        site
    }

    fn test_credentials() -> Credentials {
        Credentials {
            username: "member".into(),
            password: "secret".into(),
        }
    }

    fn runner_with(script: Script, credentials: Credentials) -> (BookingRunner, MockLog) {
        let site = test_site();
        let log = MockLog::default();
        let page = MockPage::new(script, site.clone(), log.clone());
        let runner = BookingRunner::new(
            Box::new(page),
            site,
            StealthProfile::calm(),
            credentials,
            Artifacts::default(),
        );
        (runner, log)
    }

    #[tokio::test]
    async fn missing_credentials_fail_before_any_navigation() {
        let empty = Credentials {
            username: String::new(),
            password: String::new(),
        };
        let (runner, log) = runner_with(Script::happy(), empty);

        let result = runner.run().await;

        assert!(matches!(result, Err(BookingError::MissingCredentials)));
        assert!(!log.navigated_anywhere());
        assert!(!log.typed_anything());
        assert_eq!(log.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_login_form_blocks_without_submitting_credentials() {
        let mut script = Script::happy();
        script.login_form_present = false;
        let (runner, log) = runner_with(script, test_credentials());

        let result = runner.run().await;

        assert!(matches!(result, Err(BookingError::ChallengeBlocked)));
        assert!(!log.typed_anything());
    }

    #[tokio::test]
    async fn login_failure_phrase_is_fatal() {
        let mut script = Script::happy();
        script.after_login = "<span>Invalid login details</span>".into();
        let (runner, log) = runner_with(script, test_credentials());

        let result = runner.run().await;

        assert!(matches!(result, Err(BookingError::LoginFailed)));
        // credentials were submitted, but we never reached the booking page
        assert!(log.typed_anything());
        assert_eq!(
            log.ops()
                .iter()
                .filter(|op| matches!(op, Op::Goto(_)))
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn missing_session_is_fatal_and_never_clicks() {
        let mut script = Script::happy();
        script.session_clickable = false;
        let (runner, log) = runner_with(script, test_credentials());

        let result = runner.run().await;

        match result {
            Err(BookingError::SessionNotFound(name)) => assert_eq!(name, "Spin Class"),
            other => panic!("expected SessionNotFound, got {:?}", other),
        }
        assert!(!log.clicked_session());
    }

    #[tokio::test]
    async fn full_run_confirms_and_writes_success_screenshot() {
        let (runner, log) = runner_with(Script::happy(), test_credentials());

        let outcome = runner.run().await.expect("happy path should succeed");

        assert_eq!(outcome, BookingOutcome::Confirmed);
        let shots = log.screenshots();
        assert_eq!(shots, vec![PathBuf::from("./booking-result.png")]);
        assert_eq!(log.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unconfirmed_booking_downgrades_but_still_succeeds() {
        let mut script = Script::happy();
        script.after_confirm = "<p>Thank you</p>".into();
        let (runner, _log) = runner_with(script, test_credentials());

        let outcome = runner.run().await.expect("advisory check never fails the run");

        assert_eq!(outcome, BookingOutcome::Unverified);
    }

    #[tokio::test]
    async fn absent_confirm_button_skips_the_confirm_step() {
        let mut script = Script::happy();
        script.confirm_button_present = false;
        script.after_session_click = "Booking confirmation #42".into();
        let (runner, log) = runner_with(script, test_credentials());

        let outcome = runner.run().await.expect("run should succeed");

        assert_eq!(outcome, BookingOutcome::Confirmed);
        // only the login click navigated via selector; no confirm click
        let clicks: Vec<Op> = log
            .ops()
            .into_iter()
            .filter(|op| matches!(op, Op::ClickNav(_)))
            .collect();
        assert_eq!(clicks.len(), 1);
    }

    #[tokio::test]
    async fn lingering_challenge_markers_fall_through_to_the_form_check() {
        let mut script = Script::happy();
        // challenge page that never clears, but the form is reachable anyway
        script.login_page = "Cloudflare security check <form></form>".into();
        let (runner, _log) = runner_with(script, test_credentials());

        let outcome = runner.run().await.expect("form check decides, not the marker");
        assert_eq!(outcome, BookingOutcome::Confirmed);
    }

    #[tokio::test]
    async fn every_injected_failure_writes_error_screenshot_and_closes_once() {
        let points = [
            FailAt::GotoLogin,
            FailAt::LoginClick,
            FailAt::GotoBooking,
            FailAt::SessionClick,
            FailAt::ConfirmClick,
            FailAt::SuccessScreenshot,
        ];

        for point in points {
            let mut script = Script::happy();
            script.fail_at = Some(point);
            let (runner, log) = runner_with(script, test_credentials());

            let result = runner.run().await;

            assert!(result.is_err(), "expected failure at {:?}", point);
            assert_eq!(
                log.screenshots(),
                vec![PathBuf::from("./error-screenshot.png")],
                "error screenshot missing for {:?}",
                point
            );
            assert_eq!(
                log.closes.load(Ordering::SeqCst),
                1,
                "close must run exactly once for {:?}",
                point
            );
            // close is the last thing the run does
            assert_eq!(log.ops().last(), Some(&Op::Close));
        }
    }
}
