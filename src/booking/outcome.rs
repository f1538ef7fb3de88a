//! Run outcome and the failure taxonomy.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fatal conditions that terminate a booking run.
///
/// Every variant ends the run; there is no retry tier. The one advisory
/// check (booking confirmation content) deliberately lives on the success
/// side as [`BookingOutcome::Unverified`] instead of here.
#[derive(Debug, Error)]
pub enum BookingError {
    #[error("credentials not found in environment (GYM_USERNAME / GYM_PASSWORD unset or empty)")]
    MissingCredentials,

    #[error("login form not found, the anti-bot challenge may be blocking access")]
    ChallengeBlocked,

    #[error("login failed, check the account credentials")]
    LoginFailed,

    #[error("session '{0}' not found on the booking page")]
    SessionNotFound(String),

    /// Any underlying automation failure: navigation timeouts, lost pages,
    /// protocol errors.
    #[error(transparent)]
    Driver(#[from] anyhow::Error),
}

/// How a completed run ended.
///
/// `Unverified` means every step succeeded but the final page never showed
/// a confirmation marker. The run still exits 0; the account should be
/// checked manually.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingOutcome {
    Confirmed,
    Unverified,
}

impl BookingOutcome {
    pub fn describe(&self) -> &'static str {
        match self {
            BookingOutcome::Confirmed => "session booked successfully",
            BookingOutcome::Unverified => "booking not confirmed by the site, check the account manually",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_name_the_condition() {
        assert!(BookingError::MissingCredentials
            .to_string()
            .contains("GYM_USERNAME"));
        assert!(BookingError::ChallengeBlocked.to_string().contains("challenge"));
        assert!(BookingError::SessionNotFound("Spin Class".into())
            .to_string()
            .contains("Spin Class"));
    }

    #[test]
    fn driver_errors_pass_through_their_message() {
        let err = BookingError::from(anyhow::anyhow!("navigation did not complete within 60s"));
        assert_eq!(err.to_string(), "navigation did not complete within 60s");
    }

    #[test]
    fn outcome_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&BookingOutcome::Confirmed).unwrap(),
            "\"confirmed\""
        );
        assert_eq!(
            serde_json::to_string(&BookingOutcome::Unverified).unwrap(),
            "\"unverified\""
        );
    }
}
