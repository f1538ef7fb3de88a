//! Account credentials, read from the process environment.

use std::fmt;

use super::outcome::BookingError;

pub const USERNAME_VAR: &str = "GYM_USERNAME";
pub const PASSWORD_VAR: &str = "GYM_PASSWORD";

/// Login credentials for one run. Never persisted, never logged.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Read credentials from `GYM_USERNAME` / `GYM_PASSWORD`.
    ///
    /// A variable that is unset or blank counts as missing, and missing
    /// credentials fail the run before any browser or network activity.
    pub fn from_env() -> Result<Self, BookingError> {
        Self::from_parts(read_non_empty(USERNAME_VAR), read_non_empty(PASSWORD_VAR))
    }

    pub fn from_parts(
        username: Option<String>,
        password: Option<String>,
    ) -> Result<Self, BookingError> {
        match (username, password) {
            (Some(username), Some(password)) => Ok(Self { username, password }),
            _ => Err(BookingError::MissingCredentials),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.username.trim().is_empty() && !self.password.trim().is_empty()
    }
}

// Keep the password out of debug output and error chains.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

fn read_non_empty(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}
