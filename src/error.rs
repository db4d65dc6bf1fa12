//! Unified error handling for the hike-tracker library.
//!
//! Only conditions that end an operation are errors. A rejected fix or a
//! transient receiver failure is reported as a [`SessionCondition`] and the
//! session keeps running.
//!
//! [`SessionCondition`]: crate::events::SessionCondition

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::authorization::AuthorizationState;

/// Unified error type for hike-tracker operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackerError {
    /// Current authorization is not enough to start the requested session
    #[error("Location authorization '{state}' does not allow tracking")]
    AuthorizationDenied { state: AuthorizationState },
    /// Positioning is switched off device-wide
    #[error("Location services are disabled")]
    LocationServicesDisabled,
    /// An operation that needs a session was called while idle
    #[error("No tracking session is active")]
    NoActiveSession,
    /// A point was appended to a track that has already been stopped
    #[error("Track was finalized at {end_time}, no further points accepted")]
    TrackFinalized { end_time: DateTime<Utc> },
    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError { message: String },
}

impl From<serde_json::Error> for TrackerError {
    fn from(err: serde_json::Error) -> Self {
        TrackerError::ConfigError {
            message: err.to_string(),
        }
    }
}

/// Result type alias for hike-tracker operations.
pub type Result<T> = std::result::Result<T, TrackerError>;

/// Extension trait for converting Option to TrackerError.
pub trait OptionExt<T> {
    /// Convert Option to Result with a no-active-session error.
    fn ok_or_no_session(self) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_no_session(self) -> Result<T> {
        self.ok_or(TrackerError::NoActiveSession)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TrackerError::AuthorizationDenied {
            state: AuthorizationState::WhenInUse,
        };
        assert!(err.to_string().contains("when-in-use"));

        let err = TrackerError::ConfigError {
            message: "alpha out of range".to_string(),
        };
        assert_eq!(err.to_string(), "Configuration error: alpha out of range");
    }

    #[test]
    fn test_option_ext() {
        let none: Option<i32> = None;
        assert_eq!(none.ok_or_no_session(), Err(TrackerError::NoActiveSession));
        assert_eq!(Some(3).ok_or_no_session(), Ok(3));
    }

    #[test]
    fn test_json_error_becomes_config_error() {
        let err: TrackerError = serde_json::from_str::<u32>("not json").unwrap_err().into();
        assert!(matches!(err, TrackerError::ConfigError { .. }));
    }
}
