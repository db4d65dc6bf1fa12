//! Projection of the location provider's permission states.
//!
//! Platforms report more permission states than the tracker cares about, and
//! add new ones over time. Everything is folded into [`AuthorizationState`];
//! anything unrecognized is treated as denied.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::provider::AuthorizationScope;

/// Native permission state as reported by the location provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderAuthorization {
    NotDetermined,
    Restricted,
    Denied,
    AuthorizedAlways,
    AuthorizedWhenInUse,
    /// A raw code this version does not know about
    Unknown(i32),
}

impl ProviderAuthorization {
    /// Decode the platform's raw status code.
    ///
    /// 0 = not determined, 1 = restricted, 2 = denied, 3 = always,
    /// 4 = when in use. Any other value is kept as `Unknown`.
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::NotDetermined,
            1 => Self::Restricted,
            2 => Self::Denied,
            3 => Self::AuthorizedAlways,
            4 => Self::AuthorizedWhenInUse,
            other => Self::Unknown(other),
        }
    }
}

/// Authorization level as seen by the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthorizationState {
    /// The user has not been asked yet
    NotDetermined,
    /// Denied by the user or restricted by policy
    Denied,
    /// Positions only while the app is in the foreground
    WhenInUse,
    /// Positions in foreground and background
    Always,
}

impl AuthorizationState {
    /// Whether a session may start (or keep its start requirement) at this level.
    ///
    /// `Always` is always enough. `WhenInUse` is enough only when the session
    /// is configured for foreground-only tracking.
    pub fn permits_tracking(self, allow_foreground_only: bool) -> bool {
        match self {
            AuthorizationState::Always => true,
            AuthorizationState::WhenInUse => allow_foreground_only,
            AuthorizationState::NotDetermined | AuthorizationState::Denied => false,
        }
    }

    /// Whether asking for `scope` would show a prompt.
    ///
    /// Only an undecided state, or when-in-use asked to become always, can
    /// still change. A denial stays until the user changes it in settings.
    pub fn requires_prompt(self, scope: AuthorizationScope) -> bool {
        match self {
            AuthorizationState::NotDetermined => true,
            AuthorizationState::WhenInUse => scope == AuthorizationScope::Always,
            AuthorizationState::Denied | AuthorizationState::Always => false,
        }
    }

    /// True when no positions can be delivered at all.
    pub fn is_loss(self) -> bool {
        matches!(
            self,
            AuthorizationState::Denied | AuthorizationState::NotDetermined
        )
    }
}

impl From<ProviderAuthorization> for AuthorizationState {
    fn from(native: ProviderAuthorization) -> Self {
        match native {
            ProviderAuthorization::NotDetermined => AuthorizationState::NotDetermined,
            ProviderAuthorization::Restricted | ProviderAuthorization::Denied => {
                AuthorizationState::Denied
            }
            ProviderAuthorization::AuthorizedWhenInUse => AuthorizationState::WhenInUse,
            ProviderAuthorization::AuthorizedAlways => AuthorizationState::Always,
            ProviderAuthorization::Unknown(code) => {
                log::warn!(
                    "[Authorization] Unrecognized provider status {}, treating as denied",
                    code
                );
                AuthorizationState::Denied
            }
        }
    }
}

impl fmt::Display for AuthorizationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuthorizationState::NotDetermined => "not-determined",
            AuthorizationState::Denied => "denied",
            AuthorizationState::WhenInUse => "when-in-use",
            AuthorizationState::Always => "always",
        };
        f.write_str(name)
    }
}
