//! Interface to the platform's location provider.
//!
//! The provider owns the permission prompt and the positioning receiver. The
//! controller calls into it through [`LocationProvider`]; the provider pushes
//! fixes, permission changes and receiver errors back through the
//! controller's `handle_*` methods, one at a time and in arrival order.

use serde::{Deserialize, Serialize};

use crate::authorization::ProviderAuthorization;

/// Permission level to ask the user for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthorizationScope {
    WhenInUse,
    Always,
}

/// Hints for the receiver when tracking starts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReceiverSettings {
    /// Accuracy the receiver should aim for, in meters
    pub desired_accuracy: f64,
    /// Minimum movement in meters before the receiver reports a new fix
    pub distance_filter: f64,
    /// Keep delivering fixes while the app is in the background
    pub background_updates: bool,
}

/// Failure reported by the receiver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceiverError {
    /// Position temporarily unavailable (no signal)
    LocationUnknown,
    /// Network-assisted positioning failed
    Network,
    /// The platform refused to deliver positions
    Denied,
    Other(String),
}

impl ReceiverError {
    /// Transient errors leave an active session running.
    pub fn is_transient(&self) -> bool {
        !matches!(self, ReceiverError::Denied)
    }
}

/// Operations the controller needs from the platform.
pub trait LocationProvider: Send {
    /// Whether positioning is switched on device-wide.
    fn location_services_enabled(&self) -> bool {
        true
    }

    fn current_authorization(&self) -> ProviderAuthorization;

    /// Ask for permission. The answer arrives later through
    /// `SessionController::handle_authorization_change`.
    fn request_authorization(&mut self, scope: AuthorizationScope);

    fn start_receiving_fixes(&mut self, settings: &ReceiverSettings);

    fn stop_receiving_fixes(&mut self);
}

/// In-memory provider for replaying recorded sessions and for tests.
///
/// Authorization is whatever was last set; receiver calls are only counted.
#[derive(Debug, Clone)]
pub struct ManualProvider {
    pub services_enabled: bool,
    pub authorization: ProviderAuthorization,
    pub receiving: bool,
    pub start_calls: usize,
    pub stop_calls: usize,
    pub last_settings: Option<ReceiverSettings>,
    pub requested_scopes: Vec<AuthorizationScope>,
}

impl ManualProvider {
    pub fn new(authorization: ProviderAuthorization) -> Self {
        Self {
            services_enabled: true,
            authorization,
            receiving: false,
            start_calls: 0,
            stop_calls: 0,
            last_settings: None,
            requested_scopes: Vec::new(),
        }
    }
}

impl LocationProvider for ManualProvider {
    fn location_services_enabled(&self) -> bool {
        self.services_enabled
    }

    fn current_authorization(&self) -> ProviderAuthorization {
        self.authorization
    }

    fn request_authorization(&mut self, scope: AuthorizationScope) {
        self.requested_scopes.push(scope);
    }

    fn start_receiving_fixes(&mut self, settings: &ReceiverSettings) {
        self.receiving = true;
        self.start_calls += 1;
        self.last_settings = Some(*settings);
    }

    fn stop_receiving_fixes(&mut self) {
        self.receiving = false;
        self.stop_calls += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors() {
        assert!(ReceiverError::LocationUnknown.is_transient());
        assert!(ReceiverError::Network.is_transient());
        assert!(ReceiverError::Other("antenna".to_string()).is_transient());
        assert!(!ReceiverError::Denied.is_transient());
    }

    #[test]
    fn test_manual_provider_records_calls() {
        let mut provider = ManualProvider::new(ProviderAuthorization::NotDetermined);
        provider.request_authorization(AuthorizationScope::Always);

        let settings = ReceiverSettings {
            desired_accuracy: 5.0,
            distance_filter: 5.0,
            background_updates: true,
        };
        provider.start_receiving_fixes(&settings);
        assert!(provider.receiving);
        provider.stop_receiving_fixes();

        assert!(!provider.receiving);
        assert_eq!(provider.start_calls, 1);
        assert_eq!(provider.stop_calls, 1);
        assert_eq!(provider.last_settings, Some(settings));
        assert_eq!(provider.requested_scopes, vec![AuthorizationScope::Always]);
    }
}
