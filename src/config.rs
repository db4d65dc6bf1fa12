//! Tracker configuration.
//!
//! Every threshold the fix filter and the session use is a named field here,
//! with presets for the common trade-offs between precision and battery.

use serde::{Deserialize, Serialize};

use crate::authorization::AuthorizationState;
use crate::error::{Result, TrackerError};
use crate::geo_utils::DistanceFormula;
use crate::provider::{AuthorizationScope, ReceiverSettings};
use crate::smoothing::SmoothingPolicy;

/// How the first fix of a session is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FirstFixPolicy {
    /// The first fix must pass every check like any other fix.
    /// In poor signal the session may take a while to record its first point.
    #[default]
    Validate,
    /// The first fix is accepted as long as its coordinate is valid,
    /// skipping the accuracy and age checks. The starting point may be poor.
    AcceptUnconditionally,
}

/// Thresholds for the fix validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Maximum horizontal accuracy radius in meters.
    /// Default: 20.0
    pub max_horizontal_accuracy: f64,

    /// Maximum vertical accuracy radius in meters, applied only when the fix
    /// reports one. Default: 50.0
    pub max_vertical_accuracy: f64,

    /// Fixes older than this (seconds) are cached replays and rejected.
    /// Default: 10.0. Raise to minutes for weak-signal environments.
    pub max_fix_age: f64,

    /// Minimum seconds between accepted fixes.
    /// Default: 3.0
    pub min_update_interval: f64,

    /// Maximum plausible speed in m/s between consecutive accepted fixes.
    /// Default: 20.0 (72 km/h, well above any foot travel)
    pub max_speed: f64,

    /// Treatment of the first fix of a session.
    /// Default: Validate
    pub first_fix: FirstFixPolicy,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_horizontal_accuracy: 20.0,
            max_vertical_accuracy: 50.0,
            max_fix_age: 10.0,
            min_update_interval: 3.0,
            max_speed: 20.0,
            first_fix: FirstFixPolicy::Validate,
        }
    }
}

/// Configuration for a tracking session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Fix validator thresholds
    pub validation: ValidationConfig,

    /// Altitude smoothing policy.
    /// Default: exponential, alpha 0.2
    pub smoothing: SmoothingPolicy,

    /// Distance formula for the speed check and track distance.
    /// Default: Haversine
    pub distance_formula: DistanceFormula,

    /// Hints passed to the provider when the receiver is turned on
    pub receiver: ReceiverSettings,

    /// Allow tracking with foreground-only ("when in use") authorization.
    /// Default: false (background tracking, requires "always")
    pub allow_foreground_only: bool,

    /// Stop the session when authorization is lost while tracking.
    /// Default: true
    pub stop_on_authorization_loss: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self::hiking()
    }
}

impl TrackerConfig {
    /// Balanced preset for hiking.
    pub fn hiking() -> Self {
        Self {
            validation: ValidationConfig::default(),
            smoothing: SmoothingPolicy::default(),
            distance_formula: DistanceFormula::Haversine,
            receiver: ReceiverSettings {
                desired_accuracy: 5.0,
                distance_filter: 5.0,
                background_updates: true,
            },
            allow_foreground_only: false,
            stop_on_authorization_loss: true,
        }
    }

    /// Tighter thresholds and faster updates, at a higher battery cost.
    pub fn precise() -> Self {
        Self {
            validation: ValidationConfig {
                max_horizontal_accuracy: 10.0,
                max_vertical_accuracy: 30.0,
                min_update_interval: 2.0,
                ..ValidationConfig::default()
            },
            receiver: ReceiverSettings {
                desired_accuracy: 1.0,
                distance_filter: 2.0,
                background_updates: true,
            },
            ..Self::hiking()
        }
    }

    /// Looser thresholds and fewer updates for long days out.
    pub fn battery_saver() -> Self {
        Self {
            validation: ValidationConfig {
                max_horizontal_accuracy: 50.0,
                max_vertical_accuracy: 100.0,
                min_update_interval: 10.0,
                ..ValidationConfig::default()
            },
            receiver: ReceiverSettings {
                desired_accuracy: 10.0,
                distance_filter: 10.0,
                background_updates: true,
            },
            ..Self::hiking()
        }
    }

    /// Parse a configuration from JSON. Missing fields take the hiking defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: TrackerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every threshold is usable.
    pub fn validate(&self) -> Result<()> {
        let v = &self.validation;
        let thresholds = [
            ("max_horizontal_accuracy", v.max_horizontal_accuracy),
            ("max_vertical_accuracy", v.max_vertical_accuracy),
            ("max_fix_age", v.max_fix_age),
            ("max_speed", v.max_speed),
        ];
        for (name, value) in thresholds {
            if !(value.is_finite() && value > 0.0) {
                return Err(config_error(format!("{} must be positive, got {}", name, value)));
            }
        }
        if !(v.min_update_interval.is_finite() && v.min_update_interval >= 0.0) {
            return Err(config_error(format!(
                "min_update_interval must be non-negative, got {}",
                v.min_update_interval
            )));
        }

        match self.smoothing {
            SmoothingPolicy::Exponential { alpha } if !(alpha > 0.0 && alpha <= 1.0) => {
                Err(config_error(format!("alpha must be in (0, 1], got {}", alpha)))
            }
            SmoothingPolicy::MovingAverage { window: 0 } => {
                Err(config_error("moving average window must be at least 1".to_string()))
            }
            _ => Ok(()),
        }
    }

    /// Authorization scope to request from the provider for this config.
    pub fn required_scope(&self) -> AuthorizationScope {
        if self.allow_foreground_only {
            AuthorizationScope::WhenInUse
        } else {
            AuthorizationScope::Always
        }
    }

    /// Whether `state` satisfies this config's start requirement.
    pub fn is_authorized(&self, state: AuthorizationState) -> bool {
        state.permits_tracking(self.allow_foreground_only)
    }
}

fn config_error(message: String) -> TrackerError {
    TrackerError::ConfigError { message }
}
