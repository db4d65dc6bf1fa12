//! # Hike Tracker
//!
//! Turns the noisy position fixes of a device's GPS receiver into a clean
//! hiking track with running statistics.
//!
//! This library provides:
//! - Fix validation (accuracy, staleness, debounce, implausible speed)
//! - Causal altitude smoothing (exponential or bounded moving average)
//! - O(1) incremental distance, ascent and descent accumulation
//! - A start/pause/resume/stop session controller with observer delivery
//!
//! Acquiring permissions, driving the receiver and persisting finished
//! tracks belong to the platform. The platform implements
//! [`LocationProvider`] and pushes fixes into a [`SessionController`].
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::{Duration, Utc};
//! use hike_tracker::{
//!     GpsPoint, ManualClock, ManualProvider, PositionFix, ProviderAuthorization,
//!     SessionController, TrackerConfig,
//! };
//!
//! let clock = ManualClock::new(Utc::now());
//! let provider = ManualProvider::new(ProviderAuthorization::AuthorizedAlways);
//! let mut session = SessionController::with_clock(provider, Box::new(clock.clone()));
//!
//! session.start(TrackerConfig::hiking()).unwrap();
//!
//! for i in 0..3 {
//!     let fix = PositionFix::new(
//!         GpsPoint::new(46.5000 + i as f64 * 0.0002, 11.3000),
//!         1200.0 + i as f64 * 2.0,
//!         8.0,
//!         clock.now(),
//!     );
//!     session.handle_fix(fix);
//!     clock.advance(Duration::seconds(5));
//! }
//!
//! let track = session.stop().unwrap();
//! println!("{:.0} m, +{:.0} m", track.total_distance(), track.total_ascent());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{OptionExt, Result, TrackerError};

// Geographic utilities (distance formulas)
pub mod geo_utils;
pub use geo_utils::DistanceFormula;

// Injectable time source
pub mod clock;
pub use clock::{Clock, ManualClock, SystemClock};

// Permission state projection
pub mod authorization;
pub use authorization::{AuthorizationState, ProviderAuthorization};

// Thresholds, smoothing policy and presets
pub mod config;
pub use config::{FirstFixPolicy, TrackerConfig, ValidationConfig};

// Fix validation
pub mod validator;
pub use validator::{FixRejection, FixValidator};

// Altitude smoothing
pub mod smoothing;
pub use smoothing::{AltitudeSmoother, SmoothingPolicy};

// Track accumulation
pub mod track;
pub use track::{Track, TrackStatistics};

// External location provider interface
pub mod provider;
pub use provider::{
    AuthorizationScope, LocationProvider, ManualProvider, ReceiverError, ReceiverSettings,
};

// Observer/channel delivery of points and conditions
pub mod events;
pub use events::{SessionCondition, SessionEvent, SessionObserver};

// Session state machine
pub mod session;
pub use session::{FixOutcome, SessionController, SessionState};

// Mutex-guarded session handle for multi-threaded delivery
pub mod shared;
pub use shared::SharedSession;

// ============================================================================
// Core Types
// ============================================================================

/// A GPS coordinate with latitude and longitude.
///
/// # Example
/// ```
/// use hike_tracker::GpsPoint;
/// let point = GpsPoint::new(46.5, 11.35); // Dolomites
/// assert!(point.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// One raw reading from the positioning receiver.
///
/// Accuracy radii, speed and course use negative values for "unknown",
/// the way the receiver reports them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionFix {
    pub coordinate: GpsPoint,
    /// Altitude in meters
    pub altitude: f64,
    /// Horizontal accuracy radius in meters (negative = invalid)
    pub horizontal_accuracy: f64,
    /// Vertical accuracy radius in meters (negative = unknown)
    pub vertical_accuracy: f64,
    pub timestamp: DateTime<Utc>,
    /// Speed in m/s (negative = unknown)
    pub speed: f64,
    /// Course in degrees from north (negative = unknown)
    pub course: f64,
}

impl PositionFix {
    /// Create a fix with unknown vertical accuracy, speed and course.
    pub fn new(
        coordinate: GpsPoint,
        altitude: f64,
        horizontal_accuracy: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            coordinate,
            altitude,
            horizontal_accuracy,
            vertical_accuracy: -1.0,
            timestamp,
            speed: -1.0,
            course: -1.0,
        }
    }

    pub fn with_vertical_accuracy(mut self, vertical_accuracy: f64) -> Self {
        self.vertical_accuracy = vertical_accuracy;
        self
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_course(mut self, course: f64) -> Self {
        self.course = course;
        self
    }

    /// NaN compares false, so it counts as unknown.
    pub fn has_horizontal_accuracy(&self) -> bool {
        self.horizontal_accuracy >= 0.0
    }

    pub fn has_vertical_accuracy(&self) -> bool {
        self.vertical_accuracy >= 0.0
    }

    pub fn has_speed(&self) -> bool {
        self.speed >= 0.0
    }
}

/// A fix that passed validation, with its altitude replaced by the
/// smoothed value at the time it was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub coordinate: GpsPoint,
    /// Smoothed altitude in meters
    pub altitude: f64,
    /// Altitude as reported by the receiver
    pub raw_altitude: f64,
    pub horizontal_accuracy: f64,
    pub vertical_accuracy: f64,
    pub timestamp: DateTime<Utc>,
    pub speed: f64,
    pub course: f64,
}

impl TrackPoint {
    /// Build a track point from an accepted fix and its smoothed altitude.
    pub fn from_fix(fix: &PositionFix, smoothed_altitude: f64) -> Self {
        Self {
            coordinate: fix.coordinate,
            altitude: smoothed_altitude,
            raw_altitude: fix.altitude,
            horizontal_accuracy: fix.horizontal_accuracy,
            vertical_accuracy: fix.vertical_accuracy,
            timestamp: fix.timestamp,
            speed: fix.speed,
            course: fix.course,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
