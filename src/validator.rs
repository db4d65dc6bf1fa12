//! Fix validation.
//!
//! A fix is accepted only if every check passes:
//! 1. Coordinate is finite and in range, altitude is finite
//! 2. Horizontal accuracy is known and within the limit
//! 3. Vertical accuracy, when known, is within the limit
//! 4. The fix is fresh (not a cached replay)
//! 5. Enough time has passed since the last accepted fix (debounce)
//! 6. The implied speed from the last accepted fix is plausible
//!
//! Validation is a pure function of the fix, the previous accepted fix, the
//! previous acceptance time and "now". The validator holds no session state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::seconds_between;
use crate::config::{FirstFixPolicy, ValidationConfig};
use crate::geo_utils::DistanceFormula;
use crate::PositionFix;

/// Why a fix was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FixRejection {
    /// Latitude/longitude not finite or out of range
    InvalidCoordinate,
    /// Altitude is NaN or infinite
    InvalidAltitude,
    /// Receiver reported no horizontal accuracy
    UnknownHorizontalAccuracy,
    HorizontalAccuracyTooLow { accuracy: f64, max: f64 },
    VerticalAccuracyTooLow { accuracy: f64, max: f64 },
    /// Fix age in seconds exceeded the limit
    Stale { age: f64, max_age: f64 },
    /// Arrived sooner than the minimum update interval
    TooFrequent { elapsed: f64, min_interval: f64 },
    /// Implied speed (m/s) from the last accepted fix is not plausible on foot
    ImplausibleSpeed { speed: f64, max_speed: f64 },
}

/// Accept/reject predicate for incoming fixes.
#[derive(Debug, Clone)]
pub struct FixValidator {
    config: ValidationConfig,
    distance_formula: DistanceFormula,
}

impl FixValidator {
    pub fn new(config: ValidationConfig, distance_formula: DistanceFormula) -> Self {
        Self {
            config,
            distance_formula,
        }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Returns true if `fix` should be accepted.
    pub fn is_valid(
        &self,
        fix: &PositionFix,
        last_accepted_fix: Option<&PositionFix>,
        last_accepted_time: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> bool {
        self.check(fix, last_accepted_fix, last_accepted_time, now)
            .is_ok()
    }

    /// Run every check, returning the first one that fails.
    pub fn check(
        &self,
        fix: &PositionFix,
        last_accepted_fix: Option<&PositionFix>,
        last_accepted_time: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<(), FixRejection> {
        let config = &self.config;

        if !fix.coordinate.is_valid() {
            return Err(FixRejection::InvalidCoordinate);
        }
        if !fix.altitude.is_finite() {
            return Err(FixRejection::InvalidAltitude);
        }

        if last_accepted_fix.is_none()
            && config.first_fix == FirstFixPolicy::AcceptUnconditionally
        {
            return Ok(());
        }

        if !fix.has_horizontal_accuracy() {
            return Err(FixRejection::UnknownHorizontalAccuracy);
        }
        if fix.horizontal_accuracy > config.max_horizontal_accuracy {
            return Err(FixRejection::HorizontalAccuracyTooLow {
                accuracy: fix.horizontal_accuracy,
                max: config.max_horizontal_accuracy,
            });
        }

        if fix.has_vertical_accuracy() && fix.vertical_accuracy > config.max_vertical_accuracy {
            return Err(FixRejection::VerticalAccuracyTooLow {
                accuracy: fix.vertical_accuracy,
                max: config.max_vertical_accuracy,
            });
        }

        let age = seconds_between(fix.timestamp, now).abs();
        if age >= config.max_fix_age {
            return Err(FixRejection::Stale {
                age,
                max_age: config.max_fix_age,
            });
        }

        if let Some(last_time) = last_accepted_time {
            let elapsed = seconds_between(last_time, now);
            if elapsed < config.min_update_interval {
                return Err(FixRejection::TooFrequent {
                    elapsed,
                    min_interval: config.min_update_interval,
                });
            }
        }

        if let Some(last) = last_accepted_fix {
            let elapsed = seconds_between(last.timestamp, fix.timestamp);
            if elapsed > 0.0 {
                let distance = self
                    .distance_formula
                    .distance(&last.coordinate, &fix.coordinate);
                let speed = distance / elapsed;
                if speed > config.max_speed {
                    return Err(FixRejection::ImplausibleSpeed {
                        speed,
                        max_speed: config.max_speed,
                    });
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo_utils::haversine_distance;
    use crate::GpsPoint;
    use chrono::Duration;

    fn validator(config: ValidationConfig) -> FixValidator {
        FixValidator::new(config, DistanceFormula::Haversine)
    }

    fn fix_at(lat: f64, accuracy: f64, timestamp: DateTime<Utc>) -> PositionFix {
        PositionFix::new(GpsPoint::new(lat, 11.0), 1000.0, accuracy, timestamp)
    }

    #[test]
    fn test_accepts_good_first_fix() {
        let now = Utc::now();
        let v = validator(ValidationConfig::default());
        assert!(v.is_valid(&fix_at(46.0, 5.0, now), None, None, now));
    }

    #[test]
    fn test_horizontal_accuracy() {
        let now = Utc::now();
        let v = validator(ValidationConfig {
            max_horizontal_accuracy: 50.0,
            ..ValidationConfig::default()
        });

        assert_eq!(
            v.check(&fix_at(46.0, 60.0, now), None, None, now),
            Err(FixRejection::HorizontalAccuracyTooLow {
                accuracy: 60.0,
                max: 50.0
            })
        );
        assert_eq!(
            v.check(&fix_at(46.0, -1.0, now), None, None, now),
            Err(FixRejection::UnknownHorizontalAccuracy)
        );
        assert!(v.is_valid(&fix_at(46.0, 50.0, now), None, None, now));
        assert!(v.is_valid(&fix_at(46.0, 0.0, now), None, None, now));
    }

    #[test]
    fn test_vertical_accuracy_only_when_known() {
        let now = Utc::now();
        let v = validator(ValidationConfig::default());

        let unknown = fix_at(46.0, 5.0, now);
        assert!(v.is_valid(&unknown, None, None, now));

        let poor = unknown.with_vertical_accuracy(80.0);
        assert!(matches!(
            v.check(&poor, None, None, now),
            Err(FixRejection::VerticalAccuracyTooLow { .. })
        ));

        let good = unknown.with_vertical_accuracy(12.0);
        assert!(v.is_valid(&good, None, None, now));
    }

    #[test]
    fn test_stale_fix() {
        let now = Utc::now();
        let v = validator(ValidationConfig::default());

        let old = fix_at(46.0, 5.0, now - Duration::seconds(30));
        assert!(matches!(
            v.check(&old, None, None, now),
            Err(FixRejection::Stale { .. })
        ));

        // Clock skew into the future counts the same way
        let future = fix_at(46.0, 5.0, now + Duration::seconds(30));
        assert!(!v.is_valid(&future, None, None, now));

        let relaxed = validator(ValidationConfig {
            max_fix_age: 120.0,
            ..ValidationConfig::default()
        });
        assert!(relaxed.is_valid(&old, None, None, now));
    }

    #[test]
    fn test_debounce() {
        let t0 = Utc::now();
        let v = validator(ValidationConfig::default());
        let first = fix_at(46.0, 5.0, t0);

        let now = t0 + Duration::seconds(1);
        let second = fix_at(46.00001, 5.0, now);
        assert!(matches!(
            v.check(&second, Some(&first), Some(t0), now),
            Err(FixRejection::TooFrequent { .. })
        ));

        let now = t0 + Duration::seconds(3);
        let second = fix_at(46.00001, 5.0, now);
        assert!(v.is_valid(&second, Some(&first), Some(t0), now));
    }

    #[test]
    fn test_implausible_speed() {
        let t0 = Utc::now();
        let v = validator(ValidationConfig::default());
        let first = fix_at(46.0, 5.0, t0);

        // ~250 m in 5 s = 50 m/s
        let now = t0 + Duration::seconds(5);
        let jump = fix_at(46.0 + 250.0 / 111_195.0, 5.0, now);
        match v.check(&jump, Some(&first), Some(t0), now) {
            Err(FixRejection::ImplausibleSpeed { speed, max_speed }) => {
                assert!((speed - 50.0).abs() < 0.5);
                assert_eq!(max_speed, 20.0);
            }
            other => panic!("expected implausible speed, got {:?}", other),
        }
    }

    #[test]
    fn test_speed_exactly_at_limit_is_accepted() {
        let t0 = Utc::now();
        let now = t0 + Duration::seconds(5);
        let first = fix_at(46.0, 10.0, t0);
        let second = fix_at(46.0 + 100.0 / 111_195.0, 15.0, now);

        let distance = haversine_distance(&first.coordinate, &second.coordinate);
        let v = validator(ValidationConfig {
            max_speed: distance / 5.0,
            ..ValidationConfig::default()
        });
        assert!(v.is_valid(&second, Some(&first), Some(t0), now));
    }

    #[test]
    fn test_speed_check_skipped_without_elapsed_time() {
        let t0 = Utc::now();
        let v = validator(ValidationConfig {
            min_update_interval: 0.0,
            ..ValidationConfig::default()
        });
        let first = fix_at(46.0, 5.0, t0);
        let same_time = fix_at(46.01, 5.0, t0);
        assert!(v.is_valid(&same_time, Some(&first), Some(t0), t0));
    }

    #[test]
    fn test_invalid_coordinate() {
        let now = Utc::now();
        let v = validator(ValidationConfig {
            first_fix: FirstFixPolicy::AcceptUnconditionally,
            ..ValidationConfig::default()
        });
        let fix = PositionFix::new(GpsPoint::new(f64::NAN, 11.0), 1000.0, 5.0, now);
        assert_eq!(
            v.check(&fix, None, None, now),
            Err(FixRejection::InvalidCoordinate)
        );
    }

    #[test]
    fn test_non_finite_altitude() {
        let now = Utc::now();
        let v = validator(ValidationConfig {
            first_fix: FirstFixPolicy::AcceptUnconditionally,
            ..ValidationConfig::default()
        });
        let previous = fix_at(46.0, 5.0, now - Duration::seconds(5));

        for altitude in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let mut fix = fix_at(46.0001, 5.0, now);
            fix.altitude = altitude;
            assert_eq!(
                v.check(&fix, None, None, now),
                Err(FixRejection::InvalidAltitude)
            );
            assert_eq!(
                v.check(&fix, Some(&previous), None, now),
                Err(FixRejection::InvalidAltitude)
            );
        }
    }

    #[test]
    fn test_first_fix_policy() {
        let now = Utc::now();
        let poor_and_old = fix_at(46.0, 200.0, now - Duration::seconds(60));

        let strict = validator(ValidationConfig::default());
        assert!(!strict.is_valid(&poor_and_old, None, None, now));

        let lenient = validator(ValidationConfig {
            first_fix: FirstFixPolicy::AcceptUnconditionally,
            ..ValidationConfig::default()
        });
        assert!(lenient.is_valid(&poor_and_old, None, None, now));

        // Only the first fix gets the pass
        let first = fix_at(46.0, 5.0, now - Duration::seconds(5));
        assert!(!lenient.is_valid(&poor_and_old, Some(&first), None, now));
    }

    #[test]
    fn test_deterministic() {
        let t0 = Utc::now();
        let v = validator(ValidationConfig::default());
        let first = fix_at(46.0, 5.0, t0);
        let now = t0 + Duration::seconds(4);
        let candidates = [
            fix_at(46.0001, 5.0, now),
            fix_at(46.01, 5.0, now),
            fix_at(46.0001, 30.0, now),
        ];
        for fix in &candidates {
            let a = v.check(fix, Some(&first), Some(t0), now);
            let b = v.check(fix, Some(&first), Some(t0), now);
            assert_eq!(a, b);
        }
    }
}
