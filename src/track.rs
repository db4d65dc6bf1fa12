//! # Track Accumulator
//!
//! The record of one tracking session: accepted points in acceptance order,
//! plus running totals that are updated in O(1) per point. A multi-hour hike
//! can collect thousands of points, so totals are never recomputed from the
//! whole sequence.
//!
//! A track is finalized exactly once, when its session stops. After that it
//! rejects further points.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::seconds_between;
use crate::error::{Result, TrackerError};
use crate::geo_utils::DistanceFormula;
use crate::TrackPoint;

/// Snapshot of a track's running totals.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TrackStatistics {
    /// Total distance in meters
    pub distance: f64,
    /// Cumulative altitude gain in meters
    pub ascent: f64,
    /// Cumulative altitude loss in meters (positive)
    pub descent: f64,
    pub point_count: usize,
    pub min_altitude: Option<f64>,
    pub max_altitude: Option<f64>,
}

/// An accumulated hiking track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    points: Vec<TrackPoint>,
    total_distance: f64,
    total_ascent: f64,
    total_descent: f64,
    min_altitude: Option<f64>,
    max_altitude: Option<f64>,
    distance_formula: DistanceFormula,
}

impl Track {
    /// Create an empty track starting at `start_time`.
    pub fn new(start_time: DateTime<Utc>, distance_formula: DistanceFormula) -> Self {
        Self {
            start_time,
            end_time: None,
            points: Vec::new(),
            total_distance: 0.0,
            total_ascent: 0.0,
            total_descent: 0.0,
            min_altitude: None,
            max_altitude: None,
            distance_formula,
        }
    }

    /// Append a point and update the totals from the previous point.
    ///
    /// Fails with [`TrackerError::TrackFinalized`] once the track is stopped.
    pub fn append(&mut self, point: TrackPoint) -> Result<TrackStatistics> {
        if let Some(end_time) = self.end_time {
            return Err(TrackerError::TrackFinalized { end_time });
        }

        if let Some(previous) = self.points.last() {
            self.total_distance += self
                .distance_formula
                .distance(&previous.coordinate, &point.coordinate);

            let delta = point.altitude - previous.altitude;
            if delta > 0.0 {
                self.total_ascent += delta;
            } else if delta < 0.0 {
                self.total_descent += -delta;
            }
        }

        let altitude = point.altitude;
        self.min_altitude = Some(self.min_altitude.map_or(altitude, |m| m.min(altitude)));
        self.max_altitude = Some(self.max_altitude.map_or(altitude, |m| m.max(altitude)));
        self.points.push(point);

        Ok(self.statistics())
    }

    /// Stamp the end time. Later calls keep the first end time.
    pub(crate) fn finalize(&mut self, end_time: DateTime<Utc>) {
        if self.end_time.is_none() {
            self.end_time = Some(end_time);
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.end_time.is_some()
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    pub fn last_point(&self) -> Option<&TrackPoint> {
        self.points.last()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn total_distance(&self) -> f64 {
        self.total_distance
    }

    pub fn total_ascent(&self) -> f64 {
        self.total_ascent
    }

    pub fn total_descent(&self) -> f64 {
        self.total_descent
    }

    pub fn max_altitude(&self) -> Option<f64> {
        self.max_altitude
    }

    pub fn min_altitude(&self) -> Option<f64> {
        self.min_altitude
    }

    pub fn distance_formula(&self) -> DistanceFormula {
        self.distance_formula
    }

    /// Elapsed time from start to end, or to `now` while still recording.
    pub fn duration_at(&self, now: DateTime<Utc>) -> Duration {
        self.end_time.unwrap_or(now) - self.start_time
    }

    /// Elapsed time measured against the system clock.
    pub fn duration(&self) -> Duration {
        self.duration_at(Utc::now())
    }

    /// Average speed in m/s; 0 when no time has elapsed.
    pub fn average_speed_at(&self, now: DateTime<Utc>) -> f64 {
        let seconds = seconds_between(self.start_time, self.end_time.unwrap_or(now));
        if seconds <= 0.0 {
            return 0.0;
        }
        self.total_distance / seconds
    }

    pub fn average_speed(&self) -> f64 {
        self.average_speed_at(Utc::now())
    }

    pub fn statistics(&self) -> TrackStatistics {
        TrackStatistics {
            distance: self.total_distance,
            ascent: self.total_ascent,
            descent: self.total_descent,
            point_count: self.points.len(),
            min_altitude: self.min_altitude,
            max_altitude: self.max_altitude,
        }
    }
}
