//! Geographic utilities: great-circle distance between GPS points.

use geo::{Distance, Geodesic, Haversine, Point};
use serde::{Deserialize, Serialize};

use crate::GpsPoint;

/// Distance formula used for every pair of points in a session.
///
/// The validator's speed check and the track accumulator use the same
/// formula, so a fix accepted at a given implied speed contributes exactly
/// that distance to the track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DistanceFormula {
    /// Spherical great-circle distance on the mean Earth radius
    #[default]
    Haversine,
    /// Ellipsoidal (WGS84) geodesic distance, slower but more accurate
    Geodesic,
}

impl DistanceFormula {
    /// Distance between two points in meters.
    pub fn distance(self, p1: &GpsPoint, p2: &GpsPoint) -> f64 {
        match self {
            DistanceFormula::Haversine => haversine_distance(p1, p2),
            DistanceFormula::Geodesic => geodesic_distance(p1, p2),
        }
    }
}

fn to_point(p: &GpsPoint) -> Point<f64> {
    Point::new(p.longitude, p.latitude)
}

/// Haversine distance between two points in meters.
pub fn haversine_distance(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    Haversine::distance(to_point(p1), to_point(p2))
}

/// WGS84 geodesic distance between two points in meters.
pub fn geodesic_distance(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    Geodesic::distance(to_point(p1), to_point(p2))
}

/// Total length of a polyline in meters.
pub fn polyline_length(points: &[GpsPoint], formula: DistanceFormula) -> f64 {
    points
        .windows(2)
        .map(|pair| formula.distance(&pair[0], &pair[1]))
        .sum()
}
