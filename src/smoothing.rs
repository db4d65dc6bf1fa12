//! Causal altitude smoothing.
//!
//! GPS altitude jitters by several meters between fixes. Summing that jitter
//! inflates ascent and descent, so each accepted fix's altitude is passed
//! through a smoother before it reaches the track. Both policies only look at
//! past samples.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Smoothing policy, chosen once per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SmoothingPolicy {
    /// `state = alpha * raw + (1 - alpha) * state`, seeded with the first sample.
    /// Smaller alpha is smoother and slower to react.
    Exponential { alpha: f64 },
    /// Mean of the last `window` raw samples.
    MovingAverage { window: usize },
}

impl Default for SmoothingPolicy {
    fn default() -> Self {
        SmoothingPolicy::Exponential { alpha: 0.2 }
    }
}

#[derive(Debug, Clone)]
enum SmootherState {
    Exponential { alpha: f64, value: Option<f64> },
    MovingAverage { window: usize, samples: VecDeque<f64> },
}

/// Stateful altitude filter, one per session.
#[derive(Debug, Clone)]
pub struct AltitudeSmoother {
    state: SmootherState,
}

impl AltitudeSmoother {
    pub fn new(policy: SmoothingPolicy) -> Self {
        let state = match policy {
            SmoothingPolicy::Exponential { alpha } => {
                SmootherState::Exponential { alpha, value: None }
            }
            SmoothingPolicy::MovingAverage { window } => SmootherState::MovingAverage {
                window: window.max(1),
                samples: VecDeque::with_capacity(window.max(1) + 1),
            },
        };
        Self { state }
    }

    /// Feed one raw altitude and return the smoothed value.
    pub fn smooth(&mut self, raw_altitude: f64) -> f64 {
        match &mut self.state {
            SmootherState::Exponential { alpha, value } => {
                let next = match *value {
                    Some(previous) => *alpha * raw_altitude + (1.0 - *alpha) * previous,
                    None => raw_altitude,
                };
                *value = Some(next);
                next
            }
            SmootherState::MovingAverage { window, samples } => {
                samples.push_back(raw_altitude);
                if samples.len() > *window {
                    samples.pop_front();
                }
                samples.iter().sum::<f64>() / samples.len() as f64
            }
        }
    }

    /// Last smoothed value, or None before the first sample.
    pub fn current(&self) -> Option<f64> {
        match &self.state {
            SmootherState::Exponential { value, .. } => *value,
            SmootherState::MovingAverage { samples, .. } if samples.is_empty() => None,
            SmootherState::MovingAverage { samples, .. } => {
                Some(samples.iter().sum::<f64>() / samples.len() as f64)
            }
        }
    }

    /// Forget all prior samples.
    pub fn reset(&mut self) {
        match &mut self.state {
            SmootherState::Exponential { value, .. } => *value = None,
            SmootherState::MovingAverage { samples, .. } => samples.clear(),
        }
    }

    pub fn policy(&self) -> SmoothingPolicy {
        match &self.state {
            SmootherState::Exponential { alpha, .. } => {
                SmoothingPolicy::Exponential { alpha: *alpha }
            }
            SmootherState::MovingAverage { window, .. } => {
                SmoothingPolicy::MovingAverage { window: *window }
            }
        }
    }
}
