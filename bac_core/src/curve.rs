//! Sampled BAC decay curve.
//!
//! The curve is a straight-line decay from the current BAC, clamped at zero,
//! sampled at evenly spaced times from 0 to the time-to-zero horizon.

use crate::risk::{RiskBand, LEGAL_LIMIT};
use serde::Serialize;

/// Fixed legacy slope for the plotted curve, independent of metabolism rate
pub const DISPLAY_DECAY_RATE: f64 = 0.015;

/// Number of samples along the time axis
pub const DEFAULT_SAMPLES: usize = 200;

/// One sample of the curve
#[derive(Clone, Copy, Debug, Serialize, PartialEq)]
pub struct CurvePoint {
    pub hours: f64,
    pub bac: f64,
}

impl CurvePoint {
    pub fn band(&self) -> RiskBand {
        RiskBand::classify(self.bac)
    }
}

/// Ordered BAC samples over a time horizon
#[derive(Clone, Debug, Default)]
pub struct DecayCurve {
    points: Vec<CurvePoint>,
}

impl DecayCurve {
    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Highest sampled BAC, or 0 for an empty curve
    pub fn max_bac(&self) -> f64 {
        self.points.iter().map(|p| p.bac).fold(0.0, f64::max)
    }

    /// Consecutive sample pairs, each tagged with the band of its starting sample
    pub fn segments(&self) -> impl Iterator<Item = (CurvePoint, CurvePoint, RiskBand)> + '_ {
        self.points
            .windows(2)
            .map(|pair| (pair[0], pair[1], pair[0].band()))
    }

    /// First sample whose BAC is strictly above the legal limit
    pub fn first_over_limit(&self) -> Option<CurvePoint> {
        self.points.iter().copied().find(|p| p.bac > LEGAL_LIMIT)
    }
}

/// `samples` evenly spaced values from 0 to `end`, both ends included
pub fn linspace(end: f64, samples: usize) -> Vec<f64> {
    match samples {
        0 => Vec::new(),
        1 => vec![0.0],
        n => {
            let step = end / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { i as f64 * step })
                .collect()
        }
    }
}

/// Sample a linear decay from `current_bac` at `decay_rate` per hour
pub fn sample_decay_curve(
    current_bac: f64,
    time_to_zero: f64,
    decay_rate: f64,
    samples: usize,
) -> DecayCurve {
    let points = linspace(time_to_zero, samples)
        .into_iter()
        .map(|hours| CurvePoint {
            hours,
            bac: (current_bac - hours * decay_rate).max(0.0),
        })
        .collect();

    DecayCurve { points }
}

/// Hours until a linear decay from `current_bac` reaches the legal limit
///
/// Returns `None` when the rate cannot bring the value down.
pub fn hours_to_legal(current_bac: f64, decay_rate: f64) -> Option<f64> {
    if decay_rate > 0.0 {
        Some(((current_bac - LEGAL_LIMIT) / decay_rate).max(0.0))
    } else {
        None
    }
}
