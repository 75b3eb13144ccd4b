//! Orchestration: estimate, derive time horizons, render, summarize.
//!
//! This module implements the single request/response operation:
//! 1. BAC now and at t=0 (peak)
//! 2. Time to sober and time to the legal limit
//! 3. Dashboard chart and summary text

use crate::chart::{render_chart_png, ChartRequest};
use crate::config::ChartConfig;
use crate::curve::{sample_decay_curve, DecayCurve, DISPLAY_DECAY_RATE};
use crate::estimator::{estimate_bac, peak_bac};
use crate::risk::{DANGER_THRESHOLD, LEGAL_LIMIT};
use crate::{BacInput, Result};
use serde::Serialize;

/// Time horizon used when the metabolism rate cannot bring BAC down
pub const FALLBACK_TIME_TO_ZERO_HOURS: f64 = 0.1;

pub const HIGH_RISK_WARNING: &str = "⚠️ High risk!";

/// Hours until BAC reaches zero, with the named fallback for non-positive rates
pub fn resolve_time_to_zero(bac_now: f64, metabolism_rate: f64) -> f64 {
    if metabolism_rate > 0.0 {
        bac_now / metabolism_rate
    } else {
        tracing::debug!(
            "Metabolism rate {} is not positive, using fallback horizon",
            metabolism_rate
        );
        FALLBACK_TIME_TO_ZERO_HOURS
    }
}

/// Hours until BAC falls to the legal limit
///
/// With a non-positive rate the limit is never reached from above
/// (`+inf`), and is already met from at or below (0).
pub fn resolve_time_to_legal(bac_now: f64, metabolism_rate: f64) -> f64 {
    if metabolism_rate > 0.0 {
        ((bac_now - LEGAL_LIMIT) / metabolism_rate).max(0.0)
    } else if bac_now > LEGAL_LIMIT {
        f64::INFINITY
    } else {
        0.0
    }
}

/// Scalar results of one query
#[derive(Clone, Copy, Debug, Serialize, PartialEq)]
pub struct BacEstimate {
    pub bac_now: f64,
    pub peak_bac: f64,
    pub time_to_zero: f64,
    pub time_to_legal: f64,
}

impl BacEstimate {
    pub fn compute(input: &BacInput) -> Self {
        let bac_now = estimate_bac(input);
        let peak_bac = peak_bac(input);

        Self {
            bac_now,
            peak_bac,
            time_to_zero: resolve_time_to_zero(bac_now, input.metabolism_rate),
            time_to_legal: resolve_time_to_legal(bac_now, input.metabolism_rate),
        }
    }

    pub fn high_risk(&self) -> bool {
        self.peak_bac >= DANGER_THRESHOLD
    }

    /// Human-readable summary, one labeled value per line
    ///
    /// The last line holds the high-risk warning, or is empty.
    pub fn summary(&self) -> String {
        let warning = if self.high_risk() {
            HIGH_RISK_WARNING
        } else {
            ""
        };
        format!(
            "Current BAC: {:.3}%\n\
             Peak BAC: {:.3}%\n\
             Estimated time to sober: {:.1} hours\n\
             Time to reach legal limit: {:.1} hours\n\
             {}",
            self.bac_now, self.peak_bac, self.time_to_zero, self.time_to_legal, warning
        )
    }
}

/// Everything returned to the UI for one query
#[derive(Clone, Debug, Serialize)]
pub struct BacReport {
    #[serde(flatten)]
    pub estimate: BacEstimate,
    pub high_risk: bool,
    pub summary: String,
    #[serde(skip)]
    pub chart_png: Vec<u8>,
}

impl BacReport {
    pub fn from_estimate(estimate: BacEstimate, chart_png: Vec<u8>) -> Self {
        Self {
            estimate,
            high_risk: estimate.high_risk(),
            summary: estimate.summary(),
            chart_png,
        }
    }
}

/// Slope used for the plotted curve
///
/// Follows the metabolism rate unless the legacy fixed slope is configured.
pub fn curve_decay_rate(metabolism_rate: f64, config: &ChartConfig) -> f64 {
    if config.legacy_display_slope {
        if metabolism_rate != DISPLAY_DECAY_RATE {
            tracing::warn!(
                "Chart uses fixed slope {} but metabolism rate is {}; curve and summary will disagree",
                DISPLAY_DECAY_RATE,
                metabolism_rate
            );
        }
        DISPLAY_DECAY_RATE
    } else {
        metabolism_rate
    }
}

/// The curve that `run` would plot for this input
pub fn decay_curve(input: &BacInput, config: &ChartConfig) -> DecayCurve {
    let estimate = BacEstimate::compute(input);
    sample_decay_curve(
        estimate.bac_now,
        estimate.time_to_zero,
        curve_decay_rate(input.metabolism_rate, config),
        config.samples,
    )
}

/// Estimate, render and summarize one query
pub fn run(input: &BacInput, config: &ChartConfig) -> Result<BacReport> {
    let estimate = BacEstimate::compute(input);
    tracing::info!(
        "BAC now {:.3}%, peak {:.3}%, sober in {:.1}h",
        estimate.bac_now,
        estimate.peak_bac,
        estimate.time_to_zero
    );

    let request = ChartRequest {
        current_bac: estimate.bac_now,
        peak_bac: estimate.peak_bac,
        time_to_zero: estimate.time_to_zero,
        decay_rate: curve_decay_rate(input.metabolism_rate, config),
    };
    let chart_png = render_chart_png(&request, config)?;

    Ok(BacReport::from_estimate(estimate, chart_png))
}
