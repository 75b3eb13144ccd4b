//! Risk bands and BAC thresholds.

use serde::Serialize;

/// Legal driving limit, percent BAC
pub const LEGAL_LIMIT: f64 = 0.08;

/// Lower edge of the red band
pub const DANGER_THRESHOLD: f64 = 0.2;

/// Level of the "High Risk" marker line
pub const HIGH_RISK_LINE: f64 = 0.3;

/// Upper edge of the shaded red zone
pub const RED_ZONE_TOP: f64 = 0.4;

/// Color-coded risk classification of a BAC value
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RiskBand {
    Green,
    Yellow,
    Red,
}

impl RiskBand {
    /// Classify a BAC value
    ///
    /// Lower bounds are inclusive: exactly 0.08 is yellow, exactly 0.2 is red.
    pub fn classify(bac: f64) -> Self {
        if bac < LEGAL_LIMIT {
            RiskBand::Green
        } else if bac < DANGER_THRESHOLD {
            RiskBand::Yellow
        } else {
            RiskBand::Red
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskBand::Green => "green",
            RiskBand::Yellow => "yellow",
            RiskBand::Red => "red",
        }
    }
}
