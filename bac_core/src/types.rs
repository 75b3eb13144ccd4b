//! Core domain types for the BAC dashboard.
//!
//! This module defines the input side of the system:
//! - Biological sex and its body-water ratio
//! - The seven-parameter input record
//! - Validation rules applied at the input boundary

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Sex
// ============================================================================

/// Sex used to pick the Widmark body-water distribution ratio
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    /// Resolve a free-form label into a `Sex`
    ///
    /// Only a case-insensitive "male" resolves to `Male`. Every other label,
    /// including ones that are not recognized at all, resolves to `Female`.
    /// Surrounding whitespace is not stripped, so `" male"` is `Female`.
    pub fn from_label(label: &str) -> Self {
        match label.to_lowercase().as_str() {
            "male" => Sex::Male,
            "female" => Sex::Female,
            other => {
                tracing::debug!("Unrecognized sex label {:?}, resolving to female", other);
                Sex::Female
            }
        }
    }

    /// Widmark body-water distribution ratio
    pub fn body_water_ratio(self) -> f64 {
        match self {
            Sex::Male => 0.73,
            Sex::Female => 0.66,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Input Parameters
// ============================================================================

/// One user query: everything needed to estimate BAC at a point in time
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BacInput {
    pub drinks: u32,
    pub drink_size_oz: f64,
    pub alcohol_percent: f64,
    pub weight_lbs: f64,
    pub sex: Sex,
    pub hours_elapsed: f64,
    /// Percent BAC cleared per hour
    pub metabolism_rate: f64,
}

impl BacInput {
    /// Copy of this input evaluated at a different elapsed time
    pub fn at_hours(&self, hours_elapsed: f64) -> Self {
        Self {
            hours_elapsed,
            ..self.clone()
        }
    }

    /// Check the input against the boundary rules
    ///
    /// Weight must be positive and finite; the estimator itself would
    /// otherwise return a non-finite BAC. A metabolism rate of exactly zero
    /// is accepted and handled by the fallback horizon.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        if self.drinks == 0 {
            problems.push("drinks must be at least 1".to_string());
        }
        if !(self.drink_size_oz.is_finite() && self.drink_size_oz > 0.0) {
            problems.push(format!(
                "drink size must be a positive number of ounces, got {}",
                self.drink_size_oz
            ));
        }
        if !(self.alcohol_percent > 0.0 && self.alcohol_percent <= 100.0) {
            problems.push(format!(
                "alcohol percent must be in (0, 100], got {}",
                self.alcohol_percent
            ));
        }
        if !(self.weight_lbs.is_finite() && self.weight_lbs > 0.0) {
            problems.push(format!(
                "weight must be a positive number of pounds, got {}",
                self.weight_lbs
            ));
        }
        if !(self.hours_elapsed.is_finite() && self.hours_elapsed >= 0.0) {
            problems.push(format!(
                "hours elapsed must be zero or more, got {}",
                self.hours_elapsed
            ));
        }
        if !(self.metabolism_rate.is_finite() && self.metabolism_rate >= 0.0) {
            problems.push(format!(
                "metabolism rate must be zero or more, got {}",
                self.metabolism_rate
            ));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::InvalidInput(problems.join("; ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_input() -> BacInput {
        BacInput {
            drinks: 4,
            drink_size_oz: 12.0,
            alcohol_percent: 5.0,
            weight_lbs: 160.0,
            sex: Sex::Male,
            hours_elapsed: 0.0,
            metabolism_rate: 0.015,
        }
    }

    #[test]
    fn test_sex_label_resolution() {
        assert_eq!(Sex::from_label("Male"), Sex::Male);
        assert_eq!(Sex::from_label("MALE"), Sex::Male);
        assert_eq!(Sex::from_label("Female"), Sex::Female);
        assert_eq!(Sex::from_label("other"), Sex::Female);
        assert_eq!(Sex::from_label(""), Sex::Female);
    }

    #[test]
    fn test_sex_label_is_not_trimmed() {
        assert_eq!(Sex::from_label(" male"), Sex::Female);
        assert_eq!(Sex::from_label("male\n"), Sex::Female);
        assert_eq!(Sex::from_label("mAlE"), Sex::Male);
    }

    #[test]
    fn test_body_water_ratio() {
        assert_eq!(Sex::Male.body_water_ratio(), 0.73);
        assert_eq!(Sex::Female.body_water_ratio(), 0.66);
    }

    #[test]
    fn test_valid_input_passes() {
        assert!(sample_input().validate().is_ok());
    }

    #[test]
    fn test_zero_metabolism_is_accepted() {
        let input = BacInput {
            metabolism_rate: 0.0,
            ..sample_input()
        };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_non_positive_weight_is_rejected() {
        for weight in [0.0, -10.0, f64::NAN, f64::INFINITY] {
            let input = BacInput {
                weight_lbs: weight,
                ..sample_input()
            };
            let err = input.validate().unwrap_err();
            assert!(matches!(err, Error::InvalidInput(_)));
            assert!(err.to_string().contains("weight"));
        }
    }

    #[test]
    fn test_all_problems_reported() {
        let input = BacInput {
            drinks: 0,
            alcohol_percent: 150.0,
            hours_elapsed: -1.0,
            ..sample_input()
        };
        let message = input.validate().unwrap_err().to_string();
        assert!(message.contains("drinks"));
        assert!(message.contains("alcohol"));
        assert!(message.contains("hours"));
    }

    #[test]
    fn test_at_hours_keeps_other_fields() {
        let input = sample_input().at_hours(3.5);
        assert_eq!(input.hours_elapsed, 3.5);
        assert_eq!(input.drinks, 4);
        assert_eq!(input.sex, Sex::Male);
    }
}
