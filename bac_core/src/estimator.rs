//! Widmark-style BAC estimation.
//!
//! All functions here are pure. No validation happens at this level: a zero
//! body weight produces a non-finite BAC, which is why `BacInput::validate`
//! rejects it at the boundary.

use crate::BacInput;

/// Grams per pound
pub const GRAMS_PER_POUND: f64 = 453.592;

/// Milliliters per US fluid ounce
pub const ML_PER_FLUID_OUNCE: f64 = 29.5735;

/// Density of ethanol in g/mL
pub const ETHANOL_DENSITY: f64 = 0.789;

/// Total mass of ethanol consumed, in grams
pub fn alcohol_grams(input: &BacInput) -> f64 {
    f64::from(input.drinks)
        * input.drink_size_oz
        * (input.alcohol_percent / 100.0)
        * ML_PER_FLUID_OUNCE
        * ETHANOL_DENSITY
}

/// BAC percent before any elapsed-time decay or clamping
pub fn raw_bac(input: &BacInput) -> f64 {
    let weight_grams = input.weight_lbs * GRAMS_PER_POUND;
    let ratio = input.sex.body_water_ratio();
    (alcohol_grams(input) / (weight_grams * ratio)) * 100.0
}

/// Estimated BAC percent after `hours_elapsed` hours, never below zero
pub fn estimate_bac(input: &BacInput) -> f64 {
    let bac = raw_bac(input) - input.metabolism_rate * input.hours_elapsed;
    // f64::max drops a NaN operand, so 0/0 clamps to zero as well
    bac.max(0.0)
}

/// BAC before any time-based decay
pub fn peak_bac(input: &BacInput) -> f64 {
    estimate_bac(&input.at_hours(0.0))
}
