#![forbid(unsafe_code)]

//! Core BAC estimation and risk-dashboard rendering.
//!
//! This crate provides:
//! - Input types and boundary validation
//! - Widmark-style BAC estimator
//! - Decay curve sampling and risk bands
//! - PNG dashboard renderer
//! - Orchestration into a chart plus summary report

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod estimator;
pub mod risk;
pub mod curve;
pub mod chart;
pub mod report;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::{ChartConfig, Config};
pub use estimator::{estimate_bac, peak_bac};
pub use risk::RiskBand;
pub use curve::{sample_decay_curve, DecayCurve};
pub use chart::{render, render_chart_png, ChartRequest};
pub use report::{run, BacEstimate, BacReport};
pub use export::write_curve_csv;
