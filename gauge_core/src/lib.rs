#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Battery telemetry and charge-state inference (hardware-agnostic).
//!
//! This crate turns noisy raw ADC samples into a stable percentage and a
//! charging/discharging/neutral classification without a charger-status
//! line on most boards. All hardware interaction goes through
//! `gauge_traits::AdcInput` and `gauge_traits::ChargePin`.
//!
//! ## Pipeline (one tick)
//!
//! - **Sampler**: median-of-N spike rejection (`sampler` module)
//! - **Estimator**: raw counts to millivolts via calibrated reference and
//!   divider ratio (`estimator`)
//! - **Smoother**: fixed-point EMA (`filter`)
//! - **Mapper**: piecewise-linear discharge curve (`curve`)
//! - **Presence gate + inference**: hysteresis state machine (`inference`)
//! - **Publisher**: snapshot, threshold edges, formatting (`status`, `engine`)
//!
//! ## Fixed-Point Arithmetic
//!
//! The hot path is pure integer math: millivolts in u16, 64-bit
//! intermediates for the estimator and rate computation, and a Q8
//! fixed-point EMA. No floating point anywhere in the tick.

pub mod config;
pub mod conversions;
pub mod curve;
pub mod engine;
pub mod error;
pub mod estimator;
pub mod filter;
pub mod hw_error;
pub mod inference;
pub mod mocks;
pub mod sampler;
pub mod status;
pub mod window;

pub use config::{AdcParams, InferenceParams, PresenceBounds, WarnThresholds};
pub use curve::DischargeCurve;
pub use engine::{BatteryMonitor, ChargeSensing, MonitorBuilder, Notifier, NullNotifier};
pub use error::{BuildError, GaugeError, Report, Result};
pub use estimator::VoltageEstimator;
pub use filter::EmaFilter;
pub use inference::{InferenceEngine, Phase};
pub use status::{BatteryStatus, format_status};
