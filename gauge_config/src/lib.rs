#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and calibration math for the battery gauge.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - The structs also `Serialize` so the CLI can persist a corrected ADC
//!   reference back to disk after calibration.

pub mod calibration;

use serde::{Deserialize, Serialize};

/// ADC front-end parameters: calibrated reference and voltage divider.
#[derive(Debug, Deserialize, Serialize, Clone, Copy)]
#[serde(default)]
pub struct AdcCfg {
    /// Calibrated ADC reference in millivolts. Sane range is 2000..=4000;
    /// out-of-range values are replaced by the compiled default at build time.
    pub reference_mv: u16,
    /// Voltage divider ratio scaled by 100 (200 = 1:2 divider).
    pub divider_ratio_x100: u32,
    /// Median-of-N sample count per reading; must be odd.
    pub samples: u8,
    /// Max wait per raw ADC read (ms).
    pub read_timeout_ms: u64,
}

impl Default for AdcCfg {
    fn default() -> Self {
        Self {
            reference_mv: 3300,
            divider_ratio_x100: 200,
            samples: 5,
            read_timeout_ms: 50,
        }
    }
}

/// Battery presence envelope in millivolts.
#[derive(Debug, Deserialize, Serialize, Clone, Copy)]
#[serde(default)]
pub struct PresenceCfg {
    pub min_mv: u16,
    pub max_mv: u16,
}

impl Default for PresenceCfg {
    fn default() -> Self {
        Self {
            min_mv: 3000,
            max_mv: 4200,
        }
    }
}

/// Discharge curve as parallel breakpoint tables, sorted by descending
/// voltage. Mismatched lengths are tolerated at runtime (shorter wins).
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct CurveCfg {
    pub mv: Vec<u16>,
    pub percent: Vec<u8>,
}

impl Default for CurveCfg {
    fn default() -> Self {
        Self {
            mv: vec![4200, 4100, 4000, 3900, 3800, 3700, 3600, 3400, 3000],
            percent: vec![100, 95, 90, 80, 70, 55, 35, 10, 0],
        }
    }
}

/// Low/critical warning thresholds in percent.
#[derive(Debug, Deserialize, Serialize, Clone, Copy)]
#[serde(default)]
pub struct ThresholdCfg {
    pub low_percent: u8,
    pub critical_percent: u8,
}

impl Default for ThresholdCfg {
    fn default() -> Self {
        Self {
            low_percent: 15,
            critical_percent: 5,
        }
    }
}

/// Charge/discharge inference tuning.
///
/// The rate thresholds are split at curve-derived voltage breakpoints; the
/// split points are tuned values, kept configurable rather than derived.
#[derive(Debug, Deserialize, Serialize, Clone, Copy)]
#[serde(default)]
pub struct InferenceCfg {
    /// Single-tick percent jump that confirms a direction immediately.
    pub immediate_percent: u8,
    /// Single-tick percent delta that starts a time-gated candidate.
    pub candidate_percent: u8,
    /// Percent movement over the hold window required to confirm a candidate.
    pub sustained_percent: u8,
    /// Hold window length in ticks (0 falls back to 3 ticks).
    pub hold_samples: u32,
    /// Discharge rate threshold (mV/min) while charging, above `mid_voltage_mv`.
    pub discharge_rate_mid: i32,
    /// Discharge rate threshold (mV/min) while charging, below `mid_voltage_mv`.
    pub discharge_rate_low: i32,
    /// Charge rate threshold (mV/min) while discharging, above `high_voltage_mv`.
    pub charge_rate_high: i32,
    /// Charge rate threshold (mV/min) while discharging, below `high_voltage_mv`.
    pub charge_rate_low: i32,
    /// Voltage breakpoint separating the two discharge-rate thresholds.
    pub mid_voltage_mv: u16,
    /// Voltage breakpoint separating the two charge-rate thresholds.
    pub high_voltage_mv: u16,
}

impl Default for InferenceCfg {
    fn default() -> Self {
        Self {
            immediate_percent: 20,
            candidate_percent: 1,
            sustained_percent: 2,
            hold_samples: 3,
            discharge_rate_mid: -15,
            discharge_rate_low: -30,
            charge_rate_high: 20,
            charge_rate_low: 25,
            mid_voltage_mv: 3700,
            high_voltage_mv: 4100,
        }
    }
}

/// How the charging state is sensed.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SensingMode {
    /// No charger-status line; infer from percentage/voltage trends.
    #[default]
    Inferred,
    /// Dedicated charger-status pin; inference is bypassed.
    Pin,
}

/// Tick cadence and sensing selection.
#[derive(Debug, Deserialize, Serialize, Clone, Copy)]
#[serde(default)]
pub struct EngineCfg {
    /// Interval between pipeline runs (ms).
    pub tick_interval_ms: u64,
    pub sensing: SensingMode,
    /// GPIO number of the charger-status line; required for `sensing = "pin"`
    /// on real hardware.
    pub charge_gpio: Option<u32>,
    /// Charger-status line is active low (typical for CHRG outputs).
    pub charge_active_low: bool,
}

impl Default for EngineCfg {
    fn default() -> Self {
        Self {
            tick_interval_ms: 60_000,
            sensing: SensingMode::Inferred,
            charge_gpio: None,
            charge_active_low: true,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Default, Clone)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Default, Clone)]
#[serde(default)]
pub struct Config {
    pub adc: AdcCfg,
    pub presence: PresenceCfg,
    pub curve: CurveCfg,
    pub thresholds: ThresholdCfg,
    pub inference: InferenceCfg,
    pub engine: EngineCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // ADC
        if self.adc.samples == 0 {
            eyre::bail!("adc.samples must be >= 1");
        }
        if self.adc.samples % 2 == 0 {
            eyre::bail!("adc.samples must be odd (median-of-N)");
        }
        if self.adc.divider_ratio_x100 == 0 {
            eyre::bail!("adc.divider_ratio_x100 must be > 0");
        }
        if self.adc.read_timeout_ms == 0 {
            eyre::bail!("adc.read_timeout_ms must be >= 1");
        }

        // Presence
        if self.presence.min_mv >= self.presence.max_mv {
            eyre::bail!("presence.min_mv must be < presence.max_mv");
        }

        // Curve
        if self.curve.mv.len() < 2 || self.curve.percent.len() < 2 {
            eyre::bail!("curve needs at least two breakpoints");
        }
        if !self.curve.mv.windows(2).all(|w| w[0] > w[1]) {
            eyre::bail!("curve.mv must be strictly decreasing");
        }
        if !self.curve.percent.windows(2).all(|w| w[0] >= w[1]) {
            eyre::bail!("curve.percent must be non-increasing");
        }
        if self.curve.percent.iter().any(|&p| p > 100) {
            eyre::bail!("curve.percent values must be <= 100");
        }

        // Thresholds
        if self.thresholds.low_percent > 100 || self.thresholds.critical_percent > 100 {
            eyre::bail!("threshold percentages must be <= 100");
        }
        if self.thresholds.critical_percent > self.thresholds.low_percent {
            eyre::bail!("thresholds.critical_percent must be <= thresholds.low_percent");
        }

        // Inference
        if self.inference.candidate_percent == 0 {
            eyre::bail!("inference.candidate_percent must be >= 1");
        }
        if self.inference.immediate_percent < self.inference.candidate_percent {
            eyre::bail!("inference.immediate_percent must be >= candidate_percent");
        }

        // Engine
        if self.engine.tick_interval_ms == 0 {
            eyre::bail!("engine.tick_interval_ms must be >= 1");
        }
        if self.engine.tick_interval_ms > 24 * 60 * 60 * 1000 {
            eyre::bail!("engine.tick_interval_ms is unreasonably large (>24h)");
        }

        Ok(())
    }
}
