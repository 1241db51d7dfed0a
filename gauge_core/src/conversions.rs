//! `From` implementations bridging `gauge_config` types to `gauge_core` types.
//!
//! These eliminate the manual field-by-field mapping previously needed in the CLI.

use crate::config::{AdcParams, InferenceParams, WarnThresholds};
use crate::curve::DischargeCurve;

impl From<&gauge_config::AdcCfg> for AdcParams {
    fn from(c: &gauge_config::AdcCfg) -> Self {
        Self {
            reference_mv: c.reference_mv,
            divider_ratio_x100: c.divider_ratio_x100,
            samples: c.samples,
            read_timeout_ms: c.read_timeout_ms,
        }
    }
}

impl From<&gauge_config::ThresholdCfg> for WarnThresholds {
    fn from(c: &gauge_config::ThresholdCfg) -> Self {
        Self {
            low_percent: c.low_percent,
            critical_percent: c.critical_percent,
        }
    }
}

impl From<&gauge_config::InferenceCfg> for InferenceParams {
    fn from(c: &gauge_config::InferenceCfg) -> Self {
        Self {
            immediate_percent: c.immediate_percent,
            candidate_percent: c.candidate_percent,
            sustained_percent: c.sustained_percent,
            hold_samples: c.hold_samples,
            discharge_rate_mid: c.discharge_rate_mid,
            discharge_rate_low: c.discharge_rate_low,
            charge_rate_high: c.charge_rate_high,
            charge_rate_low: c.charge_rate_low,
            mid_voltage_mv: c.mid_voltage_mv,
            high_voltage_mv: c.high_voltage_mv,
        }
    }
}

impl From<&gauge_config::CurveCfg> for DischargeCurve {
    fn from(c: &gauge_config::CurveCfg) -> Self {
        DischargeCurve::from_tables(&c.mv, &c.percent)
    }
}
