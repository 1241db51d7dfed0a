//! Runtime parameter structs for the gauge core.
//!
//! These are plain data with compiled defaults; the TOML-facing schema lives
//! in `gauge_config` and is bridged here via `conversions`. Out-of-range
//! values from persisted config are clamped to safe defaults with a warning
//! rather than rejected (a misconfigured gauge must still report something).

/// ADC acquisition parameters.
#[derive(Debug, Clone, Copy)]
pub struct AdcParams {
    pub reference_mv: u16,
    pub divider_ratio_x100: u32,
    /// Median-of-N sample count; forced odd at build.
    pub samples: u8,
    pub read_timeout_ms: u64,
}

impl Default for AdcParams {
    fn default() -> Self {
        Self {
            reference_mv: crate::estimator::DEFAULT_REFERENCE_MV,
            divider_ratio_x100: 200,
            samples: 5,
            read_timeout_ms: 50,
        }
    }
}

/// Absolute sanity bounds on the configurable presence envelope.
pub const PRESENCE_FLOOR_MV: u16 = 2500;
pub const PRESENCE_CEIL_MV: u16 = 5000;

/// Voltage envelope outside which the battery is treated as absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenceBounds {
    pub min_mv: u16,
    pub max_mv: u16,
}

impl Default for PresenceBounds {
    fn default() -> Self {
        Self {
            min_mv: 3000,
            max_mv: 4200,
        }
    }
}

impl PresenceBounds {
    /// Clamp configured bounds into the absolute sane range; an inverted
    /// pair falls back to the defaults.
    pub fn clamped(min_mv: u16, max_mv: u16) -> Self {
        let min = min_mv.clamp(PRESENCE_FLOOR_MV, PRESENCE_CEIL_MV);
        let max = max_mv.clamp(PRESENCE_FLOOR_MV, PRESENCE_CEIL_MV);
        if min >= max {
            tracing::warn!(
                min_mv,
                max_mv,
                "presence bounds inverted or degenerate, using defaults"
            );
            return Self::default();
        }
        if min != min_mv || max != max_mv {
            tracing::warn!(min_mv, max_mv, min, max, "presence bounds clamped");
        }
        Self {
            min_mv: min,
            max_mv: max,
        }
    }

    #[inline]
    pub fn contains(&self, voltage_mv: u16) -> bool {
        (self.min_mv..=self.max_mv).contains(&voltage_mv)
    }
}

/// Low/critical warning levels in percent.
#[derive(Debug, Clone, Copy)]
pub struct WarnThresholds {
    pub low_percent: u8,
    pub critical_percent: u8,
}

impl Default for WarnThresholds {
    fn default() -> Self {
        Self {
            low_percent: 15,
            critical_percent: 5,
        }
    }
}

/// Tuning constants for the charge/discharge inference state machine.
///
/// The rate thresholds switch at voltage breakpoints (`mid_voltage_mv`,
/// `high_voltage_mv`); those breakpoints are tuned values kept configurable.
#[derive(Debug, Clone, Copy)]
pub struct InferenceParams {
    pub immediate_percent: u8,
    pub candidate_percent: u8,
    pub sustained_percent: u8,
    /// Hold window in ticks; 0 falls back to 3 ticks.
    pub hold_samples: u32,
    pub discharge_rate_mid: i32,
    pub discharge_rate_low: i32,
    pub charge_rate_high: i32,
    pub charge_rate_low: i32,
    pub mid_voltage_mv: u16,
    pub high_voltage_mv: u16,
}

impl Default for InferenceParams {
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

impl InferenceParams {
    /// Hold window in milliseconds for a given tick interval.
    pub fn hold_window_ms(&self, tick_interval_ms: u64) -> u64 {
        let samples = if self.hold_samples == 0 {
            3
        } else {
            u64::from(self.hold_samples)
        };
        samples.saturating_mul(tick_interval_ms)
    }

    /// Discharge rate threshold (mV/min, negative) for the given voltage.
    /// Stricter above the mid breakpoint where discharge is slower.
    #[inline]
    pub fn discharge_rate_threshold(&self, voltage_mv: u16) -> i32 {
        if voltage_mv >= self.mid_voltage_mv {
            self.discharge_rate_mid
        } else {
            self.discharge_rate_low
        }
    }

    /// Charge rate threshold (mV/min, positive) for the given voltage.
    /// Relaxed near full where the charger tapers.
    #[inline]
    pub fn charge_rate_threshold(&self, voltage_mv: u16) -> i32 {
        if voltage_mv >= self.high_voltage_mv {
            self.charge_rate_high
        } else {
            self.charge_rate_low
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presence_clamps_into_sane_range() {
        let b = PresenceBounds::clamped(1000, 6000);
        assert_eq!(b.min_mv, PRESENCE_FLOOR_MV);
        assert_eq!(b.max_mv, PRESENCE_CEIL_MV);
    }

    #[test]
    fn inverted_presence_falls_back_to_defaults() {
        assert_eq!(PresenceBounds::clamped(4200, 3000), PresenceBounds::default());
    }

    #[test]
    fn hold_window_zero_samples_falls_back() {
        let p = InferenceParams {
            hold_samples: 0,
            ..Default::default()
        };
        assert_eq!(p.hold_window_ms(60_000), 180_000);
    }

    #[test]
    fn rate_thresholds_switch_at_breakpoints() {
        let p = InferenceParams::default();
        // Breakpoints themselves take the higher-voltage branch.
        assert_eq!(p.discharge_rate_threshold(3700), -15);
        assert_eq!(p.discharge_rate_threshold(3699), -30);
        assert_eq!(p.charge_rate_threshold(4100), 20);
        assert_eq!(p.charge_rate_threshold(4099), 25);
    }
}
