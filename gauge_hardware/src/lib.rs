//! ADC and charger-pin backends for the battery gauge.
//!
//! The default build ships only the simulated backend; the `hardware`
//! feature adds a Linux IIO sysfs ADC for real boards.

pub mod error;
#[cfg(feature = "hardware")]
pub mod iio;

use gauge_traits::{AdcInput, ChargePin};

const ADC_FULL_SCALE: u32 = 4095;

/// Simulated battery-sense ADC.
///
/// Plays back a configurable battery voltage with an optional per-read droop,
/// converting millivolts to raw counts with the same divider model the
/// estimator inverts. Lets the CLI and tests run without hardware.
pub struct SimulatedAdc {
    battery_mv: i32,
    droop_mv_per_read: i32,
    reference_mv: u32,
    divider_ratio_x100: u32,
}

impl SimulatedAdc {
    /// Start at `battery_mv` with no droop, using the stock 3300mV reference
    /// and a 1:2 divider.
    pub fn new(battery_mv: u16) -> Self {
        Self {
            battery_mv: i32::from(battery_mv),
            droop_mv_per_read: 0,
            reference_mv: 3300,
            divider_ratio_x100: 200,
        }
    }

    /// Millivolts subtracted from the simulated cell after every read.
    pub fn with_droop(mut self, mv_per_read: i32) -> Self {
        self.droop_mv_per_read = mv_per_read;
        self
    }

    /// Match the divider model the consumer's estimator was configured with,
    /// so raw counts decode back to `battery_mv`.
    pub fn with_divider(mut self, reference_mv: u16, divider_ratio_x100: u32) -> Self {
        self.reference_mv = u32::from(reference_mv);
        self.divider_ratio_x100 = divider_ratio_x100.max(1);
        self
    }

    fn to_raw(&self, mv: i32) -> u16 {
        let mv = mv.max(0) as u64;
        let den = u64::from(self.reference_mv) * u64::from(self.divider_ratio_x100);
        if den == 0 {
            return 0;
        }
        let raw = mv * u64::from(ADC_FULL_SCALE) * 100 / den;
        raw.min(u64::from(ADC_FULL_SCALE)) as u16
    }
}

impl AdcInput for SimulatedAdc {
    fn read(
        &mut self,
        _timeout: std::time::Duration,
    ) -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
        let raw = self.to_raw(self.battery_mv);
        self.battery_mv -= self.droop_mv_per_read;
        Ok(raw)
    }
}

/// Simulated charger-status line with a settable level.
#[derive(Debug, Default)]
pub struct SimulatedChargePin {
    charging: bool,
}

impl SimulatedChargePin {
    pub fn new(charging: bool) -> Self {
        Self { charging }
    }

    pub fn set(&mut self, charging: bool) {
        self.charging = charging;
    }
}

impl ChargePin for SimulatedChargePin {
    fn is_charging(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.charging)
    }
}
