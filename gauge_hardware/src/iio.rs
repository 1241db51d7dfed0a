//! Battery-sense ADC via the Linux industrial-I/O sysfs interface.
//!
//! Reads `in_voltageN_raw` under `/sys/bus/iio/devices/iio:deviceX`. Each
//! read is a short synchronous file read; the kernel driver performs the
//! actual conversion.

use crate::error::HwError;
use gauge_traits::AdcInput;
use std::path::PathBuf;
use std::time::{Duration, Instant};

pub struct IioAdc {
    raw_path: PathBuf,
}

impl IioAdc {
    /// `device` is the iio device index, `channel` the voltage channel index.
    pub fn new(device: u32, channel: u32) -> Self {
        let raw_path = PathBuf::from(format!(
            "/sys/bus/iio/devices/iio:device{device}/in_voltage{channel}_raw"
        ));
        Self { raw_path }
    }

    /// Use an explicit sysfs attribute path (useful for tests and odd drivers).
    pub fn from_path(raw_path: impl Into<PathBuf>) -> Self {
        Self {
            raw_path: raw_path.into(),
        }
    }

    fn read_raw_once(&self) -> Result<u16, HwError> {
        let text = std::fs::read_to_string(&self.raw_path)
            .map_err(|e| HwError::Io(format!("{}: {e}", self.raw_path.display())))?;
        let raw: u32 = text
            .trim()
            .parse()
            .map_err(|e| HwError::Io(format!("parse {:?}: {e}", text.trim())))?;
        if raw > u32::from(u16::MAX) {
            return Err(HwError::OutOfRange { raw });
        }
        Ok(raw as u16)
    }
}

impl AdcInput for IioAdc {
    fn read(
        &mut self,
        timeout: Duration,
    ) -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
        // sysfs reads can transiently fail while the driver is busy; retry
        // within the caller's timeout budget.
        let deadline = Instant::now() + timeout;
        loop {
            match self.read_raw_once() {
                Ok(v) => return Ok(v),
                Err(e) => {
                    if Instant::now() >= deadline {
                        tracing::warn!(error = %e, "iio adc read failed");
                        return Err(Box::new(HwError::Timeout));
                    }
                    std::thread::sleep(Duration::from_millis(1));
                }
            }
        }
    }
}

/// Charger-status line read through the sysfs GPIO interface.
///
/// Most CHRG outputs are open-drain active low; `active_low` decodes the
/// level accordingly.
pub struct GpioChargePin {
    value_path: PathBuf,
    active_low: bool,
}

impl GpioChargePin {
    pub fn new(gpio: u32, active_low: bool) -> Self {
        Self {
            value_path: PathBuf::from(format!("/sys/class/gpio/gpio{gpio}/value")),
            active_low,
        }
    }
}

impl gauge_traits::ChargePin for GpioChargePin {
    fn is_charging(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let text = std::fs::read_to_string(&self.value_path)
            .map_err(|e| HwError::Io(format!("{}: {e}", self.value_path.display())))?;
        let level = text.trim() != "0";
        Ok(level != self.active_low)
    }
}
