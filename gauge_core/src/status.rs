//! Public battery snapshot and its line format.

/// The one long-lived entity: created once with invalid defaults, rewritten
/// on every tick, read by everyone else as an immutable snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatteryStatus {
    /// Median raw ADC count, diagnostic.
    pub raw_adc: u16,
    /// Smoothed pack voltage in millivolts.
    pub voltage_mv: u16,
    pub percentage: u8,
    /// Readings trustworthy; false implies the other fields are stale.
    pub valid: bool,
    /// Voltage inside the Li-ion operating envelope.
    pub present: bool,
    pub low_battery: bool,
    pub critical_battery: bool,
    /// Hardware pin ground truth or confirmed inference.
    pub charging: bool,
    pub charging_inferred: bool,
    pub discharging_inferred: bool,
    /// Signed mV per minute.
    pub voltage_rate_mv_per_min: i32,
    /// Requires two valid samples separated by nonzero elapsed time.
    pub voltage_rate_valid: bool,
    /// Last local maximum while charging.
    pub peak_percent: Option<u8>,
    /// Last local minimum while discharging.
    pub trough_percent: Option<u8>,
}

/// Render one status line. The field order is an external contract shared
/// by the display overlay and the CLI status command; `warnings` toggles
/// the `[LOW]`/`[CRITICAL]` marker only.
pub fn format_status(status: &BatteryStatus, warnings: bool) -> String {
    use std::fmt::Write;

    if !status.present || !status.valid {
        return "not detected".to_string();
    }

    let mut line = format!(
        "ADC:{}, Volt:{}mV, {}%",
        status.raw_adc, status.voltage_mv, status.percentage
    );
    if warnings {
        if status.critical_battery {
            line.push_str(" [CRITICAL]");
        } else if status.low_battery {
            line.push_str(" [LOW]");
        }
    }
    if status.voltage_rate_valid {
        let _ = write!(line, " ({:+}mV/min)", status.voltage_rate_mv_per_min);
    }
    if status.charging {
        line.push_str(", Charging");
        if status.charging_inferred {
            line.push_str(" (inferred)");
        }
    } else if status.discharging_inferred {
        line.push_str(", Discharging (inferred)");
    }
    if let Some(peak) = status.peak_percent {
        let _ = write!(line, ", Peak:{peak}%");
    }
    if let Some(trough) = status.trough_percent {
        let _ = write!(line, ", Trough:{trough}%");
    }
    line
}
