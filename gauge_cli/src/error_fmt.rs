//! Human-readable error descriptions and structured JSON error formatting.

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    use gauge_config::calibration::CalibrationError;
    use gauge_core::{BuildError, GaugeError};

    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingAdc => {
                "What happened: No ADC input was provided to the battery monitor.\nLikely causes: The ADC channel failed to initialize or was not wired into the builder.\nHow to fix: Ensure the ADC opens successfully and is passed via with_adc(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See README for a sample."
            ),
        };
    }

    if let Some(ge) = err.downcast_ref::<GaugeError>() {
        if matches!(ge, GaugeError::Timeout) {
            return "What happened: ADC read timed out.\nLikely causes: ADC not wired correctly, sysfs channel missing, or timeout too low.\nHow to fix: Verify the IIO device and channel, and consider raising adc.read_timeout_ms in the config.".to_string();
        }
        return format!(
            "What happened: {ge}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
        );
    }

    if let Some(ce) = err.downcast_ref::<CalibrationError>() {
        return match ce {
            CalibrationError::ZeroEstimate => {
                "What happened: The gauge estimated 0mV, so no correction can be derived.\nLikely causes: Battery absent, ADC stuck at zero, or wiring fault.\nHow to fix: Confirm the battery is connected and `gauge status` reports a voltage, then retry.".to_string()
            }
            CalibrationError::RatioOutOfRange { measured_mv, estimated_mv } => format!(
                "What happened: Meter reading {measured_mv}mV and gauge estimate {estimated_mv}mV differ by more than 2x.\nLikely causes: Typo in the measured value, wrong divider ratio, or probing the wrong rail.\nHow to fix: Re-measure at the battery terminals and check adc.divider_ratio_x100."
            ),
            CalibrationError::ReferenceOutOfRange(mv) => format!(
                "What happened: The corrected reference ({mv}mV) is outside the plausible range.\nLikely causes: A measured value far from the gauge estimate.\nHow to fix: Re-measure and retry; the prior reference was kept."
            ),
        };
    }

    // String-based heuristics for errors coming from init or hardware
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("timeout") && lower.contains("adc") {
        return "What happened: The ADC did not produce data within the configured timeout.\nLikely causes: Wrong IIO device/channel, wiring issues, or timeout configured too low.\nHow to fix: Check --iio-device/--iio-channel, and raise adc.read_timeout_ms.".to_string();
    }

    if lower.contains("permission denied") {
        return "What happened: Failed to open a hardware sysfs node.\nLikely causes: Insufficient permissions for /sys/bus/iio or /sys/class/gpio.\nHow to fix: Run with the right group membership or udev rules for IIO/GPIO access.".to_string();
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: 2 for hardware faults/timeouts, 3 for calibration
/// rejections, 1 for everything else.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    use gauge_config::calibration::CalibrationError;
    use gauge_core::GaugeError;

    if let Some(ge) = err.downcast_ref::<GaugeError>() {
        return match ge {
            GaugeError::Timeout | GaugeError::Hardware(_) | GaugeError::HardwareFault(_) => 2,
            _ => 1,
        };
    }
    if err.downcast_ref::<CalibrationError>().is_some() {
        return 3;
    }
    1
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use gauge_config::calibration::CalibrationError;
    use gauge_core::{BuildError, GaugeError};
    use serde_json::json;

    let reason = if err.downcast_ref::<BuildError>().is_some() {
        "BuildError"
    } else if let Some(ge) = err.downcast_ref::<GaugeError>() {
        match ge {
            GaugeError::Timeout => "Timeout",
            GaugeError::Hardware(_) | GaugeError::HardwareFault(_) => "Hardware",
            GaugeError::Config(_) => "Config",
            GaugeError::Io(_) => "Io",
        }
    } else if err.downcast_ref::<CalibrationError>().is_some() {
        "Calibration"
    } else {
        "Error"
    };

    json!({ "reason": reason, "message": humanize(err) }).to_string()
}
