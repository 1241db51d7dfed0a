//! Maps `Box<dyn Error>` from trait boundaries to typed `GaugeError`.
//!
//! The traits in `gauge_traits` use `Box<dyn Error + Send + Sync>` for maximum
//! flexibility; this module converts those to our typed error enum, with an
//! optional feature-gated path for `gauge_hardware::HwError` downcasting.

use crate::error::GaugeError;

/// Map a trait-boundary error to a typed `GaugeError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> GaugeError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<gauge_hardware::error::HwError>() {
            return match hw {
                gauge_hardware::error::HwError::Timeout => GaugeError::Timeout,
                other => GaugeError::HardwareFault(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        GaugeError::Timeout
    } else {
        GaugeError::Hardware(s)
    }
}
