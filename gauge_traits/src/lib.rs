pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// Analog input delivering raw battery-sense ADC counts.
pub trait AdcInput {
    fn read(
        &mut self,
        timeout: std::time::Duration,
    ) -> Result<u16, Box<dyn std::error::Error + Send + Sync>>;
}

/// Optional charger-status line (e.g. TP4054 CHRG, active low on most boards).
/// Implementations return the decoded level: true while the charger reports
/// an active charge cycle.
pub trait ChargePin {
    fn is_charging(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;
}
