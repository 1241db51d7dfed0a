use thiserror::Error;

/// Typed hardware errors surfaced across the `AdcInput`/`ChargePin` boundary.
#[derive(Debug, Error)]
pub enum HwError {
    #[error("timeout waiting for ADC conversion")]
    Timeout,
    #[error("adc reading out of range: {raw}")]
    OutOfRange { raw: u32 },
    #[error("io error: {0}")]
    Io(String),
    #[error("hardware unavailable: {0}")]
    Unavailable(&'static str),
}
