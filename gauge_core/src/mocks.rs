//! Test and helper mocks for gauge_core

use std::collections::VecDeque;
use std::time::Duration;

/// An ADC that always errors on read; useful where a monitor is constructed
/// but never ticked, or to exercise error paths.
pub struct NoopAdc;

impl gauge_traits::AdcInput for NoopAdc {
    fn read(&mut self, _timeout: Duration) -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(std::io::Error::other("noop adc")))
    }
}

/// Replays a scripted sequence of raw readings; repeats the last value once
/// exhausted so paced callers never starve.
pub struct SequenceAdc {
    values: VecDeque<u16>,
    last: u16,
}

impl SequenceAdc {
    pub fn new(values: Vec<u16>) -> Self {
        let last = values.last().copied().unwrap_or(0);
        Self {
            values: values.into(),
            last,
        }
    }
}

impl gauge_traits::AdcInput for SequenceAdc {
    fn read(&mut self, _timeout: Duration) -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
        if let Some(v) = self.values.pop_front() {
            self.last = v;
            Ok(v)
        } else {
            Ok(self.last)
        }
    }
}

/// A charge pin reporting a fixed level, flippable from the test body.
pub struct FixedChargePin(pub std::sync::Arc<std::sync::atomic::AtomicBool>);

impl gauge_traits::ChargePin for FixedChargePin {
    fn is_charging(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.0.load(std::sync::atomic::Ordering::Relaxed))
    }
}
