//! Median-of-N acquisition over the raw analog input.

use std::time::Duration;

use eyre::WrapErr;
use gauge_traits::AdcInput;

use crate::error::Result;
use crate::hw_error::map_hw_error;

/// Read `samples` raw values and return the median. A single spiky reading
/// among N cannot move the result, which is the whole point; `samples`
/// should be odd so the middle element is a real reading.
pub fn median_raw(adc: &mut dyn AdcInput, samples: u8, timeout: Duration) -> Result<u16> {
    let n = usize::from(samples.max(1));
    let mut buf = Vec::with_capacity(n);
    for _ in 0..n {
        let v = adc
            .read(timeout)
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("reading adc")?;
        buf.push(v);
    }
    buf.sort_unstable();
    Ok(buf[n / 2])
}
