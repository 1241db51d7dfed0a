//! Raw ADC count to battery millivolts.

/// Full-scale reading of the 12-bit converter.
pub const FULL_SCALE: u32 = 4095;

/// Compiled fallback when the configured reference is implausible.
pub const DEFAULT_REFERENCE_MV: u16 = 3300;

/// Plausible range for a calibrated reference.
pub const REFERENCE_MIN_MV: u16 = 2000;
pub const REFERENCE_MAX_MV: u16 = 4000;

/// Converts a raw sample to pack millivolts.
///
/// `estimate = raw * reference_mv * divider_ratio_x100 / (FULL_SCALE * 100)`
///
/// All intermediates are u64 so the product cannot overflow; the divider
/// ratio is scaled by 100 to keep the hot path free of floating point.
#[derive(Debug, Clone, Copy)]
pub struct VoltageEstimator {
    reference_mv: u16,
    divider_ratio_x100: u32,
}

impl VoltageEstimator {
    /// Build an estimator, discarding an out-of-range reference in favor of
    /// the compiled default (warned once, here).
    pub fn new(reference_mv: u16, divider_ratio_x100: u32) -> Self {
        Self {
            reference_mv: Self::sanitize_reference(reference_mv),
            divider_ratio_x100: divider_ratio_x100.max(1),
        }
    }

    fn sanitize_reference(reference_mv: u16) -> u16 {
        if (REFERENCE_MIN_MV..=REFERENCE_MAX_MV).contains(&reference_mv) {
            reference_mv
        } else {
            tracing::warn!(
                reference_mv,
                default = DEFAULT_REFERENCE_MV,
                "configured ADC reference out of range, using default"
            );
            DEFAULT_REFERENCE_MV
        }
    }

    pub fn reference_mv(&self) -> u16 {
        self.reference_mv
    }

    /// Replace the reference after a calibration command. Same sanitation
    /// as construction.
    pub fn set_reference(&mut self, reference_mv: u16) {
        self.reference_mv = Self::sanitize_reference(reference_mv);
    }

    pub fn estimate(&self, raw: u16) -> u16 {
        let raw = u64::from(u32::from(raw).min(FULL_SCALE));
        let mv = raw * u64::from(self.reference_mv) * u64::from(self.divider_ratio_x100)
            / (u64::from(FULL_SCALE) * 100);
        mv.min(u64::from(u16::MAX)) as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_raw_is_zero_mv() {
        let e = VoltageEstimator::new(3300, 200);
        assert_eq!(e.estimate(0), 0);
    }

    #[test]
    fn full_scale_hits_reference_times_divider() {
        let e = VoltageEstimator::new(3300, 200);
        // 4095 * 3300 * 200 / 409500 = 6600
        assert_eq!(e.estimate(4095), 6600);
    }

    #[test]
    fn midrange_estimate() {
        let e = VoltageEstimator::new(3300, 200);
        // 2295 * 3300 * 200 / 409500 = 3698 (truncating)
        assert_eq!(e.estimate(2295), 3698);
    }

    #[test]
    fn raw_above_full_scale_is_clamped() {
        let e = VoltageEstimator::new(3300, 200);
        assert_eq!(e.estimate(u16::MAX), e.estimate(4095));
    }

    #[test]
    fn out_of_range_reference_falls_back_to_default() {
        let e = VoltageEstimator::new(5000, 200);
        assert_eq!(e.reference_mv(), DEFAULT_REFERENCE_MV);
        let e = VoltageEstimator::new(1500, 200);
        assert_eq!(e.reference_mv(), DEFAULT_REFERENCE_MV);
    }

    #[test]
    fn set_reference_applies_same_sanitation() {
        let mut e = VoltageEstimator::new(3300, 200);
        e.set_reference(3412);
        assert_eq!(e.reference_mv(), 3412);
        e.set_reference(9999);
        assert_eq!(e.reference_mv(), DEFAULT_REFERENCE_MV);
    }
}
