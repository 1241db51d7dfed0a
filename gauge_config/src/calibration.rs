//! Reference-voltage calibration against an external meter.
//!
//! The measured pack voltage from a trusted multimeter and the gauge's own
//! estimate at the same instant yield a corrected ADC reference:
//!
//! `new_ref = old_ref * measured_mv / estimated_mv`
//!
//! done in u32 so the intermediate product cannot overflow.

/// Bounds on a plausible ADC reference, in millivolts.
pub const REFERENCE_MIN_MV: u16 = 2000;
pub const REFERENCE_MAX_MV: u16 = 4000;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CalibrationError {
    #[error("estimated voltage is zero; cannot derive correction")]
    ZeroEstimate,
    #[error("correction ratio {measured_mv}/{estimated_mv} outside [0.5, 2.0]")]
    RatioOutOfRange { measured_mv: u16, estimated_mv: u16 },
    #[error("corrected reference {0}mV outside [{REFERENCE_MIN_MV}, {REFERENCE_MAX_MV}]mV")]
    ReferenceOutOfRange(u32),
}

/// Derive a corrected ADC reference from a meter reading.
///
/// Rejects corrections whose ratio falls outside [0.5, 2.0] or whose result
/// leaves the plausible reference range; the caller keeps the prior value.
pub fn corrected_reference(
    old_reference_mv: u16,
    measured_mv: u16,
    estimated_mv: u16,
) -> Result<u16, CalibrationError> {
    if estimated_mv == 0 {
        return Err(CalibrationError::ZeroEstimate);
    }
    let m = u32::from(measured_mv);
    let e = u32::from(estimated_mv);
    // ratio in [0.5, 2.0] <=> 2*m >= e && m <= 2*e
    if 2 * m < e || m > 2 * e {
        return Err(CalibrationError::RatioOutOfRange {
            measured_mv,
            estimated_mv,
        });
    }
    let new_ref = u32::from(old_reference_mv) * m / e;
    if new_ref < u32::from(REFERENCE_MIN_MV) || new_ref > u32::from(REFERENCE_MAX_MV) {
        return Err(CalibrationError::ReferenceOutOfRange(new_ref));
    }
    Ok(new_ref as u16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_when_estimate_matches_meter() {
        assert_eq!(corrected_reference(3300, 3700, 3700), Ok(3300));
    }

    #[test]
    fn scales_reference_proportionally() {
        // Gauge reads 3600 but the meter says 3700: reference was low.
        let r = corrected_reference(3300, 3700, 3600).unwrap();
        assert_eq!(u32::from(r), 3300u32 * 3700 / 3600);
    }

    #[test]
    fn rejects_zero_estimate() {
        assert_eq!(
            corrected_reference(3300, 3700, 0),
            Err(CalibrationError::ZeroEstimate)
        );
    }

    #[test]
    fn rejects_wild_ratio() {
        assert!(matches!(
            corrected_reference(3300, 4200, 2000),
            Err(CalibrationError::RatioOutOfRange { .. })
        ));
        assert!(matches!(
            corrected_reference(3300, 1800, 4000),
            Err(CalibrationError::RatioOutOfRange { .. })
        ));
    }

    #[test]
    fn rejects_result_outside_reference_bounds() {
        // Ratio 1.9 is accepted but pushes a 3900mV reference past 4000.
        assert!(matches!(
            corrected_reference(3900, 3800, 2000),
            Err(CalibrationError::ReferenceOutOfRange(_))
        ));
    }
}
