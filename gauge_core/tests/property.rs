//! Property tests for the curve, filter and the whole-pipeline invariants.

use proptest::prelude::*;

use gauge_core::mocks::SequenceAdc;
use gauge_core::{AdcParams, BatteryMonitor, DischargeCurve, EmaFilter};
use gauge_traits::clock::ManualClock;
use std::time::Duration;

/// Strategy producing a valid breakpoint table: strictly descending
/// voltages with non-increasing percentages.
fn curve_tables() -> impl Strategy<Value = (Vec<u16>, Vec<u8>)> {
    (2usize..8).prop_flat_map(|n| {
        (
            proptest::collection::vec(1u16..400, n),
            proptest::collection::vec(0u8..=100, n),
        )
            .prop_map(|(steps, mut pcts)| {
                let mut mv = Vec::with_capacity(steps.len());
                let mut v = 4500u16;
                for s in steps {
                    v = v.saturating_sub(s.max(1));
                    mv.push(v);
                }
                pcts.sort_unstable_by(|a, b| b.cmp(a));
                (mv, pcts)
            })
    })
}

proptest! {
    #[test]
    fn mapped_percent_always_in_range(v in any::<u16>()) {
        let c = DischargeCurve::default();
        prop_assert!(c.percent(v) <= 100);
    }

    #[test]
    fn arbitrary_valid_curves_stay_in_range_and_monotone(
        (mv, pct) in curve_tables(),
        a in any::<u16>(),
        b in any::<u16>(),
    ) {
        let c = DischargeCurve::from_tables(&mv, &pct);
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let p_lo = c.percent(lo);
        let p_hi = c.percent(hi);
        prop_assert!(p_lo <= 100 && p_hi <= 100);
        // Lower voltage never maps to a higher percentage.
        prop_assert!(p_lo <= p_hi);
    }

    #[test]
    fn ema_output_bounded_by_input_extremes(samples in proptest::collection::vec(2500u16..4500, 1..50)) {
        let mut f = EmaFilter::new();
        let min = *samples.iter().min().unwrap();
        let max = *samples.iter().max().unwrap();
        for &s in &samples {
            let out = f.update(s);
            prop_assert!(out >= min && out <= max);
        }
    }

    #[test]
    fn status_invariants_hold_over_arbitrary_tick_sequences(
        raws in proptest::collection::vec(0u16..4096, 1..40),
    ) {
        let clock = ManualClock::new();
        let mut m = BatteryMonitor::builder()
            .with_adc(SequenceAdc::new(raws.clone()))
            .with_adc_params(AdcParams { samples: 1, ..Default::default() })
            .with_clock(Box::new(clock.clone()))
            .with_tick_interval(Duration::from_secs(60))
            .build()
            .unwrap();
        for _ in 0..raws.len() {
            let s = m.tick().unwrap().clone();
            prop_assert!(s.percentage <= 100);
            prop_assert!(!(s.charging && s.discharging_inferred));
            if !s.present {
                prop_assert!(!s.valid);
                prop_assert!(!s.charging_inferred && !s.discharging_inferred);
            }
            clock.advance(Duration::from_secs(60));
        }
    }
}
