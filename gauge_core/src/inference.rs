//! Charge/discharge inference from percentage and voltage trends.
//!
//! With no charger-status line the only evidence is movement: single-tick
//! percentage deltas, the instantaneous mV/min rate, and the percentage
//! span observed over a trailing hold window. Three layers of hysteresis
//! keep the classification from flapping on noise:
//!
//! - a large single-tick delta confirms a direction immediately;
//! - a small delta only starts a time-gated candidate, confirmed when the
//!   movement is sustained across the hold window;
//! - remembered extrema (last peak while charging, last trough while
//!   discharging) provide an exit when the level revisits old ground.

use crate::config::InferenceParams;
use crate::window::PercentWindow;

/// Confirmed classification. `Neutral` is the initial and degraded state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Neutral,
    Charging,
    Discharging,
}

/// A pending hypothesis that a direction change has begun.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    start_ms: u64,
    start_percent: u8,
}

#[derive(Debug)]
pub struct InferenceEngine {
    params: InferenceParams,
    tick_interval_ms: u64,
    phase: Phase,
    last_percent: Option<u8>,
    charge_candidate: Option<Candidate>,
    discharge_candidate: Option<Candidate>,
    peak_percent: Option<u8>,
    trough_percent: Option<u8>,
    window: PercentWindow,
}

impl InferenceEngine {
    pub fn new(params: InferenceParams, tick_interval_ms: u64) -> Self {
        Self {
            params,
            tick_interval_ms,
            phase: Phase::Neutral,
            last_percent: None,
            charge_candidate: None,
            discharge_candidate: None,
            peak_percent: None,
            trough_percent: None,
            window: PercentWindow::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn peak_percent(&self) -> Option<u8> {
        self.peak_percent
    }

    pub fn trough_percent(&self) -> Option<u8> {
        self.trough_percent
    }

    /// Full reset to Neutral with no memory. The single reset point,
    /// driven by battery absence. The sliding window is intentionally not
    /// cleared; its entries age out of every time-bounded query.
    pub fn reset(&mut self) {
        self.phase = Phase::Neutral;
        self.last_percent = None;
        self.charge_candidate = None;
        self.discharge_candidate = None;
        self.peak_percent = None;
        self.trough_percent = None;
    }

    /// Feed one tick of evidence and return the (possibly new) phase.
    ///
    /// `rate` is mV/min when the rate tracker has two samples, else `None`;
    /// classification only advances on ticks with a valid rate, but the
    /// window and delta baseline are maintained regardless.
    pub fn observe(
        &mut self,
        now_ms: u64,
        percent: u8,
        voltage_mv: u16,
        rate: Option<i32>,
    ) -> Phase {
        self.window.push(now_ms, percent);
        let Some(prev) = self.last_percent.replace(percent) else {
            return self.phase;
        };
        let Some(rate) = rate else {
            return self.phase;
        };
        let delta = i32::from(percent) - i32::from(prev);

        match self.phase {
            Phase::Neutral => self.step_neutral(now_ms, percent, delta),
            Phase::Charging => self.step_charging(now_ms, percent, voltage_mv, delta, rate),
            Phase::Discharging => self.step_discharging(now_ms, percent, voltage_mv, delta, rate),
        }
        self.phase
    }

    fn step_neutral(&mut self, now_ms: u64, percent: u8, delta: i32) {
        let immediate = i32::from(self.params.immediate_percent);
        let candidate = i32::from(self.params.candidate_percent);

        if delta >= immediate {
            tracing::info!(delta, percent, "immediate charge confirmation");
            self.enter_charging(percent);
            return;
        }
        if delta <= -immediate {
            tracing::info!(delta, percent, "immediate discharge confirmation");
            self.enter_discharging(percent);
            return;
        }

        // Time-gated candidates: confirm or expire before starting new ones.
        if self.settle_candidates(now_ms, percent) {
            return;
        }

        // A crossing delta claims its direction outright: the opposite
        // candidate is stale evidence and is dropped on the spot, while a
        // same-direction candidate keeps its original start time.
        if delta >= candidate {
            self.discharge_candidate = None;
            if self.charge_candidate.is_none() {
                tracing::debug!(delta, percent, "charge candidate started");
                self.charge_candidate = Some(Candidate {
                    start_ms: now_ms,
                    start_percent: percent,
                });
            }
        } else if delta <= -candidate {
            self.charge_candidate = None;
            if self.discharge_candidate.is_none() {
                tracing::debug!(delta, percent, "discharge candidate started");
                self.discharge_candidate = Some(Candidate {
                    start_ms: now_ms,
                    start_percent: percent,
                });
            }
        } else if self.charge_candidate.is_none() && self.discharge_candidate.is_none() {
            // Fully quiet: old extrema no longer describe anything.
            self.peak_percent = None;
            self.trough_percent = None;
        }
    }

    /// Evaluate any active candidate whose hold window has elapsed.
    /// Returns true when a candidate confirmed and the phase changed.
    fn settle_candidates(&mut self, now_ms: u64, percent: u8) -> bool {
        let hold_ms = self.params.hold_window_ms(self.tick_interval_ms);
        let sustained = self.params.sustained_percent;
        let cutoff = now_ms.saturating_sub(hold_ms);

        if let Some(c) = self.charge_candidate
            && now_ms.saturating_sub(c.start_ms) >= hold_ms
        {
            self.charge_candidate = None;
            if let Some((window_min, _)) = self.window.min_max_since(cutoff)
                && percent.saturating_sub(window_min) >= sustained
            {
                tracing::info!(percent, window_min, "charge candidate confirmed");
                self.enter_charging(percent);
                return true;
            }
            tracing::debug!(percent, started_at = c.start_percent, "charge candidate expired");
        }
        if let Some(c) = self.discharge_candidate
            && now_ms.saturating_sub(c.start_ms) >= hold_ms
        {
            self.discharge_candidate = None;
            if let Some((_, window_max)) = self.window.min_max_since(cutoff)
                && window_max.saturating_sub(percent) >= sustained
            {
                tracing::info!(percent, window_max, "discharge candidate confirmed");
                self.enter_discharging(percent);
                return true;
            }
            tracing::debug!(percent, started_at = c.start_percent, "discharge candidate expired");
        }
        false
    }

    fn step_charging(&mut self, now_ms: u64, percent: u8, voltage_mv: u16, delta: i32, rate: i32) {
        let immediate = i32::from(self.params.immediate_percent);
        let candidate = i32::from(self.params.candidate_percent);

        // Strong reversal skips the candidate stage entirely.
        if delta <= -immediate {
            tracing::info!(delta, percent, "charging reversed hard, now discharging");
            self.enter_discharging(percent);
            return;
        }
        // A modest drop ends charging and opens a discharge hypothesis.
        if delta <= -candidate {
            tracing::info!(delta, percent, "charging ended on percent drop");
            self.phase = Phase::Neutral;
            self.peak_percent = None;
            self.charge_candidate = None;
            self.discharge_candidate = Some(Candidate {
                start_ms: now_ms,
                start_percent: percent,
            });
            return;
        }
        // Voltage falling faster than a charger allows.
        if rate < self.params.discharge_rate_threshold(voltage_mv) {
            tracing::info!(rate, voltage_mv, "charging ended on falling rate");
            self.phase = Phase::Neutral;
            self.peak_percent = None;
            return;
        }
        // Revisiting the old trough means the charge never held.
        if let Some(trough) = self.trough_percent
            && percent <= trough
        {
            tracing::info!(percent, trough, "charging ended at prior trough");
            self.phase = Phase::Neutral;
            self.peak_percent = None;
            return;
        }
        if self.peak_percent.is_none_or(|p| percent > p) {
            self.peak_percent = Some(percent);
        }
    }

    fn step_discharging(
        &mut self,
        now_ms: u64,
        percent: u8,
        voltage_mv: u16,
        delta: i32,
        rate: i32,
    ) {
        let immediate = i32::from(self.params.immediate_percent);
        let candidate = i32::from(self.params.candidate_percent);

        if delta >= immediate {
            tracing::info!(delta, percent, "discharging reversed hard, now charging");
            self.enter_charging(percent);
            return;
        }
        if delta >= candidate {
            tracing::info!(delta, percent, "discharging ended on percent rise");
            self.phase = Phase::Neutral;
            self.trough_percent = None;
            self.discharge_candidate = None;
            self.charge_candidate = Some(Candidate {
                start_ms: now_ms,
                start_percent: percent,
            });
            return;
        }
        if rate > self.params.charge_rate_threshold(voltage_mv) {
            tracing::info!(rate, voltage_mv, "discharging ended on rising rate");
            self.phase = Phase::Neutral;
            self.trough_percent = None;
            return;
        }
        if let Some(peak) = self.peak_percent
            && percent >= peak
        {
            tracing::info!(percent, peak, "discharging ended at prior peak");
            self.phase = Phase::Neutral;
            self.trough_percent = None;
            return;
        }
        if self.trough_percent.is_none_or(|t| percent < t) {
            self.trough_percent = Some(percent);
        }
    }

    fn enter_charging(&mut self, percent: u8) {
        self.phase = Phase::Charging;
        self.peak_percent = Some(percent);
        self.charge_candidate = None;
        self.discharge_candidate = None;
    }

    fn enter_discharging(&mut self, percent: u8) {
        self.phase = Phase::Discharging;
        self.trough_percent = Some(percent);
        self.charge_candidate = None;
        self.discharge_candidate = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> InferenceEngine {
        InferenceEngine::new(InferenceParams::default(), 1_000)
    }

    #[test]
    fn first_observation_establishes_baseline_only() {
        let mut e = engine();
        assert_eq!(e.observe(0, 50, 3700, None), Phase::Neutral);
        assert_eq!(e.phase(), Phase::Neutral);
    }

    #[test]
    fn immediate_jump_confirms_charging_in_one_tick() {
        let mut e = engine();
        e.observe(0, 40, 3650, None);
        let phase = e.observe(1_000, 65, 3900, Some(100));
        assert_eq!(phase, Phase::Charging);
        assert_eq!(e.peak_percent(), Some(65));
    }

    #[test]
    fn small_delta_starts_candidate_without_confirming() {
        let mut e = engine();
        e.observe(0, 40, 3650, None);
        assert_eq!(e.observe(1_000, 45, 3700, Some(30)), Phase::Neutral);
    }

    #[test]
    fn sustained_rise_confirms_after_hold_window() {
        let mut e = engine();
        e.observe(0, 40, 3650, None);
        e.observe(1_000, 42, 3660, Some(10)); // candidate start
        e.observe(2_000, 43, 3670, Some(10));
        e.observe(3_000, 44, 3680, Some(10));
        // Hold window (3 ticks) elapsed; window min is 42, 45-42 >= 2.
        assert_eq!(e.observe(4_000, 45, 3690, Some(10)), Phase::Charging);
    }

    #[test]
    fn flat_sequence_expires_candidate() {
        let mut e = engine();
        e.observe(0, 40, 3650, None);
        e.observe(1_000, 41, 3655, Some(5)); // candidate start
        e.observe(2_000, 41, 3655, Some(0));
        e.observe(3_000, 41, 3655, Some(0));
        assert_eq!(e.observe(4_000, 41, 3655, Some(0)), Phase::Neutral);
        // Candidate gone; another quiet tick clears extrema too.
        assert_eq!(e.observe(5_000, 41, 3655, Some(0)), Phase::Neutral);
    }

    #[test]
    fn sustained_drop_confirms_discharging() {
        let mut e = engine();
        e.observe(0, 60, 3800, None);
        e.observe(1_000, 58, 3790, Some(-10));
        e.observe(2_000, 57, 3780, Some(-10));
        e.observe(3_000, 56, 3770, Some(-10));
        assert_eq!(e.observe(4_000, 55, 3760, Some(-10)), Phase::Discharging);
        assert_eq!(e.trough_percent(), Some(55));
    }

    #[test]
    fn charging_exits_on_percent_drop_and_opens_discharge_candidate() {
        let mut e = engine();
        e.observe(0, 40, 3650, None);
        e.observe(1_000, 65, 3900, Some(100)); // immediate charge
        assert_eq!(e.observe(2_000, 63, 3890, Some(5)), Phase::Neutral);
        assert_eq!(e.peak_percent(), None);
        // The opened discharge candidate can confirm later.
        e.observe(3_000, 62, 3880, Some(-5));
        e.observe(4_000, 61, 3870, Some(-5));
        assert_eq!(e.observe(5_000, 60, 3860, Some(-5)), Phase::Discharging);
    }

    #[test]
    fn charging_exits_on_hard_reversal_directly_to_discharging() {
        let mut e = engine();
        e.observe(0, 40, 3650, None);
        e.observe(1_000, 65, 3900, Some(100));
        assert_eq!(e.observe(2_000, 40, 3650, Some(-200)), Phase::Discharging);
        assert_eq!(e.trough_percent(), Some(40));
    }

    #[test]
    fn charging_exits_when_rate_falls_below_threshold() {
        let mut e = engine();
        e.observe(0, 40, 3650, None);
        e.observe(1_000, 65, 3900, Some(100));
        // Flat percent but voltage dropping 20 mV/min above the 3700 breakpoint.
        assert_eq!(e.observe(2_000, 65, 3890, Some(-20)), Phase::Neutral);
        assert_eq!(e.peak_percent(), None);
    }

    #[test]
    fn charging_tracks_new_peaks() {
        let mut e = engine();
        e.observe(0, 40, 3650, None);
        e.observe(1_000, 65, 3900, Some(100));
        e.observe(2_000, 66, 3910, Some(10));
        e.observe(3_000, 68, 3930, Some(10));
        assert_eq!(e.peak_percent(), Some(68));
    }

    #[test]
    fn discharging_exits_on_percent_rise() {
        let mut e = engine();
        e.observe(0, 40, 3650, None);
        e.observe(1_000, 65, 3900, Some(100)); // charging, peak 65
        e.observe(2_000, 40, 3650, Some(-200)); // hard reversal, discharging
        assert_eq!(e.observe(3_000, 40, 3650, Some(0)), Phase::Discharging);
        // +1 percent with a quiet rate ends discharging and opens a
        // charge candidate.
        assert_eq!(e.observe(4_000, 41, 3655, Some(5)), Phase::Neutral);
        assert_eq!(e.trough_percent(), None);
    }

    #[test]
    fn discharging_exits_on_rising_rate() {
        let mut e = engine();
        e.observe(0, 60, 3800, None);
        e.observe(1_000, 35, 3600, Some(-200)); // immediate discharge
        assert_eq!(e.observe(2_000, 35, 3640, Some(40)), Phase::Neutral);
        assert_eq!(e.trough_percent(), None);
    }

    #[test]
    fn reset_clears_phase_memory_and_baseline() {
        let mut e = engine();
        e.observe(0, 40, 3650, None);
        e.observe(1_000, 65, 3900, Some(100));
        e.reset();
        assert_eq!(e.phase(), Phase::Neutral);
        assert_eq!(e.peak_percent(), None);
        // Post-reset observation is a fresh baseline, not a 25-point jump.
        assert_eq!(e.observe(2_000, 90, 4100, Some(100)), Phase::Neutral);
    }

    #[test]
    fn reversal_replaces_pending_candidate() {
        let mut e = engine();
        e.observe(0, 50, 3720, None);
        e.observe(1_000, 52, 3730, Some(10)); // charge candidate
        // The reversal drops the stale charge candidate immediately, so the
        // discharge candidate's hold window starts here, not after the old
        // candidate has run out.
        e.observe(2_000, 50, 3720, Some(-10));
        e.observe(3_000, 48, 3710, Some(-10));
        e.observe(4_000, 46, 3700, Some(-10));
        assert_eq!(e.observe(5_000, 44, 3690, Some(-10)), Phase::Discharging);
    }
}
