//! The battery monitor: owns the full per-tick pipeline and its state.
//!
//! Each tick flows strictly downward: median sample, voltage estimate,
//! presence gate, EMA smoothing, curve mapping, rate tracking, charge
//! classification, publication. Single-threaded by design; exactly one
//! caller drives `tick` on a fixed cadence.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::{Duration, Instant};

use eyre::WrapErr;
use gauge_traits::clock::{Clock, MonotonicClock};
use gauge_traits::{AdcInput, ChargePin};

use crate::config::{AdcParams, InferenceParams, PresenceBounds, WarnThresholds};
use crate::curve::DischargeCurve;
use crate::error::{BuildError, Result};
use crate::estimator::VoltageEstimator;
use crate::filter::EmaFilter;
use crate::hw_error::map_hw_error;
use crate::inference::{InferenceEngine, Phase};
use crate::sampler;
use crate::status::BatteryStatus;

/// How charging is known: a dedicated charger-status line, or trend
/// inference. Selected once at startup by configuration; both variants
/// feed the same status fields.
pub enum ChargeSensing {
    Pin(Box<dyn ChargePin>),
    Inferred,
}

impl core::fmt::Debug for ChargeSensing {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Pin(_) => f.write_str("Pin"),
            Self::Inferred => f.write_str("Inferred"),
        }
    }
}

/// Fire-and-forget hooks the publisher calls after every tick. The edge
/// hooks fire exactly once per false-to-true or true-to-false transition;
/// repaint and clients_changed fire unconditionally. Implementations must
/// not block the tick.
pub trait Notifier {
    fn repaint(&mut self);
    fn clients_changed(&mut self);
    fn low_battery(&mut self, active: bool);
    fn critical_battery(&mut self, active: bool);
}

/// Notifier that discards everything.
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn repaint(&mut self) {}
    fn clients_changed(&mut self) {}
    fn low_battery(&mut self, _active: bool) {}
    fn critical_battery(&mut self, _active: bool) {}
}

pub struct BatteryMonitor {
    adc: Box<dyn AdcInput>,
    sensing: ChargeSensing,
    notifier: Box<dyn Notifier>,
    clock: Arc<dyn Clock + Send + Sync>,
    epoch: Instant,

    adc_params: AdcParams,
    presence: PresenceBounds,
    thresholds: WarnThresholds,
    tick_interval_ms: u64,

    estimator: VoltageEstimator,
    ema: EmaFilter,
    curve: DischargeCurve,
    inference: InferenceEngine,

    status: BatteryStatus,
    // (smoothed_mv, ms_since_epoch) of the previous valid sample
    last_sample: Option<(u16, u64)>,
    pin_was_charging: Option<bool>,
}

impl core::fmt::Debug for BatteryMonitor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BatteryMonitor")
            .field("sensing", &self.sensing)
            .field("status", &self.status)
            .finish()
    }
}

impl BatteryMonitor {
    pub fn builder() -> MonitorBuilder<Missing> {
        MonitorBuilder::default()
    }

    /// Read-only snapshot of the current status.
    pub fn status(&self) -> &BatteryStatus {
        &self.status
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn reference_mv(&self) -> u16 {
        self.estimator.reference_mv()
    }

    /// Apply a corrected ADC reference (post-calibration). Takes effect on
    /// the next tick.
    pub fn set_reference_mv(&mut self, reference_mv: u16) {
        self.estimator.set_reference(reference_mv);
    }

    /// Out-of-cadence recompute; safe at any time, identical to a tick.
    pub fn force_recalc(&mut self) -> Result<&BatteryStatus> {
        tracing::debug!("forced recalculation");
        self.tick()
    }

    /// First reading at startup: seeds the filter and rate baseline and
    /// logs the boot status line.
    pub fn bootstrap(&mut self) -> Result<&BatteryStatus> {
        let status = self.tick()?;
        tracing::info!(status = %crate::status::format_status(status, true), "battery boot status");
        Ok(status)
    }

    /// Run the pipeline once and publish the result.
    pub fn tick(&mut self) -> Result<&BatteryStatus> {
        let now = self.clock.ms_since(self.epoch);
        let timeout = Duration::from_millis(self.adc_params.read_timeout_ms);
        let raw = sampler::median_raw(&mut *self.adc, self.adc_params.samples, timeout)?;
        let estimate_mv = self.estimator.estimate(raw);

        if !self.presence.contains(estimate_mv) {
            self.handle_absence(raw, estimate_mv);
            self.publish();
            return Ok(&self.status);
        }

        let smoothed = self.ema.update(estimate_mv);
        let percent = self.curve.percent(smoothed);

        let rate = match self.last_sample {
            Some((prev_mv, prev_ms)) if now > prev_ms => {
                let dmv = i64::from(smoothed) - i64::from(prev_mv);
                let dt_ms = (now - prev_ms) as i64;
                // mV/min with 64-bit intermediates; dt can span hours.
                Some((dmv * 60_000 / dt_ms) as i32)
            }
            _ => None,
        };
        self.last_sample = Some((smoothed, now));

        match &mut self.sensing {
            ChargeSensing::Pin(pin) => {
                let charging = pin
                    .is_charging()
                    .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
                    .wrap_err("reading charge pin")?;
                if self.pin_was_charging != Some(charging) {
                    tracing::info!(charging, "charger pin level changed");
                }
                self.pin_was_charging = Some(charging);
                self.status.charging = charging;
                self.status.charging_inferred = false;
                self.status.discharging_inferred = false;
                self.status.peak_percent = None;
                self.status.trough_percent = None;
            }
            ChargeSensing::Inferred => {
                let phase = self.inference.observe(now, percent, smoothed, rate);
                self.status.charging = phase == Phase::Charging;
                self.status.charging_inferred = self.status.charging;
                self.status.discharging_inferred = phase == Phase::Discharging;
                self.status.peak_percent = self.inference.peak_percent();
                self.status.trough_percent = self.inference.trough_percent();
            }
        }

        self.status.raw_adc = raw;
        self.status.voltage_mv = smoothed;
        self.status.percentage = percent.min(100);
        self.status.valid = true;
        self.status.present = true;
        self.status.voltage_rate_mv_per_min = rate.unwrap_or(0);
        self.status.voltage_rate_valid = rate.is_some();

        self.publish();
        Ok(&self.status)
    }

    /// Out-of-envelope voltage: not an error, the normal absent state. The
    /// single reset point for filter, rate tracker and inference, so a
    /// reconnected battery starts from a clean seed.
    fn handle_absence(&mut self, raw: u16, estimate_mv: u16) {
        if self.status.present {
            tracing::info!(estimate_mv, "battery left presence envelope");
        }
        self.status.raw_adc = raw;
        self.status.voltage_mv = estimate_mv;
        self.status.percentage = 0;
        self.status.valid = false;
        self.status.present = false;
        self.status.charging = false;
        self.status.charging_inferred = false;
        self.status.discharging_inferred = false;
        self.status.voltage_rate_mv_per_min = 0;
        self.status.voltage_rate_valid = false;
        self.status.peak_percent = None;
        self.status.trough_percent = None;
        self.ema.reset();
        self.inference.reset();
        self.last_sample = None;
        self.pin_was_charging = None;
    }

    /// Recompute warning flags, fire edges once, always request repaint and
    /// client refresh.
    fn publish(&mut self) {
        let was_low = self.status.low_battery;
        let was_critical = self.status.critical_battery;
        let low = self.status.valid && self.status.percentage <= self.thresholds.low_percent;
        let critical =
            self.status.valid && self.status.percentage <= self.thresholds.critical_percent;
        self.status.low_battery = low;
        self.status.critical_battery = critical;
        if low != was_low {
            tracing::info!(low, percentage = self.status.percentage, "low battery edge");
            self.notifier.low_battery(low);
        }
        if critical != was_critical {
            tracing::warn!(
                critical,
                percentage = self.status.percentage,
                "critical battery edge"
            );
            self.notifier.critical_battery(critical);
        }
        self.notifier.repaint();
        self.notifier.clients_changed();
    }
}

// Type-state marker for the builder
pub struct Missing;
pub struct Set;

/// Builder for `BatteryMonitor`. The ADC is the one mandatory component;
/// everything else has compiled defaults. Out-of-range tunables are clamped
/// with a warning rather than rejected.
pub struct MonitorBuilder<A> {
    adc: Option<Box<dyn AdcInput>>,
    sensing: Option<ChargeSensing>,
    notifier: Option<Box<dyn Notifier>>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    adc_params: Option<AdcParams>,
    presence_bounds: Option<(u16, u16)>,
    thresholds: Option<WarnThresholds>,
    inference: Option<InferenceParams>,
    curve: Option<DischargeCurve>,
    tick_interval_ms: Option<u64>,
    _a: PhantomData<A>,
}

impl Default for MonitorBuilder<Missing> {
    fn default() -> Self {
        Self {
            adc: None,
            sensing: None,
            notifier: None,
            clock: None,
            adc_params: None,
            presence_bounds: None,
            thresholds: None,
            inference: None,
            curve: None,
            tick_interval_ms: None,
            _a: PhantomData,
        }
    }
}

/// Chainable setters that do not affect type-state
impl<A> MonitorBuilder<A> {
    pub fn with_sensing(mut self, sensing: ChargeSensing) -> Self {
        self.sensing = Some(sensing);
        self
    }
    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Some(Box::new(notifier));
        self
    }
    /// Provide a custom clock; defaults to MonotonicClock when not provided.
    pub fn with_clock(mut self, clock: Box<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }
    pub fn with_adc_params(mut self, params: AdcParams) -> Self {
        self.adc_params = Some(params);
        self
    }
    pub fn with_presence_bounds(mut self, min_mv: u16, max_mv: u16) -> Self {
        self.presence_bounds = Some((min_mv, max_mv));
        self
    }
    pub fn with_thresholds(mut self, thresholds: WarnThresholds) -> Self {
        self.thresholds = Some(thresholds);
        self
    }
    pub fn with_inference(mut self, params: InferenceParams) -> Self {
        self.inference = Some(params);
        self
    }
    pub fn with_curve(mut self, curve: DischargeCurve) -> Self {
        self.curve = Some(curve);
        self
    }
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval_ms = Some(interval.as_millis().min(u128::from(u64::MAX)) as u64);
        self
    }

    /// Fallible build available in any type-state; returns a typed
    /// BuildError for missing pieces.
    pub fn try_build(self) -> Result<BatteryMonitor> {
        let MonitorBuilder {
            adc,
            sensing,
            notifier,
            clock,
            adc_params,
            presence_bounds,
            thresholds,
            inference,
            curve,
            tick_interval_ms,
            _a: _,
        } = self;

        let adc = adc.ok_or_else(|| eyre::Report::new(BuildError::MissingAdc))?;
        let mut adc_params = adc_params.unwrap_or_default();
        if adc_params.samples == 0 {
            tracing::warn!("sample count 0 clamped to 1");
            adc_params.samples = 1;
        } else if adc_params.samples % 2 == 0 {
            tracing::warn!(
                samples = adc_params.samples,
                "even sample count bumped to odd"
            );
            adc_params.samples += 1;
        }
        if adc_params.read_timeout_ms == 0 {
            tracing::warn!("zero read timeout clamped to 1ms");
            adc_params.read_timeout_ms = 1;
        }

        let presence = match presence_bounds {
            Some((min, max)) => PresenceBounds::clamped(min, max),
            None => PresenceBounds::default(),
        };
        let mut thresholds = thresholds.unwrap_or_default();
        if thresholds.critical_percent > thresholds.low_percent {
            tracing::warn!(
                low = thresholds.low_percent,
                critical = thresholds.critical_percent,
                "critical threshold above low, swapping"
            );
            core::mem::swap(&mut thresholds.low_percent, &mut thresholds.critical_percent);
        }

        let mut tick_interval_ms = tick_interval_ms.unwrap_or(60_000);
        if tick_interval_ms == 0 {
            tracing::warn!("zero tick interval clamped to 1000ms");
            tick_interval_ms = 1_000;
        }

        let inference_params = inference.unwrap_or_default();
        let estimator =
            VoltageEstimator::new(adc_params.reference_mv, adc_params.divider_ratio_x100);
        let clock: Arc<dyn Clock + Send + Sync> = match clock {
            Some(b) => Arc::from(b),
            None => Arc::new(MonotonicClock::new()),
        };
        let epoch = clock.now();

        Ok(BatteryMonitor {
            adc,
            sensing: sensing.unwrap_or(ChargeSensing::Inferred),
            notifier: notifier.unwrap_or_else(|| Box::new(NullNotifier)),
            clock,
            epoch,
            adc_params,
            presence,
            thresholds,
            tick_interval_ms,
            estimator,
            ema: EmaFilter::new(),
            curve: curve.unwrap_or_default(),
            inference: InferenceEngine::new(inference_params, tick_interval_ms),
            status: BatteryStatus::default(),
            last_sample: None,
            pin_was_charging: None,
        })
    }
}

// Setter that advances type-state when providing the mandatory ADC
impl MonitorBuilder<Missing> {
    pub fn with_adc(self, adc: impl AdcInput + 'static) -> MonitorBuilder<Set> {
        let MonitorBuilder {
            adc: _,
            sensing,
            notifier,
            clock,
            adc_params,
            presence_bounds,
            thresholds,
            inference,
            curve,
            tick_interval_ms,
            _a: _,
        } = self;
        MonitorBuilder {
            adc: Some(Box::new(adc)),
            sensing,
            notifier,
            clock,
            adc_params,
            presence_bounds,
            thresholds,
            inference,
            curve,
            tick_interval_ms,
            _a: PhantomData,
        }
    }
}

impl MonitorBuilder<Set> {
    /// Validate and build the monitor. Only available once the ADC is set.
    pub fn build(self) -> Result<BatteryMonitor> {
        self.try_build()
    }
}
