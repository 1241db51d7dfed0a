//! Command implementations: monitor assembly, status, monitor loop, calibrate.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use eyre::WrapErr;
use gauge_config::{Config, SensingMode, calibration};
use gauge_core::{BatteryMonitor, ChargeSensing, format_status};

use crate::cli::Cli;

/// Load the config file, falling back to compiled defaults when it is
/// missing or invalid. Config problems are never fatal here; the gauge
/// still has to report something. Runs before tracing is initialized, so
/// problems come back as a note for the caller to log.
pub fn load_config(path: &Path) -> (Config, Option<String>) {
    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(_) => return (Config::default(), None),
    };
    let cfg = match gauge_config::load_toml(&text) {
        Ok(c) => c,
        Err(e) => {
            return (
                Config::default(),
                Some(format!(
                    "config {} failed to parse, using defaults: {e}",
                    path.display()
                )),
            );
        }
    };
    if let Err(e) = cfg.validate() {
        return (
            Config::default(),
            Some(format!(
                "config {} failed validation, using defaults: {e}",
                path.display()
            )),
        );
    }
    (cfg, None)
}

fn make_sensing(cfg: &Config) -> ChargeSensing {
    match cfg.engine.sensing {
        SensingMode::Inferred => ChargeSensing::Inferred,
        SensingMode::Pin => {
            #[cfg(feature = "hardware")]
            {
                match cfg.engine.charge_gpio {
                    Some(gpio) => ChargeSensing::Pin(Box::new(
                        gauge_hardware::iio::GpioChargePin::new(
                            gpio,
                            cfg.engine.charge_active_low,
                        ),
                    )),
                    None => {
                        tracing::warn!(
                            "sensing = \"pin\" without engine.charge_gpio, falling back to inference"
                        );
                        ChargeSensing::Inferred
                    }
                }
            }
            #[cfg(not(feature = "hardware"))]
            {
                ChargeSensing::Pin(Box::new(gauge_hardware::SimulatedChargePin::new(true)))
            }
        }
    }
}

pub fn build_monitor(cli: &Cli, cfg: &Config) -> gauge_core::Result<BatteryMonitor> {
    #[cfg(feature = "hardware")]
    let adc = gauge_hardware::iio::IioAdc::new(cli.iio_device, cli.iio_channel);
    #[cfg(not(feature = "hardware"))]
    let adc = gauge_hardware::SimulatedAdc::new(cli.sim_mv).with_droop(cli.sim_droop);

    BatteryMonitor::builder()
        .with_adc(adc)
        .with_adc_params((&cfg.adc).into())
        .with_presence_bounds(cfg.presence.min_mv, cfg.presence.max_mv)
        .with_curve((&cfg.curve).into())
        .with_thresholds((&cfg.thresholds).into())
        .with_inference((&cfg.inference).into())
        .with_sensing(make_sensing(cfg))
        .with_tick_interval(Duration::from_millis(cfg.engine.tick_interval_ms))
        .build()
}

fn status_json(s: &gauge_core::BatteryStatus) -> serde_json::Value {
    serde_json::json!({
        "raw_adc": s.raw_adc,
        "voltage_mv": s.voltage_mv,
        "percentage": s.percentage,
        "valid": s.valid,
        "present": s.present,
        "low_battery": s.low_battery,
        "critical_battery": s.critical_battery,
        "charging": s.charging,
        "charging_inferred": s.charging_inferred,
        "discharging_inferred": s.discharging_inferred,
        "voltage_rate_mv_per_min": if s.voltage_rate_valid {
            Some(s.voltage_rate_mv_per_min)
        } else {
            None
        },
        "peak_percent": s.peak_percent,
        "trough_percent": s.trough_percent,
    })
}

fn print_status(s: &gauge_core::BatteryStatus, json: bool, warnings: bool) {
    if json {
        println!("{}", status_json(s));
    } else {
        println!("{}", format_status(s, warnings));
    }
}

pub fn run_status(mut monitor: BatteryMonitor, json: bool, no_warnings: bool) -> eyre::Result<()> {
    let status = monitor.force_recalc().wrap_err("taking battery reading")?;
    print_status(status, json, !no_warnings);
    Ok(())
}

pub fn run_monitor(
    mut monitor: BatteryMonitor,
    ticks: Option<u64>,
    interval_override: Option<Duration>,
    json: bool,
) -> eyre::Result<()> {
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            shutdown.store(true, Ordering::Relaxed);
        })
        .wrap_err("installing Ctrl-C handler")?;
    }

    let interval = interval_override.unwrap_or_else(|| monitor.tick_interval());
    tracing::info!(interval_ms = interval.as_millis() as u64, "monitor loop started");

    let mut remaining = ticks;
    let mut first = true;
    loop {
        let status = if std::mem::take(&mut first) {
            monitor.bootstrap()
        } else {
            monitor.tick()
        }
        .wrap_err("battery tick")?;
        print_status(status, json, true);

        if let Some(n) = remaining.as_mut() {
            *n = n.saturating_sub(1);
            if *n == 0 {
                break;
            }
        }
        // Sleep in short slices so Ctrl-C is honored promptly even with
        // minute-scale intervals.
        let mut left = interval;
        while !left.is_zero() {
            if shutdown.load(Ordering::Relaxed) {
                tracing::info!("monitor loop interrupted");
                return Ok(());
            }
            let slice = left.min(Duration::from_millis(200));
            std::thread::sleep(slice);
            left = left.saturating_sub(slice);
        }
        if shutdown.load(Ordering::Relaxed) {
            tracing::info!("monitor loop interrupted");
            return Ok(());
        }
    }
    Ok(())
}

pub fn run_calibrate(
    mut monitor: BatteryMonitor,
    measured_mv: u16,
    config_path: &Path,
    dry_run: bool,
    json: bool,
) -> eyre::Result<()> {
    let status = monitor.force_recalc().wrap_err("taking battery reading")?;
    if !status.valid {
        eyre::bail!(
            "battery not detected (estimate {}mV outside presence envelope); cannot calibrate",
            status.voltage_mv
        );
    }
    let estimated_mv = status.voltage_mv;
    let old_reference = monitor.reference_mv();
    let new_reference =
        calibration::corrected_reference(old_reference, measured_mv, estimated_mv)
            .wrap_err("calibration rejected, keeping prior reference")?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "measured_mv": measured_mv,
                "estimated_mv": estimated_mv,
                "old_reference_mv": old_reference,
                "new_reference_mv": new_reference,
                "persisted": !dry_run,
            })
        );
    } else {
        println!(
            "measured {measured_mv}mV, gauge read {estimated_mv}mV: reference {old_reference}mV -> {new_reference}mV{}",
            if dry_run { " (dry run, not persisted)" } else { "" }
        );
    }
    if dry_run {
        return Ok(());
    }

    let (mut cfg, _) = load_config(config_path);
    cfg.adc.reference_mv = new_reference;
    let text = toml::to_string_pretty(&cfg).wrap_err("serializing config")?;
    if let Some(parent) = config_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .wrap_err_with(|| format!("creating {}", parent.display()))?;
    }
    std::fs::write(config_path, text)
        .wrap_err_with(|| format!("writing {}", config_path.display()))?;
    tracing::info!(
        old_reference,
        new_reference,
        path = %config_path.display(),
        "calibrated reference persisted"
    );
    Ok(())
}
