use gauge_config::{Config, load_toml};
use rstest::rstest;

#[test]
fn defaults_validate() {
    let cfg = Config::default();
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.adc.reference_mv, 3300);
    assert_eq!(cfg.adc.divider_ratio_x100, 200);
    assert_eq!(cfg.curve.mv.len(), cfg.curve.percent.len());
}

#[test]
fn empty_toml_is_all_defaults() {
    let cfg = load_toml("").unwrap();
    assert_eq!(cfg.engine.tick_interval_ms, 60_000);
    assert_eq!(cfg.thresholds.low_percent, 15);
    assert!(cfg.validate().is_ok());
}

#[test]
fn partial_toml_overrides_only_named_fields() {
    let cfg = load_toml(
        r#"
[adc]
reference_mv = 3250
samples = 7

[engine]
tick_interval_ms = 5000
sensing = "pin"
"#,
    )
    .unwrap();
    assert_eq!(cfg.adc.reference_mv, 3250);
    assert_eq!(cfg.adc.samples, 7);
    // untouched sections keep defaults
    assert_eq!(cfg.adc.divider_ratio_x100, 200);
    assert_eq!(cfg.presence.min_mv, 3000);
    assert_eq!(cfg.engine.sensing, gauge_config::SensingMode::Pin);
    assert!(cfg.validate().is_ok());
}

#[rstest]
#[case::even_samples("[adc]\nsamples = 4\n", "odd")]
#[case::zero_samples("[adc]\nsamples = 0\n", ">= 1")]
#[case::zero_divider("[adc]\ndivider_ratio_x100 = 0\n", "divider")]
#[case::presence_inverted("[presence]\nmin_mv = 4200\nmax_mv = 3000\n", "presence")]
#[case::curve_not_descending(
    "[curve]\nmv = [3000, 4200]\npercent = [0, 100]\n",
    "decreasing"
)]
#[case::curve_too_short("[curve]\nmv = [4200]\npercent = [100]\n", "two breakpoints")]
#[case::percent_over_100("[curve]\nmv = [4200, 3000]\npercent = [120, 0]\n", "<= 100")]
#[case::critical_above_low(
    "[thresholds]\nlow_percent = 10\ncritical_percent = 20\n",
    "critical"
)]
#[case::zero_interval("[engine]\ntick_interval_ms = 0\n", "tick_interval_ms")]
#[case::zero_candidate("[inference]\ncandidate_percent = 0\n", "candidate")]
fn rejects_bad_config(#[case] toml: &str, #[case] needle: &str) {
    let cfg = load_toml(toml).unwrap();
    let err = cfg.validate().unwrap_err().to_string();
    assert!(err.contains(needle), "error {err:?} missing {needle:?}");
}

#[test]
fn unknown_sensing_mode_fails_to_parse() {
    assert!(load_toml("[engine]\nsensing = \"usb\"\n").is_err());
}

#[test]
fn config_round_trips_through_toml() {
    let mut cfg = Config::default();
    cfg.adc.reference_mv = 3412;
    let text = toml::to_string_pretty(&cfg).unwrap();
    let back = load_toml(&text).unwrap();
    assert_eq!(back.adc.reference_mv, 3412);
    assert!(back.validate().is_ok());
}
