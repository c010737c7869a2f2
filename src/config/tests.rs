use super::AppConfig;
use clap::Parser;

fn parse(args: &[&str]) -> AppConfig {
    let mut full = vec!["voicewake"];
    full.extend_from_slice(args);
    AppConfig::parse_from(full)
}

#[test]
fn defaults_pass_validation() {
    let config = parse(&[]);
    config.validate().expect("defaults should be valid");
}

#[test]
fn pipeline_config_mirrors_cli_values() {
    let config = parse(&["--sample-rate", "48000", "--noise-margin", "450"]);
    let pipeline = config.pipeline_config();
    assert_eq!(pipeline.sample_rate, 48_000);
    assert_eq!(pipeline.noise_margin, 450);
    assert_eq!(pipeline.frame_samples, config.frame_samples);
}

#[test]
fn rejects_out_of_range_sample_rate() {
    let config = parse(&["--sample-rate", "4000"]);
    let err = config.validate().expect_err("4 kHz should be rejected");
    assert!(err.to_string().contains("--sample-rate"));
}

#[test]
fn rejects_min_above_max() {
    let config = parse(&["--min-record-ms", "9000", "--max-record-ms", "5000"]);
    let err = config.validate().expect_err("min > max should be rejected");
    assert!(err.to_string().contains("--min-record-ms"));
}

#[test]
fn rejects_silence_longer_than_max() {
    let config = parse(&["--silence-duration-ms", "20000", "--max-record-ms", "10000"]);
    let err = config.validate().expect_err("silence > max should fail");
    assert!(err.to_string().contains("--silence-duration-ms"));
}

#[test]
fn rejects_zero_calibration_interval() {
    let config = parse(&["--calibration-interval-ms", "0"]);
    let err = config.validate().expect_err("zero interval should fail");
    assert!(err.to_string().contains("--calibration-interval-ms"));
}

#[test]
fn rejects_tiny_queue_capacity() {
    let config = parse(&["--queue-capacity", "2"]);
    let err = config.validate().expect_err("capacity 2 should fail");
    assert!(err.to_string().contains("--queue-capacity"));
}

#[test]
fn rejects_blank_device_name() {
    let config = parse(&["--input-device", "  "]);
    let err = config.validate().expect_err("blank device should fail");
    assert!(err.to_string().contains("--input-device"));
}

#[test]
fn rejects_oversized_rms_window() {
    let config = parse(&["--rms-window", "100"]);
    let err = config.validate().expect_err("window 100 should fail");
    assert!(err.to_string().contains("--rms-window"));
}
