use super::defaults::MAX_RECORD_HARD_LIMIT_MS;
use super::AppConfig;
use anyhow::{bail, Result};
use clap::Parser;

impl AppConfig {
    /// Parse CLI arguments and validate them right away.
    pub fn parse_args() -> Result<Self> {
        let config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    /// Check CLI values before any audio thread spins up.
    pub fn validate(&self) -> Result<()> {
        if !(8_000..=96_000).contains(&self.sample_rate) {
            bail!(
                "--sample-rate must be between 8000 and 96000 Hz, got {}",
                self.sample_rate
            );
        }
        if !(64..=8_192).contains(&self.frame_samples) {
            bail!(
                "--frame-samples must be between 64 and 8192, got {}",
                self.frame_samples
            );
        }
        if self.max_record_ms == 0 || self.max_record_ms > MAX_RECORD_HARD_LIMIT_MS {
            bail!(
                "--max-record-ms must be between 1 and {MAX_RECORD_HARD_LIMIT_MS} ms, got {}",
                self.max_record_ms
            );
        }
        if self.min_record_ms > self.max_record_ms {
            bail!(
                "--min-record-ms ({}) cannot exceed --max-record-ms ({})",
                self.min_record_ms,
                self.max_record_ms
            );
        }
        if self.silence_duration_ms == 0 || self.silence_duration_ms > self.max_record_ms {
            bail!(
                "--silence-duration-ms must be >=1 and <= --max-record-ms ({})",
                self.max_record_ms
            );
        }
        if self.calibration_interval_ms == 0 {
            bail!("--calibration-interval-ms must be greater than zero");
        }
        if !(8..=1_024).contains(&self.queue_capacity) {
            bail!(
                "--queue-capacity must be between 8 and 1024, got {}",
                self.queue_capacity
            );
        }
        if !(1..=64).contains(&self.rms_window) {
            bail!(
                "--rms-window must be between 1 and 64 frames, got {}",
                self.rms_window
            );
        }
        if !(8_000..=96_000).contains(&self.wake_sample_rate) {
            bail!(
                "--wake-sample-rate must be between 8000 and 96000 Hz, got {}",
                self.wake_sample_rate
            );
        }
        if !(64..=8_192).contains(&self.wake_frame_length) {
            bail!(
                "--wake-frame-length must be between 64 and 8192, got {}",
                self.wake_frame_length
            );
        }
        if let Some(device) = &self.input_device {
            if device.trim().is_empty() {
                bail!("--input-device cannot be blank");
            }
        }
        Ok(())
    }
}
