//! Command-line parsing and validation helpers.

mod defaults;
#[cfg(test)]
mod tests;
mod validation;

use clap::Parser;
use std::path::PathBuf;

pub use defaults::{
    DEFAULT_CALIBRATION_INTERVAL_MS, DEFAULT_FRAME_SAMPLES, DEFAULT_MAX_RECORD_MS,
    DEFAULT_MIN_RECORD_MS, DEFAULT_NOISE_MARGIN, DEFAULT_QUEUE_CAPACITY, DEFAULT_RMS_WINDOW,
    DEFAULT_SAMPLE_RATE, DEFAULT_SILENCE_DURATION_MS, DEFAULT_WAKE_FRAME_LENGTH,
    DEFAULT_WAKE_PEAK_THRESHOLD, DEFAULT_WAKE_SAMPLE_RATE, MAX_RECORD_HARD_LIMIT_MS,
};

/// CLI options for the voicewake pipeline. Validated values keep the audio
/// workers free of range checks.
#[derive(Debug, Parser, Clone)]
#[command(about = "voicewake voice-activity pipeline", author, version)]
pub struct AppConfig {
    /// Preferred audio input device name
    #[arg(long)]
    pub input_device: Option<String>,

    /// Print detected audio input devices and exit
    #[arg(long = "list-input-devices", default_value_t = false)]
    pub list_input_devices: bool,

    /// Where the recorded utterance WAV is written
    #[arg(long, default_value = "utterance.wav")]
    pub output: PathBuf,

    /// Emit the recording metrics as a JSON line on stdout
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Enable file logging (debug)
    #[arg(long = "logs", env = "VOICEWAKE_LOGS", default_value_t = false)]
    pub logs: bool,

    /// Disable all file logging (overrides --logs and log env vars)
    #[arg(long = "no-logs", env = "VOICEWAKE_NO_LOGS", default_value_t = false)]
    pub no_logs: bool,

    /// Capture sample rate (Hz)
    #[arg(long = "sample-rate", default_value_t = DEFAULT_SAMPLE_RATE)]
    pub sample_rate: u32,

    /// Samples per captured frame
    #[arg(long = "frame-samples", default_value_t = DEFAULT_FRAME_SAMPLES)]
    pub frame_samples: usize,

    /// Margin added to the ambient noise average (peak amplitude units)
    #[arg(long = "noise-margin", default_value_t = DEFAULT_NOISE_MARGIN)]
    pub noise_margin: u32,

    /// Noise threshold recalibration interval (milliseconds)
    #[arg(long = "calibration-interval-ms", default_value_t = DEFAULT_CALIBRATION_INTERVAL_MS)]
    pub calibration_interval_ms: u64,

    /// Trailing silence required before the recorder stops (milliseconds)
    #[arg(long = "silence-duration-ms", default_value_t = DEFAULT_SILENCE_DURATION_MS)]
    pub silence_duration_ms: u64,

    /// Minimum record duration before silence can stop capture (milliseconds)
    #[arg(long = "min-record-ms", default_value_t = DEFAULT_MIN_RECORD_MS)]
    pub min_record_ms: u64,

    /// Maximum record duration before a hard stop (milliseconds)
    #[arg(long = "max-record-ms", default_value_t = DEFAULT_MAX_RECORD_MS)]
    pub max_record_ms: u64,

    /// Frame queue capacity per subscriber
    #[arg(long = "queue-capacity", default_value_t = DEFAULT_QUEUE_CAPACITY)]
    pub queue_capacity: usize,

    /// Loudness smoothing window for the silence decision (frames)
    #[arg(long = "rms-window", default_value_t = DEFAULT_RMS_WINDOW)]
    pub rms_window: usize,

    /// Skip frames below the noise threshold before keyword scoring
    #[arg(long = "wake-energy-gate", default_value_t = false)]
    pub wake_energy_gate: bool,

    /// Samples per keyword-scorer call
    #[arg(long = "wake-frame-length", default_value_t = DEFAULT_WAKE_FRAME_LENGTH)]
    pub wake_frame_length: usize,

    /// Sample rate the keyword scorer expects (Hz)
    #[arg(long = "wake-sample-rate", default_value_t = DEFAULT_WAKE_SAMPLE_RATE)]
    pub wake_sample_rate: u32,

    /// Peak amplitude the built-in energy scorer treats as a keyword burst
    #[arg(long = "wake-peak-threshold", default_value_t = DEFAULT_WAKE_PEAK_THRESHOLD)]
    pub wake_peak_threshold: u32,
}

/// Tunable parameters handed by ownership to the audio layer.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub sample_rate: u32,
    pub frame_samples: usize,
    pub noise_margin: u32,
    pub calibration_interval_ms: u64,
    pub silence_duration_ms: u64,
    pub min_record_ms: u64,
    pub max_record_ms: u64,
    pub queue_capacity: usize,
    pub rms_window: usize,
    pub wake_energy_gate: bool,
    pub wake_frame_length: usize,
    pub wake_sample_rate: u32,
    pub wake_peak_threshold: u32,
}

impl AppConfig {
    /// Narrow the CLI surface down to the values the audio workers consume.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            sample_rate: self.sample_rate,
            frame_samples: self.frame_samples,
            noise_margin: self.noise_margin,
            calibration_interval_ms: self.calibration_interval_ms,
            silence_duration_ms: self.silence_duration_ms,
            min_record_ms: self.min_record_ms,
            max_record_ms: self.max_record_ms,
            queue_capacity: self.queue_capacity,
            rms_window: self.rms_window,
            wake_energy_gate: self.wake_energy_gate,
            wake_frame_length: self.wake_frame_length,
            wake_sample_rate: self.wake_sample_rate,
            wake_peak_threshold: self.wake_peak_threshold,
        }
    }
}
