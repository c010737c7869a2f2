//! One-shot pipeline wiring: calibrate noise in the background, wait for the
//! wake word, record a single utterance, and write it out as WAV.

use anyhow::{bail, Context, Result};
use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use voicewake::audio::{
    CaptureSource, EnergyPeakScorer, FrameBus, NoiseSampler, RecorderConfig, RecordingOutcome,
    UtteranceRecorder, WakeSpotter,
};
use voicewake::config::AppConfig;

fn main() -> Result<()> {
    let config = AppConfig::parse_args()?;
    voicewake::init_logging(&config);
    voicewake::init_tracing(&config);

    if config.list_input_devices {
        match CaptureSource::list_devices() {
            Ok(names) if names.is_empty() => println!("No audio input devices detected."),
            Ok(names) => {
                println!("Detected audio input devices:");
                for name in names {
                    println!("  {name}");
                }
            }
            Err(err) => println!("Failed to list audio input devices: {err:#}"),
        }
        return Ok(());
    }

    run_pipeline(&config)
}

fn run_pipeline(config: &AppConfig) -> Result<()> {
    let pipeline = config.pipeline_config();
    let source = CaptureSource::new(config.input_device.as_deref())?;
    eprintln!("Capturing from '{}'", source.device_name());

    let bus = Arc::new(FrameBus::new(pipeline.sample_rate, pipeline.frame_samples));
    let stop_flag = Arc::new(AtomicBool::new(false));

    let sampler = NoiseSampler::new(
        pipeline.noise_margin,
        Duration::from_millis(pipeline.calibration_interval_ms),
    );
    let threshold = sampler.threshold();
    let noise_subscription = bus.subscribe(pipeline.queue_capacity);
    let noise_stop = stop_flag.clone();
    let noise_handle = thread::spawn(move || sampler.run(noise_subscription, noise_stop));

    let capture_bus = bus.clone();
    let capture_stop = stop_flag.clone();
    let capture_handle = thread::spawn(move || source.run(capture_bus, capture_stop));

    let scorer = EnergyPeakScorer::new(
        pipeline.wake_peak_threshold,
        pipeline.wake_frame_length,
        pipeline.wake_sample_rate,
    );
    let mut spotter = WakeSpotter::new(Box::new(scorer), pipeline.sample_rate);
    if pipeline.wake_energy_gate {
        spotter = spotter.with_energy_gate(threshold.clone());
    }

    eprintln!("Listening for wake word...");
    let wake_subscription = bus.subscribe(pipeline.queue_capacity);
    let wake = spotter.wait_for_wake(&wake_subscription, &stop_flag)?;
    drop(wake_subscription);

    let result = match wake {
        Some(event) => {
            eprintln!("Wake word detected (keyword {})", event.keyword_index);
            tracing::info!(keyword_index = event.keyword_index, "wake word detected");
            let recorder = UtteranceRecorder::new(RecorderConfig {
                sample_rate: pipeline.sample_rate,
                frame_samples: pipeline.frame_samples,
                silence_duration_ms: pipeline.silence_duration_ms,
                min_record_ms: pipeline.min_record_ms,
                max_record_ms: pipeline.max_record_ms,
                rms_window: pipeline.rms_window,
            });
            eprintln!("Recording until silence...");
            let record_subscription = bus.subscribe(pipeline.queue_capacity);
            Some(recorder.record_until_silence(&record_subscription, &threshold, &stop_flag)?)
        }
        None => None,
    };

    stop_flag.store(true, Ordering::Relaxed);
    match capture_handle.join() {
        Ok(capture_result) => capture_result?,
        Err(_) => bail!("capture thread panicked"),
    }
    let _ = noise_handle.join();

    let Some(result) = result else {
        eprintln!("Cancelled before a wake word was detected.");
        return Ok(());
    };

    if config.json {
        println!("{}", serde_json::to_string(&result.metrics)?);
    } else {
        eprintln!(
            "Recording stopped ({}): {} ms captured, {} ms voiced, {} frames",
            result.metrics.stop_reason.label(),
            result.metrics.capture_ms,
            result.metrics.voiced_ms,
            result.metrics.frames_processed
        );
    }

    match result.outcome {
        RecordingOutcome::Utterance(utterance) => {
            fs::write(&config.output, &utterance.wav).with_context(|| {
                format!("writing utterance to {}", config.output.display())
            })?;
            println!(
                "Wrote {} ({} ms at {} Hz)",
                config.output.display(),
                utterance.duration_ms,
                utterance.sample_rate
            );
        }
        RecordingOutcome::Empty => {
            println!("No audio captured.");
        }
    }
    Ok(())
}
