//! System microphone capture via CPAL.
//!
//! Handles device enumeration and format conversion. The hardware callback
//! only converts samples and hands frames to the bus; device failures are
//! fatal and propagate to whoever drives `run()`.

use super::bus::FrameBus;
use super::dispatch::FrameDispatcher;
use crate::log_debug;
use anyhow::{anyhow, bail, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const RUN_POLL: Duration = Duration::from_millis(100);

/// Audio input device wrapper.
pub struct CaptureSource {
    device: cpal::Device,
}

impl CaptureSource {
    /// List microphone names so the CLI can expose a human-friendly selector.
    pub fn list_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();
        let devices = host.input_devices().context("no input devices available")?;
        let mut names = Vec::new();
        for device in devices {
            if let Ok(name) = device.name() {
                names.push(name);
            }
        }
        Ok(names)
    }

    /// Create a capture source, optionally forcing a specific device so users
    /// can pick the right microphone when a machine exposes multiple inputs.
    pub fn new(preferred_device: Option<&str>) -> Result<Self> {
        let host = cpal::default_host();
        let device = match preferred_device {
            Some(name) => {
                let mut devices = host.input_devices().context("no input devices available")?;
                devices
                    .find(|d| d.name().map(|n| n == name).unwrap_or(false))
                    .ok_or_else(|| anyhow!("input device '{name}' not found"))?
            }
            None => host
                .default_input_device()
                .context("no default input device available")?,
        };
        Ok(Self { device })
    }

    /// Get the name of the active capture device.
    pub fn device_name(&self) -> String {
        self.device
            .name()
            .unwrap_or_else(|_| "Unknown Device".to_string())
    }

    /// Blocking capture loop. Opens the input stream at the device's native
    /// format, publishes nominal frames to `bus`, and runs until the stop
    /// flag is raised or the device fails. A device failure aborts with an
    /// error; retry policy belongs to the caller.
    pub fn run(&self, bus: Arc<FrameBus>, stop_flag: Arc<AtomicBool>) -> Result<()> {
        let default_config = self
            .device
            .default_input_config()
            .context("querying default input config")?;
        let format = default_config.sample_format();
        let device_config: StreamConfig = default_config.into();
        let device_sample_rate = device_config.sample_rate.0;
        let channels = usize::from(device_config.channels.max(1));

        log_debug(&format!(
            "capture config: format={format:?} sample_rate={device_sample_rate}Hz channels={channels} -> bus {}Hz/{} samples",
            bus.sample_rate(),
            bus.frame_samples()
        ));

        let dispatcher = Arc::new(Mutex::new(FrameDispatcher::new(device_sample_rate, bus)));
        let fatal: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));

        let err_fn = {
            let fatal = fatal.clone();
            let stop_flag = stop_flag.clone();
            move |err: cpal::StreamError| {
                if let Ok(mut slot) = fatal.lock() {
                    slot.get_or_insert_with(|| err.to_string());
                }
                stop_flag.store(true, Ordering::Relaxed);
            }
        };

        let stream = match format {
            SampleFormat::F32 => {
                let dispatcher = dispatcher.clone();
                self.device.build_input_stream(
                    &device_config,
                    move |data: &[f32], _| {
                        if let Ok(mut pump) = dispatcher.try_lock() {
                            pump.push(data, channels, |sample: f32| {
                                (sample.clamp(-1.0, 1.0) * 32_767.0) as i16
                            });
                        }
                    },
                    err_fn,
                    None,
                )?
            }
            SampleFormat::I16 => {
                let dispatcher = dispatcher.clone();
                self.device.build_input_stream(
                    &device_config,
                    move |data: &[i16], _| {
                        if let Ok(mut pump) = dispatcher.try_lock() {
                            pump.push(data, channels, |sample| sample);
                        }
                    },
                    err_fn,
                    None,
                )?
            }
            SampleFormat::U16 => {
                let dispatcher = dispatcher.clone();
                self.device.build_input_stream(
                    &device_config,
                    move |data: &[u16], _| {
                        if let Ok(mut pump) = dispatcher.try_lock() {
                            pump.push(data, channels, |sample| (i32::from(sample) - 32_768) as i16);
                        }
                    },
                    err_fn,
                    None,
                )?
            }
            other => return Err(anyhow!("unsupported sample format: {other:?}")),
        };

        stream.play().context("starting input stream")?;

        while !stop_flag.load(Ordering::Relaxed) {
            std::thread::sleep(RUN_POLL);
        }

        if let Err(err) = stream.pause() {
            log_debug(&format!("failed to pause audio stream: {err}"));
        }
        drop(stream);

        let failure = fatal
            .lock()
            .map_err(|_| anyhow!("capture error slot poisoned"))?
            .take();
        if let Some(message) = failure {
            bail!("audio capture failed: {message}");
        }
        Ok(())
    }
}
