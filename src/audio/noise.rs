//! Ambient-noise calibration.
//!
//! Tracks per-frame loudness and periodically republishes an adaptive
//! threshold of "background noise plus margin". Loudness is measured as peak
//! absolute amplitude in i16 units, and the recorder reuses the same metric
//! so the two stay comparable.

use super::bus::Subscription;
use crate::log_debug;
use crossbeam_channel::RecvTimeoutError;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Threshold reported before the first calibration tick completes.
pub const DEFAULT_NOISE_THRESHOLD: u32 = 1_000;

const RECV_POLL: Duration = Duration::from_millis(50);

/// Peak absolute amplitude of one frame. The i16::MIN edge is widened to i32
/// before the abs so it cannot overflow.
pub fn frame_peak(frame: &[i16]) -> u32 {
    frame
        .iter()
        .map(|sample| i32::from(*sample).unsigned_abs())
        .max()
        .unwrap_or(0)
}

/// Single-writer, multi-reader threshold cell. Reads never block and are at
/// most one calibration interval stale. Zero means "not yet calibrated" and
/// reads as the documented fallback; published values are clamped to at
/// least 1 so a calibrated silent room never collides with the sentinel.
#[derive(Clone, Debug, Default)]
pub struct NoiseThreshold {
    raw: Arc<AtomicU32>,
}

impl NoiseThreshold {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last published threshold, or [`DEFAULT_NOISE_THRESHOLD`] before the
    /// first calibration completes.
    pub fn get(&self) -> u32 {
        match self.raw.load(Ordering::Relaxed) {
            0 => DEFAULT_NOISE_THRESHOLD,
            value => value,
        }
    }

    fn publish(&self, value: u32) {
        self.raw.store(value.max(1), Ordering::Relaxed);
    }

    #[cfg(test)]
    pub(crate) fn publish_for_tests(&self, value: u32) {
        self.publish(value);
    }
}

/// `mean(samples) + margin`, the value each calibration tick publishes.
pub(super) fn calibrated_threshold(samples: &[u64], margin: u32) -> u32 {
    if samples.is_empty() {
        return margin;
    }
    let sum: u64 = samples.iter().sum();
    let mean = sum / samples.len() as u64;
    u32::try_from(mean).unwrap_or(u32::MAX).saturating_add(margin)
}

/// Background task that keeps [`NoiseThreshold`] current.
pub struct NoiseSampler {
    threshold: NoiseThreshold,
    margin: u32,
    interval: Duration,
}

impl NoiseSampler {
    pub fn new(margin: u32, interval: Duration) -> Self {
        Self {
            threshold: NoiseThreshold::new(),
            margin,
            interval,
        }
    }

    /// Reader handle shared with the recorder and the wake gate.
    pub fn threshold(&self) -> NoiseThreshold {
        self.threshold.clone()
    }

    /// Consume frames until cancelled. Every `interval`, publish the mean
    /// loudness of the window plus the margin and clear the window.
    pub fn run(&self, subscription: Subscription, stop_flag: Arc<AtomicBool>) {
        let mut window: Vec<u64> = Vec::new();
        let mut last_publish = Instant::now();

        loop {
            if stop_flag.load(Ordering::Relaxed) {
                return;
            }
            match subscription.recv_timeout(RECV_POLL) {
                Ok(frame) => window.push(u64::from(frame_peak(&frame))),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return,
            }

            if last_publish.elapsed() >= self.interval && !window.is_empty() {
                let threshold = calibrated_threshold(&window, self.margin);
                self.threshold.publish(threshold);
                tracing::debug!(threshold, samples = window.len(), "noise threshold published");
                log_debug(&format!(
                    "noise_calibration|threshold={threshold}|samples={}",
                    window.len()
                ));
                window.clear();
                last_publish = Instant::now();
            }
        }
    }
}
