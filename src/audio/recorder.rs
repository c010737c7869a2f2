//! Silence-terminated utterance recording.
//!
//! Collects frames into an utterance buffer and stops once a smoothed
//! loudness average stays under the noise threshold long enough, or a hard
//! duration cap is hit. Time is accounted in frame-milliseconds so the state
//! machine is deterministic under test.

use super::bus::{Frame, Subscription};
use super::noise::{frame_peak, NoiseThreshold};
use super::wav::encode_wav;
use crate::log_debug;
use anyhow::{anyhow, Result};
use crossbeam_channel::RecvTimeoutError;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Parameters the recorder consumes, pre-validated by the config layer.
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    pub sample_rate: u32,
    pub frame_samples: usize,
    pub silence_duration_ms: u64,
    pub min_record_ms: u64,
    pub max_record_ms: u64,
    pub rms_window: usize,
}

impl RecorderConfig {
    fn frame_ms(&self) -> u64 {
        ((self.frame_samples as u64 * 1_000) / u64::from(self.sample_rate.max(1))).max(1)
    }
}

/// Explains why recording stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StopReason {
    Silence { tail_ms: u64 },
    Timeout,
    Cancelled,
}

impl StopReason {
    pub fn label(&self) -> &'static str {
        match self {
            StopReason::Silence { .. } => "silence",
            StopReason::Timeout => "timeout",
            StopReason::Cancelled => "cancelled",
        }
    }
}

/// Observability counters collected during one recording pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecorderMetrics {
    pub capture_ms: u64,
    pub voiced_ms: u64,
    pub silence_tail_ms: u64,
    pub frames_processed: usize,
    pub stop_reason: StopReason,
}

impl Default for RecorderMetrics {
    fn default() -> Self {
        Self {
            capture_ms: 0,
            voiced_ms: 0,
            silence_tail_ms: 0,
            frames_processed: 0,
            stop_reason: StopReason::Timeout,
        }
    }
}

/// One complete recorded segment, already encoded as a WAV container.
#[derive(Debug, Clone)]
pub struct Utterance {
    pub wav: Vec<u8>,
    pub duration_ms: u64,
    pub sample_rate: u32,
}

/// A pass either captured speech or it did not; callers must treat `Empty`
/// explicitly instead of receiving a silent WAV.
#[derive(Debug, Clone)]
pub enum RecordingOutcome {
    Utterance(Utterance),
    Empty,
}

impl RecordingOutcome {
    pub fn is_empty(&self) -> bool {
        matches!(self, RecordingOutcome::Empty)
    }
}

#[derive(Debug)]
pub struct RecordingResult {
    pub outcome: RecordingOutcome,
    pub metrics: RecorderMetrics,
}

/// Fixed-size sliding window over per-frame loudness, smoothing the
/// silence/voiced decision against single-frame spikes.
struct RmsWindow {
    window: VecDeque<u32>,
    size: usize,
}

impl RmsWindow {
    fn new(size: usize) -> Self {
        Self {
            window: VecDeque::new(),
            size: size.max(1),
        }
    }

    fn push(&mut self, value: u32) {
        self.window.push_back(value);
        if self.window.len() > self.size {
            self.window.pop_front();
        }
    }

    fn average(&self) -> u32 {
        if self.window.is_empty() {
            return 0;
        }
        let sum: u64 = self.window.iter().map(|v| u64::from(*v)).sum();
        (sum / self.window.len() as u64) as u32
    }
}

pub struct UtteranceRecorder {
    cfg: RecorderConfig,
}

impl UtteranceRecorder {
    pub fn new(cfg: RecorderConfig) -> Self {
        Self { cfg }
    }

    /// Record until silence, timeout or cancellation.
    ///
    /// Silence is only evaluated once `min_record_ms` has elapsed, so a slow
    /// starter is never cut off. A pass in which no frame ever rose above
    /// the threshold returns [`RecordingOutcome::Empty`]; a disconnected
    /// stream aborts with an error and no partial WAV.
    pub fn record_until_silence(
        &self,
        subscription: &Subscription,
        threshold: &NoiseThreshold,
        stop_flag: &AtomicBool,
    ) -> Result<RecordingResult> {
        let frame_ms = self.cfg.frame_ms();
        let wait_time = Duration::from_millis(frame_ms);
        let mut frames: Vec<Frame> = Vec::new();
        let mut window = RmsWindow::new(self.cfg.rms_window);
        let mut metrics = RecorderMetrics::default();
        let mut total_ms = 0u64;
        let mut voiced_ms = 0u64;
        let mut silence_streak_ms = 0u64;
        let mut stop_reason = StopReason::Timeout;

        loop {
            if stop_flag.load(Ordering::Relaxed) {
                stop_reason = StopReason::Cancelled;
                break;
            }
            if total_ms >= self.cfg.max_record_ms {
                stop_reason = StopReason::Timeout;
                break;
            }

            match subscription.recv_timeout(wait_time) {
                Ok(frame) => {
                    let peak = frame_peak(&frame);
                    frames.push(frame);
                    metrics.frames_processed += 1;
                    total_ms = total_ms.saturating_add(frame_ms);

                    window.push(peak);
                    if window.average() > threshold.get() {
                        voiced_ms = voiced_ms.saturating_add(frame_ms);
                        silence_streak_ms = 0;
                    } else {
                        silence_streak_ms = silence_streak_ms.saturating_add(frame_ms);
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    // A stalled stream still advances the clock; no audio is
                    // indistinguishable from silence here.
                    total_ms = total_ms.saturating_add(frame_ms);
                    silence_streak_ms = silence_streak_ms.saturating_add(frame_ms);
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(anyhow!("audio stream disconnected during recording"));
                }
            }

            if total_ms >= self.cfg.max_record_ms {
                stop_reason = StopReason::Timeout;
                break;
            }
            if total_ms >= self.cfg.min_record_ms
                && silence_streak_ms >= self.cfg.silence_duration_ms
            {
                stop_reason = StopReason::Silence {
                    tail_ms: silence_streak_ms,
                };
                break;
            }
        }

        metrics.capture_ms = total_ms;
        metrics.voiced_ms = voiced_ms;
        metrics.silence_tail_ms = silence_streak_ms;
        metrics.stop_reason = stop_reason;

        log_debug(&format!(
            "recording_stop|reason={}|capture_ms={}|voiced_ms={}|frames={}",
            metrics.stop_reason.label(),
            metrics.capture_ms,
            metrics.voiced_ms,
            metrics.frames_processed
        ));
        tracing::debug!(
            reason = metrics.stop_reason.label(),
            capture_ms = metrics.capture_ms,
            voiced_ms = metrics.voiced_ms,
            "recording stopped"
        );

        if frames.is_empty() || voiced_ms == 0 {
            // Nothing voiced was ever observed; callers get an explicit
            // empty result instead of a WAV full of silence.
            return Ok(RecordingResult {
                outcome: RecordingOutcome::Empty,
                metrics,
            });
        }

        let mut samples = Vec::with_capacity(frames.iter().map(Vec::len).sum());
        for frame in frames {
            samples.extend(frame);
        }
        let duration_ms = (samples.len() as u64 * 1_000) / u64::from(self.cfg.sample_rate.max(1));
        let wav = encode_wav(&samples, self.cfg.sample_rate)?;

        Ok(RecordingResult {
            outcome: RecordingOutcome::Utterance(Utterance {
                wav,
                duration_ms,
                sample_rate: self.cfg.sample_rate,
            }),
            metrics,
        })
    }
}
