//! Bridge from the live frame stream to a fixed-frame-length keyword scorer.
//!
//! Incoming frames are resampled to the scorer's rate and pooled in an
//! accumulator; whenever the accumulator holds a full scorer frame, exactly
//! that many samples are popped and scored, and the remainder carries over
//! to the next round.

use super::bus::Subscription;
use super::noise::{frame_peak, NoiseThreshold};
use super::resample::resample_frame;
use crate::log_debug;
use anyhow::{bail, Result};
use crossbeam_channel::RecvTimeoutError;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

const RECV_POLL: Duration = Duration::from_millis(50);

/// A keyword-spotting engine scored one fixed-length frame at a time.
///
/// # Frame contract
/// `score` is only ever called with exactly `frame_length()` samples at
/// `sample_rate()`. A return value >= 0 names the matched keyword index;
/// negative means no match. Engine failures are returned as errors and are
/// never retried here.
pub trait KeywordScorer {
    fn frame_length(&self) -> usize;
    fn sample_rate(&self) -> u32;
    fn score(&mut self, frame: &[i16]) -> Result<i32>;
    fn name(&self) -> &'static str {
        "unknown_scorer"
    }
}

/// Lightweight stand-in scorer that treats a loudness burst as the keyword.
/// Useful for wiring and demos when no real engine is available.
#[derive(Debug, Clone)]
pub struct EnergyPeakScorer {
    peak_threshold: u32,
    frame_length: usize,
    sample_rate: u32,
}

impl EnergyPeakScorer {
    pub fn new(peak_threshold: u32, frame_length: usize, sample_rate: u32) -> Self {
        Self {
            peak_threshold,
            frame_length: frame_length.max(1),
            sample_rate,
        }
    }
}

impl KeywordScorer for EnergyPeakScorer {
    fn frame_length(&self) -> usize {
        self.frame_length
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn score(&mut self, frame: &[i16]) -> Result<i32> {
        if frame_peak(frame) >= self.peak_threshold {
            Ok(0)
        } else {
            Ok(-1)
        }
    }

    fn name(&self) -> &'static str {
        "energy_peak_scorer"
    }
}

/// Reported when the scorer matched a keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WakeEvent {
    pub keyword_index: i32,
}

/// Consumes a subscription and resolves on the first keyword match.
pub struct WakeSpotter {
    scorer: Box<dyn KeywordScorer + Send>,
    source_rate: u32,
    accumulator: VecDeque<i16>,
    energy_gate: Option<NoiseThreshold>,
}

impl WakeSpotter {
    pub fn new(scorer: Box<dyn KeywordScorer + Send>, source_rate: u32) -> Self {
        Self {
            scorer,
            source_rate,
            accumulator: VecDeque::new(),
            energy_gate: None,
        }
    }

    /// Skip frames whose peak is below the current noise threshold before
    /// resampling. Cheap pre-filter that avoids scorer calls on silence;
    /// skipped frames never enter the accumulator, so chunk alignment simply
    /// continues from the last admitted frame.
    pub fn with_energy_gate(mut self, threshold: NoiseThreshold) -> Self {
        self.energy_gate = Some(threshold);
        self
    }

    /// Block until the scorer reports a match, the stop flag is raised
    /// (`Ok(None)`), or the stream/engine fails. Returns on the first match
    /// and does not re-arm; call again for the next detection cycle.
    pub fn wait_for_wake(
        &mut self,
        subscription: &Subscription,
        stop_flag: &AtomicBool,
    ) -> Result<Option<WakeEvent>> {
        loop {
            if stop_flag.load(Ordering::Relaxed) {
                return Ok(None);
            }
            match subscription.recv_timeout(RECV_POLL) {
                Ok(frame) => {
                    if let Some(event) = self.ingest(&frame)? {
                        return Ok(Some(event));
                    }
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    bail!("audio stream disconnected while waiting for wake word")
                }
            }
        }
    }

    /// Feed one frame through resampling, accumulation and scoring.
    pub fn ingest(&mut self, frame: &[i16]) -> Result<Option<WakeEvent>> {
        if let Some(gate) = &self.energy_gate {
            if frame_peak(frame) < gate.get() {
                return Ok(None);
            }
        }

        let resampled = resample_frame(frame, self.source_rate, self.scorer.sample_rate());
        self.accumulator.extend(resampled);

        let needed = self.scorer.frame_length().max(1);
        while self.accumulator.len() >= needed {
            let chunk: Vec<i16> = self.accumulator.drain(..needed).collect();
            let index = self.scorer.score(&chunk)?;
            if index >= 0 {
                log_debug(&format!(
                    "wake_detected|scorer={}|keyword_index={index}",
                    self.scorer.name()
                ));
                return Ok(Some(WakeEvent {
                    keyword_index: index,
                }));
            }
        }
        Ok(None)
    }

    /// Samples currently buffered below one scorer frame.
    pub fn buffered_samples(&self) -> usize {
        self.accumulator.len()
    }
}
