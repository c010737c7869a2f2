//! Real-time audio capture and voice-activity pipeline.
//!
//! A single capture callback fans frames out to independently-paced
//! consumers: the noise sampler keeps an adaptive loudness threshold, the
//! wake spotter feeds a fixed-frame-length keyword scorer, and the recorder
//! collects one utterance until silence or a timeout and encodes it as WAV.

/// Default capture sample rate (Hz).
pub const DEFAULT_SAMPLE_RATE: u32 = 16_000;

/// Default samples per captured frame (mono, i16).
pub const DEFAULT_FRAME_SAMPLES: usize = 512;

mod bus;
mod capture;
mod dispatch;
mod noise;
mod recorder;
mod resample;
mod wake;
mod wav;

pub use bus::{Frame, FrameBus, Frames, Subscription};
pub use capture::CaptureSource;
pub use noise::{frame_peak, NoiseSampler, NoiseThreshold, DEFAULT_NOISE_THRESHOLD};
pub use recorder::{
    RecorderConfig, RecorderMetrics, RecordingOutcome, RecordingResult, StopReason, Utterance,
    UtteranceRecorder,
};
pub use resample::resample_frame;
pub use wake::{EnergyPeakScorer, KeywordScorer, WakeEvent, WakeSpotter};
pub use wav::encode_wav;
