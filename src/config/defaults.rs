//! Named defaults for the voice pipeline so CLI help and tests agree on one
//! source of truth.

/// Capture sample rate requested from the device path (Hz).
pub const DEFAULT_SAMPLE_RATE: u32 = 16_000;

/// Nominal samples per captured frame (mono, i16).
pub const DEFAULT_FRAME_SAMPLES: usize = 512;

/// Margin added on top of the ambient-noise average when publishing a
/// threshold.
pub const DEFAULT_NOISE_MARGIN: u32 = 300;

/// How often the noise sampler republishes its threshold (milliseconds).
pub const DEFAULT_CALIBRATION_INTERVAL_MS: u64 = 10_000;

/// Trailing silence required before the recorder stops (milliseconds).
pub const DEFAULT_SILENCE_DURATION_MS: u64 = 1_500;

/// Minimum utterance length before silence is even considered (milliseconds).
pub const DEFAULT_MIN_RECORD_MS: u64 = 3_000;

/// Hard cap on a single utterance (milliseconds).
pub const DEFAULT_MAX_RECORD_MS: u64 = 10_000;

/// Bounded frame-queue capacity handed to each subscriber.
pub const DEFAULT_QUEUE_CAPACITY: usize = 200;

/// Sliding-window length used to smooth the recorder's loudness decision.
pub const DEFAULT_RMS_WINDOW: usize = 5;

/// Samples per scorer call for the built-in keyword scorer.
pub const DEFAULT_WAKE_FRAME_LENGTH: usize = 512;

/// Sample rate the built-in keyword scorer expects (Hz).
pub const DEFAULT_WAKE_SAMPLE_RATE: u32 = 16_000;

/// Peak amplitude the built-in energy scorer treats as a keyword burst.
pub const DEFAULT_WAKE_PEAK_THRESHOLD: u32 = 8_000;

/// Upper bound accepted for --max-record-ms.
pub const MAX_RECORD_HARD_LIMIT_MS: u64 = 120_000;
