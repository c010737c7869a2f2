//! End-to-end pipeline runs over synthetic frame streams, no audio device
//! required.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use voicewake::audio::{
    EnergyPeakScorer, FrameBus, NoiseSampler, NoiseThreshold, RecorderConfig, RecordingOutcome,
    StopReason, UtteranceRecorder, WakeSpotter,
};

const SAMPLE_RATE: u32 = 16_000;
const FRAME_SAMPLES: usize = 512;

fn frame_of(value: i16) -> Vec<i16> {
    vec![value; FRAME_SAMPLES]
}

#[test]
fn wake_burst_then_utterance_is_captured() {
    let bus = FrameBus::new(SAMPLE_RATE, FRAME_SAMPLES);
    let stop_flag = AtomicBool::new(false);

    // Quiet room, then a loud burst the stand-in scorer treats as the
    // keyword.
    let wake_subscription = bus.subscribe(64);
    for _ in 0..10 {
        bus.publish(&frame_of(100));
    }
    bus.publish(&frame_of(9_000));

    let scorer = EnergyPeakScorer::new(8_000, FRAME_SAMPLES, SAMPLE_RATE);
    let mut spotter = WakeSpotter::new(Box::new(scorer), SAMPLE_RATE);
    let event = spotter
        .wait_for_wake(&wake_subscription, &stop_flag)
        .expect("scoring succeeds")
        .expect("burst triggers the wake word");
    assert_eq!(event.keyword_index, 0);
    drop(wake_subscription);

    // The utterance only starts streaming once recording is armed, as in the
    // real pipeline.
    let record_subscription = bus.subscribe(64);
    for _ in 0..8 {
        bus.publish(&frame_of(5_000));
    }
    for _ in 0..20 {
        bus.publish(&frame_of(0));
    }

    let recorder = UtteranceRecorder::new(RecorderConfig {
        sample_rate: SAMPLE_RATE,
        frame_samples: FRAME_SAMPLES,
        silence_duration_ms: 160,
        min_record_ms: 0,
        max_record_ms: 10_000,
        rms_window: 1,
    });
    let threshold = NoiseThreshold::new();
    let result = recorder
        .record_until_silence(&record_subscription, &threshold, &stop_flag)
        .expect("recording succeeds");

    assert!(matches!(
        result.metrics.stop_reason,
        StopReason::Silence { .. }
    ));
    // 8 voiced frames plus the 160 ms silence tail (5 frames at 32 ms).
    assert_eq!(result.metrics.frames_processed, 13);
    let utterance = match result.outcome {
        RecordingOutcome::Utterance(utterance) => utterance,
        RecordingOutcome::Empty => panic!("expected an utterance"),
    };
    assert_eq!(utterance.duration_ms, 416);
    assert_eq!(utterance.sample_rate, SAMPLE_RATE);

    let mut reader =
        hound::WavReader::new(std::io::Cursor::new(utterance.wav)).expect("valid WAV");
    assert_eq!(reader.spec().channels, 1);
    assert_eq!(reader.spec().sample_rate, SAMPLE_RATE);
    let samples: Vec<i16> = reader
        .samples::<i16>()
        .collect::<Result<Vec<_>, _>>()
        .expect("valid samples");
    assert_eq!(samples.len(), 13 * FRAME_SAMPLES);
}

#[test]
fn calibrated_threshold_masks_background_noise() {
    let bus = FrameBus::new(SAMPLE_RATE, FRAME_SAMPLES);
    let sampler = NoiseSampler::new(300, Duration::from_millis(50));
    let threshold = sampler.threshold();

    let noise_subscription = bus.subscribe(64);
    let stop_flag = Arc::new(AtomicBool::new(false));
    let sampler_stop = stop_flag.clone();
    let sampler_handle = thread::spawn(move || sampler.run(noise_subscription, sampler_stop));

    // Steady hum at peak 2000 becomes the ambient baseline.
    for _ in 0..10 {
        bus.publish(&frame_of(2_000));
    }
    thread::sleep(Duration::from_millis(300));
    assert_eq!(threshold.get(), 2_300);

    // Audio at the hum level now reads as silence, so the recorder returns
    // empty instead of a WAV of background noise.
    let record_subscription = bus.subscribe(64);
    for _ in 0..10 {
        bus.publish(&frame_of(2_100));
    }
    let recorder = UtteranceRecorder::new(RecorderConfig {
        sample_rate: SAMPLE_RATE,
        frame_samples: FRAME_SAMPLES,
        silence_duration_ms: 64,
        min_record_ms: 0,
        max_record_ms: 10_000,
        rms_window: 1,
    });
    let record_stop = AtomicBool::new(false);
    let result = recorder
        .record_until_silence(&record_subscription, &threshold, &record_stop)
        .expect("recording succeeds");
    assert!(result.outcome.is_empty());

    stop_flag.store(true, Ordering::Relaxed);
    sampler_handle.join().expect("sampler thread");
}

#[test]
fn raising_the_stop_flag_unblocks_the_wake_wait() {
    let bus = FrameBus::new(SAMPLE_RATE, FRAME_SAMPLES);
    let subscription = bus.subscribe(8);
    let stop_flag = Arc::new(AtomicBool::new(false));

    let waiter_stop = stop_flag.clone();
    let waiter = thread::spawn(move || {
        let scorer = EnergyPeakScorer::new(8_000, FRAME_SAMPLES, SAMPLE_RATE);
        let mut spotter = WakeSpotter::new(Box::new(scorer), SAMPLE_RATE);
        spotter.wait_for_wake(&subscription, &waiter_stop)
    });

    thread::sleep(Duration::from_millis(100));
    stop_flag.store(true, Ordering::Relaxed);
    let outcome = waiter.join().expect("waiter thread").expect("clean exit");
    assert!(outcome.is_none());
}
