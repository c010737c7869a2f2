use super::bus::FrameBus;
use super::resample::convert_frame_to_target;
use std::sync::Arc;

/// Downmix multi-channel input to mono i16 while applying the provided
/// converter, so the rest of the pipeline sees one channel regardless of the
/// microphone layout.
pub(super) fn append_downmixed_samples<T, F>(
    buf: &mut Vec<i16>,
    data: &[T],
    channels: usize,
    mut convert: F,
) where
    T: Copy,
    F: FnMut(T) -> i16,
{
    if channels <= 1 {
        buf.extend(data.iter().copied().map(&mut convert));
        return;
    }

    // Average each interleaved frame to produce a mono representation.
    let mut acc = 0i32;
    let mut count = 0usize;
    for sample in data.iter().copied() {
        acc += i32::from(convert(sample));
        count += 1;
        if count == channels {
            buf.push((acc / channels as i32) as i16);
            acc = 0;
            count = 0;
        }
    }
    if count > 0 {
        buf.push((acc / count as i32) as i16);
    }
}

/// Runs inside the capture callback: converts incoming blocks to mono i16,
/// chunks them into nominal frames at the bus rate, and hands them to the
/// bus. Only non-blocking work happens here.
pub(super) struct FrameDispatcher {
    device_rate: u32,
    device_frame_samples: usize,
    pending: Vec<i16>,
    scratch: Vec<i16>,
    bus: Arc<FrameBus>,
}

impl FrameDispatcher {
    pub(super) fn new(device_rate: u32, bus: Arc<FrameBus>) -> Self {
        let device_rate = device_rate.max(1);
        // Chunk at the device rate so each chunk resamples to one nominal
        // bus frame.
        let device_frame_samples = ((bus.frame_samples() as u64 * u64::from(device_rate))
            / u64::from(bus.sample_rate().max(1)))
        .max(1) as usize;
        Self {
            device_rate,
            device_frame_samples,
            pending: Vec::with_capacity(device_frame_samples * 2),
            scratch: Vec::new(),
            bus,
        }
    }

    pub(super) fn push<T, F>(&mut self, data: &[T], channels: usize, convert: F)
    where
        T: Copy,
        F: FnMut(T) -> i16,
    {
        self.scratch.clear();
        append_downmixed_samples(&mut self.scratch, data, channels, convert);
        self.pending.extend_from_slice(&self.scratch);

        while self.pending.len() >= self.device_frame_samples {
            let chunk: Vec<i16> = self.pending.drain(..self.device_frame_samples).collect();
            let frame = convert_frame_to_target(
                chunk,
                self.device_rate,
                self.bus.sample_rate(),
                self.bus.frame_samples(),
            );
            self.bus.publish(&frame);
        }
    }
}
