//! Deterministic frame-rate conversion for the keyword-scorer path.
//!
//! Keyword spotting only needs coarse spectral shape, so the strategies stay
//! cheap: plain decimation for integer ratios and linear interpolation for
//! everything else.

use std::cmp::Ordering as CmpOrdering;

/// Convert one frame from `src_rate` to `dst_rate`.
///
/// Equal rates return the input unchanged, an integer downsampling ratio
/// takes every k-th sample, and any other ratio linearly interpolates at
/// evenly spaced fractional source indices. A zero-length input yields a
/// zero-length output; degenerate rates fall back to the input rather than
/// panicking.
pub fn resample_frame(input: &[i16], src_rate: u32, dst_rate: u32) -> Vec<i16> {
    if input.is_empty() || src_rate == 0 || dst_rate == 0 || src_rate == dst_rate {
        return input.to_vec();
    }

    if src_rate % dst_rate == 0 {
        let step = (src_rate / dst_rate) as usize;
        return input.iter().copied().step_by(step).collect();
    }

    let output_len =
        ((input.len() as f64 * f64::from(dst_rate)) / f64::from(src_rate)).round() as usize;
    let mut output = Vec::with_capacity(output_len);
    let stride = f64::from(src_rate) / f64::from(dst_rate);

    for i in 0..output_len {
        let src_pos = i as f64 * stride;
        let idx = src_pos.floor() as usize;
        let frac = src_pos - idx as f64;

        let sample = if idx + 1 < input.len() {
            let a = f64::from(input[idx]);
            let b = f64::from(input[idx + 1]);
            (a + (b - a) * frac).round() as i16
        } else {
            input.last().copied().unwrap_or(0)
        };
        output.push(sample);
    }

    output
}

/// Pad or truncate a frame to the exact length a downstream consumer wants.
pub(super) fn adjust_frame_length(mut data: Vec<i16>, desired: usize) -> Vec<i16> {
    match data.len().cmp(&desired) {
        CmpOrdering::Greater => {
            data.truncate(desired);
        }
        CmpOrdering::Less => {
            let pad = data.last().copied().unwrap_or(0);
            data.resize(desired, pad);
        }
        CmpOrdering::Equal => {}
    }
    data
}

/// Resample a device-rate frame and force it to the bus frame length so
/// every published frame has the nominal size.
pub(super) fn convert_frame_to_target(
    frame: Vec<i16>,
    src_rate: u32,
    dst_rate: u32,
    desired_len: usize,
) -> Vec<i16> {
    if src_rate == dst_rate {
        return adjust_frame_length(frame, desired_len);
    }
    let resampled = resample_frame(&frame, src_rate, dst_rate);
    adjust_frame_length(resampled, desired_len)
}
