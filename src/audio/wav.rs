//! In-memory WAV encoding for finished utterances.

use anyhow::{Context, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::Cursor;

/// Encode mono 16-bit samples into a complete RIFF/WAV byte buffer.
pub fn encode_wav(samples: &[i16], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer =
            WavWriter::new(&mut cursor, spec).context("creating in-memory WAV writer")?;
        for &sample in samples {
            writer
                .write_sample(sample)
                .context("writing WAV sample")?;
        }
        writer.finalize().context("finalizing WAV container")?;
    }
    Ok(cursor.into_inner())
}
