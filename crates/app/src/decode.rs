use std::path::Path;

use hound::{SampleFormat, WavReader};
use radial_visualiser_core::{Result, SampleBuffer, VisualiserError};

/// Decodes a WAV file into a mono 16-bit [`SampleBuffer`].
pub fn load_wav(path: &Path) -> Result<SampleBuffer> {
    let reader = WavReader::open(path).map_err(|err| wav_error(path, err))?;
    let spec = reader.spec();

    let samples: Vec<i16> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Int, 16) => reader
            .into_samples::<i16>()
            .collect::<std::result::Result<Vec<i16>, _>>()
            .map_err(|err| wav_error(path, err))?,
        (SampleFormat::Int, bits) if bits <= 32 => {
            let shift = i32::from(bits) - 16;
            reader
                .into_samples::<i32>()
                .map(|sample| sample.map(|value| rescale_int(value, shift)))
                .collect::<std::result::Result<Vec<i16>, _>>()
                .map_err(|err| wav_error(path, err))?
        }
        (SampleFormat::Float, _) => reader
            .into_samples::<f32>()
            .map(|sample| sample.map(float_to_i16))
            .collect::<std::result::Result<Vec<i16>, _>>()
            .map_err(|err| wav_error(path, err))?,
        (format, bits) => {
            return Err(VisualiserError::load(format!(
                "{}: unsupported {format:?} sample width {bits}",
                path.display()
            )))
        }
    };

    tracing::info!(
        path = %path.display(),
        samples = samples.len(),
        channels = spec.channels,
        sample_rate = spec.sample_rate,
        "decoded audio"
    );

    SampleBuffer::from_interleaved(&samples, spec.sample_rate, spec.channels)
}

fn rescale_int(value: i32, shift: i32) -> i16 {
    if shift >= 0 {
        (value >> shift) as i16
    } else {
        (value << -shift) as i16
    }
}

fn float_to_i16(value: f32) -> i16 {
    (value.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16
}

fn wav_error(path: &Path, err: hound::Error) -> VisualiserError {
    match err {
        hound::Error::IoError(io) => VisualiserError::Io(io),
        other => VisualiserError::load(format!("{}: {other}", path.display())),
    }
}
