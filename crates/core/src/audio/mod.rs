use crate::{Result, VisualiserError};

/// Fully decoded PCM stream handed over by the decoder.
///
/// The buffer is immutable once constructed. Analysis treats `samples` as one
/// stream regardless of `channels`; decoders are expected to have reduced
/// multi-channel audio already, or to build the buffer through
/// [`SampleBuffer::from_interleaved`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleBuffer {
    samples: Box<[i16]>,
    sample_rate: u32,
    channels: u16,
}

impl SampleBuffer {
    /// Wraps decoded samples. Fails with [`VisualiserError::Load`] when the
    /// stream is empty or the format metadata is unusable.
    pub fn new(samples: Vec<i16>, sample_rate: u32, channels: u16) -> Result<Self> {
        if samples.is_empty() {
            return Err(VisualiserError::load("sample buffer is empty"));
        }
        if sample_rate == 0 {
            return Err(VisualiserError::load("sample rate must be non-zero"));
        }
        if !matches!(channels, 1 | 2) {
            return Err(VisualiserError::load(format!(
                "unsupported channel count {channels}, expected 1 or 2"
            )));
        }

        Ok(Self {
            samples: samples.into_boxed_slice(),
            sample_rate,
            channels,
        })
    }

    /// Builds a mono buffer by averaging each interleaved frame. A trailing
    /// partial frame is dropped.
    pub fn from_interleaved(samples: &[i16], sample_rate: u32, channels: u16) -> Result<Self> {
        match channels {
            1 => return Self::new(samples.to_vec(), sample_rate, 1),
            2 => {}
            _ => {
                return Err(VisualiserError::load(format!(
                    "unsupported channel count {channels}, expected 1 or 2"
                )))
            }
        }

        let mono = samples
            .chunks_exact(channels as usize)
            .map(|frame| {
                let sum: i32 = frame.iter().map(|&s| i32::from(s)).sum();
                (sum / i32::from(channels)) as i16
            })
            .collect();
        Self::new(mono, sample_rate, 1)
    }

    /// Returns the raw samples in playback order.
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Returns the number of samples, not frames.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false for a constructed buffer; kept for slice-like ergonomics.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Returns the sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Playback length assuming the stream is consumed at `sample_rate`.
    pub fn duration_seconds(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }
}
