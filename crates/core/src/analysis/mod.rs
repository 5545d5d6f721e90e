use std::{f32::consts::PI, fmt, sync::Arc};

use realfft::{num_complex::Complex32, RealFftPlanner, RealToComplex};
use serde::{Deserialize, Serialize};

use crate::{AnalysisConfig, Result, SampleBuffer, VisualiserError, WindowFunction};

/// Magnitudes of the lower half of one transformed window, one per bar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpectrumFrame {
    magnitudes: Vec<f32>,
}

impl SpectrumFrame {
    pub fn new(magnitudes: Vec<f32>) -> Self {
        Self { magnitudes }
    }

    fn zeroed(bars: usize) -> Self {
        Self::new(vec![0.0; bars])
    }

    pub fn magnitudes(&self) -> &[f32] {
        &self.magnitudes
    }

    pub fn len(&self) -> usize {
        self.magnitudes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.magnitudes.is_empty()
    }

    /// Index of the strongest bin, if the frame has any.
    pub fn peak_bin(&self) -> Option<usize> {
        self.magnitudes
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(index, _)| index)
    }
}

/// Read position of the analyzer inside a [`SampleBuffer`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackCursor {
    position: usize,
}

impl PlaybackCursor {
    pub fn position(&self) -> usize {
        self.position
    }

    /// Cursor for the following tick: back to the start when a window at the
    /// current position reaches the end of the buffer, otherwise one hop
    /// (half a window) further.
    pub fn next(self, window: usize, len: usize) -> Self {
        if self.position + window >= len {
            Self::default()
        } else {
            Self {
                position: self.position + window / 2,
            }
        }
    }

    /// Offset the window is actually read from. A hop can leave the cursor
    /// less than a full window from the end; that window is taken from the
    /// start of the buffer instead.
    pub fn read_offset(self, window: usize, len: usize) -> usize {
        if self.position + window > len {
            0
        } else {
            self.position
        }
    }
}

/// Streams fixed-size windows out of a sample buffer and turns each into a
/// [`SpectrumFrame`].
///
/// The analyzer owns its cursor together with the FFT plan and scratch
/// buffers, so consecutive calls reuse every allocation.
pub struct SpectrumAnalyzer {
    window_size: usize,
    window_function: WindowFunction,
    weights: Vec<f32>,
    cursor: PlaybackCursor,
    frame: SpectrumFrame,
    fft: FftResources,
}

impl SpectrumAnalyzer {
    pub fn new(config: &AnalysisConfig) -> Result<Self> {
        config.validate()?;

        let window_size = config.window_size;
        let weights = (0..window_size)
            .map(|index| match config.window_function {
                WindowFunction::Rectangular => 1.0,
                WindowFunction::Hann => hann_value(index, window_size),
            })
            .collect();

        Ok(Self {
            window_size,
            window_function: config.window_function,
            weights,
            cursor: PlaybackCursor::default(),
            frame: SpectrumFrame::zeroed(config.num_bars()),
            fft: FftResources::new(window_size),
        })
    }

    /// Returns the FFT size in samples.
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Returns the number of magnitudes in every frame.
    pub fn num_bars(&self) -> usize {
        self.window_size / 2
    }

    /// Returns where the next window will be read.
    pub fn cursor(&self) -> PlaybackCursor {
        self.cursor
    }

    /// Most recent frame. All zeros before the first successful analysis.
    pub fn frame(&self) -> &SpectrumFrame {
        &self.frame
    }

    /// Rewinds to the start of the buffer.
    pub fn reset(&mut self) {
        self.cursor = PlaybackCursor::default();
    }

    /// Transforms the window at the cursor and advances the cursor.
    ///
    /// Fails with [`VisualiserError::Analysis`] when the buffer cannot hold a
    /// single window; the cursor and the previous frame are left untouched.
    pub fn analyze(&mut self, buffer: &SampleBuffer) -> Result<&SpectrumFrame> {
        let len = buffer.len();
        if len == 0 {
            return Err(VisualiserError::analysis("sample buffer is empty"));
        }
        if self.window_size > len {
            return Err(VisualiserError::analysis(format!(
                "window of {} samples exceeds buffer of {len} samples",
                self.window_size
            )));
        }

        let start = self.cursor.read_offset(self.window_size, len);
        let window = &buffer.samples()[start..start + self.window_size];
        for ((slot, &sample), weight) in self.fft.input.iter_mut().zip(window).zip(&self.weights) {
            *slot = f32::from(sample) * weight;
        }

        self.fft.plan.process_with_scratch(
            &mut self.fft.input,
            &mut self.fft.spectrum,
            &mut self.fft.scratch,
        )?;

        // The frame holds window/2 slots, so the zip drops the Nyquist bin.
        for (magnitude, bin) in self.frame.magnitudes.iter_mut().zip(&self.fft.spectrum) {
            *magnitude = bin.norm();
        }

        self.cursor = self.cursor.next(self.window_size, len);
        Ok(&self.frame)
    }
}

struct FftResources {
    plan: Arc<dyn RealToComplex<f32>>,
    scratch: Vec<Complex32>,
    spectrum: Vec<Complex32>,
    input: Vec<f32>,
}

impl FftResources {
    fn new(size: usize) -> Self {
        let plan = RealFftPlanner::<f32>::new().plan_fft_forward(size);
        Self {
            scratch: plan.make_scratch_vec(),
            spectrum: plan.make_output_vec(),
            input: plan.make_input_vec(),
            plan,
        }
    }
}

impl fmt::Debug for SpectrumAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpectrumAnalyzer")
            .field("window_size", &self.window_size)
            .field("window_function", &self.window_function)
            .field("cursor", &self.cursor)
            .finish()
    }
}

fn hann_value(index: usize, len: usize) -> f32 {
    if len <= 1 {
        return 1.0;
    }

    0.5 - 0.5 * ((2.0 * PI * index as f32) / (len as f32 - 1.0)).cos()
}
