use std::{ops::RangeInclusive, path::Path};

use serde::{Deserialize, Serialize};

use crate::{Result, VisualiserError};

/// Largest accepted FFT size.
pub const MAX_WINDOW_SIZE: usize = 1 << 20;

/// Top-level configuration structure for the pipeline. Fixed at startup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub analysis: AnalysisConfig,
    pub bars: BarConfig,
    pub emission: EmissionConfig,
    pub particles: ParticleConfig,
    /// Seed for the particle random source. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl AppConfig {
    /// Reads a JSON config file. Missing sections fall back to defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks every section, returning the first violation found.
    pub fn validate(&self) -> Result<()> {
        self.analysis.validate()?;
        self.bars.validate()?;
        self.emission.validate()?;
        self.particles.validate()
    }
}

/// Weighting applied to a window before the transform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowFunction {
    /// Samples are transformed as-is.
    #[default]
    Rectangular,
    Hann,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// FFT size in samples. Must be a power of two.
    pub window_size: usize,
    pub window_function: WindowFunction,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window_size: 512,
            window_function: WindowFunction::Rectangular,
        }
    }
}

impl AnalysisConfig {
    /// Number of bars produced per frame.
    pub fn num_bars(&self) -> usize {
        self.window_size / 2
    }

    /// Samples the cursor advances between windows.
    pub fn hop_size(&self) -> usize {
        self.window_size / 2
    }

    pub fn validate(&self) -> Result<()> {
        if self.window_size < 2 || !self.window_size.is_power_of_two() {
            return Err(VisualiserError::config(format!(
                "window size must be a power of two >= 2, got {}",
                self.window_size
            )));
        }
        if self.window_size > MAX_WINDOW_SIZE {
            return Err(VisualiserError::config(format!(
                "window size {} exceeds the limit of {MAX_WINDOW_SIZE}",
                self.window_size
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarConfig {
    /// Divisor applied to raw magnitudes.
    pub scale: f32,
    /// Upper clamp for a bar height.
    pub max_height: f32,
}

impl Default for BarConfig {
    fn default() -> Self {
        Self {
            scale: 5000.0,
            max_height: 3.0,
        }
    }
}

impl BarConfig {
    pub fn validate(&self) -> Result<()> {
        if !positive(self.scale) {
            return Err(VisualiserError::config("bar scale must be positive"));
        }
        if !non_negative(self.max_height) {
            return Err(VisualiserError::config("max bar height must be non-negative"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmissionConfig {
    /// Bars strictly above this height emit one particle per tick.
    pub threshold: f32,
    /// Radius of the base circle the bars grow out of.
    pub base_radius: f32,
    /// Multiplier from bar height to outward emission speed.
    pub velocity_scale: f32,
}

impl Default for EmissionConfig {
    fn default() -> Self {
        Self {
            threshold: 1.5,
            base_radius: 0.5,
            velocity_scale: 0.3,
        }
    }
}

impl EmissionConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() {
            return Err(VisualiserError::config("emission threshold must be finite"));
        }
        if !non_negative(self.base_radius) {
            return Err(VisualiserError::config("base radius must be non-negative"));
        }
        if !self.velocity_scale.is_finite() {
            return Err(VisualiserError::config("velocity scale must be finite"));
        }
        Ok(())
    }
}

/// Closed `[min, max]` interval that serialises as a two element array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range(pub f32, pub f32);

impl Range {
    pub fn min(&self) -> f32 {
        self.0
    }

    pub fn max(&self) -> f32 {
        self.1
    }

    pub fn as_inclusive(&self) -> RangeInclusive<f32> {
        self.0..=self.1
    }

    fn check(&self, name: &str) -> Result<()> {
        if !(self.0.is_finite() && self.1.is_finite()) || self.0 > self.1 {
            return Err(VisualiserError::config(format!(
                "{name} range [{}, {}] is empty or not finite",
                self.0, self.1
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    pub max_particles: usize,
    /// Tangential acceleration pulling particles into a spiral.
    pub swirl_strength: f32,
    /// Life lost per second.
    pub decay_rate: f32,
    /// Exponential size falloff per second. Zero keeps size constant.
    pub shrink_rate: f32,
    pub size_range: Range,
    pub speed_range: Range,
    /// Full width of the random z component added to the swirl direction.
    pub z_jitter: f32,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            max_particles: 1000,
            swirl_strength: 0.2,
            decay_rate: 0.5,
            shrink_rate: 0.0,
            size_range: Range(0.02, 0.1),
            speed_range: Range(0.5, 2.0),
            z_jitter: 0.4,
        }
    }
}

impl ParticleConfig {
    pub fn validate(&self) -> Result<()> {
        if !positive(self.decay_rate) {
            return Err(VisualiserError::config("decay rate must be positive"));
        }
        if !non_negative(self.shrink_rate) {
            return Err(VisualiserError::config("shrink rate must be non-negative"));
        }
        if !non_negative(self.z_jitter) {
            return Err(VisualiserError::config("z jitter must be non-negative"));
        }
        if !self.swirl_strength.is_finite() {
            return Err(VisualiserError::config("swirl strength must be finite"));
        }
        self.speed_range.check("speed")?;
        self.size_range.check("size")?;
        if !positive(self.size_range.min()) {
            return Err(VisualiserError::config("particle sizes must be positive"));
        }
        Ok(())
    }
}

fn positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

fn non_negative(value: f32) -> bool {
    value.is_finite() && value >= 0.0
}
