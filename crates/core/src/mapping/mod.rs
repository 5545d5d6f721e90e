use serde::{Deserialize, Serialize};

use crate::{BarConfig, SpectrumFrame};

/// Display-ready bar heights, one per spectrum bin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BarHeights {
    heights: Vec<f32>,
}

impl BarHeights {
    pub fn new(heights: Vec<f32>) -> Self {
        Self { heights }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.heights
    }

    pub fn len(&self) -> usize {
        self.heights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        self.heights.iter().copied()
    }
}

impl From<Vec<f32>> for BarHeights {
    fn from(heights: Vec<f32>) -> Self {
        Self::new(heights)
    }
}

/// Scales raw magnitudes down and clamps them to a stable display range.
#[derive(Debug, Clone, PartialEq)]
pub struct BarMapper {
    scale: f32,
    max_height: f32,
}

impl BarMapper {
    pub fn new(config: &BarConfig) -> Self {
        Self {
            scale: config.scale,
            max_height: config.max_height,
        }
    }

    pub fn max_height(&self) -> f32 {
        self.max_height
    }

    pub fn height(&self, magnitude: f32) -> f32 {
        (magnitude / self.scale).min(self.max_height)
    }

    pub fn map(&self, frame: &SpectrumFrame) -> BarHeights {
        let mut heights = BarHeights::default();
        self.map_into(frame, &mut heights);
        heights
    }

    /// Same as [`BarMapper::map`] but reuses the allocation in `out`.
    pub fn map_into(&self, frame: &SpectrumFrame, out: &mut BarHeights) {
        out.heights.clear();
        out.heights
            .extend(frame.magnitudes().iter().map(|&magnitude| self.height(magnitude)));
    }
}

impl Default for BarMapper {
    fn default() -> Self {
        Self::new(&BarConfig::default())
    }
}
