use std::f32::consts::TAU;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::{BarHeights, Particle, Result};

/// Render-facing view of a live particle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticleSnapshot {
    pub position: [f32; 3],
    pub life: f32,
    pub size: f32,
}

impl From<&Particle> for ParticleSnapshot {
    fn from(particle: &Particle) -> Self {
        Self {
            position: particle.position.to_array(),
            life: particle.life,
            size: particle.size,
        }
    }
}

/// Everything the renderer needs to draw one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisualState {
    /// Number of successful ticks before this one.
    pub frame_index: u64,
    /// Analyzer cursor after the tick.
    pub cursor: usize,
    pub bar_heights: BarHeights,
    pub particles: Vec<ParticleSnapshot>,
    /// Particles actually created during the tick.
    pub emitted: usize,
}

impl VisualState {
    /// Bars laid out around a circle of `base_radius`, one per height,
    /// starting on the +x axis and going counter-clockwise.
    pub fn radial_bars(&self, base_radius: f32) -> impl Iterator<Item = RadialBar> + '_ {
        let count = self.bar_heights.len();
        self.bar_heights
            .iter()
            .enumerate()
            .map(move |(index, height)| {
                let direction = bar_direction(index, count).truncate();
                RadialBar {
                    inner: direction * base_radius,
                    outer: direction * (base_radius + height),
                    height,
                }
            })
    }
}

/// Line segment for one bar of the circular layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadialBar {
    pub inner: Vec2,
    pub outer: Vec2,
    pub height: f32,
}

/// Unit vector in the xy plane pointing at bar `index` of `count`.
pub fn bar_direction(index: usize, count: usize) -> Vec3 {
    if count == 0 {
        return Vec3::X;
    }
    let angle = TAU * index as f32 / count as f32;
    Vec3::new(angle.cos(), angle.sin(), 0.0)
}

/// Consumer of published frames, implemented by whatever draws or stores them.
pub trait FrameSink {
    fn present(&mut self, state: &VisualState) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_directions_walk_the_circle() {
        assert!((bar_direction(0, 4) - Vec3::X).length() < 1e-6);
        assert!((bar_direction(1, 4) - Vec3::Y).length() < 1e-6);
        assert!((bar_direction(2, 4) + Vec3::X).length() < 1e-6);
        assert!((bar_direction(3, 4) + Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn radial_bars_extend_from_base_circle() {
        let state = VisualState {
            bar_heights: BarHeights::new(vec![1.0, 0.0, 2.5, 0.25]),
            ..Default::default()
        };

        let bars: Vec<_> = state.radial_bars(0.5).collect();
        assert_eq!(bars.len(), 4);
        assert!((bars[0].outer - Vec2::new(1.5, 0.0)).length() < 1e-6);
        assert_eq!(bars[1].inner, bars[1].outer);
        assert!((bars[2].outer - Vec2::new(-3.0, 0.0)).length() < 1e-5);
        for bar in &bars {
            assert!((bar.inner.length() - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn state_serialises_heights_as_plain_array() {
        let state = VisualState {
            frame_index: 3,
            cursor: 256,
            bar_heights: BarHeights::new(vec![0.5, 3.0]),
            particles: vec![ParticleSnapshot {
                position: [0.0, 1.0, 0.0],
                life: 0.5,
                size: 0.05,
            }],
            emitted: 1,
        };

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["bar_heights"], serde_json::json!([0.5, 3.0]));
        assert_eq!(json["particles"][0]["life"], serde_json::json!(0.5));
        assert_eq!(json["cursor"], serde_json::json!(256));
    }
}
