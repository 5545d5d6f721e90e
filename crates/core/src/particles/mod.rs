use std::f32::consts::TAU;

use glam::Vec3;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{ParticleConfig, ParticleSnapshot, Result};

/// Upper bound on the storage reserved up front. Larger systems grow on demand.
const PREALLOCATED_PARTICLES: usize = 4096;

/// A single simulated point. Alive while `life > 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: Vec3,
    pub velocity: Vec3,
    pub life: f32,
    pub size: f32,
}

/// Anything that accepts particle spawn requests.
pub trait Emitter {
    /// Requests one particle. Returns `false` when the request was dropped.
    fn emit(&mut self, position: Vec3, base_velocity: Vec3) -> bool;
}

/// Capacity-bounded particle set with spiral drift and life decay.
///
/// Emission past `max_particles` is silently dropped rather than queued. The
/// random source is injected so trajectories can be reproduced from a seed.
#[derive(Debug, Clone)]
pub struct ParticleSystem<R = StdRng> {
    particles: Vec<Particle>,
    config: ParticleConfig,
    rng: R,
}

impl ParticleSystem<StdRng> {
    pub fn seeded(config: ParticleConfig, seed: u64) -> Result<Self> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy(config: ParticleConfig) -> Result<Self> {
        Self::with_rng(config, StdRng::from_entropy())
    }
}

impl<R: Rng> ParticleSystem<R> {
    pub fn with_rng(config: ParticleConfig, rng: R) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            particles: Vec::with_capacity(config.max_particles.min(PREALLOCATED_PARTICLES)),
            config,
            rng,
        })
    }

    /// Returns the configuration the system was built with.
    pub fn config(&self) -> &ParticleConfig {
        &self.config
    }

    /// Returns the number of live particles.
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Returns the capacity past which emission is dropped.
    pub fn max_particles(&self) -> usize {
        self.config.max_particles
    }

    /// Returns whether the next emission would be dropped.
    pub fn is_full(&self) -> bool {
        self.particles.len() >= self.config.max_particles
    }

    /// Live particles in no particular order.
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn snapshot(&self) -> Vec<ParticleSnapshot> {
        let mut out = Vec::with_capacity(self.particles.len());
        self.snapshot_into(&mut out);
        out
    }

    pub fn snapshot_into(&self, out: &mut Vec<ParticleSnapshot>) {
        out.clear();
        out.extend(self.particles.iter().map(ParticleSnapshot::from));
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    /// Spawns a particle at `position` moving with `base_velocity` plus a
    /// random swirl. No-op at capacity.
    pub fn spawn(&mut self, position: Vec3, base_velocity: Vec3) -> bool {
        if self.is_full() {
            return false;
        }

        let angle = self.rng.gen_range(0.0..TAU);
        let speed = self.rng.gen_range(self.config.speed_range.as_inclusive());
        let half_jitter = self.config.z_jitter * 0.5;
        let z = self.rng.gen_range(-half_jitter..=half_jitter);
        let swirl = Vec3::new(angle.cos(), angle.sin(), z) * speed;
        let size = self.rng.gen_range(self.config.size_range.as_inclusive());

        self.particles.push(Particle {
            position,
            velocity: base_velocity + swirl,
            life: 1.0,
            size,
        });
        true
    }

    /// Advances every particle by `delta_seconds` and culls the dead ones.
    /// Negative or NaN deltas are treated as zero.
    pub fn update(&mut self, delta_seconds: f32) {
        let dt = delta_seconds.max(0.0);
        let swirl = self.config.swirl_strength * dt;
        let decay = self.config.decay_rate * dt;
        let shrink = (-self.config.shrink_rate * dt).exp();

        for particle in &mut self.particles {
            // Tangent to the circle through the particle in the xy plane.
            let radial =
                Vec3::new(-particle.position.y, particle.position.x, 0.0).normalize_or_zero();
            particle.velocity += radial * swirl;
            particle.position += particle.velocity * dt;
            particle.life -= decay;
            particle.size = (particle.size * shrink).max(f32::MIN_POSITIVE);
        }

        self.particles.retain(|particle| particle.life > 0.0);
    }
}

impl<R: Rng> Emitter for ParticleSystem<R> {
    fn emit(&mut self, position: Vec3, base_velocity: Vec3) -> bool {
        self.spawn(position, base_velocity)
    }
}
