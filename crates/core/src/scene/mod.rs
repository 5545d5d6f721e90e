use std::fmt;

use glam::Vec3;
use rand::{rngs::StdRng, Rng};

use crate::{
    render::bar_direction, AppConfig, BarHeights, BarMapper, EmissionConfig, Emitter, FrameClock,
    ParticleSystem, Result, SampleBuffer, SpectrumAnalyzer, VisualState,
};

/// Decides which bars spawn particles and where those particles start.
#[derive(Debug, Clone, PartialEq)]
pub struct EmissionPolicy {
    threshold: f32,
    base_radius: f32,
    velocity_scale: f32,
}

impl EmissionPolicy {
    pub fn new(config: &EmissionConfig) -> Self {
        Self {
            threshold: config.threshold,
            base_radius: config.base_radius,
            velocity_scale: config.velocity_scale,
        }
    }

    /// Indices of the bars strictly above the threshold.
    pub fn triggered<'a>(&self, heights: &'a BarHeights) -> impl Iterator<Item = usize> + 'a {
        let threshold = self.threshold;
        heights
            .iter()
            .enumerate()
            .filter(move |&(_, height)| height > threshold)
            .map(|(index, _)| index)
    }

    /// Start position at the tip of bar `index` and an outward velocity
    /// proportional to its height.
    pub fn placement(&self, index: usize, count: usize, height: f32) -> (Vec3, Vec3) {
        let direction = bar_direction(index, count);
        let position = direction * (self.base_radius + height);
        let velocity = direction * (height * self.velocity_scale);
        (position, velocity)
    }

    /// Emits one particle per triggered bar and returns how many were
    /// accepted by `emitter`.
    pub fn emit_from<E: Emitter>(&self, heights: &BarHeights, emitter: &mut E) -> usize {
        let count = heights.len();
        let bars = heights.as_slice();
        self.triggered(heights)
            .filter(|&index| {
                let (position, velocity) = self.placement(index, count, bars[index]);
                emitter.emit(position, velocity)
            })
            .count()
    }
}

/// Runs the per-frame pipeline: analyse, map, emit, simulate, publish.
///
/// The orchestrator owns every piece of pipeline state. It never paces
/// itself; the caller invokes [`FrameOrchestrator::tick`] once per rendered
/// frame.
pub struct FrameOrchestrator<R = StdRng> {
    buffer: SampleBuffer,
    analyzer: SpectrumAnalyzer,
    mapper: BarMapper,
    emission: EmissionPolicy,
    particles: ParticleSystem<R>,
    clock: FrameClock,
    state: VisualState,
    frames: u64,
}

impl FrameOrchestrator<StdRng> {
    /// Builds the pipeline, seeding the particle system from `config.seed` or
    /// from entropy when no seed is set.
    pub fn new(buffer: SampleBuffer, config: &AppConfig) -> Result<Self> {
        config.validate()?;
        let particles = match config.seed {
            Some(seed) => ParticleSystem::seeded(config.particles.clone(), seed)?,
            None => ParticleSystem::from_entropy(config.particles.clone())?,
        };
        Self::with_particles(buffer, config, particles)
    }
}

impl<R: Rng> FrameOrchestrator<R> {
    pub fn with_particles(
        buffer: SampleBuffer,
        config: &AppConfig,
        particles: ParticleSystem<R>,
    ) -> Result<Self> {
        let analyzer = SpectrumAnalyzer::new(&config.analysis)?;
        config.bars.validate()?;
        config.emission.validate()?;

        if analyzer.window_size() > buffer.len() {
            tracing::warn!(
                window = analyzer.window_size(),
                samples = buffer.len(),
                "buffer is shorter than one analysis window; every tick will fail"
            );
        }

        let state = VisualState {
            bar_heights: BarHeights::new(vec![0.0; analyzer.num_bars()]),
            ..Default::default()
        };

        Ok(Self {
            buffer,
            analyzer,
            mapper: BarMapper::new(&config.bars),
            emission: EmissionPolicy::new(&config.emission),
            particles,
            clock: FrameClock::new(),
            state,
            frames: 0,
        })
    }

    pub fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }

    pub fn analyzer(&self) -> &SpectrumAnalyzer {
        &self.analyzer
    }

    pub fn particles(&self) -> &ParticleSystem<R> {
        &self.particles
    }

    /// State published by the last successful tick.
    pub fn state(&self) -> &VisualState {
        &self.state
    }

    /// Number of successful ticks so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Returns the wall clock driving [`FrameOrchestrator::tick`].
    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    /// Runs one frame using the wall-clock time since the previous successful
    /// tick. A failed tick leaves the clock alone, so the next successful one
    /// simulates the whole gap.
    pub fn tick(&mut self) -> Result<&VisualState> {
        self.run(FrameClock::delta_seconds)
    }

    /// Runs one frame with an externally supplied time step.
    ///
    /// When analysis fails nothing else runs: the particle set and the
    /// previously published state stay as they were and the error is returned.
    pub fn tick_with_delta(&mut self, delta_seconds: f32) -> Result<&VisualState> {
        self.run(|_| delta_seconds)
    }

    fn run(&mut self, measure: impl FnOnce(&mut FrameClock) -> f32) -> Result<&VisualState> {
        let frame = match self.analyzer.analyze(&self.buffer) {
            Ok(frame) => frame,
            Err(err) => {
                tracing::warn!(frame = self.frames, error = %err, "skipping frame");
                return Err(err);
            }
        };
        let delta_seconds = measure(&mut self.clock);

        self.mapper.map_into(frame, &mut self.state.bar_heights);
        let emitted = self
            .emission
            .emit_from(&self.state.bar_heights, &mut self.particles);
        self.particles.update(delta_seconds);
        self.particles.snapshot_into(&mut self.state.particles);

        self.state.frame_index = self.frames;
        self.state.cursor = self.analyzer.cursor().position();
        self.state.emitted = emitted;
        self.frames += 1;

        tracing::debug!(
            frame = self.state.frame_index,
            cursor = self.state.cursor,
            emitted,
            live = self.particles.len(),
            "frame ready"
        );
        Ok(&self.state)
    }
}

impl<R> fmt::Debug for FrameOrchestrator<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameOrchestrator")
            .field("samples", &self.buffer.len())
            .field("analyzer", &self.analyzer)
            .field("frames", &self.frames)
            .field("live_particles", &self.state.particles.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{f32::consts::PI, time::Duration};

    use crate::{ParticleConfig, VisualiserError};

    use super::*;

    #[derive(Default)]
    struct RecordingEmitter {
        calls: Vec<(Vec3, Vec3)>,
        capacity: usize,
    }

    impl Emitter for RecordingEmitter {
        fn emit(&mut self, position: Vec3, base_velocity: Vec3) -> bool {
            self.calls.push((position, base_velocity));
            self.calls.len() <= self.capacity
        }
    }

    fn seeded_config() -> AppConfig {
        AppConfig {
            seed: Some(11),
            ..Default::default()
        }
    }

    fn tone_buffer(len: usize) -> SampleBuffer {
        // Bin 32 of a 512 window at 8 kHz, loud enough to saturate the bar.
        let samples = (0..len)
            .map(|n| ((2.0 * PI * 500.0 * n as f32 / 8_000.0).sin() * 20_000.0) as i16)
            .collect();
        SampleBuffer::new(samples, 8_000, 1).unwrap()
    }

    #[test]
    fn only_bars_above_threshold_emit() {
        let policy = EmissionPolicy::new(&EmissionConfig::default());
        let heights = BarHeights::new(vec![0.5, 2.0, 1.4, 1.6]);

        let triggered: Vec<_> = policy.triggered(&heights).collect();
        assert_eq!(triggered, vec![1, 3]);

        let mut emitter = RecordingEmitter {
            capacity: usize::MAX,
            ..Default::default()
        };
        assert_eq!(policy.emit_from(&heights, &mut emitter), 2);
        assert_eq!(emitter.calls.len(), 2);
        assert_eq!(emitter.calls[0], policy.placement(1, 4, 2.0));
        assert_eq!(emitter.calls[1], policy.placement(3, 4, 1.6));
    }

    #[test]
    fn threshold_is_strict() {
        let policy = EmissionPolicy::new(&EmissionConfig::default());
        let heights = BarHeights::new(vec![1.5, 1.5]);
        assert_eq!(policy.triggered(&heights).count(), 0);
    }

    #[test]
    fn placement_starts_at_bar_tip() {
        let policy = EmissionPolicy::new(&EmissionConfig::default());
        let (position, velocity) = policy.placement(0, 4, 2.0);

        assert!((position - Vec3::new(2.5, 0.0, 0.0)).length() < 1e-6);
        assert!((velocity - Vec3::new(0.6, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn counts_only_accepted_emissions() {
        let policy = EmissionPolicy::new(&EmissionConfig::default());
        let heights = BarHeights::new(vec![3.0; 6]);
        let mut emitter = RecordingEmitter {
            capacity: 4,
            ..Default::default()
        };

        assert_eq!(policy.emit_from(&heights, &mut emitter), 4);
        assert_eq!(emitter.calls.len(), 6);
    }

    #[test]
    fn silence_never_spawns_particles() {
        let buffer = SampleBuffer::new(vec![0; 4_096], 44_100, 1).unwrap();
        let mut orchestrator = FrameOrchestrator::new(buffer, &seeded_config()).unwrap();

        for _ in 0..200 {
            let state = orchestrator.tick_with_delta(1.0 / 60.0).unwrap();
            assert_eq!(state.bar_heights.len(), 256);
            assert!(state.bar_heights.iter().all(|height| height == 0.0));
            assert_eq!(state.emitted, 0);
            assert!(state.particles.is_empty());
        }
        assert_eq!(orchestrator.frames(), 200);
    }

    #[test]
    fn loud_tone_fills_particles_up_to_capacity() {
        let config = AppConfig {
            particles: ParticleConfig {
                max_particles: 5,
                ..Default::default()
            },
            ..seeded_config()
        };
        let mut orchestrator = FrameOrchestrator::new(tone_buffer(4_096), &config).unwrap();

        let state = orchestrator.tick_with_delta(0.0).unwrap();
        assert_eq!(state.bar_heights.as_slice()[32], 3.0);
        assert!(state.emitted >= 1);

        for _ in 0..20 {
            let state = orchestrator.tick_with_delta(0.01).unwrap();
            assert!(state.particles.len() <= 5);
        }
        assert_eq!(orchestrator.particles().len(), 5);
    }

    #[test]
    fn first_measured_tick_does_not_age_particles() {
        let mut orchestrator =
            FrameOrchestrator::new(tone_buffer(2_048), &seeded_config()).unwrap();

        let state = orchestrator.tick().unwrap();
        assert!(state.emitted > 0);
        assert!(state.particles.iter().all(|particle| particle.life == 1.0));
    }

    #[test]
    fn failed_analysis_skips_the_whole_tick() {
        let buffer = SampleBuffer::new(vec![0; 100], 8_000, 1).unwrap();
        let mut orchestrator = FrameOrchestrator::new(buffer, &seeded_config()).unwrap();
        let before = orchestrator.state().clone();

        let err = orchestrator.tick_with_delta(0.016).unwrap_err();
        assert!(matches!(err, VisualiserError::Analysis(_)));
        assert_eq!(orchestrator.state(), &before);
        assert_eq!(orchestrator.frames(), 0);
        assert_eq!(orchestrator.analyzer().cursor().position(), 0);
    }

    #[test]
    fn failed_measured_ticks_leave_the_clock_untouched() {
        let short = SampleBuffer::new(vec![0; 100], 8_000, 1).unwrap();
        let mut orchestrator = FrameOrchestrator::new(short, &seeded_config()).unwrap();

        for _ in 0..3 {
            assert!(orchestrator.tick().is_err());
        }
        assert!(!orchestrator.clock().is_running());
        assert_eq!(orchestrator.clock().elapsed(), Duration::ZERO);

        let buffer = SampleBuffer::new(vec![0; 2_048], 8_000, 1).unwrap();
        let mut orchestrator = FrameOrchestrator::new(buffer, &seeded_config()).unwrap();
        orchestrator.tick().unwrap();
        assert!(orchestrator.clock().is_running());
    }

    #[test]
    fn external_delta_does_not_start_the_clock() {
        let buffer = SampleBuffer::new(vec![0; 2_048], 8_000, 1).unwrap();
        let mut orchestrator = FrameOrchestrator::new(buffer, &seeded_config()).unwrap();

        orchestrator.tick_with_delta(0.5).unwrap();
        assert!(!orchestrator.clock().is_running());
    }

    #[test]
    fn publishes_cursor_and_frame_index() {
        let buffer = SampleBuffer::new(vec![0; 2_048], 8_000, 1).unwrap();
        let mut orchestrator = FrameOrchestrator::new(buffer, &seeded_config()).unwrap();

        orchestrator.tick_with_delta(0.0).unwrap();
        let state = orchestrator.tick_with_delta(0.0).unwrap();
        assert_eq!(state.frame_index, 1);
        assert_eq!(state.cursor, 512);
    }
}
