use std::time::{Duration, Instant};

/// Measures wall-clock time between consecutive frames.
#[derive(Debug, Default, Clone)]
pub struct FrameClock {
    last_tick: Option<Instant>,
    elapsed: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.last_tick = None;
        self.elapsed = Duration::ZERO;
    }

    /// Seconds since the previous call. The first call after construction or
    /// [`FrameClock::reset`] returns zero.
    pub fn delta_seconds(&mut self) -> f32 {
        self.delta_at(Instant::now())
    }

    /// Returns whether a tick has been measured since construction or reset.
    pub fn is_running(&self) -> bool {
        self.last_tick.is_some()
    }

    /// Total time accumulated across all measured deltas.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    fn delta_at(&mut self, now: Instant) -> f32 {
        let delta = self
            .last_tick
            .map(|last| now.saturating_duration_since(last))
            .unwrap_or(Duration::ZERO);
        self.last_tick = Some(now);
        self.elapsed += delta;
        delta.as_secs_f32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_delta_is_zero() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.delta_at(Instant::now()), 0.0);
    }

    #[test]
    fn starts_running_on_first_delta() {
        let mut clock = FrameClock::new();
        assert!(!clock.is_running());
        clock.delta_seconds();
        assert!(clock.is_running());
        clock.reset();
        assert!(!clock.is_running());
    }

    #[test]
    fn measures_gap_between_ticks() {
        let mut clock = FrameClock::new();
        let start = Instant::now();
        clock.delta_at(start);

        let delta = clock.delta_at(start + Duration::from_millis(250));
        assert!((delta - 0.25).abs() < 1e-6);

        clock.delta_at(start + Duration::from_millis(400));
        assert_eq!(clock.elapsed(), Duration::from_millis(400));
    }

    #[test]
    fn reset_forgets_previous_tick() {
        let mut clock = FrameClock::new();
        let start = Instant::now();
        clock.delta_at(start);
        clock.reset();

        assert_eq!(clock.delta_at(start + Duration::from_secs(5)), 0.0);
        assert_eq!(clock.elapsed(), Duration::ZERO);
    }
}
