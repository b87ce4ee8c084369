use std::time::{Duration, Instant};

/// Delta-time source for the update/render callbacks.
///
/// Delta time is clamped so a debugger pause or a minimized window does not
/// hand the callbacks a multi-second step.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(250))
    }

    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            last: Instant::now(),
            dt_min,
            dt_max,
        }
    }

    /// Advance to now and return the clamped step in seconds.
    pub fn tick(&mut self) -> f32 {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> f32 {
        let dt = now
            .saturating_duration_since(self.last)
            .clamp(self.dt_min, self.dt_max);
        self.last = now;
        dt.as_secs_f32()
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_stall_is_clamped_to_max() {
        let mut clock = FrameClock::new();
        let start = clock.last;
        let dt = clock.tick_at(start + Duration::from_secs(5));
        assert!((dt - 0.25).abs() < 1e-6);
    }

    #[test]
    fn zero_step_is_clamped_to_min() {
        let mut clock = FrameClock::new();
        let start = clock.last;
        let dt = clock.tick_at(start);
        assert!((dt - 0.0001).abs() < 1e-6);
    }

    #[test]
    fn normal_step_passes_through() {
        let mut clock = FrameClock::new();
        let start = clock.last;
        let dt = clock.tick_at(start + Duration::from_millis(16));
        assert!((dt - 0.016).abs() < 1e-6);
    }
}
