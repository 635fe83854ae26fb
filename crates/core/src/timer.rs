//! Frame timer.

use std::time::{Duration, Instant};

/// Measures per-frame delta time and a once-per-second FPS average.
#[derive(Debug)]
pub struct Timer {
    start: Instant,
    last_tick: Instant,
    delta: Duration,
    frames_this_window: u32,
    window_start: Instant,
    fps: f32,
}

impl Timer {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_tick: now,
            delta: Duration::ZERO,
            frames_this_window: 0,
            window_start: now,
            fps: 0.0,
        }
    }

    /// Advances the timer by one frame and returns the seconds elapsed since
    /// the previous call.
    pub fn update(&mut self) -> f32 {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> f32 {
        self.delta = now.saturating_duration_since(self.last_tick);
        self.last_tick = now;

        self.frames_this_window += 1;
        let window = now.saturating_duration_since(self.window_start);
        if window >= Duration::from_secs(1) {
            self.fps = self.frames_this_window as f32 / window.as_secs_f32();
            self.frames_this_window = 0;
            self.window_start = now;
        }

        self.delta.as_secs_f32()
    }

    /// Seconds between the last two updates.
    pub fn delta(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Total time since the timer was created.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Frames per second averaged over the last full second; zero until
    /// the first second has passed.
    pub fn fps(&self) -> f32 {
        self.fps
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_reports_delta() {
        let mut timer = Timer::new();
        let start = timer.last_tick;
        let delta = timer.tick_at(start + Duration::from_millis(16));
        assert!((delta - 0.016).abs() < 1e-6);
        assert!((timer.delta() - 0.016).abs() < 1e-6);
    }

    #[test]
    fn test_fps_averages_over_one_second() {
        let mut timer = Timer::new();
        let start = timer.last_tick;
        assert_eq!(timer.fps(), 0.0);

        for frame in 1..=60 {
            timer.tick_at(start + Duration::from_micros(1_000_000 * frame / 60));
        }
        assert!((timer.fps() - 60.0).abs() < 0.5);
    }

    #[test]
    fn test_clock_going_backwards_saturates() {
        let mut timer = Timer::new();
        let start = timer.last_tick;
        timer.tick_at(start + Duration::from_millis(10));
        assert_eq!(timer.tick_at(start), 0.0);
    }
}
