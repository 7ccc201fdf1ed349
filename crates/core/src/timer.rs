//! Wall-clock timing for animation and frame statistics.

use std::time::{Duration, Instant};

/// Measures time since start and between frames.
#[derive(Debug)]
pub struct Timer {
    start: Instant,
    last_tick: Instant,
    frames: u64,
    window_start: Instant,
    window_frames: u64,
}

impl Timer {
    /// Create a new timer, starting from now.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_tick: now,
            frames: 0,
            window_start: now,
            window_frames: 0,
        }
    }

    /// Total elapsed time since the timer was created or reset.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Elapsed time in seconds, used to drive the animation.
    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed().as_secs_f32()
    }

    /// Marks the end of a frame and returns the time since the previous tick.
    pub fn tick(&mut self) -> Duration {
        let now = Instant::now();
        let delta = now - self.last_tick;
        self.last_tick = now;
        self.frames += 1;
        self.window_frames += 1;
        delta
    }

    /// Number of ticks since creation or the last reset.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Returns the average frame rate once `interval` has passed since the
    /// last report, and starts a new measurement window.
    pub fn fps_report(&mut self, interval: Duration) -> Option<f64> {
        let span = self.last_tick.saturating_duration_since(self.window_start);
        if span < interval || span.is_zero() {
            return None;
        }
        let fps = self.window_frames as f64 / span.as_secs_f64();
        self.window_start = self.last_tick;
        self.window_frames = 0;
        Some(fps)
    }

    /// Reset the timer to the current time.
    pub fn reset(&mut self) {
        *self = Self::new();
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
    fn test_tick_counts_frames() {
        let mut timer = Timer::new();
        timer.tick();
        timer.tick();
        assert_eq!(timer.frames(), 2);

        timer.reset();
        assert_eq!(timer.frames(), 0);
    }

    #[test]
    fn test_fps_report_waits_for_interval() {
        let mut timer = Timer::new();
        timer.tick();
        assert!(timer.fps_report(Duration::from_secs(3600)).is_none());
    }

    #[test]
    fn test_fps_report_after_interval() {
        let mut timer = Timer::new();
        std::thread::sleep(Duration::from_millis(5));
        timer.tick();
        let fps = timer.fps_report(Duration::from_millis(1));
        assert!(fps.is_some_and(|f| f > 0.0));
        // window restarts after a report
        assert!(timer.fps_report(Duration::from_millis(1)).is_none());
    }
}
