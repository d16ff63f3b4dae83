//! Time management utilities

use std::time::{Duration, Instant};

/// Frame timer fed with host timestamps
///
/// The host owns the clock; the timer only sees the `now` values handed to
/// [`FrameTimer::tick`], which keeps it deterministic under simulated time.
#[derive(Debug, Clone, Default)]
pub struct FrameTimer {
    last_frame: Option<Duration>,
    delta_time: f32,
    total_time: f32,
    frame_count: u64,
}

impl FrameTimer {
    /// Create a new timer
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a frame at `now` and return the delta since the previous one.
    ///
    /// The first frame reports a delta of zero.
    pub fn tick(&mut self, now: Duration) -> f32 {
        self.delta_time = self
            .last_frame
            .map_or(0.0, |last| now.saturating_sub(last).as_secs_f32());
        self.total_time += self.delta_time;
        self.last_frame = Some(now);
        self.frame_count += 1;
        self.delta_time
    }

    /// Get the time since the last frame in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Get the total elapsed time between the first and latest frame
    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    /// Get the current frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Get the average FPS over all recorded frames
    pub fn average_fps(&self) -> f32 {
        if self.total_time > 0.0 {
            (self.frame_count.saturating_sub(1)) as f32 / self.total_time
        } else {
            0.0
        }
    }
}

/// Simple stopwatch for measuring elapsed wall-clock time
#[derive(Debug)]
pub struct Stopwatch {
    start_time: Option<Instant>,
    elapsed: Duration,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    /// Create a new stopped stopwatch
    pub fn new() -> Self {
        Self {
            start_time: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Create a new stopwatch and start it immediately
    pub fn start_new() -> Self {
        let mut stopwatch = Self::new();
        stopwatch.start();
        stopwatch
    }

    /// Start the stopwatch
    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Stop the stopwatch and accumulate elapsed time
    pub fn stop(&mut self) {
        if let Some(start) = self.start_time {
            self.elapsed += start.elapsed();
            self.start_time = None;
        }
    }

    /// Get the elapsed time
    pub fn elapsed(&self) -> Duration {
        let current_elapsed = self.start_time.map_or(Duration::ZERO, |start| start.elapsed());
        self.elapsed + current_elapsed
    }

    /// Check if the stopwatch is currently running
    pub fn is_running(&self) -> bool {
        self.start_time.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_timer_first_tick_has_zero_delta() {
        let mut timer = FrameTimer::new();
        assert_eq!(timer.tick(Duration::from_millis(500)), 0.0);
        assert_eq!(timer.frame_count(), 1);
    }

    #[test]
    fn test_frame_timer_accumulates_deltas() {
        let mut timer = FrameTimer::new();
        timer.tick(Duration::from_millis(0));
        timer.tick(Duration::from_millis(250));
        let delta = timer.tick(Duration::from_millis(500));

        assert!((delta - 0.25).abs() < 1e-6);
        assert!((timer.total_time() - 0.5).abs() < 1e-6);
        assert!((timer.average_fps() - 4.0).abs() < 1e-4);
    }

    #[test]
    fn test_frame_timer_ignores_backwards_time() {
        let mut timer = FrameTimer::new();
        timer.tick(Duration::from_millis(100));
        assert_eq!(timer.tick(Duration::from_millis(50)), 0.0);
    }

    #[test]
    fn test_stopwatch_start_stop() {
        let mut stopwatch = Stopwatch::start_new();
        assert!(stopwatch.is_running());
        stopwatch.stop();
        assert!(!stopwatch.is_running());
        let frozen = stopwatch.elapsed();
        assert_eq!(stopwatch.elapsed(), frozen);
    }
}
