//! Frame clock for the render loop.
//!
//! Tracks elapsed time, delta time, frame count and a smoothed FPS. The
//! camera orbit and shader uniforms read `elapsed`; transitions are counted
//! in frames and do not look at the clock at all.
//!
//! ```ignore
//! let mut clock = FrameClock::new();
//! // once per frame:
//! let (elapsed, delta) = clock.update();
//! ```

use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct FrameClock {
    start: Instant,
    last_frame: Instant,
    elapsed_secs: f32,
    delta_secs: f32,
    frame_count: u64,
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: Instant,
    fps_update_interval: Duration,
    /// When set, each update advances by exactly this much.
    fixed_delta: Option<f32>,
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_frame: now,
            elapsed_secs: 0.0,
            delta_secs: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            fps_update_interval: Duration::from_millis(500),
            fixed_delta: None,
        }
    }

    /// Clock that ignores wall time and advances `delta` seconds per update.
    pub fn fixed(delta: f32) -> Self {
        let mut clock = Self::new();
        clock.fixed_delta = Some(delta.max(0.0));
        clock
    }

    /// Update timing values. Call once per frame.
    ///
    /// Returns `(elapsed, delta)` in seconds.
    pub fn update(&mut self) -> (f32, f32) {
        let now = Instant::now();
        self.frame_count += 1;

        match self.fixed_delta {
            Some(delta) => {
                self.delta_secs = delta;
                self.elapsed_secs += delta;
            }
            None => {
                self.delta_secs = now.duration_since(self.last_frame).as_secs_f32();
                self.elapsed_secs = now.duration_since(self.start).as_secs_f32();
            }
        }
        self.last_frame = now;

        let fps_elapsed = now.duration_since(self.fps_update_time);
        if fps_elapsed >= self.fps_update_interval {
            let frames_since = self.frame_count - self.fps_frame_count;
            self.fps = frames_since as f32 / fps_elapsed.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
        }

        (self.elapsed_secs, self.delta_secs)
    }

    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed_secs
    }

    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Frames per second, refreshed every half second.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
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
    use std::thread;

    #[test]
    fn test_clock_new() {
        let clock = FrameClock::new();
        assert_eq!(clock.frame(), 0);
        assert_eq!(clock.elapsed(), 0.0);
    }

    #[test]
    fn test_clock_update() {
        let mut clock = FrameClock::new();
        thread::sleep(Duration::from_millis(10));
        let (elapsed, delta) = clock.update();

        assert!(elapsed > 0.0);
        assert!(delta > 0.0);
        assert_eq!(clock.frame(), 1);
    }

    #[test]
    fn test_fixed_clock() {
        let mut clock = FrameClock::fixed(1.0 / 60.0);
        thread::sleep(Duration::from_millis(20));
        clock.update();
        clock.update();

        assert!((clock.delta() - 1.0 / 60.0).abs() < 1e-6);
        assert!((clock.elapsed() - 2.0 / 60.0).abs() < 1e-6);
    }

    #[test]
    fn test_fps_waits_for_interval() {
        let mut clock = FrameClock::new();
        clock.update();
        clock.update();
        // Two back-to-back frames are well inside the 500 ms window.
        assert_eq!(clock.fps(), 0.0);
        assert_eq!(clock.frame(), 2);
    }
}
