//! Session clock for the viewer.
//!
//! One source of truth for frame timing and input-event timestamps.
//!
//! ```ignore
//! let mut time = Time::new();
//!
//! // Once per frame:
//! let (elapsed, delta) = time.update();
//! ```

use std::time::{Duration, Instant};

/// How often the measured frame rate is logged.
const FPS_LOG_INTERVAL: Duration = Duration::from_secs(5);

/// Time tracking for the render loop.
#[derive(Debug)]
pub struct Time {
    /// When the timer was created.
    start: Instant,
    /// When the last frame occurred.
    last_frame: Instant,
    frame_count: u64,
    fps_frame_count: u64,
    fps_update_time: Instant,
}

impl Time {
    /// Create a new time tracker starting from now.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_frame: now,
            frame_count: 0,
            fps_frame_count: 0,
            fps_update_time: now,
        }
    }

    /// Update timing values. Call once per frame.
    ///
    /// Returns `(elapsed_time, delta_time)` in seconds.
    pub fn update(&mut self) -> (f32, f32) {
        let now = Instant::now();

        let delta = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.frame_count += 1;

        let fps_elapsed = now.duration_since(self.fps_update_time);
        if fps_elapsed >= FPS_LOG_INTERVAL {
            let frames_since = self.frame_count - self.fps_frame_count;
            let fps = frames_since as f32 / fps_elapsed.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
            tracing::debug!(target: "time", fps, frames = self.frame_count, "frame rate");
        }

        (now.duration_since(self.start).as_secs_f32(), delta)
    }

    /// Current session time, for stamping input events as they arrive.
    #[inline]
    pub fn timestamp(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}
