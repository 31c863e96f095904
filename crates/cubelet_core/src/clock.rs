use std::time::{Duration, Instant};

use tracing::debug;

/// Longest step handed to the simulation after a stall.
pub const MAX_FRAME_DELTA: f32 = 0.1;
const FPS_WINDOW: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct FrameClock {
    last_tick: Instant,
    window_start: Instant,
    window_frames: u32,
    fps: Option<f32>,
    total_frames: u64,
}

impl FrameClock {
    pub fn new(now: Instant) -> Self {
        Self {
            last_tick: now,
            window_start: now,
            window_frames: 0,
            fps: None,
            total_frames: 0,
        }
    }

    /// Seconds since the previous tick, clamped to [`MAX_FRAME_DELTA`].
    pub fn tick(&mut self, now: Instant) -> f32 {
        let elapsed = now.saturating_duration_since(self.last_tick).as_secs_f32();
        if elapsed > MAX_FRAME_DELTA {
            debug!(elapsed, "Frame delta clamped");
        }
        let dt = elapsed.min(MAX_FRAME_DELTA);
        self.last_tick = now;
        self.total_frames += 1;
        self.window_frames += 1;

        let window = now.saturating_duration_since(self.window_start);
        if window >= FPS_WINDOW {
            self.fps = Some(self.window_frames as f32 / window.as_secs_f32());
            self.window_frames = 0;
            self.window_start = now;
        }

        dt
    }

    /// Last published rate; `None` until a full second has elapsed.
    pub fn fps(&self) -> Option<f32> {
        self.fps
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::{FrameClock, MAX_FRAME_DELTA};

    #[test]
    fn tick_reports_elapsed_seconds() {
        let start = Instant::now();
        let mut clock = FrameClock::new(start);
        let dt = clock.tick(start + Duration::from_millis(16));
        assert!((dt - 0.016).abs() < 1e-4);
        assert_eq!(clock.total_frames(), 1);
    }

    #[test]
    fn long_stalls_are_clamped() {
        let start = Instant::now();
        let mut clock = FrameClock::new(start);
        assert_eq!(clock.tick(start + Duration::from_secs(3)), MAX_FRAME_DELTA);
    }

    #[test]
    fn fps_is_published_once_per_second() {
        let start = Instant::now();
        let mut clock = FrameClock::new(start);

        let mut now = start;
        for _ in 0..59 {
            now += Duration::from_micros(16_667);
            clock.tick(now);
        }
        assert_eq!(clock.fps(), None);

        now += Duration::from_millis(20);
        clock.tick(now);
        let fps = clock.fps().expect("a second has passed");
        assert!((fps - 60.0).abs() < 1.0);
    }
}
