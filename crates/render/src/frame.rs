use std::time::{Duration, Instant};

/// Longest delta time handed to a tick, in seconds.
pub const MAX_DELTA: f32 = 0.1;

/// Fixed-rate frame gate.
///
/// The caller polls [`ready`](Self::ready) in a tight loop; nothing here
/// sleeps.
#[derive(Debug, Clone)]
pub struct FrameLimiter {
    interval: Duration,
    last: Instant,
}

impl FrameLimiter {
    /// A limiter for `frame_rate` ticks per second, counting from `start`.
    /// A rate of zero is treated as one.
    pub fn new(frame_rate: u32, start: Instant) -> Self {
        Self {
            interval: Duration::from_secs(1) / frame_rate.max(1),
            last: start,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// `None` until a full interval has passed since the last accepted
    /// tick. Then accepts `now` and returns the elapsed seconds, capped at
    /// [`MAX_DELTA`].
    pub fn ready(&mut self, now: Instant) -> Option<f32> {
        let elapsed = now.checked_duration_since(self.last)?;
        if elapsed < self.interval {
            return None;
        }
        self.last = now;
        Some(elapsed.as_secs_f32().min(MAX_DELTA))
    }
}
