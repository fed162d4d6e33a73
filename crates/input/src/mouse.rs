/// Turns absolute cursor positions into per-event deltas.
#[derive(Debug, Clone, Copy, Default)]
pub struct MouseTracker {
    last: Option<(f64, f64)>,
}

impl MouseTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a cursor position and get the offset since the previous one.
    ///
    /// The first sample only primes the tracker and yields `(0, 0)`, so a
    /// cursor that starts far from the window center does not jerk the view.
    pub fn delta(&mut self, x: f64, y: f64) -> (f32, f32) {
        let (last_x, last_y) = self.last.unwrap_or((x, y));
        self.last = Some((x, y));
        ((x - last_x) as f32, (y - last_y) as f32)
    }

    /// Forget the last position; the next sample primes again.
    pub fn reset(&mut self) {
        self.last = None;
    }

    pub fn is_primed(&self) -> bool {
        self.last.is_some()
    }
}

/// Decides whether scroll input reaches the camera's zoom.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScrollRouter {
    pub enabled: bool,
}

impl ScrollRouter {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// The zoom offset to apply for a vertical scroll of `dy`, if any.
    pub fn route(&self, dy: f64) -> Option<f32> {
        (self.enabled && dy != 0.0).then_some(dy as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sample_primes_without_motion() {
        let mut tracker = MouseTracker::new();
        assert!(!tracker.is_primed());
        assert_eq!(tracker.delta(400.0, 300.0), (0.0, 0.0));
        assert!(tracker.is_primed());
        assert_eq!(tracker.delta(410.0, 295.0), (10.0, -5.0));
        assert_eq!(tracker.delta(410.0, 295.0), (0.0, 0.0));
    }

    #[test]
    fn reset_primes_again() {
        let mut tracker = MouseTracker::new();
        tracker.delta(0.0, 0.0);
        tracker.reset();
        assert_eq!(tracker.delta(900.0, 900.0), (0.0, 0.0));
    }

    #[test]
    fn scroll_is_dropped_by_default() {
        let router = ScrollRouter::default();
        assert_eq!(router.route(1.0), None);
    }

    #[test]
    fn enabled_router_forwards_scroll() {
        let router = ScrollRouter::new(true);
        assert_eq!(router.route(-2.0), Some(-2.0));
        assert_eq!(router.route(0.0), None);
    }
}
