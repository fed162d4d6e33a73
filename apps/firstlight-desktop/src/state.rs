use crate::config::AppConfig;
use firstlight_camera::Camera;
use firstlight_input::{Action, InputState, KeyBindings, MixControl, MouseTracker, ScrollRouter};
use firstlight_render::{FrameLimiter, FrameUniforms};
use glam::Vec3;
use std::time::Instant;
use winit::keyboard::KeyCode;

/// Everything the event loop mutates between frames.
pub struct AppState {
    pub camera: Camera,
    pub bindings: KeyBindings,
    pub input: InputState,
    pub mouse: MouseTracker,
    pub scroll: ScrollRouter,
    pub mix: MixControl,
    /// Set once the window owns the pointer; look then follows raw motion.
    pub mouse_captured: bool,
    limiter: FrameLimiter,
    started: Instant,
    close_requested: bool,
}

impl AppState {
    pub fn new(config: &AppConfig, now: Instant) -> Self {
        let camera = Camera::with_settings(
            config.camera.position,
            Vec3::Y,
            config.camera.preset.features(),
            config.camera.settings,
        );
        Self {
            camera,
            bindings: KeyBindings::default(),
            input: InputState::new(),
            mouse: MouseTracker::new(),
            scroll: ScrollRouter::new(config.scroll_zoom),
            mix: MixControl::new(config.mix),
            mouse_captured: false,
            limiter: FrameLimiter::new(config.frame_rate, now),
            started: now,
            close_requested: false,
        }
    }

    pub fn handle_key(&mut self, key: KeyCode, pressed: bool) {
        if let Some(Action::Close) = self.input.handle_key(&self.bindings, key, pressed) {
            tracing::info!("close requested");
            self.close_requested = true;
        }
    }

    /// Absolute cursor position, used for look only while the pointer is
    /// not captured.
    pub fn handle_cursor(&mut self, x: f64, y: f64) {
        if self.mouse_captured {
            return;
        }
        let (dx, dy) = self.mouse.delta(x, y);
        if dx != 0.0 || dy != 0.0 {
            self.camera.process_look(dx, dy);
        }
    }

    /// Raw pointer motion. Unbounded by the window edge, so it drives look
    /// while the pointer is captured.
    pub fn handle_mouse_motion(&mut self, dx: f64, dy: f64) {
        if self.mouse_captured {
            self.camera.process_look(dx as f32, dy as f32);
        }
    }

    pub fn handle_scroll(&mut self, dy: f64) {
        if let Some(offset) = self.scroll.route(dy) {
            self.camera.process_zoom(offset);
        }
    }

    /// Drop held keys and re-prime the mouse so nothing sticks while the
    /// window is in the background.
    pub fn focus_lost(&mut self) {
        self.input.clear();
        self.mouse.reset();
    }

    pub fn close_requested(&self) -> bool {
        self.close_requested
    }

    /// Advance one frame if the frame gate is open: apply held movement and
    /// mix keys, then return the values to draw with.
    pub fn tick(&mut self, now: Instant, aspect: f32) -> Option<FrameUniforms> {
        let delta_time = self.limiter.ready(now)?;

        let movement = self.input.movement(&self.bindings);
        if !movement.is_empty() {
            self.camera.process_movement(movement, delta_time);
        }
        self.mix.update(
            self.input.action_held(&self.bindings, Action::RaiseMix),
            self.input.action_held(&self.bindings, Action::LowerMix),
            delta_time,
        );

        Some(FrameUniforms {
            view: self.camera.view_matrix(),
            projection: self.camera.projection_matrix(aspect),
            visible: self.mix.value(),
            elapsed: now.duration_since(self.started).as_secs_f32(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::time::Duration;

    fn state() -> (AppState, Instant) {
        let start = Instant::now();
        (AppState::new(&AppConfig::default(), start), start)
    }

    #[test]
    fn no_frame_before_the_interval() {
        let (mut state, start) = state();
        assert!(state.tick(start + Duration::from_millis(5), 4.0 / 3.0).is_none());
    }

    #[test]
    fn held_forward_key_moves_camera() {
        let (mut state, start) = state();
        state.handle_key(KeyCode::KeyW, true);
        let frame = state
            .tick(start + Duration::from_millis(50), 4.0 / 3.0)
            .unwrap();
        // 2.5 units/s for 0.05 s along -Z.
        assert_relative_eq!(state.camera.position.z, 3.0 - 0.125, epsilon = 1e-5);
        assert_relative_eq!(frame.elapsed, 0.05, epsilon = 1e-5);
        assert_eq!(frame.view, state.camera.view_matrix());
    }

    #[test]
    fn arrow_keys_drive_the_mix() {
        let (mut state, start) = state();
        state.handle_key(KeyCode::ArrowUp, true);
        let frame = state
            .tick(start + Duration::from_millis(100), 1.0)
            .unwrap();
        assert_relative_eq!(frame.visible, 0.3, epsilon = 1e-5);
    }

    #[test]
    fn escape_requests_close() {
        let (mut state, _) = state();
        assert!(!state.close_requested());
        state.handle_key(KeyCode::Escape, true);
        assert!(state.close_requested());
    }

    #[test]
    fn first_cursor_sample_does_not_turn() {
        let (mut state, _) = state();
        let yaw = state.camera.yaw();
        state.handle_cursor(640.0, 10.0);
        assert_eq!(state.camera.yaw(), yaw);
        state.handle_cursor(650.0, 10.0);
        assert_relative_eq!(state.camera.yaw(), yaw + 1.0, epsilon = 1e-4);
    }

    #[test]
    fn captured_motion_keeps_turning_past_the_window_edge() {
        let (mut state, _) = state();
        state.mouse_captured = true;
        let yaw = state.camera.yaw();
        // 40 steps of 50 px is 2000 px, well past an 800 px wide window.
        for _ in 0..40 {
            state.handle_mouse_motion(50.0, 0.0);
        }
        assert_relative_eq!(state.camera.yaw(), yaw + 200.0, epsilon = 1e-3);
    }

    #[test]
    fn captured_pointer_ignores_cursor_positions() {
        let (mut state, _) = state();
        state.mouse_captured = true;
        let yaw = state.camera.yaw();
        state.handle_cursor(0.0, 0.0);
        state.handle_cursor(799.0, 0.0);
        assert_eq!(state.camera.yaw(), yaw);
    }

    #[test]
    fn free_pointer_ignores_raw_motion() {
        let (mut state, _) = state();
        let yaw = state.camera.yaw();
        state.handle_mouse_motion(50.0, 0.0);
        assert_eq!(state.camera.yaw(), yaw);
    }

    #[test]
    fn scroll_zoom_is_opt_in() {
        let (mut state, _) = state();
        let fov = state.camera.fov();
        state.handle_scroll(5.0);
        assert_eq!(state.camera.fov(), fov);

        let config = AppConfig {
            scroll_zoom: true,
            ..AppConfig::default()
        };
        let mut state = AppState::new(&config, Instant::now());
        state.handle_scroll(5.0);
        assert_relative_eq!(state.camera.fov(), fov - 5.0);
    }

    #[test]
    fn focus_loss_releases_keys() {
        let (mut state, start) = state();
        state.handle_key(KeyCode::KeyW, true);
        state.focus_lost();
        state.tick(start + Duration::from_millis(50), 1.0).unwrap();
        assert_eq!(state.camera.position, Vec3::new(0.0, 0.0, 3.0));
    }
}
