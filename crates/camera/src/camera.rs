use crate::features::{CameraFeatures, CameraPreset, Movement};
use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

pub const YAW: f32 = -90.0;
pub const PITCH: f32 = 0.0;
pub const ROLL: f32 = 0.0;
pub const SPEED: f32 = 2.5;
pub const ROLL_SPEED: f32 = SPEED * 20.0;
pub const SENSITIVITY: f32 = 0.1;
pub const FOV: f32 = 45.0;

pub const PITCH_LIMIT: f32 = 89.0;
pub const MIN_FOV: f32 = 1.0;
pub const MAX_FOV: f32 = 45.0;
pub const NEAR: f32 = 0.1;
pub const FAR: f32 = 100.0;

/// Tunable scalars and initial angles, all angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
    pub movement_speed: f32,
    pub roll_speed: f32,
    pub mouse_sensitivity: f32,
    pub fov: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            yaw: YAW,
            pitch: PITCH,
            roll: ROLL,
            movement_speed: SPEED,
            roll_speed: ROLL_SPEED,
            mouse_sensitivity: SENSITIVITY,
            fov: FOV,
        }
    }
}

/// Free-fly camera driven by yaw, pitch and (optionally) roll.
///
/// Front, up and right are derived from the angles and recomputed after
/// every angle change; they are never set independently.
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec3,
    pub movement_speed: f32,
    pub roll_speed: f32,
    pub mouse_sensitivity: f32,
    front: Vec3,
    up: Vec3,
    right: Vec3,
    world_up: Vec3,
    yaw: f32,
    pitch: f32,
    roll: f32,
    fov: f32,
    features: CameraFeatures,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::Y, CameraPreset::default().features())
    }
}

impl Camera {
    /// Create a camera with default tunables.
    pub fn new(position: Vec3, world_up: Vec3, features: CameraFeatures) -> Self {
        Self::with_settings(position, world_up, features, CameraSettings::default())
    }

    pub fn with_settings(
        position: Vec3,
        world_up: Vec3,
        features: CameraFeatures,
        settings: CameraSettings,
    ) -> Self {
        let mut camera = Self {
            position,
            movement_speed: settings.movement_speed,
            roll_speed: settings.roll_speed,
            mouse_sensitivity: settings.mouse_sensitivity,
            front: Vec3::NEG_Z,
            up: world_up,
            right: Vec3::X,
            world_up,
            yaw: settings.yaw,
            pitch: settings.pitch,
            roll: 0.0,
            fov: settings.fov.clamp(MIN_FOV, MAX_FOV),
            features,
        };
        if features.roll {
            camera.roll = settings.roll;
        }
        camera.clamp_pitch();
        camera.update_vectors();
        tracing::debug!(?features, position = ?camera.position, "camera created");
        camera
    }

    pub fn features(&self) -> CameraFeatures {
        self.features
    }

    pub fn front(&self) -> Vec3 {
        self.front
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn world_up(&self) -> Vec3 {
        self.world_up
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Current roll in degrees. Always zero when roll is disabled.
    pub fn roll(&self) -> f32 {
        self.roll
    }

    /// Vertical field of view in degrees.
    pub fn fov(&self) -> f32 {
        self.fov
    }

    /// Replace all three angles at once and rebuild the basis.
    ///
    /// Pitch clamping and the roll switch apply exactly as they do for input.
    pub fn set_orientation(&mut self, yaw: f32, pitch: f32, roll: f32) {
        self.yaw = yaw;
        self.pitch = pitch;
        if self.features.roll {
            self.roll = roll;
        }
        self.clamp_pitch();
        self.update_vectors();
    }

    /// Look from `position` toward `position + front`.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front, self.up)
    }

    /// Perspective projection using the camera's field of view.
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), aspect, NEAR, FAR)
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }

    /// Apply one tick of keyboard movement.
    pub fn process_movement(&mut self, movement: Movement, delta_time: f32) {
        let speed = self.movement_speed * delta_time;
        let (front, right) = if self.features.keep_level {
            (
                Vec3::new(self.front.x, 0.0, self.front.z).normalize_or_zero(),
                Vec3::new(self.right.x, 0.0, self.right.z).normalize_or_zero(),
            )
        } else {
            (self.front, self.right)
        };

        if movement.contains(Movement::FORWARD) {
            self.position += front * speed;
        }
        if movement.contains(Movement::BACKWARD) {
            self.position -= front * speed;
        }
        if movement.contains(Movement::LEFT) {
            self.position -= right * speed;
        }
        if movement.contains(Movement::RIGHT) {
            self.position += right * speed;
        }

        if self.features.up_down {
            if movement.contains(Movement::UP) {
                self.position += self.up * speed;
            }
            if movement.contains(Movement::DOWN) {
                self.position -= self.up * speed;
            }
        }

        if self.features.roll {
            let step = self.roll_speed * delta_time;
            if movement.contains(Movement::ROLL_RIGHT) {
                self.roll += step;
                self.update_up_right();
            }
            if movement.contains(Movement::ROLL_LEFT) {
                self.roll -= step;
                self.update_up_right();
            }
        }
    }

    /// Apply a mouse-look offset in screen pixels (y grows downward).
    ///
    /// With roll enabled the offset is rotated by the roll angle first, so
    /// looking stays relative to the rolled screen.
    pub fn process_look(&mut self, dx: f32, dy: f32) {
        let dx = dx * self.mouse_sensitivity;
        let dy = dy * self.mouse_sensitivity;

        if self.features.roll {
            let (sin, cos) = self.roll.to_radians().sin_cos();
            self.yaw += dx * cos - dy * sin;
            self.pitch -= dy * cos + dx * sin;
        } else {
            self.yaw += dx;
            self.pitch -= dy;
        }

        self.clamp_pitch();
        self.update_vectors();
    }

    /// Narrow or widen the field of view. No-op unless zoom is enabled.
    pub fn process_zoom(&mut self, dy: f32) {
        if !self.features.zoom {
            return;
        }
        self.fov = (self.fov - dy).clamp(MIN_FOV, MAX_FOV);
    }

    fn clamp_pitch(&mut self) {
        if self.features.constrain_pitch {
            self.pitch = self.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        }
    }

    fn update_vectors(&mut self) {
        self.update_front();
        self.update_up_right();
    }

    fn update_front(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.front = Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalize();
    }

    fn update_up_right(&mut self) {
        // Front parallel to world up has no horizontal reference; keep the last one.
        let Some(right) = self.front.cross(self.world_up).try_normalize() else {
            tracing::debug!(pitch = self.pitch, "camera basis degenerate, keeping previous right");
            self.up = self.right.cross(self.front).normalize();
            return;
        };

        if self.features.roll {
            let level_up = right.cross(self.front).normalize();
            let rotation = Quat::from_axis_angle(self.front, self.roll.to_radians());
            self.up = (rotation * level_up).normalize();
            self.right = self.front.cross(self.up);
        } else {
            self.right = right;
            self.up = right.cross(self.front);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    const EPS: f32 = 1e-4;

    fn camera(preset: CameraPreset) -> Camera {
        Camera::new(Vec3::new(0.0, 0.0, 3.0), Vec3::Y, preset.features())
    }

    fn assert_orthonormal(cam: &Camera) {
        let (f, u, r) = (cam.front(), cam.up(), cam.right());
        assert_relative_eq!(f.length(), 1.0, epsilon = EPS);
        assert_relative_eq!(u.length(), 1.0, epsilon = EPS);
        assert_relative_eq!(r.length(), 1.0, epsilon = EPS);
        assert!(f.dot(u).abs() < EPS, "front·up = {}", f.dot(u));
        assert!(f.dot(r).abs() < EPS, "front·right = {}", f.dot(r));
        assert!(u.dot(r).abs() < EPS, "up·right = {}", u.dot(r));
    }

    #[test]
    fn default_camera_looks_down_negative_z() {
        let cam = Camera::default();
        assert!(cam.front().abs_diff_eq(Vec3::NEG_Z, 1e-6));
        assert!(cam.up().abs_diff_eq(Vec3::Y, 1e-6));
        assert!(cam.right().abs_diff_eq(Vec3::X, 1e-6));
        assert_eq!(cam.fov(), FOV);
        assert_eq!(cam.roll_speed, 50.0);
    }

    #[test]
    fn view_matrix_maps_position_to_origin() {
        let cam = camera(CameraPreset::Full);
        let eye = cam.view_matrix().transform_point3(cam.position);
        assert!(eye.abs_diff_eq(Vec3::ZERO, 1e-5));
        let ahead = cam.view_matrix().transform_point3(cam.position + cam.front());
        assert!(ahead.abs_diff_eq(Vec3::NEG_Z, 1e-5));
    }

    #[test]
    fn view_projection_has_no_nan() {
        let cam = camera(CameraPreset::Full);
        let vp = cam.view_projection(800.0 / 600.0);
        assert!(!vp.is_nan());
    }

    #[test]
    fn forward_movement_is_speed_times_dt_along_front() {
        let mut cam = camera(CameraPreset::Full);
        let start = cam.position;
        let front = cam.front();
        cam.process_movement(Movement::FORWARD, 0.5);
        let expected = start + front * (SPEED * 0.5);
        assert!(cam.position.abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn movement_is_deterministic() {
        let mut a = camera(CameraPreset::Movement);
        let mut b = camera(CameraPreset::Movement);
        a.process_look(120.0, -40.0);
        b.process_look(120.0, -40.0);
        let flags = Movement::FORWARD | Movement::RIGHT | Movement::UP;
        a.process_movement(flags, 1.0 / 60.0);
        b.process_movement(flags, 1.0 / 60.0);
        assert_eq!(a.position, b.position);
    }

    #[test]
    fn opposite_directions_cancel() {
        let mut cam = camera(CameraPreset::Full);
        let start = cam.position;
        cam.process_movement(Movement::LEFT | Movement::RIGHT, 1.0);
        assert!(cam.position.abs_diff_eq(start, 1e-6));
    }

    #[test]
    fn strafe_moves_along_right() {
        let mut cam = camera(CameraPreset::NoFeatures);
        let start = cam.position;
        let right = cam.right();
        cam.process_movement(Movement::RIGHT, 2.0);
        assert!(cam.position.abs_diff_eq(start + right * 5.0, 1e-6));
    }

    #[test]
    fn keep_level_never_changes_height() {
        let mut cam = camera(CameraPreset::Fps);
        cam.process_look(37.0, -400.0);
        assert!(cam.pitch() > 30.0);
        let y = cam.position.y;
        for _ in 0..100 {
            cam.process_movement(
                Movement::FORWARD | Movement::RIGHT | Movement::BACKWARD | Movement::LEFT,
                0.016,
            );
            cam.process_movement(Movement::FORWARD, 0.016);
            cam.process_movement(Movement::LEFT, 0.016);
        }
        assert_eq!(cam.position.y, y);
    }

    #[test]
    fn disabled_capabilities_ignore_their_bits() {
        let mut cam = camera(CameraPreset::Fps);
        let start = cam.position;
        cam.process_movement(
            Movement::UP | Movement::DOWN | Movement::ROLL_LEFT | Movement::ROLL_RIGHT,
            1.0,
        );
        cam.process_movement(Movement::UP, 1.0);
        assert_eq!(cam.position, start);
        assert_eq!(cam.roll(), 0.0);
    }

    #[test]
    fn up_moves_along_camera_up() {
        let mut cam = camera(CameraPreset::Fly);
        let up = cam.up();
        let start = cam.position;
        cam.process_movement(Movement::UP, 1.0);
        assert!(cam.position.abs_diff_eq(start + up * SPEED, 1e-6));
    }

    #[test]
    fn roll_input_changes_roll_and_keeps_front() {
        let mut cam = camera(CameraPreset::Fly);
        let front = cam.front();
        cam.process_movement(Movement::ROLL_RIGHT, 0.5);
        assert_relative_eq!(cam.roll(), ROLL_SPEED * 0.5);
        assert!(cam.front().abs_diff_eq(front, 1e-6));
        assert_orthonormal(&cam);

        cam.process_movement(Movement::ROLL_LEFT, 0.5);
        assert_relative_eq!(cam.roll(), 0.0);
        assert!(cam.up().abs_diff_eq(Vec3::Y, 1e-5));
    }

    #[test]
    fn roll_of_ninety_turns_up_into_old_right() {
        let mut cam = camera(CameraPreset::Full);
        let right = cam.right();
        cam.set_orientation(YAW, 0.0, 90.0);
        // A positive roll about front swings up onto the unrolled right vector.
        assert!(cam.up().abs_diff_eq(right, 1e-5));
        assert_orthonormal(&cam);
    }

    #[test]
    fn pitch_clamp_converges_to_bound() {
        let mut cam = camera(CameraPreset::Full);
        for _ in 0..1000 {
            cam.process_look(0.0, -500.0);
            assert!(cam.pitch() <= PITCH_LIMIT);
        }
        assert_eq!(cam.pitch(), PITCH_LIMIT);

        for _ in 0..1000 {
            cam.process_look(0.0, 500.0);
        }
        assert_eq!(cam.pitch(), -PITCH_LIMIT);
    }

    #[test]
    fn unclamped_pitch_is_free() {
        let mut cam = camera(CameraPreset::Fly);
        cam.process_look(0.0, -1200.0);
        assert_relative_eq!(cam.pitch(), 120.0, epsilon = 1e-3);
        assert!(!cam.front().is_nan());
        assert!(!cam.right().is_nan());
    }

    #[test]
    fn exact_pole_keeps_previous_right() {
        let mut cam = camera(CameraPreset::NoFeatures);
        cam.set_orientation(0.0, 90.0, 0.0);
        let before = cam.right();
        // cos(90°) is not exactly zero in f32, so force a true pole by hand.
        cam.front = Vec3::Y;
        cam.update_up_right();
        assert_eq!(cam.right(), before);
        assert!(!cam.up().is_nan());
    }

    #[test]
    fn look_without_roll_applies_offsets_directly() {
        let mut cam = camera(CameraPreset::Movement);
        cam.process_look(100.0, 50.0);
        assert_relative_eq!(cam.yaw(), YAW + 10.0);
        assert_relative_eq!(cam.pitch(), -5.0);
    }

    #[test]
    fn rolled_look_swaps_axes() {
        let mut cam = camera(CameraPreset::Full);
        cam.set_orientation(YAW, 0.0, 90.0);

        // Horizontal mouse motion becomes a pure pitch change.
        cam.process_look(10.0, 0.0);
        assert_relative_eq!(cam.yaw(), YAW, epsilon = 1e-5);
        assert_relative_eq!(cam.pitch(), -1.0, epsilon = 1e-5);

        // Vertical mouse motion becomes a pure yaw change.
        cam.set_orientation(YAW, 0.0, 90.0);
        cam.process_look(0.0, 10.0);
        assert_relative_eq!(cam.yaw(), YAW - 1.0, epsilon = 1e-5);
        assert_relative_eq!(cam.pitch(), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut cam = camera(CameraPreset::Movement);
        cam.process_zoom(10.0);
        assert_eq!(cam.fov(), 35.0);
        for _ in 0..100 {
            cam.process_zoom(3.0);
        }
        assert_eq!(cam.fov(), MIN_FOV);
        for _ in 0..100 {
            cam.process_zoom(-7.5);
        }
        assert_eq!(cam.fov(), MAX_FOV);
    }

    #[test]
    fn zoom_disabled_is_noop() {
        let mut cam = camera(CameraPreset::Fly);
        cam.process_zoom(20.0);
        assert_eq!(cam.fov(), FOV);
    }

    #[test]
    fn roll_setting_ignored_without_roll_capability() {
        let settings = CameraSettings {
            roll: 30.0,
            ..CameraSettings::default()
        };
        let cam = Camera::with_settings(
            Vec3::ZERO,
            Vec3::Y,
            CameraPreset::Movement.features(),
            settings,
        );
        assert_eq!(cam.roll(), 0.0);
        assert!(cam.up().abs_diff_eq(Vec3::Y, 1e-6));
    }

    proptest! {
        #[test]
        fn basis_is_orthonormal_for_any_orientation(
            yaw in -720.0f32..720.0,
            pitch in -89.0f32..89.0,
            roll in -360.0f32..360.0,
        ) {
            let mut cam = camera(CameraPreset::Full);
            cam.set_orientation(yaw, pitch, roll);
            assert_orthonormal(&cam);

            let mut flat = camera(CameraPreset::NoFeatures);
            flat.set_orientation(yaw, pitch, roll);
            assert_orthonormal(&flat);
        }

        #[test]
        fn look_input_keeps_pitch_in_bounds(
            moves in proptest::collection::vec((-2000.0f32..2000.0, -2000.0f32..2000.0), 1..64),
        ) {
            let mut cam = camera(CameraPreset::Full);
            for (dx, dy) in moves {
                cam.process_look(dx, dy);
                prop_assert!(cam.pitch().abs() <= PITCH_LIMIT);
            }
            assert_orthonormal(&cam);
        }
    }
}
