//! Free-fly camera model.
//!
//! The camera keeps yaw, pitch and roll in degrees and derives its front, up
//! and right vectors from them. Capabilities (pitch clamp, vertical strafing,
//! roll, zoom, level walking) are chosen at construction through
//! [`CameraFeatures`], usually via one of the [`CameraPreset`]s.
//!
//! # Invariants
//! - Front, up and right are mutually orthogonal unit vectors.
//! - The basis is rebuilt after every angle change.
//! - All input is accepted; out-of-range values are bounded, never rejected.

mod camera;
mod features;

pub use camera::{
    Camera, CameraSettings, FAR, FOV, MAX_FOV, MIN_FOV, NEAR, PITCH, PITCH_LIMIT, ROLL,
    ROLL_SPEED, SENSITIVITY, SPEED, YAW,
};
pub use features::{CameraFeatures, CameraPreset, Movement, UnknownPreset};
