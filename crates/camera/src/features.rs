use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

bitflags::bitflags! {
    /// Movement requests gathered for one tick.
    ///
    /// Bits for capabilities the camera does not have enabled are accepted
    /// and ignored.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Movement: u8 {
        const FORWARD = 1;
        const BACKWARD = 2;
        const LEFT = 4;
        const RIGHT = 8;
        const UP = 16;
        const DOWN = 32;
        const ROLL_LEFT = 64;
        const ROLL_RIGHT = 128;
    }
}

/// Independent capability switches of a [`Camera`](crate::Camera).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraFeatures {
    /// Clamp pitch to [-89°, 89°] so the basis never degenerates at the poles.
    pub constrain_pitch: bool,
    /// Honor [`Movement::UP`] and [`Movement::DOWN`].
    pub up_down: bool,
    /// Track a roll angle and honor the roll movement bits.
    pub roll: bool,
    /// Let scroll input change the field of view.
    pub zoom: bool,
    /// Project forward/right movement onto the horizontal plane.
    pub keep_level: bool,
}

impl CameraFeatures {
    pub const NONE: Self = Self {
        constrain_pitch: false,
        up_down: false,
        roll: false,
        zoom: false,
        keep_level: false,
    };
}

impl Default for CameraFeatures {
    fn default() -> Self {
        CameraPreset::default().features()
    }
}

/// Named capability sets. Exactly one is active per camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CameraPreset {
    /// Every capability except keep-level movement. Used when nothing is configured.
    #[default]
    Full,
    /// Pitch clamp, vertical strafing and zoom.
    Movement,
    /// Vertical strafing and roll, no pitch clamp.
    Fly,
    /// Pitch clamp and level walking.
    Fps,
    /// Plain yaw/pitch camera with no extras.
    NoFeatures,
}

impl CameraPreset {
    pub const ALL: [CameraPreset; 5] = [
        CameraPreset::Full,
        CameraPreset::Movement,
        CameraPreset::Fly,
        CameraPreset::Fps,
        CameraPreset::NoFeatures,
    ];

    /// The capability set this preset enables.
    pub fn features(self) -> CameraFeatures {
        match self {
            CameraPreset::Full => CameraFeatures {
                constrain_pitch: true,
                up_down: true,
                roll: true,
                zoom: true,
                keep_level: false,
            },
            CameraPreset::Movement => CameraFeatures {
                constrain_pitch: true,
                up_down: true,
                zoom: true,
                ..CameraFeatures::NONE
            },
            CameraPreset::Fly => CameraFeatures {
                up_down: true,
                roll: true,
                ..CameraFeatures::NONE
            },
            CameraPreset::Fps => CameraFeatures {
                constrain_pitch: true,
                keep_level: true,
                ..CameraFeatures::NONE
            },
            CameraPreset::NoFeatures => CameraFeatures::NONE,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CameraPreset::Full => "full",
            CameraPreset::Movement => "movement",
            CameraPreset::Fly => "fly",
            CameraPreset::Fps => "fps",
            CameraPreset::NoFeatures => "no-features",
        }
    }
}

impl fmt::Display for CameraPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a preset name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown camera preset `{0}` (expected one of: full, movement, fly, fps, no-features)")]
pub struct UnknownPreset(pub String);

impl FromStr for CameraPreset {
    type Err = UnknownPreset;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        CameraPreset::ALL
            .into_iter()
            .find(|preset| preset.name() == wanted)
            .ok_or_else(|| UnknownPreset(s.to_string()))
    }
}
