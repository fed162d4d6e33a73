use firstlight_camera::{CameraPreset, CameraSettings};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("frame rate must be at least 1")]
    ZeroFrameRate,
    #[error("window size must be non-zero, got {width}x{height}")]
    EmptyWindow { width: u32, height: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            title: "firstlight".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CameraConfig {
    pub preset: CameraPreset,
    pub position: Vec3,
    pub settings: CameraSettings,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            preset: CameraPreset::default(),
            position: Vec3::new(0.0, 0.0, 3.0),
            settings: CameraSettings::default(),
        }
    }
}

/// Everything the desktop driver can be told from a YAML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub frame_rate: u32,
    /// Directory holding `shaders/` and `textures/`.
    pub assets: PathBuf,
    pub camera: CameraConfig,
    /// Route the mouse wheel to camera zoom.
    pub scroll_zoom: bool,
    /// Initial texture blend factor.
    pub mix: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            frame_rate: 60,
            assets: PathBuf::from("assets"),
            camera: CameraConfig::default(),
            scroll_zoom: false,
            mix: 0.2,
        }
    }
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub preset: Option<CameraPreset>,
    pub frame_rate: Option<u32>,
    pub assets: Option<PathBuf>,
    pub scroll_zoom: bool,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(preset) = overrides.preset {
            self.camera.preset = preset;
        }
        if let Some(frame_rate) = overrides.frame_rate {
            self.frame_rate = frame_rate;
        }
        if let Some(assets) = &overrides.assets {
            self.assets = assets.clone();
        }
        self.scroll_zoom |= overrides.scroll_zoom;
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_rate == 0 {
            return Err(ConfigError::ZeroFrameRate);
        }
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::EmptyWindow {
                width: self.window.width,
                height: self.window.height,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_demo() {
        let config = AppConfig::default();
        assert_eq!((config.window.width, config.window.height), (800, 600));
        assert_eq!(config.frame_rate, 60);
        assert_eq!(config.camera.position, Vec3::new(0.0, 0.0, 3.0));
        assert_eq!(config.camera.preset, CameraPreset::Full);
        assert!(!config.scroll_zoom);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let yaml = "frame_rate: 144\ncamera:\n  preset: no-features\n  position: [1.0, 2.0, 3.0]\n";
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.frame_rate, 144);
        assert_eq!(config.camera.preset, CameraPreset::NoFeatures);
        assert_eq!(config.camera.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(config.camera.settings, CameraSettings::default());
        assert_eq!(config.window, WindowConfig::default());
    }

    #[test]
    fn camera_tunables_are_configurable() {
        let yaml = "camera:\n  settings:\n    movement_speed: 5.0\n    fov: 30.0\n";
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.camera.settings.movement_speed, 5.0);
        assert_eq!(config.camera.settings.fov, 30.0);
        assert_eq!(config.camera.settings.mouse_sensitivity, 0.1);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = serde_yaml::from_str::<AppConfig>("frame_rat: 30\n").unwrap_err();
        assert!(err.to_string().contains("frame_rat"));
    }

    #[test]
    fn cli_overrides_file_values() {
        let mut config = AppConfig {
            frame_rate: 30,
            ..AppConfig::default()
        };
        config.apply(&Overrides {
            preset: Some(CameraPreset::Fps),
            frame_rate: Some(120),
            assets: Some(PathBuf::from("/data/assets")),
            scroll_zoom: true,
        });
        assert_eq!(config.frame_rate, 120);
        assert_eq!(config.camera.preset, CameraPreset::Fps);
        assert_eq!(config.assets, PathBuf::from("/data/assets"));
        assert!(config.scroll_zoom);
    }

    #[test]
    fn empty_overrides_change_nothing() {
        let mut config = AppConfig::default();
        config.apply(&Overrides::default());
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn invalid_values_fail_validation() {
        let config = AppConfig {
            frame_rate: 0,
            ..AppConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroFrameRate)));

        let mut config = AppConfig::default();
        config.window.height = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptyWindow { width: 800, height: 0 })
        ));
    }

    #[test]
    fn load_reads_file_and_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("firstlight.yaml");
        std::fs::write(&path, "scroll_zoom: true\nmix: 0.5\n").unwrap();
        let config = AppConfig::load(&path).unwrap();
        assert!(config.scroll_zoom);
        assert_eq!(config.mix, 0.5);

        let missing = dir.path().join("missing.yaml");
        let err = AppConfig::load(&missing).unwrap_err();
        assert!(err.to_string().contains("missing.yaml"));

        std::fs::write(&path, "frame_rate: fast\n").unwrap();
        assert!(matches!(
            AppConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
