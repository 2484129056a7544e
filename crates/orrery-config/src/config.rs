//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Number of spheres in the orbiting group.
pub const ORBITER_COUNT: usize = 4;

const CONFIG_FILE: &str = "config.ron";
const APP_DIR: &str = "orrery";

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Window settings.
    pub window: WindowConfig,
    /// Rendering settings.
    pub render: RenderConfig,
    /// Camera settings.
    pub camera: CameraConfig,
    /// Scene composition: geometry, materials, lights, asset sources.
    pub scene: SceneConfig,
    /// Spin and tween settings.
    pub animation: AnimationConfig,
    /// Asset loading settings.
    pub assets: AssetConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Window configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Window width in logical pixels.
    pub width: u32,
    /// Window height in logical pixels.
    pub height: u32,
    /// Start in borderless fullscreen mode.
    pub fullscreen: bool,
    /// Enable vsync (PresentMode::Fifo).
    pub vsync: bool,
    /// Window title.
    pub title: String,
}

/// Rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// MSAA sample count (1 disables antialiasing, 4 is the usual choice).
    pub msaa_samples: u32,
    /// Linear RGB clear color behind all geometry.
    pub clear_color: [f32; 3],
}

/// Perspective camera configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f32,
    /// Near clip plane distance.
    pub near: f32,
    /// Far clip plane distance.
    pub far: f32,
    /// Camera position in world space. The camera looks down -Z.
    pub position: [f32; 3],
}

/// Ambient light configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AmbientLightConfig {
    /// Linear RGB color.
    pub color: [f32; 3],
    /// Scalar intensity.
    pub intensity: f32,
}

/// Directional light configuration. The light shines from `position` toward the origin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DirectionalLightConfig {
    /// Linear RGB color.
    pub color: [f32; 3],
    /// Scalar intensity.
    pub intensity: f32,
    /// Light position in world space.
    pub position: [f32; 3],
}

/// Scene composition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SceneConfig {
    /// Radius of each orbiting sphere.
    pub sphere_radius: f32,
    /// Width and height segment count of each orbiting sphere.
    pub sphere_segments: u32,
    /// Radius of the circle the orbiting spheres sit on.
    pub orbit_radius: f32,
    /// Tilt of the orbiting group around X, in radians.
    pub group_tilt: f32,
    /// Vertical offset of the orbiting group.
    pub group_offset_y: f32,
    /// Color map of each orbiting sphere, in orbit order.
    pub sphere_textures: [String; ORBITER_COUNT],
    /// Radius of the star backdrop sphere.
    pub backdrop_radius: f32,
    /// Width and height segment count of the backdrop sphere.
    pub backdrop_segments: u32,
    /// Star texture applied to the inside of the backdrop.
    pub backdrop_texture: String,
    /// Backdrop opacity (0.0 - 1.0).
    pub backdrop_opacity: f32,
    /// Equirectangular HDRI used as the environment map. Path or http(s) URL.
    pub environment: String,
    /// Environment lighting multiplier.
    pub environment_intensity: f32,
    /// Ambient light.
    pub ambient: AmbientLightConfig,
    /// Directional light.
    pub directional: DirectionalLightConfig,
}

/// Animation configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnimationConfig {
    /// Self-rotation added to each orbiting sphere every frame, in radians.
    pub sphere_spin_per_frame: f32,
    /// Self-rotation added to the backdrop every frame, in radians.
    pub backdrop_spin_per_frame: f32,
    /// Wall-clock interval between group rotations, in milliseconds.
    pub tween_interval_ms: u64,
    /// Duration of each group rotation, in milliseconds.
    pub tween_duration_ms: u64,
    /// Angle added by each group rotation, in degrees.
    pub tween_step_degrees: f32,
    /// Easing curve name, e.g. `"expo.inOut"`.
    pub easing: String,
}

/// Asset loading configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AssetConfig {
    /// Directory that relative asset paths are resolved against.
    pub root: PathBuf,
    /// Number of background loader threads.
    pub worker_threads: usize,
    /// Timeout for remote asset downloads, in seconds.
    pub http_timeout_secs: u64,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fullscreen: false,
            vsync: true,
            title: "Orrery".to_string(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            msaa_samples: 4,
            clear_color: [0.0, 0.0, 0.0],
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_degrees: 25.0,
            near: 0.1,
            far: 100.0,
            position: [0.0, 0.0, 9.0],
        }
    }
}

impl Default for AmbientLightConfig {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            intensity: 0.5,
        }
    }
}

impl Default for DirectionalLightConfig {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            intensity: 1.0,
            position: [5.0, 5.0, 5.0],
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            sphere_radius: 1.3,
            sphere_segments: 64,
            orbit_radius: 4.5,
            group_tilt: 0.1,
            group_offset_y: -0.8,
            sphere_textures: [
                "csilla/color.png".to_string(),
                "earth/map.jpg".to_string(),
                "venus/map.jpg".to_string(),
                "volcanic/color.png".to_string(),
            ],
            backdrop_radius: 50.0,
            backdrop_segments: 64,
            backdrop_texture: "stars.jpg".to_string(),
            backdrop_opacity: 0.25,
            environment:
                "https://dl.polyhaven.org/file/ph-assets/HDRIs/hdr/1k/moonless_golf_1k.hdr"
                    .to_string(),
            environment_intensity: 1.0,
            ambient: AmbientLightConfig::default(),
            directional: DirectionalLightConfig::default(),
        }
    }
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            sphere_spin_per_frame: 0.001,
            backdrop_spin_per_frame: 0.0001,
            tween_interval_ms: 3500,
            tween_duration_ms: 2000,
            tween_step_degrees: 90.0,
            easing: "expo.inOut".to_string(),
        }
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("assets"),
            worker_threads: 2,
            http_timeout_secs: 30,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// The platform configuration directory for Orrery, if the OS exposes one.
    pub fn default_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR))
    }

    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let config = read_config_file(&config_path)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(|source| ConfigError::Write {
            path: config_dir.to_path_buf(),
            source,
        })?;

        let config_path = config_dir.join(CONFIG_FILE);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized = ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::Encode)?;
        std::fs::write(&config_path, serialized).map_err(|source| ConfigError::Write {
            path: config_path.clone(),
            source,
        })?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let new_config = read_config_file(&config_dir.join(CONFIG_FILE))?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}

fn read_config_file(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    ron::from_str(&contents).map_err(|source| ConfigError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new().depth_limit(3))
                .unwrap();
        assert!(ron_str.contains("width: 1280"));
        assert!(ron_str.contains("tween_interval_ms: 3500"));
        assert!(ron_str.contains("moonless_golf_1k.hdr"));
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let ron_str = ron::to_string(&config).unwrap();
        let deserialized: Config = ron::from_str(&ron_str).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_scene_defaults_match_layout() {
        let scene = SceneConfig::default();
        assert_eq!(scene.sphere_radius, 1.3);
        assert_eq!(scene.sphere_segments, 64);
        assert_eq!(scene.orbit_radius, 4.5);
        assert_eq!(scene.backdrop_radius, 50.0);
        assert_eq!(scene.sphere_textures.len(), ORBITER_COUNT);
        assert_eq!(scene.sphere_textures[1], "earth/map.jpg");
    }

    #[test]
    fn test_animation_defaults() {
        let anim = AnimationConfig::default();
        assert_eq!(anim.tween_interval_ms, 3500);
        assert_eq!(anim.tween_duration_ms, 2000);
        assert_eq!(anim.tween_step_degrees, 90.0);
        assert_eq!(anim.easing, "expo.inOut");
    }

    #[test]
    fn test_missing_section_uses_default() {
        let ron_str = "(window: (), render: (), scene: ())";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.animation, AnimationConfig::default());
        assert_eq!(config.camera, CameraConfig::default());
    }

    #[test]
    fn test_partial_section_keeps_other_fields() {
        let ron_str = "(scene: (orbit_radius: 6.0))";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.scene.orbit_radius, 6.0);
        assert_eq!(config.scene.sphere_radius, 1.3);
    }

    #[test]
    fn test_wrong_texture_count_is_rejected() {
        let ron_str = r#"(scene: (sphere_textures: ("a.png", "b.png")))"#;
        let result: Result<Config, _> = ron::from_str(ron_str);
        assert!(result.is_err());
    }

    #[test]
    fn test_extra_field_ignored() {
        let ron_str = "(future_setting: true)";
        let result: Result<Config, _> = ron::from_str(ron_str);
        assert!(result.is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.window.width = 1920;
        config.scene.environment = "local/sky.hdr".to_string();

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_or_create_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert!(dir.path().join(CONFIG_FILE).exists());
    }

    #[test]
    fn test_reload_detects_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();

        let mut modified = config.clone();
        modified.animation.tween_interval_ms = 5000;
        modified.save(dir.path()).unwrap();

        let result = config.reload(dir.path()).unwrap();
        assert_eq!(result.unwrap().animation.tween_interval_ms, 5000);
    }

    #[test]
    fn test_reload_no_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();

        assert!(config.reload(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_invalid_ron_produces_error() {
        let result: Result<Config, _> = ron::from_str("{{not valid}}");
        assert!(result.is_err());
    }
}
