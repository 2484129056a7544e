//! Configuration system for Orrery.
//!
//! Settings persist to disk as a RON file and can be overridden from the
//! command line. Every section falls back to its defaults, so partial or older
//! config files keep loading.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    AmbientLightConfig, AnimationConfig, AssetConfig, CameraConfig, Config, DebugConfig,
    DirectionalLightConfig, ORBITER_COUNT, RenderConfig, SceneConfig, WindowConfig,
};
pub use error::ConfigError;
