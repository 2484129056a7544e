//! `orrery` flags layered over `config.ron`.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Every flag is optional; an absent flag leaves the file's value in place.
#[derive(Parser, Debug, Default)]
#[command(name = "orrery", about = "Orbiting spheres in a starfield")]
pub struct CliArgs {
    /// Initial window width in logical pixels.
    #[arg(long, value_name = "PX")]
    pub width: Option<u32>,

    /// Initial window height in logical pixels.
    #[arg(long, value_name = "PX")]
    pub height: Option<u32>,

    /// Open as a borderless fullscreen window.
    #[arg(long, value_name = "BOOL")]
    pub fullscreen: Option<bool>,

    /// MSAA samples per pixel; 1 turns antialiasing off.
    #[arg(long, value_name = "N")]
    pub msaa: Option<u32>,

    /// Base directory for relative texture paths.
    #[arg(long, value_name = "DIR")]
    pub assets: Option<PathBuf>,

    /// HDRI file path or http(s) URL.
    #[arg(long, value_name = "SRC")]
    pub environment: Option<String>,

    /// Tracing filter, e.g. `debug` or `orrery_assets=trace`.
    #[arg(long, value_name = "FILTER")]
    pub log_level: Option<String>,

    /// Read and write `config.ron` in this directory instead of the platform one.
    #[arg(long, value_name = "DIR")]
    pub config: Option<PathBuf>,
}

fn set<T: Clone>(slot: &mut T, value: &Option<T>) {
    if let Some(value) = value {
        *slot = value.clone();
    }
}

impl Config {
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        set(&mut self.window.width, &args.width);
        set(&mut self.window.height, &args.height);
        set(&mut self.window.fullscreen, &args.fullscreen);
        set(&mut self.render.msaa_samples, &args.msaa);
        set(&mut self.assets.root, &args.assets);
        set(&mut self.scene.environment, &args.environment);
        set(&mut self.debug.log_level, &args.log_level);
    }
}
