//! Orrery application: window, frame loop, and the per-session scene state.

pub mod frame_loop;
pub mod platform;
pub mod session;
pub mod window;

pub use frame_loop::{FrameLoop, StopHandle};
pub use platform::{PlatformDirs, PlatformError};
pub use session::{ApplyError, AssetSink, SceneSession, mesh_slot};
pub use window::{OrreryApp, run, window_attributes_from_config};
