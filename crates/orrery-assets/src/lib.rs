//! Background loading of scene images.
//!
//! Each asset is one [`AssetRequest`] handed to an [`AssetLoader`] worker
//! thread. Workers read bytes from disk or over HTTP, decode them, and send a
//! [`LoadOutcome`] back. The main thread drains outcomes once per frame and
//! records each target's progress in a [`LoadTracker`].

mod decode;
mod error;
mod loader;
mod source;
mod tracker;

pub use decode::{
    AssetKind, DEFAULT_MAX_DIMENSION, DecodedImage, EnvironmentImage, IRRADIANCE_HEIGHT,
    IRRADIANCE_WIDTH, ImagePixels, LoadedAsset, decode,
};
pub use error::AssetError;
pub use loader::{AssetLoader, AssetRequest, LoadOutcome, LoaderConfig};
pub use source::AssetSource;
pub use tracker::{LoadState, LoadTracker};

/// What a loaded asset is applied to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AssetTarget {
    /// The scene environment map.
    Environment,
    /// The star backdrop color map.
    Backdrop,
    /// Color map of the orbiting sphere at this index.
    Orbiter(usize),
}

impl std::fmt::Display for AssetTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetTarget::Environment => write!(f, "environment"),
            AssetTarget::Backdrop => write!(f, "backdrop"),
            AssetTarget::Orbiter(i) => write!(f, "orbiter {i}"),
        }
    }
}
