use thiserror::Error;

/// Errors produced while fetching or decoding an asset.
#[derive(Debug, Error)]
pub enum AssetError {
    /// Reading a local file failed, or a worker thread could not be spawned.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The HTTP request could not be completed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status {
        /// Requested URL.
        url: String,
        /// Response status code.
        status: u16,
    },

    /// The bytes are not a supported image.
    #[error("image decode error: {0}")]
    Decode(#[from] image::ImageError),
}
