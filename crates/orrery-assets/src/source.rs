//! Where an asset's bytes come from.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::AssetError;

/// A local file or a remote URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssetSource {
    Path(PathBuf),
    Url(String),
}

impl AssetSource {
    /// `http://` and `https://` strings become URLs; anything else is a path
    /// resolved against `root`. Absolute paths ignore `root`.
    pub fn parse(source: &str, root: &Path) -> Self {
        let trimmed = source.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return AssetSource::Url(trimmed.to_string());
        }
        let relative = trimmed.strip_prefix("./").unwrap_or(trimmed);
        AssetSource::Path(root.join(relative))
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, AssetSource::Url(_))
    }

    /// Read the full contents. Blocks the calling thread.
    pub fn read(&self, client: &reqwest::blocking::Client) -> Result<Vec<u8>, AssetError> {
        match self {
            AssetSource::Path(path) => Ok(std::fs::read(path)?),
            AssetSource::Url(url) => {
                let response = client.get(url).send()?;
                let status = response.status();
                if !status.is_success() {
                    return Err(AssetError::Status {
                        url: url.clone(),
                        status: status.as_u16(),
                    });
                }
                Ok(response.bytes()?.to_vec())
            }
        }
    }
}

impl fmt::Display for AssetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetSource::Path(path) => write!(f, "{}", path.display()),
            AssetSource::Url(url) => f.write_str(url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_url() {
        let root = Path::new("assets");
        let url = "https://dl.polyhaven.org/file/ph-assets/HDRIs/hdr/1k/moonless_golf_1k.hdr";
        assert_eq!(
            AssetSource::parse(url, root),
            AssetSource::Url(url.to_string())
        );
        assert!(AssetSource::parse("HTTP://example.com/a.png", root).is_remote());
    }

    #[test]
    fn test_parse_relative_path() {
        let root = Path::new("assets");
        assert_eq!(
            AssetSource::parse("earth/map.jpg", root),
            AssetSource::Path(PathBuf::from("assets/earth/map.jpg"))
        );
        assert_eq!(
            AssetSource::parse("./stars.jpg", root),
            AssetSource::Path(PathBuf::from("assets/stars.jpg"))
        );
    }

    #[test]
    fn test_parse_absolute_path_ignores_root() {
        let root = Path::new("assets");
        let abs = std::env::temp_dir().join("sky.hdr");
        let parsed = AssetSource::parse(abs.to_str().unwrap(), root);
        assert_eq!(parsed, AssetSource::Path(abs));
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = AssetSource::Path(dir.path().join("missing.png"));
        let client = reqwest::blocking::Client::new();
        let err = source.read(&client).unwrap_err();
        assert!(matches!(err, AssetError::Io(_)));
    }

    #[test]
    fn test_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        std::fs::write(&path, [1u8, 2, 3]).unwrap();
        let client = reqwest::blocking::Client::new();
        assert_eq!(AssetSource::Path(path).read(&client).unwrap(), vec![1, 2, 3]);
    }
}
