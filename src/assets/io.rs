use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::errors::{AssetError, Error, Result};

/// Asynchronous byte source for asset files.
pub trait AssetReader: Send + Sync {
    /// Reads the raw bytes of `uri`, relative to the reader's root.
    fn read_bytes(&self, uri: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
}

/// Local file reader rooted at a directory.
pub struct FileAssetReader {
    root_path: PathBuf,
}

impl FileAssetReader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let root_path = if path.is_file() {
            path.parent().unwrap_or(Path::new(".")).to_path_buf()
        } else {
            path.to_path_buf()
        };
        Self { root_path }
    }

    #[inline]
    #[must_use]
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }
}

impl AssetReader for FileAssetReader {
    async fn read_bytes(&self, uri: &str) -> Result<Vec<u8>> {
        let path = self.root_path.join(uri);
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(Error::Asset(
                AssetError::NotFound(path.display().to_string()),
            )),
            Err(err) => Err(err.into()),
        }
    }
}

/// HTTP reader rooted at a base URL.
#[cfg(feature = "http")]
pub struct HttpAssetReader {
    root_url: String,
}

#[cfg(feature = "http")]
impl HttpAssetReader {
    #[must_use]
    pub fn new(url: &str) -> Self {
        // Keep everything up to and including the last '/' of the path
        let path_start = url.find("://").map_or(0, |i| i + 3);
        let root_url = match url[path_start..].rfind('/') {
            Some(pos) => url[..=path_start + pos].to_string(),
            None => format!("{url}/"),
        };
        Self { root_url }
    }

    #[inline]
    #[must_use]
    pub fn root_url(&self) -> &str {
        &self.root_url
    }
}

#[cfg(feature = "http")]
impl AssetReader for HttpAssetReader {
    async fn read_bytes(&self, uri: &str) -> Result<Vec<u8>> {
        let url = if uri.starts_with("http://") || uri.starts_with("https://") {
            uri.to_string()
        } else {
            format!("{}{}", self.root_url, uri)
        };

        let response = ehttp::fetch_async(ehttp::Request::get(&url))
            .await
            .map_err(|reason| AssetError::Fetch {
                url: url.clone(),
                reason,
            })?;

        if !response.ok {
            return Err(Error::Asset(AssetError::HttpStatus {
                url,
                status: response.status,
            }));
        }
        Ok(response.bytes)
    }
}

/// Reader variants, dispatched statically instead of through a trait object.
#[derive(Clone)]
pub enum AssetReaderVariant {
    File(Arc<FileAssetReader>),
    #[cfg(feature = "http")]
    Http(Arc<HttpAssetReader>),
}

impl AssetReaderVariant {
    /// Picks a reader for a local path or an `http(s)://` URL.
    pub fn from_source(source: &str) -> Result<Self> {
        if is_remote(source) {
            #[cfg(feature = "http")]
            {
                Ok(Self::Http(Arc::new(HttpAssetReader::new(source))))
            }
            #[cfg(not(feature = "http"))]
            {
                Err(Error::FeatureNotEnabled(
                    "HTTP feature is not enabled. Enable it with `features = [\"http\"]`".into(),
                ))
            }
        } else {
            Ok(Self::File(Arc::new(FileAssetReader::new(source))))
        }
    }

    pub async fn read_bytes(&self, uri: &str) -> Result<Vec<u8>> {
        match self {
            Self::File(r) => r.read_bytes(uri).await,
            #[cfg(feature = "http")]
            Self::Http(r) => r.read_bytes(uri).await,
        }
    }
}

pub(crate) fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}
