//! Asset fetching: turning a URL into a loaded [`Model`].
//!
//! [`AssetFetcher`] is the seam the LOD loader depends on. Dropping the
//! returned future abandons the fetch. [`ReaderFetcher`] is the stock
//! implementation: it reads bytes through an [`AssetReaderVariant`], parses
//! them off the async executor and stores the meshes in an [`AssetServer`].

use std::future::Future;
use std::sync::Arc;

use crate::assets::io::AssetReaderVariant;
use crate::assets::model::{Model, ModelData};
use crate::assets::server::AssetServer;
use crate::errors::{AssetError, Error, Result};

/// Retrieves and parses one detail-level asset.
pub trait AssetFetcher: Send + Sync + 'static {
    fn fetch_and_parse(&self, url: &str) -> impl Future<Output = Result<Model>> + Send;
}

/// Decodes raw asset bytes into [`ModelData`].
pub trait ModelParser: Send + Sync + 'static {
    fn parse(&self, bytes: &[u8], label: &str) -> Result<ModelData>;
}

/// Parser for the JSON model format:
///
/// ```json
/// { "name": "ship", "meshes": [{ "name": "hull", "positions": [[0, 0, 0]], "indices": [] }] }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonModelParser;

impl ModelParser for JsonModelParser {
    fn parse(&self, bytes: &[u8], label: &str) -> Result<ModelData> {
        serde_json::from_slice(bytes).map_err(|e| {
            Error::Asset(AssetError::Format(format!(
                "Failed to parse model {label}: {e}"
            )))
        })
    }
}

/// Fetcher backed by a file or HTTP reader and a [`ModelParser`].
pub struct ReaderFetcher<P = JsonModelParser> {
    reader: AssetReaderVariant,
    parser: Arc<P>,
    server: AssetServer,
}

impl<P: ModelParser> ReaderFetcher<P> {
    /// `root` is a directory, a file inside it, or an `http(s)://` base URL.
    pub fn new(root: &str, parser: P, server: AssetServer) -> Result<Self> {
        Ok(Self {
            reader: AssetReaderVariant::from_source(root)?,
            parser: Arc::new(parser),
            server,
        })
    }

    #[inline]
    #[must_use]
    pub fn server(&self) -> &AssetServer {
        &self.server
    }
}

impl ReaderFetcher<JsonModelParser> {
    pub fn json(root: &str, server: AssetServer) -> Result<Self> {
        Self::new(root, JsonModelParser, server)
    }
}

impl<P: ModelParser> AssetFetcher for ReaderFetcher<P> {
    async fn fetch_and_parse(&self, url: &str) -> Result<Model> {
        let bytes = self.reader.read_bytes(url).await?;

        // Parsing is CPU work, keep it off the async workers
        let parser = Arc::clone(&self.parser);
        let label = url.to_string();
        let data = tokio::task::spawn_blocking(move || parser.parse(&bytes, &label)).await??;

        log::debug!("Fetched '{url}' ({} mesh(es))", data.meshes.len());
        Ok(Model::from_data(&self.server, data, url))
    }
}
