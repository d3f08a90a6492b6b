pub mod fetcher;
pub mod io;
pub mod model;
pub mod server;
pub mod storage;

pub use fetcher::{AssetFetcher, JsonModelParser, ModelParser, ReaderFetcher};
pub use io::{AssetReader, AssetReaderVariant, FileAssetReader};
#[cfg(feature = "http")]
pub use io::HttpAssetReader;
pub use model::{Mesh, Model, ModelData};
pub use server::{AssetServer, MeshHandle, asset_runtime};
