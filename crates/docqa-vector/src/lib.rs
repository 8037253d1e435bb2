//! docqa-vector
//!
//! Durable `VectorIndex` backends: a single JSON file (default) and an
//! embedded LanceDB table behind the `lance` feature.

pub mod file_store;
pub mod schema;
#[cfg(feature = "lance")]
pub mod lance_store;
#[cfg(feature = "lance")]
pub mod table;

use std::path::Path;

use docqa_core::config::{IndexBackend, IndexConfig};
use docqa_core::error::Result;
use docqa_core::traits::VectorIndex;

pub use file_store::FileVectorIndex;
#[cfg(feature = "lance")]
pub use lance_store::LanceVectorIndex;

/// Open the backend selected by `config`, resolving its path against `base_dir`.
pub fn open_index(config: &IndexConfig, base_dir: &Path) -> Result<Box<dyn VectorIndex>> {
    let path = config.resolved_path(base_dir);
    tracing::debug!(backend = ?config.backend, path = %path.display(), "opening vector index");
    match config.backend {
        IndexBackend::File => Ok(Box::new(FileVectorIndex::open(path))),
        #[cfg(feature = "lance")]
        IndexBackend::Lance => Ok(Box::new(LanceVectorIndex::open(&path, &config.table)?)),
        #[cfg(not(feature = "lance"))]
        IndexBackend::Lance => Err(docqa_core::Error::InvalidConfig(
            "index.backend = \"lance\" requires building with the `lance` feature".into(),
        )),
    }
}
