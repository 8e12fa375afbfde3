//! Snippet collections.
//!
//! A collection is a directory holding one backend's data plus
//! `index.meta.json`. `orchid-core` keeps one collection per project hash.
//!
//! ```ignore
//! use orchid_db::vector::{open_vector_index, VectorIndexConfig};
//!
//! let index = open_vector_index(&VectorIndexConfig::new(768, "orchid_db/3fa4…"))?;
//! index.upsert(&inserts)?;
//! let hits = index.query(&embedding, 15, None)?;
//! ```

mod backend;
mod config;
mod metadata;
mod traits;

pub use config::{
    check_index_compatibility, index_exists, load_index_meta, remove_index, write_index_meta,
    VectorIndexCompatibility, VectorIndexConfig, VectorIndexMeta, DEFAULT_BACKEND,
    INDEX_META_FILENAME, LANCEDB_TABLE_NAME, SCHEMA_VERSION,
};
pub use metadata::VectorSearchFilter;
pub use traits::{VectorId, VectorIndexBackend, VectorInsert, VectorMetric, VectorSearchResult};

pub use backend::{available_backends, open_vector_index};

#[cfg(feature = "lancedb")]
pub use backend::LanceDbVectorIndex;

#[cfg(feature = "simple")]
pub use backend::SimpleFileVectorIndex;
