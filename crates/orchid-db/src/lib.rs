//! # orchid-db
//!
//! Vector storage for Orchid's code search.
//!
//! `orchid-core` only sees the [`vector::VectorIndexBackend`] trait; the
//! heavy LanceDB/Arrow stack lives here so domain code compiles fast.
//!
//! ```text
//! orchid-cli → orchid-core → (traits)
//!                  ↑
//!              orchid-db    (snippet collections)
//!              orchid-model (Gemini embeddings / generation)
//! ```
//!
//! ## Features
//!
//! - `lancedb` (default): LanceDB tables with ANN search
//! - `simple` (default): JSONL files scored by brute force

pub mod error;
pub mod vector;

pub use error::{DbError, DbResult};
