//! A filesystem-backed store for vector tiles.
//!
//! Tiles are addressed by zoom level, column and row and kept one file per tile below a root
//! directory, next to a single JSON metadata document:
//!
//! ```text
//! <root>/tiles.json
//! <root>/<level>/<x>/<y>.pbf
//! ```
//!
//! The entry point is [`TileStorage`]. Bulk reads are exposed as lazy streams, bulk writes take
//! streams, and every file is replaced atomically.
//!
//! ## Modules
//! - [`path_codec`]: coordinate to path mapping and back
//! - [`EntryStore`], [`MetadataStore`], [`ZoomScanner`]: the parts behind [`TileStorage`]
//! - [`StorageConfig`]: the initialization policy
//! - [`StorageError`]: typed errors for construction and malformed metadata

mod atomic_write;
mod config;
mod entry_store;
mod error;
mod metadata_store;
pub mod path_codec;
mod storage;
mod zoom_scanner;

pub use config::StorageConfig;
pub use entry_store::EntryStore;
pub use error::StorageError;
pub use metadata_store::MetadataStore;
pub use storage::{StorageBuilder, TileStorage};
pub use vtstore_core::*;
pub use zoom_scanner::ZoomScanner;
