//! Contains the tile coordinate, payload, entry, metadata and stream types.

mod blob;
pub use blob::*;

mod entry;
pub use entry::*;

mod entry_stream;
pub use entry_stream::*;

mod metadata;
pub use metadata::*;

mod tile_coord;
pub use tile_coord::*;
