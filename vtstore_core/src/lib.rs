//! Value types shared by the vtstore crates: tile coordinates, payload blobs,
//! entries, the TileJSON-like metadata document and the entry stream.

mod concurrency;
pub use concurrency::*;

pub mod types;
pub use types::*;
