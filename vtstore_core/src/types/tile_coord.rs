//! Three-dimensional tile coordinates (zoom level, column, row).
//!
//! ```
//! use vtstore_core::TileCoord;
//!
//! let coord = TileCoord::new(3, 4, 5).unwrap();
//! assert_eq!(coord.level, 3);
//! assert_eq!(coord.max_value(), 7);
//! assert!(TileCoord::new(3, 8, 0).is_err());
//! ```

use anyhow::{Result, ensure};
use std::fmt::{self, Debug};

/// Highest zoom level a coordinate may address.
pub const MAX_LEVEL: u8 = 31;

/// A tile coordinate: zoom `level`, column `x` and row `y`.
///
/// Ordering is by level, then column, then row, which is also the order in which
/// the store enumerates entries.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash)]
pub struct TileCoord {
	/// The zoom level of the tile.
	pub level: u8,
	/// The column of the tile.
	pub x: u32,
	/// The row of the tile.
	pub y: u32,
}

impl TileCoord {
	/// Create a new `TileCoord`.
	///
	/// # Errors
	/// Returns an error if `level` > 31 or if `x`/`y` are not below `2^level`.
	pub fn new(level: u8, x: u32, y: u32) -> Result<TileCoord> {
		let coord = TileCoord { level, x, y };
		coord.check()?;
		Ok(coord)
	}

	/// Validates a coordinate that may have been built from the public fields.
	///
	/// # Errors
	/// Same conditions as [`TileCoord::new`].
	pub fn check(&self) -> Result<()> {
		let TileCoord { level, x, y } = *self;
		ensure!(level <= MAX_LEVEL, "level ({level}) must be <= {MAX_LEVEL}");
		ensure!(TileCoord::is_valid_index(level, x), "x ({x}) out of bounds for level {level}");
		ensure!(TileCoord::is_valid_index(level, y), "y ({y}) out of bounds for level {level}");
		Ok(())
	}

	/// Largest valid column or row at this level, `2^level - 1`.
	#[must_use]
	pub fn max_value(&self) -> u32 {
		((1u64 << self.level) - 1) as u32
	}

	/// Whether `value` is a valid column or row at `level`.
	#[must_use]
	pub fn is_valid_index(level: u8, value: u32) -> bool {
		level <= MAX_LEVEL && u64::from(value) < (1u64 << level)
	}
}

impl Debug for TileCoord {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "TileCoord({}, [{}, {}])", self.level, self.x, self.y)
	}
}

impl fmt::Display for TileCoord {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}/{}/{}", self.level, self.x, self.y)
	}
}
