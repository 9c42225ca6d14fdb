//! A tile entry: a coordinate and its opaque payload.

use crate::{Blob, TileCoord};
use anyhow::Result;
use std::fmt::Debug;

/// The unit of data held by the store. Two entries are equal when both the
/// coordinate and the payload bytes are equal.
#[derive(Clone, PartialEq, Eq)]
pub struct Entry {
	pub coord: TileCoord,
	pub data: Blob,
}

impl Entry {
	/// Creates an entry at `level`/`x`/`y`.
	///
	/// # Errors
	/// Returns an error if the coordinate is out of range, see [`TileCoord::new`].
	///
	/// ```
	/// use vtstore_core::Entry;
	///
	/// let entry = Entry::new(3, 4, 5, "test").unwrap();
	/// assert_eq!(entry.coord.to_string(), "3/4/5");
	/// ```
	pub fn new(level: u8, x: u32, y: u32, data: impl Into<Blob>) -> Result<Entry> {
		Ok(Entry {
			coord: TileCoord::new(level, x, y)?,
			data: data.into(),
		})
	}

	#[must_use]
	pub fn from_coord(coord: TileCoord, data: Blob) -> Entry {
		Entry { coord, data }
	}

	#[must_use]
	pub fn level(&self) -> u8 {
		self.coord.level
	}

	#[must_use]
	pub fn column(&self) -> u32 {
		self.coord.x
	}

	#[must_use]
	pub fn row(&self) -> u32 {
		self.coord.y
	}

	#[must_use]
	pub fn into_parts(self) -> (TileCoord, Blob) {
		(self.coord, self.data)
	}
}

impl Debug for Entry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Entry")
			.field("coord", &self.coord)
			.field("data", &self.data)
			.finish()
	}
}
