//! Mapping between tile coordinates and relative file paths.
//!
//! A tile at `(level, x, y)` lives at `<level>/<x>/<y>.pbf` below the storage root. The
//! mapping is injective: only canonical decimal names (no sign, no leading zeros) are accepted
//! when parsing, so every path that parses maps back to exactly the same string.
//!
//! Names that do not match are not tiles. This covers the metadata document, temporary files
//! and anything else a user leaves in the tree.

use std::path::{Component, Path, PathBuf};
use vtstore_core::{MAX_LEVEL, TileCoord};

/// File extension of tile payloads.
pub const TILE_EXTENSION: &str = "pbf";

/// Name of the metadata document in the storage root.
pub const METADATA_FILENAME: &str = "tiles.json";

/// Relative path of the tile file for `coord`.
#[must_use]
pub fn path_for(coord: &TileCoord) -> PathBuf {
	let mut path = PathBuf::from(coord.level.to_string());
	path.push(coord.x.to_string());
	path.push(format!("{}.{TILE_EXTENSION}", coord.y));
	path
}

/// Inverse of [`path_for`]. Returns `None` for anything that is not a tile path.
#[must_use]
pub fn coord_for(path: &Path) -> Option<TileCoord> {
	let mut components = path.components();
	let level = parse_level(component_name(components.next()?)?)?;
	let x = parse_column(component_name(components.next()?)?, level)?;
	let y = parse_row_file(component_name(components.next()?)?, level)?;
	if components.next().is_some() {
		return None;
	}
	Some(TileCoord { level, x, y })
}

fn component_name(component: Component<'_>) -> Option<&str> {
	match component {
		Component::Normal(name) => name.to_str(),
		_ => None,
	}
}

/// Parses a zoom directory name.
#[must_use]
pub fn parse_level(name: &str) -> Option<u8> {
	let level = u8::try_from(parse_decimal(name)?).ok()?;
	(level <= MAX_LEVEL).then_some(level)
}

/// Parses a column directory name, which must be in range for `level`.
#[must_use]
pub fn parse_column(name: &str, level: u8) -> Option<u32> {
	parse_index(name, level)
}

/// Parses a row file name such as `5.pbf`, which must be in range for `level`.
#[must_use]
pub fn parse_row_file(name: &str, level: u8) -> Option<u32> {
	let stem = name.strip_suffix(TILE_EXTENSION)?.strip_suffix('.')?;
	parse_index(stem, level)
}

fn parse_index(name: &str, level: u8) -> Option<u32> {
	let value = u32::try_from(parse_decimal(name)?).ok()?;
	TileCoord::is_valid_index(level, value).then_some(value)
}

// Only canonical names: ASCII digits, at most ten of them, no leading zero unless the name is "0".
fn parse_decimal(name: &str) -> Option<u64> {
	if name.is_empty() || name.len() > 10 || !name.bytes().all(|b| b.is_ascii_digit()) {
		return None;
	}
	if name.len() > 1 && name.starts_with('0') {
		return None;
	}
	name.parse().ok()
}
