//! Tile payloads on disk, one file per entry.
//!
//! Entries live at `<root>/<level>/<x>/<y>.pbf`. Writes go through a temporary file and a rename,
//! reads of a missing file return `None`, and deletes remove directories that became empty.
//!
//! Enumeration walks the tree one directory at a time. Each directory listing is sorted, so
//! entries come out in ascending `(level, x, y)` order, and only the listing of the directory
//! currently being walked is held in memory.

use crate::{
	atomic_write::{is_temp_name, write_atomic},
	path_codec::{parse_column, parse_level, parse_row_file, path_for},
};
use anyhow::{Context, Result, ensure};
use futures::{
	StreamExt, TryStreamExt,
	future::ready,
	stream::{self, BoxStream},
};
use itertools::Itertools;
use std::{
	collections::VecDeque,
	fs::FileType,
	io::ErrorKind,
	path::{Path, PathBuf},
};
use tokio::fs::{self, DirEntry};
use vtstore_core::{Blob, ConcurrencyLimits, Entry, EntryStream, TileCoord};

#[derive(Clone, Debug)]
pub struct EntryStore {
	root: PathBuf,
	limits: ConcurrencyLimits,
}

impl EntryStore {
	#[must_use]
	pub fn new(root: &Path) -> EntryStore {
		EntryStore::with_limits(root, ConcurrencyLimits::default())
	}

	/// Like [`EntryStore::new`], with an explicit bound on concurrent payload reads.
	#[must_use]
	pub fn with_limits(root: &Path, limits: ConcurrencyLimits) -> EntryStore {
		EntryStore {
			root: root.to_path_buf(),
			limits,
		}
	}

	#[must_use]
	pub fn root(&self) -> &Path {
		&self.root
	}

	/// Absolute path of the file holding the entry at `coord`.
	#[must_use]
	pub fn path_of(&self, coord: &TileCoord) -> PathBuf {
		self.root.join(path_for(coord))
	}

	// -------------------------------------------------------------------------
	// Single entries
	// -------------------------------------------------------------------------

	// every operation below rejects coordinates outside the tile grid

	/// Stores `entry`, silently replacing an existing entry at the same coordinate.
	pub async fn write(&self, entry: &Entry) -> Result<()> {
		entry.coord.check()?;
		let path = self.path_of(&entry.coord);
		log::trace!("write entry {} to {path:?}", entry.coord);
		write_atomic(&path, entry.data.as_slice())
			.await
			.with_context(|| format!("writing entry {}", entry.coord))
	}

	/// Payload at `coord`, or `None` if there is no entry.
	pub async fn read(&self, coord: &TileCoord) -> Result<Option<Blob>> {
		coord.check()?;
		let path = self.path_of(coord);
		match fs::read(&path).await {
			Ok(data) => {
				log::trace!("read {} bytes from {path:?}", data.len());
				Ok(Some(Blob::from(data)))
			}
			Err(err) if is_absent(&err) => Ok(None),
			Err(err) => Err(err).with_context(|| format!("reading entry {coord} from {path:?}")),
		}
	}

	pub async fn exists(&self, coord: &TileCoord) -> Result<bool> {
		coord.check()?;
		let path = self.path_of(coord);
		match fs::metadata(&path).await {
			Ok(metadata) => Ok(metadata.is_file()),
			Err(err) if is_absent(&err) => Ok(false),
			Err(err) => Err(err).with_context(|| format!("checking entry {coord} at {path:?}")),
		}
	}

	/// Removes the entry at `coord`. Removing an absent entry succeeds.
	///
	/// Column and zoom directories left empty are removed as well, so that the zoom levels
	/// discovered afterwards reflect the deletion.
	pub async fn delete(&self, coord: &TileCoord) -> Result<()> {
		coord.check()?;
		let path = self.path_of(coord);
		match fs::remove_file(&path).await {
			Ok(()) => log::trace!("deleted {path:?}"),
			Err(err) if is_absent(&err) => return Ok(()),
			Err(err) => return Err(err).with_context(|| format!("deleting entry {coord} at {path:?}")),
		}
		self.prune_empty_dirs(coord).await;
		Ok(())
	}

	// Best effort: a directory that is not empty (or already gone) is simply kept.
	async fn prune_empty_dirs(&self, coord: &TileCoord) {
		let level_dir = self.root.join(coord.level.to_string());
		let column_dir = level_dir.join(coord.x.to_string());
		if fs::remove_dir(&column_dir).await.is_ok() {
			log::trace!("pruned empty directory {column_dir:?}");
			if fs::remove_dir(&level_dir).await.is_ok() {
				log::trace!("pruned empty directory {level_dir:?}");
			}
		}
	}

	// -------------------------------------------------------------------------
	// Enumeration
	// -------------------------------------------------------------------------

	/// Every entry in the store, ordered by `(level, x, y)`.
	#[must_use]
	pub fn list_all(&self) -> EntryStream<'static> {
		self.list(Walker::new(self.root.clone(), None))
	}

	/// Every entry at zoom `level`, ordered by `(x, y)`. Empty if the level has no directory.
	#[must_use]
	pub fn list_for_zoom(&self, level: u8) -> EntryStream<'static> {
		self.list(Walker::new(self.root.clone(), Some(level)))
	}

	/// Coordinates of every entry, without reading payloads.
	#[must_use]
	pub fn list_coords(&self, level: Option<u8>) -> BoxStream<'static, Result<TileCoord>> {
		Walker::new(self.root.clone(), level).into_stream()
	}

	fn list(&self, walker: Walker) -> EntryStream<'static> {
		let store = self.clone();
		let stream = walker
			.into_stream()
			.map(move |coord| {
				let store = store.clone();
				async move {
					let coord = coord?;
					// a file deleted after it was listed is skipped
					Ok(store.read(&coord).await?.map(|data| Entry::from_coord(coord, data)))
				}
			})
			.buffered(self.limits.io_bound)
			.try_filter_map(|entry| ready(Ok(entry)))
			.boxed();
		EntryStream::from_stream(stream)
	}
}

fn is_absent(err: &std::io::Error) -> bool {
	// NotADirectory shows up when a path component is a file
	matches!(err.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory)
}

/// Depth-first walk over zoom, column and row names, yielding coordinates lazily.
///
/// The root is inspected on the first step in both modes, so a vanished root is an error for a
/// single zoom level as well.
struct Walker {
	root: PathBuf,
	only_level: Option<u8>,
	levels: Option<VecDeque<u8>>,
	columns: VecDeque<u32>,
	rows: VecDeque<u32>,
	level: Option<u8>,
	column: Option<u32>,
}

impl Walker {
	fn new(root: PathBuf, level: Option<u8>) -> Walker {
		Walker {
			root,
			only_level: level,
			levels: None,
			columns: VecDeque::new(),
			rows: VecDeque::new(),
			level: None,
			column: None,
		}
	}

	fn into_stream(self) -> BoxStream<'static, Result<TileCoord>> {
		stream::try_unfold(self, Walker::next_coord).boxed()
	}

	async fn next_coord(mut self) -> Result<Option<(TileCoord, Walker)>> {
		loop {
			if let (Some(level), Some(x)) = (self.level, self.column) {
				if let Some(y) = self.rows.pop_front() {
					return Ok(Some((TileCoord { level, x, y }, self)));
				}
				self.column = None;
			}

			if let Some(level) = self.level {
				if let Some(x) = self.columns.pop_front() {
					let dir = self.root.join(level.to_string()).join(x.to_string());
					self.rows = read_sorted(&dir, false, |name, file_type| {
						file_type.is_file().then(|| parse_row_file(name, level)).flatten()
					})
					.await?;
					self.column = Some(x);
					continue;
				}
				self.level = None;
			}

			if self.levels.is_none() {
				let levels = match self.only_level {
					Some(level) => {
						ensure_dir(&self.root).await?;
						VecDeque::from([level])
					}
					None => {
						read_sorted(&self.root, true, |name, file_type| {
							file_type.is_dir().then(|| parse_level(name)).flatten()
						})
						.await?
					}
				};
				self.levels = Some(levels);
			}

			let Some(level) = self.levels.as_mut().and_then(VecDeque::pop_front) else {
				return Ok(None);
			};
			let dir = self.root.join(level.to_string());
			self.columns = read_sorted(&dir, false, |name, file_type| {
				file_type.is_dir().then(|| parse_column(name, level)).flatten()
			})
			.await?;
			self.level = Some(level);
		}
	}
}

async fn ensure_dir(dir: &Path) -> Result<()> {
	let metadata = fs::metadata(dir)
		.await
		.with_context(|| format!("listing directory {dir:?}"))?;
	ensure!(metadata.is_dir(), "listing directory {dir:?}: not a directory");
	Ok(())
}

/// Lists `dir`, keeps the names `parse` accepts and returns them sorted.
///
/// A missing directory is an error when `required`, otherwise it is treated as empty.
async fn read_sorted<T, F>(dir: &Path, required: bool, parse: F) -> Result<VecDeque<T>>
where
	T: Ord,
	F: Fn(&str, FileType) -> Option<T>,
{
	let mut read_dir = match fs::read_dir(dir).await {
		Ok(read_dir) => read_dir,
		Err(err) if !required && is_absent(&err) => return Ok(VecDeque::new()),
		Err(err) => return Err(err).with_context(|| format!("listing directory {dir:?}")),
	};

	let mut values = Vec::new();
	while let Some(entry) = read_dir
		.next_entry()
		.await
		.with_context(|| format!("listing directory {dir:?}"))?
	{
		let Ok(name) = entry.file_name().into_string() else {
			continue;
		};
		if is_temp_name(&name) {
			continue;
		}
		let Some(file_type) = resolve_file_type(&entry).await? else {
			continue;
		};
		if let Some(value) = parse(&name, file_type) {
			values.push(value);
		}
	}
	Ok(values.into_iter().sorted_unstable().collect())
}

/// Type of a directory entry, following symbolic links.
///
/// Dangling links and entries removed during the listing yield `None`; other failures are errors.
pub(crate) async fn resolve_file_type(entry: &DirEntry) -> Result<Option<FileType>> {
	let file_type = match entry.file_type().await {
		Ok(file_type) => file_type,
		Err(err) if is_absent(&err) => return Ok(None),
		Err(err) => return Err(err).with_context(|| format!("inspecting {:?}", entry.path())),
	};
	if !file_type.is_symlink() {
		return Ok(Some(file_type));
	}
	match fs::metadata(entry.path()).await {
		Ok(metadata) => Ok(Some(metadata.file_type())),
		Err(err) if is_absent(&err) => Ok(None),
		Err(err) => Err(err).with_context(|| format!("inspecting {:?}", entry.path())),
	}
}
