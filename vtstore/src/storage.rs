//! The storage engine: one root directory holding tile entries and a metadata document.
//!
//! [`TileStorage`] ties together the [`EntryStore`], the [`MetadataStore`] and the
//! [`ZoomScanner`]. It is cheap to clone, keeps no cache and holds no locks; every call looks at
//! the filesystem again.
//!
//! ## Usage
//! ```no_run
//! use vtstore::{Entry, TileStorage};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let storage = TileStorage::builder("/data/tiles").create_if_missing(true).build()?;
//!
//! let source = futures::stream::iter(vec![Ok(Entry::new(3, 4, 5, "test")?)]);
//! assert_eq!(storage.put_entries(source).await?, 1);
//!
//! let metadata = storage.generate_default().await?;
//! assert_eq!(metadata.max_zoom(), Some(3));
//! storage.put_metadata(futures::future::ready(Ok(metadata))).await?;
//!
//! let entries = storage.get_entries().to_vec().await?;
//! assert_eq!(entries.len(), 1);
//! # Ok(())
//! # }
//! ```

use crate::{EntryStore, MetadataStore, StorageConfig, StorageError, ZoomScanner};
use anyhow::{Context, Result};
use futures::{
	Future, Stream, StreamExt, TryStreamExt,
	future::ready,
	stream::{self, BoxStream},
};
use std::{
	fmt::Debug,
	io::ErrorKind,
	path::{Path, PathBuf},
	pin::pin,
};
use vtstore_core::{Blob, ConcurrencyLimits, Entry, EntryStream, Metadata, TileCoord};

#[derive(Clone)]
pub struct TileStorage {
	root: PathBuf,
	config: StorageConfig,
	entries: EntryStore,
	metadata: MetadataStore,
	scanner: ZoomScanner,
}

impl TileStorage {
	// -------------------------------------------------------------------------
	// Construction
	// -------------------------------------------------------------------------

	/// Starts building a store at `root`. The default policy is strict.
	pub fn builder(root: impl Into<PathBuf>) -> StorageBuilder {
		StorageBuilder {
			root: root.into(),
			config: StorageConfig::default(),
			limits: ConcurrencyLimits::default(),
		}
	}

	/// Opens the store at `root`.
	///
	/// # Errors
	/// With the strict policy a missing root fails with [`StorageError::MissingRoot`]. A root
	/// that is not a directory fails with [`StorageError::NotADirectory`] under either policy.
	pub fn open(root: &Path, config: StorageConfig) -> Result<TileStorage> {
		TileStorage::builder(root).config(config).build()
	}

	fn open_with_limits(root: PathBuf, config: StorageConfig, limits: ConcurrencyLimits) -> Result<TileStorage> {
		log::debug!("open storage {root:?} with {config:?}");

		match std::fs::metadata(&root) {
			Ok(metadata) if metadata.is_dir() => {}
			Ok(_) => return Err(StorageError::NotADirectory(root).into()),
			Err(err) if err.kind() == ErrorKind::NotFound => {
				if !config.create_if_missing {
					return Err(StorageError::MissingRoot(root).into());
				}
				std::fs::create_dir_all(&root).with_context(|| format!("creating storage root {root:?}"))?;
				log::debug!("created storage root {root:?}");
			}
			Err(err) => return Err(err).with_context(|| format!("inspecting storage root {root:?}")),
		}

		Ok(TileStorage {
			entries: EntryStore::with_limits(&root, limits),
			metadata: MetadataStore::new(&root),
			scanner: ZoomScanner::new(&root),
			root,
			config,
		})
	}

	#[must_use]
	pub fn root(&self) -> &Path {
		&self.root
	}

	#[must_use]
	pub fn config(&self) -> &StorageConfig {
		&self.config
	}

	// -------------------------------------------------------------------------
	// Metadata
	// -------------------------------------------------------------------------

	/// Metadata derived from the zoom levels on disk. It is not stored.
	pub async fn generate_default(&self) -> Result<Metadata> {
		self.scanner.default_metadata().await
	}

	/// Emits the stored metadata document if there is one, then completes.
	#[must_use]
	pub fn get_metadata(&self) -> BoxStream<'static, Result<Metadata>> {
		let store = self.metadata.clone();
		stream::once(async move { store.read().await })
			.try_filter_map(|metadata| ready(Ok(metadata)))
			.boxed()
	}

	/// Stores the document produced by `source`, replacing any previous one.
	///
	/// # Errors
	/// Fails without touching the disk if `source` fails.
	pub async fn put_metadata<F>(&self, source: F) -> Result<()>
	where
		F: Future<Output = Result<Metadata>>,
	{
		let metadata = source.await.context("producing metadata")?;
		self.write_metadata(&metadata).await
	}

	pub async fn read_metadata(&self) -> Result<Option<Metadata>> {
		self.metadata.read().await
	}

	pub async fn write_metadata(&self, metadata: &Metadata) -> Result<()> {
		self.metadata.write(metadata).await?;
		log::debug!("stored metadata in {:?}", self.root);
		Ok(())
	}

	// -------------------------------------------------------------------------
	// Entries
	// -------------------------------------------------------------------------

	/// All entries ordered by `(level, x, y)`.
	#[must_use]
	pub fn get_entries(&self) -> EntryStream<'static> {
		self.entries.list_all()
	}

	/// All entries at zoom `level`, ordered by `(x, y)`.
	#[must_use]
	pub fn get_entries_for_zoom(&self, level: u8) -> EntryStream<'static> {
		self.entries.list_for_zoom(level)
	}

	/// Writes every entry of `source` in order and returns how many were written.
	///
	/// # Errors
	/// Stops at the first error of `source` or of a write. Entries written before the failure
	/// stay in the store.
	pub async fn put_entries<S>(&self, source: S) -> Result<u64>
	where
		S: Stream<Item = Result<Entry>>,
	{
		let mut source = pin!(source);
		let mut count = 0u64;
		while let Some(entry) = source.next().await {
			let entry = entry.with_context(|| format!("reading entry {} from source", count + 1))?;
			self.entries.write(&entry).await?;
			count += 1;
		}
		log::debug!("stored {count} entries in {:?}", self.root);
		Ok(count)
	}

	pub async fn read_entry(&self, coord: &TileCoord) -> Result<Option<Blob>> {
		self.entries.read(coord).await
	}

	pub async fn has_entry(&self, coord: &TileCoord) -> Result<bool> {
		self.entries.exists(coord).await
	}

	pub async fn write_entry(&self, entry: &Entry) -> Result<()> {
		self.entries.write(entry).await
	}

	/// Removes the entry at `coord`; succeeds if there is none.
	pub async fn delete_entry(&self, coord: &TileCoord) -> Result<()> {
		self.entries.delete(coord).await
	}

	// -------------------------------------------------------------------------
	// Zoom levels
	// -------------------------------------------------------------------------

	/// Emits the highest zoom level on disk, or nothing for an empty store, then completes.
	#[must_use]
	pub fn get_max_zoom_level(&self) -> BoxStream<'static, Result<u8>> {
		let scanner = self.scanner.clone();
		stream::once(async move { scanner.max_zoom().await })
			.try_filter_map(|level| ready(Ok(level)))
			.boxed()
	}
}

impl Debug for TileStorage {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("TileStorage")
			.field("root", &self.root)
			.field("config", &self.config)
			.finish()
	}
}

/// Collects the initialization policy before a [`TileStorage`] is opened.
#[derive(Clone, Debug)]
pub struct StorageBuilder {
	root: PathBuf,
	config: StorageConfig,
	limits: ConcurrencyLimits,
}

impl StorageBuilder {
	/// Whether a missing root is created instead of rejected.
	#[must_use]
	pub fn create_if_missing(mut self, create: bool) -> Self {
		self.config.create_if_missing = create;
		self
	}

	#[must_use]
	pub fn config(mut self, config: StorageConfig) -> Self {
		self.config = config;
		self
	}

	/// Bounds the number of payload reads in flight during enumeration.
	#[must_use]
	pub fn concurrency(mut self, limits: ConcurrencyLimits) -> Self {
		self.limits = limits;
		self
	}

	/// Opens the store, see [`TileStorage::open`].
	pub fn build(self) -> Result<TileStorage> {
		TileStorage::open_with_limits(self.root, self.config, self.limits)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use anyhow::anyhow;
	use assert_fs::{TempDir, fixture::FileWriteStr, prelude::PathChild};
	use pretty_assertions::assert_eq;

	fn storage(dir: &TempDir) -> TileStorage {
		TileStorage::open(dir.path(), StorageConfig::default()).unwrap()
	}

	fn construction_error(result: Result<TileStorage>) -> StorageError {
		let err = result.unwrap_err();
		match err.downcast::<StorageError>() {
			Ok(err) => err,
			Err(err) => panic!("unexpected error {err:?}"),
		}
	}

	#[test]
	fn strict_rejects_missing_root() -> Result<()> {
		let dir = TempDir::new()?;
		let root = dir.path().join("missing");
		let err = construction_error(TileStorage::open(&root, StorageConfig::default()));
		assert!(matches!(err, StorageError::MissingRoot(ref p) if p == &root));
		assert!(!root.exists());
		Ok(())
	}

	#[test]
	fn create_if_missing_creates_root() -> Result<()> {
		let dir = TempDir::new()?;
		let root = dir.path().join("nested/missing");
		let storage = TileStorage::builder(&root).create_if_missing(true).build()?;
		assert!(root.is_dir());
		assert_eq!(storage.root(), root);
		assert!(storage.config().create_if_missing);
		Ok(())
	}

	#[test]
	fn rejects_file_as_root() -> Result<()> {
		let dir = TempDir::new()?;
		dir.child("file").write_str("not a directory")?;
		let root = dir.path().join("file");

		let err = construction_error(TileStorage::open(&root, StorageConfig::default()));
		assert!(matches!(err, StorageError::NotADirectory(_)));

		let err = construction_error(TileStorage::builder(&root).create_if_missing(true).build());
		assert!(matches!(err, StorageError::NotADirectory(_)));
		Ok(())
	}

	#[test]
	fn existing_root_with_either_policy() -> Result<()> {
		let dir = TempDir::new()?;
		TileStorage::open(dir.path(), StorageConfig::default())?;
		TileStorage::open(dir.path(), StorageConfig::create_if_missing())?;
		Ok(())
	}

	#[tokio::test]
	async fn empty_store() -> Result<()> {
		let dir = TempDir::new()?;
		let storage = storage(&dir);

		assert_eq!(storage.generate_default().await?, Metadata::default());
		assert!(storage.get_metadata().try_collect::<Vec<_>>().await?.is_empty());
		assert!(storage.get_entries().to_vec().await?.is_empty());
		assert!(storage.get_entries_for_zoom(22).to_vec().await?.is_empty());
		assert!(storage.get_max_zoom_level().try_collect::<Vec<_>>().await?.is_empty());
		Ok(())
	}

	#[tokio::test]
	async fn put_and_get_metadata() -> Result<()> {
		let dir = TempDir::new()?;
		let storage = storage(&dir);

		let mut metadata = storage.generate_default().await?;
		metadata.set_attribution("Proudly sponsored by Skippy");
		metadata.set_string("animal", "kangaroo")?;
		storage.put_metadata(ready(Ok(metadata.clone()))).await?;

		let stored: Vec<Metadata> = storage.get_metadata().try_collect().await?;
		assert_eq!(stored, vec![metadata]);
		Ok(())
	}

	#[tokio::test]
	async fn failed_metadata_source_writes_nothing() -> Result<()> {
		let dir = TempDir::new()?;
		let storage = storage(&dir);

		let err = storage.put_metadata(ready(Err(anyhow!("no metadata")))).await.unwrap_err();
		assert_eq!(err.to_string(), "producing metadata");
		assert_eq!(storage.read_metadata().await?, None);
		Ok(())
	}

	#[tokio::test]
	async fn default_metadata_is_not_stored() -> Result<()> {
		let dir = TempDir::new()?;
		let storage = storage(&dir);
		storage.write_entry(&Entry::new(2, 0, 0, "x")?).await?;

		assert_eq!(storage.generate_default().await?, Metadata::from_zoom_range(2, 2));
		assert_eq!(storage.read_metadata().await?, None);
		Ok(())
	}

	#[tokio::test]
	async fn put_entries_counts_and_orders() -> Result<()> {
		let dir = TempDir::new()?;
		let storage = storage(&dir);

		let source = stream::iter(vec![
			Ok(Entry::new(3, 4, 5, "test")?),
			Ok(Entry::new(0, 0, 0, "root")?),
			Ok(Entry::new(3, 4, 5, "replaced")?),
		]);
		assert_eq!(storage.put_entries(source).await?, 3);

		assert_eq!(
			storage.get_entries().to_vec().await?,
			vec![Entry::new(0, 0, 0, "root")?, Entry::new(3, 4, 5, "replaced")?]
		);
		assert_eq!(storage.get_max_zoom_level().try_collect::<Vec<_>>().await?, vec![3]);
		Ok(())
	}

	#[tokio::test]
	async fn put_entries_stops_at_first_error() -> Result<()> {
		let dir = TempDir::new()?;
		let storage = storage(&dir);

		let source = stream::iter(vec![
			Ok(Entry::new(1, 0, 0, "a")?),
			Err(anyhow!("source failed")),
			Ok(Entry::new(1, 1, 1, "b")?),
		]);
		let err = storage.put_entries(source).await.unwrap_err();
		assert_eq!(err.to_string(), "reading entry 2 from source");
		assert_eq!(format!("{err:#}"), "reading entry 2 from source: source failed");

		assert_eq!(storage.get_entries().to_vec().await?, vec![Entry::new(1, 0, 0, "a")?]);
		Ok(())
	}

	#[tokio::test]
	async fn put_entries_rejects_coords_outside_the_grid() -> Result<()> {
		let dir = TempDir::new()?;
		let storage = storage(&dir);

		let outside = Entry::from_coord(TileCoord { level: 3, x: 100, y: 0 }, Blob::from("test"));
		let source = stream::iter(vec![Ok(Entry::new(3, 4, 5, "test")?), Ok(outside.clone())]);
		let err = storage.put_entries(source).await.unwrap_err();
		assert_eq!(err.to_string(), "x (100) out of bounds for level 3");

		assert!(storage.write_entry(&outside).await.is_err());
		assert_eq!(storage.get_entries().to_vec().await?, vec![Entry::new(3, 4, 5, "test")?]);
		Ok(())
	}

	#[tokio::test]
	async fn single_entry_helpers() -> Result<()> {
		let dir = TempDir::new()?;
		let storage = storage(&dir);
		let coord = TileCoord::new(3, 4, 5)?;

		assert!(!storage.has_entry(&coord).await?);
		storage.write_entry(&Entry::from_coord(coord, Blob::from("test"))).await?;
		assert!(storage.has_entry(&coord).await?);
		assert_eq!(storage.read_entry(&coord).await?, Some(Blob::from("test")));

		storage.delete_entry(&coord).await?;
		storage.delete_entry(&coord).await?;
		assert_eq!(storage.read_entry(&coord).await?, None);
		assert!(storage.get_max_zoom_level().try_collect::<Vec<_>>().await?.is_empty());
		Ok(())
	}

	#[tokio::test]
	async fn malformed_metadata_surfaces_in_stream() -> Result<()> {
		let dir = TempDir::new()?;
		dir.child("tiles.json").write_str("not json")?;
		let storage = storage(&dir);

		let result: Result<Vec<Metadata>> = storage.get_metadata().try_collect().await;
		assert!(result.is_err());
		Ok(())
	}

	#[tokio::test]
	async fn sequential_reads() -> Result<()> {
		let dir = TempDir::new()?;
		let storage = TileStorage::builder(dir.path())
			.concurrency(ConcurrencyLimits::new(1))
			.build()?;

		let entries: Vec<Entry> = (0..4u32).map(|y| Entry::new(2, 3, y, vec![y as u8])).collect::<Result<_>>()?;
		storage.put_entries(stream::iter(entries.clone().into_iter().map(Ok))).await?;
		assert_eq!(storage.get_entries_for_zoom(2).to_vec().await?, entries);
		Ok(())
	}

	#[test]
	fn debug_format() -> Result<()> {
		let dir = TempDir::new()?;
		let storage = storage(&dir);
		let text = format!("{storage:?}");
		assert!(text.starts_with("TileStorage { root: "), "{text}");
		assert!(text.ends_with("config: StorageConfig { create_if_missing: false } }"), "{text}");
		Ok(())
	}
}
