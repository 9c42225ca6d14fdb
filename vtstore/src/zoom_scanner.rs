//! Discovery of the zoom levels present in a store.
//!
//! A zoom level is present when the root has a subdirectory with its name. Deleting entries prunes
//! empty directories, so the discovered set follows deletions.

use crate::{entry_store::resolve_file_type, path_codec::parse_level};
use anyhow::{Context, Result};
use std::{
	collections::BTreeSet,
	path::{Path, PathBuf},
};
use tokio::fs;
use vtstore_core::Metadata;

#[derive(Clone, Debug)]
pub struct ZoomScanner {
	root: PathBuf,
}

impl ZoomScanner {
	#[must_use]
	pub fn new(root: &Path) -> ZoomScanner {
		ZoomScanner {
			root: root.to_path_buf(),
		}
	}

	/// All zoom levels with a directory in the root. Other names are ignored.
	pub async fn discover_zoom_levels(&self) -> Result<BTreeSet<u8>> {
		let context = || format!("scanning zoom levels in {:?}", self.root);
		let mut read_dir = fs::read_dir(&self.root).await.with_context(context)?;

		let mut levels = BTreeSet::new();
		while let Some(entry) = read_dir.next_entry().await.with_context(context)? {
			let Some(level) = entry.file_name().to_str().and_then(parse_level) else {
				continue;
			};
			if resolve_file_type(&entry).await?.is_some_and(|t| t.is_dir()) {
				levels.insert(level);
			}
		}
		log::trace!("found zoom levels {levels:?} in {:?}", self.root);
		Ok(levels)
	}

	/// Lowest and highest discovered zoom level, `None` for an empty store.
	pub async fn min_max_zoom(&self) -> Result<Option<(u8, u8)>> {
		let levels = self.discover_zoom_levels().await?;
		Ok(levels.first().copied().zip(levels.last().copied()))
	}

	pub async fn max_zoom(&self) -> Result<Option<u8>> {
		Ok(self.discover_zoom_levels().await?.last().copied())
	}

	/// Metadata describing what is on disk: only the zoom range, and only if any level exists.
	pub async fn default_metadata(&self) -> Result<Metadata> {
		let mut metadata = Metadata::default();
		if let Some((min, max)) = self.min_max_zoom().await? {
			metadata.set_min_zoom(Some(min));
			metadata.set_max_zoom(Some(max));
		}
		Ok(metadata)
	}
}
