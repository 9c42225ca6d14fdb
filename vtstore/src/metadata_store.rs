//! The metadata document, stored as `tiles.json` in the storage root.

use crate::{StorageError, atomic_write::write_atomic, path_codec::METADATA_FILENAME};
use anyhow::{Context, Result};
use std::{
	io::ErrorKind,
	path::{Path, PathBuf},
};
use tokio::fs;
use vtstore_core::{Blob, Metadata};

#[derive(Clone, Debug)]
pub struct MetadataStore {
	path: PathBuf,
}

impl MetadataStore {
	#[must_use]
	pub fn new(root: &Path) -> MetadataStore {
		MetadataStore {
			path: root.join(METADATA_FILENAME),
		}
	}

	/// Location of the document.
	#[must_use]
	pub fn path(&self) -> &Path {
		&self.path
	}

	/// The stored document, or `None` if it was never written.
	///
	/// # Errors
	/// A document that exists but does not parse fails with [`StorageError::MalformedMetadata`].
	pub async fn read(&self) -> Result<Option<Metadata>> {
		let data = match fs::read(&self.path).await {
			Ok(data) => Blob::from(data),
			Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
			Err(err) => return Err(err).with_context(|| format!("reading metadata from {:?}", self.path)),
		};
		log::trace!("read metadata from {:?}", self.path);

		let metadata = Metadata::try_from(&data).map_err(|err| StorageError::MalformedMetadata {
			path: self.path.clone(),
			source: err.into(),
		})?;
		Ok(Some(metadata))
	}

	/// Replaces the stored document.
	pub async fn write(&self, metadata: &Metadata) -> Result<()> {
		metadata.check().context("refusing to store invalid metadata")?;
		write_atomic(&self.path, metadata.as_pretty_string().as_bytes())
			.await
			.with_context(|| format!("writing metadata to {:?}", self.path))
	}

	pub async fn exists(&self) -> Result<bool> {
		fs::try_exists(&self.path)
			.await
			.with_context(|| format!("checking metadata at {:?}", self.path))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use assert_fs::{TempDir, fixture::FileWriteStr, prelude::PathChild};
	use pretty_assertions::assert_eq;

	#[tokio::test]
	async fn absent_document() -> Result<()> {
		let dir = TempDir::new()?;
		let store = MetadataStore::new(dir.path());
		assert_eq!(store.read().await?, None);
		assert!(!store.exists().await?);
		Ok(())
	}

	#[tokio::test]
	async fn write_then_read() -> Result<()> {
		let dir = TempDir::new()?;
		let store = MetadataStore::new(dir.path());

		let mut metadata = Metadata::from_zoom_range(0, 4);
		metadata.set_attribution("Proudly sponsored by Skippy");
		metadata.set_string("animal", "kangaroo")?;
		store.write(&metadata).await?;

		assert!(store.exists().await?);
		assert_eq!(store.read().await?, Some(metadata));
		Ok(())
	}

	#[tokio::test]
	async fn document_is_json() -> Result<()> {
		let dir = TempDir::new()?;
		let store = MetadataStore::new(dir.path());

		let mut metadata = Metadata::from_zoom_range(2, 3);
		metadata.set_string("animal", "kangaroo")?;
		store.write(&metadata).await?;

		let text = std::fs::read_to_string(dir.path().join("tiles.json"))?;
		let value: serde_json::Value = serde_json::from_str(&text)?;
		assert_eq!(
			value,
			serde_json::json!({"animal": "kangaroo", "maxzoom": 3, "minzoom": 2})
		);
		Ok(())
	}

	#[tokio::test]
	async fn overwrite_replaces_document() -> Result<()> {
		let dir = TempDir::new()?;
		let store = MetadataStore::new(dir.path());

		let mut first = Metadata::default();
		first.set_string("name", "first")?;
		store.write(&first).await?;
		store.write(&Metadata::from_zoom_range(1, 1)).await?;

		assert_eq!(store.read().await?, Some(Metadata::from_zoom_range(1, 1)));
		Ok(())
	}

	#[tokio::test]
	async fn reads_foreign_documents() -> Result<()> {
		let dir = TempDir::new()?;
		dir.child("tiles.json")
			.write_str(r#"{"minzoom": 0, "maxzoom": 14, "attribution": "© contributors", "vector_layers": []}"#)?;

		let metadata = MetadataStore::new(dir.path()).read().await?.unwrap();
		assert_eq!(metadata.min_zoom(), Some(0));
		assert_eq!(metadata.max_zoom(), Some(14));
		assert_eq!(metadata.attribution(), Some("© contributors"));
		assert_eq!(metadata.get("vector_layers"), Some(serde_json::json!([])));
		Ok(())
	}

	#[tokio::test]
	async fn malformed_document_is_an_error() -> Result<()> {
		let dir = TempDir::new()?;
		dir.child("tiles.json").write_str("{ not json")?;

		let err = MetadataStore::new(dir.path()).read().await.unwrap_err();
		match err.downcast_ref::<StorageError>() {
			Some(StorageError::MalformedMetadata { path, .. }) => assert_eq!(path, &dir.path().join("tiles.json")),
			other => panic!("unexpected error {other:?}"),
		}
		Ok(())
	}

	#[tokio::test]
	async fn non_object_document_is_an_error() -> Result<()> {
		let dir = TempDir::new()?;
		dir.child("tiles.json").write_str("[1, 2, 3]")?;
		assert!(MetadataStore::new(dir.path()).read().await.is_err());
		Ok(())
	}

	#[tokio::test]
	async fn refuses_inverted_zoom_range() -> Result<()> {
		let dir = TempDir::new()?;
		let store = MetadataStore::new(dir.path());

		let err = store.write(&Metadata::from_zoom_range(6, 2)).await.unwrap_err();
		assert_eq!(err.to_string(), "refusing to store invalid metadata");
		assert!(!store.exists().await?);
		Ok(())
	}
}
