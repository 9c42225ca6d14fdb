//! Typed errors for the failures callers need to tell apart.
//!
//! Every operation returns `anyhow::Result`. The variants below are raised inside that
//! `anyhow::Error` and can be recovered with `err.downcast_ref::<StorageError>()`,
//! even after context has been added on top.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
	/// The root does not exist and the store was opened without `create_if_missing`.
	#[error("missing storage root {0:?}")]
	MissingRoot(PathBuf),

	/// The root exists but is a file or something else that is not a directory.
	#[error("storage root {0:?} is not a directory")]
	NotADirectory(PathBuf),

	/// The metadata document exists but cannot be parsed.
	#[error("malformed metadata document {path:?}")]
	MalformedMetadata {
		path: PathBuf,
		#[source]
		source: Box<dyn std::error::Error + Send + Sync>,
	},
}

impl StorageError {
	/// `true` for the errors raised while opening a store, after which no store exists.
	pub fn is_construction_error(&self) -> bool {
		matches!(self, StorageError::MissingRoot(_) | StorageError::NotADirectory(_))
	}
}
