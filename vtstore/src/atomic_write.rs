//! Atomic replacement of a single file.
//!
//! The payload is written to a uniquely named temporary file next to the target and then renamed
//! over it, so readers see either the old or the new content, never a partial file. Temporary
//! names start with a dot and end in `.tmp`, which the path codec never accepts as a tile.

use anyhow::{Context, Result};
use std::{
	ffi::OsStr,
	io::ErrorKind,
	path::{Path, PathBuf},
};
use tokio::fs;
use uuid::Uuid;

/// Writes `data` to `path`, creating missing parent directories.
///
/// A concurrent delete may prune the parent directory after it was created. In that case the
/// directory is created again, once.
pub async fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
	let parent = path.parent().with_context(|| format!("path {path:?} has no parent directory"))?;
	let temp_path = temp_path_for(path)?;

	fs::create_dir_all(parent)
		.await
		.with_context(|| format!("creating directory {parent:?}"))?;

	if let Err(err) = fs::write(&temp_path, data).await {
		if err.kind() != ErrorKind::NotFound {
			return Err(err).with_context(|| format!("writing temporary file {temp_path:?}"));
		}
		log::trace!("directory {parent:?} vanished, creating it again");
		fs::create_dir_all(parent)
			.await
			.with_context(|| format!("creating directory {parent:?}"))?;
		fs::write(&temp_path, data)
			.await
			.with_context(|| format!("writing temporary file {temp_path:?}"))?;
	}

	if let Err(err) = fs::rename(&temp_path, path).await {
		// the temp file is useless now, a failed cleanup only leaves an ignored file behind
		let _ = fs::remove_file(&temp_path).await;
		return Err(err).with_context(|| format!("renaming {temp_path:?} to {path:?}"));
	}

	log::trace!("wrote {} bytes to {path:?}", data.len());
	Ok(())
}

fn temp_path_for(path: &Path) -> Result<PathBuf> {
	let name = path
		.file_name()
		.and_then(OsStr::to_str)
		.with_context(|| format!("path {path:?} has no valid file name"))?;
	Ok(path.with_file_name(format!(".{name}.{}.tmp", Uuid::new_v4().simple())))
}

/// Whether `name` looks like a temporary file created by [`write_atomic`].
#[must_use]
pub fn is_temp_name(name: &str) -> bool {
	name.starts_with('.') && name.ends_with(".tmp")
}
