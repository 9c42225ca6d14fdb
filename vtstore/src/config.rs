//! Initialization policy of a tile store.
//!
//! The configuration has exactly one option, `create_if_missing`. It can be built in code or
//! loaded from YAML:
//!
//! ```yaml
//! create_if_missing: true
//! ```
//!
//! Unknown keys are rejected.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
	fs::File,
	io::{BufReader, Read},
	path::Path,
};

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
	/// Create the storage root (and its parents) when it does not exist.
	/// When `false`, opening a missing root fails.
	#[serde(default)]
	pub create_if_missing: bool,
}

impl StorageConfig {
	/// Policy that creates a missing root.
	pub fn create_if_missing() -> Self {
		StorageConfig { create_if_missing: true }
	}

	pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
		Ok(serde_yaml_ng::from_reader(reader)?)
	}

	pub fn from_string(text: &str) -> Result<Self> {
		Ok(serde_yaml_ng::from_str(text)?)
	}

	pub fn from_path(path: &Path) -> Result<Self> {
		let file = File::open(path).with_context(|| format!("opening config file {path:?}"))?;
		StorageConfig::from_reader(BufReader::new(file)).with_context(|| format!("parsing config file {path:?}"))
	}
}
