//! This module defines [`Metadata`], the TileJSON-like descriptor document stored next to the tiles.
//!
//! A metadata document has three canonical fields:
//! - `minzoom` and `maxzoom`: the zoom bounds of the tile set, both optional.
//! - `attribution`: optional attribution text.
//!
//! Every other key is kept as an extension field (`name`, `description`, `tilejson`, `bounds`, …).
//! Documents round-trip losslessly through [`Metadata::as_string`] and [`Metadata::try_from`].
//!
//! # Example
//! ```rust
//! # use vtstore_core::Metadata;
//! # fn example() -> anyhow::Result<()> {
//! let mut metadata = Metadata::try_from(r#"{"minzoom":0,"maxzoom":4,"name":"roads"}"#)?;
//! metadata.set_attribution("© contributors");
//! metadata.set_string("animal", "kangaroo")?;
//!
//! assert_eq!(metadata.max_zoom(), Some(4));
//! assert_eq!(
//! 	metadata.as_string(),
//! 	r#"{"animal":"kangaroo","attribution":"© contributors","maxzoom":4,"minzoom":0,"name":"roads"}"#
//! );
//! # Ok(())
//! # }
//! ```

use crate::{Blob, MAX_LEVEL};
use anyhow::{Context, Result, anyhow, bail, ensure};
use serde_json::{Map, Value};
use std::{collections::BTreeMap, fmt::Debug};

const KEY_MIN_ZOOM: &str = "minzoom";
const KEY_MAX_ZOOM: &str = "maxzoom";
const KEY_ATTRIBUTION: &str = "attribution";

/// The single descriptor document of a tile store.
///
/// `Metadata::default()` has no zoom bounds, no attribution and no extension fields.
/// Copy-and-modify is `clone()` followed by setters.
#[derive(Clone, PartialEq, Default)]
pub struct Metadata {
	min_zoom: Option<u8>,
	max_zoom: Option<u8>,
	attribution: Option<String>,
	values: BTreeMap<String, Value>,
}

impl Metadata {
	// -------------------------------------------------------------------------
	// Creation and Parsing
	// -------------------------------------------------------------------------

	/// Creates a document with the zoom bounds set and everything else empty.
	#[must_use]
	pub fn from_zoom_range(min_zoom: u8, max_zoom: u8) -> Metadata {
		Metadata {
			min_zoom: Some(min_zoom),
			max_zoom: Some(max_zoom),
			..Metadata::default()
		}
	}

	/// Reads a document from a JSON object.
	///
	/// # Errors
	/// Returns an error if `minzoom`/`maxzoom` are not integers in `0..=31`
	/// or if `attribution` is not a string.
	pub fn from_object(object: &Map<String, Value>) -> Result<Metadata> {
		let mut r = Metadata::default();
		for (k, v) in object {
			r.set_value(k, v.clone())?;
		}
		Ok(r)
	}

	/// Builds the JSON object. Keys are sorted.
	#[must_use]
	pub fn as_object(&self) -> Map<String, Value> {
		let mut obj: Map<String, Value> = self.values.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
		if let Some(z) = self.min_zoom {
			obj.insert(KEY_MIN_ZOOM.to_string(), Value::from(z));
		}
		if let Some(z) = self.max_zoom {
			obj.insert(KEY_MAX_ZOOM.to_string(), Value::from(z));
		}
		if let Some(a) = &self.attribution {
			obj.insert(KEY_ATTRIBUTION.to_string(), Value::from(a.as_str()));
		}
		obj
	}

	/// Compact JSON text of this document.
	#[must_use]
	pub fn as_string(&self) -> String {
		Value::Object(self.as_object()).to_string()
	}

	/// Indented JSON text, used for human readable output.
	#[must_use]
	pub fn as_pretty_string(&self) -> String {
		serde_json::to_string_pretty(&Value::Object(self.as_object())).unwrap_or_else(|_| self.as_string())
	}

	#[must_use]
	pub fn as_blob(&self) -> Blob {
		Blob::from(self.as_string())
	}

	// -------------------------------------------------------------------------
	// Canonical fields
	// -------------------------------------------------------------------------

	#[must_use]
	pub fn min_zoom(&self) -> Option<u8> {
		self.min_zoom
	}

	#[must_use]
	pub fn max_zoom(&self) -> Option<u8> {
		self.max_zoom
	}

	pub fn set_min_zoom(&mut self, z: Option<u8>) {
		self.min_zoom = z;
	}

	pub fn set_max_zoom(&mut self, z: Option<u8>) {
		self.max_zoom = z;
	}

	#[must_use]
	pub fn attribution(&self) -> Option<&str> {
		self.attribution.as_deref()
	}

	pub fn set_attribution(&mut self, attribution: &str) {
		self.attribution = Some(attribution.to_string());
	}

	// -------------------------------------------------------------------------
	// Extension fields
	// -------------------------------------------------------------------------

	/// Sets `key` to `value`. The canonical keys are routed to their fields.
	///
	/// # Errors
	/// Returns an error if a canonical key receives a value of the wrong type.
	pub fn set_value(&mut self, key: &str, value: impl Into<Value>) -> Result<()> {
		let value = value.into();
		match key {
			KEY_MIN_ZOOM => self.min_zoom = parse_zoom(key, &value)?,
			KEY_MAX_ZOOM => self.max_zoom = parse_zoom(key, &value)?,
			KEY_ATTRIBUTION => {
				self.attribution = match value {
					Value::Null => None,
					Value::String(s) => Some(s),
					other => bail!("'{key}' must be a string, found {other}"),
				}
			}
			_ => {
				self.values.insert(key.to_string(), value);
			}
		}
		Ok(())
	}

	/// Sets `key` to a string. Like [`Metadata::set_value`], canonical keys are routed to their
	/// fields, so `set_string("maxzoom", ..)` fails.
	pub fn set_string(&mut self, key: &str, value: &str) -> Result<()> {
		self.set_value(key, value)
	}

	pub fn set_bool(&mut self, key: &str, value: bool) -> Result<()> {
		self.set_value(key, value)
	}

	pub fn set_integer(&mut self, key: &str, value: i64) -> Result<()> {
		self.set_value(key, value)
	}

	/// Sets a floating point extension field.
	///
	/// # Errors
	/// Returns an error for NaN and infinite values, which JSON cannot represent.
	pub fn set_float(&mut self, key: &str, value: f64) -> Result<()> {
		let number = serde_json::Number::from_f64(value).ok_or_else(|| anyhow!("'{key}' must be a finite number"))?;
		self.set_value(key, Value::Number(number))
	}

	/// Returns any key, canonical ones included, as a JSON value.
	#[must_use]
	pub fn get(&self, key: &str) -> Option<Value> {
		match key {
			KEY_MIN_ZOOM => self.min_zoom.map(Value::from),
			KEY_MAX_ZOOM => self.max_zoom.map(Value::from),
			KEY_ATTRIBUTION => self.attribution.as_deref().map(Value::from),
			_ => self.values.get(key).cloned(),
		}
	}

	#[must_use]
	pub fn get_str(&self, key: &str) -> Option<&str> {
		if key == KEY_ATTRIBUTION {
			return self.attribution();
		}
		self.values.get(key).and_then(Value::as_str)
	}

	#[must_use]
	pub fn get_string(&self, key: &str) -> Option<String> {
		self.get_str(key).map(String::from)
	}

	#[must_use]
	pub fn get_number(&self, key: &str) -> Option<f64> {
		self.get(key).as_ref().and_then(Value::as_f64)
	}

	#[must_use]
	pub fn get_bool(&self, key: &str) -> Option<bool> {
		self.values.get(key).and_then(Value::as_bool)
	}

	/// Removes an extension field or clears a canonical one.
	pub fn remove(&mut self, key: &str) -> Option<Value> {
		let old = self.get(key);
		match key {
			KEY_MIN_ZOOM => self.min_zoom = None,
			KEY_MAX_ZOOM => self.max_zoom = None,
			KEY_ATTRIBUTION => self.attribution = None,
			_ => {
				self.values.remove(key);
			}
		}
		old
	}

	/// Iterates over the extension fields in key order.
	pub fn iter_values(&self) -> impl Iterator<Item = (&String, &Value)> {
		self.values.iter()
	}

	/// `true` when no field at all is set.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.min_zoom.is_none() && self.max_zoom.is_none() && self.attribution.is_none() && self.values.is_empty()
	}

	// -------------------------------------------------------------------------
	// Validation
	// -------------------------------------------------------------------------

	/// Checks that `minzoom <= maxzoom` when both are set.
	pub fn check(&self) -> Result<()> {
		if let (Some(min), Some(max)) = (self.min_zoom, self.max_zoom) {
			ensure!(min <= max, "minzoom ({min}) must be <= maxzoom ({max})");
		}
		Ok(())
	}
}

fn parse_zoom(key: &str, value: &Value) -> Result<Option<u8>> {
	if value.is_null() {
		return Ok(None);
	}
	let z = value
		.as_u64()
		.with_context(|| format!("'{key}' must be a non-negative integer, found {value}"))?;
	ensure!(z <= u64::from(MAX_LEVEL), "'{key}' ({z}) must be <= {MAX_LEVEL}");
	Ok(Some(z as u8))
}

impl TryFrom<&str> for Metadata {
	type Error = anyhow::Error;

	/// Parses a JSON document.
	///
	/// # Errors
	/// Returns an error if the text is not a JSON object or a canonical field is invalid.
	fn try_from(text: &str) -> Result<Metadata> {
		let value: Value = serde_json::from_str(text).context("parsing metadata JSON")?;
		match value {
			Value::Object(object) => Metadata::from_object(&object),
			other => bail!("metadata must be a JSON object, found {other}"),
		}
	}
}

impl TryFrom<&Blob> for Metadata {
	type Error = anyhow::Error;

	fn try_from(blob: &Blob) -> Result<Metadata> {
		let text = std::str::from_utf8(blob.as_slice()).context("metadata is not valid UTF-8")?;
		Metadata::try_from(text)
	}
}

impl From<&Metadata> for Blob {
	fn from(val: &Metadata) -> Self {
		val.as_blob()
	}
}

impl Debug for Metadata {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "Metadata({})", self.as_string())
	}
}
