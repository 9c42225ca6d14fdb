//! This module provides the [`Blob`] struct, the opaque byte payload of a tile entry.
//!
//! The store never interprets the bytes. A `Blob` may be empty.
//!
//! # Examples
//!
//! ```rust
//! use vtstore_core::Blob;
//!
//! let blob = Blob::from("test");
//! assert_eq!(blob.len(), 4);
//! assert_eq!(blob.as_slice(), b"test");
//! assert_eq!(blob.into_vec(), b"test".to_vec());
//! ```

use std::fmt::Debug;

/// Number of bytes shown by the [`Debug`] representation before it is cut off.
const DEBUG_PREVIEW: usize = 16;

/// A wrapper around [`Vec<u8>`] holding a tile payload.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Blob(Vec<u8>);

impl Blob {
	/// Creates an empty `Blob`.
	///
	/// ```rust
	/// use vtstore_core::Blob;
	///
	/// let empty_blob = Blob::new_empty();
	/// assert!(empty_blob.is_empty());
	/// ```
	#[must_use]
	pub fn new_empty() -> Blob {
		Blob(Vec::new())
	}

	/// Returns the payload as a byte slice.
	#[must_use]
	pub fn as_slice(&self) -> &[u8] {
		&self.0
	}

	/// Consumes the `Blob` and returns the underlying vector.
	#[must_use]
	pub fn into_vec(self) -> Vec<u8> {
		self.0
	}

	/// Number of bytes in the payload.
	#[must_use]
	pub fn len(&self) -> u64 {
		self.0.len() as u64
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

fn hex(bytes: &[u8]) -> String {
	bytes.iter().map(|b| format!("{b:02x}")).collect::<Vec<_>>().join(" ")
}

impl From<Vec<u8>> for Blob {
	fn from(item: Vec<u8>) -> Self {
		Blob(item)
	}
}

impl From<&Vec<u8>> for Blob {
	fn from(item: &Vec<u8>) -> Self {
		Blob(item.clone())
	}
}

impl From<&[u8]> for Blob {
	fn from(item: &[u8]) -> Self {
		Blob(item.to_vec())
	}
}

impl<const N: usize> From<&[u8; N]> for Blob {
	fn from(item: &[u8; N]) -> Self {
		Blob(item.to_vec())
	}
}

impl From<&str> for Blob {
	fn from(item: &str) -> Self {
		Blob(item.as_bytes().to_vec())
	}
}

impl From<String> for Blob {
	fn from(item: String) -> Self {
		Blob(item.into_bytes())
	}
}

impl AsRef<[u8]> for Blob {
	fn as_ref(&self) -> &[u8] {
		&self.0
	}
}

/// Prints the length and the first bytes in hexadecimal.
impl Debug for Blob {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		if self.0.len() > DEBUG_PREVIEW {
			write!(f, "Blob({}): {} ...", self.0.len(), hex(&self.0[..DEBUG_PREVIEW]))
		} else {
			write!(f, "Blob({}): {}", self.0.len(), hex(&self.0))
		}
	}
}

/// Prints the lossy UTF-8 interpretation of the bytes.
impl std::fmt::Display for Blob {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", String::from_utf8_lossy(&self.0))
	}
}
