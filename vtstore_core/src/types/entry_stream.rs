//! Asynchronous streams of tile entries
//!
//! [`EntryStream`] wraps a boxed [`Stream`] of `Result<Entry>`. Streams are lazy: nothing is read
//! until the stream is polled, and dropping the stream stops the producer. An `Err` item means the
//! producer hit a failure; consumers such as [`EntryStream::to_vec`] stop at the first one.
//!
//! # Examples
//!
//! ```rust
//! use vtstore_core::{Entry, EntryStream};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let stream = EntryStream::from_vec(vec![
//! 	Entry::new(0, 0, 0, "tile0")?,
//! 	Entry::new(1, 1, 0, "tile1")?,
//! ]);
//!
//! let entries = stream.to_vec().await?;
//! assert_eq!(entries.len(), 2);
//! # Ok(())
//! # }
//! ```

use crate::Entry;
use anyhow::Result;
use futures::{
	Future, Stream, StreamExt, TryStreamExt,
	future::ready,
	stream::{self, BoxStream},
};
use std::{
	pin::Pin,
	task::{Context, Poll},
};

/// A stream of entries, each item either an [`Entry`] or the error that ended the stream.
pub struct EntryStream<'a> {
	pub inner: BoxStream<'a, Result<Entry>>,
}

impl<'a> EntryStream<'a> {
	// -------------------------------------------------------------------------
	// Constructors
	// -------------------------------------------------------------------------

	#[must_use]
	pub fn from_stream(stream: BoxStream<'a, Result<Entry>>) -> Self {
		EntryStream { inner: stream }
	}

	/// Yields every entry of `vec` in order.
	#[must_use]
	pub fn from_vec(vec: Vec<Entry>) -> Self {
		EntryStream {
			inner: stream::iter(vec.into_iter().map(Ok)).boxed(),
		}
	}

	// -------------------------------------------------------------------------
	// Consumers
	// -------------------------------------------------------------------------

	/// Next item, or `None` once the stream has completed.
	pub async fn next(&mut self) -> Option<Result<Entry>> {
		self.inner.next().await
	}

	/// Collects all entries, failing on the first error.
	pub async fn to_vec(self) -> Result<Vec<Entry>> {
		self.inner.try_collect().await
	}

	/// Counts the entries, failing on the first error.
	pub async fn count(self) -> Result<u64> {
		self.inner.try_fold(0u64, |n, _| ready(Ok(n + 1))).await
	}

	/// Calls `callback` for every entry in order, stopping at the first error
	/// from either the stream or the callback.
	pub async fn try_for_each_async<F, Fut>(self, mut callback: F) -> Result<()>
	where
		F: FnMut(Entry) -> Fut,
		Fut: Future<Output = Result<()>>,
	{
		let mut inner = self.inner;
		while let Some(entry) = inner.next().await {
			callback(entry?).await?;
		}
		Ok(())
	}
}

impl Stream for EntryStream<'_> {
	type Item = Result<Entry>;

	fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
		self.inner.poll_next_unpin(cx)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use anyhow::anyhow;

	fn entry(level: u8, x: u32, y: u32) -> Entry {
		Entry::new(level, x, y, format!("{level}/{x}/{y}")).unwrap()
	}

	#[tokio::test]
	async fn empty_stream_completes() -> Result<()> {
		let mut stream = EntryStream::from_vec(vec![]);
		assert!(stream.next().await.is_none());
		assert_eq!(EntryStream::from_vec(vec![]).to_vec().await?, vec![]);
		Ok(())
	}

	#[tokio::test]
	async fn should_collect_in_order() -> Result<()> {
		let entries = vec![entry(0, 0, 0), entry(2, 1, 3), entry(1, 0, 1)];
		assert_eq!(EntryStream::from_vec(entries.clone()).to_vec().await?, entries);
		Ok(())
	}

	#[tokio::test]
	async fn should_stop_at_first_error() {
		let inner = stream::iter(vec![Ok(entry(0, 0, 0)), Err(anyhow!("disk on fire")), Ok(entry(1, 0, 0))]).boxed();
		let err = EntryStream::from_stream(inner).to_vec().await.unwrap_err();
		assert_eq!(err.to_string(), "disk on fire");
	}

	#[tokio::test]
	async fn should_count() -> Result<()> {
		assert_eq!(EntryStream::from_vec(vec![entry(1, 1, 1), entry(3, 2, 1)]).count().await?, 2);
		Ok(())
	}

	#[tokio::test]
	async fn should_visit_each_entry() -> Result<()> {
		let mut seen = Vec::new();
		EntryStream::from_vec(vec![entry(0, 0, 0), entry(1, 1, 0)])
			.try_for_each_async(|e| {
				seen.push(e.coord.to_string());
				ready(Ok(()))
			})
			.await?;
		assert_eq!(seen, ["0/0/0", "1/1/0"]);

		let err = EntryStream::from_vec(vec![entry(0, 0, 0), entry(1, 1, 0)])
			.try_for_each_async(|_| ready(Err(anyhow!("rejected"))))
			.await
			.unwrap_err();
		assert_eq!(err.to_string(), "rejected");
		Ok(())
	}

	#[tokio::test]
	async fn is_a_stream() -> Result<()> {
		let stream = EntryStream::from_vec(vec![entry(0, 0, 0)]);
		let items: Vec<Entry> = stream.try_collect().await?;
		assert_eq!(items, vec![entry(0, 0, 0)]);
		Ok(())
	}
}
