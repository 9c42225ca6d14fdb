//! Concurrency limits for filesystem work.
//!
//! Tile payload reads are I/O-bound and can run well above the CPU count,
//! so enumeration issues up to [`ConcurrencyLimits::io_bound`] reads at a time.
//!
//! ```
//! use vtstore_core::ConcurrencyLimits;
//!
//! let limits = ConcurrencyLimits::default();
//! assert!(limits.io_bound >= ConcurrencyLimits::cpu_count());
//! ```

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcurrencyLimits {
	/// Concurrent disk reads, 3x the CPU count by default.
	pub io_bound: usize,
}

impl ConcurrencyLimits {
	/// Custom limit, clamped to at least 1.
	pub fn new(io_bound: usize) -> Self {
		Self {
			io_bound: io_bound.max(1),
		}
	}

	/// Number of logical CPUs, at least 1.
	pub fn cpu_count() -> usize {
		num_cpus::get().max(1)
	}
}

impl Default for ConcurrencyLimits {
	fn default() -> Self {
		Self {
			io_bound: Self::cpu_count() * 3,
		}
	}
}
