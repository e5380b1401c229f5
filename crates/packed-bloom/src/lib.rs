//! # Packed Bloom
//!
//! Probabilistic set membership over a fixed-size array of 32-bit words.
//! Answers "possibly added" or "definitely not added" for arbitrary byte
//! sequences, with a false positive rate tuned at construction.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): Pure logic, no I/O
//!   - `calculate_sizing`: (capacity n, denominator p) -> (bits m, hashes k)
//!   - `DigestHasher`: one 64-bit digest per element (MurmurHash3, FNV-1a or SipHash)
//!   - `BloomFilter`: bit-packed store with `add` / `check`
//!   - `AtomicBloomFilter`: same store with `fetch_or` writes for shared use
//!   - `BloomConfig` / `BloomConfigBuilder`: validated configuration
//!
//! - **Metrics** (`metrics`): optional counters observed by filters
//!
//! ## Invariants
//!
//! - **No false negatives**: if added, `check()` MUST return true
//! - m and k never change after construction; bits are never cleared
//! - Expected FPR at capacity = (1 - e^(-kn/m))^k ≈ 1/p
//!
//! ## Usage Example
//!
//! ```ignore
//! use packed_bloom::BloomFilter;
//!
//! let mut filter = BloomFilter::new(100, 1000)?;
//! filter.add(b"alpha");
//!
//! assert!(filter.check(b"alpha"));
//! assert!(!filter.check(b"totally-different-value"));
//! ```

pub mod domain;
pub mod error;
pub mod metrics;

// Re-exports for convenience
pub use domain::{
    AtomicBloomFilter, BloomConfig, BloomConfigBuilder, BloomFilter, DigestHasher, Fnv1aHasher,
    Murmur3Hasher, SipDigestHasher, SizingParams, WordRounding,
};
pub use error::FilterError;
pub use metrics::{Metrics, MetricsRecorder, MetricsSnapshot, NoOpMetrics};
