//! Domain Layer - Pure filter logic
//!
//! This layer contains:
//! - Sizing calculation (m, k and word count)
//! - Digest hashers and double-hashing index derivation
//! - The bit-packed filter and its lock-free counterpart
//! - Configuration
//!
//! RULES:
//! - No I/O operations
//! - No async code
//! - Pure functions where possible

pub mod atomic_filter;
pub mod bloom_filter;
pub mod config;
pub mod hash_functions;
pub mod parameters;

pub use atomic_filter::AtomicBloomFilter;
pub use bloom_filter::BloomFilter;
pub use config::{BloomConfig, BloomConfigBuilder, DEFAULT_MAX_BIT_SIZE};
pub use hash_functions::{
    compute_hash_positions, hash_positions, split_digest, DigestHasher, Fnv1aHasher, HashPositions,
    Murmur3Hasher, SipDigestHasher,
};
pub use parameters::{
    calculate_fpr, calculate_sizing, optimal_bit_size, optimal_num_hashes, SizingParams,
    WordRounding, MIN_NUM_HASHES, REACHABLE_BITS, WORD_BITS,
};
