//! Core Bloom Filter implementation
//!
//! INVARIANTS:
//! - No false negatives: once `add(x)` returns, `check(x)` returns true
//! - Bit size and hash count are fixed at construction
//! - Bits are only ever set, never cleared

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use bitvec::prelude::*;
use tracing::{debug, trace};

use super::config::BloomConfig;
use super::hash_functions::{compute_hash_positions, DigestHasher, Murmur3Hasher};
use super::parameters::{SizingParams, WORD_BITS};
use crate::error::FilterError;
use crate::metrics::MetricsRecorder;

/// Resolve a bit index to `(word, offset)`
///
/// `word = (index / 32) mod num_words`, `offset = index mod 32`.
#[inline]
pub(crate) fn locate_bit(index: u64, num_words: usize) -> (usize, u32) {
    let word = (index / WORD_BITS) % num_words as u64;
    (word as usize, (index % WORD_BITS) as u32)
}

/// Bloom filter for probabilistic membership testing
///
/// Bits live in 32-bit words, least significant bit first, so bit `i` of
/// the packed array is bit `i % 32` of word `i / 32`. `add` needs `&mut self`;
/// see [`AtomicBloomFilter`](super::AtomicBloomFilter) for concurrent writers.
#[derive(Clone)]
pub struct BloomFilter<H = Murmur3Hasher> {
    /// Packed bit array, `num_words * 32` bits long
    bits: BitVec<u32, Lsb0>,
    /// Derived sizing (m, k, word count)
    params: SizingParams,
    hasher: H,
    metrics: Option<Arc<dyn MetricsRecorder>>,
}

impl BloomFilter {
    /// Create a filter for `capacity` elements at a false positive rate of
    /// `1 / false_positive_denominator`, using default settings otherwise
    ///
    /// # Errors
    /// Fails if `capacity` is 0, `false_positive_denominator <= 1`, or the
    /// derived word count cannot be addressed in memory.
    pub fn new(capacity: usize, false_positive_denominator: u64) -> Result<Self, FilterError> {
        let config = BloomConfig {
            capacity,
            false_positive_denominator,
            ..Default::default()
        };
        Self::from_config(&config)
    }

    /// Create a filter from a configuration
    pub fn from_config(config: &BloomConfig) -> Result<Self, FilterError> {
        Self::with_hasher(config, Murmur3Hasher::default())
    }
}

impl<H: DigestHasher> BloomFilter<H> {
    /// Create a filter from a configuration with a custom digest hasher
    pub fn with_hasher(config: &BloomConfig, hasher: H) -> Result<Self, FilterError> {
        let params = config.sizing()?;
        debug!(
            capacity = params.capacity,
            false_positive_denominator = params.false_positive_denominator,
            bit_size = params.bit_size,
            num_hashes = params.num_hashes,
            num_words = params.num_words,
            "created bloom filter"
        );
        Ok(Self::from_words(params, Vec::new(), hasher))
    }

    /// Build a filter over existing words, zero-filling up to `num_words`
    pub(crate) fn from_words(params: SizingParams, mut words: Vec<u32>, hasher: H) -> Self {
        words.resize(params.num_words, 0);
        Self {
            bits: BitVec::from_vec(words),
            params,
            hasher,
            metrics: None,
        }
    }

    /// Attach a metrics recorder; reports this filter's sizing immediately
    pub fn with_metrics(mut self, recorder: Arc<dyn MetricsRecorder>) -> Self {
        recorder.record_filter_created(&self.params);
        self.metrics = Some(recorder);
        self
    }

    /// Add an element to the filter
    ///
    /// After this returns, `check(element)` is guaranteed to return true.
    pub fn add(&mut self, element: &[u8]) {
        let start = self.metrics.as_ref().map(|_| Instant::now());

        let positions = compute_hash_positions(
            &self.hasher,
            element,
            self.params.num_hashes,
            self.params.bit_size,
        );
        for index in positions {
            self.set_bit(index);
        }

        if let (Some(metrics), Some(start)) = (&self.metrics, start) {
            metrics.record_add(self.params.num_hashes, start.elapsed());
        }
    }

    /// Test if an element might be in the filter
    ///
    /// Returns:
    /// - `true` if the element might be in the set (could be false positive)
    /// - `false` if the element is definitely NOT in the set
    pub fn check(&self, element: &[u8]) -> bool {
        let start = self.metrics.as_ref().map(|_| Instant::now());

        let mut positions = compute_hash_positions(
            &self.hasher,
            element,
            self.params.num_hashes,
            self.params.bit_size,
        );
        let found = positions.all(|index| self.test_bit(index));

        if let (Some(metrics), Some(start)) = (&self.metrics, start) {
            metrics.record_check(start.elapsed(), found);
        }
        found
    }

    #[inline]
    fn set_bit(&mut self, index: u64) {
        let (word, offset) = locate_bit(index, self.params.num_words);
        self.bits.set(word * WORD_BITS as usize + offset as usize, true);
    }

    #[inline]
    fn test_bit(&self, index: u64) -> bool {
        let (word, offset) = locate_bit(index, self.params.num_words);
        self.bits[word * WORD_BITS as usize + offset as usize]
    }

    /// Merge another filter into this one (OR operation)
    ///
    /// Afterwards this filter answers true for everything either filter
    /// did. Both filters must share sizing and hasher.
    pub fn union(&mut self, other: &BloomFilter<H>) -> Result<(), FilterError>
    where
        H: PartialEq,
    {
        if self.params.bit_size != other.params.bit_size
            || self.params.num_hashes != other.params.num_hashes
            || self.params.num_words != other.params.num_words
        {
            return Err(FilterError::IncompatibleFilters {
                reason: format!(
                    "m={} k={} words={} vs m={} k={} words={}",
                    self.params.bit_size,
                    self.params.num_hashes,
                    self.params.num_words,
                    other.params.bit_size,
                    other.params.num_hashes,
                    other.params.num_words
                ),
            });
        }
        if self.hasher != other.hasher {
            return Err(FilterError::IncompatibleFilters {
                reason: "filters use different hashers".to_string(),
            });
        }

        for (s, o) in self
            .bits
            .as_raw_mut_slice()
            .iter_mut()
            .zip(other.bits.as_raw_slice())
        {
            *s |= *o;
        }
        trace!(bits_set = self.bits_set(), "merged bloom filter");

        if let Some(metrics) = &self.metrics {
            metrics.record_union();
        }
        Ok(())
    }

    /// Get the number of bits set in the filter
    pub fn bits_set(&self) -> usize {
        self.bits.count_ones()
    }

    /// Fraction of reachable bits that are set
    pub fn fill_ratio(&self) -> f64 {
        self.bits_set() as f64 / self.params.usable_bits() as f64
    }

    /// Estimate the current false positive rate from the fill ratio
    ///
    /// Formula: FPR ≈ (bits_set / m)^k
    pub fn estimated_fpr(&self) -> f64 {
        self.fill_ratio().powi(self.params.num_hashes as i32)
    }

    /// Target false positive rate, `1 / p`
    pub fn target_fpr(&self) -> f64 {
        1.0 / self.params.false_positive_denominator as f64
    }

    pub fn capacity(&self) -> usize {
        self.params.capacity
    }

    pub fn false_positive_denominator(&self) -> u64 {
        self.params.false_positive_denominator
    }

    /// Get the filter size in bits (m)
    pub fn bit_size(&self) -> u64 {
        self.params.bit_size
    }

    /// Get the number of hash functions (k)
    pub fn num_hashes(&self) -> u32 {
        self.params.num_hashes
    }

    pub fn num_words(&self) -> usize {
        self.params.num_words
    }

    /// Raw packed words
    pub fn words(&self) -> &[u32] {
        self.bits.as_raw_slice()
    }

    pub fn params(&self) -> &SizingParams {
        &self.params
    }

    pub fn hasher(&self) -> &H {
        &self.hasher
    }
}

impl<H: fmt::Debug> fmt::Debug for BloomFilter<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BloomFilter")
            .field("params", &self.params)
            .field("bits_set", &self.bits.count_ones())
            .field("hasher", &self.hasher)
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}
