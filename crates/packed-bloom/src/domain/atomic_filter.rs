//! Lock-free Bloom filter for shared use across threads
//!
//! Same sizing, hashing and bit layout as [`BloomFilter`], but every word is
//! an `AtomicU32` and `set_bit` is a `fetch_or`, so `add` takes `&self`.
//! A `check` racing an `add` of the same element may see only some of its
//! bits and report `false` until that `add` returns.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use super::bloom_filter::{locate_bit, BloomFilter};
use super::config::BloomConfig;
use super::hash_functions::{compute_hash_positions, DigestHasher, Murmur3Hasher};
use super::parameters::SizingParams;
use crate::error::FilterError;
use crate::metrics::MetricsRecorder;

/// Bloom filter whose `add` and `check` may run concurrently
pub struct AtomicBloomFilter<H = Murmur3Hasher> {
    words: Box<[AtomicU32]>,
    params: SizingParams,
    hasher: H,
    metrics: Option<Arc<dyn MetricsRecorder>>,
}

impl AtomicBloomFilter {
    pub fn new(capacity: usize, false_positive_denominator: u64) -> Result<Self, FilterError> {
        let config = BloomConfig {
            capacity,
            false_positive_denominator,
            ..Default::default()
        };
        Self::from_config(&config)
    }

    pub fn from_config(config: &BloomConfig) -> Result<Self, FilterError> {
        Self::with_hasher(config, Murmur3Hasher::default())
    }
}

impl<H: DigestHasher> AtomicBloomFilter<H> {
    pub fn with_hasher(config: &BloomConfig, hasher: H) -> Result<Self, FilterError> {
        let params = config.sizing()?;
        debug!(
            capacity = params.capacity,
            bit_size = params.bit_size,
            num_hashes = params.num_hashes,
            num_words = params.num_words,
            "created atomic bloom filter"
        );
        let words: Vec<AtomicU32> = (0..params.num_words).map(|_| AtomicU32::new(0)).collect();
        Ok(Self {
            words: words.into_boxed_slice(),
            params,
            hasher,
            metrics: None,
        })
    }

    pub fn with_metrics(mut self, recorder: Arc<dyn MetricsRecorder>) -> Self {
        recorder.record_filter_created(&self.params);
        self.metrics = Some(recorder);
        self
    }

    /// Add an element; safe to call from many threads at once
    pub fn add(&self, element: &[u8]) {
        let start = self.metrics.as_ref().map(|_| Instant::now());

        for index in compute_hash_positions(
            &self.hasher,
            element,
            self.params.num_hashes,
            self.params.bit_size,
        ) {
            let (word, offset) = locate_bit(index, self.params.num_words);
            self.words[word].fetch_or(1u32 << offset, Ordering::Relaxed);
        }

        if let (Some(metrics), Some(start)) = (&self.metrics, start) {
            metrics.record_add(self.params.num_hashes, start.elapsed());
        }
    }

    /// Test if an element might be in the filter
    pub fn check(&self, element: &[u8]) -> bool {
        let start = self.metrics.as_ref().map(|_| Instant::now());

        let found = compute_hash_positions(
            &self.hasher,
            element,
            self.params.num_hashes,
            self.params.bit_size,
        )
        .all(|index| {
            let (word, offset) = locate_bit(index, self.params.num_words);
            self.words[word].load(Ordering::Relaxed) & (1u32 << offset) != 0
        });

        if let (Some(metrics), Some(start)) = (&self.metrics, start) {
            metrics.record_check(start.elapsed(), found);
        }
        found
    }

    pub fn bits_set(&self) -> usize {
        self.words
            .iter()
            .map(|w| w.load(Ordering::Relaxed).count_ones() as usize)
            .sum()
    }

    /// Copy of the current words
    pub fn load_words(&self) -> Vec<u32> {
        self.words.iter().map(|w| w.load(Ordering::Relaxed)).collect()
    }

    /// Freeze the current state into a single-threaded [`BloomFilter`]
    pub fn snapshot(&self) -> BloomFilter<H>
    where
        H: Clone,
    {
        BloomFilter::from_words(self.params.clone(), self.load_words(), self.hasher.clone())
    }

    /// Target false positive rate, `1 / false_positive_denominator`
    pub fn target_fpr(&self) -> f64 {
        1.0 / self.params.false_positive_denominator as f64
    }

    pub fn capacity(&self) -> usize {
        self.params.capacity
    }

    pub fn false_positive_denominator(&self) -> u64 {
        self.params.false_positive_denominator
    }

    pub fn bit_size(&self) -> u64 {
        self.params.bit_size
    }

    pub fn num_hashes(&self) -> u32 {
        self.params.num_hashes
    }

    pub fn num_words(&self) -> usize {
        self.params.num_words
    }

    pub fn params(&self) -> &SizingParams {
        &self.params
    }

    pub fn hasher(&self) -> &H {
        &self.hasher
    }
}

impl<H: fmt::Debug> fmt::Debug for AtomicBloomFilter<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AtomicBloomFilter")
            .field("params", &self.params)
            .field("hasher", &self.hasher)
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}
