//! Bloom filter configuration and validation
//!
//! # Example
//!
//! ```ignore
//! use packed_bloom::BloomConfigBuilder;
//!
//! let config = BloomConfigBuilder::new()
//!     .capacity(100_000)
//!     .false_positive_denominator(4096)
//!     .build()
//!     .expect("Valid config");
//! ```

use serde::{Deserialize, Serialize};

use super::parameters::{calculate_sizing, SizingParams, WordRounding};
use crate::error::FilterError;

/// Largest bit size accepted by default: no cap beyond what memory can address
///
/// Set `max_bit_size` lower to reject oversized filters up front.
pub const DEFAULT_MAX_BIT_SIZE: u64 = u64::MAX;

/// Bloom filter configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BloomConfig {
    /// Expected number of distinct elements (n > 0)
    pub capacity: usize,
    /// Target false positive rate is 1 / this value (p > 1)
    pub false_positive_denominator: u64,
    /// Reject configurations that derive more bits than this (opt-in cap)
    pub max_bit_size: u64,
    /// How a bit size maps onto 32-bit words
    pub word_rounding: WordRounding,
}

impl Default for BloomConfig {
    fn default() -> Self {
        Self {
            capacity: 1000,
            false_positive_denominator: 1000, // 0.1% false positive rate
            max_bit_size: DEFAULT_MAX_BIT_SIZE,
            word_rounding: WordRounding::Up,
        }
    }
}

impl BloomConfig {
    /// Create a new configuration with validation
    pub fn new(capacity: usize, false_positive_denominator: u64) -> Result<Self, FilterError> {
        let config = Self {
            capacity,
            false_positive_denominator,
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON configuration; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, FilterError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| FilterError::InvalidParameters(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), FilterError> {
        self.sizing().map(|_| ())
    }

    /// Derive the filter sizing, enforcing `max_bit_size`
    pub fn sizing(&self) -> Result<SizingParams, FilterError> {
        let params = calculate_sizing(
            self.capacity,
            self.false_positive_denominator,
            self.word_rounding,
        )?;
        if params.bit_size > self.max_bit_size {
            return Err(FilterError::FilterTooLarge {
                size: params.bit_size,
                max: self.max_bit_size,
            });
        }
        Ok(params)
    }

    /// Builder-style method to set capacity
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Builder-style method to set the false positive denominator
    pub fn with_false_positive_denominator(mut self, denominator: u64) -> Self {
        self.false_positive_denominator = denominator;
        self
    }

    pub fn with_max_bit_size(mut self, bits: u64) -> Self {
        self.max_bit_size = bits;
        self
    }

    pub fn with_word_rounding(mut self, rounding: WordRounding) -> Self {
        self.word_rounding = rounding;
        self
    }
}

/// Builder for BloomConfig with validation
#[derive(Default)]
pub struct BloomConfigBuilder {
    capacity: Option<usize>,
    false_positive_denominator: Option<u64>,
    max_bit_size: Option<u64>,
    word_rounding: Option<WordRounding>,
}

impl BloomConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the expected number of distinct elements
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Set the target false positive rate as 1 / `denominator`
    pub fn false_positive_denominator(mut self, denominator: u64) -> Self {
        self.false_positive_denominator = Some(denominator);
        self
    }

    pub fn max_bit_size(mut self, bits: u64) -> Self {
        self.max_bit_size = Some(bits);
        self
    }

    pub fn word_rounding(mut self, rounding: WordRounding) -> Self {
        self.word_rounding = Some(rounding);
        self
    }

    /// Build the BloomConfig, validating all parameters
    pub fn build(self) -> Result<BloomConfig, FilterError> {
        let config = self.build_unchecked();
        config.validate()?;
        Ok(config)
    }

    /// Build without validation
    pub fn build_unchecked(self) -> BloomConfig {
        let defaults = BloomConfig::default();

        BloomConfig {
            capacity: self.capacity.unwrap_or(defaults.capacity),
            false_positive_denominator: self
                .false_positive_denominator
                .unwrap_or(defaults.false_positive_denominator),
            max_bit_size: self.max_bit_size.unwrap_or(defaults.max_bit_size),
            word_rounding: self.word_rounding.unwrap_or(defaults.word_rounding),
        }
    }
}
