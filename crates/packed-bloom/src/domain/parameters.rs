//! Bloom filter sizing
//!
//! Formulas, for a target false positive rate of 1/p:
//! - m = ceil(|n * log2(e) * log2(p)|)  -- optimal bits
//! - k = floor((m / n) * ln(2))         -- optimal hash functions, m / n in integers
//!
//! The bit array is stored as 32-bit words. How a bit size that is not a
//! multiple of 32 maps onto words is selected by [`WordRounding`].

use std::f64::consts::{LN_2, LOG2_E};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::FilterError;

/// Width in bits of one storage word
pub const WORD_BITS: u64 = 32;

/// Lower bound applied to the derived hash count
pub const MIN_NUM_HASHES: u32 = 1;

/// Number of distinct indices 32-bit double hashing can produce
pub const REACHABLE_BITS: u64 = 1 << 32;

/// How the word count is derived from the bit size
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WordRounding {
    /// `ceil(m / 32)` words; every index in `[0, m)` has its own bit
    #[default]
    Up,
    /// `floor(m / 32)` words; the remainder bits fold back onto the
    /// low words through `(index / 32) mod words`
    Truncate,
}

impl WordRounding {
    /// Number of words needed for `bit_size` bits under this policy
    pub fn num_words(self, bit_size: u64) -> u64 {
        match self {
            WordRounding::Up => bit_size.div_ceil(WORD_BITS),
            WordRounding::Truncate => bit_size / WORD_BITS,
        }
    }
}

/// Derived sizing of a filter
#[derive(Clone, Debug, PartialEq)]
pub struct SizingParams {
    /// Expected number of distinct elements (n)
    pub capacity: usize,
    /// Target false positive rate expressed as 1/p
    pub false_positive_denominator: u64,
    /// Number of bits in the filter (m)
    pub bit_size: u64,
    /// Number of hash functions (k), never below [`MIN_NUM_HASHES`]
    pub num_hashes: u32,
    /// Number of 32-bit storage words
    pub num_words: usize,
    /// Word rounding policy used to derive `num_words`
    pub word_rounding: WordRounding,
    /// Whether the raw formula produced a hash count below the minimum
    pub hashes_clamped: bool,
    /// Theoretical false positive rate at full capacity
    pub expected_fpr: f64,
}

impl SizingParams {
    /// Bits that some index can actually reach
    ///
    /// Equal to `bit_size` when rounding up; smaller when truncating and
    /// `bit_size` is not a multiple of the word width.
    pub fn usable_bits(&self) -> u64 {
        self.bit_size.min(self.num_words as u64 * WORD_BITS)
    }
}

/// Calculate the sizing for `capacity` elements at a false positive rate of
/// `1 / false_positive_denominator`
///
/// # Errors
/// - [`FilterError::InvalidCapacity`] when `capacity` is 0
/// - [`FilterError::InvalidDenominator`] when `false_positive_denominator <= 1`
/// - [`FilterError::InvalidParameters`] when truncating leaves zero words
/// - [`FilterError::FilterTooLarge`] when the word count does not fit in memory
pub fn calculate_sizing(
    capacity: usize,
    false_positive_denominator: u64,
    word_rounding: WordRounding,
) -> Result<SizingParams, FilterError> {
    if capacity == 0 {
        return Err(FilterError::InvalidCapacity { capacity });
    }
    if false_positive_denominator <= 1 {
        return Err(FilterError::InvalidDenominator {
            denominator: false_positive_denominator,
        });
    }

    let bit_size = optimal_bit_size(capacity, false_positive_denominator);
    let raw_hashes = optimal_num_hashes(bit_size, capacity);
    let hashes_clamped = raw_hashes < MIN_NUM_HASHES;
    let num_hashes = raw_hashes.max(MIN_NUM_HASHES);
    if hashes_clamped {
        warn!(
            capacity,
            false_positive_denominator,
            bit_size,
            "derived hash count is zero, clamping to {}",
            MIN_NUM_HASHES
        );
    }

    if bit_size > REACHABLE_BITS {
        warn!(
            bit_size,
            unreachable_bits = bit_size - REACHABLE_BITS,
            "bits above 2^32 can never be set by 32-bit index derivation"
        );
    }

    let words = word_rounding.num_words(bit_size);
    if words == 0 {
        return Err(FilterError::InvalidParameters(format!(
            "bit size {bit_size} is smaller than one {WORD_BITS}-bit word"
        )));
    }
    let num_words = usize::try_from(words)
        .ok()
        .filter(|w| w.checked_mul(WORD_BITS as usize).is_some())
        .ok_or(FilterError::FilterTooLarge {
            size: bit_size,
            max: usize::MAX as u64,
        })?;

    Ok(SizingParams {
        capacity,
        false_positive_denominator,
        bit_size,
        num_hashes,
        num_words,
        word_rounding,
        hashes_clamped,
        expected_fpr: calculate_fpr(bit_size, capacity, num_hashes),
    })
}

/// Optimal number of bits: `ceil(|n * log2(e) * log2(p)|)`
///
/// Saturates at `u64::MAX` for absurd inputs.
pub fn optimal_bit_size(capacity: usize, false_positive_denominator: u64) -> u64 {
    let n = capacity as f64;
    let p = false_positive_denominator as f64;
    (n * LOG2_E * p.log2()).abs().ceil() as u64
}

/// Optimal number of hash functions: `floor((m / n) * ln(2))`
///
/// `m / n` is an integer quotient. The result may be 0 when `m <= n`;
/// callers clamp it.
pub fn optimal_num_hashes(bit_size: u64, capacity: usize) -> u32 {
    if capacity == 0 {
        return 0;
    }
    let bits_per_element = bit_size / capacity as u64;
    (bits_per_element as f64 * LN_2).floor() as u32
}

/// Calculate the false positive rate for given parameters
///
/// Formula: FPR = (1 - e^(-kn/m))^k
pub fn calculate_fpr(bit_size: u64, elements: usize, num_hashes: u32) -> f64 {
    if bit_size == 0 {
        return 1.0;
    }
    let exponent = -(num_hashes as f64) * (elements as f64) / (bit_size as f64);
    (1.0 - exponent.exp()).powi(num_hashes as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizing_capacity_100_denominator_1000() {
        let params = calculate_sizing(100, 1000, WordRounding::Up).unwrap();

        assert_eq!(params.bit_size, 1438);
        assert_eq!(params.num_hashes, 9);
        assert_eq!(params.num_words, 45);
        assert!(!params.hashes_clamped);
    }

    #[test]
    fn test_sizing_one_million_at_16384() {
        let params = calculate_sizing(1_000_000, 16_384, WordRounding::Up).unwrap();

        assert_eq!(params.bit_size, 20_197_731);
        assert_eq!(params.num_hashes, 13);
        assert_eq!(params.num_words, 631_180);
    }

    #[test]
    fn test_hash_count_uses_integer_bits_per_element() {
        // m = 9586, m / n = 9 (integer), 9 * ln2 = 6.24
        let params = calculate_sizing(1000, 100, WordRounding::Up).unwrap();
        assert_eq!(params.bit_size, 9586);
        assert_eq!(params.num_hashes, 6);
    }

    #[test]
    fn test_zero_hash_count_is_clamped() {
        // m = 15, m / n = 1, 1 * ln2 floors to 0
        assert_eq!(optimal_num_hashes(15, 10), 0);

        let params = calculate_sizing(10, 2, WordRounding::Up).unwrap();
        assert_eq!(params.bit_size, 15);
        assert_eq!(params.num_hashes, 1);
        assert!(params.hashes_clamped);
    }

    #[test]
    fn test_sizing_beyond_32_bit_range() {
        let params = calculate_sizing(300_000_000, 16_384, WordRounding::Up).unwrap();

        assert_eq!(params.bit_size, optimal_bit_size(300_000_000, 16_384));
        assert!(params.bit_size > REACHABLE_BITS);
        assert_eq!(params.num_hashes, 13);
        assert_eq!(params.num_words as u64, params.bit_size.div_ceil(WORD_BITS));
    }

    #[test]
    fn test_truncate_drops_partial_word() {
        let params = calculate_sizing(100, 1000, WordRounding::Truncate).unwrap();

        assert_eq!(params.num_words, 44);
        assert_eq!(params.usable_bits(), 44 * 32);
        assert!(params.usable_bits() < params.bit_size);
    }

    #[test]
    fn test_round_up_covers_every_bit() {
        let params = calculate_sizing(100, 1000, WordRounding::Up).unwrap();
        assert_eq!(params.usable_bits(), params.bit_size);
    }

    #[test]
    fn test_truncate_rejects_sub_word_filter() {
        let result = calculate_sizing(10, 2, WordRounding::Truncate);
        assert!(matches!(result, Err(FilterError::InvalidParameters(_))));
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let result = calculate_sizing(0, 1000, WordRounding::Up);
        assert_eq!(result, Err(FilterError::InvalidCapacity { capacity: 0 }));
    }

    #[test]
    fn test_rejects_denominator_at_most_one() {
        for denominator in [0, 1] {
            let result = calculate_sizing(100, denominator, WordRounding::Up);
            assert_eq!(result, Err(FilterError::InvalidDenominator { denominator }));
        }
    }

    #[test]
    fn test_fpr_calculation() {
        // With m=1000, n=100, k=7, FPR should be around 0.008
        let fpr = calculate_fpr(1000, 100, 7);
        assert!(fpr > 0.005 && fpr < 0.02, "Expected FPR≈0.008, got {}", fpr);
    }

    #[test]
    fn test_expected_fpr_near_target() {
        let params = calculate_sizing(1_000_000, 16_384, WordRounding::Up).unwrap();
        let target = 1.0 / 16_384.0;

        assert!(
            params.expected_fpr < target * 2.0 && params.expected_fpr > target / 2.0,
            "Expected FPR {} should be close to target {}",
            params.expected_fpr,
            target
        );
    }

    #[test]
    fn test_larger_n_needs_more_bits() {
        assert!(optimal_bit_size(1000, 100) > optimal_bit_size(100, 100));
    }

    #[test]
    fn test_lower_fpr_needs_more_bits() {
        assert!(optimal_bit_size(100, 1000) > optimal_bit_size(100, 10));
    }
}
