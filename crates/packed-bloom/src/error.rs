//! Error types for the packed Bloom filter

use thiserror::Error;

/// Errors raised while configuring or combining filters
///
/// `add` and `check` never fail; every variant here comes from
/// construction, configuration validation or `union`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("Invalid capacity: {capacity} (must be greater than 0)")]
    InvalidCapacity { capacity: usize },

    #[error("Invalid false positive denominator: {denominator} (must be greater than 1)")]
    InvalidDenominator { denominator: u64 },

    #[error("Filter size exceeds maximum: {size} > {max} bits")]
    FilterTooLarge { size: u64, max: u64 },

    #[error("Incompatible filters: {reason}")]
    IncompatibleFilters { reason: String },

    #[error("Invalid filter parameters: {0}")]
    InvalidParameters(String),
}
