//! Hash functions for Bloom filter
//!
//! One 64-bit digest per element is split into two 32-bit halves and
//! combined k times (Kirsch-Mitzenmacher double hashing):
//!
//! ```text
//! index_i = widen(hash_a + hash_b * i) mod m      (+ and * wrap at 32 bits)
//! ```
//!
//! The digest function itself is pluggable through [`DigestHasher`].

use std::hash::Hasher;
use std::io::Cursor;

use fnv::FnvHasher;
use siphasher::sip::SipHasher13;

/// Source of the single 64-bit digest an element is hashed to
pub trait DigestHasher: Send + Sync {
    /// Hash `element` to 64 bits. Must be deterministic.
    fn digest(&self, element: &[u8]) -> u64;
}

/// MurmurHash3 (x64, 128-bit) truncated to its lower 64 bits
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Murmur3Hasher {
    seed: u32,
}

impl Murmur3Hasher {
    pub fn with_seed(seed: u32) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }
}

impl DigestHasher for Murmur3Hasher {
    fn digest(&self, element: &[u8]) -> u64 {
        let mut cursor = Cursor::new(element);
        // Reading from an in-memory slice cannot fail
        let hash = murmur3::murmur3_x64_128(&mut cursor, self.seed).unwrap_or(0);
        hash as u64
    }
}

/// SipHash-1-3 keyed with two fixed 64-bit keys
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SipDigestHasher {
    key0: u64,
    key1: u64,
}

impl SipDigestHasher {
    pub fn new(key0: u64, key1: u64) -> Self {
        Self { key0, key1 }
    }
}

impl DigestHasher for SipDigestHasher {
    fn digest(&self, element: &[u8]) -> u64 {
        let mut hasher = SipHasher13::new_with_keys(self.key0, self.key1);
        hasher.write(element);
        hasher.finish()
    }
}

/// 64-bit FNV-1a
///
/// Reproduces the classic filter layout bit for bit when paired with the
/// 32-bit index derivation below.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Fnv1aHasher;

impl DigestHasher for Fnv1aHasher {
    fn digest(&self, element: &[u8]) -> u64 {
        let mut hasher = FnvHasher::default();
        hasher.write(element);
        hasher.finish()
    }
}

/// Split a digest into `(hash_a, hash_b)`: low and high 32 bits
#[inline]
pub fn split_digest(digest: u64) -> (u32, u32) {
    (digest as u32, (digest >> 32) as u32)
}

/// Iterator over the k bit indices derived from one digest
#[derive(Clone, Debug)]
pub struct HashPositions {
    hash_a: u32,
    hash_b: u32,
    bit_size: u64,
    next: u32,
    num_hashes: u32,
}

impl Iterator for HashPositions {
    type Item = u64;

    #[inline]
    fn next(&mut self) -> Option<u64> {
        if self.next >= self.num_hashes {
            return None;
        }
        let combined = self.hash_a.wrapping_add(self.hash_b.wrapping_mul(self.next));
        self.next += 1;
        Some(u64::from(combined) % self.bit_size)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.num_hashes - self.next) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for HashPositions {}

/// Compute the `num_hashes` positions for a digest in a filter of
/// `bit_size` bits
///
/// `bit_size` must be non-zero.
pub fn hash_positions(digest: u64, num_hashes: u32, bit_size: u64) -> HashPositions {
    let (hash_a, hash_b) = split_digest(digest);
    HashPositions {
        hash_a,
        hash_b,
        bit_size,
        next: 0,
        num_hashes,
    }
}

/// Hash `element` and compute its positions
pub fn compute_hash_positions<H: DigestHasher + ?Sized>(
    hasher: &H,
    element: &[u8],
    num_hashes: u32,
    bit_size: u64,
) -> HashPositions {
    hash_positions(hasher.digest(element), num_hashes, bit_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_murmur3_digest_deterministic() {
        let hasher = Murmur3Hasher::default();
        let element = b"test_element_0xABCD";

        assert_eq!(
            hasher.digest(element),
            hasher.digest(element),
            "Same input must produce same digest"
        );
    }

    #[test]
    fn test_murmur3_different_seed_different_output() {
        let element = b"test_element_0xABCD";

        assert_ne!(
            Murmur3Hasher::with_seed(0).digest(element),
            Murmur3Hasher::with_seed(1).digest(element),
            "Different seeds must produce different digests"
        );
    }

    #[test]
    fn test_siphash_keys_change_output() {
        let element = b"test_element_0xABCD";

        assert_ne!(
            SipDigestHasher::new(0, 0).digest(element),
            SipDigestHasher::new(1, 2).digest(element)
        );
    }

    #[test]
    fn test_fnv1a_known_digests() {
        // Offset basis for empty input
        assert_eq!(Fnv1aHasher.digest(b""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(Fnv1aHasher.digest(b"alpha"), 0x8ac6_25bb_85ed_202b);
    }

    #[test]
    fn test_fnv1a_alpha_positions() {
        let positions: Vec<u64> = compute_hash_positions(&Fnv1aHasher, b"alpha", 9, 1438).collect();
        assert_eq!(positions, vec![483, 60, 301, 1316, 119, 1134, 1375, 952, 1193]);
    }

    #[test]
    fn test_digest_is_order_sensitive() {
        let hasher = Murmur3Hasher::default();
        assert_ne!(hasher.digest(b"ab"), hasher.digest(b"ba"));
    }

    #[test]
    fn test_empty_input_hashes() {
        let positions: Vec<u64> =
            compute_hash_positions(&Murmur3Hasher::default(), b"", 7, 1000).collect();
        assert_eq!(positions.len(), 7);
        assert!(positions.iter().all(|&p| p < 1000));
    }

    #[test]
    fn test_split_digest_halves() {
        let (a, b) = split_digest(0x1122_3344_5566_7788);
        assert_eq!(a, 0x5566_7788);
        assert_eq!(b, 0x1122_3344);
    }

    #[test]
    fn test_positions_follow_double_hashing() {
        let digest = 0x0000_0003_0000_0005u64; // hash_a = 5, hash_b = 3
        let positions: Vec<u64> = hash_positions(digest, 4, 1000).collect();
        assert_eq!(positions, vec![5, 8, 11, 14]);
    }

    #[test]
    fn test_positions_wrap_at_32_bits_before_modulo() {
        // hash_a + hash_b * 1 overflows u32 and wraps to 1
        let digest = (u64::from(u32::MAX) << 32) | 2;
        let positions: Vec<u64> = hash_positions(digest, 2, 1 << 40).collect();
        assert_eq!(positions, vec![2, 1]);
    }

    #[test]
    fn test_zero_hashes_yield_nothing() {
        assert_eq!(hash_positions(42, 0, 100).count(), 0);
    }

    #[test]
    fn test_multiple_hash_functions_independent() {
        let hasher = Murmur3Hasher::default();
        let m = 10_000;
        let positions: Vec<u64> =
            compute_hash_positions(&hasher, b"test_element_0xABCD", 7, m).collect();

        assert_eq!(positions.len(), 7, "Should produce k positions");
        for pos in &positions {
            assert!(*pos < m, "Position {} should be < m={}", pos, m);
        }

        let unique: std::collections::HashSet<_> = positions.iter().collect();
        assert!(
            unique.len() >= 3,
            "Hash functions should produce varied positions"
        );
    }

    #[test]
    fn test_hash_uniformity() {
        let hasher = Murmur3Hasher::default();
        let m = 1000;
        let k = 7;
        let mut counts = vec![0usize; 10];

        for i in 0..1000 {
            let element = format!("element_{}", i);
            for pos in compute_hash_positions(&hasher, element.as_bytes(), k, m) {
                counts[(pos / 100) as usize] += 1;
            }
        }

        // Each bucket should have roughly 1000*7/10 = 700 entries
        let expected = 700;
        let min_acceptable = expected / 2;
        let max_acceptable = expected * 3 / 2;

        for (i, count) in counts.iter().enumerate() {
            assert!(
                *count >= min_acceptable && *count <= max_acceptable,
                "Bucket {} has {} entries, expected ~{}",
                i,
                count,
                expected
            );
        }
    }
}
