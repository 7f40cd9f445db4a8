//! Categorical value hashing.
//!
//! Categorical tokens are hashed with CityHash64 truncated to 32 bits, and
//! the hash is stored in the document's float factor slot by bit-preserving
//! reinterpretation. This keeps all factor storage a single numeric type;
//! border generation skips categorical factor indices, so the NaN-shaped bit
//! patterns a hash may produce never reach numeric code.

/// CityHash64 of the token's UTF-8 bytes, truncated to `i32`.
#[inline]
pub fn cat_feature_hash(token: &str) -> i32 {
    cityhasher::hash::<u64>(token.as_bytes()) as i32
}

/// Reinterpret a categorical hash as the float stored in a factor slot.
///
/// Exact round-trip with [`float_to_cat_hash`]: `to_bits`/`from_bits` are
/// bit-level casts, so every hash value survives unchanged.
#[inline]
pub fn cat_hash_to_float(hash: i32) -> f32 {
    f32::from_bits(hash as u32)
}

/// Recover the categorical hash from a factor slot.
#[inline]
pub fn float_to_cat_hash(value: f32) -> i32 {
    value.to_bits() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(cat_feature_hash("red"), cat_feature_hash("red"));
        assert_ne!(cat_feature_hash("red"), cat_feature_hash("blue"));
    }

    #[test]
    fn hash_matches_truncated_cityhash() {
        let token = "amsterdam";
        let full = cityhasher::hash::<u64>(token.as_bytes());
        assert_eq!(cat_feature_hash(token), full as i32);
    }

    #[test]
    fn float_round_trip_is_exact() {
        for hash in [0, 1, -1, i32::MIN, i32::MAX, 0x7fc0_0001, -0x0040_0001] {
            assert_eq!(float_to_cat_hash(cat_hash_to_float(hash)), hash);
        }
    }

    #[test]
    fn round_trips_nan_shaped_bit_patterns() {
        // Exponent all ones, non-zero mantissa: the float is a NaN but the
        // bits must still survive the trip through the factor slot.
        let hash = 0x7f80_0001u32 as i32;
        let value = cat_hash_to_float(hash);
        assert!(value.is_nan());
        assert_eq!(float_to_cat_hash(value), hash);
    }
}
