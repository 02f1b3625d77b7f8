//! # Field Encoding
//!
//! Conversions between wire-level 32-byte values and BN254 scalar field
//! elements. Inputs are canonicalised modulo the field prime; outputs are
//! big-endian and always fit 32 bytes.

use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};
use shared_types::Bytes32;

/// Interpret 32 bytes as a field element, reducing mod p.
#[must_use]
pub fn fr_from_bytes(bytes: &Bytes32) -> Fr {
    Fr::from_be_bytes_mod_order(bytes.as_bytes())
}

/// Interpret a 16-byte identifier as a field element.
#[must_use]
pub fn fr_from_id(bytes: &[u8; 16]) -> Fr {
    Fr::from_be_bytes_mod_order(bytes)
}

/// Canonical big-endian encoding of a field element.
#[must_use]
pub fn fr_to_bytes(value: &Fr) -> Bytes32 {
    let bytes = value.into_bigint().to_bytes_be();
    let mut out = [0u8; 32];
    out[32 - bytes.len()..].copy_from_slice(&bytes);
    Bytes32(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ff::{One, Zero};

    #[test]
    fn test_round_trip() {
        let value = Fr::from(123_456_789u64);
        assert_eq!(fr_from_bytes(&fr_to_bytes(&value)), value);
    }

    #[test]
    fn test_zero_and_one() {
        assert_eq!(fr_to_bytes(&Fr::zero()), Bytes32::ZERO);
        let one = fr_to_bytes(&Fr::one());
        assert_eq!(one.0[31], 1);
        assert_eq!(fr_from_bytes(&one), Fr::one());
    }

    #[test]
    fn test_oversized_input_is_reduced() {
        // All-ones is larger than the modulus; reduction must not panic
        // and must round-trip to a canonical encoding.
        let big = Bytes32([0xFF; 32]);
        let reduced = fr_from_bytes(&big);
        let canonical = fr_to_bytes(&reduced);
        assert_eq!(fr_from_bytes(&canonical), reduced);
        assert_ne!(canonical, big);
    }
}
