//! # Baby JubJub
//!
//! Twisted Edwards curve `a·x² + y² = 1 + d·x²·y²` over the BN254 scalar
//! field, with `a = 168700`, `d = 168696` and identity `(0, 1)`. All group
//! operations used by the homomorphic tally live here.
//!
//! ## Laws
//!
//! - `add(P, IDENTITY) = P`, `add(P, -P) = IDENTITY`
//! - addition is commutative and associative
//! - `scalar_mul(P, 0) = IDENTITY`, `scalar_mul(P, 1) = P`, and
//!   `scalar_mul(P, a + b) = add(scalar_mul(P, a), scalar_mul(P, b))`
//! - every result satisfies the curve equation

use ark_bn254::Fr;
use ark_ff::{BigInteger, Field, MontFp, PrimeField, Zero};
use shared_types::Bytes32;

/// Twisted Edwards coefficient `a`.
pub const EDWARDS_A: Fr = MontFp!("168700");
/// Twisted Edwards coefficient `d`.
pub const EDWARDS_D: Fr = MontFp!("168696");

/// A point on Baby JubJub in affine coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: Fr,
    pub y: Fr,
}

/// Error decoding a compressed point.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PointError {
    #[error("not a point on the curve")]
    NotOnCurve,
}

impl Point {
    /// The group identity `(0, 1)`.
    pub const IDENTITY: Self = Self {
        x: MontFp!("0"),
        y: MontFp!("1"),
    };

    /// The conventional generator (circomlib's `Base8`).
    pub const BASE: Self = Self {
        x: MontFp!("5299619240641551281634865583518297030282874472190772894086521144482721001553"),
        y: MontFp!("16950150798460657717958625567821834550301663161624707787222815936182638968203"),
    };

    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.x.is_zero() && self.y == Fr::ONE
    }

    /// Whether the affine pair satisfies the curve equation.
    #[must_use]
    pub fn is_on_curve(&self) -> bool {
        let x2 = self.x.square();
        let y2 = self.y.square();
        EDWARDS_A * x2 + y2 == Fr::ONE + EDWARDS_D * x2 * y2
    }

    /// Twisted Edwards addition (complete for Baby JubJub).
    #[must_use]
    pub fn add(&self, other: &Self) -> Self {
        let x1x2 = self.x * other.x;
        let y1y2 = self.y * other.y;
        let x1y2 = self.x * other.y;
        let y1x2 = self.y * other.x;
        let dxy = EDWARDS_D * x1x2 * y1y2;

        // Denominators are never zero on this curve: d is a non-square.
        let x = (x1y2 + y1x2) * (Fr::ONE + dxy).inverse().unwrap_or_default();
        let y = (y1y2 - EDWARDS_A * x1x2) * (Fr::ONE - dxy).inverse().unwrap_or_default();
        Self { x, y }
    }

    #[must_use]
    pub fn double(&self) -> Self {
        self.add(self)
    }

    /// Additive inverse `(-x, y)`.
    #[must_use]
    pub fn neg(&self) -> Self {
        Self {
            x: -self.x,
            y: self.y,
        }
    }

    /// `self ⊖ other`.
    #[must_use]
    pub fn sub(&self, other: &Self) -> Self {
        self.add(&other.neg())
    }

    /// Double-and-add scalar multiplication.
    #[must_use]
    pub fn scalar_mul(&self, scalar: &Fr) -> Self {
        let mut result = Self::IDENTITY;
        for bit in scalar.into_bigint().to_bits_be() {
            result = result.double();
            if bit {
                result = result.add(self);
            }
        }
        result
    }

    /// Compress to 32 bytes: big-endian `y` with the high bit carrying the
    /// sign of `x` (set when `x > (p−1)/2`).
    #[must_use]
    pub fn to_bytes(&self) -> Bytes32 {
        let mut out = crate::encoding::fr_to_bytes(&self.y);
        if self.x.into_bigint() > Fr::MODULUS_MINUS_ONE_DIV_TWO {
            out.0[0] |= 0x80;
        }
        out
    }

    /// Decompress; `Err` when the bytes name no curve point.
    pub fn from_bytes(bytes: &Bytes32) -> Result<Self, PointError> {
        let x_is_negative = bytes.0[0] & 0x80 != 0;
        let mut y_bytes = bytes.0;
        y_bytes[0] &= 0x7F;
        let y = Fr::from_be_bytes_mod_order(&y_bytes);

        // a·x² + y² = 1 + d·x²·y²  ⇒  x² = (1 − y²) / (a − d·y²)
        let y2 = y.square();
        let denominator = EDWARDS_A - EDWARDS_D * y2;
        let x2 = (Fr::ONE - y2) * denominator.inverse().ok_or(PointError::NotOnCurve)?;
        let mut x = x2.sqrt().ok_or(PointError::NotOnCurve)?;
        if (x.into_bigint() > Fr::MODULUS_MINUS_ONE_DIV_TWO) != x_is_negative {
            x = -x;
        }
        let point = Self { x, y };
        if point.is_on_curve() {
            Ok(point)
        } else {
            Err(PointError::NotOnCurve)
        }
    }
}
