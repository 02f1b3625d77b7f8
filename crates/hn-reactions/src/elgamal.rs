//! # Homomorphic ElGamal Ciphertexts
//!
//! Each reaction vote is six ElGamal ciphertexts on Baby JubJub, one per
//! emoji slot. Ciphertexts add componentwise, so the stored tally is the
//! encryption of the componentwise sum of every current vote.

use crate::curve::{Point, PointError};
use crate::encoding::{fr_from_bytes, fr_to_bytes};
use shared_types::{Bytes32, DomainError, TallyCiphertexts, EMOJI_SLOTS};

/// One ElGamal ciphertext: an ordered pair of curve points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ciphertext {
    pub c1: Point,
    pub c2: Point,
}

impl Ciphertext {
    /// The encryption of zero under any key.
    pub const NEUTRAL: Self = Self {
        c1: Point::IDENTITY,
        c2: Point::IDENTITY,
    };

    /// Homomorphic addition.
    #[must_use]
    pub fn add(&self, other: &Self) -> Self {
        Self {
            c1: self.c1.add(&other.c1),
            c2: self.c2.add(&other.c2),
        }
    }

    /// Homomorphic subtraction.
    #[must_use]
    pub fn sub(&self, other: &Self) -> Self {
        Self {
            c1: self.c1.sub(&other.c1),
            c2: self.c2.sub(&other.c2),
        }
    }
}

/// The six per-slot ciphertexts of one vote or one stored tally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteCiphertexts(pub [Ciphertext; EMOJI_SLOTS]);

impl VoteCiphertexts {
    /// Six encryptions of zero.
    #[must_use]
    pub fn neutral() -> Self {
        Self([Ciphertext::NEUTRAL; EMOJI_SLOTS])
    }

    /// Componentwise `self ⊕ other`.
    #[must_use]
    pub fn add(&self, other: &Self) -> Self {
        let mut slots = self.0;
        for (slot, rhs) in slots.iter_mut().zip(other.0.iter()) {
            *slot = slot.add(rhs);
        }
        Self(slots)
    }

    /// Componentwise `self ⊖ other`.
    #[must_use]
    pub fn sub(&self, other: &Self) -> Self {
        let mut slots = self.0;
        for (slot, rhs) in slots.iter_mut().zip(other.0.iter()) {
            *slot = slot.sub(rhs);
        }
        Self(slots)
    }

    /// Whether every point of every slot satisfies the curve equation.
    #[must_use]
    pub fn is_on_curve(&self) -> bool {
        self.0
            .iter()
            .all(|ct| ct.c1.is_on_curve() && ct.c2.is_on_curve())
    }

    /// Encode as the persisted coordinate-array layout.
    #[must_use]
    pub fn to_stored(&self) -> TallyCiphertexts {
        let mut stored = TallyCiphertexts {
            c1_x: [Bytes32::ZERO; EMOJI_SLOTS],
            c1_y: [Bytes32::ZERO; EMOJI_SLOTS],
            c2_x: [Bytes32::ZERO; EMOJI_SLOTS],
            c2_y: [Bytes32::ZERO; EMOJI_SLOTS],
        };
        for (i, ct) in self.0.iter().enumerate() {
            stored.c1_x[i] = fr_to_bytes(&ct.c1.x);
            stored.c1_y[i] = fr_to_bytes(&ct.c1.y);
            stored.c2_x[i] = fr_to_bytes(&ct.c2.x);
            stored.c2_y[i] = fr_to_bytes(&ct.c2.y);
        }
        stored
    }

    /// Decode from the persisted layout, checking curve membership.
    pub fn from_stored(stored: &TallyCiphertexts) -> Result<Self, DomainError> {
        let mut slots = [Ciphertext::NEUTRAL; EMOJI_SLOTS];
        for i in 0..EMOJI_SLOTS {
            let c1 = Point {
                x: fr_from_bytes(&stored.c1_x[i]),
                y: fr_from_bytes(&stored.c1_y[i]),
            };
            let c2 = Point {
                x: fr_from_bytes(&stored.c2_x[i]),
                y: fr_from_bytes(&stored.c2_y[i]),
            };
            if !c1.is_on_curve() || !c2.is_on_curve() {
                return Err(DomainError::MalformedPayload(
                    PointError::NotOnCurve.to_string(),
                ));
            }
            slots[i] = Ciphertext { c1, c2 };
        }
        Ok(Self(slots))
    }
}
