//! # Grain LFSR Parameter Generation
//!
//! Deterministic round-constant and MDS-matrix generation for the Poseidon
//! permutation, following the reference design's Grain-LFSR procedure: an
//! 80-bit register seeded from the permutation parameters, 160 warm-up
//! clocks, pairwise bit filtering, and rejection sampling into the field.
//!
//! The MDS matrix is the Cauchy construction `M[i][j] = 1 / (x_i + y_j)`
//! with `x_i = i`, `y_j = t + j`.
//!
//! Interoperability with circomlib-generated constants requires replacing
//! this module's output with the pinned canonical set; the permutation
//! structure is unaffected by such a swap.

use ark_bn254::Fr;
use ark_ff::{BigInt, BigInteger, Field, PrimeField};

/// Bit length of the BN254 scalar field.
const FIELD_BITS: usize = 254;

/// 80-bit LFSR from the Poseidon reference design.
pub struct GrainLfsr {
    state: [bool; 80],
}

impl GrainLfsr {
    /// Seed from permutation parameters: GF(p) field tag, x⁵ S-box,
    /// field size, state width `t`, full and partial round counts.
    #[must_use]
    pub fn new(t: usize, full_rounds: usize, partial_rounds: usize) -> Self {
        let mut bits = Vec::with_capacity(80);
        push_bits(&mut bits, 0b01, 2); // field: GF(p)
        push_bits(&mut bits, 0b0000, 4); // s-box: x^alpha
        push_bits(&mut bits, FIELD_BITS as u64, 12);
        push_bits(&mut bits, t as u64, 12);
        push_bits(&mut bits, full_rounds as u64, 10);
        push_bits(&mut bits, partial_rounds as u64, 10);
        push_bits(&mut bits, (1u64 << 30) - 1, 30); // padding: all ones

        let mut state = [false; 80];
        state.copy_from_slice(&bits);
        let mut lfsr = Self { state };
        for _ in 0..160 {
            lfsr.clock();
        }
        lfsr
    }

    fn clock(&mut self) -> bool {
        let new_bit = self.state[62]
            ^ self.state[51]
            ^ self.state[38]
            ^ self.state[23]
            ^ self.state[13]
            ^ self.state[0];
        self.state.rotate_left(1);
        self.state[79] = new_bit;
        new_bit
    }

    /// Pairwise-filtered output bit: a 1 selects the following bit.
    fn next_filtered_bit(&mut self) -> bool {
        loop {
            let select = self.clock();
            let candidate = self.clock();
            if select {
                return candidate;
            }
        }
    }

    /// Next field element via rejection sampling.
    pub fn next_field_element(&mut self) -> Fr {
        loop {
            let mut bits = Vec::with_capacity(FIELD_BITS);
            for _ in 0..FIELD_BITS {
                bits.push(self.next_filtered_bit());
            }
            let candidate: BigInt<4> = BigInt::from_bits_be(&bits);
            if let Some(element) = Fr::from_bigint(candidate) {
                return element;
            }
        }
    }
}

fn push_bits(bits: &mut Vec<bool>, value: u64, width: usize) {
    for i in (0..width).rev() {
        bits.push((value >> i) & 1 == 1);
    }
}

/// Round constants for a `t`-wide permutation: one per state element per
/// round, in round order.
#[must_use]
pub fn round_constants(t: usize, full_rounds: usize, partial_rounds: usize) -> Vec<Fr> {
    let mut lfsr = GrainLfsr::new(t, full_rounds, partial_rounds);
    let count = t * (full_rounds + partial_rounds);
    (0..count).map(|_| lfsr.next_field_element()).collect()
}

/// Cauchy MDS matrix `M[i][j] = 1 / (x_i + y_j)`.
#[must_use]
pub fn mds_matrix(t: usize) -> Vec<Vec<Fr>> {
    (0..t)
        .map(|i| {
            (0..t)
                .map(|j| {
                    let sum = Fr::from(i as u64) + Fr::from((t + j) as u64);
                    sum.inverse().expect("x_i + y_j is never zero")
                })
                .collect()
        })
        .collect()
}
