//! Fixed-point math utilities for deterministic simulation.
//!
//! All simulation arithmetic uses fixed-point numbers to ensure
//! deterministic behavior across platforms. Floating-point
//! operations can produce different results on different CPUs.

use fixed::types::I32F32;

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
/// Range: approximately -2,147,483,648 to 2,147,483,647
/// Precision: approximately 0.00000000023
pub type Fixed = I32F32;

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

/// Multiply an integer quantity by a fixed-point multiplier,
/// rounding to the nearest integer.
///
/// This is the workhorse of the physical step functions: temperature
/// deltas, evaporation amounts and pressure derivation all scale an
/// integer volume or temperature by a fractional constant.
#[must_use]
pub fn scale_round(value: i32, multiplier: Fixed) -> i32 {
    (Fixed::from_num(value) * multiplier).round().to_num()
}

/// Multiply an integer quantity by a fixed-point multiplier,
/// rounding up to the next integer.
#[must_use]
pub fn scale_ceil(value: i32, multiplier: Fixed) -> i32 {
    (Fixed::from_num(value) * multiplier).ceil().to_num()
}

/// Scale an integer base by a percentage in [0, 100],
/// rounding to the nearest integer.
#[must_use]
pub fn percent_round(base: i32, percentage: i32) -> i32 {
    (Fixed::from_num(base) * Fixed::from_num(percentage) / Fixed::from_num(100))
        .round()
        .to_num()
}

/// Simple deterministic RNG for random-failure rolls.
///
/// Same inputs and seed always produce the same failure sequence,
/// which keeps full plant runs reproducible.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct FailureRng {
    state: u64,
}

impl FailureRng {
    /// Create a new RNG from a seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            state: seed.wrapping_add(0x9E37_79B9_7F4A_7C15),
        }
    }

    fn next(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(0x5_DEEC_E66D).wrapping_add(11);
        self.state
    }

    /// Next value uniformly distributed in [0, 1) as a fixed-point number.
    pub fn next_unit(&mut self) -> Fixed {
        Fixed::from_num((self.next() % 10_000) as i32) / Fixed::from_num(10_000)
    }

    /// Roll against a per-tick failure propensity in [0, 1].
    ///
    /// A zero propensity never fails, regardless of RNG state.
    pub fn roll(&mut self, chance: Fixed) -> bool {
        if chance <= Fixed::ZERO {
            return false;
        }
        self.next_unit() < chance
    }
}
