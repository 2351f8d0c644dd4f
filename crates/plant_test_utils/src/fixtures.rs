//! Test fixtures and helpers.
//!
//! Pre-built plant configurations for consistent testing.

use fixed::types::I32F32;

use plant_core::plant::{Plant, PlantSpec};

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// The standard training plant: reactor, open valve, connector pipe,
/// condenser, with the original simulator's default constants and seed 0.
#[must_use]
pub fn standard_spec() -> PlantSpec {
    PlantSpec {
        operator_name: "trainee".to_string(),
        ..PlantSpec::default()
    }
}

/// Build the standard training plant.
#[must_use]
pub fn standard_plant() -> Plant {
    Plant::new(standard_spec())
}
