//! # Plant Core
//!
//! Deterministic simulation core for a nuclear power-plant operator
//! trainer: a network of physical components (reactor, condenser, pipes,
//! valves) that exchange water/steam flow and evolve temperature,
//! pressure, volume and structural health once per discrete time step.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No system randomness (failure rolls use a seeded RNG)
//! - No floating-point math (uses fixed-point)
//!
//! This separation enables:
//! - Headless drivers and scripted scenarios
//! - Reproducible runs for scoring and regression tests
//! - Snapshot save/restore
//!
//! ## Crate Structure
//!
//! - [`components`] - shared component data (flow, health, failure)
//! - [`reactor`] - heat source, control rod, evaporation
//! - [`condenser`] - steam sink, condensation, pressure derivation
//! - [`routing`] - connector pipes and valves
//! - [`plant`] - component ownership and the per-tick update sequence
//! - [`math`] - fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod components;
pub mod condenser;
pub mod error;
pub mod math;
pub mod plant;
pub mod reactor;
pub mod routing;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::components::{
        ComponentId, ComponentKind, CondenserInputs, DamageCause, DamageEvent, Flow, Health,
        OperationalStatus, ReactorInputs,
    };
    pub use crate::condenser::{Condenser, CondenserConfig};
    pub use crate::error::{PlantError, Result};
    pub use crate::math::{FailureRng, Fixed};
    pub use crate::plant::{
        HighScore, Plant, PlantInputs, PlantSpec, RouterSpec, TickReport, MAX_STEAM_FLOW_RATE,
    };
    pub use crate::reactor::{ControlRod, Reactor, ReactorConfig};
    pub use crate::routing::{ConnectorPipe, Valve};
}
