//! Headless plant runner for scripted training drills and CI verification.
//!
//! This crate drives the plant simulation without a cabinet front-end,
//! controlled via JSON commands on stdin, with plant state output on
//! stdout. This enables:
//!
//! - **Scripted drills**: Run a scenario's operator script end to end
//! - **CI verification**: Automated testing of plant logic and determinism
//! - **External controllers**: A trainer or test harness can operate the
//!   plant over the line protocol
//!
//! # Protocol
//!
//! Communication uses JSON lines (one JSON object per line):
//!
//! - **stdin**: Commands from the controller (tick, set_rod, set_valve, ...)
//! - **stdout**: State snapshots and responses (JSON)
//! - **stderr**: Debug logs (human-readable)
//!
//! See the [`protocol`] module for the full command/response specification.
//!
//! # Example
//!
//! ```bash
//! # Run interactively
//! echo '{"cmd":"tick","count":10}' | cargo run -p plant_headless
//!
//! # Run a built-in drill
//! cargo run -p plant_headless -- run --scenario coolant_loss
//!
//! # Verify determinism
//! cargo run -p plant_headless -- verify --scenario full_power --runs 5
//! ```

pub mod protocol;
pub mod runner;
pub mod scenario;

pub use protocol::{Command, PlantState, Response};
pub use runner::{HeadlessConfig, HeadlessRunner, Session};
pub use scenario::{Scenario, ScenarioError};
