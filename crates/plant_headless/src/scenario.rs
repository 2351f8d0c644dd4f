//! Scenario loading and configuration.
//!
//! Scenarios define a plant manifest plus a scripted sequence of operator
//! inputs, one record per tick. They drive headless training drills and
//! determinism verification.

use std::path::Path;

use plant_core::plant::{PlantInputs, PlantSpec};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
}

/// A complete scenario configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Plant manifest to build.
    pub plant: PlantSpec,
    /// Scripted operator inputs, one record per tick.
    pub script: Vec<PlantInputs>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::full_power()
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError`] when the file is missing, unreadable, or
    /// not valid RON.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        let scenario: Scenario = ron::from_str(&contents)?;
        Ok(scenario)
    }

    /// Load from a RON string (useful for embedded scenarios).
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::ParseError`] for invalid RON.
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// Resolve a built-in scenario name, or load a RON file at that path.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError`] when the name is not built in and the
    /// path does not load.
    pub fn resolve(name_or_path: &str) -> Result<Self, ScenarioError> {
        match name_or_path {
            "full_power" => Ok(Self::full_power()),
            "coolant_loss" => Ok(Self::coolant_loss()),
            path => Self::load(path),
        }
    }

    /// Steady full-power drill: rods fully inserted, with enough feedwater
    /// pumped each tick to hold the core temperature in band.
    #[must_use]
    pub fn full_power() -> Self {
        let tick = PlantInputs {
            rod_percentage: Some(100),
            water_pumped_in: 1000,
            condenser_water_delta: 0,
        };
        Self {
            name: "Full Power Run".to_string(),
            description: "Hold full rod insertion with balancing feedwater; \
                          the plant should finish the drill undamaged"
                .to_string(),
            plant: PlantSpec {
                operator_name: "trainee".to_string(),
                ..PlantSpec::default()
            },
            script: vec![tick; 120],
        }
    }

    /// Loss-of-coolant drill: rods fully inserted with no feedwater. The
    /// core overheats, damages, and eventually fails.
    #[must_use]
    pub fn coolant_loss() -> Self {
        Self {
            name: "Loss of Coolant".to_string(),
            description: "No feedwater at full rod insertion; demonstrates \
                          the over-temperature damage cascade"
                .to_string(),
            plant: PlantSpec {
                operator_name: "trainee".to_string(),
                ..PlantSpec::default()
            },
            script: vec![PlantInputs::default(); 300],
        }
    }
}
