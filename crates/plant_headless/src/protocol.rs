//! JSON protocol for headless plant communication.
//!
//! The headless runner communicates via JSON lines (one JSON object per line):
//!
//! **Input (stdin):** Operator commands from the controller
//! **Output (stdout):** Plant state updates and responses
//!
//! # Protocol Flow
//!
//! 1. Runner starts, outputs `{"type":"ready","version":"1.0"}`
//! 2. Controller sends commands as JSON lines
//! 3. Runner outputs a state snapshot after each tick (or on `query`)
//! 4. On `quit`, outputs `{"type":"bye"}` and exits
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","version":"1.0","tick":0}
//! -> {"cmd":"set_rod","percentage":40}
//! <- {"type":"ack","cmd":"set_rod"}
//! -> {"cmd":"tick","count":10,"water_pumped_in":250}
//! <- {"type":"state","tick":10,"reactor":{...},"condenser":{...},...}
//! -> {"cmd":"set_valve","id":3,"open":false}
//! <- {"type":"ack","cmd":"set_valve"}
//! -> {"cmd":"hash"}
//! <- {"type":"state_hash","tick":10,"hash":1234567890}
//! ```

use plant_core::components::ComponentKind;
use plant_core::plant::Plant;
use serde::{Deserialize, Serialize};

// ============================================================================
// Input Commands (Controller -> Runner)
// ============================================================================

/// Commands that can be sent to the headless runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Advance the simulation by N ticks (default: 1), with per-tick
    /// operator inputs held constant across them.
    Tick {
        /// Ticks to advance.
        #[serde(default = "default_tick_count")]
        count: u32,
        /// Cool water pumped into the reactor each tick.
        #[serde(default)]
        water_pumped_in: i32,
        /// Water added to or drawn from the condenser each tick.
        #[serde(default)]
        condenser_water_delta: i32,
    },

    /// Query current plant state without advancing time.
    Query,

    /// Set control rod insertion for subsequent ticks.
    SetRod {
        /// Insertion percentage in [0, 100].
        percentage: i32,
    },

    /// Open or close a valve.
    SetValve {
        /// Component ID of the valve.
        id: u32,
        /// New position.
        open: bool,
    },

    /// List every component with its kind tag.
    Manifest,

    /// Report the current state hash (for determinism verification).
    Hash,

    /// Quit the session.
    Quit,
}

fn default_tick_count() -> u32 {
    1
}

// ============================================================================
// Output Responses (Runner -> Controller)
// ============================================================================

/// Responses sent from the headless runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Runner is ready to accept commands.
    Ready {
        /// Protocol version.
        version: String,
        /// Current tick.
        tick: i32,
    },

    /// Acknowledgment of a command.
    Ack {
        /// Name of the acknowledged command.
        cmd: String,
    },

    /// Error processing a command.
    Error {
        /// What went wrong.
        message: String,
        /// Command that failed, if known.
        cmd: Option<String>,
    },

    /// Current plant state.
    State(PlantState),

    /// Component manifest.
    Manifest {
        /// Every component ID with its kind, in ID order.
        components: Vec<ComponentEntry>,
    },

    /// State hash for determinism verification.
    StateHash {
        /// Current tick.
        tick: i32,
        /// Hash of the full plant state.
        hash: u64,
    },

    /// Goodbye message before shutdown.
    Bye,
}

// ============================================================================
// State Types
// ============================================================================

/// One component in the manifest listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentEntry {
    /// Component ID.
    pub id: u32,
    /// Kind tag.
    pub kind: String,
}

/// Snapshot of the whole plant for one response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlantState {
    /// Time steps consumed so far.
    pub tick: i32,
    /// Reactor snapshot.
    pub reactor: VesselState,
    /// Condenser snapshot.
    pub condenser: VesselState,
    /// Valve snapshots, in path order.
    pub valves: Vec<ValveState>,
    /// IDs of components that have failed.
    pub failed_components: Vec<u32>,
    /// Hash of the full plant state.
    pub hash: u64,
}

/// Snapshot of a heat vessel (reactor or condenser).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VesselState {
    /// Component ID.
    pub id: u32,
    /// Temperature in degrees.
    pub temperature: i32,
    /// Pressure.
    pub pressure: i32,
    /// Liquid water volume.
    pub water_volume: i32,
    /// Steam volume.
    pub steam_volume: i32,
    /// Health snapshot.
    pub health: HealthState,
    /// Whether the component is still operational.
    pub operational: bool,
}

/// Snapshot of a valve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValveState {
    /// Component ID.
    pub id: u32,
    /// Whether the valve is open.
    pub open: bool,
    /// Maximum volume passed per tick.
    pub max_flow_rate: i32,
    /// Volume that passed last tick.
    pub flow_out: i32,
}

/// Health snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthState {
    /// Current health.
    pub current: i32,
    /// Maximum health.
    pub max: i32,
}

impl PlantState {
    /// Build a snapshot from the live plant.
    #[must_use]
    pub fn capture(plant: &Plant) -> Self {
        let reactor = plant.reactor();
        let condenser = plant.condenser();
        Self {
            tick: plant.time_steps_used(),
            reactor: VesselState {
                id: reactor.id().0,
                temperature: reactor.temperature(),
                pressure: reactor.pressure(),
                water_volume: reactor.water_volume(),
                steam_volume: reactor.steam_volume(),
                health: HealthState {
                    current: reactor.health().current,
                    max: reactor.health().max,
                },
                operational: reactor.status().operational,
            },
            condenser: VesselState {
                id: condenser.id().0,
                temperature: condenser.temperature(),
                pressure: condenser.pressure(),
                water_volume: condenser.water_volume(),
                steam_volume: condenser.steam_volume(),
                health: HealthState {
                    current: condenser.health().current,
                    max: condenser.health().max,
                },
                operational: condenser.status().operational,
            },
            valves: plant
                .valves()
                .map(|valve| ValveState {
                    id: valve.id().0,
                    open: valve.is_open(),
                    max_flow_rate: valve.max_flow_rate(),
                    flow_out: valve.flow_out().volume,
                })
                .collect(),
            failed_components: plant.failed_components().iter().map(|id| id.0).collect(),
            hash: plant.state_hash(),
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

impl Response {
    /// Create a ready response.
    #[must_use]
    pub fn ready(tick: i32) -> Self {
        Self::Ready {
            version: "1.0".to_string(),
            tick,
        }
    }

    /// Create an acknowledgment.
    #[must_use]
    pub fn ack(cmd: &str) -> Self {
        Self::Ack {
            cmd: cmd.to_string(),
        }
    }

    /// Create an error response.
    pub fn error(message: impl Into<String>, cmd: Option<&str>) -> Self {
        Self::Error {
            message: message.into(),
            cmd: cmd.map(String::from),
        }
    }

    /// Build a manifest response from the live plant.
    #[must_use]
    pub fn manifest(plant: &Plant) -> Self {
        Self::Manifest {
            components: plant
                .manifest()
                .into_iter()
                .map(|(id, kind)| ComponentEntry {
                    id: id.0,
                    kind: kind_name(kind).to_string(),
                })
                .collect(),
        }
    }

    /// Serialize to a JSON line (with newline).
    #[must_use]
    pub fn to_json_line(&self) -> String {
        let mut json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","message":"Serialization failed: {e}"}}"#)
        });
        json.push('\n');
        json
    }
}

fn kind_name(kind: ComponentKind) -> &'static str {
    match kind {
        ComponentKind::Reactor => "reactor",
        ComponentKind::Condenser => "condenser",
        ComponentKind::Valve => "valve",
        ComponentKind::ConnectorPipe => "connector_pipe",
    }
}

impl Command {
    /// Parse from a JSON line.
    ///
    /// # Errors
    ///
    /// Returns the underlying parse error for malformed input.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Get the command name for acknowledgment.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tick { .. } => "tick",
            Self::Query => "query",
            Self::SetRod { .. } => "set_rod",
            Self::SetValve { .. } => "set_valve",
            Self::Manifest => "manifest",
            Self::Hash => "hash",
            Self::Quit => "quit",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plant_core::plant::{Plant, PlantSpec};

    #[test]
    fn test_parse_tick_command() {
        let json = r#"{"cmd":"tick","count":60,"water_pumped_in":250}"#;
        let cmd = Command::from_json(json).unwrap();
        assert!(matches!(
            cmd,
            Command::Tick {
                count: 60,
                water_pumped_in: 250,
                condenser_water_delta: 0,
            }
        ));
    }

    #[test]
    fn test_default_tick_count() {
        let json = r#"{"cmd":"tick"}"#;
        let cmd = Command::from_json(json).unwrap();
        assert!(matches!(cmd, Command::Tick { count: 1, .. }));
    }

    #[test]
    fn test_parse_set_rod_command() {
        let json = r#"{"cmd":"set_rod","percentage":40}"#;
        let cmd = Command::from_json(json).unwrap();
        assert!(matches!(cmd, Command::SetRod { percentage: 40 }));
    }

    #[test]
    fn test_serialize_state_response() {
        let plant = Plant::new(PlantSpec::default());
        let resp = Response::State(PlantState::capture(&plant));
        let json = resp.to_json_line();
        assert!(json.contains(r#""type":"state""#));
        assert!(json.contains(r#""tick":0"#));
        assert!(json.contains(r#""water_volume":8000"#));
    }

    #[test]
    fn test_manifest_response_names_kinds() {
        let plant = Plant::new(PlantSpec::default());
        let json = Response::manifest(&plant).to_json_line();
        assert!(json.contains(r#""kind":"reactor""#));
        assert!(json.contains(r#""kind":"valve""#));
        assert!(json.contains(r#""kind":"connector_pipe""#));
    }
}
