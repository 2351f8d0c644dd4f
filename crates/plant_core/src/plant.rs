//! Plant: component ownership and the per-tick update sequence.
//!
//! The plant owns every component in typed collections built once at
//! construction from a [`PlantSpec`] manifest, so component kinds are
//! resolved exactly once and never rediscovered at runtime.
//!
//! # Tick ordering
//!
//! Producers run before consumers in the flow graph, as a hard correctness
//! requirement: the condenser reads the reactor's just-written output
//! within the same tick. Each [`step`](Plant::step) runs, in order:
//!
//! 1. Operator command validation (invalid input fails before any mutation)
//! 2. Reactor state update
//! 3. Steam routing through valves and pipes, in manifest order
//! 4. Condenser state update
//! 5. Failure sweep and idempotent registration
//! 6. Time-step accounting

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::components::{
    ComponentId, ComponentKind, CondenserInputs, DamageEvent, ReactorInputs,
};
use crate::condenser::{Condenser, CondenserConfig};
use crate::error::{PlantError, Result};
use crate::math::{fixed_serde, FailureRng, Fixed};
use crate::reactor::{Reactor, ReactorConfig};
use crate::routing::{ConnectorPipe, Valve};

/// Default cap on steam leaving the reactor per tick.
pub const MAX_STEAM_FLOW_RATE: i32 = 800;

/// A routing element on the steam path, declared in the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RouterSpec {
    /// A passive connector pipe.
    Pipe {
        /// Per-tick spontaneous failure probability, in [0, 1].
        #[serde(with = "fixed_serde")]
        random_failure_chance: Fixed,
    },
    /// An operator-controlled valve.
    Valve {
        /// Whether the valve starts open.
        open: bool,
        /// Maximum volume passed per tick.
        max_flow_rate: i32,
        /// Per-tick spontaneous failure probability, in [0, 1].
        #[serde(with = "fixed_serde")]
        random_failure_chance: Fixed,
    },
}

/// Construction manifest for a plant.
///
/// Components are declared up front with their kind tags; the plant builds
/// its typed collections from this once, at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlantSpec {
    /// Name of the operator running this plant.
    pub operator_name: String,
    /// Seed for the failure RNG; same seed and inputs reproduce a run.
    pub seed: u64,
    /// Cap on steam leaving the reactor per tick.
    pub max_steam_flow_rate: i32,
    /// Reactor configuration.
    pub reactor: ReactorConfig,
    /// Condenser configuration.
    pub condenser: CondenserConfig,
    /// Routing elements in path order, reactor towards condenser.
    pub routing: Vec<RouterSpec>,
}

impl Default for PlantSpec {
    fn default() -> Self {
        Self {
            operator_name: String::new(),
            seed: 0,
            max_steam_flow_rate: MAX_STEAM_FLOW_RATE,
            reactor: ReactorConfig::default(),
            condenser: CondenserConfig::default(),
            routing: vec![
                RouterSpec::Valve {
                    open: true,
                    max_flow_rate: MAX_STEAM_FLOW_RATE,
                    random_failure_chance: Fixed::ZERO,
                },
                RouterSpec::Pipe {
                    random_failure_chance: Fixed::ZERO,
                },
            ],
        }
    }
}

/// A routing component with its kind resolved at construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Router {
    /// Passive pipe.
    Pipe(ConnectorPipe),
    /// Operator-controlled valve.
    Valve(Valve),
}

impl Router {
    /// Component identifier.
    #[must_use]
    pub const fn id(&self) -> ComponentId {
        match self {
            Router::Pipe(pipe) => pipe.id(),
            Router::Valve(valve) => valve.id(),
        }
    }

    /// Kind tag.
    #[must_use]
    pub const fn kind(&self) -> ComponentKind {
        match self {
            Router::Pipe(_) => ComponentKind::ConnectorPipe,
            Router::Valve(_) => ComponentKind::Valve,
        }
    }
}

/// Per-tick operator inputs for the whole plant.
///
/// One record per tick; each field is consumed exactly once, which is what
/// makes the single-writer-per-tick discipline structural.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlantInputs {
    /// Control-rod insertion to apply before the tick, if any.
    pub rod_percentage: Option<i32>,
    /// Cool water pumped into the reactor this tick.
    pub water_pumped_in: i32,
    /// Condensate added to (positive) or drawn from (negative) the
    /// condenser this tick by the external feedwater path.
    pub condenser_water_delta: i32,
}

/// Events generated during one plant tick, for display and scoring.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Damage state transitions recorded this tick.
    pub damage_events: Vec<DamageEvent>,
    /// Components that newly failed this tick.
    pub failures: Vec<ComponentId>,
}

/// An entry in the in-memory high-score table.
///
/// Persistence of this table is the driver's concern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HighScore {
    /// Operator name.
    pub name: String,
    /// Final score.
    pub score: i32,
}

/// The plant: all components plus session bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Plant {
    operator_name: String,
    score: i32,
    time_steps_used: i32,
    max_steam_flow_rate: i32,
    reactor: Reactor,
    condenser: Condenser,
    routers: Vec<Router>,
    failed_components: BTreeSet<ComponentId>,
    high_scores: Vec<HighScore>,
    rng: FailureRng,
}

impl Plant {
    /// Build a plant from a manifest.
    ///
    /// Component IDs are assigned here: 1 for the reactor, 2 for the
    /// condenser, then the routing elements in path order.
    #[must_use]
    pub fn new(spec: PlantSpec) -> Self {
        let reactor = Reactor::new(ComponentId(1), spec.reactor);
        let condenser = Condenser::new(ComponentId(2), spec.condenser);

        let routers = spec
            .routing
            .iter()
            .zip(3u32..)
            .map(|(router, raw_id)| {
                let id = ComponentId(raw_id);
                match *router {
                    RouterSpec::Pipe {
                        random_failure_chance,
                    } => Router::Pipe(ConnectorPipe::new(id, random_failure_chance)),
                    RouterSpec::Valve {
                        open,
                        max_flow_rate,
                        random_failure_chance,
                    } => Router::Valve(Valve::new(id, open, max_flow_rate, random_failure_chance)),
                }
            })
            .collect();

        Self {
            operator_name: spec.operator_name,
            score: 0,
            time_steps_used: 0,
            max_steam_flow_rate: spec.max_steam_flow_rate,
            reactor,
            condenser,
            routers,
            failed_components: BTreeSet::new(),
            high_scores: Vec::new(),
            rng: FailureRng::new(spec.seed),
        }
    }

    /// Operator name.
    #[must_use]
    pub fn operator_name(&self) -> &str {
        &self.operator_name
    }

    /// Rename the operator.
    pub fn set_operator_name(&mut self, name: impl Into<String>) {
        self.operator_name = name.into();
    }

    /// Current score.
    #[must_use]
    pub const fn score(&self) -> i32 {
        self.score
    }

    /// Set the score. Scoring rules live in the driver.
    pub fn set_score(&mut self, score: i32) {
        self.score = score;
    }

    /// Time steps consumed so far.
    #[must_use]
    pub const fn time_steps_used(&self) -> i32 {
        self.time_steps_used
    }

    /// Advance the time-step counter.
    ///
    /// Non-positive increments are silently ignored, not an error.
    pub fn add_time_steps(&mut self, n: i32) {
        if n > 0 {
            self.time_steps_used += n;
        }
    }

    /// The reactor.
    #[must_use]
    pub const fn reactor(&self) -> &Reactor {
        &self.reactor
    }

    /// The condenser.
    #[must_use]
    pub const fn condenser(&self) -> &Condenser {
        &self.condenser
    }

    /// All valves, in path order.
    pub fn valves(&self) -> impl Iterator<Item = &Valve> {
        self.routers.iter().filter_map(|router| match router {
            Router::Valve(valve) => Some(valve),
            Router::Pipe(_) => None,
        })
    }

    /// All connector pipes, in path order.
    pub fn pipes(&self) -> impl Iterator<Item = &ConnectorPipe> {
        self.routers.iter().filter_map(|router| match router {
            Router::Pipe(pipe) => Some(pipe),
            Router::Valve(_) => None,
        })
    }

    /// Every component ID with its kind tag, in ID order.
    #[must_use]
    pub fn manifest(&self) -> Vec<(ComponentId, ComponentKind)> {
        let mut out = vec![
            (self.reactor.id(), ComponentKind::Reactor),
            (self.condenser.id(), ComponentKind::Condenser),
        ];
        out.extend(self.routers.iter().map(|router| (router.id(), router.kind())));
        out
    }

    /// Open or close a valve.
    ///
    /// # Errors
    ///
    /// Returns [`PlantError::ComponentNotFound`] if no component has the
    /// given ID, or [`PlantError::InvalidState`] if it is not a valve.
    pub fn set_valve_open(&mut self, id: ComponentId, open: bool) -> Result<()> {
        let router = self
            .routers
            .iter_mut()
            .find(|router| router.id() == id)
            .ok_or(PlantError::ComponentNotFound(id))?;
        match router {
            Router::Valve(valve) => {
                valve.set_open(open);
                Ok(())
            }
            Router::Pipe(_) => Err(PlantError::InvalidState(format!(
                "component {id} is not a valve"
            ))),
        }
    }

    /// Components that have failed, deduplicated, in ID order.
    #[must_use]
    pub const fn failed_components(&self) -> &BTreeSet<ComponentId> {
        &self.failed_components
    }

    /// Register a failed component.
    ///
    /// Idempotent: re-registering an already-failed component is a no-op.
    /// Returns true if the component was newly registered.
    pub fn register_failed(&mut self, id: ComponentId) -> bool {
        let newly_failed = self.failed_components.insert(id);
        if newly_failed {
            tracing::info!(component = %id, "component failed");
        }
        newly_failed
    }

    /// In-memory high-score table.
    #[must_use]
    pub fn high_scores(&self) -> &[HighScore] {
        &self.high_scores
    }

    /// Replace the high-score table, e.g. after the driver loads it.
    pub fn set_high_scores(&mut self, high_scores: Vec<HighScore>) {
        self.high_scores = high_scores;
    }

    /// Advance the whole plant by one tick.
    ///
    /// # Errors
    ///
    /// Returns [`PlantError::RodOutOfRange`] for an invalid rod command;
    /// no component state has been mutated in that case and the tick has
    /// not started.
    pub fn step(&mut self, inputs: PlantInputs) -> Result<TickReport> {
        // Operator commands are validated before the tick starts, so a
        // rejected command leaves the plant untouched.
        if let Some(percentage) = inputs.rod_percentage {
            self.reactor.set_rod_percentage(percentage)?;
        }

        self.condenser.update_water_volume(inputs.condenser_water_delta);

        let mut report = TickReport::default();

        // 1. The flow source.
        report.damage_events.extend(self.reactor.update_state(ReactorInputs {
            water_pumped_in: inputs.water_pumped_in,
        }));

        // 2. Routing. Only what actually reaches the condenser leaves the
        // reactor; steam refused by a closed or clamping valve stays put.
        let mut flow = self.reactor.offer_steam(self.max_steam_flow_rate);
        for router in &mut self.routers {
            flow = match router {
                Router::Pipe(pipe) => pipe.route(flow),
                Router::Valve(valve) => valve.route(flow),
            };
        }
        self.reactor.extract_steam(flow.volume);

        // 3. The flow sink reads this tick's delivered flow.
        report
            .damage_events
            .extend(self.condenser.update_state(CondenserInputs { steam_in: flow }));

        // 4. Failure sweep.
        self.run_failure_sweep(&mut report);

        self.add_time_steps(1);

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(
                tick = self.time_steps_used,
                state_hash = hash,
                "plant state hash"
            );
        }

        Ok(report)
    }

    fn run_failure_sweep(&mut self, report: &mut TickReport) {
        let mut failed = Vec::new();
        if self.reactor.check_failure(&mut self.rng) {
            failed.push(self.reactor.id());
        }
        if self.condenser.check_failure(&mut self.rng) {
            failed.push(self.condenser.id());
        }
        for router in &self.routers {
            let has_failed = match router {
                Router::Pipe(pipe) => pipe.check_failure(&mut self.rng),
                Router::Valve(valve) => valve.check_failure(&mut self.rng),
            };
            if has_failed {
                failed.push(router.id());
            }
        }

        for id in failed {
            if self.register_failed(id) {
                report.failures.push(id);
            }
        }
    }

    /// Calculate a hash of the current plant state.
    ///
    /// Two plants built from the same manifest and fed the same inputs
    /// produce identical hashes; used by the determinism harness.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }

    /// Serialize the plant state for snapshots.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| PlantError::InvalidState(format!("failed to serialize plant: {e}")))
    }

    /// Deserialize plant state from bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data)
            .map_err(|e| PlantError::InvalidState(format!("failed to deserialize plant: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plant() -> Plant {
        Plant::new(PlantSpec::default())
    }

    #[test]
    fn test_manifest_kinds_resolved_at_construction() {
        let plant = plant();
        let manifest = plant.manifest();
        assert_eq!(manifest.len(), 4);
        assert_eq!(manifest[0], (ComponentId(1), ComponentKind::Reactor));
        assert_eq!(manifest[1], (ComponentId(2), ComponentKind::Condenser));
        assert_eq!(manifest[2].1, ComponentKind::Valve);
        assert_eq!(manifest[3].1, ComponentKind::ConnectorPipe);
        assert_eq!(plant.valves().count(), 1);
        assert_eq!(plant.pipes().count(), 1);
    }

    #[test]
    fn test_invalid_rod_command_fails_before_tick() {
        let mut plant = plant();
        let err = plant.step(PlantInputs {
            rod_percentage: Some(150),
            ..PlantInputs::default()
        });
        assert!(err.is_err());
        // The tick never started: no state advanced.
        assert_eq!(plant.time_steps_used(), 0);
        assert_eq!(plant.reactor().temperature(), 0);
    }

    #[test]
    fn test_steam_reaches_condenser_same_tick() {
        let mut plant = plant();
        // Two full-power ticks: the reactor starts evaporating on tick 2
        // and the condenser receives that steam within the same tick.
        plant.step(PlantInputs::default()).unwrap();
        plant.step(PlantInputs::default()).unwrap();

        assert_eq!(plant.reactor().temperature(), 200);
        assert_eq!(plant.reactor().steam_volume(), 0);
        // 200 steam left the reactor and condensed into 100 water.
        assert_eq!(plant.condenser().water_volume(), 2100);
    }

    #[test]
    fn test_closed_valve_keeps_steam_in_reactor() {
        let mut plant = plant();
        let valve_id = plant.valves().next().unwrap().id();
        plant.set_valve_open(valve_id, false).unwrap();

        plant.step(PlantInputs::default()).unwrap();
        plant.step(PlantInputs::default()).unwrap();

        assert_eq!(plant.reactor().steam_volume(), 200);
        assert_eq!(plant.condenser().water_volume(), 2000);
    }

    #[test]
    fn test_steam_flow_capped_per_tick() {
        let mut plant = plant();
        // Heat the core long enough to bank more steam than the cap while
        // the valve is shut.
        let valve_id = plant.valves().next().unwrap().id();
        plant.set_valve_open(valve_id, false).unwrap();
        for _ in 0..10 {
            plant.step(PlantInputs::default()).unwrap();
        }
        let banked = plant.reactor().steam_volume();
        assert!(banked > MAX_STEAM_FLOW_RATE);

        plant.set_valve_open(valve_id, true).unwrap();
        let steam_before = plant.reactor().steam_volume();
        plant.step(PlantInputs::default()).unwrap();
        // Temperature reached 1100 this tick, evaporating 1100 new steam,
        // and exactly the cap left the reactor.
        assert_eq!(
            plant.reactor().steam_volume(),
            steam_before + 1100 - MAX_STEAM_FLOW_RATE
        );
    }

    #[test]
    fn test_register_failed_is_idempotent() {
        let mut plant = plant();
        let id = plant.reactor().id();
        assert!(plant.register_failed(id));
        assert!(!plant.register_failed(id));
        assert_eq!(plant.failed_components().len(), 1);
    }

    #[test]
    fn test_add_time_steps_ignores_non_positive() {
        let mut plant = plant();
        plant.add_time_steps(5);
        plant.add_time_steps(0);
        plant.add_time_steps(-3);
        assert_eq!(plant.time_steps_used(), 5);
    }

    #[test]
    fn test_set_valve_open_unknown_component() {
        let mut plant = plant();
        assert!(plant.set_valve_open(ComponentId(99), true).is_err());
        // The pipe is not a valve.
        let pipe_id = plant.pipes().next().unwrap().id();
        assert!(plant.set_valve_open(pipe_id, true).is_err());
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let mut plant = plant();
        plant.step(PlantInputs::default()).unwrap();
        plant.step(PlantInputs::default()).unwrap();

        let bytes = plant.serialize().unwrap();
        let restored = Plant::deserialize(&bytes).unwrap();
        assert_eq!(plant.state_hash(), restored.state_hash());
        assert_eq!(restored.time_steps_used(), 2);
    }

    #[test]
    fn test_same_seed_same_inputs_same_hash() {
        // The fixture comes from the dependency-graph instance of
        // plant_core, so use that instance's PlantInputs type.
        use plant_test_utils::plant_core::plant::PlantInputs;
        let mut a = plant_test_utils::fixtures::standard_plant();
        let mut b = plant_test_utils::fixtures::standard_plant();
        for tick in 0..50 {
            let inputs = PlantInputs {
                rod_percentage: Some((tick * 7) % 101),
                water_pumped_in: (tick % 5) * 100,
                condenser_water_delta: 0,
            };
            a.step(inputs).unwrap();
            b.step(inputs).unwrap();
        }
        assert_eq!(a.state_hash(), b.state_hash());
    }
}
