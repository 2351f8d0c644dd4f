//! Flow routers between components: connector pipes and valves.
//!
//! Routers honor the flow contract: after routing, their output accessor
//! reports a volume and temperature consistent with what actually passed
//! through them this tick. Steam a closed or clamping valve refuses stays
//! with the producer; the plant handles that bookkeeping.

use serde::{Deserialize, Serialize};

use crate::components::{ComponentId, FailureProfile, Flow, Health, OperationalStatus};
use crate::math::{FailureRng, Fixed};

/// A passive flow router connecting two components.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectorPipe {
    id: ComponentId,
    flow_out: Flow,
    health: Health,
    status: OperationalStatus,
    failure: FailureProfile,
}

impl ConnectorPipe {
    /// Create a pipe with the given spontaneous failure propensity.
    #[must_use]
    pub fn new(id: ComponentId, random_failure_chance: Fixed) -> Self {
        Self {
            id,
            flow_out: Flow::NONE,
            health: Health::new(100),
            status: OperationalStatus::new(true, false),
            failure: FailureProfile::with_chance(random_failure_chance),
        }
    }

    /// Component identifier.
    #[must_use]
    pub const fn id(&self) -> ComponentId {
        self.id
    }

    /// Pass the inbound flow through unchanged.
    pub fn route(&mut self, flow_in: Flow) -> Flow {
        self.flow_out = flow_in;
        self.flow_out
    }

    /// The flow that passed through this tick.
    #[must_use]
    pub const fn flow_out(&self) -> Flow {
        self.flow_out
    }

    /// Current health.
    #[must_use]
    pub const fn health(&self) -> Health {
        self.health
    }

    /// Operational and pressurization flags.
    #[must_use]
    pub const fn status(&self) -> OperationalStatus {
        self.status
    }

    /// Run the failure check.
    pub fn check_failure(&self, rng: &mut FailureRng) -> bool {
        self.failure.check_failure(&self.health, rng)
    }
}

/// An operator-controlled flow router.
///
/// Open, it passes the inbound flow clamped to its maximum rate; closed,
/// it passes nothing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Valve {
    id: ComponentId,
    open: bool,
    max_flow_rate: i32,
    flow_out: Flow,
    health: Health,
    status: OperationalStatus,
    failure: FailureProfile,
}

impl Valve {
    /// Create a valve.
    #[must_use]
    pub fn new(id: ComponentId, open: bool, max_flow_rate: i32, random_failure_chance: Fixed) -> Self {
        Self {
            id,
            open,
            max_flow_rate,
            flow_out: Flow::NONE,
            health: Health::new(100),
            status: OperationalStatus::new(true, false),
            failure: FailureProfile::with_chance(random_failure_chance),
        }
    }

    /// Component identifier.
    #[must_use]
    pub const fn id(&self) -> ComponentId {
        self.id
    }

    /// Whether the valve is open.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.open
    }

    /// Open or close the valve. Takes effect on the next routing pass.
    pub fn set_open(&mut self, open: bool) {
        self.open = open;
    }

    /// Maximum volume this valve passes per tick.
    #[must_use]
    pub const fn max_flow_rate(&self) -> i32 {
        self.max_flow_rate
    }

    /// Route the inbound flow through the valve.
    ///
    /// Returns what passed; the refused remainder is
    /// `flow_in.volume - passed.volume`.
    pub fn route(&mut self, flow_in: Flow) -> Flow {
        self.flow_out = if self.open {
            Flow::new(flow_in.volume.min(self.max_flow_rate), flow_in.temperature)
        } else {
            Flow::NONE
        };
        self.flow_out
    }

    /// The flow that passed through this tick.
    #[must_use]
    pub const fn flow_out(&self) -> Flow {
        self.flow_out
    }

    /// Current health.
    #[must_use]
    pub const fn health(&self) -> Health {
        self.health
    }

    /// Operational and pressurization flags.
    #[must_use]
    pub const fn status(&self) -> OperationalStatus {
        self.status
    }

    /// Run the failure check.
    pub fn check_failure(&self, rng: &mut FailureRng) -> bool {
        self.failure.check_failure(&self.health, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipe_passes_flow_unchanged() {
        let mut pipe = ConnectorPipe::new(ComponentId(3), Fixed::ZERO);
        let flow = Flow::new(250, 180);
        assert_eq!(pipe.route(flow), flow);
        assert_eq!(pipe.flow_out(), flow);
    }

    #[test]
    fn test_closed_valve_blocks() {
        let mut valve = Valve::new(ComponentId(4), false, 800, Fixed::ZERO);
        assert_eq!(valve.route(Flow::new(500, 200)), Flow::NONE);
        assert_eq!(valve.flow_out(), Flow::NONE);
    }

    #[test]
    fn test_open_valve_clamps_to_max_rate() {
        let mut valve = Valve::new(ComponentId(4), true, 300, Fixed::ZERO);
        let passed = valve.route(Flow::new(500, 200));
        assert_eq!(passed, Flow::new(300, 200));
    }

    #[test]
    fn test_valve_toggles() {
        let mut valve = Valve::new(ComponentId(4), true, 800, Fixed::ZERO);
        assert_eq!(valve.route(Flow::new(100, 150)).volume, 100);
        valve.set_open(false);
        assert_eq!(valve.route(Flow::new(100, 150)).volume, 0);
        valve.set_open(true);
        assert_eq!(valve.route(Flow::new(100, 150)).volume, 100);
    }

    #[test]
    fn test_router_failure_is_health_only_without_propensity() {
        let mut rng = FailureRng::new(9);
        let pipe = ConnectorPipe::new(ComponentId(3), Fixed::ZERO);
        for _ in 0..100 {
            assert!(!pipe.check_failure(&mut rng));
        }
    }

    #[test]
    fn test_router_random_failure_eventually_rolls() {
        let mut rng = FailureRng::new(9);
        let valve = Valve::new(ComponentId(4), true, 800, Fixed::from_num(0.5));
        let failed = (0..100).any(|_| valve.check_failure(&mut rng));
        assert!(failed);
    }
}
