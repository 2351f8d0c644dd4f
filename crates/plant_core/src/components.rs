//! Shared component data for plant units.
//!
//! Components are pure data with no behavior beyond small invariant
//! helpers. Every physical unit in the plant (reactor, condenser, pipes,
//! valves) is built from these pieces; the per-unit step functions live in
//! their own modules.

use serde::{Deserialize, Serialize};

use crate::math::{fixed_serde, FailureRng, Fixed};

/// Unique identifier for a plant component.
///
/// Assigned once at plant construction and stable for the lifetime of the
/// plant. Used for failure registration and the driver protocol.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ComponentId(pub u32);

impl std::fmt::Display for ComponentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind tag for a plant component.
///
/// The plant stores components in typed collections built at construction
/// time, so kind discrimination is resolved exactly once, from this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    /// The heat and steam source.
    Reactor,
    /// The steam sink that condenses steam back into water.
    Condenser,
    /// Passive flow router.
    ConnectorPipe,
    /// Operator-controlled flow router.
    Valve,
}

/// A snapshot of fluid moving between two components during one tick.
///
/// Flow is a transient value: produced by an upstream component's output
/// accessor after its state update, consumed by the downstream component in
/// the same tick, never stored across ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Flow {
    /// Volume of fluid moved this tick.
    pub volume: i32,
    /// Temperature of the moved fluid.
    pub temperature: i32,
}

impl Flow {
    /// Create a new flow snapshot.
    #[must_use]
    pub const fn new(volume: i32, temperature: i32) -> Self {
        Self {
            volume,
            temperature,
        }
    }

    /// The zero flow: nothing moved this tick.
    pub const NONE: Self = Self {
        volume: 0,
        temperature: 0,
    };

    /// Check whether any fluid moved.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.volume == 0
    }
}

/// Integer wear indicator in [0, max].
///
/// Health only decreases inside the engine; repair is an external concern
/// and the engine exposes no API to restore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Health {
    /// Current health points.
    pub current: i32,
    /// Maximum health points.
    pub max: i32,
}

impl Health {
    /// Create a new health component at full health.
    #[must_use]
    pub const fn new(max: i32) -> Self {
        Self { current: max, max }
    }

    /// Apply damage, saturating at zero.
    pub fn apply_damage(&mut self, amount: i32) {
        self.current = (self.current - amount).max(0);
    }

    /// Check whether health has reached zero.
    #[must_use]
    pub const fn is_depleted(&self) -> bool {
        self.current <= 0
    }

    /// Get health as a percentage (0-100).
    #[must_use]
    pub fn percentage(&self) -> i32 {
        if self.max == 0 {
            0
        } else {
            (self.current * 100) / self.max
        }
    }
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100)
    }
}

/// Operational and pressurization flags for a component.
///
/// `operational` flips to false permanently on terminal damage; the engine
/// never resets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationalStatus {
    /// Whether the component currently participates in plant function.
    pub operational: bool,
    /// Whether the component holds pressure.
    pub pressurized: bool,
}

impl OperationalStatus {
    /// Create a new status.
    #[must_use]
    pub const fn new(operational: bool, pressurized: bool) -> Self {
        Self {
            operational,
            pressurized,
        }
    }

    /// Mark the component permanently non-operational.
    pub fn disable(&mut self) {
        self.operational = false;
    }
}

impl Default for OperationalStatus {
    fn default() -> Self {
        Self::new(true, true)
    }
}

/// Random-failure propensity for a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FailureProfile {
    /// Per-tick probability of spontaneous failure, in [0, 1].
    #[serde(with = "fixed_serde")]
    pub random_failure_chance: Fixed,
}

impl FailureProfile {
    /// A component that never fails spontaneously.
    ///
    /// Its failure check routes through the deterministic health test only.
    pub const NEVER: Self = Self {
        random_failure_chance: Fixed::ZERO,
    };

    /// Create a profile with the given per-tick failure chance.
    #[must_use]
    pub fn with_chance(chance: Fixed) -> Self {
        Self {
            random_failure_chance: chance,
        }
    }

    /// Run the failure check for a component with this profile.
    ///
    /// Returns true if health is depleted, or if the random roll succeeds
    /// for components with a nonzero propensity.
    pub fn check_failure(&self, health: &Health, rng: &mut FailureRng) -> bool {
        if health.is_depleted() {
            return true;
        }
        rng.roll(self.random_failure_chance)
    }
}

impl Default for FailureProfile {
    fn default() -> Self {
        Self::NEVER
    }
}

/// Shared damage-and-fail path configuration.
///
/// Over-temperature and over-pressure each apply `health_penalty` once per
/// triggering tick. Whether depleted health also flips the operational flag
/// is a per-component policy choice: the reactor dies, the canonical
/// condenser stays operational regardless of health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamagePolicy {
    /// Fixed health penalty per triggering condition per tick.
    pub health_penalty: i32,
    /// Whether depleted health marks the component non-operational.
    pub disables_on_depletion: bool,
}

impl DamagePolicy {
    /// Apply one triggering condition's worth of damage.
    pub fn apply(&self, health: &mut Health, status: &mut OperationalStatus) {
        health.apply_damage(self.health_penalty);
        if self.disables_on_depletion && health.is_depleted() {
            status.disable();
        }
    }
}

/// Why a component took damage this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageCause {
    /// Temperature exceeded the component's limit.
    OverTemperature,
    /// Pressure exceeded the component's limit.
    OverPressure,
}

/// A damage state transition recorded during a tick.
///
/// Damage is part of normal simulation, never an error; the driver reads
/// these events for display and scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageEvent {
    /// The component that took damage.
    pub component: ComponentId,
    /// The triggering condition.
    pub cause: DamageCause,
    /// Health points lost.
    pub penalty: i32,
}

/// Per-tick inputs for the reactor.
///
/// Passing inputs by value into `update_state` makes the
/// "volume accessor called at most once per tick" rule a structural
/// guarantee rather than a usage convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReactorInputs {
    /// Cool water pumped into the reactor this tick.
    pub water_pumped_in: i32,
}

/// Per-tick inputs for the condenser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CondenserInputs {
    /// Steam routed into the condenser this tick, with its temperature.
    pub steam_in: Flow,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_saturates_at_zero() {
        let mut health = Health::new(100);
        health.apply_damage(150);
        assert_eq!(health.current, 0);
        assert!(health.is_depleted());
    }

    #[test]
    fn test_health_percentage() {
        let mut health = Health::new(100);
        health.apply_damage(30);
        assert_eq!(health.percentage(), 70);
    }

    #[test]
    fn test_damage_policy_disables_on_depletion() {
        let policy = DamagePolicy {
            health_penalty: 60,
            disables_on_depletion: true,
        };
        let mut health = Health::new(100);
        let mut status = OperationalStatus::default();

        policy.apply(&mut health, &mut status);
        assert!(status.operational);

        policy.apply(&mut health, &mut status);
        assert!(health.is_depleted());
        assert!(!status.operational);
    }

    #[test]
    fn test_damage_policy_keeps_operational_when_configured() {
        let policy = DamagePolicy {
            health_penalty: 200,
            disables_on_depletion: false,
        };
        let mut health = Health::new(100);
        let mut status = OperationalStatus::default();

        policy.apply(&mut health, &mut status);
        assert!(health.is_depleted());
        assert!(status.operational);
    }

    #[test]
    fn test_never_profile_is_deterministic() {
        let mut rng = FailureRng::new(1);
        let healthy = Health::new(100);
        for _ in 0..1000 {
            assert!(!FailureProfile::NEVER.check_failure(&healthy, &mut rng));
        }

        let mut depleted = Health::new(100);
        depleted.apply_damage(100);
        assert!(FailureProfile::NEVER.check_failure(&depleted, &mut rng));
    }
}
