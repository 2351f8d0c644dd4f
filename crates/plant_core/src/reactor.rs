//! Reactor: the plant's heat and steam source.
//!
//! Each tick the reactor heats up according to control-rod insertion,
//! cools according to the water pumped in this tick, takes damage past its
//! temperature/pressure limits, and boils water into steam past 100
//! degrees. The update sequence is strictly ordered; see
//! [`Reactor::update_state`].

use serde::{Deserialize, Serialize};

use crate::components::{
    ComponentId, DamageCause, DamageEvent, DamagePolicy, FailureProfile, Flow, Health,
    OperationalStatus, ReactorInputs,
};
use crate::error::{PlantError, Result};
use crate::math::{fixed_serde, percent_round, scale_round, FailureRng, Fixed};

/// Evaporation starts strictly above this temperature. The threshold is
/// sharp, not smoothed: at exactly 100 degrees nothing boils.
const BOILING_POINT: i32 = 100;

/// Tunable constants for the reactor step functions.
///
/// Defaults match the original training-simulator values. The struct is
/// RON-loadable so scenarios can override individual limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactorConfig {
    /// Damage threshold: 2865C is the melting point of uranium oxide.
    pub max_temperature: i32,
    /// Damage threshold for pressure.
    pub max_pressure: i32,
    /// Maximum temperature increase per tick at 100% rod insertion.
    pub max_heating_per_step: i32,
    /// Below this water volume the core heats faster for the same rod
    /// position.
    pub min_safe_water_volume: i32,
    /// Multiplier applied to the base heating rate when under-cooled,
    /// before the percentage scaling.
    pub unsafe_heating_multiplier: i32,
    /// Fixed water:steam volume ratio (1 water boils into this much steam).
    pub water_steam_ratio: i32,
    /// Fixed health penalty per triggering damage condition per tick.
    pub health_penalty: i32,
    /// Conversion from temperature to water volume evaporated.
    #[serde(with = "fixed_serde")]
    pub evap_multiplier: Fixed,
    /// Conversion from water volume pumped in to temperature decrease.
    #[serde(with = "fixed_serde")]
    pub cool_multiplier: Fixed,
    /// Water volume at plant construction.
    pub initial_water_volume: i32,
    /// Temperature at plant construction.
    pub initial_temperature: i32,
}

impl Default for ReactorConfig {
    fn default() -> Self {
        Self {
            max_temperature: 2865,
            max_pressure: 500,
            max_heating_per_step: 100,
            min_safe_water_volume: 2000,
            unsafe_heating_multiplier: 2,
            water_steam_ratio: 2,
            health_penalty: 10,
            evap_multiplier: Fixed::from_num(0.5),
            cool_multiplier: Fixed::from_num(0.1),
            initial_water_volume: 8000,
            initial_temperature: 0,
        }
    }
}

/// Control-rod insertion state, owned exclusively by the reactor.
///
/// No temporal smoothing: the reactor sees the operator's instantaneous
/// command each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ControlRod {
    percentage_lowered: i32,
}

impl ControlRod {
    const DEFAULT_PERCENTAGE: i32 = 100;

    /// Create a control rod fully inserted.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            percentage_lowered: Self::DEFAULT_PERCENTAGE,
        }
    }

    /// Insertion depth: 0 = fully withdrawn, 100 = fully inserted.
    #[must_use]
    pub const fn percentage_lowered(&self) -> i32 {
        self.percentage_lowered
    }

    /// Set the insertion depth.
    ///
    /// # Errors
    ///
    /// Returns [`PlantError::RodOutOfRange`] when `percentage` is outside
    /// [0, 100]. The stored value is left unchanged on error.
    pub fn set_percentage_lowered(&mut self, percentage: i32) -> Result<()> {
        if percentage < 0 || percentage > 100 {
            return Err(PlantError::RodOutOfRange(percentage));
        }
        self.percentage_lowered = percentage;
        Ok(())
    }
}

impl Default for ControlRod {
    fn default() -> Self {
        Self::new()
    }
}

/// The reactor component.
///
/// One instance per plant. State is advanced once per tick via
/// [`update_state`](Self::update_state); steam leaves through
/// [`offer_steam`](Self::offer_steam) / [`extract_steam`](Self::extract_steam)
/// after the update.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reactor {
    id: ComponentId,
    config: ReactorConfig,
    temperature: i32,
    /// Pressure is read by the damage check. The shipped update sequence
    /// never raises it; it changes only via snapshot restore.
    pressure: i32,
    water_volume: i32,
    steam_volume: i32,
    health: Health,
    status: OperationalStatus,
    failure: FailureProfile,
    control_rod: ControlRod,
}

impl Reactor {
    /// Create a reactor with the given configuration.
    ///
    /// The reactor never fails spontaneously; its failure check is purely
    /// the deterministic health test.
    #[must_use]
    pub fn new(id: ComponentId, config: ReactorConfig) -> Self {
        Self {
            id,
            temperature: config.initial_temperature,
            pressure: 0,
            water_volume: config.initial_water_volume,
            steam_volume: 0,
            health: Health::new(100),
            status: OperationalStatus::new(true, true),
            failure: FailureProfile::NEVER,
            control_rod: ControlRod::new(),
            config,
        }
    }

    /// Component identifier.
    #[must_use]
    pub const fn id(&self) -> ComponentId {
        self.id
    }

    /// Current core temperature.
    #[must_use]
    pub const fn temperature(&self) -> i32 {
        self.temperature
    }

    /// Current pressure.
    #[must_use]
    pub const fn pressure(&self) -> i32 {
        self.pressure
    }

    /// Current water volume.
    #[must_use]
    pub const fn water_volume(&self) -> i32 {
        self.water_volume
    }

    /// Current steam volume.
    #[must_use]
    pub const fn steam_volume(&self) -> i32 {
        self.steam_volume
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

    /// Configured limits.
    #[must_use]
    pub const fn config(&self) -> &ReactorConfig {
        &self.config
    }

    /// Control-rod insertion percentage.
    #[must_use]
    pub const fn rod_percentage(&self) -> i32 {
        self.control_rod.percentage_lowered()
    }

    /// Set the control-rod insertion percentage.
    ///
    /// # Errors
    ///
    /// Returns [`PlantError::RodOutOfRange`] for values outside [0, 100];
    /// reactor state is left unchanged.
    pub fn set_rod_percentage(&mut self, percentage: i32) -> Result<()> {
        self.control_rod.set_percentage_lowered(percentage)
    }

    /// Advance the reactor by one tick.
    ///
    /// Strictly ordered: temperature update, damage check, evaporation.
    /// Returns the damage events recorded this tick.
    pub fn update_state(&mut self, inputs: ReactorInputs) -> Vec<DamageEvent> {
        // Pumped water joins the inventory immediately; only this tick's
        // amount contributes to the cooldown term.
        self.water_volume += inputs.water_pumped_in;

        self.update_temperature(inputs.water_pumped_in);
        let events = self.check_if_damaging();
        self.evaporate_water();
        events
    }

    /// Offer outbound steam for routing, without removing it.
    ///
    /// Reports a volume and temperature consistent with the just-updated
    /// state: at most `max_flow` of the current steam inventory, at core
    /// temperature.
    #[must_use]
    pub fn offer_steam(&self, max_flow: i32) -> Flow {
        Flow::new(self.steam_volume.min(max_flow).max(0), self.temperature)
    }

    /// Remove routed steam from the inventory.
    ///
    /// `volume` must not exceed what [`offer_steam`](Self::offer_steam)
    /// reported this tick.
    pub fn extract_steam(&mut self, volume: i32) {
        debug_assert!(volume <= self.steam_volume);
        self.steam_volume -= volume;
    }

    /// Run the failure check: depleted health, or a spontaneous roll for
    /// reactors configured with one.
    pub fn check_failure(&self, rng: &mut FailureRng) -> bool {
        self.failure.check_failure(&self.health, rng)
    }

    fn damage_policy(&self) -> DamagePolicy {
        DamagePolicy {
            health_penalty: self.config.health_penalty,
            // Depleted reactor health is terminal.
            disables_on_depletion: true,
        }
    }

    fn update_temperature(&mut self, water_pumped_in: i32) {
        let change = self.heating(self.control_rod.percentage_lowered())
            - self.cooldown(water_pumped_in);
        self.temperature += change;
    }

    /// Heating for this tick, from rod insertion.
    ///
    /// With less than the minimum safe water volume in the core, the base
    /// rate is doubled before the percentage scaling.
    fn heating(&self, lowered_percentage: i32) -> i32 {
        let base = if self.water_volume <= self.config.min_safe_water_volume {
            self.config.max_heating_per_step * self.config.unsafe_heating_multiplier
        } else {
            self.config.max_heating_per_step
        };
        percent_round(base, lowered_percentage)
    }

    /// Cooling for this tick, from the water pumped in this tick only.
    fn cooldown(&self, pumped_in: i32) -> i32 {
        scale_round(pumped_in, self.config.cool_multiplier)
    }

    fn check_if_damaging(&mut self) -> Vec<DamageEvent> {
        let mut events = Vec::new();
        let policy = self.damage_policy();

        // Temperature and pressure are independent triggers; both exceeded
        // in one tick applies the penalty twice.
        if self.temperature > self.config.max_temperature {
            policy.apply(&mut self.health, &mut self.status);
            events.push(DamageEvent {
                component: self.id,
                cause: DamageCause::OverTemperature,
                penalty: policy.health_penalty,
            });
        }
        if self.pressure > self.config.max_pressure {
            policy.apply(&mut self.health, &mut self.status);
            events.push(DamageEvent {
                component: self.id,
                cause: DamageCause::OverPressure,
                penalty: policy.health_penalty,
            });
        }

        if !events.is_empty() {
            tracing::warn!(
                component = %self.id,
                health = self.health.current,
                operational = self.status.operational,
                "reactor damaged"
            );
        }
        events
    }

    /// Boil water into steam when above the boiling point.
    ///
    /// Volumes are not defensively clamped; a long enough uncooled run can
    /// drive the water inventory negative, matching the original model.
    fn evaporate_water(&mut self) {
        if self.temperature > BOILING_POINT {
            let water_evaporated = scale_round(self.temperature, self.config.evap_multiplier);
            let steam_created = water_evaporated * self.config.water_steam_ratio;

            self.water_volume -= water_evaporated;
            self.steam_volume += steam_created;
        }
    }
}
