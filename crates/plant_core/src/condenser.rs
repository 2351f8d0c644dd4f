//! Condenser: the plant's steam sink.
//!
//! Each tick the condenser takes in the steam routed to it, heats up from
//! that exchange, is cooled by its always-on coolant loop, condenses steam
//! back into water at a fixed water:steam ratio, and re-derives pressure
//! from the remaining steam volume.
//!
//! Two divergent condenser designs existed upstream; this is the canonical
//! one, with the divergent choices (operational linkage on depleted health,
//! fractional inflow heating) expressed as configuration instead of code.

use serde::{Deserialize, Serialize};

use crate::components::{
    ComponentId, CondenserInputs, DamageCause, DamageEvent, DamagePolicy, FailureProfile,
    Health, OperationalStatus,
};
use crate::math::{fixed_serde, scale_ceil, scale_round, FailureRng, Fixed};

/// Tunable constants for the condenser step functions.
///
/// Defaults match the original training-simulator values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct CondenserConfig {
    /// Damage threshold for temperature; also the point past which no
    /// steam condenses.
    pub max_temperature: i32,
    /// Damage threshold for pressure.
    pub max_pressure: i32,
    /// Temperature of the coolant coming in. Cooling never undershoots it.
    pub coolant_temperature: i32,
    /// Amount to cool the condenser per tick; the coolant pump is always
    /// on full.
    pub cooldown_per_step: i32,
    /// Fixed water:steam volume ratio.
    pub water_steam_ratio: i32,
    /// Fixed health penalty per triggering damage condition per tick.
    pub health_penalty: i32,
    /// Conversion from temperature headroom to steam condensed.
    #[serde(with = "fixed_serde")]
    pub cond_multiplier: Fixed,
    /// Conversion from steam volume to pressure.
    #[serde(with = "fixed_serde")]
    pub vol_to_pressure_multiplier: Fixed,
    /// Temperature at plant construction.
    pub initial_temperature: i32,
    /// Water volume at plant construction.
    pub initial_water_volume: i32,
    /// Whether depleted health marks the condenser non-operational.
    /// The canonical variant keeps it operational regardless of health.
    pub failure_disables: bool,
    /// Compute the inflow heating fraction in fixed-point instead of the
    /// truncating integer division. The truncating form zeroes the heating
    /// term whenever the inflow is smaller than the steam inventory; this
    /// flag enables the presumably intended fractional physics and is off
    /// by default.
    pub fractional_inflow_heating: bool,
}

impl Default for CondenserConfig {
    fn default() -> Self {
        Self {
            max_temperature: 2000,
            max_pressure: 2000,
            coolant_temperature: 20,
            cooldown_per_step: 200,
            water_steam_ratio: 2,
            health_penalty: 10,
            cond_multiplier: Fixed::from_num(0.8),
            vol_to_pressure_multiplier: Fixed::from_num(0.15),
            initial_temperature: 50,
            initial_water_volume: 2000,
            failure_disables: false,
            fractional_inflow_heating: false,
        }
    }
}

/// The condenser component.
///
/// One instance per plant. [`update_state`](Self::update_state) must be the
/// only consumer of the tick's inbound steam; the per-tick input record
/// enforces that structurally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Condenser {
    id: ComponentId,
    config: CondenserConfig,
    temperature: i32,
    pressure: i32,
    water_volume: i32,
    steam_volume: i32,
    health: Health,
    status: OperationalStatus,
    failure: FailureProfile,
}

impl Condenser {
    /// Create a condenser with the given configuration.
    ///
    /// The condenser never fails spontaneously.
    #[must_use]
    pub fn new(id: ComponentId, config: CondenserConfig) -> Self {
        Self {
            id,
            temperature: config.initial_temperature,
            pressure: 0,
            water_volume: config.initial_water_volume,
            steam_volume: 0,
            health: Health::new(100),
            status: OperationalStatus::new(true, true),
            failure: FailureProfile::NEVER,
            config,
        }
    }

    /// Component identifier.
    #[must_use]
    pub const fn id(&self) -> ComponentId {
        self.id
    }

    /// Current temperature.
    #[must_use]
    pub const fn temperature(&self) -> i32 {
        self.temperature
    }

    /// Current pressure, re-derived from steam volume every tick.
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
    pub const fn config(&self) -> &CondenserConfig {
        &self.config
    }

    /// Add (or draw, with a negative amount) condensate from the water
    /// inventory. The feedwater pump that moves this water back toward the
    /// reactor is the driver's concern.
    pub fn update_water_volume(&mut self, amount: i32) {
        self.water_volume += amount;
    }

    /// Advance the condenser by one tick.
    ///
    /// Strictly ordered: receive steam, temperature update, condensation,
    /// pressure derivation, damage check. Returns the damage events
    /// recorded this tick.
    pub fn update_state(&mut self, inputs: CondenserInputs) -> Vec<DamageEvent> {
        let steam_in = inputs.steam_in;
        self.steam_volume += steam_in.volume;

        self.update_temperature(steam_in.temperature, steam_in.volume);
        self.condense_steam();
        self.update_pressure();
        self.check_if_damaging()
    }

    /// Run the failure check: depleted health, or a spontaneous roll for
    /// condensers configured with one.
    pub fn check_failure(&self, rng: &mut FailureRng) -> bool {
        self.failure.check_failure(&self.health, rng)
    }

    fn update_temperature(&mut self, steam_temperature: i32, steam_volume_in: i32) {
        let change = self.heating(steam_temperature, steam_volume_in) - self.cooldown();
        self.temperature += change;
    }

    /// Temperature increase from the steam that arrived this tick.
    ///
    /// The temperature difference to the inbound steam is scaled by the
    /// fraction of the inventory that is freshly arrived. In the default
    /// integer form that fraction truncates toward zero, so the factor is
    /// 0 whenever the inflow is smaller than the inventory and 1 when the
    /// inflow is the whole inventory.
    fn heating(&self, steam_temperature: i32, steam_volume_in: i32) -> i32 {
        if self.steam_volume < 1 {
            return 0; // stops a potential divide by zero
        }
        if steam_volume_in == 0 {
            return 0; // no steam flowing in => no heating
        }
        let temp_diff = steam_temperature - self.temperature;
        if self.config.fractional_inflow_heating {
            let fresh_fraction =
                Fixed::from_num(steam_volume_in) / Fixed::from_num(self.steam_volume);
            scale_round(temp_diff, fresh_fraction)
        } else {
            temp_diff * (steam_volume_in / self.steam_volume)
        }
    }

    /// Fixed per-tick cooling from the always-on coolant pump, clamped so
    /// a single tick never cools past the coolant inlet temperature.
    fn cooldown(&self) -> i32 {
        let potential_new_temp = self.temperature - self.config.cooldown_per_step;
        if potential_new_temp > self.config.coolant_temperature {
            self.config.cooldown_per_step
        } else {
            self.temperature - self.config.coolant_temperature
        }
    }

    /// Condense steam back into water.
    ///
    /// The water amount is rounded up from a fixed-ratio division, then the
    /// steam removed is recomputed from that rounded amount so the exchange
    /// is exactly mass-balanced, with no drift from the rounding step.
    fn condense_steam(&mut self) {
        let raw = if self.temperature < self.config.max_temperature {
            scale_ceil(
                self.config.max_temperature - self.temperature,
                self.config.cond_multiplier,
            )
        } else {
            0
        };

        let capped = raw.min(self.steam_volume);
        let ratio = self.config.water_steam_ratio;
        let water_created = (capped + ratio - 1) / ratio;
        let steam_condensed = water_created * ratio;

        self.steam_volume -= steam_condensed;
        self.water_volume += water_created;
    }

    /// Pressure is a pure function of current steam volume, recomputed
    /// fully each tick, unlike temperature and water which accumulate.
    fn update_pressure(&mut self) {
        self.pressure = scale_round(self.steam_volume, self.config.vol_to_pressure_multiplier);
    }

    fn check_if_damaging(&mut self) -> Vec<DamageEvent> {
        let mut events = Vec::new();
        let policy = DamagePolicy {
            health_penalty: self.config.health_penalty,
            disables_on_depletion: self.config.failure_disables,
        };

        if self.temperature >= self.config.max_temperature {
            policy.apply(&mut self.health, &mut self.status);
            events.push(DamageEvent {
                component: self.id,
                cause: DamageCause::OverTemperature,
                penalty: policy.health_penalty,
            });
        }
        if self.pressure >= self.config.max_pressure {
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
                "condenser damaged"
            );
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Flow;

    fn condenser() -> Condenser {
        Condenser::new(ComponentId(2), CondenserConfig::default())
    }

    #[test]
    fn test_steam_exchange_full_inflow() {
        // Scenario B: 100 units of steam at 100 degrees into a condenser
        // at 50 degrees with an empty steam inventory.
        let mut condenser = condenser();
        let events = condenser.update_state(CondenserInputs {
            steam_in: Flow::new(100, 100),
        });

        // heating (100-50)*1 = 50, cooldown clamps 200 down to 50-20 = 30.
        assert_eq!(condenser.temperature(), 70);
        // All 100 steam condenses into 50 water, exactly mass-balanced.
        assert_eq!(condenser.steam_volume(), 0);
        assert_eq!(condenser.water_volume(), 2050);
        assert_eq!(condenser.pressure(), 0);
        assert!(events.is_empty());
    }

    #[test]
    fn test_mass_balance_is_exact() {
        let mut condenser = condenser();
        // Odd inflow forces the rounding path in the water division.
        for volume in [1, 3, 99, 101, 777] {
            let water_before = condenser.water_volume();
            let steam_before = condenser.steam_volume() + volume;
            condenser.update_state(CondenserInputs {
                steam_in: Flow::new(volume, 150),
            });
            let water_gained = condenser.water_volume() - water_before;
            let steam_lost = steam_before - condenser.steam_volume();
            assert_eq!(
                steam_lost,
                water_gained * condenser.config().water_steam_ratio,
                "drift for inflow {volume}"
            );
        }
    }

    #[test]
    fn test_cooldown_never_undershoots_coolant_temperature() {
        let mut condenser = condenser();
        // No inflow: no heating, only cooling.
        condenser.update_state(CondenserInputs::default());
        assert_eq!(condenser.temperature(), 20);

        // Already at coolant temperature: stays there.
        condenser.update_state(CondenserInputs::default());
        assert_eq!(condenser.temperature(), 20);
    }

    #[test]
    fn test_truncated_heating_fraction_collapses_to_zero() {
        // Documents the current (possibly unintended) integer-division
        // output: any inflow smaller than the steam inventory contributes
        // zero heating.
        let mut condenser = condenser();
        condenser.steam_volume = 400;
        condenser.temperature = 1990; // keep condensation from draining it
        assert_eq!(condenser.heating(500, 100), 0);
        // Inflow equal to the whole inventory heats by the full difference.
        assert_eq!(condenser.heating(500, 400), 500 - 1990);
    }

    #[test]
    fn test_fractional_heating_variant() {
        let config = CondenserConfig {
            fractional_inflow_heating: true,
            ..CondenserConfig::default()
        };
        let mut condenser = Condenser::new(ComponentId(2), config);
        condenser.steam_volume = 400;
        // 100 of 400 units freshly arrived: a quarter of the difference.
        assert_eq!(condenser.heating(450, 100), 100);
    }

    #[test]
    fn test_pressure_derived_from_steam_volume() {
        let mut condenser = condenser();
        // Hot condenser so nothing condenses and the steam stays.
        condenser.temperature = 2500;
        condenser.update_state(CondenserInputs {
            steam_in: Flow::new(1000, 2500),
        });
        // round(1000 * 0.15) = 150.
        assert_eq!(condenser.pressure(), 150);
    }

    #[test]
    fn test_over_temperature_damages_without_disabling() {
        let mut condenser = condenser();
        condenser.temperature = 2500;
        for _ in 0..10 {
            let events = condenser.update_state(CondenserInputs::default());
            assert_eq!(events.len(), 1);
            assert_eq!(events[0].cause, DamageCause::OverTemperature);
            // Cooling pulls 200 per tick; keep it over the limit.
            condenser.temperature += 200;
        }
        assert!(condenser.health().is_depleted());
        // Canonical variant: depleted health never flips the flag.
        assert!(condenser.status().operational);

        let mut rng = FailureRng::new(0);
        assert!(condenser.check_failure(&mut rng));
    }

    #[test]
    fn test_failure_disables_variant() {
        let config = CondenserConfig {
            failure_disables: true,
            ..CondenserConfig::default()
        };
        let mut condenser = Condenser::new(ComponentId(2), config);
        condenser.health = Health::new(10);
        condenser.temperature = 2400;
        condenser.update_state(CondenserInputs::default());
        assert!(condenser.health().is_depleted());
        assert!(!condenser.status().operational);
    }

    #[test]
    fn test_no_condensation_at_max_temperature() {
        let mut condenser = condenser();
        condenser.temperature = 2200;
        condenser.steam_volume = 500;
        let water_before = condenser.water_volume();
        condenser.condense_steam();
        assert_eq!(condenser.steam_volume(), 500);
        assert_eq!(condenser.water_volume(), water_before);
    }

    #[test]
    fn test_water_volume_accessor_is_additive() {
        let mut condenser = condenser();
        condenser.update_water_volume(300);
        condenser.update_water_volume(-500);
        assert_eq!(condenser.water_volume(), 1800);
    }
}
