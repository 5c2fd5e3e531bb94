//! Scenario setup.
//!
//! Builders that assemble the standard entity archetypes, and a seeded
//! skirmish layout that scatters player and neutral structures across the
//! map. Layout is fully determined by [`ScenarioConfig::seed`].

use serde::{Deserialize, Serialize};

use crate::components::{
    AiController, Drone, EntityId, Factory, Garrison, Label, PowerPlant, Shield, Tag, Transform,
};
use crate::config::{DroneSettings, SimConfig};
use crate::error::{GameError, Result};
use crate::factions::Faction;
use crate::manager::EntityManager;
use crate::math::{decimal_serde, Fixed, Vec2Fixed};

/// Label offset above structures.
const STRUCTURE_LABEL_OFFSET: Vec2Fixed =
    Vec2Fixed::new(Fixed::ZERO, Fixed::from_bits(-(30_i64 << 32)));

/// Label offset above drones.
const DRONE_LABEL_OFFSET: Vec2Fixed =
    Vec2Fixed::new(Fixed::ZERO, Fixed::from_bits(-(12_i64 << 32)));

/// Parameters for [`build_skirmish`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Layout seed.
    pub seed: u64,
    /// Total number of structures, players' included.
    pub structure_count: usize,
    /// Minimum distance between any two structures.
    #[serde(with = "decimal_serde")]
    pub min_spacing: Fixed,
    /// Factions driven by an AI controller.
    pub ai_factions: Vec<Faction>,
    /// Energy each player starts with.
    #[serde(with = "decimal_serde")]
    pub starting_energy: Fixed,
    /// Energy accrued per second by every power plant.
    #[serde(with = "decimal_serde")]
    pub energy_regen: Fixed,
    /// Drones stationed at each neutral structure.
    pub neutral_garrison: u32,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            structure_count: 30,
            min_spacing: Fixed::from_num(40),
            ai_factions: vec![Faction::Player2],
            starting_energy: Fixed::from_num(5),
            energy_regen: Fixed::ONE,
            neutral_garrison: 3,
        }
    }
}

impl ScenarioConfig {
    /// Config with the given seed and defaults otherwise.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Parse a scenario from RON text.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::DataParseError`] on malformed RON and
    /// [`GameError::InvalidConfig`] when fewer than four structures are
    /// requested.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        let config: Self = ron::from_str(text).map_err(|e| GameError::DataParseError {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check the layout can hold both players' starting structures.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] naming the bad field.
    pub fn validate(&self) -> Result<()> {
        if self.structure_count < 4 {
            return Err(GameError::InvalidConfig(
                "structure_count must be at least 4".to_string(),
            ));
        }
        if self.min_spacing < Fixed::ZERO {
            return Err(GameError::InvalidConfig(
                "min_spacing must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Deterministic random number generator for scenario layout.
///
/// Simple LCG; only the high bits are used for draws.
#[derive(Debug, Clone)]
pub struct ScenarioRng {
    state: u64,
}

impl ScenarioRng {
    /// Seed a new generator.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self {
            state: seed.wrapping_add(0x9E37_79B9_7F4A_7C15),
        }
    }

    fn next(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(0x5_DEEC_E66D).wrapping_add(11);
        self.state >> 16
    }

    /// Uniform value in `[0, 1)` with four decimal digits.
    pub fn next_fraction(&mut self) -> Fixed {
        Fixed::from_num(self.next() % 10_000) / Fixed::from_num(10_000)
    }

    /// Uniform value in `[min, max)`.
    pub fn next_range(&mut self, min: Fixed, max: Fixed) -> Fixed {
        if max <= min {
            return min;
        }
        min + (max - min) * self.next_fraction()
    }

    /// Uniform integer in `[min, max)`.
    pub fn next_int(&mut self, min: u32, max: u32) -> u32 {
        if max <= min {
            return min;
        }
        min + (self.next() % u64::from(max - min)) as u32
    }

    /// Fair coin flip.
    pub fn coin_flip(&mut self) -> bool {
        self.next_fraction() < Fixed::from_num(0.5)
    }
}

/// Generate up to `count` positions at least `min_spacing` apart.
///
/// Gives up after a bounded number of attempts, so a crowded map may yield
/// fewer positions than requested.
#[must_use]
pub fn generate_positions(
    rng: &mut ScenarioRng,
    count: usize,
    width: Fixed,
    height: Fixed,
    min_spacing: Fixed,
) -> Vec<Vec2Fixed> {
    let mut positions: Vec<Vec2Fixed> = Vec::with_capacity(count);
    let max_attempts = count.saturating_mul(200);
    let mut attempts = 0;

    while positions.len() < count && attempts < max_attempts {
        attempts += 1;
        let candidate = Vec2Fixed::new(
            rng.next_range(Fixed::ZERO, width),
            rng.next_range(Fixed::ZERO, height),
        );
        // Strict: two structures exactly `min_spacing` apart overlap.
        let clear = positions
            .iter()
            .all(|p| !p.within(candidate, min_spacing));
        if clear {
            positions.push(candidate);
        }
    }

    if positions.len() < count {
        tracing::warn!(
            requested = count,
            placed = positions.len(),
            "Could not place every structure without overlap"
        );
    }
    positions
}

// ============================================================================
// Archetype builders
// ============================================================================

/// Spawn a factory with a shield, label and tag.
///
/// # Errors
///
/// Propagates manager errors.
pub fn spawn_factory(
    manager: &mut EntityManager,
    name: &str,
    position: Vec2Fixed,
    faction: Faction,
    production_rate: Fixed,
    shield: Shield,
) -> Result<EntityId> {
    let id = manager.create();
    manager.add_component(id, faction)?;
    manager.add_component(id, Transform::at(position))?;
    manager.add_component(id, Factory::new(name, production_rate))?;
    manager.add_component(id, shield)?;
    manager.add_component(id, Tag::new(name))?;
    manager.add_component(id, Label::new(name, STRUCTURE_LABEL_OFFSET))?;
    Ok(id)
}

/// Spawn a power plant with a shield, label and tag.
///
/// # Errors
///
/// Propagates manager errors.
pub fn spawn_power_plant(
    manager: &mut EntityManager,
    name: &str,
    position: Vec2Fixed,
    faction: Faction,
    plant: PowerPlant,
    shield: Shield,
) -> Result<EntityId> {
    let id = manager.create();
    manager.add_component(id, faction)?;
    manager.add_component(id, Transform::at(position))?;
    manager.add_component(id, plant)?;
    manager.add_component(id, shield)?;
    manager.add_component(id, Tag::new(name))?;
    manager.add_component(id, Label::new(name, STRUCTURE_LABEL_OFFSET))?;
    Ok(id)
}

/// Spawn a drone and count it in the GameState, if one exists.
///
/// # Errors
///
/// Propagates manager errors.
pub fn spawn_drone(
    manager: &mut EntityManager,
    faction: Faction,
    position: Vec2Fixed,
    settings: &DroneSettings,
) -> Result<EntityId> {
    let id = manager.create();
    manager.add_component(id, faction)?;
    manager.add_component(id, Transform::at(position))?;
    manager.add_component(id, Drone::new(settings.speed, settings.damage_per_second))?;
    manager.add_component(id, Shield::new(settings.shield_max, settings.shield_regen))?;
    manager.add_component(id, Label::new("", DRONE_LABEL_OFFSET))?;
    if let Ok(state) = manager.game_state_mut() {
        state.add_drone(faction);
    }
    Ok(id)
}

/// Spawn the AI controller for a faction.
///
/// # Errors
///
/// Propagates manager errors.
pub fn spawn_ai_controller(
    manager: &mut EntityManager,
    faction: Faction,
    interval: Fixed,
) -> Result<EntityId> {
    let id = manager.create();
    manager.add_component(id, faction)?;
    manager.add_component(id, AiController::new(interval))?;
    manager.add_component(id, Tag::new(format!("{} AI", faction.display_name())))?;
    Ok(id)
}

/// Build the standard two-player skirmish.
///
/// Creates the GameState, one factory and one power plant per player, and
/// fills the remaining positions with neutral structures.
///
/// # Errors
///
/// Returns [`GameError::InvalidConfig`] for an unusable scenario, or
/// [`GameError::GameStateExists`] if the manager already has one.
pub fn build_skirmish(
    manager: &mut EntityManager,
    sim: &SimConfig,
    scenario: &ScenarioConfig,
) -> Result<()> {
    scenario.validate()?;
    let mut rng = ScenarioRng::new(scenario.seed);
    let positions = generate_positions(
        &mut rng,
        scenario.structure_count,
        sim.map_width,
        sim.map_height,
        scenario.min_spacing,
    );
    if positions.len() < 4 {
        return Err(GameError::InvalidConfig(
            "map too small for both players' structures".to_string(),
        ));
    }

    manager.create_game_state(Faction::PLAYERS)?;
    let shield_max = sim.combat.structure_shield_max;

    let shield_regen = rng.next_range(Fixed::from_num(0.75), Fixed::ONE);
    let capacity = rng.next_int(8, 12);
    for (slot, faction) in Faction::PLAYERS.into_iter().enumerate() {
        let state = manager.game_state_mut()?;
        state.set_energy(faction, scenario.starting_energy);

        spawn_factory(
            manager,
            "Factory #0",
            positions[slot * 2],
            faction,
            Fixed::ONE,
            Shield::new(shield_max, shield_regen),
        )?;
        spawn_power_plant(
            manager,
            "Power Plant #0",
            positions[slot * 2 + 1],
            faction,
            PowerPlant::new(capacity, scenario.energy_regen),
            Shield::new(shield_max, shield_regen),
        )?;
    }

    for (i, &position) in positions.iter().enumerate().skip(4) {
        let shield = Shield::new(shield_max, rng.next_range(Fixed::from_num(0.1), Fixed::ONE));
        let id = if rng.coin_flip() {
            let rate = rng.next_range(Fixed::from_num(0.1), Fixed::from_num(0.9));
            spawn_factory(
                manager,
                &format!("Factory #{i}"),
                position,
                Faction::Neutral,
                rate,
                shield,
            )?
        } else {
            let plant = PowerPlant::new(rng.next_int(5, 25), scenario.energy_regen);
            spawn_power_plant(
                manager,
                &format!("Power Plant #{i}"),
                position,
                Faction::Neutral,
                plant,
                shield,
            )?
        };
        manager.add_component(id, Garrison::new(scenario.neutral_garrison))?;
    }

    for &faction in &scenario.ai_factions {
        spawn_ai_controller(manager, faction, sim.difficulty.decision_interval)?;
    }

    tracing::info!(
        seed = scenario.seed,
        structures = positions.len(),
        entities = manager.len(),
        "Skirmish scenario built"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rng_is_deterministic() {
        let mut a = ScenarioRng::new(42);
        let mut b = ScenarioRng::new(42);
        for _ in 0..100 {
            assert_eq!(a.next_fraction(), b.next_fraction());
        }
        let mut c = ScenarioRng::new(43);
        let differs = (0..10).any(|_| a.next_fraction() != c.next_fraction());
        assert!(differs);
    }

    #[test]
    fn test_rng_ranges() {
        let mut rng = ScenarioRng::new(7);
        for _ in 0..500 {
            let f = rng.next_range(Fixed::from_num(0.1), Fixed::from_num(0.9));
            assert!(f >= Fixed::from_num(0.1) && f < Fixed::from_num(0.9));
            let n = rng.next_int(5, 25);
            assert!((5..25).contains(&n));
        }
        assert_eq!(rng.next_int(3, 3), 3);
    }

    #[test]
    fn test_positions_respect_spacing() {
        let mut rng = ScenarioRng::new(1);
        let spacing = Fixed::from_num(40);
        let positions = generate_positions(
            &mut rng,
            30,
            Fixed::from_num(2560),
            Fixed::from_num(1440),
            spacing,
        );
        assert_eq!(positions.len(), 30);
        for (i, a) in positions.iter().enumerate() {
            for b in &positions[i + 1..] {
                assert!(a.distance_squared(*b) > spacing * spacing);
            }
        }
    }

    #[test]
    fn test_crowded_map_gives_up() {
        let mut rng = ScenarioRng::new(1);
        let positions = generate_positions(
            &mut rng,
            50,
            Fixed::from_num(50),
            Fixed::from_num(50),
            Fixed::from_num(40),
        );
        assert!(positions.len() < 50);
        assert!(!positions.is_empty());
    }

    #[test]
    fn test_skirmish_layout() {
        let mut manager = EntityManager::new();
        build_skirmish(&mut manager, &SimConfig::default(), &ScenarioConfig::with_seed(9)).unwrap();

        let owned = |faction: Faction| {
            manager
                .factories()
                .iter()
                .filter(|&&id| manager.faction_of(id) == Some(faction))
                .count()
        };
        assert_eq!(owned(Faction::Player1), 1);
        assert_eq!(owned(Faction::Player2), 1);

        let structures = manager.components::<Factory>().count()
            + manager.components::<PowerPlant>().count();
        assert_eq!(structures, 30);
        assert_eq!(manager.components::<Garrison>().count(), 26);
        assert_eq!(manager.components::<AiController>().count(), 1);
        assert!(manager.drones().is_empty());

        let state = manager.game_state().unwrap();
        assert_eq!(state.energy(Faction::Player1), Fixed::from_num(5));
        assert!(manager.indices_consistent());
    }

    #[test]
    fn test_skirmish_rejects_tiny_layout() {
        let mut manager = EntityManager::new();
        let scenario = ScenarioConfig {
            structure_count: 2,
            ..ScenarioConfig::default()
        };
        assert!(matches!(
            build_skirmish(&mut manager, &SimConfig::default(), &scenario),
            Err(GameError::InvalidConfig(_))
        ));
        assert!(manager.is_empty());
    }

    #[test]
    fn test_spawn_drone_counts_in_game_state() {
        let mut manager = EntityManager::new();
        manager.create_game_state(Faction::PLAYERS).unwrap();
        let id = spawn_drone(
            &mut manager,
            Faction::Player1,
            Vec2Fixed::ZERO,
            &DroneSettings::default(),
        )
        .unwrap();
        assert_eq!(manager.drones(), &[id]);
        assert_eq!(manager.shields(), &[id]);
        assert_eq!(manager.game_state().unwrap().drone_count(Faction::Player1), 1);
    }

    #[test]
    fn test_scenario_from_ron() {
        let scenario = ScenarioConfig::from_ron_str("(seed: 12, structure_count: 10)").unwrap();
        assert_eq!(scenario.seed, 12);
        assert_eq!(scenario.structure_count, 10);
        assert_eq!(scenario.ai_factions, vec![Faction::Player2]);
        assert!(ScenarioConfig::from_ron_str("(structure_count: 1)").is_err());
    }
}
