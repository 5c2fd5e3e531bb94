//! Test fixtures and helpers.
//!
//! Pre-built simulations and entity layouts for consistent testing.

use swarm_core::components::{EntityId, PowerPlant, Shield};
use swarm_core::config::SimConfig;
use swarm_core::factions::Faction;
use swarm_core::math::{Fixed, Vec2Fixed};
use swarm_core::scenario::{spawn_factory, spawn_power_plant, ScenarioConfig};
use swarm_core::simulation::Simulation;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> Fixed {
    Fixed::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> Fixed {
    Fixed::from_num(n)
}

/// Frame delta used by the harness: one sixtieth of a second.
#[must_use]
pub fn frame_dt() -> Fixed {
    Fixed::ONE / Fixed::from_num(60)
}

/// Empty simulation with a GameState registering both players.
///
/// # Panics
///
/// Panics if the default config is rejected.
#[must_use]
pub fn sim_with_players() -> Simulation {
    let mut sim = Simulation::new(SimConfig::default()).expect("default config is valid");
    sim.manager_mut()
        .create_game_state(Faction::PLAYERS)
        .expect("fresh manager has no GameState");
    sim
}

/// Entities of a single-player production line.
#[derive(Debug, Clone, Copy)]
pub struct ProductionLine {
    /// The factory.
    pub factory: EntityId,
    /// The power plant feeding it.
    pub plant: EntityId,
}

/// Give `faction` a factory and a power plant at the origin.
///
/// The plant has no regeneration so energy only moves when a test says so.
///
/// # Panics
///
/// Panics if the simulation has no GameState.
pub fn production_line(
    sim: &mut Simulation,
    faction: Faction,
    energy: i32,
    capacity: u32,
    rate: Fixed,
) -> ProductionLine {
    let manager = sim.manager_mut();
    manager
        .game_state_mut()
        .expect("fixture needs a GameState")
        .set_energy(faction, fixed(energy));

    let shield = Shield::new(fixed(100), Fixed::ZERO);
    let factory = spawn_factory(manager, "Factory #0", Vec2Fixed::ZERO, faction, rate, shield)
        .expect("spawn factory");
    let plant = spawn_power_plant(
        manager,
        "Power Plant #0",
        Vec2Fixed::ZERO,
        faction,
        PowerPlant::new(capacity, Fixed::ZERO),
        shield,
    )
    .expect("spawn power plant");
    ProductionLine { factory, plant }
}

/// A small skirmish scenario that builds quickly.
#[must_use]
pub fn small_scenario(seed: u64) -> ScenarioConfig {
    ScenarioConfig {
        structure_count: 8,
        ..ScenarioConfig::with_seed(seed)
    }
}

/// Seeded skirmish with the default config.
///
/// # Panics
///
/// Panics if the scenario cannot be built.
#[must_use]
pub fn skirmish(seed: u64) -> Simulation {
    Simulation::skirmish(SimConfig::default(), &small_scenario(seed)).expect("skirmish builds")
}
