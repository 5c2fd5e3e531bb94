//! # Swarm Core
//!
//! Deterministic simulation core for a drone swarm strategy game.
//!
//! Factions compete for a toroidal map with factories, power plants and
//! drones. This crate holds the entity-component substrate and the per-tick
//! gameplay systems:
//! - No rendering
//! - No system randomness (scenario layout is seeded)
//! - No floating-point simulation math (uses fixed-point)
//!
//! ## Crate Structure
//!
//! - [`store`] - Typed component pools and entity lifecycle
//! - [`manager`] - Entity manager with hot-kind indices and the GameState singleton
//! - [`components`] - Component records
//! - [`game_state`] - Per-faction drone counts, energy and outcome
//! - [`systems`] - Movement, shield, production, combat, AI, label and HUD
//! - [`scenario`] - Archetype builders and seeded skirmish setup
//! - [`simulation`] - Fixed-order tick driver
//! - [`config`] - Tunables and difficulty presets
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod components;
pub mod config;
pub mod error;
pub mod factions;
pub mod game_state;
pub mod manager;
pub mod math;
pub mod scenario;
pub mod simulation;
pub mod store;
pub mod systems;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::components::*;
    pub use crate::config::{DifficultyLevel, DifficultySettings, SimConfig};
    pub use crate::error::{GameError, Result};
    pub use crate::factions::Faction;
    pub use crate::game_state::GameState;
    pub use crate::manager::EntityManager;
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::scenario::ScenarioConfig;
    pub use crate::simulation::{Simulation, TickEvents};
    pub use crate::systems::HudSnapshot;
}
