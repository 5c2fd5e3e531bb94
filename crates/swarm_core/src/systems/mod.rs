//! Per-tick simulation systems.
//!
//! Each system is a free function over the [`crate::manager::EntityManager`]
//! and the frame delta. [`crate::simulation::Simulation::tick`] runs them in
//! this fixed order:
//!
//! 1. [`movement::movement_system`] - integrates drone motion, wraps the map
//! 2. [`shield::shield_system`] - regenerates shields
//! 3. [`production::production_system`] - energy accrual and drone spawning
//! 4. [`combat::combat_system`] - damage, destruction, game-over check
//! 5. [`ai::ai_decision_system`] - periodic target assignment
//! 6. [`label::label_system`] - refreshes label text
//!
//! Systems never call each other. [`hud`] is a read model built on demand.

pub mod ai;
pub mod combat;
pub mod hud;
pub mod label;
pub mod movement;
pub mod production;
pub mod shield;

pub use ai::{ai_decision_system, TargetAssignment};
pub use combat::{combat_system, CombatReport, DamageEvent};
pub use hud::{GameOverBanner, HoverInfo, HudSnapshot, PlayerPanel};
pub use label::label_system;
pub use movement::movement_system;
pub use production::{production_system, ProductionReport};
pub use shield::shield_system;
