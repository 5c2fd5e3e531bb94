//! Simulation driver.
//!
//! [`Simulation`] owns the entity manager and configuration and advances
//! every system in a fixed order, one call per frame.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::components::{
    AiController, Drone, EntityId, Factory, Garrison, PowerPlant, Shield, Transform,
};
use crate::config::{DifficultyLevel, DifficultySettings, SimConfig};
use crate::error::{GameError, Result};
use crate::factions::Faction;
use crate::manager::EntityManager;
use crate::math::{fixed_serde, Fixed, Vec2Fixed};
use crate::scenario::{build_skirmish, ScenarioConfig};
use crate::systems::{
    ai_decision_system, combat_system, label_system, movement_system, production_system,
    shield_system, DamageEvent, HudSnapshot, TargetAssignment,
};

/// Outcome recorded when the game ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOutcome {
    /// Surviving player, or `None` for a draw.
    pub winner: Option<Faction>,
    /// Tick on which the game ended.
    pub tick: u64,
}

/// Events generated during a simulation tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickEvents {
    /// Drones produced this tick.
    pub spawned: Vec<EntityId>,
    /// Neutral structures whose garrison grew.
    pub reinforced: Vec<EntityId>,
    /// Damage dealt this tick.
    pub damage_events: Vec<DamageEvent>,
    /// Entities destroyed this tick.
    pub destroyed: Vec<EntityId>,
    /// AI target assignments.
    pub assignments: Vec<TargetAssignment>,
    /// Set on the tick the game ends.
    pub game_over: Option<GameOutcome>,
}

/// The drone swarm simulation.
///
/// # System Execution Order
///
/// 1. **Movement** - drones close on targets or patrol, map wraps
/// 2. **Shield** - regeneration, so combat sees fresh values
/// 3. **Production** - energy accrual and drone spawning
/// 4. **Combat** - damage, destruction, game-over check
/// 5. **AI** - periodic target assignment
/// 6. **Label** - text refresh for the renderer
#[derive(Debug, Clone)]
pub struct Simulation {
    manager: EntityManager,
    config: SimConfig,
    tick: u64,
    elapsed: Fixed,
}

impl Simulation {
    /// Create an empty simulation.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] if `config` fails validation.
    pub fn new(config: SimConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            manager: EntityManager::new(),
            config,
            tick: 0,
            elapsed: Fixed::ZERO,
        })
    }

    /// Create a simulation populated with a seeded skirmish.
    ///
    /// # Errors
    ///
    /// Propagates config validation and scenario errors.
    pub fn skirmish(config: SimConfig, scenario: &ScenarioConfig) -> Result<Self> {
        let mut sim = Self::new(config)?;
        build_skirmish(&mut sim.manager, &sim.config, scenario)?;
        Ok(sim)
    }

    /// Number of ticks run so far.
    #[must_use]
    pub const fn get_tick(&self) -> u64 {
        self.tick
    }

    /// Simulated seconds elapsed.
    #[must_use]
    pub const fn elapsed(&self) -> Fixed {
        self.elapsed
    }

    /// Current configuration.
    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Read access to all entities.
    #[must_use]
    pub const fn manager(&self) -> &EntityManager {
        &self.manager
    }

    /// Write access for scenario setup and input collaborators.
    pub fn manager_mut(&mut self) -> &mut EntityManager {
        &mut self.manager
    }

    /// Current AI difficulty.
    #[must_use]
    pub const fn difficulty(&self) -> &DifficultySettings {
        &self.config.difficulty
    }

    /// Mutable AI difficulty; changes apply at each controller's next reset.
    pub fn difficulty_mut(&mut self) -> &mut DifficultySettings {
        &mut self.config.difficulty
    }

    /// Switch to a difficulty preset.
    pub fn set_difficulty(&mut self, level: DifficultyLevel) {
        tracing::info!(level = level.name(), "Difficulty changed");
        self.config.difficulty = level.settings();
    }

    /// Whether the game has ended.
    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.manager
            .game_state()
            .is_ok_and(|state| state.is_game_over())
    }

    /// Capture the HUD read model.
    #[must_use]
    pub fn hud(&self) -> HudSnapshot {
        HudSnapshot::capture(&self.manager)
    }

    /// Advance the simulation by `dt` seconds.
    ///
    /// Negative deltas are treated as zero.
    pub fn tick(&mut self, dt: Fixed) -> TickEvents {
        let dt = if dt < Fixed::ZERO {
            tracing::warn!(dt = %dt, "Negative frame delta clamped to zero");
            Fixed::ZERO
        } else {
            dt
        };
        let mut events = TickEvents::default();

        movement_system(&mut self.manager, &self.config, dt);
        shield_system(&mut self.manager, dt);

        let production = production_system(&mut self.manager, &self.config, dt);
        events.spawned = production.spawned;
        events.reinforced = production.reinforced;

        let combat = combat_system(&mut self.manager, &self.config, dt);
        events.damage_events = combat.damage_events;
        events.destroyed = combat.destroyed;

        events.assignments = ai_decision_system(&mut self.manager, &self.config.difficulty, dt);
        label_system(&mut self.manager);

        self.tick += 1;
        self.elapsed += dt;

        if combat.game_over {
            let winner = self.manager.game_state().ok().and_then(|s| s.winner());
            events.game_over = Some(GameOutcome {
                winner,
                tick: self.tick,
            });
        }

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(tick = self.tick, state_hash = hash, "Simulation state hash");
        }

        events
    }

    /// Order a drone to attack `target`.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownEntity`] if either entity is missing, or
    /// [`GameError::MissingComponent`] if `drone` is not a drone.
    pub fn order_attack(&mut self, drone: EntityId, target: EntityId) -> Result<()> {
        if !self.manager.contains(target) {
            return Err(GameError::UnknownEntity(target));
        }
        let record = self.drone_mut(drone)?;
        record.target = Some(target);
        Ok(())
    }

    /// Order a drone to drop its target and patrol along `heading`.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownEntity`] or
    /// [`GameError::MissingComponent`] as for [`Self::order_attack`].
    pub fn order_patrol(&mut self, drone: EntityId, heading: Vec2Fixed) -> Result<()> {
        let record = self.drone_mut(drone)?;
        record.target = None;
        record.heading = heading;
        Ok(())
    }

    fn drone_mut(&mut self, drone: EntityId) -> Result<&mut Drone> {
        if !self.manager.contains(drone) {
            return Err(GameError::UnknownEntity(drone));
        }
        self.manager
            .get_component_mut::<Drone>(drone)
            .ok_or(GameError::MissingComponent {
                entity: drone,
                component: "Drone",
            })
    }

    /// Hash of the gameplay state.
    ///
    /// Two simulations with identical state produce identical hashes.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.tick.hash(&mut hasher);
        self.elapsed.hash(&mut hasher);

        let ids = self.manager.all_entity_ids();
        ids.len().hash(&mut hasher);
        for id in ids {
            id.hash(&mut hasher);
            self.manager.faction_of(id).hash(&mut hasher);
            self.manager.get_component::<Transform>(id).hash(&mut hasher);
            self.manager.get_component::<Drone>(id).hash(&mut hasher);
            self.manager.get_component::<Shield>(id).hash(&mut hasher);
            self.manager.get_component::<Factory>(id).hash(&mut hasher);
            self.manager.get_component::<PowerPlant>(id).hash(&mut hasher);
            self.manager.get_component::<Garrison>(id).hash(&mut hasher);
            self.manager.get_component::<AiController>(id).hash(&mut hasher);
        }

        if let Ok(state) = self.manager.game_state() {
            for &faction in state.players() {
                state.drone_count(faction).hash(&mut hasher);
                state.energy(faction).hash(&mut hasher);
            }
            state.is_game_over().hash(&mut hasher);
            state.winner().hash(&mut hasher);
        }

        hasher.finish()
    }
}

/// Per-faction summary, for logs and headless reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactionSummary {
    /// Faction summarised.
    pub faction: Faction,
    /// Drones owned.
    pub drones: u32,
    /// Energy available.
    #[serde(with = "fixed_serde")]
    pub energy: Fixed,
    /// Factories owned.
    pub factories: usize,
    /// Power plants owned.
    pub power_plants: usize,
}

impl Simulation {
    /// Summaries for every registered player.
    #[must_use]
    pub fn faction_summaries(&self) -> Vec<FactionSummary> {
        let Ok(state) = self.manager.game_state() else {
            return Vec::new();
        };
        let owned_by = |faction: Faction, ids: Vec<EntityId>| {
            ids.into_iter()
                .filter(|&id| self.manager.faction_of(id) == Some(faction))
                .count()
        };
        state
            .players()
            .iter()
            .map(|&faction| FactionSummary {
                faction,
                drones: state.drone_count(faction),
                energy: state.energy(faction),
                factories: owned_by(faction, self.manager.factories().to_vec()),
                power_plants: owned_by(faction, self.manager.store().ids_with::<PowerPlant>()),
            })
            .collect()
    }
}
