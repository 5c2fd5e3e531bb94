//! Combat resolution.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::components::{Drone, EntityId, Factory, Garrison, PowerPlant, Shield};
use crate::config::SimConfig;
use crate::factions::Faction;
use crate::manager::EntityManager;
use crate::math::{fixed_serde, Fixed};

/// One attack landing on a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageEvent {
    /// Attacking drone.
    pub attacker: EntityId,
    /// Entity hit.
    pub target: EntityId,
    /// Damage dealt this tick.
    #[serde(with = "fixed_serde")]
    pub amount: Fixed,
    /// Portion stopped by the target's shield.
    #[serde(with = "fixed_serde")]
    pub absorbed: Fixed,
    /// Whether the hit destroyed the target.
    pub destroyed: bool,
}

/// Outcome of one combat pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CombatReport {
    /// Every hit, in attacker order.
    pub damage_events: Vec<DamageEvent>,
    /// Entities destroyed this pass.
    pub destroyed: Vec<EntityId>,
    /// Whether the game ended during this pass.
    pub game_over: bool,
}

/// Resolves every drone attack, then re-evaluates game over.
///
/// Damage per tick is `damage_per_second × dt`, dealt only while the
/// target is within `max_distance_to_attack`. Shields soak damage first.
/// Overflow kills drones outright; structures lose garrisoned drones first
/// and fall once the garrison is empty. Dangling or friendly targets are
/// cleared.
pub fn combat_system(manager: &mut EntityManager, config: &SimConfig, dt: Fixed) -> CombatReport {
    let mut report = CombatReport::default();
    let range = config.difficulty.max_distance_to_attack;

    let attackers = manager.drones().to_vec();
    for attacker in attackers {
        let Some(drone) = manager.get_component::<Drone>(attacker).copied() else {
            continue;
        };
        let Some(target) = drone.target else {
            continue;
        };

        if !manager.contains(target) || is_friendly(manager, attacker, target) {
            clear_target(manager, attacker);
            continue;
        }

        let from = manager.position_of(attacker);
        let to = manager.position_of(target);
        let (Some(from), Some(to)) = (from, to) else {
            continue;
        };
        if !from.within(to, range) {
            continue;
        }

        let amount = drone.damage_per_second * dt;
        if amount <= Fixed::ZERO {
            continue;
        }

        let (absorbed, destroyed) = apply_damage(manager, config, target, amount);
        report.damage_events.push(DamageEvent {
            attacker,
            target,
            amount,
            absorbed,
            destroyed,
        });

        if destroyed {
            destroy_target(manager, target);
            clear_target(manager, attacker);
            report.destroyed.push(target);
        }
    }

    report.game_over = evaluate_game_over(manager);
    report
}

fn is_friendly(manager: &EntityManager, attacker: EntityId, target: EntityId) -> bool {
    match (manager.faction_of(attacker), manager.faction_of(target)) {
        (Some(own), Some(other)) => !own.is_hostile_to(other),
        _ => false,
    }
}

fn clear_target(manager: &mut EntityManager, attacker: EntityId) {
    if let Some(drone) = manager.get_component_mut::<Drone>(attacker) {
        drone.clear_target();
    }
}

/// Returns `(absorbed_by_shield, destroyed)`.
fn apply_damage(
    manager: &mut EntityManager,
    config: &SimConfig,
    target: EntityId,
    amount: Fixed,
) -> (Fixed, bool) {
    let overflow = match manager.get_component_mut::<Shield>(target) {
        Some(shield) => shield.absorb(amount),
        None => amount,
    };
    let absorbed = amount - overflow;
    if overflow <= Fixed::ZERO {
        return (absorbed, false);
    }

    if manager.has_component::<Drone>(target) {
        return (absorbed, true);
    }

    let destroyed = match manager.get_component_mut::<Garrison>(target) {
        Some(garrison) => {
            let leftover = garrison.absorb(overflow, config.combat.garrison_durability);
            leftover > Fixed::ZERO
        }
        None => true,
    };
    (absorbed, destroyed)
}

fn destroy_target(manager: &mut EntityManager, target: EntityId) {
    let faction = manager.faction_of(target);
    let is_drone = manager.has_component::<Drone>(target);
    let plant_capacity = manager.get_component::<PowerPlant>(target).map(|p| p.capacity);

    if let (Some(faction), Ok(state)) = (faction, manager.game_state_mut()) {
        if is_drone {
            state.remove_drone(faction);
        }
        if let Some(capacity) = plant_capacity {
            state.drain_energy(faction, Fixed::from_num(capacity));
        }
    }

    if manager.destroy(target) {
        tracing::debug!(entity = target, ?faction, "Entity destroyed in combat");
    } else {
        tracing::warn!(entity = target, "Combat tried to destroy an unknown entity");
    }
}

fn evaluate_game_over(manager: &mut EntityManager) -> bool {
    let structure_owners: BTreeSet<Faction> = manager
        .components::<Factory>()
        .map(|(id, _)| id)
        .chain(manager.components::<PowerPlant>().map(|(id, _)| id))
        .filter_map(|id| manager.faction_of(id))
        .collect();

    let Ok(state) = manager.game_state_mut() else {
        return false;
    };
    let ended = state.evaluate_game_over(&structure_owners);
    if ended {
        tracing::info!(winner = ?state.winner(), "Game over");
    }
    ended
}
