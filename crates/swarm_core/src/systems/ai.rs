//! Periodic AI target assignment.

use serde::{Deserialize, Serialize};

use crate::components::{AiController, Drone, EntityId, Factory, PowerPlant};
use crate::config::DifficultySettings;
use crate::factions::Faction;
use crate::manager::EntityManager;
use crate::math::{Fixed, Vec2Fixed};

/// A target chosen by an AI decision pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetAssignment {
    /// Controller entity that made the decision.
    pub controller: EntityId,
    /// Drone that received the order.
    pub drone: EntityId,
    /// New target.
    pub target: EntityId,
}

/// Advances every AI controller and runs due decision passes.
///
/// A controller decides once its timer reaches `decision_timer_max`. The
/// timer then restarts from zero and adopts the current difficulty's
/// interval, so a difficulty change applies from the next period on.
///
/// A pass walks the drone index and gives each of the faction's drones
/// that is idle or holds an invalid target the nearest hostile drone or
/// structure within `max_distance_to_attack`. At most
/// `max_executions_per_turn` drones are assigned per pass.
pub fn ai_decision_system(
    manager: &mut EntityManager,
    difficulty: &DifficultySettings,
    dt: Fixed,
) -> Vec<TargetAssignment> {
    let mut assignments = Vec::new();

    for controller in manager.store().ids_with::<AiController>() {
        let Some(faction) = manager.faction_of(controller) else {
            continue;
        };
        let Some(ai) = manager.get_component_mut::<AiController>(controller) else {
            continue;
        };

        ai.decision_timer += dt;
        if ai.decision_timer < ai.decision_timer_max {
            continue;
        }
        ai.decision_timer = Fixed::ZERO;
        ai.decision_timer_max = difficulty.decision_interval;

        let before = assignments.len();
        decision_pass(manager, difficulty, controller, faction, &mut assignments);
        let made = &assignments[before..];

        if let Some(last) = made.last() {
            if let Some(ai) = manager.get_component_mut::<AiController>(controller) {
                ai.highlighted = Some(last.target);
            }
        }
        tracing::debug!(controller, ?faction, assigned = made.len(), "AI decision pass");
    }
    assignments
}

fn decision_pass(
    manager: &mut EntityManager,
    difficulty: &DifficultySettings,
    controller: EntityId,
    faction: Faction,
    assignments: &mut Vec<TargetAssignment>,
) {
    let range = difficulty.max_distance_to_attack;
    let targets = candidate_targets(manager, faction);
    let mut executions = 0;

    let drones = manager.drones().to_vec();
    for drone_id in drones {
        if executions >= difficulty.max_executions_per_turn {
            break;
        }
        if manager.faction_of(drone_id) != Some(faction) {
            continue;
        }
        let Some(position) = manager.position_of(drone_id) else {
            continue;
        };
        if !needs_target(manager, drone_id, position, range) {
            continue;
        }

        let Some(target) = nearest(&targets, position, range) else {
            continue;
        };
        if let Some(drone) = manager.get_component_mut::<Drone>(drone_id) {
            drone.target = Some(target);
        }
        tracing::trace!(drone = drone_id, target, "AI assigned target");
        assignments.push(TargetAssignment {
            controller,
            drone: drone_id,
            target,
        });
        executions += 1;
    }
}

/// Hostile drones and structures, in id order.
fn candidate_targets(manager: &EntityManager, faction: Faction) -> Vec<(EntityId, Vec2Fixed)> {
    manager
        .iter()
        .filter(|e| e.has::<Drone>() || e.has::<Factory>() || e.has::<PowerPlant>())
        .filter_map(|e| {
            let other = e.get::<Faction>()?;
            let position = manager.position_of(e.id())?;
            faction.is_hostile_to(*other).then_some((e.id(), position))
        })
        .collect()
}

/// Idle, or the current target is gone, friendly or out of reach.
fn needs_target(
    manager: &EntityManager,
    drone: EntityId,
    position: Vec2Fixed,
    range: Fixed,
) -> bool {
    let Some(target) = manager.get_component::<Drone>(drone).and_then(|d| d.target) else {
        return true;
    };
    if !manager.contains(target) {
        return true;
    }
    let friendly = match (manager.faction_of(drone), manager.faction_of(target)) {
        (Some(own), Some(other)) => !own.is_hostile_to(other),
        _ => false,
    };
    let in_reach = manager
        .position_of(target)
        .is_some_and(|p| position.within(p, range));
    friendly || !in_reach
}

/// First closest candidate within range.
fn nearest(targets: &[(EntityId, Vec2Fixed)], from: Vec2Fixed, range: Fixed) -> Option<EntityId> {
    let mut best: Option<(EntityId, Fixed)> = None;
    for &(id, position) in targets {
        if !from.within(position, range) {
            continue;
        }
        let d = from.distance_squared(position);
        if best.map_or(true, |(_, best_d)| d < best_d) {
            best = Some((id, d));
        }
    }
    best.map(|(id, _)| id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Shield;
    use crate::config::{DifficultyLevel, DroneSettings};
    use crate::scenario::{spawn_ai_controller, spawn_drone, spawn_factory};

    fn fx(n: f64) -> Fixed {
        Fixed::from_num(n)
    }

    fn difficulty(interval: f64, executions: u32, distance: f64) -> DifficultySettings {
        DifficultySettings {
            decision_interval: fx(interval),
            max_executions_per_turn: executions,
            max_distance_to_attack: fx(distance),
        }
    }

    fn ai_world(drones: usize) -> (EntityManager, EntityId, Vec<EntityId>) {
        let mut manager = EntityManager::new();
        manager.create_game_state(Faction::PLAYERS).unwrap();
        let controller = spawn_ai_controller(&mut manager, Faction::Player2, fx(1.0)).unwrap();
        let ids = (0..drones)
            .map(|_| {
                let settings = DroneSettings::default();
                spawn_drone(&mut manager, Faction::Player2, Vec2Fixed::ZERO, &settings).unwrap()
            })
            .collect();
        (manager, controller, ids)
    }

    fn enemy_factory(manager: &mut EntityManager, x: i32) -> EntityId {
        spawn_factory(
            manager,
            "Factory #0",
            Vec2Fixed::from_ints(x, 0),
            Faction::Player1,
            fx(1.0),
            Shield::new(fx(100.0), fx(1.0)),
        )
        .unwrap()
    }

    #[test]
    fn test_pass_waits_for_timer() {
        let (mut manager, _, _) = ai_world(1);
        enemy_factory(&mut manager, 10);
        let settings = difficulty(1.0, 10, 500.0);

        assert!(ai_decision_system(&mut manager, &settings, fx(0.5)).is_empty());
        assert_eq!(ai_decision_system(&mut manager, &settings, fx(0.5)).len(), 1);
    }

    #[test]
    fn test_at_most_one_pass_per_interval() {
        let (mut manager, _, drones) = ai_world(1);
        enemy_factory(&mut manager, 10);
        let settings = difficulty(2.0, 10, 500.0);

        // one huge step still triggers a single pass
        let made = ai_decision_system(&mut manager, &settings, fx(10.0));
        assert_eq!(made.len(), 1);
        manager.get_component_mut::<Drone>(drones[0]).unwrap().clear_target();

        // new interval is 2s: 1.5s later nothing happens
        assert!(ai_decision_system(&mut manager, &settings, fx(1.5)).is_empty());
        assert_eq!(ai_decision_system(&mut manager, &settings, fx(0.5)).len(), 1);
    }

    #[test]
    fn test_cap_limits_assignments() {
        let (mut manager, controller, drones) = ai_world(5);
        let target = enemy_factory(&mut manager, 10);
        let settings = difficulty(1.0, 2, 500.0);

        let made = ai_decision_system(&mut manager, &settings, fx(1.0));
        assert_eq!(made.len(), 2);
        assert_eq!(made[0].drone, drones[0]);
        assert_eq!(made[1].drone, drones[1]);
        assert!(manager.get_component::<Drone>(drones[2]).unwrap().is_idle());
        assert_eq!(
            manager.get_component::<AiController>(controller).unwrap().highlighted,
            Some(target)
        );
    }

    #[test]
    fn test_picks_nearest_in_range() {
        let (mut manager, _, drones) = ai_world(1);
        let far = enemy_factory(&mut manager, 400);
        let near = enemy_factory(&mut manager, 100);
        enemy_factory(&mut manager, 900);

        let made = ai_decision_system(&mut manager, &difficulty(1.0, 10, 500.0), fx(1.0));
        assert_eq!(made[0].target, near);

        manager.destroy(near);
        let made = ai_decision_system(&mut manager, &difficulty(1.0, 10, 500.0), fx(1.0));
        assert_eq!(made[0].target, far);
        assert_eq!(manager.get_component::<Drone>(drones[0]).unwrap().target, Some(far));
    }

    #[test]
    fn test_nothing_in_range() {
        let (mut manager, controller, _) = ai_world(1);
        enemy_factory(&mut manager, 900);
        let made = ai_decision_system(&mut manager, &difficulty(1.0, 10, 500.0), fx(1.0));
        assert!(made.is_empty());
        assert!(manager.get_component::<AiController>(controller).unwrap().highlighted.is_none());
    }

    #[test]
    fn test_busy_drones_keep_targets() {
        let (mut manager, _, drones) = ai_world(1);
        let first = enemy_factory(&mut manager, 100);
        let settings = difficulty(1.0, 10, 500.0);
        ai_decision_system(&mut manager, &settings, fx(1.0));

        enemy_factory(&mut manager, 5);
        assert!(ai_decision_system(&mut manager, &settings, fx(1.0)).is_empty());
        assert_eq!(manager.get_component::<Drone>(drones[0]).unwrap().target, Some(first));
    }

    #[test]
    fn test_difficulty_change_applies_after_reset() {
        let (mut manager, controller, _) = ai_world(0);
        let easy = DifficultyLevel::Easy.settings();
        ai_decision_system(&mut manager, &easy, fx(1.0));
        let ai = manager.get_component::<AiController>(controller).unwrap();
        assert_eq!(ai.decision_timer_max, fx(10.0));
        assert_eq!(ai.decision_timer, Fixed::ZERO);
    }
}
