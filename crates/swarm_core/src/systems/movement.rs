//! Drone movement and map wrapping.

use crate::components::{Drone, Transform};
use crate::config::SimConfig;
use crate::manager::EntityManager;
use crate::math::{Fixed, Vec2Fixed};

/// Moves drones along their intent and wraps them onto the torus.
///
/// A drone with a live target closes in at `speed` until it is within
/// `engage_distance`, never overshooting. A drone without one follows its
/// patrol heading. Positions always end in `[0, width) × [0, height)`.
pub fn movement_system(manager: &mut EntityManager, config: &SimConfig, dt: Fixed) {
    let ids = manager.drones().to_vec();
    for id in ids {
        let Some(drone) = manager.get_component::<Drone>(id).copied() else {
            continue;
        };
        let Some(position) = manager.position_of(id) else {
            continue;
        };

        let step = drone.speed * dt;
        let target_position = drone.target.and_then(|t| manager.position_of(t));
        let next = match target_position {
            Some(goal) => approach(position, goal, step, config.combat.engage_distance),
            None if !drone.heading.is_zero() => position + drone.heading.normalize().scale(step),
            None => position,
        };

        let wrapped = next.wrap(config.map_width, config.map_height);
        if let Some(transform) = manager.get_component_mut::<Transform>(id) {
            transform.position = wrapped;
        }
    }
}

fn approach(from: Vec2Fixed, to: Vec2Fixed, step: Fixed, engage_distance: Fixed) -> Vec2Fixed {
    let delta = to - from;
    let distance = delta.length();
    if distance <= engage_distance || step <= Fixed::ZERO {
        return from;
    }
    let travel = step.min(distance - engage_distance);
    from + delta.normalize().scale(travel)
}
