//! Shield regeneration.

use crate::components::Shield;
use crate::manager::EntityManager;
use crate::math::Fixed;

/// Regenerates every shield in the shield index by `regen_rate × dt`.
pub fn shield_system(manager: &mut EntityManager, dt: Fixed) {
    let ids = manager.shields().to_vec();
    for id in ids {
        if let Some(shield) = manager.get_component_mut::<Shield>(id) {
            shield.regenerate(dt);
        }
    }
}
