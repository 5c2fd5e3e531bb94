//! Label text refresh.

use crate::components::{Drone, EntityId, Factory, Garrison, Label, PowerPlant, Shield, Tag};
use crate::manager::EntityManager;

/// Recomputes the text of every [`Label`] from its entity's records.
///
/// Only labels are written. Returns how many changed.
pub fn label_system(manager: &mut EntityManager) -> usize {
    let ids = manager.store().ids_with::<Label>();
    let mut changed = 0;
    for id in ids {
        let Some(text) = label_text(manager, id) else {
            continue;
        };
        if let Some(label) = manager.get_component_mut::<Label>(id) {
            if label.text != text {
                label.text = text;
                changed += 1;
            }
        }
    }
    changed
}

/// Text for an entity's label, or `None` to leave it unchanged.
#[must_use]
pub fn label_text(manager: &EntityManager, id: EntityId) -> Option<String> {
    let garrison = manager
        .get_component::<Garrison>(id)
        .map(|g| format!("\nDrones stationed: {}", g.count))
        .unwrap_or_default();

    if let Some(factory) = manager.get_component::<Factory>(id) {
        return Some(format!("{}{garrison}", factory.name));
    }

    if let Some(plant) = manager.get_component::<PowerPlant>(id) {
        let name = manager
            .get_component::<Tag>(id)
            .map_or("Power Plant", |tag| tag.name.as_str());
        return Some(format!("{name}\nCapacity: {}{garrison}", plant.capacity));
    }

    if manager.has_component::<Drone>(id) {
        let shield = manager.get_component::<Shield>(id)?;
        return Some(format!(
            "{:.1}/{:.1}",
            shield.current.to_num::<f64>(),
            shield.max.to_num::<f64>()
        ));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DroneSettings;
    use crate::factions::Faction;
    use crate::math::{Fixed, Vec2Fixed};
    use crate::scenario::{spawn_drone, spawn_factory, spawn_power_plant};

    #[test]
    fn test_structure_labels() {
        let mut manager = EntityManager::new();
        let shield = Shield::new(Fixed::from_num(10), Fixed::ONE);
        let factory = spawn_factory(
            &mut manager,
            "Factory #3",
            Vec2Fixed::ZERO,
            Faction::Neutral,
            Fixed::ONE,
            shield,
        )
        .unwrap();
        manager.add_component(factory, Garrison::new(4)).unwrap();
        let plant = spawn_power_plant(
            &mut manager,
            "Power Plant #5",
            Vec2Fixed::ZERO,
            Faction::Neutral,
            PowerPlant::new(12, Fixed::ONE),
            shield,
        )
        .unwrap();

        assert_eq!(label_system(&mut manager), 2);
        assert_eq!(
            manager.get_component::<Label>(factory).unwrap().text,
            "Factory #3\nDrones stationed: 4"
        );
        assert_eq!(
            manager.get_component::<Label>(plant).unwrap().text,
            "Power Plant #5\nCapacity: 12"
        );
        // unchanged on a second pass
        assert_eq!(label_system(&mut manager), 0);
    }

    #[test]
    fn test_drone_label_tracks_shield() {
        let mut manager = EntityManager::new();
        let drone = spawn_drone(
            &mut manager,
            Faction::Player1,
            Vec2Fixed::ZERO,
            &DroneSettings::default(),
        )
        .unwrap();
        label_system(&mut manager);
        assert_eq!(manager.get_component::<Label>(drone).unwrap().text, "10.0/10.0");

        manager.get_component_mut::<Shield>(drone).unwrap().current = Fixed::from_num(2.5);
        assert_eq!(label_system(&mut manager), 1);
        assert_eq!(manager.get_component::<Label>(drone).unwrap().text, "2.5/10.0");
    }
}
