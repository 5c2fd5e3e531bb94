//! Energy accrual and drone production.

use std::collections::BTreeMap;

use crate::components::{EntityId, Factory, Garrison, PowerPlant};
use crate::config::SimConfig;
use crate::factions::Faction;
use crate::manager::EntityManager;
use crate::math::Fixed;
use crate::scenario::spawn_drone;

/// What production did this tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductionReport {
    /// Drones spawned, in factory order.
    pub spawned: Vec<EntityId>,
    /// Neutral structures whose garrison grew.
    pub reinforced: Vec<EntityId>,
}

/// Runs power-plant accrual, then advances every factory.
///
/// Power plants feed `energy_regen × dt` into their faction's pool until it
/// reaches the sum of that faction's plant capacities.
///
/// Player factories spawn one drone per whole unit of progress while the
/// faction can afford it. A blocked factory keeps accruing; every whole unit
/// banked while blocked is spent once energy recovers and the fractional
/// remainder carries over. Neutral factories grow their garrison instead.
///
/// Without a GameState nothing is spawned or accrued.
pub fn production_system(
    manager: &mut EntityManager,
    config: &SimConfig,
    dt: Fixed,
) -> ProductionReport {
    let mut report = ProductionReport::default();
    accrue_energy(manager, dt);

    let ids = manager.factories().to_vec();
    for id in ids {
        let Some(faction) = manager.faction_of(id) else {
            continue;
        };
        match manager.get_component_mut::<Factory>(id) {
            Some(factory) => factory.advance(dt),
            None => continue,
        }

        if faction.is_player() {
            produce_drones(manager, config, id, faction, &mut report);
        } else {
            reinforce_garrison(manager, id, &mut report);
        }
    }
    report
}

fn accrue_energy(manager: &mut EntityManager, dt: Fixed) {
    let mut plants: Vec<(EntityId, Faction, PowerPlant)> = manager
        .components::<PowerPlant>()
        .filter_map(|(id, plant)| Some((id, manager.faction_of(id)?, *plant)))
        .collect();
    plants.sort_unstable_by_key(|(id, _, _)| *id);

    let mut caps: BTreeMap<Faction, Fixed> = BTreeMap::new();
    for (_, faction, plant) in &plants {
        *caps.entry(*faction).or_insert(Fixed::ZERO) += Fixed::from_num(plant.capacity);
    }

    let Ok(state) = manager.game_state_mut() else {
        return;
    };
    for (_, faction, plant) in plants {
        if !state.players().contains(&faction) {
            continue;
        }
        let cap = caps.get(&faction).copied().unwrap_or(Fixed::ZERO);
        state.accrue_energy(faction, plant.energy_regen * dt, cap);
    }
}

fn produce_drones(
    manager: &mut EntityManager,
    config: &SimConfig,
    id: EntityId,
    faction: Faction,
    report: &mut ProductionReport,
) {
    let Some(position) = manager.position_of(id) else {
        return;
    };

    loop {
        let ready = manager
            .get_component::<Factory>(id)
            .is_some_and(Factory::has_ready_unit);
        if !ready {
            break;
        }

        let affordable = manager
            .game_state()
            .is_ok_and(|state| state.can_spawn(faction));
        if !affordable {
            break;
        }

        match spawn_drone(manager, faction, position, &config.drone) {
            Ok(drone) => {
                tracing::debug!(factory = id, drone, ?faction, "Drone produced");
                report.spawned.push(drone);
            }
            Err(e) => {
                tracing::warn!(factory = id, error = %e, "Drone spawn failed");
                break;
            }
        }
        if let Some(factory) = manager.get_component_mut::<Factory>(id) {
            factory.take_unit();
        }
    }
}

fn reinforce_garrison(manager: &mut EntityManager, id: EntityId, report: &mut ProductionReport) {
    let mut ready = 0;
    if let Some(factory) = manager.get_component_mut::<Factory>(id) {
        while factory.has_ready_unit() {
            factory.take_unit();
            ready += 1;
        }
    }
    if ready == 0 {
        return;
    }

    match manager.get_component_mut::<Garrison>(id) {
        Some(garrison) => garrison.reinforce(ready),
        None => {
            if manager.add_component(id, Garrison::new(ready)).is_err() {
                return;
            }
        }
    }
    report.reinforced.push(id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Shield;
    use crate::math::Vec2Fixed;
    use crate::scenario::{spawn_factory, spawn_power_plant};

    fn fx(n: f64) -> Fixed {
        Fixed::from_num(n)
    }

    fn shield() -> Shield {
        Shield::new(fx(100.0), fx(1.0))
    }

    fn setup(energy: f64) -> (EntityManager, EntityId) {
        let mut manager = EntityManager::new();
        manager.create_game_state(Faction::PLAYERS).unwrap();
        manager
            .game_state_mut()
            .unwrap()
            .set_energy(Faction::Player1, fx(energy));
        let factory = spawn_factory(
            &mut manager,
            "Factory #0",
            Vec2Fixed::from_ints(100, 100),
            Faction::Player1,
            fx(1.0),
            shield(),
        )
        .unwrap();
        (manager, factory)
    }

    #[test]
    fn test_spawns_at_factory_position() {
        let (mut manager, _) = setup(100.0);
        let report = production_system(&mut manager, &SimConfig::default(), fx(1.0));
        assert_eq!(report.spawned.len(), 1);
        let drone = report.spawned[0];
        assert_eq!(manager.position_of(drone), Some(Vec2Fixed::from_ints(100, 100)));
        assert_eq!(manager.faction_of(drone), Some(Faction::Player1));
        assert!(manager.has_component::<Shield>(drone));
        assert_eq!(manager.game_state().unwrap().drone_count(Faction::Player1), 1);
    }

    #[test]
    fn test_large_dt_spawns_several() {
        let (mut manager, _) = setup(100.0);
        let report = production_system(&mut manager, &SimConfig::default(), fx(3.0));
        assert_eq!(report.spawned.len(), 3);
    }

    #[test]
    fn test_blocked_progress_is_banked() {
        // 1 <= 0 + 1: blocked from the start
        let (mut manager, factory) = setup(1.0);
        let config = SimConfig::default();
        for _ in 0..4 {
            let report = production_system(&mut manager, &config, fx(0.75));
            assert!(report.spawned.is_empty());
        }
        let acc = manager.get_component::<Factory>(factory).unwrap().accumulator;
        assert_eq!(acc, fx(3.0));

        // 2.5 affords a first and second drone, then 2.5 <= 2 + 1 blocks again
        manager
            .game_state_mut()
            .unwrap()
            .set_energy(Faction::Player1, fx(2.5));
        let report = production_system(&mut manager, &config, Fixed::ZERO);
        assert_eq!(report.spawned.len(), 2);
        let acc = manager.get_component::<Factory>(factory).unwrap().accumulator;
        assert_eq!(acc, Fixed::ONE);
    }

    #[test]
    fn test_long_blocked_tick_keeps_remainder() {
        let (mut manager, factory) = setup(1.0);
        let config = SimConfig::default();

        let report = production_system(&mut manager, &config, fx(2.5));
        assert!(report.spawned.is_empty());

        manager
            .game_state_mut()
            .unwrap()
            .set_energy(Faction::Player1, fx(100.0));
        let report = production_system(&mut manager, &config, Fixed::ZERO);
        assert_eq!(report.spawned.len(), 2);
        let acc = manager.get_component::<Factory>(factory).unwrap().accumulator;
        assert_eq!(acc, fx(0.5));
    }

    #[test]
    fn test_power_plant_accrues_to_capacity() {
        let (mut manager, _) = setup(0.0);
        spawn_power_plant(
            &mut manager,
            "Power Plant #0",
            Vec2Fixed::ZERO,
            Faction::Player1,
            PowerPlant::new(10, fx(4.0)),
            shield(),
        )
        .unwrap();
        let config = SimConfig::default();

        production_system(&mut manager, &config, fx(1.0));
        assert_eq!(manager.game_state().unwrap().energy(Faction::Player1), fx(4.0));
        for _ in 0..5 {
            production_system(&mut manager, &config, fx(1.0));
        }
        assert_eq!(manager.game_state().unwrap().energy(Faction::Player1), fx(10.0));
    }

    #[test]
    fn test_neutral_factory_reinforces_garrison() {
        let mut manager = EntityManager::new();
        manager.create_game_state(Faction::PLAYERS).unwrap();
        let id = spawn_factory(
            &mut manager,
            "Factory #7",
            Vec2Fixed::ZERO,
            Faction::Neutral,
            fx(0.5),
            shield(),
        )
        .unwrap();
        let config = SimConfig::default();

        let report = production_system(&mut manager, &config, fx(1.0));
        assert!(report.reinforced.is_empty());
        let report = production_system(&mut manager, &config, fx(1.0));
        assert_eq!(report.reinforced, vec![id]);
        assert!(report.spawned.is_empty());
        assert_eq!(manager.get_component::<Garrison>(id).unwrap().count, 1);
        assert!(manager.drones().is_empty());
    }

    #[test]
    fn test_missing_game_state_spawns_nothing() {
        let mut manager = EntityManager::new();
        let id = spawn_factory(
            &mut manager,
            "Factory #0",
            Vec2Fixed::ZERO,
            Faction::Player1,
            fx(1.0),
            shield(),
        )
        .unwrap();
        let report = production_system(&mut manager, &SimConfig::default(), fx(2.0));
        assert!(report.spawned.is_empty());
        let acc = manager.get_component::<Factory>(id).unwrap().accumulator;
        assert_eq!(acc, fx(2.0));
    }
}
