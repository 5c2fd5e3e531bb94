//! Property tests over randomized inputs.

use proptest::prelude::*;
use swarm_core::components::{Drone, Factory, Shield};
use swarm_core::config::{DroneSettings, SimConfig};
use swarm_core::factions::Faction;
use swarm_core::game_state::GameState;
use swarm_core::manager::EntityManager;
use swarm_core::math::{Fixed, Vec2Fixed};
use swarm_core::scenario::spawn_drone;
use swarm_core::systems::{movement_system, shield_system};
use swarm_test_utils::determinism::strategies::{
    arb_amount, arb_dt, arb_faction, arb_shield, arb_vec2_position,
};
use swarm_test_utils::fixtures::{production_line, sim_with_players};

#[derive(Debug, Clone)]
enum EnergyOp {
    Set(Faction, Fixed),
    Drain(Faction, Fixed),
    Accrue(Faction, Fixed, Fixed),
    AddDrone(Faction),
    RemoveDrone(Faction),
}

fn arb_energy_op() -> impl Strategy<Value = EnergyOp> {
    prop_oneof![
        (arb_faction(), (-50i32..50).prop_map(Fixed::from_num))
            .prop_map(|(f, n)| EnergyOp::Set(f, n)),
        (arb_faction(), arb_amount(100)).prop_map(|(f, n)| EnergyOp::Drain(f, n)),
        (arb_faction(), arb_amount(10), arb_amount(30))
            .prop_map(|(f, n, cap)| EnergyOp::Accrue(f, n, cap)),
        arb_faction().prop_map(EnergyOp::AddDrone),
        arb_faction().prop_map(EnergyOp::RemoveDrone),
    ]
}

proptest! {
    #[test]
    fn shield_stays_within_bounds(
        shields in prop::collection::vec(arb_shield(), 1..8),
        steps in prop::collection::vec(arb_dt(), 1..20),
    ) {
        let mut manager = EntityManager::new();
        let ids: Vec<_> = shields
            .into_iter()
            .map(|shield| {
                let id = manager.create();
                manager.add_component(id, shield).unwrap();
                id
            })
            .collect();

        for dt in steps {
            shield_system(&mut manager, dt);
            for &id in &ids {
                let shield = manager.get_component::<Shield>(id).unwrap();
                prop_assert!(shield.current >= Fixed::ZERO);
                prop_assert!(shield.current <= shield.max);
            }
        }
    }

    #[test]
    fn drones_stay_on_the_map(
        start in arb_vec2_position(),
        heading in arb_vec2_position(),
        steps in prop::collection::vec(arb_dt(), 1..20),
    ) {
        let config = SimConfig::default();
        let mut manager = EntityManager::new();
        let settings = DroneSettings {
            speed: Fixed::from_num(500),
            ..DroneSettings::default()
        };
        let drone = spawn_drone(&mut manager, Faction::Player1, start, &settings).unwrap();
        manager.get_component_mut::<Drone>(drone).unwrap().heading = heading;

        for dt in steps {
            movement_system(&mut manager, &config, dt);
            let p = manager.position_of(drone).unwrap();
            prop_assert!(p.x >= Fixed::ZERO && p.x < config.map_width, "x: {}", p.x);
            prop_assert!(p.y >= Fixed::ZERO && p.y < config.map_height, "y: {}", p.y);
        }
    }

    #[test]
    fn game_state_never_goes_negative(ops in prop::collection::vec(arb_energy_op(), 0..60)) {
        let mut state = GameState::new(Faction::PLAYERS).unwrap();
        for op in ops {
            match op {
                EnergyOp::Set(f, n) => state.set_energy(f, n),
                EnergyOp::Drain(f, n) => state.drain_energy(f, n),
                EnergyOp::Accrue(f, n, cap) => state.accrue_energy(f, n, cap),
                EnergyOp::AddDrone(f) => state.add_drone(f),
                EnergyOp::RemoveDrone(f) => state.remove_drone(f),
            }
            for faction in [Faction::Player1, Faction::Player2, Faction::Neutral] {
                prop_assert!(state.energy(faction) >= Fixed::ZERO);
            }
        }
    }

    #[test]
    fn wrap_lands_in_bounds(p in arb_vec2_position()) {
        let width = Fixed::from_num(2560);
        let height = Fixed::from_num(1440);
        let w = p.wrap(width, height);
        prop_assert!(w.x >= Fixed::ZERO && w.x < width);
        prop_assert!(w.y >= Fixed::ZERO && w.y < height);
        prop_assert_eq!(w.wrap(width, height), w);
    }

    #[test]
    fn within_matches_true_distance(
        a in arb_vec2_position(),
        b in arb_vec2_position(),
        range in (0i32..300_000).prop_map(Fixed::from_num),
    ) {
        let dx = a.x.to_num::<f64>() - b.x.to_num::<f64>();
        let dy = a.y.to_num::<f64>() - b.y.to_num::<f64>();
        let distance = dx.hypot(dy);
        let range_f = range.to_num::<f64>();
        // Skip the rounding band right at the boundary.
        prop_assume!((distance - range_f).abs() > 1.0);
        prop_assert_eq!(a.within(b, range), distance <= range_f);
    }

    #[test]
    fn headings_normalize_to_unit_length(heading in arb_vec2_position()) {
        prop_assume!(!heading.is_zero());
        let unit = heading.normalize();
        let error = (unit.dot(unit) - Fixed::ONE).abs();
        prop_assert!(error < Fixed::ONE / Fixed::from_num(1000), "|unit|² off by {}", error);
    }

    #[test]
    fn blocked_factory_banks_all_progress(steps in prop::collection::vec(arb_dt(), 1..30)) {
        let mut sim = sim_with_players();
        // 1 <= 0 + 1 keeps the factory blocked
        let line = production_line(&mut sim, Faction::Player1, 1, 10, Fixed::ONE);
        production_line(&mut sim, Faction::Player2, 0, 10, Fixed::ZERO);

        let mut total = Fixed::ZERO;
        for dt in steps {
            prop_assert!(sim.tick(dt).spawned.is_empty());
            total += dt;
        }

        sim.manager_mut()
            .game_state_mut()
            .unwrap()
            .set_energy(Faction::Player1, Fixed::from_num(1_000));
        let spawned = sim.tick(Fixed::ZERO).spawned.len();

        let whole = total.floor();
        prop_assert_eq!(spawned, whole.to_num::<usize>());
        let factory = sim.manager().get_component::<Factory>(line.factory).unwrap();
        prop_assert_eq!(factory.accumulator, total - whole);
    }
}

#[test]
fn zero_heading_is_left_alone() {
    let config = SimConfig::default();
    let mut manager = EntityManager::new();
    let drone = spawn_drone(
        &mut manager,
        Faction::Player1,
        Vec2Fixed::from_ints(3, 4),
        &DroneSettings::default(),
    )
    .unwrap();
    movement_system(&mut manager, &config, Fixed::ONE);
    assert_eq!(manager.position_of(drone), Some(Vec2Fixed::from_ints(3, 4)));
}
