//! Game metrics collection for batch statistics.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use swarm_core::components::{Drone, EntityId, Factory, PowerPlant};
use swarm_core::factions::Faction;
use swarm_core::simulation::{Simulation, TickEvents};

/// How a game ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WinCondition {
    /// One player was left standing.
    Elimination,
    /// Every player fell on the same tick.
    Draw,
    /// The tick budget ran out first.
    #[default]
    Timeout,
}

/// Complete metrics for a single game.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameMetrics {
    /// Unique game identifier.
    pub game_id: String,
    /// Layout seed.
    pub seed: u64,
    /// Total game duration in ticks.
    pub duration_ticks: u64,
    /// Simulated seconds.
    pub elapsed_seconds: f64,
    /// Winning faction (None = draw or timeout).
    pub winner: Option<String>,
    /// How the game ended.
    pub win_condition: WinCondition,
    /// Per-faction metrics, keyed by faction name.
    pub factions: BTreeMap<String, FactionMetrics>,
    /// Final simulation state hash (for determinism validation).
    pub final_state_hash: u64,
}

impl GameMetrics {
    /// Create an empty metrics record.
    #[must_use]
    pub fn new(game_id: impl Into<String>, seed: u64) -> Self {
        Self {
            game_id: game_id.into(),
            seed,
            ..Default::default()
        }
    }

    /// Get or create faction metrics.
    pub fn faction_mut(&mut self, faction: Faction) -> &mut FactionMetrics {
        self.factions
            .entry(faction_key(faction))
            .or_insert_with(|| FactionMetrics::new(faction))
    }
}

/// Metrics for a single faction in a game.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FactionMetrics {
    /// Faction name.
    pub faction: String,
    /// Drones built by factories.
    pub drones_produced: u32,
    /// Drones destroyed.
    pub drones_lost: u32,
    /// Factories and power plants destroyed.
    pub structures_lost: u32,
    /// Damage dealt by this faction's drones.
    pub damage_dealt: f64,
    /// Damage taken, shields included.
    pub damage_taken: f64,
    /// Tick of the first hit this faction landed.
    pub first_attack_tick: Option<u64>,
    /// Drones owned at the end.
    pub final_drones: u32,
    /// Energy at the end.
    pub final_energy: f64,
    /// Factories owned at the end.
    pub final_factories: usize,
    /// Power plants owned at the end.
    pub final_power_plants: usize,
}

impl FactionMetrics {
    /// Create empty metrics for `faction`.
    #[must_use]
    pub fn new(faction: Faction) -> Self {
        Self {
            faction: faction_key(faction),
            ..Default::default()
        }
    }
}

fn faction_key(faction: Faction) -> String {
    faction.display_name().to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tracked {
    Drone,
    Structure,
}

/// Accumulates [`GameMetrics`] from tick events.
///
/// Destroyed entities are gone from the manager by the time their event is
/// seen, so the collector remembers who owned every drone and structure.
#[derive(Debug)]
pub struct MetricsCollector {
    metrics: GameMetrics,
    owners: HashMap<EntityId, (Faction, Tracked)>,
}

impl MetricsCollector {
    /// Start collecting for a freshly built simulation.
    #[must_use]
    pub fn new(game_id: impl Into<String>, seed: u64, sim: &Simulation) -> Self {
        let mut metrics = GameMetrics::new(game_id, seed);
        let owners = sim
            .manager()
            .iter()
            .filter_map(|e| {
                let faction = *e.get::<Faction>()?;
                let tracked = if e.has::<Drone>() {
                    Tracked::Drone
                } else if e.has::<Factory>() || e.has::<PowerPlant>() {
                    Tracked::Structure
                } else {
                    return None;
                };
                Some((e.id(), (faction, tracked)))
            })
            .collect();
        for summary in sim.faction_summaries() {
            metrics.faction_mut(summary.faction);
        }
        Self { metrics, owners }
    }

    /// Fold one tick's events into the metrics.
    pub fn record_tick(&mut self, sim: &Simulation, events: &TickEvents) {
        let tick = sim.get_tick();

        for &drone in &events.spawned {
            if let Some(faction) = sim.manager().faction_of(drone) {
                self.owners.insert(drone, (faction, Tracked::Drone));
                self.metrics.faction_mut(faction).drones_produced += 1;
            }
        }

        for hit in &events.damage_events {
            let amount = hit.amount.to_num::<f64>();
            if let Some(faction) = self.owner(sim, hit.attacker) {
                let attacker = self.metrics.faction_mut(faction);
                attacker.damage_dealt += amount;
                attacker.first_attack_tick.get_or_insert(tick);
            }
            if let Some(faction) = self.owner(sim, hit.target) {
                self.metrics.faction_mut(faction).damage_taken += amount;
            }
        }

        for id in &events.destroyed {
            let Some((faction, tracked)) = self.owners.remove(id) else {
                continue;
            };
            let entry = self.metrics.faction_mut(faction);
            match tracked {
                Tracked::Drone => entry.drones_lost += 1,
                Tracked::Structure => entry.structures_lost += 1,
            }
        }
    }

    fn owner(&self, sim: &Simulation, id: EntityId) -> Option<Faction> {
        self.owners
            .get(&id)
            .map(|(faction, _)| *faction)
            .or_else(|| sim.manager().faction_of(id))
    }

    /// Close the record with the final state.
    #[must_use]
    pub fn finish(mut self, sim: &Simulation) -> GameMetrics {
        for summary in sim.faction_summaries() {
            let entry = self.metrics.faction_mut(summary.faction);
            entry.final_drones = summary.drones;
            entry.final_energy = summary.energy.to_num::<f64>();
            entry.final_factories = summary.factories;
            entry.final_power_plants = summary.power_plants;
        }

        let state = sim.manager().game_state().ok();
        let over = state.is_some_and(|s| s.is_game_over());
        let winner = state.and_then(|s| s.winner());
        self.metrics.win_condition = match (over, winner) {
            (true, Some(_)) => WinCondition::Elimination,
            (true, None) => WinCondition::Draw,
            (false, _) => WinCondition::Timeout,
        };
        self.metrics.winner = winner.map(faction_key);
        self.metrics.duration_ticks = sim.get_tick();
        self.metrics.elapsed_seconds = sim.elapsed().to_num::<f64>();
        self.metrics.final_state_hash = sim.state_hash();
        self.metrics
    }
}

/// Aggregate statistics over a batch of games.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Total games played.
    pub total_games: u32,
    /// Games won by each faction.
    pub wins_by_faction: BTreeMap<String, u32>,
    /// Win rates by faction.
    pub win_rates: BTreeMap<String, f64>,
    /// Games ending with every player eliminated together.
    pub draws: u32,
    /// Games that hit the tick budget.
    pub timeouts: u32,
    /// Average game duration in ticks.
    pub avg_duration_ticks: f64,
    /// Shortest game.
    pub min_duration_ticks: u64,
    /// Longest game.
    pub max_duration_ticks: u64,
    /// Average drones produced per game by faction.
    pub avg_drones_produced: BTreeMap<String, f64>,
    /// Average damage dealt per game by faction.
    pub avg_damage_dealt: BTreeMap<String, f64>,
}

impl BatchSummary {
    /// Calculate summary from a list of game metrics.
    #[must_use]
    pub fn from_games(games: &[GameMetrics]) -> Self {
        if games.is_empty() {
            return Self::default();
        }

        let total = games.len() as f64;
        let mut summary = Self {
            total_games: games.len() as u32,
            min_duration_ticks: u64::MAX,
            ..Default::default()
        };

        let mut duration_sum = 0u64;
        for game in games {
            duration_sum += game.duration_ticks;
            summary.min_duration_ticks = summary.min_duration_ticks.min(game.duration_ticks);
            summary.max_duration_ticks = summary.max_duration_ticks.max(game.duration_ticks);

            match (&game.winner, game.win_condition) {
                (Some(winner), _) => {
                    *summary.wins_by_faction.entry(winner.clone()).or_default() += 1;
                }
                (None, WinCondition::Draw) => summary.draws += 1,
                (None, _) => summary.timeouts += 1,
            }

            for (name, faction) in &game.factions {
                *summary.avg_drones_produced.entry(name.clone()).or_default() +=
                    f64::from(faction.drones_produced);
                *summary.avg_damage_dealt.entry(name.clone()).or_default() += faction.damage_dealt;
            }
        }

        summary.avg_duration_ticks = duration_sum as f64 / total;
        summary.win_rates = summary
            .wins_by_faction
            .iter()
            .map(|(name, wins)| (name.clone(), f64::from(*wins) / total))
            .collect();
        for value in summary
            .avg_drones_produced
            .values_mut()
            .chain(summary.avg_damage_dealt.values_mut())
        {
            *value /= total;
        }
        summary
    }
}
