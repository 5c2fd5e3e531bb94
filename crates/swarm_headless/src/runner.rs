//! Single-game runner.
//!
//! Stands in for the frame loop: builds a seeded skirmish and feeds it a
//! fixed `dt` until the game ends or the tick budget runs out.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use swarm_core::config::SimConfig;
use swarm_core::math::{decimal_serde, Fixed};
use swarm_core::scenario::ScenarioConfig;
use swarm_core::simulation::Simulation;
use swarm_core::systems::HudSnapshot;

use crate::error::Result;
use crate::metrics::{GameMetrics, MetricsCollector};

/// Ticks per simulated second at the default frame rate.
pub const TICKS_PER_SECOND: u64 = 60;

/// Default tick budget: five simulated minutes.
pub const DEFAULT_MAX_TICKS: u64 = 5 * 60 * TICKS_PER_SECOND;

/// Everything needed to play one headless game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Tick budget; the game is called a timeout when it runs out.
    pub max_ticks: u64,
    /// Seconds per tick.
    #[serde(with = "decimal_serde")]
    pub dt: Fixed,
    /// Skirmish layout.
    pub scenario: ScenarioConfig,
    /// Simulation tuning.
    pub sim: SimConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_ticks: DEFAULT_MAX_TICKS,
            dt: Fixed::ONE / Fixed::from_num(TICKS_PER_SECOND),
            scenario: ScenarioConfig::default(),
            sim: SimConfig::default(),
        }
    }
}

impl RunConfig {
    /// Parse a run config from RON text.
    ///
    /// # Errors
    ///
    /// Returns a RON error on malformed input, or a game error if the
    /// scenario or simulation settings fail validation.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        let config: Self = ron::from_str(text)?;
        config.scenario.validate()?;
        config.sim.validate()?;
        Ok(config)
    }

    /// Load a run config file such as `scenarios/skirmish.ron`.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file cannot be read, otherwise as for
    /// [`Self::from_ron_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_ron_str(&text)
    }

    /// Same config with a different layout seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.scenario.seed = seed;
        self
    }
}

/// Outcome of a finished run.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Collected metrics.
    pub metrics: GameMetrics,
    /// HUD as it stood on the final tick.
    pub final_hud: HudSnapshot,
}

/// Runs one game to completion.
#[derive(Debug)]
pub struct HeadlessRunner {
    config: RunConfig,
    sim: Simulation,
    collector: MetricsCollector,
}

impl HeadlessRunner {
    /// Build the skirmish described by `config`.
    ///
    /// # Errors
    ///
    /// Propagates scenario and config validation errors.
    pub fn new(config: RunConfig) -> Result<Self> {
        let sim = Simulation::skirmish(config.sim, &config.scenario)?;
        let game_id = format!("game_{}", config.scenario.seed);
        let collector = MetricsCollector::new(game_id, config.scenario.seed, &sim);
        Ok(Self {
            config,
            sim,
            collector,
        })
    }

    /// The simulation being driven.
    #[must_use]
    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    /// Advance one tick. Returns `true` once the game is over.
    pub fn step(&mut self) -> bool {
        let events = self.sim.tick(self.config.dt);
        self.collector.record_tick(&self.sim, &events);
        if let Some(outcome) = events.game_over {
            info!(
                tick = outcome.tick,
                winner = ?outcome.winner,
                "Game over"
            );
        }
        self.sim.is_game_over()
    }

    /// Play until game over or the tick budget runs out.
    pub fn run(mut self) -> RunResult {
        let seed = self.config.scenario.seed;
        debug!(seed, max_ticks = self.config.max_ticks, "Starting headless game");

        while self.sim.get_tick() < self.config.max_ticks {
            if self.step() {
                break;
            }
        }

        let final_hud = self.sim.hud();
        let metrics = self.collector.finish(&self.sim);
        debug!(
            seed,
            ticks = metrics.duration_ticks,
            condition = ?metrics.win_condition,
            "Headless game finished"
        );
        RunResult { metrics, final_hud }
    }
}

/// Play one game with `config`.
///
/// # Errors
///
/// Propagates setup errors from [`HeadlessRunner::new`].
pub fn run_game(config: RunConfig) -> Result<RunResult> {
    Ok(HeadlessRunner::new(config)?.run())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::WinCondition;

    fn quick(seed: u64) -> RunConfig {
        RunConfig {
            max_ticks: 120,
            dt: Fixed::from_num(0.5),
            scenario: ScenarioConfig {
                structure_count: 8,
                ..ScenarioConfig::with_seed(seed)
            },
            ..RunConfig::default()
        }
    }

    #[test]
    fn test_default_dt_is_one_sixtieth() {
        let config = RunConfig::default();
        assert!(config.dt * Fixed::from_num(60) <= Fixed::ONE);
        assert_eq!(config.max_ticks, 18_000);
    }

    #[test]
    fn test_run_respects_tick_budget() {
        let result = run_game(quick(3)).unwrap();
        assert!(result.metrics.duration_ticks <= 120);
        if result.metrics.win_condition == WinCondition::Timeout {
            assert_eq!(result.metrics.duration_ticks, 120);
            assert!(result.final_hud.game_over.is_none());
        }
        assert_eq!(result.final_hud.players.len(), 2);
    }

    #[test]
    fn test_same_seed_same_hash() {
        let a = run_game(quick(8)).unwrap();
        let b = run_game(quick(8)).unwrap();
        assert_eq!(a.metrics.final_state_hash, b.metrics.final_state_hash);
        assert_eq!(a.metrics.duration_ticks, b.metrics.duration_ticks);
    }

    #[test]
    fn test_bundled_scenario_parses() {
        let text = include_str!("../scenarios/skirmish.ron");
        let config = RunConfig::from_ron_str(text).unwrap();
        assert_eq!(config.scenario.seed, 12345);
        assert_eq!(config.max_ticks, 18_000);
        assert_eq!(config.sim.difficulty.max_executions_per_turn, 10);
    }

    #[test]
    fn test_invalid_scenario_rejected() {
        let text = "(scenario: (structure_count: 2))";
        assert!(matches!(
            RunConfig::from_ron_str(text),
            Err(crate::error::HeadlessError::Game(_))
        ));
        assert!(matches!(
            RunConfig::from_ron_str("(max_ticks: \"soon\")"),
            Err(crate::error::HeadlessError::Ron(_))
        ));
    }
}
