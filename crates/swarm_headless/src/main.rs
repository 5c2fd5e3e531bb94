//! Headless drone swarm runner.
//!
//! # Usage
//!
//! ```bash
//! # Run a single game with the default skirmish
//! cargo run -p swarm_headless -- run --seed 7
//!
//! # Run batch statistics
//! cargo run -p swarm_headless -- batch --count 1000 --output results/batch.json
//!
//! # Verify determinism
//! cargo run -p swarm_headless -- verify --seed 12345 --runs 5
//! ```
//!
//! Results are JSON on stdout; logs go to stderr.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use swarm_core::config::{DifficultyLevel, SimConfig};
use swarm_headless::{
    batch::{run_batch, verify_determinism, BatchConfig},
    error::Result,
    metrics::GameMetrics,
    runner::{run_game, RunConfig},
};

#[derive(Parser)]
#[command(name = "swarm_headless")]
#[command(about = "Headless drone swarm runner for batch statistics and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Run config (RON) with scenario and simulation settings
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Simulation config (RON), overriding the one in --config
    #[arg(long, global = true)]
    sim_config: Option<PathBuf>,

    /// Difficulty preset, overriding both config files
    #[arg(long, global = true, value_parser = parse_difficulty)]
    difficulty: Option<DifficultyLevel>,

    /// Tick budget per game
    #[arg(long, global = true)]
    max_ticks: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single game and print its metrics
    Run {
        /// Layout seed (defaults to the config's)
        #[arg(long)]
        seed: Option<u64>,

        /// Also print the final HUD panels
        #[arg(long)]
        hud: bool,
    },

    /// Run many seeds in parallel and print a summary
    Batch {
        /// Number of games to run
        #[arg(short = 'n', long, default_value = "100")]
        count: u32,

        /// Seed of the first game
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Maximum parallel games (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Write full results here instead of printing the summary only
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replay one seed several times and compare state hashes
    Verify {
        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,
    },
}

fn parse_difficulty(name: &str) -> std::result::Result<DifficultyLevel, String> {
    DifficultyLevel::ALL
        .into_iter()
        .find(|level| level.name().eq_ignore_ascii_case(name))
        .ok_or_else(|| format!("unknown difficulty '{name}' (easy, medium, hard, impossible)"))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr; stdout is for results
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    match execute(cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Headless run failed");
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: Cli) -> Result<ExitCode> {
    let run = load_run_config(&cli)?;

    match cli.command {
        Commands::Run { seed, hud } => cmd_run(run, seed, hud),
        Commands::Batch {
            count,
            seed,
            parallel,
            output,
        } => cmd_batch(run, count, seed, parallel, output),
        Commands::Verify { seed, runs } => cmd_verify(&run, seed, runs),
    }
}

fn load_run_config(cli: &Cli) -> Result<RunConfig> {
    let mut run = match &cli.config {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading run config");
            RunConfig::load(path)?
        }
        None => RunConfig::default(),
    };
    if let Some(path) = &cli.sim_config {
        run.sim = SimConfig::load(path)?;
    }
    if let Some(level) = cli.difficulty {
        run.sim.difficulty = level.settings();
    }
    if let Some(max_ticks) = cli.max_ticks {
        run.max_ticks = max_ticks;
    }
    Ok(run)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Serialize)]
struct RunOutput<'a> {
    metrics: &'a GameMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    hud: Option<Vec<String>>,
}

/// Run a single game
fn cmd_run(run: RunConfig, seed: Option<u64>, hud: bool) -> Result<ExitCode> {
    let run = match seed {
        Some(seed) => run.with_seed(seed),
        None => run,
    };
    tracing::info!(seed = run.scenario.seed, "Starting single game");

    let result = run_game(run)?;
    let panels = hud.then(|| {
        let mut lines: Vec<String> = result.final_hud.players.iter().map(|p| p.text()).collect();
        if let Some(banner) = result.final_hud.game_over {
            lines.push(banner.message().to_string());
        }
        lines
    });
    print_json(&RunOutput {
        metrics: &result.metrics,
        hud: panels,
    })?;
    Ok(ExitCode::SUCCESS)
}

/// Run batch of games
fn cmd_batch(
    run: RunConfig,
    count: u32,
    seed: u64,
    parallel: u32,
    output: Option<PathBuf>,
) -> Result<ExitCode> {
    let config = BatchConfig {
        parallel_games: parallel,
        ..BatchConfig::new(run, count).with_seed(seed)
    };
    let results = run_batch(config);

    if let Some(path) = output {
        results.save(&path)?;
        tracing::info!(path = %path.display(), "Batch results written");
    }
    print_json(&results.summary)?;

    Ok(if results.errors.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Verify determinism by running the same seed multiple times
fn cmd_verify(run: &RunConfig, seed: u64, runs: u32) -> Result<ExitCode> {
    tracing::info!(seed, runs, "Verifying determinism");
    let report = verify_determinism(run, seed, runs)?;
    print_json(&report)?;

    if report.deterministic {
        eprintln!("PASS: All {runs} runs produced identical results");
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("FAIL: Non-determinism detected!");
        Ok(ExitCode::FAILURE)
    }
}
