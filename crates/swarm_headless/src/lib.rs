//! Headless skirmish runner for batch statistics and CI verification.
//!
//! Drives [`swarm_core::simulation::Simulation`] without a frame loop or
//! renderer, feeding a fixed `dt` each tick:
//!
//! - **Single games**: play one seeded skirmish and report its metrics
//! - **Batches**: play many seeds in parallel and aggregate outcomes
//! - **Verification**: replay one seed and compare final state hashes
//!
//! # Output
//!
//! - **stdout**: JSON results
//! - **stderr**: logs (human-readable)
//!
//! # Example
//!
//! ```bash
//! # One game from a scenario file
//! cargo run -p swarm_headless -- run --config scenarios/skirmish.ron
//!
//! # 200 seeds in parallel
//! cargo run -p swarm_headless -- batch --count 200 --output results/batch.json
//!
//! # Verify determinism
//! cargo run -p swarm_headless -- verify --seed 12345 --runs 5
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod batch;
pub mod error;
pub mod metrics;
pub mod runner;

pub use batch::{run_batch, verify_determinism, BatchConfig, BatchResults, VerifyReport};
pub use error::{HeadlessError, Result};
pub use metrics::{BatchSummary, FactionMetrics, GameMetrics, MetricsCollector, WinCondition};
pub use runner::{run_game, HeadlessRunner, RunConfig, RunResult};
