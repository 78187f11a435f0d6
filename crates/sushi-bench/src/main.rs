use std::path::PathBuf;

use clap::Parser;

use sushi_bench::config::{BenchmarkConfig, ResolvedOutputs};
use sushi_bench::logging::init_logging;
use sushi_bench::runner::MatchRunner;

/// Seeded match harness for Sushi Go! drafting agents.
#[derive(Debug, Parser)]
#[command(
    name = "sushi-bench",
    author,
    version,
    about = "Deterministic Sushi Go! match harness"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "bench/bench.yaml")]
    config: PathBuf,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Override the number of games to play.
    #[arg(long, value_name = "GAMES")]
    games: Option<usize>,

    /// Override the RNG seed for dealing.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Override every ensemble agent's determinization count.
    #[arg(long, value_name = "COUNT")]
    determinizations: Option<i64>,

    /// Exit after validating the configuration.
    #[arg(long)]
    validate_only: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = BenchmarkConfig::from_path(&cli.config)?;

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }
    if let Some(games) = cli.games {
        config.games.count = games;
    }
    if let Some(seed) = cli.seed {
        config.games.seed = Some(seed);
    }
    if let Some(count) = cli.determinizations {
        for agent in &mut config.agents {
            agent.agent.determinizations = count;
        }
    }

    config.validate()?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let run_id = config.run_id.clone();
    let players = config.player_count();
    let games = config.games.count;

    println!("Loaded configuration '{run_id}' with {players} seats ({games} games)");

    if cli.validate_only {
        println!("Validation-only mode: no games played.");
        return Ok(());
    }

    let logging_guard = init_logging(&config.logging, &outputs)?;
    let runner = MatchRunner::new(config, outputs);
    let summary = runner.run()?;

    println!(
        "Run '{run_id}' complete: {} games → {} rows at {}",
        summary.games_played,
        summary.rows_written,
        summary.jsonl_path.display()
    );
    println!("Summary table: {}", summary.summary_path.display());
    if let Some(path) = summary.snapshots_path.as_ref() {
        println!("Final tables: {}", path.display());
    }
    if let Some(guard) = logging_guard.as_ref() {
        println!("Telemetry log: {}", guard.telemetry_path.display());
    }

    Ok(())
}
