use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::{SmallRng, StdRng};
use rand::seq::SliceRandom;
use rand::{RngCore, SeedableRng};
use serde::Serialize;
use sushi_bot::{ConfiguredEvaluator, DecisionEnsemble, DecisionError, GreedyOracle, SearchOracle};
use sushi_core::game::serialization::TableSnapshot;
use sushi_core::game::table::{RulesError, TableState, TurnOutcome};
use sushi_core::game::view::GameView;
use sushi_core::model::action::Action;
use sushi_core::model::player::PlayerId;
use thiserror::Error;
use tracing::{Level, event};

use crate::analytics::{AnalyticsCollector, AnalyticsError};
use crate::config::{AgentKind, BenchAgentConfig, BenchmarkConfig, ResolvedOutputs};

type EnsembleAgent = DecisionEnsemble<GreedyOracle<Arc<ConfiguredEvaluator>>>;

/// Plays seeded games between the configured agents and streams one JSONL
/// row per seat per game.
pub struct MatchRunner {
    config: BenchmarkConfig,
    outputs: ResolvedOutputs,
    logging_enabled: bool,
}

/// Summary details returned after a run.
#[derive(Debug)]
pub struct RunSummary {
    pub games_played: usize,
    pub rows_written: usize,
    pub jsonl_path: PathBuf,
    pub summary_path: PathBuf,
    pub snapshots_path: Option<PathBuf>,
}

impl MatchRunner {
    pub fn new(config: BenchmarkConfig, outputs: ResolvedOutputs) -> Self {
        Self {
            logging_enabled: config.logging.enable_structured,
            config,
            outputs,
        }
    }

    pub fn run(&self) -> Result<RunSummary, RunnerError> {
        ensure_parent(self.outputs.jsonl.parent())?;
        ensure_parent(self.outputs.summary_md.parent())?;

        let mut writer = BufWriter::new(File::create(&self.outputs.jsonl)?);
        let mut snapshots = match &self.outputs.snapshots {
            Some(path) => {
                ensure_parent(path.parent())?;
                Some(BufWriter::new(File::create(path)?))
            }
            None => None,
        };
        let mut rng = StdRng::seed_from_u64(self.config.games.seed.unwrap_or(0));
        let mut analytics = AnalyticsCollector::new(&self.config)?;
        let mut rows_written = 0usize;

        for game_index in 0..self.config.games.count {
            let game_seed = rng.next_u64();
            let (outcome, table) = self.play_game(game_index, game_seed)?;
            analytics.record_game(&outcome)?;
            rows_written += write_game_rows(&mut writer, &self.config.run_id, &outcome)?;

            if let Some(out) = snapshots.as_mut() {
                let row = SnapshotRow {
                    run_id: &self.config.run_id,
                    game_id: &outcome.game_id,
                    table: TableSnapshot::capture(&table),
                };
                serde_json::to_writer(&mut *out, &row)?;
                out.write_all(b"\n")?;
            }
        }

        writer.flush()?;
        if let Some(out) = snapshots.as_mut() {
            out.flush()?;
        }

        let summary = analytics.finalize()?;
        summary.write_markdown(&self.outputs.summary_md)?;

        Ok(RunSummary {
            games_played: self.config.games.count,
            rows_written,
            jsonl_path: self.outputs.jsonl.clone(),
            summary_path: self.outputs.summary_md.clone(),
            snapshots_path: self.outputs.snapshots.clone(),
        })
    }

    fn play_game(
        &self,
        game_index: usize,
        game_seed: u64,
    ) -> Result<(GameOutcome, TableState), RunnerError> {
        let player_count = self.config.player_count();
        let mut table = TableState::deal(player_count, game_seed).map_err(RunnerError::Rules)?;
        let offset = if self.config.games.rotate_seats {
            game_index % player_count
        } else {
            0
        };
        let mut seats: Vec<SeatState> = PlayerId::seats(player_count)
            .map(|seat| {
                let agent = &self.config.agents[(seat.index() + offset) % player_count];
                SeatState::new(seat, agent, game_seed)
            })
            .collect();

        while !table.is_finished() {
            let mut picks = Vec::with_capacity(player_count);
            for seat in &mut seats {
                table.set_perspective(seat.seat);
                let legal = table.legal_actions(seat.seat);
                let start = Instant::now();
                let action = seat.player.choose(&table, &legal)?;
                let elapsed_ms = seat.metrics.record(start.elapsed());
                seat.player.absorb_stats(&mut seat.ensemble);

                if self.logging_enabled && tracing::enabled!(Level::DEBUG) {
                    event!(
                        target: "sushi_bench::pick",
                        Level::DEBUG,
                        run_id = %self.config.run_id,
                        game_index = game_index as u32,
                        round = table.round(),
                        seat = seat.seat.index() as u32,
                        agent = %seat.agent_name,
                        action = %action,
                        elapsed_ms
                    );
                }
                picks.push(action);
            }

            let outcome = table.play_turn(&picks).map_err(RunnerError::Rules)?;
            if let TurnOutcome::RoundEnded { round } = outcome {
                if self.logging_enabled {
                    event!(
                        target: "sushi_bench::round",
                        Level::INFO,
                        run_id = %self.config.run_id,
                        game_index = game_index as u32,
                        round,
                        scores = ?table.final_scores()
                    );
                }
            }
        }

        let scores = table.final_scores().to_vec();
        let seat_results = seats
            .into_iter()
            .map(|seat| {
                let points = scores.get(seat.seat.index()).copied().unwrap_or(0);
                SeatResult {
                    rank: rank_of(&scores, points),
                    agent_name: seat.agent_name,
                    seat: seat.seat,
                    points,
                    metrics: seat.metrics.finalize(),
                    ensemble: seat.ensemble,
                }
            })
            .collect();

        if self.logging_enabled {
            event!(
                target: "sushi_bench::game",
                Level::INFO,
                run_id = %self.config.run_id,
                game_index = game_index as u32,
                game_seed,
                scores = ?scores
            );
        }

        Ok((
            GameOutcome {
                game_id: format!("G{game_index:05}"),
                game_index,
                game_seed,
                seat_results,
            },
            table,
        ))
    }
}

fn ensure_parent(path: Option<&Path>) -> Result<(), RunnerError> {
    if let Some(dir) = path.filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

/// 1 + the number of seats that scored strictly more.
fn rank_of(scores: &[i32], points: i32) -> usize {
    1 + scores.iter().filter(|&&other| other > points).count()
}

fn write_game_rows(
    writer: &mut BufWriter<File>,
    run_id: &str,
    outcome: &GameOutcome,
) -> Result<usize, RunnerError> {
    let mut rows_written = 0usize;
    for seat in &outcome.seat_results {
        let row = GameLogRow {
            run_id,
            game_id: &outcome.game_id,
            game_index: outcome.game_index,
            game_seed: outcome.game_seed,
            seat: seat.seat.index(),
            agent: &seat.agent_name,
            points: seat.points,
            rank: seat.rank,
            won: seat.rank == 1,
            decisions: seat.metrics.decisions,
            speed_ms_turn: seat.metrics.avg_ms_per_decision,
            samples: seat.ensemble.samples,
            discarded_votes: seat.ensemble.discarded_votes,
            withheld_worlds: seat.ensemble.withheld_worlds,
            shortfall: seat.ensemble.shortfall,
        };
        serde_json::to_writer(&mut *writer, &row)?;
        writer.write_all(b"\n")?;
        rows_written += 1;
    }
    Ok(rows_written)
}

enum SeatPlayer {
    Ensemble(Box<EnsembleAgent>),
    Greedy(GreedyOracle<Arc<ConfiguredEvaluator>>),
    Random(SmallRng),
}

impl SeatPlayer {
    fn spawn(agent: &BenchAgentConfig, seed: u64) -> Self {
        let evaluator = Arc::new(agent.agent.build_evaluator());
        match agent.kind {
            AgentKind::Ensemble => {
                let mut ensemble =
                    DecisionEnsemble::from_config(GreedyOracle::new(evaluator), &agent.agent);
                ensemble.reseed(agent.agent.seed.unwrap_or(0) ^ seed);
                SeatPlayer::Ensemble(Box::new(ensemble))
            }
            AgentKind::Greedy => SeatPlayer::Greedy(GreedyOracle::new(evaluator)),
            AgentKind::Random => SeatPlayer::Random(SmallRng::seed_from_u64(seed)),
        }
    }

    fn choose(&mut self, table: &TableState, legal: &[Action]) -> Result<Action, DecisionError> {
        match self {
            SeatPlayer::Ensemble(ensemble) => ensemble.choose(table, legal),
            SeatPlayer::Greedy(oracle) => {
                if legal.is_empty() {
                    return Err(DecisionError::NoLegalActions);
                }
                Ok(oracle.search(table, legal))
            }
            SeatPlayer::Random(rng) => legal
                .choose(rng)
                .copied()
                .ok_or(DecisionError::NoLegalActions),
        }
    }

    fn absorb_stats(&self, totals: &mut EnsembleTotals) {
        if let SeatPlayer::Ensemble(ensemble) = self {
            if let Some(stats) = ensemble.last_stats() {
                totals.samples += stats.samples as u64;
                totals.discarded_votes += stats.discarded_votes as u64;
                totals.withheld_worlds += stats.withheld_worlds as u64;
                totals.shortfall += stats.shortfall as u64;
            }
        }
    }
}

struct SeatState {
    seat: PlayerId,
    agent_name: String,
    player: SeatPlayer,
    metrics: DecisionMetrics,
    ensemble: EnsembleTotals,
}

impl SeatState {
    fn new(seat: PlayerId, agent: &BenchAgentConfig, game_seed: u64) -> Self {
        Self {
            seat,
            agent_name: agent.name.clone(),
            player: SeatPlayer::spawn(agent, seat_seed(game_seed, seat)),
            metrics: DecisionMetrics::default(),
            ensemble: EnsembleTotals::default(),
        }
    }
}

/// Each seat draws from its own stream so seating changes nothing else.
fn seat_seed(game_seed: u64, seat: PlayerId) -> u64 {
    game_seed.wrapping_add((seat.index() as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// Ensemble bookkeeping summed over one game.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnsembleTotals {
    pub samples: u64,
    pub discarded_votes: u64,
    /// Sampled worlds never searched because a hidden card stayed unwritten.
    pub withheld_worlds: u64,
    pub shortfall: u64,
}

pub struct GameOutcome {
    pub game_id: String,
    pub game_index: usize,
    pub game_seed: u64,
    pub seat_results: Vec<SeatResult>,
}

pub struct SeatResult {
    pub agent_name: String,
    pub seat: PlayerId,
    pub points: i32,
    pub rank: usize,
    pub metrics: DecisionSummary,
    pub ensemble: EnsembleTotals,
}

#[derive(Default)]
struct DecisionMetrics {
    total: Duration,
    decisions: u32,
}

impl DecisionMetrics {
    fn record(&mut self, duration: Duration) -> f64 {
        self.total += duration;
        self.decisions += 1;
        duration.as_secs_f64() * 1000.0
    }

    fn finalize(self) -> DecisionSummary {
        let total_ms = self.total.as_secs_f64() * 1000.0;
        let avg_ms_per_decision = if self.decisions == 0 {
            0.0
        } else {
            total_ms / f64::from(self.decisions)
        };
        DecisionSummary {
            decisions: self.decisions,
            avg_ms_per_decision,
            total_ms,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DecisionSummary {
    pub decisions: u32,
    pub avg_ms_per_decision: f64,
    pub total_ms: f64,
}

#[derive(Serialize)]
struct GameLogRow<'a> {
    run_id: &'a str,
    game_id: &'a str,
    game_index: usize,
    game_seed: u64,
    seat: usize,
    agent: &'a str,
    points: i32,
    rank: usize,
    won: bool,
    decisions: u32,
    speed_ms_turn: f64,
    samples: u64,
    discarded_votes: u64,
    withheld_worlds: u64,
    shortfall: u64,
}

#[derive(Serialize)]
struct SnapshotRow<'a> {
    run_id: &'a str,
    game_id: &'a str,
    table: TableSnapshot,
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("failed to serialize log row: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
    #[error("agent failed to decide: {0}")]
    Decision(#[from] DecisionError),
    #[error("illegal table operation: {0}")]
    Rules(RulesError),
    #[error("analytics error: {0}")]
    Analytics(#[from] AnalyticsError),
}
