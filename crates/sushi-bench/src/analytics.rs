use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use thiserror::Error;

use crate::config::{AgentKind, BenchmarkConfig};
use crate::runner::{GameOutcome, SeatResult};

const CONFIDENCE_Z: f64 = 1.96; // 95% CI

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("agent '{0}' played a game but is missing from configuration")]
    UnknownAgent(String),
    #[error("baseline '{0}' missing from game {1}")]
    MissingBaselineGame(String, String),
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Accumulates per-agent results game by game.
pub struct AnalyticsCollector {
    baseline: String,
    agents: HashMap<String, AgentAccumulator>,
    comparisons: HashMap<String, Vec<f64>>,
    agent_order: Vec<String>,
}

impl AnalyticsCollector {
    pub fn new(config: &BenchmarkConfig) -> Result<Self, AnalyticsError> {
        let mut agents = HashMap::new();
        let mut order = Vec::new();
        for agent in &config.agents {
            agents.insert(
                agent.name.clone(),
                AgentAccumulator::new(agent.name.clone(), agent.kind),
            );
            order.push(agent.name.clone());
        }
        Ok(Self {
            baseline: config.metrics.baseline_name().to_string(),
            agents,
            comparisons: HashMap::new(),
            agent_order: order,
        })
    }

    pub fn record_game(&mut self, outcome: &GameOutcome) -> Result<(), AnalyticsError> {
        let baseline_points = outcome
            .seat_results
            .iter()
            .find(|seat| seat.agent_name == self.baseline)
            .map(|seat| f64::from(seat.points))
            .ok_or_else(|| {
                AnalyticsError::MissingBaselineGame(self.baseline.clone(), outcome.game_id.clone())
            })?;

        for seat in &outcome.seat_results {
            self.agents
                .get_mut(&seat.agent_name)
                .ok_or_else(|| AnalyticsError::UnknownAgent(seat.agent_name.clone()))?
                .record(seat);

            if seat.agent_name != self.baseline {
                self.comparisons
                    .entry(seat.agent_name.clone())
                    .or_default()
                    .push(f64::from(seat.points) - baseline_points);
            }
        }
        Ok(())
    }

    pub fn finalize(mut self) -> Result<AnalyticsSummary, AnalyticsError> {
        let mut reports = Vec::new();
        for name in &self.agent_order {
            if let Some(acc) = self.agents.remove(name) {
                reports.push(acc.into_report());
            }
        }

        let baseline_avg = reports
            .iter()
            .find(|report| report.name == self.baseline)
            .map(|report| report.avg_points)
            .unwrap_or(0.0);

        for report in &mut reports {
            report.delta_vs_baseline = report.avg_points - baseline_avg;
            if report.name == self.baseline {
                continue;
            }
            let diffs = self.comparisons.remove(&report.name).unwrap_or_default();
            let (p_value, sample_size) = wilcoxon_signed_rank(diffs);
            report.p_value = p_value;
            report.paired_games = sample_size;
        }

        Ok(AnalyticsSummary {
            baseline: self.baseline,
            agents: reports,
        })
    }
}

struct AgentAccumulator {
    name: String,
    kind: AgentKind,
    per_game_points: Vec<f64>,
    wins: usize,
    total_ms: f64,
    decisions: u64,
    samples: u64,
    discarded_votes: u64,
    shortfall: u64,
}

impl AgentAccumulator {
    fn new(name: String, kind: AgentKind) -> Self {
        Self {
            name,
            kind,
            per_game_points: Vec::new(),
            wins: 0,
            total_ms: 0.0,
            decisions: 0,
            samples: 0,
            discarded_votes: 0,
            shortfall: 0,
        }
    }

    fn record(&mut self, seat: &SeatResult) {
        self.per_game_points.push(f64::from(seat.points));
        if seat.rank == 1 {
            self.wins += 1;
        }
        self.total_ms += seat.metrics.total_ms;
        self.decisions += u64::from(seat.metrics.decisions);
        self.samples += seat.ensemble.samples;
        self.discarded_votes += seat.ensemble.discarded_votes;
        self.shortfall += seat.ensemble.shortfall;
    }

    fn into_report(self) -> AgentReport {
        let games = self.per_game_points.len();
        let avg_points = mean(&self.per_game_points);
        let ci95 = confidence_interval(&self.per_game_points);
        let avg_ms_per_decision = if self.decisions == 0 {
            0.0
        } else {
            self.total_ms / self.decisions as f64
        };
        AgentReport {
            name: self.name,
            kind: self.kind,
            games,
            avg_points,
            ci95,
            wins: self.wins,
            avg_ms_per_decision,
            samples: self.samples,
            discarded_votes: self.discarded_votes,
            shortfall: self.shortfall,
            delta_vs_baseline: 0.0,
            p_value: 1.0,
            paired_games: 0,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AnalyticsSummary {
    pub baseline: String,
    pub agents: Vec<AgentReport>,
}

impl AnalyticsSummary {
    pub fn agent(&self, name: &str) -> Option<&AgentReport> {
        self.agents.iter().find(|agent| agent.name == name)
    }

    pub fn render_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str("# Match Summary\n\n");
        out.push_str(&format!("Baseline: `{}`\n\n", self.baseline));
        out.push_str("| Agent | Kind | Games | Avg points | Δ vs baseline | 95% CI | Win % | Avg ms/decision | Samples | Shortfall | p-value |\n");
        out.push_str("|-------|------|-------|------------|---------------|--------|-------|-----------------|---------|-----------|---------|\n");
        for agent in &self.agents {
            out.push_str(&format!(
                "| {name} | {kind:?} | {games} | {avg:.3} | {delta:+.3} | [{lo:.3}, {hi:.3}] | {win:.1}% | {ms:.2} | {samples} | {shortfall} | {p:.3} |\n",
                name = agent.name,
                kind = agent.kind,
                games = agent.games,
                avg = agent.avg_points,
                delta = agent.delta_vs_baseline,
                lo = agent.ci95.0,
                hi = agent.ci95.1,
                win = agent.win_rate() * 100.0,
                ms = agent.avg_ms_per_decision,
                samples = agent.samples,
                shortfall = agent.shortfall,
                p = agent.p_value,
            ));
        }
        out
    }

    pub fn write_markdown(&self, path: impl AsRef<Path>) -> Result<(), AnalyticsError> {
        fs::write(path.as_ref(), self.render_markdown()).map_err(|source| AnalyticsError::Io {
            context: "writing summary markdown",
            source,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentReport {
    pub name: String,
    pub kind: AgentKind,
    pub games: usize,
    pub avg_points: f64,
    pub ci95: (f64, f64),
    pub wins: usize,
    pub avg_ms_per_decision: f64,
    pub samples: u64,
    pub discarded_votes: u64,
    pub shortfall: u64,
    pub delta_vs_baseline: f64,
    /// Wilcoxon signed-rank p-value against the baseline; 1.0 for the baseline itself.
    pub p_value: f64,
    pub paired_games: usize,
}

impl AgentReport {
    pub fn win_rate(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            self.wins as f64 / self.games as f64
        }
    }
}

fn mean(points: &[f64]) -> f64 {
    if points.is_empty() {
        0.0
    } else {
        points.iter().sum::<f64>() / points.len() as f64
    }
}

fn confidence_interval(points: &[f64]) -> (f64, f64) {
    let mean = mean(points);
    if points.len() < 2 {
        return (mean, mean);
    }
    let variance = points
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / (points.len() as f64 - 1.0);
    let margin = CONFIDENCE_Z * (variance / points.len() as f64).sqrt();
    (mean - margin, mean + margin)
}

/// Two-sided normal approximation with tie correction. Zero differences are
/// dropped. Returns `(p_value, non_zero_pairs)`.
fn wilcoxon_signed_rank(diffs: Vec<f64>) -> (f64, usize) {
    let mut paired: Vec<(f64, f64)> = diffs
        .into_iter()
        .filter(|d| d.abs() > f64::EPSILON)
        .map(|d| (d.abs(), d.signum()))
        .collect();
    let n = paired.len();
    if n == 0 {
        return (1.0, 0);
    }
    paired.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut w_plus = 0.0;
    let mut w_minus = 0.0;
    let mut tie_adjustment = 0.0;
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && (paired[j + 1].0 - paired[i].0).abs() < 1e-12 {
            j += 1;
        }
        let rank = (i + j + 2) as f64 / 2.0;
        for &(_, sign) in &paired[i..=j] {
            if sign > 0.0 {
                w_plus += rank;
            } else {
                w_minus += rank;
            }
        }
        let ties = (j - i + 1) as f64;
        if ties > 1.0 {
            tie_adjustment += (ties.powi(3) - ties) / 48.0;
        }
        i = j + 1;
    }

    let n_f = n as f64;
    let mean_w = n_f * (n_f + 1.0) / 4.0;
    let variance_w = n_f * (n_f + 1.0) * (2.0 * n_f + 1.0) / 24.0 - tie_adjustment;
    if variance_w <= 0.0 {
        return (1.0, n);
    }
    let Ok(normal) = Normal::new(0.0, 1.0) else {
        return (1.0, n);
    };
    let w = f64::min(w_plus, w_minus);
    let z = (((w - mean_w).abs() - 0.5) / variance_w.sqrt()).max(0.0);
    let p = 2.0 * (1.0 - normal.cdf(z));
    (p.clamp(0.0, 1.0), n)
}
