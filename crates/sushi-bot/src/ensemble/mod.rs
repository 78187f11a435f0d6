//! Determinization ensemble: sample plausible opponent hands, let the search
//! oracle pick in each sampled world, then take a plurality vote.

mod tally;

pub use tally::{DecisionStats, VoteTally};

use crate::config::AgentConfig;
use crate::determinizer::{BiasWeights, DeterminizedWorld, Determinizer};
use crate::oracle::SearchOracle;
use crate::tracker::UnseenCardTracker;
use rayon::prelude::*;
use std::fmt;
use sushi_core::game::view::Determinize;
use thiserror::Error;
use tracing::{Level, event};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecisionError {
    #[error("no legal actions to choose from")]
    NoLegalActions,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleSettings {
    determinizations: usize,
    pub bias: BiasWeights,
    pub parallel: bool,
}

impl EnsembleSettings {
    pub const DEFAULT_DETERMINIZATIONS: usize = 5;
    pub const MIN_DETERMINIZATIONS: usize = 1;
    pub const MAX_DETERMINIZATIONS: usize = 20;

    /// Clamps a requested sample count into the supported range.
    pub fn clamp_determinizations(requested: i64) -> usize {
        requested.clamp(
            Self::MIN_DETERMINIZATIONS as i64,
            Self::MAX_DETERMINIZATIONS as i64,
        ) as usize
    }

    pub fn determinizations(&self) -> usize {
        self.determinizations
    }

    pub fn set_determinizations(&mut self, requested: i64) -> usize {
        self.determinizations = Self::clamp_determinizations(requested);
        self.determinizations
    }
}

impl Default for EnsembleSettings {
    fn default() -> Self {
        Self {
            determinizations: Self::DEFAULT_DETERMINIZATIONS,
            bias: BiasWeights::uniform(),
            parallel: false,
        }
    }
}

/// The decision agent. Holds no state between decisions apart from its
/// sampler and the stats of the last decision.
///
/// Each sampled world gets one oracle vote; the action with the most votes
/// wins and ties go to whichever tied action comes first in `legal`.
#[derive(Debug, Clone)]
pub struct DecisionEnsemble<O> {
    settings: EnsembleSettings,
    tracker: UnseenCardTracker,
    determinizer: Determinizer,
    oracle: O,
    last_stats: Option<DecisionStats>,
}

impl<O> DecisionEnsemble<O> {
    pub fn new(oracle: O) -> Self {
        Self::with_determinizer(oracle, Determinizer::new())
    }

    pub fn with_seed(oracle: O, seed: u64) -> Self {
        Self::with_determinizer(oracle, Determinizer::with_seed(seed))
    }

    fn with_determinizer(oracle: O, determinizer: Determinizer) -> Self {
        Self {
            settings: EnsembleSettings::default(),
            tracker: UnseenCardTracker::new(),
            determinizer,
            oracle,
            last_stats: None,
        }
    }

    /// Applies the sampling part of an agent config. The evaluator behind
    /// the oracle is the caller's concern.
    pub fn from_config(oracle: O, config: &AgentConfig) -> Self {
        let mut ensemble = match config.seed {
            Some(seed) => Self::with_seed(oracle, seed),
            None => Self::new(oracle),
        };
        ensemble.set_determinizations(config.determinizations);
        ensemble.settings.bias = config.bias.clone();
        ensemble.settings.parallel = config.parallel;
        ensemble
    }

    pub fn settings(&self) -> &EnsembleSettings {
        &self.settings
    }

    pub fn determinizations(&self) -> usize {
        self.settings.determinizations()
    }

    /// Returns the clamped count actually in effect.
    pub fn set_determinizations(&mut self, requested: i64) -> usize {
        self.settings.set_determinizations(requested)
    }

    pub fn set_bias(&mut self, bias: BiasWeights) {
        self.settings.bias = bias;
    }

    pub fn set_parallel(&mut self, parallel: bool) {
        self.settings.parallel = parallel;
    }

    pub fn reseed(&mut self, seed: u64) {
        self.determinizer.reseed(seed);
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn oracle_mut(&mut self) -> &mut O {
        &mut self.oracle
    }

    pub fn tracker(&self) -> &UnseenCardTracker {
        &self.tracker
    }

    pub fn last_stats(&self) -> Option<&DecisionStats> {
        self.last_stats.as_ref()
    }

    /// Chooses one of `legal` for the state's perspective seat.
    pub fn decide<S, A>(&mut self, state: &S, legal: &[A]) -> Result<A, DecisionError>
    where
        S: Determinize,
        A: Clone + PartialEq + fmt::Debug,
        O: SearchOracle<S, A>,
    {
        if let Some(forced) = self.forced_choice(legal)? {
            return Ok(forced);
        }

        let distribution = self.tracker.update(state).clone();
        let samples = self.settings.determinizations();
        let mut choices = Vec::with_capacity(samples);
        let mut sampling = SamplingTotals::default();
        for _ in 0..samples {
            let world =
                self.determinizer
                    .sample_biased(state, &distribution, &self.settings.bias);
            if sampling.admit(&world) {
                choices.push(self.oracle.search(world.world(), legal));
            }
        }

        Ok(self.conclude(legal, choices, sampling, distribution.total_unseen(), false))
    }

    /// Same as [`decide`](Self::decide), but the oracle runs on a rayon pool
    /// with one oracle clone per sample. Worlds are still drawn in order from
    /// the owned sampler, so a fixed seed gives the same answer as `decide`.
    pub fn decide_parallel<S, A>(&mut self, state: &S, legal: &[A]) -> Result<A, DecisionError>
    where
        S: Determinize + Send,
        A: Clone + PartialEq + fmt::Debug + Send + Sync,
        O: SearchOracle<S, A> + Clone + Send,
    {
        if let Some(forced) = self.forced_choice(legal)? {
            return Ok(forced);
        }

        let distribution = self.tracker.update(state).clone();
        let worlds = self.determinizer.sample_many_biased(
            state,
            &distribution,
            &self.settings.bias,
            self.settings.determinizations(),
        );
        let mut sampling = SamplingTotals::default();
        let jobs: Vec<_> = worlds
            .into_iter()
            .filter(|world| sampling.admit(world))
            .map(|world| (self.oracle.clone(), world))
            .collect();
        let choices: Vec<A> = jobs
            .into_par_iter()
            .map(|(mut oracle, world)| oracle.search(world.world(), legal))
            .collect();

        Ok(self.conclude(legal, choices, sampling, distribution.total_unseen(), true))
    }

    /// Dispatches to the sequential or parallel path per the settings.
    pub fn choose<S, A>(&mut self, state: &S, legal: &[A]) -> Result<A, DecisionError>
    where
        S: Determinize + Send,
        A: Clone + PartialEq + fmt::Debug + Send + Sync,
        O: SearchOracle<S, A> + Clone + Send,
    {
        if self.settings.parallel {
            self.decide_parallel(state, legal)
        } else {
            self.decide(state, legal)
        }
    }

    fn forced_choice<A: Clone>(&mut self, legal: &[A]) -> Result<Option<A>, DecisionError> {
        match legal {
            [] => {
                event!(
                    target: "sushi_bot::ensemble",
                    Level::WARN,
                    "decide called without legal actions"
                );
                Err(DecisionError::NoLegalActions)
            }
            [only] => {
                self.last_stats = Some(DecisionStats::forced());
                Ok(Some(only.clone()))
            }
            _ => Ok(None),
        }
    }

    fn conclude<A>(
        &mut self,
        legal: &[A],
        choices: Vec<A>,
        sampling: SamplingTotals,
        unseen_cards: u32,
        parallel: bool,
    ) -> A
    where
        A: Clone + PartialEq + fmt::Debug,
    {
        let mut tally = VoteTally::new(legal);
        for choice in &choices {
            if !tally.vote(choice) {
                event!(
                    target: "sushi_bot::ensemble",
                    Level::WARN,
                    choice = ?choice,
                    "oracle returned an action outside the legal set; vote dropped"
                );
            }
        }

        let (winning_index, winning_votes) = tally.leader().unwrap_or((0, 0));

        let stats = DecisionStats {
            legal_actions: legal.len(),
            samples: choices.len() + sampling.withheld,
            votes_cast: tally.total_votes(),
            discarded_votes: tally.discarded(),
            withheld_worlds: sampling.withheld,
            shortfall: sampling.shortfall,
            winning_index,
            winning_votes,
            tally: tally.counts(),
            unseen_cards,
            parallel,
        };

        if tracing::enabled!(target: "sushi_bot::ensemble", Level::DEBUG) {
            event!(
                target: "sushi_bot::ensemble",
                Level::DEBUG,
                legal = stats.legal_actions,
                samples = stats.samples,
                discarded = stats.discarded_votes,
                withheld = stats.withheld_worlds,
                shortfall = stats.shortfall,
                unseen = stats.unseen_cards,
                winner = ?legal[winning_index],
                votes = ?stats.tally,
                parallel,
            );
        }

        self.last_stats = Some(stats);
        legal[winning_index].clone()
    }
}

/// Shortfall and withheld worlds across one decision's samples.
#[derive(Debug, Default)]
struct SamplingTotals {
    shortfall: usize,
    withheld: usize,
}

impl SamplingTotals {
    /// Records `world`; true when it may be searched.
    fn admit<S>(&mut self, world: &DeterminizedWorld<S>) -> bool {
        self.shortfall += world.shortfall();
        if !world.is_complete() {
            self.withheld += 1;
            return false;
        }
        true
    }
}
