mod blend;
pub mod features;
mod heuristic;
mod weights;

pub use blend::BlendedEvaluator;
pub use heuristic::{FeatureScore, HeuristicEvaluator};
pub use weights::{Feature, FeatureWeights, HeuristicPreset};

use std::sync::Arc;
use sushi_core::game::view::GameView;
use sushi_core::model::player::PlayerId;

/// Scores a fully observed state for one player. Higher is better for that
/// player. Implementations must not panic or fail; they degrade instead.
pub trait StateEvaluator<S: ?Sized>: Send + Sync {
    fn score(&self, state: &S, player: PlayerId) -> f64;
}

impl<S: ?Sized, E: StateEvaluator<S> + ?Sized> StateEvaluator<S> for &E {
    fn score(&self, state: &S, player: PlayerId) -> f64 {
        (**self).score(state, player)
    }
}

impl<S: ?Sized, E: StateEvaluator<S> + ?Sized> StateEvaluator<S> for Arc<E> {
    fn score(&self, state: &S, player: PlayerId) -> f64 {
        (**self).score(state, player)
    }
}

impl<S: ?Sized, E: StateEvaluator<S> + ?Sized> StateEvaluator<S> for Box<E> {
    fn score(&self, state: &S, player: PlayerId) -> f64 {
        (**self).score(state, player)
    }
}

/// The evaluator an [`AgentConfig`](crate::config::AgentConfig) describes:
/// a single heuristic, or a blend of two.
#[derive(Debug)]
pub enum ConfiguredEvaluator {
    Single(HeuristicEvaluator),
    Blended(BlendedEvaluator<HeuristicEvaluator, HeuristicEvaluator>),
}

impl ConfiguredEvaluator {
    /// The primary heuristic; its weights can be switched live.
    pub fn primary(&self) -> &HeuristicEvaluator {
        match self {
            ConfiguredEvaluator::Single(eval) => eval,
            ConfiguredEvaluator::Blended(blend) => blend.first(),
        }
    }

    pub fn degraded_count(&self) -> usize {
        match self {
            ConfiguredEvaluator::Single(eval) => eval.degraded_count(),
            ConfiguredEvaluator::Blended(blend) => {
                blend.first().degraded_count() + blend.second().degraded_count()
            }
        }
    }
}

impl<S: GameView + ?Sized> StateEvaluator<S> for ConfiguredEvaluator {
    fn score(&self, state: &S, player: PlayerId) -> f64 {
        match self {
            ConfiguredEvaluator::Single(eval) => eval.score(state, player),
            ConfiguredEvaluator::Blended(blend) => blend.score(state, player),
        }
    }
}
