use super::StateEvaluator;
use super::features;
use super::weights::{Feature, FeatureWeights, HeuristicPreset};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use sushi_core::game::view::{GameView, ViewError};
use sushi_core::model::player::PlayerId;
use tracing::{Level, event};

#[derive(Debug, Clone, Copy, PartialEq)]
struct WeightState {
    preset: Option<HeuristicPreset>,
    weights: FeatureWeights,
}

/// One feature's contribution to a score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureScore {
    pub feature: Feature,
    pub value: f64,
    pub weighted: f64,
    /// The feature could not be read and contributed 0.
    pub degraded: bool,
}

/// Weighted sum of named features over a [`GameView`].
///
/// Never fails: a state lacking a capability scores its realized points, and
/// a feature that cannot be read contributes 0. The first degradation is
/// logged at `warn`; later ones are only counted.
#[derive(Debug)]
pub struct HeuristicEvaluator {
    state: RwLock<WeightState>,
    warned: AtomicBool,
    degraded: AtomicUsize,
}

impl HeuristicEvaluator {
    pub fn new(preset: HeuristicPreset) -> Self {
        Self::from_state(WeightState {
            preset: Some(preset),
            weights: preset.weights(),
        })
    }

    pub fn with_weights(weights: FeatureWeights) -> Self {
        Self::from_state(WeightState {
            preset: None,
            weights,
        })
    }

    fn from_state(state: WeightState) -> Self {
        Self {
            state: RwLock::new(state),
            warned: AtomicBool::new(false),
            degraded: AtomicUsize::new(0),
        }
    }

    /// Swaps the weight set in place; concurrent scorers see old or new
    /// weights, never a mix.
    pub fn set_preset(&self, preset: HeuristicPreset) {
        *self.state.write() = WeightState {
            preset: Some(preset),
            weights: preset.weights(),
        };
    }

    pub fn set_weights(&self, weights: FeatureWeights) {
        *self.state.write() = WeightState {
            preset: None,
            weights,
        };
    }

    /// `None` once explicit weights have replaced the preset.
    pub fn preset(&self) -> Option<HeuristicPreset> {
        self.state.read().preset
    }

    pub fn weights(&self) -> FeatureWeights {
        self.state.read().weights
    }

    /// Times this evaluator has fallen back or zeroed a feature.
    pub fn degraded_count(&self) -> usize {
        self.degraded.load(Ordering::Relaxed)
    }

    /// Weighted score, or the error that forces the realized-score fallback.
    pub fn try_score<S: GameView + ?Sized>(
        &self,
        state: &S,
        player: PlayerId,
    ) -> Result<f64, ViewError> {
        let breakdown = self.breakdown(state, player)?;
        Ok(breakdown.iter().map(|part| part.weighted).sum())
    }

    /// Per-feature contributions; zero-weight features are skipped.
    pub fn breakdown<S: GameView + ?Sized>(
        &self,
        state: &S,
        player: PlayerId,
    ) -> Result<Vec<FeatureScore>, ViewError> {
        let weights = self.weights();
        let immediate = f64::from(state.realized_score(player)?);
        let mut parts = vec![FeatureScore {
            feature: Feature::Immediate,
            value: immediate,
            weighted: weights.immediate * immediate,
            degraded: false,
        }];

        for feature in Feature::AUXILIARY {
            let weight = weights.get(feature);
            if weight == 0.0 {
                continue;
            }
            let part = match features::evaluate(feature, state, player) {
                Ok(value) => FeatureScore {
                    feature,
                    value,
                    weighted: weight * value,
                    degraded: false,
                },
                Err(err @ ViewError::Unsupported { .. }) => return Err(err),
                Err(err) => {
                    self.note_degraded(Some(feature), &err);
                    FeatureScore {
                        feature,
                        value: 0.0,
                        weighted: 0.0,
                        degraded: true,
                    }
                }
            };
            parts.push(part);
        }
        Ok(parts)
    }

    fn note_degraded(&self, feature: Option<Feature>, err: &ViewError) {
        let count = self.degraded.fetch_add(1, Ordering::Relaxed) + 1;
        let feature = feature.map_or("all", Feature::as_str);
        if !self.warned.swap(true, Ordering::Relaxed) {
            event!(
                target: "sushi_bot::eval",
                Level::WARN,
                feature,
                error = %err,
                "heuristic degraded; further occurrences are only counted"
            );
        } else {
            event!(
                target: "sushi_bot::eval",
                Level::TRACE,
                feature,
                error = %err,
                count,
            );
        }
    }
}

impl Default for HeuristicEvaluator {
    fn default() -> Self {
        Self::new(HeuristicPreset::default())
    }
}

impl<S: GameView + ?Sized> StateEvaluator<S> for HeuristicEvaluator {
    fn score(&self, state: &S, player: PlayerId) -> f64 {
        match self.try_score(state, player) {
            Ok(score) => score,
            Err(err) => {
                self.note_degraded(None, &err);
                state.realized_score(player).map(f64::from).unwrap_or(0.0)
            }
        }
    }
}
