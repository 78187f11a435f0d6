use super::StateEvaluator;
use sushi_core::model::player::PlayerId;

/// `alpha * first + (1 - alpha) * second`.
#[derive(Debug)]
pub struct BlendedEvaluator<A, B> {
    first: A,
    second: B,
    alpha: f64,
}

impl<A, B> BlendedEvaluator<A, B> {
    /// `alpha` is clamped to `[0, 1]`; NaN reads as an even split.
    pub fn new(first: A, second: B, alpha: f64) -> Self {
        let alpha = if alpha.is_nan() { 0.5 } else { alpha.clamp(0.0, 1.0) };
        Self {
            first,
            second,
            alpha,
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn first(&self) -> &A {
        &self.first
    }

    pub fn second(&self) -> &B {
        &self.second
    }
}

impl<S, A, B> StateEvaluator<S> for BlendedEvaluator<A, B>
where
    S: ?Sized,
    A: StateEvaluator<S>,
    B: StateEvaluator<S>,
{
    fn score(&self, state: &S, player: PlayerId) -> f64 {
        let first = finite_or_zero(self.first.score(state, player));
        let second = finite_or_zero(self.second.score(state, player));
        self.alpha * first + (1.0 - self.alpha) * second
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}
