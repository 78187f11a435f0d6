//! Per-world search used by the ensemble.

use crate::eval::StateEvaluator;
use sushi_core::game::view::{ObservedView, Transition};
use tracing::{Level, event};

/// Picks one action for a single fully determined world. The ensemble only
/// calls `search` with a non-empty `legal` slice.
pub trait SearchOracle<W, A> {
    fn search(&mut self, world: &W, legal: &[A]) -> A;
}

impl<W, A, F> SearchOracle<W, A> for F
where
    F: FnMut(&W, &[A]) -> A,
{
    fn search(&mut self, world: &W, legal: &[A]) -> A {
        self(world, legal)
    }
}

/// One-ply lookahead: previews each legal action for the world's perspective
/// seat and keeps the best evaluator score. Ties keep the earlier action;
/// actions the world rejects are skipped.
#[derive(Debug, Clone)]
pub struct GreedyOracle<E> {
    evaluator: E,
    searches: u64,
}

impl<E> GreedyOracle<E> {
    pub fn new(evaluator: E) -> Self {
        Self {
            evaluator,
            searches: 0,
        }
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    pub fn searches(&self) -> u64 {
        self.searches
    }
}

impl<W, E> SearchOracle<W, W::Action> for GreedyOracle<E>
where
    W: ObservedView + Transition,
    W::Action: Clone,
    W::Error: std::fmt::Display,
    E: StateEvaluator<W>,
{
    fn search(&mut self, world: &W, legal: &[W::Action]) -> W::Action {
        self.searches += 1;
        let player = world.perspective();
        let mut best: Option<(usize, f64)> = None;

        for (index, action) in legal.iter().enumerate() {
            let next = match world.preview(player, action) {
                Ok(next) => next,
                Err(err) => {
                    event!(
                        target: "sushi_bot::oracle",
                        Level::DEBUG,
                        player = %player,
                        index,
                        error = %err,
                        "preview rejected action"
                    );
                    continue;
                }
            };
            let score = self.evaluator.score(&next, player);
            if best.is_none_or(|(_, top)| score > top) {
                best = Some((index, score));
            }
        }

        let index = best.map_or(0, |(index, _)| index);
        legal[index].clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::{HeuristicEvaluator, HeuristicPreset};
    use sushi_core::game::table::TableState;
    use sushi_core::model::action::Action;
    use sushi_core::model::card::CardType;
    use sushi_core::model::hand::Hand;
    use sushi_core::model::player::PlayerId;
    use sushi_core::model::tableau::Tableau;

    #[test]
    fn closures_act_as_oracles() {
        let mut calls = 0;
        let mut oracle = |_: &u8, legal: &[char]| {
            calls += 1;
            legal[legal.len() - 1]
        };
        assert_eq!(oracle.search(&0, &['a', 'b']), 'b');
        assert_eq!(calls, 1);
    }

    #[test]
    fn greedy_takes_the_highest_immediate_points() {
        let hands = vec![
            Hand::with_cards(vec![CardType::EggNigiri, CardType::SquidNigiri, CardType::Pudding]),
            Hand::with_cards(vec![CardType::Tempura; 3]),
        ];
        let state = TableState::from_parts(hands, vec![Tableau::new(); 2], 0).unwrap();
        let legal = state.legal_actions(PlayerId::new(0));
        let mut oracle = GreedyOracle::new(HeuristicEvaluator::new(HeuristicPreset::ScoreOnly));
        assert_eq!(oracle.search(&state, &legal), Action::Pick(CardType::SquidNigiri));
        assert_eq!(oracle.searches(), 1);
    }

    #[test]
    fn greedy_falls_back_to_first_when_nothing_previews() {
        let state = TableState::deal(2, 4).unwrap();
        let hand = state.hand(PlayerId::new(0)).unwrap().clone();
        let missing = CardType::ALL
            .into_iter()
            .filter(|card| !hand.contains(*card))
            .map(Action::Pick)
            .collect::<Vec<_>>();
        assert!(!missing.is_empty());
        let mut oracle = GreedyOracle::new(HeuristicEvaluator::default());
        assert_eq!(oracle.search(&state, &missing), missing[0]);
    }
}
