use crate::tracker::UnseenDistribution;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use sushi_core::game::view::Determinize;
use sushi_core::model::card::CardType;
use sushi_core::model::hand::Hand;
use sushi_core::model::player::PlayerId;
use tracing::{Level, event};

/// Upper bound on pool copies per unseen card; keeps huge weights from
/// blowing up the sampling pool.
pub const MAX_BIAS_MULTIPLIER: u32 = 64;

/// Per-type sampling weights. Types without an entry weigh 1.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BiasWeights {
    weights: BTreeMap<CardType, f64>,
}

impl BiasWeights {
    pub fn uniform() -> Self {
        Self::default()
    }

    pub fn with(mut self, card: CardType, weight: f64) -> Self {
        self.set(card, weight);
        self
    }

    pub fn set(&mut self, card: CardType, weight: f64) {
        self.weights.insert(card, weight);
    }

    /// Effective weight; non-finite or non-positive entries read as 1.
    pub fn weight(&self, card: CardType) -> f64 {
        match self.weights.get(&card) {
            Some(&weight) if weight.is_finite() && weight > 0.0 => weight,
            _ => 1.0,
        }
    }

    /// How many times each pool entry of `card` is repeated before shuffling.
    pub fn multiplier(&self, card: CardType) -> u32 {
        let rounded = self.weight(card).round();
        if rounded <= 1.0 {
            1
        } else {
            (rounded as u32).min(MAX_BIAS_MULTIPLIER)
        }
    }

    pub fn is_uniform(&self) -> bool {
        CardType::ALL.iter().all(|&card| self.multiplier(card) == 1)
    }

    /// Replaces unusable entries with 1 so the stored map matches what sampling does.
    pub fn sanitize(&mut self) {
        for weight in self.weights.values_mut() {
            if !weight.is_finite() || *weight <= 0.0 {
                *weight = 1.0;
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (CardType, f64)> + '_ {
        self.weights.iter().map(|(&card, &weight)| (card, weight))
    }
}

/// A sampled copy of the observed state with plausible opponent hands and
/// draw pile.
#[derive(Debug, Clone)]
pub struct DeterminizedWorld<S> {
    world: S,
    assigned: usize,
    shortfall: usize,
    pile: usize,
    complete: bool,
}

impl<S> DeterminizedWorld<S> {
    pub fn world(&self) -> &S {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut S {
        &mut self.world
    }

    pub fn into_world(self) -> S {
        self.world
    }

    /// Cards dealt into opponent hands.
    pub fn assigned(&self) -> usize {
        self.assigned
    }

    /// Opponent slots left empty because the pool ran dry, plus every slot of
    /// a seat whose hand could not be rewritten.
    pub fn shortfall(&self) -> usize {
        self.shortfall
    }

    /// Cards placed in the rewritten draw pile.
    pub fn pile(&self) -> usize {
        self.pile
    }

    /// False when some hidden card of the source state could not be
    /// rewritten. Such a world may still hold true hidden information and
    /// must not be searched.
    pub fn is_complete(&self) -> bool {
        self.complete
    }
}

/// Samples opponent hands from an [`UnseenDistribution`]. Owns its RNG so a
/// fixed seed reproduces the same sequence of worlds.
#[derive(Debug, Clone)]
pub struct Determinizer {
    rng: SmallRng,
}

impl Determinizer {
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng = SmallRng::seed_from_u64(seed);
    }

    pub fn sample<S: Determinize>(
        &mut self,
        state: &S,
        distribution: &UnseenDistribution,
    ) -> DeterminizedWorld<S> {
        self.sample_biased(state, distribution, &BiasWeights::uniform())
    }

    pub fn sample_many<S: Determinize>(
        &mut self,
        state: &S,
        distribution: &UnseenDistribution,
        count: usize,
    ) -> Vec<DeterminizedWorld<S>> {
        self.sample_many_biased(state, distribution, &BiasWeights::uniform(), count)
    }

    pub fn sample_many_biased<S: Determinize>(
        &mut self,
        state: &S,
        distribution: &UnseenDistribution,
        bias: &BiasWeights,
        count: usize,
    ) -> Vec<DeterminizedWorld<S>> {
        (0..count)
            .map(|_| self.sample_biased(state, distribution, bias))
            .collect()
    }

    /// Deals a shuffled pool into every opponent hand, in seat order, up to
    /// each opponent's true hand size, then stacks what is left into the draw
    /// pile. Weighted types get repeated pool entries; an entry is skipped
    /// once its type has handed out as many cards as are unseen.
    pub fn sample_biased<S: Determinize>(
        &mut self,
        state: &S,
        distribution: &UnseenDistribution,
        bias: &BiasWeights,
    ) -> DeterminizedWorld<S> {
        let mut pool = build_pool(distribution, bias);
        pool.shuffle(&mut self.rng);

        let mut quota = [0u32; CardType::COUNT];
        for card in CardType::ALL {
            quota[card.index()] = distribution.pool_count(card);
        }
        let mut take = |card: CardType| {
            let left = &mut quota[card.index()];
            if *left == 0 {
                return false;
            }
            *left -= 1;
            true
        };

        let perspective = state.perspective();
        let mut world = state.clone();
        let mut cursor = 0;
        let mut assigned = 0;
        let mut shortfall = 0;
        let mut complete = true;

        for player in PlayerId::seats(state.player_count()) {
            if player == perspective {
                continue;
            }
            let wanted = match state.hand_size(player) {
                Ok(size) => size,
                Err(err) => {
                    event!(
                        target: "sushi_bot::determinizer",
                        Level::DEBUG,
                        player = %player,
                        error = %err,
                        "hand size unavailable, clearing hand"
                    );
                    0
                }
            };

            let mut cards = Vec::with_capacity(wanted);
            while cards.len() < wanted && cursor < pool.len() {
                let card = pool[cursor];
                cursor += 1;
                if take(card) {
                    cards.push(card);
                }
            }

            let dealt = cards.len();
            match world.replace_hand(player, Hand::with_cards(cards)) {
                Ok(()) => {
                    assigned += dealt;
                    shortfall += wanted - dealt;
                }
                Err(err) => {
                    event!(
                        target: "sushi_bot::determinizer",
                        Level::WARN,
                        player = %player,
                        error = %err,
                        "could not install sampled hand, world withheld"
                    );
                    complete = false;
                    shortfall += wanted;
                }
            }
        }

        let pile: Vec<CardType> = pool[cursor..]
            .iter()
            .copied()
            .filter(|&card| take(card))
            .collect();
        let pile_len = pile.len();
        if let Err(err) = world.replace_draw_pile(pile) {
            event!(
                target: "sushi_bot::determinizer",
                Level::WARN,
                error = %err,
                "could not install sampled draw pile, world withheld"
            );
            complete = false;
        }

        if shortfall > 0 {
            event!(
                target: "sushi_bot::determinizer",
                Level::DEBUG,
                shortfall,
                pool = pool.len(),
                "unseen pool smaller than opponent hands"
            );
        }

        DeterminizedWorld {
            world,
            assigned,
            shortfall,
            pile: pile_len,
            complete,
        }
    }
}

impl Default for Determinizer {
    fn default() -> Self {
        Self::new()
    }
}

fn build_pool(distribution: &UnseenDistribution, bias: &BiasWeights) -> Vec<CardType> {
    let mut pool = Vec::with_capacity(distribution.total_unseen() as usize);
    for card in CardType::ALL {
        let copies = distribution.pool_count(card) * bias.multiplier(card);
        pool.extend(std::iter::repeat_n(card, copies as usize));
    }
    pool
}

#[cfg(test)]
mod tests {
    use super::*;
    use sushi_core::model::counts::CardCounts;

    #[test]
    fn multiplier_rounds_and_floors_at_one() {
        let bias = BiasWeights::uniform()
            .with(CardType::Tempura, 2.6)
            .with(CardType::Sashimi, 0.2)
            .with(CardType::Dumpling, -4.0)
            .with(CardType::Pudding, f64::NAN)
            .with(CardType::Wasabi, 1e12);
        assert_eq!(bias.multiplier(CardType::Tempura), 3);
        assert_eq!(bias.multiplier(CardType::Sashimi), 1);
        assert_eq!(bias.multiplier(CardType::Dumpling), 1);
        assert_eq!(bias.weight(CardType::Pudding), 1.0);
        assert_eq!(bias.multiplier(CardType::Wasabi), MAX_BIAS_MULTIPLIER);
        assert_eq!(bias.multiplier(CardType::EggNigiri), 1);
        assert!(!bias.is_uniform());
    }

    #[test]
    fn sanitize_rewrites_unusable_entries() {
        let mut bias = BiasWeights::uniform()
            .with(CardType::Tempura, f64::INFINITY)
            .with(CardType::Sashimi, 0.0)
            .with(CardType::Dumpling, 3.0);
        bias.sanitize();
        let stored: Vec<_> = bias.iter().collect();
        assert_eq!(
            stored,
            vec![
                (CardType::Tempura, 1.0),
                (CardType::Sashimi, 1.0),
                (CardType::Dumpling, 3.0)
            ]
        );
    }

    #[test]
    fn pool_respects_counts_and_bias() {
        let mut unseen = CardCounts::empty();
        unseen.add(CardType::Tempura, 3);
        unseen.add(CardType::Wasabi, 2);
        let dist = UnseenDistribution::from_unseen(unseen);
        let bias = BiasWeights::uniform().with(CardType::Wasabi, 2.0);
        let pool = build_pool(&dist, &bias);
        assert_eq!(pool.iter().filter(|&&c| c == CardType::Tempura).count(), 3);
        assert_eq!(pool.iter().filter(|&&c| c == CardType::Wasabi).count(), 4);
    }

    #[test]
    fn bias_weights_deserialize_from_named_keys() {
        let bias: BiasWeights = serde_yaml::from_str("wasabi: 2.0\nsalmon-nigiri: 3\n").unwrap();
        assert_eq!(bias.weight(CardType::Wasabi), 2.0);
        assert_eq!(bias.multiplier(CardType::SalmonNigiri), 3);
    }
}
