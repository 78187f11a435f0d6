use crate::model::card::{CardType, DECK_SIZE};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Draw pile. Cards are drawn from the end of the vector.
#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<CardType>,
}

impl Deck {
    pub fn standard() -> Self {
        let mut cards = Vec::with_capacity(DECK_SIZE as usize);
        for card in CardType::ALL {
            for _ in 0..card.total_copies() {
                cards.push(card);
            }
        }
        Self { cards }
    }

    pub fn from_cards(cards: Vec<CardType>) -> Self {
        Self { cards }
    }

    pub fn shuffled<R: rand::Rng + ?Sized>(rng: &mut R) -> Self {
        let mut deck = Self::standard();
        deck.shuffle_in_place(rng);
        deck
    }

    pub fn shuffled_with_seed(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::shuffled(&mut rng)
    }

    pub fn shuffle_in_place<R: rand::Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
    }

    /// Draws up to `count` cards; fewer are returned if the pile runs out.
    pub fn draw(&mut self, count: usize) -> Vec<CardType> {
        let keep = self.cards.len().saturating_sub(count);
        self.cards.split_off(keep)
    }

    pub fn remaining(&self) -> usize {
        self.cards.len()
    }

    pub fn cards(&self) -> &[CardType] {
        &self.cards
    }
}
