use crate::model::card::CardType;
use crate::model::counts::CardCounts;
use std::vec::Vec;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hand {
    cards: Vec<CardType>,
}

impl Hand {
    pub fn new() -> Self {
        Self { cards: Vec::new() }
    }

    pub fn with_cards(cards: Vec<CardType>) -> Self {
        let mut hand = Self { cards };
        hand.sort();
        hand
    }

    pub fn add(&mut self, card: CardType) {
        self.cards.push(card);
        self.sort();
    }

    pub fn remove(&mut self, card: CardType) -> bool {
        if let Some(index) = self.cards.iter().position(|&c| c == card) {
            self.cards.remove(index);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, card: CardType) -> bool {
        self.cards.contains(&card)
    }

    pub fn count(&self, card: CardType) -> usize {
        self.cards.iter().filter(|&&c| c == card).count()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CardType> {
        self.cards.iter()
    }

    pub fn cards(&self) -> &[CardType] {
        &self.cards
    }

    pub fn counts(&self) -> CardCounts {
        CardCounts::from_cards(self.cards.iter())
    }

    /// Distinct card types held, in canonical order.
    pub fn distinct(&self) -> Vec<CardType> {
        let mut types = self.cards.clone();
        types.dedup();
        types
    }

    fn sort(&mut self) {
        self.cards.sort();
    }
}
