use crate::model::card::CardType;
use serde::{Deserialize, Serialize};

/// Fixed-size per-type card counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CardCounts {
    counts: [u32; CardType::COUNT],
}

impl CardCounts {
    pub const fn empty() -> Self {
        Self {
            counts: [0; CardType::COUNT],
        }
    }

    /// Counts for a complete, undealt deck.
    pub fn full_deck() -> Self {
        let mut counts = Self::empty();
        for card in CardType::ALL {
            counts.set(card, card.total_copies());
        }
        counts
    }

    pub fn from_cards<'a, I>(cards: I) -> Self
    where
        I: IntoIterator<Item = &'a CardType>,
    {
        let mut counts = Self::empty();
        for &card in cards {
            counts.add(card, 1);
        }
        counts
    }

    pub fn get(&self, card: CardType) -> u32 {
        self.counts[card.index()]
    }

    pub fn set(&mut self, card: CardType, value: u32) {
        self.counts[card.index()] = value;
    }

    pub fn add(&mut self, card: CardType, amount: u32) {
        let slot = &mut self.counts[card.index()];
        *slot = slot.saturating_add(amount);
    }

    /// Removes up to `amount` copies, returning how many were actually removed.
    pub fn remove(&mut self, card: CardType, amount: u32) -> u32 {
        let slot = &mut self.counts[card.index()];
        let removed = amount.min(*slot);
        *slot -= removed;
        removed
    }

    pub fn merge(&mut self, other: &CardCounts) {
        for card in CardType::ALL {
            self.add(card, other.get(card));
        }
    }

    /// Per-type `self - other`, floored at zero.
    pub fn saturating_sub(&self, other: &CardCounts) -> CardCounts {
        let mut out = CardCounts::empty();
        for card in CardType::ALL {
            out.set(card, self.get(card).saturating_sub(other.get(card)));
        }
        out
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (CardType, u32)> + '_ {
        CardType::ALL.iter().map(move |&card| (card, self.get(card)))
    }
}
