use crate::model::card::CardType;
use crate::model::counts::CardCounts;

/// Face-up cards a player has in front of them.
///
/// `played` holds this round's cards in play order (wasabi pairs with the next
/// nigiri, so order matters). Puddings survive round boundaries and are kept
/// in `banked_puddings` once a round closes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tableau {
    played: Vec<CardType>,
    banked_puddings: u32,
}

impl Tableau {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cards(played: Vec<CardType>) -> Self {
        Self {
            played,
            banked_puddings: 0,
        }
    }

    pub fn play(&mut self, card: CardType) {
        self.played.push(card);
    }

    /// Takes back the earliest copy of `card` played this round.
    pub fn take(&mut self, card: CardType) -> bool {
        if let Some(index) = self.played.iter().position(|&c| c == card) {
            self.played.remove(index);
            true
        } else {
            false
        }
    }

    pub fn played(&self) -> &[CardType] {
        &self.played
    }

    /// Copies of `card` visible on this tableau, including banked puddings.
    pub fn count(&self, card: CardType) -> u32 {
        let this_round = self.played.iter().filter(|&&c| c == card).count() as u32;
        if card == CardType::Pudding {
            this_round + self.banked_puddings
        } else {
            this_round
        }
    }

    pub fn puddings(&self) -> u32 {
        self.count(CardType::Pudding)
    }

    pub fn maki_icons(&self) -> u32 {
        self.played.iter().map(|card| card.maki_icons()).sum()
    }

    /// Every visible card, banked puddings included.
    pub fn counts(&self) -> CardCounts {
        let mut counts = CardCounts::from_cards(self.played.iter());
        counts.add(CardType::Pudding, self.banked_puddings);
        counts
    }

    /// Closes the round: banks puddings and returns the cards to discard.
    pub fn close_round(&mut self) -> CardCounts {
        let mut discarded = CardCounts::empty();
        for card in self.played.drain(..) {
            if card == CardType::Pudding {
                self.banked_puddings += 1;
            } else {
                discarded.add(card, 1);
            }
        }
        discarded
    }
}

#[cfg(test)]
mod tests {
    use super::Tableau;
    use crate::model::card::CardType;

    #[test]
    fn puddings_survive_round_close() {
        let mut tableau = Tableau::with_cards(vec![
            CardType::Pudding,
            CardType::Tempura,
            CardType::MakiRoll2,
        ]);
        let discarded = tableau.close_round();
        assert_eq!(discarded.total(), 2);
        assert!(tableau.played().is_empty());
        assert_eq!(tableau.puddings(), 1);
        tableau.play(CardType::Pudding);
        assert_eq!(tableau.count(CardType::Pudding), 2);
        assert_eq!(tableau.counts().get(CardType::Pudding), 2);
    }

    #[test]
    fn maki_icons_sum_roll_values() {
        let tableau = Tableau::with_cards(vec![
            CardType::MakiRoll1,
            CardType::MakiRoll3,
            CardType::Dumpling,
        ]);
        assert_eq!(tableau.maki_icons(), 4);
    }

    #[test]
    fn take_removes_single_copy() {
        let mut tableau = Tableau::with_cards(vec![CardType::Chopsticks, CardType::Chopsticks]);
        assert!(tableau.take(CardType::Chopsticks));
        assert_eq!(tableau.count(CardType::Chopsticks), 1);
        assert!(!tableau.take(CardType::Wasabi));
    }
}
