//! Unseen-card estimation from the deciding player's point of view.

use serde::Serialize;
use sushi_core::game::view::ObservedView;
use sushi_core::model::card::CardType;
use sushi_core::model::counts::CardCounts;
use sushi_core::model::player::PlayerId;
use tracing::{Level, event};

/// Probability that an unseen card is of each type, plus the counts it was
/// derived from. Probabilities sum to 1 when anything is unseen, else all 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnseenDistribution {
    unseen: CardCounts,
    probabilities: [f64; CardType::COUNT],
}

impl UnseenDistribution {
    pub fn from_unseen(unseen: CardCounts) -> Self {
        let total = unseen.total();
        let mut probabilities = [0.0; CardType::COUNT];
        if total > 0 {
            for (card, count) in unseen.iter() {
                if count > 0 {
                    probabilities[card.index()] = f64::from(count) / f64::from(total);
                }
            }
        }
        Self {
            unseen,
            probabilities,
        }
    }

    /// Nothing observed yet: the composition of the full deck.
    pub fn prior() -> Self {
        Self::from_unseen(CardCounts::full_deck())
    }

    pub fn probability(&self, card: CardType) -> f64 {
        self.probabilities[card.index()]
    }

    pub fn unseen_count(&self, card: CardType) -> u32 {
        self.unseen.get(card)
    }

    pub fn unseen(&self) -> &CardCounts {
        &self.unseen
    }

    pub fn total_unseen(&self) -> u32 {
        self.unseen.total()
    }

    /// Copies of `card` to put in a sampling pool: `p * total` rounded,
    /// never more than are actually unseen.
    pub fn pool_count(&self, card: CardType) -> u32 {
        let unseen = self.unseen.get(card);
        if unseen == 0 {
            return 0;
        }
        let expected = (self.probability(card) * f64::from(self.total_unseen())).round();
        (expected as u32).min(unseen)
    }

    pub fn iter(&self) -> impl Iterator<Item = (CardType, f64)> + '_ {
        CardType::ALL
            .iter()
            .map(move |&card| (card, self.probability(card)))
    }
}

impl Default for UnseenDistribution {
    fn default() -> Self {
        Self::prior()
    }
}

/// Derives the unseen distribution from everything a seat can see: its own
/// hand, every tableau (banked puddings included) and past discards.
#[derive(Debug, Clone)]
pub struct UnseenCardTracker {
    totals: CardCounts,
    latest: UnseenDistribution,
    updates: u64,
}

impl UnseenCardTracker {
    pub fn new() -> Self {
        Self::with_totals(CardCounts::full_deck())
    }

    /// Tracker for a non-standard deck composition.
    pub fn with_totals(totals: CardCounts) -> Self {
        Self {
            totals,
            latest: UnseenDistribution::from_unseen(totals),
            updates: 0,
        }
    }

    pub fn totals(&self) -> &CardCounts {
        &self.totals
    }

    /// Cards the perspective seat has observed. Boards the view refuses to
    /// expose contribute nothing.
    pub fn seen_counts<V: ObservedView + ?Sized>(view: &V) -> CardCounts {
        let mut seen = view.own_hand().counts();
        for player in PlayerId::seats(view.player_count()) {
            match view.board(player) {
                Ok(board) => seen.merge(&board.counts()),
                Err(err) => {
                    event!(
                        target: "sushi_bot::tracker",
                        Level::DEBUG,
                        player = %player,
                        error = %err,
                        "board unavailable, skipping"
                    );
                }
            }
        }
        seen.merge(&view.discarded());
        seen
    }

    /// Pure estimate; does not touch the cached distribution.
    pub fn estimate<V: ObservedView + ?Sized>(&self, view: &V) -> UnseenDistribution {
        let seen = Self::seen_counts(view);
        UnseenDistribution::from_unseen(self.totals.saturating_sub(&seen))
    }

    /// Recomputes from `view` and caches the result.
    pub fn update<V: ObservedView + ?Sized>(&mut self, view: &V) -> &UnseenDistribution {
        self.latest = self.estimate(view);
        self.updates += 1;
        if tracing::enabled!(Level::TRACE) {
            event!(
                target: "sushi_bot::tracker",
                Level::TRACE,
                perspective = %view.perspective(),
                unseen = self.latest.total_unseen(),
                updates = self.updates,
            );
        }
        &self.latest
    }

    pub fn distribution(&self) -> &UnseenDistribution {
        &self.latest
    }

    pub fn unseen_count(&self) -> u32 {
        self.latest.total_unseen()
    }

    pub fn updates(&self) -> u64 {
        self.updates
    }
}

impl Default for UnseenCardTracker {
    fn default() -> Self {
        Self::new()
    }
}
