//! Capability traits that decision code consumes instead of a concrete state type.
//!
//! - `GameView`: read access a fully observed state offers to an evaluator.
//! - `ObservedView`: what the deciding player legitimately sees.
//! - `Determinize`: a copyable state whose hidden cards (opponent hands and
//!   the draw pile) can be rewritten.

use crate::model::card::CardType;
use crate::model::counts::CardCounts;
use crate::model::hand::Hand;
use crate::model::player::PlayerId;
use crate::model::tableau::Tableau;
use std::fmt;

pub trait GameView {
    fn player_count(&self) -> usize;

    /// Zero-based round counter.
    fn round(&self) -> u8;

    fn rounds_total(&self) -> u8 {
        3
    }

    /// Points the player has realized so far, banked rounds included.
    fn realized_score(&self, player: PlayerId) -> Result<i32, ViewError>;

    /// Face-up copies of `card` in front of `player`.
    fn played(&self, player: PlayerId, card: CardType) -> Result<u32, ViewError>;

    fn maki_icons(&self, player: PlayerId) -> Result<u32, ViewError> {
        let mut icons = 0;
        for card in [CardType::MakiRoll1, CardType::MakiRoll2, CardType::MakiRoll3] {
            icons += self.played(player, card)? * card.maki_icons();
        }
        Ok(icons)
    }

    fn hand_size(&self, player: PlayerId) -> Result<usize, ViewError>;
}

pub trait ObservedView: GameView {
    /// The player whose information set this view represents.
    fn perspective(&self) -> PlayerId;

    fn own_hand(&self) -> &Hand;

    fn board(&self, player: PlayerId) -> Result<&Tableau, ViewError>;

    /// Face-up discards from completed rounds.
    fn discarded(&self) -> CardCounts {
        CardCounts::empty()
    }
}

pub trait Determinize: ObservedView + Clone {
    /// Replaces an opponent's hand with a hypothetical one.
    fn replace_hand(&mut self, player: PlayerId, hand: Hand) -> Result<(), ViewError>;

    /// Replaces the undrawn cards. The last card of `cards` is drawn first.
    fn replace_draw_pile(&mut self, cards: Vec<CardType>) -> Result<(), ViewError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewError {
    /// The state cannot expose this capability at all.
    Unsupported { capability: &'static str },
    UnknownPlayer { player: PlayerId },
    /// The perspective player's own hand cannot be replaced.
    PerspectiveHand { player: PlayerId },
}

impl fmt::Display for ViewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewError::Unsupported { capability } => {
                write!(f, "state does not support {capability}")
            }
            ViewError::UnknownPlayer { player } => write!(f, "no seat {player} at this table"),
            ViewError::PerspectiveHand { player } => {
                write!(f, "refusing to rewrite the hand of perspective player {player}")
            }
        }
    }
}

impl std::error::Error for ViewError {}

/// One-step lookahead used by search code: the state after `player` commits
/// `action`, without advancing the turn.
pub trait Transition: Sized {
    type Action;
    type Error;

    fn preview(&self, player: PlayerId, action: &Self::Action) -> Result<Self, Self::Error>;
}
