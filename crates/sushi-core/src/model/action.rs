use crate::model::card::CardType;
use core::fmt;
use serde::{Deserialize, Serialize};

/// One turn's pick. `PickPair` spends a chopsticks card from the tableau.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Pick(CardType),
    PickPair(CardType, CardType),
}

impl Action {
    pub fn cards(self) -> Vec<CardType> {
        match self {
            Action::Pick(card) => vec![card],
            Action::PickPair(first, second) => vec![first, second],
        }
    }

    pub const fn uses_chopsticks(self) -> bool {
        matches!(self, Action::PickPair(..))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Pick(card) => write!(f, "{card}"),
            Action::PickPair(first, second) => write!(f, "{first}+{second}"),
        }
    }
}
