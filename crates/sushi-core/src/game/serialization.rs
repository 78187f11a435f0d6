use crate::game::table::TableState;
use crate::game::view::{GameView, ObservedView};
use crate::model::card::CardType;
use crate::model::player::PlayerId;
use serde::{Deserialize, Serialize};

/// Public view of a table: everything any seat can see, no hidden hands.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableSnapshot {
    pub round: u8,
    pub rounds_total: u8,
    pub turn: u32,
    pub finished: bool,
    pub perspective: PlayerId,
    pub scores: Vec<i32>,
    pub hand_sizes: Vec<usize>,
    pub tableaux: Vec<Vec<CardType>>,
    pub puddings: Vec<u32>,
}

impl TableSnapshot {
    pub fn capture(state: &TableState) -> Self {
        let seats: Vec<PlayerId> = PlayerId::seats(state.player_count()).collect();
        TableSnapshot {
            round: state.round(),
            rounds_total: state.rounds_total(),
            turn: state.turn(),
            finished: state.is_finished(),
            perspective: state.perspective(),
            scores: state.scores().standings().to_vec(),
            hand_sizes: seats
                .iter()
                .map(|&seat| state.hand_size(seat).unwrap_or(0))
                .collect(),
            tableaux: state
                .tableaux()
                .iter()
                .map(|tableau| tableau.played().to_vec())
                .collect(),
            puddings: state.tableaux().iter().map(|t| t.puddings()).collect(),
        }
    }

    pub fn to_json(state: &TableState) -> serde_json::Result<String> {
        let snapshot = Self::capture(state);
        serde_json::to_string_pretty(&snapshot)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
