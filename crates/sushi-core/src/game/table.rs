use crate::game::view::{Determinize, GameView, ObservedView, Transition, ViewError};
use crate::model::action::Action;
use crate::model::card::CardType;
use crate::model::counts::CardCounts;
use crate::model::deck::Deck;
use crate::model::hand::Hand;
use crate::model::player::{MAX_PLAYERS, MIN_PLAYERS, PlayerId};
use crate::model::score::{ScoreBoard, maki_awards, pudding_awards, tableau_points};
use crate::model::tableau::Tableau;
use std::fmt;

/// Complete table state as held by the game loop, hidden hands included.
///
/// Every seat picks simultaneously through [`TableState::play_turn`]; hands
/// then rotate to the next seat. The `perspective` seat is the one whose
/// information set the [`ObservedView`] implementation exposes.
#[derive(Debug, Clone)]
pub struct TableState {
    hands: Vec<Hand>,
    tableaux: Vec<Tableau>,
    scores: ScoreBoard,
    discarded: CardCounts,
    deck: Deck,
    round: u8,
    rounds_total: u8,
    turn: u32,
    perspective: PlayerId,
    finished: bool,
}

impl TableState {
    pub const ROUNDS: u8 = 3;

    /// Cards dealt per hand for a given table size.
    pub const fn hand_size_for(player_count: usize) -> Option<usize> {
        match player_count {
            2 => Some(10),
            3 => Some(9),
            4 => Some(8),
            5 => Some(7),
            _ => None,
        }
    }

    pub fn deal(player_count: usize, seed: u64) -> Result<Self, RulesError> {
        Self::deal_from(Deck::shuffled_with_seed(seed), player_count)
    }

    pub fn deal_from(mut deck: Deck, player_count: usize) -> Result<Self, RulesError> {
        let hand_size = Self::hand_size_for(player_count)
            .ok_or(RulesError::UnsupportedPlayerCount { count: player_count })?;
        let hands = (0..player_count)
            .map(|_| Hand::with_cards(deck.draw(hand_size)))
            .collect();
        Ok(Self {
            hands,
            tableaux: vec![Tableau::new(); player_count],
            scores: ScoreBoard::new(player_count),
            discarded: CardCounts::empty(),
            deck,
            round: 0,
            rounds_total: Self::ROUNDS,
            turn: 0,
            perspective: PlayerId::new(0),
            finished: false,
        })
    }

    /// Builds a mid-round position from explicit hands and tableaux. The draw
    /// pile holds whatever the hands and tableaux do not.
    pub fn from_parts(
        hands: Vec<Hand>,
        tableaux: Vec<Tableau>,
        round: u8,
    ) -> Result<Self, RulesError> {
        let player_count = hands.len();
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&player_count) || tableaux.len() != player_count
        {
            return Err(RulesError::UnsupportedPlayerCount { count: player_count });
        }

        let mut used = CardCounts::empty();
        for hand in &hands {
            used.merge(&hand.counts());
        }
        for tableau in &tableaux {
            used.merge(&tableau.counts());
        }
        let mut pile = Vec::new();
        for (card, remaining) in CardCounts::full_deck().saturating_sub(&used).iter() {
            pile.extend(std::iter::repeat_n(card, remaining as usize));
        }
        let deck = Deck::from_cards(pile);

        Ok(Self {
            hands,
            tableaux,
            scores: ScoreBoard::new(player_count),
            discarded: CardCounts::empty(),
            deck,
            round: round.min(Self::ROUNDS - 1),
            rounds_total: Self::ROUNDS,
            turn: 0,
            perspective: PlayerId::new(0),
            finished: false,
        })
    }

    pub fn with_perspective(mut self, player: PlayerId) -> Self {
        self.set_perspective(player);
        self
    }

    pub fn set_perspective(&mut self, player: PlayerId) {
        if player.index() < self.hands.len() {
            self.perspective = player;
        }
    }

    pub fn hand(&self, player: PlayerId) -> Option<&Hand> {
        self.hands.get(player.index())
    }

    pub fn tableau(&self, player: PlayerId) -> Option<&Tableau> {
        self.tableaux.get(player.index())
    }

    pub fn tableaux(&self) -> &[Tableau] {
        &self.tableaux
    }

    pub fn scores(&self) -> &ScoreBoard {
        &self.scores
    }

    pub fn scores_mut(&mut self) -> &mut ScoreBoard {
        &mut self.scores
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn deck_remaining(&self) -> usize {
        self.deck.remaining()
    }

    /// Undrawn cards; the last one is drawn first.
    pub fn draw_pile(&self) -> &[CardType] {
        self.deck.cards()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Every pick `player` may make this turn, in a stable order: single picks
    /// first, then chopsticks pairs.
    pub fn legal_actions(&self, player: PlayerId) -> Vec<Action> {
        if self.finished {
            return Vec::new();
        }
        let (Some(hand), Some(tableau)) = (self.hand(player), self.tableau(player)) else {
            return Vec::new();
        };

        let distinct = hand.distinct();
        let mut actions: Vec<Action> = distinct.iter().map(|&card| Action::Pick(card)).collect();

        if hand.len() >= 2 && tableau.count(CardType::Chopsticks) > 0 {
            for (i, &first) in distinct.iter().enumerate() {
                for &second in &distinct[i..] {
                    if first == second && hand.count(first) < 2 {
                        continue;
                    }
                    actions.push(Action::PickPair(first, second));
                }
            }
        }
        actions
    }

    pub fn validate(&self, player: PlayerId, action: &Action) -> Result<(), RulesError> {
        if self.finished {
            return Err(RulesError::GameOver);
        }
        let (Some(hand), Some(tableau)) = (self.hand(player), self.tableau(player)) else {
            return Err(RulesError::UnknownPlayer { player });
        };
        let wanted = CardCounts::from_cards(action.cards().iter());
        for (card, needed) in wanted.iter() {
            if needed > 0 && (hand.count(card) as u32) < needed {
                return Err(RulesError::CardNotInHand { player, card });
            }
        }
        if action.uses_chopsticks() && tableau.count(CardType::Chopsticks) == 0 {
            return Err(RulesError::NoChopsticks { player });
        }
        Ok(())
    }

    /// Applies one simultaneous pick per seat (indexed by seat), reveals them
    /// and passes hands along. Closes the round once every hand is empty.
    pub fn play_turn(&mut self, actions: &[Action]) -> Result<TurnOutcome, RulesError> {
        if self.finished {
            return Err(RulesError::GameOver);
        }
        if actions.len() != self.hands.len() {
            return Err(RulesError::ActionCount {
                expected: self.hands.len(),
                found: actions.len(),
            });
        }
        for (player, action) in PlayerId::seats(self.hands.len()).zip(actions) {
            self.validate(player, action)?;
        }
        for (player, action) in PlayerId::seats(self.hands.len()).zip(actions) {
            self.commit(player, action);
        }
        self.turn += 1;

        if self.hands.iter().all(Hand::is_empty) {
            return Ok(self.close_round());
        }
        self.hands.rotate_right(1);
        Ok(TurnOutcome::Continued)
    }

    /// Final standings: banked score per seat.
    pub fn final_scores(&self) -> &[i32] {
        self.scores.standings()
    }

    fn commit(&mut self, player: PlayerId, action: &Action) {
        let index = player.index();
        for card in action.cards() {
            self.hands[index].remove(card);
        }
        let tableau = &mut self.tableaux[index];
        match *action {
            Action::Pick(card) => tableau.play(card),
            Action::PickPair(first, second) => {
                // Wasabi goes down first so the paired nigiri can use it.
                let (first, second) = if second == CardType::Wasabi {
                    (second, first)
                } else {
                    (first, second)
                };
                if tableau.take(CardType::Chopsticks) {
                    self.hands[index].add(CardType::Chopsticks);
                }
                tableau.play(first);
                tableau.play(second);
            }
        }
    }

    fn close_round(&mut self) -> TurnOutcome {
        let maki = maki_awards(&self.tableaux);
        let points: Vec<i32> = self
            .tableaux
            .iter()
            .zip(&maki)
            .map(|(tableau, award)| tableau_points(tableau) + award)
            .collect();
        self.scores.apply_round(&points);

        let closed = self.round;
        if closed + 1 >= self.rounds_total {
            let puddings = pudding_awards(&self.tableaux);
            self.scores.apply_round(&puddings);
            for tableau in &mut self.tableaux {
                let discarded = tableau.close_round();
                self.discarded.merge(&discarded);
            }
            self.finished = true;
            return TurnOutcome::GameOver;
        }

        for tableau in &mut self.tableaux {
            let discarded = tableau.close_round();
            self.discarded.merge(&discarded);
        }
        self.round += 1;
        self.turn = 0;
        let hand_size = Self::hand_size_for(self.hands.len()).unwrap_or(0);
        for hand in &mut self.hands {
            *hand = Hand::with_cards(self.deck.draw(hand_size));
        }
        TurnOutcome::RoundEnded { round: closed }
    }

    fn seat_index(&self, player: PlayerId) -> Result<usize, ViewError> {
        if player.index() < self.hands.len() {
            Ok(player.index())
        } else {
            Err(ViewError::UnknownPlayer { player })
        }
    }
}

impl GameView for TableState {
    fn player_count(&self) -> usize {
        self.hands.len()
    }

    fn round(&self) -> u8 {
        self.round
    }

    fn rounds_total(&self) -> u8 {
        self.rounds_total
    }

    fn realized_score(&self, player: PlayerId) -> Result<i32, ViewError> {
        let index = self.seat_index(player)?;
        let banked = self.scores.score(player).unwrap_or(0);
        Ok(banked + tableau_points(&self.tableaux[index]))
    }

    fn played(&self, player: PlayerId, card: CardType) -> Result<u32, ViewError> {
        let index = self.seat_index(player)?;
        Ok(self.tableaux[index].count(card))
    }

    fn hand_size(&self, player: PlayerId) -> Result<usize, ViewError> {
        let index = self.seat_index(player)?;
        Ok(self.hands[index].len())
    }
}

impl ObservedView for TableState {
    fn perspective(&self) -> PlayerId {
        self.perspective
    }

    fn own_hand(&self) -> &Hand {
        &self.hands[self.perspective.index()]
    }

    fn board(&self, player: PlayerId) -> Result<&Tableau, ViewError> {
        let index = self.seat_index(player)?;
        Ok(&self.tableaux[index])
    }

    fn discarded(&self) -> CardCounts {
        self.discarded
    }
}

impl Determinize for TableState {
    fn replace_hand(&mut self, player: PlayerId, hand: Hand) -> Result<(), ViewError> {
        let index = self.seat_index(player)?;
        if player == self.perspective {
            return Err(ViewError::PerspectiveHand { player });
        }
        self.hands[index] = hand;
        Ok(())
    }

    fn replace_draw_pile(&mut self, cards: Vec<CardType>) -> Result<(), ViewError> {
        self.deck = Deck::from_cards(cards);
        Ok(())
    }
}

impl Transition for TableState {
    type Action = Action;
    type Error = RulesError;

    fn preview(&self, player: PlayerId, action: &Action) -> Result<Self, RulesError> {
        self.validate(player, action)?;
        let mut next = self.clone();
        next.commit(player, action);
        Ok(next)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    Continued,
    RoundEnded { round: u8 },
    GameOver,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RulesError {
    UnsupportedPlayerCount { count: usize },
    UnknownPlayer { player: PlayerId },
    CardNotInHand { player: PlayerId, card: CardType },
    NoChopsticks { player: PlayerId },
    ActionCount { expected: usize, found: usize },
    GameOver,
}

impl fmt::Display for RulesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RulesError::UnsupportedPlayerCount { count } => {
                write!(f, "{count} players is outside the supported {MIN_PLAYERS}..={MAX_PLAYERS}")
            }
            RulesError::UnknownPlayer { player } => write!(f, "no seat {player} at this table"),
            RulesError::CardNotInHand { player, card } => {
                write!(f, "{player} does not hold {card}")
            }
            RulesError::NoChopsticks { player } => {
                write!(f, "{player} has no chopsticks on the table")
            }
            RulesError::ActionCount { expected, found } => {
                write!(f, "expected {expected} picks, got {found}")
            }
            RulesError::GameOver => write!(f, "the game is already over"),
        }
    }
}

impl std::error::Error for RulesError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_picks(table: &TableState) -> Vec<Action> {
        PlayerId::seats(table.player_count())
            .map(|player| table.legal_actions(player)[0])
            .collect()
    }

    #[test]
    fn dealing_matches_table_size() {
        for (players, size) in [(2, 10), (3, 9), (4, 8), (5, 7)] {
            let table = TableState::deal(players, 7).unwrap();
            for player in PlayerId::seats(players) {
                assert_eq!(table.hand_size(player), Ok(size));
            }
            assert_eq!(table.deck_remaining(), 108 - players * size);
        }
        assert!(matches!(
            TableState::deal(6, 7),
            Err(RulesError::UnsupportedPlayerCount { count: 6 })
        ));
    }

    #[test]
    fn hands_rotate_after_each_turn() {
        let mut table = TableState::deal(3, 11).unwrap();
        let before: Vec<Hand> = PlayerId::seats(3)
            .map(|p| table.hand(p).unwrap().clone())
            .collect();
        let picks = first_picks(&table);
        table.play_turn(&picks).unwrap();

        let mut expected = before[0].clone();
        expected.remove(picks[0].cards()[0]);
        assert_eq!(table.hand(PlayerId::new(1)), Some(&expected));
        assert_eq!(table.tableau(PlayerId::new(0)).unwrap().played().len(), 1);
    }

    #[test]
    fn full_game_runs_three_rounds() {
        let mut table = TableState::deal(4, 2024).unwrap();
        let mut rounds_closed = 0;
        loop {
            let picks = first_picks(&table);
            match table.play_turn(&picks).unwrap() {
                TurnOutcome::Continued => {}
                TurnOutcome::RoundEnded { .. } => rounds_closed += 1,
                TurnOutcome::GameOver => break,
            }
        }
        assert_eq!(rounds_closed, 2);
        assert!(table.is_finished());
        assert!(table.legal_actions(PlayerId::new(0)).is_empty());
        assert_eq!(table.play_turn(&[]), Err(RulesError::GameOver));
    }

    #[test]
    fn chopsticks_unlock_pairs_and_return_to_hand() {
        let hands = vec![
            Hand::with_cards(vec![CardType::Wasabi, CardType::SquidNigiri]),
            Hand::with_cards(vec![CardType::Tempura, CardType::Tempura]),
        ];
        let tableaux = vec![
            Tableau::with_cards(vec![CardType::Chopsticks]),
            Tableau::new(),
        ];
        let mut table = TableState::from_parts(hands, tableaux, 0).unwrap();

        let legal = table.legal_actions(PlayerId::new(0));
        assert!(legal.contains(&Action::PickPair(CardType::SquidNigiri, CardType::Wasabi)));
        assert!(!legal.contains(&Action::PickPair(CardType::Wasabi, CardType::Wasabi)));

        table
            .play_turn(&[
                Action::PickPair(CardType::SquidNigiri, CardType::Wasabi),
                Action::Pick(CardType::Tempura),
            ])
            .unwrap();

        // wasabi was laid first, so the squid is tripled
        let tableau = table.tableau(PlayerId::new(0)).unwrap();
        assert_eq!(tableau.played(), &[CardType::Wasabi, CardType::SquidNigiri]);
        assert_eq!(table.realized_score(PlayerId::new(0)), Ok(9));
        // chopsticks travelled with the rotated hand
        assert!(table.hand(PlayerId::new(1)).unwrap().contains(CardType::Chopsticks));
    }

    #[test]
    fn illegal_picks_are_rejected_before_any_change() {
        let mut table = TableState::deal(2, 5).unwrap();
        let missing = CardType::ALL
            .iter()
            .copied()
            .find(|card| !table.hand(PlayerId::new(0)).unwrap().contains(*card))
            .unwrap();
        let picks = vec![Action::Pick(missing), first_picks(&table)[1]];
        assert!(matches!(
            table.play_turn(&picks),
            Err(RulesError::CardNotInHand { .. })
        ));
        assert_eq!(table.turn(), 0);
        assert_eq!(table.hand_size(PlayerId::new(1)), Ok(10));
    }

    #[test]
    fn replace_hand_refuses_perspective_seat() {
        let mut table = TableState::deal(3, 1).unwrap().with_perspective(PlayerId::new(1));
        let err = table.replace_hand(PlayerId::new(1), Hand::new()).unwrap_err();
        assert_eq!(err, ViewError::PerspectiveHand { player: PlayerId::new(1) });
        table.replace_hand(PlayerId::new(2), Hand::new()).unwrap();
        assert_eq!(table.hand_size(PlayerId::new(2)), Ok(0));
        assert!(table.replace_hand(PlayerId::new(9), Hand::new()).is_err());
    }

    #[test]
    fn next_round_is_dealt_from_the_replaced_pile() {
        let mut table = TableState::deal(2, 3).unwrap();
        for _ in 0..9 {
            let picks = first_picks(&table);
            table.play_turn(&picks).unwrap();
        }
        table
            .replace_draw_pile(vec![CardType::EggNigiri; 20])
            .unwrap();
        assert_eq!(table.draw_pile(), &[CardType::EggNigiri; 20][..]);

        let picks = first_picks(&table);
        assert_eq!(table.play_turn(&picks), Ok(TurnOutcome::RoundEnded { round: 0 }));
        for seat in PlayerId::seats(2) {
            assert_eq!(table.hand(seat), Some(&Hand::with_cards(vec![CardType::EggNigiri; 10])));
        }
        assert_eq!(table.deck_remaining(), 0);
    }

    #[test]
    fn preview_does_not_touch_original() {
        let table = TableState::deal(3, 9).unwrap();
        let action = table.legal_actions(PlayerId::new(0))[0];
        let next = table.preview(PlayerId::new(0), &action).unwrap();
        assert_eq!(table.tableau(PlayerId::new(0)).unwrap().played().len(), 0);
        assert_eq!(next.tableau(PlayerId::new(0)).unwrap().played().len(), 1);
        assert_eq!(next.hand_size(PlayerId::new(0)), Ok(8));
    }

    #[test]
    fn from_parts_keeps_unused_cards_in_the_pile() {
        let hands = vec![
            Hand::with_cards(vec![CardType::Tempura; 3]),
            Hand::with_cards(vec![CardType::Pudding; 3]),
        ];
        let table = TableState::from_parts(hands, vec![Tableau::new(); 2], 1).unwrap();
        assert_eq!(table.deck_remaining(), 102);
        assert_eq!(table.round(), 1);
    }
}
