use crate::model::card::CardType;
use crate::model::player::PlayerId;
use crate::model::tableau::Tableau;

/// Dumpling payouts indexed by how many were played (five or more pay 15).
pub const DUMPLING_LADDER: [i32; 6] = [0, 1, 3, 6, 10, 15];

const TEMPURA_PAIR: i32 = 5;
const SASHIMI_TRIPLE: i32 = 10;
const WASABI_MULTIPLIER: i32 = 3;
const MAKI_FIRST: i32 = 6;
const MAKI_SECOND: i32 = 3;
const PUDDING_AWARD: i32 = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreBoard {
    totals: Vec<i32>,
}

impl ScoreBoard {
    pub fn new(player_count: usize) -> Self {
        Self {
            totals: vec![0; player_count],
        }
    }

    pub fn add_points(&mut self, player: PlayerId, points: i32) {
        if let Some(total) = self.totals.get_mut(player.index()) {
            *total += points;
        }
    }

    pub fn set_totals(&mut self, totals: Vec<i32>) {
        self.totals = totals;
    }

    pub fn score(&self, player: PlayerId) -> Option<i32> {
        self.totals.get(player.index()).copied()
    }

    pub fn standings(&self) -> &[i32] {
        &self.totals
    }

    /// Highest banked total; ties go to the lower seat index.
    pub fn leading_player(&self) -> Option<PlayerId> {
        self.totals
            .iter()
            .enumerate()
            .rev()
            .max_by_key(|(_, total)| **total)
            .map(|(index, _)| PlayerId::new(index))
    }

    pub fn apply_round(&mut self, points: &[i32]) {
        for (total, delta) in self.totals.iter_mut().zip(points) {
            *total += *delta;
        }
    }
}

/// Points a tableau is worth on its own: tempura, sashimi, dumplings and
/// nigiri (tripled by an earlier unused wasabi). Maki and pudding are
/// comparative and scored separately.
pub fn tableau_points(tableau: &Tableau) -> i32 {
    let tempura = tableau.count(CardType::Tempura) as i32;
    let sashimi = tableau.count(CardType::Sashimi) as i32;
    let dumplings = (tableau.count(CardType::Dumpling) as usize).min(DUMPLING_LADDER.len() - 1);

    let mut points = (tempura / 2) * TEMPURA_PAIR
        + (sashimi / 3) * SASHIMI_TRIPLE
        + DUMPLING_LADDER[dumplings];

    let mut open_wasabi = 0;
    for &card in tableau.played() {
        if card == CardType::Wasabi {
            open_wasabi += 1;
        } else if let Some(value) = card.nigiri_value() {
            let value = value as i32;
            if open_wasabi > 0 {
                open_wasabi -= 1;
                points += value * WASABI_MULTIPLIER;
            } else {
                points += value;
            }
        }
    }
    points
}

/// End-of-round maki awards: most icons share 6, runners-up share 3.
/// A shared first place suppresses the second-place award.
pub fn maki_awards(tableaux: &[Tableau]) -> Vec<i32> {
    let icons: Vec<u32> = tableaux.iter().map(Tableau::maki_icons).collect();
    let mut awards = vec![0; tableaux.len()];

    let best = icons.iter().copied().max().unwrap_or(0);
    if best == 0 {
        return awards;
    }
    let leaders: Vec<usize> = positions_with(&icons, best);
    split_award(&mut awards, &leaders, MAKI_FIRST);
    if leaders.len() > 1 {
        return awards;
    }

    let second = icons.iter().copied().filter(|&n| n < best).max().unwrap_or(0);
    if second > 0 {
        let runners = positions_with(&icons, second);
        split_award(&mut awards, &runners, MAKI_SECOND);
    }
    awards
}

/// End-of-game pudding awards: most share +6, fewest share -6.
/// Two-player games skip the penalty, and a full tie awards nothing.
pub fn pudding_awards(tableaux: &[Tableau]) -> Vec<i32> {
    let puddings: Vec<u32> = tableaux.iter().map(Tableau::puddings).collect();
    let mut awards = vec![0; tableaux.len()];
    let (Some(most), Some(least)) = (
        puddings.iter().copied().max(),
        puddings.iter().copied().min(),
    ) else {
        return awards;
    };
    if most == least {
        return awards;
    }
    split_award(&mut awards, &positions_with(&puddings, most), PUDDING_AWARD);
    if tableaux.len() > 2 {
        split_award(&mut awards, &positions_with(&puddings, least), -PUDDING_AWARD);
    }
    awards
}

fn positions_with(values: &[u32], target: u32) -> Vec<usize> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| **v == target)
        .map(|(i, _)| i)
        .collect()
}

fn split_award(awards: &mut [i32], winners: &[usize], amount: i32) {
    if winners.is_empty() {
        return;
    }
    let share = amount / winners.len() as i32;
    for &index in winners {
        awards[index] += share;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scoreboard_tracks_points() {
        let mut board = ScoreBoard::new(3);
        board.add_points(PlayerId::new(1), 12);
        board.apply_round(&[1, 2, 3]);
        assert_eq!(board.score(PlayerId::new(1)), Some(14));
        assert_eq!(board.score(PlayerId::new(5)), None);
        assert_eq!(board.leading_player(), Some(PlayerId::new(1)));
    }

    #[test]
    fn leading_player_prefers_lower_seat_on_tie() {
        let mut board = ScoreBoard::new(3);
        board.set_totals(vec![7, 9, 9]);
        assert_eq!(board.leading_player(), Some(PlayerId::new(1)));
    }

    #[test]
    fn sets_score_only_when_complete() {
        let tableau = Tableau::with_cards(vec![
            CardType::Tempura,
            CardType::Tempura,
            CardType::Tempura,
            CardType::Sashimi,
            CardType::Sashimi,
        ]);
        assert_eq!(tableau_points(&tableau), 5);
    }

    #[test]
    fn dumplings_follow_ladder_and_cap() {
        let tableau = Tableau::with_cards(vec![CardType::Dumpling; 7]);
        assert_eq!(tableau_points(&tableau), 15);
        let three = Tableau::with_cards(vec![CardType::Dumpling; 3]);
        assert_eq!(tableau_points(&three), 6);
    }

    #[test]
    fn wasabi_triples_the_next_nigiri_only() {
        let tableau = Tableau::with_cards(vec![
            CardType::SalmonNigiri,
            CardType::Wasabi,
            CardType::SquidNigiri,
            CardType::EggNigiri,
        ]);
        assert_eq!(tableau_points(&tableau), 2 + 9 + 1);
    }

    #[test]
    fn maki_second_place_is_suppressed_by_tied_leaders() {
        let tableaux = vec![
            Tableau::with_cards(vec![CardType::MakiRoll3]),
            Tableau::with_cards(vec![CardType::MakiRoll2, CardType::MakiRoll1]),
            Tableau::with_cards(vec![CardType::MakiRoll1]),
        ];
        assert_eq!(maki_awards(&tableaux), vec![3, 3, 0]);

        let tableaux = vec![
            Tableau::with_cards(vec![CardType::MakiRoll3]),
            Tableau::with_cards(vec![CardType::MakiRoll1]),
            Tableau::with_cards(vec![CardType::MakiRoll1]),
        ];
        assert_eq!(maki_awards(&tableaux), vec![6, 1, 1]);
    }

    #[test]
    fn pudding_penalty_skipped_for_two_players() {
        let tableaux = vec![
            Tableau::with_cards(vec![CardType::Pudding]),
            Tableau::new(),
        ];
        assert_eq!(pudding_awards(&tableaux), vec![6, 0]);

        let tableaux = vec![
            Tableau::with_cards(vec![CardType::Pudding, CardType::Pudding]),
            Tableau::with_cards(vec![CardType::Pudding]),
            Tableau::new(),
        ];
        assert_eq!(pudding_awards(&tableaux), vec![6, 0, -6]);
    }
}
