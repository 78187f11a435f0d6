use sushi_bot::{
    BiasWeights, DecisionEnsemble, Determinizer, SearchOracle, UnseenCardTracker,
    UnseenDistribution,
};
use sushi_core::game::table::{TableState, TurnOutcome};
use sushi_core::game::view::{Determinize, GameView, ObservedView, ViewError};
use sushi_core::model::action::Action;
use sushi_core::model::card::CardType;
use sushi_core::model::counts::CardCounts;
use sushi_core::model::hand::Hand;
use sushi_core::model::player::PlayerId;
use sushi_core::model::tableau::Tableau;

const ME: PlayerId = PlayerId::new(1);

fn midgame_table() -> TableState {
    let mut table = TableState::deal(4, 314).unwrap().with_perspective(ME);
    for _ in 0..3 {
        let picks: Vec<_> = PlayerId::seats(4)
            .map(|seat| table.legal_actions(seat)[0])
            .collect();
        table.play_turn(&picks).unwrap();
    }
    table
}

fn assigned_counts(world: &TableState) -> CardCounts {
    assigned_counts_from(world, ME)
}

/// Cards sitting in every hand except `me`'s.
fn assigned_counts_from(world: &TableState, me: PlayerId) -> CardCounts {
    let mut counts = CardCounts::empty();
    for seat in PlayerId::seats(world.player_count()).filter(|&seat| seat != me) {
        counts.merge(&world.hand(seat).unwrap().counts());
    }
    counts
}

#[test]
fn sampling_never_touches_own_hand_or_boards() {
    let table = midgame_table();
    let dist = UnseenCardTracker::new().estimate(&table);
    let mut sampler = Determinizer::with_seed(5);
    let own_before = table.hand(ME).unwrap().clone();
    let boards_before = table.tableaux().to_vec();

    for world in sampler.sample_many(&table, &dist, 25) {
        let world = world.world();
        assert_eq!(world.hand(ME), Some(&own_before));
        assert_eq!(world.tableaux(), boards_before.as_slice());
    }
    // the source state is untouched as well
    assert_eq!(table.hand(ME), Some(&own_before));
}

#[test]
fn opponents_receive_their_true_hand_sizes() {
    let table = midgame_table();
    let dist = UnseenCardTracker::new().estimate(&table);
    let mut sampler = Determinizer::with_seed(6);
    for world in sampler.sample_many(&table, &dist, 20) {
        assert_eq!(world.shortfall(), 0);
        for seat in PlayerId::seats(4) {
            assert_eq!(world.world().hand_size(seat), table.hand_size(seat));
        }
        assert_eq!(world.assigned(), 3 * table.hand_size(ME).unwrap());
    }
}

#[test]
fn short_pool_fills_exactly_what_it_has() {
    let table = TableState::deal(4, 1).unwrap().with_perspective(ME);
    let mut unseen = CardCounts::empty();
    unseen.add(CardType::Tempura, 3);
    unseen.add(CardType::Pudding, 2);
    let dist = UnseenDistribution::from_unseen(unseen);

    let world = Determinizer::with_seed(2).sample(&table, &dist);
    assert_eq!(world.assigned(), 5);
    assert_eq!(world.shortfall(), 3 * 8 - 5);
    assert_eq!(assigned_counts(world.world()), unseen);
    // seat order: the first opponent is filled before later ones
    assert_eq!(world.world().hand_size(PlayerId::new(0)), Ok(5));
    assert_eq!(world.world().hand_size(PlayerId::new(2)), Ok(0));
}

#[test]
fn no_type_exceeds_its_unseen_count() {
    let table = midgame_table();
    let dist = UnseenCardTracker::new().estimate(&table);
    let bias = BiasWeights::uniform()
        .with(CardType::Chopsticks, 9.0)
        .with(CardType::Wasabi, 4.0);
    let mut sampler = Determinizer::with_seed(77);
    for _ in 0..200 {
        let world = sampler.sample_biased(&table, &dist, &bias);
        let counts = assigned_counts(world.world());
        for card in CardType::ALL {
            assert!(counts.get(card) <= dist.unseen_count(card), "{card} over-assigned");
        }
    }
}

#[test]
fn zero_probability_types_are_never_dealt() {
    let hands = vec![
        Hand::with_cards(vec![CardType::Chopsticks; 4]),
        Hand::with_cards(vec![CardType::EggNigiri; 4]),
        Hand::with_cards(vec![CardType::EggNigiri; 4]),
    ];
    let table = TableState::from_parts(hands, vec![Tableau::new(); 3], 0).unwrap();
    let dist = UnseenCardTracker::new().estimate(&table);
    assert_eq!(dist.probability(CardType::Chopsticks), 0.0);

    let mut sampler = Determinizer::with_seed(3);
    for world in sampler.sample_many(&table, &dist, 100) {
        let dealt = assigned_counts_from(world.world(), PlayerId::new(0));
        assert_eq!(dealt.get(CardType::Chopsticks), 0);
    }
}

#[test]
fn sampled_worlds_are_independent() {
    let table = midgame_table();
    let dist = UnseenCardTracker::new().estimate(&table);
    let mut worlds = Determinizer::with_seed(8).sample_many(&table, &dist, 4);
    assert_eq!(worlds.len(), 4);

    let untouched: Vec<_> = worlds[1..]
        .iter()
        .map(|world| world.world().hand(PlayerId::new(0)).unwrap().clone())
        .collect();
    worlds[0]
        .world_mut()
        .replace_hand(PlayerId::new(0), Hand::new())
        .unwrap();
    assert_eq!(worlds[0].world().hand_size(PlayerId::new(0)), Ok(0));
    for (world, before) in worlds[1..].iter().zip(&untouched) {
        assert_eq!(world.world().hand(PlayerId::new(0)), Some(before));
    }
}

#[test]
fn reseeding_reproduces_the_same_worlds() {
    let table = midgame_table();
    let dist = UnseenCardTracker::new().estimate(&table);
    let mut sampler = Determinizer::with_seed(1);
    let first: Vec<_> = sampler
        .sample_many(&table, &dist, 5)
        .into_iter()
        .map(|w| w.world().hand(PlayerId::new(2)).unwrap().clone())
        .collect();
    sampler.reseed(1);
    let second: Vec<_> = sampler
        .sample_many(&table, &dist, 5)
        .into_iter()
        .map(|w| w.world().hand(PlayerId::new(2)).unwrap().clone())
        .collect();
    assert_eq!(first, second);
}

#[test]
fn bias_weight_skews_sampling_toward_a_type() {
    let hands = vec![
        Hand::with_cards(vec![CardType::Tempura; 9]),
        Hand::with_cards(vec![CardType::Dumpling; 9]),
        Hand::with_cards(vec![CardType::Sashimi; 9]),
    ];
    let table = TableState::from_parts(hands, vec![Tableau::new(); 3], 0).unwrap();
    let dist = UnseenCardTracker::new().estimate(&table);
    assert_eq!(dist.unseen_count(CardType::Wasabi), 6);

    let count_wasabi = |bias: &BiasWeights, seed: u64| -> u32 {
        let mut sampler = Determinizer::with_seed(seed);
        (0..400)
            .map(|_| {
                let world = sampler.sample_biased(&table, &dist, bias);
                assigned_counts_from(world.world(), PlayerId::new(0)).get(CardType::Wasabi)
            })
            .sum()
    };

    let baseline = count_wasabi(&BiasWeights::uniform(), 10);
    let favored = count_wasabi(&BiasWeights::uniform().with(CardType::Wasabi, 5.0), 10);
    assert!(baseline > 0);
    assert!(
        f64::from(favored) > 1.5 * f64::from(baseline),
        "favored {favored} vs baseline {baseline}"
    );
}

/// Plays the first legal pick for every seat until round 0 is scored.
fn close_round(table: &mut TableState) {
    loop {
        let picks: Vec<_> = PlayerId::seats(table.player_count())
            .map(|seat| table.legal_actions(seat)[0])
            .collect();
        match table.play_turn(&picks).unwrap() {
            TurnOutcome::Continued => continue,
            outcome => {
                assert_eq!(outcome, TurnOutcome::RoundEnded { round: 0 });
                return;
            }
        }
    }
}

#[test]
fn sampled_worlds_do_not_inherit_the_true_draw_pile() {
    let me = PlayerId::new(0);
    let mut table = TableState::deal(2, 77).unwrap().with_perspective(me);
    while table.hand_size(me) != Ok(1) {
        let picks: Vec<_> = PlayerId::seats(2)
            .map(|seat| table.legal_actions(seat)[0])
            .collect();
        table.play_turn(&picks).unwrap();
    }
    let mut truth = table.clone();
    close_round(&mut truth);

    let dist = UnseenCardTracker::new().estimate(&table);
    let mut sampler = Determinizer::with_seed(21);
    let mut leaked = 0;
    for sampled in sampler.sample_many(&table, &dist, 20) {
        assert!(sampled.is_complete());
        assert_eq!(sampled.pile(), table.deck_remaining());
        let mut world = sampled.into_world();
        assert_eq!(world.deck_remaining(), table.deck_remaining());
        assert_ne!(world.draw_pile(), table.draw_pile());

        close_round(&mut world);
        if PlayerId::seats(2).all(|seat| world.hand(seat) == truth.hand(seat)) {
            leaked += 1;
        }
    }
    assert_eq!(leaked, 0, "next-round hands matched the real deal");
}

#[test]
fn hands_and_pile_together_hold_every_unseen_card() {
    let table = midgame_table();
    let dist = UnseenCardTracker::new().estimate(&table);
    let bias = BiasWeights::uniform().with(CardType::Pudding, 3.0);
    let mut sampler = Determinizer::with_seed(12);
    for _ in 0..20 {
        let sampled = sampler.sample_biased(&table, &dist, &bias);
        assert_eq!(sampled.pile(), table.deck_remaining());
        let mut placed = assigned_counts(sampled.world());
        placed.merge(&CardCounts::from_cards(sampled.world().draw_pile()));
        assert_eq!(&placed, dist.unseen());
    }
}

/// A state that can refuse to report or rewrite a single opponent's hand.
#[derive(Debug, Clone)]
struct GuardedTable {
    hands: Vec<Hand>,
    boards: Vec<Tableau>,
    pile: Vec<CardType>,
    blind_seat: Option<PlayerId>,
    locked_seat: Option<PlayerId>,
}

impl GuardedTable {
    fn new() -> Self {
        let hands = vec![
            Hand::with_cards(vec![CardType::Tempura, CardType::Sashimi, CardType::Dumpling]),
            Hand::with_cards(vec![CardType::Wasabi; 3]),
            Hand::with_cards(vec![CardType::Pudding; 3]),
        ];
        Self {
            hands,
            boards: vec![Tableau::new(); 3],
            pile: vec![CardType::SquidNigiri; 4],
            blind_seat: None,
            locked_seat: None,
        }
    }

    fn seat(&self, player: PlayerId) -> Result<usize, ViewError> {
        let index = player.index();
        if index < self.hands.len() {
            Ok(index)
        } else {
            Err(ViewError::UnknownPlayer { player })
        }
    }
}

impl GameView for GuardedTable {
    fn player_count(&self) -> usize {
        self.hands.len()
    }

    fn round(&self) -> u8 {
        0
    }

    fn realized_score(&self, player: PlayerId) -> Result<i32, ViewError> {
        self.seat(player).map(|_| 0)
    }

    fn played(&self, player: PlayerId, card: CardType) -> Result<u32, ViewError> {
        Ok(self.boards[self.seat(player)?].count(card))
    }

    fn hand_size(&self, player: PlayerId) -> Result<usize, ViewError> {
        if self.blind_seat == Some(player) {
            return Err(ViewError::Unsupported { capability: "hand size" });
        }
        Ok(self.hands[self.seat(player)?].len())
    }
}

impl ObservedView for GuardedTable {
    fn perspective(&self) -> PlayerId {
        PlayerId::new(0)
    }

    fn own_hand(&self) -> &Hand {
        &self.hands[0]
    }

    fn board(&self, player: PlayerId) -> Result<&Tableau, ViewError> {
        Ok(&self.boards[self.seat(player)?])
    }
}

impl Determinize for GuardedTable {
    fn replace_hand(&mut self, player: PlayerId, hand: Hand) -> Result<(), ViewError> {
        if self.locked_seat == Some(player) {
            return Err(ViewError::Unsupported { capability: "hand replacement" });
        }
        let index = self.seat(player)?;
        self.hands[index] = hand;
        Ok(())
    }

    fn replace_draw_pile(&mut self, cards: Vec<CardType>) -> Result<(), ViewError> {
        self.pile = cards;
        Ok(())
    }
}

#[test]
fn unreadable_hand_size_clears_that_hand() {
    let mut table = GuardedTable::new();
    table.blind_seat = Some(PlayerId::new(1));
    let dist = UnseenCardTracker::new().estimate(&table);

    let mut sampler = Determinizer::with_seed(4);
    for sampled in sampler.sample_many(&table, &dist, 10) {
        assert!(sampled.is_complete());
        let world = sampled.world();
        assert!(world.hands[1].is_empty());
        assert_eq!(world.hands[2].len(), 3);
        assert_ne!(world.hands[2], table.hands[2]);
        assert_eq!(sampled.assigned(), 3);
        assert_eq!(world.pile.len(), sampled.pile());
        assert_eq!(sampled.pile(), dist.total_unseen() as usize - 3);
    }
}

#[derive(Debug, Clone, Default)]
struct TallyOracle {
    calls: usize,
}

impl SearchOracle<GuardedTable, Action> for TallyOracle {
    fn search(&mut self, _world: &GuardedTable, legal: &[Action]) -> Action {
        self.calls += 1;
        legal[legal.len() - 1]
    }
}

#[test]
fn locked_hand_withholds_the_world_from_the_oracle() {
    let mut table = GuardedTable::new();
    table.locked_seat = Some(PlayerId::new(2));
    let dist = UnseenCardTracker::new().estimate(&table);

    let sampled = Determinizer::with_seed(9).sample(&table, &dist);
    assert!(!sampled.is_complete());
    assert_eq!(sampled.shortfall(), 3);
    assert_eq!(sampled.assigned(), 3);

    let legal = [
        Action::Pick(CardType::Tempura),
        Action::Pick(CardType::Sashimi),
    ];
    let mut agent = DecisionEnsemble::with_seed(TallyOracle::default(), 9);
    assert_eq!(agent.decide(&table, &legal), Ok(legal[0]));
    assert_eq!(agent.oracle().calls, 0);
    let stats = agent.last_stats().unwrap();
    assert_eq!(stats.withheld_worlds, 5);
    assert_eq!(stats.samples, 5);
    assert_eq!(stats.votes_cast, 0);
    assert_eq!(stats.shortfall, 5 * 3);

    agent.set_parallel(true);
    assert_eq!(agent.decide_parallel(&table, &legal), Ok(legal[0]));
    assert_eq!(agent.oracle().calls, 0);
    assert_eq!(agent.last_stats().unwrap().withheld_worlds, 5);
}
