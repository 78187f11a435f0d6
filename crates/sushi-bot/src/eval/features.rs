//! Individual heuristic terms. Each reads the state through [`GameView`] and
//! reports read failures instead of guessing.

use super::weights::Feature;
use sushi_core::game::view::{GameView, ViewError};
use sushi_core::model::card::CardType;
use sushi_core::model::player::PlayerId;
use sushi_core::model::score::DUMPLING_LADDER;

const ODD_TEMPURA: f64 = 2.5;
const SASHIMI_ONE: f64 = 3.0;
const SASHIMI_TWO: f64 = 7.0;

const OPEN_WASABI: f64 = 4.0;
const BARE_NIGIRI: f64 = 0.5;
const CHOPSTICKS: f64 = 2.0;

const PER_CARD_IN_HAND: f64 = 0.5;
const FIRST_ROUND_BONUS: f64 = 3.0;
const SECOND_ROUND_BONUS: f64 = 1.5;

/// Value of `feature` for `player`. Risk comes back negative so every term
/// can be summed with its weight.
pub fn evaluate<S: GameView + ?Sized>(
    feature: Feature,
    state: &S,
    player: PlayerId,
) -> Result<f64, ViewError> {
    match feature {
        Feature::Immediate => state.realized_score(player).map(f64::from),
        Feature::SetProgress => set_progress(state, player),
        Feature::Synergy => synergy(state, player),
        Feature::Competitive => Ok(maki_position(state, player)? + pudding_position(state, player)?),
        Feature::FuturePotential => future_potential(state, player),
        Feature::Blocking => blocking(state, player),
        Feature::Risk => risk(state, player).map(|penalty| -penalty),
    }
}

pub fn set_progress<S: GameView + ?Sized>(state: &S, player: PlayerId) -> Result<f64, ViewError> {
    let mut progress = 0.0;

    if state.played(player, CardType::Tempura)? % 2 == 1 {
        progress += ODD_TEMPURA;
    }

    match state.played(player, CardType::Sashimi)? % 3 {
        1 => progress += SASHIMI_ONE,
        2 => progress += SASHIMI_TWO,
        _ => {}
    }

    let dumplings = state.played(player, CardType::Dumpling)? as usize;
    if (1..DUMPLING_LADDER.len() - 1).contains(&dumplings) {
        let marginal = DUMPLING_LADDER[dumplings + 1] - DUMPLING_LADDER[dumplings];
        progress += f64::from(marginal) * 0.5;
    }

    Ok(progress)
}

pub fn synergy<S: GameView + ?Sized>(state: &S, player: PlayerId) -> Result<f64, ViewError> {
    let wasabi = i64::from(state.played(player, CardType::Wasabi)?);
    let mut nigiri = 0i64;
    for card in [CardType::SquidNigiri, CardType::SalmonNigiri, CardType::EggNigiri] {
        nigiri += i64::from(state.played(player, card)?);
    }

    let mut value = 0.0;
    if wasabi > nigiri {
        value += (wasabi - nigiri) as f64 * OPEN_WASABI;
    } else if nigiri > wasabi {
        value -= (nigiri - wasabi) as f64 * BARE_NIGIRI;
    }
    value += f64::from(state.played(player, CardType::Chopsticks)?) * CHOPSTICKS;
    Ok(value)
}

/// Standing in the maki race against the best two opponents.
pub fn maki_position<S: GameView + ?Sized>(state: &S, player: PlayerId) -> Result<f64, ViewError> {
    let ours = state.maki_icons(player)?;
    let (mut best, mut second) = (0, 0);
    for opponent in opponents(state, player) {
        let icons = state.maki_icons(opponent)?;
        if icons > best {
            second = best;
            best = icons;
        } else if icons > second {
            second = icons;
        }
    }

    let value = if ours > best {
        6.0
    } else if ours == best && best > 0 {
        4.0
    } else if ours > second {
        2.0
    } else if ours == second && second > 0 {
        1.5
    } else {
        0.0
    };
    Ok(value)
}

/// Pudding standing, scaled up as the game nears its end-of-game award.
pub fn pudding_position<S: GameView + ?Sized>(
    state: &S,
    player: PlayerId,
) -> Result<f64, ViewError> {
    let ours = state.played(player, CardType::Pudding)?;
    let mut range: Option<(u32, u32)> = None;
    for opponent in opponents(state, player) {
        let count = state.played(opponent, CardType::Pudding)?;
        range = Some(match range {
            Some((low, high)) => (low.min(count), high.max(count)),
            None => (count, count),
        });
    }
    let Some((fewest, most)) = range else {
        return Ok(0.0);
    };

    let rounds_total = f64::from(state.rounds_total().max(1));
    let weight = f64::from(state.round()) / rounds_total;
    let mut value = 0.0;
    if ours > most {
        value += 6.0 * weight;
    } else if ours == most && most > 0 {
        value += 3.0 * weight;
    }
    if ours < fewest {
        value -= 6.0 * weight;
    }
    Ok(value)
}

pub fn future_potential<S: GameView + ?Sized>(
    state: &S,
    player: PlayerId,
) -> Result<f64, ViewError> {
    let mut potential = state.hand_size(player)? as f64 * PER_CARD_IN_HAND;
    match state.round() {
        0 => potential += FIRST_ROUND_BONUS,
        1 => potential += SECOND_ROUND_BONUS,
        _ => {}
    }
    Ok(potential)
}

/// Set progress on opponents' boards that this player could deny.
pub fn blocking<S: GameView + ?Sized>(state: &S, player: PlayerId) -> Result<f64, ViewError> {
    let mut value = 0.0;
    for opponent in opponents(state, player) {
        if state.played(opponent, CardType::Tempura)? % 2 == 1 {
            value += 1.0;
        }
        if state.played(opponent, CardType::Sashimi)? % 3 != 0 {
            value += 1.5;
        }
        if state.played(opponent, CardType::Wasabi)? > 0 {
            value += 1.0;
        }
    }
    Ok(value)
}

/// Penalty for partial sets the remaining hand can no longer complete.
pub fn risk<S: GameView + ?Sized>(state: &S, player: PlayerId) -> Result<f64, ViewError> {
    let hand = state.hand_size(player)?;
    let mut penalty = 0.0;
    if state.played(player, CardType::Tempura)? % 2 == 1 && hand < 2 {
        penalty += 2.0;
    }
    let missing = 3 - (state.played(player, CardType::Sashimi)? % 3) as usize;
    if missing != 3 && hand < missing {
        penalty += 3.0;
    }
    if state.played(player, CardType::Wasabi)? > 0 && hand < 2 {
        penalty += 1.5;
    }
    Ok(penalty)
}

fn opponents<S: GameView + ?Sized>(state: &S, player: PlayerId) -> impl Iterator<Item = PlayerId> {
    PlayerId::seats(state.player_count()).filter(move |&seat| seat != player)
}
