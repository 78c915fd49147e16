//! Roll and bet resolution.

use tracing::debug;

use super::{turn, Phase, Session, SessionError};
use crate::protocol::{DieKind, Notification, Outbound, PlayerId, RolledDie};
use crate::rng::GameRng;

fn ensure_in_progress(session: &Session) -> Result<(), SessionError> {
    match session.phase {
        Phase::WaitingForPlayers => Err(SessionError::GameNotStarted),
        Phase::RoundSettling => Err(SessionError::RoundSettling),
        Phase::InProgress => Ok(()),
    }
}

/// Roll every die the caller still holds. One roll per turn; the outcome
/// waits as the pending roll until a bet value is chosen.
pub(crate) fn roll_dice<R: GameRng>(
    session: &mut Session,
    caller: PlayerId,
    rng: &mut R,
) -> Result<Vec<Outbound>, SessionError> {
    ensure_in_progress(session)?;
    if session.current_turn != Some(caller) {
        return Err(SessionError::NotYourTurn);
    }

    let player = session
        .player_mut(caller)
        .ok_or(SessionError::UnknownPlayer)?;
    if player.pending_roll.is_some() {
        return Err(SessionError::AlreadyRolled);
    }
    if !player.has_dice() {
        return Err(SessionError::NoDiceLeft);
    }

    let total = usize::from(player.color_dice_left) + usize::from(player.neutral_dice_left);
    let mut dice = Vec::with_capacity(total);
    for _ in 0..player.color_dice_left {
        dice.push(RolledDie {
            value: rng.die_face(),
            kind: DieKind::Color,
        });
    }
    for _ in 0..player.neutral_dice_left {
        dice.push(RolledDie {
            value: rng.die_face(),
            kind: DieKind::Neutral,
        });
    }

    player.pending_roll = Some(dice.clone());
    let roller_name = player.display_name();

    Ok(vec![Outbound::Broadcast(Notification::DiceRolled {
        roller_id: caller,
        roller_name,
        dice,
    })])
}

/// Commit every pending die showing `value` to casino `value`.
///
/// A value outside 1..=6, or one no pending die shows, is deliberately a
/// silent no-op: the caller made a mistake only it needs to know about, and
/// the pending roll stays available for a valid pick.
pub(crate) fn choose_bet_value(
    session: &mut Session,
    caller: PlayerId,
    value: u8,
) -> Result<Vec<Outbound>, SessionError> {
    ensure_in_progress(session)?;
    if session.current_turn != Some(caller) {
        return Err(SessionError::NotYourTurn);
    }

    let player = session
        .player_mut(caller)
        .ok_or(SessionError::UnknownPlayer)?;
    let Some(roll) = player.pending_roll.as_ref() else {
        return Err(SessionError::NoPendingRoll);
    };

    if !(1..=6).contains(&value) {
        debug!(player = %caller, value, "bet value out of range, ignoring");
        return Ok(Vec::new());
    }

    let color_count = roll
        .iter()
        .filter(|d| d.value == value && d.kind == DieKind::Color)
        .count() as u32;
    let neutral_count = roll
        .iter()
        .filter(|d| d.value == value && d.kind == DieKind::Neutral)
        .count() as u32;

    if color_count + neutral_count == 0 {
        debug!(player = %caller, value, "no pending die shows that face, ignoring");
        return Ok(Vec::new());
    }

    // Floored at zero as a safety net; a correct caller can never underflow
    // because committed dice come out of the pending roll itself.
    player.color_dice_left = player.color_dice_left.saturating_sub(color_count as u8);
    player.neutral_dice_left = player.neutral_dice_left.saturating_sub(neutral_count as u8);
    player.pending_roll = None;
    let player_name = player.display_name();

    let casino = &mut session.casinos[usize::from(value) - 1];
    *casino.dice_by_player.entry(caller).or_insert(0) += color_count;
    casino.neutral_count += neutral_count;

    let mut out = vec![
        Outbound::Broadcast(Notification::BetPlaced {
            player_id: caller,
            player_name,
            casino_index: value,
            color_count,
            neutral_count,
        }),
        Outbound::Broadcast(session.game_state()),
    ];
    out.extend(turn::advance_or_end_round(session));
    Ok(out)
}
