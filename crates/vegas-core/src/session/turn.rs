//! Turn sequencing and round lifecycle.

use tracing::info;

use super::{bank, payout, registry, Phase, Session, SessionError, MIN_PLAYERS};
use crate::protocol::{Notification, Outbound, PlayerId};
use crate::rng::GameRng;

fn turn_changed(session: &Session, id: PlayerId) -> Notification {
    let name = session
        .player(id)
        .map(|p| p.display_name())
        .unwrap_or_default();
    Notification::TurnChanged {
        current_player_id: id,
        current_player_name: name,
    }
}

/// Host starts the game: balances zeroed, fresh shuffled deck, round 1
/// dealt, turn to the lowest seat.
pub(crate) fn start_game<R: GameRng>(
    session: &mut Session,
    caller: PlayerId,
    rng: &mut R,
) -> Result<Vec<Outbound>, SessionError> {
    if session.started() {
        return Err(SessionError::GameAlreadyStarted);
    }
    if session.players.len() < MIN_PLAYERS {
        return Err(SessionError::NotEnoughPlayers);
    }
    if !registry::is_host(session, caller) {
        return Err(SessionError::NotHost);
    }

    for p in &mut session.players {
        p.balance = 0;
    }
    session.deck = bank::build_deck(rng);
    session.round = 1;
    session.phase = Phase::InProgress;
    let setup = bank::setup_round(session);

    let first = session.players[0].id;
    session.current_turn = Some(first);

    info!(
        players = session.players.len(),
        max_rounds = session.max_rounds,
        "game started"
    );

    Ok(vec![
        Outbound::Broadcast(setup),
        Outbound::Broadcast(Notification::GameStarted {
            round: session.round,
            max_rounds: session.max_rounds,
        }),
        Outbound::Broadcast(turn_changed(session, first)),
        Outbound::Broadcast(session.game_state()),
    ])
}

/// Pass the turn to the next seat still holding dice, wrapping once around
/// the table; when nobody has dice left the round settles.
///
/// The scan visits each seat at most once and never lands on a player with
/// an empty pool, even transiently.
pub(crate) fn advance_or_end_round(session: &mut Session) -> Vec<Outbound> {
    let count = session.players.len();
    if count == 0 {
        return Vec::new();
    }

    let current = session
        .current_turn
        .and_then(|id| session.players.iter().position(|p| p.id == id))
        .unwrap_or(0);

    for offset in 1..=count {
        let candidate = &session.players[(current + offset) % count];
        if candidate.has_dice() {
            let id = candidate.id;
            session.current_turn = Some(id);
            return vec![Outbound::Broadcast(turn_changed(session, id))];
        }
    }

    payout::settle_round(session)
}

/// The settlement delay elapsed: deal the next round.
///
/// Stale timers (the session was reset while the delay ran) are ignored.
pub(crate) fn finish_settlement(session: &mut Session) -> Vec<Outbound> {
    if session.phase != Phase::RoundSettling || session.players.is_empty() {
        return Vec::new();
    }

    session.round += 1;
    session.phase = Phase::InProgress;
    let setup = bank::setup_round(session);

    let first = session.players[0].id;
    session.current_turn = Some(first);

    info!(round = session.round, "next round dealt");

    vec![
        Outbound::Broadcast(setup),
        Outbound::Broadcast(turn_changed(session, first)),
        Outbound::Broadcast(session.game_state()),
    ]
}
