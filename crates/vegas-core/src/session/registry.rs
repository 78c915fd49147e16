//! Seats, colors and profiles.

use tracing::{debug, info};

use super::{payout, Phase, Session, SessionError, MIN_PLAYERS};
use crate::protocol::{Notification, Outbound, PlayerColor, PlayerId};
use crate::session::player::Player;

pub(crate) fn is_host(session: &Session, id: PlayerId) -> bool {
    session.host().map(|h| h.id) == Some(id)
}

fn next_free_seat(session: &Session) -> u8 {
    let mut seat = 1u8;
    while session.players.iter().any(|p| p.seat == seat) {
        seat += 1;
    }
    seat
}

pub(crate) fn join(session: &mut Session, id: PlayerId) -> Result<Vec<Outbound>, SessionError> {
    if session.players.len() >= session.config.max_seats as usize {
        return Err(SessionError::RoomFull);
    }

    let seat = next_free_seat(session);
    let insert_at = session
        .players
        .iter()
        .position(|p| p.seat > seat)
        .unwrap_or(session.players.len());
    session.players.insert(insert_at, Player::new(id, seat));

    info!(player = %id, seat, "player joined");

    Ok(vec![
        Outbound::ToCaller(Notification::AwaitProfile {
            suggested_name: format!("Player {seat}"),
        }),
        Outbound::Broadcast(session.player_list()),
    ])
}

pub(crate) fn register_profile(
    session: &mut Session,
    caller: PlayerId,
    name: String,
    color: Option<PlayerColor>,
    avatar: Option<String>,
) -> Result<Vec<Outbound>, SessionError> {
    let used: Vec<PlayerColor> = session
        .players
        .iter()
        .filter(|p| p.id != caller)
        .filter_map(|p| p.color)
        .collect();

    // Requested color wins unless somebody already wears it; otherwise the
    // first free palette entry.
    let assigned = color
        .filter(|c| !used.contains(c))
        .or_else(|| {
            PlayerColor::PALETTE
                .iter()
                .copied()
                .find(|c| !used.contains(c))
        })
        .unwrap_or(PlayerColor::Red);

    let player = session
        .player_mut(caller)
        .ok_or(SessionError::UnknownPlayer)?;
    let trimmed = name.trim();
    player.name = Some(if trimmed.is_empty() {
        format!("Player {}", player.seat)
    } else {
        trimmed.to_string()
    });
    player.avatar = avatar;
    player.color = Some(assigned);

    let info_frame = Notification::PlayerInfo {
        id: player.id,
        name: player.display_name(),
        avatar: player.avatar.clone(),
        index: player.seat,
        money: player.balance,
    };
    info!(player = %caller, name = %player.display_name(), color = ?assigned, "profile registered");

    let mut out = vec![
        Outbound::ToCaller(info_frame),
        Outbound::Broadcast(session.player_list()),
    ];

    if session.players.len() >= MIN_PLAYERS && session.phase == Phase::WaitingForPlayers {
        if let Some(host) = session.host() {
            out.push(Outbound::Broadcast(Notification::ReadyToStart {
                host_id: host.id,
                max_rounds: session.max_rounds,
            }));
        }
    }

    Ok(out)
}

pub(crate) fn set_max_rounds(
    session: &mut Session,
    caller: PlayerId,
    value: u8,
) -> Result<Vec<Outbound>, SessionError> {
    if session.started() {
        return Err(SessionError::GameAlreadyStarted);
    }
    if !is_host(session, caller) {
        return Err(SessionError::NotHost);
    }
    if !(1..=4).contains(&value) {
        return Err(SessionError::InvalidMaxRounds(value));
    }

    session.max_rounds = value;
    info!(max_rounds = value, "session config updated");

    Ok(vec![Outbound::Broadcast(Notification::ConfigUpdated {
        max_rounds: value,
    })])
}

/// Remove a participant. Mid-game this may force the session back to the
/// lobby (too few players) or re-route the turn (the departing player held
/// it); either way the sequence never deadlocks.
pub(crate) fn leave(session: &mut Session, id: PlayerId) -> Vec<Outbound> {
    let Some(pos) = session.players.iter().position(|p| p.id == id) else {
        debug!(player = %id, "leave from unseated connection ignored");
        return Vec::new();
    };

    let departed = session.players.remove(pos);
    let held_turn = session.current_turn == Some(id);
    info!(player = %id, seat = departed.seat, "player left");

    let mut out = Vec::new();

    if session.started() && session.players.len() < MIN_PLAYERS {
        info!("too few players remain, resetting session");
        session.reset_to_lobby();
    } else if session.phase == Phase::InProgress && held_turn {
        // Hand the turn to the lowest eligible seat; if nobody can act the
        // round settles immediately.
        let next = session.players.iter().find(|p| p.has_dice());
        if let Some(p) = next {
            let (next_id, next_name) = (p.id, p.display_name());
            session.current_turn = Some(next_id);
            out.push(Outbound::Broadcast(Notification::TurnChanged {
                current_player_id: next_id,
                current_player_name: next_name,
            }));
        } else {
            out.extend(payout::settle_round(session));
        }
    }

    out.push(Outbound::Broadcast(session.player_list()));
    out.push(Outbound::Broadcast(session.game_state()));
    out
}
