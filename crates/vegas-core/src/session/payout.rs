//! Round settlement: tie elimination, payout ranking, game end.

use std::collections::HashMap;

use tracing::info;

use super::{Phase, Session, SETTLEMENT_DELAY};
use crate::protocol::{Notification, Outbound, PayoutView, PlayerId};

/// Settle all six casinos, then either finish the game or schedule the next
/// round behind the settlement delay.
pub(crate) fn settle_round(session: &mut Session) -> Vec<Outbound> {
    session.phase = Phase::RoundSettling;
    session.current_turn = None;
    info!(round = session.round, "round over, settling casinos");

    let mut out = Vec::new();
    for index in 0..session.casinos.len() {
        let payouts = settle_casino(session, index);
        if !payouts.is_empty() {
            out.push(Outbound::Broadcast(Notification::Payouts { payouts }));
        }
    }

    if session.round >= session.max_rounds || session.deck.is_empty() {
        out.extend(finish_game(session));
    } else {
        out.push(Outbound::ScheduleNextRound(SETTLEMENT_DELAY));
    }
    out
}

/// Rank one casino's contributors and hand out its banknotes.
///
/// Any committed-dice count shared by two or more contributors is a tie and
/// disqualifies all of them. Survivors rank by count descending and take the
/// notes in value order; a neutral survivor consumes its note but the money
/// goes to nobody.
fn settle_casino(session: &mut Session, index: usize) -> Vec<PayoutView> {
    // One entry per contributor: seated players in seat order, then neutral.
    let mut entries: Vec<(Option<PlayerId>, u32)> = {
        let casino = &session.casinos[index];
        let mut entries: Vec<(Option<PlayerId>, u32)> = session
            .players
            .iter()
            .filter_map(|p| {
                casino
                    .dice_by_player
                    .get(&p.id)
                    .copied()
                    .filter(|&count| count > 0)
                    .map(|count| (Some(p.id), count))
            })
            .collect();
        if casino.neutral_count > 0 {
            entries.push((None, casino.neutral_count));
        }
        entries
    };
    if entries.is_empty() {
        return Vec::new();
    }

    let mut multiplicity: HashMap<u32, u32> = HashMap::new();
    for &(_, count) in &entries {
        *multiplicity.entry(count).or_insert(0) += 1;
    }
    entries.retain(|&(_, count)| multiplicity[&count] == 1);
    if entries.is_empty() {
        return Vec::new();
    }
    // Counts are now unique, so this ordering is total.
    entries.sort_by(|a, b| b.1.cmp(&a.1));

    // Highest remaining note to the highest surviving count. Awarded notes
    // leave the slot; unmatched ones stay behind.
    let mut pool = std::mem::take(&mut session.casinos[index].banknotes);
    pool.sort_unstable();

    let mut payouts = Vec::new();
    for (recipient, _) in entries {
        let Some(amount) = pool.pop() else {
            break;
        };
        let player_name = match recipient {
            Some(id) => match session.player_mut(id) {
                Some(p) => {
                    p.balance += amount;
                    p.display_name()
                }
                None => continue,
            },
            None => "neutral".to_string(),
        };
        payouts.push(PayoutView {
            casino_index: (index + 1) as u8,
            player_name,
            amount,
        });
    }

    session.casinos[index].banknotes = pool;
    payouts
}

/// Declare the winner, broadcast the final standings, and clear back to the
/// lobby. Balances stick around until the next game start zeroes them.
fn finish_game(session: &mut Session) -> Vec<Outbound> {
    // Highest balance wins; an exact tie goes to the lower seat.
    let winner = session
        .players
        .iter()
        .max_by(|a, b| a.balance.cmp(&b.balance).then_with(|| b.seat.cmp(&a.seat)));
    let winner_id = winner.map(|p| p.id);
    let winner_name = winner.map(|p| p.display_name());

    info!(winner = ?winner_name, rounds = session.round, "game over");

    let game_over = Notification::GameOver {
        players: session.player_views(),
        winner_id,
        winner_name,
        max_rounds: session.max_rounds,
    };

    session.reset_to_lobby();

    vec![
        Outbound::Broadcast(game_over),
        Outbound::Broadcast(session.game_state()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::PlayerId;
    use crate::session::bank::Casino;
    use crate::session::player::Player;
    use crate::session::SessionConfig;

    /// A mid-round session with the given players and six empty casinos.
    fn round_in_progress(seats: u8, count: usize) -> (Session, Vec<PlayerId>) {
        let mut session = Session::new(SessionConfig { max_seats: seats });
        let ids: Vec<PlayerId> = (0..count).map(|_| PlayerId::new()).collect();
        for (i, &id) in ids.iter().enumerate() {
            let mut player = Player::new(id, (i + 1) as u8);
            player.name = Some(format!("P{i}"));
            session.players.push(player);
        }
        session.phase = Phase::InProgress;
        session.round = 1;
        session.max_rounds = 4;
        session.casinos = (0..6).map(|_| Casino::default()).collect();
        session.deck = vec![10_000; 8];
        (session, ids)
    }

    #[test]
    fn test_unique_counts_rank_by_count_descending() {
        let (mut session, ids) = round_in_progress(2, 2);
        session.casinos[0].banknotes = vec![30_000, 90_000, 50_000];
        session.casinos[0].dice_by_player.insert(ids[0], 2);
        session.casinos[0].dice_by_player.insert(ids[1], 5);

        let payouts = settle_casino(&mut session, 0);

        // Five dice beat two: P1 takes 90k, P0 takes 50k, 30k stays unpaid.
        assert_eq!(payouts.len(), 2);
        assert_eq!(payouts[0].player_name, "P1");
        assert_eq!(payouts[0].amount, 90_000);
        assert_eq!(payouts[1].player_name, "P0");
        assert_eq!(payouts[1].amount, 50_000);
        assert_eq!(session.player(ids[1]).unwrap().balance, 90_000);
        assert_eq!(session.player(ids[0]).unwrap().balance, 50_000);
        assert_eq!(session.casinos[0].banknotes, vec![30_000]);
    }

    #[test]
    fn test_tied_counts_eliminate_each_other() {
        // {A:3, B:3, C:1} - A and B cancel out, C alone ranks and takes
        // the highest note.
        let (mut session, ids) = round_in_progress(3, 3);
        session.casinos[2].banknotes = vec![20_000, 80_000];
        session.casinos[2].dice_by_player.insert(ids[0], 3);
        session.casinos[2].dice_by_player.insert(ids[1], 3);
        session.casinos[2].dice_by_player.insert(ids[2], 1);

        let payouts = settle_casino(&mut session, 2);

        assert_eq!(payouts.len(), 1);
        assert_eq!(payouts[0].casino_index, 3);
        assert_eq!(payouts[0].player_name, "P2");
        assert_eq!(payouts[0].amount, 80_000);
        assert_eq!(session.player(ids[0]).unwrap().balance, 0);
        assert_eq!(session.player(ids[1]).unwrap().balance, 0);
        assert_eq!(session.player(ids[2]).unwrap().balance, 80_000);
    }

    #[test]
    fn test_neutral_ties_with_player_eliminate_both() {
        let (mut session, ids) = round_in_progress(2, 2);
        session.casinos[0].banknotes = vec![60_000];
        session.casinos[0].dice_by_player.insert(ids[0], 2);
        session.casinos[0].neutral_count = 2;

        let payouts = settle_casino(&mut session, 0);
        assert!(payouts.is_empty());
        assert_eq!(session.player(ids[0]).unwrap().balance, 0);
        // The unpaid note stays in the slot.
        assert_eq!(session.casinos[0].banknotes, vec![60_000]);
    }

    #[test]
    fn test_neutral_survivor_consumes_note_without_credit() {
        let (mut session, ids) = round_in_progress(2, 2);
        session.casinos[5].banknotes = vec![40_000, 70_000];
        session.casinos[5].dice_by_player.insert(ids[0], 1);
        session.casinos[5].neutral_count = 3;

        let payouts = settle_casino(&mut session, 5);

        // Neutral outranks the player and swallows the 70k note.
        assert_eq!(payouts.len(), 2);
        assert_eq!(payouts[0].player_name, "neutral");
        assert_eq!(payouts[0].amount, 70_000);
        assert_eq!(payouts[1].player_name, "P0");
        assert_eq!(payouts[1].amount, 40_000);
        assert_eq!(session.player(ids[0]).unwrap().balance, 40_000);
        assert_eq!(session.player(ids[1]).unwrap().balance, 0);
    }

    #[test]
    fn test_empty_casino_is_skipped() {
        let (mut session, _) = round_in_progress(2, 2);
        session.casinos[1].banknotes = vec![90_000];
        assert!(settle_casino(&mut session, 1).is_empty());
        assert_eq!(session.casinos[1].banknotes, vec![90_000]);
    }

    #[test]
    fn test_more_survivors_than_notes() {
        let (mut session, ids) = round_in_progress(3, 3);
        session.casinos[0].banknotes = vec![50_000];
        session.casinos[0].dice_by_player.insert(ids[0], 3);
        session.casinos[0].dice_by_player.insert(ids[1], 2);
        session.casinos[0].dice_by_player.insert(ids[2], 1);

        let payouts = settle_casino(&mut session, 0);
        assert_eq!(payouts.len(), 1);
        assert_eq!(payouts[0].player_name, "P0");
        assert_eq!(session.player(ids[1]).unwrap().balance, 0);
        assert_eq!(session.player(ids[2]).unwrap().balance, 0);
    }

    #[test]
    fn test_settle_round_schedules_next_round() {
        let (mut session, _) = round_in_progress(2, 2);
        let out = settle_round(&mut session);

        assert_eq!(session.phase, Phase::RoundSettling);
        assert!(session.current_turn.is_none());
        assert!(out
            .iter()
            .any(|o| matches!(o, Outbound::ScheduleNextRound(d) if *d == SETTLEMENT_DELAY)));
    }

    #[test]
    fn test_final_round_ends_game_instead_of_scheduling() {
        let (mut session, _) = round_in_progress(2, 2);
        session.max_rounds = 1;

        let out = settle_round(&mut session);

        assert_eq!(session.phase, Phase::WaitingForPlayers);
        assert!(!out
            .iter()
            .any(|o| matches!(o, Outbound::ScheduleNextRound(_))));
        assert!(out
            .iter()
            .any(|o| matches!(o, Outbound::Broadcast(Notification::GameOver { .. }))));
    }

    #[test]
    fn test_exhausted_deck_ends_game_early() {
        let (mut session, _) = round_in_progress(2, 2);
        session.deck.clear();

        let out = settle_round(&mut session);
        assert!(out
            .iter()
            .any(|o| matches!(o, Outbound::Broadcast(Notification::GameOver { .. }))));
    }

    #[test]
    fn test_winner_is_highest_balance() {
        let (mut session, ids) = round_in_progress(2, 2);
        session.max_rounds = 1;
        session.player_mut(ids[1]).unwrap().balance = 120_000;
        session.player_mut(ids[0]).unwrap().balance = 30_000;

        let out = settle_round(&mut session);
        let winner = out.iter().find_map(|o| match o {
            Outbound::Broadcast(Notification::GameOver { winner_id, .. }) => *winner_id,
            _ => None,
        });
        assert_eq!(winner, Some(ids[1]));
    }

    #[test]
    fn test_winner_tie_goes_to_lower_seat() {
        let (mut session, ids) = round_in_progress(3, 3);
        session.max_rounds = 1;
        session.player_mut(ids[0]).unwrap().balance = 50_000;
        session.player_mut(ids[1]).unwrap().balance = 80_000;
        session.player_mut(ids[2]).unwrap().balance = 80_000;

        let out = settle_round(&mut session);
        let winner = out.iter().find_map(|o| match o {
            Outbound::Broadcast(Notification::GameOver { winner_id, .. }) => *winner_id,
            _ => None,
        });
        // Seats 2 and 3 tie on balance; the lower seat wins.
        assert_eq!(winner, Some(ids[1]));
    }

    #[test]
    fn test_game_over_clears_round_state_but_keeps_balances() {
        let (mut session, ids) = round_in_progress(2, 2);
        session.max_rounds = 1;
        session.player_mut(ids[0]).unwrap().balance = 70_000;

        settle_round(&mut session);

        assert_eq!(session.phase, Phase::WaitingForPlayers);
        assert_eq!(session.round, 0);
        assert!(session.deck.is_empty());
        assert!(session.casinos.is_empty());
        assert_eq!(session.player(ids[0]).unwrap().balance, 70_000);
    }

    #[test]
    fn test_dice_counts_only_grow_within_round() {
        // Committed counts are additive; settling does not touch them until
        // the next deal replaces the casinos wholesale.
        let (mut session, ids) = round_in_progress(2, 2);
        session.casinos[3].dice_by_player.insert(ids[0], 4);
        session.casinos[3].banknotes = vec![10_000];

        settle_casino(&mut session, 3);
        assert_eq!(session.casinos[3].dice_by_player[&ids[0]], 4);
    }
}
