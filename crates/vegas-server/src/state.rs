//! Session actor and shared state.
//!
//! The session is a single serialized actor: every connection funnels its
//! messages into one mpsc channel, and one task owns the `Session` and
//! applies them in arrival order. Notifications fan back out over a
//! broadcast channel of addressed envelopes.

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};

use vegas_core::{Command, Notification, Outbound, PlayerId, Session, SessionConfig, SystemRng};

/// A notification addressed to one connection, or to everyone when `to` is
/// `None`.
#[derive(Clone, Debug)]
pub struct Envelope {
    pub to: Option<PlayerId>,
    pub notification: Notification,
}

/// Messages into the session actor
#[derive(Debug)]
pub enum SessionMessage {
    /// A new WebSocket connection wants a seat
    Connect { id: PlayerId },
    /// A seated connection submitted a command
    Command { id: PlayerId, command: Command },
    /// The connection closed
    Disconnect { id: PlayerId },
    /// The settlement delay elapsed; deal the next round
    FinishSettlement,
}

/// Shared handle every connection task clones
#[derive(Clone)]
pub struct AppState {
    pub commands: mpsc::Sender<SessionMessage>,
    pub events: broadcast::Sender<Envelope>,
}

impl AppState {
    /// Spawn the session actor and return the channel handles.
    pub fn spawn(config: SessionConfig) -> Self {
        let (commands, inbox) = mpsc::channel(64);
        let (events, _) = broadcast::channel(256);
        tokio::spawn(run_session(config, inbox, events.clone(), commands.clone()));
        Self { commands, events }
    }
}

async fn run_session(
    config: SessionConfig,
    mut inbox: mpsc::Receiver<SessionMessage>,
    events: broadcast::Sender<Envelope>,
    loopback: mpsc::Sender<SessionMessage>,
) {
    let mut session = Session::new(config);
    let mut rng = SystemRng;

    while let Some(message) = inbox.recv().await {
        let (caller, result) = match message {
            SessionMessage::Connect { id } => (Some(id), session.join(id)),
            SessionMessage::Command { id, command } => {
                (Some(id), session.apply(id, command, &mut rng))
            }
            SessionMessage::Disconnect { id } => (Some(id), Ok(session.leave(id))),
            SessionMessage::FinishSettlement => (None, Ok(session.finish_settlement())),
        };

        match result {
            Ok(outbounds) => dispatch(&events, &loopback, caller, outbounds),
            Err(err) => {
                warn!(player = ?caller, %err, "command rejected");
                if let (Some(id), Some(notification)) = (caller, err.rejection()) {
                    let _ = events.send(Envelope {
                        to: Some(id),
                        notification,
                    });
                }
            }
        }
    }
}

fn dispatch(
    events: &broadcast::Sender<Envelope>,
    loopback: &mpsc::Sender<SessionMessage>,
    caller: Option<PlayerId>,
    outbounds: Vec<Outbound>,
) {
    for outbound in outbounds {
        match outbound {
            Outbound::Broadcast(notification) => {
                // Send fails only when nobody is connected; nothing to do.
                let _ = events.send(Envelope {
                    to: None,
                    notification,
                });
            }
            Outbound::ToCaller(notification) => match caller {
                Some(id) => {
                    let _ = events.send(Envelope {
                        to: Some(id),
                        notification,
                    });
                }
                None => debug!("dropping caller-directed frame with no caller"),
            },
            Outbound::ScheduleNextRound(delay) => {
                let tx = loopback.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = tx.send(SessionMessage::FinishSettlement).await;
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn recv_for(
        rx: &mut broadcast::Receiver<Envelope>,
        id: PlayerId,
    ) -> Notification {
        loop {
            let env = rx.recv().await.expect("event stream open");
            if env.to.is_none() || env.to == Some(id) {
                return env.notification;
            }
        }
    }

    #[tokio::test]
    async fn test_connect_gets_await_profile() {
        let state = AppState::spawn(SessionConfig::default());
        let mut rx = state.events.subscribe();

        let id = PlayerId::new();
        state
            .commands
            .send(SessionMessage::Connect { id })
            .await
            .unwrap();

        let note = recv_for(&mut rx, id).await;
        assert!(matches!(note, Notification::AwaitProfile { .. }));
    }

    #[tokio::test]
    async fn test_third_connection_is_rejected() {
        let state = AppState::spawn(SessionConfig::default());
        let mut rx = state.events.subscribe();

        for _ in 0..2 {
            state
                .commands
                .send(SessionMessage::Connect { id: PlayerId::new() })
                .await
                .unwrap();
        }

        let late = PlayerId::new();
        state
            .commands
            .send(SessionMessage::Connect { id: late })
            .await
            .unwrap();

        // Drain frames until the rejection addressed to the latecomer.
        loop {
            let env = rx.recv().await.expect("event stream open");
            if env.to == Some(late) {
                assert!(matches!(env.notification, Notification::RoomFull));
                break;
            }
        }
    }

    #[tokio::test]
    async fn test_command_from_stranger_produces_no_frames() {
        let state = AppState::spawn(SessionConfig::default());
        let mut rx = state.events.subscribe();

        state
            .commands
            .send(SessionMessage::Command {
                id: PlayerId::new(),
                command: Command::RollDice,
            })
            .await
            .unwrap();

        // Seat someone afterwards; the first frame seen must be theirs,
        // proving the stranger's command emitted nothing.
        let id = PlayerId::new();
        state
            .commands
            .send(SessionMessage::Connect { id })
            .await
            .unwrap();

        let env = rx.recv().await.expect("event stream open");
        assert_eq!(env.to, Some(id));
        assert!(matches!(env.notification, Notification::AwaitProfile { .. }));
    }
}
