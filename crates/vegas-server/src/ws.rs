//! WebSocket transport: one connection, one participant.

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::State,
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use vegas_core::{Command, PlayerId};

use crate::state::{AppState, SessionMessage};

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    // The connection's identity token; the core treats it as opaque.
    let id = PlayerId::new();
    let mut events = state.events.subscribe();

    if state
        .commands
        .send(SessionMessage::Connect { id })
        .await
        .is_err()
    {
        return;
    }
    info!(player = %id, "connection opened");

    let (mut sink, mut stream) = socket.split();

    // Forward broadcasts and frames addressed to this connection.
    let mut send_task = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(env) if env.to.is_none() || env.to == Some(id) => {
                    let text = match serde_json::to_string(&env.notification) {
                        Ok(text) => text,
                        Err(err) => {
                            warn!(player = %id, %err, "failed to encode frame");
                            continue;
                        }
                    };
                    if sink.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(player = %id, skipped, "event stream lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    // Parse inbound frames into commands for the session actor.
    let commands = state.commands.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = stream.next().await {
            let Message::Text(text) = message else {
                continue;
            };
            match serde_json::from_str::<Command>(&text) {
                Ok(command) => {
                    if commands
                        .send(SessionMessage::Command { id, command })
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
                Err(err) => debug!(player = %id, %err, "ignoring malformed frame"),
            }
        }
    });

    // Either side finishing tears the connection down.
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    let _ = state.commands.send(SessionMessage::Disconnect { id }).await;
    info!(player = %id, "connection closed");
}
