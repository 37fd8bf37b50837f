//! WebSocket handler for live game connections.
//!
//! # Connection Flow
//!
//! 1. Client connects via `GET /games/{code}/ws`
//! 2. The first text frame must be `{"id": "<user uuid>"}`; a
//!    malformed or unknown id closes the connection with a protocol
//!    error and reason
//! 3. The connection registers with the game actor and then exchanges
//!    tagged events, one JSON object per text frame
//! 4. On disconnect the actor applies the phase's disconnect policy
//!
//! Malformed frames and unknown event tags cost the sender its
//! connection; valid-but-rejected actions come back as a normal
//! `ready_confirm` frame with `success: false`.

use axum::{
    extract::{
        Path, State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code},
    },
    response::Response,
};
use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use serde::Deserialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::AppState;
use crate::users::UserDirectory;
use dudo::{ProtocolError, ServerEvent, net::messages};

/// Frames a slow client may queue before the session starts dropping
/// them.
const OUTBOUND_QUEUE_DEPTH: usize = 32;

/// First frame on a fresh connection, naming the joining user.
#[derive(Debug, Deserialize)]
struct JoinFrame {
    id: String,
}

/// Upgrade to a WebSocket connection for the given room.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, code, state))
}

async fn handle_socket(socket: WebSocket, code: String, state: AppState) {
    let (mut sink, mut stream) = socket.split();

    let user = match read_join_frame(&mut stream).await {
        Ok(user_id) => match state.users.get(user_id).await {
            Some(user) => user,
            None => {
                return close_with(&mut sink, close_code::PROTOCOL, &ProtocolError::UnknownUser)
                    .await;
            }
        },
        Err(error) => return close_with(&mut sink, close_code::PROTOCOL, &error).await,
    };

    let game = match state.playground.get_game(&code) {
        Ok(game) => game,
        Err(error) => return close_with(&mut sink, close_code::POLICY, &error).await,
    };

    let (event_tx, event_rx) = mpsc::channel::<ServerEvent>(OUTBOUND_QUEUE_DEPTH);
    let joined = match game.connect(user.id, user.name.clone(), event_tx).await {
        Ok(joined) => joined,
        Err(error) => return close_with(&mut sink, close_code::POLICY, &error).await,
    };
    if let Err(error) = joined {
        return close_with(&mut sink, close_code::POLICY, &error).await;
    }
    log::info!("websocket connected: game={code}, user={}", user.id);

    // Writer task drains the session's outbound channel; the reader
    // loop hands it a close frame on protocol errors.
    let (close_tx, close_rx) = mpsc::channel::<CloseFrame>(1);
    let send_task = tokio::spawn(write_frames(sink, event_rx, close_rx));

    while let Some(message) = stream.next().await {
        let Ok(message) = message else { break };
        match message {
            Message::Text(text) => match messages::decode_event(&text) {
                Ok(event) => {
                    if game.event(user.id, event).await.is_err() {
                        break;
                    }
                }
                Err(error) => {
                    log::warn!("game {code}: protocol error from {}: {error}", user.id);
                    let _ = close_tx
                        .send(CloseFrame {
                            code: close_code::PROTOCOL,
                            reason: error.to_string().into(),
                        })
                        .await;
                    break;
                }
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    // The actor drops this connection's outbound sender, which lets
    // the writer task run dry and exit.
    let _ = game.disconnect(user.id).await;
    let _ = send_task.await;
    log::info!("websocket disconnected: game={code}, user={}", user.id);
}

async fn read_join_frame(stream: &mut SplitStream<WebSocket>) -> Result<Uuid, ProtocolError> {
    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => {
                let frame: JoinFrame = serde_json::from_str(&text)
                    .map_err(|e| ProtocolError::MalformedFrame(e.to_string()))?;
                return Uuid::parse_str(&frame.id)
                    .map_err(|e| ProtocolError::InvalidUserId(e.to_string()));
            }
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => {}
        }
    }
    Err(ProtocolError::MalformedFrame(
        "connection closed before join".to_string(),
    ))
}

async fn write_frames(
    mut sink: SplitSink<WebSocket, Message>,
    mut events: mpsc::Receiver<ServerEvent>,
    mut close: mpsc::Receiver<CloseFrame>,
) {
    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                let json = match messages::encode_event(&event) {
                    Ok(json) => json,
                    Err(error) => {
                        log::error!("failed to encode outbound event: {error}");
                        continue;
                    }
                };
                if sink.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
            Some(frame) = close.recv() => {
                let _ = sink.send(Message::Close(Some(frame))).await;
                break;
            }
        }
    }
}

async fn close_with(
    sink: &mut SplitSink<WebSocket, Message>,
    code: u16,
    reason: &impl std::fmt::Display,
) {
    let frame = CloseFrame {
        code,
        reason: reason.to_string().into(),
    };
    let _ = sink.send(Message::Close(Some(frame))).await;
}
