//! `WebSocket` handler for real-time zone notifications.
//!
//! Clients connect to `GET /ws/events` and receive published zone event
//! envelopes as JSON text frames. Messages are scoped by audience the same
//! way the zone addresses them:
//!
//! - world messages and structured events reach every socket;
//! - a room message reaches sockets opened with `?room=<id>` for that room;
//! - a whisper reaches only sockets opened with `?player=<id>` for that
//!   player.
//!
//! A counter sign connects with no parameters and sees only public traffic.
//! If a client falls behind, lagged messages are skipped and the client
//! resumes from the most recent event.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use ballast_events::{Audience, ZoneEvent};
use ballast_types::{PlayerId, RoomId};
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::state::AppState;

/// Who a socket listens as.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct EventScope {
    /// Receive whispers addressed to this player.
    pub player: Option<Uuid>,
    /// Receive messages addressed to this room.
    pub room: Option<Uuid>,
}

impl EventScope {
    /// Whether an event should be sent to this socket.
    pub fn admits(&self, event: &ZoneEvent) -> bool {
        match event {
            ZoneEvent::Message { audience, .. } => match audience {
                Audience::World => true,
                Audience::Room(room) => self.room.map(RoomId::from) == Some(*room),
                Audience::Player(player) => self.player.map(PlayerId::from) == Some(*player),
            },
            _ => true,
        }
    }
}

/// Upgrade an HTTP request to a `WebSocket` connection and begin
/// streaming zone events within `scope`.
///
/// # Route
///
/// `GET /ws/events[?player=<id>][&room=<id>]`
pub async fn ws_events(
    ws: WebSocketUpgrade,
    Query(scope): Query<EventScope>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state, scope))
}

async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>, scope: EventScope) {
    debug!(player = ?scope.player, room = ?scope.room, "WebSocket client connected");

    let mut rx = state.zone.subscribe();

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(envelope) if !scope.admits(&envelope.event) => {}
                    Ok(envelope) => {
                        let json = match serde_json::to_string(&envelope) {
                            Ok(j) => j,
                            Err(e) => {
                                warn!(seq = envelope.seq, "Failed to serialize zone event: {e}");
                                continue;
                            }
                        };
                        if socket.send(Message::Text(json.into())).await.is_err() {
                            debug!("WebSocket client disconnected (send failed)");
                            return;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        debug!(skipped = n, "WebSocket client lagged, skipping ahead");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                        debug!("Event bus closed, shutting down WebSocket");
                        return;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("WebSocket client disconnected");
                        return;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!("WebSocket client disconnected (pong failed)");
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        debug!("WebSocket error: {e}");
                        return;
                    }
                    // Clients have nothing to say.
                    _ => {}
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_scope_sees_only_public_traffic() {
        let scope = EventScope::default();
        assert!(scope.admits(&ZoneEvent::world("The platform groans.")));
        assert!(!scope.admits(&ZoneEvent::player(PlayerId::new(), "psst")));
        assert!(!scope.admits(&ZoneEvent::room(RoomId::new(), "A thud.")));
    }

    #[test]
    fn whispers_reach_only_their_player() {
        let (ada, bo) = (PlayerId::new(), PlayerId::new());
        let room = RoomId::new();
        let scope = EventScope {
            player: Some(ada.into_inner()),
            room: Some(room.into_inner()),
        };
        assert!(scope.admits(&ZoneEvent::player(ada, "Your fine is 5 ash.")));
        assert!(!scope.admits(&ZoneEvent::player(bo, "Your fine is 15 ash.")));
        assert!(scope.admits(&ZoneEvent::room(room, "Ada drops a teapot.")));
        assert!(!scope.admits(&ZoneEvent::room(RoomId::new(), "Elsewhere.")));
    }
}
