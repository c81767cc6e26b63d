//! Realtime session gateway.
//!
//! Serves the lobby snapshot over HTTP and the realtime channel over
//! WebSocket. Every connection is authenticated at the upgrade, bound to
//! one identity for its lifetime, and wired into a per-user sender map the
//! fan-out rules address directly. All room state lives in one
//! [`RoomManager`] behind a mutex; command handling never holds the lock
//! across an await.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::AbortHandle;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::auth::{authenticate, Identity, SessionRegistry, TokenKey};
use super::protocol::{AckReply, ClientCommand, ServerEvent};
use crate::rooms::types::constants;
use crate::rooms::{Room, RoomManager, RoomStatus};

/// Gateway-level failures. Command rejections are not errors; these cover
/// the server lifecycle only.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(std::io::Error),
}

/// Owned gateway state, injected into every handler.
pub struct GatewayState {
    rooms: Mutex<RoomManager>,
    peers: Mutex<HashMap<String, UnboundedSender<ServerEvent>>>,
    countdowns: Mutex<HashMap<Uuid, AbortHandle>>,
    key: TokenKey,
    registry: Arc<dyn SessionRegistry>,
}

impl GatewayState {
    pub fn new(key: TokenKey, registry: Arc<dyn SessionRegistry>) -> Self {
        Self {
            rooms: Mutex::new(RoomManager::new()),
            peers: Mutex::new(HashMap::new()),
            countdowns: Mutex::new(HashMap::new()),
            key,
            registry,
        }
    }

    /// Run `f` against the room manager. Lock scope is the closure only.
    pub fn with_rooms<T>(&self, f: impl FnOnce(&mut RoomManager) -> T) -> T {
        let mut rooms = self.rooms.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut rooms)
    }

    /// Attach a peer to the fan-out map, returning its event stream. The
    /// WebSocket path drives this internally; tests drive it directly to
    /// exercise the gateway without a network stack.
    pub fn connect_peer(&self, user_id: &str) -> mpsc::UnboundedReceiver<ServerEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut peers = self.peers.lock().unwrap_or_else(|e| e.into_inner());
        peers.insert(user_id.to_string(), tx);
        rx
    }

    /// Detach a peer and run the disconnect-as-leave path.
    pub fn disconnect_peer(self: &Arc<Self>, user_id: &str) {
        {
            let mut peers = self.peers.lock().unwrap_or_else(|e| e.into_inner());
            peers.remove(user_id);
        }
        handle_leave(self, user_id);
    }

    /// Send one event to one user, if connected.
    pub fn send_to(&self, user_id: &str, event: ServerEvent) {
        let peers = self.peers.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(tx) = peers.get(user_id) {
            let _ = tx.send(event);
        }
    }

    /// Fan an event out to every member of a room, optionally skipping one.
    pub fn broadcast(&self, room: &Room, event: &ServerEvent, except: Option<&str>) {
        let peers = self.peers.lock().unwrap_or_else(|e| e.into_inner());
        for player in &room.players {
            if except == Some(player.user_id.as_str()) {
                continue;
            }
            if let Some(tx) = peers.get(&player.user_id) {
                let _ = tx.send(event.clone());
            }
        }
    }

    fn store_countdown(&self, room_id: Uuid, handle: AbortHandle) {
        let mut countdowns = self.countdowns.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = countdowns.insert(room_id, handle) {
            previous.abort();
        }
    }

    fn clear_countdown(&self, room_id: Uuid) {
        let mut countdowns = self.countdowns.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = countdowns.remove(&room_id) {
            handle.abort();
        }
    }
}

/// Build the gateway router.
pub fn router(state: Arc<GatewayState>) -> Router {
    Router::new()
        .route("/api/rooms", get(list_rooms))
        .route("/ws", get(ws_handler))
        .layer(tower_http::cors::CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until shutdown.
pub async fn serve(state: Arc<GatewayState>, addr: SocketAddr) -> Result<(), GatewayError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| GatewayError::Bind { addr, source })?;
    info!(%addr, "gateway listening");
    axum::serve(listener, router(state))
        .await
        .map_err(GatewayError::Serve)
}

/// Lobby snapshot: waiting rooms with spare capacity.
async fn list_rooms(State(state): State<Arc<GatewayState>>) -> impl IntoResponse {
    let rooms = state.with_rooms(|rooms| rooms.available_rooms());
    Json(json!({ "rooms": rooms }))
}

#[derive(Debug, Deserialize)]
struct WsQuery {
    token: String,
}

/// Authenticate at the upgrade; a bad credential never gets a socket.
async fn ws_handler(
    State(state): State<Arc<GatewayState>>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    let identity = match authenticate(&state.key, state.registry.as_ref(), &query.token) {
        Ok(identity) => identity,
        Err(err) => {
            warn!(error = %err, "websocket handshake refused");
            return (StatusCode::UNAUTHORIZED, err.to_string()).into_response();
        }
    };
    ws.on_upgrade(move |socket| handle_connection(state, identity, socket))
}

async fn handle_connection(state: Arc<GatewayState>, identity: Identity, socket: WebSocket) {
    info!(user = %identity.user_id, name = %identity.username, "connected");

    let (mut sink, mut stream) = socket.split();
    let mut rx = state.connect_peer(&identity.user_id);

    let writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let Ok(text) = serde_json::to_string(&event) else {
                continue;
            };
            if sink.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = stream.next().await {
        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        // Ghost sessions: credential was valid at handshake but the
        // session has since been terminated externally
        if !state.registry.is_active(&identity.user_id) {
            warn!(user = %identity.user_id, "session expired mid-connection");
            state.send_to(&identity.user_id, ServerEvent::SessionExpired);
            break;
        }

        let command: ClientCommand = match serde_json::from_str(&text) {
            Ok(command) => command,
            Err(err) => {
                debug!(user = %identity.user_id, error = %err, "unparseable command");
                state.send_to(
                    &identity.user_id,
                    ServerEvent::Error { message: "Malformed command".into() },
                );
                continue;
            }
        };

        dispatch(&state, &identity, command);
    }

    info!(user = %identity.user_id, "disconnected");
    // detaching drops the channel sender; let the writer drain anything
    // still queued (a final session-expired, say) before it exits
    state.disconnect_peer(&identity.user_id);
    let _ = writer.await;
}

/// Route one command. Rejections degrade to acks/error events; nothing
/// here can take the process down.
pub fn dispatch(state: &Arc<GatewayState>, identity: &Identity, command: ClientCommand) {
    debug!(user = %identity.user_id, command = command.name(), "command");
    match command {
        ClientCommand::CreateRoom { ack, name } => {
            let room = state.with_rooms(|rooms| {
                rooms.create_room(&identity.user_id, &identity.username, &name)
            });
            state.send_to(
                &identity.user_id,
                ServerEvent::Ack { id: ack, reply: AckReply::Room { room: Some(room.clone()) } },
            );
            state.send_to(&identity.user_id, ServerEvent::RoomCreated { room });
        }

        ClientCommand::JoinRoom { ack, room_id } => {
            let joined = state.with_rooms(|rooms| {
                rooms.join_room(room_id, &identity.user_id, &identity.username)
            });
            let success = joined.is_some();
            state.send_to(
                &identity.user_id,
                ServerEvent::Ack { id: ack, reply: AckReply::Joined { success } },
            );
            if let Some(room) = joined {
                state.broadcast(&room, &ServerEvent::RoomUpdated { room: room.clone() }, None);
                if let Some(player) = room.player(&identity.user_id) {
                    state.broadcast(
                        &room,
                        &ServerEvent::PlayerJoined { player: player.clone() },
                        Some(&identity.user_id),
                    );
                }
            }
        }

        ClientCommand::LeaveRoom => handle_leave(state, &identity.user_id),

        ClientCommand::CloseRoom { room_id } => {
            let closed = state.with_rooms(|rooms| {
                let room = rooms.room(room_id)?;
                if room.host_id != identity.user_id {
                    return None;
                }
                let members = room.clone();
                rooms.delete_room(room_id);
                Some(members)
            });
            match closed {
                Some(room) => {
                    state.clear_countdown(room_id);
                    state.broadcast(&room, &ServerEvent::RoomClosed { room_id }, None);
                }
                None => state.send_to(
                    &identity.user_id,
                    ServerEvent::Error { message: "Cannot close room".into() },
                ),
            }
        }

        ClientCommand::ToggleReady => {
            if let Some(room) = state.with_rooms(|rooms| rooms.toggle_ready(&identity.user_id)) {
                state.broadcast(&room, &ServerEvent::RoomUpdated { room: room.clone() }, None);
            }
        }

        ClientCommand::SelectCar { car_id } => {
            if let Some(room) =
                state.with_rooms(|rooms| rooms.select_car(&identity.user_id, &car_id))
            {
                state.broadcast(&room, &ServerEvent::RoomUpdated { room: room.clone() }, None);
            }
        }

        ClientCommand::StartRace => {
            match state.with_rooms(|rooms| rooms.start_race(&identity.user_id)) {
                Some(room) => start_countdown(state, room.id),
                None => state.send_to(
                    &identity.user_id,
                    ServerEvent::Error { message: "Cannot start race".into() },
                ),
            }
        }

        ClientCommand::UpdatePosition { sample } => {
            let relayed = state.with_rooms(|rooms| {
                let position = rooms.update_position(&identity.user_id, sample)?;
                let room = rooms.room_by_user(&identity.user_id)?.clone();
                Some((room, position))
            });
            // roomless updates are best-effort noise; drop silently
            if let Some((room, position)) = relayed {
                state.broadcast(
                    &room,
                    &ServerEvent::PlayerPosition { position },
                    Some(&identity.user_id),
                );
            }
        }

        ClientCommand::FinishRace { lap_time } => {
            let finished = state.with_rooms(|rooms| {
                let room = rooms.room_by_user(&identity.user_id)?.clone();
                Some((room, rooms.record_finish(&identity.user_id, lap_time)))
            });
            if let Some((room, results)) = finished {
                info!(user = %identity.user_id, lap_time, "finish reported");
                if let Some(results) = results {
                    state.broadcast(&room, &ServerEvent::RaceFinished { results }, None);
                }
            }
        }
    }
}

/// Shared leave path for explicit leave-room and disconnect.
fn handle_leave(state: &Arc<GatewayState>, user_id: &str) {
    let outcome = state.with_rooms(|rooms| rooms.leave_room(user_id));
    let Some(outcome) = outcome else {
        return;
    };

    match outcome.room {
        Some(room) => {
            state.broadcast(&room, &ServerEvent::RoomUpdated { room: room.clone() }, None);
            state.broadcast(
                &room,
                &ServerEvent::PlayerLeft { player_id: user_id.to_string() },
                None,
            );
            // the leaver may have been the last unfinished member
            if let Some(results) = outcome.standings {
                state.broadcast(&room, &ServerEvent::RaceFinished { results }, None);
            }
        }
        None => {
            // room emptied and died; a countdown may still be ticking
            state.clear_countdown(outcome.room_id);
        }
    }
}

/// Spawn the server-owned countdown for a room. The handle is stored so
/// room deletion can abort it; each tick re-checks the room still exists.
pub fn start_countdown(state: &Arc<GatewayState>, room_id: Uuid) {
    let task_state = Arc::clone(state);
    let handle = tokio::spawn(async move {
        for count in (0..=constants::COUNTDOWN_START).rev() {
            let Some(room) = task_state.with_rooms(|rooms| rooms.room(room_id).cloned()) else {
                debug!(room = %room_id, "countdown target vanished");
                return;
            };
            task_state.broadcast(&room, &ServerEvent::RaceCountdown { count }, None);
            sleep(Duration::from_secs(1)).await;
        }

        let room = task_state.with_rooms(|rooms| {
            rooms.set_race_status(room_id, RoomStatus::Racing);
            rooms.room(room_id).cloned()
        });
        if let Some(room) = room {
            info!(room = %room_id, "race started");
            task_state.broadcast(&room, &ServerEvent::RaceStarted, None);
        }

        let mut countdowns = task_state.countdowns.lock().unwrap_or_else(|e| e.into_inner());
        countdowns.remove(&room_id);
    });
    state.store_countdown(room_id, handle.abort_handle());
}
