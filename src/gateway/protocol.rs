//! Wire protocol for the realtime channel.
//!
//! JSON messages tagged by `type`, kebab-case, matching the browser
//! client's event names. Commands split into two kinds: acknowledged
//! (create/join, which carry a client-chosen `ack` id echoed in the reply)
//! and fire-and-forget (everything else, observed via broadcasts).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::rooms::{PlayerPosition, PositionSample, RaceResult, Room, RoomPlayer};

/// Client → server commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientCommand {
    /// Create a room; replies with `ack` carrying the room or null.
    CreateRoom { ack: u32, name: String },
    /// Join a room; replies with `ack` carrying success.
    JoinRoom { ack: u32, room_id: Uuid },
    /// Leave the current room.
    LeaveRoom,
    /// Close a room; only honored for its host.
    CloseRoom { room_id: Uuid },
    /// Flip the caller's ready flag.
    ToggleReady,
    /// Begin the countdown; host only.
    StartRace,
    /// Record a cosmetic car selection.
    SelectCar { car_id: String },
    /// Stream the caller's latest kinematic snapshot.
    UpdatePosition {
        #[serde(flatten)]
        sample: PositionSample,
    },
    /// Report race completion with the final lap time.
    FinishRace { lap_time: f64 },
}

impl ClientCommand {
    /// Whether this command carries an acknowledgement id.
    pub fn is_acknowledged(&self) -> bool {
        matches!(
            self,
            ClientCommand::CreateRoom { .. } | ClientCommand::JoinRoom { .. }
        )
    }

    /// Wire tag, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            ClientCommand::CreateRoom { .. } => "create-room",
            ClientCommand::JoinRoom { .. } => "join-room",
            ClientCommand::LeaveRoom => "leave-room",
            ClientCommand::CloseRoom { .. } => "close-room",
            ClientCommand::ToggleReady => "toggle-ready",
            ClientCommand::StartRace => "start-race",
            ClientCommand::SelectCar { .. } => "select-car",
            ClientCommand::UpdatePosition { .. } => "update-position",
            ClientCommand::FinishRace { .. } => "finish-race",
        }
    }
}

/// Payload of an acknowledgement, shaped by the command kind.
///
/// Untagged variants are tried in order; `Joined` goes first because its
/// `success` field is mandatory, while `Room`'s optional field would
/// otherwise swallow any payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AckReply {
    /// Reply to join-room.
    Joined { success: bool },
    /// Reply to create-room: the room, or null on failure.
    Room { room: Option<Room> },
}

/// Server → client events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// Reply to an acknowledged command.
    Ack {
        id: u32,
        #[serde(flatten)]
        reply: AckReply,
    },
    /// Sent to the creator once their room exists.
    RoomCreated { room: Room },
    /// Full room snapshot after any state change.
    RoomUpdated { room: Room },
    /// The room was closed by its host.
    RoomClosed { room_id: Uuid },
    /// A new member joined (sent to the other members).
    PlayerJoined { player: RoomPlayer },
    /// A member left or disconnected.
    PlayerLeft { player_id: String },
    /// Countdown tick, 3 down to 0.
    RaceCountdown { count: u8 },
    /// Countdown finished; the race is on.
    RaceStarted,
    /// A peer's latest position.
    PlayerPosition { position: PlayerPosition },
    /// Final standings once every member finished.
    RaceFinished { results: Vec<RaceResult> },
    /// The session backing this connection was terminated externally.
    SessionExpired,
    /// A command failed in a way worth telling the client about.
    Error { message: String },
}
