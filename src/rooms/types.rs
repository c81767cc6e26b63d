//! Room and race wire types.
//!
//! Field names serialize in camelCase to match the browser client's
//! snapshot shape; status values are snake_case strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Room lifecycle constants.
pub mod constants {
    /// Fixed room capacity.
    pub const MAX_PLAYERS: usize = 4;

    /// Track seeds are drawn from `0..SEED_RANGE`.
    pub const SEED_RANGE: u32 = 1_000_000;

    /// Minimum members before the host may start a race.
    pub const MIN_PLAYERS_TO_START: usize = 2;

    /// Countdown starts at this value and ticks down to 0.
    pub const COUNTDOWN_START: u8 = 3;
}

/// Room lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    /// Accepting joins, members readying up.
    Waiting,
    /// Countdown timer running; joins rejected.
    Countdown,
    /// Race in progress.
    Racing,
    /// All members finished.
    Finished,
}

impl RoomStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomStatus::Waiting => "waiting",
            RoomStatus::Countdown => "countdown",
            RoomStatus::Racing => "racing",
            RoomStatus::Finished => "finished",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "waiting" => Some(RoomStatus::Waiting),
            "countdown" => Some(RoomStatus::Countdown),
            "racing" => Some(RoomStatus::Racing),
            "finished" => Some(RoomStatus::Finished),
            _ => None,
        }
    }
}

impl std::fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A member of a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPlayer {
    pub user_id: String,
    pub username: String,
    pub is_ready: bool,
    pub is_host: bool,
    /// Cosmetic car selection; ignored by the simulation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_car: Option<String>,
}

/// Authoritative room snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: Uuid,
    pub name: String,
    pub host_id: String,
    pub players: Vec<RoomPlayer>,
    pub max_players: usize,
    pub status: RoomStatus,
    /// Generated once at creation; immutable for the room's lifetime.
    pub track_seed: u32,
    pub created_at: DateTime<Utc>,
}

impl Room {
    pub fn player(&self, user_id: &str) -> Option<&RoomPlayer> {
        self.players.iter().find(|p| p.user_id == user_id)
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.max_players
    }
}

/// Kinematic snapshot as sent by a client (identity comes from the
/// session binding, not the payload).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionSample {
    pub x: f64,
    pub z: f64,
    pub speed: f64,
    pub lap_time: f64,
    pub position: u32,
}

/// Full position entity relayed to peers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerPosition {
    pub player_id: String,
    pub username: String,
    pub x: f64,
    pub z: f64,
    pub speed: f64,
    pub lap_time: f64,
    pub position: u32,
}

/// One finisher in the final standings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceResult {
    pub player_id: String,
    pub username: String,
    pub lap_time: f64,
    /// Finish order, 1-based.
    pub position: u32,
}
