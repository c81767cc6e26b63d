//! Authoritative room state: registry, membership, race lifecycle.

pub mod manager;
pub mod types;

pub use manager::{LeaveOutcome, RoomManager};
pub use types::{PlayerPosition, PositionSample, RaceResult, Room, RoomPlayer, RoomStatus};
