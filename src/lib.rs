//! RustRacer - Multiplayer Pseudo-3D Racing
//!
//! Library behind the rustracer server: an authoritative room manager and
//! realtime WebSocket gateway, plus the deterministic track generator,
//! perspective renderer, and fixed-timestep simulation that clients run
//! against a shared seed.

pub mod config;
pub mod engine;
pub mod gateway;
pub mod rooms;

// Re-export commonly used types
pub use engine::EngineConfig;
pub use gateway::{GatewayState, TokenKey};
pub use rooms::{Room, RoomManager, RoomStatus};
