//! Realtime session gateway: authentication, wire protocol, and the
//! HTTP/WebSocket server that relays room and race events.

pub mod auth;
pub mod protocol;
pub mod server;

pub use auth::{authenticate, AuthError, Identity, InMemorySessionRegistry, SessionRegistry, TokenKey};
pub use protocol::{AckReply, ClientCommand, ServerEvent};
pub use server::{dispatch, router, serve, start_countdown, GatewayError, GatewayState};
