//! RustRacer server - room coordination and realtime relay.
//!
//! Main entry point for the gateway binary.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use rustracer::config;
use rustracer::gateway::{self, GatewayState, InMemorySessionRegistry, TokenKey};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting RustRacer server v{}", env!("CARGO_PKG_VERSION"));

    let config = config::load_config()?;
    if config.auth.token_secret == "change-me" {
        tracing::warn!("auth.token_secret is the stock value; set a real secret in config.toml");
    }

    let key = TokenKey::new(&config.auth.token_secret);
    // Session lifecycle is owned by the account system; the standalone
    // binary runs with the in-process registry.
    let registry = Arc::new(InMemorySessionRegistry::new());
    let state = Arc::new(GatewayState::new(key, registry));

    gateway::serve(state, config.network.bind_addr).await?;
    Ok(())
}
