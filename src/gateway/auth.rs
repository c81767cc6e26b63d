//! Connection authentication.
//!
//! A bearer token is a base64url-encoded JSON payload plus a SHA-256
//! signature over the payload and a shared secret. The gateway verifies
//! the signature and expiry, then cross-checks the identity against an
//! externally owned session registry: a well-signed token whose session
//! was revoked is refused at the handshake.

use std::collections::HashSet;
use std::sync::RwLock;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Authentication failures. All of them refuse the handshake.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Malformed token")]
    Malformed,

    #[error("Invalid token signature")]
    BadSignature,

    #[error("Token expired")]
    Expired,

    #[error("Session revoked or unknown")]
    SessionRevoked,
}

/// The identity a connection is bound to for its lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: String,
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenClaims {
    user_id: String,
    username: String,
    /// Unix timestamp, seconds.
    expires_at: i64,
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        use std::fmt::Write;
        let _ = write!(out, "{:02x}", byte);
    }
    out
}

/// Signing/verification key derived from the server secret.
#[derive(Debug, Clone)]
pub struct TokenKey {
    secret: Vec<u8>,
}

impl TokenKey {
    pub fn new(secret: &str) -> Self {
        Self { secret: secret.as_bytes().to_vec() }
    }

    fn signature(&self, payload: &[u8]) -> String {
        let mut input = Vec::with_capacity(payload.len() + self.secret.len());
        input.extend_from_slice(payload);
        input.extend_from_slice(&self.secret);
        sha256_hex(&input)
    }

    /// Issue a token for an identity with the given time to live.
    pub fn sign(&self, user_id: &str, username: &str, ttl: Duration) -> String {
        let claims = TokenClaims {
            user_id: user_id.to_string(),
            username: username.to_string(),
            expires_at: (Utc::now() + ttl).timestamp(),
        };
        // serializing a plain struct of strings and an int cannot fail
        let payload = serde_json::to_vec(&claims).unwrap_or_default();
        let encoded = URL_SAFE_NO_PAD.encode(&payload);
        let signature = self.signature(&payload);
        format!("{encoded}.{signature}")
    }

    /// Verify signature and expiry, returning the embedded identity.
    pub fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let (encoded, signature) = token.split_once('.').ok_or(AuthError::Malformed)?;
        let payload = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|_| AuthError::Malformed)?;

        if self.signature(&payload) != signature {
            return Err(AuthError::BadSignature);
        }

        let claims: TokenClaims =
            serde_json::from_slice(&payload).map_err(|_| AuthError::Malformed)?;
        if claims.expires_at <= Utc::now().timestamp() {
            return Err(AuthError::Expired);
        }

        Ok(Identity {
            user_id: claims.user_id,
            username: claims.username,
        })
    }
}

/// Externally owned registry of active sessions.
pub trait SessionRegistry: Send + Sync {
    fn is_active(&self, user_id: &str) -> bool;
}

/// Simple in-process registry for the standalone server and tests.
#[derive(Debug, Default)]
pub struct InMemorySessionRegistry {
    active: RwLock<HashSet<String>>,
}

impl InMemorySessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn activate(&self, user_id: &str) {
        if let Ok(mut active) = self.active.write() {
            active.insert(user_id.to_string());
        }
    }

    pub fn revoke(&self, user_id: &str) {
        if let Ok(mut active) = self.active.write() {
            active.remove(user_id);
        }
    }
}

impl SessionRegistry for InMemorySessionRegistry {
    fn is_active(&self, user_id: &str) -> bool {
        self.active
            .read()
            .map(|active| active.contains(user_id))
            .unwrap_or(false)
    }
}

/// Full handshake check: token signature + expiry, then session registry.
pub fn authenticate(
    key: &TokenKey,
    registry: &dyn SessionRegistry,
    token: &str,
) -> Result<Identity, AuthError> {
    let identity = key.verify(token)?;
    if !registry.is_active(&identity.user_id) {
        return Err(AuthError::SessionRevoked);
    }
    Ok(identity)
}
