//! Example wiring for the core's two external auth boundaries
//! (`Authenticator`, `AdminAuth`). Neither does anything resembling
//! real authentication — the spec treats credential verification as an
//! external collaborator, and a real deployment is expected to swap
//! these for whatever identity provider it already trusts. Kept here
//! only so the bootstrap binary has something concrete to hand the
//! core.

use async_trait::async_trait;
use game_core::error::AuthError;
use game_core::{AdminAuth, Authenticator};
use game_model::PlayerId;

/// Treats the handshake credentials as a UTF-8 decimal player id,
/// verbatim, with no signature or session-token check at all.
pub struct TrustingAuthenticator;

#[async_trait]
impl Authenticator for TrustingAuthenticator {
    async fn authenticate(&self, credentials: &[u8]) -> Result<PlayerId, AuthError> {
        let text = std::str::from_utf8(credentials)
            .map_err(|e| AuthError(format!("credentials not utf-8: {e}")))?;
        let id: i64 = text
            .trim()
            .parse()
            .map_err(|e| AuthError(format!("credentials not a player id: {e}")))?;
        Ok(PlayerId(id))
    }
}

/// Gates the admin surface on a single static bearer token configured
/// at startup. `None` means the admin routes are not mounted at all.
pub struct StaticTokenAdminAuth {
    token: String,
}

impl StaticTokenAdminAuth {
    pub fn new(token: String) -> Self {
        Self { token }
    }
}

#[async_trait]
impl AdminAuth for StaticTokenAdminAuth {
    async fn authorize(&self, credentials: &[u8]) -> Result<(), AuthError> {
        if credentials == self.token.as_bytes() {
            Ok(())
        } else {
            Err(AuthError("invalid admin token".to_string()))
        }
    }
}
