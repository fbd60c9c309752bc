//! External authentication/authorization boundaries. The core depends
//! only on the `PlayerId` these produce — how a credential becomes one
//! (passwords, tokens, anything else) is explicitly out of scope and
//! left to whatever the bootstrap binary wires in.

use async_trait::async_trait;
use game_model::PlayerId;

use crate::error::AuthError;

/// Resolves a handshake's opaque credentials to a stable [`PlayerId`].
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, credentials: &[u8]) -> Result<PlayerId, AuthError>;
}

/// Gates the administrative surface (pause/resume/step, inspection).
/// Distinct from [`Authenticator`] since admin credentials are not
/// scoped to a player identity.
#[async_trait]
pub trait AdminAuth: Send + Sync {
    async fn authorize(&self, credentials: &[u8]) -> Result<(), AuthError>;
}
