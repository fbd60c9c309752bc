//! The process-wide shared state axum hands to every handler: the
//! subscription registry and intent queue ingress depends on, plus the
//! admin handle and auth boundaries the admin routes depend on.

use std::sync::Arc;

use game_core::{AdminAuth, AdminHandle, Authenticator, IntentQueue, SubscriptionRegistry};

pub struct AppState {
    pub registry: Arc<SubscriptionRegistry>,
    pub intents: Arc<IntentQueue>,
    pub admin: AdminHandle,
    pub authenticator: Arc<dyn Authenticator>,
    pub admin_auth: Option<Arc<dyn AdminAuth>>,
    /// Soft cap on concurrent connections. `0` means unlimited.
    pub max_connections: usize,
}
