//! Process-wide connection and subscription bookkeeping.
//!
//! All mutations are serialized under a single lock; reads return
//! snapshots taken under that lock so callers never observe a
//! partially-updated state. The one property every other invariant here
//! rests on: `disconnect` only ever removes the binding whose connection
//! id matches what's currently registered, so a stale handler can never
//! tear down a newer session.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use game_model::{ConnectionId, PlayerId, ZoneId};
use tokio::sync::Mutex;

use crate::error::ConflictError;
use crate::sink::OutboundSink;

/// Consecutive `get_player_state` failures a (zone, player) pair may
/// accrue before it is marked for disconnect. A lone transient filter
/// error only skips that tick's emission; only repeated failures close
/// the connection.
const FILTER_FAILURE_DISCONNECT_THRESHOLD: u32 = 3;

struct ConnectionEntry {
    player_id: PlayerId,
    zone_id: Option<ZoneId>,
    sink: Arc<dyn OutboundSink>,
}

#[derive(Default)]
struct Inner {
    by_player: HashMap<PlayerId, ConnectionId>,
    connections: HashMap<ConnectionId, ConnectionEntry>,
    zones: HashMap<ZoneId, HashSet<ConnectionId>>,
    next_connection_id: u64,
    /// Consecutive `get_player_state` failure counts, keyed by (zone,
    /// player). Cleared on a successful filter call or a disconnect.
    filter_failures: HashMap<(ZoneId, PlayerId), u32>,
}

impl Inner {
    fn remove_connection(&mut self, connection_id: ConnectionId) -> Option<ConnectionEntry> {
        let entry = self.connections.remove(&connection_id)?;
        if let Some(zone_id) = entry.zone_id {
            if let Some(members) = self.zones.get_mut(&zone_id) {
                members.remove(&connection_id);
                if members.is_empty() {
                    self.zones.remove(&zone_id);
                }
            }
            self.filter_failures.remove(&(zone_id, entry.player_id));
        }
        Some(entry)
    }
}

/// Maps players to zones and zones to subscribers, with connection
/// identity and stale-close protection.
#[derive(Default)]
pub struct SubscriptionRegistry {
    inner: Mutex<Inner>,
}

impl SubscriptionRegistry {
    /// Creates an empty registry with no connections.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new connection for `player_id`, issuing a fresh
    /// connection id. If a prior connection exists for the same player,
    /// it is atomically unregistered and its sink best-effort closed —
    /// after this call returns, the old connection's `disconnect` is a
    /// guaranteed no-op.
    pub async fn register(
        &self,
        player_id: PlayerId,
        sink: Arc<dyn OutboundSink>,
    ) -> ConnectionId {
        let (connection_id, stale) = {
            let mut inner = self.inner.lock().await;
            let connection_id = ConnectionId(inner.next_connection_id);
            inner.next_connection_id += 1;

            let stale = match inner.by_player.insert(player_id, connection_id) {
                Some(old_id) => inner.remove_connection(old_id),
                None => None,
            };

            inner.connections.insert(
                connection_id,
                ConnectionEntry {
                    player_id,
                    zone_id: None,
                    sink,
                },
            );

            (connection_id, stale)
        };

        if let Some(stale) = stale {
            stale.sink.close().await;
        }
        connection_id
    }

    /// Subscribes `connection_id` to `zone_id`, valid only if it matches
    /// the player's currently registered connection. Moves the
    /// connection out of any prior zone.
    pub async fn subscribe(
        &self,
        player_id: PlayerId,
        connection_id: ConnectionId,
        zone_id: ZoneId,
    ) -> Result<(), ConflictError> {
        let mut inner = self.inner.lock().await;
        if inner.by_player.get(&player_id) != Some(&connection_id) {
            return Err(ConflictError::StaleConnection);
        }
        let Some(entry) = inner.connections.get(&connection_id) else {
            return Err(ConflictError::StaleConnection);
        };
        let previous_zone = entry.zone_id;

        if let Some(previous_zone) = previous_zone {
            if previous_zone == zone_id {
                return Ok(());
            }
            if let Some(members) = inner.zones.get_mut(&previous_zone) {
                members.remove(&connection_id);
                if members.is_empty() {
                    inner.zones.remove(&previous_zone);
                }
            }
        }

        inner
            .zones
            .entry(zone_id)
            .or_default()
            .insert(connection_id);
        inner.connections.get_mut(&connection_id).unwrap().zone_id = Some(zone_id);
        Ok(())
    }

    /// Removes the binding for `(player_id, connection_id)` — but only if
    /// `connection_id` still matches what's registered for that player.
    /// Otherwise a no-op: this is the reconnect-safety guarantee that
    /// lets a stale handler's disconnect never affect a newer session.
    pub async fn disconnect(&self, player_id: PlayerId, connection_id: ConnectionId) {
        let mut inner = self.inner.lock().await;
        if inner.by_player.get(&player_id) != Some(&connection_id) {
            return;
        }
        inner.by_player.remove(&player_id);
        inner.remove_connection(connection_id);
    }

    /// The zone a connection currently belongs to, if any. Used by
    /// ingress to resolve which zone an intent targets.
    pub async fn current_zone(&self, connection_id: ConnectionId) -> Option<ZoneId> {
        let inner = self.inner.lock().await;
        inner.connections.get(&connection_id)?.zone_id
    }

    /// The number of currently registered connections. Used by ingress
    /// to enforce a soft cap on concurrent connections before `register`
    /// is called.
    pub async fn connection_count(&self) -> usize {
        self.inner.lock().await.connections.len()
    }

    /// A snapshot of every zone with at least one subscriber.
    pub async fn subscribed_zone_ids(&self) -> Vec<ZoneId> {
        let inner = self.inner.lock().await;
        inner.zones.keys().copied().collect()
    }

    /// A snapshot of `zone_id`'s subscribers, for fanout.
    pub async fn subscribers_of(
        &self,
        zone_id: ZoneId,
    ) -> Vec<(PlayerId, ConnectionId, Arc<dyn OutboundSink>)> {
        let inner = self.inner.lock().await;
        let Some(members) = inner.zones.get(&zone_id) else {
            return Vec::new();
        };
        members
            .iter()
            .filter_map(|connection_id| {
                inner.connections.get(connection_id).map(|entry| {
                    (entry.player_id, *connection_id, entry.sink.clone())
                })
            })
            .collect()
    }

    /// Records one `get_player_state` failure for `(zone_id, player_id)`
    /// and reports whether the consecutive count has now crossed the
    /// disconnect threshold. A lone failure never crosses it — only
    /// repeated, back-to-back failures do.
    pub async fn record_filter_failure(&self, zone_id: ZoneId, player_id: PlayerId) -> bool {
        let mut inner = self.inner.lock().await;
        let count = inner.filter_failures.entry((zone_id, player_id)).or_insert(0);
        *count += 1;
        *count >= FILTER_FAILURE_DISCONNECT_THRESHOLD
    }

    /// Clears `(zone_id, player_id)`'s consecutive filter-failure count
    /// after a successful `get_player_state` call.
    pub async fn clear_filter_failure(&self, zone_id: ZoneId, player_id: PlayerId) {
        let mut inner = self.inner.lock().await;
        inner.filter_failures.remove(&(zone_id, player_id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn a_lone_filter_failure_does_not_cross_the_threshold() {
        let registry = SubscriptionRegistry::new();
        let zone_id = ZoneId(1);
        let player_id = PlayerId(1);

        assert!(!registry.record_filter_failure(zone_id, player_id).await);
    }

    #[tokio::test]
    async fn only_a_run_of_consecutive_failures_crosses_the_threshold() {
        let registry = SubscriptionRegistry::new();
        let zone_id = ZoneId(1);
        let player_id = PlayerId(1);

        for _ in 0..FILTER_FAILURE_DISCONNECT_THRESHOLD - 1 {
            assert!(!registry.record_filter_failure(zone_id, player_id).await);
        }
        assert!(registry.record_filter_failure(zone_id, player_id).await);
    }

    #[tokio::test]
    async fn a_success_resets_the_consecutive_count() {
        let registry = SubscriptionRegistry::new();
        let zone_id = ZoneId(1);
        let player_id = PlayerId(1);

        for _ in 0..FILTER_FAILURE_DISCONNECT_THRESHOLD - 1 {
            registry.record_filter_failure(zone_id, player_id).await;
        }
        registry.clear_filter_failure(zone_id, player_id).await;

        for _ in 0..FILTER_FAILURE_DISCONNECT_THRESHOLD - 1 {
            assert!(!registry.record_filter_failure(zone_id, player_id).await);
        }
    }
}
