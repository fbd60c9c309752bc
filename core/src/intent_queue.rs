//! The per-zone FIFO buffer coupling asynchronous ingress to the
//! synchronous tick boundary.
//!
//! `enqueue` is safe to call from many concurrent ingress handlers;
//! `drain` is called by the tick engine at most once per zone per tick
//! and returns everything enqueued strictly before that call. A single
//! mutual-exclusion primitive per zone protects both operations, so an
//! intent enqueued while a drain is in flight is simply ordered after it
//! and preserved for the following tick rather than lost or duplicated.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use game_model::{Intent, ZoneId};
use tokio::sync::Mutex;

/// Per-zone FIFO intent buffer, safe to share across ingress tasks.
#[derive(Default)]
pub struct IntentQueue {
    zones: Mutex<HashMap<ZoneId, Arc<Mutex<VecDeque<Intent>>>>>,
}

impl IntentQueue {
    /// Creates an empty queue with no zones yet registered.
    pub fn new() -> Self {
        Self::default()
    }

    async fn zone_buffer(&self, zone_id: ZoneId) -> Arc<Mutex<VecDeque<Intent>>> {
        let mut zones = self.zones.lock().await;
        zones.entry(zone_id).or_default().clone()
    }

    /// Buffers `intent` for its zone. Returns once the intent is durably
    /// placed in the queue — callers (the ingress handler) must await
    /// this before acknowledging the intent to the client.
    pub async fn enqueue(&self, intent: Intent) {
        let buffer = self.zone_buffer(intent.zone_id).await;
        let mut buffer = buffer.lock().await;
        buffer.push_back(intent);
    }

    /// Drains and returns every intent enqueued for `zone_id` strictly
    /// before this call, in enqueue order. Intents enqueued concurrently
    /// with this call land in the buffer either before or after the
    /// drain completes — never lost, never duplicated — and in the
    /// latter case are preserved for the next tick.
    pub async fn drain(&self, zone_id: ZoneId) -> Vec<Intent> {
        let buffer = self.zone_buffer(zone_id).await;
        let mut buffer = buffer.lock().await;
        buffer.drain(..).collect()
    }

    /// Zones with at least one buffered, undrained intent. Used by the
    /// tick engine to compute the active zone set.
    pub async fn zones_with_queued_intents(&self) -> Vec<ZoneId> {
        let zones = self.zones.lock().await;
        let mut result = Vec::new();
        for (zone_id, buffer) in zones.iter() {
            if !buffer.lock().await.is_empty() {
                result.push(*zone_id);
            }
        }
        result
    }
}
