//! Builds the authoritative post-apply entity snapshot for one zone's
//! tick, in-memory against the pre-tick list (realization (a) of the
//! two equivalent strategies) so no subscriber ever observes a
//! one-tick lag on a same-tick create or delete.

use std::collections::HashMap;

use game_model::{Entity, EntityDeltas, EntityId};

/// Merges `deltas` against `pre_tick` entities, folding in `created` —
/// the entities the gateway just assigned ids to — so the result is the
/// zone's authoritative state immediately after `apply_deltas`
/// returned, without a second store read.
pub fn build_snapshot(
    pre_tick: Vec<Entity>,
    deltas: &EntityDeltas,
    created: Vec<Entity>,
) -> Vec<Entity> {
    let mut by_id: HashMap<EntityId, Entity> =
        pre_tick.into_iter().map(|e| (e.id, e)).collect();

    for update in &deltas.updates {
        if let Some(entity) = by_id.get_mut(&update.id) {
            entity.x = update.x;
            entity.y = update.y;
            entity.width = update.width;
            entity.height = update.height;
            if let Some(metadata) = &update.metadata {
                entity.metadata = metadata.clone();
            }
        }
    }

    for delete in &deltas.deletes {
        by_id.remove(delete);
    }

    for entity in created {
        by_id.insert(entity.id, entity);
    }

    by_id.into_values().collect()
}
