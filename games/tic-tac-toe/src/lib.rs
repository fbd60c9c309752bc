//! A reference `GameLogic` module: tic-tac-toe played out across the
//! framework's zone/entity model instead of the teacher's
//! client-hosted `BackEndArchitecture<Rpc, Delta, ViewState>` room.
//!
//! A zone is a 3x3 board. Each placed mark is a 1x1 entity at its cell,
//! with `metadata` holding a single byte: `0` for X, `1` for O. The
//! module assigns marks to players on a first-come basis per zone (the
//! first two distinct players to submit a legal intent become X and O;
//! anyone after that is a spectator whose intents are silently
//! dropped) and tracks that assignment internally — the one piece of
//! state this module keeps that the framework does not contract for.
//!
//! Exists to give `ModuleRegistry` something concrete to resolve and to
//! exercise the adapter/tick pipeline end to end; not itself part of
//! the core.

use std::collections::HashMap;

use async_trait::async_trait;
use game_core::error::GameLogicError;
use game_core::game_logic::{FrameworkHandle, GameLogic};
use game_model::{BaseState, Entity, EntityCreate, EntityDeltas, Intent, PlayerId, TickResult, ZoneId};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;

const BOARD_SIZE: i32 = 3;
const MARK_X: u8 = 0;
const MARK_O: u8 = 1;

#[derive(Deserialize)]
struct PlaceMove {
    x: i32,
    y: i32,
}

fn mark_label(mark: u8) -> &'static str {
    if mark == MARK_X { "X" } else { "O" }
}

/// Per-zone mark assignment, built up one player at a time as intents
/// arrive. Not persisted — a process restart forgets who was playing
/// which side, which is acceptable for a reference module.
#[derive(Default)]
struct Assignments {
    by_zone: HashMap<ZoneId, HashMap<PlayerId, u8>>,
}

/// The tic-tac-toe reference module.
pub struct TicTacToeLogic {
    assignments: Mutex<Assignments>,
}

impl Default for TicTacToeLogic {
    fn default() -> Self {
        Self {
            assignments: Mutex::new(Assignments::default()),
        }
    }
}

impl TicTacToeLogic {
    pub fn new() -> Self {
        Self::default()
    }
}

fn occupied(entities: &[Entity], new_creates: &[EntityCreate], x: i32, y: i32) -> bool {
    entities.iter().any(|e| e.x == x && e.y == y)
        || new_creates.iter().any(|c| c.x == x && c.y == y)
}

fn mark_at(entities: &[Entity], creates: &[EntityCreate], x: i32, y: i32) -> Option<u8> {
    if let Some(e) = entities.iter().find(|e| e.x == x && e.y == y) {
        return e.metadata.first().copied();
    }
    creates
        .iter()
        .find(|c| c.x == x && c.y == y)
        .and_then(|c| c.metadata.first().copied())
}

fn winner(entities: &[Entity], creates: &[EntityCreate]) -> Option<&'static str> {
    const LINES: [[(i32, i32); 3]; 8] = [
        [(0, 0), (1, 0), (2, 0)],
        [(0, 1), (1, 1), (2, 1)],
        [(0, 2), (1, 2), (2, 2)],
        [(0, 0), (0, 1), (0, 2)],
        [(1, 0), (1, 1), (1, 2)],
        [(2, 0), (2, 1), (2, 2)],
        [(0, 0), (1, 1), (2, 2)],
        [(2, 0), (1, 1), (0, 2)],
    ];
    for line in LINES {
        let marks: Vec<Option<u8>> = line
            .iter()
            .map(|&(x, y)| mark_at(entities, creates, x, y))
            .collect();
        if let (Some(a), Some(b), Some(c)) = (marks[0], marks[1], marks[2]) {
            if a == b && b == c {
                return Some(mark_label(a));
            }
        }
    }
    None
}

#[async_trait]
impl GameLogic for TicTacToeLogic {
    async fn on_init(&self, _framework: FrameworkHandle) -> Result<(), GameLogicError> {
        Ok(())
    }

    async fn on_tick(
        &self,
        zone_id: ZoneId,
        entities: &[Entity],
        intents: &[Intent],
        _tick_number: u64,
    ) -> Result<TickResult, GameLogicError> {
        let mut assignments = self.assignments.lock().await;
        let marks = assignments.by_zone.entry(zone_id).or_default();

        let mut creates: Vec<EntityCreate> = Vec::new();
        let mut turn = (entities.len() % 2) as u8;

        if winner(entities, &creates).is_some() {
            // The board already has a result; no more moves apply this tick.
            let extras = json!({ "winner": winner(entities, &creates), "turn": mark_label(turn) });
            return Ok(TickResult {
                deltas: EntityDeltas::default(),
                extras,
            });
        }

        for intent in intents {
            let Ok(mv) = serde_json::from_value::<PlaceMove>(intent.body.clone()) else {
                continue;
            };
            if !(0..BOARD_SIZE).contains(&mv.x) || !(0..BOARD_SIZE).contains(&mv.y) {
                continue;
            }

            let mark = match marks.get(&intent.player_id) {
                Some(mark) => *mark,
                None if marks.len() < 2 => {
                    let mark = marks.len() as u8;
                    marks.insert(intent.player_id, mark);
                    mark
                }
                None => continue, // Spectator beyond the first two players.
            };

            if mark != turn {
                continue;
            }
            if occupied(entities, &creates, mv.x, mv.y) {
                continue;
            }

            creates.push(EntityCreate {
                x: mv.x,
                y: mv.y,
                width: 1,
                height: 1,
                metadata: vec![mark],
            });
            turn = 1 - turn;

            if winner(entities, &creates).is_some() {
                break;
            }
        }

        let extras = json!({
            "winner": winner(entities, &creates),
            "turn": mark_label(turn),
        });

        Ok(TickResult {
            deltas: EntityDeltas {
                creates,
                updates: Vec::new(),
                deletes: Vec::new(),
            },
            extras,
        })
    }

    fn get_player_state(
        &self,
        _zone_id: ZoneId,
        _player_id: PlayerId,
        base_state: &BaseState,
    ) -> Result<serde_json::Value, GameLogicError> {
        // Tic-tac-toe has no fog-of-war: every subscriber sees the full
        // board. The filter still runs — identity is a valid filter,
        // not a bypass of it.
        serde_json::to_value(base_state).map_err(|e| GameLogicError::Failed(e.to_string()))
    }
}
