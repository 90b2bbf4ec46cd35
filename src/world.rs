//! Snapshot types.
//!
//! The `Snapshot` struct is a serializable view of the game state that the
//! renderer and UI read after each step.

use crate::components::*;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Player state for the HUD.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub life: i32,
    pub max_life: i32,
    pub facing: Facing,
    pub status: PlayerStatus,
}

/// Boss gate state for the heart indicators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BossSnapshot {
    pub id: u32,
    pub state: GateState,
    pub health: i32,
    pub health_max: i32,
    pub indicators: Vec<bool>,
}

/// One non-player entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub id: u32,
    pub category: Category,
    pub x: f32,
    pub y: f32,
    pub scale: f32,
    pub mirrored: bool,
    pub lifecycle: Lifecycle,
    /// Behaviour state name, empty for brainless entities.
    pub state: String,
}

/// Complete game state snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Current simulation tick.
    pub tick: u64,
    /// Elapsed simulation time in seconds.
    pub time: f32,
    pub kills: u32,
    pub player: Option<PlayerSnapshot>,
    pub bosses: Vec<BossSnapshot>,
    /// Every other entity, ascending id.
    pub entities: Vec<EntitySnapshot>,
}

impl Snapshot {
    /// Create a snapshot from the ECS world.
    pub fn from_world(world: &mut World, tick: u64, time: f32, kills: u32) -> Self {
        let mut player_query =
            world.query::<(&EntityId, &Position, &Health, &PlayerControl)>();
        let player = player_query
            .iter(world)
            .next()
            .map(|(id, pos, health, control)| PlayerSnapshot {
                id: id.0,
                x: pos.x,
                y: pos.y,
                life: health.current,
                max_life: health.max,
                facing: control.facing,
                status: control.status,
            });

        let mut boss_query = world.query::<(&EntityId, &BossGate, &Health)>();
        let mut bosses: Vec<BossSnapshot> = boss_query
            .iter(world)
            .map(|(id, gate, health)| BossSnapshot {
                id: id.0,
                state: gate.state,
                health: health.current.max(0),
                health_max: health.max,
                indicators: gate.indicators.clone(),
            })
            .collect();
        bosses.sort_by_key(|b| b.id);

        let mut entity_query = world.query_filtered::<(
            &EntityId,
            &Category,
            &Position,
            &Presentation,
            &Lifecycle,
            Option<&ChargerBrain>,
            Option<&GiantBrain>,
            Option<&GuardBrain>,
        ), Without<PlayerControl>>();
        let mut entities: Vec<EntitySnapshot> = entity_query
            .iter(world)
            .map(|(id, category, pos, presentation, lifecycle, charger, giant, guard)| {
                let state = match (charger, giant, guard) {
                    (Some(brain), _, _) => format!("{:?}", brain.state),
                    (_, Some(brain), _) => format!("{:?}", brain.state),
                    (_, _, Some(brain)) => match brain.state {
                        GuardState::Watching => "Watching".to_string(),
                        GuardState::Chasing { .. } => "Chasing".to_string(),
                        GuardState::Returning => "Returning".to_string(),
                    },
                    _ => String::new(),
                };
                EntitySnapshot {
                    id: id.0,
                    category: *category,
                    x: pos.x,
                    y: pos.y,
                    scale: presentation.scale,
                    mirrored: presentation.mirrored,
                    lifecycle: *lifecycle,
                    state,
                }
            })
            .collect();
        entities.sort_by_key(|e| e.id);

        Self {
            tick,
            time,
            kills,
            player,
            bosses,
            entities,
        }
    }

    /// Serialize snapshot to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize snapshot to pretty JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn entity(&self, id: EntityId) -> Option<&EntitySnapshot> {
        self.entities.iter().find(|e| e.id == id.0)
    }

    pub fn count(&self, category: Category) -> usize {
        self.entities.iter().filter(|e| e.category == category).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_json_keeps_entities() {
        let snapshot = Snapshot {
            tick: 42,
            time: 0.7,
            kills: 3,
            player: None,
            bosses: vec![BossSnapshot {
                id: 9,
                state: GateState::Revealed,
                health: 2,
                health_max: 3,
                indicators: vec![true, true, false],
            }],
            entities: vec![EntitySnapshot {
                id: 4,
                category: Category::GiantEnemy,
                x: 1.0,
                y: -2.0,
                scale: 1.5,
                mirrored: true,
                lifecycle: Lifecycle::Alive,
                state: "EnlargedApproaching".to_string(),
            }],
        };

        let json = snapshot.to_json().unwrap();
        let restored: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.tick, 42);
        assert_eq!(restored.kills, 3);
        assert_eq!(restored.bosses[0].indicators, vec![true, true, false]);
        assert_eq!(restored.entities[0].category, Category::GiantEnemy);
        assert_eq!(restored.count(Category::GiantEnemy), 1);
    }
}
