//! Level layouts loaded from JSON.

use crate::components::EntityId;
use crate::error::SimError;
use crate::spawn;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// One placed entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpawnSpec {
    Player {
        x: f32,
        y: f32,
    },
    Charger {
        x: f32,
        y: f32,
        #[serde(default)]
        may_overlap: bool,
    },
    Giant {
        x: f32,
        y: f32,
        #[serde(default)]
        may_overlap: bool,
    },
    Grunt {
        x: f32,
        y: f32,
    },
    Guard {
        x: f32,
        y: f32,
    },
    Item {
        x: f32,
        y: f32,
    },
    BossGate {
        x: f32,
        y: f32,
        #[serde(default)]
        with_charger: bool,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelLayout {
    #[serde(default)]
    pub name: String,
    pub spawns: Vec<SpawnSpec>,
}

impl LevelLayout {
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let layout: LevelLayout = serde_json::from_str(json)?;
        let players = layout
            .spawns
            .iter()
            .filter(|s| matches!(s, SpawnSpec::Player { .. }))
            .count();
        if players > 1 {
            return Err(SimError::InvalidLevel(format!(
                "level '{}' places {players} players",
                layout.name
            )));
        }
        Ok(layout)
    }

    pub fn to_json(&self) -> Result<String, SimError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Spawn every entry into `world`, in order.
    pub fn spawn_into(&self, world: &mut World) -> Vec<EntityId> {
        self.spawns
            .iter()
            .map(|spec| match *spec {
                SpawnSpec::Player { x, y } => spawn::spawn_player(world, x, y),
                SpawnSpec::Charger { x, y, may_overlap } => {
                    spawn::spawn_charger(world, x, y, may_overlap)
                }
                SpawnSpec::Giant { x, y, may_overlap } => {
                    spawn::spawn_giant(world, x, y, may_overlap)
                }
                SpawnSpec::Grunt { x, y } => spawn::spawn_grunt(world, x, y),
                SpawnSpec::Guard { x, y } => spawn::spawn_guard(world, x, y),
                SpawnSpec::Item { x, y } => spawn::spawn_item(world, x, y),
                SpawnSpec::BossGate { x, y, with_charger } => {
                    spawn::spawn_boss_gate(world, x, y, with_charger)
                }
            })
            .collect()
    }

    /// Small arena used by the demo and benchmarks.
    pub fn arena() -> Self {
        Self {
            name: "arena".to_string(),
            spawns: vec![
                SpawnSpec::Player { x: 0.0, y: 0.0 },
                SpawnSpec::Charger {
                    x: 6.0,
                    y: 0.0,
                    may_overlap: false,
                },
                SpawnSpec::Charger {
                    x: -6.0,
                    y: 2.0,
                    may_overlap: false,
                },
                SpawnSpec::Giant {
                    x: 0.0,
                    y: 7.0,
                    may_overlap: false,
                },
                SpawnSpec::Guard { x: -7.0, y: -7.0 },
                SpawnSpec::Item { x: 3.0, y: -3.0 },
                SpawnSpec::BossGate {
                    x: 0.0,
                    y: -8.0,
                    with_charger: true,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_layout_with_defaults() {
        let json = r#"{
            "name": "yard",
            "spawns": [
                { "kind": "player", "x": 0.0, "y": 0.0 },
                { "kind": "giant", "x": 3.0, "y": 1.0 },
                { "kind": "boss_gate", "x": 0.0, "y": -5.0, "with_charger": true }
            ]
        }"#;
        let layout = LevelLayout::from_json(json).unwrap();
        assert_eq!(layout.spawns.len(), 3);
        assert_eq!(
            layout.spawns[1],
            SpawnSpec::Giant {
                x: 3.0,
                y: 1.0,
                may_overlap: false
            }
        );
    }

    #[test]
    fn test_two_players_rejected() {
        let json = r#"{ "spawns": [
            { "kind": "player", "x": 0.0, "y": 0.0 },
            { "kind": "player", "x": 1.0, "y": 0.0 }
        ] }"#;
        assert!(matches!(
            LevelLayout::from_json(json),
            Err(SimError::InvalidLevel(_))
        ));
    }

    #[test]
    fn test_unknown_kind_is_a_json_error() {
        let json = r#"{ "spawns": [ { "kind": "dragon", "x": 0.0, "y": 0.0 } ] }"#;
        assert!(matches!(LevelLayout::from_json(json), Err(SimError::Json(_))));
    }

    #[test]
    fn test_arena_survives_json() {
        let arena = LevelLayout::arena();
        let json = arena.to_json().unwrap();
        assert_eq!(LevelLayout::from_json(&json).unwrap(), arena);
    }
}
