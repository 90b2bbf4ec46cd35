//! Output signals for the render, audio, effect and UI collaborators.
//!
//! The core never waits on any of these. Systems push events into the
//! [`EventBuffer`] resource and the host drains it after each `step`.

use crate::components::EntityId;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnimationCue {
    Idle,
    Walk,
    Attack,
    ChargedAttack,
    /// Giant's aggressive locomotion once it hits max speed.
    Jump,
    Die,
    Appear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundCue {
    PlayerAttack,
    PlayerHurt,
    PlayerDie,
    EnemyDie,
    ItemPickup,
    ItemRejected,
    ChargerCharge,
    ChargerAttack,
    ChargerDie,
    Explosion,
    GiantAttack,
    GiantDie,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EffectKind {
    /// Outline of a charger blast.
    BlastRadius { radius: f32 },
    Explosion,
    /// Lingering debris after a charger blast.
    BlastBurst,
    /// Player attack landing point.
    AttackBurst,
    /// Enemy ran into the player.
    ContactExplosion,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Animation { id: EntityId, cue: AnimationCue },
    Sound { id: EntityId, cue: SoundCue },
    Effect { kind: EffectKind, x: f32, y: f32, lifetime: f32 },
    Removed { id: EntityId },
    KillsChanged { total: u32 },
    PlayerLifeChanged { life: i32 },
    PlayerDying,
    GameOver,
    BossRevealed { id: EntityId },
    BossHealthChanged { id: EntityId, health: i32, max: i32 },
    BossDefeated { id: EntityId },
    /// Forward the attack to the hardware bridge.
    AttackRelayed,
}

/// Events produced since the host last drained them.
#[derive(Resource, Debug, Default)]
pub struct EventBuffer {
    events: Vec<GameEvent>,
}

impl EventBuffer {
    pub fn push(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn animation(&mut self, id: EntityId, cue: AnimationCue) {
        self.push(GameEvent::Animation { id, cue });
    }

    pub fn sound(&mut self, id: EntityId, cue: SoundCue) {
        self.push(GameEvent::Sound { id, cue });
    }

    pub fn effect(&mut self, kind: EffectKind, x: f32, y: f32, lifetime: f32) {
        self.push(GameEvent::Effect { kind, x, y, lifetime });
    }

    pub fn drain(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

/// Process-wide kill counter. Only the attack resolver increments it; it
/// survives level reloads and is reset only by an explicit restart.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct KillCounter {
    total: u32,
}

impl KillCounter {
    pub fn add(&mut self) -> u32 {
        self.total += 1;
        self.total
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn reset(&mut self) {
        self.total = 0;
    }
}
