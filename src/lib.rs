//! Brawl - Simulation Core
//!
//! Enemy behaviour, combat resolution and entity lifecycle for a top-down
//! arcade brawler, stepped at a fixed timestep on `bevy_ecs`.
//!
//! The host drives everything through [`GameWorld`]: load a [`LevelLayout`],
//! feed input, call `step`, then read the [`Snapshot`] and drain the
//! [`GameEvent`]s for sound, animation and effects.

pub mod api;
pub mod components;
pub mod config;
pub mod error;
pub mod events;
pub mod level;
pub mod logging;
pub mod registry;
pub mod scheduler;
pub mod spatial;
pub mod spawn;
pub mod systems;
pub mod world;

pub use api::GameWorld;
pub use components::*;
pub use config::SimConfig;
pub use error::SimError;
pub use events::{AnimationCue, EffectKind, GameEvent, SoundCue};
pub use level::{LevelLayout, SpawnSpec};
pub use spatial::{SpatialEntry, SpatialGrid};
pub use systems::boss_gate::GateDamage;
pub use systems::destruction::TerminalRequest;
pub use systems::player_attack::TriggerSource;
pub use world::Snapshot;
