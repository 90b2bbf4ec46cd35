//! ECS systems for the brawl simulation.
//!
//! Systems contain the game logic that operates on components. They run
//! chained, in this order, once per fixed step (see `api::GameWorld`):
//!
//! **Timers** - deferred and periodic work comes due first:
//! - `timer_dispatch_system` - charger cycles, delayed sounds, gate polls,
//!   game over and terminal-path removals
//!
//! **Movement** - read the grid built at the start of the step:
//! - `separation_system` - soft push between ground enemies
//! - `player_movement_system` - input, bounds and facing
//! - `health_notification_system` - player life fans out to giants
//! - `charger_system`, `giant_system`, `guard_system` - per-kind behaviour
//!
//! **Resolution** - after the grid is refreshed:
//! - `contact_system` - player touching enemies and pickups
//! - `player_attack_system` - one directional hit per step
//! - `player_death_system`
//! - `destruction_sweep_system` - despawns finished entities

pub mod boss_gate;
pub mod charger;
pub mod contact;
pub mod destruction;
pub mod giant;
pub mod guard;
pub mod movement;
pub mod player;
pub mod player_attack;
pub mod separation;
pub mod serialization;
pub mod timers;

pub use charger::charger_system;
pub use contact::{contact_system, ContactTracker};
pub use destruction::destruction_sweep_system;
pub use giant::{giant_system, health_notification_system};
pub use guard::guard_system;
pub use player::{player_death_system, player_movement_system};
pub use player_attack::{player_attack_system, AttackTrigger};
pub use separation::separation_system;
pub use serialization::*;
pub use timers::timer_dispatch_system;
