//! World setup and archetype spawning.
//!
//! Spawning goes through here so every entity is registered with the
//! [`EntityRegistry`] and gets its initial timers.

use crate::components::*;
use crate::config::SimConfig;
use crate::events::{EventBuffer, KillCounter};
use crate::registry::EntityRegistry;
use crate::scheduler::{Clock, Scheduler, Task};
use crate::spatial::SpatialGrid;
use crate::systems::contact::ContactTracker;
use crate::systems::player_attack::AttackTrigger;
use bevy_ecs::prelude::*;
use log::debug;

/// Insert every resource the schedule reads.
pub fn init_world(world: &mut World, config: SimConfig) {
    world.insert_resource(SpatialGrid::new(config.cell_size));
    world.insert_resource(config);
    world.insert_resource(Clock::default());
    world.insert_resource(Scheduler::default());
    world.insert_resource(EntityRegistry::default());
    world.insert_resource(EventBuffer::default());
    world.insert_resource(KillCounter::default());
    world.insert_resource(AttackTrigger::default());
    world.insert_resource(ContactTracker::default());
}

/// Components every registered entity carries.
#[derive(Bundle)]
pub struct BodyBundle {
    pub id: EntityId,
    pub category: Category,
    pub position: Position,
    pub collider: Collider,
    pub lifecycle: Lifecycle,
    pub presentation: Presentation,
}

impl BodyBundle {
    pub fn new(id: EntityId, category: Category, x: f32, y: f32, collider: Collider) -> Self {
        Self {
            id,
            category,
            position: Position::new(x, y),
            collider,
            lifecycle: Lifecycle::Alive,
            presentation: Presentation::default(),
        }
    }
}

fn register(world: &mut World, id: EntityId, entity: Entity, category: Category) -> EntityId {
    world
        .resource_mut::<EntityRegistry>()
        .register(id, entity, category);
    debug!("spawned {category:?} {id}");
    id
}

fn allocate(world: &mut World) -> EntityId {
    world.resource_mut::<EntityRegistry>().allocate()
}

pub fn spawn_player(world: &mut World, x: f32, y: f32) -> EntityId {
    let tuning = world.resource::<SimConfig>().player.clone();
    let id = allocate(world);
    let entity = world
        .spawn((
            BodyBundle::new(id, Category::Player, x, y, Collider::new(tuning.collider_radius)),
            Health::new(tuning.max_life),
            PlayerControl::default(),
        ))
        .id();
    register(world, id, entity, Category::Player)
}

pub fn spawn_charger(world: &mut World, x: f32, y: f32, may_overlap: bool) -> EntityId {
    let tuning = world.resource::<SimConfig>().charger.clone();
    let now = world.resource::<Clock>().time;
    let id = allocate(world);
    let mut entity = world.spawn((
        BodyBundle::new(id, Category::ChargerEnemy, x, y, Collider::new(tuning.collider_radius)),
        ChargerBrain::new(true),
        Chaser {
            speed: tuning.speed,
            stop_distance: tuning.stop_distance,
        },
    ));
    if may_overlap {
        entity.insert(MayOverlap);
    }
    let entity = entity.id();
    world
        .resource_mut::<Scheduler>()
        .after(now, id, tuning.attack_interval, Task::ChargerCycle);
    register(world, id, entity, Category::ChargerEnemy)
}

pub fn spawn_giant(world: &mut World, x: f32, y: f32, may_overlap: bool) -> EntityId {
    let tuning = world.resource::<SimConfig>().giant.clone();
    let id = allocate(world);
    let mut entity = world.spawn((
        BodyBundle::new(id, Category::GiantEnemy, x, y, Collider::new(tuning.collider_radius)),
        GiantBrain::new(tuning.speed, 1.0),
        Chaser {
            speed: tuning.speed,
            stop_distance: tuning.stop_distance,
        },
    ));
    if may_overlap {
        entity.insert(MayOverlap);
    }
    let entity = entity.id();
    register(world, id, entity, Category::GiantEnemy)
}

/// Untyped enemy with no brain (static hazard).
pub fn spawn_grunt(world: &mut World, x: f32, y: f32) -> EntityId {
    let radius = world.resource::<SimConfig>().grunt_radius;
    let id = allocate(world);
    let entity = world
        .spawn(BodyBundle::new(id, Category::GruntEnemy, x, y, Collider::new(radius)))
        .id();
    register(world, id, entity, Category::GruntEnemy)
}

/// Untyped enemy that chases the player when it wanders close.
pub fn spawn_guard(world: &mut World, x: f32, y: f32) -> EntityId {
    let config = world.resource::<SimConfig>();
    let radius = config.grunt_radius;
    let detection_range = config.guard.detection_range;
    let id = allocate(world);
    let entity = world
        .spawn((
            BodyBundle::new(id, Category::GruntEnemy, x, y, Collider::new(radius)),
            GuardBrain {
                state: GuardState::Watching,
                home: Position::new(x, y),
                detection_range,
            },
        ))
        .id();
    register(world, id, entity, Category::GruntEnemy)
}

pub fn spawn_item(world: &mut World, x: f32, y: f32) -> EntityId {
    let radius = world.resource::<SimConfig>().item_radius;
    let id = allocate(world);
    let entity = world
        .spawn((
            BodyBundle::new(id, Category::Item, x, y, Collider::new(radius)),
            HeartPickup,
        ))
        .id();
    register(world, id, entity, Category::Item)
}

/// Hidden boss gate. With `with_charger` it carries a dormant charger brain
/// that wakes up when the gate is revealed.
pub fn spawn_boss_gate(world: &mut World, x: f32, y: f32, with_charger: bool) -> EntityId {
    let config = world.resource::<SimConfig>();
    let gate = config.gate.clone();
    let charger = config.charger.clone();
    let now = world.resource::<Clock>().time;
    let id = allocate(world);
    let mut entity = world.spawn((
        BodyBundle::new(id, Category::BossGate, x, y, Collider::disabled(gate.collider_radius)),
        BossGate::new(gate.max_health),
        Health::new(gate.max_health),
    ));
    if with_charger {
        entity.insert((
            ChargerBrain::new(false),
            Chaser {
                speed: charger.speed,
                stop_distance: charger.stop_distance,
            },
        ));
    }
    let entity = entity.id();
    world
        .resource_mut::<Scheduler>()
        .every(now, id, gate.poll_interval, Task::GatePoll);
    register(world, id, entity, Category::BossGate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> World {
        let mut world = World::new();
        init_world(&mut world, SimConfig::default());
        world
    }

    #[test]
    fn test_spawns_are_registered() {
        let mut world = world();
        let player = spawn_player(&mut world, 0.0, 0.0);
        let charger = spawn_charger(&mut world, 3.0, 0.0, false);
        let gate = spawn_boss_gate(&mut world, 0.0, 5.0, true);

        let registry = world.resource::<EntityRegistry>();
        assert_eq!(registry.category(player), Some(Category::Player));
        assert_eq!(registry.category(charger), Some(Category::ChargerEnemy));
        assert_eq!(registry.category(gate), Some(Category::BossGate));
        assert_eq!(registry.ordinary_enemy_count(), 1);
    }

    #[test]
    fn test_charger_gets_attack_cycle_timer() {
        let mut world = world();
        let charger = spawn_charger(&mut world, 0.0, 0.0, false);
        assert!(world
            .resource::<Scheduler>()
            .has_pending(charger, Task::ChargerCycle));
    }

    #[test]
    fn test_gate_starts_hidden_with_dormant_brain() {
        let mut world = world();
        let gate = spawn_boss_gate(&mut world, 0.0, 0.0, true);
        let entity = world.resource::<EntityRegistry>().entity(gate).unwrap();

        assert!(!world.get::<Collider>(entity).unwrap().enabled);
        assert_eq!(world.get::<BossGate>(entity).unwrap().state, GateState::Hidden);
        assert!(!world.get::<ChargerBrain>(entity).unwrap().active);
        assert!(world.resource::<Scheduler>().has_pending(gate, Task::GatePoll));
        assert!(!world
            .resource::<Scheduler>()
            .has_pending(gate, Task::ChargerCycle));
    }
}
