//! Timer dispatch.
//!
//! Runs as an exclusive system at the top of each step. Due timers are
//! resolved against the registry; timers whose owner is gone are dropped.
//! Each owner runs at most one task per step, and anything else due for
//! it waits until the next step.

use crate::components::EntityId;
use crate::registry::EntityRegistry;
use crate::scheduler::{Clock, Scheduler, Task, Timer};
use crate::systems::{boss_gate, charger, destruction, giant, player};
use bevy_ecs::prelude::*;
use log::trace;
use std::collections::HashSet;

pub fn timer_dispatch_system(world: &mut World) {
    let now = world.resource::<Clock>().time;
    let due = world.resource_mut::<Scheduler>().take_due(now);
    if due.is_empty() {
        return;
    }

    let mut served: HashSet<EntityId> = HashSet::new();
    for timer in due {
        let Some(entity) = world.resource::<EntityRegistry>().entity(timer.owner) else {
            trace!("dropping {:?} for departed {}", timer.task, timer.owner);
            continue;
        };
        if !served.insert(timer.owner) {
            world.resource_mut::<Scheduler>().defer(timer);
            continue;
        }
        if run_task(world, entity, &timer, now) {
            world.resource_mut::<Scheduler>().rearm(timer);
        }
    }
}

/// Returns whether a periodic timer should fire again.
fn run_task(world: &mut World, entity: Entity, timer: &Timer, now: f32) -> bool {
    let id = timer.owner;
    match timer.task {
        Task::ChargerCycle => charger::start_windup(world, entity, id, now),
        Task::ChargerAttackSound => charger::play_attack_sound(world, entity, id),
        Task::ChargerBlastFollowup => charger::blast_followup(world, entity),
        Task::GiantEnlarge { token } => giant::begin_enlarge(world, entity, id, token),
        Task::GatePoll => return boss_gate::poll(world, entity, id, now),
        Task::PlayerGameOver => player::game_over(world, entity, id),
        Task::FinishDestruction => destruction::finish_destruction(world, entity, id),
    }
    timer.period.is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::*;
    use crate::config::SimConfig;
    use crate::spawn::{init_world, spawn_charger};

    fn world() -> World {
        let mut world = World::new();
        init_world(&mut world, SimConfig::default());
        world
    }

    fn advance(world: &mut World, dt: f32) {
        world.resource_mut::<Clock>().advance(dt);
        timer_dispatch_system(world);
    }

    #[test]
    fn test_stale_owner_is_dropped() {
        let mut world = world();
        world
            .resource_mut::<Scheduler>()
            .after(0.0, EntityId(42), 0.1, Task::FinishDestruction);
        advance(&mut world, 0.2);
        assert!(world.resource::<Scheduler>().is_empty());
    }

    #[test]
    fn test_one_task_per_owner_per_step() {
        let mut world = world();
        let charger = spawn_charger(&mut world, 0.0, 0.0, false);
        world
            .resource_mut::<Scheduler>()
            .after(0.0, charger, 0.1, Task::ChargerAttackSound);

        // The sound and the attack cycle (3 s) are both due; the sound
        // fires first and the cycle waits a step.
        advance(&mut world, 3.0);
        assert_eq!(world.resource::<Scheduler>().pending_for(charger), 1);
        assert!(world
            .resource::<Scheduler>()
            .has_pending(charger, Task::ChargerCycle));

        advance(&mut world, 1.0 / 60.0);
        let entity = world.resource::<EntityRegistry>().entity(charger).unwrap();
        assert_eq!(
            world.get::<ChargerBrain>(entity).unwrap().state,
            ChargerState::Windup
        );
    }

    #[test]
    fn test_finish_after_mark() {
        let mut world = world();
        let charger = spawn_charger(&mut world, 0.0, 0.0, false);
        let entity = world.resource::<EntityRegistry>().entity(charger).unwrap();
        *world.get_mut::<Lifecycle>(entity).unwrap() = Lifecycle::MarkedForDestruction;
        world
            .resource_mut::<Scheduler>()
            .after(0.0, charger, 0.5, Task::FinishDestruction);

        advance(&mut world, 0.5);
        assert_eq!(*world.get::<Lifecycle>(entity).unwrap(), Lifecycle::Destroyed);
        assert_eq!(
            world.get::<ChargerBrain>(entity).unwrap().state,
            ChargerState::Destroyed
        );
    }
}
