//! Boss gate: hidden until every ordinary enemy is gone, then takes a fixed
//! number of hits.

use crate::components::*;
use crate::config::{BossGateTuning, SimConfig};
use crate::error::SimError;
use crate::events::{AnimationCue, EventBuffer, GameEvent};
use crate::registry::EntityRegistry;
use crate::scheduler::{Clock, Scheduler, Task};
use crate::systems::charger;
use crate::systems::destruction::{enter_terminal, TerminalCtx};
use bevy_ecs::prelude::*;
use log::{debug, info, trace};

/// Result of a hit on a revealed gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDamage {
    Damaged { remaining: i32 },
    Defeated,
}

/// `Task::GatePoll` handler. Returns whether to keep polling.
pub fn poll(world: &mut World, entity: Entity, id: EntityId, now: f32) -> bool {
    let Some(state) = world.get::<BossGate>(entity).map(|gate| gate.state) else {
        return false;
    };
    if state != GateState::Hidden {
        return false;
    }
    let remaining = world.resource::<EntityRegistry>().ordinary_enemy_count();
    if remaining > 0 {
        trace!("{id} waiting on {remaining} enemies");
        return true;
    }
    reveal(world, entity, id, now);
    false
}

fn reveal(world: &mut World, entity: Entity, id: EntityId, now: f32) {
    if let Some(mut gate) = world.get_mut::<BossGate>(entity) {
        gate.state = GateState::Revealed;
    }
    if let Some(mut collider) = world.get_mut::<Collider>(entity) {
        collider.enabled = true;
    }
    {
        let mut events = world.resource_mut::<EventBuffer>();
        events.animation(id, AnimationCue::Appear);
        events.push(GameEvent::BossRevealed { id });
    }
    charger::activate(world, entity, id, now);
    info!("boss gate {id} revealed");
}

/// Take `amount` health from a revealed gate. At zero the gate is marked
/// and removed after `removal_delay`.
#[allow(clippy::too_many_arguments)]
pub fn apply_damage(
    id: EntityId,
    gate: &mut BossGate,
    health: &mut Health,
    lifecycle: &mut Lifecycle,
    collider: &mut Collider,
    amount: u32,
    tuning: &BossGateTuning,
    ctx: &mut TerminalCtx<'_>,
) -> Result<GateDamage, SimError> {
    if gate.state != GateState::Revealed || !lifecycle.is_alive() {
        return Err(SimError::GateNotRevealed(id));
    }
    health.damage(amount);
    gate.sync_indicators(health.current.max(0));
    ctx.events.push(GameEvent::BossHealthChanged {
        id,
        health: health.current.max(0),
        max: health.max,
    });

    if health.current > 0 {
        debug!("{id} took {amount}, {} left", health.current);
        return Ok(GateDamage::Damaged {
            remaining: health.current,
        });
    }

    gate.state = GateState::Destroyed;
    enter_terminal(lifecycle, collider);
    ctx.events.animation(id, AnimationCue::Die);
    ctx.events.push(GameEvent::BossDefeated { id });
    ctx.scheduler
        .after(ctx.now, id, tuning.removal_delay, Task::FinishDestruction);
    info!("boss gate {id} defeated");
    Ok(GateDamage::Defeated)
}

/// Damage a gate by id from outside the schedule.
pub fn damage_gate(world: &mut World, id: EntityId, amount: u32) -> Result<GateDamage, SimError> {
    let registry = world.resource::<EntityRegistry>();
    let entity = registry.entity(id).ok_or(SimError::UnknownEntity(id))?;
    match registry.category(id) {
        Some(Category::BossGate) => {}
        Some(actual) => {
            return Err(SimError::WrongCategory {
                id,
                actual,
                expected: "boss gate",
            })
        }
        None => return Err(SimError::UnknownEntity(id)),
    }

    let tuning = world.resource::<SimConfig>().gate.clone();
    let now = world.resource::<Clock>().time;
    world.resource_scope(|world, mut scheduler: Mut<Scheduler>| {
        world.resource_scope(
            |world, mut events: Mut<EventBuffer>| -> Result<GateDamage, SimError> {
                let mut query =
                    world.query::<(&mut BossGate, &mut Health, &mut Lifecycle, &mut Collider)>();
                let (mut gate, mut health, mut lifecycle, mut collider) = query
                    .get_mut(world, entity)
                    .map_err(|_| SimError::UnknownEntity(id))?;
                let mut ctx = TerminalCtx {
                    now,
                    scheduler: &mut *scheduler,
                    events: &mut *events,
                };
                apply_damage(
                    id,
                    &mut gate,
                    &mut health,
                    &mut lifecycle,
                    &mut collider,
                    amount,
                    &tuning,
                    &mut ctx,
                )
            },
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spawn::{init_world, spawn_boss_gate, spawn_grunt};

    fn setup(with_charger: bool) -> (World, EntityId, Entity) {
        let mut world = World::new();
        init_world(&mut world, SimConfig::default());
        let gate = spawn_boss_gate(&mut world, 0.0, 0.0, with_charger);
        let entity = world.resource::<EntityRegistry>().entity(gate).unwrap();
        (world, gate, entity)
    }

    #[test]
    fn test_stays_hidden_while_enemies_remain() {
        let (mut world, gate, entity) = setup(false);
        spawn_grunt(&mut world, 5.0, 5.0);

        assert!(poll(&mut world, entity, gate, 1.0));
        assert_eq!(world.get::<BossGate>(entity).unwrap().state, GateState::Hidden);
        assert!(matches!(
            damage_gate(&mut world, gate, 1),
            Err(SimError::GateNotRevealed(_))
        ));
    }

    #[test]
    fn test_reveal_wakes_attached_charger() {
        let (mut world, gate, entity) = setup(true);

        assert!(!poll(&mut world, entity, gate, 1.0));
        assert_eq!(world.get::<BossGate>(entity).unwrap().state, GateState::Revealed);
        assert!(world.get::<Collider>(entity).unwrap().enabled);
        assert!(world.get::<ChargerBrain>(entity).unwrap().active);
        assert!(world
            .resource::<Scheduler>()
            .has_pending(gate, Task::ChargerCycle));
        let events = world.resource_mut::<EventBuffer>().drain();
        assert!(events.contains(&GameEvent::BossRevealed { id: gate }));
    }

    #[test]
    fn test_marked_enemies_still_hold_the_gate() {
        let (mut world, gate, entity) = setup(false);
        let grunt = spawn_grunt(&mut world, 5.0, 5.0);
        let grunt_entity = world.resource::<EntityRegistry>().entity(grunt).unwrap();
        *world.get_mut::<Lifecycle>(grunt_entity).unwrap() = Lifecycle::MarkedForDestruction;

        assert!(poll(&mut world, entity, gate, 1.0));
    }

    #[test]
    fn test_three_hits_defeat_the_gate() {
        let (mut world, gate, entity) = setup(false);
        poll(&mut world, entity, gate, 1.0);

        assert_eq!(
            damage_gate(&mut world, gate, 1).unwrap(),
            GateDamage::Damaged { remaining: 2 }
        );
        assert_eq!(world.get::<BossGate>(entity).unwrap().lit_indicators(), 2);
        damage_gate(&mut world, gate, 1).unwrap();
        assert_eq!(damage_gate(&mut world, gate, 1).unwrap(), GateDamage::Defeated);

        assert_eq!(world.get::<BossGate>(entity).unwrap().lit_indicators(), 0);
        assert_eq!(
            *world.get::<Lifecycle>(entity).unwrap(),
            Lifecycle::MarkedForDestruction
        );
        assert!(world
            .resource::<Scheduler>()
            .has_pending(gate, Task::FinishDestruction));
        // Further hits land on a gate that is already leaving.
        assert!(damage_gate(&mut world, gate, 1).is_err());
    }

    #[test]
    fn test_oversized_hit_still_defeats() {
        let (mut world, gate, entity) = setup(false);
        poll(&mut world, entity, gate, 1.0);

        assert_eq!(
            damage_gate(&mut world, gate, 3_000_000_000).unwrap(),
            GateDamage::Defeated
        );
        let health = world.get::<Health>(entity).unwrap();
        assert!(health.current <= 0);
        assert_eq!(
            *world.get::<Lifecycle>(entity).unwrap(),
            Lifecycle::MarkedForDestruction
        );
        let events = world.resource_mut::<EventBuffer>().drain();
        assert!(events.contains(&GameEvent::BossHealthChanged {
            id: gate,
            health: 0,
            max: 3
        }));
    }

    #[test]
    fn test_wrong_category_is_rejected() {
        let (mut world, _, _) = setup(false);
        let grunt = spawn_grunt(&mut world, 1.0, 1.0);
        assert!(matches!(
            damage_gate(&mut world, grunt, 1),
            Err(SimError::WrongCategory { .. })
        ));
    }
}
