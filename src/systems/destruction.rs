//! Destruction coordination: every entity takes exactly one terminal path.
//!
//! Enemies get removed through three channels: touching the player, a player
//! attack, and (for the boss gate) running out of health. All of them funnel
//! through [`enter_terminal`] or [`remove_now`], which only succeed from
//! `Lifecycle::Alive`. The delayed half of a terminal path is a
//! `Task::FinishDestruction` timer; [`destruction_sweep_system`] then
//! despawns and unregisters.

use crate::components::*;
use crate::config::SimConfig;
use crate::error::SimError;
use crate::events::{EventBuffer, GameEvent};
use crate::registry::EntityRegistry;
use crate::scheduler::{Clock, Scheduler};
use crate::systems::{charger, giant};
use bevy_ecs::prelude::*;
use log::{debug, trace};

/// Why an entity is being asked to leave the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalRequest {
    /// The enemy touched the player.
    Contact,
    /// The player's attack landed.
    Killed,
}

/// Write access a terminal path needs besides the entity itself.
pub struct TerminalCtx<'a> {
    pub now: f32,
    pub scheduler: &'a mut Scheduler,
    pub events: &'a mut EventBuffer,
}

/// Borrowed components of the entity a request is aimed at.
pub struct TerminalTarget<'a> {
    pub id: EntityId,
    pub category: Category,
    pub lifecycle: &'a mut Lifecycle,
    pub collider: &'a mut Collider,
    pub charger: Option<&'a mut ChargerBrain>,
    pub giant: Option<&'a mut GiantBrain>,
}

/// Mark for destruction and drop out of overlap queries.
/// Fails if the entity already is on a terminal path.
pub fn enter_terminal(lifecycle: &mut Lifecycle, collider: &mut Collider) -> bool {
    if !lifecycle.mark() {
        return false;
    }
    collider.enabled = false;
    true
}

/// Terminal path with no delay (grunts, consumed items).
pub fn remove_now(id: EntityId, lifecycle: &mut Lifecycle, collider: &mut Collider) -> bool {
    if !lifecycle.is_alive() {
        trace!("{id} already leaving, ignoring removal");
        return false;
    }
    *lifecycle = Lifecycle::Destroyed;
    collider.enabled = false;
    true
}

/// Route a request to the archetype that owns the target.
pub fn dispatch(
    target: TerminalTarget<'_>,
    request: TerminalRequest,
    config: &SimConfig,
    ctx: &mut TerminalCtx<'_>,
) -> bool {
    let TerminalTarget {
        id,
        category,
        lifecycle,
        collider,
        charger,
        giant,
    } = target;

    match (category, charger, giant) {
        (Category::ChargerEnemy, Some(brain), _) => {
            charger::request_terminal(id, brain, lifecycle, collider, request, &config.charger, ctx)
        }
        (Category::GiantEnemy, _, Some(brain)) => {
            giant::request_terminal(id, brain, lifecycle, collider, request, &config.giant, ctx)
        }
        (Category::ChargerEnemy | Category::GiantEnemy | Category::GruntEnemy | Category::Item, _, _) => {
            remove_now(id, lifecycle, collider)
        }
        (Category::Player | Category::BossGate, _, _) => false,
    }
}

/// Ask `id` to start its terminal path from outside the schedule.
/// Returns whether the request was accepted.
pub fn request_terminal(
    world: &mut World,
    id: EntityId,
    request: TerminalRequest,
) -> Result<bool, SimError> {
    let registry = world.resource::<EntityRegistry>();
    let entity = registry.entity(id).ok_or(SimError::UnknownEntity(id))?;
    let category = registry.category(id).ok_or(SimError::UnknownEntity(id))?;
    if !matches!(
        category,
        Category::ChargerEnemy | Category::GiantEnemy | Category::GruntEnemy
    ) {
        return Err(SimError::WrongCategory {
            id,
            actual: category,
            expected: "ordinary enemy",
        });
    }

    let config = world.resource::<SimConfig>().clone();
    let now = world.resource::<Clock>().time;
    world.resource_scope(|world, mut scheduler: Mut<Scheduler>| {
        world.resource_scope(|world, mut events: Mut<EventBuffer>| -> Result<bool, SimError> {
            let mut query = world.query::<(
                &mut Lifecycle,
                &mut Collider,
                Option<&mut ChargerBrain>,
                Option<&mut GiantBrain>,
            )>();
            let (mut lifecycle, mut collider, mut charger, mut giant) = query
                .get_mut(world, entity)
                .map_err(|_| SimError::UnknownEntity(id))?;
            let mut ctx = TerminalCtx {
                now,
                scheduler: &mut *scheduler,
                events: &mut *events,
            };
            let target = TerminalTarget {
                id,
                category,
                lifecycle: &mut *lifecycle,
                collider: &mut *collider,
                charger: charger.as_deref_mut(),
                giant: giant.as_deref_mut(),
            };
            Ok(dispatch(target, request, &config, &mut ctx))
        })
    })
}

/// `Task::FinishDestruction` handler.
pub fn finish_destruction(world: &mut World, entity: Entity, id: EntityId) {
    {
        let Some(mut lifecycle) = world.get_mut::<Lifecycle>(entity) else {
            return;
        };
        if *lifecycle != Lifecycle::MarkedForDestruction {
            trace!("{id} not marked, skipping finish");
            return;
        }
        *lifecycle = Lifecycle::Destroyed;
    }
    if let Some(mut brain) = world.get_mut::<ChargerBrain>(entity) {
        brain.state = ChargerState::Destroyed;
        brain.attacking = false;
    }
    if let Some(mut brain) = world.get_mut::<GiantBrain>(entity) {
        brain.state = GiantState::Destroyed;
    }
    debug!("{id} destroyed");
}

/// Despawn everything that reached `Destroyed` this step.
pub fn destruction_sweep_system(world: &mut World) {
    let mut query = world.query::<(Entity, &EntityId, &Lifecycle)>();
    let mut doomed: Vec<(Entity, EntityId)> = query
        .iter(world)
        .filter(|(_, _, lifecycle)| **lifecycle == Lifecycle::Destroyed)
        .map(|(entity, id, _)| (entity, *id))
        .collect();
    if doomed.is_empty() {
        return;
    }
    doomed.sort_by_key(|(_, id)| *id);

    for (entity, id) in doomed {
        world.despawn(entity);
        world.resource_mut::<EntityRegistry>().unregister(id);
        world
            .resource_mut::<EventBuffer>()
            .push(GameEvent::Removed { id });
        debug!("removed {id}");
    }
}
