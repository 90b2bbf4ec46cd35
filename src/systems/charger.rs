//! Charger: walks at the player and periodically winds up an area blast.
//!
//! Cycle: `Approaching` -> (attack interval timer) -> `Windup` (invincible,
//! immobile, blast lands at `impact_delay`) -> `Recovering` -> `Approaching`.
//! Touching the player outside the windup starts `MeleeStrike`; a player
//! attack starts `FinishingBlow`. Both end in removal.

use crate::components::*;
use crate::config::{ChargerTuning, SimConfig};
use crate::events::{AnimationCue, EffectKind, EventBuffer, SoundCue};
use crate::scheduler::{Clock, Scheduler, Task};
use crate::spatial::SpatialGrid;
use crate::systems::destruction::{enter_terminal, TerminalCtx, TerminalRequest};
use crate::systems::movement::{chase_step, face_horizontally};
use crate::systems::player::hurt_player;
use bevy_ecs::prelude::*;
use log::{debug, trace};

/// Per-step charger behaviour: windup progress, blast, recovery and chasing.
#[allow(clippy::type_complexity)]
pub fn charger_system(
    clock: Res<Clock>,
    config: Res<SimConfig>,
    grid: Res<SpatialGrid>,
    mut scheduler: ResMut<Scheduler>,
    mut events: ResMut<EventBuffer>,
    mut chargers: Query<
        (
            &EntityId,
            &Lifecycle,
            &mut ChargerBrain,
            &Chaser,
            &mut Position,
            &mut Presentation,
        ),
        Without<PlayerControl>,
    >,
    mut players: Query<(&EntityId, &Position, &mut Health, &PlayerControl)>,
) {
    let dt = clock.delta;
    let tuning = &config.charger;
    let target = players.iter().next().map(|(_, pos, _, _)| *pos);

    for (id, lifecycle, mut brain, chaser, mut pos, mut presentation) in chargers.iter_mut() {
        if !lifecycle.is_alive() || !brain.active {
            continue;
        }

        match brain.state {
            ChargerState::Windup => {
                brain.windup_elapsed += dt;
                if !brain.impact_fired && brain.windup_elapsed >= tuning.impact_delay {
                    brain.impact_fired = true;
                    brain.impacts += 1;
                    land_blast(*id, &pos, tuning, &grid, &mut players, &mut events);
                    events.effect(
                        EffectKind::BlastRadius {
                            radius: tuning.impact_radius,
                        },
                        pos.x,
                        pos.y,
                        tuning.radius_effect_time,
                    );
                    scheduler.after(
                        clock.time,
                        *id,
                        tuning.radius_effect_time,
                        Task::ChargerBlastFollowup,
                    );
                }
                if brain.windup_elapsed >= tuning.windup_duration {
                    brain.state = ChargerState::Recovering;
                    brain.invincible = false;
                    brain.recovery_elapsed = 0.0;
                    events.animation(*id, AnimationCue::Walk);
                    scheduler.after(clock.time, *id, tuning.attack_interval, Task::ChargerCycle);
                    trace!("{id} windup over");
                }
                continue;
            }
            ChargerState::Recovering => {
                brain.recovery_elapsed += dt;
                if brain.recovery_elapsed >= tuning.recovery_duration {
                    brain.state = ChargerState::Approaching;
                }
            }
            ChargerState::Approaching => {}
            ChargerState::MeleeStrike | ChargerState::FinishingBlow | ChargerState::Destroyed => {
                continue;
            }
        }

        if let Some(target) = target {
            let (dx, _) = chase_step(&mut pos, &target, chaser.speed, chaser.stop_distance, dt);
            face_horizontally(&mut presentation, dx);
        }
    }
}

fn land_blast(
    id: EntityId,
    origin: &Position,
    tuning: &ChargerTuning,
    grid: &SpatialGrid,
    players: &mut Query<(&EntityId, &Position, &mut Health, &PlayerControl)>,
    events: &mut EventBuffer,
) {
    let hits = grid.query_overlapping(origin.x, origin.y, tuning.impact_radius, CategoryMask::PLAYER);
    for hit in hits {
        let Ok((player_id, _, mut health, control)) = players.get_mut(hit.entity) else {
            continue;
        };
        if hurt_player(*player_id, &mut health, control, tuning.impact_damage, events) {
            debug!("{id} blast hit player {player_id}");
        }
    }
}

/// `Task::ChargerCycle` handler: begin a windup.
pub fn start_windup(world: &mut World, entity: Entity, id: EntityId, now: f32) {
    let alive = world
        .get::<Lifecycle>(entity)
        .is_some_and(|lifecycle| lifecycle.is_alive());
    {
        let Some(mut brain) = world.get_mut::<ChargerBrain>(entity) else {
            return;
        };
        if !alive
            || !brain.active
            || brain.attacking
            || brain.state.is_terminal()
            || brain.state == ChargerState::Windup
        {
            trace!("{id} cannot start a windup in {:?}", brain.state);
            return;
        }
        brain.state = ChargerState::Windup;
        brain.invincible = true;
        brain.windup_elapsed = 0.0;
        brain.impact_fired = false;
        brain.cycles += 1;
    }

    let delay = world.resource::<SimConfig>().charger.attack_sound_delay;
    let mut events = world.resource_mut::<EventBuffer>();
    events.animation(id, AnimationCue::ChargedAttack);
    events.sound(id, SoundCue::ChargerCharge);
    world
        .resource_mut::<Scheduler>()
        .after(now, id, delay, Task::ChargerAttackSound);
    debug!("{id} winding up");
}

/// `Task::ChargerAttackSound` handler.
pub fn play_attack_sound(world: &mut World, entity: Entity, id: EntityId) {
    if world
        .get::<Lifecycle>(entity)
        .is_some_and(|lifecycle| lifecycle.is_alive())
    {
        world
            .resource_mut::<EventBuffer>()
            .sound(id, SoundCue::ChargerAttack);
    }
}

/// `Task::ChargerBlastFollowup` handler: the radius marker is gone, show the
/// explosion and the lingering burst.
pub fn blast_followup(world: &mut World, entity: Entity) {
    if !world
        .get::<Lifecycle>(entity)
        .is_some_and(|lifecycle| lifecycle.is_alive())
    {
        return;
    }
    let Some(pos) = world.get::<Position>(entity).copied() else {
        return;
    };
    let id = world.get::<EntityId>(entity).copied();
    let tuning = world.resource::<SimConfig>().charger.clone();
    let mut events = world.resource_mut::<EventBuffer>();
    events.effect(EffectKind::Explosion, pos.x, pos.y, tuning.explosion_effect_time);
    events.effect(EffectKind::BlastBurst, pos.x, pos.y, tuning.burst_effect_time);
    if let Some(id) = id {
        events.sound(id, SoundCue::Explosion);
    }
}

/// Wake a dormant brain and queue its first windup.
pub fn activate(world: &mut World, entity: Entity, id: EntityId, now: f32) {
    {
        let Some(mut brain) = world.get_mut::<ChargerBrain>(entity) else {
            return;
        };
        if brain.active {
            return;
        }
        brain.active = true;
    }
    let interval = world.resource::<SimConfig>().charger.attack_interval;
    world
        .resource_mut::<Scheduler>()
        .after(now, id, interval, Task::ChargerCycle);
    world
        .resource_mut::<EventBuffer>()
        .animation(id, AnimationCue::Walk);
    debug!("{id} charger brain active");
}

/// Start a terminal path. Contact is refused while invincible, attacking or
/// winding up; a finishing blow only needs the charger to be alive.
pub fn request_terminal(
    id: EntityId,
    brain: &mut ChargerBrain,
    lifecycle: &mut Lifecycle,
    collider: &mut Collider,
    request: TerminalRequest,
    tuning: &ChargerTuning,
    ctx: &mut TerminalCtx<'_>,
) -> bool {
    let eligible = match request {
        TerminalRequest::Contact => {
            !(brain.invincible || brain.attacking || brain.state == ChargerState::Windup)
        }
        TerminalRequest::Killed => true,
    };
    if !eligible || !enter_terminal(lifecycle, collider) {
        trace!("{id} refused {request:?} in {:?}", brain.state);
        return false;
    }

    brain.attacking = true;
    brain.invincible = false;
    let delay = match request {
        TerminalRequest::Contact => {
            brain.state = ChargerState::MeleeStrike;
            ctx.events.animation(id, AnimationCue::Attack);
            tuning.strike_delay
        }
        TerminalRequest::Killed => {
            brain.state = ChargerState::FinishingBlow;
            ctx.events.animation(id, AnimationCue::Die);
            tuning.finishing_delay
        }
    };
    ctx.events.sound(id, SoundCue::ChargerDie);
    ctx.events.sound(id, SoundCue::ChargerAttack);
    ctx.scheduler.after(ctx.now, id, delay, Task::FinishDestruction);
    debug!("{id} entering {:?}", brain.state);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::GameEvent;

    fn ctx_parts() -> (Scheduler, EventBuffer) {
        (Scheduler::default(), EventBuffer::default())
    }

    #[test]
    fn test_contact_refused_during_windup() {
        let (mut scheduler, mut events) = ctx_parts();
        let mut ctx = TerminalCtx {
            now: 0.0,
            scheduler: &mut scheduler,
            events: &mut events,
        };
        let mut brain = ChargerBrain::new(true);
        brain.state = ChargerState::Windup;
        brain.invincible = true;
        let mut lifecycle = Lifecycle::Alive;
        let mut collider = Collider::new(0.4);

        let accepted = request_terminal(
            EntityId(1),
            &mut brain,
            &mut lifecycle,
            &mut collider,
            TerminalRequest::Contact,
            &ChargerTuning::default(),
            &mut ctx,
        );
        assert!(!accepted);
        assert_eq!(lifecycle, Lifecycle::Alive);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_finishing_blow_accepted_during_windup() {
        let (mut scheduler, mut events) = ctx_parts();
        let mut ctx = TerminalCtx {
            now: 1.0,
            scheduler: &mut scheduler,
            events: &mut events,
        };
        let mut brain = ChargerBrain::new(true);
        brain.state = ChargerState::Windup;
        brain.invincible = true;
        let mut lifecycle = Lifecycle::Alive;
        let mut collider = Collider::new(0.4);

        let accepted = request_terminal(
            EntityId(1),
            &mut brain,
            &mut lifecycle,
            &mut collider,
            TerminalRequest::Killed,
            &ChargerTuning::default(),
            &mut ctx,
        );
        assert!(accepted);
        assert_eq!(brain.state, ChargerState::FinishingBlow);
        assert_eq!(lifecycle, Lifecycle::MarkedForDestruction);
        assert!(scheduler.has_pending(EntityId(1), Task::FinishDestruction));
        assert!(events.iter().any(|e| *e
            == GameEvent::Animation {
                id: EntityId(1),
                cue: AnimationCue::Die
            }));
    }

    #[test]
    fn test_second_request_is_refused() {
        let (mut scheduler, mut events) = ctx_parts();
        let mut ctx = TerminalCtx {
            now: 0.0,
            scheduler: &mut scheduler,
            events: &mut events,
        };
        let tuning = ChargerTuning::default();
        let mut brain = ChargerBrain::new(true);
        let mut lifecycle = Lifecycle::Alive;
        let mut collider = Collider::new(0.4);

        assert!(request_terminal(
            EntityId(3),
            &mut brain,
            &mut lifecycle,
            &mut collider,
            TerminalRequest::Contact,
            &tuning,
            &mut ctx,
        ));
        assert!(!request_terminal(
            EntityId(3),
            &mut brain,
            &mut lifecycle,
            &mut collider,
            TerminalRequest::Killed,
            &tuning,
            &mut ctx,
        ));
        assert_eq!(brain.state, ChargerState::MeleeStrike);
        assert_eq!(scheduler.pending_for(EntityId(3)), 1);
    }
}
