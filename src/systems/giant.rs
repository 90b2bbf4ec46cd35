//! Giant: chases the player, and while the player is down to one life it
//! grows and keeps speeding up. Touching the player ends it either with a
//! final attack or a plain death.

use crate::components::*;
use crate::config::{GiantTuning, SimConfig};
use crate::events::{AnimationCue, EventBuffer, SoundCue};
use crate::scheduler::{Clock, Scheduler, Task};
use crate::systems::destruction::{enter_terminal, TerminalCtx, TerminalRequest};
use crate::systems::movement::{chase_step, face_horizontally};
use bevy_ecs::prelude::*;
use log::{debug, trace};

/// Player health as seen by the giants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthNotice {
    /// Exactly one life left.
    Low,
    Normal,
}

impl HealthNotice {
    pub fn from_life(life: i32) -> Self {
        if life == 1 {
            HealthNotice::Low
        } else {
            HealthNotice::Normal
        }
    }
}

/// Broadcast the player's health to every giant, once per step.
pub fn health_notification_system(
    clock: Res<Clock>,
    config: Res<SimConfig>,
    mut scheduler: ResMut<Scheduler>,
    mut events: ResMut<EventBuffer>,
    players: Query<&Health, With<PlayerControl>>,
    mut giants: Query<(&EntityId, &Lifecycle, &Presentation, &mut GiantBrain, &mut Chaser)>,
) {
    let Some(health) = players.iter().next() else {
        return;
    };
    let notice = HealthNotice::from_life(health.current);
    for (id, lifecycle, presentation, mut brain, mut chaser) in giants.iter_mut() {
        if !lifecycle.is_alive() {
            continue;
        }
        match notice {
            HealthNotice::Low => on_health_low(
                *id,
                &mut brain,
                &config.giant,
                clock.time,
                &mut scheduler,
                &mut events,
            ),
            HealthNotice::Normal => on_health_normal(
                *id,
                &mut brain,
                &mut chaser,
                presentation.scale,
                &mut events,
            ),
        }
    }
}

/// Start the enlarge countdown and the speed ramp. Ignored unless the giant
/// is at normal size.
pub fn on_health_low(
    id: EntityId,
    brain: &mut GiantBrain,
    tuning: &GiantTuning,
    now: f32,
    scheduler: &mut Scheduler,
    events: &mut EventBuffer,
) {
    if brain.attacking || brain.growth != GrowthPhase::Normal {
        return;
    }
    brain.growth = GrowthPhase::PendingEnlarge;
    brain.growth_token = brain.growth_token.wrapping_add(1);
    brain.speed_ramping = true;
    brain.state = GiantState::EnlargedApproaching;
    scheduler.after(
        now,
        id,
        tuning.enlarge_delay,
        Task::GiantEnlarge {
            token: brain.growth_token,
        },
    );
    events.animation(id, AnimationCue::Walk);
    debug!("{id} player low, enlarging");
}

/// Shrink back and restore speed. A pending enlarge is cancelled.
pub fn on_health_normal(
    id: EntityId,
    brain: &mut GiantBrain,
    chaser: &mut Chaser,
    current_scale: f32,
    events: &mut EventBuffer,
) {
    if brain.attacking {
        return;
    }
    brain.growth = match brain.growth {
        GrowthPhase::Normal | GrowthPhase::Shrinking { .. } => return,
        GrowthPhase::PendingEnlarge => GrowthPhase::Normal,
        GrowthPhase::Enlarging { .. } | GrowthPhase::Enlarged => GrowthPhase::Shrinking {
            progress: 0.0,
            from: current_scale,
        },
    };
    brain.growth_token = brain.growth_token.wrapping_add(1);
    brain.speed_ramping = false;
    brain.aggressive = false;
    brain.state = GiantState::Approaching;
    chaser.speed = brain.original_speed;
    events.animation(id, AnimationCue::Idle);
    debug!("{id} player recovered, shrinking");
}

/// `Task::GiantEnlarge` handler. Stale tokens are ignored.
pub fn begin_enlarge(world: &mut World, entity: Entity, id: EntityId, token: u32) {
    let alive = world
        .get::<Lifecycle>(entity)
        .is_some_and(|lifecycle| lifecycle.is_alive());
    let Some(mut brain) = world.get_mut::<GiantBrain>(entity) else {
        return;
    };
    if !alive || brain.growth != GrowthPhase::PendingEnlarge || brain.growth_token != token {
        trace!("{id} stale enlarge ignored");
        return;
    }
    brain.growth = GrowthPhase::Enlarging { progress: 0.0 };
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t.clamp(0.0, 1.0)
}

/// Speed ramp, grow/shrink tween and chasing.
#[allow(clippy::type_complexity)]
pub fn giant_system(
    clock: Res<Clock>,
    config: Res<SimConfig>,
    mut events: ResMut<EventBuffer>,
    mut giants: Query<
        (
            &EntityId,
            &Lifecycle,
            &mut GiantBrain,
            &mut Chaser,
            &mut Position,
            &mut Presentation,
        ),
        Without<PlayerControl>,
    >,
    players: Query<&Position, With<PlayerControl>>,
) {
    let dt = clock.delta;
    let tuning = &config.giant;
    let target = players.iter().next().copied();

    for (id, lifecycle, mut brain, mut chaser, mut pos, mut presentation) in giants.iter_mut() {
        if !lifecycle.is_alive() {
            continue;
        }

        if brain.speed_ramping {
            chaser.speed = (chaser.speed + tuning.speed_increase_rate * dt).min(tuning.max_speed);
        }
        let at_max = chaser.speed >= tuning.max_speed;
        if at_max && !brain.aggressive {
            brain.aggressive = true;
            events.animation(*id, AnimationCue::Jump);
        } else if !at_max && brain.aggressive {
            brain.aggressive = false;
            events.animation(*id, AnimationCue::Walk);
        }

        let enlarged = brain.original_scale * tuning.scale_multiplier;
        match brain.growth {
            GrowthPhase::Enlarging { progress } => {
                let progress = progress + tuning.enlarge_rate * dt;
                presentation.scale = lerp(brain.original_scale, enlarged, progress);
                brain.growth = if progress >= 1.0 {
                    GrowthPhase::Enlarged
                } else {
                    GrowthPhase::Enlarging { progress }
                };
            }
            GrowthPhase::Shrinking { progress, from } => {
                let progress = progress + tuning.shrink_rate * dt;
                presentation.scale = lerp(from, brain.original_scale, progress);
                brain.growth = if progress >= 1.0 {
                    GrowthPhase::Normal
                } else {
                    GrowthPhase::Shrinking { progress, from }
                };
            }
            GrowthPhase::Normal | GrowthPhase::PendingEnlarge | GrowthPhase::Enlarged => {}
        }

        if let Some(target) = target {
            let (dx, _) = chase_step(&mut pos, &target, chaser.speed, chaser.stop_distance, dt);
            face_horizontally(&mut presentation, dx);
        }
    }
}

/// Start a terminal path. A giant that is speeding up answers contact with a
/// final attack; otherwise, or when killed outright, it just dies.
pub fn request_terminal(
    id: EntityId,
    brain: &mut GiantBrain,
    lifecycle: &mut Lifecycle,
    collider: &mut Collider,
    request: TerminalRequest,
    tuning: &GiantTuning,
    ctx: &mut TerminalCtx<'_>,
) -> bool {
    if brain.attacking || !enter_terminal(lifecycle, collider) {
        trace!("{id} refused {request:?}");
        return false;
    }
    brain.attacking = true;
    brain.state = GiantState::ContactResolution;
    let outcome = if brain.speed_ramping && request == TerminalRequest::Contact {
        ContactOutcome::AttackThenDie
    } else {
        ContactOutcome::Die
    };
    brain.outcome = Some(outcome);

    let delay = match outcome {
        ContactOutcome::AttackThenDie => {
            ctx.events.animation(id, AnimationCue::Attack);
            ctx.events.sound(id, SoundCue::GiantAttack);
            tuning.attack_then_die_delay
        }
        ContactOutcome::Die => {
            ctx.events.animation(id, AnimationCue::Die);
            ctx.events.sound(id, SoundCue::GiantDie);
            tuning.die_delay
        }
    };
    ctx.scheduler.after(ctx.now, id, delay, Task::FinishDestruction);
    debug!("{id} resolving {request:?} with {outcome:?}");
    true
}
