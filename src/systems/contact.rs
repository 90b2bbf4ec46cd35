//! Player contact: enemies and pickups that start touching the player.
//!
//! Only the entering edge of an overlap counts, so an enemy resting against
//! the player costs one life, not one per step.

use crate::components::*;
use crate::config::SimConfig;
use crate::events::{EffectKind, EventBuffer, GameEvent, SoundCue};
use crate::scheduler::{Clock, Scheduler};
use crate::spatial::SpatialGrid;
use crate::systems::destruction::{dispatch, remove_now, TerminalCtx, TerminalRequest, TerminalTarget};
use crate::systems::player::hurt_player;
use bevy_ecs::prelude::*;
use log::debug;
use std::collections::BTreeSet;

/// Ids overlapping the player at the end of the previous step.
#[derive(Resource, Debug, Default)]
pub struct ContactTracker {
    touching: BTreeSet<EntityId>,
}

impl ContactTracker {
    pub fn is_touching(&self, id: EntityId) -> bool {
        self.touching.contains(&id)
    }

    pub fn clear(&mut self) {
        self.touching.clear();
    }
}

#[allow(clippy::too_many_arguments, clippy::type_complexity)]
pub fn contact_system(
    clock: Res<Clock>,
    config: Res<SimConfig>,
    grid: Res<SpatialGrid>,
    mut tracker: ResMut<ContactTracker>,
    mut scheduler: ResMut<Scheduler>,
    mut events: ResMut<EventBuffer>,
    mut players: Query<(&EntityId, &Position, &Collider, &mut Health, &PlayerControl)>,
    mut others: Query<
        (
            &Category,
            &Position,
            &mut Lifecycle,
            &mut Collider,
            Option<&mut ChargerBrain>,
            Option<&mut GiantBrain>,
        ),
        Without<PlayerControl>,
    >,
) {
    let Some((player_id, player_pos, player_collider, mut health, control)) =
        players.iter_mut().next()
    else {
        tracker.clear();
        return;
    };

    let mask = CategoryMask::ORDINARY_ENEMIES.union(CategoryMask::of(Category::Item));
    let overlapping =
        grid.query_overlapping(player_pos.x, player_pos.y, player_collider.radius, mask);
    let now_touching: BTreeSet<EntityId> = overlapping.iter().map(|e| e.id).collect();

    let mut ctx = TerminalCtx {
        now: clock.time,
        scheduler: &mut *scheduler,
        events: &mut *events,
    };
    for hit in &overlapping {
        if tracker.is_touching(hit.id) || control.status != PlayerStatus::Active {
            continue;
        }
        let Ok((category, pos, mut lifecycle, mut collider, mut charger, mut giant)) =
            others.get_mut(hit.entity)
        else {
            continue;
        };

        if *category == Category::Item {
            if !remove_now(hit.id, &mut lifecycle, &mut collider) {
                continue;
            }
            if health.heal(1) {
                ctx.events.sound(hit.id, SoundCue::ItemPickup);
                ctx.events.push(GameEvent::PlayerLifeChanged {
                    life: health.current,
                });
                debug!("{player_id} picked up {}", hit.id);
            } else {
                ctx.events.sound(hit.id, SoundCue::ItemRejected);
            }
            continue;
        }

        hurt_player(*player_id, &mut health, control, 1, ctx.events);
        ctx.events.effect(
            EffectKind::ContactExplosion,
            pos.x,
            pos.y,
            config.player.contact_effect_time,
        );
        dispatch(
            TerminalTarget {
                id: hit.id,
                category: *category,
                lifecycle: &mut lifecycle,
                collider: &mut collider,
                charger: charger.as_deref_mut(),
                giant: giant.as_deref_mut(),
            },
            TerminalRequest::Contact,
            &config,
            &mut ctx,
        );
    }

    tracker.touching = now_touching;
}
