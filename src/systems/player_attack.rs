//! Player attack: trigger debounce, hit-box placement and hit resolution.
//!
//! The attack can be triggered from three inputs (keyboard, a hardware
//! sensor polled as a level, and the serial bridge). At most one attack
//! resolves per step no matter how many sources fire.

use crate::components::*;
use crate::config::SimConfig;
use crate::events::{AnimationCue, EffectKind, EventBuffer, GameEvent, KillCounter, SoundCue};
use crate::scheduler::{Clock, Scheduler};
use crate::spatial::SpatialGrid;
use crate::systems::boss_gate;
use crate::systems::destruction::{dispatch, TerminalCtx, TerminalRequest, TerminalTarget};
use bevy_ecs::prelude::*;
use log::{debug, trace};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerSource {
    Keyboard,
    Sensor,
    SerialBridge,
}

impl TriggerSource {
    fn index(self) -> usize {
        match self {
            TriggerSource::Keyboard => 0,
            TriggerSource::Sensor => 1,
            TriggerSource::SerialBridge => 2,
        }
    }
}

/// Pending attack request plus the last seen level of each source.
#[derive(Resource, Debug, Default)]
pub struct AttackTrigger {
    pending: Option<TriggerSource>,
    levels: [bool; 3],
}

impl AttackTrigger {
    /// Edge-triggered press. Extra presses before the next step are merged.
    pub fn press(&mut self, source: TriggerSource) {
        if self.pending.is_none() {
            self.pending = Some(source);
        }
    }

    /// Level input (e.g. a pressure sensor). Fires on the rising edge only.
    pub fn set_level(&mut self, source: TriggerSource, high: bool) {
        let slot = &mut self.levels[source.index()];
        let rising = high && !*slot;
        *slot = high;
        if rising {
            self.press(source);
        }
    }

    pub fn consume(&mut self) -> Option<TriggerSource> {
        self.pending.take()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Resolve a pending attack against everything in the hit-box.
#[allow(clippy::too_many_arguments, clippy::type_complexity)]
pub fn player_attack_system(
    clock: Res<Clock>,
    config: Res<SimConfig>,
    grid: Res<SpatialGrid>,
    mut trigger: ResMut<AttackTrigger>,
    mut kills: ResMut<KillCounter>,
    mut scheduler: ResMut<Scheduler>,
    mut events: ResMut<EventBuffer>,
    players: Query<(&EntityId, &Position, &PlayerControl)>,
    mut targets: Query<
        (
            &Category,
            &mut Lifecycle,
            &mut Collider,
            Option<&mut ChargerBrain>,
            Option<&mut GiantBrain>,
            Option<&mut BossGate>,
            Option<&mut Health>,
        ),
        Without<PlayerControl>,
    >,
) {
    let Some(source) = trigger.consume() else {
        return;
    };
    let Some((player_id, player_pos, control)) = players.iter().next() else {
        return;
    };
    if control.status != PlayerStatus::Active {
        trace!("attack from {source:?} ignored, player not active");
        return;
    }

    events.sound(*player_id, SoundCue::PlayerAttack);
    events.animation(*player_id, AnimationCue::Attack);
    events.push(GameEvent::AttackRelayed);

    let Some((dx, dy)) = control.facing.unit_vector() else {
        return;
    };
    let tuning = &config.player;
    let anchor = player_pos.offset(dx * tuning.attack_range, dy * tuning.attack_range);
    events.effect(
        EffectKind::AttackBurst,
        anchor.x,
        anchor.y,
        tuning.attack_effect_time,
    );

    let hits = grid.query_overlapping(
        anchor.x,
        anchor.y,
        tuning.hitbox_radius,
        CategoryMask::ENEMIES,
    );
    let mut ctx = TerminalCtx {
        now: clock.time,
        scheduler: &mut *scheduler,
        events: &mut *events,
    };
    for hit in hits {
        let Ok((category, mut lifecycle, mut collider, mut charger, mut giant, gate, health)) =
            targets.get_mut(hit.entity)
        else {
            continue;
        };

        let accepted = match (*category, gate, health) {
            (Category::BossGate, Some(mut gate), Some(mut health)) => boss_gate::apply_damage(
                hit.id,
                &mut gate,
                &mut health,
                &mut lifecycle,
                &mut collider,
                config.gate.damage_per_hit,
                &config.gate,
                &mut ctx,
            )
            .is_ok(),
            (Category::BossGate, _, _) => false,
            (category, _, _) => dispatch(
                TerminalTarget {
                    id: hit.id,
                    category,
                    lifecycle: &mut lifecycle,
                    collider: &mut collider,
                    charger: charger.as_deref_mut(),
                    giant: giant.as_deref_mut(),
                },
                TerminalRequest::Killed,
                &config,
                &mut ctx,
            ),
        };

        if accepted {
            let total = kills.add();
            ctx.events.sound(hit.id, SoundCue::EnemyDie);
            ctx.events.push(GameEvent::KillsChanged { total });
            debug!("attack from {source:?} hit {} ({total} kills)", hit.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presses_merge_until_consumed() {
        let mut trigger = AttackTrigger::default();
        trigger.press(TriggerSource::Keyboard);
        trigger.press(TriggerSource::SerialBridge);
        assert_eq!(trigger.consume(), Some(TriggerSource::Keyboard));
        assert_eq!(trigger.consume(), None);
    }

    #[test]
    fn test_level_fires_on_rising_edge_only() {
        let mut trigger = AttackTrigger::default();
        trigger.set_level(TriggerSource::Sensor, true);
        assert!(trigger.is_pending());
        trigger.consume();

        // Held high: no new attack.
        trigger.set_level(TriggerSource::Sensor, true);
        assert!(!trigger.is_pending());

        trigger.set_level(TriggerSource::Sensor, false);
        trigger.set_level(TriggerSource::Sensor, true);
        assert_eq!(trigger.consume(), Some(TriggerSource::Sensor));
    }
}
