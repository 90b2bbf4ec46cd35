//! Player movement, life loss and the death sequence.

use crate::components::*;
use crate::config::SimConfig;
use crate::events::{AnimationCue, EventBuffer, GameEvent, SoundCue};
use crate::scheduler::{Clock, Scheduler, Task};
use bevy_ecs::prelude::*;
use log::{debug, info};

/// Take `amount` lives from an active player. Life never goes below zero.
/// Returns false when the player was not hurt (dying, or already at zero).
pub fn hurt_player(
    id: EntityId,
    health: &mut Health,
    control: &PlayerControl,
    amount: u32,
    events: &mut EventBuffer,
) -> bool {
    if control.status != PlayerStatus::Active || health.current <= 0 || amount == 0 {
        return false;
    }
    health.damage(amount);
    health.current = health.current.max(0);
    events.sound(id, SoundCue::PlayerHurt);
    events.push(GameEvent::PlayerLifeChanged {
        life: health.current,
    });
    debug!("player {id} hurt, {} left", health.current);
    true
}

/// Apply movement input, clamp to the level bounds and update facing.
/// The hardware dial sets the facing whenever there is no movement input.
pub fn player_movement_system(
    clock: Res<Clock>,
    config: Res<SimConfig>,
    mut players: Query<(&mut Position, &mut PlayerControl, &mut Presentation, &Collider)>,
) {
    let tuning = &config.player;
    for (mut pos, mut control, mut presentation, collider) in players.iter_mut() {
        if control.status != PlayerStatus::Active {
            continue;
        }

        let (ix, iy) = control.move_input;
        let len = (ix * ix + iy * iy).sqrt();
        if len > 1.0e-3 {
            // Diagonal input is not faster.
            let scale = len.max(1.0);
            let step = tuning.speed * clock.delta;
            pos.x += ix / scale * step;
            pos.y += iy / scale * step;
            control.facing = Facing::from_vector(ix, iy);
            if ix != 0.0 {
                presentation.mirrored = ix < 0.0;
            }
        } else if control.dial != 0 {
            control.facing = Facing::from_dial(control.dial);
        }

        let r = collider.radius;
        let (min, max) = (tuning.min_bounds, tuning.max_bounds);
        pos.x = pos.x.clamp(min.0 + r, (max.0 - r).max(min.0 + r));
        pos.y = pos.y.clamp(min.1 + r, (max.1 - r).max(min.1 + r));
    }
}

/// Start the death sequence once life reaches zero.
pub fn player_death_system(
    clock: Res<Clock>,
    config: Res<SimConfig>,
    mut scheduler: ResMut<Scheduler>,
    mut events: ResMut<EventBuffer>,
    mut players: Query<(&EntityId, &Health, &mut PlayerControl)>,
) {
    for (id, health, mut control) in players.iter_mut() {
        if control.status != PlayerStatus::Active || health.current > 0 {
            continue;
        }
        control.status = PlayerStatus::Dying;
        control.move_input = (0.0, 0.0);
        events.sound(*id, SoundCue::PlayerDie);
        events.animation(*id, AnimationCue::Die);
        events.push(GameEvent::PlayerDying);
        scheduler.after(clock.time, *id, config.player.die_delay, Task::PlayerGameOver);
        info!("player {id} is dying");
    }
}

/// `Task::PlayerGameOver` handler.
pub fn game_over(world: &mut World, entity: Entity, id: EntityId) {
    {
        let Some(mut control) = world.get_mut::<PlayerControl>(entity) else {
            return;
        };
        if control.status != PlayerStatus::Dying {
            return;
        }
        control.status = PlayerStatus::GameOver;
    }
    world.resource_mut::<EventBuffer>().push(GameEvent::GameOver);
    info!("game over for player {id}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::EntityRegistry;
    use crate::spawn::{init_world, spawn_player};

    fn setup() -> (World, Entity) {
        let mut world = World::new();
        init_world(&mut world, SimConfig::default());
        let id = spawn_player(&mut world, 0.0, 0.0);
        let entity = world.resource::<EntityRegistry>().entity(id).unwrap();
        (world, entity)
    }

    fn tick(world: &mut World, schedule: &mut Schedule, dt: f32) {
        world.resource_mut::<Clock>().advance(dt);
        schedule.run(world);
    }

    #[test]
    fn test_hurt_player_clamps_at_zero() {
        let mut events = EventBuffer::default();
        let mut health = Health::new(1);
        let control = PlayerControl::default();
        assert!(hurt_player(EntityId(1), &mut health, &control, 3, &mut events));
        assert_eq!(health.current, 0);
        assert!(!hurt_player(EntityId(1), &mut health, &control, 1, &mut events));

        let mut health = Health::new(5);
        assert!(hurt_player(EntityId(1), &mut health, &control, u32::MAX, &mut events));
        assert_eq!(health.current, 0);
    }

    #[test]
    fn test_movement_clamped_to_bounds() {
        let (mut world, entity) = setup();
        world.get_mut::<PlayerControl>(entity).unwrap().move_input = (1.0, 0.0);
        let mut schedule = Schedule::default();
        schedule.add_systems(player_movement_system);

        for _ in 0..600 {
            tick(&mut world, &mut schedule, 1.0 / 60.0);
        }
        let pos = world.get::<Position>(entity).unwrap();
        assert!((pos.x - 9.6).abs() < 1.0e-4);
        assert_eq!(world.get::<PlayerControl>(entity).unwrap().facing, Facing::Right);
    }

    #[test]
    fn test_dial_sets_facing_without_input() {
        let (mut world, entity) = setup();
        world.get_mut::<PlayerControl>(entity).unwrap().dial = 6;
        let mut schedule = Schedule::default();
        schedule.add_systems(player_movement_system);
        tick(&mut world, &mut schedule, 1.0 / 60.0);

        assert_eq!(world.get::<PlayerControl>(entity).unwrap().facing, Facing::Left);
        assert_eq!(*world.get::<Position>(entity).unwrap(), Position::new(0.0, 0.0));
    }

    #[test]
    fn test_death_then_game_over() {
        let (mut world, entity) = setup();
        world.get_mut::<Health>(entity).unwrap().current = 0;
        let mut schedule = Schedule::default();
        schedule.add_systems(player_death_system);
        tick(&mut world, &mut schedule, 1.0 / 60.0);

        assert_eq!(
            world.get::<PlayerControl>(entity).unwrap().status,
            PlayerStatus::Dying
        );
        let id = *world.get::<EntityId>(entity).unwrap();
        assert!(world
            .resource::<Scheduler>()
            .has_pending(id, Task::PlayerGameOver));

        game_over(&mut world, entity, id);
        assert_eq!(
            world.get::<PlayerControl>(entity).unwrap().status,
            PlayerStatus::GameOver
        );
        let events = world.resource_mut::<EventBuffer>().drain();
        assert!(events.contains(&GameEvent::PlayerDying));
        assert!(events.contains(&GameEvent::GameOver));
    }
}
