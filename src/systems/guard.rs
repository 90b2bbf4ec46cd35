//! Guard: stands at its post, chases the player for a while once they come
//! close, then walks back at reduced speed.

use crate::components::*;
use crate::config::SimConfig;
use crate::scheduler::Clock;
use crate::systems::movement::{face_horizontally, move_towards};
use bevy_ecs::prelude::*;
use log::trace;

pub fn guard_system(
    clock: Res<Clock>,
    config: Res<SimConfig>,
    mut guards: Query<
        (&EntityId, &Lifecycle, &mut GuardBrain, &mut Position, &mut Presentation),
        Without<PlayerControl>,
    >,
    players: Query<&Position, With<PlayerControl>>,
) {
    let dt = clock.delta;
    let tuning = &config.guard;
    let target = players.iter().next().copied();

    for (id, lifecycle, mut brain, mut pos, mut presentation) in guards.iter_mut() {
        if !lifecycle.is_alive() {
            continue;
        }
        let before = pos.x;

        match brain.state {
            GuardState::Watching => {
                if let Some(target) = target {
                    if pos.distance_to(&target) <= brain.detection_range {
                        brain.state = GuardState::Chasing {
                            remaining: tuning.chase_duration,
                        };
                        brain.detection_range =
                            tuning.detection_range * tuning.reduced_detection_multiplier;
                        trace!("{id} spotted the player");
                    }
                }
            }
            GuardState::Chasing { remaining } => {
                if let Some(target) = target {
                    move_towards(&mut pos, &target, tuning.speed * dt);
                }
                let remaining = remaining - dt;
                if remaining > 0.0 {
                    brain.state = GuardState::Chasing { remaining };
                } else {
                    brain.state = GuardState::Returning;
                }
            }
            GuardState::Returning => {
                let home = brain.home;
                move_towards(&mut pos, &home, tuning.speed * tuning.return_speed_factor * dt);
                if pos.distance_to(&home) <= tuning.home_tolerance {
                    brain.state = GuardState::Watching;
                    brain.detection_range = tuning.detection_range;
                    trace!("{id} back at post");
                }
            }
        }

        face_horizontally(&mut presentation, pos.x - before);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::EntityRegistry;
    use crate::spawn::{init_world, spawn_guard, spawn_player};

    fn tick(world: &mut World, schedule: &mut Schedule, seconds: f32) {
        let steps = (seconds * 60.0).round() as usize;
        for _ in 0..steps {
            world.resource_mut::<Clock>().advance(1.0 / 60.0);
            schedule.run(world);
        }
    }

    #[test]
    fn test_guard_chases_then_returns_home() {
        let mut world = World::new();
        init_world(&mut world, SimConfig::default());
        let player = spawn_player(&mut world, 4.0, 0.0);
        let guard = spawn_guard(&mut world, 0.0, 0.0);
        let registry = world.resource::<EntityRegistry>();
        let player = registry.entity(player).unwrap();
        let guard = registry.entity(guard).unwrap();

        let mut schedule = Schedule::default();
        schedule.add_systems(guard_system);

        tick(&mut world, &mut schedule, 0.5);
        let brain = *world.get::<GuardBrain>(guard).unwrap();
        assert!(matches!(brain.state, GuardState::Chasing { .. }));
        assert_eq!(brain.detection_range, 2.5);
        assert!(world.get::<Position>(guard).unwrap().x > 0.0);

        // Player runs off; the chase times out and the guard heads home.
        world.get_mut::<Position>(player).unwrap().x = 9.0;
        tick(&mut world, &mut schedule, 10.0);
        let brain = *world.get::<GuardBrain>(guard).unwrap();
        assert_eq!(brain.state, GuardState::Returning);
        assert_eq!(brain.detection_range, 2.5);

        tick(&mut world, &mut schedule, 10.0);
        let brain = *world.get::<GuardBrain>(guard).unwrap();
        assert_eq!(brain.state, GuardState::Watching);
        assert_eq!(brain.detection_range, 5.0);
        let home = Position::new(0.0, 0.0);
        assert!(world.get::<Position>(guard).unwrap().distance_to(&home) <= 0.05);
    }
}
