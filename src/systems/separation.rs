//! Soft separation between ground enemies.
//!
//! Each enemy that may move is pushed away from every other ground enemy
//! closer than `min_distance`. Pushes are applied in ascending id order
//! with positions updated in place, so later enemies see earlier pushes.
//!
//! Neighbours come from a ground-body grid rebuilt each pass. It is kept
//! apart from the shared `SpatialGrid` because enemies on their terminal
//! path have their colliders off but still block others here.

use crate::components::*;
use crate::config::{SeparationTuning, SimConfig};
use crate::scheduler::Clock;
use crate::spatial::{SpatialEntry, SpatialGrid};
use bevy_ecs::prelude::*;

/// One enemy as seen by the separation pass.
#[derive(Debug, Clone, Copy)]
pub struct Body {
    pub entity: Entity,
    pub id: EntityId,
    pub category: Category,
    pub pos: Position,
    /// False for entities that only act as obstacles.
    pub mover: bool,
}

/// Index `bodies` at their current positions.
pub fn index_bodies(index: &mut SpatialGrid, bodies: &[Body]) {
    index.clear();
    for body in bodies {
        index.insert(SpatialEntry {
            entity: body.entity,
            id: body.id,
            x: body.pos.x,
            y: body.pos.y,
            radius: 0.0,
            category: body.category,
        });
    }
}

/// Push movers apart. `bodies` must be sorted by id and `index` built from
/// them with [`index_bodies`]. Pairs at or beyond `min_distance`, or closer
/// than `epsilon`, are left alone.
pub fn separate(bodies: &mut [Body], index: &SpatialGrid, tuning: &SeparationTuning, dt: f32) {
    // Indexed positions predate this pass; twice the range covers the drift.
    let reach = tuning.min_distance * 2.0;
    let mut neighbours: Vec<usize> = Vec::new();

    for i in 0..bodies.len() {
        if !bodies[i].mover {
            continue;
        }
        let origin = bodies[i].pos;
        neighbours.clear();
        neighbours.extend(
            index
                .query_overlapping(origin.x, origin.y, reach, CategoryMask::ORDINARY_ENEMIES)
                .iter()
                .filter_map(|entry| bodies.binary_search_by_key(&entry.id, |b| b.id).ok()),
        );
        neighbours.sort_unstable();

        for &j in &neighbours {
            if i == j {
                continue;
            }
            let me = bodies[i].pos;
            let other = bodies[j].pos;
            let d = me.distance_to(&other);
            if d > tuning.epsilon && d < tuning.min_distance {
                let push = (tuning.min_distance - d) * tuning.strength * dt;
                bodies[i].pos.x += (me.x - other.x) / d * push;
                bodies[i].pos.y += (me.y - other.y) / d * push;
            }
        }
    }
}

#[allow(clippy::type_complexity)]
pub fn separation_system(
    clock: Res<Clock>,
    config: Res<SimConfig>,
    mut index: Local<SpatialGrid>,
    mut query: Query<(Entity, &EntityId, &Category, &Lifecycle, &mut Position, Has<MayOverlap>)>,
) {
    let mut bodies = Vec::new();
    for (entity, id, category, lifecycle, pos, may_overlap) in query.iter() {
        if !category.is_ordinary_enemy() || *lifecycle == Lifecycle::Destroyed {
            continue;
        }
        bodies.push(Body {
            entity,
            id: *id,
            category: *category,
            pos: *pos,
            mover: lifecycle.is_alive() && !may_overlap,
        });
    }
    if bodies.len() < 2 {
        return;
    }
    bodies.sort_by_key(|b| b.id);

    index.cell_size = config.cell_size;
    index_bodies(&mut index, &bodies);
    separate(&mut bodies, &index, &config.separation, clock.delta);

    for body in bodies.iter().filter(|b| b.mover) {
        if let Ok((_, _, _, _, mut pos, _)) = query.get_mut(body.entity) {
            if *pos != body.pos {
                *pos = body.pos;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(id: u32, x: f32, y: f32, mover: bool) -> Body {
        Body {
            entity: Entity::from_raw(id),
            id: EntityId(id),
            category: Category::GruntEnemy,
            pos: Position::new(x, y),
            mover,
        }
    }

    fn run(bodies: &mut [Body], tuning: &SeparationTuning, dt: f32) {
        let mut index = SpatialGrid::new(2.0);
        index_bodies(&mut index, bodies);
        separate(bodies, &index, tuning, dt);
    }

    /// Every body against every other, in id order.
    fn run_all_pairs(bodies: &mut [Body], tuning: &SeparationTuning, dt: f32) {
        for i in 0..bodies.len() {
            if !bodies[i].mover {
                continue;
            }
            for j in 0..bodies.len() {
                if i == j {
                    continue;
                }
                let me = bodies[i].pos;
                let other = bodies[j].pos;
                let d = me.distance_to(&other);
                if d > tuning.epsilon && d < tuning.min_distance {
                    let push = (tuning.min_distance - d) * tuning.strength * dt;
                    bodies[i].pos.x += (me.x - other.x) / d * push;
                    bodies[i].pos.y += (me.y - other.y) / d * push;
                }
            }
        }
    }

    #[test]
    fn test_far_pairs_untouched() {
        let tuning = SeparationTuning::default();
        let mut bodies = vec![body(1, 0.0, 0.0, true), body(2, 0.8, 0.0, true)];
        run(&mut bodies, &tuning, 1.0 / 60.0);
        assert_eq!(bodies[0].pos, Position::new(0.0, 0.0));
        assert_eq!(bodies[1].pos, Position::new(0.8, 0.0));
    }

    #[test]
    fn test_close_pair_pushed_apart() {
        let tuning = SeparationTuning::default();
        let mut bodies = vec![body(1, 0.0, 0.0, true), body(2, 0.4, 0.0, true)];
        run(&mut bodies, &tuning, 0.1);
        // First mover: (0.8 - 0.4) * 2.0 * 0.1 = 0.08 to the left.
        assert!((bodies[0].pos.x + 0.08).abs() < 1.0e-5);
        // Second sees the updated first position (distance 0.48).
        assert!((bodies[1].pos.x - (0.4 + 0.064)).abs() < 1.0e-5);
    }

    #[test]
    fn test_obstacles_do_not_move() {
        let tuning = SeparationTuning::default();
        let mut bodies = vec![body(1, 0.0, 0.0, false), body(2, 0.4, 0.0, true)];
        run(&mut bodies, &tuning, 0.1);
        assert_eq!(bodies[0].pos, Position::new(0.0, 0.0));
        assert!(bodies[1].pos.x > 0.4);
    }

    #[test]
    fn test_coincident_pair_skipped() {
        let tuning = SeparationTuning::default();
        let mut bodies = vec![body(1, 1.0, 1.0, true), body(2, 1.0, 1.0, true)];
        run(&mut bodies, &tuning, 0.1);
        assert_eq!(bodies[0].pos, Position::new(1.0, 1.0));
        assert_eq!(bodies[1].pos, Position::new(1.0, 1.0));
    }

    #[test]
    fn test_system_skips_may_overlap_and_marked() {
        let mut world = World::new();
        world.insert_resource(SimConfig::default());
        let mut clock = Clock::default();
        clock.advance(0.1);
        world.insert_resource(clock);

        let still = world
            .spawn((
                EntityId(1),
                Category::GiantEnemy,
                Lifecycle::Alive,
                Position::new(0.0, 0.0),
                MayOverlap,
            ))
            .id();
        let marked = world
            .spawn((
                EntityId(2),
                Category::ChargerEnemy,
                Lifecycle::MarkedForDestruction,
                Position::new(0.3, 0.0),
            ))
            .id();
        let mover = world
            .spawn((
                EntityId(3),
                Category::GruntEnemy,
                Lifecycle::Alive,
                Position::new(0.0, 0.3),
            ))
            .id();

        let mut schedule = Schedule::default();
        schedule.add_systems(separation_system);
        schedule.run(&mut world);

        assert_eq!(*world.get::<Position>(still).unwrap(), Position::new(0.0, 0.0));
        assert_eq!(*world.get::<Position>(marked).unwrap(), Position::new(0.3, 0.0));
        assert!(world.get::<Position>(mover).unwrap().y > 0.3);
    }

    #[test]
    fn test_grid_neighbours_match_all_pairs() {
        let tuning = SeparationTuning::default();
        let mut bodies: Vec<Body> = (0..120u32)
            .map(|i| {
                let x = (i % 12) as f32 * 0.55 - 3.0 + (i % 5) as f32 * 0.07;
                let y = (i / 12) as f32 * 0.6 - 3.0;
                body(i + 1, x, y, i % 9 != 0)
            })
            .collect();
        let mut expected = bodies.clone();

        run(&mut bodies, &tuning, 1.0 / 60.0);
        run_all_pairs(&mut expected, &tuning, 1.0 / 60.0);

        for (got, want) in bodies.iter().zip(&expected) {
            assert_eq!(got.pos, want.pos, "body {}", got.id);
        }
    }
}
