//! Spatial partitioning for overlap queries.
//!
//! Backs the player's attack hit-box, the charger's blast, contact
//! detection and enemy separation. Provides O(1) cell lookup and O(k)
//! queries where k is the number of colliders in nearby cells.

use crate::components::*;
use bevy_ecs::prelude::*;
use std::collections::HashMap;

/// Grid-based spatial partitioning structure.
///
/// Divides the world into cells and tracks which colliders sit in each cell.
/// Rebuilt from scratch each step, so it always reflects positions as of the
/// last rebuild.
#[derive(Resource, Debug)]
pub struct SpatialGrid {
    /// Cell size in world units.
    pub cell_size: f32,
    cells: HashMap<(i32, i32), Vec<SpatialEntry>>,
    /// Largest collider radius inserted since the last clear.
    max_radius: f32,
    len: usize,
}

/// Entry in a spatial cell.
#[derive(Debug, Clone, Copy)]
pub struct SpatialEntry {
    pub entity: Entity,
    pub id: EntityId,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub category: Category,
}

impl SpatialEntry {
    fn distance_to(&self, x: f32, y: f32) -> f32 {
        ((self.x - x).powi(2) + (self.y - y).powi(2)).sqrt()
    }
}

impl Default for SpatialGrid {
    fn default() -> Self {
        Self::new(2.0)
    }
}

impl SpatialGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            cells: HashMap::new(),
            max_radius: 0.0,
            len: 0,
        }
    }

    /// Convert world coordinates to cell coordinates.
    #[inline]
    pub fn world_to_cell(&self, x: f32, y: f32) -> (i32, i32) {
        (
            (x / self.cell_size).floor() as i32,
            (y / self.cell_size).floor() as i32,
        )
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.max_radius = 0.0;
        self.len = 0;
    }

    pub fn insert(&mut self, entry: SpatialEntry) {
        let cell = self.world_to_cell(entry.x, entry.y);
        self.max_radius = self.max_radius.max(entry.radius);
        self.cells.entry(cell).or_default().push(entry);
        self.len += 1;
    }

    /// All colliders overlapping the circle at (`x`, `y`) with `radius`
    /// whose category is in `filter`, closest first (ties by id).
    pub fn query_overlapping(
        &self,
        x: f32,
        y: f32,
        radius: f32,
        filter: CategoryMask,
    ) -> Vec<SpatialEntry> {
        let reach = radius + self.max_radius;
        let cells_to_check = (reach / self.cell_size).ceil() as i32 + 1;
        let center_cell = self.world_to_cell(x, y);

        let mut results = Vec::new();
        for dx in -cells_to_check..=cells_to_check {
            for dy in -cells_to_check..=cells_to_check {
                let cell = (center_cell.0 + dx, center_cell.1 + dy);
                let Some(entries) = self.cells.get(&cell) else {
                    continue;
                };
                for entry in entries {
                    if filter.contains(entry.category)
                        && entry.distance_to(x, y) <= radius + entry.radius
                    {
                        results.push(*entry);
                    }
                }
            }
        }

        results.sort_by(|a, b| {
            a.distance_to(x, y)
                .total_cmp(&b.distance_to(x, y))
                .then(a.id.cmp(&b.id))
        });
        results
    }

    pub fn total_count(&self) -> usize {
        self.len
    }
}

fn rebuild(
    grid: &mut SpatialGrid,
    query: &Query<(Entity, &EntityId, &Category, &Position, &Collider, &Lifecycle)>,
) {
    grid.clear();
    for (entity, id, category, pos, collider, lifecycle) in query.iter() {
        if !collider.enabled || *lifecycle == Lifecycle::Destroyed {
            continue;
        }
        grid.insert(SpatialEntry {
            entity,
            id: *id,
            x: pos.x,
            y: pos.y,
            radius: collider.radius,
            category: *category,
        });
    }
}

/// Rebuilds the grid at the start of a step.
pub fn spatial_grid_update_system(
    mut grid: ResMut<SpatialGrid>,
    query: Query<(Entity, &EntityId, &Category, &Position, &Collider, &Lifecycle)>,
) {
    rebuild(&mut grid, &query);
}

/// Rebuilds the grid again once everything has moved, before contacts and
/// attacks are resolved.
pub fn spatial_grid_refresh_system(
    mut grid: ResMut<SpatialGrid>,
    query: Query<(Entity, &EntityId, &Category, &Position, &Collider, &Lifecycle)>,
) {
    rebuild(&mut grid, &query);
}
