//! Entity registry: stable ids, per-category indices.
//!
//! The ECS `World` owns the component data; the registry maps the stable
//! [`EntityId`] handed to collaborators onto the current ECS `Entity` and
//! keeps one ordered index per category so population counts and
//! category iteration never scan the world.

use crate::components::{Category, EntityId};
use bevy_ecs::prelude::*;
use std::collections::{BTreeSet, HashMap};

#[derive(Resource, Debug, Default)]
pub struct EntityRegistry {
    next_id: u32,
    entities: HashMap<EntityId, (Entity, Category)>,
    by_category: HashMap<Category, BTreeSet<EntityId>>,
}

impl EntityRegistry {
    /// Reserve a fresh id. Ids are never reused, even across level reloads.
    pub fn allocate(&mut self) -> EntityId {
        self.next_id += 1;
        EntityId(self.next_id)
    }

    pub fn register(&mut self, id: EntityId, entity: Entity, category: Category) {
        self.entities.insert(id, (entity, category));
        self.by_category.entry(category).or_default().insert(id);
    }

    pub fn unregister(&mut self, id: EntityId) -> Option<Entity> {
        let (entity, category) = self.entities.remove(&id)?;
        if let Some(ids) = self.by_category.get_mut(&category) {
            ids.remove(&id);
        }
        Some(entity)
    }

    pub fn entity(&self, id: EntityId) -> Option<Entity> {
        self.entities.get(&id).map(|(entity, _)| *entity)
    }

    pub fn category(&self, id: EntityId) -> Option<Category> {
        self.entities.get(&id).map(|(_, category)| *category)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Ids in `category`, ascending.
    pub fn ids_in(&self, category: Category) -> impl Iterator<Item = EntityId> + '_ {
        self.by_category
            .get(&category)
            .into_iter()
            .flat_map(|ids| ids.iter().copied())
    }

    pub fn count(&self, category: Category) -> usize {
        self.by_category.get(&category).map_or(0, BTreeSet::len)
    }

    /// Population gate input: registered ordinary enemies.
    pub fn ordinary_enemy_count(&self) -> usize {
        Category::ALL
            .iter()
            .filter(|c| c.is_ordinary_enemy())
            .map(|c| self.count(*c))
            .sum()
    }

    pub fn first(&self, category: Category) -> Option<EntityId> {
        self.ids_in(category).next()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// All registered ids, ascending.
    pub fn ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<_> = self.entities.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Forget every entity but keep the id counter running.
    pub fn clear(&mut self) {
        self.entities.clear();
        self.by_category.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_lookup_unregister() {
        let mut registry = EntityRegistry::default();
        let id = registry.allocate();
        let entity = Entity::from_raw(10);
        registry.register(id, entity, Category::GiantEnemy);

        assert_eq!(registry.entity(id), Some(entity));
        assert_eq!(registry.category(id), Some(Category::GiantEnemy));
        assert_eq!(registry.count(Category::GiantEnemy), 1);

        assert_eq!(registry.unregister(id), Some(entity));
        assert!(!registry.contains(id));
        assert_eq!(registry.count(Category::GiantEnemy), 0);
        assert_eq!(registry.unregister(id), None);
    }

    #[test]
    fn test_ordinary_enemy_count_ignores_gate_and_items() {
        let mut registry = EntityRegistry::default();
        for (raw, category) in [
            (1, Category::ChargerEnemy),
            (2, Category::GiantEnemy),
            (3, Category::GruntEnemy),
            (4, Category::BossGate),
            (5, Category::Item),
            (6, Category::Player),
        ] {
            let id = registry.allocate();
            registry.register(id, Entity::from_raw(raw), category);
        }
        assert_eq!(registry.ordinary_enemy_count(), 3);
    }

    #[test]
    fn test_ids_survive_clear() {
        let mut registry = EntityRegistry::default();
        let first = registry.allocate();
        registry.register(first, Entity::from_raw(1), Category::Item);
        registry.clear();
        let second = registry.allocate();
        assert!(second > first);
        assert!(registry.is_empty());
    }
}
