//! Public API for the simulation.
//!
//! `GameWorld` is what a host (game loop, renderer bridge, test harness)
//! talks to: spawn or load a level, feed input, call `step`, then read the
//! snapshot and drain the output events.
//!
//! ## Fixed Timestep
//!
//! The simulation runs at a fixed timestep (default 60 Hz). `step(dt)`
//! accumulates wall time and runs as many fixed updates as fit, so
//! behaviour does not depend on the host's frame rate.
//!
//! ## Step Order
//!
//! 1. timers (attack cycles, delays, gate polling)
//! 2. spatial grid rebuild
//! 3. separation, player movement
//! 4. health notifications, charger, giant, guard
//! 5. spatial grid refresh
//! 6. contact, player attack, player death
//! 7. destruction sweep

use crate::components::*;
use crate::config::SimConfig;
use crate::error::SimError;
use crate::events::{EventBuffer, GameEvent, KillCounter};
use crate::level::LevelLayout;
use crate::registry::EntityRegistry;
use crate::scheduler::{Clock, Scheduler};
use crate::spatial::{spatial_grid_refresh_system, spatial_grid_update_system, SpatialGrid};
use crate::spawn;
use crate::systems::boss_gate::{self, GateDamage};
use crate::systems::charger::charger_system;
use crate::systems::contact::{contact_system, ContactTracker};
use crate::systems::destruction::{self, destruction_sweep_system, TerminalRequest};
use crate::systems::giant::{giant_system, health_notification_system};
use crate::systems::guard::guard_system;
use crate::systems::player::{player_death_system, player_movement_system};
use crate::systems::player_attack::{player_attack_system, AttackTrigger, TriggerSource};
use crate::systems::separation::separation_system;
use crate::systems::timers::timer_dispatch_system;
use crate::world::Snapshot;
use bevy_ecs::prelude::*;
use log::info;

/// The main game world container.
pub struct GameWorld {
    world: World,
    schedule: Schedule,
    /// Accumulated time for fixed timestep.
    time_accumulator: f32,
}

impl GameWorld {
    /// Create an empty world with the default tuning.
    pub fn new() -> Self {
        Self::build(SimConfig::default())
    }

    /// Create an empty world with custom tuning.
    pub fn with_config(config: SimConfig) -> Result<Self, SimError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    /// Create a world and spawn `layout` into it.
    pub fn from_level(layout: &LevelLayout, config: SimConfig) -> Result<Self, SimError> {
        let mut game = Self::with_config(config)?;
        game.load_level(layout);
        Ok(game)
    }

    fn build(config: SimConfig) -> Self {
        let mut world = World::new();
        spawn::init_world(&mut world, config);

        let mut schedule = Schedule::default();
        schedule.add_systems(
            (
                timer_dispatch_system,
                spatial_grid_update_system,
                separation_system,
                player_movement_system,
                health_notification_system,
                charger_system,
                giant_system,
                guard_system,
                spatial_grid_refresh_system,
                contact_system,
                player_attack_system,
                player_death_system,
                destruction_sweep_system,
            )
                .chain(),
        );

        Self {
            world,
            schedule,
            time_accumulator: 0.0,
        }
    }

    /// Step the simulation forward by `dt` seconds of wall time.
    pub fn step(&mut self, dt: f32) {
        let fixed_dt = self.world.resource::<SimConfig>().fixed_timestep;
        self.time_accumulator += dt;
        while self.time_accumulator >= fixed_dt {
            self.fixed_update(fixed_dt);
            self.time_accumulator -= fixed_dt;
        }
    }

    /// Run `seconds` worth of fixed updates.
    pub fn run_for(&mut self, seconds: f32) {
        let fixed_dt = self.world.resource::<SimConfig>().fixed_timestep;
        let steps = (seconds / fixed_dt).round() as u64;
        for _ in 0..steps {
            self.fixed_update(fixed_dt);
        }
    }

    fn fixed_update(&mut self, dt: f32) {
        self.world.resource_mut::<Clock>().advance(dt);
        self.schedule.run(&mut self.world);
    }

    // ------------------------------------------------------------------
    // Levels
    // ------------------------------------------------------------------

    /// Replace every entity with the contents of `layout`. The kill
    /// counter carries over.
    pub fn load_level(&mut self, layout: &LevelLayout) -> Vec<EntityId> {
        self.clear_entities();
        let ids = layout.spawn_into(&mut self.world);
        info!("loaded level '{}' with {} entities", layout.name, ids.len());
        ids
    }

    /// Start `layout` over from scratch, kill counter included.
    pub fn restart_level(&mut self, layout: &LevelLayout) -> Vec<EntityId> {
        self.world.resource_mut::<KillCounter>().reset();
        self.load_level(layout)
    }

    fn clear_entities(&mut self) {
        let entities: Vec<Entity> = self
            .world
            .query_filtered::<Entity, With<EntityId>>()
            .iter(&self.world)
            .collect();
        for entity in entities {
            self.world.despawn(entity);
        }
        self.world.resource_mut::<EntityRegistry>().clear();
        self.world.resource_mut::<Scheduler>().clear();
        self.world.resource_mut::<EventBuffer>().clear();
        self.world.resource_mut::<ContactTracker>().clear();
        self.world.resource_mut::<AttackTrigger>().clear();
        self.world.resource_mut::<SpatialGrid>().clear();
        self.time_accumulator = 0.0;
    }

    // ------------------------------------------------------------------
    // Spawning
    // ------------------------------------------------------------------

    pub fn spawn_player(&mut self, x: f32, y: f32) -> EntityId {
        spawn::spawn_player(&mut self.world, x, y)
    }

    pub fn spawn_charger(&mut self, x: f32, y: f32) -> EntityId {
        spawn::spawn_charger(&mut self.world, x, y, false)
    }

    pub fn spawn_giant(&mut self, x: f32, y: f32) -> EntityId {
        spawn::spawn_giant(&mut self.world, x, y, false)
    }

    pub fn spawn_grunt(&mut self, x: f32, y: f32) -> EntityId {
        spawn::spawn_grunt(&mut self.world, x, y)
    }

    pub fn spawn_guard(&mut self, x: f32, y: f32) -> EntityId {
        spawn::spawn_guard(&mut self.world, x, y)
    }

    pub fn spawn_item(&mut self, x: f32, y: f32) -> EntityId {
        spawn::spawn_item(&mut self.world, x, y)
    }

    pub fn spawn_boss_gate(&mut self, x: f32, y: f32, with_charger: bool) -> EntityId {
        spawn::spawn_boss_gate(&mut self.world, x, y, with_charger)
    }

    // ------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------

    fn player_control(&mut self) -> Result<Mut<'_, PlayerControl>, SimError> {
        let id = self
            .world
            .resource::<EntityRegistry>()
            .first(Category::Player)
            .ok_or(SimError::NoPlayer)?;
        let entity = self.entity(id).ok_or(SimError::NoPlayer)?;
        self.world
            .get_mut::<PlayerControl>(entity)
            .ok_or(SimError::NoPlayer)
    }

    pub fn set_move_input(&mut self, x: f32, y: f32) -> Result<(), SimError> {
        self.player_control()?.move_input = (x, y);
        Ok(())
    }

    /// Hardware direction dial, 1..=8 clockwise from up-right; 0 releases it.
    pub fn set_dial(&mut self, position: u8) -> Result<(), SimError> {
        self.player_control()?.dial = position;
        Ok(())
    }

    pub fn set_facing(&mut self, facing: Facing) -> Result<(), SimError> {
        self.player_control()?.facing = facing;
        Ok(())
    }

    pub fn press_attack(&mut self, source: TriggerSource) {
        self.world.resource_mut::<AttackTrigger>().press(source);
    }

    pub fn set_attack_level(&mut self, source: TriggerSource, high: bool) {
        self.world
            .resource_mut::<AttackTrigger>()
            .set_level(source, high);
    }

    /// Restore a saved life total.
    pub fn set_player_life(&mut self, life: i32) -> Result<(), SimError> {
        let id = self
            .world
            .resource::<EntityRegistry>()
            .first(Category::Player)
            .ok_or(SimError::NoPlayer)?;
        let entity = self.entity(id).ok_or(SimError::NoPlayer)?;
        let mut health = self
            .world
            .get_mut::<Health>(entity)
            .ok_or(SimError::NoPlayer)?;
        let max = health.max;
        health.current = life.clamp(0, max);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    pub fn damage_boss_gate(&mut self, id: EntityId, amount: u32) -> Result<GateDamage, SimError> {
        boss_gate::damage_gate(&mut self.world, id, amount)
    }

    /// Ask an ordinary enemy to start its terminal path.
    pub fn request_terminal(
        &mut self,
        id: EntityId,
        request: TerminalRequest,
    ) -> Result<bool, SimError> {
        destruction::request_terminal(&mut self.world, id, request)
    }

    pub fn reset_kills(&mut self) {
        self.world.resource_mut::<KillCounter>().reset();
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn snapshot(&mut self) -> Snapshot {
        let clock = *self.world.resource::<Clock>();
        let kills = self.kills();
        Snapshot::from_world(&mut self.world, clock.tick, clock.time, kills)
    }

    pub fn snapshot_json(&mut self) -> Result<String, SimError> {
        Ok(self.snapshot().to_json()?)
    }

    /// Take every event produced since the last drain.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.world.resource_mut::<EventBuffer>().drain()
    }

    pub fn kills(&self) -> u32 {
        self.world.resource::<KillCounter>().total()
    }

    pub fn player_life(&self) -> Option<i32> {
        let id = self.world.resource::<EntityRegistry>().first(Category::Player)?;
        let entity = self.entity(id)?;
        self.world.get::<Health>(entity).map(|h| h.current)
    }

    pub fn player_status(&self) -> Option<PlayerStatus> {
        let id = self.world.resource::<EntityRegistry>().first(Category::Player)?;
        let entity = self.entity(id)?;
        self.world.get::<PlayerControl>(entity).map(|c| c.status)
    }

    /// Current and max health of a boss gate.
    pub fn boss_health(&self, id: EntityId) -> Option<(i32, i32)> {
        let entity = self.entity(id)?;
        self.world
            .get::<Health>(entity)
            .filter(|_| self.world.get::<BossGate>(entity).is_some())
            .map(|h| (h.current.max(0), h.max))
    }

    pub fn lifecycle(&self, id: EntityId) -> Option<Lifecycle> {
        let entity = self.entity(id)?;
        self.world.get::<Lifecycle>(entity).copied()
    }

    pub fn position(&self, id: EntityId) -> Option<Position> {
        let entity = self.entity(id)?;
        self.world.get::<Position>(entity).copied()
    }

    pub fn is_alive(&self, id: EntityId) -> bool {
        self.world.resource::<EntityRegistry>().contains(id)
    }

    pub fn population(&self, category: Category) -> usize {
        self.world.resource::<EntityRegistry>().count(category)
    }

    pub fn entity(&self, id: EntityId) -> Option<Entity> {
        self.world.resource::<EntityRegistry>().entity(id)
    }

    pub fn current_tick(&self) -> u64 {
        self.world.resource::<Clock>().tick
    }

    pub fn current_time(&self) -> f32 {
        self.world.resource::<Clock>().time
    }

    pub fn config(&self) -> &SimConfig {
        self.world.resource::<SimConfig>()
    }

    /// Get the spatial grid reference (for debugging/visualization).
    pub fn spatial_grid(&self) -> &SpatialGrid {
        self.world.resource::<SpatialGrid>()
    }

    /// Get direct access to the ECS world (for advanced usage).
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Get mutable access to the ECS world (for advanced usage).
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}

impl Default for GameWorld {
    fn default() -> Self {
        Self::new()
    }
}
