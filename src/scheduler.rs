//! Simulation clock and deferred/periodic task scheduler.
//!
//! Timers are plain data: an owner id, a due time and a [`Task`] describing
//! what to do. Nothing is ever cancelled; a timer whose owner has left the
//! terminal path's preconditions simply no-ops when it fires (see
//! `systems::timers`).

use crate::components::EntityId;
use bevy_ecs::prelude::*;

/// Slack used when comparing accumulated `f32` time against due times.
pub const TIME_EPSILON: f32 = 1.0e-4;

/// Simulated time. Advanced once per fixed step.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct Clock {
    pub tick: u64,
    /// Seconds since the clock started.
    pub time: f32,
    /// Seconds covered by the current step.
    pub delta: f32,
}

impl Clock {
    pub fn advance(&mut self, dt: f32) {
        self.tick = self.tick.wrapping_add(1);
        self.time += dt;
        self.delta = dt;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

/// Work a timer performs on its owner when it comes due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Start the next charger windup.
    ChargerCycle,
    /// Delayed second sound of a windup.
    ChargerAttackSound,
    /// Blast radius effect expired; spawn the explosion.
    ChargerBlastFollowup,
    /// Giant's enlarge delay elapsed.
    GiantEnlarge { token: u32 },
    /// Boss gate population check.
    GatePoll,
    /// Player death delay elapsed.
    PlayerGameOver,
    /// Terminal delay elapsed; the owner is destroyed.
    FinishDestruction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Timer {
    pub id: TimerId,
    pub owner: EntityId,
    pub due: f32,
    /// Re-arm interval for periodic timers.
    pub period: Option<f32>,
    pub task: Task,
}

/// Pending timers, fired in (due, id) order.
#[derive(Resource, Debug, Default)]
pub struct Scheduler {
    next_id: u64,
    pending: Vec<Timer>,
}

impl Scheduler {
    /// Run `task` for `owner` once, `delay` seconds after `now`.
    pub fn after(&mut self, now: f32, owner: EntityId, delay: f32, task: Task) -> TimerId {
        self.push(owner, now + delay.max(0.0), None, task)
    }

    /// Run `task` for `owner` every `period` seconds, first at `now + period`.
    pub fn every(&mut self, now: f32, owner: EntityId, period: f32, task: Task) -> TimerId {
        let period = period.max(TIME_EPSILON);
        self.push(owner, now + period, Some(period), task)
    }

    fn push(&mut self, owner: EntityId, due: f32, period: Option<f32>, task: Task) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.push(Timer { id, owner, due, period, task });
        id
    }

    /// Remove and return every timer due at `now`, earliest first.
    pub fn take_due(&mut self, now: f32) -> Vec<Timer> {
        let (mut due, rest): (Vec<Timer>, Vec<Timer>) = self
            .pending
            .drain(..)
            .partition(|t| t.due <= now + TIME_EPSILON);
        self.pending = rest;
        due.sort_by(|a, b| a.due.total_cmp(&b.due).then(a.id.cmp(&b.id)));
        due
    }

    /// Put a periodic timer back for its next firing.
    pub fn rearm(&mut self, mut timer: Timer) {
        if let Some(period) = timer.period {
            timer.due += period;
            self.pending.push(timer);
        }
    }

    /// Hand a due timer back untouched so it fires on the next step.
    pub fn defer(&mut self, timer: Timer) {
        self.pending.push(timer);
    }

    pub fn pending_for(&self, owner: EntityId) -> usize {
        self.pending.iter().filter(|t| t.owner == owner).count()
    }

    pub fn has_pending(&self, owner: EntityId, task: Task) -> bool {
        self.pending.iter().any(|t| t.owner == owner && t.task == task)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_advance() {
        let mut clock = Clock::default();
        clock.advance(0.5);
        clock.advance(0.25);
        assert_eq!(clock.tick, 2);
        assert!((clock.time - 0.75).abs() < 1.0e-6);
        assert_eq!(clock.delta, 0.25);
    }

    #[test]
    fn test_take_due_orders_by_time_then_id() {
        let mut scheduler = Scheduler::default();
        let late = scheduler.after(0.0, EntityId(1), 2.0, Task::FinishDestruction);
        let early = scheduler.after(0.0, EntityId(2), 1.0, Task::ChargerCycle);
        let tie = scheduler.after(0.0, EntityId(3), 1.0, Task::GatePoll);

        assert!(scheduler.take_due(0.5).is_empty());

        let due = scheduler.take_due(2.0);
        let ids: Vec<_> = due.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![early, tie, late]);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_periodic_rearm() {
        let mut scheduler = Scheduler::default();
        scheduler.every(0.0, EntityId(7), 1.0, Task::GatePoll);

        let due = scheduler.take_due(1.0);
        assert_eq!(due.len(), 1);
        scheduler.rearm(due.into_iter().next().unwrap());

        assert!(scheduler.take_due(1.5).is_empty());
        assert_eq!(scheduler.take_due(2.0).len(), 1);
    }

    #[test]
    fn test_one_shot_is_not_rearmed() {
        let mut scheduler = Scheduler::default();
        scheduler.after(0.0, EntityId(1), 0.1, Task::ChargerAttackSound);
        let timer = scheduler.take_due(0.1).remove(0);
        scheduler.rearm(timer);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_pending_for_owner() {
        let mut scheduler = Scheduler::default();
        scheduler.every(0.0, EntityId(1), 3.0, Task::ChargerCycle);
        scheduler.after(0.0, EntityId(1), 0.8, Task::FinishDestruction);
        scheduler.after(0.0, EntityId(2), 0.8, Task::FinishDestruction);
        assert_eq!(scheduler.pending_for(EntityId(1)), 2);
        assert!(scheduler.has_pending(EntityId(2), Task::FinishDestruction));
    }
}
