//! Tuning and configuration.
//!
//! Every hand-tuned timing and distance lives here so a level designer can
//! override it from JSON. Missing fields fall back to the defaults the game
//! ships with.

use crate::error::SimError;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Soft anti-overlap between ground enemies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeparationTuning {
    /// Minimum centre distance `R` below which two enemies push apart.
    pub min_distance: f32,
    /// Push gain `k`.
    pub strength: f32,
    /// Pairs closer than this are skipped (no usable push direction).
    pub epsilon: f32,
}

impl Default for SeparationTuning {
    fn default() -> Self {
        Self {
            min_distance: 0.8,
            strength: 2.0,
            epsilon: 1.0e-4,
        }
    }
}

/// Melee charger: walks at the player and periodically winds up an area blast.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChargerTuning {
    pub speed: f32,
    pub stop_distance: f32,
    /// Pause between the end of one windup and the start of the next.
    pub attack_interval: f32,
    pub windup_duration: f32,
    /// Offset into the windup at which the area blast lands.
    pub impact_delay: f32,
    pub impact_radius: f32,
    /// Lives taken from the player by a landed blast.
    pub impact_damage: u32,
    pub recovery_duration: f32,
    pub attack_sound_delay: f32,
    pub radius_effect_time: f32,
    pub explosion_effect_time: f32,
    pub burst_effect_time: f32,
    /// Delay between a contact strike and removal.
    pub strike_delay: f32,
    /// Delay between a finishing blow and removal.
    pub finishing_delay: f32,
    pub collider_radius: f32,
}

impl Default for ChargerTuning {
    fn default() -> Self {
        Self {
            speed: 2.0,
            stop_distance: 0.5,
            attack_interval: 3.0,
            windup_duration: 2.2,
            impact_delay: 1.9,
            impact_radius: 3.0,
            impact_damage: 1,
            recovery_duration: 0.1,
            attack_sound_delay: 0.2,
            radius_effect_time: 0.25,
            explosion_effect_time: 0.65,
            burst_effect_time: 5.0,
            strike_delay: 0.5 + 0.3,
            finishing_delay: 1.25 + 0.3,
            collider_radius: 0.4,
        }
    }
}

/// Giant: grows and speeds up while the player is on their last life.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GiantTuning {
    pub speed: f32,
    pub stop_distance: f32,
    /// Speed gained per second while the player is low.
    pub speed_increase_rate: f32,
    pub max_speed: f32,
    pub enlarge_delay: f32,
    pub scale_multiplier: f32,
    /// Tween progress per second (1.0 / ramp duration).
    pub enlarge_rate: f32,
    pub shrink_rate: f32,
    pub attack_then_die_delay: f32,
    pub die_delay: f32,
    pub collider_radius: f32,
}

impl Default for GiantTuning {
    fn default() -> Self {
        Self {
            speed: 2.0,
            stop_distance: 0.5,
            speed_increase_rate: 0.5,
            max_speed: 4.4,
            enlarge_delay: 0.5,
            scale_multiplier: 1.5,
            enlarge_rate: 2.0,
            shrink_rate: 2.0,
            attack_then_die_delay: 1.2,
            die_delay: 0.9,
            collider_radius: 0.5,
        }
    }
}

/// Boss gate that appears once the ordinary enemies are gone.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BossGateTuning {
    pub max_health: i32,
    pub poll_interval: f32,
    pub removal_delay: f32,
    pub collider_radius: f32,
    /// Damage dealt to a revealed gate by one player hit.
    pub damage_per_hit: u32,
}

impl Default for BossGateTuning {
    fn default() -> Self {
        Self {
            max_health: 3,
            poll_interval: 1.0,
            removal_delay: 1.5,
            collider_radius: 0.8,
            damage_per_hit: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub max_life: i32,
    pub speed: f32,
    pub min_bounds: (f32, f32),
    pub max_bounds: (f32, f32),
    pub collider_radius: f32,
    pub die_delay: f32,
    /// Distance from the player to the centre of the attack hit-box.
    pub attack_range: f32,
    pub hitbox_radius: f32,
    pub attack_effect_time: f32,
    pub contact_effect_time: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            max_life: 5,
            speed: 5.0,
            min_bounds: (-10.0, -10.0),
            max_bounds: (10.0, 10.0),
            collider_radius: 0.4,
            die_delay: 1.0,
            attack_range: 1.5,
            hitbox_radius: 0.8,
            attack_effect_time: 0.5,
            contact_effect_time: 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardTuning {
    pub detection_range: f32,
    pub speed: f32,
    pub chase_duration: f32,
    pub reduced_detection_multiplier: f32,
    pub return_speed_factor: f32,
    pub home_tolerance: f32,
}

impl Default for GuardTuning {
    fn default() -> Self {
        Self {
            detection_range: 5.0,
            speed: 3.0,
            chase_duration: 10.0,
            reduced_detection_multiplier: 0.5,
            return_speed_factor: 0.5,
            home_tolerance: 0.05,
        }
    }
}

/// Configuration for the whole simulation.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Fixed timestep in seconds.
    pub fixed_timestep: f32,
    /// Spatial grid cell size in world units.
    pub cell_size: f32,
    pub separation: SeparationTuning,
    pub charger: ChargerTuning,
    pub giant: GiantTuning,
    pub gate: BossGateTuning,
    pub player: PlayerTuning,
    pub guard: GuardTuning,
    /// Collider radius shared by grunts and guards.
    pub grunt_radius: f32,
    pub item_radius: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            fixed_timestep: 1.0 / 60.0,
            cell_size: 2.0,
            separation: SeparationTuning::default(),
            charger: ChargerTuning::default(),
            giant: GiantTuning::default(),
            gate: BossGateTuning::default(),
            player: PlayerTuning::default(),
            guard: GuardTuning::default(),
            grunt_radius: 0.4,
            item_radius: 0.3,
        }
    }
}

impl SimConfig {
    /// Parse a config from JSON and validate it.
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would stall timers or invert ranges.
    pub fn validate(&self) -> Result<(), SimError> {
        fn positive(name: &str, value: f32) -> Result<(), SimError> {
            if value > 0.0 && value.is_finite() {
                Ok(())
            } else {
                Err(SimError::InvalidConfig(format!("{name} must be positive, got {value}")))
            }
        }

        positive("fixed_timestep", self.fixed_timestep)?;
        positive("cell_size", self.cell_size)?;
        positive("separation.min_distance", self.separation.min_distance)?;
        positive("charger.attack_interval", self.charger.attack_interval)?;
        positive("charger.windup_duration", self.charger.windup_duration)?;
        positive("charger.impact_radius", self.charger.impact_radius)?;
        positive("giant.scale_multiplier", self.giant.scale_multiplier)?;
        positive("giant.enlarge_rate", self.giant.enlarge_rate)?;
        positive("giant.shrink_rate", self.giant.shrink_rate)?;
        positive("gate.poll_interval", self.gate.poll_interval)?;
        positive("player.hitbox_radius", self.player.hitbox_radius)?;

        if self.charger.impact_delay > self.charger.windup_duration {
            return Err(SimError::InvalidConfig(
                "charger.impact_delay must fall within the windup".to_string(),
            ));
        }
        if self.giant.max_speed < self.giant.speed {
            return Err(SimError::InvalidConfig(
                "giant.max_speed must be at least giant.speed".to_string(),
            ));
        }
        if self.gate.max_health < 1 || self.player.max_life < 1 {
            return Err(SimError::InvalidConfig(
                "health pools need at least one point".to_string(),
            ));
        }
        let (min, max) = (self.player.min_bounds, self.player.max_bounds);
        if min.0 > max.0 || min.1 > max.1 {
            return Err(SimError::InvalidConfig("player bounds are inverted".to_string()));
        }
        Ok(())
    }
}
