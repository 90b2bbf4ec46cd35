//! ECS Components for the brawl simulation.
//!
//! Components are pure data containers attached to entities. Behaviour lives
//! in the systems; the only methods here are small queries over the data.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_1_SQRT_2, FRAC_PI_4};
use std::fmt;

// ============================================================================
// SPATIAL COMPONENTS
// ============================================================================

/// 2D position in world units (x = right, y = up).
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Unit vector pointing from `self` towards `other`, or zero when they coincide.
    pub fn direction_to(&self, other: &Position) -> (f32, f32) {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let len = (dx * dx + dy * dy).sqrt();
        if len < 1.0e-6 {
            (0.0, 0.0)
        } else {
            (dx / len, dy / len)
        }
    }

    pub fn offset(&self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Circular collider. Disabled colliders are invisible to overlap queries.
#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Collider {
    pub radius: f32,
    pub enabled: bool,
}

impl Collider {
    pub fn new(radius: f32) -> Self {
        Self { radius, enabled: true }
    }

    pub fn disabled(radius: f32) -> Self {
        Self { radius, enabled: false }
    }
}

/// What the renderer needs to size and orient a sprite.
#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Presentation {
    pub scale: f32,
    /// Sprite flipped to face left.
    pub mirrored: bool,
}

impl Default for Presentation {
    fn default() -> Self {
        Self { scale: 1.0, mirrored: false }
    }
}

/// Target-seeking locomotion shared by the charger and the giant.
#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Chaser {
    pub speed: f32,
    pub stop_distance: f32,
}

/// Marker: this enemy is never pushed by separation.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct MayOverlap;

// ============================================================================
// IDENTITY COMPONENTS
// ============================================================================

/// Stable identifier, unique for the lifetime of the process.
#[derive(
    Component, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Entity category, replacing string tags.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Player,
    ChargerEnemy,
    GiantEnemy,
    /// Untyped ordinary enemy (static hazards, guards).
    GruntEnemy,
    BossGate,
    Item,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Player,
        Category::ChargerEnemy,
        Category::GiantEnemy,
        Category::GruntEnemy,
        Category::BossGate,
        Category::Item,
    ];

    /// Enemies counted by the population gate and pushed by separation.
    pub fn is_ordinary_enemy(self) -> bool {
        matches!(
            self,
            Category::ChargerEnemy | Category::GiantEnemy | Category::GruntEnemy
        )
    }

    pub fn is_enemy(self) -> bool {
        self.is_ordinary_enemy() || self == Category::BossGate
    }

    fn bit(self) -> u8 {
        match self {
            Category::Player => 1 << 0,
            Category::ChargerEnemy => 1 << 1,
            Category::GiantEnemy => 1 << 2,
            Category::GruntEnemy => 1 << 3,
            Category::BossGate => 1 << 4,
            Category::Item => 1 << 5,
        }
    }
}

/// Set of categories used to filter overlap queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryMask(u8);

impl CategoryMask {
    pub const NONE: CategoryMask = CategoryMask(0);
    pub const ALL: CategoryMask = CategoryMask(0b11_1111);
    pub const PLAYER: CategoryMask = CategoryMask(1 << 0);
    pub const ORDINARY_ENEMIES: CategoryMask = CategoryMask(0b1110);
    pub const ENEMIES: CategoryMask = CategoryMask(0b1_1110);

    pub const fn union(self, other: CategoryMask) -> CategoryMask {
        CategoryMask(self.0 | other.0)
    }

    pub fn of(category: Category) -> CategoryMask {
        CategoryMask(category.bit())
    }

    pub fn contains(self, category: Category) -> bool {
        self.0 & category.bit() != 0
    }
}

/// Eight compass directions plus idle.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Facing {
    Up,
    #[default]
    Down,
    Left,
    Right,
    UpRight,
    UpLeft,
    DownRight,
    DownLeft,
    Idle,
}

impl Facing {
    /// Unit vector for this facing; `None` for idle.
    pub fn unit_vector(self) -> Option<(f32, f32)> {
        let d = FRAC_1_SQRT_2;
        match self {
            Facing::Up => Some((0.0, 1.0)),
            Facing::Down => Some((0.0, -1.0)),
            Facing::Left => Some((-1.0, 0.0)),
            Facing::Right => Some((1.0, 0.0)),
            Facing::UpRight => Some((d, d)),
            Facing::UpLeft => Some((-d, d)),
            Facing::DownRight => Some((d, -d)),
            Facing::DownLeft => Some((-d, -d)),
            Facing::Idle => None,
        }
    }

    /// Snap a movement vector to the nearest of the eight directions.
    pub fn from_vector(x: f32, y: f32) -> Facing {
        if x * x + y * y < 1.0e-4 {
            return Facing::Idle;
        }
        let octant = (y.atan2(x) / FRAC_PI_4).round() as i32;
        match octant.rem_euclid(8) {
            0 => Facing::Right,
            1 => Facing::UpRight,
            2 => Facing::Up,
            3 => Facing::UpLeft,
            4 => Facing::Left,
            5 => Facing::DownLeft,
            6 => Facing::Down,
            _ => Facing::DownRight,
        }
    }

    /// Map the hardware dial position (1..=8, clockwise from up-right).
    pub fn from_dial(position: u8) -> Facing {
        match position {
            1 => Facing::UpRight,
            2 => Facing::Right,
            3 => Facing::DownRight,
            4 => Facing::Down,
            5 => Facing::DownLeft,
            6 => Facing::Left,
            7 => Facing::UpLeft,
            8 => Facing::Up,
            _ => Facing::Idle,
        }
    }
}

// ============================================================================
// LIFECYCLE / HEALTH COMPONENTS
// ============================================================================

/// Lifecycle flag. Moves forward only: Alive -> MarkedForDestruction -> Destroyed.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Lifecycle {
    #[default]
    Alive,
    MarkedForDestruction,
    Destroyed,
}

impl Lifecycle {
    pub fn is_alive(self) -> bool {
        self == Lifecycle::Alive
    }

    /// Enter the terminal path. Returns false if already on it.
    pub fn mark(&mut self) -> bool {
        if *self == Lifecycle::Alive {
            *self = Lifecycle::MarkedForDestruction;
            true
        } else {
            false
        }
    }
}

/// Integer health pool (player lives, boss hearts).
#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Health {
    pub current: i32,
    pub max: i32,
}

impl Health {
    pub fn new(max: i32) -> Self {
        Self { current: max, max }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0
    }

    /// Subtract without clamping; callers decide what zero-or-below means.
    pub fn damage(&mut self, amount: u32) {
        let amount = i32::try_from(amount).unwrap_or(i32::MAX);
        self.current = self.current.saturating_sub(amount);
    }

    /// Add up to `max`. Returns false when already full.
    pub fn heal(&mut self, amount: u32) -> bool {
        if self.current >= self.max {
            return false;
        }
        let amount = i32::try_from(amount).unwrap_or(i32::MAX);
        self.current = self.current.saturating_add(amount).min(self.max);
        true
    }
}

// ============================================================================
// PLAYER COMPONENTS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlayerStatus {
    #[default]
    Active,
    Dying,
    GameOver,
}

/// Player input state and facing.
#[derive(Component, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PlayerControl {
    pub facing: Facing,
    /// Raw movement input, e.g. (-1..1, -1..1).
    pub move_input: (f32, f32),
    /// Hardware dial position, 0 when unused.
    pub dial: u8,
    pub status: PlayerStatus,
}

// ============================================================================
// CHARGER COMPONENTS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChargerState {
    #[default]
    Approaching,
    /// Invincible and immobile; the area blast lands partway through.
    Windup,
    Recovering,
    /// Hit the player on contact; removal pending.
    MeleeStrike,
    /// Killed by the player; removal pending.
    FinishingBlow,
    Destroyed,
}

impl ChargerState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ChargerState::MeleeStrike | ChargerState::FinishingBlow | ChargerState::Destroyed
        )
    }
}

#[derive(Component, Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChargerBrain {
    pub state: ChargerState,
    /// Dormant brains (attached to a hidden gate) neither move nor attack.
    pub active: bool,
    pub invincible: bool,
    pub attacking: bool,
    pub windup_elapsed: f32,
    pub recovery_elapsed: f32,
    /// Set once the blast of the current windup has landed.
    pub impact_fired: bool,
    /// Number of windups started.
    pub cycles: u32,
    /// Number of blasts landed.
    pub impacts: u32,
}

impl ChargerBrain {
    pub fn new(active: bool) -> Self {
        Self { active, ..Self::default() }
    }
}

// ============================================================================
// GIANT COMPONENTS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GiantState {
    #[default]
    Approaching,
    EnlargedApproaching,
    ContactResolution,
    Destroyed,
}

/// Grow/shrink tween.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum GrowthPhase {
    #[default]
    Normal,
    /// Waiting out the enlarge delay.
    PendingEnlarge,
    Enlarging { progress: f32 },
    Enlarged,
    Shrinking { progress: f32, from: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactOutcome {
    AttackThenDie,
    Die,
}

#[derive(Component, Debug, Clone, Serialize, Deserialize)]
pub struct GiantBrain {
    pub state: GiantState,
    pub growth: GrowthPhase,
    /// Bumped whenever a pending enlarge is superseded.
    pub growth_token: u32,
    pub speed_ramping: bool,
    pub aggressive: bool,
    pub attacking: bool,
    pub original_speed: f32,
    pub original_scale: f32,
    pub outcome: Option<ContactOutcome>,
}

impl GiantBrain {
    pub fn new(speed: f32, scale: f32) -> Self {
        Self {
            state: GiantState::Approaching,
            growth: GrowthPhase::Normal,
            growth_token: 0,
            speed_ramping: false,
            aggressive: false,
            attacking: false,
            original_speed: speed,
            original_scale: scale,
            outcome: None,
        }
    }
}

// ============================================================================
// BOSS GATE COMPONENTS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GateState {
    #[default]
    Hidden,
    Revealed,
    Destroyed,
}

#[derive(Component, Debug, Clone, Default, Serialize, Deserialize)]
pub struct BossGate {
    pub state: GateState,
    /// One heart per point of max health; exactly `health` of them lit.
    pub indicators: Vec<bool>,
}

impl BossGate {
    pub fn new(max_health: i32) -> Self {
        Self {
            state: GateState::Hidden,
            indicators: vec![true; max_health.max(0) as usize],
        }
    }

    pub fn sync_indicators(&mut self, health: i32) {
        for (i, lit) in self.indicators.iter_mut().enumerate() {
            *lit = (i as i32) < health;
        }
    }

    pub fn lit_indicators(&self) -> usize {
        self.indicators.iter().filter(|lit| **lit).count()
    }
}

// ============================================================================
// GUARD COMPONENTS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum GuardState {
    #[default]
    Watching,
    Chasing { remaining: f32 },
    Returning,
}

/// Chases the player for a while once it comes close, then walks home.
#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GuardBrain {
    pub state: GuardState,
    pub home: Position,
    pub detection_range: f32,
}

// ============================================================================
// ITEM COMPONENTS
// ============================================================================

/// Restores one life on pickup.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct HeartPickup;
