//! Swarmfall - simulation core for a top-down survival arcade game
//!
//! Everything gameplay-relevant lives in [`sim`]: progression (score, exp,
//! levels, stat points), the entity registry with its spawn scheduler, and
//! the per-item ability state machines. The crate is headless by design;
//! rendering, audio and input translation are host concerns that drive the
//! sim through [`sim::TickInput`] and read back entity transforms.

pub mod sim;

pub use sim::catalog::{BehaviorKind, Catalog, CatalogError, ItemDef};
pub use sim::progression::{Progression, ProgressionEvent};
pub use sim::state::World;
pub use sim::tick::{TickInput, tick};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// Playfield half extents (portrait layout, origin at center)
    pub const FIELD_HALF_WIDTH: f32 = 9.0;
    pub const FIELD_HALF_HEIGHT: f32 = 16.0;
    /// Cull margin beyond the playfield before an entity counts as off-screen
    pub const OFFSCREEN_MARGIN: f32 = 1.0;

    /// Player defaults - starts in the lower lane, below field center
    pub const PLAYER_SPEED: f32 = 5.0;
    pub const PLAYER_RADIUS: f32 = 0.5;
    /// Player start height as a fraction of the bottom edge
    pub const PLAYER_START_Y_FRAC: f32 = 0.6;

    /// Enemy defaults
    pub const ENEMY_SPEED: f32 = 3.0;
    pub const ENEMY_RADIUS: f32 = 0.4;

    /// Item defaults
    pub const ITEM_RADIUS: f32 = 0.5;
    /// Armed items drift toward the field center at this speed
    pub const ITEM_DRIFT_SPEED: f32 = 3.5;
    /// Heading jitter applied to the drift direction (degrees, +/-)
    pub const ITEM_DRIFT_JITTER_DEG: f32 = 15.0;
    /// Armed items are kept inside the walls for this long, then released
    pub const ITEM_CONTAIN_SECS: f32 = 15.0;
    /// Items spawn inset from the field edges by this much
    pub const ITEM_SPAWN_INSET: f32 = 1.5;
    /// Shrink wind-down length for the default item removal path
    pub const ITEM_SHRINK_SECS: f32 = 0.5;
    /// Scale growth rate for grow-to-target abilities (per second)
    pub const ITEM_GROW_RATE: f32 = 2.0;

    /// Score and exp awarded per enemy kill
    pub const KILL_SCORE: i32 = 5;
    pub const KILL_EXP: i32 = 5;

    /// Level-up threshold step; the threshold grows by this much per level
    pub const EXP_PER_LEVEL: i32 = 10;
    /// Session level cap
    pub const MAX_LEVEL: i32 = 99;

    /// Spawn scheduler tuning
    pub const ENEMY_DELAY_BASE: f32 = 2.0;
    pub const ENEMY_DELAY_FLOOR: f32 = 0.5;
    /// Enemy delay decays by dt / this divisor each tick
    pub const ENEMY_DELAY_DECAY_DIV: f32 = 40.0;
    pub const ITEM_DELAY_BASE: f32 = 10.0;
    pub const ITEM_DELAY_FLOOR: f32 = 3.0;
    pub const ITEM_DELAY_DECAY_DIV: f32 = 50.0;
    /// Max catch-up spawns of one kind per tick
    pub const SPAWN_CATCHUP_CAP: u32 = 4;
    /// Pacing between same-tick catch-up spawns (seconds)
    pub const SPAWN_PACING_SECS: f32 = 0.01;
}

/// Rotate a direction vector by `radians` (counter-clockwise)
#[inline]
pub fn rotate_vec(dir: Vec2, radians: f32) -> Vec2 {
    let (sn, cs) = radians.sin_cos();
    Vec2::new(dir.x * cs - dir.y * sn, dir.x * sn + dir.y * cs)
}

/// Degrees to radians
#[inline]
pub fn deg_to_rad(deg: f32) -> f32 {
    deg * std::f32::consts::PI / 180.0
}
