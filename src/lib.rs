//! Pod Rescue - a vertical wave shooter about saving escape pods
//!
//! Core modules:
//! - `sim`: Deterministic simulation (waves, enemy AI, collisions, power-ups, scoring)
//! - `scene`: Tickable scene wrapper that drives the simulation at a fixed step
//! - `persistence`: Progress save (unlocked levels, per-level best) with graceful fallback
//! - `tuning`: Data-driven game balance

pub mod persistence;
pub mod scene;
pub mod sim;
pub mod tuning;

pub use persistence::{KeyValueStore, MemoryStore, PersistError, ProgressData};
pub use scene::{FrameClock, GameplayScene, Scene, SceneTransition};
pub use tuning::{Tuning, TuningError};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation step in milliseconds (100 Hz)
    pub const SIM_STEP_MS: u64 = 10;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Play area dimensions (y grows downward, enemies enter from the top)
    pub const PLAY_WIDTH: f32 = 800.0;
    pub const PLAY_HEIGHT: f32 = 600.0;
    /// Distance past the play area edge at which entities are recycled
    pub const OFFSCREEN_MARGIN: f32 = 64.0;
    /// Lateral margin used for spawn placement and patrol reflection
    pub const LATERAL_MARGIN: f32 = 40.0;

    /// Pool capacities
    pub const MAX_BULLETS: usize = 64;
    pub const MAX_ENEMIES: usize = 48;
    pub const MAX_ENEMY_BULLETS: usize = 256;
    pub const MAX_PODS: usize = 16;
    pub const MAX_POWER_UPS: usize = 16;

    /// Collision radii
    pub const BULLET_RADIUS: f32 = 4.0;
    pub const POD_RADIUS: f32 = 12.0;
    pub const POWER_UP_RADIUS: f32 = 12.0;

    /// Projectile speeds (pixels/s)
    pub const PLAYER_BULLET_SPEED: f32 = 600.0;
    pub const POWER_UP_FALL_SPEED: f32 = 80.0;
}

/// Milliseconds to seconds for motion integration
#[inline]
pub fn ms_to_secs(ms: u64) -> f32 {
    ms as f32 / 1000.0
}

/// Whether a point lies outside the play area by more than the recycle margin
#[inline]
pub fn is_offscreen(pos: Vec2) -> bool {
    use consts::*;
    pos.x < -OFFSCREEN_MARGIN
        || pos.x > PLAY_WIDTH + OFFSCREEN_MARGIN
        || pos.y < -OFFSCREEN_MARGIN
        || pos.y > PLAY_HEIGHT + OFFSCREEN_MARGIN
}

/// Clamp a point to the play area
#[inline]
pub fn clamp_to_play_area(pos: Vec2, radius: f32) -> Vec2 {
    use consts::*;
    Vec2::new(
        pos.x.clamp(radius, PLAY_WIDTH - radius),
        pos.y.clamp(radius, PLAY_HEIGHT - radius),
    )
}
