//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only, all scheduling is countdown state advanced by the tick
//! - Seeded RNG only
//! - Stable iteration order (pool slot order)
//! - No rendering or platform dependencies

pub mod behavior;
pub mod collision;
pub mod effects;
pub mod pool;
pub mod score;
pub mod snapshot;
pub mod state;
pub mod tick;
pub mod timer;
pub mod wave;

pub use collision::{circles_overlap, resolve};
pub use effects::{ActiveEffect, EffectKind, EffectTracker};
pub use pool::{Pool, SlotId};
pub use score::{LevelSummary, SessionStats, MAX_MULTIPLIER, MIN_MULTIPLIER};
pub use snapshot::Snapshot;
pub use state::{
    Bullet, Enemy, EnemyKind, EscapePod, GameEvent, GamePhase, GameState, MovementPattern,
    PlayerState, PowerUp, PowerUpKind,
};
pub use tick::{InputAxes, TickInput, tick};
pub use timer::{Countdown, Interval};
pub use wave::{WaveDirector, WavePhase, start_wave};
