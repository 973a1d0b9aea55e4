//! Game state and core simulation types
//!
//! Everything one level attempt owns lives in [`GameState`].

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::effects::EffectTracker;
use super::pool::Pool;
use super::score::{LevelSummary, SessionStats};
use super::wave::{self, WaveDirector};
use crate::consts::*;
use crate::tuning::{EnemyStats, PlayerBase, Tuning, TuningError};

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Playing,
    /// Game is paused (timers frozen)
    Paused,
    /// Level cleared
    Victory,
    /// Player destroyed
    GameOver,
}

impl GamePhase {
    pub fn is_finished(&self) -> bool {
        matches!(self, GamePhase::Victory | GamePhase::GameOver)
    }
}

/// Enemy types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    Fighter,
    Cruiser,
    Battleship,
    Boss,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 4] = [
        EnemyKind::Fighter,
        EnemyKind::Cruiser,
        EnemyKind::Battleship,
        EnemyKind::Boss,
    ];
}

/// Enemy movement patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementPattern {
    /// Constant downward velocity
    Straight,
    /// Sine-wave lateral offset while descending
    Weaving,
    /// Lateral velocity flips every half period
    Zigzag,
    /// Descend to the patrol band, then bounce between the side margins
    Horizontal,
}

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerUpKind {
    Shield,
    RapidFire,
    SpeedBoost,
    ScoreMultiplier,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 4] = [
        PowerUpKind::Shield,
        PowerUpKind::RapidFire,
        PowerUpKind::SpeedBoost,
        PowerUpKind::ScoreMultiplier,
    ];
}

/// The player's ship
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerState {
    pub pos: Vec2,
    pub radius: f32,
    pub health: u32,
    pub max_health: u32,
    pub shields: u32,
    pub max_shields: u32,
    /// Pixels/s
    pub speed: f32,
    /// Milliseconds between shots
    pub fire_rate_ms: f32,
    /// Timestamp of the last shot; `None` until the first shot
    pub last_fired_ms: Option<u64>,
}

impl PlayerState {
    /// Fresh ship near the bottom center, full health and shields
    pub fn from_base(base: &PlayerBase) -> Self {
        Self {
            pos: Vec2::new(PLAY_WIDTH / 2.0, PLAY_HEIGHT - 60.0),
            radius: base.radius,
            health: base.max_health,
            max_health: base.max_health,
            shields: base.max_shields,
            max_shields: base.max_shields,
            speed: base.speed,
            fire_rate_ms: base.fire_rate_ms,
            last_fired_ms: None,
        }
    }

    /// Shields soak damage first, the rest carries into health.
    /// Returns true if this hit destroyed the ship.
    pub fn apply_damage(&mut self, damage: u32) -> bool {
        let absorbed = damage.min(self.shields);
        self.shields -= absorbed;
        let overflow = damage - absorbed;
        let was_alive = self.health > 0;
        self.health = self.health.saturating_sub(overflow);
        was_alive && self.health == 0
    }

    /// Additive shield restore capped at max
    pub fn restore_shields(&mut self, amount: u32) {
        self.shields = self.shields.saturating_add(amount).min(self.max_shields);
    }

    pub fn is_destroyed(&self) -> bool {
        self.health == 0
    }

    /// Whether the fire cooldown has elapsed at `now`
    pub fn can_fire(&self, now: u64) -> bool {
        match self.last_fired_ms {
            None => true,
            Some(last) => now.saturating_sub(last) as f32 >= self.fire_rate_ms,
        }
    }
}

/// An enemy ship
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Enemy {
    pub kind: EnemyKind,
    pub health: u32,
    pub points: u32,
    pub fire_rate_ms: u64,
    pub bullet_speed: f32,
    pub last_fired_ms: u64,
    /// Last pod-aimed shot, for the optional pod fire interval
    pub last_pod_fire_ms: Option<u64>,
    pub pattern: MovementPattern,
    /// Random weave phase (radians)
    pub phase: f32,
    /// Weave offset applied last tick
    pub weave_offset: f32,
    /// Horizontal patroller has reached its band
    pub patrolling: bool,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
}

impl Enemy {
    /// Build an enemy from its stat row. Health is scaled by wave difficulty
    /// and never drops below 1.
    pub fn new(
        kind: EnemyKind,
        stats: &EnemyStats,
        pattern: MovementPattern,
        difficulty: f32,
        pos: Vec2,
        vel: Vec2,
        now: u64,
    ) -> Self {
        let health = ((stats.health as f32) * difficulty).round().max(1.0) as u32;
        Self {
            kind,
            health,
            points: stats.points,
            fire_rate_ms: stats.fire_rate_ms,
            bullet_speed: stats.bullet_speed,
            last_fired_ms: now,
            last_pod_fire_ms: None,
            pattern,
            phase: 0.0,
            weave_offset: 0.0,
            patrolling: false,
            pos,
            vel,
            radius: stats.radius,
        }
    }

    /// Subtract damage; true when this hit destroyed the enemy
    pub fn take_damage(&mut self, damage: u32) -> bool {
        self.health = self.health.saturating_sub(damage);
        self.health == 0
    }
}

/// A bullet (player or enemy; the pool decides the owner)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bullet {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
}

impl Bullet {
    pub fn new(pos: Vec2, vel: Vec2) -> Self {
        Self {
            pos,
            vel,
            radius: BULLET_RADIUS,
        }
    }
}

/// An escape pod drifting down the screen
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EscapePod {
    pub pos: Vec2,
    pub vel: Vec2,
    pub health: u32,
    pub radius: f32,
}

/// A falling power-up
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PowerUp {
    pub kind: PowerUpKind,
    pub points: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
}

/// Notable outcomes, drained by the presentation layer each frame
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    WaveStarted { wave: u32 },
    WaveEnded { wave: u32 },
    BossSpawned { wave: u32 },
    EnemyDestroyed { kind: EnemyKind, pos: Vec2, points: u64 },
    Explosion { pos: Vec2 },
    PlayerHit { damage: u32 },
    PodRescued { pos: Vec2, points: u64 },
    PodDestroyed { pos: Vec2 },
    PowerUpCollected { kind: PowerUpKind, points: u64 },
    PowerUpExpired { kind: PowerUpKind },
    Victory,
    GameOver,
}

/// Complete state for one level attempt
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Level number (1-based)
    pub level: u32,
    pub rng: Pcg32,
    /// Simulation clock (ms since level start, frozen while paused)
    pub time_ms: u64,
    pub phase: GamePhase,
    pub player: PlayerState,
    pub stats: SessionStats,
    pub director: WaveDirector,
    pub effects: EffectTracker,
    pub bullets: Pool<Bullet>,
    pub enemies: Pool<Enemy>,
    pub enemy_bullets: Pool<Bullet>,
    pub pods: Pool<EscapePod>,
    pub power_ups: Pool<PowerUp>,
    /// Events since the last drain
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// Create a level attempt and start its first wave
    pub fn new(tuning: &Tuning, level: u32, seed: u64) -> Result<Self, TuningError> {
        tuning.level(level)?;
        let mut state = Self::fresh(tuning, level, seed);
        wave::start_wave(&mut state, tuning, 1);
        Ok(state)
    }

    /// Reset to the start of the same level with the same seed
    pub fn restart(&mut self, tuning: &Tuning) {
        *self = Self::fresh(tuning, self.level, self.seed);
        wave::start_wave(self, tuning, 1);
    }

    fn fresh(tuning: &Tuning, level: u32, seed: u64) -> Self {
        Self {
            seed,
            level,
            rng: Pcg32::seed_from_u64(seed),
            time_ms: 0,
            phase: GamePhase::Playing,
            player: PlayerState::from_base(&tuning.player),
            stats: SessionStats::new(),
            director: WaveDirector::new(),
            effects: EffectTracker::new(),
            bullets: Pool::with_capacity(MAX_BULLETS),
            enemies: Pool::with_capacity(MAX_ENEMIES),
            enemy_bullets: Pool::with_capacity(MAX_ENEMY_BULLETS),
            pods: Pool::with_capacity(MAX_PODS),
            power_ups: Pool::with_capacity(MAX_POWER_UPS),
            events: Vec::new(),
        }
    }

    /// End the session. Cancels every pending timer so nothing spawns afterwards.
    pub fn finish(&mut self, phase: GamePhase) {
        if self.phase.is_finished() {
            return;
        }
        self.phase = phase;
        self.director.halt();
        match phase {
            GamePhase::Victory => {
                log::info!(
                    "Level {} cleared at wave {} with score {}",
                    self.level,
                    self.stats.current_wave,
                    self.stats.score
                );
                self.events.push(GameEvent::Victory);
            }
            GamePhase::GameOver => {
                log::info!(
                    "Player destroyed on level {} wave {} (score {})",
                    self.level,
                    self.stats.current_wave,
                    self.stats.score
                );
                self.events.push(GameEvent::GameOver);
            }
            _ => {}
        }
    }

    /// Take the events accumulated since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// End-of-level record
    pub fn summary(&self) -> LevelSummary {
        self.stats.summary(self.level, self.phase == GamePhase::Victory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn player(health: u32, shields: u32) -> PlayerState {
        let mut p = PlayerState::from_base(&Tuning::default().player);
        p.health = health;
        p.shields = shields;
        p
    }

    #[test]
    fn test_new_state_starts_first_wave() {
        let tuning = Tuning::default();
        let state = GameState::new(&tuning, 1, 42).unwrap();
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.stats.current_wave, 1);
        assert_eq!(state.stats.score_multiplier, 1.0);
        assert!(state.enemies.is_empty());
    }

    #[test]
    fn test_unknown_level_is_an_error() {
        let tuning = Tuning::default();
        assert!(GameState::new(&tuning, 7, 42).is_err());
    }

    #[test]
    fn test_finish_is_sticky() {
        let tuning = Tuning::default();
        let mut state = GameState::new(&tuning, 1, 1).unwrap();
        state.finish(GamePhase::GameOver);
        state.finish(GamePhase::Victory);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(state.drain_events().last(), Some(&GameEvent::GameOver));
        assert!(!state.summary().victory);
    }

    #[test]
    fn test_damage_overflow_into_health() {
        let mut p = player(100, 20);
        let destroyed = p.apply_damage(30);
        assert!(!destroyed);
        assert_eq!(p.shields, 0);
        assert_eq!(p.health, 90);
    }

    #[test]
    fn test_lethal_damage_reports_destruction_once() {
        let mut p = player(10, 0);
        assert!(p.apply_damage(25));
        assert_eq!(p.health, 0);
        assert!(!p.apply_damage(5));
    }

    #[test]
    fn test_difficulty_scales_enemy_health() {
        let tuning = Tuning::default();
        let stats = tuning.enemies.get(EnemyKind::Cruiser);
        let e = Enemy::new(
            EnemyKind::Cruiser,
            stats,
            MovementPattern::Straight,
            1.5,
            Vec2::ZERO,
            Vec2::ZERO,
            0,
        );
        assert_eq!(e.health, 45);
        let weak = Enemy::new(
            EnemyKind::Cruiser,
            stats,
            MovementPattern::Straight,
            0.0,
            Vec2::ZERO,
            Vec2::ZERO,
            0,
        );
        assert_eq!(weak.health, 1);
    }

    proptest! {
        #[test]
        fn prop_shields_absorb_small_hits(shields in 0u32..200, health in 1u32..200, d in 0u32..200) {
            prop_assume!(d <= shields);
            let mut p = player(health, shields);
            p.apply_damage(d);
            prop_assert_eq!(p.shields, shields - d);
            prop_assert_eq!(p.health, health);
        }

        #[test]
        fn prop_overflow_carries_into_health(shields in 0u32..200, health in 1u32..200, d in 0u32..400) {
            prop_assume!(d > shields);
            let mut p = player(health, shields);
            p.apply_damage(d);
            prop_assert_eq!(p.shields, 0);
            prop_assert_eq!(p.health, health.saturating_sub(d - shields));
        }

        #[test]
        fn prop_shield_restore_never_exceeds_max(shields in 0u32..50, amount in 0u32..500) {
            let mut p = player(100, shields);
            p.restore_shields(amount);
            prop_assert!(p.shields <= p.max_shields);
            prop_assert_eq!(p.shields, (shields + amount).min(p.max_shields));
        }
    }
}
