//! Data-driven game balance
//!
//! Wave tables, enemy and power-up stat tables, and the player/pod base
//! stats. Loaded once (built-in campaign or JSON) and only ever read by the
//! simulation afterwards.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::consts::OFFSCREEN_MARGIN;
use crate::sim::state::{EnemyKind, MovementPattern, PowerUpKind};

/// One wave of a level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveConfig {
    /// Enemies spawned before the spawn timer is cancelled
    pub enemy_count: u32,
    /// Uniform pool to draw enemy kinds from (repeat a kind to weight it)
    pub enemy_types: Vec<EnemyKind>,
    /// Milliseconds between spawns
    pub spawn_rate_ms: u64,
    /// Wave length in milliseconds, independent of the quota
    pub duration_ms: u64,
    /// Enemy health multiplier
    #[serde(default = "default_difficulty")]
    pub difficulty: f32,
}

fn default_difficulty() -> f32 {
    1.0
}

/// A level: ordered waves plus an optional boss threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    pub waves: Vec<WaveConfig>,
    /// Waves past this number (with no config) trigger the boss instead of victory
    #[serde(default)]
    pub boss_after_wave: Option<u32>,
}

/// Per-kind enemy stats
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyStats {
    pub health: u32,
    pub points: u32,
    /// Downward speed for straight/weaving/zigzag, entry speed for horizontal (pixels/s)
    pub speed: f32,
    pub fire_rate_ms: u64,
    pub bullet_speed: f32,
    pub radius: f32,
    /// Movement patterns this kind may be spawned with (picked uniformly)
    pub patterns: Vec<MovementPattern>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyTable {
    pub fighter: EnemyStats,
    pub cruiser: EnemyStats,
    pub battleship: EnemyStats,
    pub boss: EnemyStats,
}

impl EnemyTable {
    pub fn get(&self, kind: EnemyKind) -> &EnemyStats {
        match kind {
            EnemyKind::Fighter => &self.fighter,
            EnemyKind::Cruiser => &self.cruiser,
            EnemyKind::Battleship => &self.battleship,
            EnemyKind::Boss => &self.boss,
        }
    }
}

/// Per-kind power-up stats
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerUpStats {
    pub points: u32,
    /// Shield: shield points restored. Rapid fire: fraction shaved off the
    /// fire interval. Speed boost and score multiplier: scale factor.
    pub amount: f32,
    /// Zero for instant effects
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerUpTable {
    pub shield: PowerUpStats,
    pub rapid_fire: PowerUpStats,
    pub speed_boost: PowerUpStats,
    pub score_multiplier: PowerUpStats,
}

impl PowerUpTable {
    pub fn get(&self, kind: PowerUpKind) -> &PowerUpStats {
        match kind {
            PowerUpKind::Shield => &self.shield,
            PowerUpKind::RapidFire => &self.rapid_fire,
            PowerUpKind::SpeedBoost => &self.speed_boost,
            PowerUpKind::ScoreMultiplier => &self.score_multiplier,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerBase {
    pub max_health: u32,
    pub max_shields: u32,
    /// Pixels/s at full input deflection
    pub speed: f32,
    /// Milliseconds between shots
    pub fire_rate_ms: f32,
    pub radius: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodStats {
    pub health: u32,
    pub spawn_interval_ms: u64,
    pub drift_speed: f32,
    /// Maximum lateral drift either way (pixels/s)
    pub lateral_drift: f32,
    /// Fraction of play height below which a pod can be rescued
    pub safe_zone_fraction: f32,
    pub rescue_points: u32,
}

/// Resolver and behavior constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatTuning {
    pub bullet_damage: u32,
    pub enemy_bullet_damage: u32,
    pub contact_damage: u32,
    /// Probability of a power-up dropping from a destroyed enemy
    pub drop_chance: f64,
    pub rescue_multiplier_step: f32,
    pub loss_multiplier_step: f32,
    /// Enemies shoot at pods closer than this
    pub pod_engagement_radius: f32,
    /// Minimum gap between pod-aimed shots; 0 fires every tick the pod is in range
    #[serde(default)]
    pub pod_fire_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementTuning {
    pub weave_amplitude: f32,
    /// Radians per second
    pub weave_frequency: f32,
    pub zigzag_half_period_ms: u64,
    pub zigzag_speed: f32,
    /// Fraction of play height where horizontal patrollers stop descending
    pub patrol_band_fraction: f32,
    pub patrol_speed: f32,
}

/// Complete balance data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tuning {
    pub levels: Vec<LevelConfig>,
    pub enemies: EnemyTable,
    pub power_ups: PowerUpTable,
    pub player: PlayerBase,
    pub pods: PodStats,
    pub combat: CombatTuning,
    pub movement: MovementTuning,
    pub rest_between_waves_ms: u64,
}

/// Configuration defect found while loading or validating tuning data
#[derive(Debug, Clone, PartialEq)]
pub enum TuningError {
    Parse(String),
    NoLevels,
    UnknownLevel { level: u32 },
    EmptyLevel { level: u32 },
    EmptyEnemyPool { level: u32, wave: u32 },
    ZeroSpawnRate { level: u32, wave: u32 },
    ZeroDuration { level: u32, wave: u32 },
    NoPatterns { kind: EnemyKind },
    OversizedEnemy { kind: EnemyKind, radius: f32 },
    InvalidAmount { kind: PowerUpKind, amount: f32 },
    ZeroPodInterval,
}

impl fmt::Display for TuningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(msg) => write!(f, "tuning parse error: {msg}"),
            Self::NoLevels => write!(f, "tuning has no levels"),
            Self::UnknownLevel { level } => write!(f, "no level {level} in tuning"),
            Self::EmptyLevel { level } => write!(f, "level {level} has no waves"),
            Self::EmptyEnemyPool { level, wave } => {
                write!(f, "level {level} wave {wave} has an empty enemy pool")
            }
            Self::ZeroSpawnRate { level, wave } => {
                write!(f, "level {level} wave {wave} has a zero spawn rate")
            }
            Self::ZeroDuration { level, wave } => {
                write!(f, "level {level} wave {wave} has a zero duration")
            }
            Self::NoPatterns { kind } => write!(f, "enemy kind {kind:?} has no movement patterns"),
            Self::OversizedEnemy { kind, radius } => write!(
                f,
                "enemy kind {kind:?} radius {radius} would spawn past the recycle margin"
            ),
            Self::InvalidAmount { kind, amount } => {
                write!(f, "power-up {kind:?} has invalid amount {amount}")
            }
            Self::ZeroPodInterval => write!(f, "pod spawn interval must be non-zero"),
        }
    }
}

impl std::error::Error for TuningError {}

impl Tuning {
    /// Parse and validate tuning JSON
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning =
            serde_json::from_str(json).map_err(|e| TuningError::Parse(e.to_string()))?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject data the simulation can't run on
    pub fn validate(&self) -> Result<(), TuningError> {
        if self.levels.is_empty() {
            return Err(TuningError::NoLevels);
        }
        for (li, level) in self.levels.iter().enumerate() {
            let level_no = li as u32 + 1;
            if level.waves.is_empty() {
                return Err(TuningError::EmptyLevel { level: level_no });
            }
            for (wi, wave) in level.waves.iter().enumerate() {
                let wave_no = wi as u32 + 1;
                if wave.enemy_types.is_empty() && wave.enemy_count > 0 {
                    return Err(TuningError::EmptyEnemyPool {
                        level: level_no,
                        wave: wave_no,
                    });
                }
                if wave.spawn_rate_ms == 0 {
                    return Err(TuningError::ZeroSpawnRate {
                        level: level_no,
                        wave: wave_no,
                    });
                }
                if wave.duration_ms == 0 {
                    return Err(TuningError::ZeroDuration {
                        level: level_no,
                        wave: wave_no,
                    });
                }
            }
        }

        for kind in EnemyKind::ALL {
            let stats = self.enemies.get(kind);
            if stats.patterns.is_empty() {
                return Err(TuningError::NoPatterns { kind });
            }
            // Enemies spawn at y = -radius and must not start off-screen
            if stats.radius.is_nan() || stats.radius >= OFFSCREEN_MARGIN {
                return Err(TuningError::OversizedEnemy {
                    kind,
                    radius: stats.radius,
                });
            }
        }

        for kind in PowerUpKind::ALL {
            let amount = self.power_ups.get(kind).amount;
            let valid = match kind {
                PowerUpKind::Shield => amount >= 0.0,
                PowerUpKind::RapidFire => (0.0..1.0).contains(&amount),
                PowerUpKind::SpeedBoost | PowerUpKind::ScoreMultiplier => amount > 0.0,
            };
            if !valid {
                return Err(TuningError::InvalidAmount { kind, amount });
            }
        }

        if self.pods.spawn_interval_ms == 0 {
            return Err(TuningError::ZeroPodInterval);
        }
        Ok(())
    }

    /// Level config (1-based)
    pub fn level(&self, level: u32) -> Result<&LevelConfig, TuningError> {
        level
            .checked_sub(1)
            .and_then(|i| self.levels.get(i as usize))
            .ok_or(TuningError::UnknownLevel { level })
    }

    /// Wave config (both 1-based); `None` past the last configured wave
    pub fn wave(&self, level: u32, wave: u32) -> Option<&WaveConfig> {
        let level = self.level(level).ok()?;
        wave.checked_sub(1)
            .and_then(|i| level.waves.get(i as usize))
    }

    /// Boss threshold for a level
    pub fn boss_after_wave(&self, level: u32) -> Option<u32> {
        self.level(level).ok().and_then(|l| l.boss_after_wave)
    }

    pub fn level_count(&self) -> u32 {
        self.levels.len() as u32
    }
}

fn wave(
    enemy_count: u32,
    enemy_types: &[EnemyKind],
    spawn_rate_ms: u64,
    duration_ms: u64,
    difficulty: f32,
) -> WaveConfig {
    WaveConfig {
        enemy_count,
        enemy_types: enemy_types.to_vec(),
        spawn_rate_ms,
        duration_ms,
        difficulty,
    }
}

impl Default for Tuning {
    /// Built-in three-level campaign
    fn default() -> Self {
        use EnemyKind::*;
        use MovementPattern::*;

        let levels = vec![
            LevelConfig {
                waves: vec![
                    wave(5, &[Fighter], 2000, 20000, 1.0),
                    wave(8, &[Fighter, Fighter, Cruiser], 1800, 25000, 1.0),
                    wave(10, &[Fighter, Cruiser], 1500, 30000, 1.2),
                ],
                boss_after_wave: None,
            },
            LevelConfig {
                waves: vec![
                    wave(8, &[Fighter, Cruiser], 1600, 22000, 1.2),
                    wave(10, &[Fighter, Cruiser, Cruiser], 1400, 26000, 1.3),
                    wave(12, &[Fighter, Cruiser, Battleship], 1300, 30000, 1.4),
                    wave(12, &[Cruiser, Battleship], 1200, 32000, 1.5),
                ],
                boss_after_wave: Some(4),
            },
            LevelConfig {
                waves: vec![
                    wave(10, &[Fighter, Fighter, Cruiser], 1200, 24000, 1.5),
                    wave(12, &[Fighter, Cruiser, Battleship], 1100, 28000, 1.6),
                    wave(14, &[Cruiser, Battleship], 1000, 30000, 1.8),
                    wave(14, &[Fighter, Cruiser, Battleship], 900, 32000, 2.0),
                    wave(16, &[Cruiser, Battleship, Battleship], 800, 36000, 2.2),
                ],
                boss_after_wave: Some(5),
            },
        ];

        Self {
            levels,
            enemies: EnemyTable {
                fighter: EnemyStats {
                    health: 10,
                    points: 100,
                    speed: 120.0,
                    fire_rate_ms: 2200,
                    bullet_speed: 220.0,
                    radius: 14.0,
                    patterns: vec![Straight, Zigzag, Weaving],
                },
                cruiser: EnemyStats {
                    health: 30,
                    points: 250,
                    speed: 80.0,
                    fire_rate_ms: 1600,
                    bullet_speed: 250.0,
                    radius: 20.0,
                    patterns: vec![Weaving, Straight],
                },
                battleship: EnemyStats {
                    health: 80,
                    points: 600,
                    speed: 50.0,
                    fire_rate_ms: 1200,
                    bullet_speed: 280.0,
                    radius: 30.0,
                    patterns: vec![Horizontal],
                },
                boss: EnemyStats {
                    health: 600,
                    points: 5000,
                    speed: 60.0,
                    fire_rate_ms: 500,
                    bullet_speed: 320.0,
                    radius: 48.0,
                    patterns: vec![Horizontal],
                },
            },
            power_ups: PowerUpTable {
                shield: PowerUpStats {
                    points: 50,
                    amount: 25.0,
                    duration_ms: 0,
                },
                rapid_fire: PowerUpStats {
                    points: 50,
                    amount: 0.5,
                    duration_ms: 10000,
                },
                speed_boost: PowerUpStats {
                    points: 50,
                    amount: 1.5,
                    duration_ms: 8000,
                },
                score_multiplier: PowerUpStats {
                    points: 100,
                    amount: 2.0,
                    duration_ms: 10000,
                },
            },
            player: PlayerBase {
                max_health: 100,
                max_shields: 50,
                speed: 300.0,
                fire_rate_ms: 250.0,
                radius: 16.0,
            },
            pods: PodStats {
                health: 3,
                spawn_interval_ms: 8000,
                drift_speed: 40.0,
                lateral_drift: 20.0,
                safe_zone_fraction: 0.7,
                rescue_points: 500,
            },
            combat: CombatTuning {
                bullet_damage: 10,
                enemy_bullet_damage: 10,
                contact_damage: 30,
                drop_chance: 0.15,
                rescue_multiplier_step: 0.5,
                loss_multiplier_step: 0.5,
                pod_engagement_radius: 150.0,
                pod_fire_interval_ms: 0,
            },
            movement: MovementTuning {
                weave_amplitude: 60.0,
                weave_frequency: 2.0,
                zigzag_half_period_ms: 1000,
                zigzag_speed: 100.0,
                patrol_band_fraction: 0.15,
                patrol_speed: 120.0,
            },
            rest_between_waves_ms: 3000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tuning_is_valid() {
        let tuning = Tuning::default();
        assert!(tuning.validate().is_ok());
        assert_eq!(tuning.level_count(), 3);
    }

    #[test]
    fn test_json_roundtrip_keeps_tables() {
        let tuning = Tuning::default();
        let json = serde_json::to_string(&tuning).unwrap();
        let parsed = Tuning::from_json(&json).unwrap();
        assert_eq!(parsed, tuning);
    }

    #[test]
    fn test_unknown_enemy_kind_is_rejected_at_parse() {
        let json = serde_json::to_string(&Tuning::default())
            .unwrap()
            .replacen("\"fighter\"", "\"dreadnought\"", 1);
        assert!(matches!(Tuning::from_json(&json), Err(TuningError::Parse(_))));
    }

    #[test]
    fn test_empty_enemy_pool_is_rejected() {
        let mut tuning = Tuning::default();
        tuning.levels[0].waves[1].enemy_types.clear();
        assert_eq!(
            tuning.validate(),
            Err(TuningError::EmptyEnemyPool { level: 1, wave: 2 })
        );
    }

    #[test]
    fn test_enemy_wider_than_recycle_margin_is_rejected() {
        let mut tuning = Tuning::default();
        tuning.enemies.boss.radius = OFFSCREEN_MARGIN + 10.0;
        assert!(matches!(
            tuning.validate(),
            Err(TuningError::OversizedEnemy {
                kind: EnemyKind::Boss,
                ..
            })
        ));
    }

    #[test]
    fn test_rapid_fire_amount_must_be_a_fraction() {
        let mut tuning = Tuning::default();
        tuning.power_ups.rapid_fire.amount = 1.0;
        assert!(matches!(
            tuning.validate(),
            Err(TuningError::InvalidAmount {
                kind: PowerUpKind::RapidFire,
                ..
            })
        ));
    }

    #[test]
    fn test_wave_lookup_is_one_based() {
        let tuning = Tuning::default();
        assert_eq!(tuning.wave(1, 1).map(|w| w.enemy_count), Some(5));
        assert!(tuning.wave(1, 0).is_none());
        assert!(tuning.wave(1, 4).is_none());
        assert!(tuning.wave(9, 1).is_none());
        assert_eq!(tuning.boss_after_wave(2), Some(4));
        assert_eq!(tuning.level(0), Err(TuningError::UnknownLevel { level: 0 }));
    }
}
