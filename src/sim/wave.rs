//! Wave director
//!
//! Drives a level's wave table: spawn cadence, pod cadence, wave length,
//! the rest between waves, and the boss-or-victory fallback once the table
//! runs out. All scheduling is countdown state advanced by the tick.

use glam::Vec2;
use rand::Rng;
use serde::Serialize;

use super::behavior;
use super::pool::SlotId;
use super::state::{Enemy, EnemyKind, EscapePod, GameEvent, GamePhase, GameState, MovementPattern};
use super::timer::{Countdown, Interval};
use crate::consts::*;
use crate::tuning::Tuning;

/// Director phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WavePhase {
    Idle,
    /// Wave running (spawning until quota, then waiting out the duration)
    Active,
    /// Rest between waves
    Resting,
    /// Boss encounter; ends only when the boss dies or the player does
    Boss,
    /// Session over, nothing will fire again
    Finished,
}

#[derive(Debug, Clone)]
pub struct WaveDirector {
    phase: WavePhase,
    wave: u32,
    spawned: u32,
    quota: u32,
    spawn_timer: Interval,
    pod_timer: Interval,
    wave_timer: Countdown,
    rest_timer: Countdown,
    boss: Option<SlotId>,
}

impl Default for WaveDirector {
    fn default() -> Self {
        Self::new()
    }
}

impl WaveDirector {
    pub fn new() -> Self {
        Self {
            phase: WavePhase::Idle,
            wave: 0,
            spawned: 0,
            quota: 0,
            spawn_timer: Interval::default(),
            pod_timer: Interval::default(),
            wave_timer: Countdown::default(),
            rest_timer: Countdown::default(),
            boss: None,
        }
    }

    pub fn phase(&self) -> WavePhase {
        self.phase
    }

    pub fn wave(&self) -> u32 {
        self.wave
    }

    /// Enemies spawned so far in the current wave
    pub fn spawned(&self) -> u32 {
        self.spawned
    }

    pub fn is_spawning(&self) -> bool {
        self.spawn_timer.is_armed()
    }

    /// Milliseconds left in the current wave or rest period
    pub fn time_remaining_ms(&self) -> u64 {
        match self.phase {
            WavePhase::Active => self.wave_timer.remaining_ms(),
            WavePhase::Resting => self.rest_timer.remaining_ms(),
            _ => 0,
        }
    }

    fn cancel_timers(&mut self) {
        self.spawn_timer.cancel();
        self.pod_timer.cancel();
        self.wave_timer.cancel();
        self.rest_timer.cancel();
    }

    /// Stop everything for good (session ended)
    pub fn halt(&mut self) {
        self.cancel_timers();
        self.phase = WavePhase::Finished;
    }
}

/// Begin wave `wave` of the current level, or fall back to boss/victory
/// when the table has no such wave
pub fn start_wave(state: &mut GameState, tuning: &Tuning, wave: u32) {
    if state.phase.is_finished() {
        return;
    }
    state.director.cancel_timers();

    let Some(cfg) = tuning.wave(state.level, wave) else {
        let boss_due = tuning
            .boss_after_wave(state.level)
            .is_some_and(|threshold| wave > threshold);
        if boss_due {
            start_boss(state, tuning, wave);
        } else {
            state.finish(GamePhase::Victory);
        }
        return;
    };

    let director = &mut state.director;
    director.phase = WavePhase::Active;
    director.wave = wave;
    director.spawned = 0;
    director.quota = cfg.enemy_count;
    director.boss = None;
    if cfg.enemy_count > 0 {
        director.spawn_timer.start(cfg.spawn_rate_ms);
    }
    director.pod_timer.start(tuning.pods.spawn_interval_ms);
    director.wave_timer.start(cfg.duration_ms);

    state.stats.current_wave = wave;
    state.events.push(GameEvent::WaveStarted { wave });
    log::info!(
        "Level {} wave {}: {} enemies every {}ms over {}ms (difficulty {})",
        state.level,
        wave,
        cfg.enemy_count,
        cfg.spawn_rate_ms,
        cfg.duration_ms,
        cfg.difficulty
    );
}

/// Advance the director's timers by one step and perform whatever they trigger
pub fn advance(state: &mut GameState, tuning: &Tuning, dt_ms: u64) {
    match state.director.phase {
        WavePhase::Active => {
            // Wave end first: spawns due on the same step are dropped with the wave
            if state.director.wave_timer.advance(dt_ms) {
                end_wave(state, tuning);
                return;
            }

            let due = state.director.spawn_timer.advance(dt_ms);
            for _ in 0..due {
                if state.director.spawned >= state.director.quota {
                    break;
                }
                if spawn_wave_enemy(state, tuning).is_some() {
                    state.director.spawned += 1;
                }
                if state.director.spawned >= state.director.quota {
                    state.director.spawn_timer.cancel();
                    log::debug!(
                        "Wave {} quota of {} reached",
                        state.director.wave,
                        state.director.quota
                    );
                }
            }

            spawn_due_pods(state, tuning, dt_ms);
        }
        WavePhase::Resting => {
            if state.director.rest_timer.advance(dt_ms) {
                let next = state.director.wave + 1;
                start_wave(state, tuning, next);
            }
        }
        WavePhase::Boss => {
            // Retry until a live boss exists; a recycled slot counts as none
            let alive = state
                .director
                .boss
                .is_some_and(|id| state.enemies.contains(id));
            if !alive {
                spawn_boss(state, tuning);
            }
            spawn_due_pods(state, tuning, dt_ms);
        }
        WavePhase::Idle | WavePhase::Finished => {}
    }
}

fn end_wave(state: &mut GameState, tuning: &Tuning) {
    let director = &mut state.director;
    director.cancel_timers();
    director.phase = WavePhase::Resting;
    director.rest_timer.start(tuning.rest_between_waves_ms);

    let wave = director.wave;
    state.events.push(GameEvent::WaveEnded { wave });
    log::info!(
        "Wave {} over ({} spawned), resting {}ms",
        wave,
        director.spawned,
        tuning.rest_between_waves_ms
    );
}

fn start_boss(state: &mut GameState, tuning: &Tuning, wave: u32) {
    let director = &mut state.director;
    director.phase = WavePhase::Boss;
    director.wave = wave;
    director.spawned = 0;
    director.quota = 1;
    director.boss = None;
    director.pod_timer.start(tuning.pods.spawn_interval_ms);
    state.stats.current_wave = wave;
    log::info!("Level {} boss encounter at wave {}", state.level, wave);
    spawn_boss(state, tuning);
}

fn spawn_boss(state: &mut GameState, tuning: &Tuning) {
    let stats = tuning.enemies.get(EnemyKind::Boss);
    let pos = Vec2::new(PLAY_WIDTH / 2.0, -stats.radius);
    let vel = behavior::initial_velocity(MovementPattern::Horizontal, stats.speed);
    let enemy = Enemy::new(
        EnemyKind::Boss,
        stats,
        MovementPattern::Horizontal,
        1.0,
        pos,
        vel,
        state.time_ms,
    );
    match state.enemies.activate(enemy) {
        Some(id) => {
            state.director.boss = Some(id);
            state.director.spawned = 1;
            state.events.push(GameEvent::BossSpawned {
                wave: state.director.wave,
            });
        }
        None => log::trace!("Enemy pool full, boss spawn deferred"),
    }
}

fn spawn_wave_enemy(state: &mut GameState, tuning: &Tuning) -> Option<SlotId> {
    let cfg = tuning.wave(state.level, state.director.wave)?;
    if cfg.enemy_types.is_empty() {
        return None;
    }
    let kind = cfg.enemy_types[state.rng.random_range(0..cfg.enemy_types.len())];
    spawn_enemy(state, tuning, kind, cfg.difficulty)
}

/// Spawn one enemy of `kind` just above the play area
pub fn spawn_enemy(
    state: &mut GameState,
    tuning: &Tuning,
    kind: EnemyKind,
    difficulty: f32,
) -> Option<SlotId> {
    let stats = tuning.enemies.get(kind);
    let pattern = if stats.patterns.is_empty() {
        MovementPattern::Straight
    } else {
        stats.patterns[state.rng.random_range(0..stats.patterns.len())]
    };
    let x = state
        .rng
        .random_range(LATERAL_MARGIN..=PLAY_WIDTH - LATERAL_MARGIN);
    let pos = Vec2::new(x, -stats.radius);
    let vel = behavior::initial_velocity(pattern, stats.speed);

    let mut enemy = Enemy::new(kind, stats, pattern, difficulty, pos, vel, state.time_ms);
    enemy.phase = state.rng.random_range(0.0..std::f32::consts::TAU);
    enemy.weave_offset = behavior::weave_offset(&tuning.movement, enemy.phase, state.time_ms);

    let id = state.enemies.activate(enemy);
    match id {
        Some(_) => log::debug!("Spawned {:?} ({:?}) at x={:.0}", kind, pattern, x),
        None => log::trace!("Enemy pool full, {:?} spawn skipped", kind),
    }
    id
}

fn spawn_due_pods(state: &mut GameState, tuning: &Tuning, dt_ms: u64) {
    let due = state.director.pod_timer.advance(dt_ms);
    for _ in 0..due {
        spawn_pod(state, tuning);
    }
}

/// Spawn an escape pod drifting down from the top edge
pub fn spawn_pod(state: &mut GameState, tuning: &Tuning) -> Option<SlotId> {
    let pods = &tuning.pods;
    let x = state
        .rng
        .random_range(LATERAL_MARGIN..=PLAY_WIDTH - LATERAL_MARGIN);
    let drift = pods.lateral_drift.abs();
    let vx = state.rng.random_range(-drift..=drift);
    let pod = EscapePod {
        pos: Vec2::new(x, -POD_RADIUS),
        vel: Vec2::new(vx, pods.drift_speed),
        health: pods.health,
        radius: POD_RADIUS,
    };
    let id = state.pods.activate(pod);
    if id.is_none() {
        log::trace!("Pod pool full, pod spawn skipped");
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::{LevelConfig, WaveConfig};

    fn scenario_tuning() -> Tuning {
        let mut tuning = Tuning::default();
        let wave = WaveConfig {
            enemy_count: 5,
            enemy_types: vec![EnemyKind::Fighter],
            spawn_rate_ms: 2000,
            duration_ms: 20000,
            difficulty: 1.0,
        };
        tuning.levels = vec![LevelConfig {
            waves: vec![wave.clone(), wave],
            boss_after_wave: None,
        }];
        tuning
    }

    fn run(state: &mut GameState, tuning: &Tuning, total_ms: u64) {
        for _ in 0..total_ms / SIM_STEP_MS {
            advance(state, tuning, SIM_STEP_MS);
        }
    }

    fn count_wave_ends(state: &GameState) -> usize {
        state
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::WaveEnded { .. }))
            .count()
    }

    #[test]
    fn test_quota_caps_spawns_and_wave_ends_once() {
        let tuning = scenario_tuning();
        let mut state = GameState::new(&tuning, 1, 7).unwrap();

        run(&mut state, &tuning, 10_000);
        assert_eq!(state.director.spawned(), 5);
        assert!(!state.director.is_spawning());

        // Ten spawn periods have elapsed by 20000ms but the quota held
        run(&mut state, &tuning, 10_000);
        assert_eq!(state.enemies.len(), 5);
        assert_eq!(count_wave_ends(&state), 1);
        assert_eq!(state.director.phase(), WavePhase::Resting);
    }

    #[test]
    fn test_next_wave_waits_for_full_duration() {
        let tuning = scenario_tuning();
        let mut state = GameState::new(&tuning, 1, 7).unwrap();

        run(&mut state, &tuning, 19_990);
        assert_eq!(state.director.phase(), WavePhase::Active);
        assert_eq!(state.director.wave(), 1);

        run(&mut state, &tuning, 10);
        assert_eq!(state.director.phase(), WavePhase::Resting);

        run(&mut state, &tuning, tuning.rest_between_waves_ms - 10);
        assert_eq!(state.director.wave(), 1);
        run(&mut state, &tuning, 10);
        assert_eq!(state.director.phase(), WavePhase::Active);
        assert_eq!(state.director.wave(), 2);
        assert_eq!(state.stats.current_wave, 2);
        assert_eq!(state.director.spawned(), 0);
    }

    #[test]
    fn test_single_large_step_spawns_every_due_enemy() {
        let tuning = scenario_tuning();
        let mut state = GameState::new(&tuning, 1, 3).unwrap();
        advance(&mut state, &tuning, 7000);
        assert_eq!(state.director.spawned(), 3);
    }

    #[test]
    fn test_pods_spawn_on_their_own_interval() {
        let tuning = scenario_tuning();
        let mut state = GameState::new(&tuning, 1, 9).unwrap();
        run(&mut state, &tuning, 20_000);
        // 8000 and 16000; the pod timer dies with the wave
        assert_eq!(state.pods.len(), 2);
        run(&mut state, &tuning, 2000);
        assert_eq!(state.pods.len(), 2);
    }

    #[test]
    fn test_running_out_of_waves_is_victory() {
        let tuning = scenario_tuning();
        let mut state = GameState::new(&tuning, 1, 1).unwrap();
        start_wave(&mut state, &tuning, 3);
        assert_eq!(state.phase, GamePhase::Victory);
        assert_eq!(state.director.phase(), WavePhase::Finished);
    }

    #[test]
    fn test_past_boss_threshold_spawns_boss() {
        let mut tuning = scenario_tuning();
        tuning.levels[0].boss_after_wave = Some(2);
        let mut state = GameState::new(&tuning, 1, 1).unwrap();
        start_wave(&mut state, &tuning, 3);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.director.phase(), WavePhase::Boss);
        assert_eq!(state.stats.current_wave, 3);
        let bosses = state
            .enemies
            .values()
            .filter(|e| e.kind == EnemyKind::Boss)
            .count();
        assert_eq!(bosses, 1);
        assert!(state.events.contains(&GameEvent::BossSpawned { wave: 3 }));
    }

    #[test]
    fn test_boss_lost_without_a_kill_is_respawned() {
        let mut tuning = scenario_tuning();
        tuning.levels[0].boss_after_wave = Some(2);
        let mut state = GameState::new(&tuning, 1, 1).unwrap();
        start_wave(&mut state, &tuning, 3);
        let first = state.enemies.ids()[0];

        // Slot freed behind the director's back (e.g. drifted off-screen)
        state.enemies.deactivate(first);
        advance(&mut state, &tuning, SIM_STEP_MS);
        let bosses: Vec<_> = state
            .enemies
            .iter()
            .filter(|(_, e)| e.kind == EnemyKind::Boss)
            .map(|(id, _)| id)
            .collect();
        assert_eq!(bosses.len(), 1);
        assert_ne!(bosses[0], first);

        // A live boss is not duplicated
        advance(&mut state, &tuning, SIM_STEP_MS);
        assert_eq!(state.enemies.len(), 1);
    }

    #[test]
    fn test_threshold_not_exceeded_is_victory() {
        let mut tuning = scenario_tuning();
        tuning.levels[0].boss_after_wave = Some(3);
        let mut state = GameState::new(&tuning, 1, 1).unwrap();
        start_wave(&mut state, &tuning, 3);
        assert_eq!(state.phase, GamePhase::Victory);
    }

    #[test]
    fn test_finished_session_never_spawns_again() {
        let tuning = scenario_tuning();
        let mut state = GameState::new(&tuning, 1, 1).unwrap();
        run(&mut state, &tuning, 2000);
        assert_eq!(state.enemies.len(), 1);
        state.finish(GamePhase::GameOver);
        run(&mut state, &tuning, 60_000);
        assert_eq!(state.enemies.len(), 1);
        assert_eq!(state.pods.len(), 0);
        assert_eq!(state.director.phase(), WavePhase::Finished);
    }
}
