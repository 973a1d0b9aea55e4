//! Read-only view of the simulation for HUD and sprite rendering

use glam::Vec2;
use serde::Serialize;

use super::effects::ActiveEffect;
use super::score::SessionStats;
use super::state::{EnemyKind, GamePhase, GameState, PlayerState, PowerUpKind};
use super::wave::WavePhase;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnemyView {
    pub kind: EnemyKind,
    pub pos: Vec2,
    pub health: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PodView {
    pub pos: Vec2,
    pub health: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PowerUpView {
    pub kind: PowerUpKind,
    pub pos: Vec2,
}

/// Everything the presentation layer may draw this frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub time_ms: u64,
    pub level: u32,
    pub phase: GamePhase,
    pub wave_phase: WavePhase,
    /// Milliseconds left in the current wave or rest
    pub wave_time_remaining_ms: u64,
    pub player: PlayerState,
    pub stats: SessionStats,
    pub effects: Vec<ActiveEffect>,
    pub enemies: Vec<EnemyView>,
    pub pods: Vec<PodView>,
    pub power_ups: Vec<PowerUpView>,
    pub bullets: Vec<Vec2>,
    pub enemy_bullets: Vec<Vec2>,
}

impl Snapshot {
    pub fn capture(state: &GameState) -> Self {
        Self {
            time_ms: state.time_ms,
            level: state.level,
            phase: state.phase,
            wave_phase: state.director.phase(),
            wave_time_remaining_ms: state.director.time_remaining_ms(),
            player: state.player.clone(),
            stats: state.stats.clone(),
            effects: state.effects.active().to_vec(),
            enemies: state
                .enemies
                .values()
                .map(|e| EnemyView {
                    kind: e.kind,
                    pos: e.pos,
                    health: e.health,
                })
                .collect(),
            pods: state
                .pods
                .values()
                .map(|p| PodView {
                    pos: p.pos,
                    health: p.health,
                })
                .collect(),
            power_ups: state
                .power_ups
                .values()
                .map(|p| PowerUpView {
                    kind: p.kind,
                    pos: p.pos,
                })
                .collect(),
            bullets: state.bullets.values().map(|b| b.pos).collect(),
            enemy_bullets: state.enemy_bullets.values().map(|b| b.pos).collect(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::Tuning;

    #[test]
    fn test_snapshot_reflects_state() {
        let tuning = Tuning::default();
        let mut state = GameState::new(&tuning, 1, 4).unwrap();
        crate::sim::wave::spawn_pod(&mut state, &tuning);
        let snap = Snapshot::capture(&state);
        assert_eq!(snap.level, 1);
        assert_eq!(snap.stats.current_wave, 1);
        assert_eq!(snap.wave_phase, WavePhase::Active);
        assert_eq!(snap.pods.len(), 1);
        assert_eq!(snap.player.health, tuning.player.max_health);

        let json = snap.to_json().unwrap();
        assert!(json.contains("\"phase\":\"Playing\""));
        assert!(json.contains("\"pods\":[{"));
    }
}
