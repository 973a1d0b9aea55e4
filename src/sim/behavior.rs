//! Enemy behavior: movement patterns and fire control
//!
//! Runs once per tick after spawning and before collision resolution.

use glam::Vec2;

use super::pool::Pool;
use super::state::{Bullet, Enemy, EscapePod, GameState, MovementPattern};
use crate::consts::*;
use crate::is_offscreen;
use crate::tuning::{MovementTuning, Tuning};

/// Spawn velocity for a pattern. Everything enters moving straight down;
/// zigzag and horizontal pick up their lateral motion in [`move_enemy`].
pub fn initial_velocity(pattern: MovementPattern, speed: f32) -> Vec2 {
    match pattern {
        MovementPattern::Straight
        | MovementPattern::Weaving
        | MovementPattern::Zigzag
        | MovementPattern::Horizontal => Vec2::new(0.0, speed),
    }
}

/// Lateral weave offset at `now` for a given phase
pub fn weave_offset(movement: &MovementTuning, phase: f32, now: u64) -> f32 {
    let t = now as f32 / 1000.0;
    movement.weave_amplitude * (t * movement.weave_frequency + phase).sin()
}

/// Zigzag lateral direction: flips every half period regardless of phase
pub fn zigzag_sign(movement: &MovementTuning, now: u64) -> f32 {
    let half = movement.zigzag_half_period_ms.max(1);
    if (now / half).is_multiple_of(2) {
        1.0
    } else {
        -1.0
    }
}

/// Apply one step of an enemy's movement pattern
pub fn move_enemy(enemy: &mut Enemy, movement: &MovementTuning, now: u64, dt: f32) {
    match enemy.pattern {
        MovementPattern::Straight => {}
        MovementPattern::Weaving => {
            let offset = weave_offset(movement, enemy.phase, now);
            enemy.pos.x += offset - enemy.weave_offset;
            enemy.weave_offset = offset;
        }
        MovementPattern::Zigzag => {
            enemy.vel.x = zigzag_sign(movement, now) * movement.zigzag_speed;
        }
        MovementPattern::Horizontal => {
            let band = PLAY_HEIGHT * movement.patrol_band_fraction;
            if !enemy.patrolling {
                if enemy.pos.y >= band {
                    enemy.patrolling = true;
                    enemy.pos.y = band;
                    // Head for the far side first
                    let dir = if enemy.pos.x < PLAY_WIDTH / 2.0 { 1.0 } else { -1.0 };
                    enemy.vel = Vec2::new(dir * movement.patrol_speed, 0.0);
                }
            } else if enemy.pos.x <= LATERAL_MARGIN {
                enemy.vel.x = enemy.vel.x.abs();
            } else if enemy.pos.x >= PLAY_WIDTH - LATERAL_MARGIN {
                enemy.vel.x = -enemy.vel.x.abs();
            }
        }
    }
    enemy.pos += enemy.vel * dt;
}

/// Straight-line aim (no lead) at `speed`
pub fn aim(from: Vec2, target: Vec2, speed: f32) -> Vec2 {
    (target - from).try_normalize().unwrap_or(Vec2::Y) * speed
}

/// Nearest pod strictly inside `radius`
pub fn nearest_pod_within(pods: &Pool<EscapePod>, from: Vec2, radius: f32) -> Option<Vec2> {
    pods.values()
        .map(|p| (p.pos, p.pos.distance_squared(from)))
        .filter(|(_, d2)| *d2 < radius * radius)
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(pos, _)| pos)
}

fn fire(enemy_bullets: &mut Pool<Bullet>, from: Vec2, target: Vec2, speed: f32) {
    if enemy_bullets
        .activate(Bullet::new(from, aim(from, target, speed)))
        .is_none()
    {
        log::trace!("Enemy bullet pool full");
    }
}

/// Move every enemy, let it shoot, and recycle the ones that left the play area
pub fn update_enemies(state: &mut GameState, tuning: &Tuning, dt: f32) {
    let now = state.time_ms;
    let movement = &tuning.movement;
    let combat = &tuning.combat;
    let GameState {
        enemies,
        enemy_bullets,
        pods,
        player,
        ..
    } = state;

    for (_, enemy) in enemies.iter_mut() {
        move_enemy(enemy, movement, now, dt);

        if now > enemy.last_fired_ms + enemy.fire_rate_ms {
            fire(enemy_bullets, enemy.pos, player.pos, enemy.bullet_speed);
            enemy.last_fired_ms = now;
        }

        if let Some(pod_pos) = nearest_pod_within(pods, enemy.pos, combat.pod_engagement_radius) {
            let ready = combat.pod_fire_interval_ms == 0
                || enemy
                    .last_pod_fire_ms
                    .is_none_or(|t| now.saturating_sub(t) >= combat.pod_fire_interval_ms);
            if ready {
                fire(enemy_bullets, enemy.pos, pod_pos, enemy.bullet_speed);
                enemy.last_pod_fire_ms = Some(now);
            }
        }
    }

    let escaped = enemies.recycle_where(|e| is_offscreen(e.pos));
    if escaped > 0 {
        log::trace!("{} enemies left the play area", escaped);
    }
}
