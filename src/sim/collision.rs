//! Collision detection and damage resolution
//!
//! Every entity is a circle. The resolver walks the pairwise rules in a
//! fixed order, applying each outcome in the same tick it is detected. A
//! deactivated entity is gone for the rest of the pass, so a bullet is
//! consumed by at most one hit.

use glam::Vec2;
use rand::Rng;

use super::pool::SlotId;
use super::state::{EnemyKind, GameEvent, GamePhase, GameState, PowerUp, PowerUpKind};
use crate::consts::*;
use crate::tuning::Tuning;

/// Circle-circle overlap
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    let r = ra + rb;
    a.distance_squared(b) < r * r
}

/// Run every interaction rule once. Stops early if the session ends mid-pass.
pub fn resolve(state: &mut GameState, tuning: &Tuning) {
    let rules: [fn(&mut GameState, &Tuning); 7] = [
        player_bullets_vs_enemies,
        enemy_bullets_vs_player,
        enemies_vs_player,
        enemy_bullets_vs_pods,
        enemies_vs_pods,
        player_vs_pods,
        player_vs_power_ups,
    ];
    for rule in rules {
        if state.phase.is_finished() {
            return;
        }
        rule(state, tuning);
    }
}

/// Player bullet × enemy
fn player_bullets_vs_enemies(state: &mut GameState, tuning: &Tuning) {
    for bullet_id in state.bullets.ids() {
        let Some(bullet) = state.bullets.get(bullet_id).copied() else {
            continue;
        };
        let target = state
            .enemies
            .iter()
            .find(|(_, e)| circles_overlap(bullet.pos, bullet.radius, e.pos, e.radius))
            .map(|(id, _)| id);
        let Some(enemy_id) = target else {
            continue;
        };

        state.bullets.deactivate(bullet_id);
        let destroyed = state
            .enemies
            .get_mut(enemy_id)
            .is_some_and(|e| e.take_damage(tuning.combat.bullet_damage));
        if destroyed {
            destroy_enemy(state, tuning, enemy_id, true);
            if state.phase.is_finished() {
                return;
            }
        }
    }
}

/// Enemy bullet × player
fn enemy_bullets_vs_player(state: &mut GameState, tuning: &Tuning) {
    for bullet_id in state.enemy_bullets.ids() {
        let Some(bullet) = state.enemy_bullets.get(bullet_id).copied() else {
            continue;
        };
        if !circles_overlap(bullet.pos, bullet.radius, state.player.pos, state.player.radius) {
            continue;
        }
        state.enemy_bullets.deactivate(bullet_id);
        damage_player(state, tuning.combat.enemy_bullet_damage);
        if state.phase.is_finished() {
            return;
        }
    }
}

/// Enemy × player contact: the player takes contact damage and the enemy
/// dies unscored, every kind alike. Damage lands first, so a ram that
/// kills both ships is a game over.
fn enemies_vs_player(state: &mut GameState, tuning: &Tuning) {
    for enemy_id in state.enemies.ids() {
        let Some(enemy) = state.enemies.get(enemy_id) else {
            continue;
        };
        if !circles_overlap(enemy.pos, enemy.radius, state.player.pos, state.player.radius) {
            continue;
        }
        damage_player(state, tuning.combat.contact_damage);
        destroy_enemy(state, tuning, enemy_id, false);
        if state.phase.is_finished() {
            return;
        }
    }
}

/// Enemy bullet × pod
fn enemy_bullets_vs_pods(state: &mut GameState, tuning: &Tuning) {
    for bullet_id in state.enemy_bullets.ids() {
        let Some(bullet) = state.enemy_bullets.get(bullet_id).copied() else {
            continue;
        };
        let target = state
            .pods
            .iter()
            .find(|(_, p)| circles_overlap(bullet.pos, bullet.radius, p.pos, p.radius))
            .map(|(id, _)| id);
        let Some(pod_id) = target else {
            continue;
        };
        state.enemy_bullets.deactivate(bullet_id);
        damage_pod(state, tuning, pod_id);
    }
}

/// Enemy × pod contact, one point per tick of overlap
fn enemies_vs_pods(state: &mut GameState, tuning: &Tuning) {
    for enemy_id in state.enemies.ids() {
        let Some(enemy) = state.enemies.get(enemy_id).cloned() else {
            continue;
        };
        for pod_id in state.pods.ids() {
            let touching = state
                .pods
                .get(pod_id)
                .is_some_and(|p| circles_overlap(enemy.pos, enemy.radius, p.pos, p.radius));
            if touching {
                damage_pod(state, tuning, pod_id);
            }
        }
    }
}

/// Player × pod: rescue only past the safe-zone line
fn player_vs_pods(state: &mut GameState, tuning: &Tuning) {
    let safe_y = PLAY_HEIGHT * tuning.pods.safe_zone_fraction;
    for pod_id in state.pods.ids() {
        let Some(pod) = state.pods.get(pod_id).copied() else {
            continue;
        };
        if pod.pos.y < safe_y
            || !circles_overlap(pod.pos, pod.radius, state.player.pos, state.player.radius)
        {
            continue;
        }
        state.pods.deactivate(pod_id);
        state.stats.pods_rescued += 1;
        let points = state.stats.add_score(tuning.pods.rescue_points);
        state
            .stats
            .adjust_multiplier(tuning.combat.rescue_multiplier_step);
        state.events.push(GameEvent::PodRescued {
            pos: pod.pos,
            points,
        });
        log::debug!(
            "Pod rescued (+{}), multiplier now {:.2}",
            points,
            state.stats.score_multiplier
        );
    }
}

/// Player × power-up
fn player_vs_power_ups(state: &mut GameState, tuning: &Tuning) {
    for id in state.power_ups.ids() {
        let Some(power_up) = state.power_ups.get(id).copied() else {
            continue;
        };
        if !circles_overlap(
            power_up.pos,
            power_up.radius,
            state.player.pos,
            state.player.radius,
        ) {
            continue;
        }
        state.power_ups.deactivate(id);
        let points = state.stats.add_score(power_up.points);
        state.effects.apply(
            power_up.kind,
            tuning.power_ups.get(power_up.kind),
            &mut state.player,
            &mut state.stats,
            state.time_ms,
        );
        state.events.push(GameEvent::PowerUpCollected {
            kind: power_up.kind,
            points,
        });
        log::debug!("Collected {:?} power-up", power_up.kind);
    }
}

fn damage_player(state: &mut GameState, damage: u32) {
    state.player.apply_damage(damage);
    state.events.push(GameEvent::PlayerHit { damage });
    if state.player.is_destroyed() {
        state.finish(GamePhase::GameOver);
    }
}

fn damage_pod(state: &mut GameState, tuning: &Tuning, pod_id: SlotId) {
    let Some(pod) = state.pods.get_mut(pod_id) else {
        return;
    };
    pod.health = pod.health.saturating_sub(1);
    if pod.health > 0 {
        return;
    }
    let pos = pod.pos;
    state.pods.deactivate(pod_id);
    state.stats.pods_lost += 1;
    state
        .stats
        .adjust_multiplier(-tuning.combat.loss_multiplier_step);
    state.events.push(GameEvent::PodDestroyed { pos });
    log::debug!(
        "Pod destroyed, multiplier now {:.2}",
        state.stats.score_multiplier
    );
}

/// Remove an enemy. Scored kills award points, count toward kills and may
/// drop a power-up; a dead boss ends the level either way.
fn destroy_enemy(state: &mut GameState, tuning: &Tuning, enemy_id: SlotId, scored: bool) {
    let Some(enemy) = state.enemies.deactivate(enemy_id) else {
        return;
    };
    state.events.push(GameEvent::Explosion { pos: enemy.pos });
    if !scored {
        if enemy.kind == EnemyKind::Boss {
            state.finish(GamePhase::Victory);
        }
        return;
    }

    let points = state.stats.add_score(enemy.points);
    state.stats.enemies_killed += 1;
    state.events.push(GameEvent::EnemyDestroyed {
        kind: enemy.kind,
        pos: enemy.pos,
        points,
    });

    if state
        .rng
        .random_bool(tuning.combat.drop_chance.clamp(0.0, 1.0))
    {
        let kind = PowerUpKind::ALL[state.rng.random_range(0..PowerUpKind::ALL.len())];
        let power_up = PowerUp {
            kind,
            points: tuning.power_ups.get(kind).points,
            pos: enemy.pos,
            vel: Vec2::new(0.0, POWER_UP_FALL_SPEED),
            radius: POWER_UP_RADIUS,
        };
        if state.power_ups.activate(power_up).is_none() {
            log::trace!("Power-up pool full, drop skipped");
        }
    }

    if enemy.kind == EnemyKind::Boss {
        state.finish(GamePhase::Victory);
    }
}
