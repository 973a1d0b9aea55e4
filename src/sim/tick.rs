//! Fixed timestep simulation tick
//!
//! Core game loop that advances simulation deterministically. Within a tick
//! the order is fixed: wave director, player, enemy behavior and projectile
//! motion, collision resolution, effect expiry.

use glam::Vec2;

use super::state::{Bullet, GameEvent, GamePhase, GameState};
use super::{behavior, collision, wave};
use crate::consts::*;
use crate::tuning::Tuning;
use crate::{clamp_to_play_area, is_offscreen, ms_to_secs};

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickInput {
    /// Movement intent, each axis in [-1, 1]
    pub movement: Vec2,
    /// Fire held
    pub fire: bool,
    /// Pause toggle
    pub pause: bool,
}

/// Combines movement writes from several input sources (keyboard, touch
/// joystick). Each axis keeps whatever was written to it last.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputAxes {
    x: f32,
    y: f32,
}

impl InputAxes {
    pub fn write_x(&mut self, value: f32) {
        self.x = clamp_axis(value);
    }

    pub fn write_y(&mut self, value: f32) {
        self.y = clamp_axis(value);
    }

    /// Write both axes at once
    pub fn write(&mut self, value: Vec2) {
        self.write_x(value.x);
        self.write_y(value.y);
    }

    pub fn sample(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

fn clamp_axis(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(-1.0, 1.0)
    }
}

/// Advance the game state by one step of `dt_ms`
pub fn tick(state: &mut GameState, tuning: &Tuning, input: &TickInput, dt_ms: u64) {
    // Handle pause toggle
    if input.pause {
        match state.phase {
            GamePhase::Playing => {
                state.phase = GamePhase::Paused;
                log::info!("Paused at {}ms", state.time_ms);
                return;
            }
            GamePhase::Paused => {
                state.phase = GamePhase::Playing;
                log::info!("Resumed at {}ms", state.time_ms);
            }
            _ => {}
        }
    }

    // Don't tick if paused or the level is over
    if state.phase != GamePhase::Playing {
        return;
    }

    state.time_ms += dt_ms;
    let dt = ms_to_secs(dt_ms);

    wave::advance(state, tuning, dt_ms);
    if state.phase.is_finished() {
        return;
    }

    move_player(state, input.movement, dt);
    if input.fire {
        player_fire(state);
    }

    behavior::update_enemies(state, tuning, dt);
    move_projectiles(state, dt);

    collision::resolve(state, tuning);
    if state.phase.is_finished() {
        return;
    }

    let now = state.time_ms;
    let expired = state
        .effects
        .expire(now, &mut state.player, &mut state.stats);
    for kind in expired {
        log::debug!("{:?} expired", kind);
        state.events.push(GameEvent::PowerUpExpired { kind });
    }
}

fn move_player(state: &mut GameState, movement: Vec2, dt: f32) {
    let intent = Vec2::new(clamp_axis(movement.x), clamp_axis(movement.y));
    let player = &mut state.player;
    player.pos = clamp_to_play_area(player.pos + intent * player.speed * dt, player.radius);
}

fn player_fire(state: &mut GameState) {
    let now = state.time_ms;
    if !state.player.can_fire(now) {
        return;
    }
    let muzzle = state.player.pos - Vec2::new(0.0, state.player.radius);
    let bullet = Bullet::new(muzzle, Vec2::new(0.0, -PLAYER_BULLET_SPEED));
    if state.bullets.activate(bullet).is_some() {
        state.player.last_fired_ms = Some(now);
    } else {
        log::trace!("Player bullet pool full");
    }
}

/// Integrate bullets, pods and power-ups; recycle whatever left the play area
fn move_projectiles(state: &mut GameState, dt: f32) {
    for (_, b) in state.bullets.iter_mut() {
        b.pos += b.vel * dt;
    }
    for (_, b) in state.enemy_bullets.iter_mut() {
        b.pos += b.vel * dt;
    }
    for (_, p) in state.pods.iter_mut() {
        p.pos += p.vel * dt;
    }
    for (_, p) in state.power_ups.iter_mut() {
        p.pos += p.vel * dt;
    }

    state.bullets.recycle_where(|b| is_offscreen(b.pos));
    state.enemy_bullets.recycle_where(|b| is_offscreen(b.pos));
    state.power_ups.recycle_where(|p| is_offscreen(p.pos));
    let drifted = state.pods.recycle_where(|p| is_offscreen(p.pos));
    if drifted > 0 {
        log::debug!("{} pod(s) drifted out unrescued", drifted);
    }
}
