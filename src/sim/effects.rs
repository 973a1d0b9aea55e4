//! Timed power-up effects
//!
//! Pickups apply immediately. Timed ones are recorded with an expiry and
//! reverted when the clock passes it; there is no early cancellation.
//!
//! Fire-rate and speed keep the stat value from before the pickup and put it
//! back verbatim. The score multiplier keeps nothing: expiry divides by the
//! configured amount, so overlapping multiplier pickups each undo one factor.

use serde::Serialize;

use super::score::SessionStats;
use super::state::{PlayerState, PowerUpKind};
use crate::tuning::PowerUpStats;

/// What a pickup modifies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EffectKind {
    /// Shield restore, applied once
    Instant,
    FireRate,
    Speed,
    ScoreMultiplier,
}

impl From<PowerUpKind> for EffectKind {
    fn from(kind: PowerUpKind) -> Self {
        match kind {
            PowerUpKind::Shield => EffectKind::Instant,
            PowerUpKind::RapidFire => EffectKind::FireRate,
            PowerUpKind::SpeedBoost => EffectKind::Speed,
            PowerUpKind::ScoreMultiplier => EffectKind::ScoreMultiplier,
        }
    }
}

/// A tracked effect awaiting reversion
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ActiveEffect {
    pub kind: PowerUpKind,
    pub effect: EffectKind,
    pub expires_at_ms: u64,
    pub amount: f32,
    /// Stat value to restore (fire-rate and speed only)
    pub original: Option<f32>,
}

#[derive(Debug, Clone, Default)]
pub struct EffectTracker {
    active: Vec<ActiveEffect>,
}

impl EffectTracker {
    pub fn new() -> Self {
        Self { active: Vec::new() }
    }

    /// Tracked effects in pickup order
    pub fn active(&self) -> &[ActiveEffect] {
        &self.active
    }

    pub fn is_active(&self, effect: EffectKind) -> bool {
        self.active.iter().any(|e| e.effect == effect)
    }

    /// Apply a pickup at `now`
    pub fn apply(
        &mut self,
        kind: PowerUpKind,
        stats: &PowerUpStats,
        player: &mut PlayerState,
        session: &mut SessionStats,
        now: u64,
    ) {
        let effect = EffectKind::from(kind);
        let original = match effect {
            EffectKind::Instant => {
                player.restore_shields(stats.amount.round().max(0.0) as u32);
                return;
            }
            EffectKind::FireRate => {
                let original = player.fire_rate_ms;
                player.fire_rate_ms *= 1.0 - stats.amount;
                Some(original)
            }
            EffectKind::Speed => {
                let original = player.speed;
                player.speed *= stats.amount;
                Some(original)
            }
            EffectKind::ScoreMultiplier => {
                session.scale_multiplier(stats.amount);
                None
            }
        };

        self.active.push(ActiveEffect {
            kind,
            effect,
            expires_at_ms: now.saturating_add(stats.duration_ms),
            amount: stats.amount,
            original,
        });
    }

    /// Revert and drop every effect whose expiry has passed; returns the
    /// expired pickup kinds in pickup order
    pub fn expire(
        &mut self,
        now: u64,
        player: &mut PlayerState,
        session: &mut SessionStats,
    ) -> Vec<PowerUpKind> {
        let mut expired = Vec::new();
        self.active.retain(|e| {
            if now < e.expires_at_ms {
                return true;
            }
            match (e.effect, e.original) {
                (EffectKind::FireRate, Some(original)) => player.fire_rate_ms = original,
                (EffectKind::Speed, Some(original)) => player.speed = original,
                (EffectKind::ScoreMultiplier, _) => session.scale_multiplier(1.0 / e.amount),
                _ => {}
            }
            expired.push(e.kind);
            false
        });
        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::Tuning;
    use proptest::prelude::*;

    fn setup() -> (Tuning, PlayerState, SessionStats, EffectTracker) {
        let tuning = Tuning::default();
        let player = PlayerState::from_base(&tuning.player);
        (tuning, player, SessionStats::new(), EffectTracker::new())
    }

    #[test]
    fn test_shield_is_instant_and_untracked() {
        let (tuning, mut player, mut session, mut tracker) = setup();
        player.shields = 10;
        tracker.apply(
            PowerUpKind::Shield,
            tuning.power_ups.get(PowerUpKind::Shield),
            &mut player,
            &mut session,
            0,
        );
        assert_eq!(player.shields, 35);
        assert!(tracker.active().is_empty());
    }

    #[test]
    fn test_rapid_fire_expires_on_time() {
        let (tuning, mut player, mut session, mut tracker) = setup();
        let stats = *tuning.power_ups.get(PowerUpKind::RapidFire);
        tracker.apply(PowerUpKind::RapidFire, &stats, &mut player, &mut session, 1000);
        assert_eq!(player.fire_rate_ms, 125.0);
        assert!(tracker.is_active(EffectKind::FireRate));

        let expired = tracker.expire(1000 + stats.duration_ms - 1, &mut player, &mut session);
        assert!(expired.is_empty());
        let expired = tracker.expire(1000 + stats.duration_ms, &mut player, &mut session);
        assert_eq!(expired, vec![PowerUpKind::RapidFire]);
        assert_eq!(player.fire_rate_ms, 250.0);
        assert!(!tracker.is_active(EffectKind::FireRate));
    }

    #[test]
    fn test_stacked_multiplier_reverts_one_factor_per_expiry() {
        let (tuning, mut player, mut session, mut tracker) = setup();
        let stats = *tuning.power_ups.get(PowerUpKind::ScoreMultiplier);
        tracker.apply(PowerUpKind::ScoreMultiplier, &stats, &mut player, &mut session, 0);
        tracker.apply(PowerUpKind::ScoreMultiplier, &stats, &mut player, &mut session, 500);
        assert_eq!(session.score_multiplier, 4.0);

        tracker.expire(stats.duration_ms, &mut player, &mut session);
        assert_eq!(session.score_multiplier, 2.0);
        tracker.expire(stats.duration_ms + 500, &mut player, &mut session);
        assert_eq!(session.score_multiplier, 1.0);
    }

    #[test]
    fn test_multiplier_clamp_breaks_exact_reversion() {
        let (tuning, mut player, mut session, mut tracker) = setup();
        session.adjust_multiplier(2.0);
        let stats = *tuning.power_ups.get(PowerUpKind::ScoreMultiplier);
        tracker.apply(PowerUpKind::ScoreMultiplier, &stats, &mut player, &mut session, 0);
        assert_eq!(session.score_multiplier, 5.0);
        tracker.expire(stats.duration_ms, &mut player, &mut session);
        assert_eq!(session.score_multiplier, 2.5);
    }

    #[test]
    fn test_overlapping_speed_boosts_restore_in_pickup_order() {
        let (tuning, mut player, mut session, mut tracker) = setup();
        let stats = *tuning.power_ups.get(PowerUpKind::SpeedBoost);
        let base = player.speed;
        tracker.apply(PowerUpKind::SpeedBoost, &stats, &mut player, &mut session, 0);
        let boosted_once = player.speed;
        tracker.apply(PowerUpKind::SpeedBoost, &stats, &mut player, &mut session, 100);

        tracker.expire(stats.duration_ms, &mut player, &mut session);
        assert_eq!(player.speed, base);
        // The second pickup remembered the once-boosted speed
        tracker.expire(stats.duration_ms + 100, &mut player, &mut session);
        assert_eq!(player.speed, boosted_once);
    }

    proptest! {
        #[test]
        fn prop_fire_rate_and_speed_roundtrip(
            fire_rate in 50.0f32..2000.0,
            speed in 50.0f32..900.0,
            fire_amount in 0.0f32..0.95,
            speed_amount in 0.1f32..4.0,
            start in 0u64..100_000,
        ) {
            let (_, mut player, mut session, mut tracker) = setup();
            player.fire_rate_ms = fire_rate;
            player.speed = speed;
            let fire = PowerUpStats { points: 0, amount: fire_amount, duration_ms: 5000 };
            let boost = PowerUpStats { points: 0, amount: speed_amount, duration_ms: 3000 };
            tracker.apply(PowerUpKind::RapidFire, &fire, &mut player, &mut session, start);
            tracker.apply(PowerUpKind::SpeedBoost, &boost, &mut player, &mut session, start);
            tracker.expire(start + 5000, &mut player, &mut session);
            prop_assert_eq!(player.fire_rate_ms, fire_rate);
            prop_assert_eq!(player.speed, speed);
            prop_assert!(tracker.active().is_empty());
        }
    }
}
