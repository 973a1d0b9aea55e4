//! Tickable scenes
//!
//! The host (browser frame callback or the native runner) owns one scene at a
//! time and feeds it wall-clock frame deltas. The gameplay scene turns those
//! into fixed simulation steps.

use std::rc::Rc;

use crate::consts::*;
use crate::sim::{GameEvent, GamePhase, GameState, LevelSummary, Snapshot, TickInput, tick};
use crate::tuning::{Tuning, TuningError};

/// Longest frame delta accepted before the excess is dropped. Matches what
/// one frame's substeps can drain, so no backlog builds up.
const MAX_FRAME_MS: u64 = MAX_SUBSTEPS as u64 * SIM_STEP_MS;

/// Turns fractional host timestamps (rAF milliseconds) into whole-millisecond
/// frame deltas, carrying the fraction into the next frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameClock {
    last_ms: Option<f64>,
    carry_ms: f64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the previous timestamp; the next frame has zero delta
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Whole milliseconds elapsed since the previous call. Gaps longer than
    /// `max_gap_ms` (tab switches) and clock jumps backwards are clamped.
    pub fn advance(&mut self, now_ms: f64, max_gap_ms: f64) -> u64 {
        let dt = match self.last_ms {
            Some(last) if (now_ms - last).is_finite() => (now_ms - last).clamp(0.0, max_gap_ms),
            _ => 0.0,
        };
        if now_ms.is_finite() {
            self.last_ms = Some(now_ms);
        }
        let total = dt + self.carry_ms;
        let whole = total.floor();
        self.carry_ms = total - whole;
        whole as u64
    }
}

/// What the host should do after a scene tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneTransition {
    /// Keep ticking this scene
    Continue,
    /// Level cleared; show the victory screen
    Victory(LevelSummary),
    /// Player destroyed; show the game-over screen
    GameOver(LevelSummary),
}

/// Something the host can drive frame by frame
pub trait Scene {
    /// Prepare for the first tick. Calling it again starts over.
    fn init(&mut self);

    /// Advance by one host frame of `dt_ms` wall-clock milliseconds
    fn tick(&mut self, input: &TickInput, dt_ms: u64) -> SceneTransition;

    /// Release the scene, returning the record of how far it got
    fn teardown(&mut self) -> LevelSummary;
}

/// One attempt at one level
pub struct GameplayScene {
    tuning: Rc<Tuning>,
    state: GameState,
    accumulator_ms: u64,
    /// Pause press waiting for the next simulation step
    pending_pause: bool,
    /// The end-of-level transition has been handed out
    reported: bool,
}

impl GameplayScene {
    pub fn new(tuning: Rc<Tuning>, level: u32, seed: u64) -> Result<Self, TuningError> {
        let state = GameState::new(&tuning, level, seed)?;
        Ok(Self {
            tuning,
            state,
            accumulator_ms: 0,
            pending_pause: false,
            reported: false,
        })
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn level(&self) -> u32 {
        self.state.level
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.state)
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.state.drain_events()
    }

    fn transition(&mut self) -> SceneTransition {
        if self.reported {
            return SceneTransition::Continue;
        }
        let summary = self.state.summary();
        let transition = match self.state.phase {
            GamePhase::Victory => SceneTransition::Victory(summary),
            GamePhase::GameOver => SceneTransition::GameOver(summary),
            GamePhase::Playing | GamePhase::Paused => return SceneTransition::Continue,
        };
        self.reported = true;
        transition
    }
}

impl Scene for GameplayScene {
    fn init(&mut self) {
        self.state.restart(&self.tuning);
        self.accumulator_ms = 0;
        self.pending_pause = false;
        self.reported = false;
        log::info!(
            "Level {} starting (seed {})",
            self.state.level,
            self.state.seed
        );
    }

    fn tick(&mut self, input: &TickInput, dt_ms: u64) -> SceneTransition {
        self.pending_pause |= input.pause;
        self.accumulator_ms += dt_ms.min(MAX_FRAME_MS);

        let mut substeps = 0;
        while self.accumulator_ms >= SIM_STEP_MS && substeps < MAX_SUBSTEPS {
            let step_input = TickInput {
                pause: std::mem::take(&mut self.pending_pause),
                ..*input
            };
            tick(&mut self.state, &self.tuning, &step_input, SIM_STEP_MS);
            self.accumulator_ms -= SIM_STEP_MS;
            substeps += 1;

            if self.state.phase.is_finished() {
                self.accumulator_ms = 0;
                break;
            }
        }

        self.transition()
    }

    fn teardown(&mut self) -> LevelSummary {
        let summary = self.state.summary();
        log::info!(
            "Leaving level {} (score {}, wave {})",
            summary.level,
            summary.score,
            summary.wave
        );
        summary
    }
}
