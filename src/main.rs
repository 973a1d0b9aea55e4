//! Pod Rescue entry point
//!
//! On wasm32 this exposes the gameplay scene to the page script, which owns
//! rendering and input binding. Natively it plays a level headlessly with a
//! scripted autopilot and reports the result.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;

    use pod_rescue::persistence::{KeyValueStore, LocalStorage, MemoryStore};
    use pod_rescue::sim::{InputAxes, TickInput};
    use pod_rescue::{FrameClock, GameplayScene, ProgressData, Scene, SceneTransition, Tuning};

    /// Longest gap between frames treated as real time (tab switches etc.)
    const MAX_FRAME_GAP_MS: f64 = 250.0;

    fn open_store() -> Box<dyn KeyValueStore> {
        match LocalStorage::open() {
            Ok(storage) => Box::new(storage),
            Err(e) => {
                log::warn!("{}, progress will not persist", e);
                Box::new(MemoryStore::new())
            }
        }
    }

    fn random_seed() -> u64 {
        let mut buf = [0u8; 8];
        match getrandom::fill(&mut buf) {
            Ok(()) => u64::from_le_bytes(buf),
            Err(e) => {
                log::warn!("getrandom failed ({}), seeding from clock", e);
                js_sys::Date::now() as u64
            }
        }
    }

    fn to_js(e: impl std::fmt::Display) -> JsValue {
        JsValue::from_str(&e.to_string())
    }

    /// One level attempt driven by the page's animation frame loop
    #[wasm_bindgen]
    pub struct WebGame {
        tuning: Rc<Tuning>,
        scene: GameplayScene,
        store: Box<dyn KeyValueStore>,
        progress: ProgressData,
        axes: InputAxes,
        fire: bool,
        pause: bool,
        clock: FrameClock,
        last_transition: Option<SceneTransition>,
    }

    #[wasm_bindgen]
    impl WebGame {
        /// Start `level` with a random seed. Locked or unknown levels are rejected.
        #[wasm_bindgen(constructor)]
        pub fn new(level: u32) -> Result<WebGame, JsValue> {
            Self::with_seed(level, random_seed())
        }

        /// Start `level` with a fixed seed (replays, debugging)
        pub fn with_seed(level: u32, seed: u64) -> Result<WebGame, JsValue> {
            let tuning = Rc::new(Tuning::default());
            let store = open_store();
            let progress = ProgressData::load(&*store);
            if !progress.is_unlocked(level) {
                return Err(JsValue::from_str(&format!("level {} is locked", level)));
            }
            let mut scene = GameplayScene::new(Rc::clone(&tuning), level, seed).map_err(to_js)?;
            scene.init();
            Ok(WebGame {
                tuning,
                scene,
                store,
                progress,
                axes: InputAxes::default(),
                fire: false,
                pause: false,
                clock: FrameClock::new(),
                last_transition: None,
            })
        }

        /// Keyboard movement, both axes
        pub fn set_movement(&mut self, x: f32, y: f32) {
            self.axes.write_x(x);
            self.axes.write_y(y);
        }

        /// Touch joystick horizontal axis
        pub fn set_axis_x(&mut self, x: f32) {
            self.axes.write_x(x);
        }

        /// Touch joystick vertical axis
        pub fn set_axis_y(&mut self, y: f32) {
            self.axes.write_y(y);
        }

        pub fn set_fire(&mut self, fire: bool) {
            self.fire = fire;
        }

        pub fn toggle_pause(&mut self) {
            self.pause = true;
        }

        /// Advance to `now_ms` (the rAF timestamp) and return the snapshot as JSON
        pub fn frame(&mut self, now_ms: f64) -> Result<String, JsValue> {
            let dt_ms = self.clock.advance(now_ms, MAX_FRAME_GAP_MS);

            let input = TickInput {
                movement: self.axes.sample(),
                fire: self.fire,
                pause: std::mem::take(&mut self.pause),
            };
            let transition = self.scene.tick(&input, dt_ms);
            match transition {
                SceneTransition::Victory(summary) | SceneTransition::GameOver(summary) => {
                    if self.progress.record(&summary, self.tuning.level_count()) {
                        log::info!("New best on level {}: {}", summary.level, summary.score);
                    }
                    self.progress.save(&mut *self.store);
                    self.last_transition = Some(transition);
                }
                SceneTransition::Continue => {}
            }

            self.scene.snapshot().to_json().map_err(to_js)
        }

        /// Events since the last call, as a JSON array
        pub fn events(&mut self) -> Result<String, JsValue> {
            serde_json::to_string(&self.scene.drain_events()).map_err(to_js)
        }

        /// "victory", "game_over" or an empty string while the level runs
        pub fn outcome(&self) -> String {
            match self.last_transition {
                Some(SceneTransition::Victory(_)) => "victory".to_string(),
                Some(SceneTransition::GameOver(_)) => "game_over".to_string(),
                _ => String::new(),
            }
        }

        /// Restart the same level and seed
        pub fn restart(&mut self) {
            self.scene.init();
            self.clock.reset();
            self.last_transition = None;
            self.pause = false;
        }

        /// Final record for the level screen, as JSON
        pub fn teardown(&mut self) -> Result<String, JsValue> {
            serde_json::to_string(&self.scene.teardown()).map_err(to_js)
        }

        /// Highest level the player may start
        pub fn furthest_level(&self) -> u32 {
            self.progress.furthest_level()
        }

        /// Forget all saved progress
        pub fn reset_progress(&mut self) {
            self.progress = ProgressData::reset(&mut *self.store);
        }

        /// Saved progress, as JSON
        pub fn progress(&self) -> Result<String, JsValue> {
            serde_json::to_string(&self.progress).map_err(to_js)
        }
    }

    pub fn init() {
        console_error_panic_hook::set_once();
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::warn_1(&JsValue::from_str(&format!(
                "Logger init failed: {}",
                e
            )));
        }
        log::info!("Pod Rescue starting...");
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::init();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use std::rc::Rc;

    use pod_rescue::{MemoryStore, ProgressData, Tuning};

    env_logger::init();
    log::info!("Pod Rescue (native) starting...");

    let mut args = std::env::args().skip(1);
    let level = args.next().and_then(|a| a.parse().ok()).unwrap_or(1);
    let seed = args.next().and_then(|a| a.parse().ok()).unwrap_or(12345);

    let tuning = Rc::new(Tuning::default());
    let summary = match autopilot::play(Rc::clone(&tuning), level, seed) {
        Ok(summary) => summary,
        Err(e) => {
            log::error!("Cannot start level {}: {}", level, e);
            std::process::exit(1);
        }
    };

    let mut store = MemoryStore::new();
    let mut progress = ProgressData::load(&store);
    progress.record(&summary, tuning.level_count());
    progress.save(&mut store);

    println!(
        "Level {} {}: score {}, wave {}, {} enemies destroyed, {} pods rescued",
        summary.level,
        if summary.victory { "cleared" } else { "failed" },
        summary.score,
        summary.wave,
        summary.enemies_killed,
        summary.pods_rescued
    );
    println!("Next level unlocked: {}", progress.is_unlocked(level + 1));
}

#[cfg(not(target_arch = "wasm32"))]
mod autopilot {
    use std::rc::Rc;

    use glam::Vec2;
    use pod_rescue::consts::*;
    use pod_rescue::sim::{GameState, LevelSummary, TickInput};
    use pod_rescue::{GameplayScene, Scene, SceneTransition, Tuning, TuningError};

    /// Frame length the autopilot pretends to render at
    const FRAME_MS: u64 = 16;
    /// Give up after this much simulated time
    const TIME_LIMIT_MS: u64 = 15 * 60 * 1000;

    /// Steer toward rescuable pods, otherwise line up under the nearest enemy
    fn steer(state: &GameState, tuning: &Tuning) -> Vec2 {
        let player = state.player.pos;
        let safe_y = PLAY_HEIGHT * tuning.pods.safe_zone_fraction;
        let target = state
            .pods
            .values()
            .filter(|p| p.pos.y >= safe_y)
            .map(|p| p.pos)
            .min_by(|a, b| a.distance_squared(player).total_cmp(&b.distance_squared(player)))
            .or_else(|| {
                state
                    .enemies
                    .values()
                    .map(|e| Vec2::new(e.pos.x, PLAY_HEIGHT - 60.0))
                    .min_by(|a, b| (a.x - player.x).abs().total_cmp(&(b.x - player.x).abs()))
            });

        match target {
            Some(t) => ((t - player) / 20.0).clamp(Vec2::splat(-1.0), Vec2::splat(1.0)),
            None => Vec2::ZERO,
        }
    }

    pub fn play(tuning: Rc<Tuning>, level: u32, seed: u64) -> Result<LevelSummary, TuningError> {
        let mut scene = GameplayScene::new(Rc::clone(&tuning), level, seed)?;
        scene.init();

        let mut elapsed = 0;
        while elapsed < TIME_LIMIT_MS {
            let input = TickInput {
                movement: steer(scene.state(), &tuning),
                fire: true,
                pause: false,
            };
            match scene.tick(&input, FRAME_MS) {
                SceneTransition::Continue => {}
                SceneTransition::Victory(_) | SceneTransition::GameOver(_) => break,
            }
            for event in scene.drain_events() {
                log::trace!("{:?}", event);
            }
            elapsed += FRAME_MS;
        }

        if elapsed >= TIME_LIMIT_MS {
            log::warn!("Autopilot hit the time limit on level {}", level);
        }
        Ok(scene.teardown())
    }
}
