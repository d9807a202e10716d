//! Office Survival entry point
//!
//! Runs the simulation headless under the autopilot and prints a JSON run
//! summary. Rendering and audio hosts drive `sim::tick` themselves.
//!
//! Usage: `office-survival [--seed N] [--seconds N] [--tuning PATH]`

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::path::PathBuf;

    use serde::Serialize;

    use office_survival::Tuning;
    use office_survival::consts::*;
    use office_survival::sim::{GameEvent, GameOverSummary, GameState, Hud, autopilot, tick};

    /// Command line options
    pub struct Options {
        pub seed: u64,
        pub seconds: f32,
        pub tuning: Option<PathBuf>,
    }

    impl Default for Options {
        fn default() -> Self {
            Self {
                seed: 0x0FF1CE,
                seconds: 120.0,
                tuning: None,
            }
        }
    }

    impl Options {
        /// Parse `std::env::args`, logging and ignoring anything malformed
        pub fn from_args() -> Self {
            let mut opts = Self::default();
            let mut args = std::env::args().skip(1);
            while let Some(arg) = args.next() {
                let value = args.next();
                match (arg.as_str(), value) {
                    ("--seed", Some(v)) => match v.parse() {
                        Ok(seed) => opts.seed = seed,
                        Err(e) => log::warn!("Ignoring --seed {}: {}", v, e),
                    },
                    ("--seconds", Some(v)) => match v.parse() {
                        Ok(secs) => opts.seconds = secs,
                        Err(e) => log::warn!("Ignoring --seconds {}: {}", v, e),
                    },
                    ("--tuning", Some(v)) => opts.tuning = Some(PathBuf::from(v)),
                    (other, _) => log::warn!("Unknown or incomplete argument: {}", other),
                }
            }
            opts
        }
    }

    #[derive(Serialize)]
    struct RunSummary {
        seed: u64,
        ticks: u64,
        runs: Vec<GameOverSummary>,
        hud: Hud,
    }

    /// Game instance holding all state
    struct Game {
        state: GameState,
        accumulator: f32,
        finished_runs: Vec<GameOverSummary>,
        total_ticks: u64,
    }

    impl Game {
        fn new(tuning: Tuning, seed: u64) -> Self {
            Self {
                state: GameState::with_tuning(tuning, seed),
                accumulator: 0.0,
                finished_runs: Vec::new(),
                total_ticks: 0,
            }
        }

        /// Run simulation ticks for one host frame
        fn update(&mut self, dt: f32) {
            let dt = dt.min(0.1);
            self.accumulator += dt;

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                let input = autopilot::drive(&self.state);
                tick(&mut self.state, &input, SIM_DT);
                self.accumulator -= SIM_DT;
                self.total_ticks += 1;
                substeps += 1;
                self.handle_events();
            }
        }

        fn handle_events(&mut self) {
            for event in self.state.drain_events() {
                match event {
                    GameEvent::GameOver(summary) => self.finished_runs.push(summary),
                    GameEvent::EntitySpawned { .. } | GameEvent::EntityDestroyed { .. } => {
                        log::trace!("{:?}", event)
                    }
                    other => log::debug!("{:?}", other),
                }
            }
        }

        fn summary(&self) -> RunSummary {
            RunSummary {
                seed: self.state.seed,
                ticks: self.total_ticks,
                runs: self.finished_runs.clone(),
                hud: self.state.hud(),
            }
        }
    }

    pub fn run(opts: Options) {
        let tuning = opts
            .tuning
            .as_deref()
            .map(Tuning::load)
            .unwrap_or_default();
        let mut game = Game::new(tuning, opts.seed);

        // Host frames at a steady 60 fps
        let frame = 1.0 / 60.0;
        let frames = (opts.seconds.max(0.0) / frame).round() as u64;
        for _ in 0..frames {
            game.update(frame);
        }

        let summary = game.summary();
        log::info!(
            "Finished after {} ticks: wave {}, {} kills, score {}",
            summary.ticks,
            summary.hud.wave,
            summary.hud.kills,
            summary.hud.score
        );
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{}", json),
            Err(e) => log::error!("Failed to serialize run summary: {}", e),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Office Survival (headless) starting...");
    native::run(native::Options::from_args());
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Web hosts embed the library directly
}
