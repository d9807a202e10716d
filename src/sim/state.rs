//! Game state and outbound events
//!
//! Everything a session mutates lives in [`GameState`]. Restarting replaces the
//! whole value with a freshly built one instead of resetting fields in place.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::arena::{Arena, ExpansionAxis};
use super::director::{self, Director, Encounter};
use super::meter::{Meter, MeterBand};
use super::placement::find_free_desk_cell;
use super::registry::{EntityClass, EntityId, EntityKind, Obstacle, Registry, Station};
use super::timer::{Scheduler, TimerAction, TimerId};
use crate::tuning::Tuning;
use crate::{ms_to_ticks, ticks_to_secs};

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Playing,
    /// Run ended; only a restart intent is processed
    GameOver,
}

/// Background track the audio collaborator should play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MusicTrack {
    Normal,
    Event,
    Silent,
}

/// Final numbers shown on the game-over banner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOverSummary {
    pub wave: u32,
    pub kills: u32,
    pub score: u64,
}

/// Notifications for the rendering/audio/UI collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    EntitySpawned { id: EntityId, class: EntityClass, pos: Vec2 },
    EntityDestroyed { id: EntityId, class: EntityClass },
    ShotFired { id: EntityId },
    /// Cosmetic burst hook at `pos`
    AdversaryKilled { id: EntityId, class: EntityClass, pos: Vec2, score: u64 },
    PlayerHit { source: EntityClass, damage: f32, health: f32 },
    PickupCollected { health: f32 },
    WaveAdvanced { wave: u32 },
    WaveStarted { wave: u32, adversaries: u32 },
    RushStarted { wave: u32, flyers: u32 },
    RushEnded { wave: u32 },
    SpecialEventStarted { desk: EntityId, pos: Vec2, duration_ms: u32 },
    SpecialEventCompleted,
    ArenaExpanded { axis: ExpansionAxis, width: f32, height: f32, desks_added: u32 },
    MusicChanged(MusicTrack),
    GameOver(GameOverSummary),
    Restarted { seed: u64 },
}

/// The controlled avatar's stats (its body lives in the registry)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: EntityId,
    pub health: Meter,
    pub energy: Meter,
    /// Facing angle in radians, 0 = right
    pub facing: f32,
    pub base_speed: f32,
    pub speed_boost: f32,
    /// Decaying knockback velocity added to movement
    pub knockback: Vec2,
    /// Contact damage ignored until this tick
    pub invulnerable_until: Option<u64>,
    pub last_shot_tick: Option<u64>,
    /// Overlapping a station this tick
    pub recharging: bool,
    pub visible: bool,
}

/// Status readout for the UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hud {
    pub health: f32,
    pub max_health: f32,
    pub health_pct: f32,
    pub health_band: MeterBand,
    pub energy: f32,
    pub max_energy: f32,
    pub energy_pct: f32,
    pub energy_band: MeterBand,
    pub wave: u32,
    pub kills: u32,
    pub score: u64,
    pub recharging: bool,
    pub rush_active: bool,
    /// Seconds left to answer the special event
    pub special_event_secs_left: Option<f32>,
    pub game_over: bool,
}

/// Complete session state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub tuning: Tuning,
    pub rng: Pcg32,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub phase: GamePhase,
    pub player: Player,
    pub registry: Registry,
    pub director: Director,
    pub scheduler: Scheduler,
    /// Outbound events, drained by the host
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// New session with default tuning
    pub fn new(seed: u64) -> Self {
        Self::with_tuning(Tuning::default(), seed)
    }

    /// New session: lays out the office, places the player and spawns wave 1
    pub fn with_tuning(tuning: Tuning, seed: u64) -> Self {
        let mut registry = Registry::new();
        let start = Vec2::new(tuning.player.start.0, tuning.player.start.1);
        let player_id = registry.spawn(EntityKind::Player, start, tuning.player.size.half());

        let player = Player {
            id: player_id,
            health: Meter::full(tuning.player.max_health),
            energy: Meter::full(tuning.player.max_energy),
            facing: 0.0,
            base_speed: tuning.player.base_speed,
            speed_boost: 0.0,
            knockback: Vec2::ZERO,
            invulnerable_until: None,
            last_shot_tick: None,
            recharging: false,
            visible: true,
        };

        let mut state = Self {
            seed,
            director: Director::new(Arena::from_tuning(&tuning.layout)),
            tuning,
            rng: Pcg32::seed_from_u64(seed),
            time_ticks: 0,
            phase: GamePhase::Playing,
            player,
            registry,
            scheduler: Scheduler::new(),
            events: Vec::new(),
        };

        state.build_layout();
        director::spawn_wave(&mut state);
        log::info!("Session started with seed {}", seed);
        state
    }

    /// Border walls, recharge stations, then desks clear of the stations
    fn build_layout(&mut self) {
        self.spawn_border_walls();

        let station_half = self.tuning.layout.station_size.half();
        for pos in self.director.arena.recharge_positions.clone() {
            self.spawn(EntityKind::Station(Station::default()), pos, station_half);
        }

        let layout = &self.tuning.layout;
        let desk_half = layout.desk_size.half();
        let clearance = layout.station_clearance;
        let arena = &self.director.arena;
        let desks: Vec<Vec2> = arena
            .grid_cells(layout.start_clear_cell)
            .into_iter()
            .filter_map(|(row, col)| {
                find_free_desk_cell(arena, row, col, &arena.recharge_positions, clearance)
            })
            .collect();
        for pos in desks {
            self.spawn(EntityKind::Obstacle(Obstacle { border: false }), pos, desk_half);
        }
    }

    /// Spawn the four border walls for the current arena size
    pub fn spawn_border_walls(&mut self) {
        for wall in self.director.arena.border_walls() {
            self.spawn(EntityKind::Obstacle(Obstacle { border: true }), wall.center, wall.half);
        }
    }

    /// Create an entity and announce it
    pub fn spawn(&mut self, kind: EntityKind, pos: Vec2, half: Vec2) -> EntityId {
        let id = self.registry.spawn(kind, pos, half);
        self.emit(GameEvent::EntitySpawned {
            id,
            class: kind.class(),
            pos,
        });
        id
    }

    /// Destroy an entity and announce it. Stale ids are a no-op.
    pub fn despawn(&mut self, id: EntityId) -> bool {
        let Some(class) = self.registry.class_of(id) else {
            return false;
        };
        self.registry.destroy(id);
        self.emit(GameEvent::EntityDestroyed { id, class });
        true
    }

    /// Destroy every entity of a class and announce each removal
    pub fn despawn_class(&mut self, class: EntityClass) -> usize {
        let removed = self.registry.destroy_class(class);
        for &id in &removed {
            self.emit(GameEvent::EntityDestroyed { id, class });
        }
        removed.len()
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Schedule a timer `delay_ms` from now
    pub fn schedule(&mut self, delay_ms: u32, action: TimerAction) -> TimerId {
        self.scheduler
            .schedule(self.time_ticks, ms_to_ticks(delay_ms), action)
    }

    pub fn player_pos(&self) -> Vec2 {
        self.registry
            .get(self.player.id)
            .map(|e| e.pos)
            .unwrap_or(Vec2::ZERO)
    }

    pub fn is_invulnerable(&self) -> bool {
        self.player
            .invulnerable_until
            .is_some_and(|until| self.time_ticks < until)
    }

    pub fn summary(&self) -> GameOverSummary {
        GameOverSummary {
            wave: self.director.wave,
            kills: self.director.kills,
            score: self.director.score,
        }
    }

    /// Terminal transition: freeze adversaries, halt timers, hide the player
    pub fn game_over(&mut self) {
        if self.phase == GamePhase::GameOver {
            return;
        }
        self.phase = GamePhase::GameOver;

        for class in [EntityClass::GroundAdversary, EntityClass::FlyingAdversary] {
            self.registry.for_each(class, |e| e.vel = Vec2::ZERO);
        }
        if let Some(body) = self.registry.get_mut(self.player.id) {
            body.vel = Vec2::ZERO;
        }
        self.player.visible = false;
        self.player.knockback = Vec2::ZERO;
        self.scheduler.clear();
        self.director.pending_special = None;

        let summary = self.summary();
        log::info!(
            "Game over at wave {} ({} kills, score {})",
            summary.wave,
            summary.kills,
            summary.score
        );
        self.emit(GameEvent::MusicChanged(MusicTrack::Silent));
        self.emit(GameEvent::GameOver(summary));
    }

    /// Replace the session with a fresh one (same tuning, next seed)
    pub fn restart(&mut self) {
        let seed: u64 = self.rng.random();
        let tuning = self.tuning.clone();
        *self = GameState::with_tuning(tuning, seed);
        self.emit(GameEvent::Restarted { seed });
    }

    pub fn hud(&self) -> Hud {
        let special_event_secs_left = match &self.director.encounter {
            Encounter::SpecialEvent(ev) => self
                .scheduler
                .fire_at(ev.countdown)
                .map(|at| ticks_to_secs(at.saturating_sub(self.time_ticks))),
            _ => None,
        };
        Hud {
            health: self.player.health.value(),
            max_health: self.player.health.max(),
            health_pct: self.player.health.percentage(),
            health_band: self.player.health.band(),
            energy: self.player.energy.value(),
            max_energy: self.player.energy.max(),
            energy_pct: self.player.energy.percentage(),
            energy_band: self.player.energy.band(),
            wave: self.director.wave,
            kills: self.director.kills,
            score: self.director.score,
            recharging: self.player.recharging,
            rush_active: matches!(self.director.encounter, Encounter::Rush(_)),
            special_event_secs_left,
            game_over: self.phase == GamePhase::GameOver,
        }
    }
}
