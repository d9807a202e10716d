//! Wave director
//!
//! Owns the wave/kill/score counters and the encounter state machine:
//!
//! - `Normal`: ground waves; a wave ends when no ground adversary is left
//! - `SpecialEvent`: a phone desk must be answered before its countdown ends
//! - `Rush`: timed flood of flying adversaries every few waves
//!
//! Special events and rushes are mutually exclusive. Waves never advance while
//! either is active or while the next wave is still being placed.

use glam::Vec2;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use super::arena::{Arena, ArenaView, Occupancy};
use super::placement::{find_free_desk_cell, find_spawn_position};
use super::registry::{EntityClass, EntityId, EntityKind, EventDesk, Obstacle, Pursuer};
use super::state::{GameEvent, GamePhase, GameState, MusicTrack};
use super::timer::{TimerAction, TimerId};
use crate::tuning::DirectorTuning;

/// Running special event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialEvent {
    pub desk: EntityId,
    pub countdown: TimerId,
}

/// Running flying rush
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rush {
    pub flyers: u32,
    pub end_timer: TimerId,
}

/// What the current wave is doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Encounter {
    #[default]
    Normal,
    SpecialEvent(SpecialEvent),
    Rush(Rush),
}

impl Encounter {
    pub fn is_normal(&self) -> bool {
        matches!(self, Encounter::Normal)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Director {
    /// Current wave, starting at 1
    pub wave: u32,
    pub kills: u32,
    pub score: u64,
    /// Next wave is being placed; completion checks are suppressed
    pub spawning: bool,
    pub encounter: Encounter,
    /// Scheduled special-event start, if any
    pub pending_special: Option<TimerId>,
    pub arena: Arena,
}

impl Director {
    pub fn new(arena: Arena) -> Self {
        Self {
            wave: 1,
            kills: 0,
            score: 0,
            spawning: false,
            encounter: Encounter::Normal,
            pending_special: None,
            arena,
        }
    }
}

/// Ground adversaries in a wave: `base + floor(wave / 2)`
pub fn adversary_count(base: u32, wave: u32) -> u32 {
    base + wave / 2
}

/// Flyers in a rush wave, never fewer than one
pub fn rush_flyer_count(tuning: &DirectorTuning, wave: u32) -> u32 {
    let count = tuning.rush_base_count + (wave as i64 - tuning.rush_pivot_wave) * tuning.rush_count_per_wave;
    count.max(1) as u32
}

pub fn is_rush_wave(tuning: &DirectorTuning, wave: u32) -> bool {
    tuning.rush_every > 0 && wave >= tuning.rush_every && wave % tuning.rush_every == 0
}

/// Advance when the field is clear of ground adversaries
pub fn check_wave_completion(state: &mut GameState) {
    let director = &state.director;
    if state.phase != GamePhase::Playing || director.spawning || !director.encounter.is_normal() {
        return;
    }
    if state.registry.active_count(EntityClass::GroundAdversary) > 0 {
        return;
    }
    start_next_wave(state);
}

/// Bump the wave and either start a rush or queue the next ground wave
pub fn start_next_wave(state: &mut GameState) {
    if state.director.spawning {
        return;
    }
    debug_assert!(
        state.director.encounter.is_normal(),
        "wave advanced during {:?}",
        state.director.encounter
    );

    state.director.wave += 1;
    let wave = state.director.wave;
    log::info!("Wave {} cleared, advancing to {}", wave - 1, wave);
    state.emit(GameEvent::WaveAdvanced { wave });

    if wave > state.tuning.layout.expansion_after_wave {
        expand_arena(state);
    }

    if is_rush_wave(&state.tuning.director, wave) {
        start_rush(state);
        return;
    }

    let chance = state.tuning.director.wave_pickup_chance;
    maybe_spawn_pickup(state, chance);

    state.director.spawning = true;
    let delay = state.tuning.director.next_wave_delay_ms;
    state.schedule(delay, TimerAction::SpawnWave);
}

/// Place this wave's ground adversaries
pub fn spawn_wave(state: &mut GameState) {
    state.director.spawning = true;

    let wave = state.director.wave;
    let t = &state.tuning.director;
    let count = adversary_count(t.base_per_wave, wave);
    let (min_distance, attempts, margin) = (t.spawn_min_distance, t.spawn_max_attempts, t.spawn_margin);
    let a = &state.tuning.adversaries;
    let speed = a.ground_base_speed + a.ground_speed_per_wave * wave as f32;
    let half = a.ground_size.half();
    let player = state.player_pos();

    for _ in 0..count {
        let view = ArenaView {
            arena: &state.director.arena,
            registry: &state.registry,
        };
        let pos = find_spawn_position(&mut state.rng, &view, player, min_distance, attempts, margin);
        state.spawn(EntityKind::GroundAdversary(Pursuer { speed }), pos, half);
    }

    log::info!("Wave {}: {} adversaries at speed {}", wave, count, speed);
    state.emit(GameEvent::WaveStarted {
        wave,
        adversaries: count,
    });

    let settle = state.tuning.director.settle_delay_ms;
    state.schedule(settle, TimerAction::SettleSpawn);
    schedule_special_event(state);
}

/// Placement finished; completion checks resume
pub fn settle_spawn(state: &mut GameState) {
    state.director.spawning = false;
}

/// Queue a special event at a random delay, at most one pending at a time
pub fn schedule_special_event(state: &mut GameState) -> Option<TimerId> {
    let t = &state.tuning.director;
    let director = &state.director;
    if director.wave < t.special_min_wave
        || !director.encounter.is_normal()
        || director.pending_special.is_some()
    {
        return None;
    }
    let (lo, hi) = (t.special_delay_min_ms, t.special_delay_max_ms.max(t.special_delay_min_ms));
    let delay = state.rng.random_range(lo..=hi);
    let id = state.schedule(delay, TimerAction::StartSpecialEvent);
    state.director.pending_special = Some(id);
    log::debug!("Special event scheduled in {} ms", delay);
    Some(id)
}

/// Interior desks far enough from every recharge station
pub fn special_event_candidates(state: &GameState) -> Vec<EntityId> {
    let clearance = state.tuning.layout.station_clearance;
    let stations = &state.director.arena.recharge_positions;
    state
        .registry
        .of_class(EntityClass::Obstacle)
        .filter(|e| matches!(e.kind, EntityKind::Obstacle(Obstacle { border: false })))
        .filter(|e| stations.iter().all(|s| s.distance(e.pos) >= clearance))
        .map(|e| e.id)
        .collect()
}

/// Replace a random desk with the ringing phone desk and start its countdown
pub fn start_special_event(state: &mut GameState) -> bool {
    state.director.pending_special = None;
    if state.phase != GamePhase::Playing {
        return false;
    }
    if !state.director.encounter.is_normal() {
        log::info!(
            "Special event skipped during {:?}",
            state.director.encounter
        );
        return false;
    }

    let candidates = special_event_candidates(state);
    let Some(&desk) = candidates.choose(&mut state.rng) else {
        log::warn!("Special event skipped: no eligible desk");
        return false;
    };
    let Some(replaced) = state.registry.get(desk).map(|e| e.bounds()) else {
        return false;
    };

    state.despawn(desk);
    let half = state.tuning.layout.event_desk_size.half();
    let event_desk = state.spawn(EntityKind::EventDesk(EventDesk { replaced }), replaced.center, half);
    let duration_ms = state.tuning.director.special_duration_ms;
    let countdown = state.schedule(duration_ms, TimerAction::SpecialEventExpired);
    state.director.encounter = Encounter::SpecialEvent(SpecialEvent {
        desk: event_desk,
        countdown,
    });

    log::info!(
        "Special event at ({:.0}, {:.0}), {} ms to answer",
        replaced.center.x,
        replaced.center.y,
        duration_ms
    );
    state.emit(GameEvent::SpecialEventStarted {
        desk: event_desk,
        pos: replaced.center,
        duration_ms,
    });
    state.emit(GameEvent::MusicChanged(MusicTrack::Event));
    true
}

/// Answer the phone: action pressed while standing on the event desk
pub fn try_complete_special_event(state: &mut GameState, action_pressed: bool) -> bool {
    if !action_pressed {
        return false;
    }
    let Encounter::SpecialEvent(event) = state.director.encounter else {
        return false;
    };
    let Some(desk) = state.registry.get(event.desk) else {
        return false;
    };
    if !desk.bounds().contains(state.player_pos()) {
        return false;
    }

    state.scheduler.cancel(event.countdown);
    state.despawn(event.desk);
    state.director.encounter = Encounter::Normal;
    log::info!("Special event completed");
    state.emit(GameEvent::SpecialEventCompleted);
    state.emit(GameEvent::MusicChanged(MusicTrack::Normal));
    true
}

/// Countdown ran out. Stale timers (event already answered) do nothing.
pub fn special_event_expired(state: &mut GameState, timer: TimerId) {
    match state.director.encounter {
        Encounter::SpecialEvent(event) if event.countdown == timer => {
            log::info!("Special event unanswered");
            state.game_over();
        }
        _ => {}
    }
}

/// Schedule a wave of flyers spread across the rush window
pub fn start_rush(state: &mut GameState) {
    debug_assert!(state.director.encounter.is_normal());

    let wave = state.director.wave;
    let t = &state.tuning.director;
    let flyers = rush_flyer_count(t, wave);
    let (window, grace) = (t.rush_window_ms, t.rush_grace_ms);
    let interval = window as f64 / flyers as f64;

    for i in 0..flyers {
        state.schedule((i as f64 * interval) as u32, TimerAction::SpawnFlyer);
    }
    let end_timer = state.schedule(window + grace, TimerAction::EndRush);
    state.director.encounter = Encounter::Rush(Rush { flyers, end_timer });

    log::info!("Rush wave {}: {} flyers over {} ms", wave, flyers, window);
    state.emit(GameEvent::RushStarted { wave, flyers });
}

/// One flyer entering from a random edge and crossing the arena
pub fn spawn_flyer(state: &mut GameState) -> Option<EntityId> {
    if !matches!(state.director.encounter, Encounter::Rush(_)) {
        return None;
    }

    let a = &state.tuning.adversaries;
    let (w, h) = (state.director.arena.width, state.director.arena.height);
    let off = a.flying_entry_offset;
    let speed = a.flying_base_speed + a.flying_speed_per_wave * state.director.wave as f32;
    let lateral = a.flying_lateral_speed;
    let half = a.flying_size.half();

    let edge = state.rng.random_range(0..4u8);
    let (pos, forward) = match edge {
        0 => (Vec2::new(across(&mut state.rng, w, off), -off), Vec2::new(0.0, speed)),
        1 => (Vec2::new(across(&mut state.rng, w, off), h + off), Vec2::new(0.0, -speed)),
        2 => (Vec2::new(-off, across(&mut state.rng, h, off)), Vec2::new(speed, 0.0)),
        _ => (Vec2::new(w + off, across(&mut state.rng, h, off)), Vec2::new(-speed, 0.0)),
    };
    let drift = if lateral > 0.0 {
        state.rng.random_range(-lateral..=lateral)
    } else {
        0.0
    };
    let vel = if forward.x == 0.0 {
        forward + Vec2::new(drift, 0.0)
    } else {
        forward + Vec2::new(0.0, drift)
    };

    let id = state.spawn(EntityKind::FlyingAdversary, pos, half);
    if let Some(body) = state.registry.get_mut(id) {
        body.vel = vel;
    }
    Some(id)
}

/// Random point along an edge of length `len`, `margin` in from each corner
fn across<R: Rng>(rng: &mut R, len: f32, margin: f32) -> f32 {
    if len - margin > margin {
        rng.random_range(margin..=len - margin)
    } else {
        len / 2.0
    }
}

/// Rush over: clear remaining flyers and queue the next ground wave
pub fn end_rush(state: &mut GameState) {
    if !matches!(state.director.encounter, Encounter::Rush(_)) {
        return;
    }
    let cleared = state.despawn_class(EntityClass::FlyingAdversary);
    state.director.encounter = Encounter::Normal;

    let wave = state.director.wave;
    log::info!("Rush wave {} over, {} flyers cleared", wave, cleared);
    state.emit(GameEvent::RushEnded { wave });

    let chance = state.tuning.director.rush_pickup_chance;
    maybe_spawn_pickup(state, chance);

    state.director.spawning = true;
    let delay = state.tuning.director.rush_resume_delay_ms;
    state.schedule(delay, TimerAction::SpawnWave);
}

/// Drop a health pickup with probability `chance`
pub fn maybe_spawn_pickup(state: &mut GameState, chance: f64) -> Option<EntityId> {
    if !state.rng.random_bool(chance.clamp(0.0, 1.0)) {
        return None;
    }
    let t = &state.tuning.director;
    let (attempts, margin) = (t.spawn_max_attempts, t.pickup_margin);
    let half = state.tuning.adversaries.pickup_size.half();
    let player = state.player_pos();
    let view = ArenaView {
        arena: &state.director.arena,
        registry: &state.registry,
    };
    let pos = find_spawn_position(&mut state.rng, &view, player, 0.0, attempts, margin);
    Some(state.spawn(EntityKind::Pickup, pos, half))
}

/// Grow the arena by one grid line, rebuild the border and fill the new line
/// with desks
pub fn expand_arena(state: &mut GameState) {
    let after = state.tuning.layout.expansion_after_wave;
    let axis = Arena::axis_for_wave(state.director.wave, after);
    let expansion = state.director.arena.expand(axis);

    let borders: Vec<EntityId> = state
        .registry
        .of_class(EntityClass::Obstacle)
        .filter(|e| matches!(e.kind, EntityKind::Obstacle(Obstacle { border: true })))
        .map(|e| e.id)
        .collect();
    for id in borders {
        state.despawn(id);
    }
    state.spawn_border_walls();

    let clearance = state.tuning.layout.station_clearance;
    let desk_half = state.tuning.layout.desk_size.half();
    let mut desks_added = 0;
    for (row, col) in expansion.cells {
        let arena = &state.director.arena;
        let Some(pos) = find_free_desk_cell(arena, row, col, &arena.recharge_positions, clearance) else {
            log::debug!("Desk cell ({}, {}) too close to a station", row, col);
            continue;
        };
        let view = ArenaView {
            arena,
            registry: &state.registry,
        };
        if view.is_occupied(pos) {
            log::debug!("Desk cell ({}, {}) already occupied", row, col);
            continue;
        }
        state.spawn(EntityKind::Obstacle(Obstacle { border: false }), pos, desk_half);
        desks_added += 1;
    }

    let (width, height) = (state.director.arena.width, state.director.arena.height);
    log::info!("Arena expanded ({:?}) to {}x{}", axis, width, height);
    state.emit(GameEvent::ArenaExpanded {
        axis,
        width,
        height,
        desks_added,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::arena::ExpansionAxis;
    use proptest::prelude::*;

    fn clear_ground(state: &mut GameState) {
        for id in state.registry.ids(EntityClass::GroundAdversary) {
            state.despawn(id);
        }
    }

    #[test]
    fn test_adversary_count_scaling() {
        assert_eq!(adversary_count(3, 1), 3);
        assert_eq!(adversary_count(3, 2), 4);
        assert_eq!(adversary_count(3, 7), 6);
    }

    #[test]
    fn test_rush_schedule() {
        let t = DirectorTuning::default();
        assert!(!is_rush_wave(&t, 4));
        assert!(is_rush_wave(&t, 5));
        assert!(is_rush_wave(&t, 10));
        assert!(!is_rush_wave(&t, 11));
        assert_eq!(rush_flyer_count(&t, 5), 10);
        assert_eq!(rush_flyer_count(&t, 10), 20);
        assert_eq!(rush_flyer_count(&t, 15), 30);
    }

    #[test]
    fn test_wave_not_advanced_while_spawning() {
        let mut state = GameState::new(2);
        clear_ground(&mut state);
        assert!(state.director.spawning);
        check_wave_completion(&mut state);
        assert_eq!(state.director.wave, 1);

        settle_spawn(&mut state);
        check_wave_completion(&mut state);
        assert_eq!(state.director.wave, 2);
        assert!(state.director.spawning);
    }

    #[test]
    fn test_spawn_wave_places_scaled_pursuers() {
        let mut state = GameState::new(4);
        clear_ground(&mut state);
        state.director.wave = 6;
        spawn_wave(&mut state);
        let pursuers: Vec<_> = state.registry.of_class(EntityClass::GroundAdversary).collect();
        assert_eq!(pursuers.len(), 6);
        for p in pursuers {
            assert!(matches!(p.kind, EntityKind::GroundAdversary(Pursuer { speed }) if speed == 42.0));
        }
        // Wave >= 3 queues exactly one special event
        assert!(state.director.pending_special.is_some());
        let again = schedule_special_event(&mut state);
        assert!(again.is_none());
    }

    #[test]
    fn test_special_event_candidates_skip_borders_and_stations() {
        let state = GameState::new(8);
        let candidates = special_event_candidates(&state);
        assert_eq!(candidates.len(), 10);
        for id in candidates {
            let e = state.registry.get(id).unwrap();
            assert!(matches!(e.kind, EntityKind::Obstacle(Obstacle { border: false })));
        }
    }

    #[test]
    fn test_special_event_lifecycle() {
        let mut state = GameState::new(12);
        assert!(start_special_event(&mut state));
        let Encounter::SpecialEvent(event) = state.director.encounter else {
            panic!("expected special event");
        };
        assert!(state.scheduler.is_pending(event.countdown));
        assert_eq!(state.registry.active_count(EntityClass::EventDesk), 1);

        // A second start while one runs is skipped
        assert!(!start_special_event(&mut state));

        // Not standing on the desk: nothing happens
        assert!(!try_complete_special_event(&mut state, true));

        let desk_pos = state.registry.get(event.desk).unwrap().pos;
        let player = state.player.id;
        state.registry.get_mut(player).unwrap().pos = desk_pos;
        assert!(!try_complete_special_event(&mut state, false));
        assert!(try_complete_special_event(&mut state, true));

        assert!(state.director.encounter.is_normal());
        assert!(!state.scheduler.is_pending(event.countdown));
        assert_eq!(state.registry.active_count(EntityClass::EventDesk), 0);
        assert!(state
            .drain_events()
            .contains(&GameEvent::MusicChanged(MusicTrack::Normal)));

        // Stale countdown after completion does not end the run
        special_event_expired(&mut state, event.countdown);
        assert_eq!(state.phase, GamePhase::Playing);
    }

    #[test]
    fn test_special_event_timeout_ends_run() {
        let mut state = GameState::new(13);
        assert!(start_special_event(&mut state));
        let Encounter::SpecialEvent(event) = state.director.encounter else {
            panic!("expected special event");
        };
        special_event_expired(&mut state, event.countdown);
        assert_eq!(state.phase, GamePhase::GameOver);
    }

    #[test]
    fn test_special_event_skipped_during_rush() {
        let mut state = GameState::new(14);
        state.director.wave = 5;
        start_rush(&mut state);
        assert!(!start_special_event(&mut state));
        assert!(matches!(state.director.encounter, Encounter::Rush(_)));
        assert_eq!(state.registry.active_count(EntityClass::EventDesk), 0);
    }

    #[test]
    fn test_rush_lifecycle_clears_flyers() {
        let mut state = GameState::new(21);
        clear_ground(&mut state);
        settle_spawn(&mut state);
        state.director.wave = 4;
        start_next_wave(&mut state);

        let Encounter::Rush(rush) = state.director.encounter else {
            panic!("wave 5 should be a rush");
        };
        assert_eq!(rush.flyers, 10);
        assert!(!state.director.spawning);

        for _ in 0..3 {
            let id = spawn_flyer(&mut state).unwrap();
            let body = state.registry.get(id).unwrap();
            assert!(!state.director.arena.bounds().contains(body.pos));
            assert!(body.vel.length() >= 525.0);
        }

        // No wave progress during a rush even with the floor clear
        check_wave_completion(&mut state);
        assert_eq!(state.director.wave, 5);

        end_rush(&mut state);
        assert!(state.director.encounter.is_normal());
        assert_eq!(state.registry.active_count(EntityClass::FlyingAdversary), 0);
        assert!(state.director.spawning);
        assert!(spawn_flyer(&mut state).is_none());
    }

    #[test]
    fn test_expansion_rebuilds_border() {
        let mut state = GameState::new(30);
        state.director.wave = 12;
        expand_arena(&mut state);

        assert_eq!(state.director.arena.width, 1000.0);
        let borders: Vec<_> = state
            .registry
            .of_class(EntityClass::Obstacle)
            .filter(|e| matches!(e.kind, EntityKind::Obstacle(Obstacle { border: true })))
            .collect();
        assert_eq!(borders.len(), 4);
        assert!(borders.iter().any(|w| w.bounds().max().x == 1000.0));
        assert!(state.events.iter().any(|e| matches!(
            e,
            GameEvent::ArenaExpanded {
                axis: ExpansionAxis::Columns,
                desks_added: 3,
                ..
            }
        )));
    }

    fn interior_desks(state: &GameState) -> Vec<Vec2> {
        state
            .registry
            .of_class(EntityClass::Obstacle)
            .filter(|e| matches!(e.kind, EntityKind::Obstacle(Obstacle { border: false })))
            .map(|e| e.pos)
            .collect()
    }

    fn desks_added(state: &GameState) -> Option<u32> {
        state.events.iter().find_map(|e| match e {
            GameEvent::ArenaExpanded { desks_added, .. } => Some(*desks_added),
            _ => None,
        })
    }

    #[test]
    fn test_expansion_skips_cells_near_stations() {
        let mut tuning = crate::Tuning::default();
        // Sits on cell (1, 4) of the column added at wave 12
        let station = Vec2::new(950.0, 320.0);
        tuning.layout.stations.push((station.x, station.y));
        let clearance = tuning.layout.station_clearance;
        let mut state = GameState::with_tuning(tuning, 31);
        state.director.wave = 12;
        expand_arena(&mut state);

        assert_eq!(desks_added(&state), Some(2));
        assert!(interior_desks(&state).iter().all(|d| d.distance(station) >= clearance));
        assert!(interior_desks(&state).contains(&Vec2::new(950.0, 120.0)));
        assert!(interior_desks(&state).contains(&Vec2::new(950.0, 520.0)));
    }

    #[test]
    fn test_expansion_skips_occupied_cells() {
        let mut state = GameState::new(32);
        let blocker = Vec2::new(950.0, 520.0);
        state.spawn(EntityKind::Obstacle(Obstacle { border: false }), blocker, Vec2::splat(30.0));
        state.director.wave = 12;
        expand_arena(&mut state);

        assert_eq!(desks_added(&state), Some(2));
        let stacked = interior_desks(&state).iter().filter(|d| **d == blocker).count();
        assert_eq!(stacked, 1);
    }

    proptest! {
        #[test]
        fn prop_wave_size_never_shrinks(wave in 1u32..500) {
            prop_assert!(adversary_count(3, wave + 1) >= adversary_count(3, wave));
            prop_assert!(rush_flyer_count(&DirectorTuning::default(), wave) >= 1);
        }
    }
}
