//! Fixed timestep simulation tick
//!
//! Order within a tick: due timers, player movement and firing, pursuit,
//! physics, contact resolution, recharge, culling, special-event completion,
//! wave completion.

use glam::Vec2;

use super::combat;
use super::director;
use super::physics;
use super::registry::{EntityClass, EntityKind, Pursuer};
use super::state::{GamePhase, GameState};
use super::timer::TimerAction;

/// Input intents for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Movement direction; normalized before use
    pub move_dir: Vec2,
    /// World-space aim point (mouse); falls back to the facing angle
    pub aim: Option<Vec2>,
    pub fire: bool,
    /// Recharge key held
    pub recharge_held: bool,
    /// Event action pressed this tick
    pub event_action: bool,
    /// Only honored after game over
    pub restart: bool,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    if state.phase == GamePhase::GameOver {
        if input.restart {
            state.restart();
        }
        return;
    }

    state.time_ticks += 1;

    run_timers(state);
    if state.phase == GamePhase::GameOver {
        return;
    }

    combat::begin_tick(state);
    move_player(state, input);
    if input.fire {
        combat::try_fire(state, input.aim);
    }
    steer_pursuers(state);

    let bounds = state.director.arena.bounds();
    let contacts = physics::step(&mut state.registry, bounds, dt);
    combat::resolve_contacts(state, &contacts);
    if state.phase == GamePhase::GameOver {
        return;
    }

    combat::apply_recharge(state, input.recharge_held);
    cull_strays(state);
    director::try_complete_special_event(state, input.event_action);
    director::check_wave_completion(state);
}

/// Fire every timer due this tick
fn run_timers(state: &mut GameState) {
    for (id, action) in state.scheduler.take_due(state.time_ticks) {
        if state.phase == GamePhase::GameOver {
            break;
        }
        match action {
            TimerAction::SpawnWave => director::spawn_wave(state),
            TimerAction::SettleSpawn => director::settle_spawn(state),
            TimerAction::StartSpecialEvent => {
                director::start_special_event(state);
            }
            TimerAction::SpecialEventExpired => director::special_event_expired(state, id),
            TimerAction::SpawnFlyer => {
                director::spawn_flyer(state);
            }
            TimerAction::EndRush => director::end_rush(state),
            TimerAction::ExpireProjectile(shot) => {
                state.despawn(shot);
            }
        }
    }
}

fn move_player(state: &mut GameState, input: &TickInput) {
    let dir = input.move_dir.normalize_or_zero();
    if dir != Vec2::ZERO {
        state.player.facing = dir.y.atan2(dir.x);
    }

    let speed = state.player.base_speed + state.player.speed_boost;
    let vel = dir * speed + state.player.knockback;

    state.player.knockback *= state.tuning.player.knockback_decay;
    if state.player.knockback.length_squared() < 1.0 {
        state.player.knockback = Vec2::ZERO;
    }

    if let Some(body) = state.registry.get_mut(state.player.id) {
        body.vel = vel;
    }
}

/// Ground adversaries head straight for the player
fn steer_pursuers(state: &mut GameState) {
    let target = state.player_pos();
    let stop = state.tuning.adversaries.pursuit_stop_distance;
    state.registry.for_each(EntityClass::GroundAdversary, |e| {
        let EntityKind::GroundAdversary(Pursuer { speed }) = e.kind else {
            return;
        };
        let to = target - e.pos;
        e.vel = if to.length() < stop {
            Vec2::ZERO
        } else {
            to.normalize_or_zero() * speed
        };
    });
}

/// Drop flyers that left the arena by more than the cull margin
fn cull_strays(state: &mut GameState) {
    let margin = state.tuning.adversaries.flying_cull_margin;
    let keep = state.director.arena.bounds().inflate(margin);
    let strays: Vec<_> = state
        .registry
        .of_class(EntityClass::FlyingAdversary)
        .filter(|e| !keep.contains(e.pos))
        .map(|e| e.id)
        .collect();
    for id in strays {
        state.despawn(id);
    }
}
