//! Demo autopilot
//!
//! Produces a [`TickInput`] from the current state so the game can play
//! itself: answer the phone, top up energy when low, otherwise shoot the
//! nearest adversary while backing away from anything too close.

use glam::Vec2;

use super::director::Encounter;
use super::registry::EntityClass;
use super::state::{GamePhase, GameState};
use super::tick::TickInput;

/// Energy fraction below which the autopilot heads for a station
const LOW_ENERGY: f32 = 0.3;
/// Energy fraction at which it leaves the station again
const RECHARGED: f32 = 0.9;
/// Adversaries closer than this are kited
const KEEP_AWAY: f32 = 140.0;

/// Choose this tick's input
pub fn drive(state: &GameState) -> TickInput {
    let mut input = TickInput::default();
    if state.phase == GamePhase::GameOver {
        input.restart = true;
        return input;
    }

    let pos = state.player_pos();
    let nearest = state
        .registry
        .iter()
        .filter(|e| e.class().is_adversary())
        .min_by(|a, b| {
            a.pos
                .distance_squared(pos)
                .partial_cmp(&b.pos.distance_squared(pos))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

    if let Some(target) = nearest {
        input.aim = Some(target.pos);
        input.fire = true;
    }

    // The phone comes first: it ends the run if ignored
    if let Encounter::SpecialEvent(event) = state.director.encounter
        && let Some(desk) = state.registry.get(event.desk)
    {
        if desk.bounds().contains(pos) {
            input.event_action = true;
        } else {
            input.move_dir = (desk.pos - pos).normalize_or_zero();
        }
        return input;
    }

    let energy = state.player.energy.percentage();
    let topping_up = state.player.recharging && energy < RECHARGED;
    if energy < LOW_ENERGY || topping_up {
        input.recharge_held = true;
        if !state.player.recharging
            && let Some(station) = nearest_station(state, pos)
        {
            input.move_dir = (station - pos).normalize_or_zero();
        }
        return input;
    }

    if let Some(target) = nearest {
        let away = pos - target.pos;
        if away.length() < KEEP_AWAY {
            input.move_dir = away.normalize_or_zero();
        }
    }
    input
}

fn nearest_station(state: &GameState, pos: Vec2) -> Option<Vec2> {
    state
        .registry
        .of_class(EntityClass::Station)
        .map(|e| e.pos)
        .min_by(|a, b| {
            a.distance_squared(pos)
                .partial_cmp(&b.distance_squared(pos))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
}
