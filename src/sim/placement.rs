//! Bounded-attempt spawn placement
//!
//! Placement never blocks: after `max_attempts` rejected samples the last one
//! is used anyway, and desk cells too close to a station are skipped.

use glam::Vec2;
use rand::Rng;

use super::arena::{Arena, Occupancy};

/// Sample a position inside the arena shrunk by `margin`.
///
/// Accepts the first sample that is at least `min_distance` from `player` and
/// not inside an obstacle, otherwise returns the last sample drawn.
pub fn find_spawn_position<R: Rng>(
    rng: &mut R,
    occupancy: &impl Occupancy,
    player: Vec2,
    min_distance: f32,
    max_attempts: u32,
    margin: f32,
) -> Vec2 {
    let area = occupancy.bounds().inflate(-margin);
    let (lo, hi) = (area.min(), area.max());

    let mut pos = area.center;
    for _ in 0..max_attempts.max(1) {
        pos = Vec2::new(sample(rng, lo.x, hi.x), sample(rng, lo.y, hi.y));
        if pos.distance(player) >= min_distance && !occupancy.is_occupied(pos) {
            return pos;
        }
    }
    log::debug!(
        "No clear spawn after {} attempts, using ({:.0}, {:.0})",
        max_attempts,
        pos.x,
        pos.y
    );
    pos
}

/// Center of desk cell `(row, col)`, or `None` if a recharge station is closer
/// than `min_distance`
pub fn find_free_desk_cell(
    arena: &Arena,
    row: u32,
    col: u32,
    recharge_positions: &[Vec2],
    min_distance: f32,
) -> Option<Vec2> {
    let pos = arena.cell_center(row, col);
    if recharge_positions
        .iter()
        .any(|station| station.distance(pos) < min_distance)
    {
        return None;
    }
    Some(pos)
}

fn sample<R: Rng>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    if hi > lo { rng.random_range(lo..=hi) } else { lo }
}
