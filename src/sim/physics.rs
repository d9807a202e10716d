//! Minimal arcade physics
//!
//! Axis-aligned boxes only. Mobile bodies integrate their velocity, walkers
//! (player and ground adversaries) are pushed out of solid obstacles and kept
//! inside the arena, and overlapping pairs that matter to gameplay are
//! reported in ascending id order.

use super::collision::Aabb;
use super::registry::{EntityClass, EntityId, Registry};

/// How two bodies touched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactKind {
    /// Bodies overlap; triggers gameplay callbacks
    Overlap,
    /// A walker was pushed out of a solid; no gameplay effect
    Collision,
}

/// A contact between two entities, `a < b` for overlaps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub a: EntityId,
    pub b: EntityId,
    pub kind: ContactKind,
}

/// Blocked by obstacles and the arena bounds
fn is_walker(class: EntityClass) -> bool {
    matches!(class, EntityClass::Player | EntityClass::GroundAdversary)
}

/// Class pairs whose overlap is reported
pub fn reports_overlap(a: EntityClass, b: EntityClass) -> bool {
    fn one_way(a: EntityClass, b: EntityClass) -> bool {
        use EntityClass::*;
        matches!(
            (a, b),
            (Player, GroundAdversary)
                | (Player, FlyingAdversary)
                | (Player, Station)
                | (Player, Pickup)
                | (Projectile, GroundAdversary)
                | (Projectile, FlyingAdversary)
        )
    }
    one_way(a, b) || one_way(b, a)
}

/// Advance every body by `dt` and return this step's contacts
pub fn step(registry: &mut Registry, bounds: Aabb, dt: f32) -> Vec<Contact> {
    let mut contacts = Vec::new();

    let solids: Vec<(EntityId, Aabb)> = registry
        .of_class(EntityClass::Obstacle)
        .map(|e| (e.id, e.bounds()))
        .collect();

    for e in registry.iter_mut() {
        let class = e.class();
        if !class.is_mobile() {
            continue;
        }
        e.pos += e.vel * dt;

        if !is_walker(class) {
            continue;
        }
        for (solid_id, solid) in &solids {
            if let Some(push) = e.bounds().push_out(solid) {
                e.pos += push;
                contacts.push(Contact {
                    a: e.id,
                    b: *solid_id,
                    kind: ContactKind::Collision,
                });
            }
        }
        e.pos = bounds.clamp_inside(e.pos, e.half);
    }

    let bodies: Vec<(EntityId, EntityClass, Aabb)> = registry
        .iter()
        .map(|e| (e.id, e.class(), e.bounds()))
        .collect();

    for (i, (id_a, class_a, box_a)) in bodies.iter().enumerate() {
        for (id_b, class_b, box_b) in &bodies[i + 1..] {
            if reports_overlap(*class_a, *class_b) && box_a.overlaps(box_b) {
                contacts.push(Contact {
                    a: *id_a,
                    b: *id_b,
                    kind: ContactKind::Overlap,
                });
            }
        }
    }

    contacts
}
