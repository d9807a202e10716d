//! Entity registry
//!
//! Owns every live body in the arena. Entities are stored sorted by id so all
//! iteration is deterministic. Destroying an id that is already gone is a
//! no-op: TTL expiry, combat hits and bounds culling can race for the same
//! entity inside one tick.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Aabb;

/// Stable entity handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Ground adversary payload
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pursuer {
    /// Movement speed, fixed at spawn from the wave number
    pub speed: f32,
}

/// Recharge station payload
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Station {
    /// Player is recharging here this tick
    pub active: bool,
}

/// Solid obstacle payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Obstacle {
    /// Border walls are regenerated on arena expansion; desks are not
    pub border: bool,
}

/// Special-event desk payload
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventDesk {
    /// Bounds of the ordinary desk this one replaced
    pub replaced: Aabb,
}

/// What an entity is, with kind-specific data
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EntityKind {
    Player,
    GroundAdversary(Pursuer),
    FlyingAdversary,
    Projectile,
    Pickup,
    Station(Station),
    Obstacle(Obstacle),
    EventDesk(EventDesk),
}

/// Field-less tag of [`EntityKind`], used for counting and dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityClass {
    Player,
    GroundAdversary,
    FlyingAdversary,
    Projectile,
    Pickup,
    Station,
    Obstacle,
    EventDesk,
}

impl EntityKind {
    pub fn class(&self) -> EntityClass {
        match self {
            EntityKind::Player => EntityClass::Player,
            EntityKind::GroundAdversary(_) => EntityClass::GroundAdversary,
            EntityKind::FlyingAdversary => EntityClass::FlyingAdversary,
            EntityKind::Projectile => EntityClass::Projectile,
            EntityKind::Pickup => EntityClass::Pickup,
            EntityKind::Station(_) => EntityClass::Station,
            EntityKind::Obstacle(_) => EntityClass::Obstacle,
            EntityKind::EventDesk(_) => EntityClass::EventDesk,
        }
    }
}

impl EntityClass {
    pub fn is_adversary(self) -> bool {
        matches!(self, EntityClass::GroundAdversary | EntityClass::FlyingAdversary)
    }

    /// Moves under its own velocity
    pub fn is_mobile(self) -> bool {
        matches!(
            self,
            EntityClass::Player
                | EntityClass::GroundAdversary
                | EntityClass::FlyingAdversary
                | EntityClass::Projectile
        )
    }
}

/// A live body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub half: Vec2,
}

impl Entity {
    pub fn class(&self) -> EntityClass {
        self.kind.class()
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.pos, self.half)
    }
}

/// All live entities, sorted by id
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Registry {
    entities: Vec<Entity>,
    next_id: u32,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            next_id: 1,
        }
    }

    /// Create an entity and return its handle
    pub fn spawn(&mut self, kind: EntityKind, pos: Vec2, half: Vec2) -> EntityId {
        let id = EntityId(self.next_id.max(1));
        self.next_id = id.0 + 1;
        // Ids only grow, so pushing keeps the vector sorted
        self.entities.push(Entity {
            id,
            kind,
            pos,
            vel: Vec2::ZERO,
            half,
        });
        id
    }

    /// Remove an entity. Returns false if it was already gone.
    pub fn destroy(&mut self, id: EntityId) -> bool {
        match self.index_of(id) {
            Some(idx) => {
                self.entities.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Remove every entity of a class, returning the removed ids
    pub fn destroy_class(&mut self, class: EntityClass) -> Vec<EntityId> {
        let ids = self.ids(class);
        self.entities.retain(|e| e.class() != class);
        ids
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.index_of(id).map(|i| &self.entities[i])
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.index_of(id).map(move |i| &mut self.entities[i])
    }

    pub fn class_of(&self, id: EntityId) -> Option<EntityClass> {
        self.get(id).map(Entity::class)
    }

    pub fn active_count(&self, class: EntityClass) -> usize {
        self.entities.iter().filter(|e| e.class() == class).count()
    }

    pub fn ids(&self, class: EntityClass) -> Vec<EntityId> {
        self.of_class(class).map(|e| e.id).collect()
    }

    pub fn of_class(&self, class: EntityClass) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(move |e| e.class() == class)
    }

    pub fn for_each(&mut self, class: EntityClass, mut f: impl FnMut(&mut Entity)) {
        for e in self.entities.iter_mut().filter(|e| e.class() == class) {
            f(e);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.iter_mut()
    }

    fn index_of(&self, id: EntityId) -> Option<usize> {
        self.entities.binary_search_by_key(&id, |e| e.id).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pursuer() -> EntityKind {
        EntityKind::GroundAdversary(Pursuer { speed: 32.0 })
    }

    #[test]
    fn test_spawn_assigns_increasing_ids() {
        let mut reg = Registry::new();
        let a = reg.spawn(pursuer(), Vec2::ZERO, Vec2::ONE);
        let b = reg.spawn(EntityKind::Pickup, Vec2::ONE, Vec2::ONE);
        assert!(b > a);
        assert_eq!(reg.active_count(EntityClass::GroundAdversary), 1);
        assert_eq!(reg.active_count(EntityClass::Pickup), 1);
    }

    #[test]
    fn test_double_destroy_is_noop() {
        let mut reg = Registry::new();
        let a = reg.spawn(pursuer(), Vec2::ZERO, Vec2::ONE);
        let b = reg.spawn(pursuer(), Vec2::ONE, Vec2::ONE);

        assert!(reg.destroy(a));
        let after_once: Vec<EntityId> = reg.iter().map(|e| e.id).collect();
        assert!(!reg.destroy(a));
        let after_twice: Vec<EntityId> = reg.iter().map(|e| e.id).collect();

        assert_eq!(after_once, after_twice);
        assert_eq!(after_once, vec![b]);
        assert!(reg.get_mut(a).is_none());
    }

    #[test]
    fn test_ids_never_reused_after_destroy() {
        let mut reg = Registry::new();
        let a = reg.spawn(EntityKind::Projectile, Vec2::ZERO, Vec2::ONE);
        reg.destroy(a);
        let b = reg.spawn(EntityKind::Projectile, Vec2::ZERO, Vec2::ONE);
        assert_ne!(a, b);
        assert!(!reg.contains(a));
    }

    #[test]
    fn test_destroy_class_and_for_each() {
        let mut reg = Registry::new();
        for i in 0..3 {
            reg.spawn(EntityKind::FlyingAdversary, Vec2::splat(i as f32), Vec2::ONE);
        }
        let keep = reg.spawn(pursuer(), Vec2::ZERO, Vec2::ONE);

        reg.for_each(EntityClass::FlyingAdversary, |e| e.vel = Vec2::X);
        assert!(reg.of_class(EntityClass::FlyingAdversary).all(|e| e.vel == Vec2::X));

        let removed = reg.destroy_class(EntityClass::FlyingAdversary);
        assert_eq!(removed.len(), 3);
        assert_eq!(reg.active_count(EntityClass::FlyingAdversary), 0);
        assert!(reg.contains(keep));
    }
}
