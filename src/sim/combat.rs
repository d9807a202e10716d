//! Combat engine: shooting, hits, contact damage, recharge and pickups
//!
//! Contacts are resolved in the order physics reported them. Any contact whose
//! entities are already gone (destroyed earlier in the same tick) is skipped,
//! and resolution stops as soon as the run ends.

use glam::Vec2;

use super::physics::{Contact, ContactKind};
use super::registry::{EntityClass, EntityId, EntityKind};
use super::state::{GameEvent, GamePhase, GameState};
use super::timer::TimerAction;
use crate::{angle_between, direction_from_angle, ms_to_ticks};

/// Per-tick reset of transient flags
pub fn begin_tick(state: &mut GameState) {
    state.player.recharging = false;
    state.registry.for_each(EntityClass::Station, |e| {
        if let EntityKind::Station(station) = &mut e.kind {
            station.active = false;
        }
    });
    if !state.is_invulnerable() {
        state.player.invulnerable_until = None;
    }
}

pub fn resolve_contacts(state: &mut GameState, contacts: &[Contact]) {
    for contact in contacts {
        if state.phase == GamePhase::GameOver {
            break;
        }
        resolve_contact(state, contact);
    }
}

fn resolve_contact(state: &mut GameState, contact: &Contact) {
    if contact.kind != ContactKind::Overlap {
        return;
    }
    let (Some(class_a), Some(class_b)) = (
        state.registry.class_of(contact.a),
        state.registry.class_of(contact.b),
    ) else {
        return;
    };

    use EntityClass::*;
    let (a, b) = (contact.a, contact.b);
    match (class_a, class_b) {
        (Projectile, GroundAdversary | FlyingAdversary) => projectile_hit(state, a, b),
        (GroundAdversary | FlyingAdversary, Projectile) => projectile_hit(state, b, a),
        (Player, GroundAdversary | FlyingAdversary) => adversary_contact(state, b),
        (GroundAdversary | FlyingAdversary, Player) => adversary_contact(state, a),
        (Player, Station) => station_overlap(state, b),
        (Station, Player) => station_overlap(state, a),
        (Player, Pickup) => collect_pickup(state, b),
        (Pickup, Player) => collect_pickup(state, a),
        // No gameplay effect for any other pairing
        _ => {}
    }
}

/// Projectile meets adversary: both are destroyed, kill and score credited
fn projectile_hit(state: &mut GameState, projectile: EntityId, adversary: EntityId) {
    let Some((class, pos)) = state.registry.get(adversary).map(|e| (e.class(), e.pos)) else {
        return;
    };
    if !state.registry.contains(projectile) {
        return;
    }
    state.despawn(projectile);
    state.despawn(adversary);

    let tuning = &state.tuning.adversaries;
    let score = match class {
        EntityClass::FlyingAdversary => tuning.flying_score,
        _ => tuning.ground_score,
    };
    state.director.kills += 1;
    state.director.score += score;
    state.emit(GameEvent::AdversaryKilled {
        id: adversary,
        class,
        pos,
        score,
    });
}

/// Adversary touches the player
fn adversary_contact(state: &mut GameState, adversary: EntityId) {
    if state.is_invulnerable() {
        return;
    }
    let Some((class, pos)) = state.registry.get(adversary).map(|e| (e.class(), e.pos)) else {
        return;
    };

    let tuning = &state.tuning.adversaries;
    let (damage, knockback) = match class {
        EntityClass::FlyingAdversary => (tuning.flying_damage, tuning.flying_knockback),
        _ => (tuning.ground_damage, tuning.ground_knockback),
    };
    let invulnerable_ticks = ms_to_ticks(state.tuning.player.invulnerability_ms);

    let away = direction_from_angle(angle_between(pos, state.player_pos()));
    let health = state.player.health.adjust(-damage);
    state.player.knockback = away * knockback;
    state.player.invulnerable_until = Some(state.time_ticks + invulnerable_ticks);

    if class == EntityClass::FlyingAdversary {
        state.despawn(adversary);
    }
    state.emit(GameEvent::PlayerHit {
        source: class,
        damage,
        health,
    });
    log::debug!("Player hit by {:?} for {}, health {}", class, damage, health);

    if state.player.health.is_depleted() {
        state.game_over();
    }
}

fn station_overlap(state: &mut GameState, station: EntityId) {
    state.player.recharging = true;
    if let Some(e) = state.registry.get_mut(station)
        && let EntityKind::Station(s) = &mut e.kind
    {
        s.active = true;
    }
}

fn collect_pickup(state: &mut GameState, pickup: EntityId) {
    if !state.despawn(pickup) {
        return;
    }
    let heal = state.tuning.player.pickup_heal;
    let health = state.player.health.adjust(heal);
    state.emit(GameEvent::PickupCollected { health });
}

/// Restore energy while overlapping a station with the recharge input held
pub fn apply_recharge(state: &mut GameState, held: bool) -> bool {
    if !(state.player.recharging && held) {
        return false;
    }
    let rate = state.tuning.player.recharge_per_tick;
    state.player.energy.adjust(rate);
    true
}

/// Fire one projectile toward `aim` (or along the facing) if energy and
/// cooldown allow
pub fn try_fire(state: &mut GameState, aim: Option<Vec2>) -> Option<EntityId> {
    let tuning = &state.tuning.player;
    let cooldown = ms_to_ticks(tuning.shot_cooldown_ms);
    let (cost, speed, ttl_ms, half) = (
        tuning.shot_cost,
        tuning.shot_speed,
        tuning.shot_ttl_ms,
        tuning.shot_size.half(),
    );

    if let Some(last) = state.player.last_shot_tick
        && state.time_ticks.saturating_sub(last) < cooldown
    {
        return None;
    }
    if !state.player.energy.has_at_least(cost) {
        return None;
    }

    let origin = state.player_pos();
    let dir = match aim {
        Some(target) if target.distance_squared(origin) > f32::EPSILON => {
            (target - origin).normalize()
        }
        _ => direction_from_angle(state.player.facing),
    };

    state.player.energy.adjust(-cost);
    state.player.last_shot_tick = Some(state.time_ticks);

    let id = state.spawn(EntityKind::Projectile, origin, half);
    if let Some(body) = state.registry.get_mut(id) {
        body.vel = dir * speed;
    }
    state.schedule(ttl_ms, TimerAction::ExpireProjectile(id));
    state.emit(GameEvent::ShotFired { id });
    Some(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::registry::Pursuer;

    /// Session with no adversaries left from the opening wave
    fn quiet_state() -> GameState {
        let mut state = GameState::new(17);
        for id in state.registry.ids(EntityClass::GroundAdversary) {
            state.despawn(id);
        }
        state.drain_events();
        state
    }

    fn overlap(a: EntityId, b: EntityId) -> Contact {
        Contact {
            a,
            b,
            kind: ContactKind::Overlap,
        }
    }

    fn ground_at(state: &mut GameState, pos: Vec2) -> EntityId {
        let half = state.tuning.adversaries.ground_size.half();
        state.spawn(EntityKind::GroundAdversary(Pursuer { speed: 30.0 }), pos, half)
    }

    #[test]
    fn test_projectile_kill_credits_score() {
        let mut state = quiet_state();
        let adv = ground_at(&mut state, Vec2::new(600.0, 300.0));
        let shot = state.spawn(EntityKind::Projectile, Vec2::new(600.0, 300.0), Vec2::splat(4.0));
        let flyer = state.spawn(EntityKind::FlyingAdversary, Vec2::new(600.0, 300.0), Vec2::splat(12.0));

        // The same projectile reported against two adversaries only kills once
        resolve_contacts(&mut state, &[overlap(shot, adv), overlap(shot, flyer)]);

        assert!(!state.registry.contains(adv));
        assert!(!state.registry.contains(shot));
        assert!(state.registry.contains(flyer));
        assert_eq!(state.director.kills, 1);
        assert_eq!(state.director.score, 10);
    }

    #[test]
    fn test_flyer_kill_scores_twenty() {
        let mut state = quiet_state();
        let flyer = state.spawn(EntityKind::FlyingAdversary, Vec2::new(600.0, 300.0), Vec2::splat(12.0));
        let shot = state.spawn(EntityKind::Projectile, Vec2::new(600.0, 300.0), Vec2::splat(4.0));
        resolve_contacts(&mut state, &[overlap(flyer, shot)]);
        assert_eq!(state.director.score, 20);
    }

    #[test]
    fn test_contact_damage_and_invulnerability() {
        let mut state = quiet_state();
        let player = state.player.id;
        let pos = state.player_pos() + Vec2::new(-20.0, 0.0);
        let adv = ground_at(&mut state, pos);

        resolve_contacts(&mut state, &[overlap(player, adv)]);
        assert_eq!(state.player.health.value(), 85.0);
        assert_eq!(state.player.invulnerable_until, Some(state.time_ticks + 48));
        // Pushed away from the adversary (to the right)
        assert!((state.player.knockback - Vec2::new(200.0, 0.0)).length() < 1e-3);

        // Still invulnerable: a second contact does nothing
        resolve_contacts(&mut state, &[overlap(player, adv)]);
        assert_eq!(state.player.health.value(), 85.0);
        assert!(state.registry.contains(adv));
    }

    #[test]
    fn test_flyer_contact_destroys_flyer() {
        let mut state = quiet_state();
        let player = state.player.id;
        let flyer = state.spawn(EntityKind::FlyingAdversary, state.player_pos(), Vec2::splat(12.0));
        resolve_contacts(&mut state, &[overlap(flyer, player)]);
        assert_eq!(state.player.health.value(), 75.0);
        assert!(!state.registry.contains(flyer));
        // Coincident centers knock along +x
        assert!((state.player.knockback - Vec2::new(300.0, 0.0)).length() < 1e-3);
    }

    #[test]
    fn test_lethal_contact_ends_run() {
        let mut state = quiet_state();
        let player = state.player.id;
        // Exactly one ground hit left: 15 - 15 lands on zero
        state.player.health.adjust(-85.0);
        let a = ground_at(&mut state, Vec2::new(380.0, 300.0));
        let b = state.spawn(EntityKind::Pickup, state.player_pos(), Vec2::splat(6.0));

        resolve_contacts(&mut state, &[overlap(player, a), overlap(player, b)]);

        assert_eq!(state.player.health.value(), 0.0);
        assert_eq!(state.phase, GamePhase::GameOver);
        // Resolution stopped before the pickup
        assert!(state.registry.contains(b));
        assert!(state.events.iter().any(|e| matches!(e, GameEvent::GameOver(_))));
    }

    #[test]
    fn test_pickup_heals_and_clamps() {
        let mut state = quiet_state();
        let player = state.player.id;
        state.player.health.adjust(-50.0);
        let first = state.spawn(EntityKind::Pickup, state.player_pos(), Vec2::splat(6.0));
        let second = state.spawn(EntityKind::Pickup, state.player_pos(), Vec2::splat(6.0));

        resolve_contacts(&mut state, &[overlap(player, first), overlap(second, player)]);
        assert_eq!(state.player.health.value(), 100.0);
        assert_eq!(state.registry.active_count(EntityClass::Pickup), 0);
    }

    #[test]
    fn test_stale_contacts_are_skipped() {
        let mut state = quiet_state();
        let player = state.player.id;
        let pos = state.player_pos();
        let adv = ground_at(&mut state, pos);
        state.despawn(adv);
        resolve_contacts(&mut state, &[overlap(player, adv)]);
        assert_eq!(state.player.health.value(), 100.0);
    }

    #[test]
    fn test_recharge_requires_overlap_and_input() {
        let mut state = quiet_state();
        state.player.energy.adjust(-80.0);

        assert!(!apply_recharge(&mut state, true));
        state.player.recharging = true;
        assert!(!apply_recharge(&mut state, false));
        for _ in 0..10 {
            assert!(apply_recharge(&mut state, true));
        }
        assert!((state.player.energy.value() - 28.0).abs() < 1e-3);
    }

    #[test]
    fn test_fire_spends_energy_and_respects_cooldown() {
        let mut state = quiet_state();
        let target = state.player_pos() + Vec2::new(0.0, 100.0);

        let shot = try_fire(&mut state, Some(target)).unwrap();
        assert_eq!(state.player.energy.value(), 90.0);
        let vel = state.registry.get(shot).unwrap().vel;
        assert!((vel - Vec2::new(0.0, 400.0)).length() < 1e-3);

        // 8 ticks later: still cooling down
        state.time_ticks += 8;
        assert!(try_fire(&mut state, Some(target)).is_none());
        state.time_ticks += 1;
        assert!(try_fire(&mut state, Some(target)).is_some());
        assert_eq!(state.player.energy.value(), 80.0);
    }

    #[test]
    fn test_fire_blocked_without_energy() {
        let mut state = quiet_state();
        state.player.energy.adjust(-95.0);
        assert!(try_fire(&mut state, None).is_none());
        assert_eq!(state.registry.active_count(EntityClass::Projectile), 0);
        assert_eq!(state.player.energy.value(), 5.0);
    }

    #[test]
    fn test_projectile_expires_after_ttl() {
        let mut state = quiet_state();
        let shot = try_fire(&mut state, None).unwrap();
        let due = state.scheduler.take_due(state.time_ticks + 60);
        assert!(due.iter().any(|(_, a)| *a == TimerAction::ExpireProjectile(shot)));
    }
}
