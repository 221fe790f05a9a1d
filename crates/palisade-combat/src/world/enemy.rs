//! Enemy records and their timed status effects.
//!
//! Enemies own their hit points, status effects, and contact rate-limit
//! timestamps. The combat engine only ever goes through the mutators here,
//! so every rule about death, effect replacement, and rate limiting lives
//! next to the data it protects.
//!
//! # Death
//!
//! An enemy whose hit points reach zero is marked for destruction, not
//! dropped. Marked enemies ignore further damage, shed their status
//! effects, and refuse contact processing, but stay observable until the
//! host finalizes removals at the end of the frame.

use bitflags::bitflags;
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::clock::Millis;
use crate::world::{Body, BodyKind, EnemyId};

/// Spacing between burn damage applications.
pub const BURN_TICK_SPACING_MS: u64 = 1_000;

// =============================================================================
// EnemyFlags
// =============================================================================

bitflags! {
    /// One-shot state bits carried by each enemy.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct EnemyFlags: u8 {
        /// The death sequence has begun; combat skips this enemy.
        const MARKED_FOR_DESTRUCTION = 1 << 0;
        /// The player contact payload has already been delivered.
        const DEALT_PLAYER_DAMAGE = 1 << 1;
    }
}

// =============================================================================
// Status Effects
// =============================================================================

/// An active damage-over-time record.
///
/// Burns tick on a fixed cadence from the moment they are applied. A fresh
/// application replaces the record outright; burns never stack.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Burn {
    /// Damage applied on each tick.
    pub damage_per_tick: f32,
    /// Ticks left before the burn expires.
    pub ticks_remaining: u8,
    /// Timestamp the next tick becomes due.
    pub next_tick_at: Millis,
}

/// An active movement debuff record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Slow {
    /// Speed multiplier while active.
    pub factor: f32,
    /// Timestamp the debuff wears off.
    pub expires_at: Millis,
}

// =============================================================================
// Enemy
// =============================================================================

/// A hostile actor tracked by the combat engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    /// Stable identity within this run.
    id: EnemyId,
    /// Collision body.
    body: Body,
    /// Current hit points.
    hp: f32,
    /// Hit points at spawn.
    max_hp: f32,
    /// One-shot state bits.
    flags: EnemyFlags,
    /// Active burn, if any.
    burn: Option<Burn>,
    /// Active slow, if any.
    slow: Option<Slow>,
    /// Last time this enemy ground against the base.
    last_base_contact: Option<Millis>,
    /// Last time this enemy ground against a tower.
    last_tower_contact: Option<Millis>,
}

impl Enemy {
    /// Default collision radius in world units.
    pub const DEFAULT_RADIUS: f32 = 14.0;

    pub(crate) fn new(id: EnemyId, pos: Vec2, hp: f32) -> Self {
        Self {
            id,
            body: Body::new(BodyKind::Enemy, pos, Self::DEFAULT_RADIUS),
            hp,
            max_hp: hp,
            flags: EnemyFlags::empty(),
            burn: None,
            slow: None,
            last_base_contact: None,
            last_tower_contact: None,
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Returns this enemy's id.
    #[must_use]
    pub const fn id(&self) -> EnemyId {
        self.id
    }

    /// Returns the collision body.
    #[must_use]
    pub const fn body(&self) -> Body {
        self.body
    }

    /// Returns the current position.
    #[must_use]
    pub const fn pos(&self) -> Vec2 {
        self.body.pos
    }

    /// Returns current hit points.
    #[must_use]
    pub const fn hp(&self) -> f32 {
        self.hp
    }

    /// Returns hit points at spawn.
    #[must_use]
    pub const fn max_hp(&self) -> f32 {
        self.max_hp
    }

    /// Returns the state bits.
    #[must_use]
    pub const fn flags(&self) -> EnemyFlags {
        self.flags
    }

    /// Returns the active burn, if any.
    #[must_use]
    pub const fn burn(&self) -> Option<Burn> {
        self.burn
    }

    /// Returns the active slow, if any.
    #[must_use]
    pub const fn slow(&self) -> Option<Slow> {
        self.slow
    }

    /// Reports whether the death sequence has begun.
    #[must_use]
    pub fn is_marked_for_destruction(&self) -> bool {
        self.flags.contains(EnemyFlags::MARKED_FOR_DESTRUCTION)
    }

    /// Reports whether this enemy already delivered its player contact
    /// payload.
    #[must_use]
    pub fn has_dealt_player_damage(&self) -> bool {
        self.flags.contains(EnemyFlags::DEALT_PLAYER_DAMAGE)
    }

    /// Reports whether this enemy still participates in combat.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        !self.is_marked_for_destruction() && self.hp > 0.0
    }

    /// Returns the movement speed multiplier at `now`.
    ///
    /// 1.0 unless a slow is active and unexpired.
    #[must_use]
    pub fn speed_factor(&self, now: Millis) -> f32 {
        match self.slow {
            Some(slow) if now < slow.expires_at => slow.factor,
            _ => 1.0,
        }
    }

    // -------------------------------------------------------------------------
    // Mutators
    // -------------------------------------------------------------------------

    /// Applies direct damage and returns the remaining hit points.
    ///
    /// A no-op on enemies already marked for destruction. Hit points clamp
    /// at zero; reaching zero marks the enemy.
    pub fn take_damage(&mut self, amount: f32) -> f32 {
        if self.is_marked_for_destruction() {
            return self.hp;
        }
        self.hp -= amount;
        if self.hp <= 0.0 {
            self.hp = 0.0;
            self.flags.insert(EnemyFlags::MARKED_FOR_DESTRUCTION);
        }
        self.hp
    }

    /// Applies a burn, replacing any active one.
    ///
    /// The first tick becomes due one spacing interval after `now`. A no-op
    /// on marked enemies.
    pub fn apply_burn(&mut self, damage_per_tick: f32, ticks: u8, now: Millis) {
        if self.is_marked_for_destruction() {
            return;
        }
        self.burn = Some(Burn {
            damage_per_tick,
            ticks_remaining: ticks,
            next_tick_at: now.after(BURN_TICK_SPACING_MS),
        });
    }

    /// Applies a slow, replacing any active one. A no-op on marked enemies.
    pub fn apply_slow(&mut self, factor: f32, duration_ms: u64, now: Millis) {
        if self.is_marked_for_destruction() {
            return;
        }
        self.slow = Some(Slow {
            factor,
            expires_at: now.after(duration_ms),
        });
    }

    /// Advances status effects to `now` and returns the burn damage dealt.
    ///
    /// Every overdue burn tick is applied, so a long frame gap catches up
    /// instead of silently losing ticks. Expired records are dropped. A
    /// marked enemy sheds its effects without taking damage.
    pub(crate) fn tick_status(&mut self, now: Millis) -> f32 {
        if self.is_marked_for_destruction() {
            self.burn = None;
            self.slow = None;
            return 0.0;
        }
        if let Some(slow) = self.slow {
            if slow.expires_at <= now {
                self.slow = None;
            }
        }
        let mut dealt = 0.0;
        while let Some(mut burn) = self.burn {
            if burn.ticks_remaining == 0 {
                self.burn = None;
                break;
            }
            if burn.next_tick_at > now {
                break;
            }
            self.take_damage(burn.damage_per_tick);
            dealt += burn.damage_per_tick;
            if self.is_marked_for_destruction() {
                self.burn = None;
                self.slow = None;
                break;
            }
            burn.ticks_remaining = burn.ticks_remaining.saturating_sub(1);
            burn.next_tick_at = burn.next_tick_at.after(BURN_TICK_SPACING_MS);
            self.burn = if burn.ticks_remaining == 0 {
                None
            } else {
                Some(burn)
            };
        }
        dealt
    }

    /// Consumes a base contact slot if the rate limit allows it.
    ///
    /// The first contact is always allowed; afterwards `interval_ms` must
    /// elapse between applications. Marked enemies never get a slot.
    pub(crate) fn try_base_contact(&mut self, now: Millis, interval_ms: u64) -> bool {
        if self.is_marked_for_destruction() {
            return false;
        }
        match self.last_base_contact {
            Some(last) if now.since(last) < interval_ms => false,
            _ => {
                self.last_base_contact = Some(now);
                true
            }
        }
    }

    /// Consumes a tower contact slot if the rate limit allows it.
    ///
    /// Tracked separately from base contacts; grinding one structure class
    /// never starves the other.
    pub(crate) fn try_tower_contact(&mut self, now: Millis, interval_ms: u64) -> bool {
        if self.is_marked_for_destruction() {
            return false;
        }
        match self.last_tower_contact {
            Some(last) if now.since(last) < interval_ms => false,
            _ => {
                self.last_tower_contact = Some(now);
                true
            }
        }
    }

    pub(crate) fn mark_for_destruction(&mut self) {
        self.flags.insert(EnemyFlags::MARKED_FOR_DESTRUCTION);
    }

    pub(crate) fn set_dealt_player_damage(&mut self) {
        self.flags.insert(EnemyFlags::DEALT_PLAYER_DAMAGE);
    }

    pub(crate) fn set_pos(&mut self, pos: Vec2) {
        self.body.pos = pos;
    }

    pub(crate) fn set_body_enabled(&mut self, enabled: bool) {
        self.body.enabled = enabled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enemy(hp: f32) -> Enemy {
        Enemy::new(EnemyId::new(0), Vec2::ZERO, hp)
    }

    mod damage_tests {
        use super::*;

        #[test]
        fn damage_reduces_hp() {
            let mut e = enemy(100.0);
            let remaining = e.take_damage(30.0);
            assert!((remaining - 70.0).abs() < 0.0001);
            assert!(e.is_alive());
        }

        #[test]
        fn lethal_damage_clamps_and_marks() {
            let mut e = enemy(100.0);
            let remaining = e.take_damage(150.0);
            assert_eq!(remaining, 0.0);
            assert!(e.is_marked_for_destruction());
            assert!(!e.is_alive());
        }

        #[test]
        fn exact_lethal_damage_marks() {
            let mut e = enemy(40.0);
            e.take_damage(40.0);
            assert!(e.is_marked_for_destruction());
        }

        #[test]
        fn damage_on_marked_enemy_is_noop() {
            let mut e = enemy(100.0);
            e.take_damage(100.0);
            let remaining = e.take_damage(50.0);
            assert_eq!(remaining, 0.0);
        }
    }

    mod burn_tests {
        use super::*;

        #[test]
        fn burn_waits_one_spacing_before_first_tick() {
            let mut e = enemy(100.0);
            e.apply_burn(5.0, 5, Millis::ZERO);
            assert_eq!(e.tick_status(Millis::new(999)), 0.0);
            assert!((e.hp() - 100.0).abs() < 0.0001);
        }

        #[test]
        fn burn_deals_twenty_five_over_five_ticks() {
            let mut e = enemy(100.0);
            e.apply_burn(5.0, 5, Millis::ZERO);
            let mut dealt = 0.0;
            for ms in (0..=5_000).step_by(100) {
                dealt += e.tick_status(Millis::new(ms));
            }
            assert!((dealt - 25.0).abs() < 0.0001);
            assert!((e.hp() - 75.0).abs() < 0.0001);
            assert!(e.burn().is_none());
        }

        #[test]
        fn burn_catches_up_after_a_long_gap() {
            let mut e = enemy(100.0);
            e.apply_burn(5.0, 5, Millis::ZERO);
            let dealt = e.tick_status(Millis::new(10_000));
            assert!((dealt - 25.0).abs() < 0.0001);
            assert!(e.burn().is_none());
        }

        #[test]
        fn reapplied_burn_replaces_instead_of_stacking() {
            let mut e = enemy(100.0);
            e.apply_burn(5.0, 5, Millis::ZERO);
            e.tick_status(Millis::new(1_000));
            e.apply_burn(2.0, 3, Millis::new(1_500));
            let burn = e.burn().unwrap();
            assert!((burn.damage_per_tick - 2.0).abs() < 0.0001);
            assert_eq!(burn.ticks_remaining, 3);
            assert_eq!(burn.next_tick_at, Millis::new(2_500));
        }

        #[test]
        fn burn_kill_marks_and_sheds_effects() {
            let mut e = enemy(8.0);
            e.apply_burn(5.0, 5, Millis::ZERO);
            e.apply_slow(0.5, 10_000, Millis::ZERO);
            e.tick_status(Millis::new(2_000));
            assert!(e.is_marked_for_destruction());
            assert!(e.burn().is_none());
            assert!(e.slow().is_none());
        }

        #[test]
        fn burn_on_marked_enemy_is_rejected() {
            let mut e = enemy(10.0);
            e.take_damage(10.0);
            e.apply_burn(5.0, 5, Millis::ZERO);
            assert!(e.burn().is_none());
        }

        #[test]
        fn marked_enemy_sheds_effects_without_damage() {
            let mut e = enemy(100.0);
            e.apply_burn(5.0, 5, Millis::ZERO);
            e.mark_for_destruction();
            assert_eq!(e.tick_status(Millis::new(5_000)), 0.0);
            assert!(e.burn().is_none());
            assert_eq!(e.hp(), 100.0);
        }
    }

    mod slow_tests {
        use super::*;

        #[test]
        fn slow_halves_speed_until_expiry() {
            let mut e = enemy(100.0);
            e.apply_slow(0.5, 3_000, Millis::ZERO);
            assert!((e.speed_factor(Millis::new(1_000)) - 0.5).abs() < 0.0001);
            assert!((e.speed_factor(Millis::new(3_000)) - 1.0).abs() < 0.0001);
        }

        #[test]
        fn expired_slow_is_dropped_by_status_tick() {
            let mut e = enemy(100.0);
            e.apply_slow(0.5, 1_000, Millis::ZERO);
            e.tick_status(Millis::new(1_500));
            assert!(e.slow().is_none());
        }

        #[test]
        fn reapplied_slow_replaces_expiry() {
            let mut e = enemy(100.0);
            e.apply_slow(0.5, 1_000, Millis::ZERO);
            e.apply_slow(0.7, 2_000, Millis::new(500));
            let slow = e.slow().unwrap();
            assert!((slow.factor - 0.7).abs() < 0.0001);
            assert_eq!(slow.expires_at, Millis::new(2_500));
        }
    }

    mod contact_tests {
        use super::*;

        #[test]
        fn first_base_contact_is_allowed() {
            let mut e = enemy(100.0);
            assert!(e.try_base_contact(Millis::ZERO, 1_000));
        }

        #[test]
        fn base_contact_respects_interval() {
            let mut e = enemy(100.0);
            assert!(e.try_base_contact(Millis::ZERO, 1_000));
            assert!(!e.try_base_contact(Millis::new(999), 1_000));
            assert!(e.try_base_contact(Millis::new(1_000), 1_000));
        }

        #[test]
        fn tower_window_is_independent_of_base_window() {
            let mut e = enemy(100.0);
            assert!(e.try_base_contact(Millis::ZERO, 1_000));
            assert!(e.try_tower_contact(Millis::ZERO, 1_000));
            assert!(!e.try_base_contact(Millis::new(500), 1_000));
            assert!(!e.try_tower_contact(Millis::new(500), 1_000));
        }

        #[test]
        fn marked_enemy_gets_no_contact_slot() {
            let mut e = enemy(100.0);
            e.mark_for_destruction();
            assert!(!e.try_base_contact(Millis::ZERO, 1_000));
            assert!(!e.try_tower_contact(Millis::ZERO, 1_000));
        }

        #[test]
        fn player_damage_flag_is_one_shot() {
            let mut e = enemy(100.0);
            assert!(!e.has_dealt_player_damage());
            e.set_dealt_player_damage();
            assert!(e.has_dealt_player_damage());
        }
    }

    mod record_tests {
        use super::*;

        #[test]
        fn new_enemy_is_pristine() {
            let e = enemy(60.0);
            assert_eq!(e.hp(), 60.0);
            assert_eq!(e.max_hp(), 60.0);
            assert!(e.is_alive());
            assert!(e.burn().is_none());
            assert!(e.slow().is_none());
            assert_eq!(e.body().kind, BodyKind::Enemy);
            assert!(e.body().enabled);
        }

        #[test]
        fn serialization_roundtrip() {
            let mut e = enemy(60.0);
            e.apply_burn(5.0, 3, Millis::new(100));
            e.take_damage(10.0);
            let json = serde_json::to_string(&e).unwrap();
            let back: Enemy = serde_json::from_str(&json).unwrap();
            assert_eq!(e, back);
        }
    }
}
