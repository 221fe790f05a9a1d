//! Defensive structures and the player avatar.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::world::{Body, BodyKind, TowerId};

// =============================================================================
// Tower
// =============================================================================

/// A static defensive structure.
///
/// Towers launch shots through the engine's fire path and are credited with
/// the kills their shots score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tower {
    /// Stable identity within this run.
    id: TowerId,
    /// Collision body.
    body: Body,
    /// Current hit points.
    hp: f32,
    /// Hit points at spawn.
    max_hp: f32,
    /// Enemies destroyed by this tower's shots.
    kills: u32,
}

impl Tower {
    /// Default collision radius in world units.
    pub const DEFAULT_RADIUS: f32 = 18.0;

    pub(crate) fn new(id: TowerId, pos: Vec2, hp: f32) -> Self {
        Self {
            id,
            body: Body::new(BodyKind::Tower, pos, Self::DEFAULT_RADIUS),
            hp,
            max_hp: hp,
            kills: 0,
        }
    }

    /// Returns this tower's id.
    #[must_use]
    pub const fn id(&self) -> TowerId {
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

    /// Returns how many kills this tower has been credited with.
    #[must_use]
    pub const fn kills(&self) -> u32 {
        self.kills
    }

    /// Applies damage and returns the remaining hit points, clamped at zero.
    pub fn take_damage(&mut self, amount: f32) -> f32 {
        self.hp = (self.hp - amount).max(0.0);
        self.hp
    }

    pub(crate) fn credit_kill(&mut self) {
        self.kills += 1;
    }
}

// =============================================================================
// Base
// =============================================================================

/// The structure enemies besiege. Losing it loses the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Base {
    /// Collision body.
    body: Body,
    /// Current hit points.
    hp: f32,
    /// Hit points at the start of the run.
    max_hp: f32,
}

impl Base {
    /// Default collision radius in world units.
    pub const DEFAULT_RADIUS: f32 = 48.0;

    pub(crate) fn new(pos: Vec2, hp: f32) -> Self {
        Self {
            body: Body::new(BodyKind::Base, pos, Self::DEFAULT_RADIUS),
            hp,
            max_hp: hp,
        }
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

    /// Returns hit points at the start of the run.
    #[must_use]
    pub const fn max_hp(&self) -> f32 {
        self.max_hp
    }

    /// Applies damage and returns the remaining hit points, clamped at zero.
    pub fn take_damage(&mut self, amount: f32) -> f32 {
        self.hp = (self.hp - amount).max(0.0);
        self.hp
    }

    pub(crate) fn set_pos(&mut self, pos: Vec2) {
        self.body.pos = pos;
    }
}

// =============================================================================
// Player
// =============================================================================

/// The player avatar.
///
/// The engine damages the player and applies knockback impulses into
/// `velocity`; the host's movement code integrates and damps that velocity
/// however it likes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Collision body.
    body: Body,
    /// Current hit points.
    hp: f32,
    /// Hit points at the start of the run.
    max_hp: f32,
    /// Accumulated impulse, in world units per second.
    velocity: Vec2,
}

impl Player {
    /// Default collision radius in world units.
    pub const DEFAULT_RADIUS: f32 = 12.0;

    pub(crate) fn new(pos: Vec2, hp: f32) -> Self {
        Self {
            body: Body::new(BodyKind::Player, pos, Self::DEFAULT_RADIUS),
            hp,
            max_hp: hp,
            velocity: Vec2::ZERO,
        }
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

    /// Returns hit points at the start of the run.
    #[must_use]
    pub const fn max_hp(&self) -> f32 {
        self.max_hp
    }

    /// Returns the accumulated impulse.
    #[must_use]
    pub const fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Overwrites the accumulated impulse. Hosts call this after they have
    /// integrated or damped it.
    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    /// Applies damage and returns the remaining hit points, clamped at zero.
    pub fn take_damage(&mut self, amount: f32) -> f32 {
        self.hp = (self.hp - amount).max(0.0);
        self.hp
    }

    pub(crate) fn apply_knockback(&mut self, impulse: Vec2) {
        self.velocity += impulse;
    }

    pub(crate) fn set_pos(&mut self, pos: Vec2) {
        self.body.pos = pos;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod tower_tests {
        use super::*;

        #[test]
        fn new_tower_has_no_kills() {
            let tower = Tower::new(TowerId::new(0), Vec2::ZERO, 150.0);
            assert_eq!(tower.kills(), 0);
            assert_eq!(tower.hp(), 150.0);
            assert_eq!(tower.body().kind, BodyKind::Tower);
        }

        #[test]
        fn credit_kill_accumulates() {
            let mut tower = Tower::new(TowerId::new(0), Vec2::ZERO, 150.0);
            tower.credit_kill();
            tower.credit_kill();
            assert_eq!(tower.kills(), 2);
        }

        #[test]
        fn damage_clamps_at_zero() {
            let mut tower = Tower::new(TowerId::new(0), Vec2::ZERO, 20.0);
            assert_eq!(tower.take_damage(50.0), 0.0);
        }

        #[test]
        fn serialization_roundtrip() {
            let mut tower = Tower::new(TowerId::new(4), Vec2::new(10.0, 10.0), 150.0);
            tower.credit_kill();
            let json = serde_json::to_string(&tower).unwrap();
            let back: Tower = serde_json::from_str(&json).unwrap();
            assert_eq!(tower, back);
        }
    }

    mod base_tests {
        use super::*;

        #[test]
        fn damage_reduces_and_clamps() {
            let mut base = Base::new(Vec2::ZERO, 200.0);
            assert!((base.take_damage(5.0) - 195.0).abs() < 0.0001);
            assert_eq!(base.take_damage(1_000.0), 0.0);
        }

        #[test]
        fn body_is_tagged_base() {
            let base = Base::new(Vec2::ZERO, 200.0);
            assert_eq!(base.body().kind, BodyKind::Base);
        }
    }

    mod player_tests {
        use super::*;

        #[test]
        fn knockback_accumulates_velocity() {
            let mut player = Player::new(Vec2::ZERO, 100.0);
            player.apply_knockback(Vec2::new(300.0, 0.0));
            player.apply_knockback(Vec2::new(0.0, 100.0));
            assert_eq!(player.velocity(), Vec2::new(300.0, 100.0));
        }

        #[test]
        fn set_velocity_overwrites() {
            let mut player = Player::new(Vec2::ZERO, 100.0);
            player.apply_knockback(Vec2::new(300.0, 0.0));
            player.set_velocity(Vec2::ZERO);
            assert_eq!(player.velocity(), Vec2::ZERO);
        }

        #[test]
        fn damage_clamps_at_zero() {
            let mut player = Player::new(Vec2::ZERO, 100.0);
            assert!((player.take_damage(25.0) - 75.0).abs() < 0.0001);
            assert_eq!(player.take_damage(500.0), 0.0);
        }

        #[test]
        fn serialization_roundtrip() {
            let player = Player::new(Vec2::new(5.0, 6.0), 100.0);
            let json = serde_json::to_string(&player).unwrap();
            let back: Player = serde_json::from_str(&json).unwrap();
            assert_eq!(player, back);
        }
    }
}
