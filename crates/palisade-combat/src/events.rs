//! Event types crossing the engine boundary.
//!
//! [`GameEvent`] values flow in from the host through
//! [`CombatEngine::notify`](crate::engine::CombatEngine::notify).
//! [`CombatEvent`] values flow out through
//! [`CombatEngine::drain_events`](crate::engine::CombatEngine::drain_events),
//! accumulated in the order resolution produced them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::projectile::ProjectileKind;
use crate::world::EnemyId;

// =============================================================================
// GameEvent
// =============================================================================

/// A host notification the engine reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameEvent {
    /// The world changed in a way that invalidates the watcher set.
    RefreshCollisions,
    /// A new round started.
    RoundStarted {
        /// The round number the host is entering.
        round: u32,
    },
    /// An enemy entered the world.
    EnemySpawned {
        /// The spawned enemy.
        enemy: EnemyId,
    },
    /// The host toggled verbose frame diagnostics.
    ToggleDebugMode,
}

impl GameEvent {
    /// Returns the wire name of the event.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::RefreshCollisions => "refresh-collisions",
            Self::RoundStarted { .. } => "round-started",
            Self::EnemySpawned { .. } => "enemy-spawned",
            Self::ToggleDebugMode => "toggle-debug-mode",
        }
    }
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// =============================================================================
// CombatEvent
// =============================================================================

/// An outcome the engine reports back to the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CombatEvent {
    /// A shot connected with an enemy.
    ProjectileHit {
        /// The enemy that was struck.
        target: EnemyId,
        /// Damage applied by this hit, after any falloff.
        damage: f32,
        /// What kind of shot struck.
        kind: ProjectileKind,
    },
}

impl CombatEvent {
    /// Returns the enemy this event concerns.
    #[must_use]
    pub const fn target(&self) -> EnemyId {
        match self {
            Self::ProjectileHit { target, .. } => *target,
        }
    }

    /// Returns the wire name of the event.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ProjectileHit { .. } => "projectile-hit",
        }
    }
}

impl fmt::Display for CombatEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
