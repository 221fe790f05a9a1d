//! # Palisade Combat
//!
//! Real-time combat resolution for a tower-defense survival game. The
//! crate owns everything between "the host wants this shot fired" and
//! "that enemy took this damage": a fixed-capacity projectile pool, a
//! collision watcher registry, contact resolution with piercing and
//! status effects, and a watchdog that heals the watcher set when the
//! populations shift under it.
//!
//! The host owns the [`World`] and lends it to the engine each frame;
//! the engine owns the rest and never holds references across frames.
//! Time comes only from the frame deltas the host feeds in, so a run is
//! a pure function of its seed and its inputs.
//!
//! # Architecture
//!
//! - [`world`]: enemies, towers, the base, and the player, with
//!   deferred removal so ids stay valid for a whole frame.
//! - [`pool`]: recycling projectile storage that never allocates after
//!   construction.
//! - [`registry`]: the watcher set pairing populations for collision,
//!   rebuilt atomically and generation-checked for staleness.
//! - [`resolver`]: turns contacts into damage, status effects, kill
//!   credit, and outward events.
//! - [`monitor`]: debounces rebuild requests and schedules health
//!   checks, including a seeded spot-check lottery.
//! - [`engine`]: the frame pipeline tying the pieces together.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use glam::Vec2;
//! use palisade_combat::{CombatEngine, GameEvent, ProjectileKind, ShotSource, World};
//!
//! let mut world = World::new();
//! let enemy = world.spawn_enemy(Vec2::new(400.0, 300.0), 60.0);
//! let tower = world.spawn_tower(Vec2::new(300.0, 300.0), 100.0);
//!
//! let mut engine = CombatEngine::new(42, &world);
//! engine.notify(&world, GameEvent::EnemySpawned { enemy });
//!
//! let shot = engine.fire(
//!     &world,
//!     ShotSource::Tower(tower),
//!     Vec2::new(400.0, 300.0),
//!     25.0,
//!     ProjectileKind::Normal,
//! );
//! assert!(shot.is_some());
//!
//! for _ in 0..30 {
//!     engine.tick(&mut world, Duration::from_millis(16));
//!     world.finalize_removals();
//! }
//!
//! let stats = engine.stats();
//! assert_eq!(stats.projectiles_created, 1);
//! assert!(stats.enemies_hit >= 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod clock;
pub mod engine;
pub mod events;
pub mod monitor;
pub mod pool;
pub mod projectile;
pub mod registry;
pub mod resolver;
pub mod stats;
pub mod tuning;
pub mod world;

#[cfg(test)]
mod tests;

pub use clock::{Millis, SimClock};
pub use engine::CombatEngine;
pub use events::{CombatEvent, GameEvent};
pub use monitor::{HealthMonitor, RebuildScheduler};
pub use pool::{PoolTickReport, ProjectilePool};
pub use projectile::{
    EffectSpec, KindProfile, Projectile, ProjectileFlags, ProjectileId, ProjectileKind, ShotSource,
};
pub use registry::{CollisionRegistry, Contact, HealthIssue, PairKind, Watcher};
pub use resolver::{DamageResolver, ResolveContext};
pub use stats::CombatStats;
pub use tuning::{Tuning, TuningError};
pub use world::{
    Base, Body, BodyKind, Burn, Enemy, EnemyFlags, EnemyId, Player, Slow, Tower, TowerId, World,
};
