//! Collision watcher registry.
//!
//! # Watchers
//!
//! The registry tracks one watcher per collision pair the engine cares
//! about. A watcher records which pool and world generations it was built
//! against; when either side is torn down wholesale its generation bumps
//! and the watcher goes stale. Stale watchers stop producing contacts
//! immediately instead of pairing bodies from a dead population.
//!
//! # Atomic Rebuild
//!
//! [`CollisionRegistry::rebuild`] replaces the whole watcher set in one
//! step. Callers never add or remove individual watchers, so the registry
//! is always either the complete set for the current populations or
//! flagged stale, never a partial mix.
//!
//! # Health
//!
//! [`CollisionRegistry::check_health`] reports the first defect it finds so
//! the engine can log it and schedule a rebuild. The one state that cannot
//! wait for the debounce window is live shots flying through enemies with
//! no watcher pairing them, which
//! [`CollisionRegistry::needs_emergency_rebuild`] detects separately.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::pool::ProjectilePool;
use crate::projectile::ProjectileId;
use crate::world::{EnemyId, TowerId, World};

/// Generation stamp for populations that are never torn down.
///
/// The base and the player exist for the whole run, so watchers targeting
/// them can never go stale on the target side.
pub const SINGLETON_GENERATION: u64 = 0;

// =============================================================================
// PairKind
// =============================================================================

/// The collision pairs the engine resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PairKind {
    /// Live shots against enemies.
    ProjectileVsEnemy,
    /// Enemies pressing against the base.
    EnemyVsBase,
    /// Enemies reaching the player.
    EnemyVsPlayer,
    /// Enemies pressing against towers.
    EnemyVsTower,
}

impl PairKind {
    /// Every pair, in rebuild order.
    pub const ALL: [Self; 4] = [
        Self::ProjectileVsEnemy,
        Self::EnemyVsBase,
        Self::EnemyVsPlayer,
        Self::EnemyVsTower,
    ];
}

impl fmt::Display for PairKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ProjectileVsEnemy => "projectile-vs-enemy",
            Self::EnemyVsBase => "enemy-vs-base",
            Self::EnemyVsPlayer => "enemy-vs-player",
            Self::EnemyVsTower => "enemy-vs-tower",
        };
        write!(f, "{name}")
    }
}

// =============================================================================
// Watcher
// =============================================================================

/// One registered collision pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Watcher {
    /// Which pair this watcher produces contacts for.
    pair: PairKind,
    /// Source population generation at build time.
    source_generation: u64,
    /// Target population generation at build time.
    target_generation: u64,
    /// Cleared to take the watcher out of the sweep without rebuilding.
    enabled: bool,
}

impl Watcher {
    fn new(pair: PairKind, pool: &ProjectilePool, world: &World) -> Self {
        let (source_generation, target_generation) = current_generations(pair, pool, world);
        Self {
            pair,
            source_generation,
            target_generation,
            enabled: true,
        }
    }

    /// Returns which pair this watcher covers.
    #[must_use]
    pub const fn pair(&self) -> PairKind {
        self.pair
    }

    /// Returns whether the watcher participates in sweeps at all.
    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.enabled
    }

    /// Returns the source generation the watcher was built against.
    #[must_use]
    pub const fn source_generation(&self) -> u64 {
        self.source_generation
    }

    /// Returns the target generation the watcher was built against.
    #[must_use]
    pub const fn target_generation(&self) -> u64 {
        self.target_generation
    }

    /// True when the watcher is enabled and both populations still match
    /// the generations it was built against.
    #[must_use]
    pub fn is_live(&self, pool: &ProjectilePool, world: &World) -> bool {
        self.enabled
            && (self.source_generation, self.target_generation)
                == current_generations(self.pair, pool, world)
    }

    /// Takes the watcher out of the sweep until the next rebuild.
    pub fn disable(&mut self) {
        self.enabled = false;
    }
}

fn current_generations(pair: PairKind, pool: &ProjectilePool, world: &World) -> (u64, u64) {
    match pair {
        PairKind::ProjectileVsEnemy => (pool.generation(), world.enemies_generation()),
        PairKind::EnemyVsBase | PairKind::EnemyVsPlayer => {
            (world.enemies_generation(), SINGLETON_GENERATION)
        }
        PairKind::EnemyVsTower => (world.enemies_generation(), world.towers_generation()),
    }
}

// =============================================================================
// Contact
// =============================================================================

/// One overlapping pair found during a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Contact {
    /// A live shot overlaps an enemy.
    ProjectileEnemy {
        /// The shot involved.
        projectile: ProjectileId,
        /// The enemy it overlaps.
        enemy: EnemyId,
    },
    /// An enemy overlaps the base.
    EnemyBase {
        /// The enemy involved.
        enemy: EnemyId,
    },
    /// An enemy overlaps the player.
    EnemyPlayer {
        /// The enemy involved.
        enemy: EnemyId,
    },
    /// An enemy overlaps a tower.
    EnemyTower {
        /// The enemy involved.
        enemy: EnemyId,
        /// The tower it overlaps.
        tower: TowerId,
    },
}

impl Contact {
    /// Returns the pair this contact belongs to.
    #[must_use]
    pub const fn pair(&self) -> PairKind {
        match self {
            Self::ProjectileEnemy { .. } => PairKind::ProjectileVsEnemy,
            Self::EnemyBase { .. } => PairKind::EnemyVsBase,
            Self::EnemyPlayer { .. } => PairKind::EnemyVsPlayer,
            Self::EnemyTower { .. } => PairKind::EnemyVsTower,
        }
    }
}

// =============================================================================
// HealthIssue
// =============================================================================

/// A defect found by a registry health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthIssue {
    /// Enemies are present but nothing pairs shots against them.
    MissingProjectileWatcher,
    /// A watcher was built against a population that has since been torn
    /// down.
    StaleWatcher(PairKind),
}

impl fmt::Display for HealthIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingProjectileWatcher => {
                write!(f, "projectile watcher missing while enemies are present")
            }
            Self::StaleWatcher(pair) => write!(f, "stale watcher for {pair}"),
        }
    }
}

// =============================================================================
// CollisionRegistry
// =============================================================================

/// The full watcher set, rebuilt atomically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionRegistry {
    watchers: Vec<Watcher>,
}

impl CollisionRegistry {
    /// Creates an empty registry. Nothing is watched until the first
    /// [`rebuild`](Self::rebuild).
    #[must_use]
    pub fn new() -> Self {
        Self {
            watchers: Vec::new(),
        }
    }

    /// Replaces every watcher with a fresh set for the current populations.
    ///
    /// Pairs whose target population is empty are skipped; the next rebuild
    /// after that population fills picks them up.
    pub(crate) fn rebuild(&mut self, pool: &ProjectilePool, world: &World) {
        self.watchers.clear();
        for pair in PairKind::ALL {
            if target_present(pair, world) {
                self.watchers.push(Watcher::new(pair, pool, world));
            }
        }
    }

    /// Returns the watcher for `pair`, if one was built.
    #[must_use]
    pub fn watcher(&self, pair: PairKind) -> Option<&Watcher> {
        self.watchers.iter().find(|w| w.pair() == pair)
    }

    /// Returns the mutable watcher for `pair`, if one was built.
    pub fn watcher_mut(&mut self, pair: PairKind) -> Option<&mut Watcher> {
        self.watchers.iter_mut().find(|w| w.pair() == pair)
    }

    /// Returns how many watchers are registered, live or not.
    #[must_use]
    pub fn watcher_count(&self) -> usize {
        self.watchers.len()
    }

    /// Returns how many watchers would produce contacts right now.
    #[must_use]
    pub fn live_watcher_count(&self, pool: &ProjectilePool, world: &World) -> usize {
        self.watchers
            .iter()
            .filter(|w| w.is_live(pool, world))
            .count()
    }

    /// True when `pair` has a watcher that would produce contacts.
    #[must_use]
    pub fn is_live(&self, pair: PairKind, pool: &ProjectilePool, world: &World) -> bool {
        self.watcher(pair).is_some_and(|w| w.is_live(pool, world))
    }

    /// Returns the first defect found, or `None` when the registry matches
    /// the current populations.
    #[must_use]
    pub fn check_health(&self, pool: &ProjectilePool, world: &World) -> Option<HealthIssue> {
        if world.has_enemies() && self.watcher(PairKind::ProjectileVsEnemy).is_none() {
            return Some(HealthIssue::MissingProjectileWatcher);
        }
        self.watchers
            .iter()
            .find(|w| !w.is_live(pool, world))
            .map(|w| HealthIssue::StaleWatcher(w.pair()))
    }

    /// True when live shots and enemies coexist with no live watcher
    /// pairing them. That combination loses hits every frame it persists,
    /// so it bypasses the normal rebuild debounce.
    #[must_use]
    pub fn needs_emergency_rebuild(&self, pool: &ProjectilePool, world: &World) -> bool {
        world.has_enemies()
            && pool.active_count() > 0
            && !self.is_live(PairKind::ProjectileVsEnemy, pool, world)
    }

    /// Sweeps every live watcher and returns the overlapping pairs.
    ///
    /// Contacts come out grouped by pair in rebuild order; within a pair,
    /// shots iterate in slot order and enemies and towers in id order.
    /// Disabled bodies never overlap anything. Enemies already marked for
    /// destruction still occupy space and are still reported; resolution
    /// decides what to do with them.
    #[must_use]
    pub fn collect_contacts(&self, pool: &ProjectilePool, world: &World) -> Vec<Contact> {
        let mut contacts = Vec::new();
        for watcher in &self.watchers {
            if !watcher.is_live(pool, world) {
                continue;
            }
            match watcher.pair() {
                PairKind::ProjectileVsEnemy => {
                    for shot in pool.iter_active() {
                        let body = shot.body();
                        for enemy in world.enemies() {
                            if body.overlaps(&enemy.body()) {
                                contacts.push(Contact::ProjectileEnemy {
                                    projectile: shot.id(),
                                    enemy: enemy.id(),
                                });
                            }
                        }
                    }
                }
                PairKind::EnemyVsBase => {
                    let base = world.base().body();
                    for enemy in world.enemies() {
                        if enemy.body().overlaps(&base) {
                            contacts.push(Contact::EnemyBase { enemy: enemy.id() });
                        }
                    }
                }
                PairKind::EnemyVsPlayer => {
                    let player = world.player().body();
                    for enemy in world.enemies() {
                        if enemy.body().overlaps(&player) {
                            contacts.push(Contact::EnemyPlayer { enemy: enemy.id() });
                        }
                    }
                }
                PairKind::EnemyVsTower => {
                    for enemy in world.enemies() {
                        let body = enemy.body();
                        for tower in world.towers() {
                            if body.overlaps(&tower.body()) {
                                contacts.push(Contact::EnemyTower {
                                    enemy: enemy.id(),
                                    tower: tower.id(),
                                });
                            }
                        }
                    }
                }
            }
        }
        contacts
    }

    /// Drops every watcher.
    pub(crate) fn clear(&mut self) {
        self.watchers.clear();
    }
}

fn target_present(pair: PairKind, world: &World) -> bool {
    match pair {
        PairKind::ProjectileVsEnemy => world.has_enemies(),
        // The base and the player always exist.
        PairKind::EnemyVsBase | PairKind::EnemyVsPlayer => true,
        PairKind::EnemyVsTower => world.tower_count() > 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Millis;
    use crate::projectile::{ProjectileKind, ShotSource};
    use glam::Vec2;

    fn populated_world() -> World {
        let mut world = World::new();
        world.spawn_enemy(Vec2::new(100.0, 100.0), 50.0);
        world.spawn_tower(Vec2::new(300.0, 300.0), 100.0);
        world
    }

    fn shot_at(pool: &mut ProjectilePool, pos: Vec2) -> ProjectileId {
        pool.launch(
            ProjectileKind::Normal,
            ShotSource::Player,
            pos,
            pos + Vec2::X,
            10.0,
            Millis::ZERO,
        )
        .unwrap()
    }

    mod rebuild_tests {
        use super::*;

        #[test]
        fn empty_world_gets_singleton_watchers_only() {
            let mut registry = CollisionRegistry::new();
            let pool = ProjectilePool::new(4);
            let world = World::new();
            registry.rebuild(&pool, &world);
            assert_eq!(registry.watcher_count(), 2);
            assert!(registry.watcher(PairKind::ProjectileVsEnemy).is_none());
            assert!(registry.watcher(PairKind::EnemyVsBase).is_some());
            assert!(registry.watcher(PairKind::EnemyVsPlayer).is_some());
            assert!(registry.watcher(PairKind::EnemyVsTower).is_none());
        }

        #[test]
        fn populated_world_gets_all_watchers() {
            let mut registry = CollisionRegistry::new();
            let pool = ProjectilePool::new(4);
            let world = populated_world();
            registry.rebuild(&pool, &world);
            assert_eq!(registry.watcher_count(), 4);
            for pair in PairKind::ALL {
                assert!(registry.watcher(pair).is_some(), "missing {pair}");
            }
        }

        #[test]
        fn rebuild_replaces_stale_watchers() {
            let mut registry = CollisionRegistry::new();
            let pool = ProjectilePool::new(4);
            let mut world = populated_world();
            registry.rebuild(&pool, &world);
            world.reset_enemies();
            assert!(!registry.is_live(PairKind::EnemyVsBase, &pool, &world));
            registry.rebuild(&pool, &world);
            assert!(registry.is_live(PairKind::EnemyVsBase, &pool, &world));
        }
    }

    mod liveness_tests {
        use super::*;

        #[test]
        fn enemy_teardown_stales_enemy_watchers() {
            let mut registry = CollisionRegistry::new();
            let pool = ProjectilePool::new(4);
            let mut world = populated_world();
            registry.rebuild(&pool, &world);
            assert_eq!(registry.live_watcher_count(&pool, &world), 4);
            world.reset_enemies();
            assert_eq!(registry.live_watcher_count(&pool, &world), 0);
        }

        #[test]
        fn pool_teardown_stales_only_projectile_watcher() {
            let mut registry = CollisionRegistry::new();
            let mut pool = ProjectilePool::new(4);
            let world = populated_world();
            registry.rebuild(&pool, &world);
            pool.clear();
            assert!(!registry.is_live(PairKind::ProjectileVsEnemy, &pool, &world));
            assert!(registry.is_live(PairKind::EnemyVsBase, &pool, &world));
            assert_eq!(registry.live_watcher_count(&pool, &world), 3);
        }

        #[test]
        fn disabled_watcher_is_not_live() {
            let mut registry = CollisionRegistry::new();
            let pool = ProjectilePool::new(4);
            let world = populated_world();
            registry.rebuild(&pool, &world);
            registry
                .watcher_mut(PairKind::EnemyVsBase)
                .unwrap()
                .disable();
            assert!(!registry.is_live(PairKind::EnemyVsBase, &pool, &world));
            assert_eq!(registry.live_watcher_count(&pool, &world), 3);
        }

        #[test]
        fn spawns_and_removals_do_not_stale_watchers() {
            let mut registry = CollisionRegistry::new();
            let pool = ProjectilePool::new(4);
            let mut world = populated_world();
            registry.rebuild(&pool, &world);
            let extra = world.spawn_enemy(Vec2::new(500.0, 500.0), 30.0);
            world.remove_enemy(extra);
            world.finalize_removals();
            assert_eq!(registry.live_watcher_count(&pool, &world), 4);
        }
    }

    mod contact_tests {
        use super::*;

        #[test]
        fn overlapping_shot_and_enemy_make_contact() {
            let mut registry = CollisionRegistry::new();
            let mut pool = ProjectilePool::new(4);
            let mut world = World::new();
            let enemy = world.spawn_enemy(Vec2::new(100.0, 100.0), 50.0);
            let shot = shot_at(&mut pool, Vec2::new(100.0, 100.0));
            registry.rebuild(&pool, &world);
            let contacts = registry.collect_contacts(&pool, &world);
            assert_eq!(
                contacts,
                vec![Contact::ProjectileEnemy {
                    projectile: shot,
                    enemy
                }]
            );
        }

        #[test]
        fn distant_bodies_make_no_contact() {
            let mut registry = CollisionRegistry::new();
            let mut pool = ProjectilePool::new(4);
            let mut world = World::new();
            world.spawn_enemy(Vec2::new(100.0, 100.0), 50.0);
            shot_at(&mut pool, Vec2::new(900.0, 600.0));
            registry.rebuild(&pool, &world);
            let contacts = registry.collect_contacts(&pool, &world);
            assert!(contacts.is_empty());
        }

        #[test]
        fn enemy_on_base_makes_contact() {
            let mut registry = CollisionRegistry::new();
            let pool = ProjectilePool::new(4);
            let mut world = World::new();
            let enemy = world.spawn_enemy(world.base().pos(), 50.0);
            registry.rebuild(&pool, &world);
            let contacts = registry.collect_contacts(&pool, &world);
            assert_eq!(contacts, vec![Contact::EnemyBase { enemy }]);
        }

        #[test]
        fn enemy_on_player_and_tower_make_contacts() {
            let mut registry = CollisionRegistry::new();
            let pool = ProjectilePool::new(4);
            let mut world = World::new();
            let tower = world.spawn_tower(Vec2::new(300.0, 300.0), 100.0);
            let on_player = world.spawn_enemy(world.player().pos(), 50.0);
            let on_tower = world.spawn_enemy(Vec2::new(300.0, 310.0), 50.0);
            registry.rebuild(&pool, &world);
            let contacts = registry.collect_contacts(&pool, &world);
            assert!(contacts.contains(&Contact::EnemyPlayer { enemy: on_player }));
            assert!(contacts.contains(&Contact::EnemyTower {
                enemy: on_tower,
                tower
            }));
        }

        #[test]
        fn stale_watcher_produces_no_contacts() {
            let mut registry = CollisionRegistry::new();
            let pool = ProjectilePool::new(4);
            let mut world = World::new();
            world.spawn_enemy(world.base().pos(), 50.0);
            registry.rebuild(&pool, &world);
            world.reset_enemies();
            world.spawn_enemy(world.base().pos(), 50.0);
            let contacts = registry.collect_contacts(&pool, &world);
            assert!(contacts.is_empty());
        }

        #[test]
        fn disabled_enemy_body_makes_no_contact() {
            let mut registry = CollisionRegistry::new();
            let pool = ProjectilePool::new(4);
            let mut world = World::new();
            let enemy = world.spawn_enemy(world.base().pos(), 50.0);
            world.set_enemy_body_enabled(enemy, false);
            registry.rebuild(&pool, &world);
            let contacts = registry.collect_contacts(&pool, &world);
            assert!(contacts.is_empty());
        }

        #[test]
        fn marked_enemy_is_still_reported() {
            let mut registry = CollisionRegistry::new();
            let pool = ProjectilePool::new(4);
            let mut world = World::new();
            let enemy = world.spawn_enemy(world.base().pos(), 50.0);
            registry.rebuild(&pool, &world);
            world.remove_enemy(enemy);
            let contacts = registry.collect_contacts(&pool, &world);
            assert_eq!(contacts, vec![Contact::EnemyBase { enemy }]);
        }

        #[test]
        fn piercing_shot_reports_every_overlapped_enemy() {
            let mut registry = CollisionRegistry::new();
            let mut pool = ProjectilePool::new(4);
            let mut world = World::new();
            let near = world.spawn_enemy(Vec2::new(100.0, 100.0), 50.0);
            let far = world.spawn_enemy(Vec2::new(110.0, 100.0), 50.0);
            let shot = shot_at(&mut pool, Vec2::new(105.0, 100.0));
            registry.rebuild(&pool, &world);
            let contacts = registry.collect_contacts(&pool, &world);
            assert_eq!(
                contacts,
                vec![
                    Contact::ProjectileEnemy {
                        projectile: shot,
                        enemy: near
                    },
                    Contact::ProjectileEnemy {
                        projectile: shot,
                        enemy: far
                    },
                ]
            );
        }
    }

    mod health_tests {
        use super::*;

        #[test]
        fn fresh_rebuild_is_healthy() {
            let mut registry = CollisionRegistry::new();
            let pool = ProjectilePool::new(4);
            let world = populated_world();
            registry.rebuild(&pool, &world);
            assert_eq!(registry.check_health(&pool, &world), None);
        }

        #[test]
        fn enemies_without_projectile_watcher_flag_missing() {
            let mut registry = CollisionRegistry::new();
            let pool = ProjectilePool::new(4);
            let mut world = World::new();
            registry.rebuild(&pool, &world);
            world.spawn_enemy(Vec2::new(100.0, 100.0), 50.0);
            assert_eq!(
                registry.check_health(&pool, &world),
                Some(HealthIssue::MissingProjectileWatcher)
            );
        }

        #[test]
        fn torn_down_population_flags_stale() {
            let mut registry = CollisionRegistry::new();
            let pool = ProjectilePool::new(4);
            let mut world = populated_world();
            registry.rebuild(&pool, &world);
            world.reset_towers();
            world.spawn_tower(Vec2::new(300.0, 300.0), 100.0);
            assert_eq!(
                registry.check_health(&pool, &world),
                Some(HealthIssue::StaleWatcher(PairKind::EnemyVsTower))
            );
        }

        #[test]
        fn emergency_needs_shots_and_enemies() {
            let mut registry = CollisionRegistry::new();
            let mut pool = ProjectilePool::new(4);
            let mut world = World::new();
            registry.rebuild(&pool, &world);
            world.spawn_enemy(Vec2::new(100.0, 100.0), 50.0);
            // Enemies but no live shots: unhealthy, not an emergency.
            assert!(!registry.needs_emergency_rebuild(&pool, &world));
            shot_at(&mut pool, Vec2::new(500.0, 500.0));
            assert!(registry.needs_emergency_rebuild(&pool, &world));
        }

        #[test]
        fn emergency_clears_after_rebuild() {
            let mut registry = CollisionRegistry::new();
            let mut pool = ProjectilePool::new(4);
            let mut world = World::new();
            world.spawn_enemy(Vec2::new(100.0, 100.0), 50.0);
            shot_at(&mut pool, Vec2::new(500.0, 500.0));
            registry.rebuild(&pool, &world);
            assert!(!registry.needs_emergency_rebuild(&pool, &world));
        }
    }

    mod display_tests {
        use super::*;

        #[test]
        fn pair_display() {
            assert_eq!(
                PairKind::ProjectileVsEnemy.to_string(),
                "projectile-vs-enemy"
            );
            assert_eq!(PairKind::EnemyVsTower.to_string(), "enemy-vs-tower");
        }

        #[test]
        fn issue_display_names_the_pair() {
            let issue = HealthIssue::StaleWatcher(PairKind::EnemyVsBase);
            assert_eq!(issue.to_string(), "stale watcher for enemy-vs-base");
        }
    }
}
