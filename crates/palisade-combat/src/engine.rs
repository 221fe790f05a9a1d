//! The combat engine.
//!
//! [`CombatEngine`] owns the projectile pool, the watcher registry, the
//! resolver, and the health monitor, and advances them together once per
//! frame. The world is owned by the host and lent in for each call, so
//! the engine never holds references between frames.
//!
//! # Frame Pipeline
//!
//! Each [`tick`](CombatEngine::tick) runs, in order:
//!
//! 1. Advance the simulation clock by the frame delta.
//! 2. Move live shots, reclaim expired and escaped ones, and repair any
//!    live shot found with a disabled body.
//! 3. Tick enemy status effects and note deaths they caused.
//! 4. Sweep the watchers for contacts and resolve them.
//! 5. Run the watchdog: scheduled and sampled health checks, the
//!    emergency fallback, and any rebuild that has come due.
//!
//! # Host Contract
//!
//! Resolution marks dead enemies instead of removing them so that ids
//! stay valid for the rest of the frame. The host calls
//! [`World::finalize_removals`] after each tick to actually drop them.
//!
//! Every public entry point is safe to call at any time. Calls on a
//! destroyed engine, with stale ids, or with nothing to act on log at
//! trace or debug level and return without effect.

use std::mem;
use std::time::Duration;

use glam::Vec2;
use tracing::{debug, info, trace, warn};

use crate::clock::{Millis, SimClock};
use crate::events::{CombatEvent, GameEvent};
use crate::monitor::HealthMonitor;
use crate::pool::ProjectilePool;
use crate::projectile::{ProjectileId, ProjectileKind, ShotSource};
use crate::registry::CollisionRegistry;
use crate::resolver::{DamageResolver, ResolveContext};
use crate::stats::CombatStats;
use crate::tuning::{Tuning, TuningError};
use crate::world::World;

/// Real-time combat resolution engine.
#[derive(Debug, Clone)]
pub struct CombatEngine {
    clock: SimClock,
    tuning: Tuning,
    pool: ProjectilePool,
    registry: CollisionRegistry,
    resolver: DamageResolver,
    monitor: HealthMonitor,
    stats: CombatStats,
    events: Vec<CombatEvent>,
    debug: bool,
    destroyed: bool,
    seed: u64,
}

impl CombatEngine {
    /// Creates an engine with default tuning and builds the initial
    /// watcher set for `world`.
    #[must_use]
    pub fn new(seed: u64, world: &World) -> Self {
        Self::assemble(seed, Tuning::default(), world)
    }

    /// Creates an engine with the given tuning.
    ///
    /// # Errors
    ///
    /// Returns the first [`TuningError`] found when the tuning fails
    /// validation.
    pub fn with_tuning(seed: u64, tuning: Tuning, world: &World) -> Result<Self, TuningError> {
        tuning.validate()?;
        Ok(Self::assemble(seed, tuning, world))
    }

    fn assemble(seed: u64, tuning: Tuning, world: &World) -> Self {
        let pool = ProjectilePool::new(tuning.pool_capacity);
        let monitor = HealthMonitor::new(seed, tuning.health_check_interval_ms);
        let mut engine = Self {
            clock: SimClock::new(),
            tuning,
            pool,
            registry: CollisionRegistry::new(),
            resolver: DamageResolver::new(),
            monitor,
            stats: CombatStats::default(),
            events: Vec::new(),
            debug: false,
            destroyed: false,
            seed,
        };
        engine.rebuild_now(world);
        info!(
            seed,
            capacity = engine.pool.capacity(),
            "combat engine ready"
        );
        engine
    }

    /// Advances combat by one frame.
    pub fn tick(&mut self, world: &mut World, dt: Duration) {
        if self.destroyed {
            trace!("tick ignored, engine destroyed");
            return;
        }
        self.clock.advance(dt);
        let now = self.clock.now();

        let report = self.pool.tick(dt.as_secs_f32(), now, &self.tuning);
        if report.bodies_repaired > 0 {
            warn!(
                count = report.bodies_repaired,
                "found live shots with disabled bodies"
            );
        }

        self.tick_status_effects(world, now);
        self.sweep(world, now);
        self.run_watchdog(world, now);

        self.stats.active_projectiles = active_gauge(&self.pool);
        if self.debug {
            debug!(
                %now,
                active = self.stats.active_projectiles,
                enemies = world.enemy_count(),
                culled = report.culled(),
                "frame complete"
            );
        }
    }

    /// Launches a shot toward `target`.
    ///
    /// Returns `None` without launching when the engine is destroyed,
    /// no enemies exist to aim at, or a tower source no longer exists.
    pub fn fire(
        &mut self,
        world: &World,
        source: ShotSource,
        target: Vec2,
        damage: f32,
        kind: ProjectileKind,
    ) -> Option<ProjectileId> {
        if self.destroyed {
            trace!("fire ignored, engine destroyed");
            return None;
        }
        if !world.has_enemies() {
            debug!(%source, "fire skipped, no enemies to aim at");
            return None;
        }
        let origin = match source {
            ShotSource::Tower(id) => match world.tower(id) {
                Some(tower) => tower.pos(),
                None => {
                    debug!(tower = %id, "fire skipped, tower gone");
                    return None;
                }
            },
            ShotSource::Player => world.player().pos(),
        };
        let id = self
            .pool
            .launch(kind, source, origin, target, damage, self.clock.now())?;
        self.stats.projectiles_created += 1;
        self.stats.active_projectiles = active_gauge(&self.pool);
        debug!(%id, %kind, %source, "shot fired");
        Some(id)
    }

    /// Returns a shot to the pool ahead of its natural end.
    ///
    /// Stale and repeated ids are ignored. Returns true only when a live
    /// shot was reclaimed.
    pub fn recycle(&mut self, id: ProjectileId) -> bool {
        if self.destroyed {
            trace!(%id, "recycle ignored, engine destroyed");
            return false;
        }
        let recycled = self.pool.recycle(id);
        if recycled {
            self.stats.active_projectiles = active_gauge(&self.pool);
        }
        recycled
    }

    /// Rebuilds the watcher set immediately, outside the debounce window.
    pub fn rebuild(&mut self, world: &World) {
        if self.destroyed {
            trace!("rebuild ignored, engine destroyed");
            return;
        }
        self.rebuild_now(world);
    }

    /// Reacts to a host notification.
    pub fn notify(&mut self, world: &World, event: GameEvent) {
        if self.destroyed {
            trace!(%event, "event ignored, engine destroyed");
            return;
        }
        let now = self.clock.now();
        match event {
            GameEvent::RefreshCollisions => {
                debug!("watcher refresh requested by host");
                self.monitor.request_rebuild(now, self.tuning.rebuild_debounce_ms);
                // An unhealthy check's own request coalesces onto the
                // deadline armed above.
                self.health_check(world, now);
            }
            GameEvent::RoundStarted { round } => {
                info!(round, "round started");
                self.monitor.request_rebuild(now, self.tuning.rebuild_debounce_ms);
            }
            GameEvent::EnemySpawned { enemy } => {
                trace!(%enemy, "enemy spawn noted");
                self.health_check(world, now);
            }
            GameEvent::ToggleDebugMode => self.set_debug_mode(!self.debug),
        }
    }

    /// Switches verbose frame diagnostics on or off.
    pub fn set_debug_mode(&mut self, enabled: bool) {
        self.debug = enabled;
        info!(enabled, "debug mode toggled");
    }

    /// Shuts the engine down.
    ///
    /// Reclaims every shot, drops every watcher, and discards queued
    /// events. Later calls on the engine are logged no-ops. Destroying
    /// twice is itself a no-op.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.pool.clear();
        self.registry.clear();
        self.monitor.disarm();
        self.events.clear();
        self.stats.active_projectiles = 0;
        self.destroyed = true;
        info!("combat engine destroyed");
    }

    /// Takes every event queued since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<CombatEvent> {
        mem::take(&mut self.events)
    }

    /// Returns the events queued so far without draining them.
    #[must_use]
    pub fn events(&self) -> &[CombatEvent] {
        &self.events
    }

    /// Returns the current simulation time.
    #[must_use]
    pub fn now(&self) -> Millis {
        self.clock.now()
    }

    /// Returns the running counters.
    #[must_use]
    pub const fn stats(&self) -> CombatStats {
        self.stats
    }

    /// Returns the tuning the engine was built with.
    #[must_use]
    pub const fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Returns the seed the engine was built with.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// True when verbose frame diagnostics are on.
    #[must_use]
    pub const fn debug_mode(&self) -> bool {
        self.debug
    }

    /// True once [`destroy`](Self::destroy) has run.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Returns the projectile pool.
    #[must_use]
    pub const fn pool(&self) -> &ProjectilePool {
        &self.pool
    }

    /// Returns the watcher registry.
    #[must_use]
    pub const fn registry(&self) -> &CollisionRegistry {
        &self.registry
    }

    fn tick_status_effects(&mut self, world: &mut World, now: Millis) {
        let mut deaths = 0u32;
        for enemy in world.enemies_mut() {
            let was_marked = enemy.is_marked_for_destruction();
            let dealt = enemy.tick_status(now);
            if dealt > 0.0 {
                trace!(enemy = %enemy.id(), dealt, "status damage ticked");
            }
            if !was_marked && enemy.is_marked_for_destruction() {
                deaths += 1;
                debug!(enemy = %enemy.id(), "enemy destroyed by status damage");
            }
        }
        if deaths > 0 {
            self.monitor
                .request_rebuild(now, self.tuning.rebuild_debounce_ms);
        }
    }

    fn sweep(&mut self, world: &mut World, now: Millis) {
        let contacts = self.registry.collect_contacts(&self.pool, world);
        if contacts.is_empty() {
            return;
        }
        let mut ctx = ResolveContext {
            pool: &mut self.pool,
            world,
            tuning: &self.tuning,
            now,
            stats: &mut self.stats,
            events: &mut self.events,
            rebuild_needed: false,
        };
        for contact in contacts {
            self.resolver.resolve(contact, &mut ctx);
        }
        let rebuild_needed = ctx.rebuild_needed;
        if rebuild_needed {
            self.monitor
                .request_rebuild(now, self.tuning.rebuild_debounce_ms);
        }
    }

    fn run_watchdog(&mut self, world: &World, now: Millis) {
        // The lottery is drawn every frame, even when the interval check
        // fires, so identical runs consume the generator identically.
        let interval_due = self
            .monitor
            .interval_elapsed(now, self.tuning.health_check_interval_ms);
        let sampled = self.monitor.sample(self.tuning.health_sample_chance);
        if interval_due || sampled {
            self.health_check(world, now);
        }
        if self.registry.needs_emergency_rebuild(&self.pool, world) {
            warn!("live shots unwatched, forcing emergency rebuild");
            self.monitor
                .schedule_emergency(now, self.tuning.emergency_rebuild_delay_ms);
        }
        if self.monitor.poll_rebuild(now) {
            self.rebuild_now(world);
        }
    }

    fn health_check(&mut self, world: &World, now: Millis) {
        if let Some(issue) = self.registry.check_health(&self.pool, world) {
            warn!(%issue, "registry health check failed");
            self.monitor
                .request_rebuild(now, self.tuning.rebuild_debounce_ms);
        } else {
            trace!("registry health check passed");
        }
    }

    fn rebuild_now(&mut self, world: &World) {
        self.registry.rebuild(&self.pool, world);
        self.monitor.disarm();
        self.stats.collider_refreshes += 1;
        info!(
            watchers = self.registry.watcher_count(),
            refreshes = self.stats.collider_refreshes,
            "collision watchers rebuilt"
        );
    }
}

fn active_gauge(pool: &ProjectilePool) -> u32 {
    u32::try_from(pool.active_count()).unwrap_or(u32::MAX)
}
