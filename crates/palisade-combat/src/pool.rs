//! Fixed-capacity projectile pool with explicit slot recycling.
//!
//! # Slot Discipline
//!
//! The pool owns a fixed array of slots sized once at construction. A free
//! queue holds the index of every slot not currently occupied by a live
//! shot. Launching pops the queue head; recycling deactivates the record in
//! place and pushes its index back. When the queue is empty the pool evicts
//! the oldest live shot rather than refusing or growing, so a launch always
//! succeeds and memory stays flat for the whole run.
//!
//! # Identity
//!
//! Slots are reused aggressively, so a slot index is not identity. Each
//! launch stamps its record with a fresh serial [`ProjectileId`]; lookups
//! match on the serial, which makes a stale handle to a reused slot miss
//! instead of touching the wrong shot. Recycling an id twice is a logged
//! no-op.

use std::collections::VecDeque;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::clock::Millis;
use crate::projectile::{Projectile, ProjectileId, ProjectileKind, ShotSource};
use crate::tuning::Tuning;

// =============================================================================
// PoolTickReport
// =============================================================================

/// Counters reported by one pool maintenance pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolTickReport {
    /// Shots reclaimed after exceeding their lifetime.
    pub expired: u32,
    /// Shots reclaimed after leaving the padded playfield.
    pub escaped: u32,
    /// Live shots whose disabled bodies were switched back on.
    pub bodies_repaired: u32,
}

impl PoolTickReport {
    /// Returns how many shots this pass reclaimed.
    #[must_use]
    pub const fn culled(&self) -> u32 {
        self.expired + self.escaped
    }
}

// =============================================================================
// ProjectilePool
// =============================================================================

/// Fixed-capacity recycling store for in-flight shots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectilePool {
    /// Slot array. A slot is `None` until its first launch, then holds a
    /// record that is recycled in place forever after.
    slots: Vec<Option<Projectile>>,
    /// Indices of slots available for the next launch, oldest release first.
    free: VecDeque<usize>,
    /// Serial for the next launched shot.
    next_serial: u64,
    /// Bumped when the pool is torn down wholesale.
    generation: u64,
}

impl ProjectilePool {
    /// Creates a pool with `capacity` slots, all free.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
            free: (0..capacity).collect(),
            next_serial: 0,
            generation: 0,
        }
    }

    /// Returns the fixed slot count.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns how many slots hold a live shot.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.slots
            .iter()
            .flatten()
            .filter(|shot| shot.is_active())
            .count()
    }

    /// Returns how many slots are available without eviction.
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Returns the teardown generation.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Launches a shot from `origin` toward `target`.
    ///
    /// Takes the head of the free queue, or evicts the oldest live shot
    /// when every slot is occupied. Returns `None` only for a zero-capacity
    /// pool.
    pub(crate) fn launch(
        &mut self,
        kind: ProjectileKind,
        source: ShotSource,
        origin: Vec2,
        target: Vec2,
        damage: f32,
        now: Millis,
    ) -> Option<ProjectileId> {
        let slot = match self.free.pop_front() {
            Some(idx) => idx,
            None => self.evict_oldest()?,
        };
        let id = ProjectileId::new(self.next_serial);
        self.next_serial += 1;
        self.slots[slot] = Some(Projectile::launch(
            id, kind, source, origin, target, damage, now,
        ));
        trace!(%id, %kind, slot, "shot launched");
        Some(id)
    }

    /// Returns the shot to the free queue.
    ///
    /// Safe to call with ids that were already recycled or never existed;
    /// those calls log and return false. Returns true only when a live shot
    /// was deactivated.
    pub fn recycle(&mut self, id: ProjectileId) -> bool {
        let Some(idx) = self.slot_of(id) else {
            trace!(%id, "recycle ignored, unknown shot");
            return false;
        };
        let Some(record) = &mut self.slots[idx] else {
            return false;
        };
        if !record.is_active() {
            trace!(%id, "recycle ignored, shot already inactive");
            return false;
        }
        record.deactivate();
        self.free.push_back(idx);
        trace!(%id, slot = idx, "shot recycled");
        true
    }

    /// Returns the record for `id`, live or not, if a slot still holds it.
    #[must_use]
    pub fn get(&self, id: ProjectileId) -> Option<&Projectile> {
        self.slots.iter().flatten().find(|shot| shot.id() == id)
    }

    /// Returns the mutable record for `id`, if a slot still holds it.
    pub(crate) fn get_mut(&mut self, id: ProjectileId) -> Option<&mut Projectile> {
        self.slots.iter_mut().flatten().find(|shot| shot.id() == id)
    }

    /// Iterates live shots in slot order.
    pub fn iter_active(&self) -> impl Iterator<Item = &Projectile> {
        self.slots
            .iter()
            .flatten()
            .filter(|shot| shot.is_active())
    }

    /// Returns the slot index currently holding `id`.
    pub(crate) fn slot_of(&self, id: ProjectileId) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|shot| shot.id() == id))
    }

    /// Moves every live shot and reclaims the ones that are done.
    ///
    /// A shot is reclaimed once it outlives the configured lifetime or
    /// leaves the padded playfield. Live shots found with a disabled
    /// collision body are switched back on and counted in the report.
    pub(crate) fn tick(&mut self, dt_secs: f32, now: Millis, tuning: &Tuning) -> PoolTickReport {
        let mut report = PoolTickReport::default();
        for idx in 0..self.slots.len() {
            let Some(record) = &mut self.slots[idx] else {
                continue;
            };
            if !record.is_active() {
                continue;
            }
            record.integrate(dt_secs);
            let id = record.id();
            if record.age_ms(now) > tuning.projectile_lifetime_ms {
                record.deactivate();
                self.free.push_back(idx);
                report.expired += 1;
                trace!(%id, slot = idx, "shot expired");
                continue;
            }
            if out_of_bounds(record.pos(), tuning) {
                record.deactivate();
                self.free.push_back(idx);
                report.escaped += 1;
                trace!(%id, slot = idx, "shot left the playfield");
                continue;
            }
            if !record.body_enabled() {
                record.set_body_enabled(true);
                report.bodies_repaired += 1;
                warn!(%id, slot = idx, "re-enabled collision body on live shot");
            }
        }
        report
    }

    /// Deactivates every live shot and bumps the teardown generation.
    pub(crate) fn clear(&mut self) {
        for idx in 0..self.slots.len() {
            let Some(record) = &mut self.slots[idx] else {
                continue;
            };
            if record.is_active() {
                record.deactivate();
                self.free.push_back(idx);
            }
        }
        self.generation += 1;
        debug!(generation = self.generation, "projectile pool cleared");
    }

    fn evict_oldest(&mut self) -> Option<usize> {
        let (_, idx) = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| {
                slot.as_ref()
                    .filter(|shot| shot.is_active())
                    .map(|shot| (shot.spawned_at(), idx))
            })
            .min()?;
        if let Some(record) = &mut self.slots[idx] {
            debug!(id = %record.id(), slot = idx, "pool full, evicting oldest shot");
            record.deactivate();
        }
        Some(idx)
    }
}

fn out_of_bounds(pos: Vec2, tuning: &Tuning) -> bool {
    let min = tuning.bounds_min - Vec2::splat(tuning.bounds_padding);
    let max = tuning.bounds_max + Vec2::splat(tuning.bounds_padding);
    pos.x < min.x || pos.x > max.x || pos.y < min.y || pos.y > max.y
}
