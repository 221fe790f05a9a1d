//! Contact resolution.
//!
//! The resolver turns the contacts a sweep produced into damage, status
//! effects, kill credit, and outward events. It holds no state of its own;
//! everything it touches arrives through a [`ResolveContext`] borrowed for
//! the duration of one sweep.
//!
//! # Resolution Order
//!
//! Contacts resolve in the order the registry reported them. For a shot
//! hit that means:
//!
//! 1. Drop the contact if the shot or the enemy is already gone.
//! 2. Apply the shot's current damage to the enemy.
//! 3. Attach the shot's status effect, if it carries one.
//! 4. Record the hit in the stats and event queue.
//! 5. Credit the owning tower when the hit was lethal.
//! 6. Register the hit on the shot, which decays its damage, and recycle
//!    the shot once its pierce budget is spent.
//!
//! Note: a contact is a statement about geometry last sweep, not a claim
//! that both parties still exist. Every handler re-checks its participants
//! and drops the contact silently when one is missing, so resolution order
//! within a frame never produces a panic or a double kill.
//!
//! # Rate Limiting
//!
//! Structure contacts persist across many frames while an enemy grinds
//! against the base or a tower, so those handlers charge damage at most
//! once per configured interval per enemy. Player contact is stricter: one
//! hit for the enemy's whole life, after which the enemy is removed.

use glam::Vec2;
use tracing::{debug, trace};

use crate::clock::Millis;
use crate::events::CombatEvent;
use crate::pool::ProjectilePool;
use crate::projectile::{EffectSpec, ProjectileId};
use crate::registry::Contact;
use crate::stats::CombatStats;
use crate::tuning::Tuning;
use crate::world::{EnemyId, TowerId, World};

// =============================================================================
// ResolveContext
// =============================================================================

/// Everything one sweep's resolution is allowed to touch.
///
/// Borrowed fresh each frame so the resolver can stay stateless and the
/// engine keeps ownership of the pieces between frames.
#[derive(Debug)]
pub struct ResolveContext<'a> {
    /// The shot pool, for damage lookups and recycling spent shots.
    pub pool: &'a mut ProjectilePool,
    /// The combat world holding enemies, towers, the base, and the player.
    pub world: &'a mut World,
    /// Damage magnitudes and rate limits.
    pub tuning: &'a Tuning,
    /// Simulation time of the sweep being resolved.
    pub now: Millis,
    /// Counters updated as hits land.
    pub stats: &'a mut CombatStats,
    /// Outward event queue, appended in resolution order.
    pub events: &'a mut Vec<CombatEvent>,
    /// Set when resolution changed the population enough that the watcher
    /// set should be rebuilt.
    pub rebuild_needed: bool,
}

// =============================================================================
// DamageResolver
// =============================================================================

/// Stateless contact resolver.
#[derive(Debug, Clone, Default)]
pub struct DamageResolver;

impl DamageResolver {
    /// Creates a resolver.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Routes a contact to its handler.
    pub fn resolve(&self, contact: Contact, ctx: &mut ResolveContext<'_>) {
        match contact {
            Contact::ProjectileEnemy { projectile, enemy } => {
                self.projectile_hits_enemy(projectile, enemy, ctx);
            }
            Contact::EnemyBase { enemy } => self.enemy_presses_base(enemy, ctx),
            Contact::EnemyPlayer { enemy } => self.enemy_reaches_player(enemy, ctx),
            Contact::EnemyTower { enemy, tower } => {
                self.enemy_presses_tower(enemy, tower, ctx);
            }
        }
    }

    /// Applies one shot hit to one enemy.
    ///
    /// Damage is read from the shot before the hit is registered, so every
    /// enemy struck during one sweep by the same piercing shot takes the
    /// same decayed amount that shot carried into the sweep.
    pub fn projectile_hits_enemy(
        &self,
        shot: ProjectileId,
        enemy: EnemyId,
        ctx: &mut ResolveContext<'_>,
    ) {
        let Some(record) = ctx.pool.get(shot) else {
            trace!(%shot, "hit dropped, unknown shot");
            return;
        };
        if !record.is_active() {
            trace!(%shot, "hit dropped, shot already spent");
            return;
        }
        let damage = record.damage();
        let kind = record.kind();
        let source = record.source();
        let effect = record.effect();

        let Some(target) = ctx.world.enemy_mut(enemy) else {
            trace!(%enemy, "hit dropped, enemy gone");
            return;
        };
        if target.is_marked_for_destruction() {
            trace!(%enemy, "hit dropped, enemy already dying");
            return;
        }
        target.take_damage(damage);
        let hp_after = target.hp();
        match effect {
            Some(EffectSpec::Burn {
                damage_per_tick,
                ticks,
            }) => target.apply_burn(damage_per_tick, ticks, ctx.now),
            Some(EffectSpec::Slow {
                factor,
                duration_ms,
            }) => target.apply_slow(factor, duration_ms, ctx.now),
            None => {}
        }

        ctx.stats.enemies_hit += 1;
        ctx.events.push(CombatEvent::ProjectileHit {
            target: enemy,
            damage,
            kind,
        });
        debug!(%shot, %enemy, damage, hp_after, "shot connected");

        if hp_after <= 0.0 {
            if let Some(owner) = source.tower() {
                if let Some(tower) = ctx.world.tower_mut(owner) {
                    tower.credit_kill();
                    trace!(%owner, kills = tower.kills(), "kill credited");
                }
            }
            ctx.rebuild_needed = true;
            debug!(%enemy, "enemy destroyed by shot");
        }

        let expended = ctx
            .pool
            .get_mut(shot)
            .is_some_and(|record| record.register_hit());
        if expended {
            ctx.pool.recycle(shot);
        }
    }

    /// Charges base contact damage, at most once per interval per enemy.
    pub fn enemy_presses_base(&self, enemy: EnemyId, ctx: &mut ResolveContext<'_>) {
        let interval = ctx.tuning.contact_interval_ms;
        let damage = ctx.tuning.base_contact_damage;
        let Some(attacker) = ctx.world.enemy_mut(enemy) else {
            trace!(%enemy, "base contact dropped, enemy gone");
            return;
        };
        if attacker.is_marked_for_destruction() {
            return;
        }
        if !attacker.try_base_contact(ctx.now, interval) {
            trace!(%enemy, "base contact still rate limited");
            return;
        }
        ctx.world.base_mut().take_damage(damage);
        debug!(%enemy, damage, base_hp = ctx.world.base().hp(), "enemy pressed the base");
    }

    /// Charges tower contact damage, at most once per interval per enemy.
    ///
    /// The tower is checked before the enemy's rate slot is consumed; a
    /// contact against a tower that was destroyed earlier in the frame
    /// must not burn the enemy's next real contact.
    pub fn enemy_presses_tower(
        &self,
        enemy: EnemyId,
        tower: TowerId,
        ctx: &mut ResolveContext<'_>,
    ) {
        if ctx.world.tower(tower).is_none() {
            trace!(%tower, "tower contact dropped, tower gone");
            return;
        }
        let interval = ctx.tuning.contact_interval_ms;
        let damage = ctx.tuning.tower_contact_damage;
        let Some(attacker) = ctx.world.enemy_mut(enemy) else {
            trace!(%enemy, "tower contact dropped, enemy gone");
            return;
        };
        if attacker.is_marked_for_destruction() {
            return;
        }
        if !attacker.try_tower_contact(ctx.now, interval) {
            trace!(%enemy, "tower contact still rate limited");
            return;
        }
        if let Some(target) = ctx.world.tower_mut(tower) {
            target.take_damage(damage);
            debug!(%enemy, %tower, damage, tower_hp = target.hp(), "enemy pressed a tower");
        }
    }

    /// Resolves an enemy reaching the player.
    ///
    /// The enemy deals its one lethal-contact hit, shoves the player away,
    /// and is removed. An enemy that already spent its hit is ignored.
    pub fn enemy_reaches_player(&self, enemy: EnemyId, ctx: &mut ResolveContext<'_>) {
        let damage = ctx.tuning.player_contact_damage;
        let strength = ctx.tuning.knockback_strength;
        let Some(attacker) = ctx.world.enemy_mut(enemy) else {
            trace!(%enemy, "player contact dropped, enemy gone");
            return;
        };
        if attacker.is_marked_for_destruction() || attacker.has_dealt_player_damage() {
            trace!(%enemy, "player contact dropped, enemy spent");
            return;
        }
        attacker.set_dealt_player_damage();
        let attacker_pos = attacker.pos();

        let player = ctx.world.player_mut();
        player.take_damage(damage);
        let direction = (player.pos() - attacker_pos)
            .try_normalize()
            .unwrap_or(Vec2::X);
        player.apply_knockback(direction * strength);

        ctx.world.remove_enemy(enemy);
        ctx.rebuild_needed = true;
        debug!(%enemy, damage, player_hp = ctx.world.player().hp(), "enemy reached the player");
    }
}
