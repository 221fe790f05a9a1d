//! Game-world roster the combat engine operates on.
//!
//! The engine owns no enemies, towers, or avatars. The host builds a
//! [`World`] and passes it into every engine call, which keeps the combat
//! subsystem free of dangling references when the host tears groups down
//! mid-round.
//!
//! # Generations
//!
//! Each collidable group carries a generation counter. Wholesale teardown
//! (round transitions) bumps the counter; collision watchers record the
//! generations they were built against and report themselves stale once the
//! counters move on. Ordinary membership churn, spawns and removals, leaves
//! the generation alone.
//!
//! # Removal
//!
//! Enemy removal is two-phase. [`World::remove_enemy`] only marks the enemy,
//! which immediately stops damage and contact processing but keeps the
//! record observable for handlers later in the same frame. The host calls
//! [`World::finalize_removals`] once per frame, after the engine tick, to
//! drop marked records for real.

mod actors;
mod enemy;

pub use actors::{Base, Player, Tower};
pub use enemy::{Burn, Enemy, EnemyFlags, Slow, BURN_TICK_SPACING_MS};

use std::collections::BTreeMap;
use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Starting hit points for the base.
const BASE_HP: f32 = 200.0;

/// Starting hit points for the player avatar.
const PLAYER_HP: f32 = 100.0;

/// Default base placement.
const BASE_POS: Vec2 = Vec2::new(640.0, 80.0);

/// Default player placement.
const PLAYER_POS: Vec2 = Vec2::new(640.0, 400.0);

// =============================================================================
// BodyKind
// =============================================================================

/// Discriminator carried by every collision body.
///
/// Overlap handlers receive plain records tagged with this kind, so dispatch
/// is always explicit data instead of depending on which callback a physics
/// layer happened to invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyKind {
    /// An in-flight shot.
    Projectile,
    /// A hostile actor.
    Enemy,
    /// The structure enemies besiege.
    Base,
    /// The player avatar.
    Player,
    /// A static defensive tower.
    Tower,
}

impl BodyKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Projectile,
        Self::Enemy,
        Self::Base,
        Self::Player,
        Self::Tower,
    ];
}

impl fmt::Display for BodyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Projectile => "projectile",
            Self::Enemy => "enemy",
            Self::Base => "base",
            Self::Player => "player",
            Self::Tower => "tower",
        };
        write!(f, "{name}")
    }
}

// =============================================================================
// Body
// =============================================================================

/// Circle collision body tagged with its owner's kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// What kind of object owns this body.
    pub kind: BodyKind,
    /// Center position in world units.
    pub pos: Vec2,
    /// Collision radius in world units.
    pub radius: f32,
    /// Disabled bodies are skipped by overlap sweeps.
    pub enabled: bool,
}

impl Body {
    /// Creates an enabled body.
    #[must_use]
    pub const fn new(kind: BodyKind, pos: Vec2, radius: f32) -> Self {
        Self {
            kind,
            pos,
            radius,
            enabled: true,
        }
    }

    /// Reports whether two bodies overlap.
    ///
    /// Disabled bodies never overlap anything.
    #[must_use]
    pub fn overlaps(&self, other: &Body) -> bool {
        if !self.enabled || !other.enabled {
            return false;
        }
        let reach = self.radius + other.radius;
        self.pos.distance_squared(other.pos) <= reach * reach
    }
}

// =============================================================================
// Ids
// =============================================================================

/// Unique identifier for an enemy.
///
/// Allocated sequentially by the [`World`] and never reused within a run,
/// so a stale id reliably misses instead of aliasing a newer enemy.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EnemyId(u64);

impl EnemyId {
    /// Creates an `EnemyId` from a raw u64 value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw u64 value of this id.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for EnemyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EnemyId({})", self.0)
    }
}

impl fmt::Display for EnemyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EnemyId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<EnemyId> for u64 {
    fn from(id: EnemyId) -> Self {
        id.0
    }
}

/// Unique identifier for a tower.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TowerId(u64);

impl TowerId {
    /// Creates a `TowerId` from a raw u64 value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw u64 value of this id.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for TowerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TowerId({})", self.0)
    }
}

impl fmt::Display for TowerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TowerId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<TowerId> for u64 {
    fn from(id: TowerId) -> Self {
        id.0
    }
}

// =============================================================================
// World
// =============================================================================

/// Roster of every collidable object in the scene.
///
/// Enemies and towers live in ordered maps so iteration order, and with it
/// contact resolution order, is deterministic. The base and the player are
/// singletons that exist for the whole run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct World {
    /// Hostile actors by id.
    enemies: BTreeMap<EnemyId, Enemy>,
    /// Defensive towers by id.
    towers: BTreeMap<TowerId, Tower>,
    /// The structure enemies besiege.
    base: Base,
    /// The player avatar.
    player: Player,
    /// Next enemy id to hand out.
    next_enemy_id: u64,
    /// Next tower id to hand out.
    next_tower_id: u64,
    /// Bumped when the enemy group is torn down wholesale.
    enemies_generation: u64,
    /// Bumped when the tower group is torn down wholesale.
    towers_generation: u64,
}

impl World {
    /// Creates a world holding only the base and the player, at their
    /// default placements.
    #[must_use]
    pub fn new() -> Self {
        Self {
            enemies: BTreeMap::new(),
            towers: BTreeMap::new(),
            base: Base::new(BASE_POS, BASE_HP),
            player: Player::new(PLAYER_POS, PLAYER_HP),
            next_enemy_id: 0,
            next_tower_id: 0,
            enemies_generation: 0,
            towers_generation: 0,
        }
    }

    // -------------------------------------------------------------------------
    // Spawning
    // -------------------------------------------------------------------------

    /// Spawns an enemy at `pos` with `hp` hit points and returns its id.
    pub fn spawn_enemy(&mut self, pos: Vec2, hp: f32) -> EnemyId {
        let id = EnemyId::new(self.next_enemy_id);
        self.next_enemy_id += 1;
        self.enemies.insert(id, Enemy::new(id, pos, hp));
        id
    }

    /// Spawns a tower at `pos` with `hp` hit points and returns its id.
    pub fn spawn_tower(&mut self, pos: Vec2, hp: f32) -> TowerId {
        let id = TowerId::new(self.next_tower_id);
        self.next_tower_id += 1;
        self.towers.insert(id, Tower::new(id, pos, hp));
        id
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Returns the enemy with the given id, if it still exists.
    #[must_use]
    pub fn enemy(&self, id: EnemyId) -> Option<&Enemy> {
        self.enemies.get(&id)
    }

    /// Returns a mutable reference to the enemy with the given id.
    pub fn enemy_mut(&mut self, id: EnemyId) -> Option<&mut Enemy> {
        self.enemies.get_mut(&id)
    }

    /// Iterates enemies in id order.
    pub fn enemies(&self) -> impl Iterator<Item = &Enemy> {
        self.enemies.values()
    }

    /// Iterates enemies mutably in id order.
    pub fn enemies_mut(&mut self) -> impl Iterator<Item = &mut Enemy> {
        self.enemies.values_mut()
    }

    /// Returns the tower with the given id, if it still exists.
    #[must_use]
    pub fn tower(&self, id: TowerId) -> Option<&Tower> {
        self.towers.get(&id)
    }

    /// Returns a mutable reference to the tower with the given id.
    pub fn tower_mut(&mut self, id: TowerId) -> Option<&mut Tower> {
        self.towers.get_mut(&id)
    }

    /// Iterates towers in id order.
    pub fn towers(&self) -> impl Iterator<Item = &Tower> {
        self.towers.values()
    }

    /// Returns the number of enemies, marked ones included.
    #[must_use]
    pub fn enemy_count(&self) -> usize {
        self.enemies.len()
    }

    /// Returns the number of towers.
    #[must_use]
    pub fn tower_count(&self) -> usize {
        self.towers.len()
    }

    /// Reports whether any enemy exists, marked ones included.
    #[must_use]
    pub fn has_enemies(&self) -> bool {
        !self.enemies.is_empty()
    }

    /// Returns the base.
    #[must_use]
    pub const fn base(&self) -> &Base {
        &self.base
    }

    /// Returns a mutable reference to the base.
    pub fn base_mut(&mut self) -> &mut Base {
        &mut self.base
    }

    /// Returns the player avatar.
    #[must_use]
    pub const fn player(&self) -> &Player {
        &self.player
    }

    /// Returns a mutable reference to the player avatar.
    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    // -------------------------------------------------------------------------
    // Removal
    // -------------------------------------------------------------------------

    /// Requests removal of an enemy.
    ///
    /// Marks the enemy for destruction, which immediately stops damage and
    /// contact processing. The record itself survives until
    /// [`World::finalize_removals`] runs. Safe to call repeatedly and for
    /// ids that no longer exist; returns true only when the enemy was newly
    /// marked.
    pub fn remove_enemy(&mut self, id: EnemyId) -> bool {
        match self.enemies.get_mut(&id) {
            Some(enemy) if !enemy.is_marked_for_destruction() => {
                enemy.mark_for_destruction();
                true
            }
            _ => false,
        }
    }

    /// Drops every enemy marked for destruction. Returns how many were
    /// removed.
    pub fn finalize_removals(&mut self) -> usize {
        let before = self.enemies.len();
        self.enemies
            .retain(|_, enemy| !enemy.is_marked_for_destruction());
        before - self.enemies.len()
    }

    /// Tears down the enemy group wholesale, bumping its generation.
    ///
    /// Collision watchers built against the previous incarnation report
    /// themselves stale afterwards. Round transitions go through here.
    pub fn reset_enemies(&mut self) {
        self.enemies.clear();
        self.enemies_generation += 1;
    }

    /// Tears down the tower group wholesale, bumping its generation.
    pub fn reset_towers(&mut self) {
        self.towers.clear();
        self.towers_generation += 1;
    }

    // -------------------------------------------------------------------------
    // Generations
    // -------------------------------------------------------------------------

    /// Returns the enemy group generation.
    #[must_use]
    pub const fn enemies_generation(&self) -> u64 {
        self.enemies_generation
    }

    /// Returns the tower group generation.
    #[must_use]
    pub const fn towers_generation(&self) -> u64 {
        self.towers_generation
    }

    // -------------------------------------------------------------------------
    // Placement
    // -------------------------------------------------------------------------

    /// Moves an enemy. Returns false if the id no longer exists.
    pub fn set_enemy_position(&mut self, id: EnemyId, pos: Vec2) -> bool {
        match self.enemies.get_mut(&id) {
            Some(enemy) => {
                enemy.set_pos(pos);
                true
            }
            None => false,
        }
    }

    /// Moves the player avatar.
    pub fn set_player_position(&mut self, pos: Vec2) {
        self.player.set_pos(pos);
    }

    /// Moves the base.
    pub fn set_base_position(&mut self, pos: Vec2) {
        self.base.set_pos(pos);
    }

    /// Toggles an enemy's collision body.
    ///
    /// A disabled body is skipped by overlap sweeps, so hosts can use this
    /// to keep an enemy untargetable during its spawn animation. Returns
    /// false if the id no longer exists.
    pub fn set_enemy_body_enabled(&mut self, id: EnemyId, enabled: bool) -> bool {
        match self.enemies.get_mut(&id) {
            Some(enemy) => {
                enemy.set_body_enabled(enabled);
                true
            }
            None => false,
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
