//! Projectile records, shot kinds, and per-kind launch profiles.
//!
//! Every shot in flight is a [`Projectile`] record owned by the
//! [`ProjectilePool`](crate::pool::ProjectilePool). The record carries its
//! own kind tag, remaining piercing budget, and current damage, so overlap
//! handlers never have to consult the launcher after the shot leaves the
//! barrel.
//!
//! # Kinds
//!
//! The seven [`ProjectileKind`]s differ only in data: launch speed, sprite
//! scale, tint, piercing budget, and an optional status effect payload.
//! [`ProjectileKind::profile`] is the single lookup table; nothing else in
//! the engine branches on kind.

use std::fmt;

use bitflags::bitflags;
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::clock::Millis;
use crate::world::{Body, BodyKind, TowerId};

/// Collision radius of an unscaled shot, in world units.
const BASE_RADIUS: f32 = 6.0;

/// Damage multiplier applied after each hit of a piercing shot.
const DAMAGE_FALLOFF: f32 = 0.8;

// =============================================================================
// ProjectileId
// =============================================================================

/// Serial identity of a launched shot.
///
/// Pool slots are reused aggressively, so a slot index is not identity. Each
/// launch stamps its record with a fresh serial id; a stale handle to a
/// reused slot simply stops matching instead of touching the wrong shot.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProjectileId(u64);

impl ProjectileId {
    /// Creates a `ProjectileId` from a raw u64 value.
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

impl fmt::Debug for ProjectileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProjectileId({})", self.0)
    }
}

impl fmt::Display for ProjectileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ProjectileId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ProjectileId> for u64 {
    fn from(id: ProjectileId) -> Self {
        id.0
    }
}

// =============================================================================
// Effects and Profiles
// =============================================================================

/// Status payload a shot applies to the enemy it damages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EffectSpec {
    /// Periodic damage over time.
    Burn {
        /// Damage applied on each burn tick.
        damage_per_tick: f32,
        /// Number of ticks before the burn expires.
        ticks: u8,
    },
    /// Movement speed multiplier for a fixed duration.
    Slow {
        /// Speed multiplier while active, in `(0, 1)`.
        factor: f32,
        /// How long the slow lasts once applied.
        duration_ms: u64,
    },
}

/// Launch-time parameters for one projectile kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KindProfile {
    /// Muzzle speed in world units per second.
    pub speed: f32,
    /// Sprite and collision radius multiplier.
    pub scale: f32,
    /// Render tint as packed `0xRRGGBB`.
    pub tint: u32,
    /// Status effect attached to enemies this shot damages.
    pub effect: Option<EffectSpec>,
}

// =============================================================================
// ProjectileKind
// =============================================================================

/// The seven shot kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectileKind {
    /// Baseline single-hit shot.
    Normal,
    /// Fast, small, cheap shot for high fire rates.
    Rapid,
    /// Heavy shot that pierces up to three enemies.
    Power,
    /// Very fast long-range shot.
    Sniper,
    /// Wide shot that pierces up to five enemies.
    Area,
    /// Applies a burn to enemies it damages.
    Fire,
    /// Applies a slow to enemies it damages.
    Ice,
}

impl ProjectileKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Normal,
        Self::Rapid,
        Self::Power,
        Self::Sniper,
        Self::Area,
        Self::Fire,
        Self::Ice,
    ];

    /// Returns how many enemies a shot of this kind may damage before it is
    /// recycled.
    #[must_use]
    pub const fn max_hits(self) -> u8 {
        match self {
            Self::Power => 3,
            Self::Area => 5,
            Self::Normal | Self::Rapid | Self::Sniper | Self::Fire | Self::Ice => 1,
        }
    }

    /// Reports whether this kind survives its first hit.
    #[must_use]
    pub const fn is_piercing(self) -> bool {
        self.max_hits() > 1
    }

    /// Returns the launch profile for this kind.
    #[must_use]
    pub const fn profile(self) -> KindProfile {
        match self {
            Self::Normal => KindProfile {
                speed: 420.0,
                scale: 1.0,
                tint: 0x00ff_ffff,
                effect: None,
            },
            Self::Rapid => KindProfile {
                speed: 540.0,
                scale: 0.8,
                tint: 0x00ff_e066,
                effect: None,
            },
            Self::Power => KindProfile {
                speed: 340.0,
                scale: 1.4,
                tint: 0x00ff_6b35,
                effect: None,
            },
            Self::Sniper => KindProfile {
                speed: 760.0,
                scale: 0.9,
                tint: 0x009a_d0ff,
                effect: None,
            },
            Self::Area => KindProfile {
                speed: 300.0,
                scale: 1.6,
                tint: 0x00ff_a94d,
                effect: None,
            },
            Self::Fire => KindProfile {
                speed: 380.0,
                scale: 1.1,
                tint: 0x00ff_4422,
                effect: Some(EffectSpec::Burn {
                    damage_per_tick: 5.0,
                    ticks: 5,
                }),
            },
            Self::Ice => KindProfile {
                speed: 380.0,
                scale: 1.1,
                tint: 0x0066_ddff,
                effect: Some(EffectSpec::Slow {
                    factor: 0.5,
                    duration_ms: 3_000,
                }),
            },
        }
    }
}

impl fmt::Display for ProjectileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Normal => "normal",
            Self::Rapid => "rapid",
            Self::Power => "power",
            Self::Sniper => "sniper",
            Self::Area => "area",
            Self::Fire => "fire",
            Self::Ice => "ice",
        };
        write!(f, "{name}")
    }
}

// =============================================================================
// ShotSource
// =============================================================================

/// Attribution for a launched shot.
///
/// Kills are credited back to the launching tower. Player shots carry no
/// crediting target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShotSource {
    /// Launched by the tower with the given id.
    Tower(TowerId),
    /// Launched by the player avatar.
    Player,
}

impl ShotSource {
    /// Returns the launching tower id, if any.
    #[must_use]
    pub const fn tower(self) -> Option<TowerId> {
        match self {
            Self::Tower(id) => Some(id),
            Self::Player => None,
        }
    }
}

impl fmt::Display for ShotSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tower(id) => write!(f, "tower {id}"),
            Self::Player => write!(f, "player"),
        }
    }
}

// =============================================================================
// ProjectileFlags
// =============================================================================

bitflags! {
    /// Render and physics state bits for a pooled shot.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ProjectileFlags: u8 {
        /// The slot holds a live shot.
        const ACTIVE = 1 << 0;
        /// The sprite is drawn this frame.
        const VISIBLE = 1 << 1;
        /// The collision body participates in overlap sweeps.
        const BODY_ENABLED = 1 << 2;
    }
}

// =============================================================================
// Projectile
// =============================================================================

/// A pooled shot record.
///
/// Records are owned exclusively by the pool and recycled in place: launch
/// overwrites every field, recycle clears the state bits and the hit count.
///
/// # Piercing
///
/// After each registered hit the stored damage drops to 80% of its previous
/// value, rounded down to a whole point. The damage read for a hit is the
/// value before that hit's reduction, so a shot launched at 40 deals 40,
/// then 32, then 25.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    /// Serial identity of the shot currently occupying this record.
    id: ProjectileId,
    /// Kind tag resolved at launch.
    kind: ProjectileKind,
    /// Who launched the shot.
    source: ShotSource,
    /// Current position in world units.
    pos: Vec2,
    /// Heading in radians.
    heading: f32,
    /// Speed in world units per second.
    speed: f32,
    /// Damage the next hit will apply.
    damage: f32,
    /// Enemies damaged so far by this shot.
    hit_count: u8,
    /// Launch timestamp.
    spawned_at: Millis,
    /// State bits.
    flags: ProjectileFlags,
}

impl Projectile {
    /// Builds a live record aimed from `origin` toward `target`.
    pub(crate) fn launch(
        id: ProjectileId,
        kind: ProjectileKind,
        source: ShotSource,
        origin: Vec2,
        target: Vec2,
        damage: f32,
        now: Millis,
    ) -> Self {
        let delta = target - origin;
        let heading = if delta.length_squared() > 0.0 {
            delta.y.atan2(delta.x)
        } else {
            0.0
        };
        Self {
            id,
            kind,
            source,
            pos: origin,
            heading,
            speed: kind.profile().speed,
            damage,
            hit_count: 0,
            spawned_at: now,
            flags: ProjectileFlags::ACTIVE | ProjectileFlags::VISIBLE | ProjectileFlags::BODY_ENABLED,
        }
    }

    /// Returns the serial id of this shot.
    #[must_use]
    pub const fn id(&self) -> ProjectileId {
        self.id
    }

    /// Returns the kind tag.
    #[must_use]
    pub const fn kind(&self) -> ProjectileKind {
        self.kind
    }

    /// Returns who launched the shot.
    #[must_use]
    pub const fn source(&self) -> ShotSource {
        self.source
    }

    /// Returns the current position.
    #[must_use]
    pub const fn pos(&self) -> Vec2 {
        self.pos
    }

    /// Returns the heading in radians.
    #[must_use]
    pub const fn heading(&self) -> f32 {
        self.heading
    }

    /// Returns the speed in world units per second.
    #[must_use]
    pub const fn speed(&self) -> f32 {
        self.speed
    }

    /// Returns the damage the next hit will apply.
    #[must_use]
    pub const fn damage(&self) -> f32 {
        self.damage
    }

    /// Returns how many enemies this shot has damaged.
    #[must_use]
    pub const fn hit_count(&self) -> u8 {
        self.hit_count
    }

    /// Returns the launch timestamp.
    #[must_use]
    pub const fn spawned_at(&self) -> Millis {
        self.spawned_at
    }

    /// Returns the current state bits.
    #[must_use]
    pub const fn flags(&self) -> ProjectileFlags {
        self.flags
    }

    /// Returns the status effect this shot applies on hit, if any.
    #[must_use]
    pub const fn effect(&self) -> Option<EffectSpec> {
        self.kind.profile().effect
    }

    /// Reports whether the record holds a live shot.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.flags.contains(ProjectileFlags::ACTIVE)
    }

    /// Reports whether the sprite is drawn.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.flags.contains(ProjectileFlags::VISIBLE)
    }

    /// Reports whether the collision body participates in sweeps.
    #[must_use]
    pub fn body_enabled(&self) -> bool {
        self.flags.contains(ProjectileFlags::BODY_ENABLED)
    }

    /// Returns the collision radius, scaled by the kind profile.
    #[must_use]
    pub fn radius(&self) -> f32 {
        BASE_RADIUS * self.kind.profile().scale
    }

    /// Returns the current velocity vector.
    #[must_use]
    pub fn velocity(&self) -> Vec2 {
        Vec2::from_angle(self.heading) * self.speed
    }

    /// Builds the collision body for this shot.
    #[must_use]
    pub fn body(&self) -> Body {
        Body {
            kind: BodyKind::Projectile,
            pos: self.pos,
            radius: self.radius(),
            enabled: self.body_enabled(),
        }
    }

    /// Returns milliseconds since launch.
    #[must_use]
    pub fn age_ms(&self, now: Millis) -> u64 {
        now.since(self.spawned_at)
    }

    /// Moves the shot along its heading for `dt_secs` seconds.
    pub(crate) fn integrate(&mut self, dt_secs: f32) {
        self.pos += self.velocity() * dt_secs;
    }

    /// Records one enemy damaged and applies the damage falloff.
    ///
    /// Returns true when the piercing budget is spent and the shot should
    /// be recycled. The hit count never exceeds the kind's maximum.
    pub(crate) fn register_hit(&mut self) -> bool {
        if self.hit_count < self.kind.max_hits() {
            self.hit_count += 1;
        }
        self.damage = (self.damage * DAMAGE_FALLOFF).floor();
        self.hit_count >= self.kind.max_hits()
    }

    /// Clears the state bits and the hit count, leaving the record ready
    /// for reuse.
    pub(crate) fn deactivate(&mut self) {
        self.flags = ProjectileFlags::empty();
        self.hit_count = 0;
    }

    /// Toggles collision body participation.
    pub(crate) fn set_body_enabled(&mut self, enabled: bool) {
        self.flags.set(ProjectileFlags::BODY_ENABLED, enabled);
    }
}
