//! Engine tuning knobs and validation.
//!
//! Every gameplay constant the combat engine consumes lives in one struct so
//! hosts can load balance overrides from data files. Defaults match the
//! shipped balance. A [`Tuning`] is validated once, when it is handed to the
//! engine; after that the engine treats every field as trusted.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Tuning
// =============================================================================

/// Tunable constants consumed by the combat engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tuning {
    /// Fixed projectile pool capacity. The pool never grows past this.
    pub pool_capacity: usize,
    /// Shots older than this are reclaimed.
    pub projectile_lifetime_ms: u64,
    /// Lower-left corner of the playfield.
    pub bounds_min: Vec2,
    /// Upper-right corner of the playfield.
    pub bounds_max: Vec2,
    /// Extra margin outside the playfield before a shot counts as lost.
    pub bounds_padding: f32,
    /// Minimum spacing between contact damage applications, per enemy and
    /// per structure class.
    pub contact_interval_ms: u64,
    /// Damage dealt to the base per allowed contact.
    pub base_contact_damage: f32,
    /// Damage dealt to a tower per allowed contact.
    pub tower_contact_damage: f32,
    /// Damage dealt to the player on first contact with a given enemy.
    pub player_contact_damage: f32,
    /// Knockback impulse magnitude applied to the player on enemy contact.
    pub knockback_strength: f32,
    /// Debounce window for coalescing rebuild requests.
    pub rebuild_debounce_ms: u64,
    /// Delay before an emergency rebuild fires once scheduled.
    pub emergency_rebuild_delay_ms: u64,
    /// Spacing of the periodic collision health check.
    pub health_check_interval_ms: u64,
    /// Per-frame probability of an extra randomized health check.
    pub health_sample_chance: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            pool_capacity: 64,
            projectile_lifetime_ms: 10_000,
            bounds_min: Vec2::ZERO,
            bounds_max: Vec2::new(1280.0, 720.0),
            bounds_padding: 64.0,
            contact_interval_ms: 1_000,
            base_contact_damage: 5.0,
            tower_contact_damage: 5.0,
            player_contact_damage: 25.0,
            knockback_strength: 300.0,
            rebuild_debounce_ms: 150,
            emergency_rebuild_delay_ms: 250,
            health_check_interval_ms: 2_000,
            health_sample_chance: 0.01,
        }
    }
}

impl Tuning {
    /// Checks every field for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns a [`TuningError`] describing the first rejected field.
    pub fn validate(&self) -> Result<(), TuningError> {
        if self.pool_capacity == 0 {
            return Err(TuningError::ZeroPoolCapacity);
        }
        if self.bounds_min.x >= self.bounds_max.x || self.bounds_min.y >= self.bounds_max.y {
            return Err(TuningError::InvertedBounds {
                min: self.bounds_min,
                max: self.bounds_max,
            });
        }
        if !self.bounds_padding.is_finite() || self.bounds_padding < 0.0 {
            return Err(TuningError::NegativePadding(self.bounds_padding));
        }
        let magnitudes = [
            ("base_contact_damage", self.base_contact_damage),
            ("tower_contact_damage", self.tower_contact_damage),
            ("player_contact_damage", self.player_contact_damage),
            ("knockback_strength", self.knockback_strength),
        ];
        for (field, value) in magnitudes {
            if !value.is_finite() || value < 0.0 {
                return Err(TuningError::InvalidMagnitude { field, value });
            }
        }
        if self.health_check_interval_ms == 0 {
            return Err(TuningError::ZeroHealthCheckInterval);
        }
        if !(0.0..=1.0).contains(&self.health_sample_chance) {
            return Err(TuningError::SampleChanceOutOfRange(
                self.health_sample_chance,
            ));
        }
        Ok(())
    }
}

// =============================================================================
// TuningError
// =============================================================================

/// A rejected tuning configuration.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum TuningError {
    /// The projectile pool must hold at least one slot.
    #[error("projectile pool capacity must be at least 1")]
    ZeroPoolCapacity,
    /// Playfield corners are swapped or degenerate.
    #[error("playfield bounds are degenerate: min {min}, max {max}")]
    InvertedBounds {
        /// Configured lower-left corner.
        min: Vec2,
        /// Configured upper-right corner.
        max: Vec2,
    },
    /// Bounds padding must be finite and non-negative.
    #[error("bounds padding must be finite and non-negative, got {0}")]
    NegativePadding(f32),
    /// A damage or impulse field is negative or non-finite.
    #[error("{field} must be finite and non-negative, got {value}")]
    InvalidMagnitude {
        /// Name of the rejected field.
        field: &'static str,
        /// The rejected value.
        value: f32,
    },
    /// The periodic health check needs a nonzero cadence.
    #[error("health check interval must be at least 1ms")]
    ZeroHealthCheckInterval,
    /// Sampling probability must lie in `[0, 1]`.
    #[error("health sample chance must lie in [0, 1], got {0}")]
    SampleChanceOutOfRange(f64),
}
