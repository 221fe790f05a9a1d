//! Simulation clock and millisecond timestamps.
//!
//! Combat logic is driven entirely by timestamps derived from accumulated
//! frame deltas, never from wall-clock reads. The host advances the clock
//! once per frame with the same delta it hands to the physics step, so every
//! rate limit and expiry in the engine replays identically for identical
//! input sequences.
//!
//! # Precision
//!
//! [`SimClock`] accumulates the raw [`Duration`] internally and only rounds
//! down to whole milliseconds when read. Sub-millisecond deltas therefore
//! carry across frames instead of being dropped.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// =============================================================================
// Millis
// =============================================================================

/// A point on the simulation timeline, in whole milliseconds.
///
/// `Millis` values are produced by [`SimClock::now`] and threaded through the
/// combat engine for contact rate limits, burn tick spacing, slow expiry, and
/// rebuild deadlines. They are ordinary ordered integers: two timestamps can
/// be compared directly, and [`Millis::since`] measures the span between them.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Millis(u64);

impl Millis {
    /// The start of the simulation timeline.
    pub const ZERO: Self = Self(0);

    /// Creates a timestamp from a raw millisecond count.
    #[must_use]
    pub const fn new(ms: u64) -> Self {
        Self(ms)
    }

    /// Returns the raw millisecond count.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns this timestamp advanced by `ms` milliseconds.
    #[must_use]
    pub const fn after(self, ms: u64) -> Self {
        Self(self.0.saturating_add(ms))
    }

    /// Returns the milliseconds elapsed from `earlier` to this timestamp.
    ///
    /// Saturates to zero if `earlier` is actually later, so callers never
    /// have to worry about argument order producing a wild span.
    #[must_use]
    pub const fn since(self, earlier: Self) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Debug for Millis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Millis({})", self.0)
    }
}

impl fmt::Display for Millis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

impl From<u64> for Millis {
    fn from(ms: u64) -> Self {
        Self(ms)
    }
}

impl From<Millis> for u64 {
    fn from(ms: Millis) -> Self {
        ms.0
    }
}

impl From<Duration> for Millis {
    fn from(duration: Duration) -> Self {
        Self(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }
}

// =============================================================================
// SimClock
// =============================================================================

/// Frame-accumulated simulation clock.
///
/// The clock never reads the system time. It starts at zero when the engine
/// is created and moves only through [`SimClock::advance`].
///
/// # Example
///
/// ```
/// use palisade_combat::clock::SimClock;
/// use std::time::Duration;
///
/// let mut clock = SimClock::new();
/// clock.advance(Duration::from_millis(16));
/// clock.advance(Duration::from_millis(16));
/// assert_eq!(clock.now().as_u64(), 32);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimClock {
    /// Exact accumulated time since construction.
    elapsed: Duration,
}

impl SimClock {
    /// Creates a clock at timestamp zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            elapsed: Duration::ZERO,
        }
    }

    /// Advances the clock by one frame delta.
    pub fn advance(&mut self, dt: Duration) {
        self.elapsed = self.elapsed.saturating_add(dt);
    }

    /// Returns the current timestamp, rounded down to whole milliseconds.
    #[must_use]
    pub fn now(&self) -> Millis {
        Millis::from(self.elapsed)
    }

    /// Returns the exact accumulated time, including sub-millisecond carry.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }
}
