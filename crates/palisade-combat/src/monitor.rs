//! Watcher health monitoring and rebuild debouncing.
//!
//! # Debouncing
//!
//! Rebuilding the watcher set is cheap but not free, and the triggers for
//! it arrive in bursts: an area shot killing five enemies files five
//! requests in one frame. The [`RebuildScheduler`] coalesces a burst into
//! one deadline. The first request arms the scheduler; later requests
//! while armed are absorbed, so the rebuild lands one debounce window
//! after the first trigger no matter how many followed.
//!
//! # Emergency Path
//!
//! A separate, shorter deadline covers the one state that actively loses
//! gameplay while it persists: live shots flying through enemies with no
//! watcher pairing them. It shares the scheduler so that whichever
//! deadline expires first triggers the one rebuild that satisfies both.
//!
//! # Sampling
//!
//! Besides the fixed cadence, the [`HealthMonitor`] draws from a seeded
//! generator to health-check a small fraction of ordinary frames. That
//! catches registry corruption between interval checks without making any
//! frame's cost depend on wall-clock randomness.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::clock::Millis;

// =============================================================================
// RebuildScheduler
// =============================================================================

/// Debounced one-shot rebuild timer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebuildScheduler {
    /// Deadline set by ordinary rebuild requests.
    pending: Option<Millis>,
    /// Deadline set by the emergency path.
    emergency: Option<Millis>,
}

impl RebuildScheduler {
    /// Creates an unarmed scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Files a rebuild request.
    ///
    /// Arms a deadline one debounce window from `now`. Requests that
    /// arrive while armed keep the original deadline, so a burst of
    /// removals produces exactly one rebuild.
    pub fn request(&mut self, now: Millis, window_ms: u64) {
        if self.pending.is_none() {
            self.pending = Some(now.after(window_ms));
            trace!(deadline = %now.after(window_ms), "rebuild scheduled");
        }
    }

    /// Files an emergency rebuild on a shorter deadline.
    ///
    /// Like [`request`](Self::request), repeated calls while armed keep
    /// the first deadline.
    pub fn schedule_emergency(&mut self, now: Millis, delay_ms: u64) {
        if self.emergency.is_none() {
            self.emergency = Some(now.after(delay_ms));
            trace!(deadline = %now.after(delay_ms), "emergency rebuild scheduled");
        }
    }

    /// True when a rebuild is due.
    ///
    /// A due scheduler disarms both deadlines; the rebuild the caller is
    /// about to perform satisfies every request that armed them.
    pub fn poll(&mut self, now: Millis) -> bool {
        let due = self.pending.is_some_and(|at| at <= now)
            || self.emergency.is_some_and(|at| at <= now);
        if due {
            self.pending = None;
            self.emergency = None;
        }
        due
    }

    /// Drops both deadlines without rebuilding.
    pub fn disarm(&mut self) {
        self.pending = None;
        self.emergency = None;
    }

    /// Returns the ordinary deadline, if armed.
    #[must_use]
    pub const fn pending_deadline(&self) -> Option<Millis> {
        self.pending
    }

    /// Returns the emergency deadline, if armed.
    #[must_use]
    pub const fn emergency_deadline(&self) -> Option<Millis> {
        self.emergency
    }

    /// True when either deadline is armed.
    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.pending.is_some() || self.emergency.is_some()
    }
}

// =============================================================================
// HealthMonitor
// =============================================================================

/// Decides when the registry gets health-checked and when it gets rebuilt.
///
/// Holds the debounce scheduler, the fixed health-check cadence, and a
/// seeded generator for spot checks. Not serialized; a restored engine
/// starts with a fresh monitor and re-arms from live state.
#[derive(Debug, Clone)]
pub struct HealthMonitor {
    scheduler: RebuildScheduler,
    next_interval_check: Millis,
    rng: ChaCha8Rng,
}

impl HealthMonitor {
    /// Creates a monitor whose first scheduled health check lands one
    /// interval from time zero.
    #[must_use]
    pub fn new(seed: u64, interval_ms: u64) -> Self {
        Self {
            scheduler: RebuildScheduler::new(),
            next_interval_check: Millis::new(interval_ms),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// True when the fixed health-check cadence has come due.
    ///
    /// Fires at most once per call regardless of how much time passed;
    /// the next deadline is advanced past `now` so a long stall yields a
    /// single catch-up check instead of a flurry.
    pub fn interval_elapsed(&mut self, now: Millis, interval_ms: u64) -> bool {
        if now < self.next_interval_check {
            return false;
        }
        let step = interval_ms.max(1);
        while self.next_interval_check <= now {
            self.next_interval_check = self.next_interval_check.after(step);
        }
        true
    }

    /// Draws the spot-check lottery for this frame.
    pub fn sample(&mut self, chance: f64) -> bool {
        chance > 0.0 && self.rng.gen_bool(chance.min(1.0))
    }

    /// Files a debounced rebuild request.
    pub fn request_rebuild(&mut self, now: Millis, window_ms: u64) {
        self.scheduler.request(now, window_ms);
    }

    /// Files an emergency rebuild.
    pub fn schedule_emergency(&mut self, now: Millis, delay_ms: u64) {
        self.scheduler.schedule_emergency(now, delay_ms);
    }

    /// True when a scheduled rebuild is due; disarms on true.
    pub fn poll_rebuild(&mut self, now: Millis) -> bool {
        self.scheduler.poll(now)
    }

    /// Drops any armed rebuild deadlines.
    pub fn disarm(&mut self) {
        self.scheduler.disarm();
    }

    /// Returns the underlying scheduler.
    #[must_use]
    pub const fn scheduler(&self) -> &RebuildScheduler {
        &self.scheduler
    }
}
