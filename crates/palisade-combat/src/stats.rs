//! Diagnostic counters exposed by the combat engine.

use serde::{Deserialize, Serialize};

/// Running totals maintained by the combat engine.
///
/// These counters feed logs, HUD overlays, and tests. They never feed back
/// into combat decisions, so a stale read is harmless. `active_projectiles`
/// is a gauge refreshed every frame; the remaining fields are monotonic over
/// the life of the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatStats {
    /// Shots currently live in the pool.
    pub active_projectiles: u32,
    /// Total shots launched since the engine was created.
    pub projectiles_created: u64,
    /// Total projectile-on-enemy hits resolved.
    pub enemies_hit: u64,
    /// Total collision watcher rebuilds, including the one at startup.
    pub collider_refreshes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_all_zero() {
        let stats = CombatStats::default();
        assert_eq!(stats.active_projectiles, 0);
        assert_eq!(stats.projectiles_created, 0);
        assert_eq!(stats.enemies_hit, 0);
        assert_eq!(stats.collider_refreshes, 0);
    }

    #[test]
    fn copy_semantics() {
        let mut stats = CombatStats::default();
        let snapshot = stats;
        stats.enemies_hit += 1;
        assert_eq!(snapshot.enemies_hit, 0);
        assert_eq!(stats.enemies_hit, 1);
    }

    #[test]
    fn serialization_roundtrip() {
        let stats = CombatStats {
            active_projectiles: 3,
            projectiles_created: 120,
            enemies_hit: 87,
            collider_refreshes: 4,
        };
        let json = serde_json::to_string(&stats).unwrap();
        let back: CombatStats = serde_json::from_str(&json).unwrap();
        assert_eq!(stats, back);
    }
}
