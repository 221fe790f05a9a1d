//! Test helper functions for building worlds and stepping engines.
//!
//! This module provides factory functions and setup utilities that make
//! writing combat tests more ergonomic and consistent.

use std::time::Duration;

use glam::Vec2;

use crate::engine::CombatEngine;
use crate::world::{EnemyId, World};

// =============================================================================
// World Factories
// =============================================================================

/// Creates an empty world with only the base and the player.
///
/// # Returns
///
/// A world with no enemies and no towers.
pub fn test_world() -> World {
    World::new()
}

/// Spawns `count` enemies in a horizontal line.
///
/// Enemies are placed at `start`, `start + spacing`, and so on along the
/// x axis, all with the same hit points.
///
/// # Arguments
///
/// * `count` - How many enemies to spawn
/// * `start` - Position of the first enemy
/// * `spacing` - Distance between neighbors along x
/// * `hp` - Hit points for every enemy
///
/// # Returns
///
/// The world and the spawned ids in spawn order.
pub fn world_with_enemy_line(
    count: usize,
    start: Vec2,
    spacing: f32,
    hp: f32,
) -> (World, Vec<EnemyId>) {
    let mut world = World::new();
    let mut ids = Vec::new();
    for i in 0..count {
        #[allow(clippy::cast_precision_loss)]
        let offset = Vec2::new(spacing * i as f32, 0.0);
        ids.push(world.spawn_enemy(start + offset, hp));
    }
    (world, ids)
}

// =============================================================================
// Engine Setup
// =============================================================================

/// Creates an engine over `world` with default tuning.
///
/// # Arguments
///
/// * `seed` - Seed for the engine's health-check lottery
/// * `world` - The world the initial watcher set is built for
///
/// # Returns
///
/// A ready engine with its startup rebuild already counted.
pub fn engine_with(seed: u64, world: &World) -> CombatEngine {
    CombatEngine::new(seed, world)
}

/// Ticks the engine for a number of fixed-delta frames.
///
/// Finalizes world removals after every frame, the way a host would.
///
/// # Arguments
///
/// * `engine` - The engine to advance
/// * `world` - The world the host owns
/// * `frames` - How many frames to run
/// * `dt_ms` - Frame delta in milliseconds
pub fn step(engine: &mut CombatEngine, world: &mut World, frames: u32, dt_ms: u64) {
    for _ in 0..frames {
        engine.tick(world, Duration::from_millis(dt_ms));
        world.finalize_removals();
    }
}

// =============================================================================
// State Query Functions
// =============================================================================

/// Gets the hit points of an enemy.
///
/// Returns 0.0 if the enemy no longer exists.
///
/// # Arguments
///
/// * `world` - The world containing the enemy
/// * `id` - The enemy to query
///
/// # Returns
///
/// The current hit points of the enemy.
pub fn enemy_hp(world: &World, id: EnemyId) -> f32 {
    world.enemy(id).map_or(0.0, |enemy| enemy.hp())
}

// =============================================================================
// Tests for helpers
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enemy_line_spaces_evenly() {
        let (world, ids) = world_with_enemy_line(3, Vec2::new(100.0, 300.0), 50.0, 40.0);
        assert_eq!(ids.len(), 3);
        assert_eq!(world.enemy_count(), 3);
        let positions: Vec<Vec2> = ids
            .iter()
            .map(|id| world.enemy(*id).unwrap().pos())
            .collect();
        assert_eq!(positions[0], Vec2::new(100.0, 300.0));
        assert_eq!(positions[1], Vec2::new(150.0, 300.0));
        assert_eq!(positions[2], Vec2::new(200.0, 300.0));
    }

    #[test]
    fn step_advances_the_clock_and_finalizes() {
        let (mut world, ids) = world_with_enemy_line(1, Vec2::new(100.0, 300.0), 0.0, 40.0);
        let mut engine = engine_with(1, &world);
        world.remove_enemy(ids[0]);
        step(&mut engine, &mut world, 5, 16);
        assert_eq!(engine.now().as_u64(), 80);
        assert_eq!(world.enemy_count(), 0);
    }

    #[test]
    fn enemy_hp_reports_zero_for_missing_enemies() {
        let world = test_world();
        assert_eq!(enemy_hp(&world, EnemyId::new(5)), 0.0);
    }
}
