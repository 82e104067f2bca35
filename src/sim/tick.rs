//! Fixed timestep simulation tick
//!
//! One call advances the whole session deterministically: movement, spawn
//! scheduling, ability state machines, collision resolution, off-screen
//! culling and the removal sweep, in that order.

use glam::Vec2;

use super::ability::{self, AbilityState};
use super::state::{Removal, World};
use crate::consts::*;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Desired movement direction; normalized before use
    pub move_dir: Vec2,
    /// Pause toggle
    pub pause: bool,
    /// Restart the session from scratch
    pub restart: bool,
}

/// Advance the session by one fixed timestep
pub fn tick(world: &mut World, input: &TickInput, dt: f32) {
    if input.restart {
        world.reset();
        return;
    }

    if input.pause && !world.progression.is_game_over() {
        let paused = world.progression.is_paused();
        world.progression.set_paused(!paused);
    }

    // Frozen states: timers, spawns and partial accumulators all hold
    if world.progression.is_paused() || world.progression.is_game_over() {
        return;
    }

    world.time_ticks += 1;
    world.progression.accrue_time(dt);

    // Player movement, clamped to the field
    let dir = input.move_dir.normalize_or_zero();
    world.player.vel = dir * PLAYER_SPEED * world.progression.speed_multiplier();
    if dir != Vec2::ZERO {
        world.player.facing = dir;
    }
    let bounds = world.bounds();
    let pos = world.player.pos + world.player.vel * dt;
    world.player.pos = pos.clamp(
        bounds.min + Vec2::splat(PLAYER_RADIUS),
        bounds.max - Vec2::splat(PLAYER_RADIUS),
    );

    world.advance_spawns(dt);

    // Ability state machines; spawns/removals buffered until the pass ends
    let mut cmds = Vec::new();
    ability::tick_items(world, dt, &mut cmds);
    ability::apply_commands(world, cmds);

    // Integrate motion
    for e in &mut world.enemies {
        if !e.removed {
            e.pos += e.vel * dt;
        }
    }
    for i in &mut world.items {
        if !i.is_removed() {
            i.pos += i.vel * dt;
        }
    }

    resolve_collisions(world);
    cull_offscreen(world);

    world.advance_removals(dt);
    world.purge_removed();
}

fn resolve_collisions(world: &mut World) {
    let player_pos = world.player.pos;

    // Enemy contact ends the run
    let hit_radius = ENEMY_RADIUS + PLAYER_RADIUS;
    if world
        .enemies
        .iter()
        .any(|e| !e.removed && e.pos.distance_squared(player_pos) <= hit_radius * hit_radius)
    {
        world.progression.game_over();
        return;
    }

    // The player picks up armed items by touch
    let picked: Vec<u32> = world
        .items
        .iter()
        .filter(|i| {
            let r = i.radius() + PLAYER_RADIUS;
            i.is_armed() && i.pos.distance_squared(player_pos) <= r * r
        })
        .map(|i| i.id)
        .collect();
    for id in picked {
        ability::activate(world, id);
    }

    // Activated items damage overlapping enemies. Removal on first contact
    // is the debounce: a dead enemy is never awarded twice.
    let mut kills: Vec<u32> = Vec::new();
    let mut homing_hits: Vec<u32> = Vec::new();
    for item in world.items.iter().filter(|i| i.activated && !i.is_removed()) {
        let r = item.radius() + ENEMY_RADIUS;
        for e in world.enemies.iter().filter(|e| !e.removed) {
            if e.pos.distance_squared(item.pos) <= r * r {
                kills.push(e.id);
                if matches!(item.ability, AbilityState::Homing { frozen: false, .. }) {
                    homing_hits.push(item.id);
                }
            }
        }
    }
    for id in homing_hits {
        ability::homing_contact(world, id);
    }
    kills.sort_unstable();
    kills.dedup();
    for id in kills {
        world.progression.add_score(KILL_SCORE);
        world.progression.add_exp(KILL_EXP);
        world.despawn_enemy(id);
    }
}

/// Drop entities that left the field plus a margin. Enemies and released
/// shields go instantly; everything else gets the shrink wind-down.
fn cull_offscreen(world: &mut World) {
    let cull = world.bounds().expand(OFFSCREEN_MARGIN);

    let gone: Vec<u32> = world
        .enemies
        .iter()
        .filter(|e| !e.removed && !cull.contains(e.pos))
        .map(|e| e.id)
        .collect();
    for id in gone {
        world.despawn_enemy(id);
    }

    let mut gone: Vec<(u32, bool)> = Vec::new();
    for i in &world.items {
        if i.is_removed() || cull.contains(i.pos) {
            continue;
        }
        // armed items are still wall-contained early on
        if i.is_armed() && i.age < ITEM_CONTAIN_SECS {
            continue;
        }
        if !matches!(i.removal, Removal::None) {
            continue;
        }
        let instant = matches!(i.ability, AbilityState::Shield { fired: true, .. });
        gone.push((i.id, instant));
    }
    for (id, instant) in gone {
        world.despawn_item(id, 0.0, instant);
    }
}
