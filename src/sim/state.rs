//! World state and entity registry
//!
//! [`World`] is the single per-session context object: it owns the live
//! enemy/item sets, the player, the progression model, the item catalog, the
//! spawn scheduler state and the seeded RNG. Components never hold entity
//! references across ticks; everything goes through id-based registry
//! operations, and a stale id is always a benign no-op.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::ability::AbilityState;
use super::catalog::{BehaviorKind, Catalog};
use super::progression::Progression;
use super::scheduler::SpawnScheduler;
use crate::consts::*;
use crate::{deg_to_rad, rotate_vec};

/// Axis-aligned playfield rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn from_half_extents(half_width: f32, half_height: f32) -> Self {
        Self {
            min: Vec2::new(-half_width, -half_height),
            max: Vec2::new(half_width, half_height),
        }
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Rectangle grown outward by `margin` on all sides
    pub fn expand(&self, margin: f32) -> Self {
        Self {
            min: self.min - Vec2::splat(margin),
            max: self.max + Vec2::splat(margin),
        }
    }
}

/// The player entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Last non-zero movement direction; abilities fire along this
    pub facing: Vec2,
}

impl Player {
    fn at_start(bounds: &Rect) -> Self {
        Self {
            pos: Vec2::new(bounds.center().x, bounds.min.y * PLAYER_START_Y_FRAC),
            vel: Vec2::ZERO,
            facing: Vec2::Y,
        }
    }

    pub fn speed(&self) -> f32 {
        self.vel.length()
    }
}

/// A live enemy instance, owned by the registry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub removed: bool,
}

/// Item removal lifecycle. `Removed` is set exactly once; the sweep at the
/// end of the tick drops marked instances.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Removal {
    None,
    /// Scheduled removal; winds down after the delay elapses
    Delayed { remaining: f32 },
    /// Shrink-to-zero wind-down before leaving the live set
    Shrinking { elapsed: f32, from_scale: f32 },
    Removed,
}

/// A live item instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: u32,
    pub def_id: i32,
    pub kind: BehaviorKind,
    /// Snapshot of the definition's invested stat at spawn time; later
    /// stat-ups affect only future spawns
    pub invested: i32,
    /// Draw order applied on activation
    pub sort_order: i32,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Visual rotation (radians); gameplay-neutral
    pub rotation: f32,
    pub scale: f32,
    pub activated: bool,
    /// Fan-out origins are invisible and dispatch the visible clones
    pub is_origin: bool,
    /// Seconds since spawn; armed items are wall-contained early on
    pub age: f32,
    pub removal: Removal,
    pub ability: AbilityState,
}

impl Item {
    pub fn radius(&self) -> f32 {
        ITEM_RADIUS * self.scale
    }

    pub fn is_removed(&self) -> bool {
        matches!(self.removal, Removal::Removed)
    }

    /// Still armed: spawned but not yet picked up
    pub fn is_armed(&self) -> bool {
        !self.activated && !self.is_removed()
    }
}

/// Complete session state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    /// Session seed for reproducibility
    pub seed: u64,
    rng: Pcg32,
    bounds: Rect,
    pub progression: Progression,
    pub catalog: Catalog,
    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub items: Vec<Item>,
    pub scheduler: SpawnScheduler,
    /// Spawn loop enable flag; stopping only cancels future spawns
    pub spawning: bool,
    pub time_ticks: u64,
    next_id: u32,
}

impl World {
    pub fn new(seed: u64, catalog: Catalog) -> Self {
        let bounds = Rect::from_half_extents(FIELD_HALF_WIDTH, FIELD_HALF_HEIGHT);
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            bounds,
            progression: Progression::new(),
            catalog,
            player: Player::at_start(&bounds),
            enemies: Vec::new(),
            items: Vec::new(),
            scheduler: SpawnScheduler::new(),
            spawning: true,
            time_ticks: 0,
            next_id: 1,
        }
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Enable or disable the spawn loop; safe to stop when already stopped
    pub fn toggle_spawn(&mut self, on: bool) {
        self.spawning = on;
    }

    /// Session restart: fresh progression, empty live sets, base delays,
    /// zeroed stat investment, re-seeded RNG
    pub fn reset(&mut self) {
        log::info!("session reset (seed {})", self.seed);
        self.progression.reset();
        self.catalog.reset_stats();
        self.enemies.clear();
        self.items.clear();
        self.scheduler.reset();
        self.player = Player::at_start(&self.bounds);
        self.rng = Pcg32::seed_from_u64(self.seed);
        self.spawning = true;
        self.time_ticks = 0;
    }

    // ---- enemies ----

    /// Enemy density target as a banded function of score: band one is 100
    /// wide, and each band past the first decade is 10x wider than the last.
    /// Non-decreasing in score; `calc_enemy_count(0) == 1`.
    pub fn calc_enemy_count(score: i32) -> i32 {
        let mut count = 1;
        let mut scale = 100i32;
        let mut start = 0i32;

        loop {
            let end_wide = scale as i64 * 10;
            let end = if end_wide > i32::MAX as i64 {
                i32::MAX
            } else {
                end_wide as i32
            };

            let clamped = score.min(end);
            let segment = clamped - start;
            if segment > 0 {
                count += segment / scale;
            }

            if score <= end || end == i32::MAX {
                break;
            }

            start = end;
            scale = scale.saturating_mul(10);
        }

        count
    }

    /// Materialize an enemy at `pos` or a sampled edge position. Its velocity
    /// is fixed at spawn: toward the active Clone if one exists, else toward
    /// the player.
    pub fn spawn_enemy(&mut self, pos: Option<Vec2>) -> u32 {
        let pos = pos.unwrap_or_else(|| self.sample_enemy_pos());
        let target = self
            .active_clone()
            .and_then(|id| self.item(id).map(|i| i.pos))
            .unwrap_or(self.player.pos);
        let dir = (target - pos).normalize_or(Vec2::NEG_Y);

        let id = self.next_entity_id();
        self.enemies.push(Enemy {
            id,
            pos,
            vel: dir * ENEMY_SPEED,
            removed: false,
        });
        id
    }

    /// Mark an enemy removed; idempotent on stale or repeated ids
    pub fn despawn_enemy(&mut self, id: u32) {
        if let Some(e) = self.enemies.iter_mut().find(|e| e.id == id && !e.removed) {
            e.removed = true;
        }
    }

    pub fn enemy(&self, id: u32) -> Option<&Enemy> {
        self.enemies.iter().find(|e| e.id == id && !e.removed)
    }

    /// Live enemy nearest to `pos`
    pub fn enemy_closest(&self, pos: Vec2) -> Option<u32> {
        self.enemies
            .iter()
            .filter(|e| !e.removed)
            .min_by(|a, b| {
                let da = a.pos.distance_squared(pos);
                let db = b.pos.distance_squared(pos);
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|e| e.id)
    }

    /// 1-based live enemy lookup, clamped into range; None when empty
    pub fn enemy_by_index(&self, index: i32) -> Option<u32> {
        let live: Vec<&Enemy> = self.enemies.iter().filter(|e| !e.removed).collect();
        if live.is_empty() {
            return None;
        }
        let idx = index.clamp(1, live.len() as i32) as usize - 1;
        Some(live[idx].id)
    }

    pub fn live_enemy_count(&self) -> usize {
        self.enemies.iter().filter(|e| !e.removed).count()
    }

    // ---- items ----

    /// Spawn an item instance. `def_id == 0` reservoir-samples a definition
    /// eligible at the current level; returns None when nothing is eligible
    /// or the id is unknown.
    pub fn spawn_item(&mut self, def_id: i32, pos: Option<Vec2>) -> Option<u32> {
        let def_id = if def_id == 0 {
            let level = self.progression.level();
            self.catalog.pick_random(level, &mut self.rng)?
        } else {
            def_id
        };

        let Some(def) = self.catalog.get(def_id) else {
            log::warn!("spawn_item: unknown definition id {def_id}");
            return None;
        };
        let (kind, invested, sort_order) = (def.kind, def.invested, def.sort_order);

        let pos = pos.unwrap_or_else(|| self.sample_item_pos());

        // Armed items drift toward the field center with a little jitter
        let jitter = deg_to_rad(
            self.rng
                .random_range(-ITEM_DRIFT_JITTER_DEG..ITEM_DRIFT_JITTER_DEG),
        );
        let drift = rotate_vec((self.bounds.center() - pos).normalize_or(Vec2::Y), jitter);

        let id = self.next_entity_id();
        self.items.push(Item {
            id,
            def_id,
            kind,
            invested,
            sort_order,
            pos,
            vel: drift * ITEM_DRIFT_SPEED,
            rotation: 0.0,
            scale: 1.0,
            activated: false,
            is_origin: kind.fans_out(),
            age: 0.0,
            removal: Removal::None,
            ability: AbilityState::new(kind),
        });
        Some(id)
    }

    /// Remove an item: instantly, after a delay, or (default) through the
    /// shrink wind-down. Idempotent on stale ids; an instance already past
    /// the `Removed` mark is never touched again.
    pub fn despawn_item(&mut self, id: u32, delay: f32, instant: bool) {
        let Some(item) = self.items.iter_mut().find(|i| i.id == id) else {
            return;
        };
        if item.is_removed() {
            return;
        }
        if instant {
            item.removal = Removal::Removed;
        } else if delay > 0.0 {
            item.removal = Removal::Delayed { remaining: delay };
        } else {
            item.removal = Removal::Shrinking {
                elapsed: 0.0,
                from_scale: item.scale,
            };
        }
    }

    pub fn item(&self, id: u32) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id && !i.is_removed())
    }

    pub fn item_mut(&mut self, id: u32) -> Option<&mut Item> {
        self.items.iter_mut().find(|i| i.id == id && !i.is_removed())
    }

    /// First live, activated Clone-kind instance (external targeting UI and
    /// enemy seeking both use this)
    pub fn active_clone(&self) -> Option<u32> {
        self.items
            .iter()
            .find(|i| i.kind == BehaviorKind::Clone && i.activated && !i.is_removed())
            .map(|i| i.id)
    }

    pub fn live_item_count(&self) -> usize {
        self.items.iter().filter(|i| !i.is_removed()).count()
    }

    /// Remove everything immediately and compact both live sets
    pub fn despawn_all(&mut self) {
        for e in &mut self.enemies {
            if !e.removed {
                e.removed = true;
            }
        }
        let ids: Vec<u32> = self.items.iter().map(|i| i.id).collect();
        for id in ids {
            self.despawn_item(id, 0.0, true);
        }
        self.purge_removed();
    }

    /// Advance delayed/shrinking removals by `dt`
    pub(crate) fn advance_removals(&mut self, dt: f32) {
        for item in &mut self.items {
            match item.removal {
                Removal::Delayed { remaining } => {
                    let remaining = remaining - dt;
                    if remaining <= 0.0 {
                        item.removal = Removal::Shrinking {
                            elapsed: 0.0,
                            from_scale: item.scale,
                        };
                    } else {
                        item.removal = Removal::Delayed { remaining };
                    }
                }
                Removal::Shrinking { elapsed, from_scale } => {
                    let elapsed = elapsed + dt;
                    if elapsed >= ITEM_SHRINK_SECS {
                        item.removal = Removal::Removed;
                    } else {
                        item.scale = from_scale * (1.0 - elapsed / ITEM_SHRINK_SECS);
                        item.removal = Removal::Shrinking { elapsed, from_scale };
                    }
                }
                Removal::None | Removal::Removed => {}
            }
        }
    }

    /// Drop instances marked removed this tick
    pub(crate) fn purge_removed(&mut self) {
        self.enemies.retain(|e| !e.removed);
        self.items.retain(|i| !i.is_removed());
    }

    /// Spend one stat point on a definition, gated on unlock level, point
    /// availability and the stat cap. No-op (false) when any gate fails.
    pub fn stat_up(&mut self, def_id: i32) -> bool {
        let Some(def) = self.catalog.get(def_id) else {
            return false;
        };
        if def.unlock_level > self.progression.level() {
            return false;
        }
        if def.max_stat > 0 && def.invested >= def.max_stat {
            return false;
        }
        if !self.progression.spend_point() {
            return false;
        }
        self.catalog.invest(def_id)
    }

    // ---- spawn position sampling ----

    /// Enemies enter from {top, left, right}, never below, and the side
    /// draws are biased to the upper half so they arrive above the player
    fn sample_enemy_pos(&mut self) -> Vec2 {
        let r = self.bounds;
        let edge = self.rng.random_range(0..3u32);
        let x = self.rng.random_range(r.min.x..r.max.x);
        let y = self.rng.random_range(r.center().y..r.max.y);

        match edge {
            0 => Vec2::new(x, r.max.y),
            1 => Vec2::new(r.min.x, y),
            _ => Vec2::new(r.max.x, y),
        }
    }

    /// Items enter from any edge, inset so they never sit exactly on the
    /// boundary, one unit inward from the chosen edge
    fn sample_item_pos(&mut self) -> Vec2 {
        let r = self.bounds;
        let p = ITEM_SPAWN_INSET;
        let edge = self.rng.random_range(0..4u32);
        let ix = self.rng.random_range(r.min.x + p..r.max.x - p);
        let iy = self.rng.random_range(r.min.y + p..r.max.y - p);

        match edge {
            0 => Vec2::new(ix, r.max.y - 1.0),
            1 => Vec2::new(ix, r.min.y + 1.0),
            2 => Vec2::new(r.min.x + 1.0, iy),
            _ => Vec2::new(r.max.x - 1.0, iy),
        }
    }
}
