//! Spawn scheduler
//!
//! A time-accumulator loop, advanced once per tick. Delays for both spawn
//! kinds decay toward their floors over the session; the enemy side is
//! additionally gated on a score-driven density target. Catch-up after a
//! long tick is capped and paced so stacked same-position spawns never
//! appear in a single frame.

use serde::{Deserialize, Serialize};

use super::state::World;
use crate::consts::*;

/// Accumulator state for both spawn kinds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnScheduler {
    pub enemy_timer: f32,
    pub item_timer: f32,
    pub enemy_delay: f32,
    pub item_delay: f32,
    /// Pacing gap still owed before the next spawn of each kind
    enemy_pace: f32,
    item_pace: f32,
}

impl Default for SpawnScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl SpawnScheduler {
    /// Timers start full so the first tick of a session spawns immediately
    pub fn new() -> Self {
        Self {
            enemy_timer: ENEMY_DELAY_BASE,
            item_timer: ITEM_DELAY_BASE,
            enemy_delay: ENEMY_DELAY_BASE,
            item_delay: ITEM_DELAY_BASE,
            enemy_pace: 0.0,
            item_pace: 0.0,
        }
    }

    /// Restore base delays (session restart)
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl World {
    /// Advance the spawn loop by `dt`. Does nothing while spawning is
    /// disabled; disabling never touches already-live instances.
    pub(crate) fn advance_spawns(&mut self, dt: f32) {
        if !self.spawning {
            return;
        }

        {
            let s = &mut self.scheduler;
            s.enemy_delay = (s.enemy_delay - dt / ENEMY_DELAY_DECAY_DIV).max(ENEMY_DELAY_FLOOR);
            s.item_delay = (s.item_delay - dt / ITEM_DELAY_DECAY_DIV).max(ITEM_DELAY_FLOOR);
            s.enemy_timer += dt;
            s.item_timer += dt;
        }

        let target = Self::calc_enemy_count(self.progression.score()).max(0) as usize;

        // Each kind pays its pacing gaps out of this tick's elapsed time, so
        // a large dt still catches up to the cap with spawns 10 ms apart.
        let mut budget = dt;
        let mut caught_up = 0;
        while self.scheduler.enemy_timer >= self.scheduler.enemy_delay
            && caught_up < SPAWN_CATCHUP_CAP
        {
            if self.scheduler.enemy_pace > 0.0 {
                let paid = self.scheduler.enemy_pace.min(budget);
                self.scheduler.enemy_pace -= paid;
                budget -= paid;
                if self.scheduler.enemy_pace > 0.0 {
                    break;
                }
            }
            if self.live_enemy_count() >= target {
                // Density satisfied: skip this tick and clamp the timer so a
                // long quiet stretch can't burst later
                self.scheduler.enemy_timer =
                    self.scheduler.enemy_timer.min(self.scheduler.enemy_delay);
                break;
            }
            self.spawn_enemy(None);
            self.scheduler.enemy_timer -= self.scheduler.enemy_delay;
            self.scheduler.enemy_pace = SPAWN_PACING_SECS;
            caught_up += 1;
        }

        let mut budget = dt;
        let mut caught_up = 0;
        while self.scheduler.item_timer >= self.scheduler.item_delay
            && caught_up < SPAWN_CATCHUP_CAP
        {
            if self.scheduler.item_pace > 0.0 {
                let paid = self.scheduler.item_pace.min(budget);
                self.scheduler.item_pace -= paid;
                budget -= paid;
                if self.scheduler.item_pace > 0.0 {
                    break;
                }
            }
            if self.spawn_item(0, None).is_none() {
                // Nothing eligible this tick; clamp and retry once the
                // timer refills
                self.scheduler.item_timer =
                    self.scheduler.item_timer.min(self.scheduler.item_delay);
                break;
            }
            self.scheduler.item_timer -= self.scheduler.item_delay;
            self.scheduler.item_pace = SPAWN_PACING_SECS;
            caught_up += 1;
        }
    }
}
