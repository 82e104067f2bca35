//! Score, experience, level and stat-point progression
//!
//! One instance per session. Every mutating call pushes a
//! [`ProgressionEvent`] onto an internal queue that the host (UI) and the
//! in-sim consumers drain once per frame; reads go through plain accessors.

use serde::{Deserialize, Serialize};

use crate::consts::{EXP_PER_LEVEL, MAX_LEVEL};

/// Change notification fired synchronously at the point of mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgressionEvent {
    ScoreChanged(i32),
    ExpChanged(i32),
    LevelChanged(i32),
    PointsChanged(i32),
    GameOver,
}

/// Session-scoped progression state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Progression {
    score: i32,
    /// Fractional passive-score accumulator (1 point per second of play)
    score_accum: f32,
    level: i32,
    current_exp: i32,
    next_exp: i32,
    stat_points: i32,
    /// Host-tunable multiplier applied to the player's movement speed
    speed_multiplier: f32,
    paused: bool,
    game_over: bool,
    events: Vec<ProgressionEvent>,
}

impl Default for Progression {
    fn default() -> Self {
        Self::new()
    }
}

impl Progression {
    /// A fresh session: level 1, no score, no spendable points
    pub fn new() -> Self {
        Self {
            score: 0,
            score_accum: 0.0,
            level: 1,
            current_exp: 0,
            next_exp: EXP_PER_LEVEL,
            stat_points: 0,
            speed_multiplier: 1.0,
            paused: false,
            game_over: false,
            events: Vec::new(),
        }
    }

    pub fn add_score(&mut self, amount: i32) {
        self.score = self.score.saturating_add(amount);
        self.events.push(ProgressionEvent::ScoreChanged(self.score));
    }

    /// Accrue passive score: one point per whole second of unpaused play
    pub fn accrue_time(&mut self, dt: f32) {
        self.score_accum += dt;
        if self.score_accum >= 1.0 {
            let whole = self.score_accum.floor();
            self.score_accum -= whole;
            self.add_score(whole as i32);
        }
    }

    /// Add experience, cascading into level-ups while the threshold is met.
    /// Each level-up grants exactly one stat point and raises the threshold
    /// by a fixed step. At the level cap the cascade stops and leftover exp
    /// is clamped below the threshold.
    pub fn add_exp(&mut self, amount: i32) {
        self.current_exp += amount;
        while self.current_exp >= self.next_exp && self.level < MAX_LEVEL {
            self.current_exp -= self.next_exp;
            self.level_up();
        }
        if self.current_exp >= self.next_exp {
            self.current_exp = self.next_exp - 1;
        }
        self.events.push(ProgressionEvent::ExpChanged(self.current_exp));
    }

    fn level_up(&mut self) {
        self.level += 1;
        self.stat_points += 1;
        self.next_exp += EXP_PER_LEVEL;
        log::debug!("level up -> {} (next threshold {})", self.level, self.next_exp);
        self.events.push(ProgressionEvent::LevelChanged(self.level));
        self.events.push(ProgressionEvent::PointsChanged(self.stat_points));
    }

    /// Consume one stat point. Returns false (and does nothing) at zero.
    pub fn spend_point(&mut self) -> bool {
        if self.stat_points == 0 {
            return false;
        }
        self.stat_points -= 1;
        self.events.push(ProgressionEvent::PointsChanged(self.stat_points));
        true
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn set_speed_multiplier(&mut self, m: f32) {
        self.speed_multiplier = m.max(0.0);
    }

    /// Terminal state; the second call is a no-op
    pub fn game_over(&mut self) {
        if self.game_over {
            return;
        }
        self.game_over = true;
        self.paused = true;
        log::info!("game over at score {} level {}", self.score, self.level);
        self.events.push(ProgressionEvent::GameOver);
    }

    /// Session restart: back to the fresh level-1 state
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Drain queued change notifications
    pub fn take_events(&mut self) -> Vec<ProgressionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn score(&self) -> i32 {
        self.score
    }
    pub fn level(&self) -> i32 {
        self.level
    }
    pub fn current_exp(&self) -> i32 {
        self.current_exp
    }
    pub fn next_exp(&self) -> i32 {
        self.next_exp
    }
    pub fn stat_points(&self) -> i32 {
        self.stat_points
    }
    pub fn speed_multiplier(&self) -> f32 {
        self.speed_multiplier
    }
    pub fn is_paused(&self) -> bool {
        self.paused
    }
    pub fn is_game_over(&self) -> bool {
        self.game_over
    }
}
