//! Ability state machines
//!
//! One [`AbilityState`] per item instance. Activation is idempotent and
//! transitions armed -> activated; fan-out kinds dispatch their clones
//! through an invisible origin instance and then remove it. All waits
//! (dispatch cadence, hold timers, launch distances) are plain per-instance
//! fields resumed once per tick; nothing here holds a reference to another
//! entity across ticks.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::catalog::BehaviorKind;
use super::state::{Item, Rect, World};
use crate::consts::*;
use crate::{deg_to_rad, rotate_vec};

/// Per-instance runtime state, tagged by behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AbilityState {
    /// Grow-and-sit area damage
    Bomb,
    /// Straight shot reflecting off walls while the budget lasts
    Bounce { budget: i32 },
    /// Origin-side sequential clone dispatch (Bullet and Spiral)
    Dispatch {
        dispatched: i32,
        total: i32,
        cooldown: f32,
        base_dir: Vec2,
    },
    /// Plain straight shot (Clone, Missile, and dispatched projectiles)
    Shot,
    /// Launch straight, acquire the nearest enemy past the launch distance,
    /// freeze into stationary damage on contact
    Homing {
        base_pos: Vec2,
        homing: bool,
        frozen: bool,
        /// Weak target reference, re-resolved when the enemy vanishes
        target: Option<u32>,
    },
    /// Tracks the holder at a fixed offset, then releases upward
    Shield { offset: Vec2, hold: f32, fired: bool },
    /// Orbiting shield pinned to the holder
    Barrier,
}

impl AbilityState {
    /// Armed-state default for a freshly spawned instance; activation fills
    /// in the real parameters
    pub fn new(kind: BehaviorKind) -> Self {
        match kind {
            BehaviorKind::Bomb => AbilityState::Bomb,
            BehaviorKind::Bounce => AbilityState::Bounce { budget: 0 },
            BehaviorKind::Bullet | BehaviorKind::Spiral => AbilityState::Dispatch {
                dispatched: 0,
                total: 0,
                cooldown: 0.0,
                base_dir: Vec2::Y,
            },
            BehaviorKind::Clone | BehaviorKind::Missile | BehaviorKind::Nuclear => {
                AbilityState::Shot
            }
            BehaviorKind::Homing => AbilityState::Homing {
                base_pos: Vec2::ZERO,
                homing: false,
                frozen: false,
                target: None,
            },
            BehaviorKind::Shield => AbilityState::Shield {
                offset: Vec2::ZERO,
                hold: 0.0,
                fired: false,
            },
            BehaviorKind::Barrier => AbilityState::Barrier,
        }
    }
}

/// Deferred registry mutation collected while iterating the live set
#[derive(Debug, Clone)]
pub(crate) enum Command {
    SpawnClone {
        def_id: i32,
        pos: Vec2,
        setup: CloneSetup,
    },
    Despawn {
        id: u32,
        delay: f32,
        instant: bool,
    },
}

/// How a freshly spawned clone is armed
#[derive(Debug, Clone, Copy)]
pub(crate) enum CloneSetup {
    Shot { dir: Vec2, speed: f32, scale_mul: f32 },
    Homing { dir: Vec2 },
    Shield { offset: Vec2 },
}

/// Shield ring offsets around the holder, nearest slots first
fn shield_offsets(gap: f32) -> [Vec2; 8] {
    let diag = gap;
    let ortho = gap * 0.6;
    [
        Vec2::Y * diag,
        (Vec2::Y + Vec2::X) * ortho,
        (Vec2::Y - Vec2::X) * ortho,
        Vec2::NEG_Y * diag,
        (Vec2::NEG_Y + Vec2::X) * ortho,
        (Vec2::NEG_Y - Vec2::X) * ortho,
        Vec2::X * diag,
        Vec2::NEG_X * diag,
    ]
}

/// Stat-scaled fan-out size, clamped non-negative
fn scaled_count(base: i32, bonus: f32, invested: f32) -> i32 {
    ((base as f32 + bonus * invested).floor() as i32).max(0)
}

/// Activate an item instance: armed -> activated, collider tangible, draw
/// order applied. Idempotent; a stale id is a no-op.
pub fn activate(world: &mut World, item_id: u32) {
    let player_pos = world.player.pos;
    let player_speed = world.player.speed();
    let player_facing = world.player.facing;
    let field_center_x = world.bounds().center().x;
    let field_bottom_y = world.bounds().min.y;

    let kind;
    let invested;
    let def_id;
    {
        let Some(item) = world.item_mut(item_id) else {
            return;
        };
        if item.activated {
            return;
        }
        item.activated = true;
        kind = item.kind;
        invested = item.invested as f32;
        def_id = item.def_id;
        let t = kind.tuning();

        match kind {
            BehaviorKind::Bomb => {
                item.vel = Vec2::ZERO;
            }
            BehaviorKind::Bounce => {
                let budget = (t.bounce + t.bounce_bonus * item.invested).max(0);
                item.ability = AbilityState::Bounce { budget };
                item.vel = player_facing * (player_speed * t.speed_ratio).max(t.min_speed);
            }
            BehaviorKind::Clone | BehaviorKind::Missile => {
                item.scale *= t.scale;
                item.vel = Vec2::Y * (t.speed - t.speed_bonus * invested).max(t.min_speed);
            }
            BehaviorKind::Barrier => {
                item.scale *= t.scale;
                item.pos = player_pos;
                item.vel = Vec2::ZERO;
            }
            BehaviorKind::Bullet | BehaviorKind::Spiral => {
                item.pos = player_pos;
                item.vel = Vec2::ZERO;
                item.ability = AbilityState::Dispatch {
                    dispatched: 0,
                    total: scaled_count(t.count, t.count_bonus, invested),
                    cooldown: 0.0,
                    base_dir: player_facing,
                };
            }
            BehaviorKind::Homing | BehaviorKind::Nuclear | BehaviorKind::Shield => {
                // burst fan-out below, once the registry is free to mutate
                item.vel = Vec2::ZERO;
            }
        }
    }

    let t = kind.tuning();
    match kind {
        BehaviorKind::Bomb | BehaviorKind::Bounce | BehaviorKind::Barrier => {
            let delay = (t.duration + t.duration_bonus * invested).max(0.0);
            world.despawn_item(item_id, delay, false);
        }
        BehaviorKind::Homing => {
            let total = scaled_count(t.count, t.count_bonus, invested);
            let start = -t.spread_deg * 0.5;
            let step = if total > 1 {
                t.spread_deg / (total - 1) as f32
            } else {
                0.0
            };
            for i in 0..total {
                let dir = rotate_vec(player_facing, deg_to_rad(start + step * i as f32));
                if let Some(id) = world.spawn_item(def_id, Some(player_pos)) {
                    apply_clone_setup(world, id, CloneSetup::Homing { dir });
                }
            }
            world.despawn_item(item_id, 0.0, true);
        }
        BehaviorKind::Nuclear => {
            let total = scaled_count(t.count, t.count_bonus, invested);
            let speed = (t.speed - t.speed_bonus * invested).max(t.min_speed);
            for i in 0..total {
                // center-out line: 0, +1, -1, +2, -2, ...
                let k = if i == 0 {
                    0
                } else if i % 2 == 1 {
                    (i + 1) / 2
                } else {
                    -(i / 2)
                };
                let pos = Vec2::new(field_center_x + t.gap * k as f32, field_bottom_y);
                if let Some(id) = world.spawn_item(def_id, Some(pos)) {
                    apply_clone_setup(
                        world,
                        id,
                        CloneSetup::Shot {
                            dir: Vec2::Y,
                            speed,
                            scale_mul: 1.0,
                        },
                    );
                }
            }
            world.despawn_item(item_id, 0.0, true);
        }
        BehaviorKind::Shield => {
            let offsets = shield_offsets(t.gap);
            let total = (scaled_count(t.count, t.count_bonus, invested) as usize).min(offsets.len());
            for off in offsets.iter().take(total) {
                if let Some(id) = world.spawn_item(def_id, Some(player_pos + *off)) {
                    apply_clone_setup(world, id, CloneSetup::Shield { offset: *off });
                }
            }
            world.despawn_item(item_id, 0.0, true);
        }
        _ => {}
    }
}

/// Arm a freshly spawned clone: flag non-origin, activate, seed motion
pub(crate) fn apply_clone_setup(world: &mut World, item_id: u32, setup: CloneSetup) {
    let Some(item) = world.item_mut(item_id) else {
        return;
    };
    let t = item.kind.tuning();
    item.is_origin = false;
    item.activated = true;
    match setup {
        CloneSetup::Shot { dir, speed, scale_mul } => {
            item.scale *= scale_mul;
            item.vel = dir * speed;
            item.ability = AbilityState::Shot;
        }
        CloneSetup::Homing { dir } => {
            item.vel = dir * t.speed;
            item.ability = AbilityState::Homing {
                base_pos: item.pos,
                homing: false,
                frozen: false,
                target: None,
            };
        }
        CloneSetup::Shield { offset } => {
            item.vel = Vec2::ZERO;
            item.ability = AbilityState::Shield {
                offset,
                hold: t.duration + t.duration_bonus * item.invested as f32,
                fired: false,
            };
        }
    }
}

/// Advance every live item's ability by one tick. Spawns and removals are
/// deferred through `cmds` so the live set is never mutated mid-iteration.
pub(crate) fn tick_items(world: &mut World, dt: f32, cmds: &mut Vec<Command>) {
    let player_pos = world.player.pos;
    let player_speed = world.player.speed();
    let player_facing = world.player.facing;
    let bounds = world.bounds();

    for idx in 0..world.items.len() {
        if world.items[idx].is_removed() {
            continue;
        }
        world.items[idx].age += dt;

        if !world.items[idx].activated {
            // Armed drift: walls contain the item early on, then release it
            if world.items[idx].age < ITEM_CONTAIN_SECS {
                contain_in_bounds(&mut world.items[idx], &bounds);
            }
            continue;
        }

        let (id, kind, pos) = {
            let it = &world.items[idx];
            (it.id, it.kind, it.pos)
        };
        let t = kind.tuning();

        {
            let frozen_homing = matches!(
                world.items[idx].ability,
                AbilityState::Homing { frozen: true, .. }
            );
            let it = &mut world.items[idx];
            // visual spin; Bounce spins with its travel speed
            let spin = if kind == BehaviorKind::Bounce {
                -t.spin_deg * it.vel.length()
            } else {
                t.spin_deg
            };
            it.rotation += deg_to_rad(spin) * dt;
            if t.grows || frozen_homing {
                it.scale = (it.scale + ITEM_GROW_RATE * dt).min(t.scale);
            }
        }

        match world.items[idx].ability.clone() {
            AbilityState::Bomb | AbilityState::Shot => {}

            AbilityState::Barrier => {
                world.items[idx].pos = player_pos;
            }

            AbilityState::Bounce { budget } => {
                if budget > 0 {
                    let it = &mut world.items[idx];
                    let r = it.radius();
                    let mut budget = budget;
                    if (it.pos.x - r < bounds.min.x && it.vel.x < 0.0)
                        || (it.pos.x + r > bounds.max.x && it.vel.x > 0.0)
                    {
                        it.vel.x = -it.vel.x;
                        budget -= 1;
                    } else if (it.pos.y - r < bounds.min.y && it.vel.y < 0.0)
                        || (it.pos.y + r > bounds.max.y && it.vel.y > 0.0)
                    {
                        it.vel.y = -it.vel.y;
                        budget -= 1;
                    }
                    it.ability = AbilityState::Bounce { budget };
                }
            }

            AbilityState::Dispatch {
                dispatched,
                total,
                cooldown,
                base_dir,
            } => {
                // the invisible origin rides along with the holder
                world.items[idx].pos = player_pos;
                let cooldown = cooldown - dt;
                if cooldown <= 0.0 && dispatched < total {
                    let setup = match kind {
                        BehaviorKind::Bullet => CloneSetup::Shot {
                            dir: player_facing,
                            speed: (player_speed * t.speed_ratio).max(t.min_speed),
                            scale_mul: t.scale,
                        },
                        // Spiral steps a fixed angle per clone
                        _ => CloneSetup::Shot {
                            dir: rotate_vec(
                                base_dir,
                                -deg_to_rad(t.spread_deg) * dispatched as f32,
                            ),
                            speed: t.speed,
                            scale_mul: t.scale,
                        },
                    };
                    cmds.push(Command::SpawnClone {
                        def_id: world.items[idx].def_id,
                        pos: player_pos,
                        setup,
                    });
                    let dispatched = dispatched + 1;
                    if dispatched >= total {
                        // all clones out; the origin retires
                        cmds.push(Command::Despawn {
                            id,
                            delay: 0.0,
                            instant: false,
                        });
                    }
                    world.items[idx].ability = AbilityState::Dispatch {
                        dispatched,
                        total,
                        cooldown: t.dispatch_delay,
                        base_dir,
                    };
                } else {
                    world.items[idx].ability = AbilityState::Dispatch {
                        dispatched,
                        total,
                        cooldown,
                        base_dir,
                    };
                }
            }

            AbilityState::Homing {
                base_pos,
                homing,
                frozen,
                target,
            } => {
                if !frozen {
                    let homing =
                        homing || pos.distance_squared(base_pos) >= t.distance * t.distance;
                    let mut target = target;
                    if homing {
                        // weak target lookup, re-resolved when it vanishes
                        target = target
                            .filter(|&tid| world.enemy(tid).is_some())
                            .or_else(|| world.enemy_closest(pos));
                        let target_pos = target.and_then(|tid| world.enemy(tid)).map(|e| e.pos);
                        if let Some(target_pos) = target_pos {
                            world.items[idx].vel =
                                (target_pos - pos).normalize_or(Vec2::Y) * t.speed;
                        }
                    }
                    world.items[idx].ability = AbilityState::Homing {
                        base_pos,
                        homing,
                        frozen,
                        target,
                    };
                }
            }

            AbilityState::Shield {
                offset,
                hold,
                fired,
            } => {
                if !fired {
                    let hold = hold - dt;
                    let it = &mut world.items[idx];
                    if hold <= 0.0 {
                        it.vel = Vec2::Y * t.speed;
                        it.ability = AbilityState::Shield {
                            offset,
                            hold: 0.0,
                            fired: true,
                        };
                    } else {
                        it.pos = player_pos + offset;
                        it.ability = AbilityState::Shield {
                            offset,
                            hold,
                            fired,
                        };
                    }
                }
            }
        }
    }
}

/// Flush deferred spawns/removals collected during the item pass
pub(crate) fn apply_commands(world: &mut World, cmds: Vec<Command>) {
    for cmd in cmds {
        match cmd {
            Command::SpawnClone { def_id, pos, setup } => {
                if let Some(id) = world.spawn_item(def_id, Some(pos)) {
                    apply_clone_setup(world, id, setup);
                }
            }
            Command::Despawn { id, delay, instant } => {
                world.despawn_item(id, delay, instant);
            }
        }
    }
}

/// A moving Homing clone touched an enemy: past the launch threshold it
/// freezes into stationary damage and schedules its own removal
pub(crate) fn homing_contact(world: &mut World, item_id: u32) {
    let plan = {
        let Some(item) = world.item_mut(item_id) else {
            return;
        };
        let t = item.kind.tuning();
        if let AbilityState::Homing {
            base_pos,
            frozen: false,
            ..
        } = item.ability
        {
            if item.pos.distance_squared(base_pos) > t.distance * t.distance {
                item.vel = Vec2::ZERO;
                item.ability = AbilityState::Homing {
                    base_pos,
                    homing: true,
                    frozen: true,
                    target: None,
                };
                Some(t.duration + t.duration_bonus * item.invested as f32)
            } else {
                None
            }
        } else {
            None
        }
    };
    if let Some(delay) = plan {
        world.despawn_item(item_id, delay, false);
    }
}

/// Reflect an armed item back into the field
fn contain_in_bounds(item: &mut Item, bounds: &Rect) {
    let r = item.radius();
    if item.pos.x - r < bounds.min.x {
        item.pos.x = bounds.min.x + r;
        item.vel.x = item.vel.x.abs();
    } else if item.pos.x + r > bounds.max.x {
        item.pos.x = bounds.max.x - r;
        item.vel.x = -item.vel.x.abs();
    }
    if item.pos.y - r < bounds.min.y {
        item.pos.y = bounds.min.y + r;
        item.vel.y = item.vel.y.abs();
    } else if item.pos.y + r > bounds.max.y {
        item.pos.y = bounds.max.y - r;
        item.vel.y = -item.vel.y.abs();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::catalog::Catalog;

    fn world() -> World {
        World::new(99, Catalog::standard())
    }

    fn spawn_at_center(w: &mut World, def_id: i32) -> u32 {
        w.spawn_item(def_id, Some(Vec2::ZERO)).unwrap()
    }

    #[test]
    fn test_activate_idempotent() {
        let mut w = world();
        let id = spawn_at_center(&mut w, 1); // Clone
        activate(&mut w, id);
        let vel = w.item(id).unwrap().vel;
        // a second activation must not re-run the setup
        activate(&mut w, id);
        assert_eq!(w.item(id).unwrap().vel, vel);
        assert_eq!(w.live_item_count(), 1);
    }

    #[test]
    fn test_activate_stale_id_noop() {
        let mut w = world();
        activate(&mut w, 12345);
        assert_eq!(w.live_item_count(), 0);
    }

    #[test]
    fn test_clone_fires_at_base_speed() {
        let mut w = world();
        let id = spawn_at_center(&mut w, 1);
        activate(&mut w, id);
        let item = w.item(id).unwrap();
        assert!(item.activated);
        // speed 9 - 1 * 0 invested
        assert_eq!(item.vel, Vec2::Y * 9.0);
    }

    #[test]
    fn test_clone_speed_floor() {
        let mut w = world();
        w.progression.add_exp(2000);
        for _ in 0..15 {
            assert!(w.stat_up(1));
        }
        let id = spawn_at_center(&mut w, 1);
        activate(&mut w, id);
        // 9 - 15 would be negative; clamped at the floor
        assert_eq!(w.item(id).unwrap().vel, Vec2::Y * 1.0);
    }

    #[test]
    fn test_bounce_budget_consumed_per_reflection() {
        let mut w = world();
        let id = spawn_at_center(&mut w, 4); // Bounce
        activate(&mut w, id);
        assert_eq!(
            w.item(id).unwrap().ability,
            AbilityState::Bounce { budget: 3 }
        );

        let top = w.bounds().max.y;
        let mut cmds = Vec::new();
        for expected in [2, 1, 0] {
            // park it on the top wall moving outward
            let it = w.item_mut(id).unwrap();
            it.pos = Vec2::new(0.0, top);
            it.vel = Vec2::Y * 5.0;
            tick_items(&mut w, SIM_DT, &mut cmds);
            let it = w.item(id).unwrap();
            assert_eq!(it.ability, AbilityState::Bounce { budget: expected });
            assert!(it.vel.y < 0.0, "reflection should flip the velocity");
        }

        // budget exhausted: no further reflection
        let it = w.item_mut(id).unwrap();
        it.pos = Vec2::new(0.0, top);
        it.vel = Vec2::Y * 5.0;
        tick_items(&mut w, SIM_DT, &mut cmds);
        assert!(w.item(id).unwrap().vel.y > 0.0);
    }

    #[test]
    fn test_bomb_schedules_removal() {
        let mut w = world();
        let id = spawn_at_center(&mut w, 3); // Bomb
        activate(&mut w, id);
        let item = w.item(id).unwrap();
        assert_eq!(item.vel, Vec2::ZERO);
        assert!(matches!(
            item.removal,
            crate::sim::state::Removal::Delayed { .. }
        ));
    }

    #[test]
    fn test_bomb_grows_to_target() {
        let mut w = world();
        let id = spawn_at_center(&mut w, 3);
        activate(&mut w, id);
        let mut cmds = Vec::new();
        for _ in 0..600 {
            tick_items(&mut w, SIM_DT, &mut cmds);
        }
        assert_eq!(w.item(id).unwrap().scale, 4.0);
    }

    #[test]
    fn test_homing_fan_out_counts() {
        let mut w = world();
        let id = spawn_at_center(&mut w, 9); // Homing
        activate(&mut w, id);
        // origin removed instantly, 3 clones at zero invested
        assert_eq!(w.live_item_count(), 3);
        assert!(w.items.iter().filter(|i| !i.is_removed()).all(|i| !i.is_origin));
    }

    #[test]
    fn test_homing_acquires_then_freezes() {
        let mut w = world();
        let enemy_pos = Vec2::new(0.0, 8.0);
        let enemy = w.spawn_enemy(Some(enemy_pos));
        let id = spawn_at_center(&mut w, 9);
        activate(&mut w, id);

        let clone_id = w.items.iter().find(|i| !i.is_removed()).unwrap().id;
        let mut cmds = Vec::new();
        // run it past the launch distance
        for _ in 0..120 {
            tick_items(&mut w, SIM_DT, &mut cmds);
            let it = w.item_mut(clone_id).unwrap();
            let vel = it.vel;
            it.pos += vel * SIM_DT;
        }
        match w.item(clone_id).unwrap().ability {
            AbilityState::Homing { homing, target, .. } => {
                assert!(homing);
                assert_eq!(target, Some(enemy));
            }
            _ => panic!("expected homing state"),
        }

        homing_contact(&mut w, clone_id);
        let it = w.item(clone_id).unwrap();
        assert!(matches!(
            it.ability,
            AbilityState::Homing { frozen: true, .. }
        ));
        assert_eq!(it.vel, Vec2::ZERO);
    }

    #[test]
    fn test_homing_retargets_when_enemy_vanishes() {
        let mut w = world();
        let first = w.spawn_enemy(Some(Vec2::new(0.0, 8.0)));
        let second = w.spawn_enemy(Some(Vec2::new(4.0, 8.0)));
        let id = spawn_at_center(&mut w, 9);
        activate(&mut w, id);
        let clone_id = w.items.iter().find(|i| !i.is_removed()).unwrap().id;

        let mut cmds = Vec::new();
        for _ in 0..120 {
            tick_items(&mut w, SIM_DT, &mut cmds);
            let it = w.item_mut(clone_id).unwrap();
            let vel = it.vel;
            it.pos += vel * SIM_DT;
        }
        w.despawn_enemy(first);
        tick_items(&mut w, SIM_DT, &mut cmds);
        match w.item(clone_id).unwrap().ability {
            AbilityState::Homing { target, .. } => assert_eq!(target, Some(second)),
            _ => panic!("expected homing state"),
        }
    }

    #[test]
    fn test_nuclear_line_positions() {
        let mut w = world();
        // 2 invested -> 1 + 2*2 = 5 clones
        w.progression.add_exp(2000);
        assert!(w.stat_up(10));
        assert!(w.stat_up(10));
        let id = spawn_at_center(&mut w, 10); // Nuclear
        activate(&mut w, id);

        let bottom = w.bounds().min.y;
        let mut xs: Vec<f32> = w
            .items
            .iter()
            .filter(|i| !i.is_removed())
            .map(|i| {
                assert_eq!(i.pos.y, bottom);
                assert_eq!(i.vel, Vec2::Y * (16.0 - 2.0 * 2.0));
                i.pos.x
            })
            .collect();
        assert_eq!(xs.len(), 5);
        xs.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(xs, vec![-3.0, -1.5, 0.0, 1.5, 3.0]);
    }

    #[test]
    fn test_shield_ring_caps_at_eight() {
        let mut w = world();
        w.progression.add_exp(2000);
        for _ in 0..6 {
            w.stat_up(6); // Shield caps at 6 invested
        }
        let id = spawn_at_center(&mut w, 6);
        activate(&mut w, id);
        // 2 + 1*6 = 8 clones, exactly the ring size
        assert_eq!(w.live_item_count(), 8);
    }

    #[test]
    fn test_shield_holds_then_releases() {
        let mut w = world();
        let id = spawn_at_center(&mut w, 6);
        activate(&mut w, id);
        let clone_id = w.items.iter().find(|i| !i.is_removed()).unwrap().id;

        let mut cmds = Vec::new();
        tick_items(&mut w, SIM_DT, &mut cmds);
        let it = w.item(clone_id).unwrap();
        assert!(matches!(
            it.ability,
            AbilityState::Shield { fired: false, .. }
        ));
        // tracks the holder
        assert!(it.pos.distance(w.player.pos) < 3.0);

        // hold is 5s at zero invested
        for _ in 0..(5.5 / SIM_DT) as usize {
            tick_items(&mut w, SIM_DT, &mut cmds);
        }
        let it = w.item(clone_id).unwrap();
        assert!(matches!(it.ability, AbilityState::Shield { fired: true, .. }));
        assert_eq!(it.vel, Vec2::Y * 10.0);
    }

    #[test]
    fn test_bullet_dispatch_cadence() {
        let mut w = world();
        let id = spawn_at_center(&mut w, 5); // Bullet
        activate(&mut w, id);

        let mut cmds = Vec::new();
        tick_items(&mut w, SIM_DT, &mut cmds);
        // first clone goes out immediately
        assert_eq!(
            cmds.iter()
                .filter(|c| matches!(c, Command::SpawnClone { .. }))
                .count(),
            1
        );

        // next dispatch waits out the 0.3s cadence
        cmds.clear();
        tick_items(&mut w, SIM_DT, &mut cmds);
        assert!(cmds.is_empty());

        cmds.clear();
        for _ in 0..(0.35 / SIM_DT) as usize {
            tick_items(&mut w, SIM_DT, &mut cmds);
        }
        assert_eq!(cmds.len(), 1);
    }

    #[test]
    fn test_bullet_origin_retires_after_fanout() {
        let mut w = world();
        let id = spawn_at_center(&mut w, 5);
        activate(&mut w, id);

        let mut guard = 0;
        loop {
            let mut cmds = Vec::new();
            tick_items(&mut w, SIM_DT, &mut cmds);
            apply_commands(&mut w, cmds);
            if !matches!(
                w.item(id).map(|i| i.removal),
                Some(crate::sim::state::Removal::None)
            ) {
                break;
            }
            guard += 1;
            assert!(guard < 10_000, "origin never retired");
        }
        // 10 clones at zero invested, origin winding down
        let clones = w
            .items
            .iter()
            .filter(|i| !i.is_origin && !i.is_removed())
            .count();
        assert_eq!(clones, 10);
    }

    #[test]
    fn test_spiral_clones_step_angles() {
        let mut w = world();
        let id = spawn_at_center(&mut w, 8); // Spiral
        activate(&mut w, id);

        let mut cmds = Vec::new();
        // step far enough for two dispatches (0.05s apart)
        for _ in 0..10 {
            tick_items(&mut w, SIM_DT, &mut cmds);
            apply_commands(&mut w, std::mem::take(&mut cmds));
        }
        let dirs: Vec<Vec2> = w
            .items
            .iter()
            .filter(|i| !i.is_origin && !i.is_removed())
            .map(|i| i.vel.normalize())
            .collect();
        assert!(dirs.len() >= 2);
        // first clone fires along the facing, second is rotated 30 degrees
        assert!(dirs[0].distance(Vec2::Y) < 1e-4);
        let expected = rotate_vec(Vec2::Y, -deg_to_rad(30.0));
        assert!(dirs[1].distance(expected) < 1e-4);
    }

    #[test]
    fn test_activated_spin_runs_clockwise() {
        let mut w = world();
        let shield = spawn_at_center(&mut w, 6);
        activate(&mut w, shield);
        let homing = spawn_at_center(&mut w, 9);
        activate(&mut w, homing);

        let mut cmds = Vec::new();
        tick_items(&mut w, SIM_DT, &mut cmds);
        // every dispatched clone rotates negative, like Bomb and Barrier
        for it in w.items.iter().filter(|i| !i.is_removed()) {
            assert!(it.rotation < 0.0, "{:?} spun the wrong way", it.kind);
        }
    }

    #[test]
    fn test_barrier_tracks_player() {
        let mut w = world();
        let id = spawn_at_center(&mut w, 7); // Barrier
        activate(&mut w, id);
        w.player.pos = Vec2::new(3.0, -2.0);
        let mut cmds = Vec::new();
        tick_items(&mut w, SIM_DT, &mut cmds);
        assert_eq!(w.item(id).unwrap().pos, Vec2::new(3.0, -2.0));
    }

    #[test]
    fn test_armed_item_contained_by_walls() {
        let mut w = world();
        let top = w.bounds().max.y;
        let id = spawn_at_center(&mut w, 1);
        let it = w.item_mut(id).unwrap();
        it.pos = Vec2::new(0.0, top + 0.2);
        it.vel = Vec2::Y * 3.0;
        let mut cmds = Vec::new();
        tick_items(&mut w, SIM_DT, &mut cmds);
        let it = w.item(id).unwrap();
        assert!(it.pos.y < top);
        assert!(it.vel.y < 0.0);
    }
}
