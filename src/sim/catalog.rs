//! Item definition catalog
//!
//! Definitions are an ordered, read-only list keyed by integer id and bound
//! to one behavior kind each. The only per-session mutation is stat
//! investment. Behavior tuning is a static table keyed by [`BehaviorKind`];
//! there is no runtime type lookup.

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ability behavior bound to an item definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BehaviorKind {
    Bomb,
    Bounce,
    Bullet,
    Clone,
    Homing,
    Missile,
    Nuclear,
    Shield,
    Spiral,
    Barrier,
}

/// Static tuning for one behavior kind.
///
/// Not every field is meaningful for every kind; unused fields stay at the
/// `BASE` zero values. All stat-scaled results are clamped to sane domains
/// at the point of use (non-negative counts, floored speeds).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BehaviorTuning {
    /// Target scale (grown to over time when `grows`, else applied at once)
    pub scale: f32,
    /// Visual spin, degrees per second
    pub spin_deg: f32,
    /// Lifetime before scheduled removal, plus per-stat bonus
    pub duration: f32,
    pub duration_bonus: f32,
    /// Fan-out clone count, plus per-stat bonus (fractional for Homing)
    pub count: i32,
    pub count_bonus: f32,
    /// Base speed; `speed_bonus` is subtractive (diminishing with stat)
    pub speed: f32,
    pub speed_bonus: f32,
    pub min_speed: f32,
    /// Speed as a ratio of the holder's current speed
    pub speed_ratio: f32,
    /// Wall-reflection budget, plus per-stat bonus
    pub bounce: i32,
    pub bounce_bonus: i32,
    /// Angular spread (Homing) or per-clone step (Spiral), degrees
    pub spread_deg: f32,
    /// Clone spacing (Nuclear line, Shield ring)
    pub gap: f32,
    /// Pause between sequential clone dispatches
    pub dispatch_delay: f32,
    /// Straight-launch distance before Homing acquires a target
    pub distance: f32,
    /// Whether the scale is grown toward the target over time
    pub grows: bool,
}

const BASE: BehaviorTuning = BehaviorTuning {
    scale: 1.0,
    spin_deg: 0.0,
    duration: 0.0,
    duration_bonus: 0.0,
    count: 0,
    count_bonus: 0.0,
    speed: 0.0,
    speed_bonus: 0.0,
    min_speed: 0.0,
    speed_ratio: 0.0,
    bounce: 0,
    bounce_bonus: 0,
    spread_deg: 0.0,
    gap: 0.0,
    dispatch_delay: 0.0,
    distance: 0.0,
    grows: false,
};

const BOMB: BehaviorTuning = BehaviorTuning {
    scale: 4.0,
    spin_deg: -30.0,
    duration: 10.0,
    duration_bonus: 5.0,
    grows: true,
    ..BASE
};

const BOUNCE: BehaviorTuning = BehaviorTuning {
    scale: 3.0,
    spin_deg: 30.0,
    speed_ratio: 5.0,
    min_speed: 5.0,
    bounce: 3,
    bounce_bonus: 1,
    duration: 10.0,
    duration_bonus: 10.0,
    grows: true,
    ..BASE
};

const BULLET: BehaviorTuning = BehaviorTuning {
    scale: 0.8,
    count: 10,
    count_bonus: 1.0,
    speed_ratio: 3.0,
    min_speed: 1.0,
    dispatch_delay: 0.3,
    ..BASE
};

const CLONE: BehaviorTuning = BehaviorTuning {
    speed: 9.0,
    speed_bonus: 1.0,
    min_speed: 1.0,
    ..BASE
};

const HOMING: BehaviorTuning = BehaviorTuning {
    scale: 2.8,
    spin_deg: -360.0,
    count: 3,
    count_bonus: 0.4,
    spread_deg: 60.0,
    speed: 10.0,
    distance: 5.0,
    duration: 3.0,
    duration_bonus: 0.5,
    ..BASE
};

const MISSILE: BehaviorTuning = BehaviorTuning {
    scale: 3.0,
    speed: 10.0,
    speed_bonus: 1.0,
    min_speed: 1.0,
    ..BASE
};

const NUCLEAR: BehaviorTuning = BehaviorTuning {
    scale: 1.2,
    spin_deg: -120.0,
    count: 1,
    count_bonus: 2.0,
    gap: 1.5,
    speed: 16.0,
    speed_bonus: 2.0,
    min_speed: 2.0,
    grows: true,
    ..BASE
};

const SHIELD: BehaviorTuning = BehaviorTuning {
    scale: 1.2,
    spin_deg: -120.0,
    count: 2,
    count_bonus: 1.0,
    gap: 2.0,
    duration: 5.0,
    duration_bonus: 5.0,
    speed: 10.0,
    grows: true,
    ..BASE
};

const SPIRAL: BehaviorTuning = BehaviorTuning {
    count: 12,
    count_bonus: 1.0,
    spread_deg: 30.0,
    speed: 8.0,
    dispatch_delay: 0.05,
    ..BASE
};

const BARRIER: BehaviorTuning = BehaviorTuning {
    scale: 2.5,
    spin_deg: -120.0,
    duration: 10.0,
    duration_bonus: 10.0,
    ..BASE
};

impl BehaviorKind {
    /// Static tuning lookup for this kind
    pub fn tuning(self) -> &'static BehaviorTuning {
        match self {
            BehaviorKind::Bomb => &BOMB,
            BehaviorKind::Bounce => &BOUNCE,
            BehaviorKind::Bullet => &BULLET,
            BehaviorKind::Clone => &CLONE,
            BehaviorKind::Homing => &HOMING,
            BehaviorKind::Missile => &MISSILE,
            BehaviorKind::Nuclear => &NUCLEAR,
            BehaviorKind::Shield => &SHIELD,
            BehaviorKind::Spiral => &SPIRAL,
            BehaviorKind::Barrier => &BARRIER,
        }
    }

    /// Kinds whose activation fans out through an invisible origin instance
    pub fn fans_out(self) -> bool {
        matches!(
            self,
            BehaviorKind::Bullet
                | BehaviorKind::Homing
                | BehaviorKind::Nuclear
                | BehaviorKind::Shield
                | BehaviorKind::Spiral
        )
    }
}

/// One catalog entry; immutable per session except `invested`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDef {
    pub id: i32,
    pub name: String,
    /// Minimum progression level before this item can spawn
    pub unlock_level: i32,
    /// Stat investment cap; 0 means uncapped
    pub max_stat: i32,
    /// Points the player has spent on this item
    pub invested: i32,
    pub kind: BehaviorKind,
    /// Draw-order applied to activated instances
    pub sort_order: i32,
}

impl ItemDef {
    pub fn new(id: i32, name: &str, unlock_level: i32, max_stat: i32, kind: BehaviorKind) -> Self {
        Self {
            id,
            name: name.to_string(),
            unlock_level,
            max_stat,
            invested: 0,
            kind,
            sort_order: id,
        }
    }
}

/// Catalog load/validation failure
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("duplicate item definition id {0}")]
    DuplicateId(i32),
    #[error("item definition id {0} is reserved (ids must be positive)")]
    ReservedId(i32),
}

/// Ordered, validated item definition list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    defs: Vec<ItemDef>,
}

impl Catalog {
    /// Build a catalog, sorting by (id, name) for deterministic selection.
    /// Ids must be positive and unique (0 is the "pick random" sentinel).
    pub fn new(mut defs: Vec<ItemDef>) -> Result<Self, CatalogError> {
        defs.sort_by(|a, b| a.id.cmp(&b.id).then_with(|| a.name.cmp(&b.name)));
        for pair in defs.windows(2) {
            if pair[0].id == pair[1].id {
                return Err(CatalogError::DuplicateId(pair[0].id));
            }
        }
        if let Some(d) = defs.iter().find(|d| d.id <= 0) {
            return Err(CatalogError::ReservedId(d.id));
        }
        Ok(Self { defs })
    }

    /// The default ten-item catalog with staggered unlock levels
    pub fn standard() -> Self {
        let defs = vec![
            ItemDef::new(1, "Clone", 1, 0, BehaviorKind::Clone),
            ItemDef::new(2, "Missile", 2, 0, BehaviorKind::Missile),
            ItemDef::new(3, "Bomb", 3, 0, BehaviorKind::Bomb),
            ItemDef::new(4, "Bounce", 4, 0, BehaviorKind::Bounce),
            ItemDef::new(5, "Bullet", 6, 10, BehaviorKind::Bullet),
            ItemDef::new(6, "Shield", 8, 6, BehaviorKind::Shield),
            ItemDef::new(7, "Barrier", 10, 0, BehaviorKind::Barrier),
            ItemDef::new(8, "Spiral", 12, 10, BehaviorKind::Spiral),
            ItemDef::new(9, "Homing", 15, 0, BehaviorKind::Homing),
            ItemDef::new(10, "Nuclear", 20, 5, BehaviorKind::Nuclear),
        ];
        // The fixed list above is valid by construction
        Self::new(defs).unwrap_or(Self { defs: Vec::new() })
    }

    pub fn get(&self, id: i32) -> Option<&ItemDef> {
        self.defs.iter().find(|d| d.id == id)
    }

    pub fn defs(&self) -> &[ItemDef] {
        &self.defs
    }

    /// Reservoir-sample one definition uniformly among those unlocked at
    /// `level`. Returns None when nothing is eligible.
    pub fn pick_random<R: Rng>(&self, level: i32, rng: &mut R) -> Option<i32> {
        let mut pick = None;
        let mut k = 0;
        for d in &self.defs {
            if d.unlock_level <= level {
                k += 1;
                if rng.random_range(0..k) == 0 {
                    pick = Some(d.id);
                }
            }
        }
        pick
    }

    /// Raise one definition's invested stat. Fails when the id is unknown or
    /// the stat is at its cap; the point-spend gate lives with progression.
    pub fn invest(&mut self, id: i32) -> bool {
        let Some(def) = self.defs.iter_mut().find(|d| d.id == id) else {
            return false;
        };
        if def.max_stat > 0 && def.invested >= def.max_stat {
            return false;
        }
        def.invested += 1;
        true
    }

    /// Zero all invested stats (session reset)
    pub fn reset_stats(&mut self) {
        for def in &mut self.defs {
            def.invested = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_catalog_rejects_duplicate_ids() {
        let defs = vec![
            ItemDef::new(1, "Clone", 1, 0, BehaviorKind::Clone),
            ItemDef::new(1, "Missile", 1, 0, BehaviorKind::Missile),
        ];
        assert_eq!(Catalog::new(defs).unwrap_err(), CatalogError::DuplicateId(1));
    }

    #[test]
    fn test_catalog_rejects_reserved_id() {
        let defs = vec![ItemDef::new(0, "Clone", 1, 0, BehaviorKind::Clone)];
        assert_eq!(Catalog::new(defs).unwrap_err(), CatalogError::ReservedId(0));
    }

    #[test]
    fn test_catalog_sorted_by_id_then_name() {
        let defs = vec![
            ItemDef::new(5, "Bullet", 1, 0, BehaviorKind::Bullet),
            ItemDef::new(2, "Missile", 1, 0, BehaviorKind::Missile),
        ];
        let cat = Catalog::new(defs).unwrap();
        assert_eq!(cat.defs()[0].id, 2);
        assert_eq!(cat.defs()[1].id, 5);
    }

    #[test]
    fn test_fans_out_partition() {
        use BehaviorKind::*;
        for kind in [Bullet, Homing, Nuclear, Shield, Spiral] {
            assert!(kind.fans_out());
        }
        for kind in [Bomb, Bounce, Clone, Missile, Barrier] {
            assert!(!kind.fans_out());
        }
    }

    #[test]
    fn test_pick_random_none_eligible() {
        let cat = Catalog::standard();
        let mut rng = Pcg32::seed_from_u64(7);
        // Everything unlocks at level 1 or later
        assert_eq!(cat.pick_random(0, &mut rng), None);
    }

    #[test]
    fn test_pick_random_single_eligible() {
        let cat = Catalog::standard();
        let mut rng = Pcg32::seed_from_u64(7);
        // Only Clone (unlock 1) is eligible at level 1
        for _ in 0..20 {
            assert_eq!(cat.pick_random(1, &mut rng), Some(1));
        }
    }

    #[test]
    fn test_pick_random_covers_all_eligible() {
        let cat = Catalog::standard();
        let mut rng = Pcg32::seed_from_u64(42);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..500 {
            if let Some(id) = cat.pick_random(99, &mut rng) {
                seen.insert(id);
            }
        }
        assert_eq!(seen.len(), cat.defs().len());
    }

    #[test]
    fn test_invest_respects_cap() {
        let mut cat = Catalog::standard();
        // Nuclear caps at 5
        for _ in 0..5 {
            assert!(cat.invest(10));
        }
        assert!(!cat.invest(10));
        assert_eq!(cat.get(10).unwrap().invested, 5);

        // Uncapped items keep going
        for _ in 0..50 {
            assert!(cat.invest(1));
        }
    }

    #[test]
    fn test_invest_unknown_id() {
        let mut cat = Catalog::standard();
        assert!(!cat.invest(999));
    }

    #[test]
    fn test_reset_stats() {
        let mut cat = Catalog::standard();
        cat.invest(1);
        cat.invest(2);
        cat.reset_stats();
        assert!(cat.defs().iter().all(|d| d.invested == 0));
    }
}
