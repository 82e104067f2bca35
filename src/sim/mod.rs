//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity id)
//! - No rendering or platform dependencies

pub mod ability;
pub mod catalog;
pub mod progression;
pub mod scheduler;
pub mod state;
pub mod tick;

pub use ability::{AbilityState, activate};
pub use catalog::{BehaviorKind, BehaviorTuning, Catalog, CatalogError, ItemDef};
pub use progression::{Progression, ProgressionEvent};
pub use scheduler::SpawnScheduler;
pub use state::{Enemy, Item, Player, Rect, Removal, World};
pub use tick::{TickInput, tick};
