//! # Frame Jobs
//!
//! The per-frame stages that run after transactions are applied, in a fixed
//! order driven by the owning engine:
//!
//! 1. [`tracker::RegionTracker`] — categorizes the space and fans the
//!    resulting changes out into per-region exit/enter id lists.
//! 2. [`state::RegionState`] — folds those lists into persistent sorted
//!    membership lists and reports per-region populations.
//! 3. [`regulator::ControlViews`] — adjusts each view's region extents so
//!    next frame's processing time tracks its budget.
//!
//! There is no job graph or dependency injection here: composition is
//! explicit, by the engine calling each stage with its inputs.

pub mod regulator;
pub mod state;
pub mod tracker;

use crate::types::{ProxyId, NUM_TRACKED_REGIONS};

/// Flattened exit/enter id lists, two per tracked region: the exit list of
/// region `r` lives at `2 * r`, its enter list at `2 * r + 1`.
pub type RegionLists = Vec<Vec<ProxyId>>;

/// Fixed arity of [`RegionLists`].
pub const NUM_REGION_LISTS: usize = 2 * NUM_TRACKED_REGIONS;

/// Allocates an empty exit/enter list set of the fixed arity.
pub fn empty_region_lists() -> RegionLists {
    vec![Vec::new(); NUM_REGION_LISTS]
}
