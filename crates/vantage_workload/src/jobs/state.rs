//! # Region State
//!
//! Maintains, per tracked region, the sorted list of currently-member proxy
//! ids, and reports per-region population counts.
//!
//! Each frame the enter/exit lists from the tracker are folded into the
//! prior membership list with a three-way linear merge: one walk over the
//! old list, draining smaller "coming" ids ahead of each old id and
//! dropping old ids named in "going". The merge is O(old + enter + exit)
//! with no per-element search, which critically relies on all three lists
//! being sorted ascending by id. That precondition is validated with
//! debug-only assertions; release builds trust the producer.

use super::{RegionLists, NUM_REGION_LISTS};
use crate::types::{ProxyId, NUM_TRACKED_REGIONS};
use tracing::debug;

/// Persistent per-region membership lists.
#[derive(Debug, Default)]
pub struct RegionState {
    state: [Vec<ProxyId>; NUM_TRACKED_REGIONS],
}

impl RegionState {
    /// Creates empty membership state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one frame's exit/enter lists into the membership lists.
    ///
    /// `inputs` is the flattened list set from the tracker (exit of region
    /// `r` at `2 * r`, enter at `2 * r + 1`). Regions with no deltas this
    /// frame are skipped untouched, which is the common case.
    pub fn run(&mut self, inputs: &RegionLists) {
        assert_eq!(inputs.len(), NUM_REGION_LISTS, "malformed tracker output");

        for region in 0..NUM_TRACKED_REGIONS {
            let going = &inputs[2 * region];
            let coming = &inputs[2 * region + 1];
            if going.is_empty() && coming.is_empty() {
                continue;
            }

            debug_assert!(is_sorted(going), "exit list for region {region} unsorted");
            debug_assert!(is_sorted(coming), "enter list for region {region} unsorted");
            debug_assert!(
                is_sorted(&self.state[region]),
                "membership list for region {region} unsorted"
            );

            let before = self.state[region].len();
            if self.state[region].is_empty() {
                self.state[region] = coming.clone();
            } else {
                let merged = merge(&self.state[region], coming, going);
                self.state[region] = merged;
            }

            debug!(
                region,
                before,
                after = self.state[region].len(),
                "region membership updated"
            );
        }
    }

    /// Current sorted membership of a tracked region.
    pub fn members(&self, region: usize) -> &[ProxyId] {
        &self.state[region]
    }

    /// Current population of each tracked region.
    pub fn counts(&self) -> [usize; NUM_TRACKED_REGIONS] {
        std::array::from_fn(|i| self.state[i].len())
    }
}

/// Three-way sorted merge: `(old \ going) ∪ coming`, produced in a single
/// linear pass over all three lists.
fn merge(old: &[ProxyId], coming: &[ProxyId], going: &[ProxyId]) -> Vec<ProxyId> {
    let mut merged = Vec::with_capacity(old.len() + coming.len());
    let mut c = 0;
    let mut g = 0;

    for &id in old {
        while c < coming.len() && coming[c] < id {
            merged.push(coming[c]);
            c += 1;
        }
        while g < going.len() && going[g] < id {
            g += 1;
        }
        if g < going.len() && going[g] == id {
            g += 1;
        } else {
            merged.push(id);
        }
    }
    merged.extend_from_slice(&coming[c..]);
    merged
}

fn is_sorted(list: &[ProxyId]) -> bool {
    list.windows(2).all(|w| w[0] <= w[1])
}
