//! # Region Tracker
//!
//! Turns this frame's [`Change`] records into region-indexed exit/enter id
//! lists for the membership merge downstream. A proxy transitioning between
//! two tracked regions appears in both the exit list of its previous region
//! and the enter list of its new one, in the same pass.

use super::{RegionLists, NUM_REGION_LISTS};
use crate::space::Space;
use crate::types::Change;

/// Per-frame fan-out job from space changes to exit/enter lists.
///
/// Owns its change buffer so the per-frame scratch allocation is reused
/// across ticks.
#[derive(Debug, Default)]
pub struct RegionTracker {
    changes: Vec<Change>,
}

impl RegionTracker {
    /// Creates a tracker with an empty change buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs one categorization pass and fans the changes out into
    /// `outputs`. Outputs are cleared first and always have the fixed arity
    /// of [`NUM_REGION_LISTS`]; with no attached space the job emits empty
    /// lists and returns.
    pub fn run(&mut self, space: Option<&mut Space>, outputs: &mut RegionLists) {
        outputs.resize(NUM_REGION_LISTS, Vec::new());
        for list in outputs.iter_mut() {
            list.clear();
        }
        self.changes.clear();

        let Some(space) = space else {
            return;
        };

        space.categorize_and_get_changes(&mut self.changes);

        for change in &self.changes {
            if let Some(prev) = change.prev_region.tracked_index() {
                outputs[2 * prev].push(change.proxy_id);
            }
            if let Some(new) = change.region.tracked_index() {
                outputs[2 * new + 1].push(change.proxy_id);
            }
        }
    }

    /// The changes produced by the most recent run.
    pub fn changes(&self) -> &[Change] {
        &self.changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::empty_region_lists;
    use crate::types::{ProxyId, Sphere, Vec3};
    use crate::views::View;

    fn centered_view(radii: [f32; 3]) -> View {
        let mut view = View::new(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0));
        view.set_back_fronts([
            [radii[0], radii[0]],
            [radii[1], radii[1]],
            [radii[2], radii[2]],
        ]);
        view
    }

    #[test]
    fn test_no_space_emits_empty_lists() {
        let mut tracker = RegionTracker::new();
        let mut outputs = empty_region_lists();
        outputs[0].push(ProxyId(9));

        tracker.run(None, &mut outputs);

        assert_eq!(outputs.len(), NUM_REGION_LISTS);
        assert!(outputs.iter().all(|l| l.is_empty()));
    }

    #[test]
    fn test_cross_region_move_lands_in_exit_and_enter() {
        let mut space = Space::new();
        space.set_views(vec![centered_view([4.0, 10.0, 40.0])]);
        let id = space.create_proxy(Sphere::new(Vec3::new(1.0, 0.0, 0.0), 0.1));

        let mut tracker = RegionTracker::new();
        let mut outputs = empty_region_lists();

        // First pass: Unknown -> R1, enter list of R1 only.
        tracker.run(Some(&mut space), &mut outputs);
        assert_eq!(outputs[1], vec![id]);
        assert!(outputs[0].is_empty());

        // Move to R2: exits R1 (index 0), enters R2 (index 3).
        space.update_proxy(id, Sphere::new(Vec3::new(6.0, 0.0, 0.0), 0.1));
        tracker.run(Some(&mut space), &mut outputs);
        assert_eq!(outputs[0], vec![id]);
        assert_eq!(outputs[3], vec![id]);
        assert!(outputs[1].is_empty());

        // Leave every region: exits R2, enters nothing.
        space.update_proxy(id, Sphere::new(Vec3::new(900.0, 0.0, 0.0), 0.1));
        tracker.run(Some(&mut space), &mut outputs);
        assert_eq!(outputs[2], vec![id]);
        assert!(outputs[3].is_empty());
        assert_eq!(tracker.changes().len(), 1);
    }
}
