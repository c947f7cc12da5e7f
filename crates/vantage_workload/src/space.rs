//! # Space
//!
//! The authoritative container of all proxies and all views. The space owns
//! the backing proxy array, recycles freed slots through a free list so
//! indices stay stable for every other proxy, and performs the per-frame
//! categorization pass that assigns each proxy to a region tier based on
//! distance to the nearest view's region spheres.
//!
//! ## Usage pattern
//!
//! The space itself carries no lock: every mutating call takes `&mut self`
//! and is expected to run on the single frame-processing thread, after that
//! thread has drained the transaction queues. Concurrent producers never
//! touch the space directly; they go through
//! [`Collection`](crate::collection::Collection).
//!
//! All proxy-id operations are defensively bounds-checked and silently
//! ignore invalid ids. Deleting twice or updating a freed id is normal
//! misuse and never an error; wrong ids fail safe into no-ops rather than
//! stopping the frame pipeline.

use crate::types::{
    Change, Owner, ProxyId, Region, Sphere, NUM_REGION_TAGS, NUM_TRACKED_REGIONS,
};
use crate::views::View;
use tracing::trace;

/// Extra slots added beyond the required capacity whenever the backing
/// array grows, to keep resizes off the per-frame path.
pub(crate) const GROWTH_SLACK: usize = 128;

/// Number of distinct (prev, new) transition pairs.
const NUM_TRANSITIONS: usize = NUM_REGION_TAGS * (NUM_REGION_TAGS - 1);

/// One trackable object: a bounding sphere plus its classification history.
#[derive(Debug, Clone, Copy)]
pub struct Proxy {
    /// Current bounding volume.
    pub sphere: Sphere,
    /// Classification from the current categorization pass.
    pub region: Region,
    /// Classification from the immediately preceding pass.
    pub prev_region: Region,
    /// Entity handle supplied on reset, if any.
    pub owner: Option<Owner>,
}

impl Proxy {
    fn fresh(sphere: Sphere, owner: Option<Owner>) -> Self {
        Self {
            sphere,
            region: Region::Unknown,
            prev_region: Region::Unknown,
            owner,
        }
    }

    fn invalid() -> Self {
        Self {
            sphere: Sphere::default(),
            region: Region::Invalid,
            prev_region: Region::Invalid,
            owner: None,
        }
    }

    /// Whether this slot currently holds a live proxy.
    pub fn is_live(&self) -> bool {
        self.region != Region::Invalid
    }
}

/// Authoritative proxy array and view list.
#[derive(Debug, Default)]
pub struct Space {
    proxies: Vec<Proxy>,
    free_indices: Vec<u32>,
    views: Vec<View>,
    transition_counts: [u64; NUM_TRANSITIONS],
}

impl Space {
    /// Creates an empty space with no proxies and no views.
    pub fn new() -> Self {
        Self {
            proxies: Vec::new(),
            free_indices: Vec::new(),
            views: Vec::new(),
            transition_counts: [0; NUM_TRANSITIONS],
        }
    }

    // ========================================================================
    // Direct proxy API (free-list front end)
    // ========================================================================

    /// Creates a proxy, reusing a freed slot if one is available, else
    /// appending. The new proxy starts unclassified
    /// (`region = prev_region = Unknown`).
    pub fn create_proxy(&mut self, sphere: Sphere) -> ProxyId {
        if let Some(index) = self.free_indices.pop() {
            self.proxies[index as usize] = Proxy::fresh(sphere, None);
            ProxyId(index)
        } else {
            self.proxies.push(Proxy::fresh(sphere, None));
            ProxyId((self.proxies.len() - 1) as u32)
        }
    }

    /// Deletes a proxy. If `id` is the last live slot the array shrinks,
    /// greedily popping any now-trailing freed slots as well; otherwise the
    /// slot is marked invalid and pushed onto the free list so every other
    /// index stays stable. Deleting an out-of-range or already-freed id is
    /// a no-op.
    pub fn delete_proxy(&mut self, id: ProxyId) {
        let index = id.index();
        if index >= self.proxies.len() || !self.proxies[index].is_live() {
            return;
        }

        if index == self.proxies.len() - 1 {
            self.proxies.pop();
            self.compact_tail();
        } else {
            self.proxies[index] = Proxy::invalid();
            self.free_indices.push(id.0);
        }
    }

    /// Replaces the sphere payload of a live proxy. No-op for an invalid id.
    pub fn update_proxy(&mut self, id: ProxyId, sphere: Sphere) {
        let index = id.index();
        if index < self.proxies.len() && self.proxies[index].is_live() {
            self.proxies[index].sphere = sphere;
        }
    }

    /// Pops trailing freed slots after a tail deletion, keeping the array
    /// compact when deletions happen at the end.
    fn compact_tail(&mut self) {
        while self.proxies.last().is_some_and(|p| !p.is_live()) {
            let index = (self.proxies.len() - 1) as u32;
            self.proxies.pop();
            if let Some(pos) = self.free_indices.iter().position(|&f| f == index) {
                self.free_indices.swap_remove(pos);
            }
        }
    }

    // ========================================================================
    // Transactional front end (driven by the Collection)
    // ========================================================================

    /// Grows the backing array so every slot below `required` exists,
    /// over-allocating by [`GROWTH_SLACK`] to reduce resize frequency. New
    /// slots start invalid and outside the free list: they belong to the id
    /// allocator and will be populated by pending resets.
    pub(crate) fn ensure_capacity(&mut self, required: usize) {
        if required > self.proxies.len() {
            self.proxies.resize(required + GROWTH_SLACK, Proxy::invalid());
        }
    }

    /// Creates or refreshes the slot at `id` with a new sphere and owner.
    /// The slot reverts to unclassified so the next categorization pass
    /// reports its region from scratch.
    pub(crate) fn reset_slot(&mut self, id: ProxyId, sphere: Sphere, owner: Option<Owner>) {
        let index = id.index();
        if index >= self.proxies.len() {
            // Capacity is grown to the allocator high-water mark before
            // resets apply; an id past the end came from a foreign space.
            debug_assert!(false, "reset for unallocated id {id}");
            return;
        }
        self.proxies[index] = Proxy::fresh(sphere, owner);
    }

    // ========================================================================
    // Views and categorization
    // ========================================================================

    /// Wholesale replaces the view list. There is no incremental update;
    /// view setup rebuilds the snapshot each frame.
    pub fn set_views(&mut self, views: Vec<View>) {
        self.views = views;
    }

    /// The current view snapshot.
    pub fn views(&self) -> &[View] {
        &self.views
    }

    /// Classifies every live proxy against the view spheres, appending a
    /// [`Change`] for each proxy whose region differs from the previous
    /// pass.
    ///
    /// Tiers are scanned in ascending order and the first touching sphere
    /// wins, so a proxy inside both R1 and R2 lands in R1, and among views
    /// at the same tier the first view in the snapshot wins. A proxy that
    /// touches no sphere of any view becomes `Unknown` regardless of its
    /// prior region.
    pub fn categorize_and_get_changes(&mut self, changes: &mut Vec<Change>) {
        for (index, proxy) in self.proxies.iter_mut().enumerate() {
            if !proxy.is_live() {
                continue;
            }

            let mut region = Region::Unknown;
            'scan: for tier in 0..NUM_TRACKED_REGIONS {
                for view in &self.views {
                    if view.regions[tier].touches(&proxy.sphere) {
                        region = Region::tracked(tier);
                        break 'scan;
                    }
                }
            }

            proxy.prev_region = proxy.region;
            proxy.region = region;
            if region != proxy.prev_region {
                changes.push(Change {
                    proxy_id: ProxyId(index as u32),
                    region,
                    prev_region: proxy.prev_region,
                });
                self.transition_counts[Region::transition_index(proxy.prev_region, region)] += 1;
            }
        }

        if !changes.is_empty() {
            trace!(transitions = changes.len(), "categorization pass");
        }
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Number of allocated slots, live or freed.
    pub fn num_allocated(&self) -> usize {
        self.proxies.len()
    }

    /// Number of live proxies.
    pub fn num_live(&self) -> usize {
        self.proxies.iter().filter(|p| p.is_live()).count()
    }

    /// The proxy at `id`, if the slot exists and is live.
    pub fn proxy(&self, id: ProxyId) -> Option<&Proxy> {
        self.proxies.get(id.index()).filter(|p| p.is_live())
    }

    /// The owner recorded for a live proxy, if any.
    pub fn owner(&self, id: ProxyId) -> Option<Owner> {
        self.proxy(id).and_then(|p| p.owner)
    }

    /// Cumulative count of (prev, new) transitions observed since creation,
    /// indexed by [`Region::transition_index`].
    pub fn transition_count(&self, prev: Region, new: Region) -> u64 {
        match Region::transition_index(prev, new) {
            crate::types::NO_TRANSITION => 0,
            idx => self.transition_counts[idx],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Vec3;

    fn sphere_at(x: f32, radius: f32) -> Sphere {
        Sphere::new(Vec3::new(x, 0.0, 0.0), radius)
    }

    /// A view centered on the origin whose region spheres have the given
    /// radii (symmetric back/front pairs).
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
    fn test_create_reuses_freed_slot() {
        let mut space = Space::new();
        let a = space.create_proxy(sphere_at(0.0, 1.0));
        let b = space.create_proxy(sphere_at(1.0, 1.0));
        let c = space.create_proxy(sphere_at(2.0, 1.0));
        assert_eq!((a.0, b.0, c.0), (0, 1, 2));

        space.delete_proxy(b);
        assert_eq!(space.num_live(), 2);
        assert_eq!(space.num_allocated(), 3);

        // Slot 1 comes back before anything is appended.
        let d = space.create_proxy(sphere_at(3.0, 1.0));
        assert_eq!(d, b);
        assert_eq!(space.num_live(), 3);
        assert_eq!(space.num_allocated(), 3);
    }

    #[test]
    fn test_tail_delete_compacts_trailing_free_slots() {
        let mut space = Space::new();
        let ids: Vec<_> = (0..4)
            .map(|i| space.create_proxy(sphere_at(i as f32, 1.0)))
            .collect();

        // Free the middle of the tail, then delete the tail itself: the
        // array shrinks past both.
        space.delete_proxy(ids[2]);
        assert_eq!(space.num_allocated(), 4);
        space.delete_proxy(ids[3]);
        assert_eq!(space.num_allocated(), 2);
        assert_eq!(space.num_live(), 2);

        // The freed-then-compacted index is appended fresh, not recycled.
        let next = space.create_proxy(sphere_at(9.0, 1.0));
        assert_eq!(next.0, 2);
    }

    #[test]
    fn test_delete_is_idempotent_and_bounds_checked() {
        let mut space = Space::new();
        let id = space.create_proxy(sphere_at(0.0, 1.0));
        space.delete_proxy(id);
        space.delete_proxy(id);
        space.delete_proxy(ProxyId(999));
        space.update_proxy(id, sphere_at(5.0, 1.0));
        space.update_proxy(ProxyId(999), sphere_at(5.0, 1.0));
        assert_eq!(space.num_live(), 0);
    }

    #[test]
    fn test_nearest_tier_wins_tie_break() {
        let mut space = Space::new();
        space.set_views(vec![centered_view([4.0, 10.0, 40.0])]);

        // Touches both the R1 and R2 spheres.
        let id = space.create_proxy(sphere_at(3.0, 0.5));
        let mut changes = Vec::new();
        space.categorize_and_get_changes(&mut changes);

        assert_eq!(space.proxy(id).unwrap().region, Region::R1);
    }

    #[test]
    fn test_untouched_proxy_falls_back_to_unknown() {
        let mut space = Space::new();
        space.set_views(vec![centered_view([4.0, 10.0, 40.0])]);

        let id = space.create_proxy(sphere_at(5.0, 0.1));
        let mut changes = Vec::new();
        space.categorize_and_get_changes(&mut changes);
        assert_eq!(space.proxy(id).unwrap().region, Region::R2);

        // Move it beyond every sphere: back to Unknown.
        space.update_proxy(id, sphere_at(500.0, 0.1));
        changes.clear();
        space.categorize_and_get_changes(&mut changes);
        assert_eq!(space.proxy(id).unwrap().region, Region::Unknown);
        assert_eq!(space.proxy(id).unwrap().prev_region, Region::R2);
    }

    #[test]
    fn test_change_emitted_only_on_transition() {
        let mut space = Space::new();
        space.set_views(vec![centered_view([4.0, 10.0, 40.0])]);
        let id = space.create_proxy(sphere_at(1.0, 0.1));

        let mut changes = Vec::new();
        space.categorize_and_get_changes(&mut changes);
        assert_eq!(changes.len(), 1);
        assert_eq!(
            changes[0],
            Change {
                proxy_id: id,
                region: Region::R1,
                prev_region: Region::Unknown,
            }
        );

        // Nothing moved: second pass is silent.
        changes.clear();
        space.categorize_and_get_changes(&mut changes);
        assert!(changes.is_empty());
        assert_eq!(space.transition_count(Region::Unknown, Region::R1), 1);
    }

    #[test]
    fn test_three_proxies_across_tiers() {
        let mut space = Space::new();
        space.set_views(vec![centered_view([4.0, 10.0, 40.0])]);

        let near = space.create_proxy(sphere_at(1.0, 0.1));
        let mid = space.create_proxy(sphere_at(5.0, 0.1));
        let far = space.create_proxy(sphere_at(50.0, 0.1));

        let mut changes = Vec::new();
        space.categorize_and_get_changes(&mut changes);

        assert_eq!(space.proxy(near).unwrap().region, Region::R1);
        assert_eq!(space.proxy(mid).unwrap().region, Region::R2);
        assert_eq!(space.proxy(far).unwrap().region, Region::Unknown);

        // Only the two classified proxies transitioned away from Unknown.
        assert_eq!(changes.len(), 2);
        assert!(changes.iter().all(|c| c.prev_region == Region::Unknown));

        changes.clear();
        space.categorize_and_get_changes(&mut changes);
        assert!(changes.is_empty());
    }

    #[test]
    fn test_first_view_wins_at_equal_tier() {
        let mut first = centered_view([4.0, 10.0, 40.0]);
        first.origin = Vec3::new(-1.0, 0.0, 0.0);
        first.update_regions();
        let second = centered_view([4.0, 10.0, 40.0]);

        let mut space = Space::new();
        space.set_views(vec![first, second]);
        let id = space.create_proxy(sphere_at(0.0, 0.1));

        let mut changes = Vec::new();
        space.categorize_and_get_changes(&mut changes);

        // Both views claim R1; the classification is still a single R1.
        assert_eq!(space.proxy(id).unwrap().region, Region::R1);
        assert_eq!(changes.len(), 1);
    }
}
