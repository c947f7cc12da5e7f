//! # Views and Region Spheres
//!
//! A [`View`] is one observer of the world: a camera or avatar eye whose
//! frustum is approximated by concentric bounding spheres, one per tracked
//! region tier. The spheres are cheap stand-ins for the real frustum so the
//! categorization pass is a handful of squared-distance tests per proxy
//! instead of plane clipping.
//!
//! Each tracked region carries a `[back, front]` distance pair: the sphere
//! spans from `back` behind the view origin to `front` ahead of it along
//! the view direction. The derived spheres are recomputed whenever the
//! origin, direction, or back/front pairs change.

use crate::types::{Sphere, Vec3, NUM_TRACKED_REGIONS};
use serde::{Deserialize, Serialize};

/// Per-region `[back, front]` distance pair, in meters.
pub type BackFront = [f32; 2];

/// Default region extents: R1 tight around the viewer, R3 covering the
/// far interest horizon. These are the seed values the regulator adjusts
/// from.
pub const DEFAULT_BACK_FRONTS: [BackFront; NUM_TRACKED_REGIONS] =
    [[2.0, 10.0], [4.0, 30.0], [6.0, 100.0]];

/// Snapshot of a camera frustum, taken once per frame by the host.
///
/// Only the fields the sphere approximation needs are carried; clip-plane
/// detail stays with the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frustum {
    /// World-space eye position.
    pub position: Vec3,
    /// Normalized forward vector.
    pub direction: Vec3,
    /// Horizontal field of view, radians.
    pub fov: f32,
    /// Far clip distance.
    pub far_clip: f32,
}

/// One observer, approximated as concentric per-region spheres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct View {
    /// World-space origin of the view.
    pub origin: Vec3,
    /// Normalized forward vector.
    pub direction: Vec3,
    /// Outer radius of interest; the far bound the regulator may grow to.
    pub max_radius: f32,
    /// Horizontal field of view carried through from the frustum.
    pub fov: f32,
    /// Per-tracked-region `[back, front]` extents.
    pub region_back_fronts: [BackFront; NUM_TRACKED_REGIONS],
    /// Derived bounding spheres, one per tracked region. Always kept in
    /// sync with `origin`/`direction`/`region_back_fronts`.
    pub regions: [Sphere; NUM_TRACKED_REGIONS],
}

impl View {
    /// Creates a view at `origin` facing `direction` with the default
    /// region extents.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        let mut view = Self {
            origin,
            direction,
            max_radius: DEFAULT_BACK_FRONTS[NUM_TRACKED_REGIONS - 1][1],
            fov: std::f32::consts::FRAC_PI_2,
            region_back_fronts: DEFAULT_BACK_FRONTS,
            regions: [Sphere::default(); NUM_TRACKED_REGIONS],
        };
        view.update_regions();
        view
    }

    /// Builds a view from a frustum snapshot, offset along the frustum
    /// direction (used by the host to center regions slightly ahead of a
    /// moving camera).
    pub fn eval_from_frustum(frustum: &Frustum, offset: Vec3) -> Self {
        let mut view = Self::new(frustum.position.added(offset), frustum.direction);
        view.fov = frustum.fov;
        view.max_radius = view.max_radius.max(frustum.far_clip);
        view.update_regions();
        view
    }

    /// Replaces the per-region extents and rederives the spheres.
    pub fn set_back_fronts(&mut self, back_fronts: [BackFront; NUM_TRACKED_REGIONS]) {
        self.region_back_fronts = back_fronts;
        self.update_regions();
    }

    /// Recomputes the region spheres from origin, direction, and extents.
    ///
    /// A `[back, front]` pair spans `[origin - back * dir, origin + front * dir]`,
    /// so the sphere center sits at the midpoint of that segment and the
    /// radius is half its length.
    pub fn update_regions(&mut self) {
        for (i, [back, front]) in self.region_back_fronts.iter().enumerate() {
            let center = self
                .origin
                .added(self.direction.scaled((front - back) * 0.5));
            self.regions[i] = Sphere::new(center, (front + back) * 0.5);
        }
    }
}
