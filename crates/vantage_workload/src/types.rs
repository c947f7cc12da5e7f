//! # Core Type Definitions
//!
//! Fundamental types shared by every stage of the workload pipeline: proxy
//! and owner identifiers, the bounding-sphere math primitives, the region
//! classification enum with its transition-index arithmetic, and the
//! per-frame [`Change`] records emitted by categorization.
//!
//! ## Design Principles
//!
//! - **Two id namespaces, two types**: [`ProxyId`] is a slot index into the
//!   engine's proxy array; [`Owner`] is the caller's entity handle. Keeping
//!   them as distinct wrapper types means one can never be passed where the
//!   other is expected.
//! - **Serialization**: the plain data types support serde so they can be
//!   carried in config files and diagnostic dumps.
//! - **Fail-safe classification**: regions order as R1 < R2 < R3 < R4 <
//!   Unknown < Invalid, so "nearest tier wins" comparisons and "is this
//!   proxy live" checks are ordinary integer comparisons.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of region tiers that are actively tracked by the pipeline
/// (R1..R3). Enter/exit lists, membership state, and regulators all have
/// exactly this arity.
pub const NUM_TRACKED_REGIONS: usize = 3;

/// Number of region tiers with defined spatial meaning (R1..R4).
pub const NUM_KNOWN_REGIONS: usize = 4;

// ============================================================================
// Identifiers
// ============================================================================

/// Index of a proxy slot inside the engine's backing array.
///
/// Proxy ids are handed out either by [`Space::create_proxy`] (which may
/// recycle a freed slot) or by [`Collection::allocate_id`] (which never
/// recycles). External code holds only this integer, never a reference to
/// the proxy itself; that indirection is what keeps slot recycling and the
/// deferred transaction model safe across threads.
///
/// [`Space::create_proxy`]: crate::space::Space::create_proxy
/// [`Collection::allocate_id`]: crate::collection::Collection::allocate_id
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProxyId(pub u32);

impl ProxyId {
    /// Returns the id as a usize array index.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for ProxyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "proxy#{}", self.0)
    }
}

impl From<u32> for ProxyId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

/// Handle identifying the entity a proxy stands in for.
///
/// Owners live in the caller's namespace and are carried opaquely: the
/// engine stores them on reset and hands them back on lookup so downstream
/// systems can map a [`ProxyId`] back to their own object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Owner(pub Uuid);

impl Owner {
    /// Creates a new random owner handle.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for Owner {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Owner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Math primitives
// ============================================================================

/// 3D vector with single-precision components.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    /// Creates a new vector with the specified components.
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// The zero vector.
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Squared distance to another point.
    pub fn distance_squared(self, other: Vec3) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    /// Distance to another point.
    pub fn distance(self, other: Vec3) -> f32 {
        self.distance_squared(other).sqrt()
    }

    /// Component-wise scale.
    pub fn scaled(self, s: f32) -> Vec3 {
        Vec3::new(self.x * s, self.y * s, self.z * s)
    }

    /// Component-wise addition.
    pub fn added(self, other: Vec3) -> Vec3 {
        Vec3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

/// Bounding sphere: the only spatial volume the classifier works with.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Sphere {
    /// World-space center.
    pub center: Vec3,
    /// Radius; zero is a valid point sphere.
    pub radius: f32,
}

impl Sphere {
    /// Creates a new sphere.
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Whether this sphere touches (intersects or is tangent inside) the
    /// other sphere, using the squared-distance form so no square root is
    /// taken on the hot categorization path.
    pub fn touches(&self, other: &Sphere) -> bool {
        let reach = self.radius + other.radius;
        self.center.distance_squared(other.center) < reach * reach
    }
}

// ============================================================================
// Regions
// ============================================================================

/// Distance-based interest tier, ordered nearest first.
///
/// R1 is the nearest, most authoritative tier (physics-owned in the host
/// simulation); R4 is the furthest tier with spatial meaning. `Unknown`
/// marks a proxy that touched no region sphere of any view, and `Invalid`
/// marks a freed slot. Categorization only ever assigns R1..R3 or
/// `Unknown`; R4 exists for transition bookkeeping.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum Region {
    /// Nearest tier, physics-owned.
    R1 = 0,
    /// Near tier.
    R2 = 1,
    /// Mid tier.
    R3 = 2,
    /// Far tier, not actively tracked.
    R4 = 3,
    /// Touched no region sphere of any view.
    Unknown = 4,
    /// Freed slot; never categorized.
    Invalid = 5,
}

/// Total number of region tags, including `Unknown` and `Invalid`.
pub const NUM_REGION_TAGS: usize = 6;

/// Sentinel returned by [`Region::transition_index`] for the no-change
/// diagonal.
pub const NO_TRANSITION: usize = usize::MAX;

impl Region {
    /// All region tags, in tier order.
    pub const ALL: [Region; NUM_REGION_TAGS] = [
        Region::R1,
        Region::R2,
        Region::R3,
        Region::R4,
        Region::Unknown,
        Region::Invalid,
    ];

    /// The tracked tier at `index`, for `index < NUM_TRACKED_REGIONS`.
    pub fn tracked(index: usize) -> Region {
        debug_assert!(index < NUM_TRACKED_REGIONS);
        Self::ALL[index]
    }

    /// Returns this tag as a dense array index.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Returns the tracked-region index for R1..R3, or `None` for any tag
    /// outside the tracked range. Fan-out tables sized
    /// `2 * NUM_TRACKED_REGIONS` must index through this so an R4 or
    /// `Unknown` tag can never write out of bounds.
    pub fn tracked_index(self) -> Option<usize> {
        let i = self.index();
        (i < NUM_TRACKED_REGIONS).then_some(i)
    }

    /// Whether this tag has defined spatial meaning (R1..R4).
    pub fn is_known(self) -> bool {
        self.index() < NUM_KNOWN_REGIONS
    }

    /// Maps an ordered `(prev, new)` pair with `prev != new` onto the dense
    /// range `[0, NUM_REGION_TAGS * (NUM_REGION_TAGS - 1))` for O(1) lookup
    /// into transition-count tables. Returns [`NO_TRANSITION`] for the
    /// diagonal.
    pub fn transition_index(prev: Region, new: Region) -> usize {
        if prev == new {
            return NO_TRANSITION;
        }
        let p = prev.index();
        let n = new.index();
        // Skip the diagonal entry in each row to keep the range dense.
        p * (NUM_REGION_TAGS - 1) + n - usize::from(n > p)
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Region::R1 => "R1",
            Region::R2 => "R2",
            Region::R3 => "R3",
            Region::R4 => "R4",
            Region::Unknown => "unknown",
            Region::Invalid => "invalid",
        };
        write!(f, "{name}")
    }
}

// ============================================================================
// Changes
// ============================================================================

/// One region transition observed during a categorization pass.
///
/// Emitted at most once per proxy per frame, and only when the newly
/// computed region differs from the previous pass's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Change {
    /// The proxy that moved tiers.
    pub proxy_id: ProxyId,
    /// Region computed this pass.
    pub region: Region,
    /// Region computed by the immediately preceding pass.
    pub prev_region: Region,
}

impl Change {
    /// Transition-count table index for this change.
    pub fn transition_index(&self) -> usize {
        Region::transition_index(self.prev_region, self.region)
    }
}
