//! # Vantage Workload Engine
//!
//! A concurrent, transactionally-updated spatial index that continuously
//! reclassifies a population of moving objects ("proxies") into
//! distance-based interest regions relative to one or more viewer frusta,
//! and emits ordered enter/exit delta events for downstream simulation and
//! physics systems.
//!
//! ## Core Concepts
//!
//! ### Proxies and Regions
//! Every trackable object is represented by a bounding-sphere proxy,
//! referred to only by integer id. Each frame every live proxy is
//! classified into one of the concentric region tiers of the nearest view:
//! R1 (nearest, physics-owned) through R3, or `Unknown` when it touches no
//! region sphere at all.
//!
//! ### Deferred Transactions
//! Producers on any thread batch proxy resets/updates/removes into
//! [`Transaction`]s and enqueue them on the shared [`Collection`]. At each
//! frame boundary the pending queue is swapped out and consolidated; the
//! frame thread later applies the consolidated batches to the [`Space`] in
//! a fixed reset → update → remove order.
//!
//! ### Differential Membership
//! Region transitions are fanned out into per-region exit/enter id lists
//! and folded into persistent sorted membership lists with a single-pass
//! three-way merge, so downstream consumers see deltas, not full scans.
//!
//! ### Regulation
//! Each tracked region carries a processing-time budget; a proportional
//! feedback controller grows or shrinks the region's view extents to keep
//! measured time on budget.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Workload Engine                         │
//! │  ┌────────────┐   ┌───────┐   ┌─────────┐   ┌─────────────┐  │
//! │  │ Collection │──►│ Space │──►│ Tracker │──►│ RegionState │  │
//! │  │  - queues  │   │ -slots│   │ -changes│   │ -membership │  │
//! │  │  - id pool │   │ -views│   │ -fan-out│   │ -counts     │  │
//! │  └────────────┘   └───────┘   └─────────┘   └─────────────┘  │
//! │         ▲             ▲                            │         │
//! │     producers    ControlViews ◄────── timings ─────┘         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start Example
//!
//! ```rust
//! use vantage_workload::*;
//! use std::time::Duration;
//!
//! let mut engine = create_workload_engine();
//! engine.set_views(vec![View::new(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0))]);
//!
//! // A producer thread would normally do this through the shared handle.
//! let collection = engine.collection();
//! let id = collection.allocate_id();
//! let mut t = Transaction::new();
//! t.reset(id, Some(Sphere::new(Vec3::new(1.0, 0.0, 0.0), 0.5)), None);
//! collection.enqueue_transaction(t);
//! collection.enqueue_frame();
//!
//! engine.tick(1.0 / 60.0, &[Duration::from_millis(1); NUM_TRACKED_REGIONS]);
//! assert_eq!(engine.stats().snapshot().region_counts[0], 1);
//! ```

pub mod collection;
pub mod engine;
pub mod jobs;
pub mod space;
pub mod transaction;
pub mod types;
pub mod views;

pub use collection::Collection;
pub use engine::{
    create_workload_engine, EngineConfig, EngineError, EngineStats, StatsSnapshot, WorkloadEngine,
};
pub use jobs::regulator::{ControlViews, Regulator};
pub use jobs::state::RegionState;
pub use jobs::tracker::RegionTracker;
pub use jobs::{empty_region_lists, RegionLists, NUM_REGION_LISTS};
pub use space::{Proxy, Space};
pub use transaction::{Reset, Transaction, Update};
pub use types::{
    Change, Owner, ProxyId, Region, Sphere, Vec3, NO_TRANSITION, NUM_KNOWN_REGIONS,
    NUM_REGION_TAGS, NUM_TRACKED_REGIONS,
};
pub use views::{BackFront, Frustum, View, DEFAULT_BACK_FRONTS};
