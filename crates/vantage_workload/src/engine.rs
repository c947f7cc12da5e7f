//! # Workload Engine
//!
//! Owns the full pipeline and runs it once per frame in the documented
//! order:
//!
//! ```text
//! producers ──enqueue──► Collection ──frames──► Space ──changes──► RegionTracker
//!                                                                       │
//!                 ControlViews ◄── timings ── RegionState ◄── exit/enter lists
//! ```
//!
//! One `tick` drains the consolidated transaction frames into the space,
//! categorizes every live proxy, fans the transitions out into per-region
//! exit/enter lists, folds those into the persistent membership lists, and
//! finally regulates the view extents against the per-region time budgets.
//! The engine is owned by exactly one frame thread; producers only ever
//! hold the shared [`Collection`] handle.

use crate::collection::Collection;
use crate::jobs::regulator::{ControlViews, Regulator};
use crate::jobs::state::RegionState;
use crate::jobs::tracker::RegionTracker;
use crate::jobs::{empty_region_lists, RegionLists};
use crate::space::Space;
use crate::types::{Change, NUM_TRACKED_REGIONS};
use crate::views::{BackFront, View};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Errors surfaced while constructing an engine from configuration.
///
/// These exist only for the construction surface: once an engine is built,
/// the frame pipeline itself never fails — misuse degrades to no-ops or an
/// `Unknown` classification.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A region's minimum extent exceeds its maximum.
    #[error("region {region} clamp range inverted: min {min:?} exceeds max {max:?}")]
    InvertedRange {
        region: usize,
        min: BackFront,
        max: BackFront,
    },
    /// A region's time budget is zero.
    #[error("region {region} has a zero time budget")]
    ZeroBudget { region: usize },
}

/// Per-region regulation settings.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Per-region processing-time budgets.
    pub budgets: [Duration; NUM_TRACKED_REGIONS],
    /// Per-region minimum back/front extents.
    pub min_ranges: [BackFront; NUM_TRACKED_REGIONS],
    /// Per-region maximum back/front extents.
    pub max_ranges: [BackFront; NUM_TRACKED_REGIONS],
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            budgets: [
                Duration::from_millis(2),
                Duration::from_millis(4),
                Duration::from_millis(6),
            ],
            min_ranges: [[1.0, 5.0], [2.0, 10.0], [3.0, 20.0]],
            max_ranges: [[10.0, 50.0], [20.0, 150.0], [30.0, 400.0]],
        }
    }
}

impl EngineConfig {
    fn validate(&self) -> Result<(), EngineError> {
        for region in 0..NUM_TRACKED_REGIONS {
            let (min, max) = (self.min_ranges[region], self.max_ranges[region]);
            if min[0] > max[0] || min[1] > max[1] {
                return Err(EngineError::InvertedRange { region, min, max });
            }
            if self.budgets[region].is_zero() {
                return Err(EngineError::ZeroBudget { region });
            }
        }
        Ok(())
    }
}

// ============================================================================
// Stats
// ============================================================================

/// Read-only counters published by the engine for display and
/// instrumentation (the debug-HUD surface). Shared by `Arc`; readers take
/// snapshots, never locks.
#[derive(Debug, Default)]
pub struct EngineStats {
    frames: AtomicU64,
    total_changes: AtomicU64,
    region_counts: [AtomicUsize; NUM_TRACKED_REGIONS],
    last_categorize_us: AtomicU64,
    last_tick_us: AtomicU64,
}

impl EngineStats {
    fn publish_counts(&self, counts: [usize; NUM_TRACKED_REGIONS]) {
        for (slot, count) in self.region_counts.iter().zip(counts) {
            slot.store(count, Ordering::Relaxed);
        }
    }

    /// Takes a coherent-enough snapshot for display purposes.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            frames: self.frames.load(Ordering::Relaxed),
            total_changes: self.total_changes.load(Ordering::Relaxed),
            region_counts: std::array::from_fn(|i| {
                self.region_counts[i].load(Ordering::Relaxed)
            }),
            last_categorize: Duration::from_micros(
                self.last_categorize_us.load(Ordering::Relaxed),
            ),
            last_tick: Duration::from_micros(self.last_tick_us.load(Ordering::Relaxed)),
        }
    }
}

/// Point-in-time copy of [`EngineStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Frames processed since creation.
    pub frames: u64,
    /// Region transitions observed since creation.
    pub total_changes: u64,
    /// Current population of R1..R3.
    pub region_counts: [usize; NUM_TRACKED_REGIONS],
    /// Duration of the most recent categorize-and-track phase.
    pub last_categorize: Duration,
    /// Duration of the most recent full tick.
    pub last_tick: Duration,
}

// ============================================================================
// Engine
// ============================================================================

/// The frame-orchestrating owner of the workload pipeline.
#[derive(Debug)]
pub struct WorkloadEngine {
    space: Space,
    collection: Arc<Collection>,
    tracker: RegionTracker,
    region_state: RegionState,
    control_views: ControlViews,
    region_lists: RegionLists,
    stats: Arc<EngineStats>,
}

impl WorkloadEngine {
    /// Builds an engine from validated configuration.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let regulators = std::array::from_fn(|i| {
            Regulator::new(config.budgets[i], config.min_ranges[i], config.max_ranges[i])
        });

        Ok(Self {
            space: Space::new(),
            collection: Arc::new(Collection::new()),
            tracker: RegionTracker::new(),
            region_state: RegionState::new(),
            control_views: ControlViews::new(regulators),
            region_lists: empty_region_lists(),
            stats: Arc::new(EngineStats::default()),
        })
    }

    /// The shared producer handle. Clone this into any thread that needs to
    /// allocate ids or enqueue transactions.
    pub fn collection(&self) -> Arc<Collection> {
        self.collection.clone()
    }

    /// The shared stats handle for HUD/instrumentation readers.
    pub fn stats(&self) -> Arc<EngineStats> {
        self.stats.clone()
    }

    /// The authoritative space. Frame-thread only.
    pub fn space(&self) -> &Space {
        &self.space
    }

    /// Mutable space access for the direct (non-transactional) front end.
    /// Frame-thread only; do not mix with allocator-sourced ids.
    pub fn space_mut(&mut self) -> &mut Space {
        &mut self.space
    }

    /// Replaces the view snapshot for subsequent ticks.
    pub fn set_views(&mut self, views: Vec<View>) {
        self.space.set_views(views);
    }

    /// The changes emitted by the most recent tick.
    pub fn last_changes(&self) -> &[Change] {
        self.tracker.changes()
    }

    /// Per-region regulators, for timing diagnostics.
    pub fn regulators(&self) -> &[Regulator; NUM_TRACKED_REGIONS] {
        self.control_views.regulators()
    }

    /// The current sorted membership of a tracked region.
    pub fn region_members(&self, region: usize) -> &[crate::types::ProxyId] {
        self.region_state.members(region)
    }

    /// Runs one frame: drain transactions, categorize, track, merge
    /// membership, regulate views.
    ///
    /// `delta_time` is the wall-clock frame delta in seconds;
    /// `region_timings` is the measured downstream processing time per
    /// tracked region from the previous frame, fed back into the
    /// regulators.
    pub fn tick(
        &mut self,
        delta_time: f32,
        region_timings: &[Duration; NUM_TRACKED_REGIONS],
    ) {
        let tick_start = Instant::now();

        self.collection.process_transaction_queue(&mut self.space);

        let categorize_start = Instant::now();
        self.tracker.run(Some(&mut self.space), &mut self.region_lists);
        self.region_state.run(&self.region_lists);
        let categorize_elapsed = categorize_start.elapsed();

        self.stats.publish_counts(self.region_state.counts());
        self.stats
            .total_changes
            .fetch_add(self.tracker.changes().len() as u64, Ordering::Relaxed);

        // Regulation rewrites the extents wholesale, as setViews would.
        let mut views = self.space.views().to_vec();
        self.control_views
            .run(delta_time, region_timings, &mut views);
        self.space.set_views(views);

        self.stats
            .last_categorize_us
            .store(categorize_elapsed.as_micros() as u64, Ordering::Relaxed);
        self.stats
            .last_tick_us
            .store(tick_start.elapsed().as_micros() as u64, Ordering::Relaxed);
        let frame = self.stats.frames.fetch_add(1, Ordering::Relaxed) + 1;

        if !self.tracker.changes().is_empty() {
            debug!(
                frame,
                changes = self.tracker.changes().len(),
                counts = ?self.region_state.counts(),
                "tick"
            );
        }
    }
}

/// Creates an engine with the default regulation configuration.
pub fn create_workload_engine() -> WorkloadEngine {
    WorkloadEngine::new(EngineConfig::default()).expect("default config is valid")
}
