//! # Collection
//!
//! The thread-safe front end of the engine: decouples concurrent producers
//! of spatial-state changes from the single frame thread that applies them.
//!
//! Producers enqueue [`Transaction`]s into a mutex-guarded pending queue at
//! any time. At a frame boundary the frame thread calls
//! [`enqueue_frame`](Collection::enqueue_frame), which swaps the entire
//! pending queue out under the lock, consolidates it (FIFO by enqueue
//! order) into one transaction, and pushes that onto a second, separately
//! locked frames queue. Producers keep enqueueing into the fresh pending
//! queue while the consolidated frame awaits processing.
//!
//! [`process_transaction_queue`](Collection::process_transaction_queue)
//! then drains the frames queue and applies each consolidated frame to the
//! [`Space`] in a fixed order: resets, then updates, then removes. The
//! order is a documented simplification, not a per-event guarantee: a reset
//! and a remove of the same id racing into one frame always net to
//! "removed", regardless of which producer enqueued first.
//!
//! The space itself needs no lock here: `&mut Space` makes the apply step
//! exclusive by construction, which is the role the item-array mutex plays
//! in a shared-pointer design.

use crate::space::Space;
use crate::transaction::Transaction;
use crate::types::ProxyId;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Mutex;
use tracing::trace;

/// Thread-safe transaction intake and proxy-id allocator.
#[derive(Debug, Default)]
pub struct Collection {
    /// Monotonic id source; the high-water mark drives backing-array
    /// growth. Ids handed out here are never reused.
    next_id: AtomicU32,
    /// Frame counter, incremented by each `enqueue_frame`.
    frame_count: AtomicU64,
    /// Producer-facing queue; any thread may push.
    pending: Mutex<Vec<Transaction>>,
    /// Consolidated per-frame transactions awaiting the frame thread.
    frames: Mutex<Vec<Transaction>>,
}

impl Collection {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh proxy id. Thread-safe; ids are monotonic and never
    /// recycled by the allocator (slot reuse is the free list's business,
    /// and only for the direct [`Space`] API).
    pub fn allocate_id(&self) -> ProxyId {
        ProxyId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// One past the highest id ever allocated.
    pub fn high_water(&self) -> usize {
        self.next_id.load(Ordering::Relaxed) as usize
    }

    /// Number of frame boundaries recorded so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count.load(Ordering::Relaxed)
    }

    /// Appends a transaction to the pending queue. Safe from any thread at
    /// any time; empty transactions are dropped.
    pub fn enqueue_transaction(&self, transaction: Transaction) {
        if transaction.is_empty() {
            return;
        }
        self.pending
            .lock()
            .expect("pending queue poisoned")
            .push(transaction);
    }

    /// Marks a frame boundary: swaps out the entire pending queue,
    /// consolidates it into a single transaction, pushes that onto the
    /// frames queue, and returns the new frame number.
    pub fn enqueue_frame(&self) -> u64 {
        let batch = std::mem::take(&mut *self.pending.lock().expect("pending queue poisoned"));

        // Consolidation happens outside the pending lock so producers are
        // never blocked behind the merge.
        let consolidated = Transaction::merge_batch(batch);
        if !consolidated.is_empty() {
            self.frames
                .lock()
                .expect("frames queue poisoned")
                .push(consolidated);
        }

        self.frame_count.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Drains the frames queue and applies every consolidated frame to the
    /// space, in FIFO order. Called once per frame by the frame thread,
    /// before categorization.
    pub fn process_transaction_queue(&self, space: &mut Space) {
        let frames = std::mem::take(&mut *self.frames.lock().expect("frames queue poisoned"));
        for frame in frames {
            self.process_transaction_frame(space, frame);
        }
    }

    /// Applies one consolidated frame: grows the backing array to the
    /// allocator high-water mark, then applies resets, updates, and removes
    /// in that fixed order. Updates and removes of unknown or freed ids are
    /// no-ops.
    fn process_transaction_frame(&self, space: &mut Space, frame: Transaction) {
        space.ensure_capacity(self.high_water());

        for reset in frame.resets() {
            space.reset_slot(reset.id, reset.sphere, reset.owner);
        }
        for update in frame.updates() {
            space.update_proxy(update.id, update.sphere);
        }
        for &id in frame.removes() {
            space.delete_proxy(id);
        }

        trace!(
            resets = frame.resets().len(),
            updates = frame.updates().len(),
            removes = frame.removes().len(),
            "applied transaction frame"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Region, Sphere, Vec3};

    fn sphere(x: f32) -> Sphere {
        Sphere::new(Vec3::new(x, 0.0, 0.0), 1.0)
    }

    #[test]
    fn test_allocate_id_is_monotonic() {
        let collection = Collection::new();
        let a = collection.allocate_id();
        let b = collection.allocate_id();
        assert!(b.0 > a.0);
        assert_eq!(collection.high_water(), 2);
    }

    #[test]
    fn test_allocate_id_unique_across_threads() {
        let collection = std::sync::Arc::new(Collection::new());
        let mut handles = Vec::new();
        for _ in 0..4 {
            let collection = collection.clone();
            handles.push(std::thread::spawn(move || {
                (0..250).map(|_| collection.allocate_id()).collect::<Vec<_>>()
            }));
        }

        let mut all: Vec<ProxyId> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), 1000);
        assert_eq!(collection.high_water(), 1000);
    }

    #[test]
    fn test_frame_applies_reset_then_update_then_remove() {
        let collection = Collection::new();
        let mut space = Space::new();
        let id = collection.allocate_id();

        // Remove enqueued before the reset; the fixed apply order still
        // nets to "removed".
        let mut early_remove = Transaction::new();
        early_remove.remove(id);
        collection.enqueue_transaction(early_remove);

        let mut reset = Transaction::new();
        reset.reset(id, Some(sphere(1.0)), None);
        collection.enqueue_transaction(reset);

        collection.enqueue_frame();
        collection.process_transaction_queue(&mut space);

        assert!(space.proxy(id).is_none());
        assert_eq!(space.num_live(), 0);
    }

    #[test]
    fn test_two_stage_queue_keeps_later_transactions_for_next_frame() {
        let collection = Collection::new();
        let mut space = Space::new();
        let id = collection.allocate_id();

        let mut reset = Transaction::new();
        reset.reset(id, Some(sphere(1.0)), None);
        collection.enqueue_transaction(reset);
        assert_eq!(collection.enqueue_frame(), 1);

        // Arrives after the frame boundary: not part of frame 1.
        let mut update = Transaction::new();
        update.update(id, sphere(9.0));
        collection.enqueue_transaction(update);

        collection.process_transaction_queue(&mut space);
        assert_eq!(space.proxy(id).unwrap().sphere, sphere(1.0));
        assert_eq!(space.proxy(id).unwrap().region, Region::Unknown);

        assert_eq!(collection.enqueue_frame(), 2);
        collection.process_transaction_queue(&mut space);
        assert_eq!(space.proxy(id).unwrap().sphere, sphere(9.0));
    }

    #[test]
    fn test_capacity_growth_covers_sparse_ids() {
        let collection = Collection::new();
        let mut space = Space::new();

        // Burn through ids so the live one lands far past the array tail.
        for _ in 0..31 {
            collection.allocate_id();
        }
        let id = collection.allocate_id();

        let mut t = Transaction::new();
        t.reset(id, Some(sphere(2.0)), None);
        collection.enqueue_transaction(t);
        collection.enqueue_frame();
        collection.process_transaction_queue(&mut space);

        assert!(space.num_allocated() >= 32);
        assert_eq!(space.num_live(), 1);
        assert!(space.proxy(id).is_some());
    }
}
