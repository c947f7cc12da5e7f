//! # Transactions
//!
//! A [`Transaction`] is a deferred batch of proxy mutations: resets
//! (create-or-refresh), sphere updates, and removes. Producers on any
//! thread build transactions and hand them to the
//! [`Collection`](crate::collection::Collection); nothing touches the live
//! proxy array until the frame thread applies the consolidated batch.
//!
//! Transactions merge by concatenating their three lists, preserving
//! enqueue order, so any number of per-thread batches collapse into one
//! per-frame transaction deterministically.

use crate::types::{Owner, ProxyId, Sphere};

/// A pending reset: create or refresh the slot at `id`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reset {
    pub id: ProxyId,
    pub sphere: Sphere,
    pub owner: Option<Owner>,
}

/// A pending sphere update for an existing slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Update {
    pub id: ProxyId,
    pub sphere: Sphere,
}

/// Deferred batch of proxy mutations.
#[derive(Debug, Clone, Default)]
pub struct Transaction {
    resets: Vec<Reset>,
    updates: Vec<Update>,
    removes: Vec<ProxyId>,
}

impl Transaction {
    /// Creates an empty transaction.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a create-or-refresh of the slot at `id`. A reset with an
    /// absent sphere payload silently demotes to a remove.
    pub fn reset(&mut self, id: ProxyId, sphere: Option<Sphere>, owner: Option<Owner>) {
        match sphere {
            Some(sphere) => self.resets.push(Reset { id, sphere, owner }),
            None => self.removes.push(id),
        }
    }

    /// Queues a sphere update for `id`.
    pub fn update(&mut self, id: ProxyId, sphere: Sphere) {
        self.updates.push(Update { id, sphere });
    }

    /// Queues a remove of `id`.
    pub fn remove(&mut self, id: ProxyId) {
        self.removes.push(id);
    }

    /// Whether all three lists are empty.
    pub fn is_empty(&self) -> bool {
        self.resets.is_empty() && self.updates.is_empty() && self.removes.is_empty()
    }

    /// Total number of queued mutations.
    pub fn len(&self) -> usize {
        self.resets.len() + self.updates.len() + self.removes.len()
    }

    /// Appends copies of another transaction's lists onto this one.
    pub fn merge(&mut self, other: &Transaction) {
        self.resets.extend_from_slice(&other.resets);
        self.updates.extend_from_slice(&other.updates);
        self.removes.extend_from_slice(&other.removes);
    }

    /// Destructive-move variant of [`merge`](Self::merge): drains the other
    /// transaction's lists instead of copying them.
    pub fn absorb(&mut self, mut other: Transaction) {
        self.resets.append(&mut other.resets);
        self.updates.append(&mut other.updates);
        self.removes.append(&mut other.removes);
    }

    /// Consolidates a FIFO batch of transactions into one, reserving
    /// capacity up front by summing sizes so the concatenation never
    /// reallocates.
    pub fn merge_batch(batch: Vec<Transaction>) -> Transaction {
        let mut merged = Transaction {
            resets: Vec::with_capacity(batch.iter().map(|t| t.resets.len()).sum()),
            updates: Vec::with_capacity(batch.iter().map(|t| t.updates.len()).sum()),
            removes: Vec::with_capacity(batch.iter().map(|t| t.removes.len()).sum()),
        };
        for transaction in batch {
            merged.absorb(transaction);
        }
        merged
    }

    /// Queued resets, in enqueue order.
    pub fn resets(&self) -> &[Reset] {
        &self.resets
    }

    /// Queued updates, in enqueue order.
    pub fn updates(&self) -> &[Update] {
        &self.updates
    }

    /// Queued removes, in enqueue order.
    pub fn removes(&self) -> &[ProxyId] {
        &self.removes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Vec3;

    fn sphere(x: f32) -> Sphere {
        Sphere::new(Vec3::new(x, 0.0, 0.0), 1.0)
    }

    #[test]
    fn test_reset_without_payload_demotes_to_remove() {
        let mut t = Transaction::new();
        t.reset(ProxyId(3), None, None);

        assert!(t.resets().is_empty());
        assert_eq!(t.removes(), &[ProxyId(3)]);
    }

    #[test]
    fn test_merge_batch_concatenates_in_enqueue_order() {
        let mut a = Transaction::new();
        a.reset(ProxyId(0), Some(sphere(0.0)), None);
        a.update(ProxyId(0), sphere(1.0));

        let mut b = Transaction::new();
        b.reset(ProxyId(1), Some(sphere(2.0)), None);
        b.remove(ProxyId(0));

        let mut c = Transaction::new();
        c.update(ProxyId(1), sphere(3.0));

        let merged = Transaction::merge_batch(vec![a.clone(), b.clone(), c.clone()]);

        // Each list is exactly A ++ B ++ C.
        assert_eq!(
            merged.resets().iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![ProxyId(0), ProxyId(1)]
        );
        assert_eq!(
            merged.updates().iter().map(|u| u.id).collect::<Vec<_>>(),
            vec![ProxyId(0), ProxyId(1)]
        );
        assert_eq!(merged.removes(), &[ProxyId(0)]);

        // Copying merge agrees with the batch merge.
        let mut copied = Transaction::new();
        copied.merge(&a);
        copied.merge(&b);
        copied.merge(&c);
        assert_eq!(copied.resets(), merged.resets());
        assert_eq!(copied.updates(), merged.updates());
        assert_eq!(copied.removes(), merged.removes());
    }

    #[test]
    fn test_absorb_drains_source() {
        let mut a = Transaction::new();
        a.update(ProxyId(7), sphere(1.0));
        let mut b = Transaction::new();
        b.update(ProxyId(8), sphere(2.0));

        a.absorb(b);
        assert_eq!(a.updates().len(), 2);
    }
}
