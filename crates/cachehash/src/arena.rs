//! Slot arena threaded by a doubly linked recency list
//!
//! All slots are allocated in one block when the arena is created and stay
//! linked for its whole lifetime; only their entries are filled and cleared.
//! The head is the most recently used slot, the tail the eviction candidate.

use crate::error::{Error, Result};

/// Key/value payload of an occupied slot
pub(crate) struct Entry<V> {
    pub(crate) key: Box<[u8]>,
    pub(crate) value: V,
}

/// One arena unit
pub(crate) struct Slot<V> {
    pub(crate) entry: Option<Entry<V>>,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Fixed pool of slots plus recency list bookkeeping
pub(crate) struct SlotArena<V> {
    slots: Vec<Slot<V>>,
    head: usize,
    tail: usize,
}

impl<V> SlotArena<V> {
    /// Allocate `capacity` empty slots chained in index order
    pub(crate) fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than 0");

        let slots = (0..capacity)
            .map(|i| Slot {
                entry: None,
                prev: i.checked_sub(1),
                next: (i + 1 < capacity).then_some(i + 1),
            })
            .collect();

        Self {
            slots,
            head: 0,
            tail: capacity - 1,
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn tail(&self) -> usize {
        self.tail
    }

    pub(crate) fn entry(&self, idx: usize) -> Option<&Entry<V>> {
        self.slots[idx].entry.as_ref()
    }

    /// Store an entry in a free slot
    pub(crate) fn fill(&mut self, idx: usize, key: Box<[u8]>, value: V) {
        let slot = &mut self.slots[idx];
        debug_assert!(slot.entry.is_none(), "slot {} is already occupied", idx);
        slot.entry = Some(Entry { key, value });
    }

    /// Clear a slot, leaving it linked where it is
    pub(crate) fn take(&mut self, idx: usize) -> Option<Entry<V>> {
        self.slots[idx].entry.take()
    }

    /// Move a slot to the head of the recency list
    pub(crate) fn promote(&mut self, idx: usize) {
        if self.head == idx {
            return; // Already at front
        }

        // Detach
        let (prev, next) = (self.slots[idx].prev, self.slots[idx].next);
        let Some(prev) = prev else {
            panic!("slot {} is not the head but has no predecessor", idx);
        };
        self.slots[prev].next = next;
        match next {
            Some(next_idx) => self.slots[next_idx].prev = Some(prev),
            None => self.tail = prev,
        }

        // Attach at head
        let old_head = self.head;
        let slot = &mut self.slots[idx];
        slot.prev = None;
        slot.next = Some(old_head);
        self.slots[old_head].prev = Some(idx);
        self.head = idx;
    }

    /// Walk slots from head to tail
    pub(crate) fn iter(&self) -> Iter<'_, V> {
        Iter {
            arena: self,
            cursor: Some(self.head),
            remaining: self.slots.len(),
        }
    }

    /// Consume the arena, handing each entry to `f` from head to tail
    ///
    /// Returns the number of entries drained.
    pub(crate) fn drain(mut self, mut f: impl FnMut(Entry<V>)) -> usize {
        let mut drained = 0;
        let mut cursor = Some(self.head);
        while let Some(idx) = cursor {
            let slot = &mut self.slots[idx];
            if let Some(entry) = slot.entry.take() {
                f(entry);
                drained += 1;
            }
            cursor = slot.next;
        }
        drained
    }

    /// Verify the list threads every slot exactly once
    pub(crate) fn check_links(&self) -> Result<()> {
        if self.slots[self.head].prev.is_some() {
            return Err(Error::Invariant(format!("head slot {} has a predecessor", self.head)));
        }

        let mut visited = 0;
        let mut prev = None;
        let mut cursor = Some(self.head);
        while let Some(idx) = cursor {
            visited += 1;
            if visited > self.slots.len() {
                return Err(Error::Invariant("recency list contains a cycle".into()));
            }
            if self.slots[idx].prev != prev {
                return Err(Error::Invariant(format!("slot {} has a stale back link", idx)));
            }
            prev = Some(idx);
            cursor = self.slots[idx].next;
        }

        if prev != Some(self.tail) {
            return Err(Error::Invariant(format!(
                "list ends at {:?}, tail is {}",
                prev, self.tail
            )));
        }
        if visited != self.slots.len() {
            return Err(Error::Invariant(format!(
                "list threads {} of {} slots",
                visited,
                self.slots.len()
            )));
        }
        Ok(())
    }
}

/// Head-to-tail walk over the arena
pub(crate) struct Iter<'a, V> {
    arena: &'a SlotArena<V>,
    cursor: Option<usize>,
    remaining: usize,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (usize, &'a Slot<V>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let idx = self.cursor?;
        let slot = &self.arena.slots[idx];
        self.cursor = slot.next;
        self.remaining -= 1;
        Some((idx, slot))
    }
}
