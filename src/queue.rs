//! Bucket priority queue for cell searches.
//!
//! Priorities are small non-negative integers (movement costs), so an
//! array of buckets indexed by priority beats a binary heap: O(1)
//! insert, and a minimum cursor that only ever advances amortizes the
//! scan for the next nonempty bucket. Each bucket is a singly linked
//! list threaded through the cells' `next_with_same_priority` field, so
//! no queue nodes are allocated.

use crate::cell::HexCell;

/// Priority queue over cell arena indices, keyed by
/// `HexCell::search_priority`. Ties dequeue in LIFO order because new
/// entries are pushed onto the bucket head.
#[derive(Debug)]
pub struct CellPriorityQueue {
    buckets: Vec<Option<usize>>,
    count: usize,
    minimum: usize,
}

impl Default for CellPriorityQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl CellPriorityQueue {
    pub fn new() -> CellPriorityQueue {
        CellPriorityQueue {
            buckets: Vec::new(),
            count: 0,
            minimum: usize::MAX,
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Insert a cell at its current search priority.
    pub fn enqueue(&mut self, cells: &mut [HexCell], index: usize) {
        self.count += 1;
        let priority = cells[index].search_priority() as usize;
        if priority < self.minimum {
            self.minimum = priority;
        }
        while priority >= self.buckets.len() {
            self.buckets.push(None);
        }
        cells[index].next_with_same_priority = self.buckets[priority];
        self.buckets[priority] = Some(index);
    }

    /// Remove and return the lowest-priority cell, or `None` when the
    /// queue is exhausted.
    pub fn dequeue(&mut self, cells: &mut [HexCell]) -> Option<usize> {
        while self.minimum < self.buckets.len() {
            if let Some(index) = self.buckets[self.minimum] {
                self.count -= 1;
                self.buckets[self.minimum] = cells[index].next_with_same_priority;
                cells[index].next_with_same_priority = None;
                return Some(index);
            }
            self.minimum += 1;
        }
        None
    }

    /// Relocate a cell whose priority decreased. The cell is unlinked
    /// from its old bucket by traversal and enqueued at the new one.
    pub fn change(&mut self, cells: &mut [HexCell], index: usize, old_priority: i32) {
        let old_priority = old_priority as usize;
        let head = self.buckets[old_priority]
            .expect("changed cell must be in its old bucket");

        if head == index {
            self.buckets[old_priority] = cells[index].next_with_same_priority;
        } else {
            // Walk the chain to the entry linking to the changed cell.
            let mut current = head;
            while cells[current].next_with_same_priority != Some(index) {
                current = cells[current]
                    .next_with_same_priority
                    .expect("changed cell must be in its old bucket");
            }
            cells[current].next_with_same_priority = cells[index].next_with_same_priority;
        }
        cells[index].next_with_same_priority = None;
        // Re-enqueue at the new priority; the net count is unchanged.
        self.enqueue(cells, index);
        self.count -= 1;
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
        self.count = 0;
        self.minimum = usize::MAX;
    }
}
