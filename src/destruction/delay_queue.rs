//! Time-ordered queue of deferred work, drained once per tick

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;

use crate::core::types::SimTime;

/// Heap entry; `seq` keeps insertion order for equal fire times
#[derive(Debug, Clone)]
struct Scheduled<T> {
    fire_at: OrderedFloat<SimTime>,
    seq: u64,
    item: T,
}

impl<T> PartialEq for Scheduled<T> {
    fn eq(&self, other: &Self) -> bool {
        self.fire_at == other.fire_at && self.seq == other.seq
    }
}

impl<T> Eq for Scheduled<T> {}

impl<T> Ord for Scheduled<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap
        (other.fire_at, other.seq).cmp(&(self.fire_at, self.seq))
    }
}

impl<T> PartialOrd for Scheduled<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone)]
pub struct DelayQueue<T> {
    heap: BinaryHeap<Scheduled<T>>,
    next_seq: u64,
}

impl<T> Default for DelayQueue<T> {
    fn default() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }
}

impl<T> DelayQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn schedule(&mut self, fire_at: SimTime, item: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Scheduled {
            fire_at: OrderedFloat(fire_at),
            seq,
            item,
        });
    }

    /// Fire time of the earliest entry
    pub fn next_fire_time(&self) -> Option<SimTime> {
        self.heap.peek().map(|s| s.fire_at.into_inner())
    }

    /// Remove and return the earliest entry if it is due at `now`
    pub fn pop_due(&mut self, now: SimTime) -> Option<(SimTime, T)> {
        if self.next_fire_time()? > now {
            return None;
        }
        self.heap.pop().map(|s| (s.fire_at.into_inner(), s.item))
    }

    /// Every entry due at `now`, earliest first
    pub fn drain_due(&mut self, now: SimTime) -> Vec<T> {
        let mut due = Vec::new();
        while let Some((_, item)) = self.pop_due(now) {
            due.push(item);
        }
        due
    }

    pub fn iter(&self) -> impl Iterator<Item = (SimTime, &T)> {
        self.heap.iter().map(|s| (s.fire_at.into_inner(), &s.item))
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) {
        self.heap.retain(|s| keep(&s.item));
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drains_in_time_order() {
        let mut queue = DelayQueue::new();
        queue.schedule(2.0, "late");
        queue.schedule(0.5, "early");
        queue.schedule(1.0, "middle");

        assert_eq!(queue.next_fire_time(), Some(0.5));
        assert_eq!(queue.drain_due(1.0), vec!["early", "middle"]);
        assert_eq!(queue.len(), 1);
        assert!(queue.drain_due(1.5).is_empty());
        assert_eq!(queue.drain_due(2.0), vec!["late"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let mut queue = DelayQueue::new();
        for i in 0..5 {
            queue.schedule(1.0, i);
        }
        assert_eq!(queue.drain_due(1.0), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_retain() {
        let mut queue = DelayQueue::new();
        queue.schedule(1.0, 1);
        queue.schedule(1.0, 2);
        queue.schedule(1.0, 3);
        queue.retain(|v| *v != 2);
        assert_eq!(queue.drain_due(5.0), vec![1, 3]);
    }
}
