//! Delayed retry schedule
//!
//! One min-heap for every backed-off queue item rather than a timer per
//! item. Rescheduling an entity leaves its old heap entry behind; stale
//! entries are skipped lazily on pop.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

#[derive(Debug, Default)]
pub struct RetrySchedule {
    heap: BinaryHeap<Reverse<(i64, String)>>,
    /// Current deadline per entity; the source of truth for staleness
    deadlines: HashMap<String, i64>,
}

impl RetrySchedule {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule (or move) the retry deadline for an entity
    pub fn schedule(&mut self, entity_client_id: impl Into<String>, due_at: i64) {
        let id = entity_client_id.into();
        self.deadlines.insert(id.clone(), due_at);
        self.heap.push(Reverse((due_at, id)));
    }

    /// Drop the scheduled retry for an entity, if any
    pub fn clear(&mut self, entity_client_id: &str) {
        self.deadlines.remove(entity_client_id);
    }

    /// Pop every entity whose deadline has passed
    pub fn pop_due(&mut self, now: i64) -> Vec<String> {
        let mut due = Vec::new();
        while let Some(Reverse((at, id))) = self.heap.peek().cloned() {
            if at > now {
                break;
            }
            self.heap.pop();
            if self.deadlines.get(&id) == Some(&at) {
                self.deadlines.remove(&id);
                due.push(id);
            }
        }
        due
    }

    /// The earliest live deadline, skipping stale heap entries
    #[must_use]
    pub fn next_deadline(&mut self) -> Option<i64> {
        while let Some(Reverse((at, id))) = self.heap.peek() {
            if self.deadlines.get(id) == Some(at) {
                return Some(*at);
            }
            self.heap.pop();
        }
        None
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }
}
