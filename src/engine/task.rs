// src/engine/task.rs

//! Runnable task definitions and their priority queue.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::dag::{Inputs, NodeId};

/// A node activation whose inputs are fully materialized.
///
/// Created only once the readiness gate has committed; the queue entries it
/// consumed are already gone from the edge queues.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDefinition {
    /// Distance of the node from the nearest sink; lower runs first.
    pub priority: usize,
    pub node: NodeId,
    pub inputs: Inputs,
}

/// Heap entry ordered by `(priority, seq)` only, so the payload needs no
/// comparison semantics. `seq` keeps equal priorities FIFO.
#[derive(Debug)]
struct Entry {
    key: Reverse<(usize, u64)>,
    task: TaskDefinition,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

/// Min-priority queue of runnable task definitions.
#[derive(Debug, Default)]
pub struct TaskQueue {
    heap: BinaryHeap<Entry>,
    next_seq: u64,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, task: TaskDefinition) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Entry {
            key: Reverse((task.priority, seq)),
            task,
        });
    }

    /// Remove the definition with the smallest priority (oldest first on ties).
    pub fn pop(&mut self) -> Option<TaskDefinition> {
        self.heap.pop().map(|entry| entry.task)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(node: u32, priority: usize) -> TaskDefinition {
        TaskDefinition {
            priority,
            node: NodeId(node),
            inputs: Inputs::new(),
        }
    }

    #[test]
    fn pops_lowest_priority_then_fifo() {
        let mut queue = TaskQueue::new();
        queue.push(def(0, 2));
        queue.push(def(1, 0));
        queue.push(def(2, 1));
        queue.push(def(3, 0));

        let order: Vec<u32> = std::iter::from_fn(|| queue.pop())
            .map(|task| task.node.0)
            .collect();
        assert_eq!(order, vec![1, 3, 2, 0]);
        assert!(queue.is_empty());
    }
}
