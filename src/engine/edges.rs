// src/engine/edges.rs

//! Per-edge storage of produced values.

use std::collections::{HashMap, VecDeque};

use serde_json::Value;
use tracing::trace;

use crate::dag::{EdgeId, Graph, NodeId, NodeOutput};

/// Values travelling along edges during one run.
///
/// Each edge is fed through exactly one of two sinks, chosen by the
/// producer's static classification (fixed for the whole run):
///
/// - dynamic producers append to a FIFO per edge; consumers pop one value per
///   activation;
/// - static producers overwrite a single cached slot per edge which reads
///   never remove, so it satisfies any number of consumer activations.
#[derive(Debug, Default)]
pub struct EdgeStore {
    queues: HashMap<EdgeId, VecDeque<Value>>,
    cache: HashMap<EdgeId, Value>,
}

impl EdgeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a producer's output to all of its outgoing edges.
    pub fn route(&mut self, graph: &Graph, producer: NodeId, output: NodeOutput) {
        let edges: Vec<EdgeId> = graph.outgoing_edges(producer).map(|edge| edge.id).collect();

        match output {
            NodeOutput::Scalar(value) if graph.is_node_static(producer) => {
                for edge in edges {
                    trace!(node = %producer, edge = %edge, "caching static value");
                    self.cache.insert(edge, value.clone());
                }
            }
            NodeOutput::Scalar(value) => {
                for edge in edges {
                    trace!(node = %producer, edge = %edge, "queueing value");
                    self.queues.entry(edge).or_default().push_back(value.clone());
                }
            }
            NodeOutput::Stream(values) => {
                for edge in edges {
                    trace!(node = %producer, edge = %edge, count = values.len(), "queueing stream");
                    self.queues
                        .entry(edge)
                        .or_default()
                        .extend(values.iter().cloned());
                }
            }
        }
    }

    pub fn has_queued(&self, edge: EdgeId) -> bool {
        self.queues.get(&edge).is_some_and(|queue| !queue.is_empty())
    }

    pub fn queued_len(&self, edge: EdgeId) -> usize {
        self.queues.get(&edge).map_or(0, VecDeque::len)
    }

    /// Remove and return the oldest queued value of `edge`.
    pub fn pop(&mut self, edge: EdgeId) -> Option<Value> {
        self.queues.get_mut(&edge)?.pop_front()
    }

    pub fn cached(&self, edge: EdgeId) -> Option<&Value> {
        self.cache.get(&edge)
    }

    /// Total number of values buffered across all queues.
    pub fn buffered(&self) -> usize {
        self.queues.values().map(VecDeque::len).sum()
    }
}
