// src/dag/graph.rs

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::dag::node::{Node, SlotSpec};
use crate::types::OutputKind;

/// Identity of a node within one graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// Identity of an edge within one graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),

    #[error("node {0} already exists")]
    DuplicateNode(NodeId),

    #[error("edge {0} does not exist")]
    UnknownEdge(EdgeId),

    #[error("node {node} has no slot '{slot}'")]
    UnknownSlot { node: NodeId, slot: String },

    #[error("slot '{slot}' of node {node} is already connected by edge {edge}")]
    SlotAlreadyConnected {
        node: NodeId,
        slot: String,
        edge: EdgeId,
    },

    #[error("slot '{slot}' of node {node} has no default value to override")]
    SlotHasNoDefault { node: NodeId, slot: String },

    #[error("cycle detected in graph at node {0}")]
    Cycle(NodeId),
}

/// A node placed in a graph: the user node plus its per-graph slot defaults.
#[derive(Clone)]
pub struct NodeEntry {
    pub id: NodeId,
    pub node: Arc<dyn Node>,
    /// Slots with defaults possibly overridden via `GraphBuilder::set_default`.
    pub slots: Vec<SlotSpec>,
}

impl NodeEntry {
    pub fn type_name(&self) -> &str {
        self.node.type_name()
    }

    pub fn output_kind(&self) -> OutputKind {
        self.node.output_kind()
    }
}

impl fmt::Debug for NodeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeEntry")
            .field("id", &self.id)
            .field("type_name", &self.type_name())
            .field("slots", &self.slots)
            .finish()
    }
}

/// Connection from a producer's output to one named input slot of a consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub id: EdgeId,
    pub from: NodeId,
    pub to: NodeId,
    pub slot: String,
}

/// Immutable dataflow graph with precomputed scheduling data.
///
/// Built by [`GraphBuilder::build`](crate::dag::GraphBuilder::build), which
/// derives adjacency, distance-from-end and the static classification once,
/// so the queries below are cheap lookups during a run.
#[derive(Debug, Clone)]
pub struct Graph {
    pub(crate) nodes: BTreeMap<NodeId, NodeEntry>,
    pub(crate) edges: BTreeMap<EdgeId, Edge>,
    pub(crate) outgoing: HashMap<NodeId, Vec<EdgeId>>,
    pub(crate) incoming: HashMap<NodeId, BTreeMap<String, EdgeId>>,
    pub(crate) distance: HashMap<NodeId, usize>,
    pub(crate) statics: HashSet<NodeId>,
}

impl Graph {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&NodeEntry> {
        self.nodes.get(&id)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeEntry> {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Entry nodes: no incoming edges and every slot has a default.
    ///
    /// A node without incoming edges but with a slot lacking a default can
    /// never become runnable, so it is not a source.
    pub fn source_nodes(&self) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|entry| {
                self.incoming
                    .get(&entry.id)
                    .is_none_or(|slots| slots.is_empty())
                    && entry.slots.iter().all(SlotSpec::has_default)
            })
            .map(|entry| entry.id)
            .collect()
    }

    /// Consumer of every outgoing edge of `id`, one entry per edge.
    pub fn downstream_nodes(&self, id: NodeId) -> Vec<NodeId> {
        self.outgoing_edges(id).map(|edge| edge.to).collect()
    }

    pub fn outgoing_edges(&self, id: NodeId) -> impl Iterator<Item = &Edge> {
        self.outgoing
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(|edge_id| self.edges.get(edge_id))
    }

    /// Incoming edges keyed by the consumer slot they feed.
    pub fn incoming_edges(&self, id: NodeId) -> BTreeMap<&str, &Edge> {
        self.incoming
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(|(slot, edge_id)| Some((slot.as_str(), self.edges.get(edge_id)?)))
            .collect()
    }

    /// Shortest number of edges from `id` to a node without outgoing edges.
    ///
    /// Sinks are at distance 0. Used only as a scheduling priority.
    pub fn distance_from_end(&self, id: NodeId) -> usize {
        self.distance.get(&id).copied().unwrap_or(0)
    }

    /// Whether the output of `id` is cached and broadcast instead of queued.
    pub fn is_node_static(&self, id: NodeId) -> bool {
        self.statics.contains(&id)
    }

    pub fn slot_names(&self, id: NodeId) -> HashSet<&str> {
        self.nodes
            .get(&id)
            .map(|entry| entry.slots.iter().map(|slot| slot.name.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn slot_defaults(&self, id: NodeId) -> BTreeMap<&str, &Value> {
        self.nodes
            .get(&id)
            .map(|entry| {
                entry
                    .slots
                    .iter()
                    .filter_map(|slot| Some((slot.name.as_str(), slot.default.as_ref()?)))
                    .collect()
            })
            .unwrap_or_default()
    }
}
