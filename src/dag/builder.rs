// src/dag/builder.rs

//! Programmatic graph construction.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use serde_json::Value;
use tracing::debug;

use crate::dag::graph::{Edge, EdgeId, Graph, GraphError, NodeEntry, NodeId};
use crate::dag::node::Node;
use crate::types::OutputKind;

/// Mutable graph under construction.
///
/// Node and edge ids are allocated as the smallest free key, so removing and
/// re-adding reuses ids.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: BTreeMap<NodeId, NodeEntry>,
    edges: BTreeMap<EdgeId, Edge>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: Arc<dyn Node>) -> NodeId {
        let id = (0..)
            .map(NodeId)
            .find(|id| !self.nodes.contains_key(id))
            .unwrap_or(NodeId(u32::MAX));
        self.insert_node(id, node);
        id
    }

    pub fn add_node_with_id(&mut self, id: NodeId, node: Arc<dyn Node>) -> Result<NodeId, GraphError> {
        if self.nodes.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id));
        }
        self.insert_node(id, node);
        Ok(id)
    }

    fn insert_node(&mut self, id: NodeId, node: Arc<dyn Node>) {
        let slots = node.slots();
        debug!(node = %id, type_name = node.type_name(), "adding node");
        self.nodes.insert(id, NodeEntry { id, node, slots });
    }

    /// Override the default value of a slot that declares one.
    pub fn set_default(&mut self, node: NodeId, slot: &str, value: Value) -> Result<(), GraphError> {
        let entry = self
            .nodes
            .get_mut(&node)
            .ok_or(GraphError::UnknownNode(node))?;
        let spec = entry
            .slots
            .iter_mut()
            .find(|spec| spec.name == slot)
            .ok_or_else(|| GraphError::UnknownSlot {
                node,
                slot: slot.to_string(),
            })?;

        match spec.default.as_mut() {
            Some(default) => {
                *default = value;
                Ok(())
            }
            None => Err(GraphError::SlotHasNoDefault {
                node,
                slot: slot.to_string(),
            }),
        }
    }

    /// Connect the output of `from` to input `slot` of `to`.
    ///
    /// Each input slot accepts at most one edge.
    pub fn connect(&mut self, from: NodeId, to: NodeId, slot: &str) -> Result<EdgeId, GraphError> {
        if !self.nodes.contains_key(&from) {
            return Err(GraphError::UnknownNode(from));
        }
        let consumer = self.nodes.get(&to).ok_or(GraphError::UnknownNode(to))?;
        if !consumer.slots.iter().any(|spec| spec.name == slot) {
            return Err(GraphError::UnknownSlot {
                node: to,
                slot: slot.to_string(),
            });
        }
        if let Some(existing) = self
            .edges
            .values()
            .find(|edge| edge.to == to && edge.slot == slot)
        {
            return Err(GraphError::SlotAlreadyConnected {
                node: to,
                slot: slot.to_string(),
                edge: existing.id,
            });
        }

        let id = (0..)
            .map(EdgeId)
            .find(|id| !self.edges.contains_key(id))
            .unwrap_or(EdgeId(u32::MAX));
        debug!(edge = %id, from = %from, to = %to, slot, "connecting nodes");
        self.edges.insert(
            id,
            Edge {
                id,
                from,
                to,
                slot: slot.to_string(),
            },
        );
        Ok(id)
    }

    pub fn disconnect(&mut self, edge: EdgeId) -> Result<Edge, GraphError> {
        self.edges.remove(&edge).ok_or(GraphError::UnknownEdge(edge))
    }

    /// Remove a node together with every edge touching it.
    pub fn remove_node(&mut self, node: NodeId) -> Result<(), GraphError> {
        self.nodes
            .remove(&node)
            .ok_or(GraphError::UnknownNode(node))?;
        self.edges
            .retain(|_, edge| edge.from != node && edge.to != node);
        Ok(())
    }

    /// Freeze the graph and derive adjacency, distances and classification.
    pub fn build(self) -> Result<Graph, GraphError> {
        let mut outgoing: HashMap<NodeId, Vec<EdgeId>> = HashMap::new();
        let mut incoming: HashMap<NodeId, BTreeMap<String, EdgeId>> = HashMap::new();
        let mut topology: DiGraphMap<NodeId, ()> = DiGraphMap::new();

        for id in self.nodes.keys() {
            topology.add_node(*id);
        }
        for edge in self.edges.values() {
            outgoing.entry(edge.from).or_default().push(edge.id);
            incoming
                .entry(edge.to)
                .or_default()
                .insert(edge.slot.clone(), edge.id);
            topology.add_edge(edge.from, edge.to, ());
        }

        let order = toposort(&topology, None).map_err(|cycle| GraphError::Cycle(cycle.node_id()))?;

        // Producers come before consumers in `order`.
        let mut statics: HashSet<NodeId> = HashSet::new();
        for id in &order {
            let Some(entry) = self.nodes.get(id) else {
                continue;
            };
            let upstream_static = topology
                .neighbors_directed(*id, petgraph::Direction::Incoming)
                .all(|producer| statics.contains(&producer));
            if entry.node.is_pure() && entry.output_kind() == OutputKind::Scalar && upstream_static {
                statics.insert(*id);
            }
        }

        let mut distance: HashMap<NodeId, usize> = HashMap::new();
        for id in order.iter().rev() {
            let nearest = topology
                .neighbors_directed(*id, petgraph::Direction::Outgoing)
                .filter_map(|child| distance.get(&child).copied())
                .min();
            distance.insert(*id, nearest.map_or(0, |d| d + 1));
        }

        debug!(
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            static_nodes = statics.len(),
            "graph built"
        );

        Ok(Graph {
            nodes: self.nodes,
            edges: self.edges,
            outgoing,
            incoming,
            distance,
            statics,
        })
    }
}
