// src/engine/readiness.rs

//! Input collection and the readiness gate.

use std::collections::{BTreeMap, HashSet};

use serde_json::Value;
use tracing::{trace, warn};

use crate::dag::{EdgeId, Graph, Inputs, NodeId};
use crate::engine::edges::EdgeStore;
use crate::engine::task::TaskDefinition;

/// Deferred accessor for one input value.
///
/// Collected while probing a node, resolved only after the gate commits, so
/// probing never consumes a queued value.
#[derive(Debug, Clone, PartialEq)]
pub enum EdgeResult {
    /// Slot default, used when no edge is connected to the slot.
    Default(Value),
    /// Broadcast value of a static producer.
    Cached(Value),
    /// Head of the edge's queue, popped on resolution.
    Queued(EdgeId),
}

impl EdgeResult {
    /// Materialize the value, popping the queue head for `Queued`.
    ///
    /// Fails with the edge id if the queue turned out to be empty.
    fn resolve(self, edges: &mut EdgeStore) -> Result<Value, EdgeId> {
        match self {
            EdgeResult::Default(value) | EdgeResult::Cached(value) => Ok(value),
            EdgeResult::Queued(edge) => edges.pop(edge).ok_or(edge),
        }
    }
}

/// Why a node cannot be activated right now. Expected, never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotReady {
    /// No queued input arrived and the node already ran on its static inputs.
    AlreadyActivated,
    /// Some slots have no value yet.
    MissingSlots(Vec<String>),
    /// A queue emptied between probing and resolution.
    QueueDrained(EdgeId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Readiness {
    Ready(TaskDefinition),
    NotReady(NotReady),
}

/// Readiness checks for one run, borrowing the run's mutable state.
pub struct InputGate<'a> {
    graph: &'a Graph,
    edges: &'a mut EdgeStore,
    activated: &'a mut HashSet<NodeId>,
}

impl<'a> InputGate<'a> {
    pub fn new(
        graph: &'a Graph,
        edges: &'a mut EdgeStore,
        activated: &'a mut HashSet<NodeId>,
    ) -> Self {
        Self {
            graph,
            edges,
            activated,
        }
    }

    /// Collect the available inputs of `node` without consuming anything.
    ///
    /// Layers, later ones win: defaults of unconnected slots, cached static
    /// values, then the heads of non-empty queues.
    pub fn inspect(&self, node: NodeId) -> Result<BTreeMap<String, EdgeResult>, NotReady> {
        let incoming = self.graph.incoming_edges(node);
        let mut available: BTreeMap<String, EdgeResult> = BTreeMap::new();

        for (slot, value) in self.graph.slot_defaults(node) {
            if !incoming.contains_key(slot) {
                available.insert(slot.to_string(), EdgeResult::Default(value.clone()));
            }
        }

        for (slot, edge) in &incoming {
            if let Some(value) = self.edges.cached(edge.id) {
                available.insert(slot.to_string(), EdgeResult::Cached(value.clone()));
            }
        }

        let mut dynamic = 0usize;
        for (slot, edge) in &incoming {
            if self.edges.has_queued(edge.id) {
                available.insert(slot.to_string(), EdgeResult::Queued(edge.id));
                dynamic += 1;
            }
        }

        if dynamic == 0 && self.activated.contains(&node) {
            return Err(NotReady::AlreadyActivated);
        }

        let required = self.graph.slot_names(node);
        let provided: HashSet<&str> = available.keys().map(String::as_str).collect();
        if provided != required {
            let mut missing: Vec<String> = required
                .difference(&provided)
                .map(|slot| slot.to_string())
                .collect();
            missing.sort();
            return Err(NotReady::MissingSlots(missing));
        }

        Ok(available)
    }

    /// Inspect `node` and, if it is runnable, consume its inputs and return the
    /// task definition. Records the node as activated.
    pub fn try_activate(&mut self, node: NodeId) -> Readiness {
        let available = match self.inspect(node) {
            Ok(available) => available,
            Err(reason) => {
                trace!(node = %node, ?reason, "node not ready");
                return Readiness::NotReady(reason);
            }
        };

        let inputs = match self.materialize(available) {
            Ok(inputs) => inputs,
            Err(reason) => {
                warn!(node = %node, ?reason, "queued input vanished after readiness check");
                return Readiness::NotReady(reason);
            }
        };

        self.activated.insert(node);
        let priority = self.graph.distance_from_end(node);
        trace!(node = %node, priority, slots = inputs.len(), "node ready");

        Readiness::Ready(TaskDefinition {
            priority,
            node,
            inputs,
        })
    }

    /// Resolve every collected input. All queues are checked before any value
    /// is popped, so a failed resolution leaves the queues untouched.
    fn materialize(&mut self, available: BTreeMap<String, EdgeResult>) -> Result<Inputs, NotReady> {
        let drained = available.values().find_map(|result| match result {
            EdgeResult::Queued(edge) if !self.edges.has_queued(*edge) => Some(*edge),
            _ => None,
        });
        if let Some(edge) = drained {
            return Err(NotReady::QueueDrained(edge));
        }

        available
            .into_iter()
            .map(|(slot, result)| {
                result
                    .resolve(self.edges)
                    .map(|value| (slot, value))
                    .map_err(NotReady::QueueDrained)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::dag::{FnNode, GraphBuilder, Inputs, Node, NodeOutput, SlotSpec};

    fn constant(value: Value) -> Arc<dyn Node> {
        Arc::new(FnNode::scalar("Const", Vec::<String>::new(), move |_ctx, _inputs| {
            let value = value.clone();
            async move { Ok(value) }
        }))
    }

    fn noise() -> Arc<dyn Node> {
        Arc::new(
            FnNode::scalar("Noise", Vec::<String>::new(), |_ctx, _inputs| async {
                Ok(Value::Null)
            })
            .impure(),
        )
    }

    fn mix() -> Arc<dyn Node> {
        Arc::new(FnNode::scalar(
            "Mix",
            [SlotSpec::required("signal"), SlotSpec::required("gain")],
            |_ctx, _inputs: Inputs| async { Ok(Value::Null) },
        ))
    }

    #[test]
    fn mixed_inputs_wait_for_queue_and_reuse_cache() {
        let mut b = GraphBuilder::new();
        let signal = b.add_node(noise());
        let gain = b.add_node(constant(json!(2)));
        let mixer = b.add_node(mix());
        let e_signal = b.connect(signal, mixer, "signal").unwrap();
        b.connect(gain, mixer, "gain").unwrap();
        let graph = b.build().unwrap();

        let mut edges = EdgeStore::new();
        let mut activated = HashSet::new();

        edges.route(&graph, gain, NodeOutput::Scalar(json!(2)));
        {
            let mut gate = InputGate::new(&graph, &mut edges, &mut activated);
            assert_eq!(
                gate.try_activate(mixer),
                Readiness::NotReady(NotReady::MissingSlots(vec!["signal".into()]))
            );
        }

        edges.route(&graph, signal, NodeOutput::Scalar(json!("a")));
        edges.route(&graph, signal, NodeOutput::Scalar(json!("b")));

        let mut gate = InputGate::new(&graph, &mut edges, &mut activated);
        let mut seen = Vec::new();
        while let Readiness::Ready(task) = gate.try_activate(mixer) {
            assert_eq!(task.inputs["gain"], json!(2));
            seen.push(task.inputs["signal"].clone());
        }
        assert_eq!(seen, vec![json!("a"), json!("b")]);
        assert_eq!(edges.queued_len(e_signal), 0);
    }

    #[test]
    fn probing_never_consumes() {
        let mut b = GraphBuilder::new();
        let signal = b.add_node(noise());
        let gain = b.add_node(constant(json!(1)));
        let mixer = b.add_node(mix());
        let e_signal = b.connect(signal, mixer, "signal").unwrap();
        b.connect(gain, mixer, "gain").unwrap();
        let graph = b.build().unwrap();

        let mut edges = EdgeStore::new();
        let mut activated = HashSet::new();
        edges.route(&graph, signal, NodeOutput::Scalar(json!(1)));

        let mut gate = InputGate::new(&graph, &mut edges, &mut activated);
        // gain has not produced yet: the queued signal must survive.
        for _ in 0..3 {
            assert!(matches!(gate.try_activate(mixer), Readiness::NotReady(_)));
        }
        assert!(gate.inspect(mixer).is_err());
        drop(gate);
        assert_eq!(edges.queued_len(e_signal), 1);
        assert!(activated.is_empty());
    }

    #[test]
    fn static_only_node_activates_once() {
        let mut b = GraphBuilder::new();
        let gain = b.add_node(constant(json!(3)));
        let scale = b.add_node(Arc::new(FnNode::scalar(
            "Scale",
            [SlotSpec::required("gain"), SlotSpec::with_default("offset", json!(0))],
            |_ctx, _inputs: Inputs| async { Ok(Value::Null) },
        )));
        b.connect(gain, scale, "gain").unwrap();
        let graph = b.build().unwrap();

        let mut edges = EdgeStore::new();
        let mut activated = HashSet::new();
        edges.route(&graph, gain, NodeOutput::Scalar(json!(3)));

        let mut gate = InputGate::new(&graph, &mut edges, &mut activated);
        let Readiness::Ready(task) = gate.try_activate(scale) else {
            panic!("scale should be ready");
        };
        assert_eq!(task.inputs["gain"], json!(3));
        assert_eq!(task.inputs["offset"], json!(0));
        assert_eq!(task.priority, 0);

        for _ in 0..3 {
            assert_eq!(
                gate.try_activate(scale),
                Readiness::NotReady(NotReady::AlreadyActivated)
            );
        }
    }

    #[test]
    fn connected_slot_ignores_its_default() {
        let mut b = GraphBuilder::new();
        let upstream = b.add_node(noise());
        let consumer = b.add_node(Arc::new(FnNode::scalar(
            "Consumer",
            [SlotSpec::with_default("x", json!("fallback"))],
            |_ctx, _inputs: Inputs| async { Ok(Value::Null) },
        )));
        b.connect(upstream, consumer, "x").unwrap();
        let graph = b.build().unwrap();

        let mut edges = EdgeStore::new();
        let mut activated = HashSet::new();
        let gate = InputGate::new(&graph, &mut edges, &mut activated);

        assert_eq!(
            gate.inspect(consumer),
            Err(NotReady::MissingSlots(vec!["x".into()]))
        );
    }

    #[test]
    fn drained_queue_leaves_other_queues_intact() {
        let mut b = GraphBuilder::new();
        let left = b.add_node(noise());
        let right = b.add_node(noise());
        let mixer = b.add_node(mix());
        let e_left = b.connect(left, mixer, "signal").unwrap();
        let e_right = b.connect(right, mixer, "gain").unwrap();
        let graph = b.build().unwrap();

        let mut edges = EdgeStore::new();
        let mut activated = HashSet::new();
        edges.route(&graph, right, NodeOutput::Scalar(json!("kept")));

        // `signal` sorts after `gain` and claims a value its queue does not hold.
        let available = BTreeMap::from([
            ("gain".to_string(), EdgeResult::Queued(e_right)),
            ("signal".to_string(), EdgeResult::Queued(e_left)),
        ]);
        let mut gate = InputGate::new(&graph, &mut edges, &mut activated);
        assert_eq!(
            gate.materialize(available),
            Err(NotReady::QueueDrained(e_left))
        );
        drop(gate);

        assert_eq!(edges.queued_len(e_right), 1);
        assert_eq!(edges.pop(e_right), Some(json!("kept")));
        assert!(activated.is_empty());
    }
}
