// tests/property_static_dags.rs

mod common;
use crate::common::run_recorded;

use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::sync::Arc;

use proptest::prelude::*;
use serde_json::{Value, json};

use nodeflow::dag::{FnNode, Graph, GraphBuilder, Inputs, Node, NodeId, SlotSpec};
use nodeflow::types::ConcurrencyLimit;

const SLOTS: [&str; 3] = ["s0", "s1", "s2"];

/// Random acyclic graphs of pure scalar nodes.
///
/// Node `i` may only consume from nodes `< i`. Each node has three slots;
/// unconnected ones fall back to a default, so every node is eventually
/// runnable and every node is static.
fn static_dag_strategy(max_nodes: usize) -> impl Strategy<Value = Vec<Vec<usize>>> {
    (1..=max_nodes).prop_flat_map(|num_nodes| {
        proptest::collection::vec(
            proptest::collection::vec(any::<usize>(), 0..=SLOTS.len()),
            num_nodes,
        )
    })
}

fn build_graph(raw_deps: &[Vec<usize>]) -> Graph {
    let mut b = GraphBuilder::new();
    let mut ids: Vec<NodeId> = Vec::new();

    for (i, potential_deps) in raw_deps.iter().enumerate() {
        let id = b.add_node(sum_with_defaults());
        let producers: BTreeSet<usize> = if i == 0 {
            BTreeSet::new()
        } else {
            potential_deps.iter().map(|dep| dep % i).collect()
        };
        for (slot, producer) in SLOTS.iter().zip(producers) {
            b.connect(ids[producer], id, slot).expect("fresh slot");
        }
        ids.push(id);
    }

    b.build().expect("acyclic by construction")
}

fn sum_with_defaults() -> Arc<dyn Node> {
    Arc::new(FnNode::scalar(
        "Sum",
        SLOTS.map(|slot| SlotSpec::with_default(slot, json!(1))),
        |_ctx, inputs: Inputs| async move {
            let total: i64 = inputs.values().filter_map(Value::as_i64).sum();
            Ok(json!(total))
        },
    ))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn every_static_node_executes_exactly_once(
        raw_deps in static_dag_strategy(12),
        cap in 1usize..4,
    ) {
        let graph = build_graph(&raw_deps);
        let nodes: Vec<NodeId> = graph.nodes().map(|entry| entry.id).collect();
        prop_assert!(nodes.iter().all(|id| graph.is_node_static(*id)));

        let limit = ConcurrencyLimit::Bounded(NonZeroUsize::new(cap).unwrap());
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let (result, executor) = rt.block_on(run_recorded(graph, limit));
        let report = result.unwrap();

        prop_assert_eq!(report.executions(), nodes.len());
        for id in &nodes {
            prop_assert_eq!(report.executions_of(*id), 1);
            prop_assert_eq!(executor.count_of(*id), 1);
        }
        prop_assert!(report.max_in_flight <= cap);
    }
}
