// src/demo.rs

//! Built-in graphs run by the `nodeflow` binary.
//!
//! Sink nodes print what they receive to stdout, one JSON value per line.

use std::sync::Arc;

use clap::ValueEnum;
use serde_json::{Value, json};
use tracing::info;

use crate::dag::{FnNode, Graph, GraphBuilder, GraphError, Inputs, Node, NodeResult, SlotSpec};

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum Demo {
    /// `Const -> Square -> Print`, all static.
    Chain,
    /// One constant feeding two arithmetic branches.
    Fanout,
    /// A streamed range scaled by a cached constant.
    Stream,
}

/// Build the graph for `demo`.
pub fn build(demo: Demo) -> Result<Graph, GraphError> {
    let mut b = GraphBuilder::new();
    match demo {
        Demo::Chain => {
            let seed = b.add_node(constant(json!(3)));
            let square = b.add_node(square());
            let print = b.add_node(print());
            b.connect(seed, square, "x")?;
            b.connect(square, print, "value")?;
        }
        Demo::Fanout => {
            let seed = b.add_node(constant(json!(10)));
            let add = b.add_node(add());
            let mul = b.add_node(multiply());
            let print_sum = b.add_node(print());
            let print_product = b.add_node(print());
            b.connect(seed, add, "a")?;
            b.connect(seed, mul, "a")?;
            b.set_default(add, "b", json!(5))?;
            b.connect(add, print_sum, "value")?;
            b.connect(mul, print_product, "value")?;
        }
        Demo::Stream => {
            let range = b.add_node(range());
            let factor = b.add_node(constant(json!(3)));
            let mul = b.add_node(multiply());
            let print = b.add_node(print());
            b.set_default(range, "n", json!(5))?;
            b.connect(range, mul, "a")?;
            b.connect(factor, mul, "b")?;
            b.connect(mul, print, "value")?;
        }
    }
    b.build()
}

fn int(inputs: &Inputs, slot: &str) -> NodeResult<i64> {
    inputs
        .get(slot)
        .and_then(Value::as_i64)
        .ok_or_else(|| anyhow::anyhow!("slot '{slot}' is not an integer"))
}

fn constant(value: Value) -> Arc<dyn Node> {
    Arc::new(FnNode::scalar("Constant", Vec::<String>::new(), move |_ctx, _inputs| {
        let value = value.clone();
        async move { Ok(value) }
    }))
}

fn square() -> Arc<dyn Node> {
    Arc::new(FnNode::scalar("Square", ["x"], |_ctx, inputs: Inputs| async move {
        let x = int(&inputs, "x")?;
        Ok(json!(x * x))
    }))
}

fn add() -> Arc<dyn Node> {
    Arc::new(FnNode::scalar(
        "Add",
        [SlotSpec::required("a"), SlotSpec::with_default("b", json!(0))],
        |_ctx, inputs: Inputs| async move { Ok(json!(int(&inputs, "a")? + int(&inputs, "b")?)) },
    ))
}

fn multiply() -> Arc<dyn Node> {
    Arc::new(FnNode::scalar(
        "Multiply",
        [SlotSpec::required("a"), SlotSpec::with_default("b", json!(2))],
        |_ctx, inputs: Inputs| async move { Ok(json!(int(&inputs, "a")? * int(&inputs, "b")?)) },
    ))
}

fn range() -> Arc<dyn Node> {
    Arc::new(FnNode::streaming(
        "Range",
        [SlotSpec::with_default("n", json!(3))],
        |_ctx, inputs: Inputs| async move {
            let n = int(&inputs, "n")?;
            Ok((0..n).map(|i| json!(i)).collect())
        },
    ))
}

fn print() -> Arc<dyn Node> {
    Arc::new(
        FnNode::scalar("Print", ["value"], |_ctx, inputs: Inputs| async move {
            let value = inputs.get("value").cloned().unwrap_or(Value::Null);
            info!(%value, "sink received value");
            println!("{value}");
            Ok(Value::Null)
        })
        .impure(),
    )
}
