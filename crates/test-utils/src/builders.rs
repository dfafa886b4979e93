#![allow(dead_code)]

//! Ready-made nodes for engine tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::anyhow;
use serde_json::{Value, json};

use nodeflow::dag::{FnNode, Inputs, Node, SlotSpec};

/// Pure scalar source returning `value`. Static.
pub fn constant(value: Value) -> Arc<dyn Node> {
    Arc::new(FnNode::scalar("Constant", Vec::<String>::new(), move |_ctx, _inputs| {
        let value = value.clone();
        async move { Ok(value) }
    }))
}

/// Impure scalar source returning `value`. Its output is queued.
pub fn impure_source(value: Value) -> Arc<dyn Node> {
    Arc::new(
        FnNode::scalar("Source", Vec::<String>::new(), move |_ctx, _inputs| {
            let value = value.clone();
            async move { Ok(value) }
        })
        .impure(),
    )
}

/// Impure source returning 0, 1, 2, ... on successive executions.
pub fn counter() -> Arc<dyn Node> {
    let next = Arc::new(AtomicUsize::new(0));
    Arc::new(
        FnNode::scalar("Counter", Vec::<String>::new(), move |_ctx, _inputs| {
            let n = next.fetch_add(1, Ordering::SeqCst);
            async move { Ok(json!(n)) }
        })
        .impure(),
    )
}

/// Pure node forwarding slot `x`.
pub fn passthrough(type_name: &str) -> Arc<dyn Node> {
    Arc::new(FnNode::scalar(type_name, ["x"], |_ctx, inputs: Inputs| async move {
        Ok(inputs.get("x").cloned().unwrap_or(Value::Null))
    }))
}

/// Impure node forwarding slot `x`, so every output is queued.
pub fn impure_passthrough(type_name: &str) -> Arc<dyn Node> {
    Arc::new(
        FnNode::scalar(type_name, ["x"], |_ctx, inputs: Inputs| async move {
            Ok(inputs.get("x").cloned().unwrap_or(Value::Null))
        })
        .impure(),
    )
}

/// Pure node summing integer slots `slots`.
pub fn sum<const N: usize>(slots: [&str; N]) -> Arc<dyn Node> {
    let names: Vec<String> = slots.iter().map(|s| s.to_string()).collect();
    Arc::new(FnNode::scalar("Sum", names.clone(), move |_ctx, inputs: Inputs| {
        let total: i64 = names
            .iter()
            .filter_map(|slot| inputs.get(slot).and_then(Value::as_i64))
            .sum();
        async move { Ok(json!(total)) }
    }))
}

/// Streaming source emitting `0..n`.
pub fn range(n: i64) -> Arc<dyn Node> {
    Arc::new(FnNode::streaming(
        "Range",
        [SlotSpec::with_default("n", json!(n))],
        |_ctx, inputs: Inputs| async move {
            let n = inputs.get("n").and_then(Value::as_i64).unwrap_or_default();
            Ok((0..n).map(|i| json!(i)).collect())
        },
    ))
}

/// Impure node that sleeps for `delay` before forwarding `x`.
pub fn slow_passthrough(delay: Duration) -> Arc<dyn Node> {
    Arc::new(
        FnNode::scalar("Slow", ["x"], move |_ctx, inputs: Inputs| async move {
            tokio::time::sleep(delay).await;
            Ok(inputs.get("x").cloned().unwrap_or(Value::Null))
        })
        .impure(),
    )
}

/// Impure source sleeping for `delay` before returning `null`.
pub fn slow_source(delay: Duration) -> Arc<dyn Node> {
    Arc::new(
        FnNode::scalar("SlowSource", Vec::<String>::new(), move |_ctx, _inputs| async move {
            tokio::time::sleep(delay).await;
            Ok(Value::Null)
        })
        .impure(),
    )
}

/// Node with slot `x` that always fails with `message`.
pub fn failing(message: &'static str) -> Arc<dyn Node> {
    Arc::new(FnNode::scalar("Failing", ["x"], move |_ctx, _inputs| async move {
        Err(anyhow!(message))
    }))
}
