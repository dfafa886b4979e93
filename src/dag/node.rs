// src/dag/node.rs

//! The user-facing node contract.
//!
//! A [`Node`] declares its input slots, the shape of its output and whether
//! it is pure, and provides the async body that turns materialized inputs
//! into an output. [`FnNode`] adapts plain async closures to the trait.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use crate::types::OutputKind;

/// Materialized inputs of one node activation, keyed by slot name.
pub type Inputs = BTreeMap<String, Value>;

/// Result of a node body. Errors are arbitrary and surface unmodified as the
/// source of the engine error.
pub type NodeResult<T> = anyhow::Result<T>;

/// Boxed `'static` future, as returned by node bodies and executors.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// One input slot of a node.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotSpec {
    pub name: String,
    /// Value used when no edge is connected to the slot.
    pub default: Option<Value>,
}

impl SlotSpec {
    /// A slot that must be fed by an edge.
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
        }
    }

    /// A slot that falls back to `default` when left unconnected.
    pub fn with_default(name: impl Into<String>, default: Value) -> Self {
        Self {
            name: name.into(),
            default: Some(default),
        }
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

/// What a node execution produced.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeOutput {
    Scalar(Value),
    Stream(Vec<Value>),
}

impl NodeOutput {
    pub fn kind(&self) -> OutputKind {
        match self {
            NodeOutput::Scalar(_) => OutputKind::Scalar,
            NodeOutput::Stream(_) => OutputKind::Streaming,
        }
    }
}

/// Shared, read-only context handed to every node body of a run.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    values: BTreeMap<String, Value>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.values.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }
}

/// A unit of computation in the graph.
pub trait Node: Send + Sync + 'static {
    /// Type label, used for logging and diagnostics.
    fn type_name(&self) -> &str;

    /// All input slots. Every slot must receive exactly one value per
    /// activation, either from an edge or from its default.
    fn slots(&self) -> Vec<SlotSpec>;

    fn output_kind(&self) -> OutputKind {
        OutputKind::Scalar
    }

    /// Pure nodes with scalar output and static inputs have their output
    /// cached and broadcast. Impure nodes always produce queued values.
    fn is_pure(&self) -> bool {
        true
    }

    fn execute(self: Arc<Self>, ctx: Arc<RunContext>, inputs: Inputs)
    -> BoxFuture<NodeResult<NodeOutput>>;
}

type NodeFn = dyn Fn(Arc<RunContext>, Inputs) -> BoxFuture<NodeResult<NodeOutput>> + Send + Sync;

/// A [`Node`] built from an async closure.
///
/// ```ignore
/// let double = FnNode::scalar("Double", ["x"], |_ctx, inputs| async move {
///     let x = inputs["x"].as_i64().unwrap_or_default();
///     Ok(json!(x * 2))
/// });
/// ```
pub struct FnNode {
    type_name: String,
    slots: Vec<SlotSpec>,
    output: OutputKind,
    pure: bool,
    body: Box<NodeFn>,
}

impl FnNode {
    /// Node producing one value per execution.
    pub fn scalar<S, F, Fut>(type_name: impl Into<String>, slots: S, body: F) -> Self
    where
        S: IntoIterator,
        S::Item: Into<SlotSpec>,
        F: Fn(Arc<RunContext>, Inputs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = NodeResult<Value>> + Send + 'static,
    {
        let body = move |ctx: Arc<RunContext>, inputs: Inputs| -> BoxFuture<NodeResult<NodeOutput>> {
            let fut = body(ctx, inputs);
            Box::pin(async move { fut.await.map(NodeOutput::Scalar) })
        };
        Self::from_parts(type_name, slots, OutputKind::Scalar, Box::new(body))
    }

    /// Node producing a sequence per execution.
    pub fn streaming<S, F, Fut>(type_name: impl Into<String>, slots: S, body: F) -> Self
    where
        S: IntoIterator,
        S::Item: Into<SlotSpec>,
        F: Fn(Arc<RunContext>, Inputs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = NodeResult<Vec<Value>>> + Send + 'static,
    {
        let body = move |ctx: Arc<RunContext>, inputs: Inputs| -> BoxFuture<NodeResult<NodeOutput>> {
            let fut = body(ctx, inputs);
            Box::pin(async move { fut.await.map(NodeOutput::Stream) })
        };
        Self::from_parts(type_name, slots, OutputKind::Streaming, Box::new(body))
    }

    fn from_parts<S>(
        type_name: impl Into<String>,
        slots: S,
        output: OutputKind,
        body: Box<NodeFn>,
    ) -> Self
    where
        S: IntoIterator,
        S::Item: Into<SlotSpec>,
    {
        Self {
            type_name: type_name.into(),
            slots: slots.into_iter().map(Into::into).collect(),
            output,
            pure: true,
            body,
        }
    }

    /// Mark the node impure: its output is always queued, never cached.
    pub fn impure(mut self) -> Self {
        self.pure = false;
        self
    }
}

impl From<&str> for SlotSpec {
    fn from(name: &str) -> Self {
        SlotSpec::required(name)
    }
}

impl From<String> for SlotSpec {
    fn from(name: String) -> Self {
        SlotSpec::required(name)
    }
}

impl fmt::Debug for FnNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnNode")
            .field("type_name", &self.type_name)
            .field("slots", &self.slots)
            .field("output", &self.output)
            .field("pure", &self.pure)
            .finish_non_exhaustive()
    }
}

impl Node for FnNode {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn slots(&self) -> Vec<SlotSpec> {
        self.slots.clone()
    }

    fn output_kind(&self) -> OutputKind {
        self.output
    }

    fn is_pure(&self) -> bool {
        self.pure
    }

    fn execute(
        self: Arc<Self>,
        ctx: Arc<RunContext>,
        inputs: Inputs,
    ) -> BoxFuture<NodeResult<NodeOutput>> {
        (self.body)(ctx, inputs)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn fn_node_wraps_scalar_and_stream_bodies() {
        let double = Arc::new(FnNode::scalar("Double", ["x"], |_ctx, inputs: Inputs| async move {
            Ok(json!(inputs["x"].as_i64().unwrap_or_default() * 2))
        }));
        let count = Arc::new(FnNode::streaming(
            "Count",
            [SlotSpec::with_default("n", json!(3))],
            |_ctx, inputs: Inputs| async move {
                let n = inputs["n"].as_u64().unwrap_or_default();
                Ok((0..n).map(|i| json!(i)).collect())
            },
        ));

        assert_eq!(double.output_kind(), OutputKind::Scalar);
        assert_eq!(count.output_kind(), OutputKind::Streaming);
        assert!(count.slots()[0].has_default());

        let ctx = Arc::new(RunContext::new());
        let mut inputs = Inputs::new();
        inputs.insert("x".into(), json!(21));
        let out = double.execute(ctx.clone(), inputs).await.unwrap();
        assert_eq!(out, NodeOutput::Scalar(json!(42)));

        let mut inputs = Inputs::new();
        inputs.insert("n".into(), json!(2));
        let out = count.execute(ctx, inputs).await.unwrap();
        assert_eq!(out, NodeOutput::Stream(vec![json!(0), json!(1)]));
    }

    #[test]
    fn impure_flag_is_reported() {
        let node = FnNode::scalar("Rand", Vec::<SlotSpec>::new(), |_ctx, _inputs| async {
            Ok(Value::Null)
        })
        .impure();
        assert!(!node.is_pure());
    }
}
