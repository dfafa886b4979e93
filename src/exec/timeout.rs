// src/exec/timeout.rs

//! Per-node deadline as executor policy.

use std::time::Duration;

use thiserror::Error;
use tracing::warn;

use crate::dag::{BoxFuture, Inputs, NodeEntry, NodeId, NodeOutput, NodeResult};
use crate::exec::NodeExecutor;

/// Error raised when a node body does not finish in time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("node {node} ({type_name}) did not finish within {limit:?}")]
pub struct NodeTimedOut {
    pub node: NodeId,
    pub type_name: String,
    pub limit: Duration,
}

/// Wraps another executor and fails any execution exceeding `limit`.
///
/// The engine itself never times out; a hung node blocks a run unless the
/// executor enforces a deadline like this one.
#[derive(Debug, Clone)]
pub struct TimeoutExecutor<E> {
    inner: E,
    limit: Duration,
}

impl<E: NodeExecutor> TimeoutExecutor<E> {
    pub fn new(inner: E, limit: Duration) -> Self {
        Self { inner, limit }
    }
}

impl<E: NodeExecutor> NodeExecutor for TimeoutExecutor<E> {
    fn execute(&self, node: &NodeEntry, inputs: Inputs) -> BoxFuture<NodeResult<NodeOutput>> {
        let fut = self.inner.execute(node, inputs);
        let limit = self.limit;
        let id = node.id;
        let type_name = node.type_name().to_string();

        Box::pin(async move {
            match tokio::time::timeout(limit, fut).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(node = %id, type_name = %type_name, ?limit, "node execution timed out");
                    Err(NodeTimedOut {
                        node: id,
                        type_name,
                        limit,
                    }
                    .into())
                }
            }
        })
    }
}
