// src/exec/backend.rs

//! Pluggable node executor abstraction.
//!
//! The scheduler talks to a `NodeExecutor` instead of calling node bodies
//! directly. This keeps policy (isolation, retries, timeouts, remote
//! dispatch) out of the engine: an executor only has to return or fail
//! through the future it hands back.
//!
//! - `LocalExecutor` is the default implementation. It calls the node's own
//!   `execute` in-process with a shared [`RunContext`].
//! - Tests can provide their own `NodeExecutor` that, for example, records
//!   which nodes were executed or delays completion.

use std::sync::Arc;

use tracing::trace;

use crate::dag::{BoxFuture, Inputs, NodeEntry, NodeOutput, NodeResult, RunContext};

/// Trait abstracting how a single node activation is executed.
///
/// The returned future is spawned as its own task, so it must own everything
/// it needs (`Send + 'static`).
pub trait NodeExecutor: Send + Sync {
    fn execute(&self, node: &NodeEntry, inputs: Inputs) -> BoxFuture<NodeResult<NodeOutput>>;
}

/// In-process executor used by default.
#[derive(Debug, Clone, Default)]
pub struct LocalExecutor {
    context: Arc<RunContext>,
}

impl LocalExecutor {
    pub fn new(context: RunContext) -> Self {
        Self {
            context: Arc::new(context),
        }
    }

    pub fn context(&self) -> &RunContext {
        &self.context
    }
}

impl NodeExecutor for LocalExecutor {
    fn execute(&self, node: &NodeEntry, inputs: Inputs) -> BoxFuture<NodeResult<NodeOutput>> {
        trace!(node = %node.id, type_name = node.type_name(), "local execute");
        Arc::clone(&node.node).execute(Arc::clone(&self.context), inputs)
    }
}
