use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use nodeflow::dag::{BoxFuture, Inputs, NodeEntry, NodeId, NodeOutput, NodeResult, RunContext};
use nodeflow::exec::{LocalExecutor, NodeExecutor};

/// One started node execution as seen by [`RecordingExecutor`].
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    pub node: NodeId,
    pub type_name: String,
    pub inputs: Inputs,
}

/// An executor that runs nodes in-process and:
/// - records every execution (node and inputs) in start order
/// - tracks how many executions are running at once, and the peak.
#[derive(Debug, Clone)]
pub struct RecordingExecutor {
    inner: LocalExecutor,
    started: Arc<Mutex<Vec<Execution>>>,
    running: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::with_context(RunContext::new())
    }

    pub fn with_context(context: RunContext) -> Self {
        Self {
            inner: LocalExecutor::new(context),
            started: Arc::default(),
            running: Arc::default(),
            peak: Arc::default(),
        }
    }

    pub fn executions(&self) -> Vec<Execution> {
        self.started.lock().unwrap().clone()
    }

    /// Node ids in start order.
    pub fn started_nodes(&self) -> Vec<NodeId> {
        self.executions().into_iter().map(|e| e.node).collect()
    }

    /// Inputs of every execution of `node`, in start order.
    pub fn inputs_of(&self, node: NodeId) -> Vec<Inputs> {
        self.executions()
            .into_iter()
            .filter(|e| e.node == node)
            .map(|e| e.inputs)
            .collect()
    }

    pub fn count_of(&self, node: NodeId) -> usize {
        self.inputs_of(node).len()
    }

    /// Highest number of executions observed running at the same time.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl Default for RecordingExecutor {
    fn default() -> Self {
        Self::new()
    }
}

/// Decrements the running counter even if the node body panics.
struct RunningGuard(Arc<AtomicUsize>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl NodeExecutor for RecordingExecutor {
    fn execute(&self, node: &NodeEntry, inputs: Inputs) -> BoxFuture<NodeResult<NodeOutput>> {
        self.started.lock().unwrap().push(Execution {
            node: node.id,
            type_name: node.type_name().to_string(),
            inputs: inputs.clone(),
        });

        let fut = self.inner.execute(node, inputs);
        let running = Arc::clone(&self.running);
        let peak = Arc::clone(&self.peak);

        Box::pin(async move {
            let now = running.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            let _guard = RunningGuard(running);
            fut.await
        })
    }
}
