// src/engine/run.rs

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use tokio::task::{Id as TaskId, JoinError, JoinSet};
use tracing::{debug, error, info, trace, warn};

use crate::dag::{Graph, NodeId, NodeOutput, NodeResult};
use crate::exec::NodeExecutor;

use super::edges::EdgeStore;
use super::readiness::{InputGate, Readiness};
use super::task::{TaskDefinition, TaskQueue};
use super::{EngineError, RunOptions};

/// Summary of a drained run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Node ids in the order their executions completed.
    pub completed: Vec<NodeId>,
    /// Highest number of simultaneously in-flight executions observed.
    pub max_in_flight: usize,
}

impl RunReport {
    pub fn executions(&self) -> usize {
        self.completed.len()
    }

    pub fn executions_of(&self, node: NodeId) -> usize {
        self.completed.iter().filter(|id| **id == node).count()
    }
}

/// One execution session over a graph.
///
/// Owns every piece of mutable scheduling state (edge queues, static cache,
/// task queue, in-flight tasks, activated nodes). Node executions only return
/// results; all state changes happen in [`Run::run`] between completions.
pub struct Run {
    graph: Arc<Graph>,
    executor: Arc<dyn NodeExecutor>,
    options: RunOptions,
    queue: TaskQueue,
    edges: EdgeStore,
    in_flight: JoinSet<NodeResult<NodeOutput>>,
    task_nodes: HashMap<TaskId, NodeId>,
    /// Nodes that have had at least one task definition created.
    activated: HashSet<NodeId>,
    report: RunReport,
}

impl fmt::Debug for Run {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Run")
            .field("options", &self.options)
            .field("queued", &self.queue.len())
            .field("in_flight", &self.in_flight.len())
            .field("buffered", &self.edges.buffered())
            .field("completed", &self.report.completed.len())
            .finish_non_exhaustive()
    }
}

impl Run {
    pub fn new(graph: Arc<Graph>, executor: Arc<dyn NodeExecutor>, options: RunOptions) -> Self {
        Self {
            graph,
            executor,
            options,
            queue: TaskQueue::new(),
            edges: EdgeStore::new(),
            in_flight: JoinSet::new(),
            task_nodes: HashMap::new(),
            activated: HashSet::new(),
            report: RunReport::default(),
        }
    }

    /// Drive the graph until no task is queued or in flight.
    ///
    /// - Seeds the queue with every source node.
    /// - Spawns queued tasks, lowest distance-from-end first, up to the
    ///   concurrency limit.
    /// - Waits for the next completion, routes its output into the outgoing
    ///   edges and activates every downstream node that became runnable.
    ///
    /// The first node failure aborts the run. Tasks still in flight are
    /// detached, not cancelled.
    pub async fn run(mut self) -> Result<RunReport, EngineError> {
        info!(
            nodes = self.graph.len(),
            concurrency = %self.options.concurrency,
            "dataflow run started"
        );

        self.seed();
        self.spawn_ready();

        while let Some(joined) = self.in_flight.join_next_with_id().await {
            let (node, result) = match joined {
                Ok((task_id, result)) => (self.take_task_node(task_id)?, result),
                Err(join_err) => return Err(self.fail_join(join_err)),
            };

            let output = match result {
                Ok(output) => output,
                Err(source) => {
                    let type_name = self.type_name(node);
                    error!(node = %node, type_name = %type_name, error = %source, "node execution failed");
                    self.abandon_in_flight();
                    return Err(EngineError::NodeFailed {
                        node,
                        type_name,
                        source,
                    });
                }
            };

            self.complete(node, output)?;
            self.spawn_ready();
        }

        info!(
            executions = self.report.executions(),
            max_in_flight = self.report.max_in_flight,
            "dataflow run drained"
        );
        Ok(self.report)
    }

    fn seed(&mut self) {
        let sources = self.graph.source_nodes();
        debug!(?sources, "seeding source nodes");
        for node in sources {
            self.activate_while_ready(node);
        }
    }

    /// Push a task definition for `node` as long as its inputs allow.
    ///
    /// A node fed by a queue holding several values yields one definition per
    /// value; a node on static inputs yields at most one.
    fn activate_while_ready(&mut self, node: NodeId) {
        let mut gate = InputGate::new(&self.graph, &mut self.edges, &mut self.activated);
        while let Readiness::Ready(task) = gate.try_activate(node) {
            debug!(node = %task.node, priority = task.priority, "task queued");
            self.queue.push(task);
        }
    }

    fn spawn_ready(&mut self) {
        while self.options.concurrency.allows(self.in_flight.len()) {
            let Some(task) = self.queue.pop() else {
                break;
            };
            self.spawn(task);
        }
    }

    fn spawn(&mut self, task: TaskDefinition) {
        let Some(entry) = self.graph.node(task.node) else {
            warn!(node = %task.node, "task for node missing from graph; dropping");
            return;
        };

        let fut = self.executor.execute(entry, task.inputs);
        let handle = self.in_flight.spawn(fut);
        self.task_nodes.insert(handle.id(), task.node);
        self.report.max_in_flight = self.report.max_in_flight.max(self.in_flight.len());

        debug!(
            node = %task.node,
            type_name = entry.type_name(),
            in_flight = self.in_flight.len(),
            queued = self.queue.len(),
            "task spawned"
        );
    }

    fn complete(&mut self, node: NodeId, output: NodeOutput) -> Result<(), EngineError> {
        let graph = Arc::clone(&self.graph);
        let Some(entry) = graph.node(node) else {
            error!(node = %node, "completed node is not part of the graph");
            self.abandon_in_flight();
            return Err(EngineError::UnknownNode(node));
        };

        let expected = entry.output_kind();
        if output.kind() != expected {
            self.abandon_in_flight();
            return Err(EngineError::OutputMismatch {
                node,
                type_name: entry.type_name().to_string(),
                expected,
                actual: output.kind(),
            });
        }

        self.edges.route(&graph, node, output);
        self.report.completed.push(node);
        debug!(
            node = %node,
            type_name = entry.type_name(),
            buffered = self.edges.buffered(),
            "task completed"
        );

        for downstream in graph.downstream_nodes(node) {
            trace!(node = %node, downstream = %downstream, "re-checking downstream readiness");
            self.activate_while_ready(downstream);
        }

        Ok(())
    }

    fn take_task_node(&mut self, task_id: TaskId) -> Result<NodeId, EngineError> {
        match self.task_nodes.remove(&task_id) {
            Some(node) => Ok(node),
            None => Err(self.fail_unknown_task(task_id)),
        }
    }

    fn fail_unknown_task(&mut self, task_id: TaskId) -> EngineError {
        error!(task = %task_id, "completed task is not tracked by this run");
        self.abandon_in_flight();
        EngineError::UnknownTask(task_id)
    }

    fn fail_join(&mut self, join_err: JoinError) -> EngineError {
        let Some(node) = self.task_nodes.remove(&join_err.id()) else {
            return self.fail_unknown_task(join_err.id());
        };
        let type_name = self.type_name(node);
        let message = if join_err.is_panic() {
            panic_message(join_err.into_panic())
        } else {
            "task was cancelled".to_string()
        };

        error!(node = %node, type_name = %type_name, %message, "node task panicked");
        self.abandon_in_flight();
        EngineError::NodePanicked {
            node,
            type_name,
            message,
        }
    }

    /// Let sibling tasks finish on their own; their results are discarded.
    fn abandon_in_flight(&mut self) {
        if !self.in_flight.is_empty() {
            warn!(
                in_flight = self.in_flight.len(),
                "run aborted; detaching in-flight tasks"
            );
        }
        self.in_flight.detach_all();
        self.task_nodes.clear();
    }

    fn type_name(&self, node: NodeId) -> String {
        self.graph
            .node(node)
            .map(|entry| entry.type_name().to_string())
            .unwrap_or_default()
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
