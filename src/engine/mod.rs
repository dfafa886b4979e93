// src/engine/mod.rs

//! Dataflow execution engine.
//!
//! This module ties together:
//! - per-edge value storage ([`edges`]): FIFO queues for dynamic producers
//!   and a broadcast cache for static ones
//! - the readiness gate ([`readiness`]) deciding when a node may run and on
//!   which inputs
//! - the priority queue of runnable task definitions ([`task`])
//! - the run loop ([`run`]) that spawns executions and reacts to their
//!   completions
//!
//! A [`Run`] is the single owner of all mutable scheduling state; node
//! executions only hand back results.

use thiserror::Error;

use crate::dag::NodeId;
use crate::types::{ConcurrencyLimit, OutputKind};

pub mod edges;
pub mod readiness;
pub mod run;
pub mod task;

pub use edges::EdgeStore;
pub use readiness::{EdgeResult, InputGate, NotReady, Readiness};
pub use run::{Run, RunReport};
pub use task::{TaskDefinition, TaskQueue};

/// Failures that abort a run.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("node {node} ({type_name}) failed: {source}")]
    NodeFailed {
        node: NodeId,
        type_name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("node {node} ({type_name}) panicked: {message}")]
    NodePanicked {
        node: NodeId,
        type_name: String,
        message: String,
    },

    #[error("node {node} ({type_name}) declared {expected} output but produced {actual}")]
    OutputMismatch {
        node: NodeId,
        type_name: String,
        expected: OutputKind,
        actual: OutputKind,
    },

    #[error("completed task {0} is not tracked by this run")]
    UnknownTask(tokio::task::Id),

    #[error("node {0} is not part of the graph")]
    UnknownNode(NodeId),
}

impl EngineError {
    /// Node the failure is attributed to, if any.
    pub fn node(&self) -> Option<NodeId> {
        match self {
            EngineError::NodeFailed { node, .. }
            | EngineError::NodePanicked { node, .. }
            | EngineError::OutputMismatch { node, .. }
            | EngineError::UnknownNode(node) => Some(*node),
            EngineError::UnknownTask(_) => None,
        }
    }
}

/// Per-run tuning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Maximum number of simultaneously in-flight node executions.
    pub concurrency: ConcurrencyLimit,
}

impl RunOptions {
    pub fn with_concurrency(mut self, concurrency: ConcurrencyLimit) -> Self {
        self.concurrency = concurrency;
        self
    }
}
