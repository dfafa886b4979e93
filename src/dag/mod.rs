// src/dag/mod.rs

//! Dataflow graph model.
//!
//! - [`node`] holds the user-facing [`Node`] trait and the closure adapter
//!   [`FnNode`].
//! - [`graph`] holds the immutable [`Graph`] and the queries the engine
//!   relies on (sources, downstream nodes, distance-from-end, static
//!   classification, slots and defaults).
//! - [`builder`] constructs graphs programmatically.

pub mod builder;
pub mod graph;
pub mod node;

pub use builder::GraphBuilder;
pub use graph::{Edge, EdgeId, Graph, GraphError, NodeEntry, NodeId};
pub use node::{BoxFuture, FnNode, Inputs, Node, NodeOutput, NodeResult, RunContext, SlotSpec};
