// src/exec/mod.rs

//! Node execution layer.
//!
//! - [`backend`] provides the `NodeExecutor` trait and the in-process
//!   `LocalExecutor` the engine uses by default.
//! - [`timeout`] provides `TimeoutExecutor`, a wrapper enforcing a per-node
//!   deadline around any other executor.

pub mod backend;
pub mod timeout;

pub use backend::{LocalExecutor, NodeExecutor};
pub use timeout::{NodeTimedOut, TimeoutExecutor};
