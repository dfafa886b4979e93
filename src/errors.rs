// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::dag::GraphError;
use crate::engine::EngineError;

#[derive(Error, Debug)]
pub enum NodeflowError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, NodeflowError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::NodeId;

    #[test]
    fn graph_errors_convert_with_context() {
        fn build() -> Result<()> {
            Err(GraphError::Cycle(NodeId(3)))?
        }

        let err = build().unwrap_err();
        assert!(matches!(err, NodeflowError::Graph(GraphError::Cycle(NodeId(3)))));
        assert_eq!(err.to_string(), "Graph error: cycle detected in graph at node n3");
    }
}
