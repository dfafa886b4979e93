#![allow(dead_code)]

use std::sync::Arc;

use nodeflow::dag::Graph;
use nodeflow::engine::{EngineError, Run, RunOptions, RunReport};
use nodeflow::types::ConcurrencyLimit;
use nodeflow_test_utils::RecordingExecutor;

pub use nodeflow_test_utils::{builders, init_tracing, with_timeout};

/// Run `graph` to completion with a fresh recording executor.
pub async fn run_recorded(
    graph: Graph,
    concurrency: ConcurrencyLimit,
) -> (Result<RunReport, EngineError>, RecordingExecutor) {
    init_tracing();
    let executor = RecordingExecutor::new();
    let options = RunOptions::default().with_concurrency(concurrency);
    let result = with_timeout(Run::new(Arc::new(graph), Arc::new(executor.clone()), options).run()).await;
    (result, executor)
}
