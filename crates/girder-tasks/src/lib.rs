//! Girder Tasks - Task execution engine
//!
//! This crate provides the task DAG, the sequential reference executor and
//! output staleness tracking backed by a persisted task history.

pub mod dag;
pub mod executor;
pub mod history;
pub mod reporter;

pub use dag::{DagError, TaskDag, TaskNode};
pub use executor::{ExecutorOptions, TaskExecutor, TaskResult, TaskStatus};
pub use history::{
    HistoryError, HistoryRecord, HistoryStats, OutputStalenessTracker, StaleReason, Staleness,
};
pub use reporter::{
    CollectingReporter, TaskEvent, TaskReporter, TaskReporterRegistry, TracingReporter,
};
