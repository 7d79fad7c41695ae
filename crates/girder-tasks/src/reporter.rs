//! Task execution reporting

use std::sync::{Arc, Mutex};
use std::time::Duration;

use girder_core::task::TaskPath;

/// Events emitted during task execution
#[derive(Debug, Clone, PartialEq)]
pub enum TaskEvent {
    /// A task is about to run its actions
    Started { path: TaskPath, actions: usize },
    /// A task ran its actions
    Completed {
        path: TaskPath,
        duration: Duration,
        did_work: bool,
    },
    /// The task's predicate found nothing to do
    UpToDate { path: TaskPath },
    /// A task failed
    Failed {
        path: TaskPath,
        duration: Duration,
        error: String,
    },
    /// A task was not run
    Skipped { path: TaskPath, reason: String },
    /// All tasks processed
    AllCompleted {
        total: usize,
        executed: usize,
        up_to_date: usize,
        failed: usize,
        skipped: usize,
        duration: Duration,
    },
}

/// Trait for reporting task execution progress
pub trait TaskReporter: Send + Sync {
    fn report(&self, event: &TaskEvent);
}

/// Reporter that logs to tracing
#[derive(Debug, Default)]
pub struct TracingReporter;

impl TaskReporter for TracingReporter {
    fn report(&self, event: &TaskEvent) {
        match event {
            TaskEvent::Started { path, actions } => {
                tracing::info!("Starting {} ({} actions)", path, actions);
            }
            TaskEvent::Completed {
                path,
                duration,
                did_work,
            } => {
                if *did_work {
                    tracing::info!("{} completed in {:.1}s", path, duration.as_secs_f64());
                } else {
                    tracing::info!("{} completed without work in {:.1}s", path, duration.as_secs_f64());
                }
            }
            TaskEvent::UpToDate { path } => {
                tracing::info!("{} up to date", path);
            }
            TaskEvent::Failed {
                path,
                duration,
                error,
            } => {
                tracing::error!("{} failed after {:.1}s: {}", path, duration.as_secs_f64(), error);
            }
            TaskEvent::Skipped { path, reason } => {
                tracing::info!("{} skipped: {}", path, reason);
            }
            TaskEvent::AllCompleted {
                total,
                executed,
                up_to_date,
                failed,
                skipped,
                duration,
            } => {
                tracing::info!(
                    "All tasks processed: {} total, {} executed, {} up to date, {} failed, {} skipped ({:.1}s)",
                    total,
                    executed,
                    up_to_date,
                    failed,
                    skipped,
                    duration.as_secs_f64()
                );
            }
        }
    }
}

/// Reporter that collects events for later inspection
#[derive(Debug, Default)]
pub struct CollectingReporter {
    events: Mutex<Vec<TaskEvent>>,
}

impl CollectingReporter {
    pub fn events(&self) -> Vec<TaskEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl TaskReporter for CollectingReporter {
    fn report(&self, event: &TaskEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

/// Fans events out to several reporters
pub struct TaskReporterRegistry {
    reporters: Vec<Arc<dyn TaskReporter>>,
}

impl TaskReporterRegistry {
    /// Registry with the tracing reporter
    pub fn new() -> Self {
        Self {
            reporters: vec![Arc::new(TracingReporter)],
        }
    }

    pub fn empty() -> Self {
        Self {
            reporters: Vec::new(),
        }
    }

    pub fn register<R: TaskReporter + 'static>(&mut self, reporter: R) {
        self.reporters.push(Arc::new(reporter));
    }

    pub fn register_shared(&mut self, reporter: Arc<dyn TaskReporter>) {
        self.reporters.push(reporter);
    }

    pub fn all(&self) -> &[Arc<dyn TaskReporter>] {
        &self.reporters
    }
}

impl TaskReporter for TaskReporterRegistry {
    fn report(&self, event: &TaskEvent) {
        for reporter in &self.reporters {
            reporter.report(event);
        }
    }
}

impl Default for TaskReporterRegistry {
    fn default() -> Self {
        Self::new()
    }
}
