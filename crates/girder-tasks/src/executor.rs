//! Task executor: runs a DAG in topological order, one task at a time

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use girder_core::project::Workspace;
use girder_core::task::TaskPath;

use crate::dag::TaskDag;
use crate::history::OutputStalenessTracker;
use crate::reporter::{TaskEvent, TaskReporter};

/// Result of a single task
#[derive(Debug, Clone)]
pub struct TaskResult {
    pub path: TaskPath,
    pub status: TaskStatus,
    pub duration: Duration,
}

/// Task execution status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    /// Actions ran to completion
    Success { did_work: bool },
    /// The predicate decided there was nothing to do
    UpToDate,
    Failed(String),
    Skipped(String),
}

impl TaskStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. } | Self::UpToDate)
    }
}

/// Options for the task executor
#[derive(Debug, Clone, Default)]
pub struct ExecutorOptions {
    /// Keep running tasks that do not depend on a failed one
    pub continue_on_error: bool,
    /// Report what would run without running anything
    pub dry_run: bool,
    /// Ignore task predicates
    pub rerun_tasks: bool,
}

/// Sequential reference executor
pub struct TaskExecutor {
    options: ExecutorOptions,
    tracker: Option<OutputStalenessTracker>,
    reporter: Arc<dyn TaskReporter>,
}

impl TaskExecutor {
    pub fn new(
        options: ExecutorOptions,
        tracker: Option<OutputStalenessTracker>,
        reporter: Arc<dyn TaskReporter>,
    ) -> Self {
        Self {
            options,
            tracker,
            reporter,
        }
    }

    /// Execute every task of the DAG. Results come back in execution order.
    pub fn execute(&self, workspace: &mut Workspace, dag: &TaskDag) -> Vec<TaskResult> {
        let start = Instant::now();
        let mut results = Vec::with_capacity(dag.len());
        // failed tasks and everything blocked by them
        let mut broken: BTreeSet<TaskPath> = BTreeSet::new();

        for path in dag.sorted() {
            let blocked_by = dag
                .get(path)
                .and_then(|node| node.dependencies.iter().find(|d| broken.contains(*d)))
                .cloned();

            let result = if let Some(dependency) = blocked_by {
                self.skip(path, format!("dependency {} did not complete", dependency))
            } else if !broken.is_empty() && !self.options.continue_on_error {
                self.skip(path, "an earlier task failed".to_string())
            } else {
                self.execute_task(workspace, path)
            };

            if !result.status.is_success() {
                broken.insert(path.clone());
            }
            results.push(result);
        }

        let count = |f: fn(&TaskStatus) -> bool| results.iter().filter(|r| f(&r.status)).count();
        self.reporter.report(&TaskEvent::AllCompleted {
            total: results.len(),
            executed: count(|s| matches!(s, TaskStatus::Success { .. })),
            up_to_date: count(|s| matches!(s, TaskStatus::UpToDate)),
            failed: count(|s| matches!(s, TaskStatus::Failed(_))),
            skipped: count(|s| matches!(s, TaskStatus::Skipped(_))),
            duration: start.elapsed(),
        });

        results
    }

    fn skip(&self, path: &TaskPath, reason: String) -> TaskResult {
        self.reporter.report(&TaskEvent::Skipped {
            path: path.clone(),
            reason: reason.clone(),
        });
        TaskResult {
            path: path.clone(),
            status: TaskStatus::Skipped(reason),
            duration: Duration::ZERO,
        }
    }

    fn fail(&self, path: &TaskPath, start: Instant, error: String) -> TaskResult {
        let duration = start.elapsed();
        self.reporter.report(&TaskEvent::Failed {
            path: path.clone(),
            duration,
            error: error.clone(),
        });
        TaskResult {
            path: path.clone(),
            status: TaskStatus::Failed(error),
            duration,
        }
    }

    fn execute_task(&self, workspace: &mut Workspace, path: &TaskPath) -> TaskResult {
        let start = Instant::now();
        let root_dir = workspace.root_dir().to_path_buf();

        let outcome = {
            let Some((project, task)) = workspace.find_task(path) else {
                return self.fail(path, start, format!("Task '{}' not found", path));
            };

            if !self.options.rerun_tasks {
                match task.should_run(project) {
                    Ok(true) => {}
                    Ok(false) => {
                        self.reporter.report(&TaskEvent::UpToDate { path: path.clone() });
                        return TaskResult {
                            path: path.clone(),
                            status: TaskStatus::UpToDate,
                            duration: start.elapsed(),
                        };
                    }
                    Err(e) => return self.fail(path, start, format!("{:#}", e)),
                }
            }

            if self.options.dry_run {
                return self.skip(path, "dry run".to_string());
            }

            self.reporter.report(&TaskEvent::Started {
                path: path.clone(),
                actions: task.actions().len(),
            });
            task.run_actions(project)
        };

        match outcome {
            Ok(did_work) => {
                if let Ok(task) = workspace.task_mut(path) {
                    task.set_did_work(did_work);
                }
                if let (Some(tracker), Ok(task)) = (&self.tracker, workspace.task(path)) {
                    if let Err(e) = tracker.record_success(&root_dir, task) {
                        return self.fail(path, start, e.to_string());
                    }
                }

                let duration = start.elapsed();
                debug!(task = %path, did_work, "task completed");
                self.reporter.report(&TaskEvent::Completed {
                    path: path.clone(),
                    duration,
                    did_work,
                });
                TaskResult {
                    path: path.clone(),
                    status: TaskStatus::Success { did_work },
                    duration,
                }
            }
            Err(e) => {
                let mut message = format!("{:#}", e);
                if let Some(tracker) = &self.tracker {
                    if let Err(history_err) = tracker.record_failure(&root_dir, path) {
                        warn!(task = %path, error = %history_err, "could not remove task history");
                        message = format!("{}; task history not cleared: {}", message, history_err);
                    }
                }
                self.fail(path, start, message)
            }
        }
    }
}
