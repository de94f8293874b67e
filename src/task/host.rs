//! The boundary a task-queue worker implements.

use crate::signal::Signal;

use super::{TaskFailure, TaskInvocation};

/// Lifecycle signals a worker fires for every task execution.
///
/// `task_prerun` fires once before the task body, `task_failure` once if it
/// fails, and `task_postrun` once afterwards whatever the outcome.
#[derive(Debug)]
pub struct TaskSignals {
    /// Fired before the task body runs
    pub task_prerun: Signal<TaskInvocation>,
    /// Fired after the task body, whatever its outcome
    pub task_postrun: Signal<TaskInvocation>,
    /// Fired when the task body fails
    pub task_failure: Signal<TaskFailure>,
}

impl TaskSignals {
    /// Creates the three signals with no listeners.
    pub fn new() -> Self {
        Self {
            task_prerun: Signal::new("task-prerun"),
            task_postrun: Signal::new("task-postrun"),
            task_failure: Signal::new("task-failure"),
        }
    }
}

impl Default for TaskSignals {
    fn default() -> Self {
        Self::new()
    }
}

/// A task-queue worker that faultline can attach to.
pub trait TaskHost: Send + Sync {
    /// The worker's lifecycle signals.
    fn signals(&self) -> &TaskSignals;

    /// The task currently executing, if any.
    ///
    /// Only meaningful between `task_prerun` and `task_postrun`.
    fn current_task(&self) -> Option<TaskInvocation>;
}
