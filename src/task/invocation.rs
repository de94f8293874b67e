use serde_json::Value;

use crate::payload::{ContextMap, Fault};

/// Retry ceiling a task gets when none is configured.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// A registered task definition.
///
/// # Examples
///
/// ```
/// use faultline::task::TaskDescriptor;
///
/// let anonymous = TaskDescriptor::new("app.tasks", "generic_div");
/// assert_eq!(anonymous.registered_name(), "app.tasks.generic_div");
/// assert_eq!(anonymous.max_retries(), Some(3));
///
/// let named = TaskDescriptor::new("app.tasks", "generic_div").named("divider");
/// assert_eq!(named.registered_name(), "divider");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDescriptor {
    module: String,
    function: String,
    name: Option<String>,
    max_retries: Option<u32>,
}

impl TaskDescriptor {
    /// Describes `function` defined in `module`, with the default retry ceiling.
    pub fn new(module: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            function: function.into(),
            name: None,
            max_retries: Some(DEFAULT_MAX_RETRIES),
        }
    }

    /// Registers the task under an explicit name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the retry ceiling. `None` means unlimited.
    pub fn with_max_retries(mut self, max_retries: Option<u32>) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Module the task function is defined in.
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Explicit name if registered with one, else `<module>.<function>`.
    pub fn registered_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("{}.{}", self.module, self.function),
        }
    }

    /// Retry ceiling, if any.
    pub fn max_retries(&self) -> Option<u32> {
        self.max_retries
    }
}

/// One execution of a task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskInvocation {
    task: TaskDescriptor,
    id: String,
    args: Vec<Value>,
    kwargs: ContextMap,
    retries: u32,
}

impl TaskInvocation {
    /// Creates an invocation of `task` with no arguments and no retries yet.
    pub fn new(task: TaskDescriptor, id: impl Into<String>) -> Self {
        Self {
            task,
            id: id.into(),
            args: Vec::new(),
            kwargs: ContextMap::new(),
            retries: 0,
        }
    }

    /// Sets the positional arguments.
    pub fn with_args(mut self, args: Vec<Value>) -> Self {
        self.args = args;
        self
    }

    /// Sets the keyword arguments.
    pub fn with_kwargs(mut self, kwargs: ContextMap) -> Self {
        self.kwargs = kwargs;
        self
    }

    /// Sets how many times this invocation has been retried.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// The task being run.
    pub fn task(&self) -> &TaskDescriptor {
        &self.task
    }

    /// Task id assigned by the queue.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Positional arguments.
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Keyword arguments.
    pub fn kwargs(&self) -> &ContextMap {
        &self.kwargs
    }

    /// Retries so far.
    pub fn retries(&self) -> u32 {
        self.retries
    }
}

/// Arguments of the task-failure signal.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskFailure {
    /// Id of the failed task
    pub task_id: String,
    /// The failure raised by the task
    pub fault: Fault,
    /// Positional arguments the task ran with
    pub args: Vec<Value>,
    /// Keyword arguments the task ran with
    pub kwargs: ContextMap,
}

impl TaskFailure {
    /// Describes `fault` raised by `invocation`.
    pub fn new(invocation: &TaskInvocation, fault: Fault) -> Self {
        Self {
            task_id: invocation.id().to_string(),
            fault,
            args: invocation.args().to_vec(),
            kwargs: invocation.kwargs().clone(),
        }
    }
}
