//! Task-queue worker integration.
//!
//! A worker plugs in by implementing [`TaskHost`]: it fires [`TaskSignals`]
//! around every task execution and exposes the [`TaskInvocation`] currently
//! running. [`TaskExtension`] reports failures with:
//!
//! - `component`: module of the task function
//! - `action`: registered task name
//! - `params`: `{args, kwargs}`
//! - `cgi_data`: `{task_id, retries, max_retries}`
//! - `context`: active context

mod extension;
mod host;
mod invocation;
mod payload;

pub use extension::TaskExtension;
pub use host::{TaskHost, TaskSignals};
pub use invocation::{TaskDescriptor, TaskFailure, TaskInvocation, DEFAULT_MAX_RETRIES};
pub use payload::{build_task_payload, TaskPayloadBuilder};
