//! Builds the task-flavoured request section of a notice.

use std::sync::Weak;

use serde_json::{json, Value};
use tracing::debug;

use crate::client::ClientConfig;
use crate::payload::{ContextMap, GenericPayloadBuilder, PayloadBuilder, RequestPayload};

use super::{TaskHost, TaskInvocation};

/// Payload builder installed by [`TaskExtension`](super::TaskExtension).
pub struct TaskPayloadBuilder {
    host: Weak<dyn TaskHost>,
}

impl TaskPayloadBuilder {
    /// Creates a builder reading the current task from `host`.
    pub fn new(host: Weak<dyn TaskHost>) -> Self {
        Self { host }
    }
}

impl PayloadBuilder for TaskPayloadBuilder {
    fn build(&self, context: &ContextMap, config: &ClientConfig) -> RequestPayload {
        match self.host.upgrade().and_then(|host| host.current_task()) {
            Some(invocation) => build_task_payload(&invocation, context),
            None => {
                debug!("no task executing, using generic payload");
                GenericPayloadBuilder.build(context, config)
            }
        }
    }
}

/// Assembles the payload for `invocation`.
///
/// Task arguments are reported as-is; params filters do not apply to them.
///
/// # Examples
///
/// ```
/// use faultline::task::{build_task_payload, TaskDescriptor, TaskInvocation};
/// use serde_json::{json, Map};
///
/// let task = TaskDescriptor::new("app.tasks", "div").named("divider");
/// let invocation = TaskInvocation::new(task, "abc")
///     .with_args(vec![json!(1)]);
///
/// let payload = build_task_payload(&invocation, &Map::new());
///
/// assert_eq!(payload.component, "app.tasks");
/// assert_eq!(payload.action, "divider");
/// assert_eq!(payload.params["args"], json!([1]));
/// assert_eq!(payload.cgi_data["task_id"], json!("abc"));
/// ```
pub fn build_task_payload(invocation: &TaskInvocation, context: &ContextMap) -> RequestPayload {
    let task = invocation.task();

    let mut params = ContextMap::new();
    params.insert("args".to_string(), Value::Array(invocation.args().to_vec()));
    params.insert("kwargs".to_string(), Value::Object(invocation.kwargs().clone()));

    let mut cgi_data = ContextMap::new();
    cgi_data.insert("task_id".to_string(), json!(invocation.id()));
    cgi_data.insert("retries".to_string(), json!(invocation.retries()));
    cgi_data.insert("max_retries".to_string(), json!(task.max_retries()));

    RequestPayload {
        url: None,
        component: task.module().to_string(),
        action: task.registered_name(),
        params,
        session: None,
        cgi_data,
        context: context.clone(),
    }
}
