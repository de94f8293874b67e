//! Attaching error reporting to a task-queue worker.

use std::sync::Arc;

use tracing::info;

use crate::client::{Client, Transport};
use crate::config::{ConfigSource, ExtensionConfig};
use crate::context::{ContextGenerators, Installation, Lifecycle, LifecycleSignals};
use crate::payload::Fault;
use crate::signal::Signal;

use super::{TaskFailure, TaskHost, TaskInvocation, TaskPayloadBuilder, TaskSignals};

impl LifecycleSignals for TaskSignals {
    type Unit = TaskInvocation;
    type Failure = TaskFailure;

    fn begin(&self) -> &Signal<TaskInvocation> {
        &self.task_prerun
    }

    fn end(&self) -> &Signal<TaskInvocation> {
        &self.task_postrun
    }

    fn failure(&self) -> &Signal<TaskFailure> {
        &self.task_failure
    }

    fn fault(failure: &TaskFailure) -> &Fault {
        &failure.fault
    }
}

/// Error reporting for a task-queue worker.
///
/// Connects `setup_context` to `task_prerun`, `reset_context` to
/// `task_postrun`, and, when `report_exceptions` is set, the failure handler
/// to `task_failure`. The failure handler notifies synchronously, so the
/// payload is built while the failed task is still current.
pub struct TaskExtension {
    host: Arc<dyn TaskHost>,
    transport: Arc<dyn Transport>,
    installed: Option<Installation>,
}

impl TaskExtension {
    /// Creates an uninstalled extension for `host`, delivering through `transport`.
    pub fn new(host: Arc<dyn TaskHost>, transport: Arc<dyn Transport>) -> Self {
        Self {
            host,
            transport,
            installed: None,
        }
    }

    /// Installs error reporting and returns the installation's client.
    ///
    /// Installing again replaces the previous installation.
    pub fn install<S: ConfigSource + ?Sized>(
        &mut self,
        config: &S,
        generators: ContextGenerators,
        report_exceptions: bool,
    ) -> Arc<Client> {
        self.teardown();

        let config = ExtensionConfig::from_source(config);
        let builder = TaskPayloadBuilder::new(Arc::downgrade(&self.host));
        let client = config.build_client(Arc::clone(&self.transport), Arc::new(builder));

        self.installed = Some(Installation::connect(
            self.host.signals(),
            Lifecycle::new(Arc::clone(&client), generators),
            report_exceptions,
        ));
        info!(report_exceptions, "registered task signal handlers");
        client
    }

    /// Disconnects every listener. Does nothing when not installed.
    pub fn teardown(&mut self) {
        if let Some(installation) = self.installed.take() {
            installation.disconnect(self.host.signals());
            info!("task error reporting uninstalled");
        }
    }

    /// Returns true while installed.
    pub fn is_installed(&self) -> bool {
        self.installed.is_some()
    }

    /// Returns whether task failures are reported automatically.
    pub fn report_exceptions(&self) -> bool {
        self.installed.as_ref().is_some_and(Installation::report_exceptions)
    }

    /// Returns the current installation's client.
    pub fn client(&self) -> Option<Arc<Client>> {
        self.installed.as_ref().map(Installation::client)
    }
}

impl Drop for TaskExtension {
    fn drop(&mut self) {
        self.teardown();
    }
}
