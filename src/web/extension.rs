//! Attaching error reporting to a web host.
//!
//! [`WebExtension::install`] wires three listeners into the host's
//! [`WebSignals`]:
//!
//! ```text
//! request_started        → setup_context    (always)
//! request_tearing_down   → reset_context    (always)
//! got_request_exception  → handle_exception (only with report_exceptions)
//! ```
//!
//! and gives the installation its own [`Client`] carrying a
//! [`WebPayloadBuilder`].

use std::sync::Arc;

use tracing::info;

use crate::client::{Client, Transport};
use crate::config::{ConfigSource, ExtensionConfig};
use crate::context::{ContextGenerators, Installation, Lifecycle, LifecycleSignals};
use crate::payload::Fault;
use crate::signal::Signal;

use super::{RequestState, WebHost, WebPayloadBuilder, WebSignals};

impl LifecycleSignals for WebSignals {
    type Unit = RequestState;
    type Failure = Fault;

    fn begin(&self) -> &Signal<RequestState> {
        &self.request_started
    }

    fn end(&self) -> &Signal<RequestState> {
        &self.request_tearing_down
    }

    fn failure(&self) -> &Signal<Fault> {
        &self.got_request_exception
    }

    fn fault(failure: &Fault) -> &Fault {
        failure
    }
}

/// Error reporting for a web host.
///
/// # Examples
///
/// ```
/// use faultline::web::{RequestState, WebExtension, WebHost, WebSignals};
/// use faultline::{ContextGenerators, MemoryTransport};
/// use std::collections::HashMap;
/// use std::sync::Arc;
///
/// struct App {
///     signals: WebSignals,
/// }
///
/// impl WebHost for App {
///     fn signals(&self) -> &WebSignals {
///         &self.signals
///     }
///     fn current_request(&self) -> Option<RequestState> {
///         None
///     }
/// }
///
/// let app: Arc<dyn WebHost> = Arc::new(App { signals: WebSignals::new() });
/// let mut extension = WebExtension::new(app.clone(), Arc::new(MemoryTransport::new()));
///
/// let mut config = HashMap::new();
/// config.insert("FAULTLINE_API_KEY".to_string(), "abcd".to_string());
/// let client = extension.install(&config, ContextGenerators::new(), true);
///
/// assert!(client.is_configured());
/// assert_eq!(app.signals().got_request_exception.receiver_count(), 1);
///
/// extension.teardown();
/// assert_eq!(app.signals().request_started.receiver_count(), 0);
/// ```
pub struct WebExtension {
    host: Arc<dyn WebHost>,
    transport: Arc<dyn Transport>,
    installed: Option<Installation>,
}

impl WebExtension {
    /// Creates an uninstalled extension for `host`, delivering through `transport`.
    pub fn new(host: Arc<dyn WebHost>, transport: Arc<dyn Transport>) -> Self {
        Self {
            host,
            transport,
            installed: None,
        }
    }

    /// Installs error reporting and returns the installation's client.
    ///
    /// Without an API key in `config` the listeners are still connected but
    /// the client stays in no-op mode. Installing again replaces the previous
    /// installation; subscriptions are never duplicated.
    pub fn install<S: ConfigSource + ?Sized>(
        &mut self,
        config: &S,
        generators: ContextGenerators,
        report_exceptions: bool,
    ) -> Arc<Client> {
        self.teardown();

        let config = ExtensionConfig::from_source(config);
        let builder = WebPayloadBuilder::new(
            Arc::downgrade(&self.host),
            config.exclude_headers().clone(),
        );
        let client = config.build_client(Arc::clone(&self.transport), Arc::new(builder));

        let installation = Installation::connect(
            self.host.signals(),
            Lifecycle::new(Arc::clone(&client), generators),
            report_exceptions,
        );
        info!(
            generators = installation.generator_count(),
            report_exceptions,
            "web error reporting installed"
        );
        self.installed = Some(installation);
        client
    }

    /// Disconnects every listener. Does nothing when not installed.
    pub fn teardown(&mut self) {
        if let Some(installation) = self.installed.take() {
            installation.disconnect(self.host.signals());
            info!("web error reporting uninstalled");
        }
    }

    /// Returns true while installed.
    pub fn is_installed(&self) -> bool {
        self.installed.is_some()
    }

    /// Returns whether failures are reported automatically.
    pub fn report_exceptions(&self) -> bool {
        self.installed.as_ref().is_some_and(Installation::report_exceptions)
    }

    /// Returns the current installation's client.
    pub fn client(&self) -> Option<Arc<Client>> {
        self.installed.as_ref().map(Installation::client)
    }
}

impl Drop for WebExtension {
    fn drop(&mut self) {
        self.teardown();
    }
}
