//! The in-process face of the error-reporting service.
//!
//! [`Client`] owns the active context slot, the configuration and the
//! injected [`PayloadBuilder`]. Delivery is delegated to a [`Transport`];
//! the client never retries and never surfaces delivery failures.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::thread::{self, ThreadId};

use tracing::{debug, info, warn};

use crate::error::{TransportError, TransportErrorKind};
use crate::payload::{ContextMap, Fault, GenericPayloadBuilder, Notice, PayloadBuilder, ServerInfo};
use crate::redact::RedactionSet;
use crate::secret::Secret;

/// Settings that switch a [`Client`] from no-op mode to reporting mode.
#[derive(Debug)]
pub struct ClientConfig {
    api_key: Secret<String>,
    environment: String,
    params_filters: RedactionSet,
}

impl ClientConfig {
    /// Creates a client configuration.
    pub fn new(
        api_key: impl Into<String>,
        environment: impl Into<String>,
        params_filters: RedactionSet,
    ) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            environment: environment.into(),
            params_filters,
        }
    }

    /// Returns the API key.
    pub fn api_key(&self) -> &Secret<String> {
        &self.api_key
    }

    /// Returns the environment tag.
    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Returns the fields filtered out of params and session data.
    pub fn params_filters(&self) -> &RedactionSet {
        &self.params_filters
    }
}

/// Delivers finished notices to the reporting service.
pub trait Transport: Send + Sync {
    /// Sends one notice.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the notice could not be delivered. The
    /// client logs it and moves on.
    fn send_notice(&self, notice: &Notice) -> Result<(), TransportError>;
}

/// Transport that writes each notice as JSON through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTransport;

impl Transport for LogTransport {
    fn send_notice(&self, notice: &Notice) -> Result<(), TransportError> {
        let body = serde_json::to_string(notice).map_err(|err| {
            TransportError::with_message(TransportErrorKind::Serialization, err.to_string())
        })?;
        info!(
            target: "faultline::notice",
            class = %notice.error.class(),
            environment = %notice.server.environment_name,
            %body,
            "error notice"
        );
        Ok(())
    }
}

/// Transport that keeps every notice in memory.
///
/// Useful for tests and for hosts that ship notices themselves.
///
/// # Example
///
/// ```
/// use faultline::{Client, Fault, MemoryTransport, ClientConfig, RedactionSet};
/// use std::sync::Arc;
///
/// let transport = Arc::new(MemoryTransport::new());
/// let client = Client::builder(transport.clone()).build();
/// client.configure(ClientConfig::new("abcd", "test", RedactionSet::new()));
///
/// client.notify(&Fault::new("ZeroDivisionError", "division by zero"));
///
/// assert_eq!(transport.len(), 1);
/// assert_eq!(transport.notices()[0].server.environment_name, "test");
/// ```
#[derive(Debug, Default)]
pub struct MemoryTransport {
    notices: Mutex<Vec<Notice>>,
}

impl MemoryTransport {
    /// Creates an empty transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every notice received so far.
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of notices received.
    pub fn len(&self) -> usize {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if no notice has been received.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forgets every recorded notice.
    pub fn clear(&self) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Transport for MemoryTransport {
    fn send_notice(&self, notice: &Notice) -> Result<(), TransportError> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice.clone());
        Ok(())
    }
}

/// Builder for [`Client`].
pub struct ClientBuilder {
    transport: Arc<dyn Transport>,
    payload_builder: Option<Arc<dyn PayloadBuilder>>,
}

impl ClientBuilder {
    /// Sets the payload builder called for every notification.
    ///
    /// Defaults to [`GenericPayloadBuilder`].
    pub fn payload_builder(mut self, builder: Arc<dyn PayloadBuilder>) -> Self {
        self.payload_builder = Some(builder);
        self
    }

    /// Builds an unconfigured client. Call [`Client::configure`] to enable reporting.
    pub fn build(self) -> Client {
        Client {
            transport: self.transport,
            payload_builder: self
                .payload_builder
                .unwrap_or_else(|| Arc::new(GenericPayloadBuilder)),
            config: RwLock::new(None),
            contexts: Mutex::new(HashMap::new()),
        }
    }
}

/// Error-reporting client.
///
/// Starts in no-op mode: [`notify`](Self::notify) drops every fault until
/// [`configure`](Self::configure) is called.
///
/// The active context is kept per thread. A host that runs units of work
/// on several threads at once shares one client, and each thread only ever
/// sees and clears its own context.
pub struct Client {
    transport: Arc<dyn Transport>,
    payload_builder: Arc<dyn PayloadBuilder>,
    config: RwLock<Option<Arc<ClientConfig>>>,
    contexts: Mutex<HashMap<ThreadId, ContextMap>>,
}

impl Client {
    /// Starts building a client that delivers through `transport`.
    pub fn builder(transport: Arc<dyn Transport>) -> ClientBuilder {
        ClientBuilder {
            transport,
            payload_builder: None,
        }
    }

    /// Enables reporting with the given configuration.
    pub fn configure(&self, config: ClientConfig) {
        info!(
            environment = %config.environment(),
            params_filters = config.params_filters().len(),
            "reporting client configured"
        );
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(config));
    }

    /// Returns true once [`configure`](Self::configure) has been called.
    pub fn is_configured(&self) -> bool {
        self.current_config().is_some()
    }

    /// Returns the configured environment tag, if any.
    pub fn environment(&self) -> Option<String> {
        self.current_config().map(|config| config.environment().to_string())
    }

    /// Merges `context` into the calling thread's active context.
    pub fn set_context(&self, context: ContextMap) {
        self.contexts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(thread::current().id())
            .or_default()
            .extend(context);
    }

    /// Clears the calling thread's active context. Safe to call when nothing was set.
    pub fn reset_context(&self) {
        self.contexts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&thread::current().id());
    }

    /// Returns a snapshot of the calling thread's active context.
    pub fn context(&self) -> ContextMap {
        self.contexts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&thread::current().id())
            .cloned()
            .unwrap_or_default()
    }

    /// Reports `fault` with the active context.
    ///
    /// Returns true if the notice reached the transport. Returns false when
    /// reporting is disabled or delivery failed.
    pub fn notify(&self, fault: &Fault) -> bool {
        self.send(fault, None)
    }

    /// Reports `fault` with `extra` merged over the active context.
    ///
    /// `extra` applies to this notice only; the active context is unchanged.
    pub fn notify_with_context(&self, fault: &Fault, extra: ContextMap) -> bool {
        self.send(fault, Some(extra))
    }

    fn current_config(&self) -> Option<Arc<ClientConfig>> {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn send(&self, fault: &Fault, extra: Option<ContextMap>) -> bool {
        // No lock is held while the builder or transport runs.
        let Some(config) = self.current_config() else {
            debug!(class = %fault.class(), "reporting disabled, dropping notice");
            return false;
        };

        let mut context = self.context();
        if let Some(extra) = extra {
            context.extend(extra);
        }

        let notice = Notice {
            error: fault.clone(),
            request: self.payload_builder.build(&context, &config),
            server: ServerInfo {
                environment_name: config.environment().to_string(),
            },
        };

        match self.transport.send_notice(&notice) {
            Ok(()) => {
                debug!(
                    class = %fault.class(),
                    component = %notice.request.component,
                    action = %notice.request.action,
                    "notice delivered"
                );
                true
            }
            Err(err) => {
                warn!(class = %fault.class(), error = %err, "failed to deliver notice");
                false
            }
        }
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("configured", &self.is_configured())
            .field("context", &self.context())
            .finish_non_exhaustive()
    }
}
