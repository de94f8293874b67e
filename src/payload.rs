//! Notice bodies and the payload-builder extension point.
//!
//! A [`PayloadBuilder`] is handed to the [`Client`](crate::Client) when it is
//! built and is called once per notification, while the failing unit of work
//! is still live. The web and task adapters each supply their own.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::client::ClientConfig;

/// String-keyed JSON mapping used for context, params, session and cgi data.
pub type ContextMap = Map<String, Value>;

/// The failure being reported.
///
/// # Examples
///
/// ```
/// use faultline::Fault;
///
/// let err = "x".parse::<i32>().unwrap_err();
/// let fault = Fault::from_error(&err);
///
/// assert_eq!(fault.class(), "ParseIntError");
/// assert_eq!(fault.message(), "invalid digit found in string");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fault {
    class: String,
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    causes: Vec<String>,
}

impl Fault {
    /// Creates a fault with an explicit class name and message.
    pub fn new(class: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            message: message.into(),
            causes: Vec::new(),
        }
    }

    /// Creates a fault from an error value, recording its source chain as causes.
    ///
    /// The class is the error's type name without its module path or
    /// generic parameters.
    pub fn from_error<E: std::error::Error + 'static>(error: &E) -> Self {
        let mut causes = Vec::new();
        let mut source = error.source();
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }

        Self {
            class: short_type_name::<E>(),
            message: error.to_string(),
            causes,
        }
    }

    /// Appends a cause description.
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.causes.push(cause.into());
        self
    }

    /// Returns the class name.
    pub fn class(&self) -> &str {
        &self.class
    }

    /// Returns the message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the cause chain, outermost first.
    pub fn causes(&self) -> &[String] {
        &self.causes
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.class, self.message)
    }
}

fn short_type_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

/// Request section of a notice: where the failure happened and with what input.
///
/// Web payloads fill `url` and `session`; task payloads leave them out.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RequestPayload {
    /// Request URL without query string
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Module (and class) that handled the unit of work
    pub component: String,
    /// Route endpoint or task name
    pub action: String,
    /// Request parameters or task arguments
    pub params: ContextMap,
    /// Session data, already filtered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<ContextMap>,
    /// Headers or task metadata
    pub cgi_data: ContextMap,
    /// Active context at notification time
    pub context: ContextMap,
}

/// Environment the notice originates from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerInfo {
    /// Environment tag from configuration
    pub environment_name: String,
}

/// Complete body handed to a [`Transport`](crate::Transport).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    /// The reported failure
    pub error: Fault,
    /// Unit-of-work details
    pub request: RequestPayload,
    /// Originating environment
    pub server: ServerInfo,
}

/// Builds the request section of a notice at notification time.
///
/// Called synchronously from [`Client::notify`](crate::Client::notify), so
/// implementations can read the host's in-flight request or task state.
pub trait PayloadBuilder: Send + Sync {
    /// Assembles the payload from the active context and client configuration.
    fn build(&self, context: &ContextMap, config: &ClientConfig) -> RequestPayload;
}

/// Payload builder used when no adapter-specific builder applies.
///
/// Carries the active context and nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericPayloadBuilder;

impl PayloadBuilder for GenericPayloadBuilder {
    fn build(&self, context: &ContextMap, _config: &ClientConfig) -> RequestPayload {
        RequestPayload {
            context: context.clone(),
            ..RequestPayload::default()
        }
    }
}
