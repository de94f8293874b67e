//! The boundary a web host implements.

use crate::payload::Fault;
use crate::signal::Signal;

use super::RequestState;

/// Lifecycle signals a web host fires for every request.
///
/// The host must fire `request_started` once before the handler runs,
/// `got_request_exception` once if the handler fails, and
/// `request_tearing_down` once on every exit path, all synchronously from
/// its own dispatch.
#[derive(Debug)]
pub struct WebSignals {
    /// Fired before the handler runs
    pub request_started: Signal<RequestState>,
    /// Fired after the request, whatever its outcome
    pub request_tearing_down: Signal<RequestState>,
    /// Fired when the handler fails
    pub got_request_exception: Signal<Fault>,
}

impl WebSignals {
    /// Creates the three signals with no listeners.
    pub fn new() -> Self {
        Self {
            request_started: Signal::new("request-started"),
            request_tearing_down: Signal::new("request-tearing-down"),
            got_request_exception: Signal::new("got-request-exception"),
        }
    }
}

impl Default for WebSignals {
    fn default() -> Self {
        Self::new()
    }
}

/// A web framework that faultline can attach to.
///
/// # Examples
///
/// ```
/// use faultline::web::{RequestState, WebHost, WebSignals};
/// use std::sync::Mutex;
///
/// struct MyApp {
///     signals: WebSignals,
///     current: Mutex<Option<RequestState>>,
/// }
///
/// impl WebHost for MyApp {
///     fn signals(&self) -> &WebSignals {
///         &self.signals
///     }
///
///     fn current_request(&self) -> Option<RequestState> {
///         self.current.lock().unwrap().clone()
///     }
/// }
/// ```
pub trait WebHost: Send + Sync {
    /// The host's lifecycle signals.
    fn signals(&self) -> &WebSignals;

    /// The request currently being handled, if any.
    ///
    /// Only meaningful between `request_started` and `request_tearing_down`.
    fn current_request(&self) -> Option<RequestState>;
}
