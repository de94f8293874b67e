//! Web host integration.
//!
//! A web framework plugs in by implementing [`WebHost`]: it owns a
//! [`WebSignals`] bus that it fires around every request, and it can hand
//! out a [`RequestState`] snapshot of the request currently in flight.
//! [`WebExtension`] subscribes to those signals and reports handler
//! failures with a payload built from the live request:
//!
//! | Field      | Source                                                     |
//! |------------|------------------------------------------------------------|
//! | `url`      | request URL without query string                           |
//! | `component`| view module, plus class name for class-based views         |
//! | `action`   | endpoint, blueprint-qualified                              |
//! | `params`   | query values, then form values, filtered                   |
//! | `session`  | session data, filtered                                     |
//! | `cgi_data` | headers minus the excluded ones                            |
//! | `context`  | active context                                             |
//!
//! # Integration Flow
//!
//! ```text
//! host.dispatch(request)
//!   ↓ request_started        → context generators run
//!   ↓ handler fails
//!   ↓ got_request_exception  → Client::notify → WebPayloadBuilder → Transport
//!   ↓ request_tearing_down   → context cleared
//! ```

mod extension;
mod host;
mod payload;
mod request;

pub use extension::WebExtension;
pub use host::{WebHost, WebSignals};
pub use payload::{build_request_payload, WebPayloadBuilder};
pub use request::{MultiDict, RequestState, ViewMeta};
