//! Exception reporting hooks for web request and task-queue hosts.
//!
//! faultline attaches to a host's lifecycle signals, keeps a per-unit-of-work
//! context built from user-supplied generators, and when a request handler or
//! task fails, forwards a redacted diagnostic payload to an error-reporting
//! [`Transport`].
//!
//! # Core Types
//!
//! - [`web::WebExtension`]: reporting for web hosts
//! - [`task::TaskExtension`]: reporting for task-queue workers
//! - [`Client`]: active context, configuration and notice delivery
//! - [`ContextGenerators`]: named callbacks evaluated at the start of every unit of work
//! - [`PayloadBuilder`]: builds the request section of each notice
//! - [`filter_map`] / [`RedactionSet`]: replaces sensitive fields with `[FILTERED]`
//! - [`Signal`]: typed lifecycle event bus owned by the host
//!
//! # Examples
//!
//! ```
//! use faultline::{Client, ClientConfig, ContextGenerators, Fault, Lifecycle, ContextLifecycle};
//! use faultline::{MemoryTransport, RedactionSet};
//! use std::sync::Arc;
//!
//! let transport = Arc::new(MemoryTransport::new());
//! let client = Arc::new(Client::builder(transport.clone()).build());
//! client.configure(ClientConfig::new("api-key", "production", RedactionSet::new()));
//!
//! let lifecycle = Lifecycle::new(
//!     client.clone(),
//!     ContextGenerators::new().with("worker", || Ok("w-1")),
//! );
//!
//! lifecycle.setup_context().expect("generators succeed");
//! lifecycle.handle_exception(&Fault::new("ZeroDivisionError", "division by zero"));
//! lifecycle.reset_context();
//!
//! let notice = &transport.notices()[0];
//! assert_eq!(notice.request.context["worker"], "w-1");
//! assert!(client.context().is_empty());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod client;
pub mod config;
mod context;
mod error;
mod payload;
mod redact;
mod secret;
mod signal;
pub mod task;
pub mod web;

pub use client::{Client, ClientBuilder, ClientConfig, LogTransport, MemoryTransport, Transport};
pub use config::{ConfigSource, EnvConfig, ExtensionConfig};
pub use context::{ContextGenerators, ContextLifecycle, Lifecycle};
pub use error::{Error, GeneratorError, TransportError, TransportErrorKind};
pub use payload::{
    ContextMap, Fault, GenericPayloadBuilder, Notice, PayloadBuilder, RequestPayload, ServerInfo,
};
pub use redact::{filter_map, omit_keys, RedactionSet, FILTERED};
pub use secret::Secret;
pub use signal::{ListenerId, Signal};
