use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::client::Client;
use crate::error::{Error, GeneratorError};
use crate::payload::{ContextMap, Fault};
use crate::signal::{ListenerId, Signal};

type GeneratorFn = Arc<dyn Fn() -> Result<Value, GeneratorError> + Send + Sync>;

/// Registry of named context generators.
///
/// Each generator is a zero-argument callback evaluated fresh at the start
/// of every unit of work; its value lands in the active context under the
/// name it was registered with.
///
/// # Examples
///
/// ```
/// use faultline::ContextGenerators;
/// use serde_json::json;
///
/// let generators = ContextGenerators::new()
///     .with("ringbearer", || Ok("bilbo"))
///     .with("attempt", || Ok(1));
///
/// let context = generators.generate().expect("generators succeed");
/// assert_eq!(context["ringbearer"], json!("bilbo"));
/// assert_eq!(context["attempt"], json!(1));
/// ```
#[derive(Clone, Default)]
pub struct ContextGenerators {
    entries: Vec<(String, GeneratorFn)>,
}

impl ContextGenerators {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a generator, replacing any previous one with the same name.
    pub fn with<F, V>(mut self, name: impl Into<String>, generator: F) -> Self
    where
        F: Fn() -> Result<V, GeneratorError> + Send + Sync + 'static,
        V: Into<Value>,
    {
        self.insert(name, generator);
        self
    }

    /// Registers a generator in place, replacing any previous one with the same name.
    pub fn insert<F, V>(&mut self, name: impl Into<String>, generator: F)
    where
        F: Fn() -> Result<V, GeneratorError> + Send + Sync + 'static,
        V: Into<Value>,
    {
        let name = name.into();
        let generator: GeneratorFn = Arc::new(move || generator().map(Into::into));
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = generator,
            None => self.entries.push((name, generator)),
        }
    }

    /// Returns the number of registered generators.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no generator is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Evaluates every generator.
    ///
    /// # Errors
    ///
    /// Returns `Error::ContextGenerator` for the first generator that fails;
    /// the remaining generators are not run.
    pub fn generate(&self) -> Result<ContextMap, Error> {
        let mut context = ContextMap::new();
        for (name, generator) in &self.entries {
            let value = generator().map_err(|source| Error::ContextGenerator {
                name: name.clone(),
                source,
            })?;
            context.insert(name.clone(), value);
        }
        Ok(context)
    }
}

impl fmt::Debug for ContextGenerators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Per-unit-of-work context handling shared by every host adapter.
pub trait ContextLifecycle {
    /// Builds the active context from the registered generators.
    ///
    /// # Errors
    ///
    /// Returns the first generator failure. Nothing is installed in that case.
    fn setup_context(&self) -> Result<(), Error>;

    /// Clears the active context. Runs on every exit path and is idempotent.
    fn reset_context(&self);

    /// Forwards a fault, unmodified, to the reporting client.
    fn handle_exception(&self, fault: &Fault);
}

/// The [`ContextLifecycle`] both adapters delegate to.
///
/// Owns the reporting client and the generator registry for one
/// installation.
#[derive(Debug)]
pub struct Lifecycle {
    client: Arc<Client>,
    generators: ContextGenerators,
}

impl Lifecycle {
    /// Creates a lifecycle bound to `client`.
    pub fn new(client: Arc<Client>, generators: ContextGenerators) -> Self {
        Self { client, generators }
    }

    /// Returns the reporting client.
    pub fn client(&self) -> &Arc<Client> {
        &self.client
    }

    /// Returns the generator registry.
    pub fn generators(&self) -> &ContextGenerators {
        &self.generators
    }
}

impl ContextLifecycle for Lifecycle {
    fn setup_context(&self) -> Result<(), Error> {
        let context = self.generators.generate()?;
        self.client.set_context(context);
        Ok(())
    }

    fn reset_context(&self) {
        self.client.reset_context();
    }

    fn handle_exception(&self, fault: &Fault) {
        self.client.notify(fault);
    }
}

/// The begin, end and failure events of a host's unit of work.
pub(crate) trait LifecycleSignals: 'static {
    /// Payload of the begin and end events.
    type Unit: 'static;
    /// Payload of the failure event.
    type Failure: 'static;

    fn begin(&self) -> &Signal<Self::Unit>;
    fn end(&self) -> &Signal<Self::Unit>;
    fn failure(&self) -> &Signal<Self::Failure>;
    fn fault(failure: &Self::Failure) -> &Fault;
}

/// Listeners one adapter installation holds on a host's signals.
///
/// ```text
/// begin    → setup_context    (always)
/// end      → reset_context    (always)
/// failure  → handle_exception (only with report_exceptions)
/// ```
pub(crate) struct Installation {
    lifecycle: Arc<Lifecycle>,
    report_exceptions: bool,
    begin: ListenerId,
    end: ListenerId,
    failure: Option<ListenerId>,
}

impl Installation {
    pub(crate) fn connect<S: LifecycleSignals>(
        signals: &S,
        lifecycle: Lifecycle,
        report_exceptions: bool,
    ) -> Self {
        let lifecycle = Arc::new(lifecycle);

        let begin = {
            let lifecycle = Arc::clone(&lifecycle);
            signals.begin().connect(move |_| lifecycle.setup_context())
        };
        let end = {
            let lifecycle = Arc::clone(&lifecycle);
            signals.end().connect(move |_| {
                lifecycle.reset_context();
                Ok(())
            })
        };
        let failure = report_exceptions.then(|| {
            let lifecycle = Arc::clone(&lifecycle);
            signals.failure().connect(move |failure| {
                lifecycle.handle_exception(S::fault(failure));
                Ok(())
            })
        });

        Self {
            lifecycle,
            report_exceptions,
            begin,
            end,
            failure,
        }
    }

    pub(crate) fn disconnect<S: LifecycleSignals>(self, signals: &S) {
        signals.begin().disconnect(self.begin);
        signals.end().disconnect(self.end);
        if let Some(failure) = self.failure {
            signals.failure().disconnect(failure);
        }
    }

    pub(crate) fn report_exceptions(&self) -> bool {
        self.report_exceptions
    }

    pub(crate) fn client(&self) -> Arc<Client> {
        Arc::clone(self.lifecycle.client())
    }

    pub(crate) fn generator_count(&self) -> usize {
        self.lifecycle.generators().len()
    }
}
