//! Typed lifecycle signals owned by the host.
//!
//! A host exposes one [`Signal`] per lifecycle event and fires it
//! synchronously from its own dispatch path. Listeners are held by strong
//! reference until they are explicitly disconnected with the
//! [`ListenerId`] returned by [`Signal::connect`].

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::Error;

static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

/// Handle for disconnecting a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener<A> = Arc<dyn Fn(&A) -> Result<(), Error> + Send + Sync>;

/// A lifecycle event that listeners can subscribe to.
///
/// # Examples
///
/// ```
/// use faultline::Signal;
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// let started: Signal<String> = Signal::new("request-started");
/// let seen = Arc::new(AtomicUsize::new(0));
///
/// let counter = seen.clone();
/// let id = started.connect(move |_path: &String| {
///     counter.fetch_add(1, Ordering::SeqCst);
///     Ok(())
/// });
///
/// started.send(&"/error".to_string()).unwrap();
/// assert!(started.disconnect(id));
/// started.send(&"/error".to_string()).unwrap();
///
/// assert_eq!(seen.load(Ordering::SeqCst), 1);
/// ```
pub struct Signal<A> {
    name: &'static str,
    listeners: Mutex<Vec<(ListenerId, Listener<A>)>>,
}

impl<A> Signal<A> {
    /// Creates a signal with no listeners.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Returns the signal's name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Registers a listener and returns the handle that disconnects it.
    pub fn connect<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&A) -> Result<(), Error> + Send + Sync + 'static,
    {
        let id = ListenerId(NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(listener)));
        id
    }

    /// Removes a listener. Returns false if it was not connected.
    pub fn disconnect(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Returns true if `id` is currently connected.
    pub fn is_connected(&self, id: ListenerId) -> bool {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|(existing, _)| *existing == id)
    }

    /// Returns the number of connected listeners.
    pub fn receiver_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Calls every listener in registration order.
    ///
    /// Listeners run outside the internal lock, so they may connect or
    /// disconnect listeners themselves.
    ///
    /// # Errors
    ///
    /// Stops at the first listener that fails and returns its error.
    pub fn send(&self, args: &A) -> Result<(), Error> {
        let listeners: Vec<Listener<A>> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in listeners {
            listener(args)?;
        }
        Ok(())
    }
}

impl<A> fmt::Debug for Signal<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("name", &self.name)
            .field("receivers", &self.receiver_count())
            .finish()
    }
}
