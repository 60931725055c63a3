//! Service lookup used to construct handlers.
//!
//! The dispatcher never builds handlers itself. It asks a [`ServiceLocator`]
//! for the service registered under the derived handler class; the bundled
//! [`Container`] builds a fresh handler per lookup from a registered factory
//! and hands out shared values by reference count. A process-wide default
//! container can be installed for dispatchers that are not given one.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::Lazy;
use thiserror::Error;

use crate::filter::{FILTER_SERVICE, Filter};
use crate::handler::Handler;

/// Service returned by a locator.
pub enum Service {
    /// A freshly constructed handler.
    Handler(Box<dyn Handler>),
    /// A shared value such as a repository or client.
    Shared(Arc<dyn Any + Send + Sync>),
}

impl Service {
    /// Returns the handler, if this service is one.
    #[must_use]
    pub fn into_handler(self) -> Option<Box<dyn Handler>> {
        match self {
            Self::Handler(handler) => Some(handler),
            Self::Shared(_) => None,
        }
    }

    /// Downcasts a shared service to `T`.
    #[must_use]
    pub fn downcast_shared<T: Any + Send + Sync>(self) -> Option<Arc<T>> {
        match self {
            Self::Shared(value) => value.downcast::<T>().ok(),
            Self::Handler(_) => None,
        }
    }
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Handler(_) => f.write_str("Service::Handler(..)"),
            Self::Shared(_) => f.write_str("Service::Shared(..)"),
        }
    }
}

/// Errors raised by service lookups.
#[derive(Debug, Error)]
pub enum LocatorError {
    /// Nothing is registered under the requested name.
    #[error("service '{name}' is not registered")]
    NotRegistered {
        /// Requested service name.
        name: String,
    },
    /// The service exists but could not be built.
    #[error("service '{name}' could not be constructed: {message}")]
    Construction {
        /// Requested service name.
        name: String,
        /// Reason reported by the locator.
        message: String,
    },
}

impl LocatorError {
    /// Builds a [`LocatorError::NotRegistered`].
    pub fn not_registered(name: impl Into<String>) -> Self {
        Self::NotRegistered { name: name.into() }
    }
}

/// Looks up services by name.
pub trait ServiceLocator: Send + Sync {
    /// Returns `true` when a service is registered under `name`.
    fn has(&self, name: &str) -> bool;

    /// Produces the service registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`LocatorError`] when the service is missing or cannot be built.
    fn get(&self, name: &str) -> Result<Service, LocatorError>;
}

type Factory = Arc<dyn Fn() -> Service + Send + Sync>;

#[derive(Clone)]
enum Entry {
    Factory(Factory),
    Shared(Arc<dyn Any + Send + Sync>),
}

static DEFAULT_CONTAINER: Lazy<RwLock<Option<Arc<Container>>>> = Lazy::new(|| RwLock::new(None));

/// Name-keyed registry of handler factories and shared services.
#[derive(Clone, Default)]
pub struct Container {
    entries: HashMap<String, Entry>,
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("Container").field("services", &names).finish()
    }
}

impl Container {
    /// Creates an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler factory under `name`, usually a handler class.
    pub fn register_handler<H, F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        H: Handler,
        F: Fn() -> H + Send + Sync + 'static,
    {
        let build: Factory = Arc::new(move || Service::Handler(Box::new(factory())));
        self.entries.insert(name.into(), Entry::Factory(build));
        self
    }

    /// Registers an arbitrary service factory under `name`.
    pub fn register_factory<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Service + Send + Sync + 'static,
    {
        self.entries
            .insert(name.into(), Entry::Factory(Arc::new(factory)));
        self
    }

    /// Registers a shared value under `name`.
    pub fn register_shared<T>(&mut self, name: impl Into<String>, value: T) -> &mut Self
    where
        T: Any + Send + Sync,
    {
        self.entries
            .insert(name.into(), Entry::Shared(Arc::new(value)));
        self
    }

    /// Registers `filter` as the shared [`FILTER_SERVICE`].
    pub fn register_filter<F>(&mut self, filter: F) -> &mut Self
    where
        F: Filter + 'static,
    {
        let shared: Arc<dyn Filter> = Arc::new(filter);
        self.register_shared(FILTER_SERVICE, shared)
    }

    /// Removes the service registered under `name`.
    pub fn remove(&mut self, name: &str) -> bool {
        self.entries.remove(name).is_some()
    }

    /// Number of registered services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Installs `container` as the process-wide default.
    pub fn set_default(container: Arc<Self>) {
        *DEFAULT_CONTAINER
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(container);
    }

    /// Process-wide default container, if one is installed.
    #[must_use]
    pub fn default_instance() -> Option<Arc<Self>> {
        DEFAULT_CONTAINER
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Removes the process-wide default container.
    pub fn reset() {
        *DEFAULT_CONTAINER
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl ServiceLocator for Container {
    fn has(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    fn get(&self, name: &str) -> Result<Service, LocatorError> {
        match self.entries.get(name) {
            Some(Entry::Factory(factory)) => Ok(factory()),
            Some(Entry::Shared(value)) => Ok(Service::Shared(Arc::clone(value))),
            None => Err(LocatorError::not_registered(name)),
        }
    }
}
