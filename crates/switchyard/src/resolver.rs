//! Handler resolution through the service locator.

use tracing::debug;

use crate::dispatcher::DISPATCH_TARGET;
use crate::error::DispatchError;
use crate::handler::Handler;
use crate::locator::{Service, ServiceLocator};
use crate::naming::NamingConvention;

/// A handler obtained from the locator together with its class name.
pub struct ResolvedHandler {
    class: String,
    handler: Box<dyn Handler>,
}

impl ResolvedHandler {
    /// Fully qualified handler class.
    #[must_use]
    pub fn class(&self) -> &str {
        &self.class
    }

    /// Borrows the handler.
    #[must_use]
    pub fn handler(&self) -> &dyn Handler {
        self.handler.as_ref()
    }

    /// Consumes the resolution, yielding the handler.
    #[must_use]
    pub fn into_handler(self) -> Box<dyn Handler> {
        self.handler
    }
}

/// Maps request coordinates to a live handler instance.
pub struct HandlerResolver<'a> {
    locator: &'a dyn ServiceLocator,
    naming: &'a NamingConvention,
}

impl<'a> HandlerResolver<'a> {
    /// Creates a resolver over `locator` using `naming` to derive classes.
    #[must_use]
    pub const fn new(locator: &'a dyn ServiceLocator, naming: &'a NamingConvention) -> Self {
        Self { locator, naming }
    }

    /// Handler class the coordinates map to.
    #[must_use]
    pub fn class_name(&self, namespace: Option<&str>, handler: &str) -> String {
        self.naming.handler_class(namespace, handler)
    }

    /// Resolves and initialises the handler for `namespace` and `handler`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::HandlerNotFound`] when the locator has no
    /// service for the class or fails to build it, and
    /// [`DispatchError::InvalidHandler`] when the service is not a handler.
    pub fn resolve(
        &self,
        namespace: Option<&str>,
        handler: &str,
    ) -> Result<ResolvedHandler, DispatchError> {
        let class = self.class_name(namespace, handler);
        if !self.locator.has(&class) {
            debug!(target: DISPATCH_TARGET, class = %class, "handler class not registered");
            return Err(DispatchError::handler_not_found(class));
        }

        match self.locator.get(&class) {
            Ok(Service::Handler(mut instance)) => {
                instance.initialize();
                debug!(target: DISPATCH_TARGET, class = %class, "handler resolved");
                Ok(ResolvedHandler {
                    class,
                    handler: instance,
                })
            }
            Ok(Service::Shared(_)) => Err(DispatchError::invalid_handler(class)),
            Err(error) => Err(DispatchError::handler_unavailable(class, error)),
        }
    }
}
