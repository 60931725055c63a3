//! Forward targets.
//!
//! A [`Forward`] names the coordinates the dispatcher should move to; any
//! coordinate left unset keeps its current value. Targets can also be
//! written as text, `[module::]handler[::action]`, where the handler part is
//! uncamelized so `Error::index` addresses the `error` handler. The module
//! segment is informative: dispatchers never forward between modules.
//! Namespaced targets are built with [`Forward::with_namespace`].

use std::str::FromStr;

use crate::error::DispatchError;
use crate::naming::{NAMESPACE_SEPARATOR, NamingConvention, uncamelize};
use crate::params::Params;

use super::request::DispatchRequest;

/// Partial set of coordinates to dispatch next.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Forward {
    module: Option<String>,
    namespace: Option<String>,
    handler: Option<String>,
    action: Option<String>,
    params: Option<Params>,
}

impl Forward {
    /// Empty forward that re-dispatches the current coordinates.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forward to `action` on `handler`.
    #[must_use]
    pub fn to(handler: impl Into<String>, action: impl Into<String>) -> Self {
        Self::new().with_handler(handler).with_action(action)
    }

    /// Records the module the target belongs to.
    #[must_use]
    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    /// Sets the target namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Sets the target handler.
    #[must_use]
    pub fn with_handler(mut self, handler: impl Into<String>) -> Self {
        self.handler = Some(handler.into());
        self
    }

    /// Sets the target action.
    #[must_use]
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Replaces the request parameters.
    #[must_use]
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = Some(params);
        self
    }

    /// Module named by the target, if any.
    #[must_use]
    pub fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    /// Target namespace, if set.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Target handler, if set.
    #[must_use]
    pub fn handler(&self) -> Option<&str> {
        self.handler.as_deref()
    }

    /// Target action, if set.
    #[must_use]
    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    /// Replacement parameters, if set.
    #[must_use]
    pub const fn params(&self) -> Option<&Params> {
        self.params.as_ref()
    }

    /// Parses `[module::]handler[::action]`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidForward`] when the text is empty,
    /// contains an empty segment or has more than three segments.
    pub fn parse(target: &str) -> Result<Self, DispatchError> {
        let trimmed = target.trim();
        let segments: Vec<&str> = trimmed.split(NAMESPACE_SEPARATOR).collect();
        if trimmed.is_empty() || segments.iter().any(|segment| segment.is_empty()) {
            return Err(DispatchError::InvalidForward {
                target: target.to_owned(),
            });
        }

        let forward = match segments.as_slice() {
            [handler] => Self::new().with_handler(uncamelize(handler)),
            [handler, action] => Self::to(uncamelize(handler), *action),
            [module, handler, action] => {
                Self::to(uncamelize(handler), *action).with_module(*module)
            }
            _ => {
                return Err(DispatchError::InvalidForward {
                    target: target.to_owned(),
                });
            }
        };
        Ok(forward)
    }

    /// Returns `true` when dispatching this forward from `request` would land
    /// on the same handler class and action.
    pub(crate) fn lands_on(&self, request: &DispatchRequest, naming: &NamingConvention) -> bool {
        let namespace = self.namespace().or_else(|| request.namespace());
        let handler = self.handler().unwrap_or_else(|| request.handler_name());
        let action = self.action().unwrap_or_else(|| request.action_name());
        naming.handler_class(namespace, handler)
            == naming.handler_class(request.namespace(), request.handler_name())
            && action.eq_ignore_ascii_case(request.action_name())
    }

    /// Writes the set coordinates into `request`.
    pub(crate) fn apply_to(self, request: &mut DispatchRequest) {
        if let Some(namespace) = self.namespace {
            request.set_namespace(namespace);
        }
        if let Some(handler) = self.handler {
            request.set_handler_name(handler);
        }
        if let Some(action) = self.action {
            request.set_action_name(action);
        }
        if let Some(params) = self.params {
            request.set_params(params);
        }
    }
}

impl FromStr for Forward {
    type Err = DispatchError;

    fn from_str(target: &str) -> Result<Self, Self::Err> {
        Self::parse(target)
    }
}
