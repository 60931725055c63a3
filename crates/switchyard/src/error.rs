//! Error types raised while resolving and running actions.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::locator::LocatorError;

/// Boxed error returned by handler actions.
pub type ActionError = Box<dyn StdError + Send + Sync + 'static>;

/// Failure categories that may be routed to an error handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No handler is registered under the derived class name.
    HandlerNotFound,
    /// The locator returned a service that is not a handler.
    InvalidHandler,
    /// The handler exposes no matching action method.
    ActionNotFound,
    /// A required action parameter could not be supplied.
    ParameterMismatch,
    /// The action itself failed.
    InvocationError,
}

impl ErrorKind {
    /// Stable label used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HandlerNotFound => "handler_not_found",
            Self::InvalidHandler => "invalid_handler",
            Self::ActionNotFound => "action_not_found",
            Self::ParameterMismatch => "parameter_mismatch",
            Self::InvocationError => "invocation_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by [`crate::Dispatcher::dispatch`] and its collaborators.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The locator has no service for the handler class.
    #[error("{class} handler class cannot be loaded")]
    HandlerNotFound {
        /// Fully qualified handler class.
        class: String,
        /// Locator failure, when the lookup itself errored.
        #[source]
        source: Option<Arc<LocatorError>>,
    },
    /// The locator returned something other than a handler.
    #[error("Invalid handler returned from the services container")]
    InvalidHandler {
        /// Fully qualified handler class.
        class: String,
    },
    /// The handler has no method for the requested action.
    #[error("Action '{action}' was not found on handler '{handler}'")]
    ActionNotFound {
        /// Handler name as requested.
        handler: String,
        /// Action name as requested.
        action: String,
    },
    /// A required parameter had no supplied value and no default.
    #[error("Action '{action}' on handler '{handler}' requires parameter '{parameter}'")]
    ParameterMismatch {
        /// Handler name as requested.
        handler: String,
        /// Action name as requested.
        action: String,
        /// Formal parameter that could not be bound.
        parameter: String,
    },
    /// The forward bound was exceeded within one dispatch.
    #[error("Dispatcher has detected a cyclic routing causing stability problems")]
    MaxForwardsExceeded {
        /// Bound that was exceeded.
        limit: u32,
    },
    /// The action returned an error.
    #[error("action '{action}' on handler '{handler}' failed: {source}")]
    ActionInvocation {
        /// Handler name as requested.
        handler: String,
        /// Action name as requested.
        action: String,
        /// Error raised by the action.
        #[source]
        source: ActionError,
    },
    /// Dispatch was attempted without a service locator.
    #[error("A service locator is required to dispatch")]
    MissingLocator,
    /// Parameters were supplied in an unsupported shape.
    #[error("Parameters must be an Array")]
    InvalidParams,
    /// A textual forward target was not `[module::]handler[::action]`.
    #[error("Forward target '{target}' must be written as [module::]handler[::action]")]
    InvalidForward {
        /// Target text as supplied.
        target: String,
    },
    /// Filtered parameter lookups need a locator with a `filter` service.
    #[error("A service locator with a 'filter' service is required to filter parameters")]
    FilterUnavailable {
        /// Locator failure, when the lookup itself errored.
        #[source]
        source: Option<Arc<LocatorError>>,
    },
    /// The `filter` service rejected a parameter value.
    #[error("parameter '{parameter}' could not be filtered: {source}")]
    FilterFailed {
        /// Parameter name or index.
        parameter: String,
        /// Error raised by the filter.
        #[source]
        source: ActionError,
    },
    /// A forward was requested after the dispatch loop ended.
    #[error("forward() called after the dispatch loop finished")]
    InvalidState,
}

impl DispatchError {
    /// Builds a [`DispatchError::HandlerNotFound`] without a locator source.
    pub fn handler_not_found(class: impl Into<String>) -> Self {
        Self::HandlerNotFound {
            class: class.into(),
            source: None,
        }
    }

    /// Builds a [`DispatchError::HandlerNotFound`] caused by a locator failure.
    pub fn handler_unavailable(class: impl Into<String>, source: LocatorError) -> Self {
        Self::HandlerNotFound {
            class: class.into(),
            source: Some(Arc::new(source)),
        }
    }

    /// Builds a [`DispatchError::InvalidHandler`].
    pub fn invalid_handler(class: impl Into<String>) -> Self {
        Self::InvalidHandler {
            class: class.into(),
        }
    }

    /// Builds a [`DispatchError::ActionNotFound`].
    pub fn action_not_found(handler: impl Into<String>, action: impl Into<String>) -> Self {
        Self::ActionNotFound {
            handler: handler.into(),
            action: action.into(),
        }
    }

    /// Builds a [`DispatchError::ParameterMismatch`].
    pub fn parameter_mismatch(
        handler: impl Into<String>,
        action: impl Into<String>,
        parameter: impl Into<String>,
    ) -> Self {
        Self::ParameterMismatch {
            handler: handler.into(),
            action: action.into(),
            parameter: parameter.into(),
        }
    }

    /// Builds a [`DispatchError::ActionInvocation`].
    pub fn action_failed(
        handler: impl Into<String>,
        action: impl Into<String>,
        source: ActionError,
    ) -> Self {
        Self::ActionInvocation {
            handler: handler.into(),
            action: action.into(),
            source,
        }
    }

    /// Category used for error-handler routing, if the failure is recoverable.
    #[must_use]
    pub const fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::HandlerNotFound { .. } => Some(ErrorKind::HandlerNotFound),
            Self::InvalidHandler { .. } => Some(ErrorKind::InvalidHandler),
            Self::ActionNotFound { .. } => Some(ErrorKind::ActionNotFound),
            Self::ParameterMismatch { .. } => Some(ErrorKind::ParameterMismatch),
            Self::ActionInvocation { .. } => Some(ErrorKind::InvocationError),
            Self::MaxForwardsExceeded { .. }
            | Self::MissingLocator
            | Self::InvalidParams
            | Self::InvalidForward { .. }
            | Self::FilterUnavailable { .. }
            | Self::FilterFailed { .. }
            | Self::InvalidState => None,
        }
    }

    /// Extracts the action's own error from an invocation failure.
    ///
    /// # Errors
    ///
    /// Returns `self` unchanged when the error is not an invocation failure.
    pub fn into_action_error(self) -> Result<ActionError, Self> {
        match self {
            Self::ActionInvocation { source, .. } => Ok(source),
            other => Err(other),
        }
    }
}
