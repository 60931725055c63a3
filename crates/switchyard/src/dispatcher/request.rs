//! Request coordinates, forward history and loop state.

use crate::error::ErrorKind;
use crate::params::Params;

/// Coordinates the dispatcher is working on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchRequest {
    namespace: Option<String>,
    handler_name: String,
    action_name: String,
    params: Params,
}

impl DispatchRequest {
    /// Namespace, or `None` when unset or empty.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref().filter(|namespace| !namespace.is_empty())
    }

    /// Handler name; empty until set or defaulted.
    #[must_use]
    pub fn handler_name(&self) -> &str {
        &self.handler_name
    }

    /// Action name; empty until set or defaulted.
    #[must_use]
    pub fn action_name(&self) -> &str {
        &self.action_name
    }

    /// Request parameters.
    #[must_use]
    pub const fn params(&self) -> &Params {
        &self.params
    }

    pub(crate) fn set_namespace(&mut self, namespace: impl Into<String>) {
        self.namespace = Some(namespace.into());
    }

    pub(crate) fn set_handler_name(&mut self, handler: impl Into<String>) {
        self.handler_name = handler.into();
    }

    pub(crate) fn set_action_name(&mut self, action: impl Into<String>) {
        self.action_name = action.into();
    }

    pub(crate) fn set_params(&mut self, params: Params) {
        self.params = params;
    }

    pub(crate) const fn params_mut(&mut self) -> &mut Params {
        &mut self.params
    }
}

/// Coordinates captured immediately before the most recent forward.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchHistory {
    namespace: Option<String>,
    handler_name: Option<String>,
    action_name: Option<String>,
    params: Option<Params>,
}

impl DispatchHistory {
    pub(crate) fn capture(request: &DispatchRequest) -> Self {
        Self {
            namespace: request.namespace().map(str::to_owned),
            handler_name: Some(request.handler_name().to_owned()),
            action_name: Some(request.action_name().to_owned()),
            params: Some(request.params().clone()),
        }
    }

    /// Namespace before the last forward.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Handler name before the last forward.
    #[must_use]
    pub fn handler_name(&self) -> Option<&str> {
        self.handler_name.as_deref()
    }

    /// Action name before the last forward.
    #[must_use]
    pub fn action_name(&self) -> Option<&str> {
        self.action_name.as_deref()
    }

    /// Parameters before the last forward.
    #[must_use]
    pub const fn params(&self) -> Option<&Params> {
        self.params.as_ref()
    }
}

/// Phases of the dispatch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchState {
    /// Ready to dispatch.
    #[default]
    Idle,
    /// Looking up the handler.
    Resolving,
    /// Matching parameters to the action.
    Binding,
    /// Running the action.
    Invoking,
    /// The action forwarded; another iteration follows.
    Forwarded,
    /// The loop ended with a result.
    Finished,
    /// The loop ended with an error.
    Failed,
}

/// Why the previous iteration did not simply return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interruption {
    /// The action asked to finish with the value it set.
    Continue,
    /// A failure was redirected to an error handler.
    Failure {
        /// Category of the failure.
        kind: ErrorKind,
        /// Rendered failure message.
        message: String,
    },
}
