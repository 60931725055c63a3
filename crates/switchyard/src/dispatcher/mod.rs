//! The dispatch loop.
//!
//! A [`Dispatcher`] holds the coordinates of the current request (namespace,
//! handler name, action name and parameters) and drives them through
//! resolution, binding and invocation until an action returns a value or
//! signals continue. Actions may forward to other coordinates; every forward
//! counts towards a bound so routing cycles end in
//! [`DispatchError::MaxForwardsExceeded`]. Recoverable failures can be
//! redirected to an error handler bound per [`ErrorKind`].

mod error_handler;
mod forward;
mod request;

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use switchyard_config::Config;
use tracing::{debug, info, warn};

use crate::binder::{BindRequest, ParameterBinder};
use crate::context::ActionContext;
use crate::error::{DispatchError, ErrorKind};
use crate::filter::filtered_param;
use crate::handler::{ActionOutcome, Handler};
use crate::invoker::ActionInvoker;
use crate::locator::{Container, ServiceLocator};
use crate::naming::NamingConvention;
use crate::params::{ParamKey, Params};
use crate::resolver::HandlerResolver;

use self::error_handler::ErrorHandlers;
pub use self::forward::Forward;
pub use self::request::{DispatchHistory, DispatchRequest, DispatchState, Interruption};

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

enum Step {
    Finished,
    Forwarded,
}

/// Resolves handlers and runs their actions for one request at a time.
pub struct Dispatcher {
    module_name: Option<String>,
    naming: NamingConvention,
    default_namespace: Option<String>,
    default_handler: String,
    default_action: String,
    max_forwards: u32,
    binder: ParameterBinder,
    locator: Option<Arc<dyn ServiceLocator>>,
    request: DispatchRequest,
    history: DispatchHistory,
    error_handlers: ErrorHandlers,
    state: DispatchState,
    returned_value: Value,
    active_handler: Option<Box<dyn Handler>>,
    last_interruption: Option<Interruption>,
    forwarded: bool,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("request", &self.request)
            .field("history", &self.history)
            .field("state", &self.state)
            .field("returned_value", &self.returned_value)
            .field("last_interruption", &self.last_interruption)
            .field("forwarded", &self.forwarded)
            .finish_non_exhaustive()
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl Dispatcher {
    /// Creates a dispatcher with default conventions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a dispatcher seeded from loaded configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            module_name: None,
            naming: NamingConvention::from_config(config),
            default_namespace: config.default_namespace().map(str::to_owned),
            default_handler: config.default_handler.clone(),
            default_action: config.default_action.clone(),
            max_forwards: config.max_forwards,
            binder: ParameterBinder::new(config.logic_binding),
            locator: None,
            request: DispatchRequest::default(),
            history: DispatchHistory::default(),
            error_handlers: ErrorHandlers::default(),
            state: DispatchState::Idle,
            returned_value: Value::Null,
            active_handler: None,
            last_interruption: None,
            forwarded: false,
        }
    }

    /// Uses `locator` instead of the process-wide default container.
    #[must_use]
    pub fn with_locator(mut self, locator: Arc<dyn ServiceLocator>) -> Self {
        self.locator = Some(locator);
        self
    }

    const fn rearm(&mut self) -> &mut Self {
        self.state = DispatchState::Idle;
        self
    }

    /// Sets the service locator.
    pub fn set_locator(&mut self, locator: Arc<dyn ServiceLocator>) -> &mut Self {
        self.locator = Some(locator);
        self.rearm()
    }

    /// Records the module this dispatcher serves. The module is informative
    /// and does not take part in handler resolution.
    pub fn set_module_name(&mut self, module: impl Into<String>) -> &mut Self {
        let value: String = module.into();
        self.module_name = Some(value).filter(|name| !name.is_empty());
        self
    }

    /// Sets the namespace of the next dispatch.
    pub fn set_namespace(&mut self, namespace: impl Into<String>) -> &mut Self {
        self.request.set_namespace(namespace);
        self.rearm()
    }

    /// Sets the handler name of the next dispatch.
    pub fn set_handler_name(&mut self, handler: impl Into<String>) -> &mut Self {
        self.request.set_handler_name(handler);
        self.forwarded = false;
        self.rearm()
    }

    /// Sets the action name of the next dispatch.
    pub fn set_action_name(&mut self, action: impl Into<String>) -> &mut Self {
        self.request.set_action_name(action);
        self.forwarded = false;
        self.rearm()
    }

    /// Replaces the parameters of the next dispatch.
    pub fn set_params(&mut self, params: Params) -> &mut Self {
        self.request.set_params(params);
        self.rearm()
    }

    /// Sets a single parameter of the next dispatch.
    pub fn set_param(&mut self, key: impl Into<ParamKey>, value: impl Into<Value>) -> &mut Self {
        self.request.params_mut().set(key, value);
        self.rearm()
    }

    /// Namespace used when the request has none.
    pub fn set_default_namespace(&mut self, namespace: impl Into<String>) -> &mut Self {
        let value: String = namespace.into();
        self.default_namespace = Some(value).filter(|prefix| !prefix.is_empty());
        self.rearm()
    }

    /// Handler name used when the request has none.
    pub fn set_default_handler(&mut self, handler: impl Into<String>) -> &mut Self {
        self.default_handler = handler.into();
        self.rearm()
    }

    /// Action name used when the request has none.
    pub fn set_default_action(&mut self, action: impl Into<String>) -> &mut Self {
        self.default_action = action.into();
        self.rearm()
    }

    /// Suffix appended to handler classes.
    pub fn set_handler_suffix(&mut self, suffix: impl Into<String>) -> &mut Self {
        self.naming.set_handler_suffix(suffix);
        self.rearm()
    }

    /// Suffix appended to action methods.
    pub fn set_action_suffix(&mut self, suffix: impl Into<String>) -> &mut Self {
        self.naming.set_action_suffix(suffix);
        self.rearm()
    }

    /// Toggles camelization of handler names.
    pub const fn set_camelize_handler(&mut self, enabled: bool) -> &mut Self {
        self.naming.set_camelize_handler(enabled);
        self.rearm()
    }

    /// Toggles camelization of namespaces.
    pub const fn set_camelize_namespace(&mut self, enabled: bool) -> &mut Self {
        self.naming.set_camelize_namespace(enabled);
        self.rearm()
    }

    /// Toggles logic binding.
    pub const fn set_logic_binding(&mut self, enabled: bool) -> &mut Self {
        self.binder = ParameterBinder::new(enabled);
        self.rearm()
    }

    /// Forwards permitted within one dispatch.
    pub const fn set_max_forwards(&mut self, limit: u32) -> &mut Self {
        self.max_forwards = limit;
        self.rearm()
    }

    /// Routes failures of the given kinds to `target`, written as
    /// `[module::]handler[::action]`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidForward`] when `target` is malformed.
    pub fn set_error_handler<I>(
        &mut self,
        target: &str,
        kinds: I,
    ) -> Result<&mut Self, DispatchError>
    where
        I: IntoIterator<Item = ErrorKind>,
    {
        let forward = Forward::parse(target)?;
        self.error_handlers.bind(&forward, kinds);
        Ok(self.rearm())
    }

    /// Removes every error-handler binding.
    pub fn clear_error_handlers(&mut self) -> &mut Self {
        self.error_handlers.clear();
        self.rearm()
    }

    /// Overrides the value the dispatch reports.
    pub fn set_returned_value(&mut self, value: impl Into<Value>) -> &mut Self {
        self.returned_value = value.into();
        self
    }

    /// Locator used by [`Self::dispatch`]: the explicit one, else the
    /// process-wide default container.
    #[must_use]
    pub fn locator(&self) -> Option<Arc<dyn ServiceLocator>> {
        self.locator.clone().or_else(|| {
            Container::default_instance().map(|container| container as Arc<dyn ServiceLocator>)
        })
    }

    /// Module this dispatcher serves, if one was recorded.
    #[must_use]
    pub fn module_name(&self) -> Option<&str> {
        self.module_name.as_deref()
    }

    /// Namespace of the request, falling back to the default namespace.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.request
            .namespace()
            .or_else(|| self.default_namespace.as_deref())
    }

    /// Handler name of the request; empty until set or dispatched.
    #[must_use]
    pub fn handler_name(&self) -> &str {
        self.request.handler_name()
    }

    /// Action name of the request; empty until set or dispatched.
    #[must_use]
    pub fn action_name(&self) -> &str {
        self.request.action_name()
    }

    /// Request parameters.
    #[must_use]
    pub const fn params(&self) -> &Params {
        self.request.params()
    }

    /// Single request parameter.
    #[must_use]
    pub fn param(&self, key: impl Into<ParamKey>) -> Option<&Value> {
        self.request.params().get(&key.into())
    }

    /// Single request parameter, or `default` when absent.
    #[must_use]
    pub fn param_or(&self, key: impl Into<ParamKey>, default: Value) -> Value {
        self.param(key).cloned().unwrap_or(default)
    }

    /// Single request parameter sanitised by the locator's
    /// [`FILTER_SERVICE`](crate::FILTER_SERVICE), applying `filters` in order.
    /// With no filters the raw value is returned.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::FilterUnavailable`] when no locator provides a
    /// filter and [`DispatchError::FilterFailed`] when the filter rejects the
    /// value.
    pub fn filtered_param(
        &self,
        key: impl Into<ParamKey>,
        filters: &[&str],
    ) -> Result<Option<Value>, DispatchError> {
        let locator = self.locator();
        filtered_param(locator.as_deref(), self.request.params(), &key.into(), filters)
    }

    /// Current request coordinates.
    #[must_use]
    pub const fn request(&self) -> &DispatchRequest {
        &self.request
    }

    /// Coordinates before the most recent forward.
    #[must_use]
    pub const fn history(&self) -> &DispatchHistory {
        &self.history
    }

    /// Namespace before the most recent forward.
    #[must_use]
    pub fn previous_namespace(&self) -> Option<&str> {
        self.history.namespace()
    }

    /// Handler name before the most recent forward.
    #[must_use]
    pub fn previous_handler_name(&self) -> Option<&str> {
        self.history.handler_name()
    }

    /// Action name before the most recent forward.
    #[must_use]
    pub fn previous_action_name(&self) -> Option<&str> {
        self.history.action_name()
    }

    /// Parameters before the most recent forward.
    #[must_use]
    pub const fn previous_params(&self) -> Option<&Params> {
        self.history.params()
    }

    /// Handler class the current coordinates map to.
    #[must_use]
    pub fn handler_class(&self) -> String {
        let handler = Some(self.request.handler_name())
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.default_handler);
        self.naming.handler_class(self.namespace(), handler)
    }

    /// Action method the current coordinates map to.
    #[must_use]
    pub fn active_method(&self) -> String {
        let action = Some(self.request.action_name())
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.default_action);
        self.naming.action_method(action)
    }

    /// Value reported by the last dispatch.
    #[must_use]
    pub const fn returned_value(&self) -> &Value {
        &self.returned_value
    }

    /// Handler resolved most recently in the last dispatch.
    #[must_use]
    pub fn active_handler(&self) -> Option<&dyn Handler> {
        self.active_handler.as_deref()
    }

    /// Interruption recorded during the last dispatch.
    #[must_use]
    pub const fn last_interruption(&self) -> Option<&Interruption> {
        self.last_interruption.as_ref()
    }

    /// Whether the current coordinates were reached by a forward.
    #[must_use]
    pub const fn was_forwarded(&self) -> bool {
        self.forwarded
    }

    /// Whether the last dispatch ended with a result.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        matches!(self.state, DispatchState::Finished)
    }

    /// Current loop state.
    #[must_use]
    pub const fn state(&self) -> DispatchState {
        self.state
    }

    /// Error-handler target bound to `kind`.
    #[must_use]
    pub fn error_handler(&self, kind: ErrorKind) -> Option<&Forward> {
        self.error_handlers.target_for(kind)
    }

    /// Naming rules in effect.
    #[must_use]
    pub const fn naming(&self) -> &NamingConvention {
        &self.naming
    }

    /// Forward bound in effect.
    #[must_use]
    pub const fn max_forwards(&self) -> u32 {
        self.max_forwards
    }

    /// Prepares the next dispatch to run `target` instead of the current
    /// coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidState`] after a dispatch finished or
    /// failed, until a setter re-arms the request.
    pub fn forward(&mut self, target: Forward) -> Result<&mut Self, DispatchError> {
        match self.state {
            DispatchState::Finished | DispatchState::Failed => Err(DispatchError::InvalidState),
            _ => {
                self.apply_forward(target);
                Ok(self)
            }
        }
    }

    /// Runs the dispatch loop for the current coordinates.
    ///
    /// # Errors
    ///
    /// Returns the first failure that no error handler recovers from,
    /// [`DispatchError::MaxForwardsExceeded`] when forwards exceed the bound,
    /// and [`DispatchError::MissingLocator`] when no locator is available.
    ///
    /// An error returned by an action arrives wrapped in
    /// [`DispatchError::ActionInvocation`], whose message names the handler
    /// and action. The wrapped error is its `source`, and
    /// [`DispatchError::into_action_error`] returns it unmodified.
    pub fn dispatch(&mut self) -> Result<Value, DispatchError> {
        let Some(locator) = self.locator() else {
            self.state = DispatchState::Failed;
            warn!(target: DISPATCH_TARGET, "dispatch attempted without a service locator");
            return Err(DispatchError::MissingLocator);
        };

        self.returned_value = Value::Null;
        self.last_interruption = None;
        self.active_handler = None;
        let mut forwards: u32 = 0;

        loop {
            debug!(
                target: DISPATCH_TARGET,
                iteration = forwards,
                handler = self.request.handler_name(),
                action = self.request.action_name(),
                "dispatch iteration"
            );
            match self.step(locator.as_ref()) {
                Ok(Step::Finished) => {
                    self.state = DispatchState::Finished;
                    return Ok(self.returned_value.clone());
                }
                Ok(Step::Forwarded) => {}
                Err(error) => {
                    if !self.redirect_to_error_handler(&error) {
                        self.state = DispatchState::Failed;
                        warn!(target: DISPATCH_TARGET, error = %error, "dispatch failed");
                        return Err(error);
                    }
                }
            }

            forwards = forwards.saturating_add(1);
            if forwards > self.max_forwards {
                self.state = DispatchState::Failed;
                warn!(
                    target: DISPATCH_TARGET,
                    limit = self.max_forwards,
                    "forward bound exceeded"
                );
                return Err(DispatchError::MaxForwardsExceeded {
                    limit: self.max_forwards,
                });
            }
        }
    }

    fn step(&mut self, locator: &dyn ServiceLocator) -> Result<Step, DispatchError> {
        self.apply_defaults();

        self.state = DispatchState::Resolving;
        let resolved = HandlerResolver::new(locator, &self.naming)
            .resolve(self.request.namespace(), self.request.handler_name())?;
        let handler = self.active_handler.insert(resolved.into_handler());

        self.state = DispatchState::Binding;
        let method = self.naming.action_method(self.request.action_name());
        let bound = self.binder.bind(
            handler.as_ref(),
            &BindRequest {
                handler_name: self.request.handler_name(),
                action_name: self.request.action_name(),
                method: &method,
                params: self.request.params(),
            },
        )?;

        self.state = DispatchState::Invoking;
        let mut context = ActionContext::new(
            &mut self.request,
            &mut self.returned_value,
            locator,
            self.last_interruption.as_ref(),
        );
        let outcome = ActionInvoker.invoke(handler.as_mut(), bound, &mut context)?;

        match outcome {
            ActionOutcome::Return(value) => {
                self.returned_value = value;
                Ok(Step::Finished)
            }
            ActionOutcome::Continue => {
                info!(
                    target: DISPATCH_TARGET,
                    handler = self.request.handler_name(),
                    action = self.request.action_name(),
                    "action signalled continue"
                );
                self.last_interruption = Some(Interruption::Continue);
                Ok(Step::Finished)
            }
            ActionOutcome::Forward(target) => {
                self.apply_forward(target);
                self.state = DispatchState::Forwarded;
                Ok(Step::Forwarded)
            }
        }
    }

    fn apply_defaults(&mut self) {
        if self.request.namespace().is_none()
            && let Some(namespace) = &self.default_namespace
        {
            self.request.set_namespace(namespace.clone());
        }
        if self.request.handler_name().is_empty() {
            self.request.set_handler_name(self.default_handler.clone());
        }
        if self.request.action_name().is_empty() {
            self.request.set_action_name(self.default_action.clone());
        }
    }

    fn apply_forward(&mut self, target: Forward) {
        if let Some(module) = target.module()
            && self.module_name.as_deref() != Some(module)
        {
            debug!(
                target: DISPATCH_TARGET,
                module,
                current = self.module_name.as_deref(),
                "forward names another module; staying in the current one"
            );
        }
        self.history = DispatchHistory::capture(&self.request);
        target.apply_to(&mut self.request);
        self.forwarded = true;
        debug!(
            target: DISPATCH_TARGET,
            from_handler = self.history.handler_name(),
            from_action = self.history.action_name(),
            to_handler = self.request.handler_name(),
            to_action = self.request.action_name(),
            "forwarding"
        );
    }

    fn redirect_to_error_handler(&mut self, error: &DispatchError) -> bool {
        let Some(kind) = error.kind() else {
            return false;
        };
        let Some(target) = self.error_handlers.target_for(kind).cloned() else {
            return false;
        };
        if target.lands_on(&self.request, &self.naming) {
            debug!(
                target: DISPATCH_TARGET,
                kind = %kind,
                "failure raised by the error handler itself"
            );
            return false;
        }

        warn!(
            target: DISPATCH_TARGET,
            kind = %kind,
            error = %error,
            "redirecting to error handler"
        );
        self.last_interruption = Some(Interruption::Failure {
            kind,
            message: error.to_string(),
        });
        self.apply_forward(target);
        true
    }
}

#[cfg(test)]
mod tests;
