//! View of the in-flight dispatch handed to a running action.

use std::any::Any;
use std::sync::Arc;

use serde_json::Value;

use crate::dispatcher::{DispatchRequest, Interruption};
use crate::error::DispatchError;
use crate::filter::filtered_param;
use crate::locator::{LocatorError, Service, ServiceLocator};
use crate::params::{ParamKey, Params};

/// Mutable access to the current request and result while an action runs.
///
/// Renaming the action only changes what the dispatcher reports afterwards;
/// it does not dispatch again.
pub struct ActionContext<'a> {
    request: &'a mut DispatchRequest,
    returned_value: &'a mut Value,
    locator: &'a dyn ServiceLocator,
    last_interruption: Option<&'a Interruption>,
}

impl<'a> ActionContext<'a> {
    pub(crate) const fn new(
        request: &'a mut DispatchRequest,
        returned_value: &'a mut Value,
        locator: &'a dyn ServiceLocator,
        last_interruption: Option<&'a Interruption>,
    ) -> Self {
        Self {
            request,
            returned_value,
            locator,
            last_interruption,
        }
    }

    /// Handler name being dispatched.
    #[must_use]
    pub fn handler_name(&self) -> &str {
        self.request.handler_name()
    }

    /// Action name being dispatched.
    #[must_use]
    pub fn action_name(&self) -> &str {
        self.request.action_name()
    }

    /// Rewrites the action name reported after the dispatch.
    pub fn set_action_name(&mut self, action: impl Into<String>) {
        self.request.set_action_name(action);
    }

    /// Namespace being dispatched.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.request.namespace()
    }

    /// Request parameters.
    #[must_use]
    pub fn params(&self) -> &Params {
        self.request.params()
    }

    /// Looks up a single request parameter.
    #[must_use]
    pub fn param(&self, key: impl Into<ParamKey>) -> Option<&Value> {
        self.request.params().get(&key.into())
    }

    /// Looks up a single request parameter and sanitises it through the
    /// locator's `filter` service.
    ///
    /// # Errors
    ///
    /// Fails when the locator has no filter or the filter rejects the value.
    pub fn filtered_param(
        &self,
        key: impl Into<ParamKey>,
        filters: &[&str],
    ) -> Result<Option<Value>, DispatchError> {
        filtered_param(Some(self.locator), self.request.params(), &key.into(), filters)
    }

    /// Value the dispatch currently reports.
    #[must_use]
    pub fn returned_value(&self) -> &Value {
        self.returned_value
    }

    /// Sets the value reported when the action finishes with
    /// [`crate::ActionOutcome::Continue`].
    pub fn set_returned_value(&mut self, value: impl Into<Value>) {
        *self.returned_value = value.into();
    }

    /// Returns `true` when the locator knows `name`.
    #[must_use]
    pub fn has_service(&self, name: &str) -> bool {
        self.locator.has(name)
    }

    /// Fetches a service from the locator.
    ///
    /// # Errors
    ///
    /// Propagates the locator's failure.
    pub fn service(&self, name: &str) -> Result<Service, LocatorError> {
        self.locator.get(name)
    }

    /// Fetches a shared service and downcasts it to `T`.
    #[must_use]
    pub fn shared<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.locator.get(name).ok()?.downcast_shared()
    }

    /// Interruption recorded earlier in this dispatch, such as the failure
    /// that redirected to an error handler.
    #[must_use]
    pub const fn last_interruption(&self) -> Option<&Interruption> {
        self.last_interruption
    }
}
