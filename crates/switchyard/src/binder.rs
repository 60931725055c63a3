//! Matching request parameters to an action's formal parameters.
//!
//! Named parameter sets are matched by formal parameter name first, then by
//! the formal parameter's position, then by its declared default. Positional
//! sets are matched by position; surplus values are dropped unless the action
//! is variadic. In logic-binding mode, parameters declared with
//! [`crate::FormalParam::logic`] are built from the request instead.

use serde_json::Value;
use tracing::debug;

use crate::dispatcher::DISPATCH_TARGET;
use crate::error::DispatchError;
use crate::handler::{ActionSignature, Arguments, FormalParam, Handler, LogicSeed, ParamKind};
use crate::params::{ParamKey, Params};

/// Coordinates and parameters for one binding attempt.
#[derive(Debug, Clone, Copy)]
pub struct BindRequest<'a> {
    /// Handler name as requested.
    pub handler_name: &'a str,
    /// Action name as requested.
    pub action_name: &'a str,
    /// Action method derived from the action name.
    pub method: &'a str,
    /// Request parameters.
    pub params: &'a Params,
}

/// Arguments ready to pass to an action method.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundAction {
    /// Method name as the handler declares it.
    pub method: String,
    /// Bound values in formal parameter order.
    pub arguments: Arguments,
}

/// Builds argument lists for action methods.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParameterBinder {
    logic_binding: bool,
}

impl ParameterBinder {
    /// Creates a binder; `logic_binding` enables logic parameters.
    #[must_use]
    pub const fn new(logic_binding: bool) -> Self {
        Self { logic_binding }
    }

    /// Whether logic parameters are constructed.
    #[must_use]
    pub const fn logic_binding(&self) -> bool {
        self.logic_binding
    }

    /// Binds `request` against the matching action on `handler`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::ActionNotFound`] when the handler lacks the
    /// method, [`DispatchError::ParameterMismatch`] when a required parameter
    /// has no value, and [`DispatchError::ActionInvocation`] when a logic
    /// constructor fails.
    pub fn bind(
        &self,
        handler: &dyn Handler,
        request: &BindRequest<'_>,
    ) -> Result<BoundAction, DispatchError> {
        let signature = handler.action(request.method).ok_or_else(|| {
            DispatchError::action_not_found(request.handler_name, request.action_name)
        })?;

        let values = if request.params.is_named() {
            self.bind_named(signature, request)?
        } else {
            self.bind_positional(signature, request)?
        };
        debug!(
            target: DISPATCH_TARGET,
            method = signature.method(),
            arguments = values.len(),
            "action parameters bound"
        );

        Ok(BoundAction {
            method: signature.method().to_owned(),
            arguments: Arguments::new(values),
        })
    }

    fn bind_named(
        &self,
        signature: &ActionSignature,
        request: &BindRequest<'_>,
    ) -> Result<Vec<Value>, DispatchError> {
        let mut values = Vec::with_capacity(signature.params().len());
        for (position, formal) in signature.params().iter().enumerate() {
            if let Some(logic) = self.logic_value(formal, request)? {
                values.push(logic);
                continue;
            }
            let supplied = request
                .params
                .get_named(formal.name())
                .or_else(|| request.params.get(&ParamKey::Index(position)));
            values.push(Self::supplied_or_default(formal, supplied, request)?);
        }
        Ok(values)
    }

    fn bind_positional(
        &self,
        signature: &ActionSignature,
        request: &BindRequest<'_>,
    ) -> Result<Vec<Value>, DispatchError> {
        let supplied: Vec<&Value> = request.params.values().collect();
        let declared = signature.params().len();
        let mut values = Vec::with_capacity(declared.max(supplied.len()));
        for (position, formal) in signature.params().iter().enumerate() {
            if let Some(logic) = self.logic_value(formal, request)? {
                values.push(logic);
                continue;
            }
            let value = supplied.get(position).copied();
            values.push(Self::supplied_or_default(formal, value, request)?);
        }
        if signature.is_variadic() {
            values.extend(supplied.iter().skip(declared).map(|value| (*value).clone()));
        }
        Ok(values)
    }

    fn logic_value(
        &self,
        formal: &FormalParam,
        request: &BindRequest<'_>,
    ) -> Result<Option<Value>, DispatchError> {
        let ParamKind::Logic(construct) = formal.kind() else {
            return Ok(None);
        };
        if !self.logic_binding {
            return Ok(None);
        }
        let seed = LogicSeed {
            action_name: request.action_name,
            params: request.params,
        };
        construct(&seed).map(Some).map_err(|source| {
            DispatchError::action_failed(request.handler_name, request.action_name, source)
        })
    }

    fn supplied_or_default(
        formal: &FormalParam,
        supplied: Option<&Value>,
        request: &BindRequest<'_>,
    ) -> Result<Value, DispatchError> {
        supplied
            .or_else(|| formal.default_value())
            .cloned()
            .ok_or_else(|| {
                DispatchError::parameter_mismatch(
                    request.handler_name,
                    request.action_name,
                    formal.name(),
                )
            })
    }
}
