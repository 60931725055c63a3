//! Running a bound action method.

use tracing::{debug, warn};

use crate::binder::BoundAction;
use crate::context::ActionContext;
use crate::dispatcher::DISPATCH_TARGET;
use crate::error::DispatchError;
use crate::handler::{ActionOutcome, Handler};

/// Calls action methods and normalises their failures.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActionInvoker;

impl ActionInvoker {
    /// Runs `bound` on `handler`.
    ///
    /// # Errors
    ///
    /// Wraps the action's own error in [`DispatchError::ActionInvocation`],
    /// naming the handler and action that were requested.
    pub fn invoke(
        self,
        handler: &mut dyn Handler,
        bound: BoundAction,
        context: &mut ActionContext<'_>,
    ) -> Result<ActionOutcome, DispatchError> {
        let handler_name = context.handler_name().to_owned();
        let action_name = context.action_name().to_owned();
        debug!(
            target: DISPATCH_TARGET,
            handler = %handler_name,
            method = %bound.method,
            "invoking action"
        );

        handler
            .invoke(&bound.method, bound.arguments, context)
            .map_err(|source| {
                warn!(
                    target: DISPATCH_TARGET,
                    handler = %handler_name,
                    action = %action_name,
                    error = %source,
                    "action failed"
                );
                DispatchError::action_failed(handler_name, action_name, source)
            })
    }
}
