//! Action dispatching for request-driven applications.
//!
//! Switchyard turns request coordinates (namespace, handler name, action name
//! and parameters) into a call on a handler obtained from a
//! [`ServiceLocator`]. The [`Dispatcher`] runs a bounded loop: each iteration
//! resolves the handler class through [`HandlerResolver`], matches the
//! parameters to the action's formal parameters with [`ParameterBinder`], and
//! invokes the action through [`ActionInvoker`]. Actions end the loop by
//! returning a value or signalling continue, or move it along by forwarding
//! to new coordinates. Recoverable failures may be redirected to an error
//! handler.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use switchyard::{Container, Dispatcher, Params};
//!
//! let mut container = Container::new();
//! container.register_handler("OrdersHandler", OrdersHandler::default);
//!
//! let mut dispatcher = Dispatcher::new().with_locator(Arc::new(container));
//! dispatcher
//!     .set_handler_name("orders")
//!     .set_action_name("show")
//!     .set_params(Params::named([("id", 7)]));
//! let value = dispatcher.dispatch()?;
//! ```

mod binder;
mod context;
mod dispatcher;
mod error;
mod filter;
mod handler;
mod invoker;
mod locator;
mod naming;
mod params;
mod resolver;
pub mod telemetry;

pub use binder::{BindRequest, BoundAction, ParameterBinder};
pub use context::ActionContext;
pub use dispatcher::{
    DispatchHistory, DispatchRequest, DispatchState, Dispatcher, Forward, Interruption,
};
pub use error::{ActionError, DispatchError, ErrorKind};
pub use filter::{FILTER_SERVICE, Filter};
pub use handler::{
    ActionOutcome, ActionResult, ActionSignature, Arguments, FormalParam, Handler, Logic,
    LogicConstructor, LogicSeed, ParamKind,
};
pub use invoker::ActionInvoker;
pub use locator::{Container, LocatorError, Service, ServiceLocator};
pub use naming::{NAMESPACE_SEPARATOR, NamingConvention, camelize, uncamelize};
pub use params::{ParamKey, Params};
pub use resolver::{HandlerResolver, ResolvedHandler};
pub use serde_json::Value;
pub use switchyard_config::Config;

#[cfg(test)]
mod tests;
