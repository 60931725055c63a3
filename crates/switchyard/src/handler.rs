//! Handler contract and action metadata.
//!
//! Handlers are the units the dispatcher resolves through the service
//! locator. Each handler publishes an [`ActionSignature`] per action method
//! so the binder can match request parameters against the formal parameter
//! list before the action runs. Action methods are matched
//! case-insensitively.

use std::any::Any;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::context::ActionContext;
use crate::dispatcher::Forward;
use crate::error::ActionError;
use crate::params::Params;

/// Result returned by an action method.
pub type ActionResult = Result<ActionOutcome, ActionError>;

/// What an action asks the dispatcher to do next.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// Finish the dispatch with this value.
    Return(Value),
    /// Leave the current action and dispatch another target.
    Forward(Forward),
    /// Finish the dispatch with the value already set on the context.
    Continue,
}

impl ActionOutcome {
    /// Finishes with the given value.
    #[must_use]
    pub fn value(value: impl Into<Value>) -> Self {
        Self::Return(value.into())
    }

    /// Finishes with `null`.
    #[must_use]
    pub const fn done() -> Self {
        Self::Return(Value::Null)
    }
}

/// Inputs available to a logic constructor.
#[derive(Debug, Clone, Copy)]
pub struct LogicSeed<'a> {
    /// Action name as requested.
    pub action_name: &'a str,
    /// Request parameters.
    pub params: &'a Params,
}

/// Domain object built from the request in logic-binding mode.
pub trait Logic: Serialize + Sized {
    /// Builds the object for the current action.
    ///
    /// # Errors
    ///
    /// Returns an error when the request cannot produce the object; the
    /// dispatcher reports it as an invocation failure.
    fn from_action(seed: &LogicSeed<'_>) -> Result<Self, ActionError>;
}

/// Type-erased constructor for a [`Logic`] parameter.
pub type LogicConstructor = fn(&LogicSeed<'_>) -> Result<Value, ActionError>;

fn construct_logic<L: Logic>(seed: &LogicSeed<'_>) -> Result<Value, ActionError> {
    let logic = L::from_action(seed)?;
    Ok(serde_json::to_value(logic)?)
}

/// How a formal parameter receives its value.
#[derive(Debug, Clone, Copy)]
pub enum ParamKind {
    /// Bound from the request parameters.
    Value,
    /// Built by a logic constructor when logic binding is enabled.
    Logic(LogicConstructor),
}

/// One formal parameter of an action method.
#[derive(Debug, Clone)]
pub struct FormalParam {
    name: String,
    default: Option<Value>,
    kind: ParamKind,
}

impl FormalParam {
    /// Declares a required parameter.
    #[must_use]
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
            kind: ParamKind::Value,
        }
    }

    /// Declares a parameter with a default value.
    #[must_use]
    pub fn optional(name: impl Into<String>, default: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            default: Some(default.into()),
            kind: ParamKind::Value,
        }
    }

    /// Declares a parameter built by `L` in logic-binding mode.
    #[must_use]
    pub fn logic<L: Logic>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
            kind: ParamKind::Logic(construct_logic::<L>),
        }
    }

    /// Parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Default value, if declared.
    #[must_use]
    pub const fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Binding kind.
    #[must_use]
    pub const fn kind(&self) -> ParamKind {
        self.kind
    }
}

/// Metadata describing one action method.
#[derive(Debug, Clone)]
pub struct ActionSignature {
    method: String,
    params: Vec<FormalParam>,
    variadic: bool,
}

impl ActionSignature {
    /// Declares an action method with no parameters.
    #[must_use]
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            params: Vec::new(),
            variadic: false,
        }
    }

    /// Appends a formal parameter.
    #[must_use]
    pub fn param(mut self, param: FormalParam) -> Self {
        self.params.push(param);
        self
    }

    /// Accepts positional values beyond the declared parameters.
    #[must_use]
    pub const fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    /// Method name as declared.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Formal parameters in declaration order.
    #[must_use]
    pub fn params(&self) -> &[FormalParam] {
        &self.params
    }

    /// Whether extra positional values are passed through.
    #[must_use]
    pub const fn is_variadic(&self) -> bool {
        self.variadic
    }

    /// Case-insensitive method match.
    #[must_use]
    pub fn matches(&self, method: &str) -> bool {
        self.method.eq_ignore_ascii_case(method)
    }
}

/// Values bound to an action's formal parameters, in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: Vec<Value>,
}

impl Arguments {
    /// Wraps bound values.
    #[must_use]
    pub const fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Number of bound values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` when nothing was bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Deserializes the value at `index`.
    ///
    /// # Errors
    ///
    /// Returns an error when the value is missing or has the wrong shape.
    pub fn decode<T: DeserializeOwned>(&self, index: usize) -> Result<T, ActionError> {
        let value = self
            .values
            .get(index)
            .ok_or_else(|| format!("argument {index} was not bound"))?;
        Ok(serde_json::from_value(value.clone())?)
    }

    /// Iterates over bound values.
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.values.iter()
    }

    /// Consumes the arguments.
    #[must_use]
    pub fn into_inner(self) -> Vec<Value> {
        self.values
    }
}

/// A unit of application logic exposing named actions.
pub trait Handler: Any + Send {
    /// Action methods this handler exposes.
    fn actions(&self) -> &[ActionSignature];

    /// Finds an action by method name, ignoring ASCII case.
    fn action(&self, method: &str) -> Option<&ActionSignature> {
        self.actions()
            .iter()
            .find(|signature| signature.matches(method))
    }

    /// Returns `true` when the handler exposes `method`.
    fn has_action(&self, method: &str) -> bool {
        self.action(method).is_some()
    }

    /// Runs once after the locator constructs the handler.
    fn initialize(&mut self) {}

    /// Runs the action method `method` with bound arguments.
    ///
    /// # Errors
    ///
    /// Returns the action's own failure.
    fn invoke(
        &mut self,
        method: &str,
        arguments: Arguments,
        context: &mut ActionContext<'_>,
    ) -> ActionResult;
}

impl dyn Handler {
    /// Downcasts to a concrete handler type.
    #[must_use]
    pub fn downcast_ref<T: Handler>(&self) -> Option<&T> {
        let any: &dyn Any = self;
        any.downcast_ref()
    }
}
