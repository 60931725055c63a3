//! Fixture handlers shared by the unit and behavioural tests.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::{Value, json};

use crate::{
    ActionContext, ActionError, ActionOutcome, ActionResult, ActionSignature, Arguments,
    Container, Dispatcher, Filter, FormalParam, Forward, Handler, Logic, LogicSeed,
};

static DEFAULT_CONTAINER_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// Serialises tests that install or reset the process-wide container.
pub(crate) fn lock_default_container() -> MutexGuard<'static, ()> {
    DEFAULT_CONTAINER_LOCK
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

fn number(value: &Value) -> Result<i64, ActionError> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .ok_or_else(|| ActionError::from(format!("{number} is not an integer"))),
        Value::String(text) => Ok(text.trim().parse::<i64>()?),
        other => Err(format!("{other} is not numeric").into()),
    }
}

fn unknown(method: &str) -> ActionResult {
    Err(format!("unexpected method {method}").into())
}

// -------------------------------------------------------------------------
// Handlers
// -------------------------------------------------------------------------

/// Handler without any action.
#[derive(Default)]
pub(crate) struct Test1Handler;

impl Handler for Test1Handler {
    fn actions(&self) -> &[ActionSignature] {
        &[]
    }

    fn invoke(&mut self, method: &str, _: Arguments, _: &mut ActionContext<'_>) -> ActionResult {
        unknown(method)
    }
}

static TEST2_ACTIONS: Lazy<Vec<ActionSignature>> = Lazy::new(|| {
    vec![
        ActionSignature::new("indexAction"),
        ActionSignature::new("otherAction"),
        ActionSignature::new("anotherAction"),
        ActionSignature::new("anotherTwoAction")
            .param(FormalParam::required("a"))
            .param(FormalParam::required("b")),
        ActionSignature::new("anotherthreeAction"),
        ActionSignature::new("anotherfourAction"),
        ActionSignature::new("anotherFiveAction")
            .param(FormalParam::required("param1"))
            .param(FormalParam::required("param2")),
        ActionSignature::new("sumAction").variadic(),
        ActionSignature::new("greetAction").param(FormalParam::optional("name", "world")),
        ActionSignature::new("slugAction"),
    ]
});

/// Handler exercising return values, binding and in-place action rewrites.
#[derive(Default)]
pub(crate) struct Test2Handler;

impl Handler for Test2Handler {
    fn actions(&self) -> &[ActionSignature] {
        &TEST2_ACTIONS
    }

    fn invoke(
        &mut self,
        method: &str,
        arguments: Arguments,
        context: &mut ActionContext<'_>,
    ) -> ActionResult {
        match method {
            "indexAction" | "otherAction" => Ok(ActionOutcome::done()),
            "anotherAction" => Ok(ActionOutcome::value(100)),
            "anotherTwoAction" | "anotherFiveAction" | "sumAction" => {
                let total = arguments
                    .iter()
                    .map(number)
                    .sum::<Result<i64, ActionError>>()?;
                Ok(ActionOutcome::value(total))
            }
            "anotherthreeAction" => {
                context.set_action_name("anotherfour");
                Ok(ActionOutcome::value(120))
            }
            "anotherfourAction" => Ok(ActionOutcome::value(120)),
            "greetAction" => {
                let name: String = arguments.decode(0)?;
                Ok(ActionOutcome::value(format!("hello {name}")))
            }
            "slugAction" => {
                let slug = context
                    .filtered_param("title", &["trim", "lower"])?
                    .ok_or("title is required")?;
                Ok(ActionOutcome::Return(slug))
            }
            _ => unknown(method),
        }
    }
}

static TEST3_ACTIONS: Lazy<Vec<ActionSignature>> =
    Lazy::new(|| vec![ActionSignature::new("otherAction")]);

/// Target of prepared forwards.
#[derive(Default)]
pub(crate) struct Test3Handler;

impl Handler for Test3Handler {
    fn actions(&self) -> &[ActionSignature] {
        &TEST3_ACTIONS
    }

    fn invoke(&mut self, method: &str, _: Arguments, _: &mut ActionContext<'_>) -> ActionResult {
        match method {
            "otherAction" => Ok(ActionOutcome::value("test3 other")),
            _ => unknown(method),
        }
    }
}

static TEST7_ACTIONS: Lazy<Vec<ActionSignature>> =
    Lazy::new(|| vec![ActionSignature::new("serviceAction")]);

/// Handler reading a shared service from the locator.
#[derive(Default)]
pub(crate) struct Test7Handler;

impl Handler for Test7Handler {
    fn actions(&self) -> &[ActionSignature] {
        &TEST7_ACTIONS
    }

    fn invoke(
        &mut self,
        method: &str,
        _: Arguments,
        context: &mut ActionContext<'_>,
    ) -> ActionResult {
        match method {
            "serviceAction" => {
                let greeting = context
                    .shared::<String>("greeting")
                    .ok_or("greeting service missing")?;
                Ok(ActionOutcome::value(greeting.as_str()))
            }
            _ => unknown(method),
        }
    }
}

static INDEX_ONLY: Lazy<Vec<ActionSignature>> =
    Lazy::new(|| vec![ActionSignature::new("indexAction")]);

/// Handler that sets a value and signals continue.
#[derive(Default)]
pub(crate) struct ContinueHandler;

impl Handler for ContinueHandler {
    fn actions(&self) -> &[ActionSignature] {
        &INDEX_ONLY
    }

    fn invoke(
        &mut self,
        _: &str,
        _: Arguments,
        context: &mut ActionContext<'_>,
    ) -> ActionResult {
        context.set_returned_value("ok");
        Ok(ActionOutcome::Continue)
    }
}

/// Handler reporting how often its initialise hook ran.
#[derive(Default)]
pub(crate) struct CountingHandler {
    pub(crate) initialized: u32,
}

impl Handler for CountingHandler {
    fn actions(&self) -> &[ActionSignature] {
        &INDEX_ONLY
    }

    fn initialize(&mut self) {
        self.initialized = self.initialized.saturating_add(1);
    }

    fn invoke(&mut self, _: &str, _: Arguments, _: &mut ActionContext<'_>) -> ActionResult {
        Ok(ActionOutcome::value(self.initialized))
    }
}

/// Error handler echoing the failure that redirected to it.
#[derive(Default)]
pub(crate) struct ErrorHandler;

impl Handler for ErrorHandler {
    fn actions(&self) -> &[ActionSignature] {
        &INDEX_ONLY
    }

    fn invoke(
        &mut self,
        _: &str,
        _: Arguments,
        context: &mut ActionContext<'_>,
    ) -> ActionResult {
        let message = match context.last_interruption() {
            Some(crate::Interruption::Failure { message, .. }) => message.clone(),
            _ => String::from("no failure"),
        };
        Ok(ActionOutcome::value(format!("recovered: {message}")))
    }
}

/// Error handler that forwards back to a handler that does not exist.
#[derive(Default)]
pub(crate) struct FallbackHandler;

impl Handler for FallbackHandler {
    fn actions(&self) -> &[ActionSignature] {
        &INDEX_ONLY
    }

    fn invoke(&mut self, _: &str, _: Arguments, _: &mut ActionContext<'_>) -> ActionResult {
        Ok(ActionOutcome::Forward(Forward::to("missing", "index")))
    }
}

/// Handler that hands its request over to `test3::other`.
#[derive(Default)]
pub(crate) struct FwdHandler;

impl Handler for FwdHandler {
    fn actions(&self) -> &[ActionSignature] {
        &INDEX_ONLY
    }

    fn invoke(&mut self, _: &str, _: Arguments, _: &mut ActionContext<'_>) -> ActionResult {
        Ok(ActionOutcome::Forward(Forward::to("test3", "other")))
    }
}

/// Handler that forwards to itself forever.
#[derive(Default)]
pub(crate) struct LoopHandler;

impl Handler for LoopHandler {
    fn actions(&self) -> &[ActionSignature] {
        &INDEX_ONLY
    }

    fn invoke(&mut self, _: &str, _: Arguments, _: &mut ActionContext<'_>) -> ActionResult {
        Ok(ActionOutcome::Forward(Forward::new()))
    }
}

/// Handler whose only action fails.
#[derive(Default)]
pub(crate) struct FailingHandler;

impl Handler for FailingHandler {
    fn actions(&self) -> &[ActionSignature] {
        &INDEX_ONLY
    }

    fn invoke(&mut self, _: &str, _: Arguments, _: &mut ActionContext<'_>) -> ActionResult {
        Err("boom".into())
    }
}

/// Domain object built in logic-binding mode.
#[derive(Debug, Serialize)]
pub(crate) struct MyLogic {
    num: i64,
    param1: Value,
    param2: Value,
    action_name: String,
    action_params: Value,
}

impl Logic for MyLogic {
    fn from_action(seed: &LogicSeed<'_>) -> Result<Self, ActionError> {
        let param1 = seed
            .params
            .get_named("param1")
            .cloned()
            .ok_or("param1 is required")?;
        Ok(Self {
            num: number(&param1)?,
            param1,
            param2: seed.params.get_named("param2").cloned().unwrap_or(Value::Null),
            action_name: seed.action_name.to_owned(),
            action_params: seed.params.to_value(),
        })
    }
}

static LOGIC_ACTIONS: Lazy<Vec<ActionSignature>> = Lazy::new(|| {
    vec![ActionSignature::new("indexAction").param(FormalParam::logic::<MyLogic>("logic"))]
});

/// Handler whose action receives a [`MyLogic`] object.
#[derive(Default)]
pub(crate) struct LogicHandler;

impl Handler for LogicHandler {
    fn actions(&self) -> &[ActionSignature] {
        &LOGIC_ACTIONS
    }

    fn invoke(
        &mut self,
        _: &str,
        arguments: Arguments,
        _: &mut ActionContext<'_>,
    ) -> ActionResult {
        Ok(ActionOutcome::Return(
            arguments.get(0).cloned().unwrap_or_else(|| json!(null)),
        ))
    }
}

// -------------------------------------------------------------------------
// Services
// -------------------------------------------------------------------------

/// Filter supporting `trim`, `lower` and `int`.
pub(crate) struct TrimFilter;

impl Filter for TrimFilter {
    fn sanitize(&self, value: &Value, filters: &[&str]) -> Result<Value, ActionError> {
        filters
            .iter()
            .try_fold(value.clone(), |current, filter| match *filter {
                "trim" => Ok(current
                    .as_str()
                    .map_or_else(|| current.clone(), |text| Value::from(text.trim()))),
                "lower" => Ok(current
                    .as_str()
                    .map_or_else(|| current.clone(), |text| Value::from(text.to_lowercase()))),
                "int" => number(&current).map(Value::from),
                other => Err(format!("unknown filter '{other}'").into()),
            })
    }
}

// -------------------------------------------------------------------------
// Wiring
// -------------------------------------------------------------------------

/// Container with every fixture handler, a `greeting` shared service and
/// the [`TrimFilter`].
pub(crate) fn container() -> Container {
    let mut container = Container::new();
    container
        .register_handler("Test1Handler", Test1Handler::default)
        .register_handler("Test2Handler", Test2Handler::default)
        .register_handler("Test3Handler", Test3Handler::default)
        .register_handler("Test7Handler", Test7Handler::default)
        .register_handler("ContinueHandler", ContinueHandler::default)
        .register_handler("CountingHandler", CountingHandler::default)
        .register_handler("FallbackHandler", FallbackHandler::default)
        .register_handler("FwdHandler", FwdHandler::default)
        .register_handler("LoopHandler", LoopHandler::default)
        .register_handler("FailingHandler", FailingHandler::default)
        .register_handler("LogicHandler", LogicHandler::default)
        .register_shared("greeting", String::from("hello"))
        .register_filter(TrimFilter);
    container
}

/// Dispatcher wired to [`container`].
pub(crate) fn dispatcher() -> Dispatcher {
    Dispatcher::new().with_locator(Arc::new(container()))
}

/// Dispatcher wired to [`container`] plus a working `ErrorHandler`.
pub(crate) fn dispatcher_with_error_handler() -> Dispatcher {
    let mut services = container();
    services.register_handler("ErrorHandler", ErrorHandler::default);
    Dispatcher::new().with_locator(Arc::new(services))
}
