//! Unit tests for the dispatch loop.

use std::sync::Arc;

use rstest::{fixture, rstest};
use serde_json::json;

use super::*;
use crate::tests::support::{
    LogicHandler, Test2Handler, container, dispatcher, dispatcher_with_error_handler,
    lock_default_container,
};

#[fixture]
fn wired() -> Dispatcher {
    dispatcher()
}

fn dispatch_to(
    dispatcher: &mut Dispatcher,
    handler: &str,
    action: &str,
) -> Result<Value, DispatchError> {
    dispatcher.set_handler_name(handler).set_action_name(action);
    dispatcher.dispatch()
}

// -------------------------------------------------------------------------
// Resolution
// -------------------------------------------------------------------------

#[rstest]
#[case::index("index", "IndexHandler handler class cannot be loaded")]
#[case::essai("essai", "EssaiHandler handler class cannot be loaded")]
#[case::test0("test0", "Test0Handler handler class cannot be loaded")]
fn unregistered_handlers_are_not_found(
    mut wired: Dispatcher,
    #[case] handler: &str,
    #[case] message: &str,
) {
    let error = dispatch_to(&mut wired, handler, "index").expect_err("not registered");
    assert!(matches!(error, DispatchError::HandlerNotFound { .. }));
    assert_eq!(error.to_string(), message);
    assert_eq!(wired.state(), DispatchState::Failed);
}

#[rstest]
fn handlers_without_the_action_report_action_not_found(mut wired: Dispatcher) {
    let error = dispatch_to(&mut wired, "test1", "index").expect_err("no index action");
    assert_eq!(
        error.to_string(),
        "Action 'index' was not found on handler 'test1'"
    );
}

#[rstest]
fn default_namespace_prefixes_the_handler_class(mut wired: Dispatcher) {
    wired
        .set_default_namespace("A::B::C")
        .set_handler_name("Test")
        .set_action_name("index");
    assert_eq!(wired.handler_class(), "A::B::C::TestHandler");

    let error = wired.dispatch().expect_err("not registered");
    assert_eq!(
        error.to_string(),
        "A::B::C::TestHandler handler class cannot be loaded"
    );
    assert_eq!(wired.namespace(), Some("A::B::C"));
}

#[rstest]
fn empty_coordinates_fall_back_to_defaults(mut wired: Dispatcher) {
    assert_eq!(wired.handler_class(), "IndexHandler");
    assert_eq!(wired.active_method(), "indexAction");

    wired.set_default_handler("test2").set_default_action("another");
    assert_eq!(wired.dispatch().expect("dispatches"), json!(100));
    assert_eq!(wired.handler_name(), "test2");
    assert_eq!(wired.action_name(), "another");
}

#[test]
fn dispatch_without_a_locator_fails() {
    let _guard = lock_default_container();
    Container::reset();

    let mut dispatcher = Dispatcher::new();
    dispatcher.set_handler_name("test2");
    let error = dispatcher.dispatch().expect_err("no locator");
    assert!(matches!(error, DispatchError::MissingLocator));
    assert_eq!(dispatcher.state(), DispatchState::Failed);
}

#[test]
fn the_default_container_is_used_when_no_locator_is_set() {
    let _guard = lock_default_container();
    Container::set_default(Arc::new(container()));

    let mut dispatcher = Dispatcher::new();
    let result = dispatch_to(&mut dispatcher, "test2", "another");
    Container::reset();

    assert_eq!(result.expect("dispatches"), json!(100));
}

// -------------------------------------------------------------------------
// Invocation and binding
// -------------------------------------------------------------------------

#[rstest]
#[case::index("index", json!(null))]
#[case::other("other", json!(null))]
#[case::another("another", json!(100))]
fn actions_return_their_values(
    mut wired: Dispatcher,
    #[case] action: &str,
    #[case] expected: Value,
) {
    let value = dispatch_to(&mut wired, "test2", action).expect("dispatches");
    assert_eq!(value, expected);
    assert_eq!(wired.returned_value(), &expected);
    assert!(wired.is_finished());
}

#[rstest]
fn missing_actions_on_registered_handlers_are_reported(mut wired: Dispatcher) {
    let error = dispatch_to(&mut wired, "test2", "essai").expect_err("no essai action");
    assert!(matches!(error, DispatchError::ActionNotFound { .. }));
}

#[rstest]
fn positional_parameters_bind_in_order(mut wired: Dispatcher) {
    wired.set_params(Params::positional([json!(2), json!("3")]));
    let value = dispatch_to(&mut wired, "test2", "anotherTwo").expect("dispatches");
    assert_eq!(value, json!(5));
}

#[rstest]
fn named_parameters_bind_by_name(mut wired: Dispatcher) {
    wired.set_params(Params::named([("param1", 2), ("param2", 3)]));
    let value = dispatch_to(&mut wired, "test2", "anotherFive").expect("dispatches");
    assert_eq!(value, json!(5));
    assert_eq!(wired.param("param1"), Some(&json!(2)));
    assert_eq!(wired.param_or("missing", json!("fallback")), json!("fallback"));
}

#[rstest]
fn missing_parameters_are_a_mismatch(mut wired: Dispatcher) {
    wired.set_param("param1", 2);
    let error = dispatch_to(&mut wired, "test2", "anotherFive").expect_err("param2 missing");
    assert_eq!(error.kind(), Some(ErrorKind::ParameterMismatch));
}

#[rstest]
#[case::trimmed("name", &["trim"], Some(json!("Ada")))]
#[case::chained("name", &["trim", "lower"], Some(json!("ada")))]
#[case::integer("age", &["int"], Some(json!(36)))]
#[case::unfiltered("name", &[], Some(json!("  Ada  ")))]
#[case::absent("city", &["trim"], None)]
fn parameters_are_sanitised_by_the_filter_service(
    mut wired: Dispatcher,
    #[case] key: &str,
    #[case] filters: &[&str],
    #[case] expected: Option<Value>,
) {
    wired.set_params(Params::named([("name", "  Ada  "), ("age", " 36 ")]));
    let value = wired.filtered_param(key, filters).expect("filters");
    assert_eq!(value, expected);
}

#[rstest]
fn actions_read_filtered_parameters(mut wired: Dispatcher) {
    wired.set_param("title", "  Hello World ");
    let value = dispatch_to(&mut wired, "test2", "slug").expect("dispatches");
    assert_eq!(value, json!("hello world"));
}

#[rstest]
fn rejected_values_report_a_filter_failure(mut wired: Dispatcher) {
    wired.set_param("name", "Ada");
    let error = wired
        .filtered_param("name", &["int"])
        .expect_err("not numeric");
    assert!(matches!(
        error,
        DispatchError::FilterFailed { ref parameter, .. } if parameter == "name"
    ));
}

#[rstest]
fn actions_may_rewrite_the_reported_action(mut wired: Dispatcher) {
    let value = dispatch_to(&mut wired, "test2", "anotherthree").expect("dispatches");
    assert_eq!(value, json!(120));
    assert_eq!(wired.action_name(), "anotherfour");
}

#[rstest]
fn method_lookup_ignores_case(mut wired: Dispatcher) {
    let value = dispatch_to(&mut wired, "test2", "ANOTHER").expect("dispatches");
    assert_eq!(value, json!(100));
}

#[rstest]
fn actions_read_shared_services(mut wired: Dispatcher) {
    let value = dispatch_to(&mut wired, "test7", "service").expect("dispatches");
    assert_eq!(value, json!("hello"));
}

#[rstest]
fn the_active_handler_is_kept_after_dispatch(mut wired: Dispatcher) {
    dispatch_to(&mut wired, "test2", "index").expect("dispatches");
    let handler = wired.active_handler().expect("resolved");
    assert!(handler.downcast_ref::<Test2Handler>().is_some());
}

#[rstest]
fn initialize_runs_once_per_resolution(mut wired: Dispatcher) {
    let value = dispatch_to(&mut wired, "counting", "index").expect("dispatches");
    assert_eq!(value, json!(1));
}

#[rstest]
fn action_failures_are_wrapped(mut wired: Dispatcher) {
    let error = dispatch_to(&mut wired, "failing", "index").expect_err("action fails");
    assert_eq!(
        error.to_string(),
        "action 'index' on handler 'failing' failed: boom"
    );
    let source = error.into_action_error().expect("invocation error");
    assert_eq!(source.to_string(), "boom");
}

#[rstest]
fn logic_binding_builds_the_declared_object(mut wired: Dispatcher) {
    wired
        .set_logic_binding(true)
        .set_params(Params::named([("param1", 2), ("param2", 3)]));
    let value = dispatch_to(&mut wired, "logic", "index").expect("dispatches");

    assert_eq!(
        value,
        json!({
            "num": 2,
            "param1": 2,
            "param2": 3,
            "action_name": "index",
            "action_params": {"param1": 2, "param2": 3},
        })
    );
    let handler = wired.active_handler().expect("resolved");
    assert!(handler.downcast_ref::<LogicHandler>().is_some());
    assert_eq!(wired.params().len(), 2);
    assert_eq!(wired.param("param1"), Some(&json!(2)));
}

// -------------------------------------------------------------------------
// Continue
// -------------------------------------------------------------------------

#[rstest]
fn continue_finishes_with_the_value_set_by_the_action(mut wired: Dispatcher) {
    let value = dispatch_to(&mut wired, "continue", "index").expect("dispatches");
    assert_eq!(value, json!("ok"));
    assert_eq!(wired.returned_value(), &json!("ok"));
    assert_eq!(wired.last_interruption(), Some(&Interruption::Continue));
    assert!(wired.is_finished());
}

#[rstest]
fn each_dispatch_clears_the_previous_result(mut wired: Dispatcher) {
    dispatch_to(&mut wired, "continue", "index").expect("dispatches");
    let value = dispatch_to(&mut wired, "test2", "index").expect("dispatches");
    assert_eq!(value, Value::Null);
    assert!(wired.last_interruption().is_none());
}

// -------------------------------------------------------------------------
// Forwarding
// -------------------------------------------------------------------------

#[rstest]
fn prepared_forwards_update_current_and_previous_coordinates(mut wired: Dispatcher) {
    wired.set_handler_name("test2").set_action_name("index");
    assert!(!wired.was_forwarded());

    wired
        .forward(Forward::to("test3", "other"))
        .expect("idle dispatcher accepts forwards");

    assert_eq!(wired.handler_name(), "test3");
    assert_eq!(wired.action_name(), "other");
    assert_eq!(wired.previous_handler_name(), Some("test2"));
    assert_eq!(wired.previous_action_name(), Some("index"));
    assert!(wired.was_forwarded());

    assert_eq!(wired.dispatch().expect("dispatches"), json!("test3 other"));
}

#[rstest]
fn actions_forwarding_mid_dispatch_move_the_coordinates(mut wired: Dispatcher) {
    let value = dispatch_to(&mut wired, "fwd", "index").expect("dispatches");

    assert_eq!(value, json!("test3 other"));
    assert_eq!(wired.handler_name(), "test3");
    assert_eq!(wired.action_name(), "other");
    assert_eq!(wired.previous_handler_name(), Some("fwd"));
    assert_eq!(wired.previous_action_name(), Some("index"));
    assert!(wired.was_forwarded());
    assert!(wired.is_finished());
}

#[rstest]
fn module_segments_do_not_change_the_module(mut wired: Dispatcher) {
    wired.set_module_name("frontend");
    assert_eq!(wired.module_name(), Some("frontend"));

    wired
        .forward("backend::test3::other".parse().expect("valid target"))
        .expect("idle dispatcher accepts forwards");

    assert_eq!(wired.module_name(), Some("frontend"));
    assert_eq!(wired.handler_name(), "test3");
    assert_eq!(wired.dispatch().expect("dispatches"), json!("test3 other"));
}

#[rstest]
fn setting_coordinates_clears_the_forwarded_flag(mut wired: Dispatcher) {
    wired
        .forward(Forward::to("test3", "other"))
        .expect("idle dispatcher accepts forwards");
    wired.set_action_name("index");
    assert!(!wired.was_forwarded());
}

#[rstest]
fn forwards_after_a_finished_dispatch_need_rearming(mut wired: Dispatcher) {
    dispatch_to(&mut wired, "test2", "index").expect("dispatches");
    let error = wired
        .forward(Forward::to("test3", "other"))
        .expect_err("dispatch already finished");
    assert!(matches!(error, DispatchError::InvalidState));

    wired.set_params(Params::new());
    assert!(wired.forward(Forward::to("test3", "other")).is_ok());
}

#[rstest]
fn self_forwarding_ends_at_the_forward_bound(mut wired: Dispatcher) {
    wired.set_max_forwards(3);
    let error = dispatch_to(&mut wired, "loop", "index").expect_err("cycle");
    assert!(matches!(error, DispatchError::MaxForwardsExceeded { limit: 3 }));
    assert_eq!(
        error.to_string(),
        "Dispatcher has detected a cyclic routing causing stability problems"
    );
    assert_eq!(wired.state(), DispatchState::Failed);
}

#[rstest]
fn the_default_bound_allows_255_forwards(mut wired: Dispatcher) {
    assert_eq!(wired.max_forwards(), 255);
    let error = dispatch_to(&mut wired, "loop", "index").expect_err("cycle");
    assert!(matches!(error, DispatchError::MaxForwardsExceeded { limit: 255 }));
}

// -------------------------------------------------------------------------
// Error handlers
// -------------------------------------------------------------------------

#[rstest]
fn failures_of_the_error_handler_itself_surface(mut wired: Dispatcher) {
    wired
        .set_error_handler("Error::index", [ErrorKind::HandlerNotFound])
        .expect("valid target");
    let error = dispatch_to(&mut wired, "nofound", "index").expect_err("no error handler");
    assert_eq!(
        error.to_string(),
        "ErrorHandler handler class cannot be loaded"
    );
    assert_eq!(wired.previous_handler_name(), Some("nofound"));
}

#[test]
fn error_handlers_receive_the_failure() {
    let mut dispatcher = dispatcher_with_error_handler();
    dispatcher
        .set_error_handler("Error::index", [ErrorKind::ActionNotFound])
        .expect("valid target");

    let value = dispatch_to(&mut dispatcher, "test2", "essai").expect("recovered");
    assert_eq!(
        value,
        json!("recovered: Action 'essai' was not found on handler 'test2'")
    );
    assert_eq!(
        dispatcher.last_interruption(),
        Some(&Interruption::Failure {
            kind: ErrorKind::ActionNotFound,
            message: String::from("Action 'essai' was not found on handler 'test2'"),
        })
    );
    assert_eq!(dispatcher.handler_name(), "error");
}

#[test]
fn invocation_errors_recover_through_a_bound_error_handler() {
    let mut dispatcher = dispatcher_with_error_handler();
    dispatcher
        .set_error_handler("Error::index", [ErrorKind::InvocationError])
        .expect("valid target");

    let value = dispatch_to(&mut dispatcher, "failing", "index").expect("recovered");
    assert_eq!(
        value,
        json!("recovered: action 'index' on handler 'failing' failed: boom")
    );
    assert_eq!(dispatcher.previous_handler_name(), Some("failing"));
}

#[test]
fn parameter_mismatches_recover_through_a_bound_error_handler() {
    let mut dispatcher = dispatcher_with_error_handler();
    dispatcher
        .set_error_handler("Error::index", [ErrorKind::ParameterMismatch])
        .expect("valid target");
    dispatcher.set_param("param1", 2);

    let value = dispatch_to(&mut dispatcher, "test2", "anotherFive").expect("recovered");
    assert_eq!(
        value,
        json!("recovered: Action 'anotherFive' on handler 'test2' requires parameter 'param2'")
    );
    assert!(matches!(
        dispatcher.last_interruption(),
        Some(Interruption::Failure {
            kind: ErrorKind::ParameterMismatch,
            ..
        })
    ));
}

#[rstest]
fn unbound_kinds_are_not_redirected(mut wired: Dispatcher) {
    wired
        .set_error_handler("Error::index", [ErrorKind::HandlerNotFound])
        .expect("valid target");
    let error = dispatch_to(&mut wired, "failing", "index").expect_err("not bound");
    assert_eq!(error.kind(), Some(ErrorKind::InvocationError));
    assert!(wired.error_handler(ErrorKind::InvocationError).is_none());
}

#[rstest]
fn error_handlers_that_keep_failing_end_at_the_forward_bound(mut wired: Dispatcher) {
    wired
        .set_max_forwards(10)
        .set_error_handler("Fallback::index", [ErrorKind::HandlerNotFound])
        .expect("valid target");
    let error = dispatch_to(&mut wired, "missing", "index").expect_err("cycle");
    assert!(matches!(error, DispatchError::MaxForwardsExceeded { limit: 10 }));
}

#[rstest]
fn malformed_error_handler_targets_are_rejected(mut wired: Dispatcher) {
    let error = wired
        .set_error_handler("", [ErrorKind::HandlerNotFound])
        .expect_err("empty target");
    assert!(matches!(error, DispatchError::InvalidForward { .. }));
}

#[test]
fn configuration_seeds_the_conventions() {
    let config = Config {
        default_namespace: String::from("app"),
        handler_suffix: String::from("Controller"),
        max_forwards: 4,
        ..Config::default()
    };
    let dispatcher = Dispatcher::from_config(&config);
    assert_eq!(dispatcher.handler_class(), "App::IndexController");
    assert_eq!(dispatcher.max_forwards(), 4);
}
