//! Default values shared by the configuration layer and the dispatcher.

use crate::logging::LogFormat;

/// Default log filter expression.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Handler name used when a request does not name one.
pub const DEFAULT_HANDLER: &str = "index";

/// Action name used when a request does not name one.
pub const DEFAULT_ACTION: &str = "index";

/// Suffix appended to camelized handler names to form the handler class.
pub const DEFAULT_HANDLER_SUFFIX: &str = "Handler";

/// Suffix appended to action names to form the action method.
pub const DEFAULT_ACTION_SUFFIX: &str = "Action";

/// Forwards permitted within a single top-level dispatch.
///
/// The dispatch loop therefore runs at most `DEFAULT_MAX_FORWARDS + 1`
/// iterations before reporting cyclic routing.
pub const DEFAULT_MAX_FORWARDS: u32 = 255;

/// Default log filter expression.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Owned default handler name.
#[must_use]
pub fn default_handler() -> String {
    DEFAULT_HANDLER.to_owned()
}

/// Owned default action name.
#[must_use]
pub fn default_action() -> String {
    DEFAULT_ACTION.to_owned()
}

/// Owned default handler suffix.
#[must_use]
pub fn default_handler_suffix() -> String {
    DEFAULT_HANDLER_SUFFIX.to_owned()
}

/// Owned default action suffix.
#[must_use]
pub fn default_action_suffix() -> String {
    DEFAULT_ACTION_SUFFIX.to_owned()
}

/// Default forward bound.
#[must_use]
pub const fn default_max_forwards() -> u32 {
    DEFAULT_MAX_FORWARDS
}
