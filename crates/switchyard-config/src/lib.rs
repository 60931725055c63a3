//! Layered configuration for the Switchyard dispatcher.
//!
//! [`Config`] is loaded through `ortho_config`, which merges (in increasing
//! precedence) the built-in defaults, an optional configuration file named by
//! `--config-path` or `SWITCHYARD_CONFIG_PATH`, `SWITCHYARD_*` environment
//! variables and command-line flags. The resulting values seed the
//! dispatcher's naming conventions, forward bound and invocation mode, and
//! drive the telemetry subscriber.

mod defaults;
mod logging;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_ACTION, DEFAULT_ACTION_SUFFIX, DEFAULT_HANDLER, DEFAULT_HANDLER_SUFFIX,
    DEFAULT_LOG_FILTER, DEFAULT_MAX_FORWARDS, default_action, default_action_suffix,
    default_handler, default_handler_suffix, default_log_filter, default_log_filter_string,
    default_log_format, default_max_forwards,
};
pub use logging::{LogFormat, LogFormatParseError};

/// Dispatcher and telemetry settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "SWITCHYARD")]
pub struct Config {
    /// `tracing` filter expression used by the telemetry subscriber.
    #[serde(default = "default_log_filter_string")]
    pub log_filter: String,
    /// Output format used by the telemetry subscriber.
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
    /// Namespace applied to requests that do not carry one.
    #[serde(default)]
    pub default_namespace: String,
    /// Handler name applied to requests that do not carry one.
    #[serde(default = "default_handler")]
    pub default_handler: String,
    /// Action name applied to requests that do not carry one.
    #[serde(default = "default_action")]
    pub default_action: String,
    /// Suffix appended to handler names when building handler classes.
    #[serde(default = "default_handler_suffix")]
    pub handler_suffix: String,
    /// Suffix appended to action names when building action methods.
    #[serde(default = "default_action_suffix")]
    pub action_suffix: String,
    /// Forwards permitted within one top-level dispatch.
    #[serde(default = "default_max_forwards")]
    pub max_forwards: u32,
    /// Enables the logic-binding invocation mode.
    #[serde(default)]
    pub logic_binding: bool,
    /// Keeps handler names verbatim instead of camelizing them.
    #[serde(default)]
    pub preserve_handler_case: bool,
    /// Keeps namespaces verbatim instead of camelizing them.
    #[serde(default)]
    pub preserve_namespace_case: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            default_namespace: String::new(),
            default_handler: default_handler(),
            default_action: default_action(),
            handler_suffix: default_handler_suffix(),
            action_suffix: default_action_suffix(),
            max_forwards: default_max_forwards(),
            logic_binding: false,
            preserve_handler_case: false,
            preserve_namespace_case: false,
        }
    }
}

impl Config {
    /// Log filter expression for the telemetry subscriber.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Output format for the telemetry subscriber.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Default namespace, or `None` when it is empty.
    #[must_use]
    pub fn default_namespace(&self) -> Option<&str> {
        Some(self.default_namespace.as_str()).filter(|namespace| !namespace.is_empty())
    }
}
