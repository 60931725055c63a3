//! Naming conventions that turn request coordinates into service names.
//!
//! A handler name such as `test_two` becomes the handler class
//! `TestTwoHandler`; with a namespace of `app::admin` it becomes
//! `App::Admin::TestTwoHandler`. Action names gain the action suffix
//! verbatim, so `anotherTwo` maps to the method `anotherTwoAction`.

use switchyard_config::Config;

/// Separator between namespace segments and handler class names.
pub const NAMESPACE_SEPARATOR: &str = "::";

/// Converts `snake_case` or `kebab-case` text into `PascalCase`.
///
/// The first character and every character following `_` or `-` are
/// uppercased; the separators are dropped and all other characters are
/// lowercased.
#[must_use]
pub fn camelize(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut upper_next = true;
    for ch in input.chars() {
        match ch {
            '_' | '-' => upper_next = true,
            _ if upper_next => {
                output.extend(ch.to_uppercase());
                upper_next = false;
            }
            _ => output.extend(ch.to_lowercase()),
        }
    }
    output
}

/// Converts `PascalCase` or `camelCase` text into `snake_case`.
#[must_use]
pub fn uncamelize(input: &str) -> String {
    let mut output = String::with_capacity(input.len().saturating_add(4));
    for (position, ch) in input.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if position > 0 {
                output.push('_');
            }
            output.push(ch.to_ascii_lowercase());
        } else {
            output.push(ch);
        }
    }
    output
}

fn camelize_namespace(namespace: &str) -> String {
    namespace
        .split(NAMESPACE_SEPARATOR)
        .map(camelize)
        .collect::<Vec<_>>()
        .join(NAMESPACE_SEPARATOR)
}

/// Rules for deriving handler classes and action methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingConvention {
    handler_suffix: String,
    action_suffix: String,
    camelize_handler: bool,
    camelize_namespace: bool,
}

impl Default for NamingConvention {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl NamingConvention {
    /// Builds the convention from loaded configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            handler_suffix: config.handler_suffix.clone(),
            action_suffix: config.action_suffix.clone(),
            camelize_handler: !config.preserve_handler_case,
            camelize_namespace: !config.preserve_namespace_case,
        }
    }

    /// Suffix appended to handler class names.
    #[must_use]
    pub fn handler_suffix(&self) -> &str {
        &self.handler_suffix
    }

    /// Suffix appended to action method names.
    #[must_use]
    pub fn action_suffix(&self) -> &str {
        &self.action_suffix
    }

    /// Replaces the handler suffix.
    pub fn set_handler_suffix(&mut self, suffix: impl Into<String>) {
        self.handler_suffix = suffix.into();
    }

    /// Replaces the action suffix.
    pub fn set_action_suffix(&mut self, suffix: impl Into<String>) {
        self.action_suffix = suffix.into();
    }

    /// Toggles camelization of handler names.
    pub const fn set_camelize_handler(&mut self, enabled: bool) {
        self.camelize_handler = enabled;
    }

    /// Toggles camelization of namespaces.
    pub const fn set_camelize_namespace(&mut self, enabled: bool) {
        self.camelize_namespace = enabled;
    }

    /// Builds the handler class for the given coordinates.
    ///
    /// Handler names that already contain the namespace separator are taken
    /// verbatim; a leading separator is stripped.
    #[must_use]
    pub fn handler_class(&self, namespace: Option<&str>, handler: &str) -> String {
        let mut class = namespace
            .filter(|prefix| !prefix.is_empty())
            .map_or_else(String::new, |prefix| self.namespace_prefix(prefix));
        let class_name = handler
            .strip_prefix(NAMESPACE_SEPARATOR)
            .map_or_else(|| self.local_class_name(handler), str::to_owned);
        class.push_str(&class_name);
        class.push_str(&self.handler_suffix);
        class
    }

    fn namespace_prefix(&self, namespace: &str) -> String {
        let mut prefix = if self.camelize_namespace {
            camelize_namespace(namespace)
        } else {
            namespace.to_owned()
        };
        if !prefix.ends_with(NAMESPACE_SEPARATOR) {
            prefix.push_str(NAMESPACE_SEPARATOR);
        }
        prefix
    }

    fn local_class_name(&self, handler: &str) -> String {
        if handler.contains(NAMESPACE_SEPARATOR) || !self.camelize_handler {
            handler.to_owned()
        } else {
            camelize(handler)
        }
    }

    /// Builds the action method name for `action`.
    #[must_use]
    pub fn action_method(&self, action: &str) -> String {
        format!("{action}{}", self.action_suffix)
    }
}
