//! Sanitising request parameters through the locator.
//!
//! Filtered parameter lookups fetch the shared service registered under
//! [`FILTER_SERVICE`] and pass the raw value through it. The service is
//! stored as an `Arc<dyn Filter>`; [`crate::Container::register_filter`]
//! registers one under the expected name.

use std::sync::Arc;

use serde_json::Value;

use crate::error::{ActionError, DispatchError};
use crate::locator::ServiceLocator;
use crate::params::{ParamKey, Params};

/// Locator name of the parameter filter.
pub const FILTER_SERVICE: &str = "filter";

/// Sanitises parameter values by named filters such as `int` or `trim`.
pub trait Filter: Send + Sync {
    /// Applies `filters` to `value`, in order.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown filters or values a filter cannot handle.
    fn sanitize(&self, value: &Value, filters: &[&str]) -> Result<Value, ActionError>;
}

/// Looks up `key` in `params` and sanitises it with the locator's filter.
///
/// An empty filter list returns the raw value without consulting the locator.
pub(crate) fn filtered_param(
    locator: Option<&dyn ServiceLocator>,
    params: &Params,
    key: &ParamKey,
    filters: &[&str],
) -> Result<Option<Value>, DispatchError> {
    let Some(value) = params.get(key) else {
        return Ok(None);
    };
    if filters.is_empty() {
        return Ok(Some(value.clone()));
    }

    let filter = resolve_filter(locator)?;
    filter
        .sanitize(value, filters)
        .map(Some)
        .map_err(|source| DispatchError::FilterFailed {
            parameter: key.to_string(),
            source,
        })
}

fn resolve_filter(
    locator: Option<&dyn ServiceLocator>,
) -> Result<Arc<dyn Filter>, DispatchError> {
    let locator = locator.ok_or(DispatchError::FilterUnavailable { source: None })?;
    let service = locator
        .get(FILTER_SERVICE)
        .map_err(|error| DispatchError::FilterUnavailable {
            source: Some(Arc::new(error)),
        })?;
    service
        .downcast_shared::<Arc<dyn Filter>>()
        .map(|filter| Arc::clone(&*filter))
        .ok_or(DispatchError::FilterUnavailable { source: None })
}
