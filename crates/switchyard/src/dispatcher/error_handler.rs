//! Error-handler routing table.

use std::collections::HashMap;

use crate::error::ErrorKind;

use super::forward::Forward;

/// Forward targets keyed by the failure kind they recover from.
#[derive(Debug, Clone, Default)]
pub(crate) struct ErrorHandlers {
    bindings: HashMap<ErrorKind, Forward>,
}

impl ErrorHandlers {
    /// Routes every kind in `kinds` to `target`, replacing earlier bindings.
    pub(crate) fn bind<I>(&mut self, target: &Forward, kinds: I)
    where
        I: IntoIterator<Item = ErrorKind>,
    {
        for kind in kinds {
            self.bindings.insert(kind, target.clone());
        }
    }

    /// Target bound to `kind`.
    pub(crate) fn target_for(&self, kind: ErrorKind) -> Option<&Forward> {
        self.bindings.get(&kind)
    }

    /// Removes every binding.
    pub(crate) fn clear(&mut self) {
        self.bindings.clear();
    }
}
