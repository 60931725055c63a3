//! Crate-level test fixtures and behavioural scenarios.

pub(crate) mod support;
