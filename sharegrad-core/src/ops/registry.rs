//! Name-based lookup of the built-in operations.
//!
//! The table is built once, on first access, and never mutated afterwards, so any number of
//! threads can read it concurrently.

use crate::error::{Result, ShareGradError};
use crate::ops::OpKind;
use once_cell::sync::Lazy;
use std::collections::HashMap;

static REGISTRY: Lazy<HashMap<&'static str, OpKind>> = Lazy::new(|| {
    let table: HashMap<_, _> = OpKind::ALL.iter().map(|&kind| (kind.name(), kind)).collect();
    log::debug!("Operation registry initialized with {} operations", table.len());
    table
});

/// Returns the operation registered under `name`, if any.
pub fn lookup(name: &str) -> Option<OpKind> {
    REGISTRY.get(name).copied()
}

/// Like [`lookup`], but fails with `UnknownOperation` on a miss.
pub fn get(name: &str) -> Result<OpKind> {
    lookup(name).ok_or_else(|| ShareGradError::UnknownOperation(name.to_string()))
}

/// All registered names, sorted.
pub fn names() -> Vec<&'static str> {
    let mut names: Vec<_> = REGISTRY.keys().copied().collect();
    names.sort_unstable();
    names
}
