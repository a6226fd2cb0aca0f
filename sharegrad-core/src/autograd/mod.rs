//! # Automatic Differentiation (`autograd`)
//!
//! - [`forward`]: records an operation call into the graph.
//! - [`backward`]: propagates gradients from a root back to every grad-requiring ancestor.
//! - [`grad_mode`]: the thread-local switch that decides whether operations are recorded.
//! - [`grad_check`]: finite-difference verification of backward rules.

pub mod backward;
pub mod forward;
pub mod grad_check;
pub mod grad_mode;
pub(crate) mod graph;

pub use backward::BackwardOptions;
pub use grad_mode::{is_grad_enabled, no_grad, GradModeGuard};
