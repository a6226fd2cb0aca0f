//! Activation functions.
pub mod sigmoid;
