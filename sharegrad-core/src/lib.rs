//! Reverse-mode automatic differentiation over tensors whose values are opaque to the engine,
//! such as secret-shared tensors in a multi-party computation.
//!
//! Operations record a dynamic graph as they run; [`Tensor::backward`] walks it in reverse and
//! accumulates gradients into every tensor that requires them.

pub mod autograd;
pub mod error;
pub mod ops;
pub mod tensor;
pub mod tensor_data;
pub mod utils;
pub mod value;

pub use autograd::{is_grad_enabled, no_grad, BackwardOptions, GradModeGuard};
pub use error::{Result, ShareGradError};
pub use ops::{Function, OpContext, OpKind, Operand};
pub use tensor::Tensor;
pub use tensor_data::TensorData;
pub use value::{DenseTensor, TensorValue};

// Re-export traits required by public functions/structs
pub use num_traits;
