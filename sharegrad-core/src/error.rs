use thiserror::Error;

/// Custom error type for the sharegrad autograd engine.
#[derive(Error, Debug, PartialEq, Clone)]
pub enum ShareGradError {
    #[error("Shape mismatch: expected {expected:?}, got {actual:?} during operation {operation}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
        operation: String,
    },

    #[error("Type mismatch in operation {operation}: {message}")]
    TypeMismatch { operation: String, message: String },

    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    #[error("Cycle detected in the computation graph: {unresolved} node(s) never became ready")]
    CycleDetected { unresolved: usize },

    #[error("Backward called on a tensor that does not require grad or has no grad_fn")]
    BackwardOnNonDifferentiable,

    #[error("requires_grad can only be changed on leaf tensors")]
    RequiresGradOnNonLeaf,

    #[error("Operation {operation} returned {actual} gradient(s), expected {expected}")]
    GradientCountMismatch {
        operation: String,
        expected: usize,
        actual: usize,
    },

    #[error("Tensor creation error: data length {data_len} does not match shape {shape:?}")]
    TensorCreation { data_len: usize, shape: Vec<usize> },

    /// Failure reported by the tensor-arithmetic backend.
    #[error("Arithmetic backend error: {0}")]
    Arithmetic(String),

    #[error("Operation {operation} failed (parent index {parent_index:?}): {source}")]
    NodeFailure {
        operation: String,
        parent_index: Option<usize>,
        source: Box<ShareGradError>,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ShareGradError {
    /// Attaches node context to a backend failure. Engine errors pass through untouched.
    pub(crate) fn in_node(self, operation: &str, parent_index: Option<usize>) -> Self {
        match self {
            ShareGradError::Arithmetic(_) => ShareGradError::NodeFailure {
                operation: operation.to_string(),
                parent_index,
                source: Box::new(self),
            },
            other => other,
        }
    }

    /// Follows `NodeFailure` wrappers down to the original error.
    pub fn root_cause(&self) -> &ShareGradError {
        let mut current = self;
        while let ShareGradError::NodeFailure { source, .. } = current {
            current = source;
        }
        current
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ShareGradError>;
