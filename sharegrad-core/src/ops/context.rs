use crate::error::{Result, ShareGradError};

/// Values cached by an operation's forward call for use by its backward call.
///
/// Each node owns its context: the executor hands a fresh `Empty` context to `forward` and moves
/// it into the produced tensor afterwards, so no two nodes ever share one.
#[derive(Debug, Clone, Default)]
pub enum OpContext<V> {
    /// Nothing cached (transpose, add, sub).
    #[default]
    Empty,
    /// Shape of the single input (sum).
    InputShape(Vec<usize>),
    /// Both original operands (mul).
    Operands(V, V),
    /// The forward output (sigmoid).
    Output(V),
    /// Free-form saved values for user-defined functions.
    Saved(Vec<V>),
}

impl<V> OpContext<V> {
    pub fn is_empty(&self) -> bool {
        matches!(self, OpContext::Empty)
    }

    pub fn as_input_shape(&self, operation: &str) -> Result<&[usize]> {
        match self {
            OpContext::InputShape(shape) => Ok(shape),
            other => Err(missing(operation, "input shape", other)),
        }
    }

    pub fn as_operands(&self, operation: &str) -> Result<(&V, &V)> {
        match self {
            OpContext::Operands(x, y) => Ok((x, y)),
            other => Err(missing(operation, "operands", other)),
        }
    }

    pub fn as_output(&self, operation: &str) -> Result<&V> {
        match self {
            OpContext::Output(output) => Ok(output),
            other => Err(missing(operation, "forward output", other)),
        }
    }

    pub fn saved(&self, operation: &str) -> Result<&[V]> {
        match self {
            OpContext::Saved(values) => Ok(values),
            other => Err(missing(operation, "saved values", other)),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            OpContext::Empty => "Empty",
            OpContext::InputShape(_) => "InputShape",
            OpContext::Operands(..) => "Operands",
            OpContext::Output(_) => "Output",
            OpContext::Saved(_) => "Saved",
        }
    }
}

fn missing<V>(operation: &str, wanted: &str, found: &OpContext<V>) -> ShareGradError {
    ShareGradError::Internal(format!(
        "{}: backward needs cached {}, context is {}",
        operation,
        wanted,
        found.kind()
    ))
}
