use crate::error::Result;
use crate::ops::{input_values, OpContext, Operand};
use crate::value::TensorValue;

/// Sums every element into a scalar. Remembers the input shape for the backward pass.
pub(crate) fn forward<V: TensorValue>(ctx: &mut OpContext<V>, inputs: &[Operand<V>]) -> Result<V> {
    let [x] = input_values::<V, 1>("sum", inputs)?;
    *ctx = OpContext::InputShape(x.shape());
    x.sum()
}

/// Broadcasts the scalar gradient back over the original input shape.
pub(crate) fn backward<V: TensorValue>(ctx: &OpContext<V>, grad_output: &V) -> Result<Vec<V>> {
    let input_shape = ctx.as_input_shape("sum")?;
    Ok(vec![grad_output.expand(input_shape)?])
}
