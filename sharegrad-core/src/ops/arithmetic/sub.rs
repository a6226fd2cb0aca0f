use crate::error::Result;
use crate::ops::{input_values, OpContext, Operand};
use crate::value::{check_same_shape, TensorValue};

/// `x - y`, element-wise. Shapes must match exactly.
pub(crate) fn forward<V: TensorValue>(ctx: &mut OpContext<V>, inputs: &[Operand<V>]) -> Result<V> {
    let [x, y] = input_values::<V, 2>("sub", inputs)?;
    check_same_shape("sub", &x, &y)?;
    *ctx = OpContext::Empty;
    x.sub(&y)
}

/// d(x - y)/dx = 1, d(x - y)/dy = -1.
pub(crate) fn backward<V: TensorValue>(_ctx: &OpContext<V>, grad_output: &V) -> Result<Vec<V>> {
    Ok(vec![grad_output.clone(), grad_output.neg()?])
}
