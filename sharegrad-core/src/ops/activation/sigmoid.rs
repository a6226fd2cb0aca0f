use crate::error::Result;
use crate::ops::{input_values, OpContext, Operand};
use crate::value::TensorValue;

/// Element-wise logistic function. Caches the output `p` for the backward pass.
pub(crate) fn forward<V: TensorValue>(ctx: &mut OpContext<V>, inputs: &[Operand<V>]) -> Result<V> {
    let [x] = input_values::<V, 1>("sigmoid", inputs)?;
    let probs = x.sigmoid()?;
    *ctx = OpContext::Output(probs.clone());
    Ok(probs)
}

/// g * p * (1 - p)
pub(crate) fn backward<V: TensorValue>(ctx: &OpContext<V>, grad_output: &V) -> Result<Vec<V>> {
    let probs = ctx.as_output("sigmoid")?;
    let one_minus = V::ones(&probs.shape())?.sub(probs)?;
    Ok(vec![grad_output.mul(probs)?.mul(&one_minus)?])
}
