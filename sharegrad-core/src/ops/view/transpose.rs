use crate::error::Result;
use crate::ops::{input_values, OpContext, Operand};
use crate::value::TensorValue;

pub(crate) fn forward<V: TensorValue>(ctx: &mut OpContext<V>, inputs: &[Operand<V>]) -> Result<V> {
    let [x] = input_values::<V, 1>("t", inputs)?;
    *ctx = OpContext::Empty;
    x.transpose()
}

pub(crate) fn backward<V: TensorValue>(_ctx: &OpContext<V>, grad_output: &V) -> Result<Vec<V>> {
    Ok(vec![grad_output.transpose()?])
}

#[cfg(test)]
mod tests {
    use crate::error::Result;
    use crate::utils::testing::{check_tensor_near, create_test_tensor_with_grad, dense};

    #[test]
    fn test_transpose_forward() -> Result<()> {
        let a = create_test_tensor_with_grad(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], vec![2, 3]);
        let t = a.t()?;
        check_tensor_near(&t.value(), &[3, 2], &[1.0, 4.0, 2.0, 5.0, 3.0, 6.0], 1e-12);
        assert!(t.requires_grad());
        assert_eq!(t.grad_fn_name().as_deref(), Some("t"));
        Ok(())
    }

    #[test]
    fn test_transpose_backward_transposes_gradient() -> Result<()> {
        let a = create_test_tensor_with_grad(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], vec![2, 3]);
        let t = a.t()?;
        let seed = dense(vec![10.0, 40.0, 20.0, 50.0, 30.0, 60.0], vec![3, 2]);
        t.backward(Some(seed))?;
        check_tensor_near(
            &a.grad().expect("Grad a missing"),
            &[2, 3],
            &[10.0, 20.0, 30.0, 40.0, 50.0, 60.0],
            1e-12,
        );
        Ok(())
    }
}
