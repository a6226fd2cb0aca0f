use crate::error::Result;
use crate::ops::{input_values, OpContext, Operand};
use crate::value::{check_same_shape, TensorValue};

/// `x * y`, element-wise. Broadcasting is rejected so the backward never has to reduce.
///
/// Caches both operands for the backward pass.
pub(crate) fn forward<V: TensorValue>(ctx: &mut OpContext<V>, inputs: &[Operand<V>]) -> Result<V> {
    let [x, y] = input_values::<V, 2>("mul", inputs)?;
    check_same_shape("mul", &x, &y)?;
    let output = x.mul(&y)?;
    *ctx = OpContext::Operands(x, y);
    Ok(output)
}

/// grad_x = g * y, grad_y = g * x.
pub(crate) fn backward<V: TensorValue>(ctx: &OpContext<V>, grad_output: &V) -> Result<Vec<V>> {
    let (x, y) = ctx.as_operands("mul")?;
    Ok(vec![grad_output.mul(y)?, grad_output.mul(x)?])
}

#[cfg(test)]
mod tests {
    use crate::error::{Result, ShareGradError};
    use crate::ops::{Function, OpContext, OpKind, Operand};
    use crate::utils::testing::{
        check_tensor_near, create_test_tensor, create_test_tensor_with_grad, dense,
    };
    use crate::value::TensorValue;

    #[test]
    fn test_mul_forward_caches_operands() -> Result<()> {
        let a = create_test_tensor_with_grad(vec![1.0, 2.0], vec![2]);
        let b = create_test_tensor(vec![3.0, 4.0], vec![2]);
        let result = a.mul(&b)?;
        check_tensor_near(&result.value(), &[2], &[3.0, 8.0], 1e-12);

        match result.ctx() {
            OpContext::Operands(x, y) => {
                assert_eq!(x, a.value());
                assert_eq!(y, b.value());
            }
            other => panic!("Expected cached operands, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_mul_backward_exact() -> Result<()> {
        let x = dense(vec![1.0, -2.0, 3.0, 0.5], vec![2, 2]);
        let y = dense(vec![4.0, 5.0, -6.0, 2.0], vec![2, 2]);
        let g = dense(vec![0.1, 0.2, 0.3, 0.4], vec![2, 2]);

        let mut ctx = OpContext::Empty;
        let inputs = [Operand::constant(x.clone()), Operand::constant(y.clone())];
        OpKind::Mul.forward(&mut ctx, &inputs)?;
        let grads = OpKind::Mul.backward(&ctx, &g)?;

        assert_eq!(grads.len(), 2);
        assert_eq!(grads[0], g.mul(&y)?);
        assert_eq!(grads[1], g.mul(&x)?);
        Ok(())
    }

    #[test]
    fn test_mul_rejects_broadcasting() {
        let a = create_test_tensor(vec![1.0, 2.0, 3.0, 4.0], vec![2, 2]);
        let s = create_test_tensor(vec![2.0], vec![1]);
        assert!(matches!(
            a.mul(&s),
            Err(ShareGradError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_mul_with_constant_operand() -> Result<()> {
        let a = create_test_tensor_with_grad(vec![1.0, 2.0], vec![2]);
        let c = dense(vec![10.0, 20.0], vec![2]);
        let result = a.mul(Operand::constant(c))?;

        // Constants are not parents and receive no gradient.
        assert_eq!(result.parents(), vec![a.clone()]);
        result.sum()?.backward(None)?;
        check_tensor_near(&a.grad().expect("Grad a missing"), &[2], &[10.0, 20.0], 1e-12);
        Ok(())
    }

    #[test]
    fn test_mul_square_accumulates_both_contributions() -> Result<()> {
        let a = create_test_tensor_with_grad(vec![3.0, -1.0], vec![2]);
        let sq = a.mul(&a)?;
        assert_eq!(a.nr_out_edges(), 2);
        sq.sum()?.backward(None)?;
        check_tensor_near(&a.grad().expect("Grad a missing"), &[2], &[6.0, -2.0], 1e-12);
        Ok(())
    }
}
