use sharegrad_core::utils::testing::check_tensor_near;
use sharegrad_core::{
    is_grad_enabled, Function, OpContext, Operand, Result, ShareGradError, TensorValue,
};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

mod common;
use common::{init_logger, leaf, Dense};

/// `x * x + x`, computed inside `forward` with ordinary tensor operations.
#[derive(Debug)]
struct Composite;

impl Function<Dense> for Composite {
    fn name(&self) -> &str {
        "composite"
    }

    fn arity(&self) -> usize {
        1
    }

    fn forward(&self, ctx: &mut OpContext<Dense>, inputs: &[Operand<Dense>]) -> Result<Dense> {
        assert!(!is_grad_enabled(), "grad mode must be off inside forward");
        let x = inputs[0]
            .as_tensor()
            .ok_or_else(|| ShareGradError::Internal("expected a tensor input".into()))?;
        let inner = x.mul(x)?.add(x)?;
        assert!(!inner.requires_grad());
        assert!(inner.grad_fn_name().is_none());
        *ctx = OpContext::Saved(vec![x.value()]);
        Ok(inner.value())
    }

    fn backward(&self, ctx: &OpContext<Dense>, grad_output: &Dense) -> Result<Vec<Dense>> {
        // d/dx (x^2 + x) = 2x + 1
        let x = &ctx.saved("composite")?[0];
        let slope = Dense::new(x.data().iter().map(|v| 2.0 * v + 1.0).collect(), x.shape())?;
        Ok(vec![grad_output.mul(&slope)?])
    }
}

/// Runs an inner operation, then fails.
#[derive(Debug)]
struct FailsAfterInnerOp;

impl Function<Dense> for FailsAfterInnerOp {
    fn name(&self) -> &str {
        "fails_after_inner_op"
    }

    fn arity(&self) -> usize {
        1
    }

    fn forward(&self, _ctx: &mut OpContext<Dense>, inputs: &[Operand<Dense>]) -> Result<Dense> {
        if let Some(x) = inputs[0].as_tensor() {
            x.sigmoid()?;
        }
        Err(ShareGradError::ShapeMismatch {
            expected: vec![1],
            actual: inputs[0].value().shape(),
            operation: "fails_after_inner_op".to_string(),
        })
    }

    fn backward(&self, _ctx: &OpContext<Dense>, _grad_output: &Dense) -> Result<Vec<Dense>> {
        unreachable!("never recorded")
    }
}

/// Panics halfway through its forward rule.
#[derive(Debug)]
struct PanicsInForward;

impl Function<Dense> for PanicsInForward {
    fn name(&self) -> &str {
        "panics_in_forward"
    }

    fn arity(&self) -> usize {
        1
    }

    fn forward(&self, _ctx: &mut OpContext<Dense>, inputs: &[Operand<Dense>]) -> Result<Dense> {
        if let Some(x) = inputs[0].as_tensor() {
            let _ = x.sum();
        }
        panic!("backend crashed");
    }

    fn backward(&self, _ctx: &OpContext<Dense>, _grad_output: &Dense) -> Result<Vec<Dense>> {
        unreachable!("never recorded")
    }
}

#[test]
fn test_inner_operations_are_not_recorded() -> Result<()> {
    init_logger();
    let x = leaf(vec![1.0, -2.0, 0.5], vec![3], true);
    let y = x.call(Arc::new(Composite), &[])?;

    assert!(is_grad_enabled());
    assert_eq!(y.parents(), vec![x.clone()]);
    assert_eq!(x.nr_out_edges(), 1);
    assert_eq!(y.grad_fn_name().as_deref(), Some("composite"));
    check_tensor_near(&y.value(), &[3], &[2.0, 2.0, 0.75], 1e-12);

    y.sum()?.backward(None)?;
    check_tensor_near(&x.grad().expect("Grad x missing"), &[3], &[3.0, -3.0, 2.0], 1e-12);
    Ok(())
}

#[test]
fn test_flag_restored_after_forward_error() {
    init_logger();
    let x = leaf(vec![1.0, 2.0], vec![2], true);
    let err = x.call(Arc::new(FailsAfterInnerOp), &[]).unwrap_err();
    assert!(matches!(err, ShareGradError::ShapeMismatch { .. }));
    assert!(is_grad_enabled());
    assert_eq!(x.nr_out_edges(), 0);
}

#[test]
fn test_flag_restored_after_forward_panic() {
    init_logger();
    let x = leaf(vec![1.0, 2.0], vec![2], true);
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let _ = x.call(Arc::new(PanicsInForward), &[]);
    }));
    assert!(outcome.is_err());
    assert!(is_grad_enabled());
    assert_eq!(x.nr_out_edges(), 0);

    // The graph keeps working afterwards.
    let y = x.sigmoid().expect("sigmoid after panic");
    assert!(y.requires_grad());
}
