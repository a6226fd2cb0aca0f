use crate::autograd::grad_mode::GradModeGuard;
use crate::error::{Result, ShareGradError};
use crate::ops::{Function, OpContext, Operand};
use crate::tensor::Tensor;
use crate::value::TensorValue;
use log::{debug, trace};
use std::sync::Arc;

/// Runs `grad_fn` on `owner` and `args`, recording the call into the graph.
///
/// * `parents` of the result are the tensor operands in call order (constants excluded).
/// * The result requires grad if any parent does.
/// * `forward` runs with grad mode disabled, so differentiable operations it invokes internally
///   are evaluated without being recorded. The flag is restored on every exit path.
/// * The scratch context handed to `forward` becomes the result's `ctx`.
/// * Each parent's `nr_out_edges` is incremented once per occurrence.
///
/// # Errors
/// `TypeMismatch` on an arity violation, `ShapeMismatch` from the operation's own checks, and
/// backend failures wrapped in `NodeFailure`. Nothing is recorded when an error is returned.
pub fn apply<V: TensorValue>(
    owner: &Tensor<V>,
    grad_fn: Arc<dyn Function<V>>,
    args: &[Operand<V>],
) -> Result<Tensor<V>> {
    let inputs = collect_inputs(owner, grad_fn.as_ref(), args)?;

    let (parents, parent_slots): (Vec<Tensor<V>>, Vec<usize>) = inputs
        .iter()
        .enumerate()
        .filter_map(|(slot, operand)| operand.as_tensor().map(|t| (t.clone(), slot)))
        .unzip();
    let requires_grad = parents.iter().any(Tensor::requires_grad);

    let mut scratch = OpContext::Empty;
    let value = {
        let _no_grad = GradModeGuard::disabled();
        grad_fn.forward(&mut scratch, &inputs)
    }
    .map_err(|e| e.in_node(grad_fn.name(), None))?;

    for parent in &parents {
        parent.write_data().nr_out_edges += 1;
    }

    let parent_ids: Vec<u64> = parents.iter().map(Tensor::id).collect();
    let result = Tensor::from_op(value, requires_grad, grad_fn, scratch, parents, parent_slots);
    debug!(
        "Recorded node {} ({}) from parents {:?}, requires_grad={}",
        result.id(),
        result.grad_fn_name().unwrap_or_default(),
        parent_ids,
        requires_grad
    );
    Ok(result)
}

/// Evaluates `grad_fn` without touching the graph. Used when grad mode is disabled; the result is
/// an untracked leaf.
pub(crate) fn evaluate<V: TensorValue>(
    owner: &Tensor<V>,
    grad_fn: &dyn Function<V>,
    args: &[Operand<V>],
) -> Result<Tensor<V>> {
    let inputs = collect_inputs(owner, grad_fn, args)?;
    let mut scratch = OpContext::Empty;
    let value = grad_fn
        .forward(&mut scratch, &inputs)
        .map_err(|e| e.in_node(grad_fn.name(), None))?;
    trace!("Evaluated {} without recording", grad_fn.name());
    Ok(Tensor::new(value))
}

fn collect_inputs<V: TensorValue>(
    owner: &Tensor<V>,
    grad_fn: &dyn Function<V>,
    args: &[Operand<V>],
) -> Result<Vec<Operand<V>>> {
    let got = args.len() + 1;
    if got != grad_fn.arity() {
        return Err(ShareGradError::TypeMismatch {
            operation: grad_fn.name().to_string(),
            message: format!("expected {} operand(s), got {}", grad_fn.arity(), got),
        });
    }
    let mut inputs = Vec::with_capacity(got);
    inputs.push(Operand::Tensor(owner.clone()));
    inputs.extend(args.iter().cloned());
    Ok(inputs)
}
