use crate::autograd::grad_mode::no_grad;
use crate::error::ShareGradError;
use crate::tensor::Tensor;
use crate::value::DenseTensor;
use approx::relative_eq;
use log::debug;
use thiserror::Error;

type Dense = DenseTensor<f64>;

/// Error type specifically for gradient checking failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GradCheckError {
    #[error("Gradient check failed for input {input_index}, element {element_index}: analytical {analytical_grad:?} != numerical {numerical_grad:?} (difference {difference:?})")]
    GradientMismatch {
        input_index: usize,
        element_index: usize,
        analytical_grad: f64,
        numerical_grad: f64,
        difference: f64,
    },
    #[error("Forward function execution failed during gradient check: {0}")]
    ForwardPassError(ShareGradError),
    #[error("Backward pass execution failed during gradient check: {0}")]
    BackwardPassError(ShareGradError),
    #[error("Input tensor {input_index} requires grad but has no gradient after backward pass.")]
    MissingAnalyticalGrad { input_index: usize },
    #[error("Numerical gradient is NaN or infinite for input {input_index}, element {element_index}. Loss+: {loss_plus:?}, Loss-: {loss_minus:?}")]
    NumericalGradNaNOrInfinite {
        input_index: usize,
        element_index: usize,
        loss_plus: f64,
        loss_minus: f64,
    },
    #[error("Analytical gradient is NaN or infinite for input {input_index}, element {element_index}. Value: {value:?}")]
    AnalyticalGradNaNOrInfinite {
        input_index: usize,
        element_index: usize,
        value: f64,
    },
    #[error("Gradient check input tensor must be a leaf node (no grad_fn). Input index: {input_index}")]
    InputNotLeaf { input_index: usize },
    #[error("Function did not propagate requires_grad correctly.")]
    RequiresGradPropagationError,
    #[error("Tensor error during intermediate calculation: {0}")]
    TensorError(ShareGradError),
}

impl From<ShareGradError> for GradCheckError {
    fn from(err: ShareGradError) -> Self {
        GradCheckError::TensorError(err)
    }
}

/// Checks analytical gradients against central finite differences.
///
/// The scalar objective is the sum of all elements of `func(inputs)`. For every input that
/// requires grad, each element is perturbed by `±epsilon` and the numerical slope is compared to
/// the gradient produced by a backward pass. Two gradients agree when their absolute or relative
/// difference is within `tolerance`.
///
/// The inputs' existing gradients are cleared first and hold the analytical gradients afterwards.
pub fn check_grad<F>(
    func: F,
    inputs: &[Tensor<Dense>],
    epsilon: f64,
    tolerance: f64,
) -> Result<(), GradCheckError>
where
    F: Fn(&[Tensor<Dense>]) -> Result<Tensor<Dense>, ShareGradError>,
{
    for (i, input) in inputs.iter().enumerate() {
        if input.requires_grad() && !input.is_leaf() {
            return Err(GradCheckError::InputNotLeaf { input_index: i });
        }
        input.zero_grad();
    }

    // --- Analytical gradients ---
    let output = func(inputs).map_err(GradCheckError::ForwardPassError)?;
    let any_input_requires_grad = inputs.iter().any(Tensor::requires_grad);
    if any_input_requires_grad != output.requires_grad() {
        return Err(GradCheckError::RequiresGradPropagationError);
    }
    if !output.requires_grad() {
        return Ok(());
    }
    output
        .backward(None)
        .map_err(GradCheckError::BackwardPassError)?;

    // --- Numerical gradients ---
    for (i, original_input) in inputs.iter().enumerate() {
        if !original_input.requires_grad() {
            continue;
        }
        let analytical = original_input
            .grad()
            .ok_or(GradCheckError::MissingAnalyticalGrad { input_index: i })?;
        let original_value = original_input.value();

        for elem_idx in 0..original_value.data().len() {
            let loss_plus = perturbed_loss(&func, inputs, i, &original_value, elem_idx, epsilon)?;
            let loss_minus = perturbed_loss(&func, inputs, i, &original_value, elem_idx, -epsilon)?;
            let numerical_grad = (loss_plus - loss_minus) / (2.0 * epsilon);
            let analytical_grad = analytical.data()[elem_idx];

            if !numerical_grad.is_finite() {
                return Err(GradCheckError::NumericalGradNaNOrInfinite {
                    input_index: i,
                    element_index: elem_idx,
                    loss_plus,
                    loss_minus,
                });
            }
            if !analytical_grad.is_finite() {
                return Err(GradCheckError::AnalyticalGradNaNOrInfinite {
                    input_index: i,
                    element_index: elem_idx,
                    value: analytical_grad,
                });
            }

            if !relative_eq!(
                analytical_grad,
                numerical_grad,
                epsilon = tolerance,
                max_relative = tolerance
            ) {
                return Err(GradCheckError::GradientMismatch {
                    input_index: i,
                    element_index: elem_idx,
                    analytical_grad,
                    numerical_grad,
                    difference: (analytical_grad - numerical_grad).abs(),
                });
            }
        }
        debug!(
            "Gradient check passed for input {} ({} element(s))",
            i,
            original_value.data().len()
        );
    }
    Ok(())
}

/// Objective value with element `elem_idx` of input `input_index` shifted by `delta`.
/// Evaluated with recording disabled.
fn perturbed_loss<F>(
    func: &F,
    inputs: &[Tensor<Dense>],
    input_index: usize,
    original_value: &Dense,
    elem_idx: usize,
    delta: f64,
) -> Result<f64, GradCheckError>
where
    F: Fn(&[Tensor<Dense>]) -> Result<Tensor<Dense>, ShareGradError>,
{
    let mut shifted = original_value.clone();
    shifted.data_mut()[elem_idx] += delta;

    let mut perturbed_inputs: Vec<Tensor<Dense>> = inputs.to_vec();
    perturbed_inputs[input_index] = Tensor::new(shifted);

    let output = no_grad(|| func(&perturbed_inputs)).map_err(GradCheckError::ForwardPassError)?;
    Ok(output.value().data().iter().sum())
}
