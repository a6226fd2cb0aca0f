//! Helpers shared by the unit and integration tests.

use crate::tensor::Tensor;
use crate::value::{DenseTensor, TensorValue};

/// Builds a dense `f64` value. Panics on a length/shape mismatch.
pub fn dense(data: Vec<f64>, shape: Vec<usize>) -> DenseTensor<f64> {
    DenseTensor::new(data, shape).expect("Failed to create test value")
}

/// Checks that a dense value has the expected shape and that every element is within
/// `tolerance` of the expected data.
/// Panics if shapes differ or data differs significantly.
pub fn check_tensor_near(
    actual: &DenseTensor<f64>,
    expected_shape: &[usize],
    expected_data: &[f64],
    tolerance: f64,
) {
    assert_eq!(actual.shape(), expected_shape, "Shape mismatch");
    assert_eq!(
        actual.data().len(),
        expected_data.len(),
        "Data length mismatch"
    );

    for (i, (a, e)) in actual.data().iter().zip(expected_data.iter()).enumerate() {
        let diff = (a - e).abs();
        if diff > tolerance {
            panic!(
                "Data mismatch at index {}: actual={:?}, expected={:?}, diff={:?}, tolerance={:?}",
                i, a, e, diff, tolerance
            );
        }
    }
}

/// Helper to create a leaf that does not require grad.
pub fn create_test_tensor(data: Vec<f64>, shape: Vec<usize>) -> Tensor<DenseTensor<f64>> {
    Tensor::new(dense(data, shape))
}

/// Helper to create a leaf that requires grad.
pub fn create_test_tensor_with_grad(
    data: Vec<f64>,
    shape: Vec<usize>,
) -> Tensor<DenseTensor<f64>> {
    Tensor::new_with_grad(dense(data, shape))
}
