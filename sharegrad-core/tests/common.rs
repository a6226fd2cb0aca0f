use sharegrad_core::tensor::Tensor;
use sharegrad_core::value::DenseTensor;

pub type Dense = DenseTensor<f64>;

// Attempt to initialize env_logger. If it fails (already initialized), that's okay.
#[allow(dead_code)]
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[allow(dead_code)]
pub fn leaf(data: Vec<f64>, shape: Vec<usize>, requires_grad: bool) -> Tensor<Dense> {
    let value = Dense::new(data, shape).expect("Test tensor creation failed");
    if requires_grad {
        Tensor::new_with_grad(value)
    } else {
        Tensor::new(value)
    }
}
