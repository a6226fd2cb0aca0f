use super::*;
use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn dense(data: Vec<f64>, shape: Vec<usize>) -> DenseTensor<f64> {
    DenseTensor::new(data, shape).expect("Failed to create test tensor")
}

#[test]
fn test_new_rejects_wrong_length() {
    let err = DenseTensor::new(vec![1.0_f64, 2.0, 3.0], vec![2, 2]).unwrap_err();
    assert_eq!(
        err,
        ShareGradError::TensorCreation {
            data_len: 3,
            shape: vec![2, 2]
        }
    );
}

#[test]
fn test_elementwise_ops() -> Result<()> {
    let a = dense(vec![1.0, 2.0, 3.0, 4.0], vec![2, 2]);
    let b = dense(vec![5.0, 6.0, 7.0, 8.0], vec![2, 2]);
    assert_eq!(a.add(&b)?.data(), &[6.0, 8.0, 10.0, 12.0]);
    assert_eq!(b.sub(&a)?.data(), &[4.0, 4.0, 4.0, 4.0]);
    assert_eq!(a.mul(&b)?.data(), &[5.0, 12.0, 21.0, 32.0]);
    assert_eq!(a.neg()?.data(), &[-1.0, -2.0, -3.0, -4.0]);
    Ok(())
}

#[test]
fn test_elementwise_shape_mismatch_is_arithmetic_error() {
    let a = dense(vec![1.0, 2.0], vec![2]);
    let b = dense(vec![1.0, 2.0, 3.0], vec![3]);
    assert!(matches!(a.mul(&b), Err(ShareGradError::Arithmetic(_))));
}

#[test]
fn test_transpose_2d() -> Result<()> {
    let a = dense(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], vec![2, 3]);
    let t = a.transpose()?;
    assert_eq!(t.shape(), vec![3, 2]);
    assert_eq!(t.data(), &[1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    assert_eq!(t.transpose()?, a);
    Ok(())
}

#[test]
fn test_transpose_rank3_fails() {
    let a = DenseTensor::<f64>::zeros(&[2, 2, 2]).unwrap();
    assert!(a.transpose().is_err());
}

#[test]
fn test_sum_and_expand() -> Result<()> {
    let a = dense(vec![1.0, 2.0, 3.0, 4.0], vec![2, 2]);
    let s = a.sum()?;
    assert!(s.shape().is_empty());
    assert_eq!(s.item()?, 10.0);

    let e = s.expand(&[3, 1])?;
    assert_eq!(e.shape(), vec![3, 1]);
    assert_eq!(e.data(), &[10.0, 10.0, 10.0]);

    assert!(a.expand(&[4]).is_err());
    Ok(())
}

#[test]
fn test_sigmoid_values() -> Result<()> {
    let a = dense(vec![0.0, 2.0, -2.0], vec![3]);
    let p = a.sigmoid()?;
    assert_relative_eq!(p.data()[0], 0.5, epsilon = 1e-12);
    assert_relative_eq!(p.data()[1], 1.0 / (1.0 + (-2.0_f64).exp()), epsilon = 1e-12);
    assert_relative_eq!(p.data()[1] + p.data()[2], 1.0, epsilon = 1e-12);
    Ok(())
}

#[test]
fn test_clone_is_independent() {
    let a = dense(vec![1.0, 2.0], vec![2]);
    let mut b = a.clone();
    b.data_mut()[0] = 42.0;
    assert_eq!(a.data(), &[1.0, 2.0]);
}

#[test]
fn test_randn_with_seed_is_reproducible() {
    let mut rng1 = StdRng::seed_from_u64(7);
    let mut rng2 = StdRng::seed_from_u64(7);
    let a = DenseTensor::<f64>::randn_with(&[3, 4], &mut rng1);
    let b = DenseTensor::<f64>::randn_with(&[3, 4], &mut rng2);
    assert_eq!(a, b);
    assert_eq!(a.numel(), 12);
}
