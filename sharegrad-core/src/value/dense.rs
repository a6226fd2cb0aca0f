use crate::error::{Result, ShareGradError};
use crate::value::TensorValue;
use num_traits::Float;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use std::fmt::Debug;

/// Plaintext, contiguous, row-major tensor.
///
/// This is the reference arithmetic backend: it exposes its elements directly and performs every
/// operation eagerly on the CPU. Binary operations never broadcast.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseTensor<T> {
    data: Vec<T>,
    shape: Vec<usize>,
}

impl<T> DenseTensor<T>
where
    T: Float + Debug + Send + Sync + 'static,
{
    /// Creates a tensor from flattened row-major data.
    ///
    /// # Errors
    /// Returns `ShareGradError::TensorCreation` if `data.len()` does not match the number of
    /// elements implied by `shape`.
    pub fn new(data: Vec<T>, shape: Vec<usize>) -> Result<Self> {
        let numel: usize = shape.iter().product();
        if data.len() != numel {
            return Err(ShareGradError::TensorCreation {
                data_len: data.len(),
                shape,
            });
        }
        Ok(DenseTensor { data, shape })
    }

    /// A 0-dimensional tensor holding `value`.
    pub fn scalar(value: T) -> Self {
        DenseTensor {
            data: vec![value],
            shape: vec![],
        }
    }

    pub fn full(shape: &[usize], value: T) -> Self {
        let numel: usize = shape.iter().product();
        DenseTensor {
            data: vec![value; numel],
            shape: shape.to_vec(),
        }
    }

    /// Samples every element from the standard normal distribution.
    pub fn randn(shape: &[usize]) -> Self
    where
        StandardNormal: Distribution<T>,
    {
        Self::randn_with(shape, &mut rand::thread_rng())
    }

    /// Same as [`DenseTensor::randn`] with a caller-provided generator (for reproducible tests).
    pub fn randn_with<R: Rng + ?Sized>(shape: &[usize], rng: &mut R) -> Self
    where
        StandardNormal: Distribution<T>,
    {
        let numel: usize = shape.iter().product();
        let data = (0..numel).map(|_| StandardNormal.sample(rng)).collect();
        DenseTensor {
            data,
            shape: shape.to_vec(),
        }
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Returns the single element of a one-element tensor.
    pub fn item(&self) -> Result<T> {
        match self.data.as_slice() {
            [value] => Ok(*value),
            _ => Err(ShareGradError::Arithmetic(format!(
                "item() requires exactly one element, tensor has shape {:?}",
                self.shape
            ))),
        }
    }

    fn map(&self, f: impl Fn(T) -> T) -> Self {
        DenseTensor {
            data: self.data.iter().map(|&v| f(v)).collect(),
            shape: self.shape.clone(),
        }
    }

    fn zip_with(&self, other: &Self, op_name: &str, f: impl Fn(T, T) -> T) -> Result<Self> {
        if self.shape != other.shape {
            return Err(ShareGradError::Arithmetic(format!(
                "{} requires identical shapes, got {:?} and {:?}",
                op_name, self.shape, other.shape
            )));
        }
        let data = self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(&a, &b)| f(a, b))
            .collect();
        Ok(DenseTensor {
            data,
            shape: self.shape.clone(),
        })
    }
}

impl<T> TensorValue for DenseTensor<T>
where
    T: Float + Debug + Send + Sync + 'static,
{
    fn shape(&self) -> Vec<usize> {
        self.shape.clone()
    }

    fn add(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, "add", |a, b| a + b)
    }

    fn sub(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, "sub", |a, b| a - b)
    }

    fn mul(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, "mul", |a, b| a * b)
    }

    fn neg(&self) -> Result<Self> {
        Ok(self.map(|v| -v))
    }

    fn transpose(&self) -> Result<Self> {
        match self.shape.as_slice() {
            [] | [_] => Ok(self.clone()),
            &[rows, cols] => {
                let mut data = Vec::with_capacity(self.data.len());
                for c in 0..cols {
                    for r in 0..rows {
                        data.push(self.data[r * cols + c]);
                    }
                }
                Ok(DenseTensor {
                    data,
                    shape: vec![cols, rows],
                })
            }
            shape => Err(ShareGradError::Arithmetic(format!(
                "transpose expects a tensor of rank <= 2, got shape {:?}",
                shape
            ))),
        }
    }

    fn sum(&self) -> Result<Self> {
        let total = self.data.iter().fold(T::zero(), |acc, &v| acc + v);
        Ok(Self::scalar(total))
    }

    fn sigmoid(&self) -> Result<Self> {
        Ok(self.map(|v| T::one() / (T::one() + (-v).exp())))
    }

    fn expand(&self, shape: &[usize]) -> Result<Self> {
        let value = self.item().map_err(|_| {
            ShareGradError::Arithmetic(format!(
                "expand requires a single-element tensor, got shape {:?}",
                self.shape
            ))
        })?;
        Ok(Self::full(shape, value))
    }

    fn ones(shape: &[usize]) -> Result<Self> {
        Ok(Self::full(shape, T::one()))
    }

    fn zeros(shape: &[usize]) -> Result<Self> {
        Ok(Self::full(shape, T::zero()))
    }
}

#[cfg(test)]
#[path = "dense_test.rs"]
mod tests;
