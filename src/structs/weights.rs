use crate::error::{Error, Result};
use ndarray::Array1;
use std::ops::{Index, IndexMut};

/// Relative tolerance of [Weights::normalized]
pub const NORMALIZATION_TOLERANCE: f64 = 1e-13;

/// The weight (probability) of each component in a mixture.
///
/// This is a thin wrapper around [ndarray::Array1<f64>]. The weights may be transiently
/// unnormalized, [Weights::normalized] is a predicate and not an invariant.
#[derive(Debug, Clone, PartialEq)]
pub struct Weights {
    weights: Array1<f64>,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            weights: Array1::zeros(0),
        }
    }
}

impl Weights {
    pub fn new(weights: Array1<f64>) -> Self {
        Self { weights }
    }

    /// Create `n` equal weights summing to one.
    pub fn uniform(n: usize) -> Self {
        Self {
            weights: Array1::from_elem(n, 1.0 / n as f64),
        }
    }

    /// Create a new [Weights] instance from a vector of weights.
    pub fn from_vec(weights: Vec<f64>) -> Self {
        Self {
            weights: Array1::from(weights),
        }
    }

    /// Get a reference to the weights.
    pub fn weights(&self) -> &Array1<f64> {
        &self.weights
    }

    /// Get a mutable reference to the weights.
    pub fn weights_mut(&mut self) -> &mut Array1<f64> {
        &mut self.weights
    }

    /// Get the number of weights.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Get a vector representation of the weights.
    pub fn to_vec(&self) -> Vec<f64> {
        self.weights.to_vec()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.weights.iter().cloned()
    }

    pub fn sum(&self) -> f64 {
        self.weights.sum()
    }

    /// True if the weights sum to one within [NORMALIZATION_TOLERANCE]
    pub fn normalized(&self) -> bool {
        (self.sum() - 1.0).abs() <= NORMALIZATION_TOLERANCE
    }

    /// Rescale the weights in place so that they sum to one
    ///
    /// Fails with [Error::EmptyMixture] if the current sum is zero or not finite,
    /// leaving the weights untouched.
    pub fn normalize(&mut self) -> Result<()> {
        let sum = self.sum();
        if sum <= 0.0 || !sum.is_finite() {
            return Err(Error::EmptyMixture);
        }
        self.weights /= sum;
        Ok(())
    }

    /// Indices (ascending) of the weights at or below `threshold`
    pub(crate) fn below(&self, threshold: f64) -> Vec<usize> {
        self.weights
            .iter()
            .enumerate()
            .filter(|&(_, &w)| w <= threshold)
            .map(|(i, _)| i)
            .collect()
    }

    /// Keep only the weights at `indices`, in the given order
    pub(crate) fn filter_indices(&mut self, indices: &[usize]) {
        self.weights = indices.iter().map(|&i| self.weights[i]).collect();
    }
}

impl From<Vec<f64>> for Weights {
    fn from(weights: Vec<f64>) -> Self {
        Self::from_vec(weights)
    }
}

impl From<Array1<f64>> for Weights {
    fn from(weights: Array1<f64>) -> Self {
        Self { weights }
    }
}

impl Index<usize> for Weights {
    type Output = f64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.weights[index]
    }
}

impl IndexMut<usize> for Weights {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.weights[index]
    }
}
