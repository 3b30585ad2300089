use crate::error::{Error, Result};
use crate::structs::component::GaussianComponent;
use crate::structs::weights::Weights;
use ndarray::{Array1, Array2};

/// A weighted sum of [GaussianComponent]s
///
/// Position `i` in the component sequence corresponds to position `i` in the
/// weight vector. Both sequences are owned by the mixture and only change together.
#[derive(Debug, Clone)]
pub struct GaussianMixture {
    components: Vec<GaussianComponent>,
    weights: Weights,
}

impl GaussianMixture {
    /// Create a mixture with uniform weights `1/N`
    pub fn new(components: Vec<GaussianComponent>) -> Result<Self> {
        let weights = Weights::uniform(components.len());
        Self::with_weights(components, weights)
    }

    /// Create a mixture with explicit weights
    ///
    /// All components must share one dimension and every weight must be
    /// non-negative. The weights are not normalized.
    pub fn with_weights(components: Vec<GaussianComponent>, weights: impl Into<Weights>) -> Result<Self> {
        let weights = weights.into();
        let first = components.first().ok_or(Error::EmptyMixture)?;
        if weights.len() != components.len() {
            return Err(Error::invalid_dimension(components.len(), weights.len()));
        }
        let dim = first.dim();
        if let Some(c) = components.iter().find(|c| c.dim() != dim) {
            return Err(Error::invalid_dimension(dim, c.dim()));
        }
        if let Some((index, weight)) = weights
            .iter()
            .enumerate()
            .find(|(_, w)| w.is_nan() || *w < 0.0)
        {
            return Err(Error::NegativeWeight { index, weight });
        }
        Ok(Self {
            components,
            weights,
        })
    }

    pub fn components(&self) -> &[GaussianComponent] {
        &self.components
    }

    pub fn component(&self, index: usize) -> Option<&GaussianComponent> {
        self.components.get(index)
    }

    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    /// Mutable access to the weights
    ///
    /// Weights written here are not checked. Callers must keep them non-negative,
    /// [crate::algorithms::Hierarchical::new] rejects an input that does not.
    pub fn weights_mut(&mut self) -> &mut Weights {
        &mut self.weights
    }

    /// Iterate over `(component, weight)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&GaussianComponent, f64)> + '_ {
        self.components.iter().zip(self.weights.iter())
    }

    /// Number of components
    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Dimension of the space the mixture lives in, zero if empty
    pub fn dim(&self) -> usize {
        self.components.first().map(|c| c.dim()).unwrap_or(0)
    }

    /// True if the weights sum to one within numerical tolerance
    pub fn normalized(&self) -> bool {
        self.weights.normalized()
    }

    /// Rescale the weights in place so that they sum to one
    pub fn normalize(&mut self) -> Result<()> {
        self.weights.normalize()
    }

    /// Remove every component whose weight is at or below `threshold`
    ///
    /// Survivors keep their relative order. Returns the removed original
    /// indices in ascending order. The weights are not renormalized.
    pub fn prune(&mut self, threshold: f64) -> Vec<usize> {
        let removed = self.weights.below(threshold);
        if removed.is_empty() {
            return removed;
        }

        let mut survives = vec![true; self.len()];
        for &i in &removed {
            survives[i] = false;
        }
        let keep: Vec<usize> = (0..self.len()).filter(|&i| survives[i]).collect();
        self.weights.filter_indices(&keep);

        let mut flags = survives.into_iter();
        self.components.retain(|_| flags.next().unwrap_or(false));

        tracing::debug!(
            "Pruned {} of {} components at threshold {:e}",
            removed.len(),
            removed.len() + self.len(),
            threshold
        );
        removed
    }

    /// First moment of the mixture, `Σ w_i μ_i / Σ w_i`
    pub fn mean(&self) -> Result<Array1<f64>> {
        let total = self.weights.sum();
        if total <= 0.0 || !total.is_finite() {
            return Err(Error::EmptyMixture);
        }
        let mut mean = Array1::<f64>::zeros(self.dim());
        for (c, w) in self.iter() {
            mean.scaled_add(w, c.mean());
        }
        Ok(mean / total)
    }

    /// Second central moment of the mixture, `Σ w_i (Σ_i + (μ_i - μ)(μ_i - μ)ᵗ) / Σ w_i`
    pub fn covariance(&self) -> Result<Array2<f64>> {
        let mean = self.mean()?;
        let total = self.weights.sum();
        let dim = self.dim();
        let mut cov = Array2::<f64>::zeros((dim, dim));
        for (c, w) in self.iter() {
            let dx = c.mean() - &mean;
            cov.scaled_add(w, c.cov());
            cov.scaled_add(w, &outer(&dx, &dx));
        }
        Ok(cov / total)
    }
}

/// Outer product `a bᵗ`
pub(crate) fn outer(a: &Array1<f64>, b: &Array1<f64>) -> Array2<f64> {
    Array2::from_shape_fn((a.len(), b.len()), |(i, j)| a[i] * b[j])
}
