use crate::error::{Error, Result};
use crate::structs::component::GaussianComponent;
use crate::structs::mixture::GaussianMixture;
use ndarray::parallel::prelude::*;
use ndarray::{Array2, Axis};

/// Kullback-Leibler divergence KL(c1 ‖ c2) between two Gaussians of dimension D
///
/// ```text
/// KL(c1 ‖ c2) = ½ [ tr(Σ₂⁻¹ Σ₁) + (μ₂ - μ₁)ᵗ Σ₂⁻¹ (μ₂ - μ₁) - D + ln(det Σ₂ / det Σ₁) ]
/// ```
///
/// The divergence is asymmetric. It is zero for identical components, but may come
/// out slightly negative in floating point when the two are nearly identical.
///
/// Fails with [Error::InvalidDimension] if the two components have different dimensions.
pub fn kullback_leibler(c1: &GaussianComponent, c2: &GaussianComponent) -> Result<f64> {
    if c1.dim() != c2.dim() {
        return Err(Error::invalid_dimension(c1.dim(), c2.dim()));
    }
    Ok(divergence(c1, c2))
}

/// Closed form of [kullback_leibler] for components already known to share a dimension
fn divergence(c1: &GaussianComponent, c2: &GaussianComponent) -> f64 {
    let d = c1.dim() as f64;

    // tr(A B) = Σ_ij A_ij B_ji
    let trace = (c2.inv() * &c1.cov().t()).sum();

    let dmu = c2.mean() - c1.mean();
    let mahalanobis = dmu.dot(&c2.inv().dot(&dmu));

    let log_det_ratio = c2.log_det() - c1.log_det();

    0.5 * (trace + mahalanobis - d + log_det_ratio)
}

/// Divergence of every input component from every model component
///
/// Entry `(i, k)` holds `KL(input_i ‖ model_k)`. Rows are computed in parallel,
/// each row by a single task, so the result does not depend on scheduling.
/// Fails with [Error::IncompatibleMixtures] if the mixtures differ in dimension.
pub fn divergence_matrix(input: &GaussianMixture, model: &GaussianMixture) -> Result<Array2<f64>> {
    if input.dim() != model.dim() {
        return Err(Error::IncompatibleMixtures {
            input: input.dim(),
            model: model.dim(),
        });
    }
    let mut kl = Array2::<f64>::zeros((input.len(), model.len()));
    kl.axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .for_each(|(i, mut row)| {
            let ci = &input.components()[i];
            for (k, ck) in model.components().iter().enumerate() {
                row[k] = divergence(ci, ck);
            }
        });
    Ok(kl)
}
