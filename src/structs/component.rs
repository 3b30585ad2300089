use crate::error::{Error, Result};
use crate::routines::linalg::{cholesky, determinant, spd_factors};
use ndarray::{Array1, Array2};

/// A single multivariate Gaussian
///
/// The inverse covariance and the determinant are computed once at construction
/// and are always valid afterwards. Fields are private so that the cached values
/// can never drift from the covariance they were derived from.
#[derive(Debug, Clone)]
pub struct GaussianComponent {
    mean: Array1<f64>,
    cov: Array2<f64>,
    inv: Array2<f64>,
    det: f64,
    log_det: f64,
}

impl GaussianComponent {
    /// Create a new component from a mean vector and a covariance matrix
    ///
    /// Fails with [Error::InvalidDimension] if `mean.len()` does not match both
    /// dimensions of `cov`, and with [Error::DegenerateCovariance] if `cov` is
    /// not positive definite.
    pub fn new(mean: Array1<f64>, cov: Array2<f64>) -> Result<Self> {
        check_dimensions(&mean, &cov)?;
        let factors = spd_factors(&cov)?;
        Ok(Self {
            mean,
            cov,
            inv: factors.inv,
            det: factors.det,
            log_det: factors.log_det,
        })
    }

    /// Create a new component with a precomputed inverse covariance
    ///
    /// The inverse is taken as given, only its shape is checked.
    pub fn with_inverse(mean: Array1<f64>, cov: Array2<f64>, inv: Array2<f64>) -> Result<Self> {
        check_dimensions(&mean, &cov)?;
        if inv.dim() != cov.dim() {
            return Err(Error::invalid_dimension(cov.nrows(), inv.nrows().max(inv.ncols())));
        }
        let (det, log_det) = determinant(&cholesky(&cov)?)?;
        Ok(Self {
            mean,
            cov,
            inv,
            det,
            log_det,
        })
    }

    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    pub fn cov(&self) -> &Array2<f64> {
        &self.cov
    }

    /// Inverse of the covariance matrix
    pub fn inv(&self) -> &Array2<f64> {
        &self.inv
    }

    /// Determinant of the covariance matrix
    pub fn det(&self) -> f64 {
        self.det
    }

    /// Natural logarithm of [GaussianComponent::det], computed from the Cholesky factor
    pub fn log_det(&self) -> f64 {
        self.log_det
    }

    /// Dimension of the space the component lives in
    pub fn dim(&self) -> usize {
        self.mean.len()
    }
}

fn check_dimensions(mean: &Array1<f64>, cov: &Array2<f64>) -> Result<()> {
    let (nrows, ncols) = cov.dim();
    if mean.len() != nrows {
        return Err(Error::invalid_dimension(nrows, mean.len()));
    }
    if mean.len() != ncols {
        return Err(Error::invalid_dimension(ncols, mean.len()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_unit_component() {
        let c = GaussianComponent::new(Array1::ones(3), Array2::eye(3)).unwrap();
        assert!((c.det() - 1.0).abs() < 1e-13);
        assert!(c.log_det().abs() < 1e-13);
        for (x, y) in c.inv().iter().zip(Array2::<f64>::eye(3).iter()) {
            assert!((x - y).abs() < 1e-13);
        }
        assert_eq!(c.dim(), 3);
    }

    #[test]
    fn test_mean_longer_than_cov() {
        let result = GaussianComponent::new(Array1::ones(4), Array2::eye(3));
        assert!(matches!(
            result,
            Err(Error::InvalidDimension {
                expected: 3,
                found: 4
            })
        ));
    }

    #[test]
    fn test_non_square_cov() {
        let result = GaussianComponent::new(Array1::ones(2), Array2::zeros((2, 3)));
        assert!(matches!(result, Err(Error::InvalidDimension { .. })));
    }

    #[test]
    fn test_with_inverse_keeps_given_inverse() {
        let cov = array![[2.0, 0.0], [0.0, 4.0]];
        let inv = array![[0.5, 0.0], [0.0, 0.25]];
        let c = GaussianComponent::with_inverse(Array1::zeros(2), cov, inv.clone()).unwrap();
        assert_eq!(c.inv(), &inv);
        assert!((c.det() - 8.0).abs() < 1e-13);
    }

    #[test]
    fn test_with_inverse_wrong_shape() {
        let result =
            GaussianComponent::with_inverse(Array1::zeros(2), Array2::eye(2), Array2::eye(3));
        assert!(matches!(result, Err(Error::InvalidDimension { .. })));
    }

    #[test]
    fn test_negative_definite_cov() {
        let result = GaussianComponent::new(Array1::zeros(2), -Array2::<f64>::eye(2));
        assert!(matches!(result, Err(Error::DegenerateCovariance(_))));
    }
}
