use crate::error::{Error, Result};
use linfa_linalg::cholesky::Cholesky;
use linfa_linalg::triangular::{SolveTriangular, UPLO};
use ndarray::{Array2, ArrayBase, Data, Ix2};

/// Inverse and determinant of a symmetric positive-definite matrix
#[derive(Debug, Clone)]
pub struct SpdFactors {
    pub inv: Array2<f64>,
    pub det: f64,
    pub log_det: f64,
}

/// Lower Cholesky factor `L` of `a`, with `a = L Lᵗ`.
///
/// Only the lower triangle of `a` is read. Fails with [Error::DegenerateCovariance]
/// when `a` is not square or not positive definite.
pub fn cholesky<S>(a: &ArrayBase<S, Ix2>) -> Result<Array2<f64>>
where
    S: Data<Elem = f64>,
{
    let (nrows, ncols) = a.dim();
    if nrows != ncols {
        return Err(Error::invalid_dimension(nrows, ncols));
    }
    a.cholesky()
        .map_err(|e| Error::DegenerateCovariance(e.to_string()))
}

/// Determinant and log-determinant from a lower Cholesky factor
pub fn determinant(l: &Array2<f64>) -> Result<(f64, f64)> {
    let diag = l.diag();
    let det = diag.iter().map(|x| x * x).product::<f64>();
    let log_det = 2.0 * diag.iter().map(|x| x.ln()).sum::<f64>();
    if !log_det.is_finite() {
        return Err(Error::DegenerateCovariance(format!(
            "non-finite log-determinant {}",
            log_det
        )));
    }
    Ok((det, log_det))
}

/// Invert `a` through its Cholesky factor: solve `L Y = I`, then `Lᵗ X = Y`.
pub fn inverse_from_cholesky(l: &Array2<f64>) -> Result<Array2<f64>> {
    let eye = Array2::<f64>::eye(l.nrows());
    let y = l.solve_triangular(&eye, UPLO::Lower)?;
    let inv = l.t().solve_triangular(&y, UPLO::Upper)?;
    Ok(inv)
}

/// Factorize a covariance matrix once and return everything the divergence needs
pub fn spd_factors<S>(a: &ArrayBase<S, Ix2>) -> Result<SpdFactors>
where
    S: Data<Elem = f64>,
{
    let l = cholesky(a)?;
    let (det, log_det) = determinant(&l)?;
    let inv = inverse_from_cholesky(&l)?;
    Ok(SpdFactors { inv, det, log_det })
}
