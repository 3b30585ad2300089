//! Error types for mixture construction and reduction.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or reducing a Gaussian mixture.
#[derive(Debug, Error)]
pub enum Error {
    /// Mean and covariance (or inverse, or weights) do not agree in size.
    #[error("Invalid dimension: expected {expected}, found {found}")]
    InvalidDimension {
        /// Dimension implied by the rest of the object
        expected: usize,
        /// Dimension actually provided
        found: usize,
    },

    /// The covariance matrix could not be factorized.
    #[error("Degenerate covariance: {0}")]
    DegenerateCovariance(String),

    /// The mixture holds no components, or its weights sum to zero.
    #[error("Mixture is empty or carries no weight")]
    EmptyMixture,

    /// A weight was negative or NaN.
    #[error("Invalid weight {weight} at index {index}")]
    NegativeWeight {
        /// Position of the offending weight
        index: usize,
        /// The offending value
        weight: f64,
    },

    /// The input mixture and the initial guess live in different spaces.
    #[error("Incompatible mixtures: input has dimension {input}, model has dimension {model}")]
    IncompatibleMixtures {
        /// Dimension of the input mixture
        input: usize,
        /// Dimension of the initial guess
        model: usize,
    },

    /// The clustering functional became NaN or infinite.
    #[error("Non-finite distance in cycle {cycle}")]
    NonFiniteDistance {
        /// Cycle in which the value was observed
        cycle: usize,
    },

    /// An iteration cap, tolerance or pruning threshold that cannot be used.
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    /// Any other failure reported by the linear algebra backend.
    #[error("Linear algebra error: {0}")]
    Linalg(#[from] linfa_linalg::LinalgError),
}

impl Error {
    /// Create an InvalidDimension error.
    pub fn invalid_dimension(expected: usize, found: usize) -> Self {
        Self::InvalidDimension { expected, found }
    }
}
