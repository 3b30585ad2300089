//! Reduction of large Gaussian mixtures by hierarchical clustering.
//!
//! A mixture with hundreds or thousands of components (for example the output of a
//! sampler or a kernel density estimate) is condensed into a mixture with a prescribed,
//! much smaller number of components. The reduction minimizes the Kullback-Leibler
//! divergence between input and output components with an EM-like fixed point, see
//! [algorithms::hierarchical].
//!
//! ```no_run
//! use gmreduce::prelude::*;
//! use ndarray::{array, Array2};
//!
//! # fn main() -> eyre::Result<()> {
//! let input = GaussianMixture::new(vec![
//!     GaussianComponent::new(array![4.9, 0.1], Array2::eye(2))?,
//!     GaussianComponent::new(array![5.1, -0.1], Array2::eye(2))?,
//!     GaussianComponent::new(array![-5.0, 0.0], Array2::eye(2))?,
//! ])?;
//! let guess = GaussianMixture::new(vec![
//!     GaussianComponent::new(array![0.1, 0.1], Array2::eye(2) * 3.0)?,
//!     GaussianComponent::new(array![-0.1, -0.1], Array2::eye(2) * 3.0)?,
//! ])?;
//!
//! let reduction = Hierarchical::new(&input, guess)?.run(50, 1e-4)?;
//! assert!(reduction.converged());
//! # Ok(())
//! # }
//! ```

pub mod algorithms;
pub mod entrypoints;
pub mod error;
pub mod logger;
pub mod routines;
pub mod structs;

pub use error::{Error, Result};

pub mod prelude {
    pub use crate::algorithms::{Assignment, Hierarchical, Status};
    pub use crate::entrypoints::{reduce, reduce_with_config};
    pub use crate::error::Error;
    pub use crate::routines::divergence::{divergence_matrix, kullback_leibler};
    pub use crate::routines::output::{ClusterCycle, CycleLog, Reduction};
    pub use crate::routines::settings::{self, Settings};
    pub use crate::structs::component::GaussianComponent;
    pub use crate::structs::mixture::GaussianMixture;
    pub use crate::structs::weights::Weights;
}
