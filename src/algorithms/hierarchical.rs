//! Hierarchical clustering of a large Gaussian mixture into a small one.
//!
//! The input mixture (many components) is held fixed. The model mixture (few components,
//! seeded from an initial guess) is refined by an EM-like fixed point over the
//! Kullback-Leibler divergence between input and model components:
//!
//! **E-step**: for every input component `i` and model component `k` compute
//! `KL(input_i ‖ model_k)` and turn each row into responsibilities `r_ik`
//! (hard, the default: one for the closest model component; soft: `r_ik ∝ exp(-KL_ik)`).
//!
//! **M-step**: moment matching. With `m_ik = w_i r_ik` and `W_k = Σ_i m_ik`:
//! ```text
//! w_k = W_k
//! μ_k = Σ_i m_ik μ_i / W_k
//! Σ_k = Σ_i m_ik (Σ_i + (μ_i - μ_k)(μ_i - μ_k)ᵗ) / W_k
//! ```
//!
//! The model weights are then normalized and components whose weight fell to
//! the pruning threshold are removed. The run stops when the clustering functional
//! `Σ_i w_i Σ_k r_ik KL_ik` changes by less than the relative tolerance, or when
//! the iteration cap is reached. An increase of the functional beyond rounding
//! noise never counts as convergence.

use crate::algorithms::{Assignment, Status};
use crate::error::{Error, Result};
use crate::routines::divergence::divergence_matrix;
use crate::routines::output::{ClusterCycle, CycleLog, Reduction};
use crate::routines::settings::{Config, Settings};
use crate::structs::component::GaussianComponent;
use crate::structs::mixture::{outer, GaussianMixture};
use ndarray::{Array1, Array2};
use ndarray_stats::QuantileExt;
use rayon::prelude::*;

/// Relative increase of the functional tolerated as floating point noise
const INCREASE_TOLERANCE: f64 = 1e-13;

/// The hierarchical clustering engine
///
/// The input mixture is borrowed read-only for the lifetime of the engine. The
/// initial guess is moved in and becomes the model, which is replaced by a freshly
/// built mixture at the end of every cycle and returned by [Hierarchical::fit].
/// Callers that need the initial guess afterwards must keep their own clone.
#[derive(Debug)]
pub struct Hierarchical<'a> {
    input: &'a GaussianMixture,
    model: GaussianMixture,
    config: Config,
    cycle: usize,
    distance: f64,
    status: Status,
    cycle_log: CycleLog,
}

impl<'a> Hierarchical<'a> {
    /// Set up a reduction of `input` seeded with `initial_guess`
    ///
    /// Both mixtures must be non-empty and of the same dimension, and the input
    /// weights must be non-negative with a positive total.
    pub fn new(input: &'a GaussianMixture, initial_guess: GaussianMixture) -> Result<Self> {
        if input.is_empty() || initial_guess.is_empty() {
            return Err(Error::EmptyMixture);
        }
        if input.dim() != initial_guess.dim() {
            return Err(Error::IncompatibleMixtures {
                input: input.dim(),
                model: initial_guess.dim(),
            });
        }
        if let Some((index, weight)) = input
            .weights()
            .iter()
            .enumerate()
            .find(|(_, w)| !(*w >= 0.0))
        {
            return Err(Error::NegativeWeight { index, weight });
        }
        let total = input.weights().sum();
        if !(total > 0.0) || !total.is_finite() {
            return Err(Error::EmptyMixture);
        }

        Ok(Self {
            input,
            model: initial_guess,
            config: Config::default(),
            cycle: 0,
            distance: f64::MAX,
            status: Status::Starting,
            cycle_log: CycleLog::new(),
        })
    }

    /// Take iteration cap, tolerance, pruning threshold, assignment and verbosity from `settings`
    pub fn with_settings(mut self, settings: &Settings) -> Self {
        self.config = settings.config.clone();
        self
    }

    /// Report every cycle at `info` level
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.config.verbose = verbose;
        self
    }

    pub fn with_assignment(mut self, assignment: Assignment) -> Self {
        self.config.assignment = assignment;
        self
    }

    /// Prune model components whose weight is at or below `min_weight`
    pub fn with_min_weight(mut self, min_weight: f64) -> Self {
        self.config.min_weight = min_weight;
        self
    }

    /// Run to convergence with the given iteration cap and relative tolerance
    pub fn run(mut self, max_iterations: usize, tolerance: f64) -> Result<Reduction> {
        self.config.max_iterations = max_iterations;
        self.config.tolerance = tolerance;
        self.fit()
    }

    /// Run to convergence with the current configuration
    ///
    /// Fails with [Error::InvalidSettings] before any cycle if the configuration
    /// is unusable, see [Config::validate].
    pub fn fit(mut self) -> Result<Reduction> {
        self.config.validate()?;
        if self.config.verbose {
            tracing::info!(
                "Starting hierarchical clustering of {} components into {} components ({} assignment)",
                self.input.len(),
                self.model.len(),
                self.config.assignment
            );
        }
        self.status = Status::InProgress;
        while !self.next_cycle()? {}

        match self.status {
            Status::Converged => tracing::info!(
                "Clustering converged after {} cycles, {} components remain",
                self.cycle,
                self.model.len()
            ),
            _ => tracing::warn!(
                "Clustering did not converge within {} cycles, returning the last model with {} components",
                self.config.max_iterations,
                self.model.len()
            ),
        }

        Ok(self.into_reduction())
    }

    /// Perform one E/M cycle, returning `true` once the run should stop
    ///
    /// Once the iteration cap is reached no further cycle is run and the status
    /// becomes [Status::MaxCycles] unless the run has already converged.
    pub fn next_cycle(&mut self) -> Result<bool> {
        if self.cycle >= self.config.max_iterations {
            if self.status != Status::Converged {
                self.status = Status::MaxCycles;
            }
            return Ok(true);
        }
        self.cycle += 1;
        let span = tracing::debug_span!("cycle", cycle = self.cycle);
        let _enter = span.enter();

        // E-step against a fixed snapshot of the model
        let kl = divergence_matrix(self.input, &self.model)?;
        let resp = self.responsibilities(&kl)?;
        let distance = self.functional(&kl, &resp);
        if !distance.is_finite() {
            return Err(Error::NonFiniteDistance { cycle: self.cycle });
        }

        // M-step builds the replacement model
        let mut model = self.moment_match(&resp)?;
        model.normalize()?;
        let removed = model.prune(self.config.min_weight);
        if !removed.is_empty() {
            if model.is_empty() {
                return Err(Error::EmptyMixture);
            }
            model.normalize()?;
            if self.config.verbose {
                tracing::info!(
                    "Removed components {:?}, {} remain",
                    removed,
                    model.len()
                );
            } else {
                tracing::debug!(
                    "Removed components {:?}, {} remain",
                    removed,
                    model.len()
                );
            }
        }
        self.model = model;

        // Convergence
        let old = self.distance;
        let delta = if distance == old {
            0.0
        } else {
            (old - distance) / old
        };
        let increased = delta < -INCREASE_TOLERANCE;
        if increased {
            tracing::warn!(
                "Clustering functional increased from {:e} to {:e}",
                old,
                distance
            );
        }
        self.distance = distance;

        self.status = if distance == old || (!increased && delta < self.config.tolerance) {
            Status::Converged
        } else if self.cycle >= self.config.max_iterations {
            Status::MaxCycles
        } else {
            Status::InProgress
        };

        if self.config.verbose {
            tracing::info!(
                "Cycle {}: distance {:e}, relative change {:e}, {} components",
                self.cycle,
                distance,
                delta,
                self.model.len()
            );
        } else {
            tracing::debug!(
                "Cycle {}: distance {:e}, relative change {:e}, {} components",
                self.cycle,
                distance,
                delta,
                self.model.len()
            );
        }

        self.cycle_log.push(ClusterCycle::new(
            self.cycle,
            distance,
            delta,
            self.model.len(),
            self.status.clone(),
        ));

        Ok(self.status != Status::InProgress)
    }

    /// Turn every row of the divergence matrix into responsibilities summing to one
    fn responsibilities(&self, kl: &Array2<f64>) -> Result<Array2<f64>> {
        let mut resp = Array2::<f64>::zeros(kl.raw_dim());
        for (i, (row, mut r)) in kl.outer_iter().zip(resp.outer_iter_mut()).enumerate() {
            match self.config.assignment {
                Assignment::Hard => {
                    // Ties resolve to the lowest index
                    let k = row.argmin().map_err(|_| self.non_finite(i))?;
                    r[k] = 1.0;
                }
                Assignment::Soft => {
                    let min = *row.min().map_err(|_| self.non_finite(i))?;
                    if !min.is_finite() {
                        return Err(self.non_finite(i));
                    }
                    // Shift by the row minimum so the best match has exp(0) = 1
                    r.assign(&row.mapv(|d| (min - d).exp()));
                    let norm = r.sum();
                    r /= norm;
                }
            }
        }
        Ok(resp)
    }

    fn non_finite(&self, i: usize) -> Error {
        tracing::warn!(
            "Divergence of input component {} is not finite in cycle {}",
            i,
            self.cycle
        );
        Error::NonFiniteDistance { cycle: self.cycle }
    }

    /// `Σ_i w_i Σ_k r_ik KL_ik`, skipping pairs without responsibility
    fn functional(&self, kl: &Array2<f64>, resp: &Array2<f64>) -> f64 {
        kl.outer_iter()
            .zip(resp.outer_iter())
            .zip(self.input.weights().iter())
            .map(|((kl_i, r_i), w_i)| {
                let expected: f64 = kl_i
                    .iter()
                    .zip(r_i.iter())
                    .filter(|&(_, &r)| r > 0.0)
                    .map(|(d, r)| d * r)
                    .sum();
                w_i * expected
            })
            .sum()
    }

    /// Moment-matched replacement for every model component
    ///
    /// A component that received no mass keeps its old parameters with weight
    /// zero, so it is pruned in the same cycle instead of being divided by zero.
    fn moment_match(&self, resp: &Array2<f64>) -> Result<GaussianMixture> {
        let w = self.input.weights().weights();
        let dim = self.input.dim();

        let updates = (0..self.model.len())
            .into_par_iter()
            .map(|k| {
                let mass: Array1<f64> = &resp.column(k) * w;
                let total = mass.sum();
                if !(total > 0.0) {
                    return Ok((self.model.components()[k].clone(), 0.0));
                }

                let mut mean = Array1::<f64>::zeros(dim);
                for (c, &m) in self.input.components().iter().zip(mass.iter()) {
                    if m > 0.0 {
                        mean.scaled_add(m, c.mean());
                    }
                }
                mean /= total;

                let mut cov = Array2::<f64>::zeros((dim, dim));
                for (c, &m) in self.input.components().iter().zip(mass.iter()) {
                    if m > 0.0 {
                        let dx = c.mean() - &mean;
                        cov.scaled_add(m, c.cov());
                        cov.scaled_add(m, &outer(&dx, &dx));
                    }
                }
                cov /= total;

                Ok((GaussianComponent::new(mean, cov)?, total))
            })
            .collect::<Result<Vec<(GaussianComponent, f64)>>>()?;

        let (components, weights): (Vec<GaussianComponent>, Vec<f64>) = updates.into_iter().unzip();
        GaussianMixture::with_weights(components, weights)
    }

    fn into_reduction(self) -> Reduction {
        Reduction::new(
            self.model,
            self.status,
            self.cycle,
            self.distance,
            self.cycle_log,
        )
    }

    pub fn input(&self) -> &GaussianMixture {
        self.input
    }

    /// The current model mixture
    pub fn model(&self) -> &GaussianMixture {
        &self.model
    }

    pub fn cycle(&self) -> usize {
        self.cycle
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Clustering functional of the last cycle, `f64::MAX` before the first
    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn cycle_log(&self) -> &CycleLog {
        &self.cycle_log
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn unit(mean: Array1<f64>) -> GaussianComponent {
        let d = mean.len();
        GaussianComponent::new(mean, Array2::eye(d)).unwrap()
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let input = GaussianMixture::new(vec![unit(array![0.0, 0.0])]).unwrap();
        let guess = GaussianMixture::new(vec![unit(array![0.0])]).unwrap();
        assert!(matches!(
            Hierarchical::new(&input, guess),
            Err(Error::IncompatibleMixtures { input: 2, model: 1 })
        ));
    }

    #[test]
    fn test_weightless_input_rejected() {
        let input = GaussianMixture::with_weights(vec![unit(array![0.0])], vec![0.0]).unwrap();
        let guess = GaussianMixture::new(vec![unit(array![0.0])]).unwrap();
        assert!(matches!(
            Hierarchical::new(&input, guess),
            Err(Error::EmptyMixture)
        ));
    }

    #[test]
    fn test_soft_responsibilities_sum_to_one() {
        let input = GaussianMixture::new(vec![
            unit(array![-2.0]),
            unit(array![0.0]),
            unit(array![3.0]),
        ])
        .unwrap();
        let guess = GaussianMixture::new(vec![unit(array![-1.0]), unit(array![1.0])]).unwrap();
        let engine = Hierarchical::new(&input, guess)
            .unwrap()
            .with_assignment(Assignment::Soft);
        let kl = divergence_matrix(&input, engine.model()).unwrap();
        let resp = engine.responsibilities(&kl).unwrap();
        for row in resp.outer_iter() {
            assert!((row.sum() - 1.0).abs() < 1e-15);
        }
        // The middle component sits halfway between the two model components
        assert!((resp[[1, 0]] - 0.5).abs() < 1e-15);
        assert!(resp[[0, 0]] > resp[[0, 1]]);
        assert!(resp[[2, 1]] > resp[[2, 0]]);
    }

    #[test]
    fn test_hard_assignment_ties_go_to_first() {
        let input = GaussianMixture::new(vec![unit(array![0.0]), unit(array![2.0])]).unwrap();
        let guess = GaussianMixture::new(vec![unit(array![-1.0]), unit(array![1.0])]).unwrap();
        let engine = Hierarchical::new(&input, guess)
            .unwrap()
            .with_assignment(Assignment::Hard);
        let kl = divergence_matrix(&input, engine.model()).unwrap();
        let resp = engine.responsibilities(&kl).unwrap();
        assert_eq!(resp, array![[1.0, 0.0], [0.0, 1.0]]);
    }

    #[test]
    fn test_moment_match_single_cluster() {
        // One model component absorbs everything: the result is the mixture's own moments
        let input = GaussianMixture::new(vec![unit(array![-1.0, 0.0]), unit(array![1.0, 0.0])]).unwrap();
        let guess = GaussianMixture::new(vec![unit(array![0.0, 0.0])]).unwrap();
        let engine = Hierarchical::new(&input, guess).unwrap();
        let resp = Array2::<f64>::ones((2, 1));
        let model = engine.moment_match(&resp).unwrap();

        let c = &model.components()[0];
        assert!(c.mean()[0].abs() < 1e-15);
        assert!((c.cov()[[0, 0]] - 2.0).abs() < 1e-15);
        assert!((c.cov()[[1, 1]] - 1.0).abs() < 1e-15);
        assert!((model.weights()[0] - 1.0).abs() < 1e-15);
    }

    #[test]
    fn test_component_without_mass_gets_zero_weight() {
        let input = GaussianMixture::new(vec![unit(array![0.0]), unit(array![0.5])]).unwrap();
        let guess = GaussianMixture::new(vec![unit(array![0.0]), unit(array![100.0])]).unwrap();
        let engine = Hierarchical::new(&input, guess).unwrap();
        let resp = array![[1.0, 0.0], [1.0, 0.0]];
        let model = engine.moment_match(&resp).unwrap();
        assert_eq!(model.weights()[1], 0.0);
        assert_eq!(model.components()[1].mean()[0], 100.0);
        assert!(model.weights()[1].is_finite());
    }

    #[test]
    fn test_negative_input_weight_rejected() {
        let mut input = GaussianMixture::new(vec![unit(array![0.0]), unit(array![1.0])]).unwrap();
        input.weights_mut()[1] = -0.25;
        input.weights_mut()[0] = 2.0;
        let guess = GaussianMixture::new(vec![unit(array![0.5])]).unwrap();
        assert!(matches!(
            Hierarchical::new(&input, guess),
            Err(Error::NegativeWeight { index: 1, .. })
        ));
    }

    #[test]
    fn test_nan_input_weight_rejected() {
        let mut input = GaussianMixture::new(vec![unit(array![0.0]), unit(array![1.0])]).unwrap();
        input.weights_mut()[0] = f64::NAN;
        let guess = GaussianMixture::new(vec![unit(array![0.5])]).unwrap();
        assert!(matches!(
            Hierarchical::new(&input, guess),
            Err(Error::NegativeWeight { index: 0, .. })
        ));
    }

    #[test]
    fn test_no_cycle_past_the_cap() {
        let input = GaussianMixture::new(vec![unit(array![0.0]), unit(array![4.0])]).unwrap();
        let guess = GaussianMixture::new(vec![unit(array![1.0]), unit(array![3.0])]).unwrap();
        let mut settings = Settings::new();
        settings.set_max_iterations(1).set_tolerance(0.0);
        let mut engine = Hierarchical::new(&input, guess).unwrap().with_settings(&settings);

        engine.next_cycle().unwrap();
        assert_eq!(engine.cycle(), 1);
        assert!(engine.next_cycle().unwrap());
        assert_eq!(engine.cycle(), 1);
        assert_eq!(engine.cycle_log().len(), 1);
        assert_ne!(engine.status(), &Status::InProgress);
    }
}
