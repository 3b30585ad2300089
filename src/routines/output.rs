use crate::algorithms::Status;
use crate::structs::mixture::GaussianMixture;
use serde::Serialize;

/// A [ClusterCycle] object contains the summary of a cycle
/// It holds the following information:
/// - `cycle`: The cycle number
/// - `distance`: The clustering functional after the cycle
/// - `delta`: The relative decrease of the functional from the previous cycle
/// - `ncomp`: The number of model components that survived the cycle
/// - `status`: The status of the algorithm after the cycle
#[derive(Debug, Clone, Serialize)]
pub struct ClusterCycle {
    cycle: usize,
    distance: f64,
    delta: f64,
    ncomp: usize,
    status: Status,
}

impl ClusterCycle {
    pub fn new(cycle: usize, distance: f64, delta: f64, ncomp: usize, status: Status) -> Self {
        Self {
            cycle,
            distance,
            delta,
            ncomp,
            status,
        }
    }

    pub fn cycle(&self) -> usize {
        self.cycle
    }
    pub fn distance(&self) -> f64 {
        self.distance
    }
    pub fn delta(&self) -> f64 {
        self.delta
    }
    pub fn ncomp(&self) -> usize {
        self.ncomp
    }
    pub fn status(&self) -> &Status {
        &self.status
    }
}

/// This holds a vector of [ClusterCycle] objects to provide a more detailed log
#[derive(Debug, Clone, Serialize, Default)]
pub struct CycleLog {
    cycles: Vec<ClusterCycle>,
}

impl CycleLog {
    pub fn new() -> Self {
        Self { cycles: Vec::new() }
    }

    pub fn cycles(&self) -> &[ClusterCycle] {
        &self.cycles
    }

    pub fn push(&mut self, cycle: ClusterCycle) {
        self.cycles.push(cycle);
    }

    pub fn last(&self) -> Option<&ClusterCycle> {
        self.cycles.last()
    }

    pub fn len(&self) -> usize {
        self.cycles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cycles.is_empty()
    }
}

/// The outcome of a hierarchical reduction
///
/// The mixture is always usable, even when the run stopped at the iteration cap;
/// check [Reduction::converged] to tell the two apart.
#[derive(Debug, Clone)]
pub struct Reduction {
    mixture: GaussianMixture,
    status: Status,
    cycles: usize,
    distance: f64,
    cycle_log: CycleLog,
}

impl Reduction {
    pub fn new(
        mixture: GaussianMixture,
        status: Status,
        cycles: usize,
        distance: f64,
        cycle_log: CycleLog,
    ) -> Self {
        Self {
            mixture,
            status,
            cycles,
            distance,
            cycle_log,
        }
    }

    pub fn mixture(&self) -> &GaussianMixture {
        &self.mixture
    }

    pub fn into_mixture(self) -> GaussianMixture {
        self.mixture
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn converged(&self) -> bool {
        self.status == Status::Converged
    }

    /// Number of cycles that were run
    pub fn cycles(&self) -> usize {
        self.cycles
    }

    /// Final value of the clustering functional
    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn cycle_log(&self) -> &CycleLog {
        &self.cycle_log
    }
}
