use serde::{Deserialize, Serialize};

pub mod hierarchical;

pub use hierarchical::Hierarchical;

/// How input components are distributed over the model components in the E-step
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Assignment {
    /// Each input component goes wholly to the model component of minimal divergence
    #[default]
    Hard,
    /// Fractional responsibilities proportional to `exp(-KL)`
    ///
    /// Softer than [Assignment::Hard]: two model components seeded on top of each
    /// other can settle on a merged fixed point instead of splitting.
    Soft,
}

impl std::fmt::Display for Assignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Assignment::Hard => write!(f, "hard"),
            Assignment::Soft => write!(f, "soft"),
        }
    }
}

/// Represents the status of the algorithm
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    /// Algorithm has not run yet
    Starting,
    /// Algorithm is currently running
    InProgress,
    /// The clustering functional stopped changing within tolerance
    Converged,
    /// Algorithm stopped due to reaching maximum cycles
    MaxCycles,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Starting => write!(f, "Starting"),
            Status::InProgress => write!(f, "In progress"),
            Status::Converged => write!(f, "Converged"),
            Status::MaxCycles => write!(f, "Maximum cycles reached"),
        }
    }
}
