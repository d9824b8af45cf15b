//! Interchangeable solver backends.
//!
//! The model builder emits a [`Problem`], which any [`Solver`] can solve. Backends are stateless:
//! each call to [`Solver::solve`] works on its own copy of the problem, so one solver may be used
//! from several threads at once.
use crate::config::RunConfig;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;

pub mod problem;
pub use problem::{Problem, Variable};
mod clarabel_solver;
use clarabel_solver::ClarabelSolver;
mod highs_solver;
use highs_solver::HighsSolver;

/// An optimal solution
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    objective_value: f64,
    columns: Vec<f64>,
}

impl Solution {
    /// Create a new [`Solution`] from the objective value and column values
    pub fn new(objective_value: f64, columns: Vec<f64>) -> Self {
        Self {
            objective_value,
            columns,
        }
    }

    /// The value of the objective function
    pub fn objective_value(&self) -> f64 {
        self.objective_value
    }

    /// The value of a column
    pub fn value(&self, var: Variable) -> f64 {
        self.columns[var.index()]
    }
}

/// Why an optimal solution could not be returned
#[derive(Debug, Clone, PartialEq)]
pub enum SolveFailure {
    /// The problem has no feasible point
    Infeasible,
    /// The objective is unbounded below
    Unbounded,
    /// The configured time limit was reached before optimality was proven
    Timeout,
    /// The backend failed to run
    SolverError(String),
}

impl fmt::Display for SolveFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveFailure::Infeasible => write!(f, "The problem is infeasible"),
            SolveFailure::Unbounded => write!(f, "The problem is unbounded"),
            SolveFailure::Timeout => write!(f, "The solver reached its time limit"),
            SolveFailure::SolverError(msg) => write!(f, "Solver error: {msg}"),
        }
    }
}

impl Error for SolveFailure {}

/// The result of a solve. Column values are only available if the solve was optimal.
pub type SolveOutcome = Result<Solution, SolveFailure>;

/// A solver backend
pub trait Solver: Send + Sync {
    /// A short name for the backend
    fn name(&self) -> &'static str;

    /// Solve a minimisation problem
    fn solve(&self, problem: &Problem) -> SolveOutcome;
}

/// Options passed to solver backends
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SolverOptions {
    /// Time limit in seconds
    pub time_limit: Option<f64>,
    /// Relative MIP gap
    pub mip_rel_gap: Option<f64>,
}

impl From<&RunConfig> for SolverOptions {
    fn from(config: &RunConfig) -> Self {
        Self {
            time_limit: config.time_limit,
            mip_rel_gap: config.mip_rel_gap,
        }
    }
}

/// The available solver backends
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum SolverKind {
    /// The HiGHS MILP solver
    #[default]
    Highs,
    /// The Clarabel interior-point solver (continuous problems only)
    Clarabel,
}

impl SolverKind {
    /// Whether the backend can handle integer columns
    pub fn supports_integers(self) -> bool {
        matches!(self, SolverKind::Highs)
    }

    /// Create a solver of this kind
    pub fn create(self, options: SolverOptions) -> Box<dyn Solver> {
        match self {
            SolverKind::Highs => Box::new(HighsSolver::new(options)),
            SolverKind::Clarabel => Box::new(ClarabelSolver::new(options)),
        }
    }
}

impl fmt::Display for SolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverKind::Highs => write!(f, "highs"),
            SolverKind::Clarabel => write!(f, "clarabel"),
        }
    }
}
