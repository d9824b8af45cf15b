//! Run a set of scenarios, isolating failures in each.
//!
//! Every scenario goes through the same steps: build the problem, solve it, extract results,
//! check the solution and evaluate it against the carbon budget. A failure in one scenario is
//! recorded in that scenario's status and never affects the others.
use crate::budget::{CarbonBudget, ComplianceReport, evaluate_compliance};
use crate::config::RunConfig;
use crate::optimisation::build_model;
use crate::results::{ScenarioResults, extract_results};
use crate::scenario::{Scenario, ScenarioID};
use crate::snapshot::ParameterSnapshot;
use crate::solver::{SolveFailure, SolverOptions};
use crate::validation::{ValidationIssue, check_solution};
use log::{info, warn};
use rayon::prelude::*;
use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};

/// The outcome of running a single scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioStatus {
    /// An optimal solution was found
    Optimal,
    /// The problem has no feasible solution
    Infeasible,
    /// The objective is unbounded
    Unbounded,
    /// The solver reached its time limit
    Timeout,
    /// The solver failed to run
    SolverError,
    /// The scenario's inputs were invalid, so no problem was built
    DataValidation,
}

impl ScenarioStatus {
    /// Whether results are available
    pub fn is_success(self) -> bool {
        self == ScenarioStatus::Optimal
    }
}

impl fmt::Display for ScenarioStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ScenarioStatus::Optimal => "optimal",
            ScenarioStatus::Infeasible => "infeasible",
            ScenarioStatus::Unbounded => "unbounded",
            ScenarioStatus::Timeout => "timeout",
            ScenarioStatus::SolverError => "solver_error",
            ScenarioStatus::DataValidation => "data_validation",
        };
        write!(f, "{label}")
    }
}

impl From<&SolveFailure> for ScenarioStatus {
    fn from(failure: &SolveFailure) -> Self {
        match failure {
            SolveFailure::Infeasible => ScenarioStatus::Infeasible,
            SolveFailure::Unbounded => ScenarioStatus::Unbounded,
            SolveFailure::Timeout => ScenarioStatus::Timeout,
            SolveFailure::SolverError(_) => ScenarioStatus::SolverError,
        }
    }
}

/// The results of running one scenario
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// The scenario
    pub scenario_id: ScenarioID,
    /// How the scenario ended
    pub status: ScenarioStatus,
    /// Description of the failure, if the scenario failed
    pub message: Option<String>,
    /// Extracted results (only if optimal)
    pub results: Option<ScenarioResults>,
    /// Comparison with the carbon budget (only if optimal)
    pub compliance: Option<ComplianceReport>,
    /// Issues found when checking the solution
    pub issues: Vec<ValidationIssue>,
    /// Wall-clock time taken
    pub runtime: Duration,
}

impl ScenarioResult {
    fn failed(scenario_id: ScenarioID, status: ScenarioStatus, message: String) -> Self {
        Self {
            scenario_id,
            status,
            message: Some(message),
            results: None,
            compliance: None,
            issues: Vec::new(),
            runtime: Duration::ZERO,
        }
    }
}

/// Overall status of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    /// Every scenario was solved
    Complete,
    /// Some scenarios were solved
    Partial,
    /// No scenario was solved
    Failed,
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchStatus::Complete => write!(f, "complete"),
            BatchStatus::Partial => write!(f, "partial"),
            BatchStatus::Failed => write!(f, "failed"),
        }
    }
}

/// The results of running a set of scenarios
#[derive(Debug, Clone)]
pub struct BatchResult {
    /// Results for each scenario, in the order the scenarios were given
    pub scenarios: Vec<ScenarioResult>,
    /// The carbon budget each scenario was evaluated against
    pub budget: CarbonBudget,
}

impl BatchResult {
    /// Overall status of the batch
    pub fn status(&self) -> BatchStatus {
        let solved = self
            .scenarios
            .iter()
            .filter(|result| result.status.is_success())
            .count();
        if solved == 0 {
            BatchStatus::Failed
        } else if solved == self.scenarios.len() {
            BatchStatus::Complete
        } else {
            BatchStatus::Partial
        }
    }

    /// Get the result for a scenario by ID
    pub fn get(&self, scenario_id: &str) -> Option<&ScenarioResult> {
        self.scenarios
            .iter()
            .find(|result| &*result.scenario_id.0 == scenario_id)
    }
}

/// Run every scenario and collect the results.
///
/// Scenarios are run in parallel if the configuration asks for it. Either way, the results are
/// in the same order as `scenarios`.
///
/// # Arguments
///
/// * `snapshot` - Validated input data, shared read-only by all scenarios
/// * `scenarios` - The scenarios to run
/// * `config` - Options for the run
/// * `budget` - The carbon budget to evaluate each scenario against
pub fn run_batch(
    snapshot: &ParameterSnapshot,
    scenarios: &[Scenario],
    config: &RunConfig,
    budget: &CarbonBudget,
) -> BatchResult {
    let run = |scenario: &Scenario| run_scenario(snapshot, scenario, config, budget);
    let results: Vec<_> = if config.parallel {
        info!("Running {} scenarios in parallel", scenarios.len());
        scenarios.par_iter().map(run).collect()
    } else {
        scenarios.iter().map(run).collect()
    };

    BatchResult {
        scenarios: results,
        budget: budget.clone(),
    }
}

/// Run a single scenario from start to finish
pub fn run_scenario(
    snapshot: &ParameterSnapshot,
    scenario: &Scenario,
    config: &RunConfig,
    budget: &CarbonBudget,
) -> ScenarioResult {
    let start = Instant::now();
    let mut result = run_scenario_inner(snapshot, scenario, config, budget);
    result.runtime = start.elapsed();

    match &result.message {
        None => info!(
            "Scenario {} solved in {:.2}s",
            scenario.id,
            result.runtime.as_secs_f64()
        ),
        Some(message) => warn!("Scenario {} failed ({}): {message}", scenario.id, result.status),
    }

    result
}

fn run_scenario_inner(
    snapshot: &ParameterSnapshot,
    scenario: &Scenario,
    config: &RunConfig,
    budget: &CarbonBudget,
) -> ScenarioResult {
    let id = scenario.id.clone();
    let model = match build_model(snapshot, scenario, config) {
        Ok(model) => model,
        Err(err) => {
            return ScenarioResult::failed(id, ScenarioStatus::DataValidation, format!("{err:#}"));
        }
    };

    // Each scenario gets its own solver instance
    let solver = config.solver.create(SolverOptions::from(config));
    info!("Solving scenario {} with {}", scenario.id, solver.name());
    let solution = match solver.solve(&model.problem) {
        Ok(solution) => solution,
        Err(failure) => {
            return ScenarioResult::failed(id, ScenarioStatus::from(&failure), failure.to_string());
        }
    };

    let results = match extract_results(snapshot, scenario, config, &model.variables, &solution) {
        Ok(results) => results,
        Err(err) => {
            return ScenarioResult::failed(id, ScenarioStatus::DataValidation, format!("{err:#}"));
        }
    };
    let issues = check_solution(snapshot, config, &results);
    let compliance = evaluate_compliance(results.emissions(), budget);

    ScenarioResult {
        scenario_id: id,
        status: ScenarioStatus::Optimal,
        message: None,
        results: Some(results),
        compliance: Some(compliance),
        issues,
        runtime: Duration::ZERO,
    }
}
