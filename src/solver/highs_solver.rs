//! The HiGHS backend.
use super::{Problem, SolveFailure, SolveOutcome, Solution, Solver, SolverOptions};
use highs::{HighsModelStatus, RowProblem, Sense};
use log::debug;

/// Solves problems with HiGHS. Supports integer columns.
pub struct HighsSolver {
    options: SolverOptions,
}

impl HighsSolver {
    /// Create a new [`HighsSolver`]
    pub fn new(options: SolverOptions) -> Self {
        Self { options }
    }
}

impl Solver for HighsSolver {
    fn name(&self) -> &'static str {
        "highs"
    }

    fn solve(&self, problem: &Problem) -> SolveOutcome {
        let mut highs_problem = RowProblem::default();
        let cols: Vec<_> = problem
            .columns()
            .iter()
            .map(|column| {
                let bounds = column.lower..=column.upper;
                if column.integer {
                    highs_problem.add_integer_column(column.cost, bounds)
                } else {
                    highs_problem.add_column(column.cost, bounds)
                }
            })
            .collect();
        for row in problem.rows() {
            highs_problem.add_row(
                row.lower..=row.upper,
                row.terms.iter().map(|(var, coeff)| (cols[var.index()], *coeff)),
            );
        }

        let mut model = highs_problem.optimise(Sense::Minimise);
        model.make_quiet();
        if let Some(time_limit) = self.options.time_limit {
            model.set_option("time_limit", time_limit);
        }
        if let Some(gap) = self.options.mip_rel_gap {
            model.set_option("mip_rel_gap", gap);
        }

        let solved = model
            .try_solve()
            .map_err(|status| SolveFailure::SolverError(format!("Incoherent model: {status:?}")))?;
        debug!("HiGHS finished with status {:?}", solved.status());

        match solved.status() {
            HighsModelStatus::Optimal => Ok(Solution::new(
                solved.objective_value(),
                solved.get_solution().columns().to_vec(),
            )),
            HighsModelStatus::Infeasible | HighsModelStatus::UnboundedOrInfeasible => {
                Err(SolveFailure::Infeasible)
            }
            HighsModelStatus::Unbounded => Err(SolveFailure::Unbounded),
            HighsModelStatus::ReachedTimeLimit => Err(SolveFailure::Timeout),
            status => Err(SolveFailure::SolverError(format!(
                "Could not find optimal result: {status:?}"
            ))),
        }
    }
}
