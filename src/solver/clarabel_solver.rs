//! The Clarabel backend, for continuous problems.
//!
//! Clarabel solves `min q'x  s.t.  Ax + s = b, s ∈ K`. Equality rows go in a zero cone and all
//! other limits (including column bounds) become rows of a single non-negative cone.
use super::{Problem, SolveFailure, SolveOutcome, Solution, Solver, SolverOptions, Variable};
use clarabel::algebra::CscMatrix;
use clarabel::solver::{
    DefaultSettingsBuilder, DefaultSolver, IPSolver, SolverStatus, SupportedConeT,
};
use log::debug;

/// Solves continuous problems with Clarabel
pub struct ClarabelSolver {
    options: SolverOptions,
}

impl ClarabelSolver {
    /// Create a new [`ClarabelSolver`]
    pub fn new(options: SolverOptions) -> Self {
        Self { options }
    }
}

/// Constraint rows in conic form
#[derive(Default)]
struct ConicRows {
    /// Coefficients for each row
    rows: Vec<Vec<(Variable, f64)>>,
    /// Right-hand side for each row
    rhs: Vec<f64>,
}

impl ConicRows {
    fn push<I>(&mut self, terms: I, rhs: f64)
    where
        I: IntoIterator<Item = (Variable, f64)>,
    {
        self.rows.push(terms.into_iter().collect());
        self.rhs.push(rhs);
    }

    /// Add `terms <= upper`
    fn push_upper(&mut self, terms: &[(Variable, f64)], upper: f64) {
        self.push(terms.iter().copied(), upper);
    }

    /// Add `terms >= lower`, stored as `-terms <= -lower`
    fn push_lower(&mut self, terms: &[(Variable, f64)], lower: f64) {
        self.push(terms.iter().map(|(var, coeff)| (*var, -coeff)), -lower);
    }

    fn len(&self) -> usize {
        self.rhs.len()
    }
}

/// Split a problem into equality rows and non-negative cone rows
fn to_conic_rows(problem: &Problem) -> (ConicRows, ConicRows) {
    let mut zero = ConicRows::default();
    let mut nonneg = ConicRows::default();

    for row in problem.rows() {
        if row.is_equality() {
            zero.push(row.terms.iter().copied(), row.upper);
            continue;
        }
        if row.upper.is_finite() {
            nonneg.push_upper(&row.terms, row.upper);
        }
        if row.lower.is_finite() {
            nonneg.push_lower(&row.terms, row.lower);
        }
    }

    for (idx, column) in problem.columns().iter().enumerate() {
        let terms = [(Variable(idx), 1.0)];
        if column.lower == column.upper {
            zero.push(terms, column.upper);
            continue;
        }
        if column.upper.is_finite() {
            nonneg.push_upper(&terms, column.upper);
        }
        if column.lower.is_finite() {
            nonneg.push_lower(&terms, column.lower);
        }
    }

    (zero, nonneg)
}

/// Assemble the constraint matrix in compressed sparse column format
fn to_csc(num_columns: usize, rows: &[&[(Variable, f64)]]) -> CscMatrix<f64> {
    let mut by_column: Vec<Vec<(usize, f64)>> = vec![Vec::new(); num_columns];
    for (row_idx, terms) in rows.iter().enumerate() {
        for (var, coeff) in *terms {
            by_column[var.index()].push((row_idx, *coeff));
        }
    }

    let mut colptr = Vec::with_capacity(num_columns + 1);
    let mut rowval = Vec::new();
    let mut nzval = Vec::new();
    colptr.push(0);
    for mut entries in by_column {
        entries.sort_by_key(|(row, _)| *row);
        for (row, coeff) in entries {
            rowval.push(row);
            nzval.push(coeff);
        }
        colptr.push(rowval.len());
    }

    CscMatrix::new(rows.len(), num_columns, colptr, rowval, nzval)
}

impl Solver for ClarabelSolver {
    fn name(&self) -> &'static str {
        "clarabel"
    }

    fn solve(&self, problem: &Problem) -> SolveOutcome {
        if problem.has_integer_columns() {
            return Err(SolveFailure::SolverError(
                "Clarabel cannot solve problems with integer columns".into(),
            ));
        }

        let n = problem.num_columns();
        let (zero, nonneg) = to_conic_rows(problem);
        let all_rows: Vec<&[(Variable, f64)]> = zero
            .rows
            .iter()
            .chain(&nonneg.rows)
            .map(Vec::as_slice)
            .collect();
        let a = to_csc(n, &all_rows);
        let b: Vec<f64> = zero.rhs.iter().chain(&nonneg.rhs).copied().collect();
        let q: Vec<f64> = problem.columns().iter().map(|column| column.cost).collect();
        let p = CscMatrix::new(n, n, vec![0; n + 1], Vec::new(), Vec::new());

        let mut cones = Vec::new();
        if !zero.rhs.is_empty() {
            cones.push(SupportedConeT::ZeroConeT(zero.len()));
        }
        if !nonneg.rhs.is_empty() {
            cones.push(SupportedConeT::NonnegativeConeT(nonneg.len()));
        }

        let mut builder = DefaultSettingsBuilder::default();
        builder.verbose(false);
        if let Some(time_limit) = self.options.time_limit {
            builder.time_limit(time_limit);
        }
        let settings = builder
            .build()
            .map_err(|err| SolveFailure::SolverError(format!("Invalid settings: {err:?}")))?;

        let mut solver =
            DefaultSolver::new(&p, &q, &a, &b, &cones, settings).map_err(|err| {
                SolveFailure::SolverError(format!("Could not set up problem: {err:?}"))
            })?;
        solver.solve();

        let solution = &solver.solution;
        debug!("Clarabel finished with status {:?}", solution.status);
        to_outcome(solution.status, solution.obj_val, &solution.x)
    }
}

/// Convert Clarabel's termination status into a solve outcome.
///
/// A solution found only to reduced accuracy is not treated as optimal.
fn to_outcome(status: SolverStatus, objective_value: f64, x: &[f64]) -> SolveOutcome {
    match status {
        SolverStatus::Solved => Ok(Solution::new(objective_value, x.to_vec())),
        SolverStatus::AlmostSolved => Err(SolveFailure::SolverError(
            "Solution found only to reduced accuracy".into(),
        )),
        SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
            Err(SolveFailure::Infeasible)
        }
        SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => {
            Err(SolveFailure::Unbounded)
        }
        SolverStatus::MaxTime => Err(SolveFailure::Timeout),
        status => Err(SolveFailure::SolverError(format!(
            "Could not find optimal result: {status:?}"
        ))),
    }
}
