//! Post-solve checks on extracted results.
//!
//! Solvers only satisfy constraints to within their own numerical tolerances, so a solution may
//! deviate slightly from the model it came from. Each check here measures that deviation. Small
//! deviations are reported as tolerance warnings and larger ones as violations. Neither changes
//! the status of a scenario.
use crate::commodity::Commodity;
use crate::config::RunConfig;
use crate::optimisation::utilisation_limits;
use crate::route::{RouteID, RouteKind};
use crate::results::{RouteYearResult, ScenarioResults};
use crate::snapshot::ParameterSnapshot;
use indexmap::IndexMap;
use log::warn;
use std::fmt;

/// Deviations at or below this are treated as exact
const EXACT_TOLERANCE: f64 = 1e-9;

/// Deviations above this are violations
pub const TOLERANCE: f64 = 1e-6;

/// How serious a deviation is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    /// The constraint holds only within numerical tolerance
    Tolerance,
    /// The constraint is violated beyond numerical tolerance
    Violation,
}

/// A constraint which did not hold exactly in a solution
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    /// How serious the deviation is
    pub kind: IssueKind,
    /// Which check failed
    pub check: &'static str,
    /// The year concerned
    pub year: u32,
    /// The route concerned, if any
    pub route_id: Option<RouteID>,
    /// Size of the deviation
    pub deviation: f64,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            IssueKind::Tolerance => "holds within tolerance",
            IssueKind::Violation => "violated",
        };
        write!(f, "{} {kind} in {}", self.check, self.year)?;
        if let Some(route_id) = &self.route_id {
            write!(f, " for route {route_id}")?;
        }
        write!(f, " (deviation {:e})", self.deviation)
    }
}

/// Collects issues found by the checks
struct Checker {
    issues: Vec<ValidationIssue>,
}

impl Checker {
    fn check(
        &mut self,
        check: &'static str,
        year: u32,
        route_id: Option<&RouteID>,
        deviation: f64,
    ) {
        if deviation <= EXACT_TOLERANCE {
            return;
        }

        let kind = if deviation <= TOLERANCE {
            IssueKind::Tolerance
        } else {
            IssueKind::Violation
        };

        self.issues.push(ValidationIssue {
            kind,
            check,
            year,
            route_id: route_id.cloned(),
            deviation,
        });
    }
}

/// Check an optimal solution against the model's constraints.
///
/// Every issue found is logged as a warning and returned.
///
/// # Arguments
///
/// * `snapshot` - The input data the problem was built from
/// * `config` - Options for the run
/// * `results` - Results extracted from the solution
pub fn check_solution(
    snapshot: &ParameterSnapshot,
    config: &RunConfig,
    results: &ScenarioResults,
) -> Vec<ValidationIssue> {
    let mut checker = Checker { issues: Vec::new() };
    let by_route: IndexMap<(&RouteID, u32), &RouteYearResult> = results
        .routes
        .iter()
        .map(|result| ((&result.route_id, result.year), result))
        .collect();

    let horizon = snapshot.horizon();
    for route in snapshot.routes.values() {
        let (min, max) = utilisation_limits(route, config);
        for year in horizon.years() {
            let result = by_route[&(&route.id, year)];
            let id = Some(&route.id);

            let previous = horizon
                .previous(year)
                .map_or(route.initial_capacity.0, |prev| {
                    by_route[&(&route.id, prev)].capacity.0
                });
            let expected = previous + route.module_size.0 * result.builds;
            checker.check("Capacity recurrence", year, id, (result.capacity.0 - expected).abs());
            checker.check("Capacity monotonicity", year, id, previous - result.capacity.0);

            let production = result.production.0;
            let capacity = result.capacity.0;
            checker.check("Maximum utilisation", year, id, production - max.0 * capacity);
            checker.check("Minimum utilisation", year, id, min.0 * capacity - production);
            checker.check("Non-negative production", year, id, -production);
            checker.check("Non-negative builds", year, id, -result.builds);
            if config.integer_builds {
                checker.check(
                    "Integer builds",
                    year,
                    id,
                    (result.builds - result.builds.round()).abs(),
                );
            }
        }
    }

    let has_melting = snapshot.has_melting_routes();
    let metallics_yield = snapshot.parameters.metallics_yield.0;
    let min_share = snapshot.parameters.min_high_grade_share.0;
    for annual in &results.annual {
        let year = annual.year;
        let output_of = |kind: RouteKind| -> f64 {
            snapshot
                .routes_of_kind(kind)
                .map(|route| by_route[&(&route.id, year)].production.0)
                .sum()
        };

        let steel = output_of(RouteKind::Integrated) + output_of(RouteKind::Melting);
        checker.check("Demand balance", year, None, (steel - annual.demand.0).abs());

        let liable = annual.emissions.0 - annual.free_allocation.0;
        checker.check("ETS liability", year, None, liable - annual.ets_liability.0);
        checker.check("Non-negative ETS liability", year, None, -annual.ets_liability.0);

        if has_melting {
            let charge = annual.scrap_charged.0 + annual.hbi_import.0 + annual.dri_use.0;
            let melting = output_of(RouteKind::Melting);
            checker.check(
                "Metallics balance",
                year,
                None,
                (melting - metallics_yield * charge).abs(),
            );

            let high_grade = annual.hbi_import.0 + annual.dri_use.0;
            checker.check("Metallics quality", year, None, min_share * charge - high_grade);
        }

        let limits = snapshot.limits_in(year);
        if let Some(supply) = limits.scrap_supply {
            let scrap_used = snapshot
                .routes
                .values()
                .map(|route| {
                    route.intensity(Commodity::Scrap).0 * by_route[&(&route.id, year)].production.0
                })
                .sum::<f64>()
                + annual.scrap_charged.0;
            checker.check("Scrap supply", year, None, scrap_used - supply.0);
        }
        if let Some(capacity) = limits.hbi_import_capacity {
            checker.check("HBI imports", year, None, annual.hbi_import.0 - capacity.0);
        }
    }

    for issue in &checker.issues {
        warn!("{issue}");
    }

    checker.issues
}
