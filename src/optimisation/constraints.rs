//! Code for adding constraints to the optimisation problem.
use super::{VariableMap, counts_towards_demand, utilisation_limits};
use crate::commodity::Commodity;
use crate::config::RunConfig;
use crate::route::RouteKind;
use crate::scenario::Scenario;
use crate::snapshot::ParameterSnapshot;
use crate::solver::{Problem, Variable};
use crate::units::Dimensionless;
use itertools::Itertools;

/// Add all constraints for a scenario.
///
/// # Arguments
///
/// * `problem` - The optimisation problem
/// * `variables` - The variables in the problem
/// * `snapshot` - Input data
/// * `scenario` - The scenario being built
/// * `config` - Options for the run
pub fn add_model_constraints(
    problem: &mut Problem,
    variables: &VariableMap,
    snapshot: &ParameterSnapshot,
    scenario: &Scenario,
    config: &RunConfig,
) {
    add_capacity_constraints(problem, variables, snapshot);
    add_utilisation_constraints(problem, variables, snapshot, config);
    add_demand_constraints(problem, variables, snapshot);
    add_liability_constraints(problem, variables, snapshot, scenario);
    if snapshot.has_melting_routes() {
        add_metallics_constraints(problem, variables, snapshot);
    }
    add_scrap_supply_constraints(problem, variables, snapshot);
}

/// Capacity in each year is the previous year's capacity plus the modules built that year.
///
/// In the first year, the previous capacity is the route's initial capacity.
fn add_capacity_constraints(
    problem: &mut Problem,
    variables: &VariableMap,
    snapshot: &ParameterSnapshot,
) {
    let horizon = snapshot.horizon();
    for route in snapshot.routes.values() {
        for year in horizon.years() {
            let vars = variables.route(&route.id, year);
            let mut terms = vec![
                (vars.capacity, 1.0),
                (vars.builds, -route.module_size.0),
            ];
            let rhs = if let Some(previous) = horizon.previous(year) {
                terms.push((variables.route(&route.id, previous).capacity, -1.0));
                0.0
            } else {
                route.initial_capacity.0
            };
            problem.add_row(rhs..=rhs, terms);
        }
    }
}

/// Production is limited by installed capacity (and bounded below where a route has a minimum
/// utilisation)
fn add_utilisation_constraints(
    problem: &mut Problem,
    variables: &VariableMap,
    snapshot: &ParameterSnapshot,
    config: &RunConfig,
) {
    for route in snapshot.routes.values() {
        let (min, max) = utilisation_limits(route, config);
        for year in snapshot.iter_years() {
            let vars = variables.route(&route.id, year);
            problem.add_row(..=0.0, [(vars.production, 1.0), (vars.capacity, -max.0)]);
            if min > Dimensionless(0.0) {
                problem.add_row(0.0.., [(vars.production, 1.0), (vars.capacity, -min.0)]);
            }
        }
    }
}

/// Steel output must equal demand in every year
fn add_demand_constraints(
    problem: &mut Problem,
    variables: &VariableMap,
    snapshot: &ParameterSnapshot,
) {
    for year in snapshot.iter_years() {
        let demand = snapshot.demand_in(year).0;
        let terms = snapshot
            .routes
            .values()
            .filter(|route| counts_towards_demand(route))
            .map(|route| (variables.route(&route.id, year).production, 1.0))
            .collect_vec();
        problem.add_row(demand..=demand, terms);
    }
}

/// ETS liability must cover net emissions in excess of free allocation.
///
/// Together with the non-negativity of the liability variable, this gives
/// `liability >= max(0, emissions - allocation)`.
fn add_liability_constraints(
    problem: &mut Problem,
    variables: &VariableMap,
    snapshot: &ParameterSnapshot,
    scenario: &Scenario,
) {
    let capture_rate = snapshot.parameters.capture_rate;
    for year in snapshot.iter_years() {
        let mut terms = vec![(variables.liability(year), 1.0)];
        for route in snapshot.routes.values() {
            let factor = route.net_emission_factor(capture_rate);
            if scenario.route_available(route) {
                terms.push((variables.route(&route.id, year).production, -factor.0));
            }
        }
        let allocation = snapshot.allocation_in(year).0;
        problem.add_row(-allocation.., terms);
    }
}

/// Metallics balance and quality floor for melting routes.
///
/// Melting output is the metallics yield times the metallics charged (scrap, imported HBI and
/// reduced iron from reduction routes). The high-grade share of the charge (HBI and reduced iron)
/// must meet the minimum share.
fn add_metallics_constraints(
    problem: &mut Problem,
    variables: &VariableMap,
    snapshot: &ParameterSnapshot,
) {
    let metallics_yield = snapshot.parameters.metallics_yield.0;
    let min_share = snapshot.parameters.min_high_grade_share.0;

    for year in snapshot.iter_years() {
        let Some(metallics) = variables.metallics(year) else {
            continue;
        };
        let production_of = |kind: RouteKind| -> Vec<Variable> {
            snapshot
                .routes_of_kind(kind)
                .map(|route| variables.route(&route.id, year).production)
                .collect()
        };
        let melting = production_of(RouteKind::Melting);
        let reduced_iron = production_of(RouteKind::Reduction);

        let mut balance = melting.iter().map(|var| (*var, 1.0)).collect_vec();
        balance.push((metallics.scrap, -metallics_yield));
        balance.push((metallics.hbi, -metallics_yield));
        balance.extend(reduced_iron.iter().map(|var| (*var, -metallics_yield)));
        problem.add_row(0.0..=0.0, balance);

        if min_share > 0.0 {
            let mut quality = vec![
                (metallics.hbi, 1.0 - min_share),
                (metallics.scrap, -min_share),
            ];
            quality.extend(reduced_iron.iter().map(|var| (*var, 1.0 - min_share)));
            problem.add_row(0.0.., quality);
        }
    }
}

/// Scrap consumed by all routes (as an intensity or charged to melting routes) is limited by
/// supply, in years where a limit is given
fn add_scrap_supply_constraints(
    problem: &mut Problem,
    variables: &VariableMap,
    snapshot: &ParameterSnapshot,
) {
    for year in snapshot.iter_years() {
        let Some(supply) = snapshot.limits_in(year).scrap_supply else {
            continue;
        };

        let mut terms = snapshot
            .routes
            .values()
            .map(|route| {
                let intensity = route.intensity(Commodity::Scrap);
                (variables.route(&route.id, year).production, intensity.0)
            })
            .filter(|(_, coeff)| *coeff > 0.0)
            .collect_vec();
        if let Some(metallics) = variables.metallics(year) {
            terms.push((metallics.scrap, 1.0));
        }
        if !terms.is_empty() {
            problem.add_row(..=supply.0, terms);
        }
    }
}
