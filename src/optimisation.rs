//! The model builder: turns a parameter snapshot and a scenario into an optimisation problem.
//!
//! For every route and year there are production, capacity and build variables; for every year
//! there is an ETS liability variable and, when melting routes exist, variables for scrap charged
//! and imported HBI. Every variable exists in every scenario. Routes which are unavailable in a
//! scenario have their variables fixed to zero rather than removed.
use crate::commodity::Commodity;
use crate::config::RunConfig;
use crate::route::{RouteID, TechnologyRoute};
use crate::scenario::Scenario;
use crate::snapshot::ParameterSnapshot;
use crate::solver::{Problem, Variable};
use crate::units::{Capacity, Dimensionless, MegaTonnes, MegaTonnesCO2, Money, UnitType};
use crate::year::YearMap;
use anyhow::{Context, Result};
use indexmap::IndexMap;
use log::debug;

mod constraints;
use constraints::add_model_constraints;
pub mod costs;
use costs::{metallics_price, scenario_opex_per_tonne};

/// Factor applied to money in the objective, so that it is in billions of USD
pub const OBJECTIVE_SCALE: f64 = 1e-9;

/// Objective cost per MtCO2 of ETS liability, in scaled units.
///
/// Keeps liability at its lower bound in years where the carbon price is zero.
const LIABILITY_TIE_BREAK: f64 = 1e-6;

/// Variables for a single route in a single year
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteVariables {
    /// Output (Mt)
    pub production: Variable,
    /// Installed capacity at the end of the year (Mt/yr)
    pub capacity: Variable,
    /// Number of modules built during the year
    pub builds: Variable,
}

/// Variables for metallics charged to melting routes in a single year
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetallicsVariables {
    /// Scrap charged (Mt)
    pub scrap: Variable,
    /// Imported HBI charged (Mt)
    pub hbi: Variable,
}

/// A map for easy lookup of variables in the problem.
///
/// The entries are ordered by year and then by route, in the order routes appear in the snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableMap {
    routes: IndexMap<(RouteID, u32), RouteVariables>,
    liability: YearMap<Variable>,
    metallics: YearMap<MetallicsVariables>,
}

impl VariableMap {
    /// Variables for a route in a given year
    pub fn route(&self, route_id: &RouteID, year: u32) -> RouteVariables {
        self.routes[&(route_id.clone(), year)]
    }

    /// The ETS liability variable for a year
    pub fn liability(&self, year: u32) -> Variable {
        self.liability[&year]
    }

    /// The metallics variables for a year, if there are melting routes
    pub fn metallics(&self, year: u32) -> Option<MetallicsVariables> {
        self.metallics.get(&year).copied()
    }
}

/// A problem ready to be solved, with the map needed to interpret its solution
#[derive(Debug, Clone)]
pub struct BuiltModel {
    /// The optimisation problem
    pub problem: Problem,
    /// The variables of the problem
    pub variables: VariableMap,
}

/// Scale a discounted amount of money for use as an objective coefficient
fn objective_coeff(cost: Money, discount_factor: Dimensionless) -> f64 {
    (cost * discount_factor).0 * OBJECTIVE_SCALE
}

/// The effective utilisation limits of a route in a run
pub fn utilisation_limits(
    route: &TechnologyRoute,
    config: &RunConfig,
) -> (Dimensionless, Dimensionless) {
    let max = route.max_utilisation.min(config.max_utilisation);
    let min = route.min_utilisation.min(max);

    (min, max)
}

/// Build the optimisation problem for one scenario.
///
/// The returned problem may be infeasible (e.g. if demand cannot be met within feedstock limits);
/// that is only discovered when it is solved.
///
/// # Arguments
///
/// * `snapshot` - Validated input data
/// * `scenario` - The scenario to build
/// * `config` - Options for the run
///
/// # Returns
///
/// The model, or an error if the scenario's input data is incomplete
pub fn build_model(
    snapshot: &ParameterSnapshot,
    scenario: &Scenario,
    config: &RunConfig,
) -> Result<BuiltModel> {
    scenario
        .check_inputs(snapshot)
        .with_context(|| format!("Invalid inputs for scenario {}", scenario.id))?;

    let mut problem = Problem::default();
    let variables = add_variables(&mut problem, snapshot, scenario, config)?;
    add_model_constraints(&mut problem, &variables, snapshot, scenario, config);
    debug!(
        "Built model for scenario {} with {} columns and {} rows",
        scenario.id,
        problem.num_columns(),
        problem.num_rows()
    );

    Ok(BuiltModel { problem, variables })
}

/// Add all variables to the problem, with their objective coefficients and bounds
fn add_variables(
    problem: &mut Problem,
    snapshot: &ParameterSnapshot,
    scenario: &Scenario,
    config: &RunConfig,
) -> Result<VariableMap> {
    let horizon = snapshot.horizon();
    let mut variables = VariableMap::default();
    let has_melting = snapshot.has_melting_routes();

    for year in horizon.years() {
        let df = horizon.discount_factor(year, config.discount_rate);

        for route in snapshot.routes.values() {
            let opex = scenario_opex_per_tonne(route, snapshot, scenario, year)?;
            let production_cost = MegaTonnes(1.0).to_tonnes() * opex;
            let production = problem.add_column(objective_coeff(production_cost, df), 0.0..);

            let capacity_cost = Capacity(1.0).to_tonnes_per_year() * route.fixed_opex;
            let capacity = problem.add_column(objective_coeff(capacity_cost, df), 0.0..);

            let build_cost = route.module_size.to_tonnes_per_year() * route.capital_cost;
            let build_coeff = objective_coeff(build_cost, df);
            let builds = if config.integer_builds {
                problem.add_integer_column(build_coeff, 0.0..)
            } else {
                problem.add_column(build_coeff, 0.0..)
            };

            if !scenario.route_available(route) {
                problem.fix_column(production, 0.0);
            }
            if !scenario.can_build(route, year) {
                problem.fix_column(builds, 0.0);
            }

            variables.routes.insert(
                (route.id.clone(), year),
                RouteVariables {
                    production,
                    capacity,
                    builds,
                },
            );
        }

        let liability_cost = MegaTonnesCO2(1.0).to_tonnes() * scenario.carbon_price_in(year);
        let liability = problem.add_column(
            objective_coeff(liability_cost, df) + LIABILITY_TIE_BREAK,
            0.0..,
        );
        variables.liability.insert(year, liability);

        if has_melting {
            let scrap_price = metallics_price(&snapshot.prices, Commodity::Scrap, year)?;
            let scrap_cost = MegaTonnes(1.0).to_tonnes() * scrap_price;
            let scrap = problem.add_column(objective_coeff(scrap_cost, df), 0.0..);

            let hbi_price = metallics_price(&snapshot.prices, Commodity::Hbi, year)?;
            let hbi_cost = MegaTonnes(1.0).to_tonnes() * hbi_price;
            let hbi_limit = snapshot
                .limits_in(year)
                .hbi_import_capacity
                .map_or(f64::INFINITY, |limit| limit.0);
            let hbi = problem.add_column(objective_coeff(hbi_cost, df), 0.0..=hbi_limit);

            variables
                .metallics
                .insert(year, MetallicsVariables { scrap, hbi });
        }
    }

    Ok(variables)
}

/// Whether output of a route counts towards steel demand
fn counts_towards_demand(route: &TechnologyRoute) -> bool {
    route.kind.produces_steel()
}
