//! Trajectories and cost components extracted from an optimal solution.
//!
//! Money is reported in USD, not in the scaled units of the objective. The total discounted cost
//! is recomputed from its components rather than read back from the objective value.
use crate::commodity::Commodity;
use crate::config::RunConfig;
use crate::optimisation::VariableMap;
use crate::optimisation::costs::{metallics_price, scenario_opex_per_tonne};
use crate::route::{RouteID, RouteKind};
use crate::scenario::Scenario;
use crate::snapshot::ParameterSnapshot;
use crate::solver::Solution;
use crate::units::{Capacity, Dimensionless, MegaTonnes, MegaTonnesCO2, Money, MoneyPerTonneCO2};
use anyhow::Result;
use serde::Serialize;

/// Results for one route in one year
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteYearResult {
    /// The route
    pub route_id: RouteID,
    /// The year
    pub year: u32,
    /// Output
    pub production: MegaTonnes,
    /// Installed capacity
    pub capacity: Capacity,
    /// Number of modules built (whole numbers up to solver tolerance if builds are integer)
    pub builds: f64,
}

/// System-wide results for one year
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnualResult {
    /// The year
    pub year: u32,
    /// Steel demand
    pub demand: MegaTonnes,
    /// Direct emissions, net of carbon capture
    pub emissions: MegaTonnesCO2,
    /// Free allocation
    pub free_allocation: MegaTonnesCO2,
    /// Emissions in excess of free allocation
    pub ets_liability: MegaTonnesCO2,
    /// The scenario's carbon price
    pub carbon_price: MoneyPerTonneCO2,
    /// Cost of ETS liability (undiscounted)
    pub ets_cost: Money,
    /// Capital cost of modules built (undiscounted)
    pub capex: Money,
    /// Fixed operating cost of installed capacity (undiscounted)
    pub fixed_opex: Money,
    /// Commodity, alloy and metallics costs (undiscounted)
    pub variable_opex: Money,
    /// Discount factor applied to this year's costs
    pub discount_factor: Dimensionless,
    /// Scrap charged to melting routes
    pub scrap_charged: MegaTonnes,
    /// Imported HBI charged to melting routes
    pub hbi_import: MegaTonnes,
    /// Reduced iron produced by reduction routes
    pub dri_use: MegaTonnes,
}

impl AnnualResult {
    /// The undiscounted cost of the year
    pub fn total_cost(&self) -> Money {
        self.capex + self.fixed_opex + self.variable_opex + self.ets_cost
    }
}

/// Discounted cost components summed over the horizon
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CostSummary {
    /// Capital expenditure
    pub capex: Money,
    /// Fixed operating expenditure
    pub fixed_opex: Money,
    /// Variable operating expenditure
    pub variable_opex: Money,
    /// ETS cost
    pub ets_cost: Money,
}

impl CostSummary {
    /// Total discounted cost
    pub fn total(&self) -> Money {
        self.capex + self.fixed_opex + self.variable_opex + self.ets_cost
    }

    fn add_discounted(&mut self, annual: &AnnualResult) {
        let df = annual.discount_factor;
        self.capex += annual.capex * df;
        self.fixed_opex += annual.fixed_opex * df;
        self.variable_opex += annual.variable_opex * df;
        self.ets_cost += annual.ets_cost * df;
    }
}

/// All results for one solved scenario
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioResults {
    /// Per-route results, ordered by year and then route
    pub routes: Vec<RouteYearResult>,
    /// Per-year results, in year order
    pub annual: Vec<AnnualResult>,
    /// Discounted cost components
    pub costs: CostSummary,
}

impl ScenarioResults {
    /// Annual emissions in year order
    pub fn emissions(&self) -> impl Iterator<Item = MegaTonnesCO2> + '_ {
        self.annual.iter().map(|annual| annual.emissions)
    }

    /// Results for a route, in year order
    pub fn iter_route<'a>(
        &'a self,
        route_id: &'a RouteID,
    ) -> impl Iterator<Item = &'a RouteYearResult> {
        self.routes
            .iter()
            .filter(move |result| &result.route_id == route_id)
    }
}

/// Extract results from an optimal solution.
///
/// # Arguments
///
/// * `snapshot` - The input data the problem was built from
/// * `scenario` - The scenario which was solved
/// * `config` - Options for the run
/// * `variables` - The variables of the problem
/// * `solution` - The optimal solution
pub fn extract_results(
    snapshot: &ParameterSnapshot,
    scenario: &Scenario,
    config: &RunConfig,
    variables: &VariableMap,
    solution: &Solution,
) -> Result<ScenarioResults> {
    let horizon = snapshot.horizon();
    let capture_rate = snapshot.parameters.capture_rate;
    let mut routes = Vec::new();
    let mut annual = Vec::new();
    let mut costs = CostSummary::default();

    for year in horizon.years() {
        let mut emissions = MegaTonnesCO2(0.0);
        let mut capex = Money(0.0);
        let mut fixed_opex = Money(0.0);
        let mut variable_opex = Money(0.0);
        let mut dri_use = MegaTonnes(0.0);

        for route in snapshot.routes.values() {
            let vars = variables.route(&route.id, year);
            let production = MegaTonnes(solution.value(vars.production));
            let capacity = Capacity(solution.value(vars.capacity));
            let builds = solution.value(vars.builds);

            emissions += production * route.net_emission_factor(capture_rate);
            capex += (route.module_size * Dimensionless(builds)).to_tonnes_per_year()
                * route.capital_cost;
            fixed_opex += capacity.to_tonnes_per_year() * route.fixed_opex;
            variable_opex +=
                production.to_tonnes() * scenario_opex_per_tonne(route, snapshot, scenario, year)?;
            if route.kind == RouteKind::Reduction {
                dri_use += production;
            }

            routes.push(RouteYearResult {
                route_id: route.id.clone(),
                year,
                production,
                capacity,
                builds,
            });
        }

        let (scrap_charged, hbi_import) = match variables.metallics(year) {
            Some(metallics) => (
                MegaTonnes(solution.value(metallics.scrap)),
                MegaTonnes(solution.value(metallics.hbi)),
            ),
            None => (MegaTonnes(0.0), MegaTonnes(0.0)),
        };
        if variables.metallics(year).is_some() {
            variable_opex += scrap_charged.to_tonnes()
                * metallics_price(&snapshot.prices, Commodity::Scrap, year)?;
            variable_opex +=
                hbi_import.to_tonnes() * metallics_price(&snapshot.prices, Commodity::Hbi, year)?;
        }

        let ets_liability = MegaTonnesCO2(solution.value(variables.liability(year)));
        let carbon_price = scenario.carbon_price_in(year);
        let result = AnnualResult {
            year,
            demand: snapshot.demand_in(year),
            emissions,
            free_allocation: snapshot.allocation_in(year),
            ets_liability,
            carbon_price,
            ets_cost: ets_liability.to_tonnes() * carbon_price,
            capex,
            fixed_opex,
            variable_opex,
            discount_factor: horizon.discount_factor(year, config.discount_rate),
            scrap_charged,
            hbi_import,
            dri_use,
        };
        costs.add_discounted(&result);
        annual.push(result);
    }

    Ok(ScenarioResults {
        routes,
        annual,
        costs,
    })
}
