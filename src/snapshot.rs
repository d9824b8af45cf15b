//! The parameter snapshot is the immutable, validated bundle of input data for a run.
//!
//! It is loaded once (see [`crate::input::load_snapshot`]) and shared read-only between scenarios.
use crate::budget::CarbonBudget;
use crate::commodity::{Commodity, CommodityPrices};
use crate::input::{check_non_negative, format_items_with_cap};
use crate::route::{RouteKind, RouteMap, TechnologyRoute};
use crate::scenario::ScenarioID;
use crate::units::{Dimensionless, MegaTonnes, MegaTonnesCO2, MoneyPerTonneCO2, UnitType};
use crate::year::{Horizon, YearMap};
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use itertools::Itertools;
use std::ops::RangeInclusive;
use std::path::PathBuf;

pub mod parameters;
pub use parameters::ModelParameters;

/// Carbon price paths, keyed by scenario ID
pub type CarbonPriceMap = IndexMap<ScenarioID, YearMap<MoneyPerTonneCO2>>;

/// Feedstock supply ceilings for one year. `None` means unlimited.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FeedstockLimits {
    /// Scrap available to the firm
    pub scrap_supply: Option<MegaTonnes>,
    /// Maximum imports of hot briquetted iron
    pub hbi_import_capacity: Option<MegaTonnes>,
}

/// Input data for a run
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSnapshot {
    /// Path to model folder
    pub model_path: PathBuf,
    /// Parameters from the model TOML file
    pub parameters: ModelParameters,
    /// Technology routes
    pub routes: RouteMap,
    /// Commodity price paths
    pub prices: CommodityPrices,
    /// Carbon price paths for each scenario
    pub carbon_prices: CarbonPriceMap,
    /// Steel demand in each year
    pub demand: YearMap<MegaTonnes>,
    /// Feedstock limits by year (years without an entry are unlimited)
    pub feedstock_limits: YearMap<FeedstockLimits>,
    /// Free allocation in each year
    pub free_allocation: YearMap<MegaTonnesCO2>,
}

impl ParameterSnapshot {
    /// The model horizon
    pub fn horizon(&self) -> Horizon {
        self.parameters.horizon()
    }

    /// Iterate over the years of the horizon
    pub fn iter_years(&self) -> RangeInclusive<u32> {
        self.horizon().years()
    }

    /// Steel demand in the given year
    pub fn demand_in(&self, year: u32) -> MegaTonnes {
        self.demand[&year]
    }

    /// Free allocation in the given year
    pub fn allocation_in(&self, year: u32) -> MegaTonnesCO2 {
        self.free_allocation[&year]
    }

    /// Feedstock limits in the given year
    pub fn limits_in(&self, year: u32) -> FeedstockLimits {
        self.feedstock_limits.get(&year).copied().unwrap_or_default()
    }

    /// The carbon budget for this snapshot's horizon
    pub fn carbon_budget(&self) -> CarbonBudget {
        CarbonBudget::derive(&self.parameters.carbon_budget, &self.horizon())
    }

    /// Iterate over routes of a given kind
    pub fn routes_of_kind(&self, kind: RouteKind) -> impl Iterator<Item = &TechnologyRoute> {
        self.routes.values().filter(move |route| route.kind == kind)
    }

    /// Whether the metallics balance applies (i.e. there are melting routes)
    pub fn has_melting_routes(&self) -> bool {
        self.routes_of_kind(RouteKind::Melting).next().is_some()
    }

    /// Check the snapshot is complete and consistent
    pub fn validate(&self) -> Result<()> {
        let horizon = self.horizon();

        for route in self.routes.values() {
            check_route(route).with_context(|| format!("Invalid route {}", route.id))?;
        }
        ensure!(
            self.routes.values().any(|route| route.kind.produces_steel()),
            "At least one integrated or melting route is required"
        );
        ensure!(
            self.routes_of_kind(RouteKind::Reduction).next().is_none() || self.has_melting_routes(),
            "Reduction routes require at least one melting route to consume their output"
        );

        check_covers_horizon(&self.demand, &horizon, "Demand")?;
        for demand in self.demand.values() {
            check_non_negative(*demand, "Demand")?;
        }
        check_covers_horizon(&self.free_allocation, &horizon, "Free allocation")?;
        for allocation in self.free_allocation.values() {
            check_non_negative(*allocation, "Free allocation")?;
        }

        let outside = self
            .feedstock_limits
            .keys()
            .filter(|year| !horizon.contains(**year))
            .collect_vec();
        ensure!(
            outside.is_empty(),
            "Feedstock limits given for years outside the horizon: {}",
            format_items_with_cap(outside)
        );

        self.check_prices_available()?;

        ensure!(
            !self.carbon_prices.is_empty(),
            "At least one carbon price scenario is required"
        );

        let budget = self.carbon_budget();
        ensure!(
            budget.total.is_finite() && budget.total > MegaTonnesCO2(0.0),
            "Carbon budget for {}-{} must be greater than zero (got {} MtCO2)",
            horizon.start(),
            horizon.end(),
            budget.total
        );

        Ok(())
    }

    /// Check that every commodity consumed by some route has a price
    fn check_prices_available(&self) -> Result<()> {
        let mut required = self
            .routes
            .values()
            .flat_map(|route| route.iter_inputs().map(|(commodity, _)| commodity))
            .collect::<Vec<_>>();
        if self.has_melting_routes() {
            required.extend([Commodity::Scrap, Commodity::Hbi]);
        }

        for commodity in required.into_iter().unique() {
            if commodity == Commodity::Hydrogen {
                // Which case is needed depends on the run configuration
                ensure!(
                    self.prices.hydrogen_cases().next().is_some(),
                    "Hydrogen is used by a route but no hydrogen price case is given"
                );
            } else {
                ensure!(
                    self.prices.iter_standard().any(|(priced, _)| priced == commodity),
                    "No price given for commodity {commodity}"
                );
            }
        }

        Ok(())
    }
}

/// Check that a route's parameters are in range
fn check_route(route: &TechnologyRoute) -> Result<()> {
    check_non_negative(route.capital_cost, "capital_cost")?;
    check_non_negative(route.fixed_opex, "fixed_opex")?;
    check_non_negative(route.initial_capacity, "initial_capacity")?;
    check_non_negative(route.alloys_cost, "alloys_cost")?;
    check_non_negative(route.emission_factor, "emission_factor")?;
    for (commodity, intensity) in &route.intensities {
        check_non_negative(*intensity, &format!("Intensity for {commodity}"))?;
    }

    ensure!(
        route.module_size.0.is_finite() && route.module_size.0 > 0.0,
        "module_size must be a finite number greater than zero"
    );
    ensure!(
        Dimensionless(0.0) <= route.min_utilisation
            && route.min_utilisation <= route.max_utilisation
            && route.max_utilisation <= Dimensionless(1.0),
        "Utilisation bounds must satisfy 0 <= min_utilisation <= max_utilisation <= 1"
    );

    Ok(())
}

/// Check that a map has an entry for every year of the horizon and none outside it
fn check_covers_horizon<T>(map: &YearMap<T>, horizon: &Horizon, what: &str) -> Result<()> {
    let missing = horizon
        .years()
        .filter(|year| !map.contains_key(year))
        .collect_vec();
    ensure!(
        missing.is_empty(),
        "{what} missing for years: {}",
        format_items_with_cap(missing)
    );
    ensure!(
        map.len() == horizon.len(),
        "{what} given for years outside the horizon"
    );

    Ok(())
}
