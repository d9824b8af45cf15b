//! Scenarios combine a carbon price path with technology availability toggles.
use crate::commodity::{Commodity, HydrogenCase};
use crate::config::{RunConfig, ScenarioSelector};
use crate::id::{define_id_getter, define_id_type};
use crate::input::format_items_with_cap;
use crate::route::{RouteID, TechnologyRoute};
use crate::snapshot::ParameterSnapshot;
use crate::units::MoneyPerTonneCO2;
use crate::year::YearMap;
use anyhow::{Result, bail, ensure};
use indexmap::IndexSet;
use itertools::Itertools;

define_id_type! {ScenarioID}

/// A named scenario.
///
/// Each scenario owns its own copy of its carbon price path and toggles, so scenarios share
/// nothing mutable and can be solved in any order.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    /// Name of the scenario (e.g. "NGFS_NetZero2050")
    pub id: ScenarioID,
    /// Carbon price in each year
    pub carbon_price: YearMap<MoneyPerTonneCO2>,
    /// Whether routes relying on carbon capture may be used
    pub capture_enabled: bool,
    /// Routes which may not be used
    pub disabled_routes: IndexSet<RouteID>,
    /// Which hydrogen price case applies
    pub hydrogen_case: HydrogenCase,
}
define_id_getter! {Scenario, ScenarioID}

impl Scenario {
    /// Whether a route may produce and build in this scenario
    pub fn route_available(&self, route: &TechnologyRoute) -> bool {
        !self.disabled_routes.contains(&route.id) && (self.capture_enabled || !route.capture)
    }

    /// Whether new modules of a route may be built in a given year
    pub fn can_build(&self, route: &TechnologyRoute, year: u32) -> bool {
        self.route_available(route) && route.can_build_in(year)
    }

    /// The carbon price in a given year
    pub fn carbon_price_in(&self, year: u32) -> MoneyPerTonneCO2 {
        self.carbon_price[&year]
    }

    /// Check that this scenario can be built from the given snapshot.
    ///
    /// Failures here only affect this scenario.
    pub fn check_inputs(&self, snapshot: &ParameterSnapshot) -> Result<()> {
        let missing = snapshot
            .iter_years()
            .filter(|year| !self.carbon_price.contains_key(year))
            .collect_vec();
        ensure!(
            missing.is_empty(),
            "Carbon price missing for years: {}",
            format_items_with_cap(missing)
        );
        for (year, price) in &self.carbon_price {
            ensure!(
                price.0.is_finite() && price.0 >= 0.0,
                "Carbon price in {year} must be a finite number greater than or equal to zero"
            );
        }

        let unknown = self
            .disabled_routes
            .iter()
            .filter(|id| !snapshot.routes.contains_key(*id))
            .collect_vec();
        ensure!(
            unknown.is_empty(),
            "Unknown routes disabled: {}",
            format_items_with_cap(unknown)
        );

        let needs_hydrogen = snapshot.routes.values().any(|route| {
            self.route_available(route) && route.intensity(Commodity::Hydrogen).0 > 0.0
        });
        if needs_hydrogen && !snapshot.prices.has_price(Commodity::Hydrogen, &self.hydrogen_case) {
            bail!(
                "No hydrogen prices for case '{}' (known cases: {})",
                self.hydrogen_case,
                snapshot.prices.hydrogen_cases().join(", ")
            );
        }

        Ok(())
    }
}

/// Create the scenarios selected for a run.
///
/// Every scenario receives the run's technology toggles and hydrogen case. An unknown scenario in
/// the selector is an error for the whole run.
pub fn scenarios_for_run(
    snapshot: &ParameterSnapshot,
    config: &RunConfig,
) -> Result<Vec<Scenario>> {
    let make = |id: &ScenarioID, carbon_price: &YearMap<MoneyPerTonneCO2>| Scenario {
        id: id.clone(),
        carbon_price: carbon_price.clone(),
        capture_enabled: config.capture_enabled,
        disabled_routes: config.disabled_routes.iter().cloned().collect(),
        hydrogen_case: config.hydrogen_case.clone(),
    };

    match &config.scenario {
        ScenarioSelector::All => Ok(snapshot
            .carbon_prices
            .iter()
            .map(|(id, path)| make(id, path))
            .collect()),
        ScenarioSelector::Single(id) => {
            let Some((id, path)) = snapshot.carbon_prices.get_key_value(id) else {
                bail!(
                    "Unknown scenario '{id}' (available: {})",
                    snapshot.carbon_prices.keys().join(", ")
                );
            };
            Ok(vec![make(id, path)])
        }
    }
}
