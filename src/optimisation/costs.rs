//! Unit costs used in the objective and when reporting results.
//!
//! All quantities here are per base unit (tonne, tonne-per-year or tonne of CO2). Callers convert
//! megatonne quantities with the explicit conversions in [`crate::units`].
use crate::commodity::{Commodity, CommodityPrices, HydrogenCase};
use crate::route::TechnologyRoute;
use crate::scenario::Scenario;
use crate::snapshot::ParameterSnapshot;
use crate::units::{Intensity, MoneyPerTonne, MoneyPerUnit};
use anyhow::{Context, Result};

/// Variable operating cost of a route per tonne of output in a given year.
///
/// This is the cost of every commodity the route consumes, at that year's price, plus the cost of
/// alloys. Metallics charged to melting routes are costed separately.
pub fn variable_opex_per_tonne(
    route: &TechnologyRoute,
    prices: &CommodityPrices,
    hydrogen_case: &HydrogenCase,
    year: u32,
) -> Result<MoneyPerTonne> {
    let mut cost = route.alloys_cost;
    for (commodity, intensity) in route.iter_inputs() {
        cost += intensity * commodity_price(prices, commodity, hydrogen_case, year)?;
    }

    Ok(cost)
}

/// Variable operating cost of a route per tonne of output in a scenario.
///
/// Routes which are unavailable in the scenario never produce, so their cost is zero and their
/// inputs need not be priced.
pub fn scenario_opex_per_tonne(
    route: &TechnologyRoute,
    snapshot: &ParameterSnapshot,
    scenario: &Scenario,
    year: u32,
) -> Result<MoneyPerTonne> {
    if !scenario.route_available(route) {
        return Ok(MoneyPerTonne(0.0));
    }

    variable_opex_per_tonne(route, &snapshot.prices, &scenario.hydrogen_case, year)
}

/// Cost per tonne of a metallics feedstock (scrap or imported HBI) charged to melting routes
pub fn metallics_price(
    prices: &CommodityPrices,
    commodity: Commodity,
    year: u32,
) -> Result<MoneyPerTonne> {
    let price = prices
        .standard_price(commodity, year)
        .with_context(|| format!("No price for {commodity} in {year}"))?;

    // Metallics are priced per tonne, so one tonne charged costs exactly the unit price
    Ok(Intensity(1.0) * price)
}

fn commodity_price(
    prices: &CommodityPrices,
    commodity: Commodity,
    hydrogen_case: &HydrogenCase,
    year: u32,
) -> Result<MoneyPerUnit> {
    prices
        .price(commodity, hydrogen_case, year)
        .with_context(|| format!("No price for {commodity} in {year}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::integrated_route;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[rstest]
    fn variable_opex(mut integrated_route: TechnologyRoute) {
        integrated_route.intensities.clear();
        integrated_route
            .intensities
            .insert(Commodity::IronOre, Intensity(1.5));
        integrated_route
            .intensities
            .insert(Commodity::Hydrogen, Intensity(10.0));
        integrated_route.alloys_cost = MoneyPerTonne(20.0);

        let mut prices = CommodityPrices::default();
        prices.insert(Commodity::IronOre, [(2025, MoneyPerUnit(100.0))].into());
        prices.insert_hydrogen("baseline".into(), [(2025, MoneyPerUnit(4.0))].into());

        let cost =
            variable_opex_per_tonne(&integrated_route, &prices, &"baseline".into(), 2030).unwrap();
        assert_approx_eq!(MoneyPerTonne, cost, MoneyPerTonne(210.0));

        // Unknown hydrogen case
        assert!(
            variable_opex_per_tonne(&integrated_route, &prices, &"optimistic".into(), 2030)
                .is_err()
        );
    }

    #[test]
    fn metallics() {
        let mut prices = CommodityPrices::default();
        prices.insert(Commodity::Scrap, [(2025, MoneyPerUnit(350.0))].into());
        assert_eq!(
            metallics_price(&prices, Commodity::Scrap, 2025).unwrap(),
            MoneyPerTonne(350.0)
        );
        assert!(metallics_price(&prices, Commodity::Hbi, 2025).is_err());
    }
}
