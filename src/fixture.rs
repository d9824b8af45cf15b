//! Fixtures for tests

use crate::budget::{BudgetParameters, DeclineSchedule};
use crate::commodity::{Commodity, CommodityPrices};
use crate::config::RunConfig;
use crate::route::{IntensityMap, RouteKind, TechnologyRoute};
use crate::scenario::Scenario;
use crate::snapshot::{FeedstockLimits, ModelParameters, ParameterSnapshot};
use crate::units::{
    Capacity, Dimensionless, EmissionFactor, Intensity, MegaTonnes, MegaTonnesCO2, MoneyPerTonne,
    MoneyPerTonneCO2, MoneyPerTonnePerYear, MoneyPerUnit,
};
use indexmap::{IndexSet, indexmap};
use rstest::fixture;
use std::path::PathBuf;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

/// Path to the bundled demo model
pub(crate) fn demo_model_path() -> PathBuf {
    [env!("CARGO_MANIFEST_DIR"), "demos", "steel"].iter().collect()
}

#[fixture]
pub fn budget_parameters() -> BudgetParameters {
    BudgetParameters {
        national_baseline: MegaTonnesCO2(727.6),
        sector_share: Dimensionless(0.12),
        firm_share: Dimensionless(0.6),
        baseline_year: 2018,
        target_year: 2050,
        final_fraction: Dimensionless(0.0),
        schedule: DeclineSchedule::TwoPhase {
            milestone_year: 2030,
            milestone_reduction: Dimensionless(0.4),
        },
        budget_override: None,
    }
}

/// A blast furnace route with no initial capacity
#[fixture]
pub fn integrated_route() -> TechnologyRoute {
    TechnologyRoute {
        id: "bf_bof".into(),
        description: "Blast furnace with basic oxygen furnace".into(),
        kind: RouteKind::Integrated,
        capital_cost: MoneyPerTonnePerYear(500.0),
        module_size: Capacity(5.0),
        fixed_opex: MoneyPerTonnePerYear(20.0),
        initial_capacity: Capacity(0.0),
        min_utilisation: Dimensionless(0.0),
        max_utilisation: Dimensionless(1.0),
        available_from: None,
        capture: false,
        intensities: IntensityMap::from([
            (Commodity::IronOre, Intensity(1.5)),
            (Commodity::CokingCoal, Intensity(0.7)),
        ]),
        alloys_cost: MoneyPerTonne(10.0),
        emission_factor: EmissionFactor(1.0),
    }
}

/// An electric arc furnace charged with metallics
fn melting_route() -> TechnologyRoute {
    TechnologyRoute {
        id: "eaf".into(),
        description: "Electric arc furnace".into(),
        kind: RouteKind::Melting,
        capital_cost: MoneyPerTonnePerYear(300.0),
        module_size: Capacity(2.0),
        fixed_opex: MoneyPerTonnePerYear(15.0),
        initial_capacity: Capacity(0.0),
        min_utilisation: Dimensionless(0.0),
        max_utilisation: Dimensionless(1.0),
        available_from: None,
        capture: false,
        intensities: IntensityMap::from([(Commodity::Electricity, Intensity(0.6))]),
        alloys_cost: MoneyPerTonne(15.0),
        emission_factor: EmissionFactor(0.1),
    }
}

/// A gas-based direct reduction route with no initial capacity
fn reduction_route() -> TechnologyRoute {
    TechnologyRoute {
        id: "dri_ng".into(),
        description: "Gas-based direct reduction".into(),
        kind: RouteKind::Reduction,
        capital_cost: MoneyPerTonnePerYear(400.0),
        module_size: Capacity(2.0),
        fixed_opex: MoneyPerTonnePerYear(20.0),
        initial_capacity: Capacity(0.0),
        min_utilisation: Dimensionless(0.0),
        max_utilisation: Dimensionless(1.0),
        available_from: None,
        capture: false,
        intensities: IntensityMap::from([
            (Commodity::IronOre, Intensity(1.5)),
            (Commodity::NaturalGas, Intensity(3.0)),
        ]),
        alloys_cost: MoneyPerTonne(0.0),
        emission_factor: EmissionFactor(0.5),
    }
}

#[fixture]
pub fn scenario() -> Scenario {
    Scenario {
        id: "test".into(),
        carbon_price: [
            (2025, MoneyPerTonneCO2(50.0)),
            (2026, MoneyPerTonneCO2(60.0)),
        ]
        .into(),
        capture_enabled: true,
        disabled_routes: IndexSet::new(),
        hydrogen_case: "baseline".into(),
    }
}

#[fixture]
pub fn run_config() -> RunConfig {
    RunConfig::default()
}

/// Two years, one integrated route, demand of 50 Mt each year and no free allocation
#[fixture]
pub fn single_route_snapshot(
    integrated_route: TechnologyRoute,
    budget_parameters: BudgetParameters,
    scenario: Scenario,
) -> ParameterSnapshot {
    let mut prices = CommodityPrices::default();
    prices.insert(Commodity::IronOre, [(2025, MoneyPerUnit(100.0))].into());
    prices.insert(Commodity::CokingCoal, [(2025, MoneyPerUnit(200.0))].into());

    ParameterSnapshot {
        model_path: PathBuf::from("test"),
        parameters: ModelParameters {
            start_year: 2025,
            end_year: 2026,
            free_allocation_baseline: MegaTonnesCO2(0.0),
            capture_rate: Dimensionless(0.8),
            metallics_yield: Dimensionless(0.92),
            min_high_grade_share: Dimensionless(0.0),
            carbon_budget: budget_parameters,
        },
        routes: indexmap! {integrated_route.id.clone() => integrated_route},
        prices,
        carbon_prices: indexmap! {scenario.id.clone() => scenario.carbon_price},
        demand: [(2025, MegaTonnes(50.0)), (2026, MegaTonnes(50.0))].into(),
        feedstock_limits: Default::default(),
        free_allocation: [(2025, MegaTonnesCO2(0.0)), (2026, MegaTonnesCO2(0.0))].into(),
    }
}

/// The single route snapshot with an added melting route
#[fixture]
pub fn melting_snapshot(mut single_route_snapshot: ParameterSnapshot) -> ParameterSnapshot {
    let route = melting_route();
    single_route_snapshot.routes.insert(route.id.clone(), route);

    let prices = &mut single_route_snapshot.prices;
    prices.insert(Commodity::Electricity, [(2025, MoneyPerUnit(60.0))].into());
    prices.insert(Commodity::Scrap, [(2025, MoneyPerUnit(350.0))].into());
    prices.insert(Commodity::Hbi, [(2025, MoneyPerUnit(450.0))].into());

    single_route_snapshot
}

/// The melting snapshot with a reduction route and a minimum high-grade share of 30%.
///
/// Scrap and HBI are cheaper than the blast furnace, so in 2025 both are used up to their limits
/// (21 Mt and 9 Mt), which leaves the high-grade share exactly at its minimum.
#[fixture]
pub fn metallics_snapshot(mut melting_snapshot: ParameterSnapshot) -> ParameterSnapshot {
    let route = reduction_route();
    melting_snapshot.routes.insert(route.id.clone(), route);
    melting_snapshot.parameters.min_high_grade_share = Dimensionless(0.3);
    melting_snapshot.feedstock_limits.insert(
        2025,
        FeedstockLimits {
            scrap_supply: Some(MegaTonnes(21.0)),
            hbi_import_capacity: Some(MegaTonnes(9.0)),
        },
    );

    let prices = &mut melting_snapshot.prices;
    prices.insert(Commodity::NaturalGas, [(2025, MoneyPerUnit(100.0))].into());
    prices.insert(Commodity::Scrap, [(2025, MoneyPerUnit(50.0))].into());
    prices.insert(Commodity::Hbi, [(2025, MoneyPerUnit(200.0))].into());

    melting_snapshot
}
