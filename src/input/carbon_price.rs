//! Code for reading carbon price scenarios from `carbon_prices.csv`.
use super::{input_err_msg, read_csv};
use crate::scenario::ScenarioID;
use crate::snapshot::CarbonPriceMap;
use crate::units::MoneyPerTonneCO2;
use crate::year::parse_year_str;
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use std::path::Path;

const CARBON_PRICES_FILE_NAME: &str = "carbon_prices.csv";

/// Represents a row of the carbon prices CSV file
#[derive(Deserialize, PartialEq, Debug)]
struct CarbonPriceRaw {
    scenario_id: ScenarioID,
    years: String,
    price: MoneyPerTonneCO2,
}

/// Read carbon price paths for all scenarios.
///
/// Each scenario is kept in the order it first appears in the file. Whether a scenario's path
/// covers the whole horizon is checked when the scenario is run, so that a gap only affects that
/// scenario.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `years` - All years in the model horizon
pub fn read_carbon_prices(model_dir: &Path, years: &[u32]) -> Result<CarbonPriceMap> {
    let file_path = model_dir.join(CARBON_PRICES_FILE_NAME);
    let iter = read_csv::<CarbonPriceRaw>(&file_path)?;
    read_carbon_prices_from_iter(iter, years).with_context(|| input_err_msg(&file_path))
}

fn read_carbon_prices_from_iter<I>(iter: I, years: &[u32]) -> Result<CarbonPriceMap>
where
    I: Iterator<Item = CarbonPriceRaw>,
{
    let mut map = CarbonPriceMap::new();
    for record in iter {
        let record_years = parse_year_str(&record.years, years)
            .with_context(|| format!("Invalid years for scenario {}", record.scenario_id))?;
        let path = map.entry(record.scenario_id.clone()).or_default();
        for year in record_years {
            ensure!(
                path.insert(year, record.price).is_none(),
                "Carbon price for scenario {} given more than once for year {year}",
                record.scenario_id
            );
        }
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use itertools::Itertools;

    const YEARS: [u32; 2] = [2025, 2026];

    fn raw(scenario_id: &str, years: &str, price: f64) -> CarbonPriceRaw {
        CarbonPriceRaw {
            scenario_id: scenario_id.into(),
            years: years.into(),
            price: MoneyPerTonneCO2(price),
        }
    }

    #[test]
    fn read_carbon_prices_works() {
        let map = read_carbon_prices_from_iter(
            [
                raw("high", "2025", 100.0),
                raw("low", "all", 10.0),
                raw("high", "2026", 150.0),
            ]
            .into_iter(),
            &YEARS,
        )
        .unwrap();

        assert_eq!(map.keys().map(ToString::to_string).collect_vec(), ["high", "low"]);
        assert_eq!(map["high"][&2026], MoneyPerTonneCO2(150.0));
        assert_eq!(map["low"].len(), 2);
    }

    #[test]
    fn duplicate_year() {
        assert_error!(
            read_carbon_prices_from_iter(
                [raw("high", "all", 100.0), raw("high", "2025", 150.0)].into_iter(),
                &YEARS
            ),
            "Carbon price for scenario high given more than once for year 2025"
        );
    }

    #[test]
    fn year_outside_horizon() {
        assert_error!(
            read_carbon_prices_from_iter([raw("high", "2030", 100.0)].into_iter(), &YEARS),
            "Invalid years for scenario high"
        );
    }
}
