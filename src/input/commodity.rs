//! Code for reading commodity price paths from `commodity_prices.csv`.
use super::{input_err_msg, read_csv};
use crate::commodity::{Commodity, CommodityPrices, HydrogenCase, PricePath};
use crate::units::{MoneyPerUnit, UnitType};
use crate::year::parse_year_str;
use anyhow::{Context, Result, bail, ensure};
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

const COMMODITY_PRICES_FILE_NAME: &str = "commodity_prices.csv";

/// Represents a row of the commodity prices CSV file
#[derive(Deserialize, PartialEq, Debug)]
struct CommodityPriceRaw {
    commodity: Commodity,
    #[serde(default)]
    case: Option<HydrogenCase>,
    years: String,
    price: MoneyPerUnit,
}

/// Read commodity price paths from the specified model directory.
///
/// Prices are anchors: years between them are interpolated when the price is requested.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `years` - All years in the model horizon
pub fn read_commodity_prices(model_dir: &Path, years: &[u32]) -> Result<CommodityPrices> {
    let file_path = model_dir.join(COMMODITY_PRICES_FILE_NAME);
    let iter = read_csv::<CommodityPriceRaw>(&file_path)?;
    read_commodity_prices_from_iter(iter, years).with_context(|| input_err_msg(&file_path))
}

fn read_commodity_prices_from_iter<I>(iter: I, years: &[u32]) -> Result<CommodityPrices>
where
    I: Iterator<Item = CommodityPriceRaw>,
{
    let mut standard: HashMap<Commodity, PricePath> = HashMap::new();
    let mut hydrogen: IndexMap<HydrogenCase, PricePath> = IndexMap::new();
    for record in iter {
        ensure!(
            record.price.is_finite() && record.price >= MoneyPerUnit(0.0),
            "Price for {} must be a finite number greater than or equal to zero",
            record.commodity
        );

        let path = match (record.commodity, record.case) {
            (Commodity::Hydrogen, Some(case)) => hydrogen.entry(case).or_default(),
            (Commodity::Hydrogen, None) => bail!("A case must be given for hydrogen prices"),
            (commodity, Some(case)) => {
                bail!("Cases are only supported for hydrogen (got case {case} for {commodity})");
            }
            (commodity, None) => standard.entry(commodity).or_default(),
        };

        let record_years = parse_year_str(&record.years, years)
            .with_context(|| format!("Invalid years for {} price", record.commodity))?;
        for year in record_years {
            ensure!(
                path.insert(year, record.price).is_none(),
                "Price for {} given more than once for year {year}",
                record.commodity
            );
        }
    }

    let mut prices = CommodityPrices::default();
    for (commodity, path) in standard {
        prices.insert(commodity, path);
    }
    for (case, path) in hydrogen {
        prices.insert_hydrogen(case, path);
    }

    Ok(prices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;

    const YEARS: [u32; 3] = [2025, 2026, 2027];

    fn raw(commodity: Commodity, case: Option<&str>, years: &str, price: f64) -> CommodityPriceRaw {
        CommodityPriceRaw {
            commodity,
            case: case.map(Into::into),
            years: years.into(),
            price: MoneyPerUnit(price),
        }
    }

    #[test]
    fn read_prices_works() {
        let prices = read_commodity_prices_from_iter(
            [
                raw(Commodity::IronOre, None, "all", 100.0),
                raw(Commodity::Hydrogen, Some("baseline"), "2025", 5.0),
                raw(Commodity::Hydrogen, Some("baseline"), "2027", 3.0),
                raw(Commodity::Hydrogen, Some("optimistic"), "all", 2.0),
            ]
            .into_iter(),
            &YEARS,
        )
        .unwrap();

        let baseline: HydrogenCase = "baseline".into();
        assert_eq!(
            prices.price(Commodity::IronOre, &baseline, 2026),
            Some(MoneyPerUnit(100.0))
        );
        assert_eq!(
            prices.price(Commodity::Hydrogen, &baseline, 2026),
            Some(MoneyPerUnit(4.0))
        );
        assert_eq!(
            prices.price(Commodity::Hydrogen, &"optimistic".into(), 2027),
            Some(MoneyPerUnit(2.0))
        );
        assert_eq!(prices.hydrogen_cases().count(), 2);
    }

    #[test]
    fn hydrogen_needs_case() {
        assert_error!(
            read_commodity_prices_from_iter(
                [raw(Commodity::Hydrogen, None, "all", 5.0)].into_iter(),
                &YEARS
            ),
            "A case must be given for hydrogen prices"
        );
    }

    #[test]
    fn case_only_for_hydrogen() {
        assert_error!(
            read_commodity_prices_from_iter(
                [raw(Commodity::Scrap, Some("baseline"), "all", 5.0)].into_iter(),
                &YEARS
            ),
            "Cases are only supported for hydrogen (got case baseline for scrap)"
        );
    }

    #[test]
    fn duplicate_year() {
        assert_error!(
            read_commodity_prices_from_iter(
                [
                    raw(Commodity::Scrap, None, "all", 5.0),
                    raw(Commodity::Scrap, None, "2026", 6.0),
                ]
                .into_iter(),
                &YEARS
            ),
            "Price for scrap given more than once for year 2026"
        );
    }

    #[test]
    fn negative_price() {
        assert_error!(
            read_commodity_prices_from_iter(
                [raw(Commodity::Scrap, None, "all", -5.0)].into_iter(),
                &YEARS
            ),
            "Price for scrap must be a finite number greater than or equal to zero"
        );
    }
}
