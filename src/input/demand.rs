//! Code for reading steel demand and feedstock limits.
use super::{check_non_negative, input_err_msg, read_csv, read_csv_optional};
use crate::snapshot::FeedstockLimits;
use crate::units::MegaTonnes;
use crate::year::YearMap;
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use std::path::Path;

const DEMAND_FILE_NAME: &str = "demand.csv";
const FEEDSTOCK_LIMITS_FILE_NAME: &str = "feedstock_limits.csv";

#[derive(Deserialize, PartialEq, Debug)]
struct DemandRaw {
    year: u32,
    demand: MegaTonnes,
}

/// Represents a row of the feedstock limits CSV file. Empty cells mean no limit.
#[derive(Deserialize, PartialEq, Debug)]
struct FeedstockLimitsRaw {
    year: u32,
    scrap_supply: Option<MegaTonnes>,
    hbi_import_capacity: Option<MegaTonnes>,
}

/// Read annual steel demand.
///
/// Every year must be one of the horizon years. Whether every horizon year is covered is checked
/// when the snapshot is validated.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `years` - All years in the model horizon
pub fn read_demand(model_dir: &Path, years: &[u32]) -> Result<YearMap<MegaTonnes>> {
    let file_path = model_dir.join(DEMAND_FILE_NAME);
    let iter = read_csv::<DemandRaw>(&file_path)?;
    read_demand_from_iter(iter, years).with_context(|| input_err_msg(&file_path))
}

fn read_demand_from_iter<I>(iter: I, years: &[u32]) -> Result<YearMap<MegaTonnes>>
where
    I: Iterator<Item = DemandRaw>,
{
    let mut map = YearMap::new();
    for DemandRaw { year, demand } in iter {
        check_year(year, years)?;
        check_non_negative(demand, "Demand")?;
        ensure!(
            map.insert(year, demand).is_none(),
            "Demand given more than once for year {year}"
        );
    }

    Ok(map)
}

/// Read feedstock supply limits, if the file is present.
///
/// Years not listed are unconstrained.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `years` - All years in the model horizon
pub fn read_feedstock_limits(model_dir: &Path, years: &[u32]) -> Result<YearMap<FeedstockLimits>> {
    let file_path = model_dir.join(FEEDSTOCK_LIMITS_FILE_NAME);
    let Some(rows) = read_csv_optional::<FeedstockLimitsRaw>(&file_path)? else {
        return Ok(YearMap::new());
    };

    read_feedstock_limits_from_iter(rows.into_iter(), years)
        .with_context(|| input_err_msg(&file_path))
}

fn read_feedstock_limits_from_iter<I>(iter: I, years: &[u32]) -> Result<YearMap<FeedstockLimits>>
where
    I: Iterator<Item = FeedstockLimitsRaw>,
{
    let mut map = YearMap::new();
    for record in iter {
        check_year(record.year, years)?;
        for value in [record.scrap_supply, record.hbi_import_capacity]
            .into_iter()
            .flatten()
        {
            check_non_negative(value, "Feedstock limit")?;
        }

        let limits = FeedstockLimits {
            scrap_supply: record.scrap_supply,
            hbi_import_capacity: record.hbi_import_capacity,
        };
        ensure!(
            map.insert(record.year, limits).is_none(),
            "Feedstock limits given more than once for year {}",
            record.year
        );
    }

    Ok(map)
}

/// Check that a year is within the horizon
pub(super) fn check_year(year: u32, years: &[u32]) -> Result<()> {
    ensure!(
        years.binary_search(&year).is_ok(),
        "Year {year} is outside the model horizon"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use std::fs;
    use tempfile::tempdir;

    const YEARS: [u32; 2] = [2025, 2026];

    #[test]
    fn read_demand_works() {
        let demand = read_demand_from_iter(
            [
                DemandRaw {
                    year: 2025,
                    demand: MegaTonnes(50.0),
                },
                DemandRaw {
                    year: 2026,
                    demand: MegaTonnes(55.0),
                },
            ]
            .into_iter(),
            &YEARS,
        )
        .unwrap();
        assert_eq!(demand[&2026], MegaTonnes(55.0));
    }

    #[test]
    fn demand_outside_horizon() {
        assert_error!(
            read_demand_from_iter(
                [DemandRaw {
                    year: 2030,
                    demand: MegaTonnes(50.0),
                }]
                .into_iter(),
                &YEARS
            ),
            "Year 2030 is outside the model horizon"
        );
    }

    #[test]
    fn negative_demand() {
        assert_error!(
            read_demand_from_iter(
                [DemandRaw {
                    year: 2025,
                    demand: MegaTonnes(-1.0),
                }]
                .into_iter(),
                &YEARS
            ),
            "Demand must be a finite number greater than or equal to zero (got -1)"
        );
    }

    #[test]
    fn feedstock_limits_from_file() {
        let dir = tempdir().unwrap();

        // Missing file means no limits
        assert!(read_feedstock_limits(dir.path(), &YEARS).unwrap().is_empty());

        fs::write(
            dir.path().join(FEEDSTOCK_LIMITS_FILE_NAME),
            "year,scrap_supply,hbi_import_capacity\n2025,10.0,\n2026,,2.5\n",
        )
        .unwrap();
        let limits = read_feedstock_limits(dir.path(), &YEARS).unwrap();
        assert_eq!(
            limits[&2025],
            FeedstockLimits {
                scrap_supply: Some(MegaTonnes(10.0)),
                hbi_import_capacity: None
            }
        );
        assert_eq!(
            limits[&2026],
            FeedstockLimits {
                scrap_supply: None,
                hbi_import_capacity: Some(MegaTonnes(2.5))
            }
        );
    }
}
