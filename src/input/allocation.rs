//! Code for reading industry cap anchors from `free_allocation.csv`.
use super::demand::check_year;
use super::{check_non_negative, input_err_msg, read_csv};
use crate::units::MegaTonnesCO2;
use crate::year::YearMap;
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use std::path::Path;

const FREE_ALLOCATION_FILE_NAME: &str = "free_allocation.csv";

#[derive(Deserialize, PartialEq, Debug)]
struct IndustryCapRaw {
    year: u32,
    industry_cap: MegaTonnesCO2,
}

/// Read the industry-wide emissions cap at anchor years.
///
/// The firm's free allocation is derived from these anchors (see
/// [`crate::allocation::free_allocation_schedule`]).
pub fn read_industry_cap_anchors(
    model_dir: &Path,
    years: &[u32],
) -> Result<YearMap<MegaTonnesCO2>> {
    let file_path = model_dir.join(FREE_ALLOCATION_FILE_NAME);
    let iter = read_csv::<IndustryCapRaw>(&file_path)?;
    read_industry_cap_from_iter(iter, years).with_context(|| input_err_msg(&file_path))
}

fn read_industry_cap_from_iter<I>(iter: I, years: &[u32]) -> Result<YearMap<MegaTonnesCO2>>
where
    I: Iterator<Item = IndustryCapRaw>,
{
    let mut map = YearMap::new();
    for IndustryCapRaw { year, industry_cap } in iter {
        check_year(year, years)?;
        check_non_negative(industry_cap, "Industry cap")?;
        ensure!(
            map.insert(year, industry_cap).is_none(),
            "Industry cap given more than once for year {year}"
        );
    }

    Ok(map)
}
