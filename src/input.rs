//! Common routines for handling input data.
use crate::snapshot::{ModelParameters, ParameterSnapshot};
use crate::units::{Dimensionless, UnitType};
use anyhow::{Context, Result, ensure};
use itertools::Itertools;
use log::debug;
use serde::de::{Deserialize, DeserializeOwned, Deserializer};
use std::fmt::{self, Write};
use std::fs;
use std::path::Path;

mod allocation;
use allocation::read_industry_cap_anchors;
mod carbon_price;
use carbon_price::read_carbon_prices;
mod commodity;
use commodity::read_commodity_prices;
mod demand;
use demand::{read_demand, read_feedstock_limits};
mod route;
use route::read_routes;

/// Read a series of type `T`s from a CSV file.
///
/// Will raise an error if the file is empty.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
pub fn read_csv<'a, T: DeserializeOwned + 'a>(
    file_path: &'a Path,
) -> Result<impl Iterator<Item = T> + 'a> {
    let vec = read_csv_internal(file_path)?;
    ensure!(!vec.is_empty(), "CSV file {} cannot be empty", file_path.display());

    Ok(vec.into_iter())
}

/// Read a series of type `T`s from a CSV file, if the file exists.
///
/// Returns `None` if the file is not present.
pub fn read_csv_optional<T: DeserializeOwned>(file_path: &Path) -> Result<Option<Vec<T>>> {
    if !file_path.exists() {
        return Ok(None);
    }

    let vec = read_csv_internal(file_path)?;
    ensure!(!vec.is_empty(), "CSV file {} cannot be empty", file_path.display());

    Ok(Some(vec))
}

fn read_csv_internal<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    let vec = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(file_path)
        .with_context(|| input_err_msg(file_path))?
        .into_deserialize()
        .process_results(|iter| iter.collect_vec())
        .with_context(|| input_err_msg(file_path))?;

    Ok(vec)
}

/// Parse a TOML file at the specified path.
///
/// # Arguments
///
/// * `file_path` - Path to the TOML file
///
/// # Returns
///
/// * The deserialised TOML data or an error if the file could not be read or parsed.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let toml_str = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    let toml_data = toml::from_str(&toml_str).with_context(|| input_err_msg(file_path))?;
    Ok(toml_data)
}

/// Read a [`Dimensionless`] and check that it is between 0 and 1 (inclusive)
pub fn deserialise_proportion<'de, D>(deserialiser: D) -> Result<Dimensionless, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserialiser)?;
    if !(0.0..=1.0).contains(&value) {
        Err(serde::de::Error::custom("Value must be between 0 and 1"))?;
    }

    Ok(Dimensionless(value))
}

/// Read a [`Dimensionless`] and check that it is > 0 and <= 1
pub fn deserialise_proportion_nonzero<'de, D>(deserialiser: D) -> Result<Dimensionless, D::Error>
where
    D: Deserializer<'de>,
{
    let value = deserialise_proportion(deserialiser)?;
    if value == Dimensionless(0.0) {
        Err(serde::de::Error::custom("Value cannot be zero"))?;
    }

    Ok(value)
}

/// Format an error message to include the file path. To be used with `anyhow::Context`.
pub fn input_err_msg<P: AsRef<Path>>(file_path: P) -> String {
    format!("Error reading {}", file_path.as_ref().display())
}

/// Check whether an iterator contains values that are sorted and unique
pub fn is_sorted_and_unique<T, I>(iter: I) -> bool
where
    T: PartialOrd + Clone,
    I: IntoIterator<Item = T>,
{
    iter.into_iter().tuple_windows().all(|(a, b)| a < b)
}

/// Check that a value is finite and non-negative
pub fn check_non_negative<T: UnitType + fmt::Display>(value: T, what: &str) -> Result<()> {
    ensure!(
        value.is_finite() && value >= T::new(0.0),
        "{what} must be a finite number greater than or equal to zero (got {value})"
    );

    Ok(())
}

/// Format a list of items with a cap on display count for error messages
pub fn format_items_with_cap<I, T>(items: I) -> String
where
    I: IntoIterator<Item = T>,
    T: fmt::Display,
{
    const MAX_DISPLAY: usize = 10;

    let items = items.into_iter().collect_vec();
    let mut out = items
        .iter()
        .take(MAX_DISPLAY)
        .map(|item| item.to_string())
        .join(", ");
    if items.len() > MAX_DISPLAY {
        write!(&mut out, " (and {} more)", items.len() - MAX_DISPLAY).unwrap();
    }

    out
}

/// Load a parameter snapshot from the specified model directory.
///
/// Every input file is read and cross-checked here. Any failure means no scenario can be built, so
/// the error is returned to the caller rather than recorded per scenario.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
pub fn load_snapshot<P: AsRef<Path>>(model_dir: P) -> Result<ParameterSnapshot> {
    let model_dir = model_dir.as_ref();
    let parameters = ModelParameters::from_path(model_dir)?;
    let horizon = parameters.horizon();
    let years = horizon.year_list();

    let routes = read_routes(model_dir)?;
    let prices = read_commodity_prices(model_dir, &years)?;
    let carbon_prices = read_carbon_prices(model_dir, &years)?;
    let demand = read_demand(model_dir, &years)?;
    let feedstock_limits = read_feedstock_limits(model_dir, &years)?;
    let industry_cap = read_industry_cap_anchors(model_dir, &years)?;
    let free_allocation = crate::allocation::free_allocation_schedule(
        parameters.free_allocation_baseline,
        &industry_cap,
        &horizon,
    )
    .context("Could not derive free allocation schedule")?;

    debug!(
        "Read {} routes and {} carbon price scenarios",
        routes.len(),
        carbon_prices.len()
    );

    let snapshot = ParameterSnapshot {
        model_path: model_dir.to_path_buf(),
        parameters,
        routes,
        prices,
        carbon_prices,
        demand,
        feedstock_limits,
        free_allocation,
    };
    snapshot.validate()?;

    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::demo_model_path;
    use crate::route::RouteID;
    use rstest::rstest;
    use serde::Deserialize;
    use serde::de::IntoDeserializer;
    use serde::de::value::{Error as ValueError, F64Deserializer};
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Record {
        id: String,
        value: u32,
    }

    /// Create an example CSV file in dir_path
    fn create_csv_file(dir_path: &Path, contents: &str) -> std::path::PathBuf {
        let file_path = dir_path.join("test.csv");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "{contents}").unwrap();
        file_path
    }

    /// Test a normal read
    #[test]
    fn read_csv_works() {
        let dir = tempdir().unwrap();
        let file_path = create_csv_file(dir.path(), "id,value\nhello,1\nworld,2\n");
        let records: Vec<Record> = read_csv(&file_path).unwrap().collect();
        assert_eq!(
            records,
            &[
                Record {
                    id: "hello".to_string(),
                    value: 1,
                },
                Record {
                    id: "world".to_string(),
                    value: 2,
                }
            ]
        );

        // File with no data (only column headers)
        let file_path = create_csv_file(dir.path(), "id,value\n");
        assert!(read_csv::<Record>(&file_path).is_err());
        assert!(read_csv_optional::<Record>(&file_path).is_err());

        // Missing file
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("a_missing_file.csv");
        assert!(!file_path.exists());
        assert!(read_csv::<Record>(&file_path).is_err());
        assert!(read_csv_optional::<Record>(&file_path).unwrap().is_none());
    }

    #[test]
    fn read_toml_works() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test.toml");
        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "id = \"hello\"\nvalue = 1").unwrap();
        }

        assert_eq!(
            read_toml::<Record>(&file_path).unwrap(),
            Record {
                id: "hello".to_string(),
                value: 1,
            }
        );

        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "bad toml syntax").unwrap();
        }

        assert!(read_toml::<Record>(&file_path).is_err());
    }

    fn deserialise_f64(value: f64) -> Result<Dimensionless, ValueError> {
        let deserialiser: F64Deserializer<ValueError> = value.into_deserializer();
        deserialise_proportion_nonzero(deserialiser)
    }

    #[rstest]
    #[case(0.01, true)]
    #[case(0.5, true)]
    #[case(1.0, true)]
    #[case(0.0, false)]
    #[case(-1.0, false)]
    #[case(1.5, false)]
    #[case(f64::NAN, false)]
    fn deserialise_proportion_nonzero_works(#[case] value: f64, #[case] valid: bool) {
        assert_eq!(deserialise_f64(value).is_ok(), valid);
    }

    #[rstest]
    #[case(&[], true)]
    #[case(&[1], true)]
    #[case(&[1, 2], true)]
    #[case(&[1, 2, 3, 4], true)]
    #[case(&[2, 1], false)]
    #[case(&[1, 1], false)]
    #[case(&[1, 3, 2, 4], false)]
    fn is_sorted_and_unique_works(#[case] values: &[u32], #[case] expected: bool) {
        assert_eq!(is_sorted_and_unique(values), expected);
    }

    #[test]
    fn format_items_with_cap_works() {
        let items = vec!['a', 'b', 'c'];
        assert_eq!(format_items_with_cap(&items), "a, b, c");

        let ids: Vec<RouteID> = vec!["bf_bof".into(), "eaf".into()];
        assert_eq!(format_items_with_cap(&ids), "bf_bof, eaf");

        let many = (0..15).collect_vec();
        assert_eq!(
            format_items_with_cap(&many),
            "0, 1, 2, 3, 4, 5, 6, 7, 8, 9 (and 5 more)"
        );
    }

    #[test]
    fn load_demo_snapshot() {
        let snapshot = load_snapshot(demo_model_path()).unwrap();
        assert!(!snapshot.routes.is_empty());
        assert_eq!(snapshot.demand.len(), snapshot.horizon().len());
        assert_eq!(snapshot.free_allocation.len(), snapshot.horizon().len());
    }
}
