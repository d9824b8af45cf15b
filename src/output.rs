//! The module responsible for writing output data to disk.
use crate::batch::{BatchResult, ScenarioResult, ScenarioStatus};
use crate::budget::CarbonBudget;
use crate::config::RunConfig;
use crate::results::{AnnualResult, RouteYearResult};
use crate::route::RouteID;
use crate::scenario::ScenarioID;
use crate::units::{
    Capacity, Dimensionless, MegaTonnes, MegaTonnesCO2, Money, MoneyPerTonneCO2,
};
use anyhow::{Context, Result, ensure};
use serde::Serialize;
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};

pub mod metadata;
use metadata::write_metadata;

/// The output file name for per-route results
const ROUTE_RESULTS_FILE_NAME: &str = "route_results.csv";

/// The output file name for annual results
const ANNUAL_RESULTS_FILE_NAME: &str = "annual_results.csv";

/// The output file name for the cross-scenario summary
const SUMMARY_FILE_NAME: &str = "summary.csv";

/// The output file name for the carbon budget trajectory
const CARBON_BUDGET_FILE_NAME: &str = "carbon_budget.csv";

/// Get the default output directory for the model
pub fn get_output_dir(model_dir: &Path, results_root: PathBuf) -> Result<PathBuf> {
    // Get the model name from the dir path. This ends up being convoluted because we need to check
    // for all possible errors. Ugh.
    let model_dir = model_dir
        .canonicalize() // canonicalise in case the user has specified "."
        .context("Could not resolve path to model")?;

    let model_name = model_dir
        .file_name()
        .context("Model cannot be in root folder")?
        .to_str()
        .context("Invalid chars in model dir name")?;

    // Construct path
    Ok([results_root, model_name.into()].iter().collect())
}

/// Create a new output directory for the model, optionally overwriting existing data.
///
/// # Arguments
///
/// * `output_dir` - The output directory to create/overwrite
/// * `allow_overwrite` - Whether to delete and recreate the folder if it is non-empty
///
/// # Returns
///
/// True if the output dir contained existing data that was deleted, false if not, or an error.
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    // If the folder already exists, then delete it
    let overwrite = if let Ok(mut it) = fs::read_dir(output_dir) {
        if it.next().is_none() {
            // Folder exists and is empty: nothing to do
            return Ok(false);
        }

        ensure!(
            allow_overwrite,
            "Output folder already exists and is not empty. \
            Please delete the folder or pass the --overwrite command-line option."
        );

        fs::remove_dir_all(output_dir)?;
        true
    } else {
        false
    };

    // Try to create the directory, with parents
    fs::create_dir_all(output_dir)?;

    Ok(overwrite)
}

/// Represents a row in the route results CSV file
#[derive(Serialize, Debug, PartialEq)]
struct RouteResultsRow<'a> {
    scenario_id: &'a ScenarioID,
    year: u32,
    route_id: &'a RouteID,
    production: MegaTonnes,
    capacity: Capacity,
    builds: f64,
}

impl<'a> RouteResultsRow<'a> {
    fn new(scenario_id: &'a ScenarioID, result: &'a RouteYearResult) -> Self {
        Self {
            scenario_id,
            year: result.year,
            route_id: &result.route_id,
            production: result.production,
            capacity: result.capacity,
            builds: result.builds,
        }
    }
}

/// Represents a row in the annual results CSV file
#[derive(Serialize, Debug, PartialEq)]
struct AnnualResultsRow<'a> {
    scenario_id: &'a ScenarioID,
    year: u32,
    demand: MegaTonnes,
    emissions: MegaTonnesCO2,
    free_allocation: MegaTonnesCO2,
    ets_liability: MegaTonnesCO2,
    carbon_price: MoneyPerTonneCO2,
    ets_cost: Money,
    capex: Money,
    fixed_opex: Money,
    variable_opex: Money,
    discount_factor: Dimensionless,
    scrap_charged: MegaTonnes,
    hbi_import: MegaTonnes,
    dri_use: MegaTonnes,
}

impl<'a> AnnualResultsRow<'a> {
    fn new(scenario_id: &'a ScenarioID, result: &AnnualResult) -> Self {
        Self {
            scenario_id,
            year: result.year,
            demand: result.demand,
            emissions: result.emissions,
            free_allocation: result.free_allocation,
            ets_liability: result.ets_liability,
            carbon_price: result.carbon_price,
            ets_cost: result.ets_cost,
            capex: result.capex,
            fixed_opex: result.fixed_opex,
            variable_opex: result.variable_opex,
            discount_factor: result.discount_factor,
            scrap_charged: result.scrap_charged,
            hbi_import: result.hbi_import,
            dri_use: result.dri_use,
        }
    }
}

/// Represents a row in the summary CSV file.
///
/// Fields other than the status are empty for scenarios which were not solved.
#[derive(Serialize, Debug, PartialEq)]
struct SummaryRow<'a> {
    scenario_id: &'a ScenarioID,
    status: ScenarioStatus,
    total_discounted_cost: Option<Money>,
    discounted_capex: Option<Money>,
    discounted_fixed_opex: Option<Money>,
    discounted_variable_opex: Option<Money>,
    discounted_ets_cost: Option<Money>,
    cumulative_emissions: Option<MegaTonnesCO2>,
    carbon_budget: MegaTonnesCO2,
    overshoot: Option<MegaTonnesCO2>,
    overshoot_pct: Option<f64>,
    budget_utilisation_pct: Option<f64>,
    compliant: Option<bool>,
    validation_issues: usize,
    runtime_secs: f64,
    message: Option<&'a str>,
}

impl<'a> SummaryRow<'a> {
    fn new(result: &'a ScenarioResult, budget: &CarbonBudget) -> Self {
        let costs = result.results.as_ref().map(|results| results.costs);
        let compliance = result.compliance.as_ref();
        Self {
            scenario_id: &result.scenario_id,
            status: result.status,
            total_discounted_cost: costs.map(|costs| costs.total()),
            discounted_capex: costs.map(|costs| costs.capex),
            discounted_fixed_opex: costs.map(|costs| costs.fixed_opex),
            discounted_variable_opex: costs.map(|costs| costs.variable_opex),
            discounted_ets_cost: costs.map(|costs| costs.ets_cost),
            cumulative_emissions: compliance.map(|report| report.cumulative_emissions),
            carbon_budget: budget.total,
            overshoot: compliance.map(|report| report.overshoot),
            overshoot_pct: compliance.map(|report| report.overshoot_pct),
            budget_utilisation_pct: compliance.map(|report| report.utilisation_pct),
            compliant: compliance.map(|report| report.compliant),
            validation_issues: result.issues.len(),
            runtime_secs: result.runtime.as_secs_f64(),
            message: result.message.as_deref(),
        }
    }
}

/// Represents a row in the carbon budget CSV file
#[derive(Serialize, Debug, PartialEq)]
struct CarbonBudgetRow {
    year: u32,
    budget: MegaTonnesCO2,
}

/// An object for writing result files to the output directory
pub struct DataWriter {
    route_writer: csv::Writer<File>,
    annual_writer: csv::Writer<File>,
    summary_writer: csv::Writer<File>,
}

impl DataWriter {
    /// Open CSV files to write output data to and write run metadata.
    ///
    /// # Arguments
    ///
    /// * `output_path` - Folder where files will be saved
    /// * `model_path` - Path to input model
    /// * `config` - Options for the run, recorded in the metadata
    pub fn create(output_path: &Path, model_path: &Path, config: &RunConfig) -> Result<Self> {
        write_metadata(output_path, model_path, config).context("Failed to save metadata")?;

        let new_writer = |file_name: &str| {
            let file_path = output_path.join(file_name);
            csv::Writer::from_path(&file_path)
                .with_context(|| format!("Could not create {}", file_path.display()))
        };

        Ok(Self {
            route_writer: new_writer(ROUTE_RESULTS_FILE_NAME)?,
            annual_writer: new_writer(ANNUAL_RESULTS_FILE_NAME)?,
            summary_writer: new_writer(SUMMARY_FILE_NAME)?,
        })
    }

    /// Write the results of one scenario
    pub fn write_scenario(&mut self, result: &ScenarioResult, budget: &CarbonBudget) -> Result<()> {
        if let Some(results) = &result.results {
            for route_result in &results.routes {
                self.route_writer
                    .serialize(RouteResultsRow::new(&result.scenario_id, route_result))?;
            }
            for annual in &results.annual {
                self.annual_writer
                    .serialize(AnnualResultsRow::new(&result.scenario_id, annual))?;
            }
        }

        self.summary_writer
            .serialize(SummaryRow::new(result, budget))?;

        Ok(())
    }

    /// Flush the underlying streams
    pub fn flush(&mut self) -> Result<()> {
        self.route_writer.flush()?;
        self.annual_writer.flush()?;
        self.summary_writer.flush()?;

        Ok(())
    }
}

/// Write the carbon budget trajectory to file
fn write_carbon_budget(output_path: &Path, budget: &CarbonBudget) -> Result<()> {
    let file_path = output_path.join(CARBON_BUDGET_FILE_NAME);
    let mut writer = csv::Writer::from_path(&file_path)
        .with_context(|| format!("Could not create {}", file_path.display()))?;
    for (year, budget) in &budget.trajectory {
        writer.serialize(CarbonBudgetRow {
            year: *year,
            budget: *budget,
        })?;
    }
    writer.flush()?;

    Ok(())
}

/// Write all results of a batch to the output directory
pub fn write_batch(
    output_path: &Path,
    model_path: &Path,
    config: &RunConfig,
    batch: &BatchResult,
) -> Result<()> {
    let mut writer = DataWriter::create(output_path, model_path, config)?;
    for result in &batch.scenarios {
        writer.write_scenario(result, &batch.budget)?;
    }
    writer.flush()?;
    write_carbon_budget(output_path, &batch.budget)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::{CostSummary, ScenarioResults};
    use itertools::Itertools;
    use std::time::Duration;
    use tempfile::tempdir;

    fn budget() -> CarbonBudget {
        CarbonBudget {
            trajectory: [(2025, MegaTonnesCO2(60.0)), (2026, MegaTonnesCO2(40.0))].into(),
            total: MegaTonnesCO2(100.0),
        }
    }

    fn failed_result() -> ScenarioResult {
        ScenarioResult {
            scenario_id: "failed".into(),
            status: ScenarioStatus::Infeasible,
            message: Some("The problem is infeasible".into()),
            results: None,
            compliance: None,
            issues: Vec::new(),
            runtime: Duration::from_millis(5),
        }
    }

    #[test]
    fn create_output_directory_new_directory() {
        let temp_dir = tempdir().unwrap();
        let output_dir = temp_dir.path().join("output");
        let result = create_output_directory(&output_dir, false).unwrap();
        assert!(!result);
        assert!(output_dir.is_dir());
    }

    #[test]
    fn create_output_directory_existing_non_empty() {
        let temp_dir = tempdir().unwrap();
        let output_dir = temp_dir.path().join("output");
        fs::create_dir(&output_dir).unwrap();
        fs::write(output_dir.join("file.txt"), "contents").unwrap();

        assert!(create_output_directory(&output_dir, false).is_err());
        assert!(create_output_directory(&output_dir, true).unwrap());
        assert!(output_dir.read_dir().unwrap().next().is_none());
    }

    #[test]
    fn write_failed_scenario() {
        let dir = tempdir().unwrap();
        let budget = budget();
        {
            let mut writer =
                DataWriter::create(dir.path(), dir.path(), &RunConfig::default()).unwrap();
            writer.write_scenario(&failed_result(), &budget).unwrap();
            writer.flush().unwrap();
        }

        // No trajectories for a failed scenario
        let routes = fs::read_to_string(dir.path().join(ROUTE_RESULTS_FILE_NAME)).unwrap();
        assert!(routes.is_empty());

        let summary = fs::read_to_string(dir.path().join(SUMMARY_FILE_NAME)).unwrap();
        let lines = summary.lines().collect_vec();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("scenario_id,status,total_discounted_cost"));
        assert!(lines[1].starts_with("failed,infeasible,,"));
        assert!(lines[1].ends_with("The problem is infeasible"));
    }

    #[test]
    fn write_solved_scenario() {
        let dir = tempdir().unwrap();
        let result = ScenarioResult {
            scenario_id: "solved".into(),
            status: ScenarioStatus::Optimal,
            message: None,
            results: Some(ScenarioResults {
                routes: vec![RouteYearResult {
                    route_id: "bf_bof".into(),
                    year: 2025,
                    production: MegaTonnes(50.0),
                    capacity: Capacity(60.0),
                    builds: 2.0,
                }],
                annual: Vec::new(),
                costs: CostSummary::default(),
            }),
            compliance: None,
            issues: Vec::new(),
            runtime: Duration::ZERO,
        };
        {
            let mut writer =
                DataWriter::create(dir.path(), dir.path(), &RunConfig::default()).unwrap();
            writer.write_scenario(&result, &budget()).unwrap();
            writer.flush().unwrap();
        }

        let routes = fs::read_to_string(dir.path().join(ROUTE_RESULTS_FILE_NAME)).unwrap();
        assert_eq!(
            routes,
            "scenario_id,year,route_id,production,capacity,builds\n\
             solved,2025,bf_bof,50.0,60.0,2.0\n"
        );
    }

    #[test]
    fn carbon_budget_file() {
        let dir = tempdir().unwrap();
        write_carbon_budget(dir.path(), &budget()).unwrap();
        let contents = fs::read_to_string(dir.path().join(CARBON_BUDGET_FILE_NAME)).unwrap();
        assert_eq!(contents, "year,budget\n2025,60.0\n2026,40.0\n");
    }
}
