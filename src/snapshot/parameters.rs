//! Read and validate model parameters from `model.toml`.
use crate::budget::BudgetParameters;
use crate::input::{
    deserialise_proportion, deserialise_proportion_nonzero, input_err_msg, read_toml,
};
use crate::units::{Dimensionless, MegaTonnesCO2, UnitType};
use crate::year::Horizon;
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use std::path::Path;

const MODEL_PARAMETERS_FILE_NAME: &str = "model.toml";

macro_rules! define_unit_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            <$type>::new($value)
        }
    };
}

define_unit_param_default!(default_capture_rate, Dimensionless, 0.8);
define_unit_param_default!(default_metallics_yield, Dimensionless, 0.92);

/// Model parameters as defined in the `model.toml` file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ModelParameters {
    /// First year of the horizon
    pub start_year: u32,
    /// Last year of the horizon (inclusive)
    pub end_year: u32,
    /// The firm's free allocation in the first year
    pub free_allocation_baseline: MegaTonnesCO2,
    /// Fraction of gross emissions captured by routes with carbon capture
    #[serde(default = "default_capture_rate")]
    #[serde(deserialize_with = "deserialise_proportion")]
    pub capture_rate: Dimensionless,
    /// Tonnes of steel from melting routes per tonne of metallics charged
    #[serde(default = "default_metallics_yield")]
    #[serde(deserialize_with = "deserialise_proportion_nonzero")]
    pub metallics_yield: Dimensionless,
    /// Minimum share of high-grade metallics (HBI and reduced iron) in the metallics charge
    #[serde(default)]
    #[serde(deserialize_with = "deserialise_proportion")]
    pub min_high_grade_share: Dimensionless,
    /// Parameters for deriving the carbon budget
    pub carbon_budget: BudgetParameters,
}

/// Check that the horizon years are valid
fn check_horizon(start_year: u32, end_year: u32) -> Result<()> {
    ensure!(
        end_year >= start_year,
        "end_year must not be before start_year"
    );

    Ok(())
}

/// Check that the free allocation baseline is valid
fn check_free_allocation_baseline(value: MegaTonnesCO2) -> Result<()> {
    ensure!(
        value.is_finite() && value >= MegaTonnesCO2(0.0),
        "free_allocation_baseline must be a finite number greater than or equal to zero"
    );

    Ok(())
}

impl ModelParameters {
    /// Read a model file from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing model configuration files
    ///
    /// # Returns
    ///
    /// The model file contents as a [`ModelParameters`] struct or an error if the file is invalid
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<ModelParameters> {
        let file_path = model_dir.as_ref().join(MODEL_PARAMETERS_FILE_NAME);
        let model_params: ModelParameters = read_toml(&file_path)?;

        model_params
            .validate()
            .with_context(|| input_err_msg(file_path))?;

        Ok(model_params)
    }

    /// The model horizon
    pub fn horizon(&self) -> Horizon {
        Horizon::new(self.start_year, self.end_year).expect("Horizon validated on load")
    }

    /// Validate parameters after reading in file
    fn validate(&self) -> Result<()> {
        check_horizon(self.start_year, self.end_year)?;
        check_free_allocation_baseline(self.free_allocation_baseline)?;
        self.carbon_budget
            .validate()
            .context("Invalid carbon_budget parameters")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::DeclineSchedule;
    use rstest::rstest;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    const BUDGET_TOML: &str = r#"
[carbon_budget]
national_baseline = 727.6
sector_share = 0.12
firm_share = 0.6
baseline_year = 2018
target_year = 2050

[carbon_budget.schedule]
shape = "two_phase"
milestone_year = 2030
milestone_reduction = 0.4
"#;

    fn write_model_toml(dir: &Path, contents: &str) {
        let mut file = File::create(dir.join(MODEL_PARAMETERS_FILE_NAME)).unwrap();
        writeln!(file, "{contents}\n{BUDGET_TOML}").unwrap();
    }

    #[test]
    fn model_params_from_path() {
        let dir = tempdir().unwrap();
        write_model_toml(
            dir.path(),
            "start_year = 2025\nend_year = 2050\nfree_allocation_baseline = 70.0",
        );

        let params = ModelParameters::from_path(dir.path()).unwrap();
        assert_eq!(params.horizon().len(), 26);
        assert_eq!(params.capture_rate, Dimensionless(0.8));
        assert_eq!(params.metallics_yield, Dimensionless(0.92));
        assert_eq!(params.min_high_grade_share, Dimensionless(0.0));
        assert!(matches!(
            params.carbon_budget.schedule,
            DeclineSchedule::TwoPhase {
                milestone_year: 2030,
                ..
            }
        ));
    }

    #[test]
    fn model_params_unknown_field() {
        let dir = tempdir().unwrap();
        write_model_toml(
            dir.path(),
            "start_year = 2025\nend_year = 2050\nfree_allocation_baseline = 70.0\nsolver = \"x\"",
        );
        assert!(ModelParameters::from_path(dir.path()).is_err());
    }

    #[rstest]
    #[case(2025, 2050, true)]
    #[case(2025, 2026, true)]
    #[case(2025, 2025, true)]
    #[case(2050, 2025, false)]
    fn check_horizon_works(#[case] start: u32, #[case] end: u32, #[case] valid: bool) {
        assert_eq!(check_horizon(start, end).is_ok(), valid);
    }

    #[rstest]
    #[case(0.0, true)]
    #[case(70.0, true)]
    #[case(-1.0, false)]
    #[case(f64::NAN, false)]
    #[case(f64::INFINITY, false)]
    fn check_free_allocation_baseline_works(#[case] value: f64, #[case] valid: bool) {
        assert_eq!(
            check_free_allocation_baseline(MegaTonnesCO2(value)).is_ok(),
            valid
        );
    }
}
