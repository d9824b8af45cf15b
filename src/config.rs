//! The run configuration: options which apply to every scenario in a run.
//!
//! Options are read from an optional `run.toml` file in the model directory and may be overridden
//! from the command line. Once validated, the configuration is not changed.
use crate::commodity::HydrogenCase;
use crate::input::{input_err_msg, read_toml};
use crate::route::RouteID;
use crate::scenario::ScenarioID;
use crate::solver::SolverKind;
use crate::units::Dimensionless;
use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::convert::Infallible;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

const RUN_CONFIG_FILE_NAME: &str = "run.toml";

/// Which scenarios to run
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ScenarioSelector {
    /// Every scenario with a carbon price path
    #[default]
    All,
    /// A single named scenario
    Single(ScenarioID),
}

impl FromStr for ScenarioSelector {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            Ok(Self::Single(s.into()))
        }
    }
}

impl fmt::Display for ScenarioSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Single(id) => write!(f, "{id}"),
        }
    }
}

impl<'de> Deserialize<'de> for ScenarioSelector {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if s.trim().is_empty() {
            return Err(serde::de::Error::custom("Scenario selector cannot be empty"));
        }

        let Ok(selector) = s.parse();
        Ok(selector)
    }
}

impl Serialize for ScenarioSelector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Options for a model run.
///
/// All fields are optional in `run.toml`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Which scenarios to run ("all" or a scenario ID)
    pub scenario: ScenarioSelector,
    /// Annual discount rate
    pub discount_rate: Dimensionless,
    /// Maximum utilisation of installed capacity, applied on top of each route's own limit
    pub max_utilisation: Dimensionless,
    /// Whether routes with carbon capture are available
    pub capture_enabled: bool,
    /// Routes which are unavailable in every scenario
    pub disabled_routes: Vec<RouteID>,
    /// Which hydrogen price case to use
    pub hydrogen_case: HydrogenCase,
    /// Which solver backend to use
    pub solver: SolverKind,
    /// Whether capacity modules are built in whole numbers
    pub integer_builds: bool,
    /// Time limit for each solve, in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<f64>,
    /// Relative optimality gap at which the MILP solver may stop
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mip_rel_gap: Option<f64>,
    /// Whether to solve scenarios in parallel
    pub parallel: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            scenario: ScenarioSelector::All,
            discount_rate: Dimensionless(0.05),
            max_utilisation: Dimensionless(0.9),
            capture_enabled: true,
            disabled_routes: Vec::new(),
            hydrogen_case: "baseline".into(),
            solver: SolverKind::default(),
            integer_builds: true,
            time_limit: None,
            mip_rel_gap: None,
            parallel: false,
        }
    }
}

impl RunConfig {
    /// Read the run configuration from the model directory.
    ///
    /// If `run.toml` is not present, default options are used.
    pub fn from_model_dir(model_dir: &Path) -> Result<Self> {
        let file_path = model_dir.join(RUN_CONFIG_FILE_NAME);
        if !file_path.is_file() {
            return Ok(Self::default());
        }

        let config: RunConfig = read_toml(&file_path)?;
        config
            .validate()
            .with_context(|| input_err_msg(&file_path))?;

        Ok(config)
    }

    /// Check that the options are in range and consistent with each other
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.discount_rate.0.is_finite() && (0.0..1.0).contains(&self.discount_rate.0),
            "discount_rate must be at least 0 and less than 1"
        );
        ensure!(
            self.max_utilisation.0 > 0.0 && self.max_utilisation.0 <= 1.0,
            "max_utilisation must be greater than 0 and at most 1"
        );
        if let Some(time_limit) = self.time_limit {
            ensure!(
                time_limit.is_finite() && time_limit > 0.0,
                "time_limit must be a positive number of seconds"
            );
        }
        if let Some(gap) = self.mip_rel_gap {
            ensure!(
                gap.is_finite() && gap >= 0.0,
                "mip_rel_gap must be greater than or equal to zero"
            );
        }
        ensure!(
            !(self.integer_builds && !self.solver.supports_integers()),
            "The {} solver cannot handle integer builds; set integer_builds = false",
            self.solver
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use rstest::rstest;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        assert_eq!(
            RunConfig::from_model_dir(dir.path()).unwrap(),
            RunConfig::default()
        );
    }

    #[test]
    fn read_run_toml() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(RUN_CONFIG_FILE_NAME),
            "scenario = \"NGFS_NDCs\"\ncapture_enabled = false\ndisabled_routes = [\"h2_dri\"]\n\
             hydrogen_case = \"optimistic\"\nsolver = \"clarabel\"\ninteger_builds = false\n",
        )
        .unwrap();

        let config = RunConfig::from_model_dir(dir.path()).unwrap();
        assert_eq!(config.scenario, ScenarioSelector::Single("NGFS_NDCs".into()));
        assert!(!config.capture_enabled);
        assert_eq!(config.disabled_routes, [RouteID::from("h2_dri")]);
        assert_eq!(config.hydrogen_case, HydrogenCase::from("optimistic"));
        assert_eq!(config.solver, SolverKind::Clarabel);
        assert_eq!(config.discount_rate, Dimensionless(0.05));
    }

    #[test]
    fn unknown_field() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(RUN_CONFIG_FILE_NAME), "discount = 0.1\n").unwrap();
        assert!(RunConfig::from_model_dir(dir.path()).is_err());
    }

    #[rstest]
    #[case("all", ScenarioSelector::All)]
    #[case(" ALL ", ScenarioSelector::All)]
    #[case("NGFS_Below2C", ScenarioSelector::Single("NGFS_Below2C".into()))]
    fn parse_selector(#[case] s: &str, #[case] expected: ScenarioSelector) {
        assert_eq!(s.parse::<ScenarioSelector>().unwrap(), expected);
    }

    #[rstest]
    #[case(0.0, true)]
    #[case(0.05, true)]
    #[case(-0.01, false)]
    #[case(1.0, false)]
    fn validate_discount_rate(#[case] rate: f64, #[case] valid: bool) {
        let config = RunConfig {
            discount_rate: Dimensionless(rate),
            ..RunConfig::default()
        };
        assert_eq!(config.validate().is_ok(), valid);
    }

    #[rstest]
    #[case(1.0, true)]
    #[case(0.5, true)]
    #[case(0.0, false)]
    #[case(1.1, false)]
    fn validate_max_utilisation(#[case] value: f64, #[case] valid: bool) {
        let config = RunConfig {
            max_utilisation: Dimensionless(value),
            ..RunConfig::default()
        };
        assert_eq!(config.validate().is_ok(), valid);
    }

    #[test]
    fn clarabel_needs_continuous_builds() {
        let config = RunConfig {
            solver: SolverKind::Clarabel,
            ..RunConfig::default()
        };
        assert_error!(
            config.validate(),
            "The clarabel solver cannot handle integer builds; set integer_builds = false"
        );

        let config = RunConfig {
            integer_builds: false,
            ..config
        };
        config.validate().unwrap();
    }
}
