//! Derivation of the firm's cumulative carbon budget and the compliance test against it.
//!
//! The firm-level baseline is `national_baseline × sector_share × firm_share`. A decline schedule
//! turns this into an annual trajectory, and the budget is the sum of the trajectory over the
//! model horizon (or a fixed override, if one is given).
use crate::input::deserialise_proportion;
use crate::units::{Dimensionless, MegaTonnesCO2, UnitType};
use crate::year::{Horizon, YearMap};
use anyhow::{Result, ensure};
use serde::{Deserialize, Serialize};

/// Parameters from which the carbon budget is derived
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BudgetParameters {
    /// National emissions in the baseline year
    pub national_baseline: MegaTonnesCO2,
    /// Share of national emissions attributed to the steel sector
    #[serde(deserialize_with = "deserialise_proportion")]
    pub sector_share: Dimensionless,
    /// Share of sector emissions attributed to the firm
    #[serde(deserialize_with = "deserialise_proportion")]
    pub firm_share: Dimensionless,
    /// The year to which the baseline refers
    pub baseline_year: u32,
    /// The year in which the final level is reached
    pub target_year: u32,
    /// The final level as a fraction of the baseline (near zero for net-zero targets)
    #[serde(default, deserialize_with = "deserialise_proportion")]
    pub final_fraction: Dimensionless,
    /// How emissions decline from the baseline to the final level
    pub schedule: DeclineSchedule,
    /// Use this cumulative budget instead of the derived one
    pub budget_override: Option<MegaTonnesCO2>,
}

/// The shape of the decline from the baseline towards the final level
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "shape", rename_all = "snake_case", deny_unknown_fields)]
pub enum DeclineSchedule {
    /// Straight line from the baseline to the final level
    Linear,
    /// Moderate decline to an intermediate milestone, then a steeper decline to the final level
    TwoPhase {
        /// The year of the intermediate milestone (e.g. an NDC year)
        milestone_year: u32,
        /// Reduction relative to the baseline reached at the milestone
        milestone_reduction: Dimensionless,
    },
    /// Piecewise-constant levels as fractions of the baseline
    Stepwise {
        /// Levels, each applying from its year until the next step
        steps: Vec<Step>,
    },
}

/// One step of a stepwise decline schedule
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Step {
    /// The first year at which the level applies
    pub from_year: u32,
    /// Level as a fraction of the baseline
    pub fraction: Dimensionless,
}

impl BudgetParameters {
    /// Firm-level emissions in the baseline year
    pub fn firm_baseline(&self) -> MegaTonnesCO2 {
        self.national_baseline * self.sector_share * self.firm_share
    }

    /// Check the parameters are consistent
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.national_baseline.is_finite() && self.national_baseline > MegaTonnesCO2(0.0),
            "national_baseline must be a finite number greater than zero"
        );
        ensure!(
            self.target_year > self.baseline_year,
            "target_year must be after baseline_year"
        );

        match &self.schedule {
            DeclineSchedule::Linear => {}
            DeclineSchedule::TwoPhase {
                milestone_year,
                milestone_reduction,
            } => {
                ensure!(
                    (self.baseline_year + 1..self.target_year).contains(milestone_year),
                    "milestone_year must lie strictly between baseline_year and target_year"
                );
                ensure!(
                    (0.0..=1.0).contains(&milestone_reduction.0),
                    "milestone_reduction must be between 0 and 1"
                );
                ensure!(
                    Dimensionless(1.0) - *milestone_reduction >= self.final_fraction,
                    "milestone level must not be below the final level"
                );
            }
            DeclineSchedule::Stepwise { steps } => {
                ensure!(!steps.is_empty(), "Stepwise schedule needs at least one step");
                ensure!(
                    steps.windows(2).all(|w| w[0].from_year < w[1].from_year),
                    "Steps must be in year order and unique"
                );
                ensure!(
                    steps.iter().all(|s| s.fraction.is_finite() && s.fraction.0 >= 0.0),
                    "Step fractions must be non-negative"
                );
            }
        }

        if let Some(budget) = self.budget_override {
            ensure!(
                budget.is_finite() && budget > MegaTonnesCO2(0.0),
                "budget_override must be a finite number greater than zero"
            );
        }

        Ok(())
    }

    /// The level of the trajectory in a year, as a fraction of the baseline
    fn fraction_in(&self, year: u32) -> Dimensionless {
        let linear = |from_year: u32, from: Dimensionless, to_year: u32, to: Dimensionless| {
            if year <= from_year {
                from
            } else if year >= to_year {
                to
            } else {
                let progress =
                    Dimensionless(f64::from(year - from_year) / f64::from(to_year - from_year));
                from + (to - from) * progress
            }
        };

        match &self.schedule {
            DeclineSchedule::Linear => linear(
                self.baseline_year,
                Dimensionless(1.0),
                self.target_year,
                self.final_fraction,
            ),
            DeclineSchedule::TwoPhase {
                milestone_year,
                milestone_reduction,
            } => {
                let milestone = Dimensionless(1.0) - *milestone_reduction;
                if year <= *milestone_year {
                    linear(
                        self.baseline_year,
                        Dimensionless(1.0),
                        *milestone_year,
                        milestone,
                    )
                } else {
                    linear(
                        *milestone_year,
                        milestone,
                        self.target_year,
                        self.final_fraction,
                    )
                }
            }
            DeclineSchedule::Stepwise { steps } => steps
                .iter()
                .rev()
                .find(|step| step.from_year <= year)
                .map_or(Dimensionless(1.0), |step| step.fraction),
        }
    }
}

/// The cumulative carbon budget and the annual trajectory it was derived from
#[derive(Debug, Clone, PartialEq)]
pub struct CarbonBudget {
    /// Annual firm-level trajectory over the horizon
    pub trajectory: YearMap<MegaTonnesCO2>,
    /// The cumulative budget
    pub total: MegaTonnesCO2,
}

impl CarbonBudget {
    /// Derive the budget for a horizon from the given parameters
    pub fn derive(params: &BudgetParameters, horizon: &Horizon) -> Self {
        let baseline = params.firm_baseline();
        let trajectory: YearMap<_> = horizon
            .years()
            .map(|year| (year, baseline * params.fraction_in(year)))
            .collect();
        let total = params
            .budget_override
            .unwrap_or_else(|| trajectory.values().copied().sum());

        Self { trajectory, total }
    }
}

/// The outcome of comparing a scenario's emissions with the carbon budget
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComplianceReport {
    /// Sum of annual emissions over the horizon
    pub cumulative_emissions: MegaTonnesCO2,
    /// The cumulative budget
    pub budget: MegaTonnesCO2,
    /// Emissions in excess of the budget (negative when under budget)
    pub overshoot: MegaTonnesCO2,
    /// Overshoot as a percentage of the budget
    pub overshoot_pct: f64,
    /// Cumulative emissions as a percentage of the budget
    pub utilisation_pct: f64,
    /// Whether cumulative emissions are within the budget (equality is compliant)
    pub compliant: bool,
}

/// Compare annual emissions with a carbon budget.
///
/// The budget must be positive, which is checked when the parameter snapshot is validated.
pub fn evaluate_compliance<I>(emissions: I, budget: &CarbonBudget) -> ComplianceReport
where
    I: IntoIterator<Item = MegaTonnesCO2>,
{
    let cumulative_emissions: MegaTonnesCO2 = emissions.into_iter().sum();
    let overshoot = cumulative_emissions - budget.total;

    ComplianceReport {
        cumulative_emissions,
        budget: budget.total,
        overshoot,
        overshoot_pct: (overshoot / budget.total).0 * 100.0,
        utilisation_pct: (cumulative_emissions / budget.total).0 * 100.0,
        compliant: cumulative_emissions <= budget.total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, budget_parameters};
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    fn budget_of(total: f64) -> CarbonBudget {
        CarbonBudget {
            trajectory: YearMap::new(),
            total: MegaTonnesCO2(total),
        }
    }

    #[rstest]
    fn firm_baseline(budget_parameters: BudgetParameters) {
        assert_approx_eq!(
            MegaTonnesCO2,
            budget_parameters.firm_baseline(),
            MegaTonnesCO2(727.6 * 0.12 * 0.6)
        );
    }

    #[rstest]
    fn two_phase_trajectory(budget_parameters: BudgetParameters) {
        // Baseline 2018, 40% cut by 2030, zero by 2050
        let horizon = Horizon::new(2025, 2050).unwrap();
        let budget = CarbonBudget::derive(&budget_parameters, &horizon);
        let baseline = budget_parameters.firm_baseline();

        assert_approx_eq!(
            MegaTonnesCO2,
            budget.trajectory[&2030],
            baseline * Dimensionless(0.6)
        );
        assert_approx_eq!(
            MegaTonnesCO2,
            budget.trajectory[&2040],
            baseline * Dimensionless(0.3)
        );
        assert_approx_eq!(MegaTonnesCO2, budget.trajectory[&2050], MegaTonnesCO2(0.0));
        assert_approx_eq!(
            MegaTonnesCO2,
            budget.total,
            budget.trajectory.values().copied().sum()
        );
    }

    #[rstest]
    fn linear_trajectory(mut budget_parameters: BudgetParameters) {
        budget_parameters.schedule = DeclineSchedule::Linear;
        budget_parameters.baseline_year = 2025;
        let horizon = Horizon::new(2025, 2050).unwrap();
        let budget = CarbonBudget::derive(&budget_parameters, &horizon);

        let baseline = budget_parameters.firm_baseline();
        assert_eq!(budget.trajectory[&2025], baseline);
        assert_approx_eq!(
            MegaTonnesCO2,
            budget.total,
            baseline * Dimensionless(13.0),
            epsilon = 1e-6
        );
    }

    #[rstest]
    fn stepwise_trajectory(mut budget_parameters: BudgetParameters) {
        budget_parameters.schedule = DeclineSchedule::Stepwise {
            steps: vec![
                Step {
                    from_year: 2030,
                    fraction: Dimensionless(0.5),
                },
                Step {
                    from_year: 2040,
                    fraction: Dimensionless(0.1),
                },
            ],
        };
        let horizon = Horizon::new(2025, 2045).unwrap();
        let budget = CarbonBudget::derive(&budget_parameters, &horizon);
        let baseline = budget_parameters.firm_baseline();

        assert_eq!(budget.trajectory[&2029], baseline);
        assert_eq!(budget.trajectory[&2030], baseline * Dimensionless(0.5));
        assert_eq!(budget.trajectory[&2045], baseline * Dimensionless(0.1));
    }

    #[rstest]
    fn budget_override(mut budget_parameters: BudgetParameters) {
        budget_parameters.budget_override = Some(MegaTonnesCO2(123.0));
        let horizon = Horizon::new(2025, 2050).unwrap();
        let budget = CarbonBudget::derive(&budget_parameters, &horizon);
        assert_eq!(budget.total, MegaTonnesCO2(123.0));
        assert_eq!(budget.trajectory.len(), 26);
    }

    #[rstest]
    fn validate_rejects_bad_milestone(mut budget_parameters: BudgetParameters) {
        budget_parameters.schedule = DeclineSchedule::TwoPhase {
            milestone_year: 2060,
            milestone_reduction: Dimensionless(0.4),
        };
        assert_error!(
            budget_parameters.validate(),
            "milestone_year must lie strictly between baseline_year and target_year"
        );
    }

    #[test]
    fn compliance_under_budget() {
        let emissions = [MegaTonnesCO2(30.0), MegaTonnesCO2(20.0)];
        let report = evaluate_compliance(emissions, &budget_of(100.0));
        assert_eq!(report.cumulative_emissions, MegaTonnesCO2(50.0));
        assert_eq!(report.overshoot, MegaTonnesCO2(-50.0));
        assert_eq!(report.overshoot_pct, -50.0);
        assert_eq!(report.utilisation_pct, 50.0);
        assert!(report.compliant);
    }

    #[test]
    fn compliance_at_boundary() {
        let emissions = [MegaTonnesCO2(60.0), MegaTonnesCO2(40.0)];
        let report = evaluate_compliance(emissions, &budget_of(100.0));
        assert_eq!(report.overshoot, MegaTonnesCO2(0.0));
        assert!(report.compliant);
    }

    #[test]
    fn compliance_over_budget() {
        let emissions = [MegaTonnesCO2(60.0), MegaTonnesCO2(60.0)];
        let report = evaluate_compliance(emissions, &budget_of(100.0));
        assert!(!report.compliant);
        assert_approx_eq!(f64, report.overshoot_pct, 20.0, epsilon = 1e-9);
    }
}
