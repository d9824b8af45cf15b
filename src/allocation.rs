//! The free allocation schedule, derived from an industry-wide emissions cap.
use crate::units::{Dimensionless, MegaTonnesCO2};
use crate::year::{Horizon, YearMap, interpolate};
use anyhow::{Context, Result, ensure};
use itertools::Itertools;
use log::warn;

/// Derive the annual free allocation for the firm.
///
/// The firm's allocation in the first year of the horizon is `baseline`. In later years it is
/// scaled in proportion to the industry cap, which is linearly interpolated between anchor years:
/// `allocation[t] = baseline × cap(t) / cap(start)`.
///
/// # Arguments
///
/// * `baseline` - Free allocation in the first year of the horizon
/// * `industry_cap` - Industry-wide cap at anchor years
/// * `horizon` - The model horizon
pub fn free_allocation_schedule(
    baseline: MegaTonnesCO2,
    industry_cap: &YearMap<MegaTonnesCO2>,
    horizon: &Horizon,
) -> Result<YearMap<MegaTonnesCO2>> {
    let start_cap =
        interpolate(industry_cap, horizon.start()).context("No industry cap anchors given")?;
    ensure!(
        start_cap > MegaTonnesCO2(0.0),
        "Industry cap in {} must be greater than zero",
        horizon.start()
    );

    let schedule: YearMap<_> = horizon
        .years()
        .map(|year| {
            // Anchors exist, so interpolation always succeeds
            let cap = interpolate(industry_cap, year).unwrap_or(start_cap);
            let scale: Dimensionless = cap / start_cap;
            (year, baseline * scale)
        })
        .collect();

    if schedule.values().tuple_windows().any(|(a, b)| b > a) {
        warn!("Free allocation increases in some years; it is expected to decline over time");
    }

    Ok(schedule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;

    #[test]
    fn allocation_follows_industry_cap() {
        let horizon = Horizon::new(2025, 2035).unwrap();
        let anchors: YearMap<_> = [
            (2025, MegaTonnesCO2(100.0)),
            (2035, MegaTonnesCO2(50.0)),
        ]
        .into();
        let schedule =
            free_allocation_schedule(MegaTonnesCO2(40.0), &anchors, &horizon).unwrap();

        assert_eq!(schedule.len(), 11);
        assert_eq!(schedule[&2025], MegaTonnesCO2(40.0));
        assert_eq!(schedule[&2030], MegaTonnesCO2(30.0));
        assert_eq!(schedule[&2035], MegaTonnesCO2(20.0));
    }

    #[test]
    fn allocation_needs_positive_start_cap() {
        let horizon = Horizon::new(2025, 2030).unwrap();
        let anchors: YearMap<_> = [(2025, MegaTonnesCO2(0.0))].into();
        assert_error!(
            free_allocation_schedule(MegaTonnesCO2(40.0), &anchors, &horizon),
            "Industry cap in 2025 must be greater than zero"
        );
    }
}
