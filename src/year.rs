//! The annual time grid and helpers for values indexed by year.
use crate::input::is_sorted_and_unique;
use crate::units::{Dimensionless, UnitType};
use anyhow::{Context, Result, ensure};
use itertools::Itertools;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

/// Values indexed by year, in year order
pub type YearMap<T> = BTreeMap<u32, T>;

/// The fixed annual horizon over which the model is solved (inclusive at both ends)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Horizon {
    start: u32,
    end: u32,
}

impl Horizon {
    /// Create a new horizon, checking that it covers at least one year
    pub fn new(start: u32, end: u32) -> Result<Self> {
        ensure!(
            end >= start,
            "End year ({end}) must not be before start year ({start})"
        );

        Ok(Self { start, end })
    }

    /// The first year
    pub fn start(&self) -> u32 {
        self.start
    }

    /// The last year
    pub fn end(&self) -> u32 {
        self.end
    }

    /// Iterate over the years in order
    pub fn years(&self) -> RangeInclusive<u32> {
        self.start..=self.end
    }

    /// All years as a sorted vector
    pub fn year_list(&self) -> Vec<u32> {
        self.years().collect()
    }

    /// Number of years in the horizon
    pub fn len(&self) -> usize {
        (self.end - self.start + 1) as usize
    }

    /// A horizon always contains at least one year
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether the year lies within the horizon
    pub fn contains(&self, year: u32) -> bool {
        self.years().contains(&year)
    }

    /// The year preceding `year` within the horizon, if any
    pub fn previous(&self, year: u32) -> Option<u32> {
        (year > self.start && year <= self.end).then(|| year - 1)
    }

    /// The discount factor `(1 + rate)^-(year - start)` for a year
    pub fn discount_factor(&self, year: u32, rate: Dimensionless) -> Dimensionless {
        let exponent = i32::try_from(year - self.start).expect("Horizon too long");
        Dimensionless(1.0) / (Dimensionless(1.0) + rate).powi(exponent)
    }
}

/// Linearly interpolate a value between anchor years.
///
/// Years before the first anchor take the first anchor's value and years after the last anchor
/// take the last anchor's value. Returns `None` if there are no anchors.
pub fn interpolate<T: UnitType>(anchors: &YearMap<T>, year: u32) -> Option<T> {
    if let Some(value) = anchors.get(&year) {
        return Some(*value);
    }

    let before = anchors.range(..year).next_back();
    let after = anchors.range(year..).next();
    match (before, after) {
        (Some((&y0, &v0)), Some((&y1, &v1))) => {
            let fraction = Dimensionless(f64::from(year - y0) / f64::from(y1 - y0));
            Some(v0 + (v1 - v0) * fraction)
        }
        (Some((_, &value)), None) | (None, Some((_, &value))) => Some(value),
        (None, None) => None,
    }
}

/// Parse a single year and check that it belongs to `valid_years`
fn parse_single_year(s: &str, valid_years: &[u32]) -> Result<u32> {
    let trimmed = s.trim();
    trimmed
        .parse::<u32>()
        .ok()
        .filter(|year| valid_years.binary_search(year).is_ok())
        .with_context(|| format!("Invalid year: {trimmed}"))
}

/// Parse a string of years into a vector of years.
///
/// Accepted forms are "all" (case-insensitive), a single year, a semicolon-separated list of
/// years (e.g. "2025;2030") or a range with optional ends (e.g. "2025..2030", "2030..", "..2030").
/// Ranges select the valid years they contain.
///
/// # Arguments
///
/// - `s` - Input string to parse
/// - `valid_years` - The years which can be referenced in `s` (must be sorted and unique)
///
/// # Panics
///
/// If `valid_years` is unsorted or non-unique.
pub fn parse_year_str(s: &str, valid_years: &[u32]) -> Result<Vec<u32>> {
    assert!(
        is_sorted_and_unique(valid_years),
        "`valid_years` must be sorted and unique"
    );

    let s = s.trim();
    ensure!(!s.is_empty(), "No years provided");

    if s.eq_ignore_ascii_case("all") {
        return Ok(valid_years.to_vec());
    }

    ensure!(
        !(s.contains(';') && s.contains("..")),
        "Year string {s} mixes ';' and '..'"
    );

    let years: Vec<u32> = if s.contains("..") {
        parse_year_range(s, valid_years)?
    } else {
        s.split(';')
            .map(|year| parse_single_year(year, valid_years))
            .try_collect()?
    };

    ensure!(
        is_sorted_and_unique(&years),
        "Years must be in order and unique"
    );

    Ok(years)
}

/// Parse a year range of the form `start..end`, where either limit may be omitted
fn parse_year_range(s: &str, valid_years: &[u32]) -> Result<Vec<u32>> {
    let Some((left, right)) = s.split("..").collect_tuple() else {
        anyhow::bail!("Year range must be of the form 'start..end', 'start..' or '..end': {s}");
    };

    let parse_limit = |limit: &str, default: u32, which: &str| -> Result<u32> {
        let limit = limit.trim();
        if limit.is_empty() {
            return Ok(default);
        }
        limit
            .parse::<u32>()
            .ok()
            .with_context(|| format!("Invalid {which} year in range: {limit}"))
    };
    let first = *valid_years.first().context("No valid years")?;
    let last = *valid_years.last().context("No valid years")?;
    let start = parse_limit(left, first, "start")?;
    let end = parse_limit(right, last, "end")?;

    ensure!(end > start, "End year must be after start year in range {s}");
    let years = valid_years
        .iter()
        .copied()
        .filter(|year| (start..=end).contains(year))
        .collect_vec();
    ensure!(!years.is_empty(), "No valid years found in range {s}");

    Ok(years)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use crate::units::MoneyPerUnit;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[rstest]
    #[case("2025", &[2025, 2026], &[2025])]
    #[case("all", &[2025, 2026], &[2025, 2026])]
    #[case(" ALL ", &[2025, 2026], &[2025, 2026])]
    #[case("2025; 2026", &[2025, 2026], &[2025, 2026])]
    #[case("2020..2031", &[2025, 2030], &[2025, 2030])]
    #[case("..2027", &[2025, 2030], &[2025])]
    #[case("2026..", &[2025, 2030], &[2030])]
    #[case("..", &[2025, 2030], &[2025, 2030])]
    fn parse_year_str_valid(
        #[case] input: &str,
        #[case] valid_years: &[u32],
        #[case] expected: &[u32],
    ) {
        assert_eq!(parse_year_str(input, valid_years).unwrap(), expected);
    }

    #[rstest]
    #[case("", &[2025], "No years provided")]
    #[case("2024", &[2025], "Invalid year: 2024")]
    #[case("x;2025", &[2025], "Invalid year: x")]
    #[case("2026;2025", &[2025, 2026], "Years must be in order and unique")]
    #[case("2025;2025..2026", &[2025, 2026], "Year string 2025;2025..2026 mixes ';' and '..'")]
    #[case("2026..2025", &[2025, 2026], "End year must be after start year in range 2026..2025")]
    #[case("2026..2029", &[2025, 2030], "No valid years found in range 2026..2029")]
    fn parse_year_str_invalid(
        #[case] input: &str,
        #[case] valid_years: &[u32],
        #[case] error_msg: &str,
    ) {
        assert_error!(parse_year_str(input, valid_years), error_msg);
    }

    #[test]
    fn horizon_years() {
        let horizon = Horizon::new(2025, 2030).unwrap();
        assert_eq!(horizon.len(), 6);
        assert_eq!(horizon.previous(2025), None);
        assert_eq!(horizon.previous(2026), Some(2025));
        assert!(!horizon.contains(2031));
        assert!(Horizon::new(2030, 2025).is_err());
    }

    #[test]
    fn discount_factor() {
        let horizon = Horizon::new(2025, 2050).unwrap();
        let rate = Dimensionless(0.05);
        assert_eq!(horizon.discount_factor(2025, rate), Dimensionless(1.0));
        assert_approx_eq!(
            Dimensionless,
            horizon.discount_factor(2027, rate),
            Dimensionless(1.0 / 1.1025)
        );
    }

    #[test]
    fn interpolate_between_and_beyond_anchors() {
        let anchors: YearMap<_> = [(2025, MoneyPerUnit(100.0)), (2035, MoneyPerUnit(50.0))].into();
        assert_eq!(interpolate(&anchors, 2020), Some(MoneyPerUnit(100.0)));
        assert_eq!(interpolate(&anchors, 2030), Some(MoneyPerUnit(75.0)));
        assert_eq!(interpolate(&anchors, 2050), Some(MoneyPerUnit(50.0)));
        assert_eq!(interpolate(&YearMap::<MoneyPerUnit>::new(), 2030), None);
    }
}
