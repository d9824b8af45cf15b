//! Code for reading technology routes from `routes.csv` and `route_intensities.csv`.
use super::{format_items_with_cap, input_err_msg, read_csv};
use crate::commodity::Commodity;
use crate::route::{IntensityMap, RouteID, RouteMap, RouteSpec};
use crate::units::{EmissionFactor, Intensity, MoneyPerTonne};
use anyhow::{Context, Result, bail, ensure};
use indexmap::IndexMap;
use itertools::Itertools;
use serde::Deserialize;
use std::path::Path;

const ROUTES_FILE_NAME: &str = "routes.csv";
const ROUTE_INTENSITIES_FILE_NAME: &str = "route_intensities.csv";

/// Represents a row of the route intensities CSV file
#[derive(Debug, Deserialize, PartialEq)]
struct RouteIntensityRaw {
    route_id: RouteID,
    iron_ore: Intensity,
    coking_coal: Intensity,
    scrap: Intensity,
    natural_gas: Intensity,
    electricity: Intensity,
    hydrogen: Intensity,
    fluxes: Intensity,
    alloys_cost: MoneyPerTonne,
    emission_factor: EmissionFactor,
}

impl RouteIntensityRaw {
    /// Commodity intensities, in the same order as [`Commodity::ROUTE_INPUTS`]
    fn intensities(&self) -> IntensityMap {
        Commodity::ROUTE_INPUTS
            .into_iter()
            .zip([
                self.iron_ore,
                self.coking_coal,
                self.scrap,
                self.natural_gas,
                self.electricity,
                self.hydrogen,
                self.fluxes,
            ])
            .collect()
    }
}

/// Read technology routes from the specified model directory.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
///
/// # Returns
///
/// A map of routes keyed by ID, in file order
pub fn read_routes(model_dir: &Path) -> Result<RouteMap> {
    let routes_path = model_dir.join(ROUTES_FILE_NAME);
    let specs = read_csv::<RouteSpec>(&routes_path)?;
    let specs = read_route_specs_from_iter(specs).with_context(|| input_err_msg(&routes_path))?;

    let intensities_path = model_dir.join(ROUTE_INTENSITIES_FILE_NAME);
    let intensities = read_csv::<RouteIntensityRaw>(&intensities_path)?;
    combine_routes(specs, intensities).with_context(|| input_err_msg(&intensities_path))
}

/// Collect route specifications, checking for duplicate IDs
fn read_route_specs_from_iter<I>(iter: I) -> Result<IndexMap<RouteID, RouteSpec>>
where
    I: Iterator<Item = RouteSpec>,
{
    let mut map = IndexMap::new();
    for spec in iter {
        let id = spec.id.clone();
        if map.insert(id.clone(), spec).is_some() {
            bail!("Duplicate route ID {id}");
        }
    }

    Ok(map)
}

/// Attach intensity data to route specifications.
///
/// Every route must have exactly one row of intensity data and every row must refer to a known
/// route.
fn combine_routes<I>(specs: IndexMap<RouteID, RouteSpec>, iter: I) -> Result<RouteMap>
where
    I: Iterator<Item = RouteIntensityRaw>,
{
    let mut rows = IndexMap::new();
    for row in iter {
        ensure!(
            specs.contains_key(&row.route_id),
            "Intensities given for unknown route {}",
            row.route_id
        );
        let id = row.route_id.clone();
        if rows.insert(id.clone(), row).is_some() {
            bail!("Duplicate intensities for route {id}");
        }
    }

    let missing = specs.keys().filter(|id| !rows.contains_key(*id)).collect_vec();
    ensure!(
        missing.is_empty(),
        "No intensities given for routes: {}",
        format_items_with_cap(missing)
    );

    Ok(specs
        .into_iter()
        .map(|(id, spec)| {
            let row = &rows[&id];
            let route = spec.into_route(row.intensities(), row.alloys_cost, row.emission_factor);
            (id, route)
        })
        .collect())
}
