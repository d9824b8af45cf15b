//! Technology routes are the distinct steelmaking pathways between which the model chooses.
use crate::commodity::Commodity;
use crate::id::{define_id_getter, define_id_type};
use crate::units::{
    Capacity, Dimensionless, EmissionFactor, Intensity, MoneyPerTonne, MoneyPerTonnePerYear,
};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};

define_id_type! {RouteID}

/// A map of [`TechnologyRoute`]s, keyed by route ID
pub type RouteMap = IndexMap<RouteID, TechnologyRoute>;

/// Consumption of each commodity per tonne of route output
pub type IntensityMap = IndexMap<Commodity, Intensity>;

/// What a route produces and from what
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    DeserializeLabeledStringEnum,
    SerializeLabeledStringEnum,
)]
pub enum RouteKind {
    /// Produces crude steel from ore (e.g. blast furnace with basic oxygen furnace)
    #[string = "integrated"]
    Integrated,
    /// Produces reduced iron, which is charged to melting routes
    #[string = "reduction"]
    Reduction,
    /// Produces crude steel from metallics (scrap, imported HBI and reduced iron)
    #[string = "melting"]
    Melting,
}

impl RouteKind {
    /// Whether output of this kind of route counts towards steel demand
    pub fn produces_steel(self) -> bool {
        matches!(self, RouteKind::Integrated | RouteKind::Melting)
    }
}

/// A technology route.
///
/// Immutable once loaded.
#[derive(PartialEq, Debug, Clone)]
pub struct TechnologyRoute {
    /// Unique identifier (e.g. "bf_bof")
    pub id: RouteID,
    /// Text description
    pub description: String,
    /// What the route produces
    pub kind: RouteKind,
    /// Capital cost per tonne-per-year of installed capacity
    pub capital_cost: MoneyPerTonnePerYear,
    /// Size of one capacity module
    pub module_size: Capacity,
    /// Annual fixed operating and maintenance cost per tonne-per-year of capacity
    pub fixed_opex: MoneyPerTonnePerYear,
    /// Capacity installed before the first year of the horizon
    pub initial_capacity: Capacity,
    /// Minimum utilisation of installed capacity
    pub min_utilisation: Dimensionless,
    /// Maximum utilisation of installed capacity
    pub max_utilisation: Dimensionless,
    /// First year in which new modules may be built, if restricted
    pub available_from: Option<u32>,
    /// Whether the route depends on carbon capture
    pub capture: bool,
    /// Commodity consumption per tonne of output
    pub intensities: IntensityMap,
    /// Cost of alloys and other consumables per tonne of output
    pub alloys_cost: MoneyPerTonne,
    /// Gross direct emissions per tonne of output
    pub emission_factor: EmissionFactor,
}
define_id_getter! {TechnologyRoute, RouteID}

impl TechnologyRoute {
    /// Consumption of the given commodity per tonne of output
    pub fn intensity(&self, commodity: Commodity) -> Intensity {
        self.intensities
            .get(&commodity)
            .copied()
            .unwrap_or_default()
    }

    /// Iterate over commodities consumed in non-zero quantity
    pub fn iter_inputs(&self) -> impl Iterator<Item = (Commodity, Intensity)> + '_ {
        self.intensities
            .iter()
            .filter(|(_, intensity)| intensity.0 > 0.0)
            .map(|(commodity, intensity)| (*commodity, *intensity))
    }

    /// Whether new modules may be built in the given year
    pub fn can_build_in(&self, year: u32) -> bool {
        self.available_from.is_none_or(|from| year >= from)
    }

    /// The emission factor net of carbon capture at the given capture rate
    pub fn net_emission_factor(&self, capture_rate: Dimensionless) -> EmissionFactor {
        if self.capture {
            self.emission_factor * (Dimensionless(1.0) - capture_rate)
        } else {
            self.emission_factor
        }
    }
}

/// A row of the route specification file, before intensities are attached
#[derive(Debug, Deserialize, PartialEq)]
pub struct RouteSpec {
    /// Unique identifier
    pub id: RouteID,
    /// Text description
    pub description: String,
    /// What the route produces
    pub kind: RouteKind,
    /// Capital cost (USD per t/yr)
    pub capital_cost: MoneyPerTonnePerYear,
    /// Module size (Mt/yr)
    pub module_size: Capacity,
    /// Fixed O&M (USD per t/yr per year)
    pub fixed_opex: MoneyPerTonnePerYear,
    /// Initial capacity (Mt/yr)
    #[serde(default)]
    pub initial_capacity: Capacity,
    /// Minimum utilisation
    #[serde(default)]
    pub min_utilisation: Dimensionless,
    /// Maximum utilisation
    pub max_utilisation: Dimensionless,
    /// First year builds are allowed
    pub available_from: Option<u32>,
    /// Whether the route relies on carbon capture
    #[serde(default)]
    pub capture: bool,
}

impl RouteSpec {
    /// Combine with intensity data to form a complete route
    pub fn into_route(
        self,
        intensities: IntensityMap,
        alloys_cost: MoneyPerTonne,
        emission_factor: EmissionFactor,
    ) -> TechnologyRoute {
        TechnologyRoute {
            id: self.id,
            description: self.description,
            kind: self.kind,
            capital_cost: self.capital_cost,
            module_size: self.module_size,
            fixed_opex: self.fixed_opex,
            initial_capacity: self.initial_capacity,
            min_utilisation: self.min_utilisation,
            max_utilisation: self.max_utilisation,
            available_from: self.available_from,
            capture: self.capture,
            intensities,
            alloys_cost,
            emission_factor,
        }
    }
}
