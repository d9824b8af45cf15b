//! Commodities are the materials and energy carriers consumed by technology routes.
use crate::id::define_id_type;
use crate::units::MoneyPerUnit;
use crate::year::{YearMap, interpolate};
use indexmap::IndexMap;
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};
use std::collections::HashMap;

define_id_type! {HydrogenCase}

/// A commodity consumed by production routes.
///
/// The unit of each commodity is fixed: tonnes for materials, GJ for natural gas, MWh for
/// electricity and kg for hydrogen. Route intensities and prices must use the same unit.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    DeserializeLabeledStringEnum,
    SerializeLabeledStringEnum,
)]
pub enum Commodity {
    /// Iron ore (t)
    #[string = "iron_ore"]
    IronOre,
    /// Coking coal (t)
    #[string = "coking_coal"]
    CokingCoal,
    /// Ferrous scrap (t)
    #[string = "scrap"]
    Scrap,
    /// Natural gas (GJ)
    #[string = "natural_gas"]
    NaturalGas,
    /// Electricity (MWh)
    #[string = "electricity"]
    Electricity,
    /// Hydrogen (kg)
    #[string = "hydrogen"]
    Hydrogen,
    /// Fluxes such as limestone (t)
    #[string = "fluxes"]
    Fluxes,
    /// Imported hot briquetted iron (t)
    #[string = "hbi"]
    Hbi,
}

impl Commodity {
    /// All commodities which can appear as route intensities
    pub const ROUTE_INPUTS: [Commodity; 7] = [
        Commodity::IronOre,
        Commodity::CokingCoal,
        Commodity::Scrap,
        Commodity::NaturalGas,
        Commodity::Electricity,
        Commodity::Hydrogen,
        Commodity::Fluxes,
    ];
}

/// Price anchors for a single commodity
pub type PricePath = YearMap<MoneyPerUnit>;

/// Price paths for all commodities.
///
/// Hydrogen is priced separately for each named cost case. All other commodities have a single
/// path. Prices between anchor years are linearly interpolated and held flat outside them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommodityPrices {
    standard: HashMap<Commodity, PricePath>,
    hydrogen: IndexMap<HydrogenCase, PricePath>,
}

impl CommodityPrices {
    /// Set the price path for a commodity other than hydrogen
    pub fn insert(&mut self, commodity: Commodity, path: PricePath) {
        assert_ne!(commodity, Commodity::Hydrogen, "Hydrogen prices need a case");
        self.standard.insert(commodity, path);
    }

    /// Set the hydrogen price path for a cost case
    pub fn insert_hydrogen(&mut self, case: HydrogenCase, path: PricePath) {
        self.hydrogen.insert(case, path);
    }

    /// Whether a price path exists for the commodity (for hydrogen, in the given case)
    pub fn has_price(&self, commodity: Commodity, case: &HydrogenCase) -> bool {
        self.path(commodity, case).is_some()
    }

    /// The known hydrogen cost cases
    pub fn hydrogen_cases(&self) -> impl Iterator<Item = &HydrogenCase> {
        self.hydrogen.keys()
    }

    /// Iterate over all price paths which are not hydrogen
    pub fn iter_standard(&self) -> impl Iterator<Item = (Commodity, &PricePath)> {
        self.standard.iter().map(|(commodity, path)| (*commodity, path))
    }

    fn path(&self, commodity: Commodity, case: &HydrogenCase) -> Option<&PricePath> {
        if commodity == Commodity::Hydrogen {
            self.hydrogen.get(case)
        } else {
            self.standard.get(&commodity)
        }
    }

    /// Get the price of a commodity other than hydrogen in a given year
    pub fn standard_price(&self, commodity: Commodity, year: u32) -> Option<MoneyPerUnit> {
        interpolate(self.standard.get(&commodity)?, year)
    }

    /// Get the price of a commodity in a given year.
    ///
    /// Returns `None` if no price path is defined.
    pub fn price(
        &self,
        commodity: Commodity,
        case: &HydrogenCase,
        year: u32,
    ) -> Option<MoneyPerUnit> {
        interpolate(self.path(commodity, case)?, year)
    }
}
