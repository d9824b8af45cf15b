//! Newtypes for the physical and monetary quantities used in the model.
//!
//! Quantities of steel, feedstock and emissions are carried in megatonnes throughout. Prices are
//! always quoted per base unit (tonne), so the only way to turn a megatonne quantity into money is
//! to convert it explicitly first (e.g. [`MegaTonnes::to_tonnes`]). No `Mul` impl exists between a
//! megatonne quantity and a price.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, Mul, Sub, SubAssign};

/// Number of base units in one megaunit
const MEGA: f64 = 1e6;

/// Common behaviour for all unit types
pub trait UnitType:
    fmt::Debug
    + Copy
    + PartialEq
    + PartialOrd
    + Add<Output = Self>
    + Sub<Output = Self>
    + AddAssign
    + SubAssign
    + Sum
    + Mul<Dimensionless, Output = Self>
    + Div<Dimensionless, Output = Self>
{
    /// Create from an `f64` value
    fn new(value: f64) -> Self;

    /// The underlying `f64` value
    fn value(&self) -> f64;

    /// Whether the value is neither infinite nor NaN
    fn is_finite(&self) -> bool {
        self.value().is_finite()
    }

    /// The absolute value
    fn abs(&self) -> Self {
        Self::new(self.value().abs())
    }

    /// The larger of two values
    fn max(self, other: Self) -> Self {
        Self::new(self.value().max(other.value()))
    }

    /// The smaller of two values
    fn min(self, other: Self) -> Self {
        Self::new(self.value().min(other.value()))
    }
}

macro_rules! unit_struct {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Default,
            Clone,
            Copy,
            PartialEq,
            PartialOrd,
            Serialize,
            Deserialize,
            derive_more::Add,
            derive_more::Sub,
            derive_more::AddAssign,
            derive_more::SubAssign,
            derive_more::Sum,
        )]
        #[serde(transparent)]
        pub struct $name(pub f64);

        impl UnitType for $name {
            fn new(value: f64) -> Self {
                Self(value)
            }

            fn value(&self) -> f64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl float_cmp::ApproxEq for $name {
            type Margin = float_cmp::F64Margin;

            fn approx_eq<M: Into<Self::Margin>>(self, other: Self, margin: M) -> bool {
                float_cmp::ApproxEq::approx_eq(self.0, other.0, margin)
            }
        }

        impl Div for $name {
            type Output = Dimensionless;

            fn div(self, rhs: Self) -> Dimensionless {
                Dimensionless(self.0 / rhs.0)
            }
        }
    };
}

macro_rules! scalable_unit_struct {
    ($(#[$meta:meta])* $name:ident) => {
        unit_struct!($(#[$meta])* $name);

        impl Mul<Dimensionless> for $name {
            type Output = $name;

            fn mul(self, rhs: Dimensionless) -> $name {
                $name(self.0 * rhs.0)
            }
        }

        impl Mul<$name> for Dimensionless {
            type Output = $name;

            fn mul(self, rhs: $name) -> $name {
                $name(self.0 * rhs.0)
            }
        }

        impl Div<Dimensionless> for $name {
            type Output = $name;

            fn div(self, rhs: Dimensionless) -> $name {
                $name(self.0 / rhs.0)
            }
        }
    };
}

/// Implement `Lhs * Rhs = Out` (in both orders)
macro_rules! impl_mul {
    ($lhs:ident, $rhs:ident, $out:ident) => {
        impl Mul<$rhs> for $lhs {
            type Output = $out;

            fn mul(self, rhs: $rhs) -> $out {
                $out(self.0 * rhs.0)
            }
        }

        impl Mul<$lhs> for $rhs {
            type Output = $out;

            fn mul(self, rhs: $lhs) -> $out {
                $out(self.0 * rhs.0)
            }
        }
    };
}

/// Implement `Lhs / Rhs = Out`
macro_rules! impl_div {
    ($lhs:ident, $rhs:ident, $out:ident) => {
        impl Div<$rhs> for $lhs {
            type Output = $out;

            fn div(self, rhs: $rhs) -> $out {
                $out(self.0 / rhs.0)
            }
        }
    };
}

unit_struct!(
    /// A dimensionless quantity (fraction, rate or factor)
    Dimensionless
);

impl Mul for Dimensionless {
    type Output = Dimensionless;

    fn mul(self, rhs: Self) -> Self {
        Dimensionless(self.0 * rhs.0)
    }
}

impl Dimensionless {
    /// Raise to an integer power
    pub fn powi(self, n: i32) -> Self {
        Dimensionless(self.0.powi(n))
    }
}

scalable_unit_struct!(
    /// A quantity of steel or feedstock in megatonnes (per year, when used as a flow)
    MegaTonnes
);
scalable_unit_struct!(
    /// Installed annual production capacity in megatonnes per year
    Capacity
);
scalable_unit_struct!(
    /// Emissions in megatonnes of CO2
    MegaTonnesCO2
);
scalable_unit_struct!(
    /// Emissions in tonnes of CO2
    TonnesCO2
);
scalable_unit_struct!(
    /// Direct emissions per unit of output (tCO2/t, equivalently MtCO2/Mt)
    EmissionFactor
);
scalable_unit_struct!(
    /// An amount of money in USD
    Money
);
scalable_unit_struct!(
    /// Cost per tonne of output in USD/t
    MoneyPerTonne
);
scalable_unit_struct!(
    /// Carbon price in USD/tCO2
    MoneyPerTonneCO2
);
scalable_unit_struct!(
    /// Cost per tonne-per-year of capacity (capital cost or annual fixed O&M)
    MoneyPerTonnePerYear
);
scalable_unit_struct!(
    /// A quantity of steel or feedstock in tonnes
    Tonnes
);
scalable_unit_struct!(
    /// Capacity in tonnes per year
    TonnesPerYear
);
scalable_unit_struct!(
    /// Consumption of a commodity per tonne of output, in the commodity's own unit
    Intensity
);
scalable_unit_struct!(
    /// Price of one unit of a commodity in USD
    MoneyPerUnit
);

impl MegaTonnes {
    /// Convert to tonnes
    pub fn to_tonnes(self) -> Tonnes {
        Tonnes(self.0 * MEGA)
    }
}

impl MegaTonnesCO2 {
    /// Convert to tonnes of CO2
    pub fn to_tonnes(self) -> TonnesCO2 {
        TonnesCO2(self.0 * MEGA)
    }
}

impl Capacity {
    /// Convert to tonnes per year
    pub fn to_tonnes_per_year(self) -> TonnesPerYear {
        TonnesPerYear(self.0 * MEGA)
    }
}

impl_mul!(MegaTonnes, EmissionFactor, MegaTonnesCO2);
impl_mul!(Tonnes, MoneyPerTonne, Money);
impl_mul!(TonnesCO2, MoneyPerTonneCO2, Money);
impl_mul!(TonnesPerYear, MoneyPerTonnePerYear, Money);
impl_mul!(Intensity, MoneyPerUnit, MoneyPerTonne);
impl_div!(MegaTonnesCO2, MegaTonnes, EmissionFactor);
