//! Closed vocabularies for price reports
//!
//! The market-oriented deployment restricts products, units, markets and
//! months to the fixed lists below. The store-oriented deployment accepts
//! free-text products and the full unit list.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Staple goods tracked by the market-oriented deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Product {
    Milk,
    Onion,
    Potato,
    Sugar,
    Tomato,
}

impl Product {
    pub const ALL: [Product; 5] = [
        Product::Milk,
        Product::Onion,
        Product::Potato,
        Product::Sugar,
        Product::Tomato,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Product::Milk => "Milk",
            Product::Onion => "Onion",
            Product::Potato => "Potato",
            Product::Sugar => "Sugar",
            Product::Tomato => "Tomato",
        }
    }

    /// Exact (case-sensitive) lookup
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.as_str() == name)
    }
}

/// Units of measure
///
/// Only `Kg` and `Liter` are accepted by the market-oriented deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Kg,
    Liter,
    Piece,
    Dozen,
    Gram,
    Quintal,
}

impl Unit {
    pub const ALL: [Unit; 6] = [
        Unit::Kg,
        Unit::Liter,
        Unit::Piece,
        Unit::Dozen,
        Unit::Gram,
        Unit::Quintal,
    ];

    /// Units accepted in the market-oriented deployment
    pub const MARKET: [Unit; 2] = [Unit::Kg, Unit::Liter];

    pub fn as_str(self) -> &'static str {
        match self {
            Unit::Kg => "kg",
            Unit::Liter => "liter",
            Unit::Piece => "piece",
            Unit::Dozen => "dozen",
            Unit::Gram => "gram",
            Unit::Quintal => "quintal",
        }
    }

    /// Case-insensitive lookup; units are stored lower-case
    pub fn parse(name: &str) -> Option<Self> {
        let lowered = name.trim().to_lowercase();
        Self::ALL.iter().copied().find(|u| u.as_str() == lowered)
    }
}

/// Wholesale markets (mandis) covered by the market-oriented deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Market {
    Azadpur,
    Daryaganj,
    Ghazipur,
    #[serde(rename = "INA Market")]
    InaMarket,
    Keshopur,
    Okhla,
    Rohini,
}

impl Market {
    /// Allow-list used by every market aggregate
    pub const ALL: [Market; 7] = [
        Market::Azadpur,
        Market::Daryaganj,
        Market::Ghazipur,
        Market::InaMarket,
        Market::Keshopur,
        Market::Okhla,
        Market::Rohini,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Market::Azadpur => "Azadpur",
            Market::Daryaganj => "Daryaganj",
            Market::Ghazipur => "Ghazipur",
            Market::InaMarket => "INA Market",
            Market::Keshopur => "Keshopur",
            Market::Okhla => "Okhla",
            Market::Rohini => "Rohini",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|m| m.as_str() == name)
    }
}

/// Calendar month names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Month::January,
        Month::February,
        Month::March,
        Month::April,
        Month::May,
        Month::June,
        Month::July,
        Month::August,
        Month::September,
        Month::October,
        Month::November,
        Month::December,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Month::January => "January",
            Month::February => "February",
            Month::March => "March",
            Month::April => "April",
            Month::May => "May",
            Month::June => "June",
            Month::July => "July",
            Month::August => "August",
            Month::September => "September",
            Month::October => "October",
            Month::November => "November",
            Month::December => "December",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|m| m.as_str() == name)
    }

    /// 1-based month number sent to the price oracle
    pub fn ordinal(self) -> u32 {
        self as u32 + 1
    }
}

macro_rules! display_and_parse {
    ($ty:ident, $what:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $ty::parse(s).ok_or_else(|| Error::InvalidInput(format!("unknown {}: {}", $what, s)))
            }
        }
    };
}

display_and_parse!(Product, "product");
display_and_parse!(Unit, "unit");
display_and_parse!(Market, "market");
display_and_parse!(Month, "month");

/// Comma-separated names, used in validation messages
pub fn list_names<T: Copy>(items: &[T], name: fn(T) -> &'static str) -> String {
    items.iter().map(|i| name(*i)).collect::<Vec<_>>().join(", ")
}
