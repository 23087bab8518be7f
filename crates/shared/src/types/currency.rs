//! ISO 4217 currency codes used on purchasing documents.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Amounts are `rust_decimal::Decimal`; the currency only decides
//! how many minor units an amount is rounded to.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// ISO 4217 currency codes supported by the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Malaysian Ringgit (house currency)
    #[default]
    Myr,
    /// US Dollar
    Usd,
    /// Singapore Dollar
    Sgd,
    /// Indonesian Rupiah
    Idr,
    /// Euro
    Eur,
    /// Japanese Yen
    Jpy,
}

impl Currency {
    /// Returns the ISO code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Myr => "MYR",
            Self::Usd => "USD",
            Self::Sgd => "SGD",
            Self::Idr => "IDR",
            Self::Eur => "EUR",
            Self::Jpy => "JPY",
        }
    }

    /// Number of minor units (decimal places) for the currency.
    #[must_use]
    pub const fn decimal_places(self) -> u32 {
        match self {
            Self::Jpy => 0,
            _ => 2,
        }
    }

    /// Rounds an amount to this currency's minor units.
    ///
    /// Uses banker's rounding (round half to even) to minimize cumulative errors.
    #[must_use]
    pub fn round(self, amount: Decimal) -> Decimal {
        amount.round_dp_with_strategy(self.decimal_places(), RoundingStrategy::MidpointNearestEven)
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "MYR" => Ok(Self::Myr),
            "USD" => Ok(Self::Usd),
            "SGD" => Ok(Self::Sgd),
            "IDR" => Ok(Self::Idr),
            "EUR" => Ok(Self::Eur),
            "JPY" => Ok(Self::Jpy),
            _ => Err(format!("Unknown currency: {s}")),
        }
    }
}
