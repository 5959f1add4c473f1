//! Amount of value held in custody

use std::fmt;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::result::{Error, Result};

/// Maximum decimal places rust_decimal can carry
pub const MAX_DECIMALS: u32 = 28;

/// A non-negative integer amount in base units (e.g. wei)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(u128);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub const fn new(base_units: u128) -> Self {
        Self(base_units)
    }

    pub const fn base_units(self) -> u128 {
        self.0
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    /// Parse a human decimal string ("0.1") into base units
    ///
    /// Rejects negative values and more fractional digits than `decimals`.
    pub fn parse_units(input: &str, decimals: u32) -> Result<Amount> {
        if decimals > MAX_DECIMALS {
            return Err(Error::validation(format!(
                "at most {} decimals are supported",
                MAX_DECIMALS
            )));
        }
        let value: Decimal = input
            .trim()
            .parse()
            .map_err(|_| Error::validation(format!("invalid amount: {:?}", input)))?;
        if value.is_sign_negative() && !value.is_zero() {
            return Err(Error::validation("amount cannot be negative"));
        }
        let value = value.normalize();
        if value.scale() > decimals {
            return Err(Error::validation(format!(
                "amount {} has more than {} decimal places",
                value, decimals
            )));
        }
        let scale = Decimal::from_i128_with_scale(10i128.pow(decimals), 0);
        let scaled = value
            .checked_mul(scale)
            .ok_or_else(|| Error::validation(format!("amount {} is too large", value)))?;
        scaled
            .to_u128()
            .map(Amount)
            .ok_or_else(|| Error::validation(format!("amount {} is out of range", value)))
    }

    /// Render base units as a decimal string with `decimals` places, trailing zeros trimmed
    pub fn format_units(self, decimals: u32) -> String {
        if decimals == 0 {
            return self.0.to_string();
        }
        let divisor = 10u128.pow(decimals);
        let whole = self.0 / divisor;
        let frac = self.0 % divisor;
        if frac == 0 {
            return whole.to_string();
        }
        let frac = format!("{:0width$}", frac, width = decimals as usize);
        format!("{}.{}", whole, frac.trim_end_matches('0'))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u128> for Amount {
    fn from(value: u128) -> Self {
        Amount(value)
    }
}

impl From<Amount> for u128 {
    fn from(value: Amount) -> Self {
        value.0
    }
}
