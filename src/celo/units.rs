//! Lossless conversion between base units and human decimal amounts.
//!
//! All arithmetic is on `U256`. Excess fractional digits in `parse_units` are
//! truncated toward zero, never rounded.

use alloy::primitives::U256;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::{CeloError, CeloResult};
use super::hex::parse_quantity;

pub const DEFAULT_DECIMALS: u8 = 18;
pub const GWEI_DECIMALS: u8 = 9;

/// 10^77 is the largest power of ten below 2^256.
pub const MAX_DECIMALS: u8 = 77;

fn ten_pow(decimals: u8) -> CeloResult<U256> {
    if decimals > MAX_DECIMALS {
        return Err(CeloError::InvalidAmount(format!(
            "{} decimals exceeds the maximum of {}",
            decimals, MAX_DECIMALS
        )));
    }
    Ok(U256::from(10u64).pow(U256::from(decimals)))
}

/// Formats a base-unit amount as a decimal major-unit string.
pub fn format_units(base: U256, decimals: u8) -> CeloResult<String> {
    let scale = ten_pow(decimals)?;
    let integer = base / scale;
    let remainder = base % scale;
    if remainder.is_zero() {
        return Ok(integer.to_string());
    }
    let fraction = format!("{:0>width$}", remainder.to_string(), width = decimals as usize);
    Ok(format!("{}.{}", integer, fraction.trim_end_matches('0')))
}

/// Same as [`format_units`] for a decimal or `0x` hex base amount string.
pub fn format_units_str(base: &str, decimals: u8) -> CeloResult<String> {
    format_units(parse_quantity(base)?, decimals)
}

/// Parses a decimal major-unit amount into base units.
pub fn parse_units(amount: &str, decimals: u8) -> CeloResult<U256> {
    let amount = amount.trim();
    let invalid = |reason: &str| CeloError::InvalidAmount(format!("'{}' {}", amount, reason));

    let (integer, fraction) = match amount.split_once('.') {
        Some((integer, fraction)) => (integer, fraction),
        None => (amount, ""),
    };
    if integer.is_empty() && fraction.is_empty() {
        return Err(invalid("is not a number"));
    }
    if fraction.contains('.') {
        return Err(invalid("has more than one decimal point"));
    }
    if !integer.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return Err(invalid("must contain only digits and at most one decimal point"));
    }

    let scale = ten_pow(decimals)?;
    let width = decimals as usize;
    let mut fraction = fraction.to_string();
    if fraction.len() > width {
        fraction.truncate(width);
    } else {
        fraction.extend(std::iter::repeat('0').take(width - fraction.len()));
    }

    let integer_part = if integer.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(integer, 10).map_err(|_| invalid("is too large"))?
    };
    let fraction_part = if fraction.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(&fraction, 10).map_err(|_| invalid("is too large"))?
    };

    integer_part
        .checked_mul(scale)
        .and_then(|scaled| scaled.checked_add(fraction_part))
        .ok_or_else(|| invalid("does not fit in 256 bits"))
}

/// The three magnitudes the adapter converts between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Wei,
    Gwei,
    Celo,
}

impl Unit {
    pub fn decimals(&self) -> u8 {
        match self {
            Unit::Wei => 0,
            Unit::Gwei => GWEI_DECIMALS,
            Unit::Celo => DEFAULT_DECIMALS,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Wei => f.write_str("wei"),
            Unit::Gwei => f.write_str("gwei"),
            Unit::Celo => f.write_str("celo"),
        }
    }
}

impl FromStr for Unit {
    type Err = CeloError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wei" => Ok(Unit::Wei),
            "gwei" => Ok(Unit::Gwei),
            "celo" | "ether" => Ok(Unit::Celo),
            other => Err(CeloError::invalid_input(format!(
                "unknown unit '{}'. Expected wei, gwei or celo",
                other
            ))),
        }
    }
}

/// One amount in every unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitAmounts {
    pub wei: String,
    pub gwei: String,
    pub celo: String,
}

impl UnitAmounts {
    pub fn from_wei(wei: U256) -> CeloResult<Self> {
        Ok(Self {
            wei: wei.to_string(),
            gwei: format_units(wei, GWEI_DECIMALS)?,
            celo: format_units(wei, DEFAULT_DECIMALS)?,
        })
    }
}

/// Converts `value`, expressed in `from`, into all three units.
pub fn convert_units(value: &str, from: Unit) -> CeloResult<UnitAmounts> {
    let wei = parse_units(value, from.decimals())?;
    UnitAmounts::from_wei(wei)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u(s: &str) -> U256 {
        U256::from_str_radix(s, 10).unwrap()
    }

    #[test]
    fn test_format_units_boundaries() {
        assert_eq!(format_units(U256::ZERO, 18).unwrap(), "0");
        assert_eq!(format_units(u("1000000000000000000"), 18).unwrap(), "1");
        assert_eq!(format_units(u("1500000000000000000"), 18).unwrap(), "1.5");
        assert_eq!(format_units(u("1"), 18).unwrap(), "0.000000000000000001");
        assert_eq!(format_units(u("123456"), 0).unwrap(), "123456");
        assert_eq!(format_units(u("1050"), 3).unwrap(), "1.05");
    }

    #[test]
    fn test_format_units_beyond_f64_precision() {
        assert_eq!(
            format_units(u("123456789012345678901234567890"), 18).unwrap(),
            "123456789012.34567890123456789"
        );
        assert_eq!(
            format_units_str("0xde0b6b3a7640000", 18).unwrap(),
            "1"
        );
    }

    #[test]
    fn test_parse_units() {
        assert_eq!(parse_units("0.1", 18).unwrap(), u("100000000000000000"));
        assert_eq!(parse_units("1", 18).unwrap(), u("1000000000000000000"));
        assert_eq!(parse_units("1.", 6).unwrap(), u("1000000"));
        assert_eq!(parse_units(".5", 6).unwrap(), u("500000"));
        assert_eq!(parse_units("0", 18).unwrap(), U256::ZERO);
    }

    #[test]
    fn test_parse_units_truncates_excess_precision() {
        assert_eq!(parse_units("1.2345678", 6).unwrap(), u("1234567"));
        assert_eq!(parse_units("0.9999999", 6).unwrap(), u("999999"));
        assert_eq!(parse_units("7.9", 0).unwrap(), u("7"));
    }

    #[test]
    fn test_parse_units_rejects_malformed() {
        for bad in ["", ".", "1.2.3", "abc", "-1", "1e18", "1,5", " 1 2"] {
            assert!(
                matches!(parse_units(bad, 18), Err(CeloError::InvalidAmount(_))),
                "{bad:?} should be rejected"
            );
        }
        assert!(parse_units("1", 78).is_err());
    }

    #[test]
    fn test_convert_units() {
        let amounts = convert_units("1", Unit::Celo).unwrap();
        assert_eq!(
            amounts,
            UnitAmounts {
                wei: "1000000000000000000".into(),
                gwei: "1000000000".into(),
                celo: "1".into(),
            }
        );

        let amounts = convert_units("2.5", Unit::Gwei).unwrap();
        assert_eq!(amounts.wei, "2500000000");
        assert_eq!(amounts.celo, "0.0000000025");

        let amounts = convert_units("1", Unit::Wei).unwrap();
        assert_eq!(amounts.gwei, "0.000000001");
    }

    #[test]
    fn test_unit_from_str() {
        assert_eq!("CELO".parse::<Unit>().unwrap(), Unit::Celo);
        assert_eq!("gwei".parse::<Unit>().unwrap(), Unit::Gwei);
        assert!("finney".parse::<Unit>().is_err());
    }
}
