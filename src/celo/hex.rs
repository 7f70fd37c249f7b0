//! Hex and quantity helpers shared by the ABI codec, the transport and the
//! unit converter.
//!
//! Quantities are `U256` internally and cross boundaries either as minimal
//! `0x` hex (JSON-RPC) or as decimal strings (human display).

use alloy::primitives::U256;

use super::error::{CeloError, CeloResult};

/// Maximum number of hex digits in a 256-bit quantity.
pub const MAX_QUANTITY_DIGITS: usize = 64;

/// Returns the digits after a `0x`/`0X` prefix, or `None` if there is no prefix.
pub fn strip_0x(value: &str) -> Option<&str> {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
}

/// Left-pads a hex digit string with `'0'` to exactly `length` characters.
///
/// Input longer than `length` is rejected rather than truncated.
pub fn pad_left(hex: &str, length: usize) -> CeloResult<String> {
    if hex.len() > length {
        return Err(CeloError::encoding(format!(
            "hex value '{}' is {} digits long and does not fit in {} digits",
            hex,
            hex.len(),
            length
        )));
    }
    Ok(format!("{:0>width$}", hex, width = length))
}

/// Anything `to_hex_quantity` accepts: a native integer or a decimal / hex string.
#[derive(Debug, Clone, Copy)]
pub enum QuantityInput<'a> {
    Number(u64),
    Text(&'a str),
}

impl From<u64> for QuantityInput<'_> {
    fn from(value: u64) -> Self {
        QuantityInput::Number(value)
    }
}

impl<'a> From<&'a str> for QuantityInput<'a> {
    fn from(value: &'a str) -> Self {
        QuantityInput::Text(value)
    }
}

impl<'a> From<&'a String> for QuantityInput<'a> {
    fn from(value: &'a String) -> Self {
        QuantityInput::Text(value.as_str())
    }
}

/// Converts a quantity to the minimal `0x` hex form used by JSON-RPC.
///
/// Already-prefixed input is validated and returned unchanged, so the
/// conversion is idempotent.
pub fn to_hex_quantity<'a>(value: impl Into<QuantityInput<'a>>) -> CeloResult<String> {
    match value.into() {
        QuantityInput::Number(n) => Ok(format!("0x{:x}", n)),
        QuantityInput::Text(text) => {
            let text = text.trim();
            if strip_0x(text).is_some() {
                from_hex_quantity(text)?;
                Ok(text.to_string())
            } else {
                Ok(u256_to_hex_quantity(parse_decimal(text)?))
            }
        }
    }
}

/// Minimal `0x` hex for a `U256`; zero is `0x0`.
pub fn u256_to_hex_quantity(value: U256) -> String {
    let digits = hex::encode(value.to_be_bytes::<32>());
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() {
        "0x0".to_string()
    } else {
        format!("0x{}", trimmed)
    }
}

/// Parses a `0x`-prefixed hex quantity into a `U256`.
pub fn from_hex_quantity(hex: &str) -> CeloResult<U256> {
    let digits = strip_0x(hex.trim())
        .ok_or_else(|| CeloError::MalformedHex(format!("'{}' is missing the 0x prefix", hex)))?;
    if digits.is_empty() {
        return Err(CeloError::MalformedHex(format!("'{}' has no digits", hex)));
    }
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(CeloError::MalformedHex(format!(
            "'{}' contains non-hexadecimal characters",
            hex
        )));
    }
    let significant = digits.trim_start_matches('0');
    if significant.len() > MAX_QUANTITY_DIGITS {
        return Err(CeloError::MalformedHex(format!(
            "'{}' does not fit in 256 bits",
            hex
        )));
    }
    if significant.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(significant, 16)
        .map_err(|e| CeloError::MalformedHex(format!("'{}': {}", hex, e)))
}

/// Parses a hex quantity that must fit in a `u64` (block numbers, chain ids, gas).
pub fn from_hex_u64(hex: &str) -> CeloResult<u64> {
    let value = from_hex_quantity(hex)?;
    if value > U256::from(u64::MAX) {
        return Err(CeloError::MalformedHex(format!(
            "'{}' does not fit in 64 bits",
            hex
        )));
    }
    Ok(value.to::<u64>())
}

/// Parses a non-negative decimal integer string into a `U256`.
pub fn parse_decimal(text: &str) -> CeloResult<U256> {
    let text = text.trim();
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
        return Err(CeloError::InvalidAmount(format!(
            "'{}' is not a non-negative decimal integer",
            text
        )));
    }
    U256::from_str_radix(text, 10)
        .map_err(|_| CeloError::InvalidAmount(format!("'{}' does not fit in 256 bits", text)))
}

/// Parses either a decimal or a `0x` hex integer.
pub fn parse_quantity(text: &str) -> CeloResult<U256> {
    let text = text.trim();
    if strip_0x(text).is_some() {
        from_hex_quantity(text)
    } else {
        parse_decimal(text)
    }
}

/// Decodes a `0x` (or bare) hex byte string.
pub fn decode_hex_bytes(value: &str) -> CeloResult<Vec<u8>> {
    let value = value.trim();
    let digits = strip_0x(value).unwrap_or(value);
    hex::decode(digits).map_err(|e| CeloError::MalformedHex(format!("'{}': {}", value, e)))
}

/// Encodes bytes as lower-case `0x` hex.
pub fn encode_hex_bytes(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}
