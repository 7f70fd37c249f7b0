//! Phone-number identifiers.
//!
//! This is a local stand-in: it hashes `tel://<e164>__<pepper>` with
//! Keccak-256. It is NOT an ODIS lookup, performs no rate-limited pepper
//! retrieval and verifies nothing, so the result will not match identifiers
//! attested on-chain unless the caller already holds the real pepper.

use alloy::primitives::keccak256;
use serde::Serialize;

use super::error::{CeloError, CeloResult};
use super::hex::encode_hex_bytes;

pub const IDENTIFIER_PREFIX: &str = "tel://";
const PEPPER_SEPARATOR: &str = "__";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhoneIdentifier {
    pub phone_number: String,
    pub identifier: String,
    pub peppered: bool,
    /// Always true; kept in the output so callers cannot mistake it for ODIS.
    pub placeholder: bool,
}

/// Accepts `+` followed by 8 to 15 digits, ignoring spaces, dashes and parentheses.
pub fn normalize_e164(phone_number: &str) -> CeloResult<String> {
    let compact: String = phone_number
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();

    let digits = compact.strip_prefix('+').ok_or_else(|| {
        CeloError::invalid_input(format!(
            "phone number '{}' must be in E.164 form, e.g. +14155552671",
            phone_number
        ))
    })?;

    if !(8..=15).contains(&digits.len())
        || !digits.chars().all(|c| c.is_ascii_digit())
        || digits.starts_with('0')
    {
        return Err(CeloError::invalid_input(format!(
            "phone number '{}' is not a valid E.164 number",
            phone_number
        )));
    }
    Ok(compact)
}

pub fn identifier_hash(phone_number: &str, pepper: Option<&str>) -> CeloResult<PhoneIdentifier> {
    let phone_number = normalize_e164(phone_number)?;
    let pepper = pepper.map(str::trim).filter(|p| !p.is_empty());

    let mut plaintext = format!("{}{}", IDENTIFIER_PREFIX, phone_number);
    if let Some(pepper) = pepper {
        plaintext.push_str(PEPPER_SEPARATOR);
        plaintext.push_str(pepper);
    }

    Ok(PhoneIdentifier {
        identifier: encode_hex_bytes(keccak256(plaintext.as_bytes()).as_slice()),
        phone_number,
        peppered: pepper.is_some(),
        placeholder: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_e164() {
        assert_eq!(normalize_e164("+1 (415) 555-2671").unwrap(), "+14155552671");
        assert!(normalize_e164("4155552671").is_err());
        assert!(normalize_e164("+0123456789").is_err());
        assert!(normalize_e164("+12ab").is_err());
        assert!(normalize_e164("+1234567890123456").is_err());
    }

    #[test]
    fn test_identifier_is_deterministic() {
        let a = identifier_hash("+14155552671", Some("pepper")).unwrap();
        let b = identifier_hash("+1 415 555 2671", Some(" pepper ")).unwrap();
        assert_eq!(a, b);
        assert!(a.peppered);
        assert!(a.placeholder);
        assert_eq!(a.identifier.len(), 66);

        let expected = encode_hex_bytes(keccak256(b"tel://+14155552671__pepper").as_slice());
        assert_eq!(a.identifier, expected);
    }

    #[test]
    fn test_pepper_changes_identifier() {
        let plain = identifier_hash("+14155552671", None).unwrap();
        let blank = identifier_hash("+14155552671", Some("  ")).unwrap();
        let peppered = identifier_hash("+14155552671", Some("pepper")).unwrap();
        assert_eq!(plain, blank);
        assert!(!plain.peppered);
        assert_ne!(plain.identifier, peppered.identifier);
    }
}
