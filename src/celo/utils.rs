use alloy::primitives::Address;

use super::error::{CeloError, CeloResult};
use super::hex::strip_0x;

/// Validates an address and returns it; the canonical form is lower-case.
pub fn validate_address(address: &str) -> CeloResult<Address> {
    let address = address.trim();

    if address.is_empty() {
        return Err(CeloError::InvalidAddress("address cannot be empty".into()));
    }

    let hex_part = strip_0x(address).ok_or_else(|| {
        CeloError::InvalidAddress(format!(
            "'{}' must start with '0x'",
            address
        ))
    })?;

    if hex_part.len() != 40 {
        return Err(CeloError::InvalidAddress(format!(
            "'{}' must be exactly 42 characters (0x + 40 hex characters)",
            address
        )));
    }

    if !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(CeloError::InvalidAddress(format!(
            "'{}' contains non-hexadecimal characters",
            address
        )));
    }

    let bytes = hex::decode(hex_part)
        .map_err(|e| CeloError::InvalidAddress(format!("'{}': {}", address, e)))?;
    Ok(Address::from_slice(&bytes))
}

/// Lower-case `0x` form of a validated address.
pub fn canonical_address(address: &str) -> CeloResult<String> {
    validate_address(address).map(|addr| format!("0x{:x}", addr))
}

/// Validates a 32-byte hash (transaction hash, block hash, topic).
pub fn validate_hash(hash: &str) -> CeloResult<String> {
    let hash = hash.trim();
    match strip_0x(hash) {
        Some(digits) if digits.len() == 64 && digits.chars().all(|c| c.is_ascii_hexdigit()) => {
            Ok(format!("0x{}", digits.to_ascii_lowercase()))
        }
        _ => Err(CeloError::MalformedHex(format!(
            "'{}' is not a 32-byte hash (0x + 64 hex characters)",
            hash
        ))),
    }
}

/// Validates function name
pub fn validate_function_name(function_name: &str) -> CeloResult<()> {
    let first = function_name
        .chars()
        .next()
        .ok_or_else(|| CeloError::invalid_input("function name cannot be empty"))?;

    if !first.is_ascii_alphabetic() && first != '_' {
        return Err(CeloError::invalid_input(format!(
            "invalid function name '{}': must start with a letter or underscore",
            function_name
        )));
    }

    if !function_name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(CeloError::invalid_input(format!(
            "invalid function name '{}': only letters, numbers, and underscores are allowed",
            function_name
        )));
    }

    Ok(())
}

/// Actionable guidance for the errors users hit most often.
pub fn error_hint(error: &CeloError) -> Option<&'static str> {
    match error {
        CeloError::Rpc { code, message, .. } => {
            let message = message.to_ascii_lowercase();
            if message.contains("execution reverted") {
                Some("The contract function reverted. Check that the function exists on this contract and its requirements are met.")
            } else if *code == -32601 || message.contains("method not found") {
                Some("The RPC endpoint does not support this method. Try a different endpoint.")
            } else if *code == -32602 {
                Some("The node rejected the request parameters. Check addresses, hashes and block numbers.")
            } else if *code == -32005 || message.contains("rate limit") {
                Some("Too many requests to the RPC endpoint. Try again in a few moments or enable retries in the config.")
            } else {
                None
            }
        }
        CeloError::Transport(message) => {
            if message.contains("connection refused") || message.contains("dns") {
                Some("Cannot connect to the RPC endpoint. Check your internet connection and RPC URL configuration.")
            } else {
                None
            }
        }
        CeloError::Timeout(_) => {
            Some("The RPC endpoint may be overloaded or unreachable. Raise rpc.timeout_secs or try again.")
        }
        CeloError::MissingEndpoint(_) => {
            Some("Run with --rpc-url or set CELO_RPC_URL when using the custom network.")
        }
        CeloError::NotImplemented(_) => {
            Some("Sign the transaction with a wallet and submit it through your own tooling.")
        }
        _ => None,
    }
}

/// Error text with the hint appended, as shown to tool callers.
pub fn describe_error(error: &CeloError) -> String {
    match error_hint(error) {
        Some(hint) => format!("{} ({})", error, hint),
        None => error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_address() {
        // Valid addresses
        assert!(validate_address("0x742d35Cc6435C9c1c72c5E7b18BaB7e1DB7a5d6e").is_ok());
        assert!(validate_address("0x0000000000000000000000000000000000000000").is_ok());

        // Invalid addresses
        assert!(validate_address("").is_err());
        assert!(validate_address("not_an_address").is_err());
        assert!(validate_address("0x123").is_err()); // Too short
        assert!(validate_address("742d35Cc6435C9c1c72c5E7b18BaB7e1DB7a5d6e").is_err()); // Missing 0x
        assert!(validate_address("0xgg2d35Cc6435C9c1c72c5E7b18BaB7e1DB7a5d6e").is_err());
        // Invalid hex
    }

    #[test]
    fn test_canonical_address_is_lowercase() {
        assert_eq!(
            canonical_address("0x765DE816845861e75A25fCA122bb6898B8B1282a").unwrap(),
            "0x765de816845861e75a25fca122bb6898b8b1282a"
        );
    }

    #[test]
    fn test_validate_hash() {
        let hash = format!("0x{}", "AB".repeat(32));
        assert_eq!(validate_hash(&hash).unwrap(), format!("0x{}", "ab".repeat(32)));
        assert!(validate_hash("0x1234").is_err());
        assert!(validate_hash(&"ab".repeat(32)).is_err());
    }

    #[test]
    fn test_validate_function_name() {
        assert!(validate_function_name("transfer").is_ok());
        assert!(validate_function_name("_internal").is_ok());
        assert!(validate_function_name("getBalance123").is_ok());

        assert!(validate_function_name("").is_err());
        assert!(validate_function_name("123invalid").is_err());
        assert!(validate_function_name("invalid-name").is_err());
    }

    #[test]
    fn test_describe_error_appends_hint() {
        let err = CeloError::Rpc {
            code: 3,
            message: "execution reverted".into(),
            data: None,
        };
        assert!(describe_error(&err).contains("reverted"));
        assert!(describe_error(&err).starts_with("RPC error 3"));

        let plain = CeloError::InvalidAmount("'x'".into());
        assert_eq!(describe_error(&plain), plain.to_string());
    }
}
