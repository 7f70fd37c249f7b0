use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

pub type CeloResult<T> = std::result::Result<T, CeloError>;

/// Everything the codec, transport and resolver can fail with.
#[derive(Debug, Error)]
pub enum CeloError {
    #[error("Unknown network: '{0}'. Available networks: mainnet, alfajores, baklava, custom")]
    UnknownNetwork(String),

    #[error("Network '{0}' has no RPC endpoint configured. Set custom_network.rpc_url in the config file or the CELO_RPC_URL environment variable")]
    MissingEndpoint(String),

    #[error("No '{contract}' contract is registered for network '{network}'")]
    MissingContract { network: String, contract: String },

    #[error("RPC error {code}: {message}")]
    Rpc {
        code: i64,
        message: String,
        data: Option<Value>,
    },

    #[error("Malformed RPC response: {0}")]
    RpcProtocol(String),

    #[error("HTTP transport error: {0}")]
    Transport(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Block explorer error: {0}")]
    Explorer(String),

    #[error("ABI encoding error: {0}")]
    Encoding(String),

    #[error("Unsupported ABI type: '{0}'. Supported types: address, uint256, uint, bool, bytes32, string, bytes")]
    UnsupportedType(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Malformed hex value: {0}")]
    MalformedHex(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0} is not supported by this adapter")]
    NotImplemented(String),
}

/// Coarse error category, one per row of the error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Rpc,
    RpcProtocol,
    Network,
    Encoding,
    InvalidInput,
    NotImplemented,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::Rpc => "rpc",
            ErrorKind::RpcProtocol => "rpc_protocol",
            ErrorKind::Network => "network",
            ErrorKind::Encoding => "encoding",
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::NotImplemented => "not_implemented",
        }
    }
}

impl CeloError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CeloError::UnknownNetwork(_)
            | CeloError::MissingEndpoint(_)
            | CeloError::MissingContract { .. } => ErrorKind::Configuration,
            CeloError::Rpc { .. } => ErrorKind::Rpc,
            CeloError::RpcProtocol(_) => ErrorKind::RpcProtocol,
            CeloError::Transport(_) | CeloError::Timeout(_) | CeloError::Explorer(_) => {
                ErrorKind::Network
            }
            CeloError::Encoding(_) | CeloError::UnsupportedType(_) => ErrorKind::Encoding,
            CeloError::InvalidAmount(_)
            | CeloError::MalformedHex(_)
            | CeloError::InvalidAddress(_)
            | CeloError::InvalidInput(_) => ErrorKind::InvalidInput,
            CeloError::NotImplemented(_) => ErrorKind::NotImplemented,
        }
    }

    /// Numeric JSON-RPC code when the node answered with an error envelope.
    pub fn rpc_code(&self) -> Option<i64> {
        match self {
            CeloError::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub(crate) fn encoding(msg: impl Into<String>) -> Self {
        CeloError::Encoding(msg.into())
    }

    pub(crate) fn invalid_input(msg: impl Into<String>) -> Self {
        CeloError::InvalidInput(msg.into())
    }
}

impl From<reqwest::Error> for CeloError {
    fn from(e: reqwest::Error) -> Self {
        CeloError::Transport(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            CeloError::UnknownNetwork("moon".into()).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            CeloError::MissingEndpoint("custom".into()).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            CeloError::MalformedHex("0xzz".into()).kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            CeloError::UnsupportedType("int8".into()).kind(),
            ErrorKind::Encoding
        );
        assert_eq!(
            CeloError::NotImplemented("Transaction signing".into()).kind(),
            ErrorKind::NotImplemented
        );
    }

    #[test]
    fn test_rpc_error_preserves_code_and_message() {
        let err = CeloError::Rpc {
            code: -32602,
            message: "Invalid params".into(),
            data: None,
        };
        assert_eq!(err.rpc_code(), Some(-32602));
        assert_eq!(err.to_string(), "RPC error -32602: Invalid params");
    }
}
