//! Built-in network profiles and contract address tables.
//!
//! Resolution is a pure lookup over the caller's [`Config`]; nothing here
//! touches the network.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use super::error::{CeloError, CeloResult};
use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Alfajores,
    Baklava,
    Custom,
}

impl Network {
    pub const ALL: [Network; 4] = [
        Network::Mainnet,
        Network::Alfajores,
        Network::Baklava,
        Network::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Alfajores => "alfajores",
            Network::Baklava => "baklava",
            Network::Custom => "custom",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = CeloError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" | "celo" => Ok(Network::Mainnet),
            "alfajores" => Ok(Network::Alfajores),
            "baklava" => Ok(Network::Baklava),
            "custom" => Ok(Network::Custom),
            _ => Err(CeloError::UnknownNetwork(s.to_string())),
        }
    }
}

/// Token contracts known to every profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Token {
    #[serde(rename = "CELO")]
    Celo,
    #[serde(rename = "cUSD")]
    CUsd,
    #[serde(rename = "cEUR")]
    CEur,
    #[serde(rename = "cREAL")]
    CReal,
}

impl Token {
    pub const ALL: [Token; 4] = [Token::Celo, Token::CUsd, Token::CEur, Token::CReal];

    pub fn symbol(&self) -> &'static str {
        match self {
            Token::Celo => "CELO",
            Token::CUsd => "cUSD",
            Token::CEur => "cEUR",
            Token::CReal => "cREAL",
        }
    }

    /// Name under which the token is registered in the on-chain Registry.
    pub fn registry_id(&self) -> &'static str {
        match self {
            Token::Celo => "GoldToken",
            Token::CUsd => "StableToken",
            Token::CEur => "StableTokenEUR",
            Token::CReal => "StableTokenBRL",
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Token {
    type Err = CeloError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "celo" | "goldtoken" => Ok(Token::Celo),
            "cusd" | "stabletoken" => Ok(Token::CUsd),
            "ceur" | "stabletokeneur" => Ok(Token::CEur),
            "creal" | "stabletokenbrl" => Ok(Token::CReal),
            other => Err(CeloError::invalid_input(format!(
                "unknown token '{}'. Known tokens: CELO, cUSD, cEUR, cREAL",
                other
            ))),
        }
    }
}

/// Static contract addresses of one chain. Core contracts other than the
/// tokens are looked up through `registry` at call time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ContractTable {
    pub registry: &'static str,
    pub celo: Option<&'static str>,
    pub cusd: Option<&'static str>,
    pub ceur: Option<&'static str>,
    pub creal: Option<&'static str>,
}

/// The Registry lives at the same precompile-style address on every chain.
pub const REGISTRY_ADDRESS: &str = "0x000000000000000000000000000000000000ce10";

pub const MAINNET_CONTRACTS: ContractTable = ContractTable {
    registry: REGISTRY_ADDRESS,
    celo: Some("0x471ece3750da237f93b8e339c536989b8978a438"),
    cusd: Some("0x765de816845861e75a25fca122bb6898b8b1282a"),
    ceur: Some("0xd8763cba276a3738e6de85b4b3bf5fded6d6ca73"),
    creal: Some("0xe8537a3d056da446677b9e9d6c5db704eaab4787"),
};

pub const ALFAJORES_CONTRACTS: ContractTable = ContractTable {
    registry: REGISTRY_ADDRESS,
    celo: Some("0xf194afdf50b03e69bd7d057c1aa9e10c9954e4c9"),
    cusd: Some("0x874069fa1eb16d44d622f2e0ca25eea172369bc1"),
    ceur: Some("0x10c892a6ec43a53e45d0b916b4b7d383b1b78c0f"),
    creal: Some("0xe4d517785d091d3c54818832db6094bcc2744545"),
};

pub const BAKLAVA_CONTRACTS: ContractTable = ContractTable {
    registry: REGISTRY_ADDRESS,
    celo: Some("0xddc9be57f553fe75752d61606b94cbd7e0264ef8"),
    cusd: Some("0x62492a644a588fd904270bed06ad52b9abfea1ae"),
    ceur: Some("0xf9ece301247ad2ce21894941830a2470f4e774ca"),
    creal: None,
};

impl ContractTable {
    pub fn token(&self, token: Token) -> Option<&'static str> {
        match token {
            Token::Celo => self.celo,
            Token::CUsd => self.cusd,
            Token::CEur => self.ceur,
            Token::CReal => self.creal,
        }
    }
}

/// Everything needed to talk to one network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkProfile {
    pub network: Network,
    pub rpc_url: String,
    pub explorer_api_url: Option<String>,
    pub chain_id: u64,
    pub contracts: ContractTable,
}

impl NetworkProfile {
    pub fn token_address(&self, token: Token) -> CeloResult<&'static str> {
        self.contracts
            .token(token)
            .ok_or_else(|| CeloError::MissingContract {
                network: self.network.to_string(),
                contract: token.symbol().to_string(),
            })
    }
}

pub const MAINNET_CHAIN_ID: u64 = 42220;
pub const ALFAJORES_CHAIN_ID: u64 = 44787;
pub const BAKLAVA_CHAIN_ID: u64 = 62320;

fn builtin(network: Network) -> Option<(&'static str, &'static str, u64, ContractTable)> {
    match network {
        Network::Mainnet => Some((
            "https://forno.celo.org",
            "https://api.celoscan.io/api",
            MAINNET_CHAIN_ID,
            MAINNET_CONTRACTS,
        )),
        Network::Alfajores => Some((
            "https://alfajores-forno.celo-testnet.org",
            "https://api-alfajores.celoscan.io/api",
            ALFAJORES_CHAIN_ID,
            ALFAJORES_CONTRACTS,
        )),
        Network::Baklava => Some((
            "https://baklava-forno.celo-testnet.org",
            "https://explorer.celo.org/baklava/api",
            BAKLAVA_CHAIN_ID,
            BAKLAVA_CONTRACTS,
        )),
        Network::Custom => None,
    }
}

/// Resolves `key` (or the configured default network) to a profile.
///
/// `custom` takes its endpoint from the config and reuses mainnet's contract
/// table and, unless configured, its chain id.
pub fn resolve(key: Option<&str>, config: &Config) -> CeloResult<NetworkProfile> {
    let key = key.unwrap_or(&config.default_network);
    let network: Network = key.parse()?;

    if let Some((rpc_url, explorer_api_url, chain_id, contracts)) = builtin(network) {
        let rpc_url = config
            .rpc_overrides
            .get(network.as_str())
            .cloned()
            .unwrap_or_else(|| rpc_url.to_string());
        return Ok(NetworkProfile {
            network,
            rpc_url,
            explorer_api_url: Some(explorer_api_url.to_string()),
            chain_id,
            contracts,
        });
    }

    let custom = &config.custom_network;
    let rpc_url = custom
        .rpc_url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .ok_or_else(|| CeloError::MissingEndpoint(network.to_string()))?;

    Ok(NetworkProfile {
        network,
        rpc_url: rpc_url.to_string(),
        explorer_api_url: custom.explorer_api_url.clone(),
        chain_id: custom.chain_id.unwrap_or(MAINNET_CHAIN_ID),
        contracts: MAINNET_CONTRACTS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::celo::utils::validate_address;

    #[test]
    fn test_builtin_profiles() {
        let config = Config::default();
        let mainnet = resolve(Some("mainnet"), &config).unwrap();
        assert_eq!(mainnet.chain_id, 42220);
        assert_eq!(mainnet.rpc_url, "https://forno.celo.org");

        let alfajores = resolve(Some("Alfajores"), &config).unwrap();
        assert_eq!(alfajores.chain_id, 44787);

        let baklava = resolve(Some("baklava"), &config).unwrap();
        assert_eq!(baklava.chain_id, 62320);
    }

    #[test]
    fn test_default_network_is_used() {
        let mut config = Config::default();
        config.default_network = "alfajores".into();
        assert_eq!(resolve(None, &config).unwrap().network, Network::Alfajores);
    }

    #[test]
    fn test_unknown_network() {
        assert!(matches!(
            resolve(Some("ropsten"), &Config::default()),
            Err(CeloError::UnknownNetwork(n)) if n == "ropsten"
        ));
    }

    #[test]
    fn test_custom_requires_endpoint() {
        let config = Config::default();
        assert!(matches!(
            resolve(Some("custom"), &config),
            Err(CeloError::MissingEndpoint(_))
        ));

        let mut config = Config::default();
        config.custom_network.rpc_url = Some("   ".into());
        assert!(matches!(
            resolve(Some("custom"), &config),
            Err(CeloError::MissingEndpoint(_))
        ));
    }

    #[test]
    fn test_custom_reuses_mainnet_contracts() {
        let mut config = Config::default();
        config.custom_network.rpc_url = Some("http://localhost:8545".into());
        let profile = resolve(Some("custom"), &config).unwrap();
        assert_eq!(profile.rpc_url, "http://localhost:8545");
        assert_eq!(profile.contracts, MAINNET_CONTRACTS);
        assert_eq!(profile.chain_id, MAINNET_CHAIN_ID);
        assert!(profile.explorer_api_url.is_none());
    }

    #[test]
    fn test_rpc_override() {
        let mut config = Config::default();
        config
            .rpc_overrides
            .insert("mainnet".into(), "https://my-node.example".into());
        assert_eq!(
            resolve(Some("mainnet"), &config).unwrap().rpc_url,
            "https://my-node.example"
        );
    }

    #[test]
    fn test_missing_contract_entry() {
        let profile = resolve(Some("baklava"), &Config::default()).unwrap();
        assert!(matches!(
            profile.token_address(Token::CReal),
            Err(CeloError::MissingContract { .. })
        ));
        assert!(profile.token_address(Token::CUsd).is_ok());
    }

    #[test]
    fn test_contract_tables_hold_canonical_addresses() {
        for table in [MAINNET_CONTRACTS, ALFAJORES_CONTRACTS, BAKLAVA_CONTRACTS] {
            for address in Token::ALL.iter().filter_map(|t| table.token(*t)) {
                validate_address(address).unwrap();
                assert_eq!(address, address.to_ascii_lowercase());
            }
        }
    }

    #[test]
    fn test_token_parsing() {
        assert_eq!("cusd".parse::<Token>().unwrap(), Token::CUsd);
        assert_eq!("CELO".parse::<Token>().unwrap(), Token::Celo);
        assert!("DAI".parse::<Token>().is_err());
    }
}
