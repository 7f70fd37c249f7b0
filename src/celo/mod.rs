pub mod abi;
pub mod client;
pub mod error;
pub mod events;
pub mod explorer;
pub mod hex;
pub mod identity;
pub mod network;
pub mod operations;
pub mod retry;
pub mod rpc;
pub mod units;
pub mod utils;

pub use client::CeloClient;
pub use error::{CeloError, CeloResult, ErrorKind};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInfo {
    pub hash: String,
    pub from: String,
    pub to: Option<String>,
    /// Base units, decimal.
    pub value: String,
    pub value_formatted: String,
    pub token_symbol: Option<String>,
    pub token_address: Option<String>,
    pub block_number: u64,
    pub timestamp: u64,
    pub status: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventInfo {
    pub address: String,
    pub topics: Vec<String>,
    pub data: String,
    pub block_number: u64,
    pub transaction_hash: String,
    pub log_index: u64,
    pub decoded: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBalance {
    pub token: String,
    pub token_address: String,
    pub holder: String,
    /// Base units, decimal.
    pub raw: String,
    pub formatted: String,
    pub decimals: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub address: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: String,
    pub total_supply_formatted: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAllowance {
    pub token_address: String,
    pub owner: String,
    pub spender: String,
    pub raw: String,
    pub formatted: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedCelo {
    pub account: String,
    pub total: String,
    pub total_formatted: String,
    pub nonvoting: String,
    pub nonvoting_formatted: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInfo {
    pub network: String,
    pub rpc_url: String,
    pub explorer_api_url: Option<String>,
    pub chain_id: u64,
    pub reported_chain_id: u64,
    pub latest_block: u64,
}
