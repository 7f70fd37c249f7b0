//! Block-explorer (Celoscan / Blockscout) account queries.
//!
//! The explorer answers `{"status", "message", "result"}`. A `"0"` status is a
//! failure, except for the "No transactions found" sentinel, which is an
//! empty result.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::error::{CeloError, CeloResult};
use super::hex::parse_decimal;
use super::units::{format_units, DEFAULT_DECIMALS};
use super::TransactionInfo;

pub const NO_TRANSACTIONS_FOUND: &str = "No transactions found";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// One `module`/`action` request with its optional filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplorerQuery {
    pub module: &'static str,
    pub action: &'static str,
    pub address: Option<String>,
    pub contract_address: Option<String>,
    pub start_block: Option<u64>,
    pub end_block: Option<u64>,
    pub page: Option<u32>,
    pub offset: Option<u32>,
    pub sort: Option<SortOrder>,
}

impl ExplorerQuery {
    fn account(action: &'static str, address: &str) -> Self {
        Self {
            module: "account",
            action,
            address: Some(address.to_string()),
            contract_address: None,
            start_block: None,
            end_block: None,
            page: None,
            offset: None,
            sort: None,
        }
    }

    /// Normal transactions sent from or to `address`.
    pub fn transactions(address: &str) -> Self {
        Self::account("txlist", address)
    }

    /// ERC-20 transfers involving `address`, optionally for one token.
    pub fn token_transfers(address: &str, token: Option<&str>) -> Self {
        Self {
            contract_address: token.map(str::to_string),
            ..Self::account("tokentx", address)
        }
    }

    pub fn blocks(mut self, start: Option<u64>, end: Option<u64>) -> Self {
        self.start_block = start;
        self.end_block = end;
        self
    }

    pub fn paginate(mut self, page: u32, offset: u32) -> Self {
        self.page = Some(page);
        self.offset = Some(offset);
        self
    }

    pub fn sort(mut self, sort: SortOrder) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Query-string pairs in the explorer's parameter names.
    pub fn to_pairs(&self, api_key: Option<&str>) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("module", self.module.to_string()),
            ("action", self.action.to_string()),
        ];
        if let Some(address) = &self.address {
            pairs.push(("address", address.clone()));
        }
        if let Some(contract) = &self.contract_address {
            pairs.push(("contractaddress", contract.clone()));
        }
        if let Some(start) = self.start_block {
            pairs.push(("startblock", start.to_string()));
        }
        if let Some(end) = self.end_block {
            pairs.push(("endblock", end.to_string()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(offset) = self.offset {
            pairs.push(("offset", offset.to_string()));
        }
        if let Some(sort) = self.sort {
            pairs.push(("sort", sort.as_str().to_string()));
        }
        if let Some(key) = api_key {
            pairs.push(("apikey", key.to_string()));
        }
        pairs
    }
}

/// Applies the status/message convention to an explorer response body.
pub fn interpret_response(body: Value) -> CeloResult<Value> {
    let status = body.get("status").and_then(Value::as_str);
    let message = body
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("Unknown error");

    match status {
        Some("1") => body
            .get("result")
            .cloned()
            .ok_or_else(|| CeloError::Explorer("response has no result".into())),
        Some("0") if message == NO_TRANSACTIONS_FOUND => Ok(Value::Array(Vec::new())),
        Some("0") => {
            let detail = match body.get("result") {
                Some(Value::String(s)) if !s.is_empty() => format!("{}: {}", message, s),
                _ => message.to_string(),
            };
            Err(CeloError::Explorer(detail))
        }
        _ => Err(CeloError::Explorer(format!(
            "unexpected response shape: {}",
            body
        ))),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTransaction {
    hash: String,
    from: String,
    #[serde(default)]
    to: Option<String>,
    value: String,
    block_number: String,
    time_stamp: String,
    #[serde(default)]
    is_error: Option<String>,
    #[serde(default)]
    token_symbol: Option<String>,
    #[serde(default)]
    token_decimal: Option<String>,
    #[serde(default)]
    contract_address: Option<String>,
}

fn parse_u64_field(name: &str, value: &str) -> CeloResult<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| CeloError::Explorer(format!("field '{}' is not a number: {}", name, value)))
}

impl TryFrom<RawTransaction> for TransactionInfo {
    type Error = CeloError;

    fn try_from(raw: RawTransaction) -> CeloResult<Self> {
        let decimals = match raw.token_decimal.as_deref() {
            Some(d) if !d.is_empty() => d
                .parse::<u8>()
                .map_err(|_| CeloError::Explorer(format!("invalid tokenDecimal: {}", d)))?,
            _ => DEFAULT_DECIMALS,
        };
        let value = parse_decimal(&raw.value)?;
        Ok(TransactionInfo {
            hash: raw.hash.to_ascii_lowercase(),
            from: raw.from.to_ascii_lowercase(),
            to: raw
                .to
                .filter(|to| !to.is_empty())
                .map(|to| to.to_ascii_lowercase()),
            value: value.to_string(),
            value_formatted: format_units(value, decimals)?,
            token_symbol: raw.token_symbol,
            token_address: raw.contract_address.filter(|a| !a.is_empty()),
            block_number: parse_u64_field("blockNumber", &raw.block_number)?,
            timestamp: parse_u64_field("timeStamp", &raw.time_stamp)?,
            status: raw.is_error.as_deref() != Some("1"),
        })
    }
}

/// Parses a `txlist` / `tokentx` result array.
pub fn parse_transactions(result: Value) -> CeloResult<Vec<TransactionInfo>> {
    let raw: Vec<RawTransaction> = serde_json::from_value(result)
        .map_err(|e| CeloError::Explorer(format!("unexpected transaction list: {}", e)))?;
    raw.into_iter().map(TransactionInfo::try_from).collect()
}

#[derive(Debug, Clone, Default)]
pub struct ExplorerClient {
    client: Client,
    api_key: Option<String>,
}

impl ExplorerClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
        }
    }

    pub async fn query(&self, base_url: &str, query: &ExplorerQuery) -> CeloResult<Value> {
        info!(
            "Explorer query {}/{} for {}",
            query.module,
            query.action,
            query.address.as_deref().unwrap_or("-")
        );

        let response = self
            .client
            .get(base_url)
            .query(&query.to_pairs(self.api_key.as_deref()))
            .send()
            .await?;

        let status = response.status();
        let body: Value = response.json().await.map_err(|e| {
            CeloError::Explorer(format!("failed to parse explorer response (HTTP {}): {}", status, e))
        })?;
        debug!("Explorer responded with status field {:?}", body.get("status"));

        interpret_response(body)
    }

    pub async fn transactions(
        &self,
        base_url: &str,
        query: &ExplorerQuery,
    ) -> CeloResult<Vec<TransactionInfo>> {
        parse_transactions(self.query(base_url, query).await?)
    }
}
