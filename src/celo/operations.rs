//! `(resource, operation)` dispatch.
//!
//! Host-facing requests arrive as two strings and a JSON parameter object.
//! [`Operation::parse`] turns them into a typed operation, so unknown pairs
//! and malformed parameters are rejected before anything touches the network.

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use super::abi::{encode_function_call, function_signature, selector_hex, AbiType, AbiValue};
use super::client::CeloClient;
use super::error::{CeloError, CeloResult};
use super::events::{BlockTag, LogFilter, TopicFilter, Trigger};
use super::explorer::SortOrder;
use super::hex::u256_to_hex_quantity;
use super::identity::identifier_hash;
use super::units::{convert_units, format_units_str, parse_units, Unit, DEFAULT_DECIMALS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Account,
    Token,
    Block,
    Transaction,
    Contract,
    Network,
    Event,
    Utility,
    Identity,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Account => "account",
            Resource::Token => "token",
            Resource::Block => "block",
            Resource::Transaction => "transaction",
            Resource::Contract => "contract",
            Resource::Network => "network",
            Resource::Event => "event",
            Resource::Utility => "utility",
            Resource::Identity => "identity",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resource {
    type Err = CeloError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OPERATIONS
            .iter()
            .map(|(resource, _)| *resource)
            .find(|resource| resource.as_str() == s.trim().to_ascii_lowercase())
            .ok_or_else(|| CeloError::invalid_input(format!("unknown resource '{}'", s)))
    }
}

/// Every supported `(resource, operation)` pair.
pub const OPERATIONS: &[(Resource, &str)] = &[
    (Resource::Account, "get_balance"),
    (Resource::Account, "get_all_balances"),
    (Resource::Account, "get_locked_celo"),
    (Resource::Account, "is_account"),
    (Resource::Token, "get_balance"),
    (Resource::Token, "get_info"),
    (Resource::Token, "get_allowance"),
    (Resource::Block, "get_latest_number"),
    (Resource::Block, "get"),
    (Resource::Transaction, "get"),
    (Resource::Transaction, "get_receipt"),
    (Resource::Transaction, "get_history"),
    (Resource::Transaction, "send"),
    (Resource::Contract, "call"),
    (Resource::Contract, "resolve_address"),
    (Resource::Network, "get_info"),
    (Resource::Network, "get_gas_price"),
    (Resource::Network, "get_total_votes"),
    (Resource::Event, "get_logs"),
    (Resource::Event, "poll"),
    (Resource::Utility, "convert_units"),
    (Resource::Utility, "format_units"),
    (Resource::Utility, "parse_units"),
    (Resource::Utility, "encode_call"),
    (Resource::Identity, "identifier_hash"),
];

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct NetworkParams {
    /// mainnet, alfajores, baklava or custom; the configured default when omitted
    pub network: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AddressParams {
    pub address: String,
    pub network: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TokenBalanceParams {
    /// Token symbol (CELO, cUSD, cEUR, cREAL) or contract address
    pub token: String,
    pub address: String,
    pub network: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TokenParams {
    pub token: String,
    pub network: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AllowanceParams {
    pub token: String,
    pub owner: String,
    pub spender: String,
    pub network: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BlockParams {
    /// Block number (decimal or hex) or latest/earliest/pending
    #[serde(default)]
    pub block: Option<String>,
    #[serde(default)]
    pub full_transactions: bool,
    pub network: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct HashParams {
    pub hash: String,
    pub network: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct HistoryParams {
    pub address: String,
    /// Token symbol or address for ERC-20 transfers, "*" for all tokens
    pub token: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    #[serde(default)]
    pub sort: SortOrder,
    pub network: Option<String>,
}

/// A call argument with its ABI type spelled out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TypedArg {
    #[serde(rename = "type")]
    pub ty: AbiType,
    pub value: Value,
}

impl TypedArg {
    fn to_abi(&self) -> CeloResult<AbiValue> {
        AbiValue::from_json(self.ty, &self.value)
    }
}

fn abi_args(args: &[TypedArg]) -> CeloResult<Vec<AbiValue>> {
    args.iter().map(TypedArg::to_abi).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ContractCallParams {
    pub address: String,
    pub function_name: String,
    #[serde(default)]
    pub args: Vec<TypedArg>,
    /// Output types to decode, in order
    #[serde(default)]
    pub outputs: Vec<AbiType>,
    pub network: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ResolveParams {
    /// Registry name, e.g. LockedGold, Accounts, Election
    pub contract_name: String,
    pub network: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LogsParams {
    pub address: Option<String>,
    /// Positional topics: null, one topic, or a list of alternatives
    #[serde(default)]
    pub topics: Vec<TopicFilter>,
    pub from_block: Option<String>,
    pub to_block: Option<String>,
    pub network: Option<String>,
}

impl LogsParams {
    fn to_filter(&self) -> CeloResult<LogFilter> {
        let tag = |value: &Option<String>| match value {
            Some(block) => block.parse::<BlockTag>(),
            None => Ok(BlockTag::Latest),
        };
        let mut filter = LogFilter::new(tag(&self.from_block)?, tag(&self.to_block)?);
        if let Some(address) = &self.address {
            filter = filter.address(address)?;
        }
        for (index, topic) in self.topics.iter().enumerate() {
            filter = filter.topic(index, topic.clone())?;
        }
        Ok(filter.normalized())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PollParams {
    pub trigger: Trigger,
    /// Last block already processed; omit on the first poll
    pub checkpoint: Option<u64>,
    pub network: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ConvertParams {
    pub value: String,
    pub from_unit: Unit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FormatParams {
    /// Base units, decimal or 0x hex
    pub value: String,
    pub decimals: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ParseParams {
    pub amount: String,
    pub decimals: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EncodeCallParams {
    pub function_name: String,
    #[serde(default)]
    pub args: Vec<TypedArg>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct IdentifierParams {
    /// E.164 phone number, e.g. +14155552671
    pub phone_number: String,
    pub pepper: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    AccountBalance(AddressParams),
    AccountAllBalances(AddressParams),
    AccountLockedCelo(AddressParams),
    AccountIsAccount(AddressParams),
    TokenBalance(TokenBalanceParams),
    TokenInfo(TokenParams),
    TokenAllowance(AllowanceParams),
    BlockLatestNumber(NetworkParams),
    BlockGet(BlockParams),
    TransactionGet(HashParams),
    TransactionReceipt(HashParams),
    TransactionHistory(HistoryParams),
    TransactionSend,
    ContractCall(ContractCallParams),
    ContractResolveAddress(ResolveParams),
    NetworkInfo(NetworkParams),
    NetworkGasPrice(NetworkParams),
    NetworkTotalVotes(NetworkParams),
    EventLogs(LogsParams),
    EventPoll(PollParams),
    ConvertUnits(ConvertParams),
    FormatUnits(FormatParams),
    ParseUnits(ParseParams),
    EncodeCall(EncodeCallParams),
    IdentifierHash(IdentifierParams),
}

fn params<T: DeserializeOwned>(resource: Resource, operation: &str, value: Value) -> CeloResult<T> {
    let value = if value.is_null() { json!({}) } else { value };
    serde_json::from_value(value).map_err(|e| {
        CeloError::invalid_input(format!("{}.{} parameters: {}", resource, operation, e))
    })
}

/// Parses every `args[].type` and `outputs[]` name so an unknown ABI type is
/// reported as unsupported rather than as a malformed parameter object.
fn check_abi_types(value: &Value) -> CeloResult<()> {
    let arg_types = value
        .get("args")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|arg| arg.get("type"));
    let outputs = value
        .get("outputs")
        .and_then(Value::as_array)
        .into_iter()
        .flatten();
    for name in arg_types.chain(outputs).filter_map(Value::as_str) {
        name.parse::<AbiType>()?;
    }
    Ok(())
}

impl Operation {
    /// Maps a `(resource, operation)` pair and its parameters to a typed operation.
    pub fn parse(resource: &str, operation: &str, value: Value) -> CeloResult<Self> {
        let resource: Resource = resource.parse()?;
        let op = operation.trim();
        if matches!((resource, op), (Resource::Contract, "call") | (Resource::Utility, "encode_call")) {
            check_abi_types(&value)?;
        }

        let parsed = match (resource, op) {
            (Resource::Account, "get_balance") => Operation::AccountBalance(params(resource, op, value)?),
            (Resource::Account, "get_all_balances") => Operation::AccountAllBalances(params(resource, op, value)?),
            (Resource::Account, "get_locked_celo") => Operation::AccountLockedCelo(params(resource, op, value)?),
            (Resource::Account, "is_account") => Operation::AccountIsAccount(params(resource, op, value)?),
            (Resource::Token, "get_balance") => Operation::TokenBalance(params(resource, op, value)?),
            (Resource::Token, "get_info") => Operation::TokenInfo(params(resource, op, value)?),
            (Resource::Token, "get_allowance") => Operation::TokenAllowance(params(resource, op, value)?),
            (Resource::Block, "get_latest_number") => Operation::BlockLatestNumber(params(resource, op, value)?),
            (Resource::Block, "get") => Operation::BlockGet(params(resource, op, value)?),
            (Resource::Transaction, "get") => Operation::TransactionGet(params(resource, op, value)?),
            (Resource::Transaction, "get_receipt") => Operation::TransactionReceipt(params(resource, op, value)?),
            (Resource::Transaction, "get_history") => Operation::TransactionHistory(params(resource, op, value)?),
            (Resource::Transaction, "send") => Operation::TransactionSend,
            (Resource::Contract, "call") => Operation::ContractCall(params(resource, op, value)?),
            (Resource::Contract, "resolve_address") => Operation::ContractResolveAddress(params(resource, op, value)?),
            (Resource::Network, "get_info") => Operation::NetworkInfo(params(resource, op, value)?),
            (Resource::Network, "get_gas_price") => Operation::NetworkGasPrice(params(resource, op, value)?),
            (Resource::Network, "get_total_votes") => Operation::NetworkTotalVotes(params(resource, op, value)?),
            (Resource::Event, "get_logs") => Operation::EventLogs(params(resource, op, value)?),
            (Resource::Event, "poll") => Operation::EventPoll(params(resource, op, value)?),
            (Resource::Utility, "convert_units") => Operation::ConvertUnits(params(resource, op, value)?),
            (Resource::Utility, "format_units") => Operation::FormatUnits(params(resource, op, value)?),
            (Resource::Utility, "parse_units") => Operation::ParseUnits(params(resource, op, value)?),
            (Resource::Utility, "encode_call") => Operation::EncodeCall(params(resource, op, value)?),
            (Resource::Identity, "identifier_hash") => Operation::IdentifierHash(params(resource, op, value)?),
            _ => {
                let known: Vec<&str> = OPERATIONS
                    .iter()
                    .filter(|(r, _)| *r == resource)
                    .map(|(_, name)| *name)
                    .collect();
                return Err(CeloError::invalid_input(format!(
                    "unknown operation '{}' for resource '{}'. Available: {}",
                    op,
                    resource,
                    known.join(", ")
                )));
            }
        };
        Ok(parsed)
    }

    /// Whether the operation would change chain state.
    pub fn is_write(&self) -> bool {
        matches!(self, Operation::TransactionSend)
    }
}

fn to_json<T: Serialize>(value: T) -> CeloResult<Value> {
    serde_json::to_value(value).map_err(|e| CeloError::encoding(format!("result: {}", e)))
}

impl CeloClient {
    pub async fn execute(&self, operation: Operation) -> CeloResult<Value> {
        debug!("Executing {:?}", operation);
        match operation {
            Operation::AccountBalance(p) => to_json(self.balance(&p.address, p.network.as_deref()).await?),
            Operation::AccountAllBalances(p) => {
                to_json(self.all_balances(&p.address, p.network.as_deref()).await?)
            }
            Operation::AccountLockedCelo(p) => {
                to_json(self.locked_celo(&p.address, p.network.as_deref()).await?)
            }
            Operation::AccountIsAccount(p) => {
                let registered = self.is_account(&p.address, p.network.as_deref()).await?;
                Ok(json!({ "address": p.address, "is_account": registered }))
            }
            Operation::TokenBalance(p) => to_json(
                self.token_balance(&p.token, &p.address, p.network.as_deref())
                    .await?,
            ),
            Operation::TokenInfo(p) => to_json(self.token_info(&p.token, p.network.as_deref()).await?),
            Operation::TokenAllowance(p) => to_json(
                self.allowance(&p.token, &p.owner, &p.spender, p.network.as_deref())
                    .await?,
            ),
            Operation::BlockLatestNumber(p) => {
                Ok(json!({ "block_number": self.block_number(p.network.as_deref()).await? }))
            }
            Operation::BlockGet(p) => {
                let block = match &p.block {
                    Some(block) => block.parse()?,
                    None => BlockTag::Latest,
                };
                self.get_block(block, p.full_transactions, p.network.as_deref())
                    .await
            }
            Operation::TransactionGet(p) => self.get_transaction(&p.hash, p.network.as_deref()).await,
            Operation::TransactionReceipt(p) => self.get_receipt(&p.hash, p.network.as_deref()).await,
            Operation::TransactionHistory(p) => to_json(
                self.transaction_history(
                    &p.address,
                    p.token.as_deref(),
                    p.page.unwrap_or(1),
                    p.page_size.unwrap_or(25),
                    p.sort,
                    p.network.as_deref(),
                )
                .await?,
            ),
            Operation::TransactionSend => self.send_transaction().await,
            Operation::ContractCall(p) => {
                let args = abi_args(&p.args)?;
                let values = self
                    .call_function(&p.address, &p.function_name, &args, &p.outputs, p.network.as_deref())
                    .await?;
                Ok(json!({
                    "function": p.function_name,
                    "outputs": values.iter().map(AbiValue::to_json).collect::<Vec<_>>(),
                }))
            }
            Operation::ContractResolveAddress(p) => {
                let address = self
                    .resolve_address(&p.contract_name, p.network.as_deref())
                    .await?;
                Ok(json!({ "contract_name": p.contract_name, "address": address }))
            }
            Operation::NetworkInfo(p) => to_json(self.network_info(p.network.as_deref()).await?),
            Operation::NetworkGasPrice(p) => to_json(self.gas_price(p.network.as_deref()).await?),
            Operation::NetworkTotalVotes(p) => to_json(self.total_votes(p.network.as_deref()).await?),
            Operation::EventLogs(p) => {
                let filter = p.to_filter()?;
                to_json(self.get_logs(&filter, p.network.as_deref()).await?)
            }
            Operation::EventPoll(p) => to_json(
                self.poll(&p.trigger, p.checkpoint, p.network.as_deref())
                    .await?,
            ),
            Operation::ConvertUnits(p) => to_json(convert_units(&p.value, p.from_unit)?),
            Operation::FormatUnits(p) => {
                let decimals = p.decimals.unwrap_or(DEFAULT_DECIMALS);
                Ok(json!({ "formatted": format_units_str(&p.value, decimals)?, "decimals": decimals }))
            }
            Operation::ParseUnits(p) => {
                let decimals = p.decimals.unwrap_or(DEFAULT_DECIMALS);
                let base = parse_units(&p.amount, decimals)?;
                Ok(json!({
                    "value": base.to_string(),
                    "hex": u256_to_hex_quantity(base),
                    "decimals": decimals,
                }))
            }
            Operation::EncodeCall(p) => {
                let args = abi_args(&p.args)?;
                let types: Vec<AbiType> = args.iter().map(AbiValue::abi_type).collect();
                let signature = function_signature(&p.function_name, &types)?;
                Ok(json!({
                    "signature": signature,
                    "selector": selector_hex(&signature),
                    "data": encode_function_call(&p.function_name, &args)?,
                }))
            }
            Operation::IdentifierHash(p) => {
                to_json(identifier_hash(&p.phone_number, p.pepper.as_deref())?)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::celo::rpc::mock::MockTransport;
    use crate::celo::ErrorKind;
    use crate::config::Config;
    use std::sync::Arc;

    const ALICE: &str = "0x742d35cc6435c9c1c72c5e7b18bab7e1db7a5d6e";

    fn offline() -> (CeloClient, Arc<MockTransport>) {
        let transport = Arc::new(MockTransport::results(|method, _| match method {
            "eth_blockNumber" => json!("0x2a"),
            "eth_getBalance" => json!("0x16345785d8a0000"),
            _ => Value::Null,
        }));
        (
            CeloClient::with_transport(Config::default(), transport.clone()),
            transport,
        )
    }

    #[test]
    fn test_every_listed_pair_parses_or_needs_params() {
        for (resource, operation) in OPERATIONS {
            match Operation::parse(resource.as_str(), operation, Value::Null) {
                Ok(_) => {}
                Err(e) => assert_eq!(e.kind(), ErrorKind::InvalidInput, "{}.{}", resource, operation),
            }
        }
    }

    #[test]
    fn test_unknown_abi_type_is_unsupported() {
        let err = Operation::parse(
            "utility",
            "encode_call",
            json!({"function_name": "f", "args": [{"type": "int128", "value": "1"}]}),
        )
        .unwrap_err();
        assert!(matches!(err, CeloError::UnsupportedType(ref ty) if ty == "int128"));
        assert_eq!(err.kind(), ErrorKind::Encoding);

        let err = Operation::parse(
            "contract",
            "call",
            json!({"address": ALICE, "function_name": "f", "outputs": ["uint8"]}),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Encoding);

        let arg: TypedArg = serde_json::from_value(json!({"type": "uint", "value": "7"})).unwrap();
        assert_eq!(arg.ty, AbiType::Uint256);
        assert!(serde_json::from_value::<AbiType>(json!("int128"))
            .unwrap_err()
            .to_string()
            .contains("int128"));
    }

    #[test]
    fn test_unknown_pairs_are_invalid_input() {
        let err = Operation::parse("wallet", "get", json!({})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = Operation::parse("token", "mint", json!({})).unwrap_err();
        assert!(err.to_string().contains("get_balance"));
    }

    #[test]
    fn test_parse_typed_params() {
        let op = Operation::parse(
            "Account",
            "get_balance",
            json!({"address": ALICE, "network": "alfajores"}),
        )
        .unwrap();
        assert_eq!(
            op,
            Operation::AccountBalance(AddressParams {
                address: ALICE.into(),
                network: Some("alfajores".into())
            })
        );

        let err = Operation::parse("account", "get_balance", json!({"network": "mainnet"})).unwrap_err();
        assert!(err.to_string().contains("address"));

        assert!(Operation::parse("transaction", "send", json!({})).unwrap().is_write());
    }

    #[tokio::test]
    async fn test_utilities_run_offline() {
        let (client, transport) = offline();

        let converted = client
            .execute(Operation::parse("utility", "convert_units", json!({"value": "1", "from_unit": "celo"})).unwrap())
            .await
            .unwrap();
        assert_eq!(
            converted,
            json!({"wei": "1000000000000000000", "gwei": "1000000000", "celo": "1"})
        );

        let parsed = client
            .execute(Operation::parse("utility", "parse_units", json!({"amount": "0.1"})).unwrap())
            .await
            .unwrap();
        assert_eq!(parsed["value"], "100000000000000000");

        let formatted = client
            .execute(Operation::parse("utility", "format_units", json!({"value": "2500000", "decimals": 6})).unwrap())
            .await
            .unwrap();
        assert_eq!(formatted["formatted"], "2.5");

        let encoded = client
            .execute(
                Operation::parse(
                    "utility",
                    "encode_call",
                    json!({
                        "function_name": "transfer",
                        "args": [
                            {"type": "address", "value": ALICE},
                            {"type": "uint", "value": "1"}
                        ]
                    }),
                )
                .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(encoded["signature"], "transfer(address,uint256)");
        assert_eq!(encoded["selector"], "0xa9059cbb");
        assert_eq!(
            encoded["data"],
            format!("0xa9059cbb{:0>64}{:0>64}", &ALICE[2..], "1")
        );

        let identity = client
            .execute(Operation::parse("identity", "identifier_hash", json!({"phone_number": "+14155552671"})).unwrap())
            .await
            .unwrap();
        assert_eq!(identity["placeholder"], true);

        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_execute_reads_through_client() {
        let (client, _) = offline();
        let balance = client
            .execute(Operation::parse("account", "get_balance", json!({"address": ALICE})).unwrap())
            .await
            .unwrap();
        assert_eq!(balance["formatted"], "0.1");

        let latest = client
            .execute(Operation::parse("block", "get_latest_number", Value::Null).unwrap())
            .await
            .unwrap();
        assert_eq!(latest, json!({"block_number": 42}));
    }

    #[tokio::test]
    async fn test_send_is_not_implemented() {
        let (client, _) = offline();
        let err = client.execute(Operation::TransactionSend).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotImplemented);
    }

    #[test]
    fn test_logs_params_build_filter() {
        let params: LogsParams = serde_json::from_value(json!({
            "address": ALICE,
            "from_block": "100",
            "topics": [null, format!("0x{}", "ab".repeat(32))]
        }))
        .unwrap();
        let filter = params.to_filter().unwrap();
        assert_eq!(filter.from_block, BlockTag::Number(100));
        assert_eq!(filter.to_block, BlockTag::Latest);
        assert_eq!(filter.topics[0], TopicFilter::Any);
    }
}
