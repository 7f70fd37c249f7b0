use alloy::primitives::{Address, U256};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

use super::abi::{encode_function_call, functions, AbiDecoder, AbiType, AbiValue, NamedFunction};
use super::error::{CeloError, CeloResult};
use super::events::{BlockTag, LogFilter, PollOutcome, PollWindow, RpcLog, Trigger};
use super::explorer::{ExplorerClient, ExplorerQuery, SortOrder};
use super::hex::{from_hex_quantity, from_hex_u64};
use super::network::{self, NetworkProfile, Token};
use super::retry::{is_read_only, with_retry, RetryPolicy};
use super::rpc::{HttpTransport, JsonRpcClient, Transport};
use super::units::{format_units, UnitAmounts, DEFAULT_DECIMALS};
use super::utils::{canonical_address, validate_address, validate_function_name, validate_hash};
use super::{EventInfo, LockedCelo, NetworkInfo, TokenAllowance, TokenBalance, TokenInfo, TransactionInfo};
use crate::config::Config;

/// Largest page the explorers serve.
pub const MAX_PAGE_SIZE: u32 = 10_000;

/// Read operations composed from the codec, the transport and the resolver.
///
/// Every method resolves its network first and validates its inputs before
/// the first request goes out.
#[derive(Debug)]
pub struct CeloClient {
    config: Arc<Config>,
    rpc: JsonRpcClient,
    explorer: ExplorerClient,
}

impl CeloClient {
    pub fn new(config: Config) -> Self {
        Self::with_transport(config, Arc::new(HttpTransport::new()))
    }

    pub fn with_transport(config: Config, transport: Arc<dyn Transport>) -> Self {
        let rpc = JsonRpcClient::new(transport).with_timeout(config.rpc.timeout());
        let explorer = ExplorerClient::new(config.explorer.api_key.clone());
        Self {
            config: Arc::new(config),
            rpc,
            explorer,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn profile(&self, network: Option<&str>) -> CeloResult<NetworkProfile> {
        network::resolve(network, &self.config)
    }

    async fn request(&self, profile: &NetworkProfile, method: &str, params: Vec<Value>) -> CeloResult<Value> {
        let policy = if is_read_only(method) {
            self.config.rpc.retry
        } else {
            RetryPolicy::disabled()
        };
        with_retry(&policy, method, || {
            self.rpc.call(&profile.rpc_url, method, params.clone())
        })
        .await
    }

    async fn request_u64(&self, profile: &NetworkProfile, method: &str) -> CeloResult<u64> {
        let value = self.request(profile, method, Vec::new()).await?;
        from_hex_u64(expect_str(method, &value)?)
    }

    async fn eth_call(&self, profile: &NetworkProfile, to: &str, data: String) -> CeloResult<String> {
        let value = self
            .request(profile, "eth_call", vec![json!({ "to": to, "data": data }), json!("latest")])
            .await?;
        expect_str("eth_call", &value).map(str::to_string)
    }

    async fn call_named(
        &self,
        profile: &NetworkProfile,
        to: &str,
        function: &NamedFunction,
        args: &[AbiValue],
    ) -> CeloResult<AbiValue> {
        let data = function.encode_call(args)?;
        debug!("Calling {} on {}", function.signature(), to);
        let result = self.eth_call(profile, to, data).await?;
        function.decode_output(&result)
    }

    pub async fn block_number(&self, network: Option<&str>) -> CeloResult<u64> {
        let profile = self.profile(network)?;
        self.request_u64(&profile, "eth_blockNumber").await
    }

    pub async fn network_info(&self, network: Option<&str>) -> CeloResult<NetworkInfo> {
        let profile = self.profile(network)?;
        let (reported_chain_id, latest_block) = tokio::try_join!(
            self.request_u64(&profile, "eth_chainId"),
            self.request_u64(&profile, "eth_blockNumber"),
        )?;
        Ok(NetworkInfo {
            network: profile.network.to_string(),
            rpc_url: profile.rpc_url,
            explorer_api_url: profile.explorer_api_url,
            chain_id: profile.chain_id,
            reported_chain_id,
            latest_block,
        })
    }

    pub async fn gas_price(&self, network: Option<&str>) -> CeloResult<UnitAmounts> {
        let profile = self.profile(network)?;
        let value = self.request(&profile, "eth_gasPrice", Vec::new()).await?;
        UnitAmounts::from_wei(from_hex_quantity(expect_str("eth_gasPrice", &value)?)?)
    }

    /// Native CELO balance.
    pub async fn balance(&self, address: &str, network: Option<&str>) -> CeloResult<TokenBalance> {
        let profile = self.profile(network)?;
        let holder = validate_address(address)?;
        self.native_balance(&profile, holder).await
    }

    async fn native_balance(&self, profile: &NetworkProfile, holder: Address) -> CeloResult<TokenBalance> {
        let holder = format!("0x{:x}", holder);
        let value = self
            .request(profile, "eth_getBalance", vec![json!(holder), json!("latest")])
            .await?;
        let raw = from_hex_quantity(expect_str("eth_getBalance", &value)?)?;
        Ok(TokenBalance {
            token: Token::Celo.symbol().to_string(),
            token_address: profile.token_address(Token::Celo)?.to_string(),
            holder,
            raw: raw.to_string(),
            formatted: format_units(raw, DEFAULT_DECIMALS)?,
            decimals: DEFAULT_DECIMALS,
        })
    }

    async fn erc20_decimals(&self, profile: &NetworkProfile, contract: &str) -> CeloResult<u8> {
        let decimals = self
            .call_named(profile, contract, &functions::DECIMALS, &[])
            .await
            .and_then(expect_uint)?;
        if decimals > U256::from(u8::MAX) {
            return Err(CeloError::encoding(format!("decimals() returned {}", decimals)));
        }
        Ok(decimals.to::<u8>())
    }

    async fn erc20_balance(
        &self,
        profile: &NetworkProfile,
        contract: &str,
        label: &str,
        holder: Address,
    ) -> CeloResult<TokenBalance> {
        let args = [AbiValue::Address(holder)];
        let (raw, decimals) = tokio::try_join!(
            self.call_named(profile, contract, &functions::BALANCE_OF, &args),
            self.erc20_decimals(profile, contract),
        )?;
        let raw = expect_uint(raw)?;
        Ok(TokenBalance {
            token: label.to_string(),
            token_address: contract.to_string(),
            holder: format!("0x{:x}", holder),
            raw: raw.to_string(),
            formatted: format_units(raw, decimals)?,
            decimals,
        })
    }

    /// ERC-20 balance; `token` is a known symbol (CELO, cUSD, ...) or a contract address.
    pub async fn token_balance(
        &self,
        token: &str,
        address: &str,
        network: Option<&str>,
    ) -> CeloResult<TokenBalance> {
        let profile = self.profile(network)?;
        let (contract, label) = resolve_token(&profile, token)?;
        let holder = validate_address(address)?;
        self.erc20_balance(&profile, &contract, &label, holder).await
    }

    /// CELO plus every stable token the network has a contract for, fetched concurrently.
    pub async fn all_balances(&self, address: &str, network: Option<&str>) -> CeloResult<Vec<TokenBalance>> {
        let profile = &self.profile(network)?;
        let holder = validate_address(address)?;

        let stable = move |token: Token| async move {
            match profile.token_address(token) {
                Ok(contract) => self
                    .erc20_balance(profile, contract, token.symbol(), holder)
                    .await
                    .map(Some),
                Err(CeloError::MissingContract { .. }) => Ok(None),
                Err(e) => Err(e),
            }
        };

        let (celo, cusd, ceur, creal) = tokio::try_join!(
            self.native_balance(profile, holder),
            stable(Token::CUsd),
            stable(Token::CEur),
            stable(Token::CReal),
        )?;

        let mut balances = vec![celo];
        balances.extend([cusd, ceur, creal].into_iter().flatten());
        Ok(balances)
    }

    pub async fn token_info(&self, token: &str, network: Option<&str>) -> CeloResult<TokenInfo> {
        let profile = self.profile(network)?;
        let (contract, _) = resolve_token(&profile, token)?;

        let (name, symbol, decimals, total_supply) = tokio::try_join!(
            self.call_named(&profile, &contract, &functions::NAME, &[]),
            self.call_named(&profile, &contract, &functions::SYMBOL, &[]),
            self.erc20_decimals(&profile, &contract),
            self.call_named(&profile, &contract, &functions::TOTAL_SUPPLY, &[]),
        )?;
        let total_supply = expect_uint(total_supply)?;

        Ok(TokenInfo {
            address: contract,
            name: name.to_string(),
            symbol: symbol.to_string(),
            decimals,
            total_supply: total_supply.to_string(),
            total_supply_formatted: format_units(total_supply, decimals)?,
        })
    }

    pub async fn allowance(
        &self,
        token: &str,
        owner: &str,
        spender: &str,
        network: Option<&str>,
    ) -> CeloResult<TokenAllowance> {
        let profile = self.profile(network)?;
        let (contract, _) = resolve_token(&profile, token)?;
        let owner = validate_address(owner)?;
        let spender = validate_address(spender)?;

        let args = [AbiValue::Address(owner), AbiValue::Address(spender)];
        let (raw, decimals) = tokio::try_join!(
            self.call_named(&profile, &contract, &functions::ALLOWANCE, &args),
            self.erc20_decimals(&profile, &contract),
        )?;
        let raw = expect_uint(raw)?;

        Ok(TokenAllowance {
            token_address: contract,
            owner: format!("0x{:x}", owner),
            spender: format!("0x{:x}", spender),
            raw: raw.to_string(),
            formatted: format_units(raw, decimals)?,
        })
    }

    async fn registry_lookup(&self, profile: &NetworkProfile, name: &str) -> CeloResult<String> {
        let address = self
            .call_named(
                profile,
                profile.contracts.registry,
                &functions::GET_ADDRESS_FOR_STRING,
                &[AbiValue::String(name.to_string())],
            )
            .await?;
        match address {
            AbiValue::Address(addr) if !addr.is_zero() => Ok(format!("0x{:x}", addr)),
            _ => Err(CeloError::MissingContract {
                network: profile.network.to_string(),
                contract: name.to_string(),
            }),
        }
    }

    /// Looks up a core contract (e.g. `LockedGold`) in the on-chain Registry.
    pub async fn resolve_address(&self, contract_name: &str, network: Option<&str>) -> CeloResult<String> {
        let profile = self.profile(network)?;
        validate_function_name(contract_name).map_err(|_| {
            CeloError::invalid_input(format!("'{}' is not a registry contract name", contract_name))
        })?;
        self.registry_lookup(&profile, contract_name).await
    }

    pub async fn locked_celo(&self, address: &str, network: Option<&str>) -> CeloResult<LockedCelo> {
        let profile = self.profile(network)?;
        let account = validate_address(address)?;
        let locked_gold = self.registry_lookup(&profile, "LockedGold").await?;

        let args = [AbiValue::Address(account)];
        let (total, nonvoting) = tokio::try_join!(
            self.call_named(&profile, &locked_gold, &functions::GET_ACCOUNT_TOTAL_LOCKED_GOLD, &args),
            self.call_named(&profile, &locked_gold, &functions::GET_ACCOUNT_NONVOTING_LOCKED_GOLD, &args),
        )?;
        let (total, nonvoting) = (expect_uint(total)?, expect_uint(nonvoting)?);

        Ok(LockedCelo {
            account: format!("0x{:x}", account),
            total: total.to_string(),
            total_formatted: format_units(total, DEFAULT_DECIMALS)?,
            nonvoting: nonvoting.to_string(),
            nonvoting_formatted: format_units(nonvoting, DEFAULT_DECIMALS)?,
        })
    }

    pub async fn is_account(&self, address: &str, network: Option<&str>) -> CeloResult<bool> {
        let profile = self.profile(network)?;
        let account = validate_address(address)?;
        let accounts = self.registry_lookup(&profile, "Accounts").await?;
        match self
            .call_named(&profile, &accounts, &functions::IS_ACCOUNT, &[AbiValue::Address(account)])
            .await?
        {
            AbiValue::Bool(registered) => Ok(registered),
            other => Err(unexpected_value("bool", &other)),
        }
    }

    /// Total CELO voting for validator groups, from the Election contract.
    pub async fn total_votes(&self, network: Option<&str>) -> CeloResult<UnitAmounts> {
        let profile = self.profile(network)?;
        let election = self.registry_lookup(&profile, "Election").await?;
        let votes = self
            .call_named(&profile, &election, &functions::GET_TOTAL_VOTES, &[])
            .await
            .and_then(expect_uint)?;
        UnitAmounts::from_wei(votes)
    }

    pub async fn get_block(&self, block: BlockTag, full_transactions: bool, network: Option<&str>) -> CeloResult<Value> {
        let profile = self.profile(network)?;
        self.request(
            &profile,
            "eth_getBlockByNumber",
            vec![json!(block.to_string()), json!(full_transactions)],
        )
        .await
    }

    /// `null` when the node does not know the transaction.
    pub async fn get_transaction(&self, hash: &str, network: Option<&str>) -> CeloResult<Value> {
        let profile = self.profile(network)?;
        let hash = validate_hash(hash)?;
        self.request(&profile, "eth_getTransactionByHash", vec![json!(hash)])
            .await
    }

    pub async fn get_receipt(&self, hash: &str, network: Option<&str>) -> CeloResult<Value> {
        let profile = self.profile(network)?;
        let hash = validate_hash(hash)?;
        self.request(&profile, "eth_getTransactionReceipt", vec![json!(hash)])
            .await
    }

    /// Account history from the block explorer. With `token` set, ERC-20
    /// transfers (of that token, or of any token for `"*"`) instead of normal
    /// transactions.
    pub async fn transaction_history(
        &self,
        address: &str,
        token: Option<&str>,
        page: u32,
        page_size: u32,
        sort: SortOrder,
        network: Option<&str>,
    ) -> CeloResult<Vec<TransactionInfo>> {
        let profile = self.profile(network)?;
        let address = canonical_address(address)?;
        if page == 0 || page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(CeloError::invalid_input(format!(
                "page must be at least 1 and page_size between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }
        let base_url = profile.explorer_api_url.as_deref().ok_or_else(|| {
            CeloError::Explorer(format!(
                "network '{}' has no explorer API configured (custom_network.explorer_api_url)",
                profile.network
            ))
        })?;

        let query = match token {
            None => ExplorerQuery::transactions(&address),
            Some("*") => ExplorerQuery::token_transfers(&address, None),
            Some(token) => {
                let (contract, _) = resolve_token(&profile, token)?;
                ExplorerQuery::token_transfers(&address, Some(&contract))
            }
        };

        self.explorer
            .transactions(base_url, &query.paginate(page, page_size).sort(sort))
            .await
    }

    /// Calls any view function with explicitly typed arguments and outputs.
    pub async fn call_function(
        &self,
        contract: &str,
        function_name: &str,
        args: &[AbiValue],
        outputs: &[AbiType],
        network: Option<&str>,
    ) -> CeloResult<Vec<AbiValue>> {
        let profile = self.profile(network)?;
        let contract = canonical_address(contract)?;
        validate_function_name(function_name)?;
        let data = encode_function_call(function_name, args)?;

        let result = self.eth_call(&profile, &contract, data).await?;
        let mut decoder = AbiDecoder::new(&result)?;
        outputs.iter().map(|ty| decoder.next(*ty)).collect()
    }

    /// Logs matching `filter`; logs dropped by a reorg are skipped.
    pub async fn get_logs(&self, filter: &LogFilter, network: Option<&str>) -> CeloResult<Vec<EventInfo>> {
        let profile = self.profile(network)?;
        self.fetch_logs(&profile, filter).await
    }

    async fn fetch_logs(&self, profile: &NetworkProfile, filter: &LogFilter) -> CeloResult<Vec<EventInfo>> {
        let filter = serde_json::to_value(filter)
            .map_err(|e| CeloError::encoding(format!("log filter: {}", e)))?;
        let value = self.request(profile, "eth_getLogs", vec![filter]).await?;
        let logs: Vec<RpcLog> = serde_json::from_value(value)
            .map_err(|e| CeloError::RpcProtocol(format!("unexpected eth_getLogs result: {}", e)))?;
        logs.into_iter()
            .filter(|log| !log.removed)
            .map(RpcLog::into_event)
            .collect()
    }

    /// One poll step of `trigger`, resuming after `checkpoint`.
    ///
    /// The checkpoint is owned by the caller: hand the returned one back on
    /// the next call. It only moves when a window was actually covered.
    pub async fn poll(
        &self,
        trigger: &Trigger,
        checkpoint: Option<u64>,
        network: Option<&str>,
    ) -> CeloResult<PollOutcome> {
        let profile = self.profile(network)?;
        // Builds the filter once up front so bad trigger input fails before any request.
        let template = trigger.log_filter(&profile, 0, 0)?;
        let latest = self.request_u64(&profile, "eth_blockNumber").await?;

        let Some(window) = PollWindow::next(checkpoint, latest) else {
            debug!("No new blocks after {:?} (latest {})", checkpoint, latest);
            return Ok(PollOutcome {
                window: None,
                events: Vec::new(),
                blocks: Vec::new(),
                checkpoint,
            });
        };

        let (events, blocks) = match template {
            Some(template) => {
                let filter = LogFilter {
                    from_block: BlockTag::Number(window.from),
                    to_block: BlockTag::Number(window.to),
                    ..template
                };
                (self.fetch_logs(&profile, &filter).await?, Vec::new())
            }
            None => (Vec::new(), (window.from..=window.to).collect()),
        };

        info!(
            "Polled blocks {}..={} on {}: {} events",
            window.from,
            window.to,
            profile.network,
            events.len()
        );

        Ok(PollOutcome {
            window: Some(window),
            events,
            blocks,
            checkpoint: Some(window.to),
        })
    }

    pub async fn send_transaction(&self) -> CeloResult<Value> {
        Err(CeloError::NotImplemented(
            "Transaction signing and sending".to_string(),
        ))
    }
}

/// Maps a known token symbol to its contract, or validates a raw address.
fn resolve_token(profile: &NetworkProfile, token: &str) -> CeloResult<(String, String)> {
    match token.parse::<Token>() {
        Ok(known) => Ok((
            profile.token_address(known)?.to_string(),
            known.symbol().to_string(),
        )),
        Err(_) => {
            let contract = canonical_address(token)?;
            Ok((contract.clone(), contract))
        }
    }
}

fn expect_str<'a>(method: &str, value: &'a Value) -> CeloResult<&'a str> {
    value.as_str().ok_or_else(|| {
        CeloError::RpcProtocol(format!("{} returned {} instead of a hex string", method, value))
    })
}

fn expect_uint(value: AbiValue) -> CeloResult<U256> {
    match value {
        AbiValue::Uint(n) => Ok(n),
        other => Err(unexpected_value("uint256", &other)),
    }
}

fn unexpected_value(expected: &str, value: &AbiValue) -> CeloError {
    CeloError::encoding(format!("expected {}, decoded {}", expected, value.abi_type()))
}
