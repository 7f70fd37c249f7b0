use anyhow::Result;
use rmcp::{
    model::{ServerCapabilities, ServerInfo},
    tool,
    transport::stdio,
    ServerHandler, ServiceExt,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info};

use crate::{
    celo::{
        operations::{
            AddressParams, BlockParams, ContractCallParams, ConvertParams, HashParams,
            HistoryParams, LogsParams, NetworkParams, Operation, PollParams, TokenBalanceParams,
            OPERATIONS,
        },
        utils::describe_error,
        CeloClient,
    },
    config::Config,
};

#[derive(Debug, Clone)]
pub struct CeloMcpServer {
    client: Arc<CeloClient>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
struct ExecuteRequest {
    /// account, token, block, transaction, contract, network, event, utility or identity
    resource: String,
    operation: String,
    #[serde(default)]
    params: Value,
}

impl CeloMcpServer {
    pub fn new(config: Config) -> Self {
        Self::with_client(CeloClient::new(config))
    }

    pub fn with_client(client: CeloClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    pub async fn run(&self) -> Result<()> {
        info!("Starting Celo MCP Server");

        let service = self.clone().serve(stdio()).await?;

        info!("Celo MCP Server started successfully");
        let _ = service.waiting().await;
        Ok(())
    }

    async fn dispatch(&self, label: &str, operation: Operation) -> String {
        if operation.is_write() && !self.client.config().security.allow_write_operations {
            return "Error: Write operations are disabled. Use --allow-writes flag to enable transaction sending.".to_string();
        }

        match self.client.execute(operation).await {
            Ok(result) => serde_json::to_string_pretty(&result)
                .unwrap_or_else(|_| format!("Failed to serialize {} result", label)),
            Err(e) => {
                error!("Failed to {}: {}", label, e);
                format!("Error: {}", describe_error(&e))
            }
        }
    }
}

#[tool(tool_box)]
impl CeloMcpServer {
    #[tool(description = "Get the native CELO balance of an address")]
    async fn get_balance(&self, #[tool(aggr)] request: AddressParams) -> String {
        self.dispatch("get balance", Operation::AccountBalance(request))
            .await
    }

    #[tool(description = "Get CELO and stable token (cUSD, cEUR, cREAL) balances of an address")]
    async fn get_all_balances(&self, #[tool(aggr)] request: AddressParams) -> String {
        self.dispatch("get balances", Operation::AccountAllBalances(request))
            .await
    }

    #[tool(description = "Get an ERC-20 token balance; token is a symbol (CELO, cUSD, cEUR, cREAL) or contract address")]
    async fn get_token_balance(&self, #[tool(aggr)] request: TokenBalanceParams) -> String {
        self.dispatch("get token balance", Operation::TokenBalance(request))
            .await
    }

    #[tool(description = "Get the total and non-voting locked CELO of an account")]
    async fn get_locked_celo(&self, #[tool(aggr)] request: AddressParams) -> String {
        self.dispatch("get locked CELO", Operation::AccountLockedCelo(request))
            .await
    }

    #[tool(description = "Get a block by number or tag (latest by default)")]
    async fn get_block(&self, #[tool(aggr)] request: BlockParams) -> String {
        self.dispatch("get block", Operation::BlockGet(request)).await
    }

    #[tool(description = "Get a transaction and its receipt by hash")]
    async fn get_transaction(&self, #[tool(aggr)] request: HashParams) -> String {
        let receipt = HashParams {
            hash: request.hash.clone(),
            network: request.network.clone(),
        };
        let transaction = self.client.execute(Operation::TransactionGet(request));
        let receipt = self.client.execute(Operation::TransactionReceipt(receipt));

        match tokio::try_join!(transaction, receipt) {
            Ok((transaction, receipt)) => {
                serde_json::to_string_pretty(&json!({ "transaction": transaction, "receipt": receipt }))
                    .unwrap_or_else(|_| "Failed to serialize transaction".to_string())
            }
            Err(e) => {
                error!("Failed to get transaction: {}", e);
                format!("Error: {}", describe_error(&e))
            }
        }
    }

    #[tool(description = "Get the transaction or token transfer history of an address from the block explorer")]
    async fn get_transaction_history(&self, #[tool(aggr)] request: HistoryParams) -> String {
        self.dispatch("get transaction history", Operation::TransactionHistory(request))
            .await
    }

    #[tool(description = "Call a read-only contract function with typed arguments and decode typed outputs")]
    async fn call_contract(&self, #[tool(aggr)] request: ContractCallParams) -> String {
        self.dispatch("call contract", Operation::ContractCall(request))
            .await
    }

    #[tool(description = "Get logs matching an address and positional topic filter")]
    async fn get_logs(&self, #[tool(aggr)] request: LogsParams) -> String {
        self.dispatch("get logs", Operation::EventLogs(request)).await
    }

    #[tool(description = "Run one poll step of an event trigger from a block checkpoint")]
    async fn poll_trigger(&self, #[tool(aggr)] request: PollParams) -> String {
        self.dispatch("poll trigger", Operation::EventPoll(request))
            .await
    }

    #[tool(description = "Get network details, live chain id and latest block")]
    async fn get_network_info(&self, #[tool(aggr)] request: NetworkParams) -> String {
        self.dispatch("get network info", Operation::NetworkInfo(request))
            .await
    }

    #[tool(description = "Get the current gas price in wei, gwei and CELO")]
    async fn get_gas_price(&self, #[tool(aggr)] request: NetworkParams) -> String {
        self.dispatch("get gas price", Operation::NetworkGasPrice(request))
            .await
    }

    #[tool(description = "Convert an amount between wei, gwei and celo")]
    async fn convert_units(&self, #[tool(aggr)] request: ConvertParams) -> String {
        self.dispatch("convert units", Operation::ConvertUnits(request))
            .await
    }

    #[tool(description = "List every resource and operation accepted by the execute tool")]
    async fn list_operations(&self) -> String {
        let operations: Vec<String> = OPERATIONS
            .iter()
            .map(|(resource, operation)| format!("{}.{}", resource, operation))
            .collect();
        operations.join("\n")
    }

    #[tool(description = "Run any operation by resource and operation name with a JSON parameter object")]
    async fn execute(&self, #[tool(aggr)] request: ExecuteRequest) -> String {
        let label = format!("execute {}.{}", request.resource, request.operation);
        match Operation::parse(&request.resource, &request.operation, request.params) {
            Ok(operation) => self.dispatch(&label, operation).await,
            Err(e) => format!("Error: {}", describe_error(&e)),
        }
    }
}

#[tool(tool_box)]
impl ServerHandler for CeloMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some("MCP server for the Celo blockchain. Reads balances, stable tokens, locked CELO, blocks, transactions, explorer history and contract state, polls event triggers, and converts units. Transaction signing is not supported.".into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_writes_are_refused_when_disabled() {
        let server = CeloMcpServer::new(Config::default());
        let response = server.dispatch("send", Operation::TransactionSend).await;
        assert!(response.starts_with("Error: Write operations are disabled"));
    }

    #[tokio::test]
    async fn test_send_reports_not_supported() {
        let mut config = Config::default();
        config.security.allow_write_operations = true;
        let server = CeloMcpServer::new(config);
        let response = server.dispatch("send", Operation::TransactionSend).await;
        assert!(response.contains("not supported"));
    }

    #[tokio::test]
    async fn test_execute_rejects_unknown_operation() {
        let server = CeloMcpServer::new(Config::default());
        let response = server
            .execute(ExecuteRequest {
                resource: "token".into(),
                operation: "burn".into(),
                params: Value::Null,
            })
            .await;
        assert!(response.starts_with("Error: Invalid input"));
    }

    #[tokio::test]
    async fn test_execute_offline_utility() {
        let server = CeloMcpServer::new(Config::default());
        let response = server
            .execute(ExecuteRequest {
                resource: "utility".into(),
                operation: "convert_units".into(),
                params: json!({"value": "1.5", "from_unit": "gwei"}),
            })
            .await;
        let value: Value = serde_json::from_str(&response).unwrap();
        assert_eq!(value["wei"], "1500000000");
    }

    #[tokio::test]
    async fn test_list_operations() {
        let server = CeloMcpServer::new(Config::default());
        let listing = server.list_operations().await;
        assert!(listing.lines().any(|l| l == "event.poll"));
        assert_eq!(listing.lines().count(), OPERATIONS.len());
    }
}
