use anyhow::Result;
use rmcp::{
    model::{ServerCapabilities, ServerInfo},
    tool,
    transport::stdio,
    ServerHandler, ServiceExt,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

use tenderly_sdk::{
    utils::interpret_sdk_error, AccountData, Client, DisplayNameFilter, EntityFilter, Network,
    Settings, SimulationParameters, UpdateRequest, VerificationRequest,
};

#[derive(Debug, Clone)]
pub struct TenderlyMcpServer {
    client: Client,
    settings: Arc<Settings>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
struct AddressRequest {
    address: String,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
struct ListRequest {
    /// Matches when the display name contains any of these.
    display_names: Option<Vec<String>>,
    /// Matches when the entity carries any of these tags.
    tags: Option<Vec<String>>,
    /// Chain id.
    network: Option<u64>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
struct AddRequest {
    address: String,
    display_name: Option<String>,
    tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
struct UpdateEntityRequest {
    address: String,
    display_name: Option<String>,
    append_tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
struct VerifyContractRequest {
    address: String,
    /// `{contractToVerify, solc: {version, sources, settings}, config: {mode}}`
    verification: Value,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
struct SimulateRequest {
    /// `{transaction: {from, to, input, gas, gas_price, value}, block_number, overrides}`
    simulation: Value,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
struct SimulateBundleRequest {
    simulations: Vec<Value>,
}

impl ListRequest {
    fn into_filter(self) -> EntityFilter {
        EntityFilter {
            tags: self.tags,
            display_name: self.display_names.map(DisplayNameFilter::from),
            network: self.network.map(Network::from),
        }
    }
}

fn to_json<T: Serialize>(value: &T, what: &str) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| format!("Failed to serialize {}", what))
}

fn parse_argument<T: serde::de::DeserializeOwned>(value: Value, what: &str) -> Result<T, String> {
    serde_json::from_value(value).map_err(|e| format!("Error: Invalid {}: {}", what, e))
}

impl TenderlyMcpServer {
    pub fn new(client: Client, settings: Settings) -> Self {
        Self {
            client,
            settings: Arc::new(settings),
        }
    }

    pub async fn run(&self) -> Result<()> {
        info!("Starting Tenderly MCP Server");

        let service = self.clone().serve(stdio()).await?;

        info!("Tenderly MCP Server started successfully");
        let _ = service.waiting().await;
        Ok(())
    }

    fn ensure_writes_allowed(&self) -> Result<(), String> {
        if self.settings.security.allow_write_operations {
            Ok(())
        } else {
            Err("Error: Write operations are disabled. Use --allow-writes flag to modify the project.".to_string())
        }
    }

    fn respond<T: Serialize>(
        &self,
        operation: &str,
        result: tenderly_sdk::Result<T>,
    ) -> String {
        match result {
            Ok(value) => to_json(&value, "result"),
            Err(e) => {
                error!("Failed to {}: {}", operation, e);
                format!("Error: {}", interpret_sdk_error(&e))
            }
        }
    }
}

#[tool(tool_box)]
impl TenderlyMcpServer {
    #[tool(description = "Get a contract tracked in the Tenderly project")]
    async fn get_contract(&self, #[tool(aggr)] request: AddressRequest) -> String {
        let result = self.client.contracts().get(&request.address).await;
        self.respond("get contract", result)
    }

    #[tool(description = "List project contracts, optionally filtered by display name, tags and network")]
    async fn list_contracts(&self, #[tool(aggr)] request: ListRequest) -> String {
        let filter = request.into_filter();
        let result = self.client.contracts().get_by(&filter).await;
        self.respond("list contracts", result)
    }

    #[tool(description = "Add a contract to the Tenderly project")]
    async fn add_contract(&self, #[tool(aggr)] request: AddRequest) -> String {
        if let Err(message) = self.ensure_writes_allowed() {
            return message;
        }

        let data = AccountData {
            display_name: request.display_name,
            tags: request.tags,
        };
        let result = self.client.contracts().add(&request.address, data).await;
        self.respond("add contract", result)
    }

    #[tool(description = "Remove a contract from the Tenderly project")]
    async fn remove_contract(&self, #[tool(aggr)] request: AddressRequest) -> String {
        if let Err(message) = self.ensure_writes_allowed() {
            return message;
        }

        match self.client.contracts().remove(&request.address).await {
            Ok(()) => format!("Removed contract {}", request.address),
            Err(e) => self.respond::<()>("remove contract", Err(e)),
        }
    }

    #[tool(description = "Rename a project contract and/or append tags to it")]
    async fn update_contract(&self, #[tool(aggr)] request: UpdateEntityRequest) -> String {
        if let Err(message) = self.ensure_writes_allowed() {
            return message;
        }

        let update = UpdateRequest {
            display_name: request.display_name,
            append_tags: request.append_tags,
        };
        let result = self.client.contracts().update(&request.address, update).await;
        self.respond("update contract", result)
    }

    #[tool(description = "Verify contract sources against the contract deployed at an address")]
    async fn verify_contract(&self, #[tool(aggr)] request: VerifyContractRequest) -> String {
        if let Err(message) = self.ensure_writes_allowed() {
            return message;
        }

        let verification: VerificationRequest =
            match parse_argument(request.verification, "verification request") {
                Ok(verification) => verification,
                Err(message) => return message,
            };

        let result = self
            .client
            .contracts()
            .verify(&request.address, &verification)
            .await;
        self.respond("verify contract", result)
    }

    #[tool(description = "Get a wallet tracked in the Tenderly project")]
    async fn get_wallet(&self, #[tool(aggr)] request: AddressRequest) -> String {
        let result = self.client.wallets().get(&request.address).await;
        self.respond("get wallet", result)
    }

    #[tool(description = "List project wallets, optionally filtered by display name, tags and network")]
    async fn list_wallets(&self, #[tool(aggr)] request: ListRequest) -> String {
        let filter = request.into_filter();
        let result = self.client.wallets().get_by(&filter).await;
        self.respond("list wallets", result)
    }

    #[tool(description = "Add a wallet to the Tenderly project")]
    async fn add_wallet(&self, #[tool(aggr)] request: AddRequest) -> String {
        if let Err(message) = self.ensure_writes_allowed() {
            return message;
        }

        let data = AccountData {
            display_name: request.display_name,
            tags: request.tags,
        };
        let result = self.client.wallets().add(&request.address, data).await;
        self.respond("add wallet", result)
    }

    #[tool(description = "Remove a wallet from the Tenderly project")]
    async fn remove_wallet(&self, #[tool(aggr)] request: AddressRequest) -> String {
        if let Err(message) = self.ensure_writes_allowed() {
            return message;
        }

        match self.client.wallets().remove(&request.address).await {
            Ok(()) => format!("Removed wallet {}", request.address),
            Err(e) => self.respond::<()>("remove wallet", Err(e)),
        }
    }

    #[tool(description = "Rename a project wallet and/or append tags to it")]
    async fn update_wallet(&self, #[tool(aggr)] request: UpdateEntityRequest) -> String {
        if let Err(message) = self.ensure_writes_allowed() {
            return message;
        }

        let update = UpdateRequest {
            display_name: request.display_name,
            append_tags: request.append_tags,
        };
        let result = self.client.wallets().update(&request.address, update).await;
        self.respond("update wallet", result)
    }

    #[tool(description = "Simulate a transaction, optionally with per-address state and balance overrides")]
    async fn simulate_transaction(&self, #[tool(aggr)] request: SimulateRequest) -> String {
        let params: SimulationParameters =
            match parse_argument(request.simulation, "simulation parameters") {
                Ok(params) => params,
                Err(message) => return message,
            };

        let result = self.client.simulator().simulate_transaction(&params).await;
        self.respond("simulate transaction", result)
    }

    #[tool(description = "Simulate a bundle of transactions in order on the same chain state")]
    async fn simulate_bundle(&self, #[tool(aggr)] request: SimulateBundleRequest) -> String {
        let params: Vec<SimulationParameters> =
            match parse_argument(Value::Array(request.simulations), "bundle parameters") {
                Ok(params) => params,
                Err(message) => return message,
            };

        let result = self.client.simulator().simulate_bundle(&params).await;
        self.respond("simulate bundle", result)
    }
}

#[tool(tool_box)]
impl ServerHandler for TenderlyMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some("MCP server for a Tenderly project. Supports inspecting, listing and (with --allow-writes) managing project contracts and wallets, contract verification, and transaction and bundle simulation.".into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tenderly_sdk::Configuration;

    fn server(allow_writes: bool) -> TenderlyMcpServer {
        let mut settings = Settings::default();
        settings.account.account_name = "acme".to_string();
        settings.account.project_name = "sims".to_string();
        settings.account.access_key = "key".to_string();
        settings.security.allow_write_operations = allow_writes;

        let client = Client::new(Configuration::new("acme", "sims", "key", Network::Mainnet))
            .expect("valid configuration");
        TenderlyMcpServer::new(client, settings)
    }

    #[test]
    fn test_writes_are_gated() {
        assert!(server(false).ensure_writes_allowed().is_err());
        assert!(server(true).ensure_writes_allowed().is_ok());
    }

    #[test]
    fn test_list_request_into_filter() {
        let filter = ListRequest {
            display_names: Some(vec!["Vault".to_string()]),
            tags: None,
            network: Some(137),
        }
        .into_filter();

        assert_eq!(
            filter.display_name,
            Some(DisplayNameFilter::AnyOf(vec!["Vault".to_string()]))
        );
        assert_eq!(filter.network, Some(Network::Polygon));
        assert!(filter.tags.is_none());
    }

    #[tokio::test]
    async fn test_write_tools_refuse_without_permission() {
        let server = server(false);
        let response = server
            .remove_wallet(AddressRequest {
                address: "0x1111111111111111111111111111111111111111".to_string(),
            })
            .await;
        assert!(response.starts_with("Error: Write operations are disabled"));
    }

    #[tokio::test]
    async fn test_invalid_simulation_arguments_are_reported() {
        let response = server(false)
            .simulate_transaction(SimulateRequest {
                simulation: serde_json::json!({ "transaction": { "from": 1 } }),
            })
            .await;
        assert!(response.starts_with("Error: Invalid simulation parameters"));
    }
}
