//! Transaction and bundle simulation.
//!
//! State overrides are sent through the encode-states endpoint first; the
//! encoded storage slots then replace the raw state in the simulation payload.

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::client::ClientContext;
use crate::errors::{ApiError, Result, SdkError};
use crate::network::Network;
use crate::provider::ApiVersion;
use crate::utils;

/// Storage overrides keyed by slot (or variable expression) as accepted by encode-states.
pub type StateOverride = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionParameters {
    pub from: String,
    pub to: String,
    #[serde(default = "empty_input")]
    pub input: String,
    pub gas: u64,
    #[serde(default = "zero_quantity")]
    pub gas_price: String,
    #[serde(default = "zero_quantity")]
    pub value: String,
}

fn empty_input() -> String {
    "0x".to_string()
}

fn zero_quantity() -> String {
    "0".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<StateOverride>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationParameters {
    pub transaction: TransactionParameters,
    /// Simulates on top of the latest block when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overrides: Option<BTreeMap<String, AddressOverride>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawLog {
    pub address: String,
    pub topics: Vec<String>,
    pub data: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationLog {
    pub name: Option<String>,
    pub anonymous: bool,
    pub inputs: Vec<Value>,
    pub raw: RawLog,
}

/// One call frame of the execution trace, in depth-first order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceCall {
    pub depth: usize,
    pub call_type: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub gas: Option<u64>,
    pub gas_used: Option<u64>,
    pub value: Option<String>,
    pub input: Option<String>,
    pub output: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutput {
    pub status: bool,
    pub gas_used: u64,
    pub cumulative_gas_used: u64,
    pub block_number: u64,
    pub logs: Vec<SimulationLog>,
    pub trace: Vec<TraceCall>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
struct StateObject {
    #[serde(skip_serializing_if = "Option::is_none")]
    storage: Option<StateOverride>,
    #[serde(skip_serializing_if = "Option::is_none")]
    balance: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct SimulationPayload {
    network_id: String,
    from: String,
    to: String,
    input: String,
    gas: u64,
    gas_price: String,
    value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    block_number: Option<u64>,
    save: bool,
    save_if_fails: bool,
    simulation_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    state_objects: Option<BTreeMap<String, StateObject>>,
}

/// Validated payload whose storage overrides have not been encoded yet.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SimulationDraft {
    payload: SimulationPayload,
    pending_state: BTreeMap<String, StateOverride>,
}

impl SimulationDraft {
    fn new(network: Network, params: &SimulationParameters) -> Result<Self> {
        let tx = &params.transaction;
        let from = utils::validate_address(&tx.from)?;
        let to = utils::validate_address(&tx.to)?;
        utils::validate_hex_data("input", &tx.input)?;
        // Quantities go out as decimal strings whatever notation the caller used.
        let gas_price = utils::validate_quantity("gas_price", &tx.gas_price)?.to_string();
        let value = utils::validate_quantity("value", &tx.value)?.to_string();

        let mut state_objects: BTreeMap<String, StateObject> = BTreeMap::new();
        let mut pending_state = BTreeMap::new();

        for (address, address_override) in params.overrides.iter().flatten() {
            let address = utils::validate_address(address)?;
            if state_objects.contains_key(&address) {
                return Err(SdkError::invalid_arguments(format!(
                    "Duplicate override for address {}",
                    address
                )));
            }

            let balance = address_override
                .balance
                .as_deref()
                .map(|balance| utils::validate_quantity("balance", balance))
                .transpose()?
                .map(|balance| balance.to_string());

            if let Some(state) = address_override.state.as_ref().filter(|s| !s.is_empty()) {
                pending_state.insert(address.clone(), state.clone());
            }

            state_objects.insert(
                address,
                StateObject {
                    storage: None,
                    balance,
                },
            );
        }

        Ok(Self {
            payload: SimulationPayload {
                network_id: network.id_string(),
                from,
                to,
                input: tx.input.clone(),
                gas: tx.gas,
                gas_price,
                value,
                block_number: params.block_number,
                save: false,
                save_if_fails: false,
                simulation_type: "full",
                state_objects: (!state_objects.is_empty()).then_some(state_objects),
            },
            pending_state,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EncodeStatesRequest<'a> {
    #[serde(rename = "networkID")]
    network_id: String,
    state_overrides: BTreeMap<&'a str, EncodeStateValue<&'a StateOverride>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct EncodeStateValue<T> {
    value: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EncodeStatesResponse {
    #[serde(default)]
    state_overrides: BTreeMap<String, EncodeStateValue<StateOverride>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCall {
    call_type: Option<String>,
    from: Option<String>,
    to: Option<String>,
    gas: Option<u64>,
    gas_used: Option<u64>,
    value: Option<String>,
    input: Option<String>,
    output: Option<String>,
    error: Option<String>,
    calls: Option<Vec<RawCall>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawTransactionInfo {
    logs: Option<Vec<SimulationLog>>,
    call_trace: Option<RawCall>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSimulatedTransaction {
    status: bool,
    gas_used: u64,
    cumulative_gas_used: u64,
    block_number: u64,
    transaction_info: Option<RawTransactionInfo>,
}

#[derive(Debug, Deserialize)]
struct SimulateResponse {
    transaction: RawSimulatedTransaction,
}

#[derive(Debug, Deserialize)]
struct SimulateBatchResponse {
    #[serde(default)]
    simulation_results: Vec<SimulateResponse>,
}

fn flatten_trace(call: RawCall, depth: usize, out: &mut Vec<TraceCall>) {
    let children = call.calls.unwrap_or_default();
    out.push(TraceCall {
        depth,
        call_type: call.call_type,
        from: call.from,
        to: call.to,
        gas: call.gas,
        gas_used: call.gas_used,
        value: call.value,
        input: call.input,
        output: call.output,
        error: call.error,
    });

    for child in children {
        flatten_trace(child, depth + 1, out);
    }
}

impl From<RawSimulatedTransaction> for SimulationOutput {
    fn from(tx: RawSimulatedTransaction) -> Self {
        let info = tx.transaction_info.unwrap_or_default();
        let mut trace = Vec::new();
        if let Some(root) = info.call_trace {
            flatten_trace(root, 0, &mut trace);
        }

        Self {
            status: tx.status,
            gas_used: tx.gas_used,
            cumulative_gas_used: tx.cumulative_gas_used,
            block_number: tx.block_number,
            logs: info.logs.unwrap_or_default(),
            trace,
        }
    }
}

fn encoding_error(error: SdkError) -> SdkError {
    match error {
        SdkError::Api(api) => SdkError::Encoding {
            message: api.message.clone(),
            source: Some(api),
        },
        other => other,
    }
}

#[derive(Debug, Clone)]
pub struct Simulator {
    context: Arc<ClientContext>,
}

impl Simulator {
    pub(crate) fn new(context: Arc<ClientContext>) -> Self {
        Self { context }
    }

    fn network(&self) -> Network {
        self.context.configuration.network
    }

    fn project_endpoint(&self, suffix: &str) -> String {
        format!("{}{}", self.context.project_path(ApiVersion::V1), suffix)
    }

    /// Encodes the draft's pending storage overrides and merges them into its payload.
    async fn encode(&self, draft: SimulationDraft) -> Result<SimulationPayload> {
        let SimulationDraft {
            mut payload,
            pending_state,
        } = draft;

        if pending_state.is_empty() {
            return Ok(payload);
        }

        let request = EncodeStatesRequest {
            network_id: payload.network_id.clone(),
            state_overrides: pending_state
                .iter()
                .map(|(address, state)| (address.as_str(), EncodeStateValue { value: state }))
                .collect(),
        };

        let api = self.context.api(ApiVersion::V1).map_err(encoding_error)?;
        let response: EncodeStatesResponse = api
            .post(&self.project_endpoint("/contracts/encode-states"), Some(&request))
            .await
            .map_err(encoding_error)?;
        debug!(
            "Encoded state overrides for {} address(es)",
            response.state_overrides.len()
        );

        let state_objects = payload.state_objects.get_or_insert_with(BTreeMap::new);
        for (address, encoded) in response.state_overrides {
            state_objects
                .entry(address.to_lowercase())
                .or_default()
                .storage = Some(encoded.value);
        }

        Ok(payload)
    }

    pub async fn simulate_transaction(&self, params: &SimulationParameters) -> Result<SimulationOutput> {
        let draft = SimulationDraft::new(self.network(), params)?;
        let payload = self.encode(draft).await?;

        let api = self.context.api(ApiVersion::V1)?;
        let response: SimulateResponse = api
            .post(&self.project_endpoint("/simulate"), Some(&payload))
            .await?;

        info!(
            "Simulated transaction {} -> {} on network {}",
            payload.from,
            payload.to,
            self.network()
        );
        Ok(response.transaction.into())
    }

    /// Simulates the transactions in order on one chain state.
    ///
    /// Every transaction is validated before any request is sent. Outputs are
    /// index-aligned with `params`.
    pub async fn simulate_bundle(
        &self,
        params: &[SimulationParameters],
    ) -> Result<Vec<SimulationOutput>> {
        if params.is_empty() {
            return Err(SdkError::invalid_arguments(
                "A bundle needs at least one transaction",
            ));
        }

        let drafts = params
            .iter()
            .map(|p| SimulationDraft::new(self.network(), p))
            .collect::<Result<Vec<_>>>()?;

        // try_join_all keeps input order regardless of completion order.
        let simulations = try_join_all(drafts.into_iter().map(|draft| self.encode(draft))).await?;

        let api = self.context.api(ApiVersion::V1)?;
        let body = serde_json::json!({ "simulations": simulations });
        let response: SimulateBatchResponse = api
            .post(&self.project_endpoint("/simulate-batch"), Some(&body))
            .await?;

        if response.simulation_results.len() != simulations.len() {
            return Err(ApiError::invalid_body(
                200,
                format!(
                    "Expected {} simulation results, received {}",
                    simulations.len(),
                    response.simulation_results.len()
                ),
                None,
            )
            .into());
        }

        info!(
            "Simulated bundle of {} transaction(s) on network {}",
            simulations.len(),
            self.network()
        );
        Ok(response
            .simulation_results
            .into_iter()
            .map(|result| result.transaction.into())
            .collect())
    }
}
