//! Contract verification payloads and the mapping of verification results.
//!
//! Results are always decoded into the error taxonomy: compiler errors,
//! bytecode mismatches and malformed results never come back as `Ok`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

use crate::errors::SdkError;
use crate::network::Network;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRequest {
    /// `<source path>:<contract name>`, e.g. `contracts/Counter.sol:Counter`.
    pub contract_to_verify: String,
    pub solc: SolcConfig,
    #[serde(default)]
    pub config: VerificationConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolcConfig {
    pub version: String,
    pub sources: BTreeMap<String, SourceFile>,
    #[serde(default)]
    pub settings: SolcSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub name: String,
    pub code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolcSettings {
    #[serde(default)]
    pub optimizer: OptimizerSettings,
    #[serde(default)]
    pub evm_version: Option<String>,
    /// Linked libraries per source path.
    #[serde(default)]
    pub libraries: BTreeMap<String, LibraryLinks>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizerSettings {
    pub enabled: bool,
    #[serde(default)]
    pub runs: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryLinks {
    /// Library name to deployed address.
    pub addresses: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationConfig {
    #[serde(default)]
    pub mode: VerificationMode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationMode {
    Public,
    #[default]
    Private,
}

/// Solc diagnostic as reported back by the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilationErrorDetail {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default, rename = "type")]
    pub error_type: Option<String>,
    #[serde(default)]
    pub component: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    pub message: String,
    #[serde(default)]
    pub formatted_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BytecodeMismatchDetail {
    #[serde(default)]
    pub contract_id: Option<String>,
    #[serde(default)]
    pub expected: Option<String>,
    #[serde(default)]
    pub got: Option<String>,
    #[serde(default)]
    pub similarity: Option<f64>,
    #[serde(default)]
    pub assumed_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiedContractSummary {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub contract_id: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub network_id: Option<String>,
    #[serde(default)]
    pub contract_name: Option<String>,
    #[serde(default)]
    pub compiler_version: Option<String>,
    #[serde(default)]
    pub public: Option<bool>,
}

/// One entry of `results`: exactly one of the two shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum VerificationOutcome {
    Verified(VerifiedContractSummary),
    BytecodeMismatch(BytecodeMismatchDetail),
}

#[derive(Debug, Clone, Deserialize)]
struct RawVerificationEntry {
    #[serde(default)]
    verified_contract: Option<VerifiedContractSummary>,
    #[serde(default)]
    bytecode_mismatch_error: Option<BytecodeMismatchDetail>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawVerificationResponse {
    #[serde(default)]
    compilation_errors: Option<Vec<CompilationErrorDetail>>,
    #[serde(default)]
    results: Vec<RawVerificationEntry>,
}

impl TryFrom<RawVerificationEntry> for VerificationOutcome {
    type Error = String;

    fn try_from(entry: RawVerificationEntry) -> Result<Self, Self::Error> {
        match (entry.verified_contract, entry.bytecode_mismatch_error) {
            (Some(verified), None) => Ok(VerificationOutcome::Verified(verified)),
            (None, Some(mismatch)) => Ok(VerificationOutcome::BytecodeMismatch(mismatch)),
            (Some(_), Some(_)) => {
                Err("result carries both a verified contract and a bytecode mismatch".to_string())
            }
            (None, None) => Err("result carries neither a verified contract nor a bytecode mismatch".to_string()),
        }
    }
}

/// Successful verification; `raw` keeps the full remote payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationResult {
    pub contracts: Vec<VerifiedContractSummary>,
    pub raw: Value,
}

fn split_contract_to_verify(contract_to_verify: &str) -> Result<(&str, &str), SdkError> {
    contract_to_verify
        .rsplit_once(':')
        .filter(|(path, name)| !path.is_empty() && !name.is_empty())
        .ok_or_else(|| {
            SdkError::invalid_arguments(format!(
                "contractToVerify must look like '<path>:<name>', got '{}'",
                contract_to_verify
            ))
        })
}

/// Builds the compound verification payload, one descriptor per source file.
///
/// Only the source declaring `contract_to_verify` carries the network/address
/// binding and its library links.
pub fn build_verification_payload(
    address: &str,
    network: Network,
    request: &VerificationRequest,
) -> Result<Value, SdkError> {
    let (target_path, _) = split_contract_to_verify(&request.contract_to_verify)?;

    if request.solc.sources.is_empty() {
        return Err(SdkError::invalid_arguments("solc.sources cannot be empty"));
    }
    if !request.solc.sources.contains_key(target_path) {
        return Err(SdkError::invalid_arguments(format!(
            "Source '{}' named in contractToVerify is not among solc.sources",
            target_path
        )));
    }

    let settings = &request.solc.settings;
    let optimization_count = if settings.optimizer.enabled {
        Some(settings.optimizer.runs)
    } else {
        None
    };

    let contracts: Vec<Value> = request
        .solc
        .sources
        .iter()
        .map(|(path, source)| {
            let mut networks = Map::new();
            if path == target_path {
                let links = settings
                    .libraries
                    .get(path)
                    .map(|libraries| json!(libraries.addresses))
                    .unwrap_or(Value::Null);
                networks.insert(
                    network.id_string(),
                    json!({ "address": address, "links": links }),
                );
            }

            json!({
                "contractName": source.name,
                "source": source.code,
                "sourcePath": path,
                "networks": networks,
                "compiler": { "name": "solc", "version": request.solc.version },
            })
        })
        .collect();

    Ok(json!({
        "contractToVerify": request.contract_to_verify,
        "config": {
            "optimization_count": optimization_count,
            "optimizations_used": settings.optimizer.enabled,
            "evm_version": settings.evm_version,
            "mode": request.config.mode,
        },
        "contracts": contracts,
    }))
}

/// Maps the remote verification payload into a result or a typed error.
pub fn map_verification_response(raw: Value) -> Result<VerificationResult, SdkError> {
    let response: RawVerificationResponse =
        serde_json::from_value(raw.clone()).map_err(|e| SdkError::UnexpectedVerification {
            message: format!("Malformed verification response: {}", e),
            data: Some(raw.clone()),
        })?;

    if let Some(errors) = response.compilation_errors.filter(|errors| !errors.is_empty()) {
        let message = match errors.len() {
            1 => errors[0].message.clone(),
            n => format!("{} (and {} more)", errors[0].message, n - 1),
        };
        return Err(SdkError::Compilation { message, errors });
    }

    if response.results.is_empty() {
        return Err(SdkError::UnexpectedVerification {
            message: "Verification response contains no results".to_string(),
            data: Some(raw),
        });
    }

    let mut contracts = Vec::with_capacity(response.results.len());
    for entry in response.results {
        match VerificationOutcome::try_from(entry) {
            Ok(VerificationOutcome::Verified(summary)) => contracts.push(summary),
            Ok(VerificationOutcome::BytecodeMismatch(diagnostic)) => {
                let message = diagnostic
                    .assumed_reason
                    .clone()
                    .unwrap_or_else(|| "Compiled bytecode does not match on-chain bytecode".to_string());
                return Err(SdkError::BytecodeMismatch {
                    message,
                    diagnostic,
                });
            }
            Err(message) => {
                return Err(SdkError::UnexpectedVerification {
                    message,
                    data: Some(raw),
                })
            }
        }
    }

    Ok(VerificationResult { contracts, raw })
}
