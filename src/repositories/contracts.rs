use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use super::{
    append_tags, apply_update, list_v1, list_v2, single_address_query, Operation, Resource,
};
use crate::client::ClientContext;
use crate::errors::{Result, SdkError};
use crate::filter::EntityFilter;
use crate::models::{AccountData, Contract, UpdateRequest};
use crate::network::Network;
use crate::provider::ApiVersion;
use crate::utils;
use crate::verification::{
    build_verification_payload, map_verification_response, VerificationRequest,
    VerificationResult,
};
use crate::wire::{AccountKind, AccountResponse};

/// Contracts tracked in the configured project, on the configured network.
#[derive(Debug, Clone)]
pub struct ContractRepository {
    context: Arc<ClientContext>,
}

impl ContractRepository {
    pub(crate) fn new(context: Arc<ClientContext>) -> Self {
        Self { context }
    }

    fn network(&self) -> Network {
        self.context.configuration.network
    }

    fn contract_path(&self, address: &str) -> String {
        format!(
            "{}/contract/{}/{}",
            self.context.project_path(ApiVersion::V1),
            self.network().id(),
            address
        )
    }

    /// Remote errors (including "not found") propagate unchanged.
    pub async fn get(&self, address: &str) -> Result<Contract> {
        let address = utils::validate_address(address)?;

        match self
            .context
            .capabilities
            .version_for(Resource::Contract, Operation::Get)
        {
            ApiVersion::V1 => {
                let api = self.context.api(ApiVersion::V1)?;
                let response: AccountResponse = api.get(&self.contract_path(&address), &[]).await?;
                Ok(response.into_contract())
            }
            ApiVersion::V2 => list_v2(
                &self.context,
                "/contracts",
                AccountKind::Contract,
                single_address_query(self.network(), &address),
                &EntityFilter::default(),
            )
            .await?
            .into_iter()
            .next()
            .map(AccountResponse::into_contract)
            .ok_or_else(|| {
                SdkError::not_found(format!(
                    "Contract {} not found on network {}",
                    address,
                    self.network()
                ))
            }),
        }
    }

    pub async fn add(&self, address: &str, data: AccountData) -> Result<Contract> {
        let address = utils::validate_address(address)?;
        let api = self.context.api(ApiVersion::V1)?;
        let path = format!("{}/address", self.context.project_path(ApiVersion::V1));

        let mut body = json!({
            "address": address,
            "network_id": self.network().id_string(),
        });
        if let Some(display_name) = &data.display_name {
            body["display_name"] = json!(display_name);
        }

        api.post::<_, Value>(&path, Some(&body)).await?;
        info!("Added contract {} on network {}", address, self.network());

        if let Some(tags) = data.tags.as_deref().filter(|tags| !tags.is_empty()) {
            append_tags(&self.context, self.network(), &address, tags).await?;
        }

        self.get(&address).await
    }

    /// Remote errors for addresses that are not tracked propagate unchanged.
    pub async fn remove(&self, address: &str) -> Result<()> {
        let address = utils::validate_address(address)?;
        let api = self.context.api(ApiVersion::V1)?;

        api.delete::<Value>(&self.contract_path(&address), None).await?;
        info!("Removed contract {} on network {}", address, self.network());
        Ok(())
    }

    /// Applies tag appends and the rename concurrently, then re-fetches.
    pub async fn update(&self, address: &str, request: UpdateRequest) -> Result<Contract> {
        let address = utils::validate_address(address)?;
        let rename_suffix = format!("/contract/{}/{}/rename", self.network().id(), address);

        apply_update(
            &self.context,
            self.network(),
            &address,
            &request,
            rename_suffix,
        )
        .await?;

        self.get(&address).await
    }

    pub async fn get_all(&self) -> Result<Vec<Contract>> {
        self.get_by(&EntityFilter::default()).await
    }

    /// An empty result is not an error.
    pub async fn get_by(&self, filter: &EntityFilter) -> Result<Vec<Contract>> {
        let records = match self
            .context
            .capabilities
            .version_for(Resource::Contract, Operation::List)
        {
            ApiVersion::V1 => {
                list_v1(
                    &self.context,
                    "/contracts",
                    AccountKind::Contract,
                    vec![("accountType".to_string(), "contract".to_string())],
                    filter,
                )
                .await?
            }
            ApiVersion::V2 => {
                list_v2(
                    &self.context,
                    "/contracts",
                    AccountKind::Contract,
                    Vec::new(),
                    filter,
                )
                .await?
            }
        };

        Ok(records
            .into_iter()
            .map(AccountResponse::into_contract)
            .collect())
    }

    /// Submits sources for verification against the contract at `address`.
    ///
    /// Compiler errors, bytecode mismatches and malformed results are returned
    /// as their typed errors rather than as a raw payload.
    pub async fn verify(
        &self,
        address: &str,
        request: &VerificationRequest,
    ) -> Result<VerificationResult> {
        let address = utils::validate_address(address)?;
        let payload = build_verification_payload(&address, self.network(), request)?;

        let api = self.context.api(ApiVersion::V1)?;
        let path = format!("{}/contracts", self.context.project_path(ApiVersion::V1));
        let raw: Value = api.post(&path, Some(&payload)).await?;

        let result = map_verification_response(raw)?;
        info!(
            "Verified {} ({} contract(s)) on network {}",
            request.contract_to_verify,
            result.contracts.len(),
            self.network()
        );
        Ok(result)
    }
}
