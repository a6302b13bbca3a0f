use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use super::{
    append_tags, apply_update, list_v1, list_v2, single_address_query, Operation, Resource,
};
use crate::client::ClientContext;
use crate::errors::{Result, SdkError};
use crate::filter::EntityFilter;
use crate::models::{AccountData, UpdateRequest, Wallet};
use crate::network::Network;
use crate::provider::ApiVersion;
use crate::utils;
use crate::wire::{AccountKind, AccountResponse};

/// Wallets tracked in the configured project, on the configured network.
#[derive(Debug, Clone)]
pub struct WalletRepository {
    context: Arc<ClientContext>,
}

impl WalletRepository {
    pub(crate) fn new(context: Arc<ClientContext>) -> Self {
        Self { context }
    }

    fn network(&self) -> Network {
        self.context.configuration.network
    }

    /// The accounts listing answers an unknown wallet with an empty list, which
    /// is reported as `NotFound`.
    pub async fn get(&self, address: &str) -> Result<Wallet> {
        let address = utils::validate_address(address)?;

        match self
            .context
            .capabilities
            .version_for(Resource::Wallet, Operation::Get)
        {
            ApiVersion::V1 => {
                let api = self.context.api(ApiVersion::V1)?;
                let path = format!(
                    "{}/wallet/{}/network/{}",
                    self.context.project_path(ApiVersion::V1),
                    address,
                    self.network().id()
                );
                let response: AccountResponse = api.get(&path, &[]).await?;
                Ok(response.into_wallet())
            }
            ApiVersion::V2 => list_v2(
                &self.context,
                "/accounts",
                AccountKind::Wallet,
                single_address_query(self.network(), &address),
                &EntityFilter::default(),
            )
            .await?
            .into_iter()
            .next()
            .map(AccountResponse::into_wallet)
            .ok_or_else(|| {
                SdkError::not_found(format!(
                    "Wallet {} not found on network {}",
                    address,
                    self.network()
                ))
            }),
        }
    }

    pub async fn add(&self, address: &str, data: AccountData) -> Result<Wallet> {
        let address = utils::validate_address(address)?;
        let api = self.context.api(ApiVersion::V1)?;
        let path = format!("{}/wallet", self.context.project_path(ApiVersion::V1));

        let mut body = json!({
            "address": address,
            "network_ids": [self.network().id_string()],
        });
        if let Some(display_name) = &data.display_name {
            body["display_name"] = json!(display_name);
        }

        api.post::<_, Value>(&path, Some(&body)).await?;
        info!("Added wallet {} on network {}", address, self.network());

        if let Some(tags) = data.tags.as_deref().filter(|tags| !tags.is_empty()) {
            append_tags(&self.context, self.network(), &address, tags).await?;
        }

        self.get(&address).await
    }

    pub async fn remove(&self, address: &str) -> Result<()> {
        let address = utils::validate_address(address)?;
        let api = self.context.api(ApiVersion::V1)?;
        let path = format!("{}/contracts", self.context.project_path(ApiVersion::V1));
        let body = json!({ "account_ids": [utils::account_id(self.network(), &address)] });

        api.delete(&path, Some(&body)).await?;
        info!("Removed wallet {} on network {}", address, self.network());
        Ok(())
    }

    pub async fn update(&self, address: &str, request: UpdateRequest) -> Result<Wallet> {
        let address = utils::validate_address(address)?;
        let rename_suffix = format!("/wallet/{}/network/{}/rename", address, self.network().id());

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

    pub async fn get_all(&self) -> Result<Vec<Wallet>> {
        self.get_by(&EntityFilter::default()).await
    }

    pub async fn get_by(&self, filter: &EntityFilter) -> Result<Vec<Wallet>> {
        let records = match self
            .context
            .capabilities
            .version_for(Resource::Wallet, Operation::List)
        {
            ApiVersion::V1 => {
                list_v1(
                    &self.context,
                    "/wallets",
                    AccountKind::Wallet,
                    Vec::new(),
                    filter,
                )
                .await?
            }
            ApiVersion::V2 => {
                list_v2(
                    &self.context,
                    "/accounts",
                    AccountKind::Wallet,
                    Vec::new(),
                    filter,
                )
                .await?
            }
        };

        Ok(records.into_iter().map(AccountResponse::into_wallet).collect())
    }
}
