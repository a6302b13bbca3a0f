//! Contract and wallet repositories.
//!
//! Both resources live behind the same project "accounts" API, so tag appends,
//! renames and listing are shared here. Reads that exist in two API versions
//! are routed through [`ApiCapabilities`]; every mutation is a v1 call.

pub mod contracts;
pub mod wallets;

pub use contracts::ContractRepository;
pub use wallets::WalletRepository;

use futures::future::{try_join_all, BoxFuture, FutureExt};
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::client::ClientContext;
use crate::errors::Result;
use crate::filter::{filter_entities, EntityFilter, PredicateMap};
use crate::models::UpdateRequest;
use crate::network::Network;
use crate::provider::ApiVersion;
use crate::transport::QueryParams;
use crate::utils;
use crate::wire::{decode_records, AccountKind, AccountListResponse, AccountResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Contract,
    Wallet,
}

/// Reads with more than one API implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Get,
    List,
}

const DEFAULT_CAPABILITIES: &[(Resource, Operation, ApiVersion)] = &[
    (Resource::Contract, Operation::Get, ApiVersion::V1),
    (Resource::Contract, Operation::List, ApiVersion::V1),
    (Resource::Wallet, Operation::Get, ApiVersion::V2),
    (Resource::Wallet, Operation::List, ApiVersion::V2),
];

/// API version used for each resource read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiCapabilities {
    table: HashMap<(Resource, Operation), ApiVersion>,
}

impl Default for ApiCapabilities {
    fn default() -> Self {
        Self {
            table: DEFAULT_CAPABILITIES
                .iter()
                .map(|(resource, operation, version)| ((*resource, *operation), *version))
                .collect(),
        }
    }
}

impl ApiCapabilities {
    pub fn version_for(&self, resource: Resource, operation: Operation) -> ApiVersion {
        self.table
            .get(&(resource, operation))
            .copied()
            .unwrap_or(ApiVersion::V1)
    }

    pub fn with(mut self, resource: Resource, operation: Operation, version: ApiVersion) -> Self {
        self.table.insert((resource, operation), version);
        self
    }
}

/// Query string for the v2 listing endpoints; empty criteria are left out.
pub(crate) fn v2_filter_query(kind: AccountKind, filter: &EntityFilter) -> QueryParams {
    let mut query = QueryParams::new();
    let type_name = match kind {
        AccountKind::Contract => Some("contract"),
        AccountKind::Wallet => Some("wallet"),
        AccountKind::Other => None,
    };
    if let Some(type_name) = type_name {
        query.push(("types[]".to_string(), type_name.to_string()));
    }

    if let Some(display_name) = &filter.display_name {
        query.extend(
            display_name
                .names()
                .into_iter()
                .filter(|name| !name.is_empty())
                .map(|name| ("display_names[]".to_string(), name.to_string())),
        );
    }

    if let Some(tags) = &filter.tags {
        query.extend(
            tags.iter()
                .filter(|tag| !tag.is_empty())
                .map(|tag| ("tags[]".to_string(), tag.clone())),
        );
    }

    if let Some(network) = filter.network {
        query.push(("networkIDs[]".to_string(), network.id_string()));
    }

    query
}

/// Lists `kind` records through the v2 accounts API.
pub(crate) async fn list_v2(
    context: &ClientContext,
    path_suffix: &str,
    kind: AccountKind,
    mut query: QueryParams,
    filter: &EntityFilter,
) -> Result<Vec<AccountResponse>> {
    query.extend(v2_filter_query(kind, filter));

    let api = context.api(ApiVersion::V2)?;
    let path = format!("{}{}", context.project_path(ApiVersion::V2), path_suffix);
    let response: AccountListResponse = api.get(&path, &query).await?;

    Ok(decode_records(response.accounts)
        .into_iter()
        .filter(|account| account.kind() == kind)
        .collect())
}

/// Lists `kind` records through the v1 API and filters them locally.
pub(crate) async fn list_v1(
    context: &ClientContext,
    path_suffix: &str,
    kind: AccountKind,
    query: QueryParams,
    filter: &EntityFilter,
) -> Result<Vec<AccountResponse>> {
    let api = context.api(ApiVersion::V1)?;
    let path = format!("{}{}", context.project_path(ApiVersion::V1), path_suffix);
    let listed: Option<Vec<Value>> = api.get(&path, &query).await?;

    let listed: Vec<AccountResponse> = decode_records(listed.unwrap_or_default())
        .into_iter()
        .filter(|account| account.kind() == kind)
        .collect();
    let total = listed.len();

    let matching = filter_entities(listed, filter, &PredicateMap::standard());
    debug!("{} of {} listed accounts match the filter", matching.len(), total);

    Ok(matching)
}

/// v2 query selecting one address on the configured network.
pub(crate) fn single_address_query(network: Network, address: &str) -> QueryParams {
    vec![
        ("addresses[]".to_string(), address.to_string()),
        ("networkIDs[]".to_string(), network.id_string()),
    ]
}

async fn append_tag(context: &ClientContext, network: Network, address: &str, tag: &str) -> Result<()> {
    let api = context.api(ApiVersion::V1)?;
    let path = format!("{}/tag", context.project_path(ApiVersion::V1));
    let body = json!({
        "contract_ids": [utils::account_id(network, address)],
        "tag": tag,
    });

    api.post::<_, Value>(&path, Some(&body)).await?;
    debug!("Tagged {} with '{}'", address, tag);
    Ok(())
}

async fn rename(context: &ClientContext, path_suffix: String, display_name: &str) -> Result<()> {
    let api = context.api(ApiVersion::V1)?;
    let path = format!("{}{}", context.project_path(ApiVersion::V1), path_suffix);
    let body = json!({ "display_name": display_name });

    api.post::<_, Value>(&path, Some(&body)).await?;
    debug!("Renamed via {} to '{}'", path, display_name);
    Ok(())
}

/// Appends tags (one call each) and renames concurrently; fails on the first error.
///
/// Calls that already completed are not rolled back, so a failure can leave
/// some tags applied.
pub(crate) async fn apply_update(
    context: &ClientContext,
    network: Network,
    address: &str,
    request: &UpdateRequest,
    rename_suffix: String,
) -> Result<()> {
    let mut calls: Vec<BoxFuture<'_, Result<()>>> = Vec::new();

    for tag in request.append_tags.iter().flatten() {
        calls.push(append_tag(context, network, address, tag).boxed());
    }

    if let Some(display_name) = &request.display_name {
        calls.push(rename(context, rename_suffix, display_name).boxed());
    }

    if calls.is_empty() {
        return Ok(());
    }

    info!("Applying {} update call(s) to {}", calls.len(), address);
    try_join_all(calls).await?;
    Ok(())
}

/// Appends every tag concurrently; used after adding an address.
pub(crate) async fn append_tags(
    context: &ClientContext,
    network: Network,
    address: &str,
    tags: &[String],
) -> Result<()> {
    try_join_all(
        tags.iter()
            .map(|tag| append_tag(context, network, address, tag)),
    )
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::DisplayNameFilter;

    #[test]
    fn test_default_capabilities() {
        let caps = ApiCapabilities::default();
        assert_eq!(caps.version_for(Resource::Contract, Operation::Get), ApiVersion::V1);
        assert_eq!(caps.version_for(Resource::Contract, Operation::List), ApiVersion::V1);
        assert_eq!(caps.version_for(Resource::Wallet, Operation::Get), ApiVersion::V2);
        assert_eq!(caps.version_for(Resource::Wallet, Operation::List), ApiVersion::V2);

        let caps = caps.with(Resource::Contract, Operation::List, ApiVersion::V2);
        assert_eq!(caps.version_for(Resource::Contract, Operation::List), ApiVersion::V2);
    }

    #[test]
    fn test_v2_filter_query_skips_empty_criteria() {
        let query = v2_filter_query(AccountKind::Wallet, &EntityFilter::default());
        assert_eq!(query, vec![("types[]".to_string(), "wallet".to_string())]);

        let filter = EntityFilter {
            tags: Some(vec!["a".to_string(), String::new()]),
            display_name: Some(DisplayNameFilter::AnyOf(vec!["x".to_string(), "y".to_string()])),
            network: Some(Network::Polygon),
        };
        let query = v2_filter_query(AccountKind::Contract, &filter);
        assert_eq!(
            query,
            vec![
                ("types[]".to_string(), "contract".to_string()),
                ("display_names[]".to_string(), "x".to_string()),
                ("display_names[]".to_string(), "y".to_string()),
                ("tags[]".to_string(), "a".to_string()),
                ("networkIDs[]".to_string(), "137".to_string()),
            ]
        );
    }
}
