//! Remote account records and their projection into domain models.
//!
//! The platform nests the on-chain details under `contract` or `account`
//! depending on what the record is. Which key to read first is decided from the
//! record's `account_type` (v1) or `type` (v2) discriminant; the other key is
//! read when the expected one is absent.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::filter::Filterable;
use crate::models::{Contract, Wallet};
use crate::network::Network;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Contract,
    Wallet,
    /// Any other discriminant (e.g. `unverified_contract`); never listed.
    #[serde(other)]
    Other,
}

/// On-chain details of a tracked address; only a few fields are projected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnChainAccount {
    pub address: String,
    #[serde(deserialize_with = "network_id_string")]
    pub network_id: String,
    #[serde(default)]
    pub balance: Option<String>,
    #[serde(default)]
    pub contract_name: Option<String>,
    #[serde(default)]
    pub compiler_version: Option<String>,
    #[serde(default)]
    pub verification_date: Option<String>,
    #[serde(default)]
    pub verified_by: Option<String>,
    #[serde(default)]
    pub creation_block: Option<u64>,
    #[serde(default)]
    pub creator_address: Option<String>,
    #[serde(default)]
    pub ens_domain: Option<Value>,
}

fn network_id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "network_id must be a string or number, got {}",
            other
        ))),
    }
}

/// Tags are `{"tag": "x"}` objects in v1 and plain strings in v2.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagEntry {
    Labeled { tag: String },
    Plain(String),
}

impl TagEntry {
    pub fn as_str(&self) -> &str {
        match self {
            TagEntry::Labeled { tag } => tag,
            TagEntry::Plain(tag) => tag,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccountRecord {
    pub details: OnChainAccount,
    pub display_name: Option<String>,
    pub tags: Option<Vec<TagEntry>>,
}

/// A project account record, resolved by its discriminant.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawAccountResponse")]
pub enum AccountResponse {
    Contract(AccountRecord),
    Wallet(AccountRecord),
    Other(AccountRecord),
}

#[derive(Deserialize)]
struct RawAccountResponse {
    #[serde(alias = "type")]
    account_type: AccountKind,
    #[serde(default)]
    contract: Option<OnChainAccount>,
    #[serde(default)]
    account: Option<OnChainAccount>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    tags: Option<Vec<TagEntry>>,
}

impl TryFrom<RawAccountResponse> for AccountResponse {
    type Error = String;

    fn try_from(raw: RawAccountResponse) -> Result<Self, Self::Error> {
        let (details, fallback) = match raw.account_type {
            AccountKind::Wallet => (raw.account, raw.contract),
            AccountKind::Contract | AccountKind::Other => (raw.contract, raw.account),
        };
        let details = details
            .or(fallback)
            .ok_or_else(|| "account record has neither a `contract` nor an `account` object".to_string())?;

        let record = AccountRecord {
            details,
            display_name: raw.display_name,
            tags: raw.tags,
        };

        Ok(match raw.account_type {
            AccountKind::Contract => AccountResponse::Contract(record),
            AccountKind::Wallet => AccountResponse::Wallet(record),
            AccountKind::Other => AccountResponse::Other(record),
        })
    }
}

/// Decodes listed records one by one; records that cannot be decoded are skipped.
pub fn decode_records(values: Vec<Value>) -> Vec<AccountResponse> {
    values
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<AccountResponse>(value) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping undecodable account record: {}", e);
                None
            }
        })
        .collect()
}

/// Envelope of the v2 listing endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountListResponse {
    #[serde(default, alias = "contracts")]
    pub accounts: Vec<Value>,
}

impl AccountResponse {
    pub fn kind(&self) -> AccountKind {
        match self {
            AccountResponse::Contract(_) => AccountKind::Contract,
            AccountResponse::Wallet(_) => AccountKind::Wallet,
            AccountResponse::Other(_) => AccountKind::Other,
        }
    }

    pub fn record(&self) -> &AccountRecord {
        match self {
            AccountResponse::Contract(record)
            | AccountResponse::Wallet(record)
            | AccountResponse::Other(record) => record,
        }
    }

    fn into_record(self) -> AccountRecord {
        match self {
            AccountResponse::Contract(record)
            | AccountResponse::Wallet(record)
            | AccountResponse::Other(record) => record,
        }
    }

    pub fn into_contract(self) -> Contract {
        let projected = Projection::from(self.into_record());
        Contract {
            address: projected.address,
            network: projected.network,
            display_name: projected.display_name,
            tags: projected.tags,
        }
    }

    pub fn into_wallet(self) -> Wallet {
        let projected = Projection::from(self.into_record());
        Wallet {
            address: projected.address,
            network: projected.network,
            display_name: projected.display_name,
            tags: projected.tags,
        }
    }
}

struct Projection {
    address: String,
    network: Network,
    display_name: Option<String>,
    tags: Option<Vec<String>>,
}

impl From<AccountRecord> for Projection {
    fn from(record: AccountRecord) -> Self {
        let network = record
            .details
            .network_id
            .trim()
            .parse::<u64>()
            .map(Network::from)
            .unwrap_or(Network::Other(0));

        Self {
            address: record.details.address.to_lowercase(),
            network,
            display_name: record.display_name,
            tags: record
                .tags
                .map(|tags| tags.iter().map(|t| t.as_str().to_string()).collect()),
        }
    }
}

impl Filterable for AccountResponse {
    fn display_name(&self) -> Option<&str> {
        self.record().display_name.as_deref()
    }

    fn tags(&self) -> Vec<&str> {
        self.record()
            .tags
            .as_ref()
            .map(|tags| tags.iter().map(TagEntry::as_str).collect())
            .unwrap_or_default()
    }

    fn network_id(&self) -> &str {
        &self.record().details.network_id
    }
}
