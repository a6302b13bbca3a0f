#![allow(dead_code)]

use serde_json::{json, Value};
use tenderly_sdk::{Client, Configuration, Network};
use wiremock::MockServer;

pub const ACCESS_KEY: &str = "test-access-key";
pub const V1_PROJECT: &str = "/v1/account/acme/project/sims";
pub const V2_PROJECT: &str = "/v2/accounts/acme/projects/sims";

pub const CONTRACT: &str = "0x6B175474E89094C44Da98b954EedeAC495271d0F";
pub const WALLET: &str = "0xDc6a8b3dA5D1A0aC2dD4Cd7d5B6AcE6A5bB63C4e";

pub fn client(server: &MockServer) -> Client {
    Client::new(
        Configuration::new("acme", "sims", ACCESS_KEY, Network::Mainnet)
            .with_api_base_url(server.uri()),
    )
    .expect("valid configuration")
}

pub fn contract_record(address: &str, display_name: Option<&str>, tags: &[&str]) -> Value {
    json!({
        "id": format!("eth:1:{}", address.to_lowercase()),
        "account_type": "contract",
        "display_name": display_name,
        "tags": tags.iter().map(|tag| json!({ "tag": tag })).collect::<Vec<_>>(),
        "contract": {
            "address": address.to_lowercase(),
            "network_id": "1",
            "contract_name": "Dai"
        }
    })
}

pub fn wallet_record(address: &str, display_name: Option<&str>, tags: &[&str]) -> Value {
    json!({
        "id": format!("eth:1:{}", address.to_lowercase()),
        "type": "wallet",
        "display_name": display_name,
        "tags": tags,
        "account": {
            "address": address.to_lowercase(),
            "network_id": "1",
            "balance": "1000000000000000000"
        }
    })
}
