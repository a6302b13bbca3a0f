mod common;

use common::*;
use serde_json::json;
use std::collections::BTreeMap;
use tenderly_sdk::verification::{SolcConfig, SolcSettings, SourceFile, VerificationConfig};
use tenderly_sdk::{
    AccountData, DisplayNameFilter, EntityFilter, SdkError, UpdateRequest, VerificationRequest,
};
use wiremock::matchers::{body_json, body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn contract_path() -> String {
    format!("{}/contract/1/{}", V1_PROJECT, CONTRACT.to_lowercase())
}

#[tokio::test]
async fn test_add_then_get_returns_lowercased_address() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{}/address", V1_PROJECT)))
        .and(body_json(json!({
            "address": CONTRACT.to_lowercase(),
            "network_id": "1",
            "display_name": "Dai Stablecoin",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(contract_path()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(contract_record(CONTRACT, Some("Dai Stablecoin"), &[])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let contract = client(&server)
        .contracts()
        .add(CONTRACT, AccountData::named("Dai Stablecoin"))
        .await
        .unwrap();

    assert_eq!(contract.address, CONTRACT.to_lowercase());
    assert_eq!(contract.display_name.as_deref(), Some("Dai Stablecoin"));
    assert_eq!(contract.tags, Some(vec![]));
}

#[tokio::test]
async fn test_add_with_tags_appends_each_tag() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{}/address", V1_PROJECT)))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{}/tag", V1_PROJECT)))
        .and(body_partial_json(json!({
            "contract_ids": [format!("eth:1:{}", CONTRACT.to_lowercase())]
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(contract_path()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(contract_record(CONTRACT, None, &["stable", "erc20"])),
        )
        .mount(&server)
        .await;

    let data = AccountData {
        display_name: None,
        tags: Some(vec!["stable".to_string(), "erc20".to_string()]),
    };
    let contract = client(&server).contracts().add(CONTRACT, data).await.unwrap();

    assert_eq!(
        contract.tags,
        Some(vec!["stable".to_string(), "erc20".to_string()])
    );
}

#[tokio::test]
async fn test_update_renames_and_appends_tags() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!(
            "{}/contract/1/{}/rename",
            V1_PROJECT,
            CONTRACT.to_lowercase()
        )))
        .and(body_json(json!({ "display_name": "DAI" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{}/tag", V1_PROJECT)))
        .and(body_partial_json(json!({ "tag": "maker" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(contract_path()))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(contract_record(CONTRACT, Some("DAI"), &["maker"])),
        )
        .mount(&server)
        .await;

    let contract = client(&server)
        .contracts()
        .update(
            CONTRACT,
            UpdateRequest {
                display_name: Some("DAI".to_string()),
                append_tags: Some(vec!["maker".to_string()]),
            },
        )
        .await
        .unwrap();

    assert_eq!(contract.display_name.as_deref(), Some("DAI"));
    assert_eq!(contract.tags, Some(vec!["maker".to_string()]));
}

#[tokio::test]
async fn test_update_fails_fast_when_a_tag_call_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{}/tag", V1_PROJECT)))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": { "slug": "forbidden", "message": "read-only key" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(contract_record(CONTRACT, None, &[])))
        .expect(0)
        .mount(&server)
        .await;

    let err = client(&server)
        .contracts()
        .update(
            CONTRACT,
            UpdateRequest {
                display_name: None,
                append_tags: Some(vec!["a".to_string(), "b".to_string()]),
            },
        )
        .await
        .unwrap_err();

    assert_eq!(err.slug(), "forbidden");
    assert_eq!(err.status(), Some(403));
}

#[tokio::test]
async fn test_remove_issues_delete() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(contract_path()))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client(&server).contracts().remove(CONTRACT).await.unwrap();
}

#[tokio::test]
async fn test_get_by_filters_listed_contracts_locally() {
    let server = MockServer::start().await;
    let other = "0x1f9840a85d5af5bf1d1762f925bdaddc4201f984";
    let third = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48";
    Mock::given(method("GET"))
        .and(path(format!("{}/contracts", V1_PROJECT)))
        .and(query_param("accountType", "contract"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            contract_record(CONTRACT, Some("Maker Vault"), &["stable", "maker"]),
            contract_record(other, Some("Uniswap Token"), &["governance"]),
            contract_record(third, Some("USDC Vault"), &["stable"]),
            wallet_record(WALLET, Some("Vault Treasury"), &["stable"]),
        ])))
        .mount(&server)
        .await;

    let contracts = client(&server).contracts();

    let filter = EntityFilter {
        display_name: Some(DisplayNameFilter::from("Vault")),
        tags: Some(vec!["stable".to_string()]),
        network: None,
    };
    let vaults = contracts.get_by(&filter).await.unwrap();
    let addresses: Vec<&str> = vaults.iter().map(|c| c.address.as_str()).collect();
    assert_eq!(addresses, vec![CONTRACT.to_lowercase().as_str(), third]);

    let all = contracts.get_all().await.unwrap();
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn test_get_by_with_no_matches_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/contracts", V1_PROJECT)))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .mount(&server)
        .await;

    let found = client(&server)
        .contracts()
        .get_by(&EntityFilter {
            tags: Some(vec!["missing".to_string()]),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(found.is_empty());
}

fn verification_request() -> VerificationRequest {
    VerificationRequest {
        contract_to_verify: "contracts/Dai.sol:Dai".to_string(),
        solc: SolcConfig {
            version: "v0.5.12".to_string(),
            sources: BTreeMap::from([(
                "contracts/Dai.sol".to_string(),
                SourceFile {
                    name: "Dai".to_string(),
                    code: "contract Dai {}".to_string(),
                },
            )]),
            settings: SolcSettings::default(),
        },
        config: VerificationConfig::default(),
    }
}

#[tokio::test]
async fn test_verify_returns_verified_contracts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{}/contracts", V1_PROJECT)))
        .and(body_partial_json(json!({
            "contractToVerify": "contracts/Dai.sol:Dai",
            "config": { "mode": "private", "optimizations_used": false }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "compilation_errors": [],
            "results": [{
                "verified_contract": {
                    "id": "v1",
                    "address": CONTRACT.to_lowercase(),
                    "network_id": "1",
                    "contract_name": "Dai"
                }
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = client(&server)
        .contracts()
        .verify(CONTRACT, &verification_request())
        .await
        .unwrap();

    assert_eq!(result.contracts.len(), 1);
    assert_eq!(result.contracts[0].contract_name.as_deref(), Some("Dai"));
}

#[tokio::test]
async fn test_verify_maps_compilation_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{}/contracts", V1_PROJECT)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "compilation_errors": [{
                "source": "contracts/Dai.sol",
                "severity": "error",
                "message": "Expected ';' but got '}'"
            }],
            "results": []
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .contracts()
        .verify(CONTRACT, &verification_request())
        .await
        .unwrap_err();

    match err {
        SdkError::Compilation { message, errors } => {
            assert_eq!(message, "Expected ';' but got '}'");
            assert_eq!(errors.len(), 1);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_listing_tolerates_unusual_records() {
    let server = MockServer::start().await;
    let nested_under_account = "0x1f9840a85d5af5bf1d1762f925bdaddc4201f984";
    Mock::given(method("GET"))
        .and(path(format!("{}/contracts", V1_PROJECT)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            contract_record(CONTRACT, Some("Dai"), &[]),
            {
                "account_type": "contract",
                "display_name": "Uni",
                "account": { "address": nested_under_account, "network_id": "1" }
            },
            {
                "account_type": "unverified_contract",
                "contract": { "address": "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48", "network_id": "1" }
            },
            { "account_type": "contract", "display_name": "broken" },
        ])))
        .mount(&server)
        .await;

    let contracts = client(&server).contracts().get_all().await.unwrap();
    let addresses: Vec<&str> = contracts.iter().map(|c| c.address.as_str()).collect();
    assert_eq!(
        addresses,
        vec![CONTRACT.to_lowercase().as_str(), nested_under_account]
    );
}

#[tokio::test]
async fn test_empty_update_still_refetches() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(contract_path()))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(contract_record(CONTRACT, Some("Dai"), &["stable"])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let contract = client(&server)
        .contracts()
        .update(CONTRACT, UpdateRequest::default())
        .await
        .unwrap();
    assert_eq!(contract.display_name.as_deref(), Some("Dai"));
}

#[tokio::test]
async fn test_rename_only_update_keeps_tags() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!(
            "{}/contract/1/{}/rename",
            V1_PROJECT,
            CONTRACT.to_lowercase()
        )))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{}/tag", V1_PROJECT)))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(contract_path()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(contract_record(CONTRACT, Some("X"), &["stable", "erc20"])),
        )
        .mount(&server)
        .await;

    let contract = client(&server)
        .contracts()
        .update(
            CONTRACT,
            UpdateRequest {
                display_name: Some("X".to_string()),
                append_tags: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(contract.display_name.as_deref(), Some("X"));
    assert_eq!(
        contract.tags,
        Some(vec!["stable".to_string(), "erc20".to_string()])
    );
}
