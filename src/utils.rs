use alloy::primitives::{Address, U256};
use std::str::FromStr;

use crate::errors::{SdkError, INVALID_RESPONSE_BODY, NO_RESPONSE, REQUEST_SETUP_ERROR};
use crate::network::Network;

/// Validates an Ethereum address and returns it lowercased.
pub fn validate_address(address: &str) -> Result<String, SdkError> {
    let address = address.trim();

    if address.is_empty() {
        return Err(SdkError::invalid_arguments("Address cannot be empty"));
    }

    if !address.starts_with("0x") && !address.starts_with("0X") {
        return Err(SdkError::invalid_arguments(format!(
            "Invalid address format: '{}'. Addresses must start with '0x'",
            address
        )));
    }

    if address.len() != 42 {
        return Err(SdkError::invalid_arguments(format!(
            "Invalid address length: '{}'. Addresses must be exactly 42 characters (0x + 40 hex characters)",
            address
        )));
    }

    let hex_part = &address[2..];
    if !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(SdkError::invalid_arguments(format!(
            "Invalid address format: '{}'. Contains non-hexadecimal characters",
            address
        )));
    }

    let parsed = Address::from_str(hex_part).map_err(|e| {
        SdkError::invalid_arguments(format!("Invalid address: '{}'. Error: {}", address, e))
    })?;

    Ok(format!("0x{:x}", parsed))
}

/// Validates `0x`-prefixed hex payloads such as calldata or bytecode.
pub fn validate_hex_data(field: &str, data: &str) -> Result<(), SdkError> {
    let stripped = data
        .strip_prefix("0x")
        .or_else(|| data.strip_prefix("0X"))
        .ok_or_else(|| {
            SdkError::invalid_arguments(format!("{} must be a 0x-prefixed hex string", field))
        })?;

    hex::decode(stripped)
        .map(|_| ())
        .map_err(|e| SdkError::invalid_arguments(format!("Invalid hex in {}: {}", field, e)))
}

/// Validates a wei quantity given as a decimal or `0x`-prefixed hex string.
pub fn validate_quantity(field: &str, value: &str) -> Result<U256, SdkError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(SdkError::invalid_arguments(format!("{} cannot be empty", field)));
    }

    if let Some(hex_part) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        U256::from_str_radix(hex_part, 16).map_err(|_| {
            SdkError::invalid_arguments(format!("Invalid hexadecimal {}: '{}'", field, value))
        })
    } else {
        U256::from_str(value).map_err(|_| {
            SdkError::invalid_arguments(format!(
                "Invalid numeric {}: '{}'. Use decimal format or '0x' prefixed hex",
                field, value
            ))
        })
    }
}

/// Identifier the platform uses for an address tracked on a network.
pub fn account_id(network: Network, address: &str) -> String {
    format!("eth:{}:{}", network.id(), address)
}

/// Creates user-friendly error messages for client failures
pub fn interpret_sdk_error(error: &SdkError) -> String {
    match error {
        SdkError::Api(api) if api.slug == NO_RESPONSE => format!(
            "Network error: no response from the Tenderly API. Check your connection and base URL. ({})",
            api.message
        ),
        SdkError::Api(api) if api.slug == REQUEST_SETUP_ERROR => {
            format!("Request could not be built: {}", api.message)
        }
        SdkError::Api(api) if api.slug == INVALID_RESPONSE_BODY => {
            format!("Unexpected response from the Tenderly API: {}", api.message)
        }
        SdkError::Api(api) => match api.status {
            Some(401) | Some(403) => format!(
                "Authentication error: the access key was rejected ({}). Check TENDERLY_ACCESS_KEY.",
                api.message
            ),
            Some(404) => format!("Not found: {}", api.message),
            Some(429) => "Rate limit error: too many requests to the Tenderly API. Try again in a few moments.".to_string(),
            _ => format!("API error [{}]: {}", api.slug, api.message),
        },
        SdkError::InvalidConstructorParameters { message } => {
            format!("Configuration error: {}", message)
        }
        SdkError::InvalidArguments { message } => format!("Invalid input: {}", message),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ApiError;

    #[test]
    fn test_validate_address() {
        assert_eq!(
            validate_address("0x742d35Cc6435C9c1c72c5E7b18BaB7e1DB7a5d6e").unwrap(),
            "0x742d35cc6435c9c1c72c5e7b18bab7e1db7a5d6e"
        );
        assert!(validate_address(" 0x0000000000000000000000000000000000000000 ").is_ok());

        assert!(validate_address("").is_err());
        assert!(validate_address("not_an_address").is_err());
        assert!(validate_address("0x123").is_err());
        assert!(validate_address("742d35Cc6435C9c1c72c5E7b18BaB7e1DB7a5d6e").is_err());
        assert!(validate_address("0xgg2d35Cc6435C9c1c72c5E7b18BaB7e1DB7a5d6e").is_err());
    }

    #[test]
    fn test_validate_hex_data() {
        assert!(validate_hex_data("input", "0x").is_ok());
        assert!(validate_hex_data("input", "0xa9059cbb").is_ok());
        assert!(validate_hex_data("input", "a9059cbb").is_err());
        assert!(validate_hex_data("input", "0xzz").is_err());
        assert!(validate_hex_data("input", "0xabc").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert_eq!(validate_quantity("value", "0").unwrap(), U256::ZERO);
        assert_eq!(validate_quantity("value", "0x10").unwrap(), U256::from(16u64));
        assert_eq!(
            validate_quantity("gas_price", "1000000000").unwrap(),
            U256::from(1_000_000_000u64)
        );
        assert!(validate_quantity("value", "").is_err());
        assert!(validate_quantity("value", "1.5").is_err());
        assert!(validate_quantity("value", "0xzz").is_err());
    }

    #[test]
    fn test_account_id() {
        assert_eq!(account_id(Network::Sepolia, "0xabc"), "eth:11155111:0xabc");
    }

    #[test]
    fn test_interpret_sdk_error() {
        let offline = SdkError::from(ApiError::no_response("connection refused"));
        assert!(interpret_sdk_error(&offline).starts_with("Network error"));

        let unauthorized = SdkError::from(ApiError::from_response(401, None));
        assert!(interpret_sdk_error(&unauthorized).starts_with("Authentication error"));

        let local = SdkError::invalid_arguments("bad");
        assert_eq!(interpret_sdk_error(&local), "Invalid input: bad");
    }
}
