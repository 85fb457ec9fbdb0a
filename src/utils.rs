use alloy::primitives::Address;
use anyhow::{anyhow, Result};
use std::str::FromStr;

use crate::bind::error::BindError;

/// Validates and normalizes a contract or account address
pub fn validate_address(address: &str) -> Result<Address> {
    let address = address.trim();

    if address.is_empty() {
        return Err(anyhow!("Address cannot be empty"));
    }

    if !address.starts_with("0x") && !address.starts_with("0X") {
        return Err(anyhow!(
            "Invalid address format: '{}'. Addresses must start with '0x'",
            address
        ));
    }

    if address.len() != 42 {
        return Err(anyhow!(
            "Invalid address length: '{}'. Addresses must be exactly 42 characters (0x + 40 hex characters)",
            address
        ));
    }

    if !address[2..].chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(anyhow!(
            "Invalid address format: '{}'. Contains non-hexadecimal characters",
            address
        ));
    }

    Address::from_str(address).map_err(|e| anyhow!("Invalid address: '{}'. Error: {}", address, e))
}

/// Validates network name
pub fn validate_network(network: &str, available_networks: &[String]) -> Result<()> {
    if network.is_empty() {
        return Err(anyhow!("Network name cannot be empty"));
    }

    if !available_networks.iter().any(|n| n == network) {
        return Err(anyhow!(
            "Unknown network: '{}'. Available networks: {}",
            network,
            available_networks.join(", ")
        ));
    }

    Ok(())
}

/// Creates user-friendly messages for binding errors
pub fn explain_error(error: &BindError) -> String {
    match error {
        BindError::CallReverted { reason: Some(reason), .. } => format!(
            "The contract reverted execution: {}. The function's requirements were not met.",
            reason
        ),
        BindError::CallReverted { reason: None, .. } => {
            "The contract reverted execution without a reason. Check your parameters and try again."
                .to_string()
        }
        BindError::InvalidNonce(message) if message.contains("underpriced") => {
            "Gas price too low to replace a pending transaction. Increase the gas price.".to_string()
        }
        BindError::InvalidNonce(_) => {
            "Nonce rejected. Another transaction from this account was probably mined or is still pending."
                .to_string()
        }
        BindError::Transport(message) if message.contains("insufficient funds") => {
            "Insufficient funds to cover gas costs. Make sure the operator account is funded."
                .to_string()
        }
        BindError::Transport(message)
            if message.contains("connection refused") || message.contains("network unreachable") =>
        {
            "Cannot connect to the RPC endpoint. Check your internet connection and RPC URL configuration."
                .to_string()
        }
        BindError::Transport(message) if message.contains("timeout") => {
            "Request timed out. The RPC endpoint may be overloaded or unreachable.".to_string()
        }
        BindError::Transport(message) if message.contains("rate limit") => {
            "Too many requests to the RPC endpoint. Try again in a few moments.".to_string()
        }
        BindError::NoCode(address) => format!(
            "No contract is deployed at {}. Check the address and the selected network.",
            address
        ),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::Bytes;

    #[test]
    fn test_validate_address() {
        assert!(validate_address("0x742d35Cc6435C9c1c72c5E7b18BaB7e1DB7a5d6e").is_ok());
        assert!(validate_address(" 0x0000000000000000000000000000000000000000 ").is_ok());

        assert!(validate_address("").is_err());
        assert!(validate_address("not_an_address").is_err());
        assert!(validate_address("0x123").is_err());
        assert!(validate_address("742d35Cc6435C9c1c72c5E7b18BaB7e1DB7a5d6e").is_err());
        assert!(validate_address("0xgg2d35Cc6435C9c1c72c5E7b18BaB7e1DB7a5d6e").is_err());
    }

    #[test]
    fn test_validate_network() {
        let networks = vec!["testnet".to_string(), "mainnet".to_string()];

        assert!(validate_network("testnet", &networks).is_ok());
        assert!(validate_network("invalid", &networks).is_err());
        assert!(validate_network("", &networks).is_err());
    }

    #[test]
    fn test_explain_error() {
        let reverted = BindError::CallReverted {
            reason: Some("not owner".into()),
            data: Bytes::new(),
        };
        assert!(explain_error(&reverted).contains("not owner"));

        let funds = BindError::Transport("insufficient funds for gas * price + value".into());
        assert!(explain_error(&funds).starts_with("Insufficient funds"));

        assert_eq!(explain_error(&BindError::Cancelled), "operation cancelled");
    }
}
