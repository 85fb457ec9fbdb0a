use alloy::eips::eip2718::Encodable2718;
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::Address;
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use std::fmt::Debug;
use std::str::FromStr;

use super::error::{BindError, Result};
use super::PendingTransaction;

/// Signs fully populated transactions on behalf of one account.
///
/// The binding layer never holds key material itself; it hands a complete
/// request (nonce, gas, chain id) to the signer and submits what comes back.
#[async_trait]
pub trait TransactionSigner: Debug + Send + Sync {
    fn address(&self) -> Address;

    async fn sign_transaction(&self, tx: TransactionRequest) -> Result<PendingTransaction>;
}

#[async_trait]
impl TransactionSigner for PrivateKeySigner {
    fn address(&self) -> Address {
        alloy::signers::Signer::address(self)
    }

    async fn sign_transaction(&self, tx: TransactionRequest) -> Result<PendingTransaction> {
        let nonce = tx
            .nonce
            .ok_or_else(|| BindError::Signing("transaction has no nonce".to_string()))?;

        let wallet = EthereumWallet::from(self.clone());
        let envelope = tx
            .build(&wallet)
            .await
            .map_err(|e| BindError::Signing(e.to_string()))?;

        Ok(PendingTransaction {
            hash: *envelope.tx_hash(),
            nonce,
            raw: envelope.encoded_2718().into(),
        })
    }
}

/// Parses a hex encoded secp256k1 private key, with or without `0x`.
pub fn parse_private_key(key: &str) -> Result<PrivateKeySigner> {
    let key = key.trim();
    let key = key.strip_prefix("0x").unwrap_or(key);
    PrivateKeySigner::from_str(key).map_err(|e| BindError::Signing(format!("invalid private key: {}", e)))
}
