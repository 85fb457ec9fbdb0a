use alloy::primitives::Address;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::backend::{CallerBackend, ReceiptBackend};
use super::error::{BindError, Result};
use super::{cancellable, BlockSelector, PendingTransaction, Receipt};

/// Polling behaviour of `wait_mined`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    pub poll_interval: Duration,
    /// Receipt lookups that may fail in a row before giving up. `0` retries forever.
    pub max_consecutive_errors: u32,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            max_consecutive_errors: 5,
        }
    }
}

/// Waits for `tx` to be mined and returns its receipt.
///
/// A receipt with failed status is still a result, not an error; check
/// `Receipt::succeeded`. Returns `BindError::Cancelled` once `cancel` fires.
pub async fn wait_mined<B: ReceiptBackend + ?Sized>(
    backend: &B,
    cancel: &CancellationToken,
    tx: &PendingTransaction,
    config: &WaitConfig,
) -> Result<Receipt> {
    let mut failures = 0u32;

    loop {
        match cancellable(Some(cancel), backend.transaction_receipt(tx.hash)).await {
            Ok(Some(receipt)) => {
                info!(
                    "Transaction 0x{:x} mined in block {} (status: {}, gas used: {})",
                    tx.hash,
                    receipt.block_number,
                    if receipt.succeeded() { "success" } else { "failed" },
                    receipt.gas_used
                );
                return Ok(receipt);
            }
            Ok(None) => {
                failures = 0;
                debug!("Transaction 0x{:x} not yet mined", tx.hash);
            }
            Err(BindError::Cancelled) => return Err(BindError::Cancelled),
            Err(e) => {
                failures = failures.saturating_add(1);
                if config.max_consecutive_errors > 0 && failures > config.max_consecutive_errors {
                    return Err(e);
                }
                warn!("Receipt retrieval for 0x{:x} failed: {}", tx.hash, e);
            }
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(BindError::Cancelled),
            _ = tokio::time::sleep(config.poll_interval) => {}
        }
    }
}

/// Waits for a contract creation to be mined and checks that code exists at
/// the created address.
pub async fn wait_deployed<B: ReceiptBackend + CallerBackend + ?Sized>(
    backend: &B,
    cancel: &CancellationToken,
    tx: &PendingTransaction,
    config: &WaitConfig,
) -> Result<Address> {
    let receipt = wait_mined(backend, cancel, tx, config).await?;
    let address = receipt.contract_address.ok_or(BindError::NoCodeAfterDeploy)?;

    let code = cancellable(Some(cancel), backend.code_at(address, BlockSelector::Latest)).await?;
    if code.is_empty() {
        return Err(BindError::NoCodeAfterDeploy);
    }

    info!("Contract deployed at {}", address);
    Ok(address)
}
