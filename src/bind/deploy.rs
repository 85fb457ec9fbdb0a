use alloy::dyn_abi::DynSolValue;
use alloy::primitives::Address;
use std::sync::Arc;
use tracing::info;

use super::abi::ContractDescriptor;
use super::backend::ContractBackend;
use super::contract::Contract;
use super::error::Result;
use super::transactor::submit;
use super::{PendingTransaction, TransactOptions};

/// Deploys a new instance of `descriptor` and binds it.
///
/// The returned address is derived from the sender and nonce, so it is known
/// before the transaction is mined. Use `waiter::wait_deployed` before
/// treating the contract as live.
pub async fn deploy_contract<B: ContractBackend + 'static>(
    opts: &TransactOptions,
    descriptor: Arc<ContractDescriptor>,
    backend: Arc<B>,
    args: &[DynSolValue],
) -> Result<(Address, PendingTransaction, Contract)> {
    let input = descriptor.encode_constructor(args)?;
    let pending = submit(backend.as_ref(), opts, None, input).await?;
    let address = opts.from().create(pending.nonce);

    info!(
        "Deploying contract at {} (tx 0x{:x}, nonce {})",
        address, pending.hash, pending.nonce
    );

    let contract = Contract::new(address, descriptor, backend);
    Ok((address, pending, contract))
}
