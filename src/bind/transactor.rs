use alloy::dyn_abi::DynSolValue;
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxKind};
use alloy::rpc::types::TransactionRequest;
use std::sync::Arc;
use tracing::{debug, info};

use super::abi::ContractDescriptor;
use super::backend::TransactorBackend;
use super::error::{BindError, Result};
use super::{cancellable, CallMsg, PendingTransaction, TransactOptions};

/// State-changing view of a contract.
#[derive(Clone)]
pub struct ContractTransactor {
    address: Address,
    descriptor: Arc<ContractDescriptor>,
    backend: Arc<dyn TransactorBackend>,
}

impl ContractTransactor {
    pub fn new(
        address: Address,
        descriptor: Arc<ContractDescriptor>,
        backend: Arc<dyn TransactorBackend>,
    ) -> Self {
        Self {
            address,
            descriptor,
            backend,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Invokes a (paid) method as a transaction.
    ///
    /// Returns as soon as the node accepted the transaction; use
    /// `waiter::wait_mined` for confirmation.
    pub async fn transact(
        &self,
        opts: &TransactOptions,
        method: &str,
        args: &[DynSolValue],
    ) -> Result<PendingTransaction> {
        let data = self.descriptor.encode_call(method, args)?;
        debug!("Transacting {} on {}", method, self.address);
        self.raw_transact(opts, data).await
    }

    /// Sends already encoded call data to the contract.
    pub async fn raw_transact(
        &self,
        opts: &TransactOptions,
        calldata: Bytes,
    ) -> Result<PendingTransaction> {
        submit(self.backend.as_ref(), opts, Some(self.address), calldata).await
    }

    /// Sends `opts.value` to the contract with empty call data, which
    /// triggers its receive or fallback function.
    pub async fn transfer(&self, opts: &TransactOptions) -> Result<PendingTransaction> {
        self.raw_transact(opts, Bytes::new()).await
    }
}

/// Fills in nonce, gas price, gas limit and chain id, signs and (unless
/// `no_send`) submits. `to == None` creates a contract.
impl std::fmt::Debug for ContractTransactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractTransactor")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

pub(crate) async fn submit(
    backend: &dyn TransactorBackend,
    opts: &TransactOptions,
    to: Option<Address>,
    input: Bytes,
) -> Result<PendingTransaction> {
    let cancel = opts.cancel.as_ref();
    let from = opts.from();

    let nonce = match opts.nonce {
        Some(nonce) => nonce,
        None => cancellable(cancel, backend.pending_nonce_at(from)).await?,
    };

    let gas_price = match opts.gas_price {
        Some(gas_price) => gas_price,
        None => cancellable(cancel, backend.suggest_gas_price()).await?,
    };

    let gas_limit = match opts.gas_limit {
        Some(gas_limit) => gas_limit,
        None => {
            if let Some(address) = to {
                let code = cancellable(cancel, backend.pending_code_at(address)).await?;
                if code.is_empty() && !input.is_empty() {
                    return Err(BindError::NoCode(address));
                }
            }
            let msg = CallMsg {
                from: Some(from),
                to,
                data: input.clone(),
                value: opts.value,
                gas_price: Some(gas_price),
                gas: None,
            };
            let estimate = cancellable(cancel, backend.estimate_gas(msg)).await?;
            debug!("Estimated gas limit {}", estimate);
            estimate
        }
    };

    let chain_id = cancellable(cancel, backend.chain_id()).await?;

    let mut request = TransactionRequest::default()
        .with_from(from)
        .with_nonce(nonce)
        .with_gas_price(gas_price)
        .with_gas_limit(gas_limit)
        .with_value(opts.value)
        .with_input(input)
        .with_chain_id(chain_id);
    request.to = Some(to.map_or(TxKind::Create, TxKind::Call));

    let signed = opts.signer.sign_transaction(request).await?;

    if opts.no_send {
        debug!("Signed transaction 0x{:x} without sending", signed.hash);
        return Ok(signed);
    }

    cancellable(cancel, backend.send_transaction(&signed)).await?;
    info!(
        "Sent transaction 0x{:x} from {} (nonce {}, gas {} @ {})",
        signed.hash, from, nonce, gas_limit, gas_price
    );

    Ok(signed)
}
