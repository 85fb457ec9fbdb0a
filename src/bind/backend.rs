use alloy::primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use futures::stream::BoxStream;

use super::error::Result;
use super::{BlockSelector, CallMsg, LogQuery, PendingTransaction, RawLog, Receipt};

/// Stream of logs pushed by a live subscription.
///
/// An `Err` item is terminal. Dropping the stream releases the remote
/// subscription.
pub type LogStream = BoxStream<'static, Result<RawLog>>;

/// Read-only contract access.
#[async_trait]
pub trait CallerBackend: Send + Sync {
    /// Executes a read-only call and returns the raw return data.
    async fn call_contract(&self, msg: CallMsg, block: BlockSelector) -> Result<Bytes>;

    /// Returns the runtime code stored at `address`, empty if none.
    async fn code_at(&self, address: Address, block: BlockSelector) -> Result<Bytes>;
}

/// What is needed to build, sign and submit a transaction.
#[async_trait]
pub trait TransactorBackend: Send + Sync {
    /// Code at `address` in the pending state.
    async fn pending_code_at(&self, address: Address) -> Result<Bytes>;

    /// Submits a signed transaction.
    async fn send_transaction(&self, tx: &PendingTransaction) -> Result<()>;

    async fn suggest_gas_price(&self) -> Result<u128>;

    async fn estimate_gas(&self, msg: CallMsg) -> Result<u64>;

    /// Next nonce for `account`, counting transactions still in the pool.
    async fn pending_nonce_at(&self, account: Address) -> Result<u64>;

    async fn chain_id(&self) -> Result<u64>;
}

/// Historical log queries and live log subscriptions.
#[async_trait]
pub trait FilterBackend: Send + Sync {
    async fn filter_logs(&self, query: &LogQuery) -> Result<Vec<RawLog>>;

    async fn subscribe_logs(&self, query: &LogQuery) -> Result<LogStream>;
}

/// Receipt lookups for `waiter`.
#[async_trait]
pub trait ReceiptBackend: Send + Sync {
    /// `Ok(None)` while the transaction has not been mined.
    async fn transaction_receipt(&self, hash: B256) -> Result<Option<Receipt>>;
}

/// Everything the binding layer needs from a node.
///
/// Implemented over a JSON-RPC provider by `ProviderBackend` and in memory by
/// `MockBackend`. All methods take `&self` so one backend can be shared
/// across tasks. Components that need only one capability take the narrower
/// trait, so a read-only consumer can be built over a `CallerBackend` alone.
pub trait ContractBackend: CallerBackend + TransactorBackend + FilterBackend + ReceiptBackend {}

impl<T> ContractBackend for T where
    T: CallerBackend + TransactorBackend + FilterBackend + ReceiptBackend + ?Sized
{
}
