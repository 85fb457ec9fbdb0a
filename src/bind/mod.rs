pub mod abi;
pub mod backend;
pub mod caller;
pub mod contract;
pub mod convert;
pub mod deploy;
pub mod error;
pub mod filterer;
pub mod iterator;
pub mod mock;
pub mod provider;
pub mod signer;
pub mod subscription;
pub mod transactor;
pub mod waiter;

use std::future::Future;
use std::sync::Arc;

use alloy::dyn_abi::DynSolValue;
use alloy::primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use self::error::{BindError, Result};
use self::signer::TransactionSigner;

/// Block height a read is executed against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockSelector {
    /// The most recent mined block.
    #[default]
    Latest,
    /// The node's pending state.
    Pending,
    /// A specific historical block.
    Number(u64),
}

/// Message passed to `eth_call` and `eth_estimateGas`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallMsg {
    pub from: Option<Address>,
    /// `None` for contract creation.
    pub to: Option<Address>,
    pub data: Bytes,
    pub value: U256,
    pub gas_price: Option<u128>,
    pub gas: Option<u64>,
}

/// Per-call configuration for read-only calls.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Overrides the `from` address of the simulated call.
    pub from: Option<Address>,
    pub block: BlockSelector,
    pub cancel: Option<CancellationToken>,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }

    pub fn at_block(mut self, number: u64) -> Self {
        self.block = BlockSelector::Number(number);
        self
    }

    pub fn pending(mut self) -> Self {
        self.block = BlockSelector::Pending;
        self
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// Per-transaction configuration.
///
/// When several transactions are sent back to back from one account, set
/// `nonce` explicitly: the automatic pending-nonce lookup is not serialized
/// against other submissions.
#[derive(Debug, Clone)]
pub struct TransactOptions {
    pub signer: Arc<dyn TransactionSigner>,
    /// `None` fetches the account's pending nonce from the node.
    pub nonce: Option<u64>,
    /// `None` asks the node for a gas price suggestion.
    pub gas_price: Option<u128>,
    /// `None` estimates the gas limit.
    pub gas_limit: Option<u64>,
    pub value: U256,
    pub cancel: Option<CancellationToken>,
    /// Sign but do not submit.
    pub no_send: bool,
}

impl TransactOptions {
    pub fn new(signer: Arc<dyn TransactionSigner>) -> Self {
        Self {
            signer,
            nonce: None,
            gas_price: None,
            gas_limit: None,
            value: U256::ZERO,
            cancel: None,
            no_send: false,
        }
    }

    /// The sending account.
    pub fn from(&self) -> Address {
        self.signer.address()
    }

    pub fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(nonce);
        self
    }

    pub fn gas_price(mut self, gas_price: u128) -> Self {
        self.gas_price = Some(gas_price);
        self
    }

    pub fn gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }

    pub fn value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn no_send(mut self) -> Self {
        self.no_send = true;
        self
    }
}

/// A signed transaction that has been (or is about to be) submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTransaction {
    pub hash: B256,
    pub nonce: u64,
    /// EIP-2718 encoded signed payload.
    pub raw: Bytes,
}

/// Outcome of a mined transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Receipt {
    pub transaction_hash: B256,
    /// `true` if execution succeeded.
    pub status: bool,
    pub block_number: u64,
    pub block_hash: B256,
    pub transaction_index: u64,
    pub gas_used: u64,
    pub contract_address: Option<Address>,
    pub logs: Vec<RawLog>,
}

impl Receipt {
    pub fn succeeded(&self) -> bool {
        self.status
    }
}

/// A log record as returned by the node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawLog {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    pub block_number: u64,
    pub block_hash: B256,
    pub transaction_hash: B256,
    pub transaction_index: u64,
    pub log_index: u64,
    /// Set when the log was dropped by a chain reorganisation.
    pub removed: bool,
}

/// Log filter sent to `eth_getLogs` / `eth_subscribe("logs")`.
///
/// `topics` is positional: `None` matches anything at that position, and
/// the values inside `Some` are alternatives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogQuery {
    pub addresses: Vec<Address>,
    pub topics: Vec<Option<Vec<B256>>>,
    pub from_block: Option<u64>,
    /// `None` means the latest block.
    pub to_block: Option<u64>,
}

/// Block range and cancellation for historical log retrieval.
#[derive(Debug, Clone, Default)]
pub struct FilterOptions {
    pub from_block: u64,
    /// `None` means up to the latest block.
    pub to_block: Option<u64>,
    pub cancel: Option<CancellationToken>,
}

/// Options for a live log subscription.
#[derive(Debug, Clone, Default)]
pub struct WatchOptions {
    /// Replay from this block before streaming new logs, if the node supports it.
    pub from_block: Option<u64>,
    pub cancel: Option<CancellationToken>,
}

/// One decoded event argument.
#[derive(Debug, Clone, PartialEq)]
pub struct EventField {
    pub name: String,
    pub value: DynSolValue,
    pub indexed: bool,
}

/// An event log decoded against the contract's ABI.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEvent {
    pub name: String,
    /// Arguments in declaration order.
    pub fields: Vec<EventField>,
    pub raw: RawLog,
}

impl LogEvent {
    /// Looks up an argument by name.
    pub fn field(&self, name: &str) -> Option<&DynSolValue> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| &field.value)
    }

    /// Renders the event as JSON for display.
    pub fn to_json(&self) -> Value {
        let mut args = serde_json::Map::new();
        for (i, field) in self.fields.iter().enumerate() {
            let key = if field.name.is_empty() {
                format!("arg{}", i)
            } else {
                field.name.clone()
            };
            args.insert(key, convert::dyn_sol_value_to_json(&field.value));
        }

        serde_json::json!({
            "event": self.name,
            "args": args,
            "address": format!("0x{:x}", self.raw.address),
            "block_number": self.raw.block_number,
            "transaction_hash": format!("0x{:x}", self.raw.transaction_hash),
            "log_index": self.raw.log_index,
        })
    }
}

/// Races `fut` against an optional cancellation token.
pub(crate) async fn cancellable<T, F>(token: Option<&CancellationToken>, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match token {
        Some(token) => tokio::select! {
            biased;
            _ = token.cancelled() => Err(BindError::Cancelled),
            result = fut => result,
        },
        None => fut.await,
    }
}
