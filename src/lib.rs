//! Typed contract bindings over an EVM JSON-RPC node.
//!
//! The `bind` module holds the generic machinery (ABI codec, caller,
//! transactor, filterer, waiter, deployer) behind per-capability backend
//! traits, gathered by `ContractBackend`. `greeter` is a typed binding built
//! on top of it.

pub mod bind;
pub mod config;
pub mod greeter;
pub mod utils;

pub use bind::backend::{
    CallerBackend, ContractBackend, FilterBackend, ReceiptBackend, TransactorBackend,
};
pub use bind::error::{BindError, Result};
pub use bind::provider::ProviderBackend;
pub use bind::signer::{parse_private_key, TransactionSigner};
pub use bind::{CallOptions, FilterOptions, TransactOptions, WatchOptions};
