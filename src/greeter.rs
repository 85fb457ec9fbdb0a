//! Typed binding for the `Store` greeter contract.
//!
//! ```solidity
//! contract Store {
//!     event GreetingSet(string greeting);
//!     constructor(string memory _greeting);
//!     function greet() public view returns (string memory);
//!     function setGreeting(string memory _greeting) public;
//! }
//! ```

use alloy::dyn_abi::DynSolValue;
use alloy::primitives::Address;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::bind::abi::ContractDescriptor;
use crate::bind::backend::{CallerBackend, ContractBackend, FilterBackend, TransactorBackend};
use crate::bind::caller::ContractCaller;
use crate::bind::contract::Contract;
use crate::bind::deploy::deploy_contract;
use crate::bind::error::{BindError, Result};
use crate::bind::filterer::ContractFilterer;
use crate::bind::iterator::{IteratorState, LogIterator};
use crate::bind::subscription::Subscription;
use crate::bind::transactor::ContractTransactor;
use crate::bind::{
    CallOptions, FilterOptions, LogEvent, PendingTransaction, RawLog, TransactOptions,
    WatchOptions,
};

pub const STORE_ABI: &str = include_str!("../contracts/Store.abi.json");
pub const STORE_BIN: &str = include_str!("../contracts/Store.bin");

const GREETING_SET: &str = "GreetingSet";

/// Parses the embedded ABI and bytecode.
pub fn store_descriptor() -> Result<Arc<ContractDescriptor>> {
    ContractDescriptor::from_json(STORE_ABI, STORE_BIN).map(Arc::new)
}

/// A `GreetingSet` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GreetingSet {
    pub greeting: String,
    pub raw: RawLog,
}

impl TryFrom<LogEvent> for GreetingSet {
    type Error = BindError;

    fn try_from(event: LogEvent) -> Result<Self> {
        match event.field("greeting") {
            Some(DynSolValue::String(greeting)) => Ok(Self {
                greeting: greeting.clone(),
                raw: event.raw,
            }),
            other => Err(BindError::Decoding(format!(
                "GreetingSet.greeting is not a string: {:?}",
                other
            ))),
        }
    }
}

/// Read-only binding.
#[derive(Debug, Clone)]
pub struct GreeterCaller {
    contract: ContractCaller,
}

impl GreeterCaller {
    /// Binds read access to a deployed instance.
    pub fn new(address: Address, backend: Arc<dyn CallerBackend>) -> Result<Self> {
        Ok(Self {
            contract: ContractCaller::new(address, store_descriptor()?, backend),
        })
    }

    pub fn session(&self, call_opts: CallOptions) -> GreeterCallerSession {
        GreeterCallerSession {
            contract: self.clone(),
            call_opts,
        }
    }

    pub async fn greet(&self, opts: &CallOptions) -> Result<String> {
        let out = self.contract.call(opts, "greet", &[]).await?;
        match out.into_iter().next() {
            Some(DynSolValue::String(greeting)) => Ok(greeting),
            other => Err(BindError::Decoding(format!(
                "greet() returned {:?}",
                other
            ))),
        }
    }
}

/// Write-only binding.
#[derive(Debug, Clone)]
pub struct GreeterTransactor {
    contract: ContractTransactor,
}

impl GreeterTransactor {
    /// Binds write access to a deployed instance.
    pub fn new(address: Address, backend: Arc<dyn TransactorBackend>) -> Result<Self> {
        Ok(Self {
            contract: ContractTransactor::new(address, store_descriptor()?, backend),
        })
    }

    pub fn session(&self, transact_opts: TransactOptions) -> GreeterTransactorSession {
        GreeterTransactorSession {
            contract: self.clone(),
            transact_opts,
        }
    }

    pub async fn set_greeting(
        &self,
        opts: &TransactOptions,
        greeting: &str,
    ) -> Result<PendingTransaction> {
        self.contract
            .transact(opts, "setGreeting", &[DynSolValue::String(greeting.to_string())])
            .await
    }
}

/// Event binding.
#[derive(Debug, Clone)]
pub struct GreeterFilterer {
    contract: ContractFilterer,
}

impl GreeterFilterer {
    /// Binds event access to a deployed instance.
    pub fn new(address: Address, backend: Arc<dyn FilterBackend>) -> Result<Self> {
        Ok(Self {
            contract: ContractFilterer::new(address, store_descriptor()?, backend),
        })
    }

    pub async fn filter_greeting_set(&self, opts: &FilterOptions) -> Result<GreetingSetIterator> {
        let inner = self.contract.filter_logs(opts, GREETING_SET, &[]).await?;
        Ok(GreetingSetIterator {
            inner,
            current: None,
            error: None,
        })
    }

    pub async fn watch_greeting_set(
        &self,
        opts: &WatchOptions,
        sink: mpsc::Sender<GreetingSet>,
    ) -> Result<Subscription> {
        self.contract
            .watch_logs_with(opts, GREETING_SET, &[], sink, GreetingSet::try_from)
            .await
    }

    pub fn parse_greeting_set(&self, log: &RawLog) -> Result<GreetingSet> {
        self.contract.parse_log(GREETING_SET, log)?.try_into()
    }
}

/// Cursor over `GreetingSet` events.
#[derive(Debug)]
pub struct GreetingSetIterator {
    inner: LogIterator,
    current: Option<GreetingSet>,
    error: Option<BindError>,
}

impl GreetingSetIterator {
    pub fn advance(&mut self) -> bool {
        if self.error.is_some() || !self.inner.advance() {
            return false;
        }
        let Some(event) = self.inner.current().cloned() else {
            return false;
        };
        match GreetingSet::try_from(event) {
            Ok(event) => {
                self.current = Some(event);
                true
            }
            Err(e) => {
                self.error = Some(e);
                self.inner.close();
                false
            }
        }
    }

    pub fn current(&self) -> Option<&GreetingSet> {
        self.current.as_ref()
    }

    pub fn error(&self) -> Option<&BindError> {
        self.error.as_ref().or(self.inner.error())
    }

    pub fn state(&self) -> IteratorState {
        if self.error.is_some() {
            IteratorState::Failed
        } else {
            self.inner.state()
        }
    }
}

/// A deployed `Store` contract.
#[derive(Debug, Clone)]
pub struct Greeter {
    contract: Contract,
    caller: GreeterCaller,
    transactor: GreeterTransactor,
    filterer: GreeterFilterer,
}

impl Greeter {
    /// Binds an already deployed instance.
    pub fn new<B: ContractBackend + 'static>(address: Address, backend: Arc<B>) -> Result<Self> {
        Ok(Self::from_contract(Contract::new(
            address,
            store_descriptor()?,
            backend,
        )))
    }

    fn from_contract(contract: Contract) -> Self {
        Self {
            caller: GreeterCaller {
                contract: contract.caller(),
            },
            transactor: GreeterTransactor {
                contract: contract.transactor(),
            },
            filterer: GreeterFilterer {
                contract: contract.filterer(),
            },
            contract,
        }
    }

    pub fn address(&self) -> Address {
        self.contract.address()
    }

    pub fn caller(&self) -> &GreeterCaller {
        &self.caller
    }

    pub fn transactor(&self) -> &GreeterTransactor {
        &self.transactor
    }

    pub fn filterer(&self) -> &GreeterFilterer {
        &self.filterer
    }

    /// Pins the options used by every call and transaction of the session.
    pub fn session(
        &self,
        call_opts: CallOptions,
        transact_opts: TransactOptions,
    ) -> GreeterSession {
        GreeterSession {
            contract: self.clone(),
            call_opts,
            transact_opts,
        }
    }

    pub async fn greet(&self, opts: &CallOptions) -> Result<String> {
        self.caller.greet(opts).await
    }

    pub async fn set_greeting(
        &self,
        opts: &TransactOptions,
        greeting: &str,
    ) -> Result<PendingTransaction> {
        self.transactor.set_greeting(opts, greeting).await
    }
}

/// A `Greeter` with preset call and transaction options.
#[derive(Debug, Clone)]
pub struct GreeterSession {
    contract: Greeter,
    call_opts: CallOptions,
    transact_opts: TransactOptions,
}

impl GreeterSession {
    pub fn contract(&self) -> &Greeter {
        &self.contract
    }

    pub async fn greet(&self) -> Result<String> {
        self.contract.greet(&self.call_opts).await
    }

    pub async fn set_greeting(&self, greeting: &str) -> Result<PendingTransaction> {
        self.contract.set_greeting(&self.transact_opts, greeting).await
    }
}

#[derive(Debug, Clone)]
pub struct GreeterCallerSession {
    contract: GreeterCaller,
    call_opts: CallOptions,
}

impl GreeterCallerSession {
    pub async fn greet(&self) -> Result<String> {
        self.contract.greet(&self.call_opts).await
    }
}

#[derive(Debug, Clone)]
pub struct GreeterTransactorSession {
    contract: GreeterTransactor,
    transact_opts: TransactOptions,
}

impl GreeterTransactorSession {
    pub async fn set_greeting(&self, greeting: &str) -> Result<PendingTransaction> {
        self.contract.set_greeting(&self.transact_opts, greeting).await
    }
}

/// Deploys a new `Store` with `greeting` as its initial greeting.
pub async fn deploy_greeter<B: ContractBackend + 'static>(
    opts: &TransactOptions,
    backend: Arc<B>,
    greeting: &str,
) -> Result<(Address, PendingTransaction, Greeter)> {
    let (address, pending, contract) = deploy_contract(
        opts,
        store_descriptor()?,
        backend,
        &[DynSolValue::String(greeting.to_string())],
    )
    .await?;
    Ok((address, pending, Greeter::from_contract(contract)))
}
