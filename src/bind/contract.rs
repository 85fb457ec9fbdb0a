use alloy::primitives::Address;
use std::sync::Arc;

use super::abi::ContractDescriptor;
use super::backend::{CallerBackend, ContractBackend, FilterBackend, TransactorBackend};
use super::caller::ContractCaller;
use super::filterer::ContractFilterer;
use super::transactor::ContractTransactor;

/// A deployed contract: its address, its ABI and the backends serving each
/// capability.
///
/// Holds no mutable state; clones share the descriptor and the backends.
#[derive(Clone)]
pub struct BoundContract {
    address: Address,
    descriptor: Arc<ContractDescriptor>,
    caller: Arc<dyn CallerBackend>,
    transactor: Arc<dyn TransactorBackend>,
    filterer: Arc<dyn FilterBackend>,
}

impl BoundContract {
    pub fn new(
        address: Address,
        descriptor: Arc<ContractDescriptor>,
        caller: Arc<dyn CallerBackend>,
        transactor: Arc<dyn TransactorBackend>,
        filterer: Arc<dyn FilterBackend>,
    ) -> Self {
        Self {
            address,
            descriptor,
            caller,
            transactor,
            filterer,
        }
    }

    /// Serves every capability from one backend.
    pub fn with_backend<B: ContractBackend + 'static>(
        address: Address,
        descriptor: Arc<ContractDescriptor>,
        backend: Arc<B>,
    ) -> Self {
        Self::new(address, descriptor, backend.clone(), backend.clone(), backend)
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn descriptor(&self) -> &Arc<ContractDescriptor> {
        &self.descriptor
    }

    pub fn caller(&self) -> ContractCaller {
        ContractCaller::new(self.address, self.descriptor.clone(), self.caller.clone())
    }

    pub fn transactor(&self) -> ContractTransactor {
        ContractTransactor::new(self.address, self.descriptor.clone(), self.transactor.clone())
    }

    pub fn filterer(&self) -> ContractFilterer {
        ContractFilterer::new(self.address, self.descriptor.clone(), self.filterer.clone())
    }
}

impl std::fmt::Debug for BoundContract {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundContract")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Read, write and event access to one contract.
///
/// Each capability is a separate view so that, for example, a component that
/// must not send transactions can be handed only a `ContractCaller`.
#[derive(Debug, Clone)]
pub struct Contract {
    bound: BoundContract,
}

impl Contract {
    pub fn new<B: ContractBackend + 'static>(
        address: Address,
        descriptor: Arc<ContractDescriptor>,
        backend: Arc<B>,
    ) -> Self {
        Self {
            bound: BoundContract::with_backend(address, descriptor, backend),
        }
    }

    pub fn address(&self) -> Address {
        self.bound.address()
    }

    pub fn bound(&self) -> &BoundContract {
        &self.bound
    }

    pub fn caller(&self) -> ContractCaller {
        self.bound.caller()
    }

    pub fn transactor(&self) -> ContractTransactor {
        self.bound.transactor()
    }

    pub fn filterer(&self) -> ContractFilterer {
        self.bound.filterer()
    }
}

impl From<BoundContract> for Contract {
    fn from(bound: BoundContract) -> Self {
        Self { bound }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bind::mock::MockBackend;
    use crate::bind::CallOptions;
    use alloy::dyn_abi::DynSolValue;
    use alloy::primitives::U256;

    const ABI: &str = r#"[
        {"type":"function","name":"total","stateMutability":"view",
         "inputs":[],"outputs":[{"name":"","type":"uint256"}]}
    ]"#;

    #[tokio::test]
    async fn test_capabilities_use_their_own_backend() {
        let reads = Arc::new(MockBackend::new());
        let writes = Arc::new(MockBackend::new());
        let address = Address::repeat_byte(0x0c);
        let descriptor = Arc::new(ContractDescriptor::from_json(ABI, "").unwrap());
        reads.set_call_response(
            descriptor.function_by_name("total").unwrap().selector().0,
            U256::from(12).to_be_bytes::<32>().to_vec(),
        );

        let bound = BoundContract::new(
            address,
            descriptor,
            reads.clone(),
            writes.clone(),
            writes.clone(),
        );
        let out = bound.caller().call(&CallOptions::new(), "total", &[]).await.unwrap();

        assert_eq!(out, vec![DynSolValue::Uint(U256::from(12), 256)]);
        assert_eq!(reads.calls().len(), 1);
        assert!(writes.calls().is_empty());
    }
}
