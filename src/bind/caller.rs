use alloy::dyn_abi::DynSolValue;
use alloy::primitives::Address;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use super::abi::ContractDescriptor;
use super::backend::CallerBackend;
use super::convert::{dyn_sol_values_to_json, values_from_json};
use super::error::{BindError, Result};
use super::{cancellable, CallMsg, CallOptions};

/// Read-only view of a contract.
#[derive(Clone)]
pub struct ContractCaller {
    address: Address,
    descriptor: Arc<ContractDescriptor>,
    backend: Arc<dyn CallerBackend>,
}

impl ContractCaller {
    pub fn new(
        address: Address,
        descriptor: Arc<ContractDescriptor>,
        backend: Arc<dyn CallerBackend>,
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

    /// Invokes a constant method and unpacks its return values.
    ///
    /// Nothing is submitted to the chain. If the node returns no data for a
    /// method that declares outputs, the address is checked for code and
    /// `BindError::NoCode` is returned when there is none.
    pub async fn call(
        &self,
        opts: &CallOptions,
        method: &str,
        args: &[DynSolValue],
    ) -> Result<Vec<DynSolValue>> {
        let descriptor = &self.descriptor;
        let function = descriptor.function(method, args)?;
        let data = descriptor.encode_call(method, args)?;
        let address = self.address;
        let backend = self.backend.as_ref();

        debug!("Calling {} on {} at {:?}", function.signature(), address, opts.block);

        let msg = CallMsg {
            from: opts.from,
            to: Some(address),
            data,
            ..Default::default()
        };

        let output = cancellable(opts.cancel.as_ref(), backend.call_contract(msg, opts.block)).await?;

        if output.is_empty() && !function.outputs.is_empty() {
            let code = cancellable(opts.cancel.as_ref(), backend.code_at(address, opts.block)).await?;
            if code.is_empty() {
                return Err(BindError::NoCode(address));
            }
        }

        descriptor.decode_output(&function.signature(), &output)
    }

    /// Like `call`, taking the arguments as a JSON array or object and
    /// returning the results as JSON. Overloaded methods need a full signature.
    pub async fn call_json(&self, opts: &CallOptions, method: &str, args: &Value) -> Result<Value> {
        let function = self.descriptor.function_by_name(method)?;
        let signature = function.signature();
        let args = values_from_json(&function.inputs, args)?;
        let output = self.call(opts, &signature, &args).await?;
        Ok(dyn_sol_values_to_json(&output))
    }
}

impl std::fmt::Debug for ContractCaller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractCaller")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}
