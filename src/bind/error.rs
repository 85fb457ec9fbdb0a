//! Error taxonomy for contract bindings.

use alloy::primitives::{Address, Bytes};
use alloy::sol_types::decode_revert_reason;
use thiserror::Error;

/// Result alias used throughout the binding layer.
pub type Result<T> = std::result::Result<T, BindError>;

/// Errors produced by the binding layer.
///
/// Local ABI mismatches (`Encoding`, `Decoding`) indicate a caller or schema
/// bug and are never retried. Node-side failures are classified from the RPC
/// error message; retrying them is left to the caller.
#[derive(Debug, Clone, Error)]
pub enum BindError {
    /// Arguments do not match the method or constructor being encoded.
    #[error("ABI encoding error: {0}")]
    Encoding(String),

    /// Returned data or a log record could not be unpacked.
    #[error("ABI decoding error: {0}")]
    Decoding(String),

    /// Remote execution rejected a call or gas estimation.
    #[error("execution reverted{}", .reason.as_deref().map(|r| format!(": {r}")).unwrap_or_default())]
    CallReverted {
        /// Human readable revert reason, when one could be decoded.
        reason: Option<String>,
        /// Raw revert payload returned by the node.
        data: Bytes,
    },

    /// The delegated signer refused or failed to sign.
    #[error("signing failed: {0}")]
    Signing(String),

    /// The node rejected the transaction nonce (stale, duplicate or gapped).
    #[error("invalid nonce: {0}")]
    InvalidNonce(String),

    /// Network or node failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The operation was cancelled before it completed.
    #[error("operation cancelled")]
    Cancelled,

    /// No contract code exists at the bound address.
    #[error("no contract code at address {0}")]
    NoCode(Address),

    /// A deployment was mined but left no code behind.
    #[error("no contract code after deployment")]
    NoCodeAfterDeploy,
}

impl BindError {
    /// Classifies an error message returned by a node.
    ///
    /// `revert_data` is the `data` member of the JSON-RPC error object, when
    /// the transport exposes it.
    pub fn from_rpc_message(message: &str, revert_data: Option<Bytes>) -> Self {
        let lowered = message.to_lowercase();

        if lowered.contains("execution reverted") || lowered.contains("revert") {
            let data = revert_data.unwrap_or_default();
            let decoded = if data.is_empty() {
                None
            } else {
                decode_revert_reason(&data).filter(|reason| !reason.is_empty())
            };
            let reason = decoded.or_else(|| {
                message
                    .split_once("execution reverted: ")
                    .map(|(_, reason)| reason.trim().to_string())
                    .filter(|reason| !reason.is_empty())
            });
            return Self::CallReverted { reason, data };
        }

        if lowered.contains("nonce too low")
            || lowered.contains("nonce too high")
            || lowered.contains("already known")
            || lowered.contains("replacement transaction underpriced")
            || lowered.contains("nonce has already been used")
        {
            return Self::InvalidNonce(message.to_string());
        }

        Self::Transport(message.to_string())
    }

    /// Returns `true` for failures a caller may reasonably retry with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::InvalidNonce(_))
    }

    /// Returns `true` if the node rejected execution of a call.
    pub fn is_revert(&self) -> bool {
        matches!(self, Self::CallReverted { .. })
    }
}

impl From<alloy::dyn_abi::Error> for BindError {
    fn from(e: alloy::dyn_abi::Error) -> Self {
        Self::Decoding(e.to_string())
    }
}
