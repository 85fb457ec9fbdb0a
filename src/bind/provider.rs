use alloy::eips::BlockId;
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxKind, B256, U256};
use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use alloy::rpc::types::{Filter, Log, TransactionReceipt, TransactionRequest};
use alloy::transports::{BoxTransport, RpcError, TransportErrorKind};
use async_trait::async_trait;
use futures::StreamExt;
use tracing::debug;

use super::backend::{
    CallerBackend, FilterBackend, LogStream, ReceiptBackend, TransactorBackend,
};
use super::error::{BindError, Result};
use super::{BlockSelector, CallMsg, LogQuery, PendingTransaction, RawLog, Receipt};

/// `ContractBackend` over an alloy JSON-RPC provider.
///
/// HTTP endpoints support everything but `subscribe_logs`; use a `ws://` or
/// `wss://` URL for live event streams.
#[derive(Debug, Clone)]
pub struct ProviderBackend {
    provider: RootProvider<BoxTransport>,
}

impl ProviderBackend {
    pub fn new(provider: RootProvider<BoxTransport>) -> Self {
        Self { provider }
    }

    /// Connects to `url`, picking the transport from its scheme.
    pub async fn connect(url: &str) -> Result<Self> {
        debug!("Connecting to RPC endpoint {}", url);
        let provider = ProviderBuilder::new()
            .on_builtin(url)
            .await
            .map_err(|e| BindError::Transport(format!("cannot connect to '{}': {}", url, e)))?;
        Ok(Self::new(provider))
    }

    /// Checks that the endpoint answers and returns its latest block number.
    pub async fn check_connection(&self) -> Result<u64> {
        self.provider.get_block_number().await.map_err(rpc_error)
    }

    pub async fn balance_at(&self, account: Address) -> Result<U256> {
        self.provider.get_balance(account).await.map_err(rpc_error)
    }
}

fn rpc_error(err: RpcError<TransportErrorKind>) -> BindError {
    let revert_data = err.as_error_resp().and_then(|payload| payload.as_revert_data());
    BindError::from_rpc_message(&err.to_string(), revert_data)
}

fn block_id(block: BlockSelector) -> BlockId {
    match block {
        BlockSelector::Latest => BlockId::latest(),
        BlockSelector::Pending => BlockId::pending(),
        BlockSelector::Number(number) => BlockId::number(number),
    }
}

fn call_request(msg: CallMsg) -> TransactionRequest {
    let mut request = TransactionRequest::default()
        .with_input(msg.data)
        .with_value(msg.value);
    request.to = Some(msg.to.map_or(TxKind::Create, TxKind::Call));
    request.from = msg.from;
    if let Some(gas_price) = msg.gas_price {
        request = request.with_gas_price(gas_price);
    }
    if let Some(gas) = msg.gas {
        request = request.with_gas_limit(gas);
    }
    request
}

fn log_filter(query: &LogQuery) -> Result<Filter> {
    if query.topics.len() > 4 {
        return Err(BindError::Encoding(format!(
            "a log filter has at most 4 topic positions, got {}",
            query.topics.len()
        )));
    }

    let mut filter = Filter::new().address(query.addresses.clone());
    for (i, alternatives) in query.topics.iter().enumerate() {
        if let Some(alternatives) = alternatives {
            filter.topics[i] = alternatives.clone().into();
        }
    }
    if let Some(from) = query.from_block {
        filter = filter.from_block(from);
    }
    if let Some(to) = query.to_block {
        filter = filter.to_block(to);
    }
    Ok(filter)
}

fn raw_log(log: Log) -> RawLog {
    RawLog {
        address: log.inner.address,
        topics: log.inner.data.topics().to_vec(),
        data: log.inner.data.data.clone(),
        block_number: log.block_number.unwrap_or_default(),
        block_hash: log.block_hash.unwrap_or_default(),
        transaction_hash: log.transaction_hash.unwrap_or_default(),
        transaction_index: log.transaction_index.unwrap_or_default(),
        log_index: log.log_index.unwrap_or_default(),
        removed: log.removed,
    }
}

fn receipt(receipt: TransactionReceipt) -> Receipt {
    Receipt {
        transaction_hash: receipt.transaction_hash,
        status: receipt.status(),
        block_number: receipt.block_number.unwrap_or_default(),
        block_hash: receipt.block_hash.unwrap_or_default(),
        transaction_index: receipt.transaction_index.unwrap_or_default(),
        gas_used: receipt.gas_used as u64,
        contract_address: receipt.contract_address,
        logs: receipt.inner.logs().iter().cloned().map(raw_log).collect(),
    }
}

#[async_trait]
impl CallerBackend for ProviderBackend {
    async fn call_contract(&self, msg: CallMsg, block: BlockSelector) -> Result<Bytes> {
        debug!("eth_call to {:?} at {:?}", msg.to, block);
        let request = call_request(msg);
        self.provider
            .call(&request)
            .block(block_id(block))
            .await
            .map_err(rpc_error)
    }

    async fn code_at(&self, address: Address, block: BlockSelector) -> Result<Bytes> {
        self.provider
            .get_code_at(address)
            .block_id(block_id(block))
            .await
            .map_err(rpc_error)
    }
}

#[async_trait]
impl TransactorBackend for ProviderBackend {
    async fn pending_code_at(&self, address: Address) -> Result<Bytes> {
        self.code_at(address, BlockSelector::Pending).await
    }

    async fn send_transaction(&self, tx: &PendingTransaction) -> Result<()> {
        debug!("eth_sendRawTransaction 0x{:x} (nonce {})", tx.hash, tx.nonce);
        self.provider
            .send_raw_transaction(&tx.raw)
            .await
            .map_err(rpc_error)?;
        Ok(())
    }

    async fn suggest_gas_price(&self) -> Result<u128> {
        self.provider.get_gas_price().await.map_err(rpc_error)
    }

    async fn estimate_gas(&self, msg: CallMsg) -> Result<u64> {
        let request = call_request(msg);
        self.provider.estimate_gas(&request).await.map_err(rpc_error)
    }

    async fn pending_nonce_at(&self, account: Address) -> Result<u64> {
        self.provider
            .get_transaction_count(account)
            .pending()
            .await
            .map_err(rpc_error)
    }

    async fn chain_id(&self) -> Result<u64> {
        self.provider.get_chain_id().await.map_err(rpc_error)
    }
}

#[async_trait]
impl ReceiptBackend for ProviderBackend {
    async fn transaction_receipt(&self, hash: B256) -> Result<Option<Receipt>> {
        let found = self
            .provider
            .get_transaction_receipt(hash)
            .await
            .map_err(rpc_error)?;
        Ok(found.map(receipt))
    }
}

#[async_trait]
impl FilterBackend for ProviderBackend {
    async fn filter_logs(&self, query: &LogQuery) -> Result<Vec<RawLog>> {
        let filter = log_filter(query)?;
        let logs = self.provider.get_logs(&filter).await.map_err(rpc_error)?;
        debug!("eth_getLogs returned {} log(s)", logs.len());
        Ok(logs.into_iter().map(raw_log).collect())
    }

    async fn subscribe_logs(&self, query: &LogQuery) -> Result<LogStream> {
        let filter = log_filter(query)?;
        let subscription = self
            .provider
            .subscribe_logs(&filter)
            .await
            .map_err(rpc_error)?;
        debug!("Subscribed to logs for {:?}", query.addresses);
        Ok(subscription.into_stream().map(|log| Ok(raw_log(log))).boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::rpc::types::FilterBlockOption;

    #[test]
    fn test_call_request_kind() {
        let to = Address::repeat_byte(0x11);
        let request = call_request(CallMsg {
            to: Some(to),
            data: Bytes::from_static(&[1, 2]),
            gas: Some(30_000),
            ..Default::default()
        });
        assert_eq!(request.to, Some(TxKind::Call(to)));
        assert_eq!(request.gas, Some(30_000));

        let create = call_request(CallMsg::default());
        assert_eq!(create.to, Some(TxKind::Create));
    }

    #[test]
    fn test_log_filter() {
        let topic = B256::repeat_byte(1);
        let query = LogQuery {
            addresses: vec![Address::repeat_byte(2)],
            topics: vec![Some(vec![topic]), None, Some(vec![B256::ZERO, topic])],
            from_block: Some(10),
            to_block: None,
        };
        let filter = log_filter(&query).unwrap();

        assert!(filter.topics[0].matches(&topic));
        assert!(filter.topics[1].is_empty());
        assert!(filter.topics[2].matches(&B256::ZERO));
        assert!(matches!(filter.block_option, FilterBlockOption::Range { .. }));

        let too_many = LogQuery {
            topics: vec![None; 5],
            ..Default::default()
        };
        assert!(matches!(log_filter(&too_many), Err(BindError::Encoding(_))));
    }

    #[test]
    fn test_raw_log_conversion() {
        let log = Log {
            inner: alloy::primitives::Log::new_unchecked(
                Address::repeat_byte(3),
                vec![B256::repeat_byte(4)],
                Bytes::from_static(&[5]),
            ),
            block_number: Some(8),
            log_index: Some(2),
            ..Default::default()
        };
        let raw = raw_log(log);
        assert_eq!(raw.address, Address::repeat_byte(3));
        assert_eq!(raw.topics, vec![B256::repeat_byte(4)]);
        assert_eq!(raw.block_number, 8);
        assert_eq!(raw.log_index, 2);
        assert!(!raw.removed);
    }
}
