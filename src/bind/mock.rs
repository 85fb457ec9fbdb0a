//! In-memory node for tests and offline demos.

use alloy::consensus::{Transaction, TxEnvelope};
use alloy::eips::eip2718::Decodable2718;
use alloy::primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;

use super::backend::{
    CallerBackend, FilterBackend, LogStream, ReceiptBackend, TransactorBackend,
};
use super::error::{BindError, Result};
use super::{BlockSelector, CallMsg, LogQuery, PendingTransaction, RawLog, Receipt};

type CallHandler = Box<dyn Fn(&CallMsg) -> Result<Bytes> + Send + Sync>;

struct LogFeed {
    rx: mpsc::UnboundedReceiver<Result<RawLog>>,
    /// Apply the subscription's query to fed logs, like a node would.
    filtered: bool,
}

/// A transaction accepted by `MockBackend::send_transaction`, decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentTransaction {
    pub hash: B256,
    pub from: Address,
    pub nonce: u64,
    /// `None` for contract creation.
    pub to: Option<Address>,
    pub input: Bytes,
    pub value: U256,
    pub gas_limit: u64,
    pub gas_price: Option<u128>,
    pub chain_id: Option<u64>,
}

struct MockState {
    chain_id: u64,
    gas_price: u128,
    gas_estimate: u64,
    block_number: u64,
    echo_calls: bool,
    auto_mine: bool,
    call_handler: Option<CallHandler>,
    call_responses: HashMap<[u8; 4], Bytes>,
    code: HashMap<Address, Bytes>,
    nonces: HashMap<Address, u64>,
    receipts: HashMap<B256, VecDeque<Result<Option<Receipt>>>>,
    mined: HashMap<B256, Receipt>,
    failures: HashMap<&'static str, VecDeque<BindError>>,
    logs: Vec<RawLog>,
    subscription: Option<LogFeed>,
    calls: Vec<CallMsg>,
    log_queries: Vec<LogQuery>,
    sent: Vec<SentTransaction>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            chain_id: 296,
            gas_price: 1_000_000_000,
            gas_estimate: 100_000,
            block_number: 0,
            echo_calls: false,
            auto_mine: false,
            call_handler: None,
            call_responses: HashMap::new(),
            code: HashMap::new(),
            nonces: HashMap::new(),
            receipts: HashMap::new(),
            mined: HashMap::new(),
            failures: HashMap::new(),
            logs: Vec::new(),
            subscription: None,
            calls: Vec::new(),
            log_queries: Vec::new(),
            sent: Vec::new(),
        }
    }
}

impl MockState {
    fn take_failure(&mut self, method: &'static str) -> Result<()> {
        match self.failures.get_mut(method).and_then(VecDeque::pop_front) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn mine(&mut self, tx: &SentTransaction) -> Receipt {
        self.block_number += 1;
        let contract_address = tx.to.is_none().then(|| tx.from.create(tx.nonce));
        if let Some(address) = contract_address {
            // The creation payload stands in for the runtime code.
            self.code.insert(address, tx.input.clone());
        }

        Receipt {
            transaction_hash: tx.hash,
            status: true,
            block_number: self.block_number,
            block_hash: B256::with_last_byte(self.block_number as u8),
            transaction_index: 0,
            gas_used: self.gas_estimate,
            contract_address,
            logs: Vec::new(),
        }
    }
}

/// Scriptable `ContractBackend` that never touches the network.
///
/// Calls are answered, in order of precedence, by a response registered for
/// the 4-byte selector, by the call handler, by echoing the arguments back
/// (`echo_calls`), or with empty data. Any backend method can be made to fail
/// once with `fail_next`.
#[derive(Default)]
pub struct MockBackend {
    state: Mutex<MockState>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_chain_id(&self, chain_id: u64) {
        self.state().chain_id = chain_id;
    }

    pub fn set_gas_price(&self, gas_price: u128) {
        self.state().gas_price = gas_price;
    }

    pub fn set_gas_estimate(&self, gas: u64) {
        self.state().gas_estimate = gas;
    }

    pub fn set_nonce(&self, account: Address, nonce: u64) {
        self.state().nonces.insert(account, nonce);
    }

    pub fn set_code(&self, address: Address, code: impl Into<Bytes>) {
        self.state().code.insert(address, code.into());
    }

    /// Answers every call carrying `selector` with `output`.
    pub fn set_call_response(&self, selector: [u8; 4], output: impl Into<Bytes>) {
        self.state().call_responses.insert(selector, output.into());
    }

    pub fn set_call_handler<F>(&self, handler: F)
    where
        F: Fn(&CallMsg) -> Result<Bytes> + Send + Sync + 'static,
    {
        self.state().call_handler = Some(Box::new(handler));
    }

    /// Returns each call's arguments (the data after the selector) as its output.
    pub fn echo_calls(&self) {
        self.state().echo_calls = true;
    }

    /// Produces a successful receipt for every accepted transaction. Contract
    /// creations also install code at the derived address.
    pub fn auto_mine(&self) {
        self.state().auto_mine = true;
    }

    /// Queues the next answer of `transaction_receipt(hash)`. Once the queue
    /// is drained, the last mined receipt (if any) keeps being returned.
    pub fn push_receipt(&self, hash: B256, receipt: Result<Option<Receipt>>) {
        self.state().receipts.entry(hash).or_default().push_back(receipt);
    }

    /// Makes the next invocation of `method` (a backend trait method name)
    /// fail with `err`.
    pub fn fail_next(&self, method: &'static str, err: BindError) {
        self.state().failures.entry(method).or_default().push_back(err);
    }

    pub fn add_log(&self, log: RawLog) {
        self.state().logs.push(log);
    }

    /// Opens the feed for the next `subscribe_logs`. Fed logs that do not
    /// match the subscription's query are dropped. Dropping the returned
    /// sender ends the stream; `is_closed` on it reports unsubscription.
    pub fn log_feed(&self) -> mpsc::UnboundedSender<Result<RawLog>> {
        self.open_feed(true)
    }

    /// Like `log_feed`, but every fed item reaches the subscriber unchanged.
    pub fn raw_log_feed(&self) -> mpsc::UnboundedSender<Result<RawLog>> {
        self.open_feed(false)
    }

    fn open_feed(&self, filtered: bool) -> mpsc::UnboundedSender<Result<RawLog>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.state().subscription = Some(LogFeed { rx, filtered });
        tx
    }

    pub fn calls(&self) -> Vec<CallMsg> {
        self.state().calls.clone()
    }

    pub fn log_queries(&self) -> Vec<LogQuery> {
        self.state().log_queries.clone()
    }

    pub fn sent_transactions(&self) -> Vec<SentTransaction> {
        self.state().sent.clone()
    }
}

impl std::fmt::Debug for MockBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("MockBackend")
            .field("chain_id", &state.chain_id)
            .field("sent", &state.sent.len())
            .field("logs", &state.logs.len())
            .finish()
    }
}

fn decode_sent(tx: &PendingTransaction) -> Result<SentTransaction> {
    let envelope = TxEnvelope::decode_2718(&mut tx.raw.as_ref())
        .map_err(|e| BindError::Transport(format!("rlp: {}", e)))?;
    let from = envelope
        .recover_signer()
        .map_err(|e| BindError::Transport(format!("invalid sender: {}", e)))?;

    Ok(SentTransaction {
        hash: *envelope.tx_hash(),
        from,
        nonce: envelope.nonce(),
        to: envelope.kind().to().copied(),
        input: Bytes::copy_from_slice(envelope.input()),
        value: envelope.value(),
        gas_limit: envelope.gas_limit(),
        gas_price: envelope.gas_price(),
        chain_id: envelope.chain_id(),
    })
}

fn log_matches(query: &LogQuery, log: &RawLog) -> bool {
    if !query.addresses.is_empty() && !query.addresses.contains(&log.address) {
        return false;
    }
    if query.from_block.is_some_and(|from| log.block_number < from) {
        return false;
    }
    if query.to_block.is_some_and(|to| log.block_number > to) {
        return false;
    }
    query.topics.iter().enumerate().all(|(i, wanted)| match wanted {
        None => true,
        Some(alternatives) => log
            .topics
            .get(i)
            .is_some_and(|topic| alternatives.contains(topic)),
    })
}

#[async_trait]
impl CallerBackend for MockBackend {
    async fn call_contract(&self, msg: CallMsg, _block: BlockSelector) -> Result<Bytes> {
        let mut state = self.state();
        state.take_failure("call_contract")?;
        state.calls.push(msg.clone());

        let selector: Option<[u8; 4]> = msg.data.get(..4).and_then(|s| s.try_into().ok());
        if let Some(output) = selector.and_then(|s| state.call_responses.get(&s)) {
            return Ok(output.clone());
        }
        if let Some(handler) = &state.call_handler {
            return handler(&msg);
        }
        if state.echo_calls {
            return Ok(msg.data.get(4..).map(Bytes::copy_from_slice).unwrap_or_default());
        }
        Ok(Bytes::new())
    }

    async fn code_at(&self, address: Address, _block: BlockSelector) -> Result<Bytes> {
        let mut state = self.state();
        state.take_failure("code_at")?;
        Ok(state.code.get(&address).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl TransactorBackend for MockBackend {
    async fn pending_code_at(&self, address: Address) -> Result<Bytes> {
        let mut state = self.state();
        state.take_failure("pending_code_at")?;
        Ok(state.code.get(&address).cloned().unwrap_or_default())
    }

    async fn send_transaction(&self, tx: &PendingTransaction) -> Result<()> {
        let mut state = self.state();
        state.take_failure("send_transaction")?;

        let sent = decode_sent(tx)?;
        let next = state.nonces.entry(sent.from).or_insert(0);
        *next = (*next).max(sent.nonce + 1);

        if state.auto_mine {
            let receipt = state.mine(&sent);
            state.mined.insert(sent.hash, receipt);
        }
        state.sent.push(sent);
        Ok(())
    }

    async fn suggest_gas_price(&self) -> Result<u128> {
        let mut state = self.state();
        state.take_failure("suggest_gas_price")?;
        Ok(state.gas_price)
    }

    async fn estimate_gas(&self, _msg: CallMsg) -> Result<u64> {
        let mut state = self.state();
        state.take_failure("estimate_gas")?;
        Ok(state.gas_estimate)
    }

    async fn pending_nonce_at(&self, account: Address) -> Result<u64> {
        let mut state = self.state();
        state.take_failure("pending_nonce_at")?;
        Ok(state.nonces.get(&account).copied().unwrap_or_default())
    }

    async fn chain_id(&self) -> Result<u64> {
        let mut state = self.state();
        state.take_failure("chain_id")?;
        Ok(state.chain_id)
    }
}

#[async_trait]
impl ReceiptBackend for MockBackend {
    async fn transaction_receipt(&self, hash: B256) -> Result<Option<Receipt>> {
        let mut state = self.state();
        state.take_failure("transaction_receipt")?;

        let queued = state.receipts.get_mut(&hash).and_then(VecDeque::pop_front);
        match queued {
            Some(Ok(Some(receipt))) => {
                state.mined.insert(hash, receipt.clone());
                Ok(Some(receipt))
            }
            Some(other) => other,
            None => Ok(state.mined.get(&hash).cloned()),
        }
    }
}

#[async_trait]
impl FilterBackend for MockBackend {
    async fn filter_logs(&self, query: &LogQuery) -> Result<Vec<RawLog>> {
        let mut state = self.state();
        state.take_failure("filter_logs")?;
        state.log_queries.push(query.clone());

        Ok(state
            .logs
            .iter()
            .filter(|log| log_matches(query, log))
            .cloned()
            .collect())
    }

    async fn subscribe_logs(&self, query: &LogQuery) -> Result<LogStream> {
        let mut state = self.state();
        state.take_failure("subscribe_logs")?;
        state.log_queries.push(query.clone());

        let LogFeed { rx, filtered } = state
            .subscription
            .take()
            .ok_or_else(|| BindError::Transport("subscriptions are not available".to_string()))?;

        let query = query.clone();
        let stream = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        })
        .filter(move |item| {
            let keep = match item {
                Ok(log) => !filtered || log_matches(&query, log),
                Err(_) => true,
            };
            futures::future::ready(keep)
        });

        Ok(stream.boxed())
    }
}
