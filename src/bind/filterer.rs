use alloy::dyn_abi::DynSolValue;
use alloy::primitives::Address;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

use super::abi::ContractDescriptor;
use super::backend::FilterBackend;
use super::error::Result;
use super::iterator::LogIterator;
use super::subscription::Subscription;
use super::{cancellable, FilterOptions, LogEvent, LogQuery, RawLog, WatchOptions};

/// Event view of a contract: historical queries, live subscriptions and
/// one-off log parsing.
#[derive(Clone)]
pub struct ContractFilterer {
    address: Address,
    descriptor: Arc<ContractDescriptor>,
    backend: Arc<dyn FilterBackend>,
}

impl ContractFilterer {
    pub fn new(
        address: Address,
        descriptor: Arc<ContractDescriptor>,
        backend: Arc<dyn FilterBackend>,
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

    fn query(
        &self,
        event: &str,
        filters: &[Option<Vec<DynSolValue>>],
        from_block: Option<u64>,
        to_block: Option<u64>,
    ) -> Result<LogQuery> {
        Ok(LogQuery {
            addresses: vec![self.address],
            topics: self.descriptor.event_topics(event, filters)?,
            from_block,
            to_block,
        })
    }

    /// Retrieves past `event` logs in one request and returns a cursor over them.
    ///
    /// `filters[i]` restricts the i-th indexed argument; see
    /// `ContractDescriptor::event_topics`.
    pub async fn filter_logs(
        &self,
        opts: &FilterOptions,
        event: &str,
        filters: &[Option<Vec<DynSolValue>>],
    ) -> Result<LogIterator> {
        let query = self.query(event, filters, Some(opts.from_block), opts.to_block)?;
        let logs = cancellable(
            opts.cancel.as_ref(),
            self.backend.filter_logs(&query),
        )
        .await?;

        debug!(
            "Found {} {} log(s) on {} from block {}",
            logs.len(),
            event,
            self.address,
            opts.from_block
        );
        Ok(LogIterator::new(self.descriptor.clone(), event, logs))
    }

    /// Subscribes to future `event` logs and forwards them, decoded, to `sink`.
    ///
    /// Delivery blocks on a full sink. The first log that cannot be decoded
    /// ends the subscription with that error.
    pub async fn watch_logs(
        &self,
        opts: &WatchOptions,
        event: &str,
        filters: &[Option<Vec<DynSolValue>>],
        sink: mpsc::Sender<LogEvent>,
    ) -> Result<Subscription> {
        self.watch_logs_with(opts, event, filters, sink, Ok).await
    }

    /// Like `watch_logs`, converting each decoded event with `convert` before
    /// delivery. A conversion error ends the subscription.
    pub async fn watch_logs_with<T, F>(
        &self,
        opts: &WatchOptions,
        event: &str,
        filters: &[Option<Vec<DynSolValue>>],
        sink: mpsc::Sender<T>,
        convert: F,
    ) -> Result<Subscription>
    where
        T: Send + 'static,
        F: Fn(LogEvent) -> Result<T> + Send + 'static,
    {
        let query = self.query(event, filters, opts.from_block, None)?;
        let stream = cancellable(
            opts.cancel.as_ref(),
            self.backend.subscribe_logs(&query),
        )
        .await?;

        debug!("Watching {} logs on {}", event, self.address);

        let descriptor = self.descriptor.clone();
        let event = event.to_string();
        Ok(Subscription::spawn(
            stream,
            move |log: &RawLog| descriptor.decode_event(&event, log).and_then(&convert),
            sink,
            opts.cancel.as_ref(),
        ))
    }

    /// Decodes a single log as `event`.
    pub fn parse_log(&self, event: &str, log: &RawLog) -> Result<LogEvent> {
        self.descriptor.decode_event(event, log)
    }

    /// Decodes a single log as whichever of the contract's events it carries.
    pub fn parse_any_log(&self, log: &RawLog) -> Result<LogEvent> {
        self.descriptor.decode_any_event(log)
    }
}

impl std::fmt::Debug for ContractFilterer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractFilterer")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bind::abi::ContractDescriptor;
    use crate::bind::contract::Contract;
    use crate::bind::error::BindError;
    use crate::bind::iterator::IteratorState;
    use crate::bind::mock::MockBackend;
    use alloy::primitives::{address, B256, U256};
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    const ABI: &str = r#"[
        {"type":"event","name":"Transfer","anonymous":false,
         "inputs":[{"name":"from","type":"address","indexed":true},
                   {"name":"to","type":"address","indexed":true},
                   {"name":"value","type":"uint256","indexed":false}]},
        {"type":"event","name":"Approval","anonymous":false,
         "inputs":[{"name":"owner","type":"address","indexed":true},
                   {"name":"value","type":"uint256","indexed":false}]}
    ]"#;

    const TOKEN: Address = address!("7070707070707070707070707070707070707070");

    fn setup() -> (Arc<MockBackend>, Contract) {
        let mock = Arc::new(MockBackend::new());
        let descriptor = Arc::new(ContractDescriptor::from_json(ABI, "").unwrap());
        (mock.clone(), Contract::new(TOKEN, descriptor, mock))
    }

    fn transfer(contract: &Contract, from: Address, value: u64, block: u64) -> RawLog {
        let selector = contract.bound().descriptor().event("Transfer").unwrap().selector();
        RawLog {
            address: TOKEN,
            topics: vec![selector, from.into_word(), Address::ZERO.into_word()],
            data: U256::from(value).to_be_bytes::<32>().to_vec().into(),
            block_number: block,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_filter_logs_by_indexed_argument() {
        let (mock, contract) = setup();
        let alice = Address::repeat_byte(0xa1);
        let bob = Address::repeat_byte(0xb0);
        mock.add_log(transfer(&contract, alice, 1, 1));
        mock.add_log(transfer(&contract, bob, 2, 2));
        mock.add_log(transfer(&contract, alice, 3, 3));

        let filterer = contract.filterer();
        let mut it = filterer
            .filter_logs(
                &FilterOptions::default(),
                "Transfer",
                &[Some(vec![DynSolValue::Address(alice)])],
            )
            .await
            .unwrap();

        let mut values = Vec::new();
        while it.advance() {
            values.push(it.current().unwrap().field("value").cloned().unwrap());
        }
        assert_eq!(
            values,
            vec![
                DynSolValue::Uint(U256::from(1), 256),
                DynSolValue::Uint(U256::from(3), 256)
            ]
        );
        assert_eq!(it.state(), IteratorState::Exhausted);

        let query = &mock.log_queries()[0];
        assert_eq!(query.addresses, vec![TOKEN]);
        assert_eq!(query.topics.len(), 2);
        assert_eq!(query.from_block, Some(0));
    }

    #[tokio::test]
    async fn test_filter_logs_errors() {
        let (mock, contract) = setup();
        let filterer = contract.filterer();

        assert!(filterer
            .filter_logs(&FilterOptions::default(), "Missing", &[])
            .await
            .is_err());

        let token = CancellationToken::new();
        token.cancel();
        let opts = FilterOptions {
            cancel: Some(token),
            ..Default::default()
        };
        assert!(matches!(
            filterer.filter_logs(&opts, "Transfer", &[]).await,
            Err(BindError::Cancelled)
        ));
        assert!(mock.log_queries().is_empty());
    }

    #[tokio::test]
    async fn test_watch_logs_delivers_and_unsubscribes() {
        let (mock, contract) = setup();
        let feed = mock.log_feed();
        let (tx, mut rx) = mpsc::channel(4);

        let sub = contract
            .filterer()
            .watch_logs(&WatchOptions::default(), "Transfer", &[], tx)
            .await
            .unwrap();

        feed.send(Ok(transfer(&contract, Address::ZERO, 9, 5))).unwrap();
        let event = rx.recv().await.unwrap();
        assert_eq!(event.name, "Transfer");
        assert_eq!(event.raw.block_number, 5);

        sub.unsubscribe();
        assert!(sub.wait().await.is_ok());
        assert!(feed.is_closed());
    }

    #[test]
    fn test_parse_any_log() {
        let (_, contract) = setup();
        let filterer = contract.filterer();
        let log = transfer(&contract, Address::ZERO, 1, 1);

        assert_eq!(filterer.parse_any_log(&log).unwrap().name, "Transfer");
        assert!(filterer.parse_log("Approval", &log).is_err());

        let unknown = RawLog {
            topics: vec![B256::repeat_byte(0xee)],
            ..Default::default()
        };
        assert!(matches!(
            filterer.parse_any_log(&unknown),
            Err(BindError::Decoding(_))
        ));
    }
}
