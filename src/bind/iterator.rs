use std::collections::VecDeque;
use std::sync::Arc;

use super::abi::ContractDescriptor;
use super::error::BindError;
use super::{LogEvent, RawLog};

/// Lifecycle of a `LogIterator`. `Exhausted` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IteratorState {
    Active,
    Exhausted,
    Failed,
}

/// Cursor over logs retrieved by one `filter_logs` request, decoded lazily
/// as one event type.
///
/// ```ignore
/// let mut it = filterer.filter_logs(&opts, "Transfer", &[]).await?;
/// while it.advance() {
///     println!("{:?}", it.current());
/// }
/// if let Some(err) = it.error() { ... }
/// ```
#[derive(Debug)]
pub struct LogIterator {
    descriptor: Arc<ContractDescriptor>,
    event: String,
    pending: VecDeque<RawLog>,
    current: Option<LogEvent>,
    error: Option<BindError>,
    error_yielded: bool,
    state: IteratorState,
}

impl LogIterator {
    pub(crate) fn new(descriptor: Arc<ContractDescriptor>, event: &str, logs: Vec<RawLog>) -> Self {
        Self {
            descriptor,
            event: event.to_string(),
            pending: logs.into(),
            current: None,
            error: None,
            error_yielded: false,
            state: IteratorState::Active,
        }
    }

    /// Moves to the next log. Returns `false` once the logs are exhausted or
    /// a log failed to decode; check `error()` to tell the two apart.
    pub fn advance(&mut self) -> bool {
        if self.state != IteratorState::Active {
            return false;
        }

        let Some(log) = self.pending.pop_front() else {
            self.state = IteratorState::Exhausted;
            return false;
        };

        match self.descriptor.decode_event(&self.event, &log) {
            Ok(event) => {
                self.current = Some(event);
                true
            }
            Err(e) => {
                self.error = Some(e);
                self.state = IteratorState::Failed;
                false
            }
        }
    }

    /// The event produced by the last successful `advance`.
    pub fn current(&self) -> Option<&LogEvent> {
        self.current.as_ref()
    }

    pub fn error(&self) -> Option<&BindError> {
        self.error.as_ref()
    }

    pub fn state(&self) -> IteratorState {
        self.state
    }

    /// Logs not yet visited.
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    /// Releases the buffered logs. The iterator reports `Exhausted` from now on.
    pub fn close(&mut self) {
        self.pending.clear();
        if self.state == IteratorState::Active {
            self.state = IteratorState::Exhausted;
        }
    }
}

impl Iterator for LogIterator {
    type Item = Result<LogEvent, BindError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.advance() {
            return self.current.clone().map(Ok);
        }
        if self.state == IteratorState::Failed && !self.error_yielded {
            self.error_yielded = true;
            return self.error.clone().map(Err);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::dyn_abi::DynSolValue;
    use alloy::primitives::{B256, U256};

    const ABI: &str = r#"[
        {"type":"event","name":"GreetingSet","anonymous":false,
         "inputs":[{"name":"greeting","type":"string","indexed":false}]}
    ]"#;

    fn descriptor() -> Arc<ContractDescriptor> {
        Arc::new(ContractDescriptor::from_json(ABI, "").unwrap())
    }

    fn greeting_log(d: &ContractDescriptor, text: &str, index: u64) -> RawLog {
        let data = DynSolValue::Tuple(vec![DynSolValue::String(text.into())]).abi_encode_params();
        RawLog {
            topics: vec![d.event("GreetingSet").unwrap().selector()],
            data: data.into(),
            log_index: index,
            ..Default::default()
        }
    }

    #[test]
    fn test_yields_all_logs_then_stays_exhausted() {
        let d = descriptor();
        let logs = (0..3).map(|i| greeting_log(&d, &format!("msg{i}"), i)).collect();
        let mut it = LogIterator::new(d, "GreetingSet", logs);

        assert!(it.current().is_none());
        for i in 0..3 {
            assert!(it.advance());
            let event = it.current().unwrap();
            assert_eq!(event.raw.log_index, i);
            assert_eq!(
                event.field("greeting"),
                Some(&DynSolValue::String(format!("msg{i}")))
            );
        }

        for _ in 0..3 {
            assert!(!it.advance());
            assert_eq!(it.state(), IteratorState::Exhausted);
        }
        assert!(it.error().is_none());
    }

    #[test]
    fn test_empty_is_exhausted_not_failed() {
        let mut it = LogIterator::new(descriptor(), "GreetingSet", Vec::new());
        assert_eq!(it.state(), IteratorState::Active);
        assert!(!it.advance());
        assert_eq!(it.state(), IteratorState::Exhausted);
        assert!(it.error().is_none());
        assert!(it.current().is_none());
    }

    #[test]
    fn test_decode_failure_is_terminal() {
        let d = descriptor();
        let mut bad = greeting_log(&d, "x", 1);
        bad.topics[0] = B256::from(U256::from(1));
        let logs = vec![greeting_log(&d, "ok", 0), bad, greeting_log(&d, "later", 2)];
        let mut it = LogIterator::new(d, "GreetingSet", logs);

        assert!(it.advance());
        assert!(!it.advance());
        assert_eq!(it.state(), IteratorState::Failed);
        assert!(matches!(it.error(), Some(BindError::Decoding(_))));

        // The record after the bad one is never reached.
        assert!(!it.advance());
        assert_eq!(it.state(), IteratorState::Failed);
        assert_eq!(it.remaining(), 1);
    }

    #[test]
    fn test_close_and_std_iterator() {
        let d = descriptor();
        let logs = vec![greeting_log(&d, "a", 0), greeting_log(&d, "b", 1)];
        let mut it = LogIterator::new(d.clone(), "GreetingSet", logs.clone());
        it.close();
        assert!(!it.advance());
        assert_eq!(it.state(), IteratorState::Exhausted);

        let events: Vec<_> = LogIterator::new(d, "GreetingSet", logs)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(events.len(), 2);
    }
}
