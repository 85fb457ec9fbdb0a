use std::pin::Pin;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, warn};

use super::backend::LogStream;
use super::error::{BindError, Result};
use super::RawLog;

/// Handle to a live event subscription.
///
/// Decoded events are delivered to the sink given to `watch_logs`. The
/// subscription ends when it is unsubscribed or dropped, when the node's
/// stream fails or closes, or when a log cannot be decoded. `wait` reports
/// which.
#[derive(Debug)]
pub struct Subscription {
    cancel: CancellationToken,
    _guard: DropGuard,
    task: JoinHandle<Result<()>>,
}

impl Subscription {
    /// Starts forwarding `stream` to `sink`, decoding each log with `decode`.
    ///
    /// Cancelling `parent` (if given) ends the subscription like `unsubscribe`.
    pub(crate) fn spawn<T, F>(
        stream: LogStream,
        decode: F,
        sink: mpsc::Sender<T>,
        parent: Option<&CancellationToken>,
    ) -> Self
    where
        T: Send + 'static,
        F: Fn(&RawLog) -> Result<T> + Send + 'static,
    {
        let cancel = parent.map_or_else(CancellationToken::new, CancellationToken::child_token);
        let task = tokio::spawn(forward(stream, decode, sink, cancel.clone()));

        Self {
            _guard: cancel.clone().drop_guard(),
            cancel,
            task,
        }
    }

    /// Stops delivery and releases the node subscription. Idempotent.
    pub fn unsubscribe(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the subscription to end. `Ok` after an unsubscribe or once
    /// the sink's receiver was dropped; the terminal error otherwise.
    pub async fn wait(self) -> Result<()> {
        let Self { task, _guard, .. } = self;
        match task.await {
            Ok(result) => result,
            Err(e) => Err(BindError::Transport(format!("subscription task failed: {}", e))),
        }
    }
}

async fn forward<T, F>(
    stream: LogStream,
    decode: F,
    sink: mpsc::Sender<T>,
    cancel: CancellationToken,
) -> Result<()>
where
    F: Fn(&RawLog) -> Result<T>,
{
    let mut stream = stream.peekable();
    loop {
        let item = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Log subscription unsubscribed");
                return Ok(());
            }
            item = stream.next() => item,
        };

        let log = match item {
            Some(Ok(log)) => log,
            Some(Err(e)) => {
                warn!("Log subscription failed: {}", e);
                return Err(e);
            }
            None => {
                warn!("Log subscription closed by the node");
                return Err(BindError::Transport(
                    "log subscription closed by the node".to_string(),
                ));
            }
        };

        let event = decode(&log).map_err(|e| {
            warn!(
                "Dropping log subscription, cannot decode log {} of tx 0x{:x}: {}",
                log.log_index, log.transaction_hash, e
            );
            e
        })?;

        // A stalled sink must not hide a failing stream. Watch it until the
        // next log is buffered by the peek.
        let send = sink.send(event);
        tokio::pin!(send);
        let mut watching = true;
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(()),
                sent = &mut send => {
                    if sent.is_err() {
                        debug!("Event sink closed, ending log subscription");
                        return Ok(());
                    }
                    break;
                }
                peeked = Pin::new(&mut stream).peek(), if watching => {
                    match peeked.map(Result::is_ok) {
                        Some(true) => watching = false,
                        Some(false) => {
                            if let Some(Err(e)) = stream.next().await {
                                warn!("Log subscription failed while the sink was full: {}", e);
                                return Err(e);
                            }
                        }
                        None => {
                            warn!("Log subscription closed by the node");
                            return Err(BindError::Transport(
                                "log subscription closed by the node".to_string(),
                            ));
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bind::LogEvent;
    use futures::stream;
    use std::time::Duration;

    fn decode_named(log: &RawLog) -> Result<LogEvent> {
        if log.topics.is_empty() {
            return Err(BindError::Decoding("log has no topics".into()));
        }
        Ok(LogEvent {
            name: "Test".into(),
            fields: Vec::new(),
            raw: log.clone(),
        })
    }

    fn log(index: u64) -> RawLog {
        RawLog {
            topics: vec![Default::default()],
            log_index: index,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_delivers_in_order_then_reports_stream_end() {
        let items: Vec<Result<RawLog>> = vec![Ok(log(0)), Ok(log(1)), Ok(log(2))];
        let (tx, mut rx) = mpsc::channel(8);
        let sub = Subscription::spawn(stream::iter(items).boxed(), decode_named, tx, None);

        for i in 0..3 {
            assert_eq!(rx.recv().await.unwrap().raw.log_index, i);
        }
        assert!(matches!(sub.wait().await, Err(BindError::Transport(_))));
    }

    #[tokio::test]
    async fn test_decode_failure_ends_subscription() {
        let items: Vec<Result<RawLog>> = vec![Ok(RawLog::default()), Ok(log(1))];
        let (tx, mut rx) = mpsc::channel(8);
        let sub = Subscription::spawn(stream::iter(items).boxed(), decode_named, tx, None);

        assert!(matches!(sub.wait().await, Err(BindError::Decoding(_))));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_transport_error_is_terminal() {
        let items: Vec<Result<RawLog>> = vec![
            Ok(log(0)),
            Err(BindError::Transport("socket closed".into())),
            Ok(log(1)),
        ];
        let (tx, mut rx) = mpsc::channel(8);
        let sub = Subscription::spawn(stream::iter(items).boxed(), decode_named, tx, None);

        assert!(matches!(sub.wait().await, Err(BindError::Transport(m)) if m == "socket closed"));
        assert_eq!(rx.recv().await.unwrap().raw.log_index, 0);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_unsubscribe_while_blocked_on_sink() {
        let items: Vec<Result<RawLog>> = vec![Ok(log(0)), Ok(log(1))];
        let pending = stream::iter(items).chain(stream::pending());
        let (tx, _rx) = mpsc::channel(1);
        let sub = Subscription::spawn(pending.boxed(), decode_named, tx, None);

        // The second send blocks on the full channel until unsubscribed.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!sub.is_finished());

        sub.unsubscribe();
        sub.unsubscribe();
        assert!(sub.wait().await.is_ok());
    }

    #[tokio::test]
    async fn test_stream_error_surfaces_while_sink_is_full() {
        let items: Vec<Result<RawLog>> = vec![
            Ok(log(0)),
            Ok(log(1)),
            Err(BindError::Transport("socket closed".into())),
        ];
        let (tx, _rx) = mpsc::channel(1);
        let sub = Subscription::spawn(
            stream::iter(items).chain(stream::pending()).boxed(),
            decode_named,
            tx,
            None,
        );

        // log 1 never fits; the failure behind it still ends the subscription.
        let ended = tokio::time::timeout(Duration::from_secs(5), sub.wait())
            .await
            .expect("subscription did not end");
        assert!(matches!(ended, Err(BindError::Transport(m)) if m == "socket closed"));
    }

    #[tokio::test]
    async fn test_dropped_receiver_ends_quietly() {
        let items: Vec<Result<RawLog>> = vec![Ok(log(0))];
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sub = Subscription::spawn(
            stream::iter(items).chain(stream::pending()).boxed(),
            decode_named,
            tx,
            None,
        );
        assert!(sub.wait().await.is_ok());
    }

    #[tokio::test]
    async fn test_parent_token_cancels() {
        let parent = CancellationToken::new();
        let (tx, _rx) = mpsc::channel(1);
        let sub = Subscription::spawn(
            stream::pending::<Result<RawLog>>().boxed(),
            decode_named,
            tx,
            Some(&parent),
        );

        parent.cancel();
        assert!(sub.wait().await.is_ok());
    }
}
