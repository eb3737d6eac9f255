//! Log relay - carries error records from workers to the controller.
//!
//! Many producers, one consumer. `send` never waits on the receiver and
//! `drain` never waits on the senders.

use tokio::sync::mpsc;

use super::LogRecord;
use crate::error::{BatchError, Result};

/// Create a connected relay sender/receiver pair.
pub fn relay() -> (RelaySender, RelayReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (RelaySender { tx }, RelayReceiver { rx })
}

/// Producer half, cloned into every worker.
#[derive(Debug, Clone)]
pub struct RelaySender {
    tx: mpsc::UnboundedSender<LogRecord>,
}

impl RelaySender {
    /// Enqueue a record without blocking.
    ///
    /// Fails only if the receiver has been dropped; the record is never
    /// silently discarded.
    pub fn send(&self, record: LogRecord) -> Result<()> {
        self.tx
            .send(record)
            .map_err(|e| BatchError::RelayClosed(format!("dropped record: {}", e.0.message)))
    }
}

/// Consumer half, owned by the controller.
#[derive(Debug)]
pub struct RelayReceiver {
    rx: mpsc::UnboundedReceiver<LogRecord>,
}

impl RelayReceiver {
    /// Take every record currently queued, oldest first.
    pub fn drain(&mut self) -> Vec<LogRecord> {
        let mut records = Vec::new();
        while let Ok(record) = self.rx.try_recv() {
            records.push(record);
        }
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::Severity;

    fn record(msg: &str) -> LogRecord {
        LogRecord::new(Severity::Error, "test", msg)
    }

    #[test]
    fn test_drain_empty() {
        let (_tx, mut rx) = relay();
        assert!(rx.drain().is_empty());
    }

    #[test]
    fn test_drain_returns_fifo() {
        let (tx, mut rx) = relay();
        tx.send(record("a")).unwrap();
        tx.send(record("b")).unwrap();
        tx.send(record("c")).unwrap();

        let msgs: Vec<_> = rx.drain().into_iter().map(|r| r.message).collect();
        assert_eq!(msgs, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_second_drain_is_empty() {
        let (tx, mut rx) = relay();
        tx.send(record("once")).unwrap();
        assert_eq!(rx.drain().len(), 1);
        assert!(rx.drain().is_empty());
    }

    #[test]
    fn test_drain_after_senders_dropped_keeps_pending() {
        let (tx, mut rx) = relay();
        tx.send(record("late")).unwrap();
        drop(tx);
        let drained = rx.drain();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].message, "late");
    }

    #[test]
    fn test_send_after_receiver_dropped_fails() {
        let (tx, rx) = relay();
        drop(rx);
        let err = tx.send(record("lost")).unwrap_err();
        assert!(matches!(err, BatchError::RelayClosed(_)));
        assert!(err.to_string().contains("lost"));
    }

    #[tokio::test]
    async fn test_many_producers() {
        let (tx, mut rx) = relay();
        let mut handles = Vec::new();
        for i in 0..8 {
            let tx = tx.clone();
            handles.push(tokio::spawn(async move {
                for j in 0..10 {
                    tx.send(record(&format!("{}-{}", i, j))).unwrap();
                }
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(rx.drain().len(), 80);
    }
}
