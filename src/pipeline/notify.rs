//! Outbound delivery of change events.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::{AppError, Result};
use crate::models::{ChangeEvent, Snapshot};

/// Change events of one poll cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeBatch {
    pub source_name: String,
    pub captured_at: DateTime<Utc>,
    pub events: Vec<ChangeEvent>,
}

impl ChangeBatch {
    pub fn new(snapshot: &Snapshot, events: &[ChangeEvent]) -> Self {
        Self {
            source_name: snapshot.source_name().to_string(),
            captured_at: snapshot.captured_at(),
            events: events.to_vec(),
        }
    }
}

/// Receives the change events produced by each cycle.
#[async_trait]
pub trait ChangeNotifier: Send + Sync {
    /// Deliver the events computed against `snapshot`.
    async fn notify(&self, snapshot: &Snapshot, events: &[ChangeEvent]) -> Result<()>;
}

/// Writes one log line per event.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl ChangeNotifier for LogNotifier {
    async fn notify(&self, snapshot: &Snapshot, events: &[ChangeEvent]) -> Result<()> {
        for event in events {
            log::info!("[{}] {}", snapshot.source_name(), event);
        }
        Ok(())
    }
}

/// Forwards non-empty batches over a channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::Sender<ChangeBatch>,
}

impl ChannelNotifier {
    pub fn new(tx: mpsc::Sender<ChangeBatch>) -> Self {
        Self { tx }
    }

    /// Create a notifier and the receiving end of its channel.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ChangeBatch>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl ChangeNotifier for ChannelNotifier {
    async fn notify(&self, snapshot: &Snapshot, events: &[ChangeEvent]) -> Result<()> {
        if events.is_empty() {
            return Ok(());
        }
        self.tx
            .send(ChangeBatch::new(snapshot, events))
            .await
            .map_err(|_| AppError::Notify("change event receiver was dropped".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_notifier_forwards_batches() {
        let (notifier, mut rx) = ChannelNotifier::channel(4);
        let snapshot = Snapshot::empty("Open");
        let events = vec![ChangeEvent::PlayerCountChanged { old: 1, new: 2 }];

        notifier.notify(&snapshot, &[]).await.unwrap();
        notifier.notify(&snapshot, &events).await.unwrap();

        let batch = rx.recv().await.unwrap();
        assert_eq!(batch.source_name, "Open");
        assert_eq!(batch.events, events);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_channel_notifier_closed_receiver() {
        let (notifier, rx) = ChannelNotifier::channel(1);
        drop(rx);
        let events = vec![ChangeEvent::PlayerCountChanged { old: 1, new: 2 }];
        assert!(
            notifier
                .notify(&Snapshot::empty("Open"), &events)
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_log_notifier_never_fails() {
        let events = vec![ChangeEvent::PlayerCountChanged { old: 1, new: 2 }];
        assert!(
            LogNotifier
                .notify(&Snapshot::empty("Open"), &events)
                .await
                .is_ok()
        );
    }
}
