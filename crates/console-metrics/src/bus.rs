use tokio::sync::mpsc;

use crate::error::{MetricsError, MetricsResult};
use crate::events::ConsoleEvent;

/// A bounded channel carrying session events to a single consumer in order.
///
/// `send` waits for capacity, so a replayed log is never lossy.
#[derive(Clone)]
pub struct MetricsBus {
    tx: mpsc::Sender<ConsoleEvent>,
}

impl MetricsBus {
    /// Create a bus with the given capacity.
    ///
    /// Returns the bus (for sending events) and the receiver (for the worker)
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<ConsoleEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    pub async fn send(&self, event: ConsoleEvent) -> MetricsResult<()> {
        self.tx
            .send(event)
            .await
            .map_err(|_| MetricsError::BusClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::MetricsPayload;
    use tokio::time::{timeout, Duration};

    #[tokio::test]
    async fn delivers_events_in_order() {
        let (bus, mut rx) = MetricsBus::new(10);

        bus.send(ConsoleEvent::Connected).await.expect("send");
        bus.send(ConsoleEvent::Metrics(MetricsPayload::with_processing([("llm", 0.1)])))
            .await
            .expect("send");

        let first = timeout(Duration::from_millis(100), rx.recv())
            .await
            .expect("should receive event")
            .expect("event should exist");
        assert_eq!(first, ConsoleEvent::Connected);

        let second = rx.recv().await.expect("event should exist");
        assert_eq!(second.kind(), "metrics");
    }

    #[tokio::test]
    async fn send_waits_for_capacity_instead_of_dropping() {
        let (bus, mut rx) = MetricsBus::new(1);

        bus.send(ConsoleEvent::Connected).await.expect("send");
        let sender = bus.clone();
        let pending = tokio::spawn(async move {
            sender
                .send(ConsoleEvent::Unknown("bot-ready".to_string()))
                .await
        });

        assert_eq!(rx.recv().await, Some(ConsoleEvent::Connected));
        pending.await.expect("join").expect("send");
        assert_eq!(
            rx.recv().await,
            Some(ConsoleEvent::Unknown("bot-ready".to_string()))
        );
    }

    #[tokio::test]
    async fn send_fails_once_receiver_is_gone() {
        let (bus, rx) = MetricsBus::new(1);
        drop(rx);

        let error = bus.send(ConsoleEvent::Connected).await.expect_err("closed");
        assert!(matches!(error, MetricsError::BusClosed));
    }

    #[tokio::test]
    async fn receiver_ends_when_every_clone_drops() {
        let (bus1, mut rx) = MetricsBus::new(2);
        let bus2 = bus1.clone();

        bus2.send(ConsoleEvent::Connected).await.expect("send");
        drop(bus1);
        drop(bus2);

        assert_eq!(rx.recv().await, Some(ConsoleEvent::Connected));
        assert_eq!(rx.recv().await, None);
    }
}
