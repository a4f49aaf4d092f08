use log::{debug, info, warn};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::aggregator::{AggregatorConfig, MetricsAggregator, MetricsSnapshot};
use crate::events::ConsoleEvent;
use crate::types::ConnectionState;

/// Counters and final state returned when the worker stops.
#[derive(Debug, Clone)]
pub struct WorkerSummary {
    pub events_applied: u64,
    pub events_rejected: u64,
    pub events_ignored: u64,
    pub snapshot: MetricsSnapshot,
}

/// Running worker: a live snapshot feed plus the task handle.
pub struct SessionWorkerHandle {
    pub snapshots: watch::Receiver<MetricsSnapshot>,
    pub task: JoinHandle<WorkerSummary>,
}

/// Owns a [`MetricsAggregator`] on a single task and applies bus events to
/// it strictly in receipt order.
pub struct SessionWorker {
    aggregator: MetricsAggregator,
    connection: ConnectionState,
    events_applied: u64,
    events_rejected: u64,
    events_ignored: u64,
}

impl SessionWorker {
    pub fn new(config: AggregatorConfig) -> Self {
        Self {
            aggregator: MetricsAggregator::new(config),
            connection: ConnectionState::default(),
            events_applied: 0,
            events_rejected: 0,
            events_ignored: 0,
        }
    }

    /// Spawn the worker task. It runs until every bus handle is dropped.
    pub fn spawn(
        config: AggregatorConfig,
        mut receiver: mpsc::Receiver<ConsoleEvent>,
    ) -> SessionWorkerHandle {
        let mut worker = Self::new(config);
        let (tx, snapshots) = watch::channel(worker.snapshot());

        let task = tokio::spawn(async move {
            info!("SessionWorker started");

            while let Some(event) = receiver.recv().await {
                worker.handle_event(event);
                tx.send_replace(worker.snapshot());
            }

            info!("SessionWorker stopped");
            worker.into_summary()
        });

        SessionWorkerHandle { snapshots, task }
    }

    /// Apply one event. Contract violations are logged and counted, never fatal.
    ///
    /// A connected event resets the aggregator only; the connection state
    /// follows transport-state events.
    pub fn handle_event(&mut self, event: ConsoleEvent) {
        debug!("Handling {} event", event.kind());
        match event {
            ConsoleEvent::Connected => {
                self.aggregator.on_session_connected();
                self.events_applied += 1;
                info!("Session connected, metrics reset");
            }
            ConsoleEvent::Metrics(payload) => match self.aggregator.on_metrics_event(&payload) {
                Ok(()) => self.events_applied += 1,
                Err(error) => {
                    self.events_rejected += 1;
                    warn!("Rejected metrics event: {}", error);
                }
            },
            ConsoleEvent::TransportState(state) => {
                debug!("Transport state: {} -> {}", self.connection, state);
                self.connection = state;
                self.events_applied += 1;
            }
            ConsoleEvent::Unknown(kind) => {
                self.events_ignored += 1;
                debug!("Ignoring {} event", kind);
            }
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.aggregator.snapshot(&self.connection)
    }

    pub fn into_summary(self) -> WorkerSummary {
        WorkerSummary {
            events_applied: self.events_applied,
            events_rejected: self.events_rejected,
            events_ignored: self.events_ignored,
            snapshot: self.snapshot(),
        }
    }
}
