//! Event stream between a running crawl and its consumer.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use crate::crawler::job::VehicleRecord;

/// One message on a crawl's event stream. `Error` and `Complete` are
/// terminal: exactly one of them ends every stream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CrawlEvent {
    /// Human-readable progress note
    Log { message: String },
    /// Percentage of the page budget covered so far
    Progress { value: u8 },
    /// Full snapshot of everything collected so far
    #[serde(rename = "result")]
    Snapshot { vehicles: Vec<VehicleRecord> },
    /// The crawl died; nothing follows
    Error { message: String },
    /// The crawl finished; nothing follows
    Complete,
}

impl CrawlEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CrawlEvent::Error { .. } | CrawlEvent::Complete)
    }
}

/// Producer half of the event stream. Emission applies backpressure: a slow
/// consumer stalls the crawl rather than piling up snapshots.
#[derive(Clone)]
pub struct EventSink {
    tx: mpsc::Sender<CrawlEvent>,
    cancel: CancellationToken,
}

impl EventSink {
    pub fn new(tx: mpsc::Sender<CrawlEvent>, cancel: CancellationToken) -> Self {
        Self { tx, cancel }
    }

    /// Deliver one event. If the consumer dropped the receiver the job is
    /// orphaned, so the cancellation token is tripped to wind it down.
    pub async fn emit(&self, event: CrawlEvent) {
        if self.tx.send(event).await.is_err() {
            debug!("event consumer is gone, cancelling the crawl");
            self.cancel.cancel();
        }
    }

    pub async fn log(&self, message: impl Into<String>) {
        self.emit(CrawlEvent::Log {
            message: message.into(),
        })
        .await;
    }

    pub async fn progress(&self, value: u8) {
        self.emit(CrawlEvent::Progress { value }).await;
    }

    pub async fn snapshot(&self, vehicles: Vec<VehicleRecord>) {
        self.emit(CrawlEvent::Snapshot { vehicles }).await;
    }

    pub async fn error(&self, message: impl Into<String>) {
        self.emit(CrawlEvent::Error {
            message: message.into(),
        })
        .await;
    }

    pub async fn complete(&self) {
        self.emit(CrawlEvent::Complete).await;
    }
}

/// Consumer half of a spawned crawl: the event receiver plus the controls
/// that outlive it.
pub struct CrawlHandle {
    pub id: Uuid,
    cancel: CancellationToken,
    events: mpsc::Receiver<CrawlEvent>,
}

impl CrawlHandle {
    pub(crate) fn new(
        id: Uuid,
        cancel: CancellationToken,
        events: mpsc::Receiver<CrawlEvent>,
    ) -> Self {
        Self { id, cancel, events }
    }

    /// Request a cooperative stop; the job checks between pages and listings
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token observed by the running job, for wiring external signals
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Next event, or `None` once the stream is closed
    pub async fn next_event(&mut self) -> Option<CrawlEvent> {
        self.events.recv().await
    }

    /// Consume the handle as a plain `Stream` of events
    pub fn into_stream(mut self) -> impl futures::Stream<Item = CrawlEvent> {
        async_stream::stream! {
            while let Some(event) = self.events.recv().await {
                yield event;
            }
        }
    }
}
