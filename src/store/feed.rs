//! Change feed subscription — one long-lived SSE response pumped into a
//! typed event channel.
//!
//! The pump task is owned by the `FeedSubscription`; dropping the
//! subscription aborts the pump and releases the connection. There is no
//! reconnect logic: any end of stream, clean or not, is reported as
//! `FeedEvent::Lost` and the subscription is finished.

use super::client::PhotoStore;
use super::sse;
use crate::gallery::Photo;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// One remote change, in arrival order.
#[derive(Debug, Clone)]
pub enum FeedEvent {
    Insert(Photo),
    Delete { id: String },
    /// The stream ended or errored. Terminal: missed events are not
    /// backfilled.
    Lost { reason: String },
}

/// Wire shape of one feed payload line.
#[derive(Debug, Deserialize)]
struct FeedPayload {
    #[serde(rename = "type")]
    kind: String,
    record: Option<Photo>,
    old: Option<OldRecord>,
}

#[derive(Debug, Deserialize)]
struct OldRecord {
    id: String,
}

/// Live subscription handle: the event channel plus its pump task.
/// Dropping it is the disposer; the pump is aborted and the connection
/// released on every teardown path.
pub struct FeedSubscription {
    events: mpsc::Receiver<FeedEvent>,
    pump: JoinHandle<()>,
}

impl FeedSubscription {
    /// Wrap an already-pumped channel. `pump` is aborted when the
    /// subscription drops.
    pub fn new(events: mpsc::Receiver<FeedEvent>, pump: JoinHandle<()>) -> Self {
        Self { events, pump }
    }

    /// Next event in arrival order; `None` once the channel is closed.
    pub async fn next(&mut self) -> Option<FeedEvent> {
        self.events.recv().await
    }
}

impl Drop for FeedSubscription {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

pub(super) fn subscribe(store: PhotoStore) -> FeedSubscription {
    let (tx, rx) = mpsc::channel(64);
    let pump = tokio::spawn(pump_events(store, tx));
    FeedSubscription::new(rx, pump)
}

async fn pump_events(store: PhotoStore, tx: mpsc::Sender<FeedEvent>) {
    let mut response = match store.feed_request().send().await {
        Ok(resp) if resp.status().is_success() => resp,
        Ok(resp) => {
            let _ = tx
                .send(FeedEvent::Lost {
                    reason: format!("feed returned {}", resp.status()),
                })
                .await;
            return;
        }
        Err(e) => {
            let _ = tx
                .send(FeedEvent::Lost {
                    reason: format!("feed connect failed: {}", e),
                })
                .await;
            return;
        }
    };
    log::info!("[FEED] change feed open");

    let mut buffer = String::new();
    loop {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                buffer.push_str(&String::from_utf8_lossy(&chunk));
                for data in sse::drain_data_lines(&mut buffer) {
                    match decode(&data) {
                        Some(event) => {
                            if tx.send(event).await.is_err() {
                                // Consumer tore down first.
                                return;
                            }
                        }
                        None => log::warn!("[FEED] unrecognized payload dropped: {}", data),
                    }
                }
            }
            Ok(None) => {
                let _ = tx
                    .send(FeedEvent::Lost {
                        reason: "feed stream ended".to_string(),
                    })
                    .await;
                return;
            }
            Err(e) => {
                let _ = tx
                    .send(FeedEvent::Lost {
                        reason: format!("feed stream error: {}", e),
                    })
                    .await;
                return;
            }
        }
    }
}

/// Decode one `data:` payload into a feed event. Unknown kinds and
/// malformed lines are dropped, not fatal.
fn decode(data: &str) -> Option<FeedEvent> {
    let payload: FeedPayload = match serde_json::from_str(data) {
        Ok(p) => p,
        Err(e) => {
            log::warn!("[FEED] payload did not parse ({}): {}", e, data);
            return None;
        }
    };
    match payload.kind.as_str() {
        "INSERT" => payload.record.map(FeedEvent::Insert),
        "DELETE" => payload.old.map(|old| FeedEvent::Delete { id: old.id }),
        _ => None,
    }
}
