//! The reconciliation loop — single consumer of the store's change feed.
//!
//! Events are applied strictly in arrival order; the loop never reorders
//! by `created_at` (the feed delivers inserts in creation order). After
//! the snapshot load, gallery mutation happens only here.
//!
//! A lost feed is terminal: the loop reports `FeedLost` and ends without
//! resubscribing or re-fetching. Missed events stay missing until the
//! kiosk restarts, and the UI is told so the frozen view is visible.

use super::{Gallery, InsertOutcome, Photo};
use crate::store::{FeedEvent, FeedSubscription};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Typed notifications out of the reconciliation loop, consumed by the
/// app shell (webview emits) and the capture workflow (new-capture
/// trigger).
#[derive(Debug, Clone)]
pub enum GalleryEvent {
    /// A photo entered the local collection. `new_capture` marks the
    /// insert the armed watch attributed to the current session.
    Inserted { photo: Photo, new_capture: bool },
    /// A photo left the local collection.
    Deleted { id: String },
    /// The change feed dropped. Degraded liveness: no resubscription,
    /// no backfill.
    FeedLost { reason: String },
}

/// Drive the gallery from the feed until the channel is lost or closed.
/// Owns the subscription: when this returns, the feed is released.
pub async fn run(
    gallery: Arc<Gallery>,
    mut feed: FeedSubscription,
    sink: broadcast::Sender<GalleryEvent>,
) {
    while let Some(event) = feed.next().await {
        match event {
            FeedEvent::Insert(photo) => match gallery.apply_insert(photo.clone()) {
                InsertOutcome::Added { new_capture } => {
                    log::info!("[GALLERY] + {} ({} held)", photo.filename, gallery.len());
                    let _ = sink.send(GalleryEvent::Inserted { photo, new_capture });
                }
                InsertOutcome::Duplicate => {
                    log::debug!("[GALLERY] duplicate insert {} dropped", photo.id);
                }
            },
            FeedEvent::Delete { id } => {
                if gallery.apply_delete(&id) {
                    log::info!("[GALLERY] - {} ({} held)", id, gallery.len());
                    let _ = sink.send(GalleryEvent::Deleted { id });
                } else {
                    log::debug!("[GALLERY] delete for unknown id {} dropped", id);
                }
            }
            FeedEvent::Lost { reason } => {
                log::error!("[FEED] channel lost: {}", reason);
                let _ = sink.send(GalleryEvent::FeedLost { reason });
                break;
            }
        }
    }
    log::info!("[GALLERY] reconciliation loop ended");
}
